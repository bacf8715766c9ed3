//! Module.

use std::fmt;
use std::marker::PhantomData;

use crate::*;

/// Maximum number of combinational passes spent settling the wires between two chained modules.
pub const MAX_SETTLE_ITERATIONS: usize = 8;

/// Synchronous module.
///
/// A module is evaluated in two phases on each active edge of its clock. [`Module::comb`] computes the outputs for
/// the current cycle from the inputs and the registers without changing anything; [`Module::tick`] then updates the
/// registers as the edge would. Calling `comb` any number of times between two ticks yields the same outputs.
pub trait Module: fmt::Debug {
    /// Input interface.
    type I: Interface;

    /// Output interface.
    type O: Interface;

    /// Returns the module name.
    fn name(&self) -> &str { ::std::any::type_name::<Self>() }

    /// Returns the current-cycle output forward signals and input backward signals.
    fn comb(&self, i_fwd: &Fwd<Self::I>, o_bwd: &Bwd<Self::O>) -> (Fwd<Self::O>, Bwd<Self::I>);

    /// Updates the registers on an active clock edge.
    fn tick(&mut self, i_fwd: &Fwd<Self::I>, o_bwd: &Bwd<Self::O>);

    /// Resets the registers to their initial values.
    fn reset(&mut self);

    /// Feeds the output of `self` to `next`.
    fn chain<M: Module<I = Self::O>>(self, next: M) -> Chain<Self, M>
    where Self: Sized {
        Chain { first: self, second: next }
    }
}

/// Two modules connected back to back.
#[derive(Debug, Clone)]
pub struct Chain<A: Module, B: Module<I = A::O>> {
    first: A,
    second: B,
}

impl<A: Module, B: Module<I = A::O>> Chain<A, B> {
    /// Returns the upstream module.
    pub fn first(&self) -> &A { &self.first }

    /// Returns the downstream module.
    pub fn second(&self) -> &B { &self.second }

    /// Returns the forward and backward signals of the middle channel once they stop changing.
    ///
    /// # Panics
    ///
    /// Panics if the middle channel does not settle in [`MAX_SETTLE_ITERATIONS`] passes, which means the two modules
    /// form a combinational loop.
    pub fn settle(&self, i_fwd: &Fwd<A::I>, o_bwd: &Bwd<B::O>) -> (Fwd<A::O>, Bwd<A::O>) {
        let mut mid_bwd = Bwd::<A::O>::default();
        for _ in 0..MAX_SETTLE_ITERATIONS {
            let (mid_fwd, _) = self.first.comb(i_fwd, &mid_bwd);
            let (_, next_bwd) = self.second.comb(&mid_fwd, o_bwd);
            if next_bwd == mid_bwd {
                return (mid_fwd, mid_bwd);
            }
            mid_bwd = next_bwd;
        }
        panic!("combinational loop between `{}` and `{}`", self.first.name(), self.second.name())
    }
}

impl<A: Module, B: Module<I = A::O>> Module for Chain<A, B> {
    type I = A::I;
    type O = B::O;

    fn name(&self) -> &str { "chain" }

    fn comb(&self, i_fwd: &Fwd<A::I>, o_bwd: &Bwd<B::O>) -> (Fwd<B::O>, Bwd<A::I>) {
        let (mid_fwd, mid_bwd) = self.settle(i_fwd, o_bwd);
        let (_, i_bwd) = self.first.comb(i_fwd, &mid_bwd);
        let (o_fwd, _) = self.second.comb(&mid_fwd, o_bwd);
        (o_fwd, i_bwd)
    }

    fn tick(&mut self, i_fwd: &Fwd<A::I>, o_bwd: &Bwd<B::O>) {
        let (mid_fwd, mid_bwd) = self.settle(i_fwd, o_bwd);
        self.first.tick(i_fwd, &mid_bwd);
        self.second.tick(&mid_fwd, o_bwd);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

/// Finite state machine (Mealy machine).
///
/// The FSM is described by `F`, which computes (1) the current-cycle output; and (2) the next-cycle state.
#[derive(Clone)]
pub struct Fsm<I: Interface, O: Interface, S: Signal, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> {
    /// Module name.
    module_name: String,
    /// FSM function.
    f: F,
    /// Initial value of registers in the FSM.
    init: S,
    /// Current value of registers in the FSM.
    state: S,
    _marker: PhantomData<(I, O)>,
}

impl<I: Interface, O: Interface, S: Signal, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> Fsm<I, O, S, F> {
    /// Creates a new FSM.
    pub fn new(module_name: &str, init: S, f: F) -> Self {
        Self { module_name: module_name.to_string(), f, state: init.clone(), init, _marker: PhantomData }
    }

    /// Returns the current state.
    pub fn state(&self) -> &S { &self.state }
}

impl<I: Interface, O: Interface, S: Signal, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> fmt::Debug
    for Fsm<I, O, S, F>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm").field("name", &self.module_name).field("state", &self.state).finish()
    }
}

impl<I: Interface, O: Interface, S: Signal, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> Module
    for Fsm<I, O, S, F>
{
    type I = I;
    type O = O;

    fn name(&self) -> &str { &self.module_name }

    fn comb(&self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> (O::Fwd, I::Bwd) {
        let (o_fwd, i_bwd, _) = (self.f)(i_fwd, o_bwd, &self.state);
        (o_fwd, i_bwd)
    }

    fn tick(&mut self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) {
        let (_, _, next) = (self.f)(i_fwd, o_bwd, &self.state);
        self.state = next;
    }

    fn reset(&mut self) { self.state = self.init.clone(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Stage = fn(&Valid<u8>, &Ready, &Valid<u8>) -> (Valid<u8>, Ready, Valid<u8>);

    /// One-entry register slice: accepts only when empty or draining.
    fn slice(i_fwd: &Valid<u8>, o_bwd: &Ready, state: &Valid<u8>) -> (Valid<u8>, Ready, Valid<u8>) {
        let ready = !state.valid || o_bwd.ready;
        let next = if ready { i_fwd.clone() } else { state.clone() };
        (state.clone(), Ready::new(ready), next)
    }

    fn register() -> Fsm<VrChannel<u8>, VrChannel<u8>, Valid<u8>, Stage> {
        Fsm::new("slice", Valid::invalid(), slice as Stage)
    }

    #[test]
    fn fsm_updates_state_on_tick() {
        let mut m = register();
        let (o_fwd, i_bwd) = m.comb(&Valid::valid(7), &Ready::new(false));
        assert!(!o_fwd.valid);
        assert!(i_bwd.ready);

        m.tick(&Valid::valid(7), &Ready::new(false));
        assert_eq!(m.state(), &Valid::valid(7));

        // Full and stalled.
        let (o_fwd, i_bwd) = m.comb(&Valid::valid(8), &Ready::new(false));
        assert_eq!(o_fwd, Valid::valid(7));
        assert!(!i_bwd.ready);

        m.reset();
        assert_eq!(m.state(), &Valid::invalid());
    }

    #[test]
    fn chain_propagates_backpressure() {
        let mut m = register().chain(register());
        let stalled = Ready::new(false);

        for value in 1..=3 {
            m.tick(&Valid::valid(value), &stalled);
        }
        // Both slices hold a value, the third is refused.
        let (o_fwd, i_bwd) = m.comb(&Valid::valid(4), &stalled);
        assert_eq!(o_fwd, Valid::valid(1));
        assert!(!i_bwd.ready);

        let (o_fwd, i_bwd) = m.comb(&Valid::valid(4), &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid(1));
        assert!(i_bwd.ready);
    }

    #[test]
    #[should_panic(expected = "combinational loop")]
    fn oscillating_chain_panics() {
        type Loop = fn(&Valid<u8>, &Ready, &()) -> (Valid<u8>, Ready, ());
        let inverter: Loop = |_, o_bwd, _| (Valid::new(!o_bwd.ready, 0), Ready::new(true), ());
        let follower: Loop = |i_fwd, _, _| (Valid::invalid(), Ready::new(i_fwd.valid), ());

        let m = Fsm::<VrChannel<u8>, VrChannel<u8>, (), Loop>::new("inverter", (), inverter)
            .chain(Fsm::<VrChannel<u8>, VrChannel<u8>, (), Loop>::new("follower", (), follower));
        let _ = m.comb(&Valid::invalid(), &Ready::new(true));
    }
}
