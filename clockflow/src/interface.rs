//! Interface.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::*;

/// Interface of channels.
///
/// An interface only names the signals travelling on it: `Fwd` flows from the upstream module to the downstream
/// one, `Bwd` flows back.
pub trait Interface: 'static + Debug {
    /// Forward signals.
    type Fwd: Signal;

    /// Backward signals.
    type Bwd: Signal;
}

/// Forward signals of an interface.
pub type Fwd<I> = <I as Interface>::Fwd;

/// Backward signals of an interface.
pub type Bwd<I> = <I as Interface>::Bwd;

/// Valid signal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Signal)]
pub struct Valid<V: Signal> {
    /// Inner value.
    pub inner: V,

    /// Valid bit.
    pub valid: bool,
}

impl<V: Signal> Valid<V> {
    /// Creates a new valid signal.
    pub fn new(valid: bool, inner: V) -> Self { Self { inner, valid } }

    /// Creates a valid signal carrying `inner`.
    pub fn valid(inner: V) -> Self { Self::new(true, inner) }

    /// Creates an invalid signal.
    pub fn invalid() -> Self { Self::default() }

    /// Returns the inner value if valid.
    pub fn as_option(&self) -> Option<&V> { self.valid.then_some(&self.inner) }

    /// Returns the inner value if valid.
    pub fn into_option(self) -> Option<V> { self.valid.then_some(self.inner) }
}

impl<V: Signal> From<Option<V>> for Valid<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(inner) => Self::valid(inner),
            None => Self::invalid(),
        }
    }
}

/// Ready signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct Ready {
    /// Ready bit.
    pub ready: bool,
}

impl Ready {
    /// Creates a new ready signal.
    pub fn new(ready: bool) -> Self { Self { ready } }
}

/// Valid-ready channel.
///
/// A transfer happens on a clock edge at which both `valid` and `ready` are high. `valid` may not depend on
/// `ready` in the same cycle.
#[derive(Debug, Default)]
pub struct VrChannel<V: Signal> {
    _marker: PhantomData<V>,
}

impl<V: Signal> Interface for VrChannel<V> {
    type Bwd = Ready;
    type Fwd = Valid<V>;
}

/// Returns whether a transfer happens on the next edge.
pub fn transfer<V: Signal>(fwd: &Valid<V>, bwd: &Ready) -> bool { fwd.valid && bwd.ready }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_layout_puts_payload_first() {
        assert_eq!(<Valid<u8> as Signal>::WIDTH, 9);
        assert_eq!(Valid::valid(0x12u8).to_u128(), 0x112);
        assert_eq!(Valid::<u8>::invalid().to_u128(), 0);
    }

    #[test]
    fn options_convert() {
        assert_eq!(Valid::from(Some(3u8)), Valid::valid(3));
        assert_eq!(Valid::<u8>::from(None).into_option(), None);
        assert_eq!(Valid::valid(7u8).as_option(), Some(&7));
        assert!(transfer(&Valid::valid(1u8), &Ready::new(true)));
        assert!(!transfer(&Valid::valid(1u8), &Ready::new(false)));
    }
}
