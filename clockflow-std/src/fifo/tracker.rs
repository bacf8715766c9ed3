//! FIFO pointer tracker.
//!
//! A pointer counts slots modulo `2 * depth`: the low `log2(depth)` bits index the storage and the extra most
//! significant bit tells a full queue from an empty one.

use clockflow::cdc::gray_encode;

use crate::*;

/// Wrapping pointer of a power-of-two FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayCounter {
    value: u64,
    depth: u64,
}

impl GrayCounter {
    /// Creates a pointer for a queue of `depth` slots.
    pub fn new(depth: usize) -> Self {
        assert!(is_pow2(depth), "FIFO depth should be a power of two");
        Self { value: 0, depth: depth as u64 }
    }

    /// Returns the pointer width in bits.
    pub fn bits(&self) -> usize { flog2(self.depth as usize) + 1 }

    /// Returns the binary pointer value.
    pub fn value(&self) -> u64 { self.value }

    /// Returns the Gray-coded pointer value.
    pub fn gray(&self) -> u64 { gray_encode(self.value) }

    /// Returns the slot the pointer designates.
    pub fn index(&self) -> usize { (self.value & (self.depth - 1)) as usize }

    /// Advances the pointer by one slot.
    pub fn increment(&mut self) { self.value = (self.value + 1) & self.mask(); }

    /// Clears the pointer.
    pub fn reset(&mut self) { self.value = 0; }

    fn mask(&self) -> u64 { (self.depth << 1) - 1 }
}

/// Returns the number of occupied slots between a write pointer and a read pointer.
pub fn level(wptr: u64, rptr: u64, depth: usize) -> u64 { wptr.wrapping_sub(rptr) & (((depth as u64) << 1) - 1) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_wraps_at_twice_depth() {
        let mut ptr = GrayCounter::new(4);
        assert_eq!(ptr.bits(), 3);
        for _ in 0..7 {
            ptr.increment();
        }
        assert_eq!(ptr.value(), 7);
        assert_eq!(ptr.index(), 3);
        ptr.increment();
        assert_eq!(ptr.value(), 0);
        assert_eq!(ptr.gray(), 0);
    }

    #[test]
    fn level_distinguishes_full_from_empty() {
        assert_eq!(level(6, 2, 4), 4);
        assert_eq!(level(6, 6, 4), 0);
        // Write pointer wrapped past zero.
        assert_eq!(level(1, 7, 4), 2);
    }
}
