//! Utilities.

/// Returns ceiling log2.
pub const fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (::std::mem::size_of::<usize>() * 8) - (value - 1).leading_zeros() as usize
    }
}

/// Returns floor log2.
///
/// # Panics
///
/// Panics if `val == 0`.
pub const fn flog2(val: usize) -> usize {
    assert!(val != 0, "log2 of zero");
    if val == 1 {
        0
    } else {
        1 + flog2(val >> 1)
    }
}

/// Returns `true` if `value` is a power of two. Zero is not.
pub const fn is_pow2(value: usize) -> bool { value != 0 && value & (value - 1) == 0 }

/// Returns a mask with the low `bits` bits set.
pub const fn mask(bits: usize) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Packs bits, least significant first, into a `u128`.
///
/// # Panics
///
/// Panics if there are more than 128 bits.
pub fn bits_to_u128(bits: &[bool]) -> u128 {
    assert!(bits.len() <= 128, "{} bits do not fit in 128 bits", bits.len());
    bits.iter().rev().fold(0, |acc, bit| (acc << 1) | u128::from(*bit))
}

/// Returns the low `n` bits of `value`, least significant first.
pub fn u128_to_bits(n: usize, value: u128) -> Vec<bool> {
    (0..n).map(|i| if i >= 128 { false } else { (value >> i) & 1 != 0 }).collect::<Vec<_>>()
}

/// Some or executing the given expression.
#[macro_export]
macro_rules! some_or {
    ($e:expr, $err:expr) => {{
        match $e {
            Some(r) => r,
            None => $err,
        }
    }};
}
