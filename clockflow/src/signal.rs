use std::fmt::Debug;

use crate::utils::{bits_to_u128, u128_to_bits};

/// Bit-representable values.
///
/// Every value travelling on a wire of the model implements `Signal`. The bit layout produced by
/// [`Signal::transl`] is the one a hardware implementation would see: bit 0 first. Structs derived with
/// `#[derive(Signal)]` concatenate their fields in declaration order.
pub trait Signal: 'static + Debug + Clone + Default + PartialEq {
    /// Signal's bit width.
    ///
    /// # Note
    ///
    /// `Self::WIDTH` and `self.transl().len()` should be equal.
    const WIDTH: usize;

    /// Translates the value into its bits, least significant first.
    fn transl(self) -> Vec<bool>;

    /// Rebuilds a value from bits laid out as [`Signal::transl`] produces them.
    ///
    /// # Panics
    ///
    /// Panics if `bits.len() != Self::WIDTH`.
    fn from_transl(bits: &[bool]) -> Self;

    /// Packs the value into the low `Self::WIDTH` bits of a `u128`.
    fn to_u128(&self) -> u128 {
        assert!(Self::WIDTH <= 128, "a {}-bit signal does not fit in 128 bits", Self::WIDTH);
        bits_to_u128(&self.clone().transl())
    }

    /// Unpacks the value from the low `Self::WIDTH` bits of a `u128`. Higher bits are ignored.
    fn from_u128(value: u128) -> Self { Self::from_transl(&u128_to_bits(Self::WIDTH, value)) }
}

impl Signal for () {
    const WIDTH: usize = 0;

    fn transl(self) -> Vec<bool> { vec![] }

    fn from_transl(bits: &[bool]) -> Self { assert!(bits.is_empty()) }
}

impl Signal for bool {
    const WIDTH: usize = 1;

    fn transl(self) -> Vec<bool> { vec![self] }

    fn from_transl(bits: &[bool]) -> Self {
        assert_eq!(bits.len(), 1);
        bits[0]
    }
}

macro_rules! impl_signal {
    ($typ:ty) => {
        impl Signal for $typ {
            const WIDTH: usize = ::std::mem::size_of::<$typ>() * 8;

            fn transl(self) -> Vec<bool> {
                let one: $typ = 1;
                (0..Self::WIDTH).map(|i| ((self >> i) & one) != 0).collect::<Vec<_>>()
            }

            fn from_transl(bits: &[bool]) -> Self {
                assert_eq!(bits.len(), Self::WIDTH);
                bits.iter().rev().fold(0, |acc: $typ, bit| (acc << 1) | <$typ>::from(*bit))
            }
        }
    };
}

impl_signal!(u8);
impl_signal!(u16);
impl_signal!(u32);
impl_signal!(u64);
impl_signal!(u128);
impl_signal!(usize);

macro_rules! impl_signal_tuple {
    ($($a:ident)+) => {
        impl<$($a: Signal,)+> Signal for ($($a,)+) {
            const WIDTH: usize = 0 $(+ <$a as Signal>::WIDTH)+;

            #[allow(non_snake_case)]
            fn transl(self) -> Vec<bool> {
                let ($($a,)+) = self;
                ::std::iter::empty()$(.chain($a.transl()))+.collect()
            }

            #[allow(non_snake_case, unused_assignments)]
            fn from_transl(bits: &[bool]) -> Self {
                assert_eq!(bits.len(), Self::WIDTH);
                let mut offset = 0;
                $(
                    let $a = <$a as Signal>::from_transl(&bits[offset..offset + <$a as Signal>::WIDTH]);
                    offset += <$a as Signal>::WIDTH;
                )+
                ($($a,)+)
            }
        }
    };
}

impl_signal_tuple! { V1 }
impl_signal_tuple! { V1 V2 }
impl_signal_tuple! { V1 V2 V3 }
impl_signal_tuple! { V1 V2 V3 V4 }

#[cfg(test)]
mod tests {
    use crate::*;

    #[derive(Debug, Clone, Default, PartialEq, Signal)]
    struct Pixel {
        de: bool,
        level: u8,
        tag: u16,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Signal)]
    enum Kind {
        #[default]
        Idle,
        #[encode(2)]
        Data,
        #[encode(3)]
        Sync,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Signal)]
    #[width(4)]
    enum Wide {
        #[default]
        A,
        B,
    }

    #[test]
    fn integers_are_lsb_first() {
        let bits = 0b1010_0001u8.transl();
        assert_eq!(bits, vec![true, false, false, false, false, true, false, true]);
        assert_eq!(u8::from_transl(&bits), 0b1010_0001);
        assert_eq!(u128::MAX.transl().len(), 128);
    }

    #[test]
    fn derived_struct_concatenates_fields_in_order() {
        assert_eq!(Pixel::WIDTH, 1 + 8 + 16);

        let pixel = Pixel { de: true, level: 0x5a, tag: 0xbeef };
        let packed = pixel.to_u128();
        assert_eq!(packed & 1, 1);
        assert_eq!((packed >> 1) & 0xff, 0x5a);
        assert_eq!((packed >> 9) & 0xffff, 0xbeef);
        assert_eq!(Pixel::from_u128(packed), pixel);
    }

    #[test]
    fn derived_enum_uses_encodings() {
        assert_eq!(Kind::WIDTH, 2);
        assert_eq!(Kind::Data.to_u128(), 2);
        assert_eq!(Kind::Sync.to_u128(), 3);
        assert_eq!(Kind::from_u128(3), Kind::Sync);
        // `1` is not a valid encoding.
        assert_eq!(Kind::from_u128(1), Kind::Idle);

        assert_eq!(Wide::WIDTH, 4);
        assert_eq!(Wide::B.transl(), vec![true, false, false, false]);
    }

    #[test]
    fn tuples_pack_first_element_low() {
        assert_eq!(<(bool, u8)>::WIDTH, 9);
        let value = (true, 0x80u8);
        assert_eq!(value.to_u128(), 0x101);
        assert_eq!(<(bool, u8)>::from_u128(0x101), (true, 0x80));
    }

    #[test]
    fn from_u128_ignores_high_bits() {
        assert_eq!(u8::from_u128(0x1_23), 0x23);
    }
}
