use std::fmt::Debug;

/// Bit-representable values.
///
/// A signal is the payload of one wire bundle for one cycle. Its bit layout is little-endian: the
/// first element of `transl()` is the least significant bit.
pub trait Signal: 'static + Debug + Clone {
    /// Signal's bit width.
    ///
    /// # Note
    ///
    /// `Self::WIDTH` and `self.transl().len()` should be equal.
    const WIDTH: usize;

    /// Translates the value into its bits, least significant first.
    fn transl(self) -> Vec<bool>;

    /// Reconstructs a value from exactly `Self::WIDTH` bits, least significant first.
    fn from_bits(bits: &[bool]) -> Self;
}

impl Signal for () {
    const WIDTH: usize = 0;

    fn transl(self) -> Vec<bool> { vec![] }

    fn from_bits(bits: &[bool]) -> Self { assert!(bits.is_empty()) }
}

impl Signal for bool {
    const WIDTH: usize = 1;

    fn transl(self) -> Vec<bool> { vec![self] }

    fn from_bits(bits: &[bool]) -> Self {
        assert_eq!(bits.len(), 1);
        bits[0]
    }
}

macro_rules! impl_signal {
    ($typ:ty) => {
        impl Signal for $typ {
            const WIDTH: usize = <$typ>::BITS as usize;

            fn transl(self) -> Vec<bool> { (0..Self::WIDTH).map(|i| (self >> i) & 1 != 0).collect::<Vec<_>>() }

            fn from_bits(bits: &[bool]) -> Self {
                assert_eq!(bits.len(), Self::WIDTH);
                bits.iter().enumerate().fold(0, |acc, (i, bit)| acc | (<$typ>::from(*bit) << i))
            }
        }
    };
}

impl_signal!(u8);
impl_signal!(u16);
impl_signal!(u32);
impl_signal!(u64);
impl_signal!(usize);

macro_rules! impl_signal_signed {
    ($typ:ty, $unsigned:ty) => {
        impl Signal for $typ {
            const WIDTH: usize = <$unsigned as Signal>::WIDTH;

            fn transl(self) -> Vec<bool> { (self as $unsigned).transl() }

            fn from_bits(bits: &[bool]) -> Self { <$unsigned as Signal>::from_bits(bits) as $typ }
        }
    };
}

impl_signal_signed!(i8, u8);
impl_signal_signed!(i16, u16);
impl_signal_signed!(i32, u32);
impl_signal_signed!(i64, u64);

impl<V: Signal, const N: usize> Signal for [V; N] {
    const WIDTH: usize = V::WIDTH * N;

    fn transl(self) -> Vec<bool> { self.into_iter().flat_map(Signal::transl).collect() }

    fn from_bits(bits: &[bool]) -> Self {
        assert_eq!(bits.len(), Self::WIDTH);
        std::array::from_fn(|i| V::from_bits(&bits[i * V::WIDTH..(i + 1) * V::WIDTH]))
    }
}

macro_rules! impl_signal_tuple {
    ($($a:ident)+) => {
        impl<$($a: Signal,)+> Signal for ($($a,)+) {
            const WIDTH: usize = 0 $(+ <$a as Signal>::WIDTH)+;

            #[allow(non_snake_case)]
            fn transl(self) -> Vec<bool> {
                let ($($a,)+) = self;
                ::std::iter::empty()
                    $(.chain($a.transl()))+
                    .collect::<Vec<_>>()
            }

            #[allow(non_snake_case, unused_assignments)]
            fn from_bits(bits: &[bool]) -> Self {
                assert_eq!(bits.len(), Self::WIDTH);
                let mut offset = 0;
                $(
                    let $a = <$a as Signal>::from_bits(&bits[offset..offset + <$a as Signal>::WIDTH]);
                    offset += <$a as Signal>::WIDTH;
                )+
                ($($a,)+)
            }
        }
    };
}

impl_signal_tuple! { V1 V2 }
impl_signal_tuple! { V1 V2 V3 }
impl_signal_tuple! { V1 V2 V3 V4 }

/// Unsigned value of `N` bits, `N <= 64`.
///
/// Construction truncates to the low `N` bits, like assigning to a narrower register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bits<const N: usize>(u64);

impl<const N: usize> Bits<N> {
    /// Mask of the representable bits.
    pub const MASK: u64 = if N == 0 { 0 } else { u64::MAX >> (64 - N) };

    /// Creates a new value, keeping the low `N` bits.
    pub fn new(value: u64) -> Self { Self(value & Self::MASK) }

    /// Returns the value.
    pub fn value(self) -> u64 { self.0 }

    /// Returns the value as an index.
    pub fn as_usize(self) -> usize { self.0 as usize }
}

impl<const N: usize> From<Bits<N>> for u64 {
    fn from(bits: Bits<N>) -> Self { bits.0 }
}

impl<const N: usize> Signal for Bits<N> {
    const WIDTH: usize = N;

    fn transl(self) -> Vec<bool> { (0..N).map(|i| (self.0 >> i) & 1 != 0).collect() }

    fn from_bits(bits: &[bool]) -> Self {
        assert_eq!(bits.len(), N);
        Self(bits.iter().enumerate().fold(0, |acc, (i, bit)| acc | (u64::from(*bit) << i)))
    }
}
