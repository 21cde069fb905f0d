//! This module defines shared traits used across different kernels.

use num_traits::{PrimInt, Signed};

/// A fixed-width, little-endian, two's-complement item stored inside a property
/// buffer. The property Gorilla kernel is generic over this trait so that byte,
/// short and int buffers share one packing loop.
pub trait PackedItem: PrimInt + Signed + Copy {
    /// The width of one item in bytes.
    const WIDTH: usize;

    /// Reads one item from the first `WIDTH` little-endian bytes, or `None` on a shorter slice.
    fn read_le(bytes: &[u8]) -> Option<Self>;

    /// Appends the little-endian representation of the item.
    fn write_le(self, out: &mut Vec<u8>);

    /// Widens the item for bit-width analysis.
    fn widen(self) -> i64;

    /// Narrows a sign-extended value back to the item width (two's-complement truncation).
    fn narrow(value: i64) -> Self;
}

// Implement the trait for all property item widths.
macro_rules! impl_packed_item {
    ($T:ty, $W:expr) => {
        impl PackedItem for $T {
            const WIDTH: usize = $W;

            #[inline]
            fn read_le(bytes: &[u8]) -> Option<Self> {
                let item = bytes.get(..$W)?;
                Some(<$T>::from_le(bytemuck::pod_read_unaligned(item)))
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(bytemuck::bytes_of(&self.to_le()));
            }

            #[inline]
            fn widen(self) -> i64 {
                self as i64
            }

            #[inline]
            fn narrow(value: i64) -> Self {
                value as $T
            }
        }
    };
}

impl_packed_item!(i8, 1);
impl_packed_item!(i16, 2);
impl_packed_item!(i32, 4);
