//! Conversions between logical leaf types and their physical storage types.

use crate::error::{Error, Result};
use crate::physical::{PhysicalType, PhysicalValue};
use bytes::{Bytes, BytesMut};
use std::fmt::Debug;

/// Arena for the byte-array values of one buffered batch.
///
/// Every appended slice is frozen into a [`Bytes`] handle sharing the
/// arena's allocation. [`ByteBuffer::reset`] starts the next batch with
/// room for as many bytes as the last one held, reclaiming the previous
/// allocation once its handles are dropped.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    arena: BytesMut,
    pending: usize,
}

impl ByteBuffer {
    /// Copies `data` into the arena and returns a handle to the copy.
    pub fn append(&mut self, data: &[u8]) -> Bytes {
        self.arena.extend_from_slice(data);
        self.pending += data.len();
        self.arena.split().freeze()
    }

    /// Returns the count of bytes appended since the last reset.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Returns the count of bytes which can be appended without allocating.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Starts a new batch.
    pub fn reset(&mut self) {
        self.arena.reserve(self.pending);
        self.pending = 0;
    }
}

/// A logical leaf type which can be stored in a physical column.
pub trait LeafType: Sized + Debug {
    /// The physical representation handed to the column writer.
    type Physical: Clone + Default + Debug;

    /// Set when conversion is a plain copy which never fails, which enables
    /// the batch read path for flat required columns.
    const DIRECT: bool = false;

    /// The physical type this leaf type is stored as, or `None` if it is
    /// decided per value.
    fn physical_type() -> Option<PhysicalType>;

    fn to_physical(&self, bytes: &mut ByteBuffer) -> Self::Physical;

    fn from_physical(physical: &Self::Physical) -> Result<Self>;
}

macro_rules! direct_leaf_type {
    ($ty:ty, $physical_type:expr) => {
        impl LeafType for $ty {
            type Physical = $ty;
            const DIRECT: bool = true;

            fn physical_type() -> Option<PhysicalType> {
                Some($physical_type)
            }

            fn to_physical(&self, _bytes: &mut ByteBuffer) -> Self::Physical {
                *self
            }

            fn from_physical(physical: &Self::Physical) -> Result<Self> {
                Ok(*physical)
            }
        }
    };
}

direct_leaf_type!(bool, PhysicalType::Boolean);
direct_leaf_type!(i32, PhysicalType::Int32);
direct_leaf_type!(i64, PhysicalType::Int64);
direct_leaf_type!(f32, PhysicalType::Float);
direct_leaf_type!(f64, PhysicalType::Double);

macro_rules! narrow_leaf_type {
    ($ty:ty, $physical:ty, $physical_type:expr) => {
        impl LeafType for $ty {
            type Physical = $physical;

            fn physical_type() -> Option<PhysicalType> {
                Some($physical_type)
            }

            fn to_physical(&self, _bytes: &mut ByteBuffer) -> Self::Physical {
                <$physical>::from(*self)
            }

            fn from_physical(physical: &Self::Physical) -> Result<Self> {
                <$ty>::try_from(*physical)
                    .map_err(|e| Error::conversion(stringify!($ty), format!("{physical}: {e}")))
            }
        }
    };
}

narrow_leaf_type!(i8, i32, PhysicalType::Int32);
narrow_leaf_type!(i16, i32, PhysicalType::Int32);
narrow_leaf_type!(u8, i32, PhysicalType::Int32);
narrow_leaf_type!(u16, i32, PhysicalType::Int32);

// Unsigned 32 and 64 bit integers keep their bit pattern in the signed
// physical type.
impl LeafType for u32 {
    type Physical = i32;

    fn physical_type() -> Option<PhysicalType> {
        Some(PhysicalType::Int32)
    }

    fn to_physical(&self, _bytes: &mut ByteBuffer) -> Self::Physical {
        *self as i32
    }

    fn from_physical(physical: &Self::Physical) -> Result<Self> {
        Ok(*physical as u32)
    }
}

impl LeafType for u64 {
    type Physical = i64;

    fn physical_type() -> Option<PhysicalType> {
        Some(PhysicalType::Int64)
    }

    fn to_physical(&self, _bytes: &mut ByteBuffer) -> Self::Physical {
        *self as i64
    }

    fn from_physical(physical: &Self::Physical) -> Result<Self> {
        Ok(*physical as u64)
    }
}

impl LeafType for Bytes {
    type Physical = Bytes;
    const DIRECT: bool = true;

    fn physical_type() -> Option<PhysicalType> {
        Some(PhysicalType::ByteArray)
    }

    fn to_physical(&self, _bytes: &mut ByteBuffer) -> Self::Physical {
        self.clone()
    }

    fn from_physical(physical: &Self::Physical) -> Result<Self> {
        Ok(physical.clone())
    }
}

impl LeafType for Vec<u8> {
    type Physical = Bytes;

    fn physical_type() -> Option<PhysicalType> {
        Some(PhysicalType::ByteArray)
    }

    fn to_physical(&self, bytes: &mut ByteBuffer) -> Self::Physical {
        bytes.append(self)
    }

    fn from_physical(physical: &Self::Physical) -> Result<Self> {
        Ok(physical.to_vec())
    }
}

impl LeafType for String {
    type Physical = Bytes;

    fn physical_type() -> Option<PhysicalType> {
        Some(PhysicalType::ByteArray)
    }

    fn to_physical(&self, bytes: &mut ByteBuffer) -> Self::Physical {
        bytes.append(self.as_bytes())
    }

    fn from_physical(physical: &Self::Physical) -> Result<Self> {
        std::str::from_utf8(physical)
            .map(str::to_owned)
            .map_err(|e| Error::conversion("String", e.to_string()))
    }
}

impl LeafType for PhysicalValue {
    type Physical = PhysicalValue;
    const DIRECT: bool = true;

    fn physical_type() -> Option<PhysicalType> {
        None
    }

    fn to_physical(&self, _bytes: &mut ByteBuffer) -> Self::Physical {
        self.clone()
    }

    fn from_physical(physical: &Self::Physical) -> Result<Self> {
        Ok(physical.clone())
    }
}

/// Checks if values of `T` can be stored in a column of `physical_type`.
pub(crate) fn is_compatible<T: LeafType>(physical_type: PhysicalType) -> bool {
    T::physical_type().map_or(true, |t| t == physical_type)
}
