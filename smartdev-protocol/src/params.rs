//! Parameter maps and parameter value storage
//!
//! A device declares up to [`MAX_PARAMETERS`] parameters. Messages refer to
//! subsets of them with a [`ParamMap`] bitset, and carry their raw values in
//! ascending bit order. The values themselves live in a [`ParamTable`], a
//! fixed-capacity byte arena with one span per declared parameter.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use heapless::Vec;

/// Maximum number of parameters (bit width of [`ParamMap`])
pub const MAX_PARAMETERS: usize = 16;

/// Total bytes available for parameter values
pub const PARAM_STORAGE_SIZE: usize = 512;

/// Parameter layout declared by a device
///
/// One entry per parameter in declaration order: `Some(size)` for a
/// parameter with backing storage, `None` for a slot without.
pub type ParamLayout = Vec<Option<usize>, MAX_PARAMETERS>;

/// Errors building a [`ParamTable`] from a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// More than [`MAX_PARAMETERS`] entries
    TooManyParameters,
    /// Combined sizes exceed [`PARAM_STORAGE_SIZE`]
    StorageExhausted,
}

/// Bitset selecting parameters by declaration index
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamMap(u16);

impl ParamMap {
    /// No parameters
    pub const EMPTY: Self = Self(0);

    /// Encoded size in bytes
    pub const SIZE: usize = 2;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Map with only `index` set (empty if out of range)
    pub const fn single(index: usize) -> Self {
        if index < MAX_PARAMETERS {
            Self(1 << index)
        } else {
            Self::EMPTY
        }
    }

    /// Map with the first `count` parameters set
    pub const fn first(count: usize) -> Self {
        if count >= MAX_PARAMETERS {
            Self(u16::MAX)
        } else {
            Self((1u16 << count) - 1)
        }
    }

    pub const fn contains(self, index: usize) -> bool {
        index < MAX_PARAMETERS && (self.0 >> index) & 1 == 1
    }

    pub fn insert(&mut self, index: usize) {
        *self |= Self::single(index);
    }

    pub fn remove(&mut self, index: usize) {
        *self &= !Self::single(index);
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate set bit indices in ascending order
    pub fn iter(self) -> ParamIter {
        ParamIter { bits: self.0 }
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

impl fmt::Debug for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamMap({:#b})", self.0)
    }
}

impl BitAnd for ParamMap {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ParamMap {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for ParamMap {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ParamMap {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Not for ParamMap {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl IntoIterator for ParamMap {
    type Item = usize;
    type IntoIter = ParamIter;

    fn into_iter(self) -> ParamIter {
        self.iter()
    }
}

/// Ascending iterator over the set bits of a [`ParamMap`]
#[derive(Debug, Clone)]
pub struct ParamIter {
    bits: u16,
}

impl Iterator for ParamIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.bits == 0 {
            return None;
        }
        let index = self.bits.trailing_zeros() as usize;
        self.bits &= self.bits - 1;
        Some(index)
    }
}

/// Scalar value that can be stored in a parameter slot
///
/// Values are stored little-endian, matching the wire format.
pub trait Param: Copy {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Write the value into `dst[..SIZE]`
    fn write_bytes(self, dst: &mut [u8]);

    /// Read a value from `src[..SIZE]`
    fn read_bytes(src: &[u8]) -> Self;
}

macro_rules! impl_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Param for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn write_bytes(self, dst: &mut [u8]) {
                    dst[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                fn read_bytes(src: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_param!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Param for bool {
    const SIZE: usize = 1;

    fn write_bytes(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }

    fn read_bytes(src: &[u8]) -> Self {
        src[0] != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    offset: usize,
    size: usize,
}

/// Fixed-capacity storage for parameter values
///
/// Built once from a device's [`ParamLayout`]. Slots declared without
/// storage have no span: they are skipped when serializing and never
/// written when deserializing.
#[derive(Clone)]
pub struct ParamTable {
    spans: [Option<Span>; MAX_PARAMETERS],
    count: usize,
    storage: [u8; PARAM_STORAGE_SIZE],
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl ParamTable {
    /// Table with no declared parameters
    pub const fn empty() -> Self {
        Self {
            spans: [None; MAX_PARAMETERS],
            count: 0,
            storage: [0; PARAM_STORAGE_SIZE],
        }
    }

    /// Allocate spans for `layout`, zero-initialized
    pub fn new(layout: &[Option<usize>]) -> Result<Self, LayoutError> {
        if layout.len() > MAX_PARAMETERS {
            return Err(LayoutError::TooManyParameters);
        }

        let mut table = Self::empty();
        let mut offset = 0;
        for (index, size) in layout.iter().enumerate() {
            if let Some(size) = *size {
                let end = offset + size;
                if end > PARAM_STORAGE_SIZE {
                    return Err(LayoutError::StorageExhausted);
                }
                table.spans[index] = Some(Span { offset, size });
                offset = end;
            }
        }
        table.count = layout.len();
        Ok(table)
    }

    /// Number of declared parameters (with or without storage)
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Map of all declared parameters
    pub fn declared(&self) -> ParamMap {
        ParamMap::first(self.count)
    }

    /// Size of parameter `index`, if it has storage
    pub fn size(&self, index: usize) -> Option<usize> {
        self.span(index).map(|span| span.size)
    }

    /// Raw bytes of parameter `index`
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let span = self.span(index)?;
        Some(&self.storage[span.offset..span.offset + span.size])
    }

    /// Mutable raw bytes of parameter `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let span = self.span(index)?;
        Some(&mut self.storage[span.offset..span.offset + span.size])
    }

    /// Typed read; `None` if the slot is absent or sized differently
    pub fn load<T: Param>(&self, index: usize) -> Option<T> {
        let bytes = self.get(index)?;
        if bytes.len() != T::SIZE {
            return None;
        }
        Some(T::read_bytes(bytes))
    }

    /// Typed write; returns false if the slot is absent or sized differently
    pub fn store<T: Param>(&mut self, index: usize, value: T) -> bool {
        match self.get_mut(index) {
            Some(bytes) if bytes.len() == T::SIZE => {
                value.write_bytes(bytes);
                true
            }
            _ => false,
        }
    }

    /// Number of value bytes `present` contributes to a message
    pub fn encoded_len(&self, present: ParamMap) -> usize {
        present
            .iter()
            .filter_map(|index| self.size(index))
            .sum()
    }

    fn span(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied().flatten()
    }
}

impl fmt::Debug for ParamTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamTable")
            .field("count", &self.count)
            .field("spans", &self.spans)
            .finish()
    }
}
