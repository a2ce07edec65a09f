//! Host element types.

use std::fmt;

/// Element type of a variable or attribute, numbered as the host's classic
/// external type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NcType {
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
    UByte,
    UShort,
    UInt,
    Int64,
    UInt64,
}

impl NcType {
    pub const ALL: [NcType; 11] = [
        NcType::Byte,
        NcType::Char,
        NcType::Short,
        NcType::Int,
        NcType::Float,
        NcType::Double,
        NcType::UByte,
        NcType::UShort,
        NcType::UInt,
        NcType::Int64,
        NcType::UInt64,
    ];

    /// Host type id.
    pub fn id(self) -> i32 {
        match self {
            NcType::Byte => 1,
            NcType::Char => 2,
            NcType::Short => 3,
            NcType::Int => 4,
            NcType::Float => 5,
            NcType::Double => 6,
            NcType::UByte => 7,
            NcType::UShort => 8,
            NcType::UInt => 9,
            NcType::Int64 => 10,
            NcType::UInt64 => 11,
        }
    }

    pub fn from_id(id: i32) -> Option<NcType> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            NcType::Byte | NcType::Char | NcType::UByte => 1,
            NcType::Short | NcType::UShort => 2,
            NcType::Int | NcType::UInt | NcType::Float => 4,
            NcType::Double | NcType::Int64 | NcType::UInt64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NcType::Byte => "byte",
            NcType::Char => "char",
            NcType::Short => "short",
            NcType::Int => "int",
            NcType::Float => "float",
            NcType::Double => "double",
            NcType::UByte => "ubyte",
            NcType::UShort => "ushort",
            NcType::UInt => "uint",
            NcType::Int64 => "int64",
            NcType::UInt64 => "uint64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, NcType::Float | NcType::Double)
    }

    pub fn is_char(self) -> bool {
        self == NcType::Char
    }
}

impl fmt::Display for NcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust primitive with a fixed host element type.
///
/// Values travel through the model as native-endian byte buffers; this trait
/// converts between those buffers and typed slices.
pub trait NativeType: bytemuck::Pod + Default + Send + Sync {
    const NC_TYPE: NcType;

    /// Decode a native-endian buffer. Trailing bytes that do not fill a whole
    /// element are ignored.
    fn from_ne_slice(bytes: &[u8]) -> Vec<Self> {
        let size = std::mem::size_of::<Self>();
        let len = bytes.len() / size;
        let mut values = vec![Self::default(); len];
        bytemuck::cast_slice_mut::<Self, u8>(&mut values).copy_from_slice(&bytes[..len * size]);
        values
    }

    /// Append the native-endian encoding of `values` to `out`.
    fn extend_ne(values: &[Self], out: &mut Vec<u8>) {
        out.extend_from_slice(bytemuck::cast_slice(values));
    }
}

macro_rules! native_type {
    ($ty:ty, $nc:expr) => {
        impl NativeType for $ty {
            const NC_TYPE: NcType = $nc;
        }
    };
}

native_type!(i8, NcType::Byte);
native_type!(u8, NcType::UByte);
native_type!(i16, NcType::Short);
native_type!(u16, NcType::UShort);
native_type!(i32, NcType::Int);
native_type!(u32, NcType::UInt);
native_type!(i64, NcType::Int64);
native_type!(u64, NcType::UInt64);
native_type!(f32, NcType::Float);
native_type!(f64, NcType::Double);
