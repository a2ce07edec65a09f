use crate::error::{ModelError, Result};
use crate::types::{NativeType, NcType};

/// A named, typed attribute value. Values are kept as a native-endian byte
/// buffer holding `len()` elements of `nc_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    nc_type: NcType,
    bytes: Vec<u8>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, nc_type: NcType, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName { kind: "attribute" });
        }
        if bytes.len() % nc_type.size() != 0 {
            return Err(ModelError::AttributeLength {
                name,
                bytes: bytes.len(),
                element_size: nc_type.size(),
            });
        }
        Ok(Self {
            name,
            nc_type,
            bytes,
        })
    }

    /// Character attribute.
    pub fn text(name: impl Into<String>, value: &str) -> Result<Self> {
        Self::new(name, NcType::Char, value.as_bytes().to_vec())
    }

    pub fn from_values<T: NativeType>(name: impl Into<String>, values: &[T]) -> Result<Self> {
        let mut bytes = Vec::new();
        T::extend_ne(values, &mut bytes);
        Self::new(name, T::NC_TYPE, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nc_type(&self) -> NcType {
        self.nc_type
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.nc_type.size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Text content of a char attribute, trailing NULs stripped.
    pub fn as_text(&self) -> Option<String> {
        if !self.nc_type.is_char() {
            return None;
        }
        let end = self
            .bytes
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |i| i + 1);
        Some(String::from_utf8_lossy(&self.bytes[..end]).into_owned())
    }

    /// Typed values, when `T` matches the stored type exactly.
    pub fn values<T: NativeType>(&self) -> Option<Vec<T>> {
        (T::NC_TYPE == self.nc_type).then(|| T::from_ne_slice(&self.bytes))
    }
}
