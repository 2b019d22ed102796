//! Binary serialization trait for model records.
//!
//! Every fixed-size record implements `BinarySerializable`. The exporter
//! writes records through [`BinarySerializable::write_to`] and the loader
//! reads them through [`BinarySerializable::deserialize`], while each type
//! keeps its own `to_bytes()` returning a fixed-size array.

use std::io::{self, Write};

use super::{ArmatureHeader, BoneRecord, FormatError, MeshHeader, ModelHeader};

/// Trait for fixed-size binary records.
///
/// Uses `Vec<u8>` as the return type because associated const generics in
/// return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use hell_common::formats::{ArmatureHeader, BinarySerializable};
///
/// let header = ArmatureHeader::new("Rig", 3);
/// let bytes = header.serialize();
/// let parsed = ArmatureHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.bone_count, 3);
/// ```
pub trait BinarySerializable: Sized {
    /// Largest serialized size of the record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from the front of `bytes`.
    fn deserialize(bytes: &[u8]) -> Result<Self, FormatError>;

    /// Bytes this record occupies in a file.
    fn encoded_size(&self) -> usize {
        Self::SIZE
    }

    /// Serialize straight into a writer.
    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.serialize())
    }
}

impl BinarySerializable for ModelHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes()[..self.encoded_size()].to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::parse(bytes)
    }

    fn encoded_size(&self) -> usize {
        ModelHeader::encoded_size(self)
    }
}

impl BinarySerializable for MeshHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::parse(bytes)
    }
}

impl BinarySerializable for ArmatureHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::parse(bytes)
    }
}

impl BinarySerializable for BoneRecord {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::parse(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_deserialize_insufficient_bytes() {
        assert!(matches!(
            ModelHeader::deserialize(&[0; 71]),
            Err(FormatError::TooShort { .. })
        ));
        assert!(MeshHeader::deserialize(&[0; 451]).is_err());
        assert!(ArmatureHeader::deserialize(&[0; 291]).is_err());
        assert!(BoneRecord::deserialize(&[0; 199]).is_err());
    }

    fn record_size<T: BinarySerializable>() -> usize {
        T::SIZE
    }

    #[test]
    fn test_generic_usage() {
        assert_eq!(record_size::<ModelHeader>(), 76);
        assert_eq!(record_size::<MeshHeader>(), 452);
        assert_eq!(record_size::<ArmatureHeader>(), 292);
        assert_eq!(record_size::<BoneRecord>(), 200);
    }

    #[test]
    fn test_write_to_matches_encoded_size() {
        let header = ModelHeader::new(1, 0, 7, Vec3::ZERO, Vec3::ONE);
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), header.encoded_size());
        assert_eq!(ModelHeader::deserialize(&buf), Ok(header));
    }
}
