//! Little-endian byte reader for the rive binary format.

use super::type_def::PropertyType;
use std::collections::HashMap;
use thiserror::Error;

pub const MAGIC: &[u8; 4] = b"RIVE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("unexpected end of stream at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("varuint at byte {offset} does not fit in 64 bits")]
    Overflow { offset: usize },

    #[error("invalid UTF-8 string at byte {offset}")]
    InvalidString { offset: usize },

    #[error("missing RIVE signature")]
    BadMagic,
}

impl StreamError {
    pub fn category(&self) -> &'static str {
        match self {
            StreamError::UnexpectedEof { .. } => "truncated",
            StreamError::Overflow { .. } | StreamError::InvalidString { .. } => "malformed",
            StreamError::BadMagic => "signature",
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;

/// File header: version, file id and the table of property keys the writer
/// knew about, so readers can skip keys missing from their own definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiveHeader {
    pub major: u64,
    pub minor: u64,
    pub file_id: u64,
    pub property_table: HashMap<u64, PropertyType>,
}

pub struct RiveStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RiveStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn eof(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(StreamError::UnexpectedEof {
                offset: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_float(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// LEB128 unsigned integer.
    pub fn read_varuint(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 || (shift == 63 && (byte & 0x7f) > 1) {
                return Err(StreamError::Overflow { offset: start });
            }
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Length-prefixed raw bytes.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varuint()?;
        let len = usize::try_from(len).map_err(|_| StreamError::UnexpectedEof {
            offset: self.data.len(),
        })?;
        self.take(len)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.pos;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| StreamError::InvalidString { offset })
    }

    pub fn read_header(&mut self) -> Result<RiveHeader> {
        if self.take(MAGIC.len()).ok() != Some(&MAGIC[..]) {
            return Err(StreamError::BadMagic);
        }

        let major = self.read_varuint()?;
        let minor = self.read_varuint()?;
        let file_id = self.read_varuint()?;
        let property_table = self.read_property_table()?;

        Ok(RiveHeader {
            major,
            minor,
            file_id,
            property_table,
        })
    }

    /// Keys terminated by 0, followed by their 2-bit field types packed four
    /// to a 32-bit word.
    pub fn read_property_table(&mut self) -> Result<HashMap<u64, PropertyType>> {
        let mut keys = Vec::new();
        loop {
            let key = self.read_varuint()?;
            if key == 0 {
                break;
            }
            keys.push(key);
        }

        let mut table = HashMap::with_capacity(keys.len());
        let mut word = 0u32;
        for (i, key) in keys.into_iter().enumerate() {
            let bit = (i % 4) * 2;
            if bit == 0 {
                word = self.read_u32()?;
            }
            table.insert(key, PropertyType::from_field_type(word >> bit));
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_multi_byte_varuint() {
        let bytes = [0xe5, 0x8e, 0x26];
        let mut stream = RiveStream::new(&bytes);
        assert_eq!(stream.read_varuint().unwrap(), 624485);
        assert!(stream.eof());
    }

    #[test]
    fn truncated_varuint_is_an_error() {
        let bytes = [0x80, 0x80];
        let mut stream = RiveStream::new(&bytes);
        assert_eq!(
            stream.read_varuint(),
            Err(StreamError::UnexpectedEof { offset: 2 })
        );
    }

    #[test]
    fn reads_string_and_float() {
        let mut bytes = vec![3, b'a', b'b', b'c'];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        let mut stream = RiveStream::new(&bytes);
        assert_eq!(stream.read_string().unwrap(), "abc");
        assert_eq!(stream.read_float().unwrap(), 1.5);
    }

    #[test]
    fn header_reads_property_table() {
        let mut bytes = b"RIVE".to_vec();
        // major, minor, file id
        bytes.extend_from_slice(&[7, 0, 42]);
        // keys 200, 201, 202 then terminator
        bytes.extend_from_slice(&[0xc8, 0x01, 0xc9, 0x01, 0xca, 0x01, 0]);
        // float, string, color
        let word: u32 = 2 | (1 << 2) | (3 << 4);
        bytes.extend_from_slice(&word.to_le_bytes());

        let header = RiveStream::new(&bytes).read_header().unwrap();
        assert_eq!(header.major, 7);
        assert_eq!(header.file_id, 42);
        assert_eq!(header.property_table[&200], PropertyType::Float);
        assert_eq!(header.property_table[&201], PropertyType::String);
        assert_eq!(header.property_table[&202], PropertyType::Color);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = RiveStream::new(b"RIFF\x07\x00").read_header().unwrap_err();
        assert_eq!(err, StreamError::BadMagic);
        assert_eq!(err.category(), "signature");
    }
}
