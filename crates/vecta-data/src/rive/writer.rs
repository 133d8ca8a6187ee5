//! Encoder counterpart of [`RiveStream`](super::RiveStream).

use super::stream::MAGIC;
use super::type_def::{PropertyType, TypeId};

#[derive(Debug, Default, Clone)]
pub struct RiveWriter {
    buffer: Vec<u8>,
}

impl RiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_float(&mut self, value: f32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_varuint(&mut self, mut value: u64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.push(byte);
                return self;
            }
            self.buffer.push(byte | 0x80);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_varuint(bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
        self
    }

    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_bytes(value.as_bytes())
    }

    pub fn write_header(
        &mut self,
        major: u64,
        minor: u64,
        file_id: u64,
        property_table: &[(u64, PropertyType)],
    ) -> &mut Self {
        self.buffer.extend_from_slice(MAGIC);
        self.write_varuint(major).write_varuint(minor).write_varuint(file_id);

        for (key, _) in property_table {
            self.write_varuint(*key);
        }
        self.write_varuint(0);

        for chunk in property_table.chunks(4) {
            let word = chunk
                .iter()
                .enumerate()
                .fold(0u32, |word, (i, (_, kind))| word | (kind.field_type() << (i * 2)));
            self.write_u32(word);
        }
        self
    }

    /// Starts a record. Follow with property writes and [`RiveWriter::end_object`].
    pub fn begin_object(&mut self, type_id: TypeId) -> &mut Self {
        self.write_varuint(type_id.0)
    }

    pub fn end_object(&mut self) -> &mut Self {
        self.write_varuint(0)
    }

    pub fn uint_property(&mut self, key: u64, value: u64) -> &mut Self {
        self.write_varuint(key).write_varuint(value)
    }

    pub fn bool_property(&mut self, key: u64, value: bool) -> &mut Self {
        self.write_varuint(key).write_u8(u8::from(value))
    }

    pub fn float_property(&mut self, key: u64, value: f32) -> &mut Self {
        self.write_varuint(key).write_float(value)
    }

    pub fn string_property(&mut self, key: u64, value: &str) -> &mut Self {
        self.write_varuint(key).write_string(value)
    }

    pub fn color_property(&mut self, key: u64, argb: u32) -> &mut Self {
        self.write_varuint(key).write_u32(argb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rive::RiveStream;

    #[test]
    fn varuint_encoding_matches_reader() {
        let mut writer = RiveWriter::new();
        writer.write_varuint(624485).write_varuint(0).write_varuint(u64::MAX);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..3], &[0xe5, 0x8e, 0x26]);

        let mut stream = RiveStream::new(&bytes);
        assert_eq!(stream.read_varuint().unwrap(), 624485);
        assert_eq!(stream.read_varuint().unwrap(), 0);
        assert_eq!(stream.read_varuint().unwrap(), u64::MAX);
    }

    #[test]
    fn header_packs_field_types() {
        let table = [
            (300, PropertyType::Float),
            (301, PropertyType::Color),
            (302, PropertyType::String),
            (303, PropertyType::VarUint),
            (304, PropertyType::Float),
        ];
        let mut writer = RiveWriter::new();
        writer.write_header(7, 0, 1, &table);
        let bytes = writer.into_bytes();

        let header = RiveStream::new(&bytes).read_header().unwrap();
        assert_eq!(header.property_table.len(), 5);
        assert_eq!(header.property_table[&301], PropertyType::Color);
        assert_eq!(header.property_table[&304], PropertyType::Float);
    }
}
