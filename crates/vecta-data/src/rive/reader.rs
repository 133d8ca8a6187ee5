use super::object::{RiveObject, RiveValue};
use super::stream::{Result, RiveHeader, RiveStream};
use super::type_def::{DefinitionTable, PropertyType, TypeId};
use crate::diagnostics::Diagnostics;
use std::collections::HashMap;

/// Header plus the flat record arena, in file order.
#[derive(Debug, Clone)]
pub struct RiveFile {
    pub header: RiveHeader,
    pub objects: Vec<RiveObject>,
}

/// Decodes a whole file into a record arena.
///
/// Unknown types and properties are reported to `diagnostics` and cost only
/// the affected record. A truncated or corrupt stream is returned as an error.
pub fn read_file(data: &[u8], diagnostics: &mut dyn Diagnostics) -> Result<RiveFile> {
    let mut stream = RiveStream::new(data);
    let header = stream.read_header()?;
    tracing::debug!(
        major = header.major,
        minor = header.minor,
        file_id = header.file_id,
        "reading rive file"
    );

    let mut reader = RiveReader {
        stream,
        extra_props: header.property_table.clone(),
        table: DefinitionTable::global(),
        diagnostics,
    };
    let objects = reader.read_objects()?;
    Ok(RiveFile { header, objects })
}

struct RiveReader<'a, 'd> {
    stream: RiveStream<'a>,
    extra_props: HashMap<u64, PropertyType>,
    table: &'static DefinitionTable,
    diagnostics: &'d mut dyn Diagnostics,
}

impl RiveReader<'_, '_> {
    fn read_objects(&mut self) -> Result<Vec<RiveObject>> {
        let total = self.stream.remaining();
        self.diagnostics.progress_max(total);

        let mut objects = Vec::new();
        while !self.stream.eof() {
            let type_id = TypeId(self.stream.read_varuint()?);
            if type_id == TypeId::NO_TYPE {
                // Left over when `resync` stopped on a zero inside a value
                self.diagnostics.warning(format!(
                    "Skipping stray record terminator at offset {}",
                    self.stream.position() - 1
                ));
                continue;
            }
            objects.push(self.read_object(type_id)?);
            self.diagnostics.progress(total - self.stream.remaining());
        }
        Ok(objects)
    }

    fn read_object(&mut self, type_id: TypeId) -> Result<RiveObject> {
        let table = self.table;

        let (definitions, property_definitions) = match table.gather(type_id) {
            Ok(found) => found,
            Err(missing) => {
                self.diagnostics
                    .error(format!("Unknown object of type {}", missing));
                self.skip_record()?;
                return Ok(RiveObject::placeholder());
            }
        };

        let mut object = RiveObject {
            type_id,
            definitions,
            property_definitions,
            ..RiveObject::placeholder()
        };

        loop {
            let prop_id = self.stream.read_varuint()?;
            if prop_id == 0 {
                break;
            }

            if let Some(def) = object.property_definitions.get(&prop_id) {
                let name = def.name;
                let value = self.read_value(def.kind)?;
                object.properties.insert(name, value);
            } else if let Some(&kind) = self.extra_props.get(&prop_id) {
                self.diagnostics.warning(format!(
                    "Skipping unknown property {} of {} ({})",
                    prop_id,
                    type_id,
                    object.type_name()
                ));
                self.read_value(kind)?;
            } else if let Some(def) = table.property(prop_id) {
                self.diagnostics.error(format!(
                    "Property {} ({}) does not belong to {} ({})",
                    prop_id,
                    def.name,
                    type_id,
                    object.type_name()
                ));
                self.read_value(def.kind)?;
            } else {
                self.diagnostics.error(format!(
                    "Unknown property {} of {} ({})",
                    prop_id,
                    type_id,
                    object.type_name()
                ));
                self.resync()?;
                return Ok(RiveObject::placeholder());
            }
        }

        Ok(object)
    }

    fn read_value(&mut self, kind: PropertyType) -> Result<RiveValue> {
        Ok(match kind {
            PropertyType::VarUint => RiveValue::Uint(self.stream.read_varuint()?),
            PropertyType::Bool => RiveValue::Bool(self.stream.read_u8()? != 0),
            PropertyType::String => RiveValue::String(self.stream.read_string()?),
            PropertyType::Bytes => RiveValue::Bytes(self.stream.read_bytes()?.to_vec()),
            PropertyType::Float => RiveValue::Float(self.stream.read_float()?),
            PropertyType::Color => RiveValue::Color(self.stream.read_u32()?),
        })
    }

    /// Consumes the properties of a record whose type is unknown, using the
    /// global key table to size each value.
    fn skip_record(&mut self) -> Result<()> {
        let table = self.table;
        loop {
            let prop_id = self.stream.read_varuint()?;
            if prop_id == 0 {
                return Ok(());
            }
            let kind = self
                .extra_props
                .get(&prop_id)
                .copied()
                .or_else(|| table.property(prop_id).map(|p| p.kind));
            match kind {
                Some(kind) => {
                    self.read_value(kind)?;
                }
                None => return self.resync(),
            }
        }
    }

    /// Value size is unknown: scan forward to the record terminator.
    ///
    /// Best effort only. The first zero byte ends the scan, so a value that
    /// itself contains a zero leaves the reader inside the record. A single
    /// leftover terminator is dropped by `read_objects`; any other trailing
    /// value bytes are read as a new record and usually surface as an
    /// unknown type.
    fn resync(&mut self) -> Result<()> {
        while !self.stream.eof() {
            if self.stream.read_u8()? == 0 {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLog;
    use crate::rive::writer::RiveWriter;

    fn header(writer: &mut RiveWriter, extra: &[(u64, PropertyType)]) {
        writer.write_header(7, 0, 1, extra);
    }

    #[test]
    fn reads_records_in_order() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[]);
        writer
            .begin_object(TypeId::ARTBOARD)
            .string_property(4, "Main")
            .float_property(7, 320.0)
            .float_property(8, 240.0)
            .end_object();
        writer
            .begin_object(TypeId::SHAPE)
            .uint_property(5, 0)
            .float_property(13, 10.0)
            .end_object();

        let mut log = DiagnosticLog::new();
        let file = read_file(&writer.into_bytes(), &mut log).unwrap();
        assert!(log.is_empty());
        assert_eq!(file.objects.len(), 2);
        assert_eq!(file.objects[0].get_str("name"), Some("Main"));
        assert_eq!(file.objects[0].get_f64("width", 0.0), 320.0);
        assert_eq!(file.objects[1].get_u64("parentId", 99), 0);
        assert_eq!(file.objects[1].get_f64("x", 0.0), 10.0);
    }

    #[test]
    fn unknown_property_only_costs_its_record() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[]);
        writer.begin_object(TypeId::NODE).float_property(13, 1.0).end_object();
        writer.begin_object(TypeId::NODE).uint_property(4321, 5).end_object();
        writer.begin_object(TypeId::NODE).float_property(14, 2.0).end_object();

        let mut log = DiagnosticLog::new();
        let file = read_file(&writer.into_bytes(), &mut log).unwrap();

        assert_eq!(log.errors().count(), 1);
        assert!(log.errors().next().unwrap().contains("Unknown property 4321"));
        assert_eq!(file.objects.len(), 3);
        assert_eq!(file.objects[0].get_f64("x", 0.0), 1.0);
        assert!(file.objects[1].is_placeholder());
        assert_eq!(file.objects[2].get_f64("y", 0.0), 2.0);
    }

    #[test]
    fn zero_inside_unknown_value_leaves_a_stray_terminator() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[]);
        writer.begin_object(TypeId::NODE).float_property(13, 1.0).end_object();
        // Value 0 encodes as a single zero byte ahead of the real terminator
        writer.begin_object(TypeId::NODE).uint_property(4321, 0).end_object();
        writer.begin_object(TypeId::NODE).float_property(14, 2.0).end_object();

        let mut log = DiagnosticLog::new();
        let file = read_file(&writer.into_bytes(), &mut log).unwrap();

        assert_eq!(log.errors().count(), 1);
        assert!(log.warnings().any(|w| w.contains("stray record terminator")));
        assert_eq!(file.objects.len(), 3);
        assert!(file.objects[1].is_placeholder());
        assert_eq!(file.objects[2].get_f64("y", 0.0), 2.0);
    }

    #[test]
    fn zero_inside_unknown_value_misaligns_following_bytes() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[]);
        writer
            .begin_object(TypeId::NODE)
            .write_varuint(4321)
            .write_u8(0)
            .write_u8(0x7f)
            .end_object();

        let mut log = DiagnosticLog::new();
        let file = read_file(&writer.into_bytes(), &mut log).unwrap();

        // The byte after the zero is taken as a type id for a phantom record
        assert!(log.errors().any(|e| e.contains("Unknown property 4321")));
        assert!(log.errors().any(|e| e.contains("Unknown object of type 127")));
        assert_eq!(file.objects.len(), 2);
        assert!(file.objects.iter().all(|o| o.is_placeholder()));
    }

    #[test]
    fn extra_table_properties_are_skipped_with_a_warning() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[(900, PropertyType::Float)]);
        writer
            .begin_object(TypeId::NODE)
            .float_property(900, 0.0)
            .float_property(13, 3.0)
            .end_object();

        let mut log = DiagnosticLog::new();
        let file = read_file(&writer.into_bytes(), &mut log).unwrap();
        assert_eq!(log.warnings().count(), 1);
        assert!(!log.has_errors());
        assert_eq!(file.objects[0].get_f64("x", 0.0), 3.0);
    }

    #[test]
    fn unknown_type_is_skipped() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[]);
        writer.begin_object(TypeId(777)).string_property(4, "ghost").end_object();
        writer.begin_object(TypeId::NODE).string_property(4, "real").end_object();

        let mut log = DiagnosticLog::new();
        let file = read_file(&writer.into_bytes(), &mut log).unwrap();
        assert!(log.errors().next().unwrap().contains("Unknown object of type 777"));
        assert!(file.objects[0].is_placeholder());
        assert_eq!(file.objects[1].get_str("name"), Some("real"));
    }

    #[test]
    fn truncated_stream_is_fatal() {
        let mut writer = RiveWriter::new();
        header(&mut writer, &[]);
        writer.begin_object(TypeId::NODE).write_varuint(13).write_u8(0);
        let mut log = DiagnosticLog::new();
        let err = read_file(&writer.into_bytes(), &mut log).unwrap_err();
        assert_eq!(err.category(), "truncated");
    }
}
