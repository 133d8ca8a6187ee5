//! Reader and writer for the rive binary animation format.

pub mod object;
pub mod reader;
pub mod stream;
pub mod type_def;
pub mod writer;

pub use object::{PropertyAnimation, RiveObject, RiveValue};
pub use reader::{read_file, RiveFile};
pub use stream::{RiveHeader, RiveStream, StreamError};
pub use type_def::{DefinitionTable, ObjectDefinition, PropertyDef, PropertyType, TypeId};
pub use writer::RiveWriter;
