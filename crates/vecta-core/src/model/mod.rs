//! The document model: values, properties, object types and the node graph.

pub mod animatable;
pub mod document;
pub mod node;
pub mod object;
pub mod paint;
pub mod property;
pub mod registry;
pub mod traits;
pub mod transition;
pub mod value;

/// Index of a node in its [`Document`] arena.
pub type NodeId = usize;

pub use animatable::{Animatable, Interpolatable, Keyframe, MidTransition, MidTransitionKind};
pub use document::{CommandSink, Document, DocumentEvent, Node, SetPropertyCommand};
pub use node::ChildRange;
pub use object::Object;
pub use paint::{Brush, GradientKind, PaintMode, PaintOp, PaintStyle, Painter, RecordingPainter};
pub use property::{Property, ReferencePolicy, Slot};
pub use registry::{ObjectKind, ObjectType, Registry};
pub use traits::{PropertyFlags, PropertyTraits, PropertyType};
pub use transition::{Descriptive, KeyframeTransition};
pub use value::{Color, GradientStop, Value};
