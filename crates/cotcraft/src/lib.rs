//! # cotcraft
//!
//! Schema-driven transcoding between compact binary frames and CoT
//! situational-awareness events.
//!
//! A schema declares message layouts as ordered field lists. Each field names a
//! converter (integer, quantized float, bitmask, length-prefixed string, icon id,
//! link point, ...), a byte width and the event attribute it maps to. Layouts
//! are compiled once into a [Schema]; an [Interpreter] then decodes frames into
//! [Event]s and encodes events back into frames without any per-message code.
//!
//! ## Example
//!
//! ```
//! use cotcraft::{
//!     compiled::SHORT_PREFIX,
//!     field::{Field, MessageLayout},
//!     lookup::LookupTables,
//!     Event, Interpreter, Node, Schema,
//! };
//!
//! let message = MessageLayout {
//!     content: vec![
//!         Field {
//!             field_type: "a-f-G".to_string(),
//!             type_match: "prefix".to_string(),
//!             ..Field::new("reserved", "placeHolderConverter", 1)
//!         },
//!         Field::new("type", "messageTypeConverter", 1),
//!         Field {
//!             size_limit: SHORT_PREFIX,
//!             ..Field::new("detail/contact.callsign", "stringConverter", 0)
//!         },
//!     ],
//! };
//! let schema = Schema::compile(&[], &[message]).unwrap();
//! let interp = Interpreter::new(schema, LookupTables::default()).unwrap();
//!
//! let event = Event {
//!     event_type: "a-f-G-U-C".to_string(),
//!     detail: Some(Node::new("detail").with_child(Node::new("contact").with_attr("callsign", "ALPHA"))),
//!     ..Default::default()
//! };
//! let frame = interp.encode(&event).unwrap();
//! assert_eq!(frame, b"\x00\x00\x05ALPHA");
//!
//! let decoded = interp.decode(&frame).unwrap();
//! assert_eq!(decoded.event_type, "a-f-G");
//! ```

pub mod bits;
pub mod compiled;
pub mod converters;
pub mod cursor;
pub mod errors;
pub mod event;
pub mod field;
mod filler;
pub mod interpreter;
pub mod lookup;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod stream;
mod transcoder;
mod tree;

pub use event::{Event, Node};
pub use filler::Filler;
pub use interpreter::{Interpreter, InterpreterBuilder, Options, Predicate};
pub use schema::Schema;
pub use stream::FrameAssembler;
