//! Error types for schema compilation, lookup tables and frame conversion.

use thiserror::Error;

/// Errors produced when compiling raw definitions into a [crate::schema::Schema].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Byte length is not supported by the field's converter.
    #[error("field `{field}`: length {length} is not valid for its converter")]
    InvalidLength { field: String, length: usize },
    /// `rangeMin`/`rangeMax` do not describe a non-empty finite interval.
    #[error("field `{0}`: invalid value range")]
    InvalidRange(String),
    /// Size limit is neither a length-prefix sentinel nor a usable byte count.
    #[error("field `{field}`: size limit {size_limit:#x} is not valid here")]
    InvalidSizeLimit { field: String, size_limit: usize },
    /// Selection list is empty or does not fit the mask window.
    #[error("field `{0}`: selections do not fit the mask window")]
    InvalidSelections(String),
    /// Field name is not a `detail/...node.attr` path.
    #[error("field `{0}`: not a valid detail attribute path")]
    InvalidPath(String),
    /// Field name does not bind to a known event or position primitive.
    #[error("field `{0}`: unknown primitive binding")]
    UnknownBinding(String),
    /// Field refers to a reference that is not defined.
    #[error("unknown reference `{0}`")]
    UnknownReference(String),
    /// A reference contains itself, directly or through other references.
    #[error("reference `{0}` is recursive")]
    RecursiveReference(String),
    /// Fixed offset puts the field's end beyond any addressable frame position.
    #[error("field `{field}`: offset {offset} is out of range")]
    InvalidOffset { field: String, offset: usize },
    /// Fixed-position field declared without an offset.
    #[error("field `{0}` needs a fixed offset")]
    MissingOffset(String),
    /// Checksum or message length used outside the trailer reference.
    #[error("field `{0}` is only allowed in the trailer reference")]
    MisplacedFrameField(String),
    /// Trailer reference holds a field that is not a checksum or message length.
    #[error("trailer field `{0}` must be a checksum or message length")]
    UnsupportedTrailerField(String),
    /// Message has no fields, or its first field cannot carry the message type.
    #[error("message {0} has no usable type field")]
    InvalidMessage(usize),
    /// More messages than a one-byte type id can address.
    #[error("{0} messages exceed the 256 addressable type ids")]
    TooManyMessages(usize),
    /// Link point converters are used but the shared point layout is missing.
    #[error("link point fields need the `ref-point` layout")]
    MissingPointLayout,
    /// Link point layout field is not a scaled float.
    #[error("point layout field `{0}` must be a scaled float")]
    InvalidPointField(String),
    /// Message selection names a predicate nobody registered.
    #[error("no type predicate registered under `{0}`")]
    UnknownPredicate(String),
}

/// Errors produced when building a [crate::lookup::LookupTable].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Entries must be inserted with ids 0, 1, 2, ... in order.
    #[error("lookup entry id {actual} is out of sequence, expected {expected}")]
    OutOfSequence { expected: usize, actual: usize },
    /// Row does not have the columns the table needs.
    #[error("lookup row {row} has {columns} columns, expected {expected}")]
    MalformedRow {
        row: usize,
        columns: usize,
        expected: usize,
    },
}

/// Errors produced by [crate::Interpreter::expected_length].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Not enough bytes yet to tell the type or the declared length.
    #[error("message is too short to determine its length")]
    TooShort,
    /// Byte 1 does not name a registered message.
    #[error("no message registered for type id {0}")]
    UnknownType(u8),
}

/// Errors produced when decoding a frame into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame is too short to carry a type id.
    #[error("frame is too short to determine its type")]
    TooShort,
    /// Byte 1 does not name a registered message.
    #[error("unknown type id {0}")]
    UnknownTypeId(u8),
    /// XOR fold of the frame is not zero.
    #[error("message checksum failed")]
    ChecksumFailed,
    /// Declared frame length exceeds the received bytes.
    #[error("incomplete message: declared {declared} bytes, got {actual}")]
    IncompleteMessage { declared: usize, actual: usize },
    /// A field reads past the end of the frame.
    #[error("field `{field}` needs {needed} bytes at offset {offset}, frame has {available}")]
    Truncated {
        field: String,
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A node on the field's path is absent and auto-fill is off.
    #[error("required node `{0}` is absent")]
    MissingNode(String),
    /// An attribute the converter depends on is absent.
    #[error("required attribute `{0}` is absent")]
    MissingAttribute(String),
    /// Text bytes are not valid UTF-8.
    #[error("field `{0}`: text is not valid UTF-8")]
    InvalidText(String),
    /// Mask value does not index a selection.
    #[error("field `{field}`: no selection for mask value {index}")]
    UnknownSelection { field: String, index: u64 },
    /// Icon id is not present in its lookup table.
    #[error("{table} id {id} is not indexed")]
    UnknownIcon { table: &'static str, id: u16 },
}

/// Errors produced when encoding an event into a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// No message layout accepts the event type.
    #[error("no schema accepts event type `{0}`")]
    NoSchema(String),
    /// Message selection names a predicate nobody registered.
    #[error("no type predicate registered under `{0}`")]
    UnknownPredicate(String),
    /// Attribute is absent and the field has no default value.
    #[error("field `{0}`: attribute is absent and has no default")]
    MissingAttribute(String),
    /// Text is longer than the field's size limit.
    #[error("field `{field}`: {actual} bytes exceed the limit of {limit}")]
    SizeLimitExceeded {
        field: String,
        limit: usize,
        actual: usize,
    },
    /// Attribute is not a valid number.
    #[error("field `{field}`: `{literal}` is not a valid number")]
    InvalidNumber { field: String, literal: String },
    /// Attribute is not valid standard base64.
    #[error("field `{0}`: attribute is not valid base64")]
    InvalidBase64(String),
    /// Number does not fit the field width.
    #[error("field `{field}`: {value} does not fit in {width} bytes")]
    ValueOutOfRange {
        field: String,
        value: i64,
        width: usize,
    },
    /// Attribute value is not one of the field's selections.
    #[error("field `{field}`: `{value}` is not a known selection")]
    UnknownSelection { field: String, value: String },
    /// Icon path or file is not present in its lookup table.
    #[error("icon `{0}` is not indexed")]
    IconNotIndexed(String),
    /// Array element count does not fit the count prefix or fixed size.
    #[error("array `{field}`: {actual} elements, expected {expected}")]
    ArrayCountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    /// Frame length does not fit the message length field.
    #[error("frame of {len} bytes does not fit a {width}-byte length field")]
    FrameTooLong { len: usize, width: usize },
    /// Fixed-offset field points outside the encoded frame.
    #[error("field `{field}` at offset {offset} lies outside the frame")]
    OutOfBounds { field: String, offset: usize },
}

/// Errors produced when loading an interpreter from JSON documents.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Document is not valid JSON for the expected shape.
    #[error("invalid document: {0}")]
    Json(String),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Table(#[from] TableError),
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for LoadError {
    fn from(value: serde_json::Error) -> Self {
        LoadError::Json(value.to_string())
    }
}
