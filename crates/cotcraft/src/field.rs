//! Raw schema definitions used to build a [crate::schema::Schema].
//!
//! These mirror the schema document one to one and are not validated. Use
//! [crate::schema::Schema::compile] to turn them into typed, checked layouts.

/// Type tag that marks a field as a counted array of a reference.
pub const ARRAY_TYPE: &str = "array";

/// A single field of a message or reference layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    /// `detail/node/leaf.attr` path, `.uid`-style primitive binding, `point.lat`-style
    /// position binding, or the name of a reference.
    pub name: String,
    /// `"array"` for arrays. On the first field of a message this holds the message type.
    pub field_type: String,
    /// Rule matching event types against the message type (first field only).
    pub type_match: String,
    /// Byte width consumed by the converter.
    pub length: usize,
    pub range_min: f64,
    pub range_max: f64,
    /// Converter name; empty for plain reference fields.
    pub converter: String,
    /// Byte ceiling or length-prefix sentinel (`0x7F`, `0x7FFF`), or mask window width.
    pub size_limit: usize,
    /// Absolute byte offset of fixed-position trailer fields.
    pub offset: Option<usize>,
    /// Bit offset inside a mask window, counted from the least significant bit.
    pub relative_offset: usize,
    /// Ordered labels of mask converters.
    pub selections: Vec<String>,
    /// Constant or default value. A leading `$` copies another attribute.
    pub value: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, converter: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            converter: converter.into(),
            length,
            ..Default::default()
        }
    }

    pub fn is_array(&self) -> bool {
        self.field_type == ARRAY_TYPE
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldDef> for Field {
    fn from(value: crate::serde::FieldDef) -> Self {
        Field {
            name: value.name,
            field_type: value.field_type,
            type_match: value.type_match,
            length: value.length,
            range_min: value.range_min,
            range_max: value.range_max,
            converter: value.converter,
            size_limit: value.size_limit,
            offset: value.offset.and_then(|offset| usize::try_from(offset).ok()),
            relative_offset: value.relative_offset,
            selections: value.selections,
            value: value.value.filter(|value| !value.is_empty()),
        }
    }
}

/// A named, reusable field list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    pub name: String,
    pub content: Vec<Field>,
    /// Element converter run once per position instead of walking `content`.
    pub converter: Option<String>,
}

#[cfg(feature = "serde")]
impl From<crate::serde::RefDef> for Reference {
    fn from(value: crate::serde::RefDef) -> Self {
        Reference {
            name: value.name,
            content: value.content.into_iter().map(Into::into).collect(),
            converter: value.converter.filter(|converter| !converter.is_empty()),
        }
    }
}

/// One message layout. The first field carries the message type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLayout {
    pub content: Vec<Field>,
}

#[cfg(feature = "serde")]
impl From<crate::serde::MessageDef> for MessageLayout {
    fn from(value: crate::serde::MessageDef) -> Self {
        MessageLayout {
            content: value.content.into_iter().map(Into::into).collect(),
        }
    }
}
