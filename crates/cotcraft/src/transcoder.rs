//! Per-frame conversion state and the schema walk.
//!
//! A [Decoder] keeps one explicit read offset into the frame. An [Encoder] is
//! append-only; only fixed-position trailer fields patch bytes already written.
//! Both are created for one conversion and consumed by `run`.

use std::collections::HashMap;

use tracing::trace;

use crate::{
    bits::{push_be, read_be},
    compiled::{ArrayCount, AttrPath, CompiledField, Converter, FieldKind},
    converters,
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    event::{Event, NodePath},
    interpreter::Options,
    lookup::LookupTables,
    schema::{Message, Schema},
    tree::{self, Fill},
};

/// Decoding state for one frame.
pub(crate) struct Decoder<'a> {
    pub schema: &'a Schema,
    pub tables: &'a LookupTables,
    pub options: &'a Options,
    pub message: &'a Message,
    /// The frame, cut to its declared length once the length field ran.
    pub buf: &'a [u8],
    pub offset: usize,
    pub event: Event,
}

impl<'a> Decoder<'a> {
    pub fn new(
        schema: &'a Schema,
        tables: &'a LookupTables,
        options: &'a Options,
        message: &'a Message,
        buf: &'a [u8],
    ) -> Self {
        Self {
            schema,
            tables,
            options,
            message,
            buf,
            offset: 0,
            event: Event::basic(options.stale_after),
        }
    }

    pub fn run(mut self) -> Result<Event, DecodeError> {
        let (schema, message) = (self.schema, self.message);
        if message.framed {
            let tail = schema.tail();
            // Lengths cut the frame before checksums fold it.
            let (lengths, checksums): (Vec<_>, Vec<_>) = tail
                .iter()
                .partition(|field| field.converter() == Some(&Converter::MessageLength));

            for field in lengths.into_iter().chain(checksums) {
                self.field(field, &mut Cursor::single())?;
            }
        }

        self.walk(&message.fields, &mut Cursor::single())?;

        Ok(self.event)
    }

    fn walk(&mut self, fields: &'a [CompiledField], cursor: &mut Cursor<'_>) -> Result<(), DecodeError> {
        cursor.first();
        while cursor.in_bounds() {
            for field in fields {
                self.field(field, cursor)?;
            }
            cursor.next();
        }

        Ok(())
    }

    fn field(&mut self, field: &'a CompiledField, cursor: &mut Cursor<'_>) -> Result<(), DecodeError> {
        trace!(
            field = %field.name,
            offset = self.offset,
            position = %cursor.trail(),
            "decode field"
        );

        match &field.kind {
            FieldKind::Scalar(converter) => converters::decode(self, converter, field, cursor),
            FieldKind::Array {
                reference,
                count,
                element,
            } => {
                let size = match *count {
                    ArrayCount::Prefixed(width) => read_be(self.take(field, width)?) as usize,
                    ArrayCount::Fixed(size) => size,
                };
                let mut nested = Cursor::nested(size, cursor);
                if let Some(path) = field.path() {
                    nested.bind_array(path);
                }
                self.elements(*reference, element.as_ref(), field, &mut nested)
            }
            FieldKind::Reference { reference, element } => {
                let mut nested = Cursor::nested(1, cursor);
                self.elements(*reference, element.as_ref(), field, &mut nested)
            }
        }
    }

    fn elements(
        &mut self,
        reference: usize,
        element: Option<&'a Converter>,
        field: &'a CompiledField,
        cursor: &mut Cursor<'_>,
    ) -> Result<(), DecodeError> {
        let Some(converter) = element else {
            let schema = self.schema;
            return self.walk(&schema.refs[reference].fields, cursor);
        };

        cursor.first();
        while cursor.in_bounds() {
            converters::decode(self, converter, field, cursor)?;
            cursor.next();
        }

        Ok(())
    }

    /// Bytes at `at` without moving the read offset.
    pub fn peek(&self, field: &CompiledField, at: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let buf = self.buf;
        let end = at.checked_add(len);
        end.and_then(|end| buf.get(at..end)).ok_or_else(|| DecodeError::Truncated {
            field: field.name.clone(),
            offset: at,
            needed: len,
            available: buf.len().saturating_sub(at),
        })
    }

    /// Bytes at the read offset; advances past them.
    pub fn take(&mut self, field: &CompiledField, len: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self.peek(field, self.offset, len)?;
        self.offset += bytes.len();
        Ok(bytes)
    }

    pub fn skip(&mut self, field: &CompiledField, len: usize) -> Result<(), DecodeError> {
        self.take(field, len).map(|_| ())
    }

    /// Auto-fill context, or `None` when missing nodes must fail.
    pub fn fill(&self) -> Option<Fill<'a>> {
        let message = self.message;
        self.options.auto_fill.then_some(Fill {
            message_type: message.type_name.as_str(),
        })
    }

    /// Writes `value` into the field's attribute at the cursor position.
    pub fn insert(
        &mut self,
        field: &CompiledField,
        cursor: &Cursor<'_>,
        value: String,
    ) -> Result<(), DecodeError> {
        let path = decode_path(field)?;
        self.insert_at(path, cursor, value)
    }

    pub fn insert_at(
        &mut self,
        path: &AttrPath,
        cursor: &Cursor<'_>,
        value: String,
    ) -> Result<(), DecodeError> {
        let fill = self.fill();
        tree::insert_attr(&mut self.event, path, cursor, value, fill)
    }
}

pub(crate) fn decode_path(field: &CompiledField) -> Result<&AttrPath, DecodeError> {
    field
        .path()
        .ok_or_else(|| DecodeError::MissingNode(field.name.clone()))
}

/// Encoding state for one event.
pub(crate) struct Encoder<'a> {
    pub schema: &'a Schema,
    pub tables: &'a LookupTables,
    pub message: &'a Message,
    pub message_id: u8,
    pub event: &'a Event,
    pub buf: Vec<u8>,
    /// Start of the open single-choice mask window.
    pub mask_window: Option<usize>,
    /// Reserved positions of trailer fields without a fixed offset.
    slots: HashMap<&'a str, usize>,
}

impl<'a> Encoder<'a> {
    pub fn new(
        schema: &'a Schema,
        tables: &'a LookupTables,
        message_id: u8,
        message: &'a Message,
        event: &'a Event,
    ) -> Self {
        Self {
            schema,
            tables,
            message,
            message_id,
            event,
            buf: Vec::new(),
            mask_window: None,
            slots: HashMap::new(),
        }
    }

    pub fn run(mut self) -> Result<Vec<u8>, EncodeError> {
        let (schema, message) = (self.schema, self.message);
        self.walk(&message.fields, &mut Cursor::single())?;

        if message.framed {
            let tail = schema.tail();
            for field in tail.iter().filter(|field| field.offset.is_none()) {
                self.slots.insert(field.name.as_str(), self.buf.len());
                self.buf.resize(self.buf.len() + field.length, 0);
            }

            let (lengths, checksums): (Vec<_>, Vec<_>) = tail
                .iter()
                .partition(|field| field.converter() == Some(&Converter::MessageLength));
            for field in lengths.into_iter().chain(checksums) {
                self.field(field, &mut Cursor::single())?;
            }
        }

        Ok(self.buf)
    }

    fn walk(&mut self, fields: &'a [CompiledField], cursor: &mut Cursor<'_>) -> Result<(), EncodeError> {
        cursor.first();
        while cursor.in_bounds() {
            for field in fields {
                self.field(field, cursor)?;
            }
            cursor.next();
        }

        Ok(())
    }

    fn field(&mut self, field: &'a CompiledField, cursor: &mut Cursor<'_>) -> Result<(), EncodeError> {
        trace!(
            field = %field.name,
            offset = self.buf.len(),
            position = %cursor.trail(),
            "encode field"
        );

        match &field.kind {
            FieldKind::Scalar(converter) => converters::encode(self, converter, field, cursor),
            FieldKind::Array {
                reference,
                count,
                element,
            } => {
                let path = field.path();
                let nodes = path
                    .map(|path| tree::find_elements(self.event, path, cursor))
                    .unwrap_or_default();
                self.write_count(field, *count, nodes.len())?;

                let mut nested = Cursor::nested(0, cursor);
                if let Some(path) = path {
                    nested.bind_array(path);
                }
                nested.bind_nodes(nodes);
                self.elements(*reference, element.as_ref(), field, &mut nested)
            }
            FieldKind::Reference { reference, element } => {
                let mut nested = Cursor::nested(1, cursor);
                self.elements(*reference, element.as_ref(), field, &mut nested)
            }
        }
    }

    fn write_count(&mut self, field: &CompiledField, count: ArrayCount, actual: usize) -> Result<(), EncodeError> {
        let mismatch = || EncodeError::ArrayCountMismatch {
            field: field.name.clone(),
            expected: count.capacity(),
            actual,
        };

        match count {
            ArrayCount::Prefixed(width) => {
                if actual > count.capacity() {
                    return Err(mismatch());
                }
                self.mask_window = None;
                push_be(&mut self.buf, actual as u64, width);
            }
            ArrayCount::Fixed(size) => {
                if actual != size {
                    return Err(mismatch());
                }
            }
        }

        Ok(())
    }

    fn elements(
        &mut self,
        reference: usize,
        element: Option<&'a Converter>,
        field: &'a CompiledField,
        cursor: &mut Cursor<'_>,
    ) -> Result<(), EncodeError> {
        let Some(converter) = element else {
            let schema = self.schema;
            return self.walk(&schema.refs[reference].fields, cursor);
        };

        cursor.first();
        while cursor.in_bounds() {
            converters::encode(self, converter, field, cursor)?;
            cursor.next();
        }

        Ok(())
    }

    /// Attribute value for the field at the cursor position. A missing node falls
    /// back to the field's value; a missing attribute reads as empty.
    pub fn read(&self, field: &CompiledField, cursor: &Cursor<'_>) -> Result<String, EncodeError> {
        let missing = || EncodeError::MissingAttribute(field.name.clone());
        let path = field.path().ok_or_else(missing)?;
        self.read_at(path, cursor)
            .or_else(|| field.value.clone())
            .ok_or_else(missing)
    }

    /// Like [Encoder::read], but an empty attribute falls back to the field's value, then `default`.
    pub fn read_or(
        &self,
        field: &CompiledField,
        cursor: &Cursor<'_>,
        default: &str,
    ) -> Result<String, EncodeError> {
        let value = self.read(field, cursor)?;
        if !value.is_empty() {
            return Ok(value);
        }

        Ok(field
            .value
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn read_at(&self, path: &AttrPath, cursor: &Cursor<'_>) -> Option<String> {
        tree::read_attr(self.event, path, cursor)
    }

    pub fn node_attr(&self, node: &NodePath, attr: &str) -> Option<String> {
        self.event
            .node(node)
            .map(|node| tree::read_node_attr(node, attr))
    }

    /// Position of a trailer field: its fixed offset or the slot reserved for it.
    pub fn frame_slot(&self, field: &CompiledField) -> Result<usize, EncodeError> {
        let at = field
            .offset
            .or_else(|| self.slots.get(field.name.as_str()).copied())
            .ok_or_else(|| EncodeError::OutOfBounds {
                field: field.name.clone(),
                offset: self.buf.len(),
            })?;

        if at.checked_add(field.length).is_none_or(|end| end > self.buf.len()) {
            return Err(EncodeError::OutOfBounds {
                field: field.name.clone(),
                offset: at,
            });
        }

        Ok(at)
    }
}
