//! The transcoder entry point.
//!
//! An [Interpreter] binds a compiled [Schema], the icon [LookupTables], the
//! message selection predicates and the runtime [Options]. It is immutable
//! after construction; reloading means building a new one.

use std::{collections::HashMap, time::Duration};

use tracing::debug;

use crate::{
    bits::read_be,
    errors::{CompileError, DecodeError, EncodeError, ProbeError},
    event::Event,
    lookup::LookupTables,
    schema::{Message, Schema, TypeMatch},
    transcoder::{Decoder, Encoder},
};

/// Icon set prefix of MIL-STD-2525C symbols.
const MIL_STD_2525C: &str = "COT_MAPPING_2525C";

/// Decides whether an event belongs to a message with a named type match.
pub type Predicate = fn(&Event, &LookupTables) -> bool;

/// Runtime options of an [Interpreter].
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Synthesize missing detail nodes on decode instead of failing.
    pub auto_fill: bool,
    /// Stale time of decoded events, relative to the decode time.
    pub stale_after: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_fill: true,
            stale_after: Duration::from_secs(24 * 60 * 60),
        }
    }
}

fn icon_set_path(event: &Event) -> Option<&str> {
    event
        .detail
        .as_ref()?
        .first_child("usericon")?
        .attr("iconsetpath")
}

/// Events drawn with a MIL-STD-2525C icon.
fn mil_std_icon(event: &Event, _: &LookupTables) -> bool {
    icon_set_path(event).is_some_and(|path| path.starts_with(MIL_STD_2525C))
}

/// Events drawn with an icon file the lookup tables index.
fn simple_icon(event: &Event, tables: &LookupTables) -> bool {
    icon_set_path(event).is_some_and(|path| {
        let parts: Vec<&str> = path.split('/').collect();
        parts.len() == 3 && tables.icon_files.contains_key(parts[2])
    })
}

/// Converts between binary frames and events for one schema.
#[derive(Debug, Clone)]
pub struct Interpreter {
    schema: Schema,
    tables: LookupTables,
    predicates: HashMap<String, Predicate>,
    options: Options,
}

impl Interpreter {
    /// An interpreter with the built-in predicates and default options.
    pub fn new(schema: Schema, tables: LookupTables) -> Result<Self, CompileError> {
        Self::builder(schema, tables).build()
    }

    pub fn builder(schema: Schema, tables: LookupTables) -> InterpreterBuilder {
        InterpreterBuilder::new(schema, tables)
    }

    /// Loads the schema and table documents and builds a default interpreter.
    #[cfg(feature = "serde")]
    pub fn from_json(schema_json: &str, tables_json: &str) -> Result<Self, crate::errors::LoadError> {
        use crate::serde::{SchemaDef, TablesDef};

        let schema = serde_json::from_str::<SchemaDef>(schema_json)?.compile()?;
        let tables = LookupTables::try_from(serde_json::from_str::<TablesDef>(tables_json)?)?;

        Ok(Self::new(schema, tables)?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The first message, in declaration order, whose type rule accepts the event.
    pub fn select(&self, event: &Event) -> Result<(usize, &Message), EncodeError> {
        for (id, message) in self.schema.messages.iter().enumerate() {
            let accepted = match &message.type_match {
                TypeMatch::Named(name) => {
                    let predicate = self
                        .predicates
                        .get(name)
                        .ok_or_else(|| EncodeError::UnknownPredicate(name.clone()))?;
                    predicate(event, &self.tables)
                }
                rule => rule
                    .accepts(&message.type_name, &event.event_type)
                    .unwrap_or(false),
            };

            if accepted {
                return Ok((id, message));
            }
        }

        Err(EncodeError::NoSchema(event.event_type.clone()))
    }

    /// Decodes one frame. Byte 0 is reserved, byte 1 is the message id.
    pub fn decode(&self, data: &[u8]) -> Result<Event, DecodeError> {
        if data.len() < 2 {
            return Err(DecodeError::TooShort);
        }

        let id = data[1];
        let message = self
            .schema
            .messages
            .get(id as usize)
            .ok_or(DecodeError::UnknownTypeId(id))?;

        let event = Decoder::new(&self.schema, &self.tables, &self.options, message, data).run()?;
        debug!(
            message = id,
            message_type = %message.type_name,
            bytes = data.len(),
            "decoded frame"
        );

        Ok(event)
    }

    /// Encodes an event with the first message that accepts it.
    pub fn encode(&self, event: &Event) -> Result<Vec<u8>, EncodeError> {
        let (id, message) = self.select(event)?;
        // At most 256 messages compile, so every id fits a byte.
        let id = id as u8;

        let data = Encoder::new(&self.schema, &self.tables, id, message, event).run()?;
        debug!(
            message = id,
            message_type = %message.type_name,
            bytes = data.len(),
            "encoded event"
        );

        Ok(data)
    }

    /// Length of the frame starting at `data[0]`.
    ///
    /// Framed messages declare their length in the trailer's length field; other
    /// messages are assumed to span all of `data`.
    pub fn expected_length(&self, data: &[u8]) -> Result<usize, ProbeError> {
        if data.len() < 2 {
            return Err(ProbeError::TooShort);
        }

        let id = data[1];
        let message = self
            .schema
            .messages
            .get(id as usize)
            .ok_or(ProbeError::UnknownType(id))?;

        let field = match self.schema.length_field() {
            Some(field) if message.framed => field,
            _ => return Ok(data.len()),
        };
        let Some(at) = field.offset else {
            return Ok(data.len());
        };

        let bytes = at
            .checked_add(field.length)
            .and_then(|end| data.get(at..end))
            .ok_or(ProbeError::TooShort)?;
        Ok(read_be(bytes) as usize)
    }
}

/// Configures an [Interpreter] before it is frozen.
#[derive(Debug)]
pub struct InterpreterBuilder {
    schema: Schema,
    tables: LookupTables,
    predicates: HashMap<String, Predicate>,
    options: Options,
}

impl InterpreterBuilder {
    fn new(schema: Schema, tables: LookupTables) -> Self {
        let mut predicates: HashMap<String, Predicate> = HashMap::new();
        predicates.insert("2512icon".to_string(), mil_std_icon);
        predicates.insert("simpleIcon".to_string(), simple_icon);

        Self {
            schema,
            tables,
            predicates,
            options: Options::default(),
        }
    }

    /// Registers (or replaces) a named type predicate.
    pub fn predicate(mut self, name: impl Into<String>, predicate: Predicate) -> Self {
        self.predicates.insert(name.into(), predicate);
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Fails if a message names a predicate that was never registered.
    pub fn build(self) -> Result<Interpreter, CompileError> {
        for message in &self.schema.messages {
            if let TypeMatch::Named(name) = &message.type_match {
                if !self.predicates.contains_key(name) {
                    return Err(CompileError::UnknownPredicate(name.clone()));
                }
            }
        }

        Ok(Interpreter {
            schema: self.schema,
            tables: self.tables,
            predicates: self.predicates,
            options: self.options,
        })
    }
}
