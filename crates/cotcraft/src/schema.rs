//! Schema: compiled message layouts and references. Use [Schema::compile] to build one
//! from raw [Reference]s and [MessageLayout]s.

use std::collections::HashMap;

use crate::{
    compiled::{
        CompiledField, Converter, FieldKind, Scope, Section, HEAD_REF, POINT_REF, TAIL_REF,
    },
    errors::CompileError,
    field::{MessageLayout, Reference},
};

/// Type ids are one byte wide.
pub const MAX_MESSAGES: usize = 256;

/// How a message's type string is compared with an event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatch {
    /// Either type is a prefix of the other.
    Prefix,
    /// Either type is a suffix of the other.
    Suffix,
    /// Types are equal (`""` or `"all"`).
    Exact,
    /// A predicate registered on the interpreter under this name.
    Named(String),
}

impl From<&str> for TypeMatch {
    fn from(value: &str) -> Self {
        match value {
            "prefix" => TypeMatch::Prefix,
            "suffix" => TypeMatch::Suffix,
            "" | "all" => TypeMatch::Exact,
            other => TypeMatch::Named(other.to_string()),
        }
    }
}

impl TypeMatch {
    /// Applies the string rules; `None` for named predicates.
    pub fn accepts(&self, message_type: &str, event_type: &str) -> Option<bool> {
        match self {
            TypeMatch::Prefix => Some(
                message_type.starts_with(event_type) || event_type.starts_with(message_type),
            ),
            TypeMatch::Suffix => {
                Some(message_type.ends_with(event_type) || event_type.ends_with(message_type))
            }
            TypeMatch::Exact => Some(message_type == event_type),
            TypeMatch::Named(_) => None,
        }
    }
}

/// A compiled message layout.
#[derive(Debug, Clone)]
pub struct Message {
    /// Event type this message carries, taken from the first field.
    pub type_name: String,
    pub type_match: TypeMatch,
    pub fields: Vec<CompiledField>,
    /// Starts with the fixed header, so the trailer reference applies.
    pub framed: bool,
}

/// A compiled reference layout.
#[derive(Debug, Clone)]
pub struct CompiledRef {
    pub name: String,
    pub fields: Vec<CompiledField>,
}

/// A compiled schema: messages in type id order plus the references they use.
#[derive(Debug, Clone)]
pub struct Schema {
    pub messages: Vec<Message>,
    pub refs: Vec<CompiledRef>,
    ref_index: HashMap<String, usize>,
}

impl Schema {
    /// Compiles references and messages. Fails on the first invalid field, on unknown or
    /// recursive references, and on more than [MAX_MESSAGES] messages.
    pub fn compile(refs: &[Reference], messages: &[MessageLayout]) -> Result<Self, CompileError> {
        if messages.len() > MAX_MESSAGES {
            return Err(CompileError::TooManyMessages(messages.len()));
        }

        let mut ref_index = HashMap::with_capacity(refs.len());
        for (i, reference) in refs.iter().enumerate() {
            ref_index.insert(reference.name.clone(), i);
        }

        let mut compiled_refs = Vec::with_capacity(refs.len());
        for reference in refs {
            let section = match reference.name.as_str() {
                TAIL_REF => Section::Tail,
                POINT_REF => Section::PointLayout,
                _ => Section::Body,
            };
            let scope = Scope {
                refs,
                index: &ref_index,
                section,
            };
            let fields = reference
                .content
                .iter()
                .map(|field| CompiledField::compile(field, scope, true))
                .collect::<Result<Vec<_>, _>>()?;

            compiled_refs.push(CompiledRef {
                name: reference.name.clone(),
                fields,
            });
        }

        let scope = Scope {
            refs,
            index: &ref_index,
            section: Section::Body,
        };
        let mut compiled_messages = Vec::with_capacity(messages.len());
        for (id, layout) in messages.iter().enumerate() {
            let first = layout.content.first().ok_or(CompileError::InvalidMessage(id))?;

            let mut fields = Vec::with_capacity(layout.content.len());
            for (i, field) in layout.content.iter().enumerate() {
                fields.push(CompiledField::compile(field, scope, i > 0)?);
            }

            compiled_messages.push(Message {
                type_name: first.field_type.clone(),
                type_match: TypeMatch::from(first.type_match.as_str()),
                fields,
                framed: first.name.starts_with(HEAD_REF),
            });
        }

        let schema = Schema {
            messages: compiled_messages,
            refs: compiled_refs,
            ref_index,
        };
        schema.check_recursion()?;
        schema.check_point_layout()?;

        Ok(schema)
    }

    pub fn reference(&self, name: &str) -> Option<&CompiledRef> {
        self.ref_index.get(name).map(|&i| &self.refs[i])
    }

    /// Fields of the trailer reference, empty when the schema has none.
    pub fn tail(&self) -> &[CompiledField] {
        self.reference(TAIL_REF)
            .map(|reference| reference.fields.as_slice())
            .unwrap_or_default()
    }

    /// Fields of the shared link point layout.
    pub fn point_layout(&self) -> &[CompiledField] {
        self.reference(POINT_REF)
            .map(|reference| reference.fields.as_slice())
            .unwrap_or_default()
    }

    /// Total byte width of one link point.
    pub fn point_width(&self) -> usize {
        self.point_layout().iter().map(|field| field.length).sum()
    }

    /// The trailer field holding the frame length.
    pub fn length_field(&self) -> Option<&CompiledField> {
        self.tail()
            .iter()
            .find(|field| field.converter() == Some(&Converter::MessageLength))
    }

    fn all_fields(&self) -> impl Iterator<Item = &CompiledField> {
        self.refs
            .iter()
            .flat_map(|reference| reference.fields.iter())
            .chain(self.messages.iter().flat_map(|message| message.fields.iter()))
    }

    fn check_point_layout(&self) -> Result<(), CompileError> {
        let uses_points = self.all_fields().any(|field| {
            matches!(
                field.converter(),
                Some(Converter::LinkPoint | Converter::RouteLinkPoint)
            )
        });
        if !uses_points {
            return Ok(());
        }

        let layout = self
            .reference(POINT_REF)
            .ok_or(CompileError::MissingPointLayout)?;
        if layout.fields.is_empty() {
            return Err(CompileError::MissingPointLayout);
        }
        for field in &layout.fields {
            if !matches!(
                field.converter(),
                Some(Converter::ScaledFloat | Converter::PointFloat)
            ) {
                return Err(CompileError::InvalidPointField(field.name.clone()));
            }
        }

        Ok(())
    }

    fn check_recursion(&self) -> Result<(), CompileError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(schema: &Schema, i: usize, marks: &mut [Mark]) -> Result<(), CompileError> {
            match marks[i] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    return Err(CompileError::RecursiveReference(schema.refs[i].name.clone()));
                }
                Mark::Unvisited => {}
            }

            marks[i] = Mark::Active;
            for field in &schema.refs[i].fields {
                match field.kind {
                    FieldKind::Array { reference, .. } | FieldKind::Reference { reference, .. } => {
                        visit(schema, reference, marks)?
                    }
                    FieldKind::Scalar(_) => {}
                }
            }
            marks[i] = Mark::Done;

            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.refs.len()];
        for i in 0..self.refs.len() {
            visit(self, i, &mut marks)?;
        }

        Ok(())
    }
}
