//! Compiled fields: converter, binding target and widths resolved once at load.

use std::{collections::HashMap, fmt};

use tracing::warn;

use crate::{
    bits::ceil_log2,
    errors::CompileError,
    event::{PointAxis, Primitive},
    field::{Field, Reference},
};

/// Size limit selecting a 1-byte length or count prefix.
pub const SHORT_PREFIX: usize = 0x7F;
/// Size limit selecting a 2-byte length or count prefix.
pub const LONG_PREFIX: usize = 0x7FFF;

/// Fixed header reference; a message starting with it is framed.
pub const HEAD_REF: &str = "ref-head";
/// Fixed trailer reference holding the checksum and message length.
pub const TAIL_REF: &str = "ref-tail";
/// Shared scaled-float layout of one link point.
pub const POINT_REF: &str = "ref-point";
/// Medevac terrain flags summarised by [Converter::Obstacles].
pub const TERRAIN_REF: &str = "ref-terrain";
/// Name prefix of plain (non-array) reference fields.
pub const REF_MARKER: &str = "ref-";

/// Selections of [Converter::BooleanMask].
pub const BOOLEAN_SELECTIONS: [&str; 2] = ["false", "true"];

/// Width of the length prefix a sentinel size limit selects.
pub fn prefix_width(size_limit: usize) -> Option<usize> {
    match size_limit {
        SHORT_PREFIX => Some(1),
        LONG_PREFIX => Some(2),
        _ => None,
    }
}

/// The closed set of field conversion strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converter {
    /// Big-endian signed integer of 1, 2 or 4 bytes.
    Int,
    /// Unsigned raw value mapped linearly onto `[range_min, range_max]`.
    ScaledFloat,
    /// [Converter::ScaledFloat] bound to a position axis.
    PointFloat,
    /// 4-byte IEEE-754 float.
    Float32,
    /// Length-prefixed text.
    String,
    /// Length-prefixed text bound to an event primitive.
    PrimitiveString,
    Boolean,
    SingleChoiceMask,
    BooleanMask,
    MultiChoiceMask,
    RouteMask,
    ZMistMask,
    ZMistTitle,
    Const,
    Placeholder,
    MessageType,
    Checksum,
    MessageLength,
    Uid,
    ChatUid,
    GroupUid,
    IconPath,
    Color,
    LinkPoint,
    RouteLinkPoint,
    /// The rest of the frame, carried base64-encoded in one attribute.
    RemarksCodec,
    /// Decode-only text summary of the terrain flags.
    Obstacles,
    /// Unknown converter name; behaves as [Converter::Placeholder] and warns.
    Degraded(String),
}

impl Converter {
    /// Resolves a schema converter name. Unknown names degrade to a placeholder.
    pub fn from_name(name: &str) -> Self {
        match name {
            "intConverter" => Converter::Int,
            "lengthLimitedFloatConverter" => Converter::ScaledFloat,
            "pointLengthLimitedFloatConverter" => Converter::PointFloat,
            "floatConverter" => Converter::Float32,
            "stringConverter" => Converter::String,
            "stringReflectConverter" => Converter::PrimitiveString,
            "booleanConverter" => Converter::Boolean,
            "maskConverter" => Converter::SingleChoiceMask,
            "booleanMaskConverter" => Converter::BooleanMask,
            "multiChoiceMaskConverter" => Converter::MultiChoiceMask,
            "routeMaskConverter" => Converter::RouteMask,
            "zMistsMultiChoiceMaskConverter" => Converter::ZMistMask,
            "constzMistTitleConverter" => Converter::ZMistTitle,
            "constConverter" => Converter::Const,
            "placeHolderConverter" | "subNetTypeConverter" | "roleGroupConverter" => {
                Converter::Placeholder
            }
            "messageTypeConverter" => Converter::MessageType,
            "msgCheckSumConverter" => Converter::Checksum,
            "msgLengthConverter" => Converter::MessageLength,
            "uidConverter" => Converter::Uid,
            "chatUidConverter" => Converter::ChatUid,
            "uidCodecConverter" => Converter::GroupUid,
            "pathIconConverter" => Converter::IconPath,
            "colorConverter" => Converter::Color,
            "linkPointConverter" => Converter::LinkPoint,
            "routeLinkPointConverter" => Converter::RouteLinkPoint,
            "remarksCodecConverter" => Converter::RemarksCodec,
            "obstaclesConverter" => Converter::Obstacles,
            other => Converter::Degraded(other.to_string()),
        }
    }

    /// Whether the converter belongs in the trailer reference only.
    pub fn is_frame_field(&self) -> bool {
        matches!(self, Converter::Checksum | Converter::MessageLength)
    }

    /// Whether the converter writes into a shared mask window.
    pub fn is_windowed(&self) -> bool {
        matches!(self, Converter::SingleChoiceMask | Converter::BooleanMask)
    }

    /// Resolves what the field name binds to for this converter.
    pub fn target(&self, name: &str) -> Result<Target, CompileError> {
        match self {
            Converter::PointFloat => PointAxis::from_name(name)
                .map(Target::Point)
                .ok_or_else(|| CompileError::UnknownBinding(name.to_string())),
            Converter::PrimitiveString => name
                .strip_prefix('.')
                .and_then(Primitive::from_name)
                .map(Target::Primitive)
                .ok_or_else(|| CompileError::UnknownBinding(name.to_string())),
            Converter::Int
            | Converter::ScaledFloat
            | Converter::Float32
            | Converter::String
            | Converter::Boolean
            | Converter::SingleChoiceMask
            | Converter::BooleanMask
            | Converter::MultiChoiceMask
            | Converter::RouteMask
            | Converter::ZMistMask
            | Converter::ZMistTitle
            | Converter::Const
            | Converter::IconPath
            | Converter::Color
            | Converter::LinkPoint
            | Converter::RouteLinkPoint
            | Converter::RemarksCodec
            | Converter::Obstacles => AttrPath::try_from(name).map(Target::Attr),
            Converter::Placeholder
            | Converter::MessageType
            | Converter::Checksum
            | Converter::MessageLength
            | Converter::Uid
            | Converter::ChatUid
            | Converter::GroupUid
            | Converter::Degraded(_) => Ok(Target::None),
        }
    }

    /// Checks that the field's widths and metadata suit this converter.
    pub fn validate(&self, field: &Field) -> Result<(), CompileError> {
        let invalid_length = || CompileError::InvalidLength {
            field: field.name.clone(),
            length: field.length,
        };
        let invalid_limit = || CompileError::InvalidSizeLimit {
            field: field.name.clone(),
            size_limit: field.size_limit,
        };

        if let Some(offset) = field
            .offset
            .filter(|offset| offset.checked_add(field.length).is_none())
        {
            return Err(CompileError::InvalidOffset {
                field: field.name.clone(),
                offset,
            });
        }

        match self {
            Converter::Int => {
                if !matches!(field.length, 1 | 2 | 4) {
                    return Err(invalid_length());
                }
            }
            Converter::ScaledFloat | Converter::PointFloat => validate_scaled(field)?,
            Converter::Float32 | Converter::IconPath | Converter::Color => {
                if field.length != 4 {
                    return Err(invalid_length());
                }
            }
            Converter::Boolean
            | Converter::MessageType
            | Converter::GroupUid
            | Converter::RouteMask => {
                if field.length != 1 {
                    return Err(invalid_length());
                }
            }
            Converter::String => {
                if prefix_width(field.size_limit).is_none() {
                    return Err(invalid_limit());
                }
            }
            Converter::PrimitiveString => {
                if field.value.is_none() && prefix_width(field.size_limit).is_none() {
                    return Err(invalid_limit());
                }
            }
            Converter::SingleChoiceMask | Converter::BooleanMask => {
                if !(1..=4).contains(&field.size_limit) {
                    return Err(invalid_limit());
                }
                let count = match self {
                    Converter::BooleanMask => BOOLEAN_SELECTIONS.len(),
                    _ => field.selections.len(),
                };
                let bits = ceil_log2(count) as usize;
                if count == 0
                    || field
                        .relative_offset
                        .checked_add(bits)
                        .is_none_or(|end| end > 8 * field.size_limit)
                {
                    return Err(CompileError::InvalidSelections(field.name.clone()));
                }
                if field.length != 0 && field.length != field.size_limit {
                    return Err(invalid_length());
                }
            }
            Converter::MultiChoiceMask => {
                if field.size_limit == 0 {
                    return Err(invalid_limit());
                }
                if field.selections.is_empty() || field.selections.len() > 8 * field.size_limit {
                    return Err(CompileError::InvalidSelections(field.name.clone()));
                }
                if field.length != field.size_limit {
                    return Err(invalid_length());
                }
            }
            Converter::ZMistMask => {
                if field.size_limit * 8 < 9 {
                    return Err(invalid_limit());
                }
                if field.length != field.size_limit {
                    return Err(invalid_length());
                }
            }
            Converter::Uid | Converter::ChatUid => {
                if !(1..=8).contains(&field.length) {
                    return Err(invalid_length());
                }
            }
            Converter::Checksum => {
                if field.length == 0 {
                    return Err(invalid_length());
                }
            }
            Converter::MessageLength => {
                if !matches!(field.length, 1 | 2 | 4) {
                    return Err(invalid_length());
                }
                if field.offset.is_none() {
                    return Err(CompileError::MissingOffset(field.name.clone()));
                }
            }
            Converter::Obstacles => {
                if field.length != 0 {
                    return Err(invalid_length());
                }
            }
            Converter::ZMistTitle
            | Converter::Const
            | Converter::Placeholder
            | Converter::LinkPoint
            | Converter::RouteLinkPoint
            | Converter::RemarksCodec
            | Converter::Degraded(_) => {}
        }

        Ok(())
    }
}

fn validate_scaled(field: &Field) -> Result<(), CompileError> {
    if !(1..=4).contains(&field.length) {
        return Err(CompileError::InvalidLength {
            field: field.name.clone(),
            length: field.length,
        });
    }
    if !field.range_min.is_finite()
        || !field.range_max.is_finite()
        || field.range_max <= field.range_min
    {
        return Err(CompileError::InvalidRange(field.name.clone()));
    }

    Ok(())
}

/// A `detail/node/leaf.attr` path. An empty `attr` addresses the leaf's text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrPath {
    /// Node names below `detail`, leaf last. Never empty.
    pub nodes: Vec<String>,
    pub attr: String,
}

impl AttrPath {
    /// Node names above the leaf.
    pub fn parents(&self) -> &[String] {
        &self.nodes[..self.nodes.len() - 1]
    }

    pub fn leaf(&self) -> &str {
        &self.nodes[self.nodes.len() - 1]
    }
}

impl TryFrom<&str> for AttrPath {
    type Error = CompileError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let invalid = || CompileError::InvalidPath(value.to_string());

        let mut segments: Vec<&str> = value.split('/').collect();
        if segments.len() < 2 || segments[0] != "detail" {
            return Err(invalid());
        }

        let last = segments.pop().ok_or_else(invalid)?;
        let (leaf, attr) = last.split_once('.').ok_or_else(invalid)?;
        if leaf.is_empty() || attr.contains('.') {
            return Err(invalid());
        }

        let mut nodes = Vec::with_capacity(segments.len());
        for segment in &segments[1..] {
            if segment.is_empty() || segment.contains('.') {
                return Err(invalid());
            }
            nodes.push(segment.to_string());
        }
        nodes.push(leaf.to_string());

        Ok(AttrPath {
            nodes,
            attr: attr.to_string(),
        })
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "detail/{}.{}", self.nodes.join("/"), self.attr)
    }
}

/// What a field reads from and writes to in the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Attribute (or text content) of a detail node.
    Attr(AttrPath),
    /// Top-level `uid`, `type` or `how`.
    Primitive(Primitive),
    /// One position axis.
    Point(PointAxis),
    /// The converter does not touch a named value.
    None,
}

impl Target {
    pub fn path(&self) -> Option<&AttrPath> {
        match self {
            Target::Attr(path) => Some(path),
            _ => None,
        }
    }
}

/// Number of elements of an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayCount {
    /// Count carried as a big-endian prefix of this many bytes.
    Prefixed(usize),
    /// Count fixed by the schema.
    Fixed(usize),
}

impl ArrayCount {
    fn from_limit(field: &Field) -> Result<Self, CompileError> {
        match (prefix_width(field.size_limit), field.size_limit) {
            (Some(width), _) => Ok(ArrayCount::Prefixed(width)),
            (None, 0) => Err(CompileError::InvalidSizeLimit {
                field: field.name.clone(),
                size_limit: 0,
            }),
            (None, count) => Ok(ArrayCount::Fixed(count)),
        }
    }

    /// Largest element count this layout can carry.
    pub fn capacity(&self) -> usize {
        match self {
            ArrayCount::Prefixed(1) => SHORT_PREFIX,
            ArrayCount::Prefixed(_) => LONG_PREFIX,
            ArrayCount::Fixed(count) => *count,
        }
    }
}

/// How a compiled field is walked.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A single value handled by one converter.
    Scalar(Converter),
    /// A counted repetition of a reference.
    Array {
        reference: usize,
        count: ArrayCount,
        /// Runs once per element instead of walking the reference's fields.
        element: Option<Converter>,
    },
    /// A reference walked exactly once.
    Reference {
        reference: usize,
        element: Option<Converter>,
    },
}

/// A field with every name, width and binding resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    pub name: String,
    pub kind: FieldKind,
    pub target: Target,
    pub length: usize,
    pub offset: Option<usize>,
    pub relative_offset: usize,
    pub size_limit: usize,
    pub range_min: f64,
    pub range_max: f64,
    pub selections: Vec<String>,
    pub value: Option<String>,
    /// Attribute a `$`-prefixed constant copies from.
    pub source: Option<AttrPath>,
}

/// Part of the schema a field is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    /// Messages and ordinary references.
    Body,
    /// The trailer reference.
    Tail,
    /// The link point layout; names are labels, not bindings.
    PointLayout,
}

/// Reference names and raw layouts visible while compiling a field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub refs: &'a [Reference],
    pub index: &'a HashMap<String, usize>,
    pub section: Section,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Result<usize, CompileError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::UnknownReference(name.to_string()))
    }
}

impl CompiledField {
    /// Compiles `field`. With `allow_array` false the `"array"` type tag is ignored,
    /// as on a message's first field where the type holds the message type.
    pub(crate) fn compile(
        field: &Field,
        scope: Scope<'_>,
        allow_array: bool,
    ) -> Result<Self, CompileError> {
        let (kind, target) = if allow_array && field.is_array() {
            let reference = scope.lookup(&field.name)?;
            let element = element_converter(field, &scope.refs[reference])?;
            let kind = FieldKind::Array {
                reference,
                count: ArrayCount::from_limit(field)?,
                element,
            };
            (kind, Target::Attr(AttrPath::try_from(field.name.as_str())?))
        } else if field.name.starts_with(REF_MARKER) {
            let reference = scope.lookup(&field.name)?;
            let element = element_converter(field, &scope.refs[reference])?;
            let target = match &element {
                Some(converter) => converter.target(&field.name)?,
                None => Target::None,
            };
            (FieldKind::Reference { reference, element }, target)
        } else {
            let converter = scalar_converter(field)?;
            let in_tail = scope.section == Section::Tail;
            if converter.is_frame_field() && !in_tail {
                return Err(CompileError::MisplacedFrameField(field.name.clone()));
            }
            if in_tail && !converter.is_frame_field() {
                return Err(CompileError::UnsupportedTrailerField(field.name.clone()));
            }
            let target = match scope.section {
                Section::PointLayout => Target::None,
                _ => converter.target(&field.name)?,
            };
            (FieldKind::Scalar(converter), target)
        };

        let source = match (&kind, field.value.as_deref()) {
            (FieldKind::Scalar(Converter::Const), Some(value)) => value
                .strip_prefix('$')
                .map(AttrPath::try_from)
                .transpose()?,
            _ => None,
        };

        let selections = match &kind {
            FieldKind::Scalar(Converter::BooleanMask) => {
                BOOLEAN_SELECTIONS.iter().map(|s| s.to_string()).collect()
            }
            _ => field.selections.clone(),
        };

        Ok(CompiledField {
            name: field.name.clone(),
            kind,
            target,
            length: field.length,
            offset: field.offset,
            relative_offset: field.relative_offset,
            size_limit: field.size_limit,
            range_min: field.range_min,
            range_max: field.range_max,
            selections,
            value: field.value.clone(),
            source,
        })
    }

    /// Converter run for this field, if it is not a plain reference walk.
    pub fn converter(&self) -> Option<&Converter> {
        match &self.kind {
            FieldKind::Scalar(converter) => Some(converter),
            FieldKind::Array { element, .. } | FieldKind::Reference { element, .. } => {
                element.as_ref()
            }
        }
    }

    pub fn path(&self) -> Option<&AttrPath> {
        self.target.path()
    }
}

fn scalar_converter(field: &Field) -> Result<Converter, CompileError> {
    let converter = Converter::from_name(&field.converter);
    if let Converter::Degraded(name) = &converter {
        warn!(
            field = %field.name,
            converter = %name,
            "unknown field converter, falling back to placeholder"
        );
    }
    converter.validate(field)?;

    Ok(converter)
}

// A converter on the field overrides the one declared on the reference.
fn element_converter(field: &Field, reference: &Reference) -> Result<Option<Converter>, CompileError> {
    let name = if field.converter.is_empty() {
        reference.converter.as_deref()
    } else {
        Some(field.converter.as_str())
    };

    match name {
        Some(name) => {
            let element = Field {
                converter: name.to_string(),
                ..field.clone()
            };
            scalar_converter(&element).map(Some)
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope<'a>(refs: &'a [Reference], index: &'a HashMap<String, usize>) -> Scope<'a> {
        Scope {
            refs,
            index,
            section: Section::Body,
        }
    }

    #[test]
    fn test_attr_path() {
        let path = AttrPath::try_from("detail/_medevac_/zMistsMap/zMist.title").unwrap();
        assert_eq!(path.nodes, vec!["_medevac_", "zMistsMap", "zMist"]);
        assert_eq!(path.parents(), ["_medevac_", "zMistsMap"]);
        assert_eq!(path.leaf(), "zMist");
        assert_eq!(path.attr, "title");
        assert_eq!(path.to_string(), "detail/_medevac_/zMistsMap/zMist.title");
    }

    #[test]
    fn test_attr_path_content() {
        let path = AttrPath::try_from("detail/remarks.").unwrap();
        assert_eq!(path.nodes, vec!["remarks"]);
        assert!(path.attr.is_empty());
    }

    #[test]
    fn test_attr_path_rejects_malformed() {
        for name in [
            "contact.callsign",
            "detail",
            "detail/contact",
            "detail/a.b/contact.callsign",
            "detail/contact.call.sign",
            "detail/.callsign",
            ".uid",
        ] {
            assert_eq!(
                AttrPath::try_from(name),
                Err(CompileError::InvalidPath(name.to_string())),
                "{name}"
            );
        }
    }

    #[test]
    fn test_converter_aliases() {
        assert_eq!(Converter::from_name("subNetTypeConverter"), Converter::Placeholder);
        assert_eq!(Converter::from_name("roleGroupConverter"), Converter::Placeholder);
        assert_eq!(Converter::from_name("remarksCodecConverter"), Converter::RemarksCodec);
        assert_eq!(Converter::from_name("obstaclesConverter"), Converter::Obstacles);
        assert_eq!(
            Converter::from_name("hazardConverter"),
            Converter::Degraded("hazardConverter".to_string())
        );
    }

    #[test]
    fn test_obstacles_write_nothing() {
        let index = HashMap::new();
        let mut field = Field::new("detail/_medevac_.obstacles", "obstaclesConverter", 0);
        assert!(CompiledField::compile(&field, scope(&[], &index), true).is_ok());

        field.length = 2;
        assert_eq!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::InvalidLength {
                field: "detail/_medevac_.obstacles".to_string(),
                length: 2,
            })
        );
    }

    #[test]
    fn test_int_width() {
        let index = HashMap::new();
        for (length, ok) in [(1, true), (2, true), (3, false), (4, true), (8, false)] {
            let field = Field::new("detail/track.course", "intConverter", length);
            assert_eq!(
                CompiledField::compile(&field, scope(&[], &index), true).is_ok(),
                ok,
                "{length}"
            );
        }
    }

    #[test]
    fn test_scaled_float_range() {
        let index = HashMap::new();
        let mut field = Field::new("detail/track.speed", "lengthLimitedFloatConverter", 2);
        field.range_min = 10.0;
        field.range_max = 10.0;

        assert_eq!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::InvalidRange("detail/track.speed".to_string()))
        );
    }

    #[test]
    fn test_point_binding() {
        let index = HashMap::new();
        let mut field = Field::new("point.lat", "pointLengthLimitedFloatConverter", 4);
        field.range_min = -90.0;
        field.range_max = 90.0;

        let compiled = CompiledField::compile(&field, scope(&[], &index), true).unwrap();
        assert_eq!(compiled.target, Target::Point(PointAxis::Lat));

        field.name = "point.speed".to_string();
        assert_eq!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::UnknownBinding("point.speed".to_string()))
        );
    }

    #[test]
    fn test_primitive_binding() {
        let index = HashMap::new();
        let mut field = Field::new(".type", "stringReflectConverter", 0);
        field.size_limit = SHORT_PREFIX;

        let compiled = CompiledField::compile(&field, scope(&[], &index), true).unwrap();
        assert_eq!(compiled.target, Target::Primitive(Primitive::Type));

        field.name = ".callsign".to_string();
        assert!(matches!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::UnknownBinding(_))
        ));
    }

    #[test]
    fn test_string_needs_sentinel() {
        let index = HashMap::new();
        let mut field = Field::new("detail/contact.callsign", "stringConverter", 0);
        field.size_limit = 20;

        assert!(matches!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::InvalidSizeLimit { size_limit: 20, .. })
        ));
    }

    #[test]
    fn test_mask_selections_must_fit_window() {
        let index = HashMap::new();
        let mut field = Field::new("detail/_medevac_.urgency", "maskConverter", 1);
        field.size_limit = 1;
        field.relative_offset = 6;
        field.selections = vec!["a".into(), "b".into(), "c".into()];

        assert_eq!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::InvalidSelections(
                "detail/_medevac_.urgency".to_string()
            ))
        );

        field.relative_offset = 5;
        field.selections.clear();
        assert!(CompiledField::compile(&field, scope(&[], &index), true).is_err());
    }

    #[test]
    fn test_boolean_mask_selections() {
        let index = HashMap::new();
        let mut field = Field::new("detail/_medevac_.hoist", "booleanMaskConverter", 0);
        field.size_limit = 1;
        field.relative_offset = 7;

        let compiled = CompiledField::compile(&field, scope(&[], &index), true).unwrap();
        assert_eq!(compiled.selections, vec!["false", "true"]);
    }

    #[test]
    fn test_frame_fields_only_in_tail() {
        let index = HashMap::new();
        let mut field = Field::new("checksum", "msgCheckSumConverter", 1);

        assert_eq!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::MisplacedFrameField("checksum".to_string()))
        );

        let tail = Scope {
            section: Section::Tail,
            ..scope(&[], &index)
        };
        assert!(CompiledField::compile(&field, tail, true).is_ok());

        field.converter = "intConverter".to_string();
        assert_eq!(
            CompiledField::compile(&field, tail, true),
            Err(CompileError::UnsupportedTrailerField("checksum".to_string()))
        );
    }

    #[test]
    fn test_message_length_needs_offset() {
        let index = HashMap::new();
        let tail = Scope {
            section: Section::Tail,
            ..scope(&[], &index)
        };
        let mut field = Field::new("messageLength", "msgLengthConverter", 2);

        assert_eq!(
            CompiledField::compile(&field, tail, true),
            Err(CompileError::MissingOffset("messageLength".to_string()))
        );

        field.offset = Some(2);
        assert!(CompiledField::compile(&field, tail, true).is_ok());

        field.offset = Some(usize::MAX);
        assert_eq!(
            CompiledField::compile(&field, tail, true),
            Err(CompileError::InvalidOffset {
                field: "messageLength".to_string(),
                offset: usize::MAX,
            })
        );
    }

    #[test]
    fn test_array_count_and_element() {
        let refs = vec![Reference {
            name: "detail/link.point".to_string(),
            content: vec![],
            converter: Some("linkPointConverter".to_string()),
        }];
        let index = HashMap::from([("detail/link.point".to_string(), 0)]);

        let mut field = Field::new("detail/link.point", "", 0);
        field.field_type = "array".to_string();
        field.size_limit = LONG_PREFIX;

        let compiled = CompiledField::compile(&field, scope(&refs, &index), true).unwrap();
        assert_eq!(
            compiled.kind,
            FieldKind::Array {
                reference: 0,
                count: ArrayCount::Prefixed(2),
                element: Some(Converter::LinkPoint),
            }
        );

        field.converter = "routeLinkPointConverter".to_string();
        field.size_limit = 3;
        let compiled = CompiledField::compile(&field, scope(&refs, &index), true).unwrap();
        assert_eq!(
            compiled.kind,
            FieldKind::Array {
                reference: 0,
                count: ArrayCount::Fixed(3),
                element: Some(Converter::RouteLinkPoint),
            }
        );
    }

    #[test]
    fn test_unknown_reference() {
        let index = HashMap::new();
        let field = Field::new("ref-missing", "", 0);
        assert_eq!(
            CompiledField::compile(&field, scope(&[], &index), true),
            Err(CompileError::UnknownReference("ref-missing".to_string()))
        );
    }

    #[test]
    fn test_copy_constant_source() {
        let index = HashMap::new();
        let mut field = Field::new("detail/link.uid", "constConverter", 0);
        field.value = Some("$detail/contact.callsign".to_string());

        let compiled = CompiledField::compile(&field, scope(&[], &index), true).unwrap();
        assert_eq!(
            compiled.source,
            Some(AttrPath::try_from("detail/contact.callsign").unwrap())
        );
    }

    #[test]
    fn test_degraded_converter_compiles() {
        let index = HashMap::new();
        let field = Field::new("detail/_medevac_.hazard", "hazardConverter", 0);
        let compiled = CompiledField::compile(&field, scope(&[], &index), true).unwrap();

        assert_eq!(
            compiled.kind,
            FieldKind::Scalar(Converter::Degraded("hazardConverter".to_string()))
        );
        assert_eq!(compiled.target, Target::None);
    }
}
