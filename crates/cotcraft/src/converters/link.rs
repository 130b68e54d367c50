//! Link points: one node per array element whose attribute holds the comma-joined
//! values of the shared `ref-point` layout.

use uuid::Uuid;

use crate::{
    bits::{push_be, read_be},
    compiled::{AttrPath, CompiledField},
    converters::{dequantize, quantize},
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    event::{Node, NodePath},
    transcoder::{decode_path, Decoder, Encoder},
    tree,
};

const CHECKPOINT_TYPE: &str = "b-m-p-c";
const WAYPOINT_TYPE: &str = "b-m-p-w";

/// Appends a new point node under the field's parent and returns its path.
pub(super) fn decode_point(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &mut Cursor<'_>,
) -> Result<NodePath, DecodeError> {
    let path = decode_path(field)?;
    let parent = match cursor.parent_node() {
        Some(parent) => parent.clone(),
        None => {
            let fill = dec.fill();
            let parent = tree::resolve_parent(&mut dec.event, path.parents(), cursor, fill)?;
            cursor.bind_parent(parent.clone());
            parent
        }
    };

    let schema = dec.schema;
    let mut values = Vec::with_capacity(schema.point_layout().len());
    for point in schema.point_layout() {
        let raw = read_be(dec.take(point, point.length)?);
        values.push(dequantize(raw, point.length, point.range_min, point.range_max).to_string());
    }

    let mut node = Node::new(path.leaf());
    if path.attr.is_empty() {
        node.content = values.join(",");
    } else {
        node.set_attr(&path.attr, values.join(","));
    }

    let index = dec
        .event
        .node_mut(&parent)
        .ok_or_else(|| DecodeError::MissingNode(path.leaf().to_string()))?
        .add_child(node);

    Ok(parent.child(index))
}

/// Route points also carry waypoint metadata. The first point is named after the
/// route's contact, the last one is the end point.
pub(super) fn decode_route_point(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &mut Cursor<'_>,
) -> Result<(), DecodeError> {
    let at = decode_point(dec, field, cursor)?;

    let (point_type, callsign) = if cursor.is_first() {
        let contact = AttrPath {
            nodes: vec!["contact".to_string()],
            attr: "callsign".to_string(),
        };
        let callsign = tree::read_attr(&dec.event, &contact, &Cursor::single())
            .filter(|callsign| !callsign.is_empty())
            .unwrap_or_else(|| "CP".to_string());
        (WAYPOINT_TYPE, callsign)
    } else if cursor.is_last() {
        (WAYPOINT_TYPE, "EP".to_string())
    } else {
        (CHECKPOINT_TYPE, String::new())
    };

    let node = dec
        .event
        .node_mut(&at)
        .ok_or_else(|| DecodeError::MissingNode(field.name.clone()))?;
    node.set_attr("uid", Uuid::new_v4().to_string());
    node.set_attr("type", point_type);
    node.set_attr("callsign", callsign);
    node.set_attr("remarks", "");
    node.set_attr("relation", "c");

    Ok(())
}

pub(super) fn encode_point(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let missing = || EncodeError::MissingAttribute(field.name.clone());
    let path = field.path().ok_or_else(missing)?;

    let node = cursor
        .current_node()
        .cloned()
        .or_else(|| tree::find_element(enc.event, path, cursor))
        .ok_or_else(missing)?;
    let value = enc.node_attr(&node, &path.attr).ok_or_else(missing)?;

    let schema = enc.schema;
    let mut items = value.split(',');
    for point in schema.point_layout() {
        let item = items
            .next()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .unwrap_or("0.0");
        let number: f64 = item.parse().map_err(|_| EncodeError::InvalidNumber {
            field: field.name.clone(),
            literal: item.to_string(),
        })?;

        let raw = quantize(number, point.length, point.range_min, point.range_max);
        push_be(&mut enc.buf, raw, point.length);
    }

    Ok(())
}
