//! Bit-packed choice fields.
//!
//! Single-choice masks index `selections` with `⌈log2 n⌉` bits shifted by
//! `relative_offset` (counted from the least significant bit) inside a
//! `size_limit`-byte window. Several fields can share one window: every field but
//! the last has length 0, so only the last one advances the frame. Fields of a
//! window may appear in any bit order. Multi-choice
//! and ZMIST masks address their bits MSB-first.

use crate::{
    bits::{bits_to_bytes, bytes_to_bits, ceil_log2, read_be, write_be},
    compiled::{AttrPath, CompiledField},
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    transcoder::{decode_path, Decoder, Encoder},
    tree,
};

const ROUTE_METHODS: [&str; 5] = ["Driving", "Walking", "Flying", "Swimming", "Watercraft"];
const ROUTE_DIRECTIONS: [&str; 2] = ["Infil", "Exfil"];
const ROUTE_TYPES: [&str; 2] = ["Primary", "Secondary"];
const ROUTE_ORDERS: [&str; 2] = ["Ascending Check Points", "Descending Check Points"];

/// Route attribute, its labels, bit shift and bit width.
const ROUTE_LAYOUT: [(&str, &[&str], u8, u8); 4] = [
    ("order", &ROUTE_ORDERS, 0, 1),
    ("routetype", &ROUTE_TYPES, 1, 1),
    ("direction", &ROUTE_DIRECTIONS, 2, 1),
    ("method", &ROUTE_METHODS, 3, 3),
];

/// One-bit ZMIST entries, in bit order.
const ZMIST_FLAGS: [(&str, [&str; 2]); 5] = [
    ("Bleeding", ["Minimal", "Massive"]),
    ("Airway", ["Has Airway", "No Airway"]),
    ("Pulse Radial", ["Has Radial", "No Radial"]),
    ("Pulse Strength", ["Strong/Steady", "Weak/Rapid"]),
    ("Skin", ["Warm/Moist", "Cold/Clammy"]),
];

/// Two-bit ZMIST entries and their first bit; the value is `low + 2 * high`.
const ZMIST_PAIRS: [(&str, usize, [&str; 3]); 2] = [
    ("Pupils", 5, ["Constricted", "Dilated", "Normal"]),
    ("Breathing", 7, ["Labored", "Normal", "Absent"]),
];

/// Writes `index` into `bits` bits of `window` at `offset`, keeping every other bit.
pub fn merge_selection(window: u64, index: u64, offset: usize, bits: u32) -> u64 {
    let mask = ((1u64 << bits) - 1) << offset;
    (window & !mask) | ((index << offset) & mask)
}

fn unknown_selection(field: &CompiledField, value: &str) -> EncodeError {
    EncodeError::UnknownSelection {
        field: field.name.clone(),
        value: value.to_string(),
    }
}

fn with_attr(path: &AttrPath, attr: &str) -> AttrPath {
    AttrPath {
        nodes: path.nodes.clone(),
        attr: attr.to_string(),
    }
}

pub(super) fn decode_single(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let window = read_be(dec.peek(field, dec.offset, field.size_limit)?);
    let bits = ceil_log2(field.selections.len());
    let index = (window >> field.relative_offset) & ((1u64 << bits) - 1);

    let selection = field
        .selections
        .get(index as usize)
        .ok_or_else(|| DecodeError::UnknownSelection {
            field: field.name.clone(),
            index,
        })?;
    dec.insert(field, cursor, selection.clone())?;
    dec.offset += field.length;

    Ok(())
}

pub(super) fn encode_single(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let first = field.selections.first().map(String::as_str).unwrap_or_default();
    let value = enc.read_or(field, cursor, first)?;
    let index = field
        .selections
        .iter()
        .position(|selection| *selection == value)
        .ok_or_else(|| unknown_selection(field, &value))?;

    let width = field.size_limit;
    let at = match enc.mask_window {
        Some(at) if at + width == enc.buf.len() => at,
        _ => {
            let at = enc.buf.len();
            enc.buf.resize(at + width, 0);
            at
        }
    };

    let window = &mut enc.buf[at..at + width];
    let bits = ceil_log2(field.selections.len());
    let merged = merge_selection(read_be(window), index as u64, field.relative_offset, bits);
    write_be(window, merged);

    enc.mask_window = (field.length == 0).then_some(at);
    Ok(())
}

pub(super) fn decode_multi(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let bits = bytes_to_bits(dec.take(field, field.size_limit)?);
    let labels: Vec<&str> = field
        .selections
        .iter()
        .zip(bits)
        .filter(|(_, set)| *set)
        .map(|(label, _)| label.as_str())
        .collect();

    dec.insert(field, cursor, labels.join(" "))
}

pub(super) fn encode_multi(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let value = enc.read_or(field, cursor, "")?;
    let mut bits = vec![false; 8 * field.size_limit];
    for (bit, selection) in bits.iter_mut().zip(&field.selections) {
        *bit = value.contains(selection.as_str());
    }

    enc.buf.extend(bits_to_bytes(&bits));
    Ok(())
}

/// Route flags land as sibling attributes on the field's node.
pub(super) fn decode_route(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let byte = dec.take(field, 1)?[0];
    let path = decode_path(field)?;

    for (attr, labels, shift, width) in ROUTE_LAYOUT {
        let index = (byte >> shift) & ((1 << width) - 1);
        // Method values past the table are left unset.
        if let Some(label) = labels.get(index as usize) {
            dec.insert_at(&with_attr(path, attr), cursor, label.to_string())?;
        }
    }

    Ok(())
}

pub(super) fn encode_route(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let missing = || EncodeError::MissingAttribute(field.name.clone());
    let path = field.path().ok_or_else(missing)?;
    let event = enc.event;

    let Some(node) = tree::find_element(event, path, cursor).and_then(|at| event.node(&at)) else {
        let literal = field.value.as_deref().ok_or_else(missing)?;
        let byte: u8 = literal.trim().parse().map_err(|_| EncodeError::InvalidNumber {
            field: field.name.clone(),
            literal: literal.to_string(),
        })?;
        enc.buf.push(byte);
        return Ok(());
    };

    let mut byte = 0u8;
    for (attr, labels, shift, _) in ROUTE_LAYOUT {
        let label = tree::read_node_attr(node, attr);
        if label.is_empty() {
            continue;
        }
        let index = labels
            .iter()
            .position(|known| *known == label)
            .ok_or_else(|| unknown_selection(field, &label))?;
        byte |= (index as u8) << shift;
    }

    enc.buf.push(byte);
    Ok(())
}

pub(super) fn decode_zmist(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let bits = bytes_to_bits(dec.take(field, field.size_limit)?);
    let mut lines = Vec::with_capacity(ZMIST_FLAGS.len() + ZMIST_PAIRS.len());

    for (bit, (key, labels)) in ZMIST_FLAGS.iter().enumerate() {
        lines.push(format!("{key}: {}", labels[usize::from(bits[bit])]));
    }
    for (key, bit, labels) in ZMIST_PAIRS {
        let value = usize::from(bits[bit]) + 2 * usize::from(bits[bit + 1]);
        if let Some(label) = labels.get(value) {
            lines.push(format!("{key}: {label}"));
        }
    }

    dec.insert(field, cursor, lines.join("\n"))
}

pub(super) fn encode_zmist(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let text = enc.read_or(field, cursor, "")?;
    let mut bits = vec![false; 8 * field.size_limit];

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if let Some(bit) = ZMIST_FLAGS.iter().position(|(known, _)| *known == key) {
            if let Some(index) = ZMIST_FLAGS[bit].1.iter().position(|label| *label == value) {
                bits[bit] = index == 1;
            }
        } else if let Some((_, bit, labels)) = ZMIST_PAIRS.iter().find(|(known, ..)| *known == key) {
            if let Some(index) = labels.iter().position(|label| *label == value) {
                bits[*bit] = index & 1 != 0;
                bits[*bit + 1] = index & 2 != 0;
            }
        }
    }

    enc.buf.extend(bits_to_bytes(&bits));
    Ok(())
}
