//! Field converters: one decode and one encode strategy per [Converter].
//!
//! Decoders read at the decoder's offset and advance it by what they consume.
//! Encoders append to the frame. Every non-mask converter closes an open mask
//! window, so co-located mask fields must be declared back to back.

mod frame;
mod icon;
mod ident;
mod link;
mod mask;
mod numeric;
mod text;

pub use mask::merge_selection;
pub use numeric::{dequantize, quantize, resolution};

use tracing::warn;

use crate::{
    compiled::{CompiledField, Converter},
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    transcoder::{Decoder, Encoder},
};

pub(crate) fn decode(
    dec: &mut Decoder<'_>,
    converter: &Converter,
    field: &CompiledField,
    cursor: &mut Cursor<'_>,
) -> Result<(), DecodeError> {
    match converter {
        Converter::Int => numeric::decode_int(dec, field, cursor),
        Converter::ScaledFloat => numeric::decode_scaled(dec, field, cursor),
        Converter::PointFloat => numeric::decode_point(dec, field),
        Converter::Float32 => numeric::decode_float32(dec, field, cursor),
        Converter::Boolean => numeric::decode_boolean(dec, field, cursor),
        Converter::Color => numeric::decode_color(dec, field, cursor),
        Converter::String => text::decode_string(dec, field, cursor),
        Converter::PrimitiveString => text::decode_primitive(dec, field),
        Converter::Const => text::decode_const(dec, field, cursor),
        Converter::ZMistTitle => text::decode_zmist_title(dec, field, cursor),
        Converter::SingleChoiceMask | Converter::BooleanMask => {
            mask::decode_single(dec, field, cursor)
        }
        Converter::MultiChoiceMask => mask::decode_multi(dec, field, cursor),
        Converter::RouteMask => mask::decode_route(dec, field, cursor),
        Converter::ZMistMask => mask::decode_zmist(dec, field, cursor),
        Converter::MessageType => frame::decode_message_type(dec, field),
        Converter::Checksum => frame::decode_checksum(dec, field),
        Converter::MessageLength => frame::decode_length(dec, field),
        Converter::Placeholder => dec.skip(field, field.length),
        Converter::Degraded(name) => {
            warn!(field = %field.name, converter = %name, "degraded converter skipped bytes");
            dec.skip(field, field.length)
        }
        Converter::Uid => ident::decode_uid(dec, field),
        Converter::ChatUid => ident::decode_chat_uid(dec, field),
        Converter::GroupUid => ident::decode_group_uid(dec, field),
        Converter::IconPath => icon::decode(dec, field, cursor),
        Converter::LinkPoint => link::decode_point(dec, field, cursor).map(|_| ()),
        Converter::RouteLinkPoint => link::decode_route_point(dec, field, cursor),
        Converter::RemarksCodec => text::decode_remarks(dec, field, cursor),
        Converter::Obstacles => text::decode_obstacles(dec, field, cursor),
    }
}

pub(crate) fn encode(
    enc: &mut Encoder<'_>,
    converter: &Converter,
    field: &CompiledField,
    cursor: &mut Cursor<'_>,
) -> Result<(), EncodeError> {
    if !converter.is_windowed() {
        enc.mask_window = None;
    }

    match converter {
        Converter::Int => numeric::encode_int(enc, field, cursor),
        Converter::ScaledFloat => numeric::encode_scaled(enc, field, cursor),
        Converter::PointFloat => numeric::encode_point(enc, field),
        Converter::Float32 => numeric::encode_float32(enc, field, cursor),
        Converter::Boolean => numeric::encode_boolean(enc, field, cursor),
        Converter::Color => numeric::encode_color(enc, field, cursor),
        Converter::String => text::encode_string(enc, field, cursor),
        Converter::PrimitiveString => text::encode_primitive(enc, field),
        Converter::Const | Converter::ZMistTitle | Converter::Obstacles => Ok(()),
        Converter::SingleChoiceMask | Converter::BooleanMask => {
            mask::encode_single(enc, field, cursor)
        }
        Converter::MultiChoiceMask => mask::encode_multi(enc, field, cursor),
        Converter::RouteMask => mask::encode_route(enc, field, cursor),
        Converter::ZMistMask => mask::encode_zmist(enc, field, cursor),
        Converter::MessageType => {
            enc.buf.push(enc.message_id);
            Ok(())
        }
        Converter::Checksum => frame::encode_checksum(enc, field),
        Converter::MessageLength => frame::encode_length(enc, field),
        Converter::Placeholder => {
            enc.buf.resize(enc.buf.len() + field.length, 0);
            Ok(())
        }
        Converter::Degraded(name) => {
            warn!(field = %field.name, converter = %name, "degraded converter wrote zeros");
            enc.buf.resize(enc.buf.len() + field.length, 0);
            Ok(())
        }
        Converter::Uid | Converter::ChatUid => ident::encode_uid(enc, field),
        Converter::GroupUid => ident::encode_group_uid(enc),
        Converter::IconPath => icon::encode(enc, field, cursor),
        Converter::LinkPoint | Converter::RouteLinkPoint => link::encode_point(enc, field, cursor),
        Converter::RemarksCodec => text::encode_remarks(enc, field, cursor),
    }
}
