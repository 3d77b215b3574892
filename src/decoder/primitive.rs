//! Payload decoders for the primitive universal types.
//!
//! Definite-form decoders receive exactly the declared content octets.
//! String types additionally support the constructed forms, where the
//! payload is reassembled from primitive segments of the same type.

use alloc::vec::Vec;

use crate::decoder::DecoderOptions;
use crate::decoder::EncodingRules;
use crate::error::{DecodeError, DecodeResult};
use crate::oid::Oid;
use crate::parser::{self, Length};
use crate::tag::{TagForm, TagSet};
use crate::value::{BitString, Real};

/// Two's-complement big-endian signed integer. Zero content octets
/// decode to zero.
pub(crate) fn decode_integer(body: &[u8]) -> DecodeResult<i128> {
    if body.is_empty() {
        return Ok(0);
    }
    if body.len() > 16 {
        return Err(DecodeError::MalformedValue("integer exceeds 128 bits"));
    }

    let mut value: i128 = if body[0] & 0x80 != 0 { -1 } else { 0 };
    for &octet in body {
        value = (value << 8) | octet as i128;
    }
    Ok(value)
}

/// Booleans are decoded as integers and normalized to true/false; under
/// canonical rules the single content octet must be `00` or `FF`.
pub(crate) fn decode_boolean(body: &[u8], rules: EncodingRules) -> DecodeResult<bool> {
    if rules.requires_canonical_values() {
        if body.len() != 1 || (body[0] != 0x00 && body[0] != 0xFF) {
            return Err(DecodeError::MalformedValue("non-canonical boolean"));
        }
        return Ok(body[0] != 0x00);
    }
    Ok(decode_integer(body)? != 0)
}

pub(crate) fn decode_null(body: &[u8]) -> DecodeResult<()> {
    if !body.is_empty() {
        return Err(DecodeError::MalformedValue("null with non-empty contents"));
    }
    Ok(())
}

/// Base-128 sub-identifiers, with the combined leading pair split into
/// the first two arcs.
///
/// A sub-identifier starting with `0x80` encodes a leading zero, which
/// the standard forbids and which has been used to forge identifiers;
/// it is rejected outright.
pub(crate) fn decode_oid(body: &[u8]) -> DecodeResult<Oid> {
    if body.is_empty() {
        return Err(DecodeError::MalformedValue("empty object identifier"));
    }

    let mut sub_ids: Vec<u64> = Vec::new();
    let mut idx = 0;
    while idx < body.len() {
        if body[idx] == 0x80 {
            return Err(DecodeError::MalformedValue(
                "leading 0x80 octet in OID sub-identifier",
            ));
        }
        let mut sub_id: u64 = 0;
        loop {
            let octet = body[idx];
            idx += 1;
            if sub_id > u64::MAX >> 7 {
                return Err(DecodeError::MalformedValue("OID sub-identifier overflow"));
            }
            sub_id = (sub_id << 7) | (octet & 0x7F) as u64;
            if octet & 0x80 == 0 {
                break;
            }
            if idx >= body.len() {
                return Err(DecodeError::MalformedValue("truncated OID sub-identifier"));
            }
        }
        sub_ids.push(sub_id);
    }

    // split the combined first sub-identifier into the leading two arcs
    let first = sub_ids[0];
    let mut arcs = Vec::with_capacity(sub_ids.len() + 1);
    match first {
        0..=39 => {
            arcs.push(0);
            arcs.push(first);
        }
        40..=79 => {
            arcs.push(1);
            arcs.push(first - 40);
        }
        _ => {
            arcs.push(2);
            arcs.push(first - 80);
        }
    }
    arcs.extend_from_slice(&sub_ids[1..]);

    Ok(Oid::new(arcs))
}

/// REAL contents: the first octet selects binary, special or character
/// encoding.
pub(crate) fn decode_real(body: &[u8]) -> DecodeResult<Real> {
    let Some((&first, rest)) = body.split_first() else {
        // zero content octets encode plus zero
        return Ok(Real::Binary { mantissa: 0, exponent: 0 });
    };

    if first & 0x80 != 0 {
        return decode_real_binary(first, rest);
    }

    if first & 0x40 != 0 {
        return Ok(if first & 0x01 != 0 { Real::MinusInfinity } else { Real::PlusInfinity });
    }

    decode_real_character(first, rest)
}

fn decode_real_binary(first: u8, rest: &[u8]) -> DecodeResult<Real> {
    let mut rest = rest;
    let mut exp_len = ((first & 0x03) + 1) as usize;
    if exp_len == 4 {
        // fourth combination: next octet carries the exponent length
        let Some((&len, tail)) = rest.split_first() else {
            return Err(DecodeError::MalformedValue("truncated real exponent length"));
        };
        exp_len = len as usize;
        rest = tail;
    }

    if exp_len == 0 || rest.len() <= exp_len {
        return Err(DecodeError::MalformedValue("truncated real exponent"));
    }
    if exp_len > 4 {
        return Err(DecodeError::MalformedValue("real exponent exceeds 32 bits"));
    }

    let (exp_octets, mantissa_octets) = rest.split_at(exp_len);

    let mut exponent: i64 = if exp_octets[0] & 0x80 != 0 { -1 } else { 0 };
    for &octet in exp_octets {
        exponent = (exponent << 8) | octet as i64;
    }

    match (first >> 4) & 0x03 {
        0 => {}
        1 => exponent *= 3, // base 8
        2 => exponent *= 4, // base 16
        _ => return Err(DecodeError::MalformedValue("reserved real base")),
    }

    if mantissa_octets.len() > 8 {
        return Err(DecodeError::MalformedValue("real mantissa exceeds 64 bits"));
    }
    let mut mantissa: u64 = 0;
    for &octet in mantissa_octets {
        mantissa = (mantissa << 8) | octet as u64;
    }
    let scale = ((first >> 2) & 0x03) as u32;
    if mantissa > (i64::MAX as u64) >> scale {
        return Err(DecodeError::MalformedValue("real mantissa exceeds 64 bits"));
    }

    let mut mantissa = (mantissa << scale) as i64;
    if first & 0x40 != 0 {
        mantissa = -mantissa;
    }

    let exponent = i32::try_from(exponent)
        .map_err(|_| DecodeError::MalformedValue("real exponent exceeds 32 bits"))?;

    Ok(Real::Binary { mantissa, exponent })
}

fn decode_real_character(first: u8, rest: &[u8]) -> DecodeResult<Real> {
    if rest.is_empty() {
        return Err(DecodeError::MalformedValue("empty character-encoded real"));
    }
    let text = core::str::from_utf8(rest)
        .map_err(|_| DecodeError::MalformedValue("character-encoded real is not text"))?
        .trim_ascii();

    match first & 0x03 {
        // NR1: signed integer digits
        1 => {
            let value: i64 = text
                .parse()
                .map_err(|_| DecodeError::MalformedValue("bad NR1 real syntax"))?;
            Ok(Real::Decimal(value as f64))
        }
        // NR2: fixed point, NR3: exponent notation
        2 | 3 => {
            let value: f64 = text
                .parse()
                .map_err(|_| DecodeError::MalformedValue("bad character real syntax"))?;
            Ok(Real::Decimal(value))
        }
        _ => Err(DecodeError::MalformedValue("unknown character real form")),
    }
}

/// Primitive BIT STRING contents: the leading octet gives the unused
/// trailing bits of the final octet.
fn decode_bit_string_primitive(body: &[u8]) -> DecodeResult<BitString> {
    let Some((&unused, data)) = body.split_first() else {
        return Err(DecodeError::MalformedValue("empty bit string contents"));
    };
    if unused > 7 {
        return Err(DecodeError::MalformedValue("bit string trailing bits overflow"));
    }
    if data.is_empty() && unused != 0 {
        return Err(DecodeError::MalformedValue("bit string trailing bits without content"));
    }
    Ok(BitString::from_octets(data.to_vec(), unused))
}

/// Append one constructed-form segment, itself encoded per the primitive
/// rule. Only the final segment may leave trailing bits, so a segment
/// landing after a partial octet is an error.
fn append_bit_fragment(bits: &mut BitString, fragment: &[u8]) -> DecodeResult<()> {
    if bits.len() % 8 != 0 {
        return Err(DecodeError::MalformedValue("bit string segment after trailing bits"));
    }
    let Some((&unused, data)) = fragment.split_first() else {
        return Err(DecodeError::MalformedValue("empty bit string contents"));
    };
    if unused > 7 {
        return Err(DecodeError::MalformedValue("bit string trailing bits overflow"));
    }
    if data.is_empty() && unused != 0 {
        return Err(DecodeError::MalformedValue("bit string trailing bits without content"));
    }
    bits.push_bits(data, unused);
    Ok(())
}

pub(crate) fn decode_bit_string(
    options: &DecoderOptions,
    body: &[u8],
    tag_set: &TagSet,
) -> DecodeResult<BitString> {
    if tag_set.effective_form() == TagForm::Primitive {
        return decode_bit_string_primitive(body);
    }

    if !options.rules.allows_constructed_strings() {
        return Err(DecodeError::MalformedValue(
            "constructed string not allowed by encoding rules",
        ));
    }

    let mut bits = BitString::empty();
    let mut input = body;
    while !input.is_empty() {
        let (rest, fragment) = string_fragment(input, crate::tag::UniversalTag::BitString as u32)?;
        append_bit_fragment(&mut bits, fragment)?;
        input = rest;
    }
    Ok(bits)
}

pub(crate) fn decode_bit_string_indefinite<'a>(
    options: &DecoderOptions,
    mut input: &'a [u8],
) -> DecodeResult<(&'a [u8], BitString)> {
    if !options.rules.allows_constructed_strings() {
        return Err(DecodeError::MalformedValue(
            "constructed string not allowed by encoding rules",
        ));
    }

    let mut bits = BitString::empty();
    loop {
        let (rest, is_eoc) = parser::parse_eoc(input)
            .map_err(|e| DecodeError::from_nom(e, "malformed end-of-contents"))?;
        if is_eoc {
            return Ok((rest, bits));
        }
        let (rest, fragment) = string_fragment(input, crate::tag::UniversalTag::BitString as u32)?;
        append_bit_fragment(&mut bits, fragment)?;
        input = rest;
    }
}

/// OCTET STRING and character-string contents: literal octets in the
/// primitive form, reassembled segments in the constructed form.
pub(crate) fn decode_octets(
    options: &DecoderOptions,
    body: &[u8],
    tag_set: &TagSet,
    expected_number: u32,
) -> DecodeResult<Vec<u8>> {
    if tag_set.effective_form() == TagForm::Primitive {
        return Ok(body.to_vec());
    }

    if !options.rules.allows_constructed_strings() {
        return Err(DecodeError::MalformedValue(
            "constructed string not allowed by encoding rules",
        ));
    }

    let mut out = Vec::new();
    let mut input = body;
    while !input.is_empty() {
        let (rest, fragment) = string_fragment(input, expected_number)?;
        out.extend_from_slice(fragment);
        input = rest;
    }
    Ok(out)
}

pub(crate) fn decode_octets_indefinite<'a>(
    options: &DecoderOptions,
    mut input: &'a [u8],
    expected_number: u32,
) -> DecodeResult<(&'a [u8], Vec<u8>)> {
    if !options.rules.allows_constructed_strings() {
        return Err(DecodeError::MalformedValue(
            "constructed string not allowed by encoding rules",
        ));
    }

    let mut out = Vec::new();
    loop {
        let (rest, is_eoc) = parser::parse_eoc(input)
            .map_err(|e| DecodeError::from_nom(e, "malformed end-of-contents"))?;
        if is_eoc {
            return Ok((rest, out));
        }
        let (rest, fragment) = string_fragment(input, expected_number)?;
        out.extend_from_slice(fragment);
        input = rest;
    }
}

/// One segment of a constructed string: a primitive TLV of the same
/// universal type.
fn string_fragment<'a>(
    input: &'a [u8],
    expected_number: u32,
) -> DecodeResult<(&'a [u8], &'a [u8])> {
    let (rest, tag) =
        parser::parse_tag(input).map_err(|e| DecodeError::from_nom(e, "malformed segment tag"))?;
    if tag.is_constructed() {
        return Err(DecodeError::MalformedValue("nested constructed string segment"));
    }
    if !tag.is_universal() || tag.number != expected_number {
        return Err(DecodeError::MalformedValue("string segment type mismatch"));
    }

    let (rest, length) = parser::parse_length(rest)
        .map_err(|e| DecodeError::from_nom(e, "malformed segment length"))?;
    let Length::Definite(len) = length else {
        return Err(DecodeError::MalformedValue("indefinite length on a primitive encoding"));
    };

    let (rest, contents) = parser::take_contents(rest, len)
        .map_err(|e| DecodeError::from_nom(e, "malformed segment contents"))?;
    Ok((rest, contents))
}

/// ANY contents in the definite form. An untagged slot re-captures the
/// TLV header so the raw octets stay a complete encoding.
pub(crate) fn collect_any(body: &[u8], header: &[u8], untagged: bool) -> Vec<u8> {
    if untagged {
        let mut bytes = Vec::with_capacity(header.len() + body.len());
        bytes.extend_from_slice(header);
        bytes.extend_from_slice(body);
        bytes
    } else {
        body.to_vec()
    }
}

/// ANY contents in the indefinite form: the contents of the definite
/// fragments are concatenated until the end-of-contents sentinel.
pub(crate) fn decode_any_indefinite<'a>(
    mut input: &'a [u8],
    header: Option<&[u8]>,
) -> DecodeResult<(&'a [u8], Vec<u8>)> {
    let mut bytes = header.unwrap_or_default().to_vec();
    loop {
        let (rest, is_eoc) = parser::parse_eoc(input)
            .map_err(|e| DecodeError::from_nom(e, "malformed end-of-contents"))?;
        if is_eoc {
            return Ok((rest, bytes));
        }

        let (rest, _tag) = parser::parse_tag(input)
            .map_err(|e| DecodeError::from_nom(e, "malformed fragment tag"))?;
        let (rest, length) = parser::parse_length(rest)
            .map_err(|e| DecodeError::from_nom(e, "malformed fragment length"))?;
        let Length::Definite(len) = length else {
            return Err(DecodeError::MalformedValue("indefinite fragment inside indefinite value"));
        };
        let (rest, contents) = parser::take_contents(rest, len)
            .map_err(|e| DecodeError::from_nom(e, "malformed fragment contents"))?;
        bytes.extend_from_slice(contents);
        input = rest;
    }
}
