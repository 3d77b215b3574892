//! Low-level BER wire parsers.
//!
//! Streaming nom parsers for the identifier octets, the length octets and
//! the end-of-contents sentinel. An exhausted buffer surfaces as
//! `nom::Err::Incomplete` without consuming input, which the decoder
//! layer turns into a recoverable underrun.
//!
//! Reference: ISO/IEC 8825-1:2015, Section 8.1

use nom::{
    IResult, Parser,
    bytes::streaming::take,
    error::{Error, ErrorKind},
    number::streaming::u8 as nom_u8,
};

use crate::tag::{Tag, TagClass, TagForm};

/// Decoded length field of a TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Definite form: exactly this many content octets follow.
    Definite(usize),
    /// Indefinite form: content runs until an end-of-contents sentinel.
    Indefinite,
}

/// Parse the identifier octets into a [`Tag`].
///
/// A tag number of 31 in the initial octet escapes to the long form:
/// base-128 big-endian continuation octets. Numbers above `u32::MAX` are
/// rejected.
pub fn parse_tag(input: &[u8]) -> IResult<&[u8], Tag> {
    let (input, first) = nom_u8(input)?;
    let class = TagClass::from_bits(first);
    let form = TagForm::from_bit(first);
    let number = (first & 0b000_11111) as u32;

    if number != 0x1F {
        return Ok((input, Tag::new(class, form, number)));
    }

    let mut number: u32 = 0;
    let mut input = input;
    loop {
        let (rest, octet) = nom_u8(input)?;
        input = rest;

        if number > u32::MAX >> 7 {
            return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
        }
        number = (number << 7) | (octet & 0x7F) as u32;

        if octet & 0x80 == 0 {
            break;
        }
    }

    Ok((input, Tag::new(class, form, number)))
}

/// Parse the length octets.
///
/// Short form for lengths below 128; `0x80 | k` announces `k` big-endian
/// length octets; bare `0x80` selects the indefinite form. The initial
/// octet `0xFF` is reserved.
pub fn parse_length(input: &[u8]) -> IResult<&[u8], Length> {
    let (input, first) = nom_u8(input)?;

    if first < 0x80 {
        return Ok((input, Length::Definite(first as usize)));
    }
    if first == 0x80 {
        return Ok((input, Length::Indefinite));
    }
    if first == 0xFF {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::LengthValue)));
    }

    let count = (first & 0x7F) as usize;
    let (input, octets) = take(count).parse(input)?;

    let mut length: usize = 0;
    for &octet in octets {
        length = length
            .checked_mul(256)
            .and_then(|l| l.checked_add(octet as usize))
            .ok_or(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)))?;
    }

    Ok((input, Length::Definite(length)))
}

/// Check for the two-octet end-of-contents sentinel.
///
/// Needs two buffered octets either way. Consumes them only when they are
/// the sentinel; otherwise the input is returned untouched.
pub fn parse_eoc(input: &[u8]) -> IResult<&[u8], bool> {
    let (rest, octets) = take(2usize).parse(input)?;
    if octets == [0x00, 0x00] {
        Ok((rest, true))
    } else {
        Ok((input, false))
    }
}

/// Read exactly `length` content octets.
pub fn take_contents(input: &[u8], length: usize) -> IResult<&[u8], &[u8]> {
    take(length).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_short_form() {
        let (rest, tag) = parse_tag(&[0x02, 0x01]).unwrap();
        assert_eq!(rest, &[0x01]);
        assert_eq!(tag, Tag::universal(TagForm::Primitive, 2));

        let (_, tag) = parse_tag(&[0x30]).unwrap();
        assert_eq!(tag, Tag::universal(TagForm::Constructed, 16));

        let (_, tag) = parse_tag(&[0xA0]).unwrap();
        assert_eq!(tag, Tag::context(TagForm::Constructed, 0));

        let (_, tag) = parse_tag(&[0x60]).unwrap();
        assert_eq!(tag, Tag::application(TagForm::Constructed, 0));
    }

    #[test]
    fn test_parse_tag_long_form() {
        // private constructed, number 511
        let (rest, tag) = parse_tag(&[0xFF, 0x83, 0x7F]).unwrap();
        assert_eq!(rest, &[]);
        assert_eq!(tag.class, TagClass::Private);
        assert_eq!(tag.form, TagForm::Constructed);
        assert_eq!(tag.number, 511);

        // context primitive, number 31 (smallest long form)
        let (_, tag) = parse_tag(&[0x9F, 0x1F]).unwrap();
        assert_eq!(tag.number, 31);
    }

    #[test]
    fn test_parse_tag_underrun() {
        assert!(matches!(parse_tag(&[]), Err(nom::Err::Incomplete(_))));
        // long form cut short
        assert!(matches!(parse_tag(&[0x9F, 0x83]), Err(nom::Err::Incomplete(_))));
    }

    #[test]
    fn test_parse_tag_number_overflow() {
        // six continuation octets exceed u32
        let input = [0x9F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(parse_tag(&input), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_parse_length_short_form() {
        assert_eq!(parse_length(&[0x05]).unwrap(), (&[][..], Length::Definite(5)));
        assert_eq!(parse_length(&[0x7F]).unwrap(), (&[][..], Length::Definite(127)));
        assert_eq!(parse_length(&[0x00]).unwrap(), (&[][..], Length::Definite(0)));
    }

    #[test]
    fn test_parse_length_long_form() {
        assert_eq!(parse_length(&[0x81, 0x80]).unwrap(), (&[][..], Length::Definite(128)));
        assert_eq!(
            parse_length(&[0x82, 0x01, 0x00]).unwrap(),
            (&[][..], Length::Definite(256))
        );
        assert_eq!(
            parse_length(&[0x82, 0x12, 0x34, 0xAA]).unwrap(),
            (&[0xAA][..], Length::Definite(0x1234))
        );
    }

    #[test]
    fn test_parse_length_indefinite() {
        assert_eq!(parse_length(&[0x80]).unwrap(), (&[][..], Length::Indefinite));
    }

    #[test]
    fn test_parse_length_reserved() {
        assert!(matches!(parse_length(&[0xFF]), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_parse_length_underrun() {
        assert!(matches!(parse_length(&[]), Err(nom::Err::Incomplete(_))));
        assert!(matches!(parse_length(&[0x82, 0x01]), Err(nom::Err::Incomplete(_))));
    }

    #[test]
    fn test_parse_eoc() {
        assert_eq!(parse_eoc(&[0x00, 0x00, 0x02]).unwrap(), (&[0x02][..], true));

        // not the sentinel: nothing consumed
        let input = [0x02, 0x01, 0x05];
        assert_eq!(parse_eoc(&input).unwrap(), (&input[..], false));

        assert!(matches!(parse_eoc(&[0x00]), Err(nom::Err::Incomplete(_))));
    }

    #[test]
    fn test_take_contents() {
        let (rest, contents) = take_contents(&[0xAA, 0xBB, 0xCC], 2).unwrap();
        assert_eq!(contents, &[0xAA, 0xBB]);
        assert_eq!(rest, &[0xCC]);

        assert!(matches!(take_contents(&[0xAA], 2), Err(nom::Err::Incomplete(_))));
    }
}
