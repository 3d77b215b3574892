//! Decoded ASN.1 values.
//!
//! [`Value`] pairs the effective tag chain recovered from the wire with a
//! [`ValueKind`] payload. Constructed variants own their children in wire
//! order; record variants keep the slot names of the guiding catalogue.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::oid::Oid;
use crate::tag::{TagSet, UniversalTag};

/// Surface type of a character-string or "useful" value.
///
/// All of these share the octet-string decoding mechanics; only the
/// universal tag number differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum StringKind {
    Utf8,
    Numeric,
    Printable,
    Teletex,
    Videotex,
    Ia5,
    Graphic,
    Visible,
    General,
    Universal,
    Bmp,
    ObjectDescriptor,
    UtcTime,
    GeneralizedTime,
}

impl StringKind {
    /// The universal tag number of this surface type.
    pub const fn tag_number(self) -> u32 {
        match self {
            Self::Utf8 => UniversalTag::Utf8String as u32,
            Self::Numeric => UniversalTag::NumericString as u32,
            Self::Printable => UniversalTag::PrintableString as u32,
            Self::Teletex => UniversalTag::TeletexString as u32,
            Self::Videotex => UniversalTag::VideotexString as u32,
            Self::Ia5 => UniversalTag::Ia5String as u32,
            Self::Graphic => UniversalTag::GraphicString as u32,
            Self::Visible => UniversalTag::VisibleString as u32,
            Self::General => UniversalTag::GeneralString as u32,
            Self::Universal => UniversalTag::UniversalString as u32,
            Self::Bmp => UniversalTag::BmpString as u32,
            Self::ObjectDescriptor => UniversalTag::ObjectDescriptor as u32,
            Self::UtcTime => UniversalTag::UtcTime as u32,
            Self::GeneralizedTime => UniversalTag::GeneralizedTime as u32,
        }
    }

    pub(crate) const fn from_universal(tag: UniversalTag) -> Option<Self> {
        Some(match tag {
            UniversalTag::Utf8String => Self::Utf8,
            UniversalTag::NumericString => Self::Numeric,
            UniversalTag::PrintableString => Self::Printable,
            UniversalTag::TeletexString => Self::Teletex,
            UniversalTag::VideotexString => Self::Videotex,
            UniversalTag::Ia5String => Self::Ia5,
            UniversalTag::GraphicString => Self::Graphic,
            UniversalTag::VisibleString => Self::Visible,
            UniversalTag::GeneralString => Self::General,
            UniversalTag::UniversalString => Self::Universal,
            UniversalTag::BmpString => Self::Bmp,
            UniversalTag::ObjectDescriptor => Self::ObjectDescriptor,
            UniversalTag::UtcTime => Self::UtcTime,
            UniversalTag::GeneralizedTime => Self::GeneralizedTime,
            _ => return None,
        })
    }
}

/// A decoded BIT STRING: packed bits plus the exact bit count.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BitString {
    data: Vec<u8>,
    bit_len: usize,
}

impl BitString {
    /// An empty bit string.
    pub fn empty() -> Self {
        Self { data: Vec::new(), bit_len: 0 }
    }

    /// Build from packed octets and the number of unused trailing bits in
    /// the final octet.
    pub fn from_octets(data: Vec<u8>, unused_bits: u8) -> Self {
        let bit_len = (data.len() * 8).saturating_sub(usize::from(unused_bits));
        Self { data, bit_len }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Bit at position `i`, most significant bit of the first octet first.
    pub fn bit(&self, i: usize) -> Option<bool> {
        if i >= self.bit_len {
            return None;
        }
        Some(self.data[i / 8] & (0x80 >> (i % 8)) != 0)
    }

    /// The packed octets. Unused trailing bits are zero.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Unused trailing bits in the final octet.
    pub fn unused_bits(&self) -> u8 {
        ((8 - self.bit_len % 8) % 8) as u8
    }

    /// Append the payload of one encoding fragment, bit by bit.
    ///
    /// Fragment concatenation preserves bit ordering regardless of octet
    /// alignment.
    pub(crate) fn push_bits(&mut self, octets: &[u8], unused_bits: u8) {
        let frag_bits = octets.len() * 8 - usize::from(unused_bits);
        for i in 0..frag_bits {
            self.push_bit(octets[i / 8] & (0x80 >> (i % 8)) != 0);
        }
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.bit_len / 8] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString(")?;
        for i in 0..self.bit_len {
            write!(f, "{}", u8::from(self.bit(i).unwrap_or(false)))?;
        }
        write!(f, ")")
    }
}

/// A decoded REAL.
///
/// Binary encodings are normalized to base 2; character encodings
/// (NR1/NR2/NR3) are parsed into the decimal variant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Real {
    /// `mantissa * 2^exponent`
    Binary { mantissa: i64, exponent: i32 },
    /// A character-encoded decimal value.
    Decimal(f64),
    PlusInfinity,
    MinusInfinity,
}

impl Real {
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Binary { mantissa, exponent } => mantissa as f64 * pow2(exponent),
            Self::Decimal(value) => value,
            Self::PlusInfinity => f64::INFINITY,
            Self::MinusInfinity => f64::NEG_INFINITY,
        }
    }
}

/// `2^exp` as an f64, built from the bit representation so that no float
/// math from `std` is needed.
fn pow2(exp: i32) -> f64 {
    if exp > 1023 {
        f64::INFINITY
    } else if exp >= -1022 {
        f64::from_bits(((exp + 1023) as u64) << 52)
    } else if exp >= -1074 {
        // subnormal range
        f64::from_bits(1u64 << (exp + 1074))
    } else {
        0.0
    }
}

/// One slot of a decoded record.
///
/// `value` is `None` for an optional or defaulted slot that was absent
/// from the wire.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RecordField {
    pub name: Option<&'static str>,
    pub value: Option<Value>,
}

/// A decoded SEQUENCE or SET with per-slot names taken from the guiding
/// catalogue. Schemaless records carry unnamed positional slots.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Record {
    pub fields: Vec<RecordField>,
}

impl Record {
    /// Build an unnamed positional record from child values.
    pub fn positional(children: Vec<Value>) -> Self {
        Self {
            fields: children
                .into_iter()
                .map(|value| RecordField { name: None, value: Some(value) })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a present slot by catalogue name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == Some(name))
            .and_then(|f| f.value.as_ref())
    }

    /// Present slot values in catalogue order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().filter_map(|f| f.value.as_ref())
    }
}

/// The payload of a decoded value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[non_exhaustive]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i128),
    Enumerated(i128),
    BitString(BitString),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    Real(Real),
    CharacterString(StringKind, Vec<u8>),
    Sequence(Record),
    SequenceOf(Vec<Value>),
    Set(Record),
    SetOf(Vec<Value>),
    Choice { name: Option<&'static str>, value: Box<Value> },
    /// Raw octets of a value no schema constrains: for an untagged ANY
    /// slot this includes the TLV header.
    Any(Vec<u8>),
}

/// A decoded ASN.1 value: the effective tag chain plus the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub tags: TagSet,
    pub kind: ValueKind,
}

impl Value {
    pub fn new(tags: TagSet, kind: ValueKind) -> Self {
        Self { tags, kind }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Integer or Enumerated payload.
    pub fn as_integer(&self) -> Option<i128> {
        match self.kind {
            ValueKind::Integer(n) | ValueKind::Enumerated(n) => Some(n),
            _ => None,
        }
    }

    /// Raw octets of an OctetString, character string or Any payload.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match &self.kind {
            ValueKind::OctetString(bytes)
            | ValueKind::CharacterString(_, bytes)
            | ValueKind::Any(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Character-string payload as UTF-8 text, if valid.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::CharacterString(_, bytes) => core::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match &self.kind {
            ValueKind::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_bit_string(&self) -> Option<&BitString> {
        match &self.kind {
            ValueKind::BitString(bits) => Some(bits),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<Real> {
        match self.kind {
            ValueKind::Real(r) => Some(r),
            _ => None,
        }
    }

    /// Record payload of a Sequence or Set.
    pub fn record(&self) -> Option<&Record> {
        match &self.kind {
            ValueKind::Sequence(rec) | ValueKind::Set(rec) => Some(rec),
            _ => None,
        }
    }

    /// Children of a SequenceOf or SetOf.
    pub fn elements(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::SequenceOf(els) | ValueKind::SetOf(els) => Some(els),
            _ => None,
        }
    }

    /// The selected branch of a Choice.
    pub fn choice(&self) -> Option<(Option<&'static str>, &Value)> {
        match &self.kind {
            ValueKind::Choice { name, value } => Some((*name, value)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.kind.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{Tag, TagForm};
    use alloc::vec;

    fn value(kind: ValueKind, number: u32) -> Value {
        Value::new(TagSet::of(Tag::universal(TagForm::Primitive, number)), kind)
    }

    #[test]
    fn test_bit_string_from_octets() {
        let bits = BitString::from_octets(vec![0b1010_0000], 5);
        assert_eq!(bits.len(), 3);
        assert_eq!(bits.bit(0), Some(true));
        assert_eq!(bits.bit(1), Some(false));
        assert_eq!(bits.bit(2), Some(true));
        assert_eq!(bits.bit(3), None);
        assert_eq!(bits.unused_bits(), 5);
    }

    #[test]
    fn test_bit_string_push_bits_aligned() {
        let mut bits = BitString::empty();
        bits.push_bits(&[0xAA], 0);
        bits.push_bits(&[0xBB], 0);
        assert_eq!(bits.as_bytes(), &[0xAA, 0xBB]);
        assert_eq!(bits.len(), 16);
    }

    #[test]
    fn test_bit_string_push_bits_unaligned() {
        let mut bits = BitString::empty();
        // 3 bits: 101
        bits.push_bits(&[0b1010_0000], 5);
        // 2 bits: 11
        bits.push_bits(&[0b1100_0000], 6);
        assert_eq!(bits.len(), 5);
        assert_eq!(bits.as_bytes(), &[0b1011_1000]);
    }

    #[test]
    fn test_real_to_f64_binary() {
        let real = Real::Binary { mantissa: 3, exponent: 2 };
        assert_eq!(real.to_f64(), 12.0);

        let real = Real::Binary { mantissa: -1, exponent: -1 };
        assert_eq!(real.to_f64(), -0.5);

        let real = Real::Binary { mantissa: 0, exponent: 0 };
        assert_eq!(real.to_f64(), 0.0);
    }

    #[test]
    fn test_real_to_f64_special() {
        assert_eq!(Real::PlusInfinity.to_f64(), f64::INFINITY);
        assert_eq!(Real::MinusInfinity.to_f64(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_pow2_extremes() {
        assert_eq!(pow2(0), 1.0);
        assert_eq!(pow2(10), 1024.0);
        assert_eq!(pow2(-3), 0.125);
        assert_eq!(pow2(2000), f64::INFINITY);
        assert_eq!(pow2(-2000), 0.0);
    }

    #[test]
    fn test_record_get_by_name() {
        let rec = Record {
            fields: vec![
                RecordField {
                    name: Some("version"),
                    value: Some(value(ValueKind::Integer(3), 2)),
                },
                RecordField { name: Some("extensions"), value: None },
            ],
        };

        assert_eq!(rec.get("version").unwrap().as_integer(), Some(3));
        assert_eq!(rec.get("extensions"), None);
        assert_eq!(rec.get("missing"), None);
        assert_eq!(rec.values().count(), 1);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(value(ValueKind::Boolean(true), 1).as_bool(), Some(true));
        assert_eq!(value(ValueKind::Integer(-5), 2).as_integer(), Some(-5));
        assert_eq!(value(ValueKind::Enumerated(2), 10).as_integer(), Some(2));
        assert!(value(ValueKind::Null, 5).is_null());

        let s = value(
            ValueKind::CharacterString(StringKind::Utf8, b"abc".to_vec()),
            12,
        );
        assert_eq!(s.as_str(), Some("abc"));
        assert_eq!(s.as_slice(), Some(&b"abc"[..]));
        assert_eq!(s.as_integer(), None);
    }

    #[test]
    fn test_string_kind_tag_numbers() {
        assert_eq!(StringKind::Utf8.tag_number(), 12);
        assert_eq!(StringKind::Ia5.tag_number(), 22);
        assert_eq!(StringKind::UtcTime.tag_number(), 23);
        assert_eq!(StringKind::GeneralizedTime.tag_number(), 24);
        assert_eq!(StringKind::from_universal(UniversalTag::VisibleString), Some(StringKind::Visible));
        assert_eq!(StringKind::from_universal(UniversalTag::Integer), None);
    }
}
