//! The single-item TLV decoder.
//!
//! [`decode_item`] drives one tag-length-value round: decode the tag,
//! decode the length, select a payload decoder from the dispatch tables
//! (or from the caller's schema), then hand the contents to that decoder.
//! Constructed payloads recurse through here for every child.
//!
//! Decoder selection without a schema goes through the tag-indexed
//! [`TagMap`]; with a schema, the template is matched on tag set and the
//! payload decoder is picked by type id, which is what disambiguates
//! Sequence from SequenceOf, Set from SetOf and Choice from Any. A
//! constructed, non-universal tag that matches nothing is assumed to be
//! an explicit tag wrapping an inner TLV.

mod constructed;
mod primitive;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::{DecodeError, DecodeResult};
use crate::parser::{self, Length};
use crate::spec::{Asn1Type, TypeId, TypeKind};
use crate::tag::{Tag, TagClass, TagForm, TagSet, UniversalTag};
use crate::value::{StringKind, Value, ValueKind};

/// Decode-time strictness profile.
///
/// CER and DER are proper subsets of BER: everything they forbid is
/// rejected, everything else decodes identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingRules {
    Ber,
    Cer,
    Der,
}

impl EncodingRules {
    pub(crate) fn allows_indefinite(self) -> bool {
        !matches!(self, Self::Der)
    }

    pub(crate) fn allows_constructed_strings(self) -> bool {
        !matches!(self, Self::Der)
    }

    pub(crate) fn requires_canonical_values(self) -> bool {
        matches!(self, Self::Cer | Self::Der)
    }
}

/// Which payload decoder handles a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Boolean,
    Integer,
    Enumerated,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Real,
    String(StringKind),
    /// Record-or-homogeneous ambiguity, resolved by the schemaless
    /// heuristic.
    SequenceOrOf,
    SetOrOf,
    Sequence,
    SequenceOf,
    Set,
    SetOf,
    Choice,
    Any,
}

/// The tag-indexed dispatch table: effective tag to payload decoder.
///
/// Built once, read-only afterwards. Lookup ignores the form bit, since
/// string types appear in both primitive and constructed form.
#[derive(Debug, Clone)]
pub struct TagMap {
    entries: BTreeMap<(TagClass, u32), PayloadKind>,
}

impl TagMap {
    /// The table covering every universal type with a payload decoder.
    pub fn universal() -> Self {
        let mut entries = BTreeMap::new();
        let mut put = |tag: UniversalTag, kind: PayloadKind| {
            entries.insert((TagClass::Universal, tag as u32), kind);
        };

        put(UniversalTag::Boolean, PayloadKind::Boolean);
        put(UniversalTag::Integer, PayloadKind::Integer);
        put(UniversalTag::BitString, PayloadKind::BitString);
        put(UniversalTag::OctetString, PayloadKind::OctetString);
        put(UniversalTag::Null, PayloadKind::Null);
        put(UniversalTag::ObjectIdentifier, PayloadKind::ObjectIdentifier);
        put(UniversalTag::Real, PayloadKind::Real);
        put(UniversalTag::Enumerated, PayloadKind::Enumerated);
        // conflicts with SequenceOf / SetOf / Any, resolved by type id
        // when a schema is present
        put(UniversalTag::Sequence, PayloadKind::SequenceOrOf);
        put(UniversalTag::Set, PayloadKind::SetOrOf);
        put(UniversalTag::Utf8String, PayloadKind::String(StringKind::Utf8));
        put(UniversalTag::NumericString, PayloadKind::String(StringKind::Numeric));
        put(UniversalTag::PrintableString, PayloadKind::String(StringKind::Printable));
        put(UniversalTag::TeletexString, PayloadKind::String(StringKind::Teletex));
        put(UniversalTag::VideotexString, PayloadKind::String(StringKind::Videotex));
        put(UniversalTag::Ia5String, PayloadKind::String(StringKind::Ia5));
        put(UniversalTag::GraphicString, PayloadKind::String(StringKind::Graphic));
        put(UniversalTag::VisibleString, PayloadKind::String(StringKind::Visible));
        put(UniversalTag::GeneralString, PayloadKind::String(StringKind::General));
        put(UniversalTag::UniversalString, PayloadKind::String(StringKind::Universal));
        put(UniversalTag::BmpString, PayloadKind::String(StringKind::Bmp));
        put(UniversalTag::ObjectDescriptor, PayloadKind::String(StringKind::ObjectDescriptor));
        put(UniversalTag::UtcTime, PayloadKind::String(StringKind::UtcTime));
        put(UniversalTag::GeneralizedTime, PayloadKind::String(StringKind::GeneralizedTime));

        Self { entries }
    }

    /// Add or replace an entry.
    pub fn with(mut self, tag: Tag, kind: PayloadKind) -> Self {
        self.entries.insert((tag.class, tag.number), kind);
        self
    }

    pub(crate) fn lookup(&self, tag: &Tag) -> Option<PayloadKind> {
        self.entries.get(&(tag.class, tag.number)).copied()
    }
}

impl Default for TagMap {
    fn default() -> Self {
        Self::universal()
    }
}

/// The type-id dispatch table used when a schema names the type.
///
/// The built-in mapping covers every [`TypeId`]; entries added here
/// override it.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    overrides: BTreeMap<TypeId, PayloadKind>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the payload decoder for a type id.
    pub fn with(mut self, id: TypeId, kind: PayloadKind) -> Self {
        self.overrides.insert(id, kind);
        self
    }

    pub(crate) fn lookup(&self, spec: &Asn1Type) -> PayloadKind {
        if let Some(kind) = self.overrides.get(&spec.type_id()) {
            return *kind;
        }
        match spec.kind() {
            TypeKind::Boolean => PayloadKind::Boolean,
            TypeKind::Integer => PayloadKind::Integer,
            TypeKind::Enumerated => PayloadKind::Enumerated,
            TypeKind::BitString => PayloadKind::BitString,
            TypeKind::OctetString => PayloadKind::OctetString,
            TypeKind::Null => PayloadKind::Null,
            TypeKind::ObjectIdentifier => PayloadKind::ObjectIdentifier,
            TypeKind::Real => PayloadKind::Real,
            TypeKind::CharacterString(kind) => PayloadKind::String(*kind),
            TypeKind::Sequence(_) => PayloadKind::Sequence,
            TypeKind::SequenceOf(_) => PayloadKind::SequenceOf,
            TypeKind::Set(_) => PayloadKind::Set,
            TypeKind::SetOf(_) => PayloadKind::SetOf,
            TypeKind::Choice(_) => PayloadKind::Choice,
            TypeKind::Any => PayloadKind::Any,
        }
    }
}

/// Options recognized by the decoder.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Strictness profile.
    pub rules: EncodingRules,
    /// Tag dispatch table, replaceable per call.
    pub tag_map: TagMap,
    /// Type-id dispatch overrides.
    pub type_map: TypeMap,
    /// Caller-supplied open-type resolution map, keyed by governing
    /// value. Consulted before the per-slot default maps.
    pub open_types: Vec<(ValueKind, Asn1Type)>,
    /// Resolve open types through the per-slot default maps even when
    /// `open_types` is empty.
    pub decode_open_types: bool,
    /// When false, constructed payloads are surfaced as raw `Any` octets
    /// in place of recursion (the streaming escape hatch).
    pub recursive: bool,
}

impl DecoderOptions {
    pub fn ber() -> Self {
        Self {
            rules: EncodingRules::Ber,
            tag_map: TagMap::universal(),
            type_map: TypeMap::new(),
            open_types: Vec::new(),
            decode_open_types: false,
            recursive: true,
        }
    }

    pub fn cer() -> Self {
        Self { rules: EncodingRules::Cer, ..Self::ber() }
    }

    pub fn der() -> Self {
        Self { rules: EncodingRules::Der, ..Self::ber() }
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::ber()
    }
}

/// Schema context for one item decode.
#[derive(Clone, Copy)]
pub(crate) enum SpecView<'s> {
    /// No schema: dispatch by tag.
    None,
    /// A single template must match.
    One(&'s Asn1Type),
    /// Any of several templates may match (a tag map: set members,
    /// choice branches, optional-slot candidates).
    Arms(&'s [&'s Asn1Type]),
}

/// Outcome of one item decode.
#[derive(Debug, PartialEq)]
pub(crate) enum Item {
    Value(Value),
    /// The two-octet end-of-contents sentinel, only produced when the
    /// caller allowed it.
    EndOfContents,
}

impl Item {
    fn into_value(self) -> DecodeResult<Value> {
        match self {
            Item::Value(value) => Ok(value),
            Item::EndOfContents => {
                Err(DecodeError::MalformedValue("unexpected end-of-contents"))
            }
        }
    }
}

enum Selected<'s> {
    Payload(PayloadKind, Option<&'s Asn1Type>),
    TryAsExplicitTag,
}

fn select<'s>(
    options: &DecoderOptions,
    spec: SpecView<'s>,
    tag_set: &TagSet,
) -> Selected<'s> {
    match spec {
        SpecView::None => match tag_set.effective().and_then(|t| options.tag_map.lookup(t)) {
            Some(kind) => Selected::Payload(kind, None),
            None => Selected::TryAsExplicitTag,
        },
        SpecView::One(ty) => {
            if ty.accepts(tag_set) {
                Selected::Payload(options.type_map.lookup(ty), Some(ty))
            } else {
                Selected::TryAsExplicitTag
            }
        }
        SpecView::Arms(arms) => match arms.iter().find(|ty| ty.accepts(tag_set)) {
            Some(&ty) => Selected::Payload(options.type_map.lookup(ty), Some(ty)),
            None => Selected::TryAsExplicitTag,
        },
    }
}

/// Encoding-form sanity check before payload dispatch.
fn check_form(kind: PayloadKind, tag_set: &TagSet) -> DecodeResult<()> {
    let form = tag_set.effective_form();
    match kind {
        PayloadKind::Boolean
        | PayloadKind::Integer
        | PayloadKind::Enumerated
        | PayloadKind::Null
        | PayloadKind::ObjectIdentifier
        | PayloadKind::Real => {
            if form != TagForm::Primitive {
                return Err(DecodeError::MalformedValue("primitive encoding expected"));
            }
        }
        PayloadKind::SequenceOrOf
        | PayloadKind::SetOrOf
        | PayloadKind::Sequence
        | PayloadKind::SequenceOf
        | PayloadKind::Set
        | PayloadKind::SetOf => {
            if form != TagForm::Constructed {
                return Err(DecodeError::MalformedValue("constructed encoding expected"));
            }
        }
        // strings come in both forms; Any swallows either; a choice
        // carries whatever form its branch does
        PayloadKind::BitString
        | PayloadKind::OctetString
        | PayloadKind::String(_)
        | PayloadKind::Any
        | PayloadKind::Choice => {}
    }
    Ok(())
}

/// Decode one TLV item.
///
/// `outer` carries the tag chain accumulated by enclosing explicit tags;
/// the freshly decoded tag extends it. `allow_eoo` permits the
/// end-of-contents sentinel in place of an item, for children of
/// indefinite-length encodings.
pub(crate) fn decode_item<'a>(
    options: &DecoderOptions,
    input: &'a [u8],
    spec: SpecView<'_>,
    outer: Option<&TagSet>,
    allow_eoo: bool,
) -> DecodeResult<(&'a [u8], Item)> {
    if allow_eoo && options.rules.allows_indefinite() {
        let (rest, is_eoc) = parser::parse_eoc(input)
            .map_err(|e| DecodeError::from_nom(e, "malformed end-of-contents"))?;
        if is_eoc {
            return Ok((rest, Item::EndOfContents));
        }
    }

    let mark = input;

    let (rest, tag) =
        parser::parse_tag(input).map_err(|e| DecodeError::from_nom(e, "malformed tag"))?;
    let tag_set = match outer {
        Some(outer) => outer.extend(tag),
        None => TagSet::of(tag),
    };

    let (rest, length) =
        parser::parse_length(rest).map_err(|e| DecodeError::from_nom(e, "malformed length"))?;

    if length == Length::Indefinite {
        if !tag.is_constructed() {
            return Err(DecodeError::MalformedValue(
                "indefinite length on a primitive encoding",
            ));
        }
        if !options.rules.allows_indefinite() {
            return Err(DecodeError::MalformedValue(
                "indefinite length not allowed by encoding rules",
            ));
        }
    }

    let header = &mark[..mark.len() - rest.len()];

    match select(options, spec, &tag_set) {
        Selected::Payload(kind, chosen) => {
            check_form(kind, &tag_set)?;

            if !options.recursive {
                // streaming escape hatch: surface the raw payload octets
                // in place of recursion
                let (after, bytes) = match length {
                    Length::Definite(len) => {
                        let (after, body) = parser::take_contents(rest, len)
                            .map_err(|e| DecodeError::from_nom(e, "malformed contents"))?;
                        (after, body.to_vec())
                    }
                    Length::Indefinite => primitive::decode_any_indefinite(rest, None)?,
                };
                return Ok((after, Item::Value(Value::new(tag_set, ValueKind::Any(bytes)))));
            }

            match length {
                Length::Definite(len) => {
                    if rest.len() < len {
                        return Err(DecodeError::SubstrateUnderrun {
                            needed: Some(len - rest.len()),
                        });
                    }
                    let (body, after) = rest.split_at(len);
                    let value_kind =
                        decode_payload_definite(options, kind, body, header, &tag_set, chosen)
                            .map_err(|e| e.into_bounded("value overruns its declared length"))?;
                    Ok((after, Item::Value(Value::new(tag_set, value_kind))))
                }
                Length::Indefinite => {
                    let (after, value_kind) =
                        decode_payload_indefinite(options, kind, rest, header, &tag_set, chosen)?;
                    Ok((after, Item::Value(Value::new(tag_set, value_kind))))
                }
            }
        }

        Selected::TryAsExplicitTag => {
            if !tag.is_constructed() || tag.is_universal() {
                return Err(DecodeError::UnknownTag { tag });
            }

            // assume an explicit tag wrapping one inner TLV
            match length {
                Length::Definite(len) => {
                    if rest.len() < len {
                        return Err(DecodeError::SubstrateUnderrun {
                            needed: Some(len - rest.len()),
                        });
                    }
                    let (body, after) = rest.split_at(len);
                    let (leftover, item) = decode_item(options, body, spec, Some(&tag_set), false)
                        .map_err(|e| e.into_bounded("value overruns its declared length"))?;
                    if !leftover.is_empty() {
                        return Err(DecodeError::MalformedValue(
                            "trailing octets inside explicit tag",
                        ));
                    }
                    Ok((after, Item::Value(item.into_value()?)))
                }
                Length::Indefinite => {
                    let (rest, item) = decode_item(options, rest, spec, Some(&tag_set), false)?;
                    let value = item.into_value()?;
                    let (rest, is_eoc) = parser::parse_eoc(rest)
                        .map_err(|e| DecodeError::from_nom(e, "malformed end-of-contents"))?;
                    if !is_eoc {
                        return Err(DecodeError::MalformedValue(
                            "missing end-of-contents after explicit tag contents",
                        ));
                    }
                    Ok((rest, Item::Value(value)))
                }
            }
        }
    }
}

/// Dispatch a definite-length payload. `body` holds exactly the declared
/// content octets.
pub(crate) fn decode_payload_definite(
    options: &DecoderOptions,
    kind: PayloadKind,
    body: &[u8],
    header: &[u8],
    tag_set: &TagSet,
    spec: Option<&Asn1Type>,
) -> DecodeResult<ValueKind> {
    match kind {
        PayloadKind::Boolean => {
            Ok(ValueKind::Boolean(primitive::decode_boolean(body, options.rules)?))
        }
        PayloadKind::Integer => Ok(ValueKind::Integer(primitive::decode_integer(body)?)),
        PayloadKind::Enumerated => Ok(ValueKind::Enumerated(primitive::decode_integer(body)?)),
        PayloadKind::Null => {
            primitive::decode_null(body)?;
            Ok(ValueKind::Null)
        }
        PayloadKind::ObjectIdentifier => {
            Ok(ValueKind::ObjectIdentifier(primitive::decode_oid(body)?))
        }
        PayloadKind::Real => Ok(ValueKind::Real(primitive::decode_real(body)?)),
        PayloadKind::BitString => {
            Ok(ValueKind::BitString(primitive::decode_bit_string(options, body, tag_set)?))
        }
        PayloadKind::OctetString => Ok(ValueKind::OctetString(primitive::decode_octets(
            options,
            body,
            tag_set,
            UniversalTag::OctetString as u32,
        )?)),
        PayloadKind::String(string_kind) => {
            let octets =
                primitive::decode_octets(options, body, tag_set, string_kind.tag_number())?;
            Ok(ValueKind::CharacterString(string_kind, octets))
        }
        PayloadKind::SequenceOrOf => constructed::decode_schemaless_definite(options, body, false),
        PayloadKind::SetOrOf => constructed::decode_schemaless_definite(options, body, true),
        PayloadKind::Sequence | PayloadKind::Set => {
            let is_set = kind == PayloadKind::Set;
            match spec.map(Asn1Type::kind) {
                Some(TypeKind::Sequence(nts)) | Some(TypeKind::Set(nts)) => {
                    constructed::decode_record_definite(options, body, nts, is_set)
                }
                _ => constructed::decode_schemaless_definite(options, body, is_set),
            }
        }
        PayloadKind::SequenceOf | PayloadKind::SetOf => {
            let is_set = kind == PayloadKind::SetOf;
            match spec.map(Asn1Type::kind) {
                Some(TypeKind::SequenceOf(elem)) | Some(TypeKind::SetOf(elem)) => {
                    constructed::decode_of_definite(options, body, elem, is_set)
                }
                _ => constructed::decode_schemaless_definite(options, body, is_set),
            }
        }
        PayloadKind::Choice => {
            constructed::decode_choice_definite(options, body, header, tag_set, spec)
        }
        PayloadKind::Any => {
            let untagged = spec.is_none_or(|ty| !ty.tag_set().matches(tag_set));
            Ok(ValueKind::Any(primitive::collect_any(body, header, untagged)))
        }
    }
}

/// Dispatch an indefinite-length payload. `input` is open-ended; the
/// payload decoder consumes through the end-of-contents sentinel.
pub(crate) fn decode_payload_indefinite<'a>(
    options: &DecoderOptions,
    kind: PayloadKind,
    input: &'a [u8],
    header: &[u8],
    tag_set: &TagSet,
    spec: Option<&Asn1Type>,
) -> DecodeResult<(&'a [u8], ValueKind)> {
    match kind {
        PayloadKind::BitString => {
            let (rest, bits) = primitive::decode_bit_string_indefinite(options, input)?;
            Ok((rest, ValueKind::BitString(bits)))
        }
        PayloadKind::OctetString => {
            let (rest, octets) = primitive::decode_octets_indefinite(
                options,
                input,
                UniversalTag::OctetString as u32,
            )?;
            Ok((rest, ValueKind::OctetString(octets)))
        }
        PayloadKind::String(string_kind) => {
            let (rest, octets) =
                primitive::decode_octets_indefinite(options, input, string_kind.tag_number())?;
            Ok((rest, ValueKind::CharacterString(string_kind, octets)))
        }
        PayloadKind::SequenceOrOf => {
            constructed::decode_schemaless_indefinite(options, input, false)
        }
        PayloadKind::SetOrOf => constructed::decode_schemaless_indefinite(options, input, true),
        PayloadKind::Sequence | PayloadKind::Set => {
            let is_set = kind == PayloadKind::Set;
            match spec.map(Asn1Type::kind) {
                Some(TypeKind::Sequence(nts)) | Some(TypeKind::Set(nts)) => {
                    constructed::decode_record_indefinite(options, input, nts, is_set)
                }
                _ => constructed::decode_schemaless_indefinite(options, input, is_set),
            }
        }
        PayloadKind::SequenceOf | PayloadKind::SetOf => {
            let is_set = kind == PayloadKind::SetOf;
            match spec.map(Asn1Type::kind) {
                Some(TypeKind::SequenceOf(elem)) | Some(TypeKind::SetOf(elem)) => {
                    constructed::decode_of_indefinite(options, input, elem, is_set)
                }
                _ => constructed::decode_schemaless_indefinite(options, input, is_set),
            }
        }
        PayloadKind::Choice => {
            constructed::decode_choice_indefinite(options, input, header, tag_set, spec)
        }
        PayloadKind::Any => {
            let untagged = spec.is_none_or(|ty| !ty.tag_set().matches(tag_set));
            let (rest, bytes) =
                primitive::decode_any_indefinite(input, untagged.then_some(header))?;
            Ok((rest, ValueKind::Any(bytes)))
        }
        _ => Err(DecodeError::MalformedValue("indefinite length on a primitive encoding")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_map_lookup_ignores_form() {
        let map = TagMap::universal();
        let primitive = Tag::universal(TagForm::Primitive, 4);
        let constructed = Tag::universal(TagForm::Constructed, 4);
        assert_eq!(map.lookup(&primitive), Some(PayloadKind::OctetString));
        assert_eq!(map.lookup(&constructed), Some(PayloadKind::OctetString));
    }

    #[test]
    fn test_tag_map_override() {
        let tag = Tag::application(TagForm::Primitive, 7);
        let map = TagMap::universal().with(tag, PayloadKind::OctetString);
        assert_eq!(map.lookup(&tag), Some(PayloadKind::OctetString));
        assert_eq!(map.lookup(&Tag::application(TagForm::Primitive, 8)), None);
    }

    #[test]
    fn test_type_map_builtin() {
        let map = TypeMap::new();
        assert_eq!(map.lookup(&Asn1Type::integer()), PayloadKind::Integer);
        assert_eq!(
            map.lookup(&Asn1Type::sequence_of(Asn1Type::integer())),
            PayloadKind::SequenceOf
        );
        assert_eq!(map.lookup(&Asn1Type::any()), PayloadKind::Any);
    }

    #[test]
    fn test_type_map_override() {
        let map = TypeMap::new().with(TypeId::Integer, PayloadKind::OctetString);
        assert_eq!(map.lookup(&Asn1Type::integer()), PayloadKind::OctetString);
        assert_eq!(map.lookup(&Asn1Type::boolean()), PayloadKind::Boolean);
    }

    #[test]
    fn test_encoding_rules() {
        assert!(EncodingRules::Ber.allows_indefinite());
        assert!(EncodingRules::Cer.allows_indefinite());
        assert!(!EncodingRules::Der.allows_indefinite());
        assert!(!EncodingRules::Der.allows_constructed_strings());
        assert!(EncodingRules::Der.requires_canonical_values());
        assert!(!EncodingRules::Ber.requires_canonical_values());
    }

    #[test]
    fn test_decode_item_definite_integer() {
        let options = DecoderOptions::ber();
        let (rest, item) =
            decode_item(&options, &[0x02, 0x01, 0x2A, 0xEE], SpecView::None, None, false).unwrap();
        assert_eq!(rest, &[0xEE]);
        match item {
            Item::Value(value) => {
                assert_eq!(value.as_integer(), Some(42));
                assert_eq!(value.tags, TagSet::of(Tag::universal(TagForm::Primitive, 2)));
            }
            other => panic!("expected a value, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_item_underrun_reports_needed() {
        let options = DecoderOptions::ber();
        let err = decode_item(&options, &[0x02, 0x04, 0x01], SpecView::None, None, false)
            .unwrap_err();
        assert_eq!(err, DecodeError::SubstrateUnderrun { needed: Some(3) });
    }

    #[test]
    fn test_decode_item_unknown_tag() {
        let options = DecoderOptions::ber();
        // context primitive tag with no schema cannot be an explicit tag
        let err = decode_item(&options, &[0x80, 0x01, 0x00], SpecView::None, None, false)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag { .. }));
    }

    #[test]
    fn test_decode_item_explicit_tag_fallback() {
        let options = DecoderOptions::ber();
        // [0] EXPLICIT INTEGER 5, schemaless
        let (rest, item) =
            decode_item(&options, &[0xA0, 0x03, 0x02, 0x01, 0x05], SpecView::None, None, false)
                .unwrap();
        assert_eq!(rest, &[]);
        let value = match item {
            Item::Value(value) => value,
            other => panic!("expected a value, got {:?}", other),
        };
        assert_eq!(value.as_integer(), Some(5));
        assert_eq!(value.tags.len(), 2);
        assert_eq!(value.tags.outer().unwrap().class, TagClass::ContextSpecific);
        assert_eq!(value.tags.effective().unwrap().number, 2);
    }

    #[test]
    fn test_decode_item_eoo() {
        let options = DecoderOptions::ber();
        let (rest, item) =
            decode_item(&options, &[0x00, 0x00, 0xAA], SpecView::None, None, true).unwrap();
        assert_eq!(item, Item::EndOfContents);
        assert_eq!(rest, &[0xAA]);
    }

    #[test]
    fn test_decode_item_der_rejects_indefinite() {
        let options = DecoderOptions::der();
        let input = [0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00];
        let err = decode_item(&options, &input, SpecView::None, None, false).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedValue("indefinite length not allowed by encoding rules")
        );
    }

    #[test]
    fn test_decode_item_indefinite_primitive_rejected() {
        let options = DecoderOptions::ber();
        let err = decode_item(&options, &[0x02, 0x80, 0x00, 0x00], SpecView::None, None, false)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedValue("indefinite length on a primitive encoding")
        );
    }

    #[test]
    fn test_decode_item_length_mismatch() {
        let options = DecoderOptions::ber();
        // sequence declares 4 content octets but its child needs 5
        let input = [0x30, 0x04, 0x02, 0x03, 0x01, 0x02];
        let err = decode_item(&options, &input, SpecView::None, None, false).unwrap_err();
        assert_eq!(err, DecodeError::MalformedValue("value overruns its declared length"));
    }

    #[test]
    fn test_decode_item_non_recursive_raw() {
        let mut options = DecoderOptions::ber();
        options.recursive = false;
        let input = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let (rest, item) = decode_item(&options, &input, SpecView::None, None, false).unwrap();
        assert_eq!(rest, &[]);
        match item {
            Item::Value(value) => {
                assert_eq!(value.kind, ValueKind::Any(alloc::vec![0x02, 0x01, 0x01, 0x02, 0x01, 0x02]));
            }
            other => panic!("expected a value, got {:?}", other),
        }
    }
}
