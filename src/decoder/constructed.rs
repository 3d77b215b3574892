//! Assembly of constructed encodings.
//!
//! Without a schema the children are collected as-is and the container
//! shape is inferred: two or more distinct child tag chains make a
//! record (Sequence/Set), a homogeneous run makes a SequenceOf/SetOf.
//!
//! With a schema the named-type catalogue drives the walk. A SEQUENCE is
//! matched in order, consulting the catalogue's near-position candidates
//! across optional and defaulted slots; a SET matches each child against
//! the whole catalogue. Open-type slots are resolved once the record is
//! complete, in both length modes.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::decoder::{
    DecoderOptions, Item, SpecView, check_form, decode_item, decode_payload_definite,
    decode_payload_indefinite,
};
use crate::error::{DecodeError, DecodeResult};
use crate::parser;
use crate::spec::{Asn1Type, NamedTypes, TypeKind};
use crate::tag::TagSet;
use crate::value::{Record, RecordField, Value, ValueKind};

/// Collect children of a schemaless constructed value.
fn schemaless_core<'a>(
    options: &DecoderOptions,
    mut input: &'a [u8],
    indefinite: bool,
) -> DecodeResult<(&'a [u8], Vec<Value>)> {
    let mut children = Vec::new();
    loop {
        if !indefinite && input.is_empty() {
            break;
        }
        let (rest, item) = decode_item(options, input, SpecView::None, None, indefinite)?;
        input = rest;
        match item {
            Item::EndOfContents => break,
            Item::Value(child) => children.push(child),
        }
    }
    Ok((input, children))
}

/// Infer the container shape from the collected children: distinct child
/// tag chains mean a record, a homogeneous run means a -Of container.
fn infer_container(children: Vec<Value>, is_set: bool) -> ValueKind {
    let is_record = children.len() > 1
        && children[1..].iter().any(|child| !child.tags.matches(&children[0].tags));

    match (is_record, is_set) {
        (true, false) => ValueKind::Sequence(Record::positional(children)),
        (true, true) => ValueKind::Set(Record::positional(children)),
        (false, false) => ValueKind::SequenceOf(children),
        (false, true) => ValueKind::SetOf(children),
    }
}

pub(crate) fn decode_schemaless_definite(
    options: &DecoderOptions,
    body: &[u8],
    is_set: bool,
) -> DecodeResult<ValueKind> {
    let (_, children) = schemaless_core(options, body, false)?;
    Ok(infer_container(children, is_set))
}

pub(crate) fn decode_schemaless_indefinite<'a>(
    options: &DecoderOptions,
    input: &'a [u8],
    is_set: bool,
) -> DecodeResult<(&'a [u8], ValueKind)> {
    let (rest, children) = schemaless_core(options, input, true)?;
    Ok((rest, infer_container(children, is_set)))
}

/// Walk a record's children against its catalogue.
fn record_core<'a>(
    options: &DecoderOptions,
    mut input: &'a [u8],
    catalogue: &NamedTypes,
    is_set: bool,
    indefinite: bool,
) -> DecodeResult<(&'a [u8], Record)> {
    let mut slots: Vec<Option<Value>> = alloc::vec![None; catalogue.len()];
    let mut extra: Vec<Value> = Vec::new();
    let deterministic = !is_set && !catalogue.has_optional_or_default();
    let mut idx = 0usize;

    loop {
        if !indefinite && input.is_empty() {
            break;
        }

        let arms: Vec<&Asn1Type>;
        let view = if catalogue.is_empty() {
            SpecView::None
        } else if is_set {
            arms = catalogue.iter().map(|nt| &nt.ty).collect();
            SpecView::Arms(&arms)
        } else {
            let slot = catalogue.get(idx).ok_or(DecodeError::ExcessComponents)?;
            if deterministic || (!slot.optional && !slot.defaulted) {
                SpecView::One(&slot.ty)
            } else {
                arms = catalogue.candidates_near(idx).map(|(_, nt)| &nt.ty).collect();
                SpecView::Arms(&arms)
            }
        };

        let (rest, item) = decode_item(options, input, view, None, indefinite)?;
        input = rest;
        let child = match item {
            Item::EndOfContents => break,
            Item::Value(child) => child,
        };

        if catalogue.is_empty() {
            extra.push(child);
            continue;
        }

        let slot = if is_set {
            catalogue.position_by_tag(&child.tags).ok_or(DecodeError::MalformedValue(
                "component type not in set catalogue",
            ))?
        } else {
            let named = catalogue.get(idx).ok_or(DecodeError::ExcessComponents)?;
            if named.optional || named.defaulted {
                catalogue.position_near(&child.tags, idx).ok_or(DecodeError::MalformedValue(
                    "component does not match any catalogue slot",
                ))?
            } else {
                idx
            }
        };

        if slots[slot].is_some() {
            return Err(DecodeError::MalformedValue("duplicate record component"));
        }
        slots[slot] = Some(child);
        idx = slot + 1;
    }

    if catalogue.is_empty() {
        return Ok((input, Record::positional(extra)));
    }

    for &required in catalogue.required() {
        if slots[required].is_none() {
            return Err(DecodeError::MissingRequiredComponent {
                name: catalogue.get(required).map(|nt| nt.name).unwrap_or(""),
            });
        }
    }

    if catalogue.has_open_types()
        && (options.decode_open_types || !options.open_types.is_empty())
    {
        resolve_open_types(options, catalogue, &mut slots)?;
    }

    let fields = catalogue
        .iter()
        .zip(slots)
        .map(|(nt, value)| RecordField { name: Some(nt.name), value })
        .collect();
    Ok((input, Record { fields }))
}

pub(crate) fn decode_record_definite(
    options: &DecoderOptions,
    body: &[u8],
    catalogue: &NamedTypes,
    is_set: bool,
) -> DecodeResult<ValueKind> {
    let (_, record) = record_core(options, body, catalogue, is_set, false)?;
    Ok(if is_set { ValueKind::Set(record) } else { ValueKind::Sequence(record) })
}

pub(crate) fn decode_record_indefinite<'a>(
    options: &DecoderOptions,
    input: &'a [u8],
    catalogue: &NamedTypes,
    is_set: bool,
) -> DecodeResult<(&'a [u8], ValueKind)> {
    let (rest, record) = record_core(options, input, catalogue, is_set, true)?;
    let kind = if is_set { ValueKind::Set(record) } else { ValueKind::Sequence(record) };
    Ok((rest, kind))
}

/// Walk a SequenceOf/SetOf against its single element template.
fn of_core<'a>(
    options: &DecoderOptions,
    mut input: &'a [u8],
    element: &Asn1Type,
    indefinite: bool,
) -> DecodeResult<(&'a [u8], Vec<Value>)> {
    let mut elements = Vec::new();
    loop {
        if !indefinite && input.is_empty() {
            break;
        }
        let (rest, item) = decode_item(options, input, SpecView::One(element), None, indefinite)?;
        input = rest;
        match item {
            Item::EndOfContents => break,
            Item::Value(child) => elements.push(child),
        }
    }
    Ok((input, elements))
}

pub(crate) fn decode_of_definite(
    options: &DecoderOptions,
    body: &[u8],
    element: &Asn1Type,
    is_set: bool,
) -> DecodeResult<ValueKind> {
    let (_, elements) = of_core(options, body, element, false)?;
    Ok(if is_set { ValueKind::SetOf(elements) } else { ValueKind::SequenceOf(elements) })
}

pub(crate) fn decode_of_indefinite<'a>(
    options: &DecoderOptions,
    input: &'a [u8],
    element: &Asn1Type,
    is_set: bool,
) -> DecodeResult<(&'a [u8], ValueKind)> {
    let (rest, elements) = of_core(options, input, element, true)?;
    let kind = if is_set { ValueKind::SetOf(elements) } else { ValueKind::SequenceOf(elements) };
    Ok((rest, kind))
}

fn choice_branches(spec: Option<&Asn1Type>) -> DecodeResult<(&Asn1Type, &NamedTypes)> {
    let Some(spec) = spec else {
        return Err(DecodeError::MalformedValue("choice cannot be decoded without a schema"));
    };
    match spec.kind() {
        TypeKind::Choice(branches) => Ok((spec, branches)),
        _ => Err(DecodeError::MalformedValue("choice decoder without choice schema")),
    }
}

fn wrap_choice(branches: &NamedTypes, value: Value) -> ValueKind {
    let name = branches
        .iter()
        .find(|nt| nt.ty.accepts(&value.tags))
        .map(|nt| nt.name);
    ValueKind::Choice { name, value: Box::new(value) }
}

/// A CHOICE is untagged unless wrapped: when the outer tag chain equals
/// the choice's own, one inner TLV follows; otherwise the already-decoded
/// header belongs to one of the branches and the payload is dispatched
/// directly.
pub(crate) fn decode_choice_definite(
    options: &DecoderOptions,
    body: &[u8],
    header: &[u8],
    tag_set: &TagSet,
    spec: Option<&Asn1Type>,
) -> DecodeResult<ValueKind> {
    let (spec, branches) = choice_branches(spec)?;

    if !spec.tag_set().is_empty() && spec.tag_set().matches(tag_set) {
        // explicitly wrapped: the contents hold one complete branch TLV
        let arms: Vec<&Asn1Type> = branches.iter().map(|nt| &nt.ty).collect();
        let (rest, item) = decode_item(options, body, SpecView::Arms(&arms), None, false)?;
        if !rest.is_empty() {
            return Err(DecodeError::MalformedValue("trailing octets after choice branch"));
        }
        let value = match item {
            Item::Value(value) => value,
            Item::EndOfContents => {
                return Err(DecodeError::MalformedValue("unexpected end-of-contents"));
            }
        };
        return Ok(wrap_choice(branches, value));
    }

    // untagged: this TLV is the branch value itself
    let branch = branches
        .iter()
        .find(|nt| nt.ty.accepts(tag_set))
        .ok_or_else(|| match tag_set.effective() {
            Some(tag) => DecodeError::UnknownTag { tag: *tag },
            None => DecodeError::MalformedValue("choice branch not found"),
        })?;
    let kind = options.type_map.lookup(&branch.ty);
    check_form(kind, tag_set)?;
    let inner = decode_payload_definite(options, kind, body, header, tag_set, Some(&branch.ty))?;
    let value = Value::new(tag_set.clone(), inner);
    Ok(ValueKind::Choice { name: Some(branch.name), value: Box::new(value) })
}

pub(crate) fn decode_choice_indefinite<'a>(
    options: &DecoderOptions,
    input: &'a [u8],
    header: &[u8],
    tag_set: &TagSet,
    spec: Option<&Asn1Type>,
) -> DecodeResult<(&'a [u8], ValueKind)> {
    let (spec, branches) = choice_branches(spec)?;

    if !spec.tag_set().is_empty() && spec.tag_set().matches(tag_set) {
        let arms: Vec<&Asn1Type> = branches.iter().map(|nt| &nt.ty).collect();
        let (rest, item) = decode_item(options, input, SpecView::Arms(&arms), None, false)?;
        let value = match item {
            Item::Value(value) => value,
            Item::EndOfContents => {
                return Err(DecodeError::MalformedValue("unexpected end-of-contents"));
            }
        };
        let (rest, is_eoc) = parser::parse_eoc(rest)
            .map_err(|e| DecodeError::from_nom(e, "malformed end-of-contents"))?;
        if !is_eoc {
            return Err(DecodeError::MalformedValue(
                "missing end-of-contents after choice branch",
            ));
        }
        return Ok((rest, wrap_choice(branches, value)));
    }

    let branch = branches
        .iter()
        .find(|nt| nt.ty.accepts(tag_set))
        .ok_or_else(|| match tag_set.effective() {
            Some(tag) => DecodeError::UnknownTag { tag: *tag },
            None => DecodeError::MalformedValue("choice branch not found"),
        })?;
    let kind = options.type_map.lookup(&branch.ty);
    check_form(kind, tag_set)?;
    let (rest, inner) =
        decode_payload_indefinite(options, kind, input, header, tag_set, Some(&branch.ty))?;
    let value = Value::new(tag_set.clone(), inner);
    Ok((rest, ValueKind::Choice { name: Some(branch.name), value: Box::new(value) }))
}

/// Resolve open-type slots of a completed record.
///
/// The governing field's decoded value selects the concrete type: first
/// through the caller-supplied map, then through the slot's default map.
/// On a total miss the slot keeps its raw octets.
fn resolve_open_types(
    options: &DecoderOptions,
    catalogue: &NamedTypes,
    slots: &mut [Option<Value>],
) -> DecodeResult<()> {
    for (idx, named) in catalogue.iter().enumerate() {
        let Some(hook) = &named.open_type else {
            continue;
        };
        if slots[idx].is_none() {
            continue;
        }

        let governor_idx = catalogue.position_of_name(hook.governor).ok_or(
            DecodeError::MalformedValue("open-type governor is not a record component"),
        )?;
        let Some(governing) = slots[governor_idx].as_ref() else {
            continue;
        };

        let resolved = options
            .open_types
            .iter()
            .find(|(key, _)| *key == governing.kind)
            .map(|(_, ty)| ty)
            .or_else(|| hook.lookup(&governing.kind));
        let Some(resolved) = resolved else {
            continue;
        };

        let Some(current) = slots[idx].take() else {
            continue;
        };
        slots[idx] = Some(reparse_slot(options, current, resolved)?);
    }
    Ok(())
}

fn reparse_slot(
    options: &DecoderOptions,
    current: Value,
    resolved: &Asn1Type,
) -> DecodeResult<Value> {
    match current.kind {
        ValueKind::Any(ref bytes) => reparse_any(options, bytes, resolved),
        // a -Of container of raw values resolves per element
        ValueKind::SequenceOf(elements) => {
            let elements = reparse_elements(options, elements, resolved)?;
            Ok(Value::new(current.tags, ValueKind::SequenceOf(elements)))
        }
        ValueKind::SetOf(elements) => {
            let elements = reparse_elements(options, elements, resolved)?;
            Ok(Value::new(current.tags, ValueKind::SetOf(elements)))
        }
        _ => Ok(current),
    }
}

fn reparse_elements(
    options: &DecoderOptions,
    elements: Vec<Value>,
    resolved: &Asn1Type,
) -> DecodeResult<Vec<Value>> {
    elements
        .into_iter()
        .map(|element| match element.kind {
            ValueKind::Any(ref bytes) => reparse_any(options, bytes, resolved),
            _ => Ok(element),
        })
        .collect()
}

/// Decode the raw octets of an ANY slot against the resolved type, over a
/// fresh substrate.
fn reparse_any(options: &DecoderOptions, bytes: &[u8], resolved: &Asn1Type) -> DecodeResult<Value> {
    let (_, item) = decode_item(options, bytes, SpecView::One(resolved), None, false)
        .map_err(|e| e.into_bounded("truncated open-type contents"))?;
    match item {
        Item::Value(value) => Ok(value),
        Item::EndOfContents => Err(DecodeError::MalformedValue("unexpected end-of-contents")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::NamedType;
    use alloc::vec;

    fn ber() -> DecoderOptions {
        DecoderOptions::ber()
    }

    #[test]
    fn test_schemaless_homogeneous() {
        // three integers
        let body = [0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x03];
        let kind = decode_schemaless_definite(&ber(), &body, false).unwrap();
        match kind {
            ValueKind::SequenceOf(children) => {
                let values: Vec<_> =
                    children.iter().map(|c| c.as_integer().unwrap()).collect();
                assert_eq!(values, [1, 2, 3]);
            }
            other => panic!("expected SequenceOf, got {:?}", other),
        }
    }

    #[test]
    fn test_schemaless_record_heuristic() {
        // integer then boolean: two distinct tag chains make a record
        let body = [0x02, 0x01, 0x05, 0x01, 0x01, 0xFF];
        let kind = decode_schemaless_definite(&ber(), &body, false).unwrap();
        match kind {
            ValueKind::Sequence(record) => {
                assert_eq!(record.len(), 2);
                let values: Vec<_> = record.values().collect();
                assert_eq!(values[0].as_integer(), Some(5));
                assert_eq!(values[1].as_bool(), Some(true));
            }
            other => panic!("expected Sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_schemaless_empty_is_homogeneous() {
        let kind = decode_schemaless_definite(&ber(), &[], false).unwrap();
        assert_eq!(kind, ValueKind::SequenceOf(vec![]));

        let kind = decode_schemaless_definite(&ber(), &[], true).unwrap();
        assert_eq!(kind, ValueKind::SetOf(vec![]));
    }

    #[test]
    fn test_record_definite_in_order() {
        let catalogue = NamedTypes::new(vec![
            NamedType::new("number", Asn1Type::integer()),
            NamedType::new("flag", Asn1Type::boolean()),
        ]);
        let body = [0x02, 0x01, 0x07, 0x01, 0x01, 0x00];
        let kind = decode_record_definite(&ber(), &body, &catalogue, false).unwrap();
        match kind {
            ValueKind::Sequence(record) => {
                assert_eq!(record.get("number").unwrap().as_integer(), Some(7));
                assert_eq!(record.get("flag").unwrap().as_bool(), Some(false));
            }
            other => panic!("expected Sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_record_optional_slot_skipped() {
        let catalogue = NamedTypes::new(vec![
            NamedType::new("number", Asn1Type::integer()),
            NamedType::optional("note", Asn1Type::utf8_string()),
            NamedType::new("flag", Asn1Type::boolean()),
        ]);
        // the optional string is absent
        let body = [0x02, 0x01, 0x07, 0x01, 0x01, 0xFF];
        let kind = decode_record_definite(&ber(), &body, &catalogue, false).unwrap();
        match kind {
            ValueKind::Sequence(record) => {
                assert_eq!(record.get("number").unwrap().as_integer(), Some(7));
                assert_eq!(record.get("note"), None);
                assert_eq!(record.get("flag").unwrap().as_bool(), Some(true));
            }
            other => panic!("expected Sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_record_missing_required() {
        let catalogue = NamedTypes::new(vec![
            NamedType::new("number", Asn1Type::integer()),
            NamedType::new("flag", Asn1Type::boolean()),
        ]);
        let body = [0x02, 0x01, 0x07];
        let err = decode_record_definite(&ber(), &body, &catalogue, false).unwrap_err();
        assert_eq!(err, DecodeError::MissingRequiredComponent { name: "flag" });
    }

    #[test]
    fn test_record_excess_components() {
        let catalogue = NamedTypes::new(vec![NamedType::new("number", Asn1Type::integer())]);
        let body = [0x02, 0x01, 0x07, 0x02, 0x01, 0x08];
        let err = decode_record_definite(&ber(), &body, &catalogue, false).unwrap_err();
        assert_eq!(err, DecodeError::ExcessComponents);
    }

    #[test]
    fn test_set_out_of_order() {
        let catalogue = NamedTypes::new(vec![
            NamedType::new("number", Asn1Type::integer()),
            NamedType::new("flag", Asn1Type::boolean()),
        ]);
        // wire order reversed; output keeps catalogue order
        let body = [0x01, 0x01, 0xFF, 0x02, 0x01, 0x07];
        let kind = decode_record_definite(&ber(), &body, &catalogue, true).unwrap();
        match kind {
            ValueKind::Set(record) => {
                assert_eq!(record.fields[0].name, Some("number"));
                assert_eq!(record.get("number").unwrap().as_integer(), Some(7));
                assert_eq!(record.get("flag").unwrap().as_bool(), Some(true));
            }
            other => panic!("expected Set, got {:?}", other),
        }
    }

    #[test]
    fn test_set_duplicate_component() {
        let catalogue = NamedTypes::new(vec![
            NamedType::new("number", Asn1Type::integer()),
            NamedType::optional("flag", Asn1Type::boolean()),
        ]);
        let body = [0x02, 0x01, 0x07, 0x02, 0x01, 0x08];
        let err = decode_record_definite(&ber(), &body, &catalogue, true).unwrap_err();
        assert_eq!(err, DecodeError::MalformedValue("duplicate record component"));
    }

    #[test]
    fn test_of_with_element_template() {
        let body = [0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let kind = decode_of_definite(&ber(), &body, &Asn1Type::integer(), false).unwrap();
        match kind {
            ValueKind::SequenceOf(elements) => {
                assert_eq!(elements.len(), 2);
                assert_eq!(elements[1].as_integer(), Some(2));
            }
            other => panic!("expected SequenceOf, got {:?}", other),
        }
    }

    #[test]
    fn test_of_element_type_mismatch() {
        let body = [0x01, 0x01, 0xFF];
        let err = decode_of_definite(&ber(), &body, &Asn1Type::integer(), false).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag { .. }));
    }
}
