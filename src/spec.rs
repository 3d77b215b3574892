//! Schema templates guiding the decoder.
//!
//! An [`Asn1Type`] describes the expected shape of a value: its tag chain
//! and its structural kind. Record kinds carry a [`NamedTypes`] catalogue
//! listing each slot in order, together with optional/default flags and
//! open-type hooks. Templates are plain data, built once and shared.
//!
//! # Example
//!
//! ```
//! use asn1_ber::{Asn1Type, NamedType, NamedTypes, Tag, TagForm};
//!
//! // AlgorithmIdentifier ::= SEQUENCE {
//! //     algorithm  OBJECT IDENTIFIER,
//! //     parameters ANY OPTIONAL }
//! let spec = Asn1Type::sequence(NamedTypes::new(vec![
//!     NamedType::new("algorithm", Asn1Type::object_identifier()),
//!     NamedType::optional("parameters", Asn1Type::any()),
//! ]));
//!
//! // version [0] EXPLICIT INTEGER
//! let version = Asn1Type::integer().explicit(Tag::context(TagForm::Constructed, 0));
//! # let _ = (spec, version);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::tag::{Tag, TagForm, TagSet, UniversalTag};
use crate::value::{StringKind, ValueKind};

/// Structural kind of a type template.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TypeKind {
    Boolean,
    Integer,
    Enumerated,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Real,
    CharacterString(StringKind),
    Sequence(NamedTypes),
    SequenceOf(Box<Asn1Type>),
    Set(NamedTypes),
    SetOf(Box<Asn1Type>),
    Choice(NamedTypes),
    Any,
}

/// Discriminant of [`TypeKind`], the key of the type-id dispatch table.
///
/// Sequence vs SequenceOf, Set vs SetOf and Choice vs Any share tag sets
/// and are told apart only through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeId {
    Boolean,
    Integer,
    Enumerated,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Real,
    CharacterString,
    Sequence,
    SequenceOf,
    Set,
    SetOf,
    Choice,
    Any,
}

/// A type template: the expected tag chain plus the structural kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Asn1Type {
    pub(crate) tags: TagSet,
    pub(crate) kind: TypeKind,
}

impl Asn1Type {
    fn universal(tag: UniversalTag, form: TagForm, kind: TypeKind) -> Self {
        Self { tags: TagSet::of(Tag::universal(form, tag as u32)), kind }
    }

    pub fn boolean() -> Self {
        Self::universal(UniversalTag::Boolean, TagForm::Primitive, TypeKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::universal(UniversalTag::Integer, TagForm::Primitive, TypeKind::Integer)
    }

    pub fn enumerated() -> Self {
        Self::universal(UniversalTag::Enumerated, TagForm::Primitive, TypeKind::Enumerated)
    }

    pub fn bit_string() -> Self {
        Self::universal(UniversalTag::BitString, TagForm::Primitive, TypeKind::BitString)
    }

    pub fn octet_string() -> Self {
        Self::universal(UniversalTag::OctetString, TagForm::Primitive, TypeKind::OctetString)
    }

    pub fn null() -> Self {
        Self::universal(UniversalTag::Null, TagForm::Primitive, TypeKind::Null)
    }

    pub fn object_identifier() -> Self {
        Self::universal(
            UniversalTag::ObjectIdentifier,
            TagForm::Primitive,
            TypeKind::ObjectIdentifier,
        )
    }

    pub fn real() -> Self {
        Self::universal(UniversalTag::Real, TagForm::Primitive, TypeKind::Real)
    }

    /// A character-string or time template of the given surface kind.
    pub fn character(kind: StringKind) -> Self {
        Self {
            tags: TagSet::of(Tag::universal(TagForm::Primitive, kind.tag_number())),
            kind: TypeKind::CharacterString(kind),
        }
    }

    pub fn utf8_string() -> Self {
        Self::character(StringKind::Utf8)
    }

    pub fn ia5_string() -> Self {
        Self::character(StringKind::Ia5)
    }

    pub fn printable_string() -> Self {
        Self::character(StringKind::Printable)
    }

    pub fn utc_time() -> Self {
        Self::character(StringKind::UtcTime)
    }

    pub fn generalized_time() -> Self {
        Self::character(StringKind::GeneralizedTime)
    }

    pub fn sequence(components: NamedTypes) -> Self {
        Self::universal(UniversalTag::Sequence, TagForm::Constructed, TypeKind::Sequence(components))
    }

    pub fn sequence_of(element: Asn1Type) -> Self {
        Self::universal(
            UniversalTag::Sequence,
            TagForm::Constructed,
            TypeKind::SequenceOf(Box::new(element)),
        )
    }

    pub fn set(components: NamedTypes) -> Self {
        Self::universal(UniversalTag::Set, TagForm::Constructed, TypeKind::Set(components))
    }

    pub fn set_of(element: Asn1Type) -> Self {
        Self::universal(
            UniversalTag::Set,
            TagForm::Constructed,
            TypeKind::SetOf(Box::new(element)),
        )
    }

    /// An untagged CHOICE over the given branches.
    pub fn choice(branches: NamedTypes) -> Self {
        Self { tags: TagSet::untagged(), kind: TypeKind::Choice(branches) }
    }

    /// An untagged ANY: any well-formed encoding is captured raw.
    pub fn any() -> Self {
        Self { tags: TagSet::untagged(), kind: TypeKind::Any }
    }

    /// Apply an IMPLICIT tag: the given tag replaces the effective tag on
    /// the wire.
    pub fn implicit(mut self, tag: Tag) -> Self {
        self.tags = self.tags.tagged_implicitly(tag);
        self
    }

    /// Apply an EXPLICIT tag: the given tag wraps the encoding in an
    /// outer constructed TLV.
    pub fn explicit(mut self, tag: Tag) -> Self {
        self.tags = self.tags.tagged_explicitly(tag);
        self
    }

    pub fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn type_id(&self) -> TypeId {
        match &self.kind {
            TypeKind::Boolean => TypeId::Boolean,
            TypeKind::Integer => TypeId::Integer,
            TypeKind::Enumerated => TypeId::Enumerated,
            TypeKind::BitString => TypeId::BitString,
            TypeKind::OctetString => TypeId::OctetString,
            TypeKind::Null => TypeId::Null,
            TypeKind::ObjectIdentifier => TypeId::ObjectIdentifier,
            TypeKind::Real => TypeId::Real,
            TypeKind::CharacterString(_) => TypeId::CharacterString,
            TypeKind::Sequence(_) => TypeId::Sequence,
            TypeKind::SequenceOf(_) => TypeId::SequenceOf,
            TypeKind::Set(_) => TypeId::Set,
            TypeKind::SetOf(_) => TypeId::SetOf,
            TypeKind::Choice(_) => TypeId::Choice,
            TypeKind::Any => TypeId::Any,
        }
    }

    /// Whether a value carrying the given wire tag chain can be decoded
    /// with this template.
    ///
    /// ANY accepts every chain. An untagged CHOICE accepts whatever one of
    /// its branches accepts. Everything else requires the full chain to
    /// match, form bits ignored.
    pub fn accepts(&self, tag_set: &TagSet) -> bool {
        match &self.kind {
            TypeKind::Any => true,
            TypeKind::Choice(branches) => {
                self.tags.matches(tag_set) || branches.iter().any(|nt| nt.ty.accepts(tag_set))
            }
            _ => self.tags.matches(tag_set),
        }
    }
}

/// One slot of a record or one branch of a choice.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: &'static str,
    pub ty: Asn1Type,
    pub optional: bool,
    pub defaulted: bool,
    pub open_type: Option<OpenType>,
}

impl NamedType {
    /// A mandatory component.
    pub fn new(name: &'static str, ty: Asn1Type) -> Self {
        Self { name, ty, optional: false, defaulted: false, open_type: None }
    }

    /// An OPTIONAL component.
    pub fn optional(name: &'static str, ty: Asn1Type) -> Self {
        Self { name, ty, optional: true, defaulted: false, open_type: None }
    }

    /// A component with a DEFAULT value; absence on the wire is not an
    /// error.
    pub fn defaulted(name: &'static str, ty: Asn1Type) -> Self {
        Self { name, ty, optional: false, defaulted: true, open_type: None }
    }

    /// Attach an open-type hook: another field of the same record selects
    /// the concrete type to decode this slot with.
    pub fn with_open_type(mut self, open_type: OpenType) -> Self {
        self.open_type = Some(open_type);
        self
    }

    fn is_mandatory(&self) -> bool {
        !self.optional && !self.defaulted
    }
}

/// The ordered named-type catalogue of a record or choice.
///
/// Precomputes the set of required slot indices. Tag-based slot lookup
/// comes in two flavours: global (SET, order-independent) and
/// near-position (SEQUENCE with optional/defaulted slots).
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTypes {
    types: Vec<NamedType>,
    required: Vec<usize>,
}

impl NamedTypes {
    pub fn new(types: Vec<NamedType>) -> Self {
        let required = types
            .iter()
            .enumerate()
            .filter(|(_, nt)| nt.is_mandatory())
            .map(|(idx, _)| idx)
            .collect();
        Self { types, required }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&NamedType> {
        self.types.get(idx)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, NamedType> {
        self.types.iter()
    }

    /// Indices of non-optional, non-defaulted slots.
    pub fn required(&self) -> &[usize] {
        &self.required
    }

    pub(crate) fn has_optional_or_default(&self) -> bool {
        self.types.iter().any(|nt| nt.optional || nt.defaulted)
    }

    pub(crate) fn has_open_types(&self) -> bool {
        self.types.iter().any(|nt| nt.open_type.is_some())
    }

    pub(crate) fn position_of_name(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|nt| nt.name == name)
    }

    /// Slot index for a wire tag chain, searched over the whole catalogue
    /// (the SET lookup).
    pub(crate) fn position_by_tag(&self, tag_set: &TagSet) -> Option<usize> {
        self.types.iter().position(|nt| nt.ty.accepts(tag_set))
    }

    /// Slot index for a wire tag chain, searched from `idx` onward (the
    /// SEQUENCE lookup past optional slots).
    pub(crate) fn position_near(&self, tag_set: &TagSet, idx: usize) -> Option<usize> {
        self.candidates_near(idx)
            .find(|&(_, nt)| nt.ty.accepts(tag_set))
            .map(|(pos, _)| pos)
    }

    /// Candidate slots a child may occupy at position `idx`: every
    /// optional/defaulted slot from `idx` onward, plus the first mandatory
    /// one.
    pub(crate) fn candidates_near(
        &self,
        idx: usize,
    ) -> impl Iterator<Item = (usize, &NamedType)> {
        let mut passed_mandatory = false;
        self.types
            .iter()
            .enumerate()
            .skip(idx)
            .take_while(move |(_, nt)| {
                if passed_mandatory {
                    return false;
                }
                if nt.is_mandatory() {
                    passed_mandatory = true;
                }
                true
            })
    }
}

/// An open-type hook: `governor` names the field of the same record whose
/// decoded value selects, through the map, the concrete type for this
/// slot.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenType {
    pub governor: &'static str,
    map: Vec<(ValueKind, Asn1Type)>,
}

impl OpenType {
    pub fn new(governor: &'static str) -> Self {
        Self { governor, map: Vec::new() }
    }

    /// Register a governing value and the type it selects.
    pub fn with(mut self, key: ValueKind, ty: Asn1Type) -> Self {
        self.map.push((key, ty));
        self
    }

    pub(crate) fn lookup(&self, value: &ValueKind) -> Option<&Asn1Type> {
        self.map.iter().find(|(key, _)| key == value).map(|(_, ty)| ty)
    }
}
