//! ASN.1 BER tag model
//!
//! A BER identifier octet carries a class (bits 7-6), a form bit (bit 5,
//! primitive or constructed) and a tag number (bits 4-0, with `0x1F`
//! escaping to the long form).
//!
//! Reference: ISO/IEC 8825-1 (X.690), Section 8.1.2

use alloc::vec::Vec;
use core::fmt::{self, Display};

use derive_try_from_primitive::TryFromPrimitive;

/// BER tag class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagClass {
    /// Universal (0b00)
    Universal,
    /// Application (0b01)
    Application,
    /// Context-specific (0b10)
    ContextSpecific,
    /// Private (0b11)
    Private,
}

impl TagClass {
    /// Parse tag class from upper 2 bits
    pub const fn from_bits(byte: u8) -> Self {
        match byte & 0b11_000000 {
            0b00_000000 => TagClass::Universal,
            0b01_000000 => TagClass::Application,
            0b10_000000 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }
}

/// BER tag form (primitive or constructed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagForm {
    /// Primitive (0b0) - literal content octets
    Primitive,
    /// Constructed (0b1) - contains nested TLVs
    Constructed,
}

impl TagForm {
    /// Parse tag form from bit 5
    pub const fn from_bit(byte: u8) -> Self {
        if byte & 0b0010_0000 != 0 { TagForm::Constructed } else { TagForm::Primitive }
    }
}

/// Universal class tag numbers for which a payload decoder exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
#[rustfmt::skip]
pub enum UniversalTag {
    Boolean          =  1,
    Integer          =  2,
    BitString        =  3,
    OctetString      =  4,
    Null             =  5,
    ObjectIdentifier =  6,
    ObjectDescriptor =  7,
    Real             =  9,
    Enumerated       = 10,
    Utf8String       = 12,
    Sequence         = 16,
    Set              = 17,
    NumericString    = 18,
    PrintableString  = 19,
    TeletexString    = 20,
    VideotexString   = 21,
    Ia5String        = 22,
    UtcTime          = 23,
    GeneralizedTime  = 24,
    GraphicString    = 25,
    VisibleString    = 26,
    GeneralString    = 27,
    UniversalString  = 28,
    BmpString        = 30,
}

/// A single BER tag: class, form, number.
///
/// Two tags are equal iff all three fields match. Schema matching ignores
/// the form bit (see [`Tag::matches`]), since the same type may appear in
/// primitive or constructed form on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tag {
    pub class: TagClass,
    pub form: TagForm,
    pub number: u32,
}

impl Tag {
    pub const fn new(class: TagClass, form: TagForm, number: u32) -> Self {
        Self { class, form, number }
    }

    /// A universal-class tag.
    pub const fn universal(form: TagForm, number: u32) -> Self {
        Self::new(TagClass::Universal, form, number)
    }

    /// A context-specific tag, as used by implicit and explicit tagging.
    pub const fn context(form: TagForm, number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, form, number)
    }

    /// An application-class tag.
    pub const fn application(form: TagForm, number: u32) -> Self {
        Self::new(TagClass::Application, form, number)
    }

    /// A private-class tag.
    pub const fn private(form: TagForm, number: u32) -> Self {
        Self::new(TagClass::Private, form, number)
    }

    pub const fn is_constructed(&self) -> bool {
        matches!(self.form, TagForm::Constructed)
    }

    pub const fn is_universal(&self) -> bool {
        matches!(self.class, TagClass::Universal)
    }

    /// Class and number match, the form bit is ignored.
    pub fn matches(&self, other: &Tag) -> bool {
        self.class == other.class && self.number == other.number
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "universal",
            TagClass::Application => "application",
            TagClass::ContextSpecific => "context",
            TagClass::Private => "private",
        };
        write!(f, "[{} {}]", class, self.number)
    }
}

/// The ordered chain of tags attached to a value.
///
/// Tags are kept in wire order: the outermost explicit tag first, the
/// effective (innermost) tag last. A plain universal value carries a
/// single-element chain. The chain may be empty only for untagged schema
/// templates (`CHOICE`, `ANY`), never for a decoded value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    /// The empty chain, used by untagged schema templates.
    pub fn untagged() -> Self {
        Self { tags: Vec::new() }
    }

    /// A single-tag chain, as started when a fresh tag is read off the wire.
    pub fn of(tag: Tag) -> Self {
        Self { tags: alloc::vec![tag] }
    }

    /// Extend an outer chain with a freshly decoded inner tag.
    ///
    /// Used when recursing into the contents of an explicit tag: the outer
    /// tags stay in front, the new tag becomes the effective one.
    pub fn extend(&self, inner: Tag) -> Self {
        let mut tags = self.tags.clone();
        tags.push(inner);
        Self { tags }
    }

    /// Replace the effective tag, keeping its form. Schema builder for
    /// IMPLICIT tagging.
    pub fn tagged_implicitly(&self, tag: Tag) -> Self {
        let mut tags = self.tags.clone();
        match tags.pop() {
            Some(old) => tags.push(Tag::new(tag.class, old.form, tag.number)),
            None => tags.push(tag),
        }
        Self { tags }
    }

    /// Wrap in an outer constructed tag. Schema builder for EXPLICIT
    /// tagging.
    pub fn tagged_explicitly(&self, tag: Tag) -> Self {
        let mut tags = Vec::with_capacity(self.tags.len() + 1);
        tags.push(Tag::new(tag.class, TagForm::Constructed, tag.number));
        tags.extend_from_slice(&self.tags);
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The outermost tag, i.e. the first one seen on the wire.
    pub fn outer(&self) -> Option<&Tag> {
        self.tags.first()
    }

    /// The effective (innermost) tag, used for decoder dispatch.
    pub fn effective(&self) -> Option<&Tag> {
        self.tags.last()
    }

    /// Form bit of the effective tag as read off the wire.
    pub(crate) fn effective_form(&self) -> TagForm {
        self.tags.last().map(|t| t.form).unwrap_or(TagForm::Primitive)
    }

    /// Chain equality ignoring form bits.
    pub fn matches(&self, other: &TagSet) -> bool {
        self.tags.len() == other.tags.len()
            && self.tags.iter().zip(other.tags.iter()).all(|(a, b)| a.matches(b))
    }
}

impl From<Tag> for TagSet {
    fn from(tag: Tag) -> Self {
        Self::of(tag)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                '+'.fmt(f)?;
            }
            tag.fmt(f)?;
        }
        Ok(())
    }
}
