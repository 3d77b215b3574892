//! Decoder error types.

use core::fmt;

use crate::tag::Tag;

/// Decode error kinds.
///
/// [`DecodeError::SubstrateUnderrun`] is recoverable in streaming mode:
/// the caller may feed more octets and retry the current top-level value.
/// Every other kind aborts the current decode; no partial value is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not enough octets buffered to finish the current item.
    SubstrateUnderrun {
        /// How many more octets are known to be needed, if known.
        needed: Option<usize>,
    },
    /// No payload decoder or schema branch matches the decoded tag.
    UnknownTag { tag: Tag },
    /// Structurally invalid encoding.
    MalformedValue(&'static str),
    /// A record finished without a mandatory component.
    MissingRequiredComponent { name: &'static str },
    /// More children than the record catalogue accommodates.
    ExcessComponents,
    /// The substrate ran out between top-level values and no resume is
    /// possible.
    EndOfStream,
}

impl DecodeError {
    /// Whether feeding more input and retrying can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::SubstrateUnderrun { .. })
    }

    /// Map a nom error into a decode error, using `what` as the
    /// malformed-value description for parse failures.
    pub(crate) fn from_nom(err: nom::Err<nom::error::Error<&[u8]>>, what: &'static str) -> Self {
        match err {
            nom::Err::Incomplete(nom::Needed::Size(n)) => {
                DecodeError::SubstrateUnderrun { needed: Some(n.get()) }
            }
            nom::Err::Incomplete(nom::Needed::Unknown) => {
                DecodeError::SubstrateUnderrun { needed: None }
            }
            nom::Err::Error(_) | nom::Err::Failure(_) => DecodeError::MalformedValue(what),
        }
    }

    /// Demote an underrun to a malformed-value error.
    ///
    /// Used once the declared length of a definite TLV is fully buffered:
    /// an inner read past that boundary cannot be satisfied by more input.
    pub(crate) fn into_bounded(self, what: &'static str) -> Self {
        match self {
            DecodeError::SubstrateUnderrun { .. } => DecodeError::MalformedValue(what),
            other => other,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubstrateUnderrun { needed: Some(n) } => {
                write!(f, "Substrate underrun, {} more octets needed", n)
            }
            Self::SubstrateUnderrun { needed: None } => write!(f, "Substrate underrun"),
            Self::UnknownTag { tag } => write!(f, "No decoder matches tag {}", tag),
            Self::MalformedValue(what) => write!(f, "Malformed value: {}", what),
            Self::MissingRequiredComponent { name } => {
                write!(f, "Record is missing required component `{}`", name)
            }
            Self::ExcessComponents => write!(f, "More components than the record accommodates"),
            Self::EndOfStream => write!(f, "End of octet stream"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

pub type DecodeResult<T> = Result<T, DecodeError>;
