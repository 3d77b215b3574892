use alloc::vec::Vec;
use core::fmt::{self, Debug, Display};
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// An ASN.1 OBJECT IDENTIFIER.
///
/// Holds the decoded arc sequence, e.g. `1.2.840.113549`. The first two
/// arcs are already split out of the combined leading sub-identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid {
    arcs: Vec<u64>,
}

impl Oid {
    pub fn new(arcs: Vec<u64>) -> Self {
        Self { arcs }
    }

    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether this identifier lies under the given prefix.
    ///
    /// # Example
    /// ```
    /// use asn1_ber::Oid;
    ///
    /// let oid: Oid = "1.2.840.113549.1.1.11".parse().unwrap();
    /// assert!(oid.starts_with(&[1, 2, 840, 113549]));
    /// assert!(!oid.starts_with(&[1, 3]));
    /// ```
    pub fn starts_with(&self, prefix: &[u64]) -> bool {
        self.arcs.starts_with(prefix)
    }
}

impl From<&[u64]> for Oid {
    fn from(arcs: &[u64]) -> Self {
        Self::new(arcs.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for Oid {
    fn from(arcs: [u64; N]) -> Self {
        Self::new(arcs.to_vec())
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

/// Error parsing an [`Oid`] from dotted-decimal notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOid;

impl Display for InvalidOid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid object identifier notation")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidOid {}

impl FromStr for Oid {
    type Err = InvalidOid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(InvalidOid);
        }
        let arcs = s
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| InvalidOid))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(arcs))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Oid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
