//! A `no_std` decoder for ASN.1 values encoded with the Basic Encoding
//! Rules (BER) and its canonical subsets CER and DER.
//!
//! The decoder reconstructs typed, possibly nested values from an octet
//! stream, optionally guided by a caller-supplied [`Asn1Type`] schema
//! that disambiguates types and resolves implicit tagging. Both
//! definite and indefinite lengths are handled, constructed string
//! encodings are reassembled, and open types inside records can be
//! resolved through caller-supplied maps.
//!
//! # One-shot decoding
//!
//! ```
//! use asn1_ber::decode;
//!
//! // SEQUENCE of three INTEGERs
//! let bytes = [0x30, 0x09, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x03];
//! let (value, trailing) = decode(&bytes).unwrap();
//!
//! let elements = value.elements().unwrap();
//! assert_eq!(elements.len(), 3);
//! assert_eq!(elements[0].as_integer(), Some(1));
//! assert!(trailing.is_empty());
//! ```
//!
//! # Streaming
//!
//! [`StreamDecoder`] accepts octets incrementally: a poll that runs out
//! of buffered input inside a value reports
//! [`StreamEvent::NeedMoreInput`] instead of failing, and the value is
//! retried once more octets arrive.
//!
//! # Schema-guided decoding
//!
//! ```
//! use asn1_ber::{decode_with_spec, Asn1Type, NamedType, NamedTypes};
//!
//! let spec = Asn1Type::sequence(NamedTypes::new(vec![
//!     NamedType::new("number", Asn1Type::integer()),
//!     NamedType::optional("flag", Asn1Type::boolean()),
//! ]));
//!
//! let (value, _) = decode_with_spec(&[0x30, 0x03, 0x02, 0x01, 0x07], &spec).unwrap();
//! let record = value.record().unwrap();
//! assert_eq!(record.get("number").unwrap().as_integer(), Some(7));
//! assert_eq!(record.get("flag"), None);
//! ```

#![no_std]
#![warn(missing_debug_implementations)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod decoder;
mod error;
mod oid;
mod parser;
mod spec;
mod stream;
mod tag;
#[cfg(feature = "chrono-conversions")]
mod time;
mod value;


pub use decoder::{DecoderOptions, EncodingRules, PayloadKind, TagMap, TypeMap};
pub use error::{DecodeError, DecodeResult};
pub use oid::{InvalidOid, Oid};
pub use parser::Length;
pub use spec::{Asn1Type, NamedType, NamedTypes, OpenType, TypeId, TypeKind};
pub use stream::{Decoder, StreamDecoder, StreamEvent, decode, decode_with_spec};
pub use tag::{Tag, TagClass, TagForm, TagSet, UniversalTag};
#[cfg(feature = "chrono-conversions")]
pub use time::{parse_generalized_time, parse_utc_time};
pub use value::{BitString, Real, Record, RecordField, StringKind, Value, ValueKind};
