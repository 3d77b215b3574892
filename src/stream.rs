//! Top-level decoding surfaces.
//!
//! [`decode`] and [`decode_with_spec`] are the one-shot forms: the input
//! is final, an underrun is an error, and trailing octets come back to
//! the caller. [`StreamDecoder`] is the incremental form: octets are fed
//! in as they arrive and each poll either yields a value, asks for more
//! input, or reports the end of the stream.
//!
//! The streaming decoder restarts at the mark: the octets of the current
//! top-level value stay buffered until the whole value decodes, so a
//! poll after an underrun simply re-enters the decode from the start of
//! the value.

use alloc::vec::Vec;

use crate::decoder::{DecoderOptions, Item, SpecView, decode_item};
use crate::error::{DecodeError, DecodeResult};
use crate::spec::Asn1Type;
use crate::value::Value;

/// One-shot decode of a single value, without a schema.
///
/// Returns the value and the unconsumed trailing octets.
///
/// # Example
/// ```
/// use asn1_ber::decode;
///
/// let (value, trailing) = decode(&[0x02, 0x01, 0x2A, 0xFF]).unwrap();
/// assert_eq!(value.as_integer(), Some(42));
/// assert_eq!(trailing, &[0xFF]);
/// ```
pub fn decode(input: &[u8]) -> DecodeResult<(Value, &[u8])> {
    Decoder::new(DecoderOptions::ber()).decode(input)
}

/// One-shot decode of a single value against a schema.
pub fn decode_with_spec<'a>(input: &'a [u8], spec: &Asn1Type) -> DecodeResult<(Value, &'a [u8])> {
    Decoder::new(DecoderOptions::ber()).decode_with_spec(input, spec)
}

/// A one-shot decoder carrying a set of options.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Decoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode one value; raises on error or underrun.
    pub fn decode<'a>(&self, input: &'a [u8]) -> DecodeResult<(Value, &'a [u8])> {
        self.decode_inner(input, SpecView::None)
    }

    /// Decode one value against a schema; raises on error or underrun.
    pub fn decode_with_spec<'a>(
        &self,
        input: &'a [u8],
        spec: &Asn1Type,
    ) -> DecodeResult<(Value, &'a [u8])> {
        self.decode_inner(input, SpecView::One(spec))
    }

    fn decode_inner<'a>(
        &self,
        input: &'a [u8],
        spec: SpecView<'_>,
    ) -> DecodeResult<(Value, &'a [u8])> {
        if input.is_empty() {
            return Err(DecodeError::EndOfStream);
        }
        let (rest, item) = decode_item(&self.options, input, spec, None, false)?;
        match item {
            Item::Value(value) => Ok((value, rest)),
            Item::EndOfContents => Err(DecodeError::MalformedValue("unexpected end-of-contents")),
        }
    }
}

/// Outcome of polling a [`StreamDecoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One complete top-level value.
    Value(Value),
    /// The buffered octets stop inside a value; feed more and poll again.
    NeedMoreInput,
    /// The stream is finished and fully consumed.
    EndOfStream,
}

/// Incremental decoder over a byte stream of unknown length.
///
/// Feed octets as they arrive and poll for values. A poll that hits the
/// end of the buffered octets inside a value reports
/// [`StreamEvent::NeedMoreInput`] instead of failing; once the source is
/// exhausted, call [`StreamDecoder::finish`] so that a truncated value
/// turns into a hard error.
///
/// # Example
/// ```
/// use asn1_ber::{StreamDecoder, StreamEvent};
///
/// let mut decoder = StreamDecoder::new();
/// decoder.feed(&[0x02, 0x01]);
/// assert_eq!(decoder.poll_next().unwrap(), StreamEvent::NeedMoreInput);
///
/// decoder.feed(&[0x2A]);
/// let StreamEvent::Value(value) = decoder.poll_next().unwrap() else {
///     panic!("expected a value");
/// };
/// assert_eq!(value.as_integer(), Some(42));
///
/// decoder.finish();
/// assert_eq!(decoder.poll_next().unwrap(), StreamEvent::EndOfStream);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    options: DecoderOptions,
    spec: Option<Asn1Type>,
    buffer: Vec<u8>,
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::ber())
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self { options, spec: None, buffer: Vec::new(), finished: false }
    }

    /// Guide every top-level value with the given schema.
    pub fn with_spec(mut self, spec: Asn1Type) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Append freshly arrived octets.
    pub fn feed(&mut self, octets: &[u8]) {
        self.buffer.extend_from_slice(octets);
    }

    /// Mark the source as exhausted: no more octets will be fed.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Octets buffered but not yet consumed by a decoded value.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Try to decode the next top-level value from the buffered octets.
    pub fn poll_next(&mut self) -> DecodeResult<StreamEvent> {
        if self.buffer.is_empty() {
            return Ok(if self.finished {
                StreamEvent::EndOfStream
            } else {
                StreamEvent::NeedMoreInput
            });
        }

        let view = match &self.spec {
            Some(spec) => SpecView::One(spec),
            None => SpecView::None,
        };

        match decode_item(&self.options, &self.buffer, view, None, false) {
            Ok((rest, Item::Value(value))) => {
                let consumed = self.buffer.len() - rest.len();
                self.buffer.drain(..consumed);
                Ok(StreamEvent::Value(value))
            }
            Ok((_, Item::EndOfContents)) => {
                Err(DecodeError::MalformedValue("unexpected end-of-contents"))
            }
            Err(err) if err.is_recoverable() && !self.finished => Ok(StreamEvent::NeedMoreInput),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{NamedType, NamedTypes};
    use crate::value::ValueKind;
    use alloc::vec;

    #[test]
    fn test_decode_returns_trailing() {
        let (value, trailing) = decode(&[0x01, 0x01, 0xFF, 0xAA, 0xBB]).unwrap();
        assert_eq!(value.as_bool(), Some(true));
        assert_eq!(trailing, &[0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(decode(&[]), Err(DecodeError::EndOfStream));
    }

    #[test]
    fn test_decode_underrun_is_fatal() {
        let err = decode(&[0x02, 0x05, 0x01]).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(err, DecodeError::SubstrateUnderrun { .. }));
    }

    #[test]
    fn test_decode_with_spec_implicit_tag() {
        use crate::tag::{Tag, TagForm};

        // [2] IMPLICIT INTEGER holding 258
        let spec = Asn1Type::integer().implicit(Tag::context(TagForm::Primitive, 2));
        let (value, _) = decode_with_spec(&[0x82, 0x02, 0x01, 0x02], &spec).unwrap();
        assert_eq!(value.as_integer(), Some(258));
    }

    #[test]
    fn test_stream_decoder_multiple_values() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&[0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);

        let StreamEvent::Value(first) = decoder.poll_next().unwrap() else {
            panic!("expected a value");
        };
        let StreamEvent::Value(second) = decoder.poll_next().unwrap() else {
            panic!("expected a value");
        };
        assert_eq!(first.as_integer(), Some(1));
        assert_eq!(second.as_integer(), Some(2));

        assert_eq!(decoder.poll_next().unwrap(), StreamEvent::NeedMoreInput);
        decoder.finish();
        assert_eq!(decoder.poll_next().unwrap(), StreamEvent::EndOfStream);
    }

    #[test]
    fn test_stream_decoder_byte_at_a_time() {
        let input = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let (expected, _) = decode(&input).unwrap();

        let mut decoder = StreamDecoder::new();
        let mut decoded = None;
        for (i, &octet) in input.iter().enumerate() {
            decoder.feed(&[octet]);
            match decoder.poll_next().unwrap() {
                StreamEvent::Value(value) => {
                    assert_eq!(i, input.len() - 1, "value must complete on the last octet");
                    decoded = Some(value);
                }
                StreamEvent::NeedMoreInput => {
                    assert!(i < input.len() - 1, "last octet must complete the value");
                }
                StreamEvent::EndOfStream => panic!("stream is not finished"),
            }
        }
        assert_eq!(decoded, Some(expected));
    }

    #[test]
    fn test_stream_decoder_truncated_after_finish() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&[0x02, 0x05, 0x01]);
        assert_eq!(decoder.poll_next().unwrap(), StreamEvent::NeedMoreInput);

        decoder.finish();
        let err = decoder.poll_next().unwrap_err();
        assert!(matches!(err, DecodeError::SubstrateUnderrun { .. }));
    }

    #[test]
    fn test_stream_decoder_with_spec() {
        let spec = Asn1Type::sequence(NamedTypes::new(vec![NamedType::new(
            "n",
            Asn1Type::integer(),
        )]));
        let mut decoder = StreamDecoder::new().with_spec(spec);
        decoder.feed(&[0x30, 0x03, 0x02, 0x01, 0x09]);

        let StreamEvent::Value(value) = decoder.poll_next().unwrap() else {
            panic!("expected a value");
        };
        match &value.kind {
            ValueKind::Sequence(record) => {
                assert_eq!(record.get("n").unwrap().as_integer(), Some(9));
            }
            other => panic!("expected Sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_decoder_hard_error_is_sticky_input() {
        let mut decoder = StreamDecoder::new();
        // null with non-empty contents
        decoder.feed(&[0x05, 0x01, 0x00]);
        let err = decoder.poll_next().unwrap_err();
        assert_eq!(err, DecodeError::MalformedValue("null with non-empty contents"));
    }
}
