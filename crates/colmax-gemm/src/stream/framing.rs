use tracing::warn;

use super::header::PacketHeader;
use super::io::{StreamSink, StreamSource};
use super::word::{Message, Word};
use crate::error::{Error, Result};
use crate::types::{WireCodec, WireWord};

/// What to do with a leading header word on an operand stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HeaderMode {
    /// The stream carries no header.
    #[default]
    None,
    /// Read one word and drop it unchecked.
    Discard,
    /// Read one word and decode it as a [`PacketHeader`], rejecting words
    /// with even parity.
    Keep,
}

/// Fill `dst` from a fixed-length operand message.
///
/// Words are cast to `T` and stored in arrival order; the producer is
/// responsible for emitting them in blocked order. Returns the decoded
/// header under [`HeaderMode::Keep`].
///
/// # Errors
///
/// - [`Error::StreamClosed`] if the stream closes before the first word.
/// - [`Error::UnexpectedEnd`] if it closes part-way through the payload.
/// - [`Error::HeaderParity`] if a kept header is malformed.
pub fn ingest<W, T, S>(src: &mut S, mode: HeaderMode, dst: &mut [T]) -> Result<Option<PacketHeader>>
where
    W: WireWord,
    T: WireCodec<W>,
    S: StreamSource<W> + ?Sized,
{
    let header = match mode {
        HeaderMode::None => None,
        HeaderMode::Discard => {
            src.read()?;
            None
        }
        HeaderMode::Keep => Some(PacketHeader::decode(src.read()?.data.to_bits())?),
    };

    let expected = dst.len();
    for (i, slot) in dst.iter_mut().enumerate() {
        let word = match src.read() {
            Ok(word) => word,
            Err(Error::StreamClosed) if i == 0 && mode == HeaderMode::None => {
                return Err(Error::StreamClosed)
            }
            Err(Error::StreamClosed) => return Err(Error::UnexpectedEnd { expected, got: i }),
            Err(e) => return Err(e),
        };
        if word.tlast && i + 1 != expected {
            warn!(position = i, expected, "end-of-message flag before end of operand");
        }
        *slot = T::from_wire(word.data);
    }
    Ok(header)
}

/// Write one result message: optional header, then `values` in order with
/// end-of-message on the final word.
///
/// With no values the header itself carries end-of-message.
pub fn emit_frame<W, T, S>(sink: &mut S, header: Option<PacketHeader>, values: &[T]) -> Result<()>
where
    W: WireWord,
    T: WireCodec<W>,
    S: StreamSink<W> + ?Sized,
{
    if let Some(h) = header {
        sink.write(Word::new(W::from_bits(h.encode()), values.is_empty()))?;
    }
    let last = values.len().saturating_sub(1);
    for (i, &v) in values.iter().enumerate() {
        sink.write(Word::new(v.to_wire(), i == last))?;
    }
    Ok(())
}

/// Read words up to and including the next end-of-message flag.
///
/// # Errors
///
/// - [`Error::StreamClosed`] if the stream is already closed.
/// - [`Error::UnterminatedMessage`] if it closes before end-of-message.
pub fn read_message<W, S>(src: &mut S, with_header: bool) -> Result<Message<W>>
where
    W: WireWord,
    S: StreamSource<W> + ?Sized,
{
    let mut words = Vec::new();
    loop {
        match src.read() {
            Ok(word) => {
                words.push(word.data);
                if word.tlast {
                    break;
                }
            }
            Err(Error::StreamClosed) if words.is_empty() => return Err(Error::StreamClosed),
            Err(Error::StreamClosed) => return Err(Error::UnterminatedMessage(words.len())),
            Err(e) => return Err(e),
        }
    }

    let header = if with_header {
        let first = words.remove(0);
        Some(PacketHeader::decode(first.to_bits())?)
    } else {
        None
    };
    Ok(Message::new(header, words))
}

/// Write a whole message.
pub fn write_message<W, S>(sink: &mut S, message: &Message<W>) -> Result<()>
where
    W: WireWord,
    S: StreamSink<W> + ?Sized,
{
    for word in message.to_words() {
        sink.write(word)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn stream<W: Copy>(data: &[W]) -> VecDeque<Word<W>> {
        let last = data.len().saturating_sub(1);
        data.iter()
            .enumerate()
            .map(|(i, &d)| Word::new(d, i == last))
            .collect()
    }

    #[test]
    fn test_ingest_casts_in_arrival_order() {
        let mut src = stream(&[3i32, -1, 7, 0]);
        let mut dst = [0.0f32; 4];
        let header = ingest(&mut src, HeaderMode::None, &mut dst).unwrap();
        assert_eq!(header, None);
        assert_eq!(dst, [3.0, -1.0, 7.0, 0.0]);
        assert!(src.is_empty());
    }

    #[test]
    fn test_ingest_discards_header() {
        let mut src = stream(&[0x1234_5678u32, 1, 2]);
        let mut dst = [0i32; 2];
        ingest(&mut src, HeaderMode::Discard, &mut dst).unwrap();
        assert_eq!(dst, [1, 2]);
    }

    #[test]
    fn test_ingest_discards_even_parity_header() {
        // base word plus id 1: even parity, the form counted-id producers emit
        let raw = 0x8FFF_0001u32 as i32;
        let mut src = stream(&[raw, 4, 5]);
        let mut dst = [0.0f32; 2];
        assert_eq!(ingest(&mut src, HeaderMode::Discard, &mut dst), Ok(None));
        assert_eq!(dst, [4.0, 5.0]);

        let mut src = stream(&[raw, 4, 5]);
        assert_eq!(
            ingest(&mut src, HeaderMode::Keep, &mut dst),
            Err(Error::HeaderParity(0x8FFF_0001))
        );
    }

    #[test]
    fn test_ingest_keeps_header() {
        let h = PacketHeader::new(0, 3);
        let mut src = stream(&[h.encode() as i32, 5, 6]);
        let mut dst = [0.0f32; 2];
        let got = ingest(&mut src, HeaderMode::Keep, &mut dst).unwrap();
        assert_eq!(got, Some(h));
        assert_eq!(dst, [5.0, 6.0]);
    }

    #[test]
    fn test_ingest_consumes_exactly_one_message() {
        let mut src: VecDeque<Word<i32>> = stream(&[1, 2]);
        src.extend(stream(&[3, 4]));
        let mut dst = [0i32; 2];
        ingest(&mut src, HeaderMode::None, &mut dst).unwrap();
        assert_eq!(dst, [1, 2]);
        ingest(&mut src, HeaderMode::None, &mut dst).unwrap();
        assert_eq!(dst, [3, 4]);
        assert_eq!(ingest(&mut src, HeaderMode::None, &mut dst), Err(Error::StreamClosed));
    }

    #[test]
    fn test_ingest_short_stream() {
        let mut src = stream(&[1i32, 2]);
        let mut dst = [0i32; 4];
        assert_eq!(
            ingest(&mut src, HeaderMode::None, &mut dst),
            Err(Error::UnexpectedEnd { expected: 4, got: 2 })
        );
    }

    #[test]
    fn test_ingest_header_then_close() {
        let h = PacketHeader::new(0, 0);
        let mut src = stream(&[h.encode()]);
        let mut dst = [0i32; 2];
        assert_eq!(
            ingest(&mut src, HeaderMode::Keep, &mut dst),
            Err(Error::UnexpectedEnd { expected: 2, got: 0 })
        );
    }

    #[test]
    fn test_emit_frame_32_columns() {
        let values: Vec<f32> = (0..32).map(|c| c as f32).collect();
        let mut sink: Vec<Word<i32>> = Vec::new();
        emit_frame(&mut sink, None, &values).unwrap();

        assert_eq!(sink.len(), 32);
        for (c, word) in sink.iter().enumerate() {
            assert_eq!(word.data, c as i32);
            assert_eq!(word.tlast, c == 31);
        }
    }

    #[test]
    fn test_emit_frame_with_header() {
        let h = PacketHeader::new(0, 2);
        let mut sink: Vec<Word<i32>> = Vec::new();
        emit_frame(&mut sink, Some(h), &[9.5f32, -2.0]).unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink[0], Word::body(h.encode() as i32));
        assert_eq!(sink[1], Word::body(9));
        assert_eq!(sink[2], Word::last(-2));
    }

    #[test]
    fn test_emit_frame_empty_payload_flags_header() {
        let h = PacketHeader::new(0, 1);
        let mut sink: Vec<Word<u32>> = Vec::new();
        emit_frame::<u32, i32, _>(&mut sink, Some(h), &[]).unwrap();
        assert_eq!(sink, vec![Word::last(h.encode())]);
    }

    #[test]
    fn test_emit_frame_sentinel_saturates() {
        let mut sink: Vec<Word<i32>> = Vec::new();
        emit_frame(&mut sink, None, &[f32::NEG_INFINITY]).unwrap();
        assert_eq!(sink, vec![Word::last(i32::MIN)]);
    }

    #[test]
    fn test_read_message_round_trip() {
        let msg = Message::<i32>::from_elements(Some(PacketHeader::new(0, 4)), &[1i32, 2, 3]);
        let mut queue = VecDeque::new();
        write_message(&mut queue, &msg).unwrap();
        write_message(&mut queue, &msg).unwrap();

        assert_eq!(read_message(&mut queue, true).unwrap(), msg);
        assert_eq!(read_message(&mut queue, true).unwrap(), msg);
        assert_eq!(read_message::<i32, _>(&mut queue, true), Err(Error::StreamClosed));
    }

    #[test]
    fn test_read_message_unterminated() {
        let mut queue: VecDeque<Word<i32>> = [Word::body(1), Word::body(2)].into_iter().collect();
        assert_eq!(read_message(&mut queue, false), Err(Error::UnterminatedMessage(2)));
    }

    #[test]
    fn test_read_message_bad_header() {
        let mut queue: VecDeque<Word<u32>> = [Word::body(3), Word::last(1)].into_iter().collect();
        assert_eq!(read_message(&mut queue, true), Err(Error::HeaderParity(3)));
    }
}
