use super::header::PacketHeader;
use crate::types::{WireCodec, WireWord};

/// One stream element and its end-of-message flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Word<W> {
    pub data: W,
    pub tlast: bool,
}

impl<W> Word<W> {
    pub const fn new(data: W, tlast: bool) -> Self {
        Self { data, tlast }
    }

    /// A word in the middle of a message.
    pub const fn body(data: W) -> Self {
        Self::new(data, false)
    }

    /// The final word of a message.
    pub const fn last(data: W) -> Self {
        Self::new(data, true)
    }
}

/// A whole message: optional header, payload, implicit end-of-message on
/// the last word.
#[derive(Clone, Debug, PartialEq)]
pub struct Message<W> {
    pub header: Option<PacketHeader>,
    pub payload: Vec<W>,
}

impl<W: WireWord> Message<W> {
    pub fn new(header: Option<PacketHeader>, payload: Vec<W>) -> Self {
        Self { header, payload }
    }

    /// Encode elements into a message, casting each to the wire type.
    pub fn from_elements<T: WireCodec<W>>(header: Option<PacketHeader>, values: &[T]) -> Self {
        Self::new(header, values.iter().map(|&v| v.to_wire()).collect())
    }

    /// Decode the payload into elements.
    pub fn to_elements<T: WireCodec<W>>(&self) -> Vec<T> {
        self.payload.iter().map(|&w| T::from_wire(w)).collect()
    }

    /// Words on the wire: header first, end-of-message on the final word.
    pub fn to_words(&self) -> Vec<Word<W>> {
        let mut words = Vec::with_capacity(self.payload.len() + 1);
        if let Some(h) = self.header {
            words.push(Word::body(W::from_bits(h.encode())));
        }
        words.extend(self.payload.iter().map(|&w| Word::body(w)));
        if let Some(last) = words.last_mut() {
            last.tlast = true;
        }
        words
    }
}
