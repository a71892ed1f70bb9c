//! Partition one stream across instances, a whole message at a time.

use colmax_gemm::stream::{PacketHeader, StreamSink, Word};
use colmax_gemm::types::WireWord;

use crate::channel::ChannelSink;

/// How a [`Split`] picks the instance for each message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoutePolicy {
    /// Message `i` goes to instance `i % N`.
    #[default]
    RoundRobin,
    /// The first word is a packet header; its id field (bits 4..0) names
    /// the instance. The parity bit is not checked.
    PacketId,
}

/// Sink that routes every message to exactly one instance.
///
/// The instance is chosen on the first word of a message and kept until the
/// end-of-message flag, so messages are never interleaved or cut.
#[derive(Debug)]
pub struct Split<W> {
    outputs: Vec<ChannelSink<W>>,
    policy: RoutePolicy,
    current: Option<usize>,
    routed: usize,
    unroutable: Option<u8>,
}

impl<W: WireWord> Split<W> {
    pub fn new(outputs: Vec<ChannelSink<W>>, policy: RoutePolicy) -> Self {
        Self {
            outputs,
            policy,
            current: None,
            routed: 0,
            unroutable: None,
        }
    }

    pub fn fan_out(&self) -> usize {
        self.outputs.len()
    }

    /// Messages started so far.
    pub fn routed(&self) -> usize {
        self.routed
    }

    /// Packet id of the last message that named a missing instance.
    pub fn unroutable(&self) -> Option<u8> {
        self.unroutable
    }

    fn route(&mut self, first: &Word<W>) -> colmax_gemm::Result<usize> {
        let n = self.outputs.len();
        match self.policy {
            RoutePolicy::RoundRobin => Ok(self.routed % n),
            RoutePolicy::PacketId => {
                let id = PacketHeader::id_bits(first.data.to_bits());
                if (id as usize) < n {
                    Ok(id as usize)
                } else {
                    self.unroutable = Some(id);
                    Err(colmax_gemm::Error::DimensionMismatch(format!(
                        "packet id {} has no instance among {}",
                        id, n
                    )))
                }
            }
        }
    }
}

impl<W: WireWord> StreamSink<W> for Split<W> {
    fn write(&mut self, word: Word<W>) -> colmax_gemm::Result<()> {
        let target = match self.current {
            Some(t) => t,
            None => {
                let t = self.route(&word)?;
                self.routed += 1;
                self.current = Some(t);
                t
            }
        };
        if word.tlast {
            self.current = None;
        }
        self.outputs[target].write(word)
    }
}
