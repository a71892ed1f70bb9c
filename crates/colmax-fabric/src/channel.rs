//! Bounded word channels.
//!
//! Both ends block: a read waits for a word, a write waits for capacity.
//! Once every sender is gone and the buffer is empty a read reports
//! [`Error::StreamClosed`]; once the receiver is gone a write does too.

use crossbeam::channel::{bounded, Receiver, Sender};

use colmax_gemm::stream::{StreamSink, StreamSource, Word};
use colmax_gemm::Error;

/// Write end of a word channel.
#[derive(Debug)]
pub struct ChannelSink<W> {
    tx: Sender<Word<W>>,
}

/// Read end of a word channel.
#[derive(Debug)]
pub struct ChannelSource<W> {
    rx: Receiver<Word<W>>,
}

/// Create a channel holding at most `capacity` words in flight.
pub fn stream_channel<W>(capacity: usize) -> (ChannelSink<W>, ChannelSource<W>) {
    let (tx, rx) = bounded(capacity);
    (ChannelSink { tx }, ChannelSource { rx })
}

impl<W> StreamSink<W> for ChannelSink<W> {
    fn write(&mut self, word: Word<W>) -> colmax_gemm::Result<()> {
        self.tx.send(word).map_err(|_| Error::StreamClosed)
    }
}

impl<W> StreamSource<W> for ChannelSource<W> {
    fn read(&mut self) -> colmax_gemm::Result<Word<W>> {
        self.rx.recv().map_err(|_| Error::StreamClosed)
    }
}

impl<W> ChannelSource<W> {
    /// Words currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
