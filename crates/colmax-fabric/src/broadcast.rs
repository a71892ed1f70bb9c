//! Replicate one stream to every instance.

use colmax_gemm::stream::{StreamSink, Word};
use colmax_gemm::types::WireWord;

use crate::channel::ChannelSink;

/// Sink that copies every word to each instance's input, in instance order.
///
/// Each write blocks until every instance has room, so a slow instance holds
/// back the whole broadcast instead of losing words.
#[derive(Debug)]
pub struct Broadcast<W> {
    outputs: Vec<ChannelSink<W>>,
}

impl<W: WireWord> Broadcast<W> {
    pub fn new(outputs: Vec<ChannelSink<W>>) -> Self {
        Self { outputs }
    }

    /// Number of instances fed.
    pub fn fan_out(&self) -> usize {
        self.outputs.len()
    }

    /// Give up lockstep replication and hand back each instance's input, so
    /// every copy can be fed at its own pace.
    pub fn into_outputs(self) -> Vec<ChannelSink<W>> {
        self.outputs
    }
}

impl<W: WireWord> StreamSink<W> for Broadcast<W> {
    fn write(&mut self, word: Word<W>) -> colmax_gemm::Result<()> {
        for out in &mut self.outputs {
            out.write(word)?;
        }
        Ok(())
    }
}
