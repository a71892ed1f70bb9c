//! Result collection.
//!
//! Each unit writes its own result stream. A collector drains one stream
//! into [`ShardResult`]s tagged with the shard index and invocation number.
//! Merging shards into a global answer is left to the consumer.

use colmax_gemm::stream::{read_message, PacketHeader, StreamSource};
use colmax_gemm::types::{WireCodec, WireWord};
use colmax_gemm::Error;

/// One result message from one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct ShardResult<W> {
    pub shard: usize,
    pub invocation: usize,
    pub header: Option<PacketHeader>,
    pub payload: Vec<W>,
}

impl<W: WireWord> ShardResult<W> {
    /// Payload cast back to an element type.
    pub fn values<T: WireCodec<W>>(&self) -> Vec<T> {
        self.payload.iter().map(|&w| T::from_wire(w)).collect()
    }
}

/// Read result messages from `src` until it closes.
pub fn collect_shard<W, S>(shard: usize, src: &mut S, with_header: bool) -> colmax_gemm::Result<Vec<ShardResult<W>>>
where
    W: WireWord,
    S: StreamSource<W> + ?Sized,
{
    let mut results = Vec::new();
    loop {
        match read_message(src, with_header) {
            Ok(msg) => results.push(ShardResult {
                shard,
                invocation: results.len(),
                header: msg.header,
                payload: msg.payload,
            }),
            Err(Error::StreamClosed) => return Ok(results),
            Err(e) => return Err(e),
        }
    }
}
