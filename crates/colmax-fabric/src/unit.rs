//! One compute-unit replica.

use tracing::{debug, debug_span};

use colmax_gemm::core::{BlockGrid, BlockMac, LoopOrder, Workspace};
use colmax_gemm::settings::PACKET_TYPE;
use colmax_gemm::stream::{emit_frame, ingest, HeaderMode, PacketHeader, StreamSink, StreamSource};
use colmax_gemm::types::{WireCodec, WireWord};
use colmax_gemm::Error;

/// Which operand arrives on the split stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SplitOperand {
    /// B is sharded across units and A is broadcast. Shard outputs are
    /// disjoint column ranges of the full result.
    #[default]
    Reference,
    /// A is sharded across units and B is broadcast. Shard outputs cover
    /// the same columns and merge by element-wise max.
    Query,
}

/// A compute unit: owns its buffers and runs ingest, reduce and emit once
/// per invocation.
///
/// Units share nothing; each reads its own copy of the broadcast stream and
/// its own share of the split stream.
#[derive(Debug)]
pub struct ComputeUnit<T: colmax_gemm::Element, S: BlockMac<T>> {
    index: usize,
    workspace: Workspace<T, S>,
    order: LoopOrder,
    split_operand: SplitOperand,
    split_header: HeaderMode,
    broadcast_header: HeaderMode,
    invocations: usize,
}

impl<T: colmax_gemm::Element, S: BlockMac<T>> ComputeUnit<T, S> {
    /// Unit expecting a headed split stream (header dropped unread) and a
    /// bare broadcast stream.
    pub fn new(index: usize, grid: BlockGrid<S>) -> Self {
        Self {
            index,
            workspace: Workspace::new(grid),
            order: LoopOrder::default(),
            split_operand: SplitOperand::default(),
            split_header: HeaderMode::Discard,
            broadcast_header: HeaderMode::None,
            invocations: 0,
        }
    }

    pub fn with_loop_order(mut self, order: LoopOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_split_operand(mut self, operand: SplitOperand) -> Self {
        self.split_operand = operand;
        self
    }

    pub fn with_headers(mut self, split: HeaderMode, broadcast: HeaderMode) -> Self {
        self.split_header = split;
        self.broadcast_header = broadcast;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Header written before every result message.
    pub fn header(&self) -> PacketHeader {
        PacketHeader::new(PACKET_TYPE, self.index as u8)
    }

    /// Column maxima of the last invocation.
    pub fn col_max(&self) -> &[T] {
        self.workspace.col_max()
    }

    /// Run one invocation: read one split message and one broadcast
    /// message, reduce, emit one result message.
    ///
    /// # Errors
    /// [`Error::StreamClosed`] if the split stream is closed on a message
    /// boundary, which ends the unit normally. A broadcast stream that
    /// closes first is reported as [`Error::UnexpectedEnd`].
    pub fn invoke<W, B, P, O>(&mut self, broadcast: &mut B, split: &mut P, out: &mut O) -> colmax_gemm::Result<()>
    where
        W: WireWord,
        T: WireCodec<W>,
        B: StreamSource<W> + ?Sized,
        P: StreamSource<W> + ?Sized,
        O: StreamSink<W> + ?Sized,
    {
        let header = self.header();
        let (a, b) = self.workspace.operands_mut();
        let (split_buf, broadcast_buf) = match self.split_operand {
            SplitOperand::Reference => (b, a),
            SplitOperand::Query => (a, b),
        };

        let packet = ingest(split, self.split_header, split_buf)?;
        let expected = broadcast_buf.len();
        match ingest(broadcast, self.broadcast_header, broadcast_buf) {
            Err(Error::StreamClosed) => return Err(Error::UnexpectedEnd { expected, got: 0 }),
            other => other?,
        };

        let col_max = self.workspace.reduce(self.order);
        debug!(
            unit = self.index,
            invocation = self.invocations,
            pkt_id = ?packet.map(|h| h.pkt_id),
            "reduced"
        );
        emit_frame(out, Some(header), col_max)?;
        self.invocations += 1;
        Ok(())
    }

    /// Invoke until the split stream closes. Returns the invocation count.
    pub fn run<W, B, P, O>(mut self, mut broadcast: B, mut split: P, mut out: O) -> colmax_gemm::Result<usize>
    where
        W: WireWord,
        T: WireCodec<W>,
        B: StreamSource<W>,
        P: StreamSource<W>,
        O: StreamSink<W>,
    {
        let span = debug_span!("compute_unit", index = self.index);
        let _enter = span.enter();

        loop {
            match self.invoke(&mut broadcast, &mut split, &mut out) {
                Ok(()) => {}
                Err(Error::StreamClosed) => break,
                Err(e) => return Err(e),
            }
        }
        debug!(invocations = self.invocations, "inputs closed");
        Ok(self.invocations)
    }
}
