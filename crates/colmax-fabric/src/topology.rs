//! Spawning and driving a set of compute units.

use std::thread::{self, JoinHandle, ScopedJoinHandle};

use tracing::{info, warn};

use colmax_gemm::core::{BlockGrid, BlockMac, Dims, LoopOrder};
use colmax_gemm::settings::{default_dims, DEFAULT_INSTANCES};
use colmax_gemm::stream::{write_message, HeaderMode, Message, MAX_PACKET_ID};
use colmax_gemm::types::{WireCodec, WireWord};

use crate::broadcast::Broadcast;
use crate::channel::{stream_channel, ChannelSource};
use crate::collect::{collect_shard, ShardResult};
use crate::error::{FabricError, Result};
use crate::split::{RoutePolicy, Split};
use crate::unit::{ComputeUnit, SplitOperand};

/// Results of a run, indexed by shard then invocation.
pub type ShardResults<W> = Vec<Vec<ShardResult<W>>>;

/// Shape of a topology.
///
/// The default matches the reference deployment: six units, round-robin
/// split of headed B shards whose header is dropped unread, A broadcast
/// without a header.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyConfig {
    pub instances: usize,
    /// Words buffered per channel.
    pub capacity: usize,
    pub route: RoutePolicy,
    pub split_operand: SplitOperand,
    pub split_header: HeaderMode,
    pub broadcast_header: HeaderMode,
    pub loop_order: LoopOrder,
    /// Per-unit problem size.
    pub dims: Dims,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            instances: DEFAULT_INSTANCES,
            capacity: 1024,
            route: RoutePolicy::RoundRobin,
            split_operand: SplitOperand::Reference,
            split_header: HeaderMode::Discard,
            broadcast_header: HeaderMode::None,
            loop_order: LoopOrder::RowBlocksOuter,
            dims: default_dims(),
        }
    }
}

impl TopologyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(mut self, instances: usize) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_route(mut self, route: RoutePolicy) -> Self {
        self.route = route;
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

    pub fn with_loop_order(mut self, order: LoopOrder) -> Self {
        self.loop_order = order;
        self
    }

    pub fn with_dims(mut self, dims: Dims) -> Self {
        self.dims = dims;
        self
    }

    /// Payload words of one split message.
    pub fn split_len(&self) -> usize {
        match self.split_operand {
            SplitOperand::Reference => self.dims.b_len(),
            SplitOperand::Query => self.dims.a_len(),
        }
    }

    /// Payload words of one broadcast message.
    pub fn broadcast_len(&self) -> usize {
        match self.split_operand {
            SplitOperand::Reference => self.dims.a_len(),
            SplitOperand::Query => self.dims.b_len(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.instances == 0 {
            return Err(FabricError::Config("at least one instance is required".into()));
        }
        if self.instances > MAX_PACKET_ID as usize + 1 {
            return Err(FabricError::Config(format!(
                "{} instances exceed the {} addressable by a packet id",
                self.instances,
                MAX_PACKET_ID as usize + 1
            )));
        }
        if self.capacity == 0 {
            return Err(FabricError::Config("channel capacity must be non-zero".into()));
        }
        if self.route == RoutePolicy::PacketId && self.split_header == HeaderMode::None {
            return Err(FabricError::Config(
                "packet-id routing needs headed split messages".into(),
            ));
        }
        Ok(())
    }
}

/// Running compute units with their input and output streams.
///
/// ```text
///                     ┌──────────┐
///  broadcast ──┬────► │  unit 0  │ ──► outputs[0]
///              │  ┌─► └──────────┘
///              │  │   ┌──────────┐
///              ├──┼─► │  unit 1  │ ──► outputs[1]
///              │  ├─► └──────────┘
///              :  :        :
///  split ──────┴──┘  (one message to one unit)
/// ```
pub struct Topology<W: WireWord> {
    config: TopologyConfig,
    broadcast: Broadcast<W>,
    split: Split<W>,
    outputs: Vec<ChannelSource<W>>,
    handles: Vec<JoinHandle<colmax_gemm::Result<usize>>>,
}

impl<W: WireWord> Topology<W> {
    /// Start one named thread per unit, computing in `T` with block shape `S`.
    pub fn spawn<T, S>(config: TopologyConfig) -> Result<Self>
    where
        T: WireCodec<W>,
        S: BlockMac<T>,
    {
        config.validate()?;
        let grid = BlockGrid::<S>::new(config.dims)?;

        let n = config.instances;
        let mut bcast_sinks = Vec::with_capacity(n);
        let mut split_sinks = Vec::with_capacity(n);
        let mut outputs = Vec::with_capacity(n);
        let mut handles = Vec::with_capacity(n);

        for index in 0..n {
            let (btx, brx) = stream_channel(config.capacity);
            let (stx, srx) = stream_channel(config.capacity);
            let (otx, orx) = stream_channel(config.capacity);

            let unit = ComputeUnit::<T, S>::new(index, grid)
                .with_loop_order(config.loop_order)
                .with_split_operand(config.split_operand)
                .with_headers(config.split_header, config.broadcast_header);

            let handle = thread::Builder::new()
                .name(format!("colmax-unit-{}", index))
                .spawn(move || unit.run(brx, srx, otx))
                .map_err(|source| FabricError::Spawn { index, source })?;

            bcast_sinks.push(btx);
            split_sinks.push(stx);
            outputs.push(orx);
            handles.push(handle);
        }

        info!(
            instances = n,
            capacity = config.capacity,
            split = ?config.split_operand,
            route = ?config.route,
            "topology spawned"
        );

        Ok(Self {
            broadcast: Broadcast::new(bcast_sinks),
            split: Split::new(split_sinks, config.route),
            config,
            outputs,
            handles,
        })
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Stream replicated to every unit.
    pub fn broadcast_input(&mut self) -> &mut Broadcast<W> {
        &mut self.broadcast
    }

    /// Stream partitioned across units by message.
    pub fn split_input(&mut self) -> &mut Split<W> {
        &mut self.split
    }

    /// Per-unit result streams, indexed by unit.
    pub fn outputs_mut(&mut self) -> &mut [ChannelSource<W>] {
        &mut self.outputs
    }

    /// Close both inputs, drain every result stream and join the units.
    ///
    /// Suitable when everything fed so far fits in the channel buffers; use
    /// [`run_batch`](Self::run_batch) to feed and collect concurrently.
    pub fn finish(self) -> Result<ShardResults<W>> {
        let Topology {
            broadcast,
            split,
            mut outputs,
            handles,
            ..
        } = self;
        drop(broadcast);
        drop(split);

        let collected: Vec<Result<Vec<ShardResult<W>>>> = outputs
            .iter_mut()
            .enumerate()
            .map(|(i, out)| collect_shard(i, out, true).map_err(FabricError::from))
            .collect();
        join_units(handles)?;
        let results: ShardResults<W> = collected.into_iter().collect::<Result<_>>()?;
        info!(instances = results.len(), "topology shut down");
        Ok(results)
    }

    /// Feed `broadcast` and `split` messages from their own threads while
    /// collecting every unit's results, then shut down.
    ///
    /// Each unit runs one invocation per split message it receives and
    /// consumes one broadcast message per invocation, so a balanced batch
    /// has `instances` split messages per broadcast message. Every unit gets
    /// its own broadcast feeder, so a unit waiting on its split share never
    /// holds back the broadcast to the others.
    pub fn run_batch(self, broadcast: &[Message<W>], split: &[Message<W>]) -> Result<ShardResults<W>> {
        let Topology {
            config,
            broadcast: bcast_in,
            split: mut split_in,
            outputs,
            handles,
        } = self;
        let instances = config.instances;
        if split.len() != broadcast.len() * instances {
            warn!(
                broadcast = broadcast.len(),
                split = split.len(),
                instances,
                "unbalanced batch"
            );
        }

        let (fed_bcast, fed_split, collected) = thread::scope(|s| {
            let bfeeds: Vec<_> = bcast_in
                .into_outputs()
                .into_iter()
                .map(|mut sink| {
                    s.spawn(move || -> colmax_gemm::Result<()> {
                        for msg in broadcast {
                            write_message(&mut sink, msg)?;
                        }
                        Ok(())
                    })
                })
                .collect();
            let sfeed = s.spawn(move || -> Result<()> {
                for msg in split {
                    if let Err(e) = write_message(&mut split_in, msg) {
                        return Err(match split_in.unroutable() {
                            Some(id) => FabricError::Unroutable { id, instances },
                            None => e.into(),
                        });
                    }
                }
                Ok(())
            });
            let collectors: Vec<_> = outputs
                .into_iter()
                .enumerate()
                .map(|(i, mut out)| s.spawn(move || collect_shard(i, &mut out, true)))
                .collect();

            let fed_bcast: Vec<Result<()>> = bfeeds
                .into_iter()
                .map(|h| join_scoped(h, "broadcast feeder").and_then(|r| r.map_err(FabricError::from)))
                .collect();
            let fed_split = join_scoped(sfeed, "split feeder").and_then(|r| r);
            let collected: Vec<Result<Vec<ShardResult<W>>>> = collectors
                .into_iter()
                .map(|h| join_scoped(h, "collector").and_then(|r| r.map_err(FabricError::from)))
                .collect();
            (fed_bcast, fed_split, collected)
        });
        let units = join_units(handles);

        // A failed unit closes its inputs, so feeder errors are usually its
        // echo; report the unit first.
        units?;
        fed_split?;
        fed_bcast.into_iter().collect::<Result<()>>()?;
        let results: ShardResults<W> = collected.into_iter().collect::<Result<_>>()?;
        info!(instances = results.len(), "batch complete");
        Ok(results)
    }
}

fn join_scoped<T>(handle: ScopedJoinHandle<'_, T>, what: &str) -> Result<T> {
    handle.join().map_err(|_| FabricError::Panicked(what.to_string()))
}

/// Join every unit, returning per-unit invocation counts or the first error.
fn join_units(handles: Vec<JoinHandle<colmax_gemm::Result<usize>>>) -> Result<Vec<usize>> {
    let mut counts = Vec::with_capacity(handles.len());
    let mut first_err = None;
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(n)) => counts.push(n),
            Ok(Err(e)) => {
                first_err.get_or_insert(FabricError::Stream(e));
            }
            Err(_) => {
                first_err.get_or_insert(FabricError::Panicked(format!("compute unit {}", i)));
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(counts),
    }
}
