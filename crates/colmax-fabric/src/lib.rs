//! Broadcast/split distribution of the column-max kernel.
//!
//! N identical compute units run side by side. One operand stream is
//! replicated to all of them (broadcast); the other is partitioned by whole
//! messages (split). Every unit writes its own result stream.
//!
//! ```text
//!   A producer ──► Broadcast ──┬──────────┬──────────┐
//!                              ▼          ▼          ▼
//!   B producer ──► Split ───► unit 0 ─┐  unit 1 ─┐  unit N-1 ─┐
//!                    │                │    ▲     │    ▲       │
//!                    └────────────────┼────┘     │    │       │
//!                                     ▼          ▼            ▼
//!                                  results 0  results 1   results N-1
//! ```
//!
//! Units share no state and never talk to each other. All channels are
//! bounded and blocking, so a slow unit stalls its producers rather than
//! losing words.
//!
//! Which operand is split is a [`SplitOperand`]. With the default
//! [`SplitOperand::Reference`] each unit owns a column range of the result;
//! with [`SplitOperand::Query`] every unit covers all columns and a
//! consumer merges shards by element-wise max.
//!
//! # Example
//!
//! ```
//! use colmax_fabric::{Topology, TopologyConfig};
//! use colmax_gemm::core::{Dims, Mmul};
//! use colmax_gemm::stream::{Message, PacketHeader};
//!
//! type Shape = Mmul<1, 1, 1>;
//!
//! let cfg = TopologyConfig::new().with_instances(2).with_dims(Dims::product(2, 1, 1));
//! let topo = Topology::<i32>::spawn::<f32, Shape>(cfg).unwrap();
//!
//! // A = [1; 3] broadcast, B shards [2] and [-1]
//! let a = vec![Message::from_elements(None, &[1.0f32, 3.0])];
//! let b = vec![
//!     Message::from_elements(Some(PacketHeader::new(0, 0)), &[2.0f32]),
//!     Message::from_elements(Some(PacketHeader::new(0, 1)), &[-1.0f32]),
//! ];
//! let results = topo.run_batch(&a, &b).unwrap();
//! assert_eq!(results[0][0].payload, vec![6]);
//! assert_eq!(results[1][0].payload, vec![-1]);
//! ```

mod broadcast;
mod channel;
mod collect;
mod error;
mod split;
mod topology;
mod unit;

pub use broadcast::Broadcast;
pub use channel::{stream_channel, ChannelSink, ChannelSource};
pub use collect::{collect_shard, ShardResult};
pub use error::{FabricError, Result};
pub use split::{RoutePolicy, Split};
pub use topology::{ShardResults, Topology, TopologyConfig};
pub use unit::{ComputeUnit, SplitOperand};
