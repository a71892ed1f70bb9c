//! Seeded test-vector generation.
//!
//! Values are integers in `[0, 10)`. Operands are generated row-major and
//! emitted in blocked stream order for the deployed block shape.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use colmax_fabric::{SplitOperand, TopologyConfig};
use colmax_gemm::core::{pack_a, pack_b};
use colmax_gemm::settings::{DefaultShape, PACKET_TYPE};
use colmax_gemm::stream::PacketHeader;

use crate::seqfile::Packet;

/// Inputs for a run: broadcast operands per invocation and the split
/// packets, all in stream order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestVectors {
    /// One broadcast operand per invocation.
    pub broadcast: Vec<Vec<i32>>,
    /// `instances` packets per invocation; packet `i` carries id `i % instances`.
    pub split: Vec<Packet>,
}

pub struct DataGen {
    rng: StdRng,
}

impl DataGen {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Row-major `rows × cols` matrix of values in `[0, 10)`.
    pub fn matrix(&mut self, rows: usize, cols: usize) -> Vec<i32> {
        (0..rows * cols).map(|_| self.rng.gen_range(0..10)).collect()
    }

    fn query(&mut self, config: &TopologyConfig) -> Vec<i32> {
        let d = config.dims;
        pack_a::<DefaultShape, _>(&self.matrix(d.ra, d.ca), d.ra, d.ca)
    }

    fn reference(&mut self, config: &TopologyConfig) -> Vec<i32> {
        let d = config.dims;
        pack_b::<DefaultShape, _>(&self.matrix(d.rb, d.cb), d.rb, d.cb)
    }

    /// Generate `invocations` rounds of input for `config`.
    pub fn generate(&mut self, config: &TopologyConfig, invocations: usize) -> TestVectors {
        let mut broadcast = Vec::with_capacity(invocations);
        let mut split = Vec::with_capacity(invocations * config.instances);

        for _ in 0..invocations {
            let shared = match config.split_operand {
                SplitOperand::Reference => self.query(config),
                SplitOperand::Query => self.reference(config),
            };
            broadcast.push(shared);

            for shard in 0..config.instances {
                let payload = match config.split_operand {
                    SplitOperand::Reference => self.reference(config),
                    SplitOperand::Query => self.query(config),
                };
                split.push(Packet::new(PacketHeader::new(PACKET_TYPE, shard as u8), payload));
            }
        }

        TestVectors { broadcast, split }
    }
}
