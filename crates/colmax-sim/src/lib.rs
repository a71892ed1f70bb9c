//! Offline harness for the column-max fabric.
//!
//! Mirrors the hardware verification flow: generate seeded test vectors in
//! the simulator's text formats, compute golden results with the naive
//! reference, run the vectors through a [`Topology`](colmax_fabric::Topology),
//! write outputs the way the simulator logs them, and compare line by line.
//!
//! ```text
//!  gen ──► broadcast.txt, split.seq ──┬──► golden ──► golden<i>.txt ──┐
//!                                     └──► run ─────► output<i>.txt ──┴──► verify
//! ```

pub mod datagen;
pub mod golden;
pub mod runner;
pub mod seqfile;

mod error;

pub use datagen::{DataGen, TestVectors};
pub use error::{Result, SimError};
pub use golden::{compare, golden_words, Verdict};
