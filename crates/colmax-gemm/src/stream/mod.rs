//! Stream framing.
//!
//! Operands arrive and results leave as streams of 32-bit words. A message
//! is a run of words whose last word carries the end-of-message flag
//! (`tlast`), optionally led by a [`PacketHeader`].
//!
//! ```text
//!  result message for C_b = 4, with header
//!
//!  ┌────────┬──────────┬──────────┬──────────┬──────────┐
//!  │ header │ colMax 0 │ colMax 1 │ colMax 2 │ colMax 3 │
//!  │        │          │          │          │  tlast   │
//!  └────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Operand streams have a fixed length known from the configured dimensions,
//! so [`ingest`] reads exactly that many words and never looks at `tlast`
//! except to warn about a misplaced flag. [`read_message`] is the
//! variable-length counterpart that reads up to the flag.
//!
//! # Example
//!
//! ```rust
//! use std::collections::VecDeque;
//! use colmax_gemm::stream::{emit_frame, ingest, HeaderMode, PacketHeader, Word};
//!
//! let mut wire: VecDeque<Word<i32>> = VecDeque::new();
//! emit_frame(&mut wire, Some(PacketHeader::new(0, 2)), &[4.0f32, 8.0]).unwrap();
//!
//! let mut out = [0.0f32; 2];
//! let header = ingest(&mut wire, HeaderMode::Keep, &mut out).unwrap();
//! assert_eq!(header.map(|h| h.pkt_id), Some(2));
//! assert_eq!(out, [4.0, 8.0]);
//! ```

mod framing;
mod header;
mod io;
mod word;

pub use framing::{emit_frame, ingest, read_message, write_message, HeaderMode};
pub use header::{PacketHeader, MAX_PACKET_ID};
pub use io::{StreamSink, StreamSource};
pub use word::{Message, Word};
