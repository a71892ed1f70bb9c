//! Element and wire type definitions.
//!
//! The kernels in this crate are generic over two kinds of scalar:
//!
//! - An **element** type ([`Element`]) that the block MAC computes in.
//! - A **wire** type ([`WireWord`]) that travels on the operand and result
//!   streams, one 32-bit word per element.
//!
//! [`WireCodec`] ties the two together with a straight numeric cast, so an
//! `i32` stream can feed an `f32` kernel and the column maxima can be written
//! back as `i32` words.
//!
//! | Element | Zero | Sentinel | Accumulate |
//! |---------|------|----------|------------|
//! | `f32` | 0.0 | -∞ | `acc + a * b` |
//! | `f64` | 0.0 | -∞ | `acc + a * b` |
//! | `i32` | 0 | `i32::MIN` | wrapping `acc + a * b` |
//! | `i64` | 0 | `i64::MIN` | wrapping `acc + a * b` |
//!
//! # Example
//!
//! ```rust
//! use colmax_gemm::types::{Element, WireCodec};
//!
//! let acc = f32::mac(1.0, 2.0, 3.0);
//! assert_eq!(acc, 7.0);
//!
//! let x: f32 = WireCodec::<i32>::from_wire(-4);
//! assert_eq!(x, -4.0);
//! assert_eq!(WireCodec::<i32>::to_wire(7.9f32), 7);
//! ```

mod element;
mod wire;

pub use element::Element;
pub use wire::{WireCodec, WireWord};
