//! rbridge-core - Register bridge protocol core
//!
//! This crate implements the wire-level pieces of the register bridge
//! protocol: a tiny text command language through which microcontroller
//! firmware exposes memory-mapped peripheral registers to a host.
//!
//! The crate is pure and does no I/O. It provides:
//!
//! - [`frame`] - reassembly of the raw byte stream into
//!   terminator-delimited response frames
//! - [`codec`] - encoding of register operations into wire commands and
//!   decoding of pipe-delimited hex responses
//! - [`batch`] - an ordered builder that compiles multiple operations
//!   into a single wire transaction and projects the marked results
//!
//! Transport handling and the request/response correlator live in
//! `rbridge-serial`.
//!
//! # Example
//!
//! ```
//! use rbridge_core::batch::Batch;
//! use rbridge_core::codec::Width;
//! use rbridge_core::frame::Framing;
//!
//! # fn main() -> rbridge_core::Result<()> {
//! let mut batch = Batch::new(Framing::CrLf);
//! batch
//!     .write(0x4000_5400, 0x101, Width::Default)?
//!     .read(0x4000_5404, Width::Default)?
//!     .mark_result();
//! assert_eq!(batch.serialize()?, "w 40005400 101|r 40005404\n");
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod codec;
pub mod error;
pub mod frame;

pub use batch::{Batch, BatchResult, MAX_BATCH_OPS};
pub use codec::{Operation, Width};
pub use error::{CoreError, Result};
pub use frame::{Frame, FrameAssembler, Framing};
