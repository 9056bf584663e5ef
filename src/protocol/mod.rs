//! X11 Protocol Fundamentals
//!
//! Byte-order handling, core type aliases and the opcode/extension tables
//! shared by the demultiplexer and the decoder.

pub mod endianness;
pub mod opcodes;
pub mod types;

pub use endianness::ByteOrder;
pub use opcodes::DispatchKey;
pub use types::{PixmapFormat, SequenceNumber, Xid};
