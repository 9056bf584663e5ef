//! # xtap - X11 Protocol Tracer
//!
//! xtap watches the byte streams between an X client and its server and
//! logs every request, reply, error and event as one strace-style line.
//! It can interpose a proxy display in front of a freshly spawned client,
//! or attach to a running client through the X RECORD extension.
//!
//! ## Architecture
//!
//! - [`protocol`] - byte-order handling, opcode and extension tables
//! - [`trace`] - the core: stream demultiplexers, per-connection state,
//!   the outstanding-request table and the shared output sink
//! - [`decode`] - per-opcode decoders and the parameter formatter
//! - [`transport`] - the proxy display and the X RECORD channel
//! - [`core`] - CLI, configuration, errors, diagnostic logging
//!
//! ## Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use xtap::trace::{TraceOptions, Tracer};
//! use xtap::trace::connection::TraceMode;
//! use xtap::trace::sink::LogContext;
//!
//! let log = Arc::new(Mutex::new(LogContext::new(Box::new(std::io::stderr()))));
//! let mut tracer = Tracer::new(TraceMode::Full, log, Arc::new(TraceOptions::default()));
//! // feed wire bytes as they arrive:
//! tracer.feed_client_to_server(&[0x6C, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
//! ```

pub mod core;
pub mod decode;
pub mod protocol;
pub mod trace;
pub mod transport;

pub use crate::core::error::{Error, Result};
