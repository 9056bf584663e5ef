//! X RECORD Attach Channel
//!
//! Opens a control connection to the real server, negotiates the RECORD
//! extension, creates a recording context covering the target client's
//! requests, replies, events and errors, and feeds every intercepted
//! data record into an attached-mode [`Tracer`]. The control channel
//! speaks big-endian X11 of its own, independent of the traced client's
//! byte order, which arrives per data record in the reply headers.

use std::sync::{Arc, Mutex};

use byteorder::{BigEndian, ByteOrder as _};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use super::{ByteStream, DisplayAddr};
use crate::core::error::{Error, Result};
use crate::decode::params::Emitter;
use crate::decode::{decode_error, decode_event};
use crate::protocol::ByteOrder;
use crate::trace::connection::{ConnectionState, TraceMode};
use crate::trace::sink::LogContext;
use crate::trace::{TraceOptions, Tracer};

const OPCODE_QUERY_EXTENSION: u8 = 98;

const RECORD_QUERY_VERSION: u8 = 0;
const RECORD_CREATE_CONTEXT: u8 = 1;
const RECORD_GET_CONTEXT: u8 = 4;
const RECORD_ENABLE_CONTEXT: u8 = 5;

/// Categories in RecordEnableContext replies.
const RECORD_FROM_SERVER: u8 = 0;
const RECORD_FROM_CLIENT: u8 = 1;
const RECORD_CLIENT_DIED: u8 = 3;
const RECORD_START_OF_DATA: u8 = 4;

/// The control connection.
pub struct RecordChannel {
    stream: Box<dyn ByteStream>,
    /// Resource ids we may allocate on this connection
    rid_base: u32,
    rid_mask: u32,
    record_opcode: u8,
}

impl RecordChannel {
    /// Connect and complete the X setup handshake (no authorisation data;
    /// the server is expected to accept local connections).
    pub async fn connect(display: &DisplayAddr) -> Result<Self> {
        let mut stream = display.connect().await?;

        let setup = [0x42u8, 0, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0];
        stream.write_all(&setup).await?;

        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await?;
        let words = BigEndian::read_u16(&header[6..8]) as usize;
        let mut payload = vec![0u8; words * 4];
        stream.read_exact(&mut payload).await?;
        if header[0] != 1 {
            let len = (header[1] as usize).min(payload.len());
            return Err(Error::Transport(format!(
                "X server denied authorisation (\"{}\")",
                String::from_utf8_lossy(&payload[..len])
            )));
        }
        if payload.len() < 12 {
            return Err(Error::Transport("short setup reply".to_string()));
        }
        let rid_base = BigEndian::read_u32(&payload[4..8]);
        let rid_mask = BigEndian::read_u32(&payload[8..12]);
        debug!(rid_base, rid_mask, "record control channel established");

        Ok(Self {
            stream,
            rid_base,
            rid_mask,
            record_opcode: 0,
        })
    }

    /// A context id that cannot clash with other allocations from this
    /// connection, whatever the mask.
    fn context_id(&self) -> u32 {
        self.rid_base | (self.rid_mask & 0x3333_3333)
    }

    /// Read one reply/error/event unit, replies with their extension.
    async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut packet = vec![0u8; 32];
        self.stream.read_exact(&mut packet).await?;
        if packet[0] == 1 {
            let extra = BigEndian::read_u32(&packet[4..8]) as usize;
            packet.resize(32 + extra * 4, 0);
            self.stream.read_exact(&mut packet[32..]).await?;
        }
        Ok(packet)
    }

    /// Read until a reply or error appears, discarding events.
    async fn read_reply(&mut self, what: &str) -> Result<Vec<u8>> {
        loop {
            let packet = self.read_response().await?;
            match packet[0] {
                0 => {
                    let conn = ConnectionState::new(TraceMode::Attached);
                    let mut em = Emitter::new(&packet, ByteOrder::BigEndian, 0);
                    decode_error(&mut em, &conn);
                    return Err(Error::Transport(format!(
                        "X server returned {} to {}",
                        em.finish(),
                        what
                    )));
                }
                1 => return Ok(packet),
                _ => {
                    let conn = ConnectionState::new(TraceMode::Attached);
                    let mut em = Emitter::new(&packet, ByteOrder::BigEndian, 0);
                    decode_event(&mut em, &conn, 0);
                    debug!("ignoring event on control channel: {}", em.finish());
                }
            }
        }
    }

    /// Check the RECORD extension is present and remember its opcode.
    pub async fn negotiate(&mut self) -> Result<()> {
        let mut query = vec![OPCODE_QUERY_EXTENSION, 0, 0, 4];
        query.extend_from_slice(&[0, 6, 0, 0]);
        query.extend_from_slice(b"RECORD\0\0");
        self.stream.write_all(&query).await?;
        let reply = self.read_reply("QueryExtension").await?;
        if reply[8] != 1 {
            return Err(Error::Transport(
                "X server does not support the X RECORD extension".to_string(),
            ));
        }
        self.record_opcode = reply[9];

        let mut version = vec![self.record_opcode, RECORD_QUERY_VERSION, 0, 2];
        version.extend_from_slice(&[0, 1, 0, 13]); // client version 1.13
        self.stream.write_all(&version).await?;
        let reply = self.read_reply("RecordQueryVersion").await?;
        debug!(
            major = BigEndian::read_u16(&reply[8..10]),
            minor = BigEndian::read_u16(&reply[10..12]),
            "RECORD version negotiated"
        );
        Ok(())
    }

    /// Create a context recording everything the target client does:
    /// all core and extension requests and replies, all delivered events,
    /// all errors, plus client-died notification.
    async fn create_context(&mut self, client_id: u32) -> Result<()> {
        let mut req = vec![self.record_opcode, RECORD_CREATE_CONTEXT, 0, 12];
        req.extend_from_slice(&self.context_id().to_be_bytes());
        req.extend_from_slice(&[0, 0, 0, 0]); // element header, padding
        req.extend_from_slice(&1u32.to_be_bytes()); // one client id
        req.extend_from_slice(&1u32.to_be_bytes()); // one record range
        req.extend_from_slice(&client_id.to_be_bytes());
        // RECORDRANGE
        req.extend_from_slice(&[0, 127]); // core requests
        req.extend_from_slice(&[0, 127]); // core replies
        req.extend_from_slice(&[128, 255, 0, 0, 255, 255]); // ext requests
        req.extend_from_slice(&[128, 255, 0, 0, 255, 255]); // ext replies
        req.extend_from_slice(&[2, 255]); // delivered events
        req.extend_from_slice(&[0, 0]); // no device events
        req.extend_from_slice(&[0, 255]); // errors
        req.push(0); // client-started
        req.push(1); // client-died
        debug_assert_eq!(req.len(), 48);
        self.stream.write_all(&req).await?;
        Ok(())
    }

    /// Ask the server for the canonical id of the attached client.
    async fn query_client_id(&mut self) -> Result<Option<u32>> {
        let mut req = vec![self.record_opcode, RECORD_GET_CONTEXT, 0, 2];
        req.extend_from_slice(&self.context_id().to_be_bytes());
        self.stream.write_all(&req).await?;
        let reply = self.read_reply("RecordGetContext").await?;
        Ok(if reply.len() >= 36 {
            Some(BigEndian::read_u32(&reply[32..36]))
        } else {
            None
        })
    }

    /// Record the client with the given resource id until it exits,
    /// feeding everything through an attached-mode tracer.
    pub async fn run(
        mut self,
        client_id: u32,
        log: Arc<Mutex<LogContext>>,
        options: Arc<TraceOptions>,
        want_client_ids: bool,
    ) -> Result<()> {
        self.create_context(client_id).await?;

        let mut tracer = Tracer::new(TraceMode::Attached, log, options);
        if want_client_ids {
            if let Some(id) = self.query_client_id().await? {
                tracer.set_client_id(id);
            }
        }

        let mut enable = vec![self.record_opcode, RECORD_ENABLE_CONTEXT, 0, 2];
        enable.extend_from_slice(&self.context_id().to_be_bytes());
        self.stream.write_all(&enable).await?;

        info!(client = %format_args!("{:08x}", client_id), "recording started");
        loop {
            let packet = self.read_reply("RecordEnableContext").await?;
            let category = packet[1];
            match category {
                RECORD_START_OF_DATA => {}
                RECORD_FROM_CLIENT => {
                    let order = if packet[9] != 0 {
                        ByteOrder::LittleEndian
                    } else {
                        ByteOrder::BigEndian
                    };
                    tracer.set_byte_order(order);
                    tracer.set_next_sequence(BigEndian::read_u32(&packet[20..24]));
                    tracer.feed_client_to_server(&packet[32..]);
                }
                RECORD_FROM_SERVER => {
                    let order = if packet[9] != 0 {
                        ByteOrder::LittleEndian
                    } else {
                        ByteOrder::BigEndian
                    };
                    tracer.set_byte_order(order);
                    tracer.feed_server_to_client(&packet[32..]);
                }
                RECORD_CLIENT_DIED => {
                    info!("traced client exited");
                    tracer.close();
                    return Ok(());
                }
                other => {
                    debug!("unexpected record category {}", other);
                }
            }
        }
    }
}
