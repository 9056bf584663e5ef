//! Stream Demultiplexers
//!
//! One resumable framer per direction. The caller feeds byte slices in
//! arrival order; each feed consumes what it can, emits zero or more
//! complete packets, and suspends with the partial tail buffered. The
//! original's coroutine suspension points become explicit states whose
//! transitions fire once enough bytes have accumulated.

use bytes::{Buf, BytesMut};
use thiserror::Error;

use crate::protocol::ByteOrder;
use crate::protocol::types::{SETUP_AUTHENTICATE, SETUP_FAILED, SETUP_SUCCESS};

/// Fatal framing conditions. Any of these poisons decoding for the
/// connection that produced them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("initial endianness byte (0x{0:02X}) unrecognised")]
    BadEndianness(u8),
    #[error("major protocol version (0x{0:04X}) unrecognised")]
    BadMajorVersion(u16),
    #[error("minor protocol version (0x{0:04X}) unrecognised")]
    BadMinorVersion(u16),
    #[error("server reply received before client sent endianness")]
    ReplyBeforeEndianness,
    #[error("server refused authorisation, reason \"{0}\"")]
    AuthRefused(String),
    #[error("server sent incomplete-authorisation packet, which is unsupported")]
    AuthIncomplete,
    #[error("server sent unrecognised authorisation-time opcode {0}")]
    BadAuthOpcode(u8),
    #[error("server's init message was far too short")]
    SetupTooShort,
}

/// A framed unit from the client stream.
#[derive(Debug, PartialEq, Eq)]
pub enum ClientPacket {
    /// The setup prefix fixed the connection byte order
    Endianness(ByteOrder),
    /// One complete request. For BIG-REQUESTS the inserted length word
    /// has been spliced out, so the decoder sees a zero length field and
    /// sizes the packet by its slice length.
    Request(Vec<u8>),
}

/// A framed unit from the server stream.
#[derive(Debug, PartialEq, Eq)]
pub enum ServerPacket {
    /// Accepted setup message, including its 8-byte header
    Setup(Vec<u8>),
    /// A reply, error or event: 32 bytes plus any reply extension
    Response(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientPhase {
    SetupPrefix,
    SkipAuth(usize),
    RequestHeader,
    BigRequestLength,
    RequestBody { total: usize, big: bool },
}

/// Client-to-server framer.
#[derive(Debug)]
pub struct ClientDemux {
    buf: BytesMut,
    phase: ClientPhase,
    order: Option<ByteOrder>,
}

impl ClientDemux {
    /// A framer expecting the full handshake.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            phase: ClientPhase::SetupPrefix,
            order: None,
        }
    }

    /// A framer joining mid-stream (X RECORD): no setup, byte order
    /// supplied by the record transport.
    pub fn attached(order: ByteOrder) -> Self {
        Self {
            buf: BytesMut::new(),
            phase: ClientPhase::RequestHeader,
            order: Some(order),
        }
    }

    /// Byte order, once the setup prefix has been seen.
    pub fn order(&self) -> Option<ByteOrder> {
        self.order
    }

    /// Byte order override for attached framers, where the record
    /// transport learns it from data-record headers.
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = Some(order);
    }

    /// Consume a slice of the client stream, appending completed packets
    /// to `out`.
    pub fn feed(&mut self, data: &[u8], out: &mut Vec<ClientPacket>) -> Result<(), FramingError> {
        self.buf.extend_from_slice(data);
        loop {
            match self.phase {
                ClientPhase::SetupPrefix => {
                    if self.buf.len() < 12 {
                        return Ok(());
                    }
                    let marker = self.buf[0];
                    let order =
                        ByteOrder::from_marker(marker).ok_or(FramingError::BadEndianness(marker))?;
                    let major = order.u16_at(&self.buf, 2).unwrap_or(0);
                    if major != 11 {
                        return Err(FramingError::BadMajorVersion(major));
                    }
                    let minor = order.u16_at(&self.buf, 4).unwrap_or(0);
                    if minor != 0 {
                        return Err(FramingError::BadMinorVersion(minor));
                    }
                    let name_len = order.u16_at(&self.buf, 6).unwrap_or(0) as usize;
                    let data_len = order.u16_at(&self.buf, 8).unwrap_or(0) as usize;
                    self.buf.advance(12);
                    self.order = Some(order);
                    out.push(ClientPacket::Endianness(order));
                    self.phase = ClientPhase::SkipAuth(pad4(name_len) + pad4(data_len));
                }
                ClientPhase::SkipAuth(n) => {
                    if self.buf.len() < n {
                        return Ok(());
                    }
                    self.buf.advance(n);
                    self.phase = ClientPhase::RequestHeader;
                }
                ClientPhase::RequestHeader => {
                    if self.buf.len() < 4 {
                        return Ok(());
                    }
                    let order = self.order.expect("order fixed before requests");
                    let words = order.u16_at(&self.buf, 2).unwrap_or(0) as usize;
                    if words == 0 {
                        self.phase = ClientPhase::BigRequestLength;
                    } else {
                        self.phase = ClientPhase::RequestBody {
                            total: words * 4,
                            big: false,
                        };
                    }
                }
                ClientPhase::BigRequestLength => {
                    if self.buf.len() < 8 {
                        return Ok(());
                    }
                    let order = self.order.expect("order fixed before requests");
                    let words = order.u32_at(&self.buf, 4).unwrap_or(0) as usize;
                    self.phase = ClientPhase::RequestBody {
                        total: (words * 4).max(8),
                        big: true,
                    };
                }
                ClientPhase::RequestBody { total, big } => {
                    if self.buf.len() < total {
                        return Ok(());
                    }
                    let packet = if big {
                        // splice out the inserted 32-bit length word so
                        // the decoder sees an ordinary header
                        let mut packet = Vec::with_capacity(total - 4);
                        packet.extend_from_slice(&self.buf[..4]);
                        packet.extend_from_slice(&self.buf[8..total]);
                        packet
                    } else {
                        self.buf[..total].to_vec()
                    };
                    self.buf.advance(total);
                    out.push(ClientPacket::Request(packet));
                    self.phase = ClientPhase::RequestHeader;
                }
            }
        }
    }
}

impl Default for ClientDemux {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerPhase {
    SetupHeader,
    SetupBody { total: usize },
    ResponseHeader,
    ReplyBody { total: usize },
}

/// Server-to-client framer. It does not own the byte order; the caller
/// passes the connection's current order to each feed, since the client
/// stream is what establishes it.
#[derive(Debug)]
pub struct ServerDemux {
    buf: BytesMut,
    phase: ServerPhase,
}

impl ServerDemux {
    /// A framer expecting the setup exchange.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            phase: ServerPhase::SetupHeader,
        }
    }

    /// A framer joining mid-stream (X RECORD).
    pub fn attached() -> Self {
        Self {
            buf: BytesMut::new(),
            phase: ServerPhase::ResponseHeader,
        }
    }

    /// Consume a slice of the server stream, appending completed packets
    /// to `out`.
    pub fn feed(
        &mut self,
        order: Option<ByteOrder>,
        data: &[u8],
        out: &mut Vec<ServerPacket>,
    ) -> Result<(), FramingError> {
        self.buf.extend_from_slice(data);
        loop {
            match self.phase {
                ServerPhase::SetupHeader => {
                    if self.buf.len() < 8 {
                        return Ok(());
                    }
                    let order = order.ok_or(FramingError::ReplyBeforeEndianness)?;
                    let words = order.u16_at(&self.buf, 6).unwrap_or(0) as usize;
                    self.phase = ServerPhase::SetupBody {
                        total: 8 + words * 4,
                    };
                }
                ServerPhase::SetupBody { total } => {
                    if self.buf.len() < total {
                        return Ok(());
                    }
                    match self.buf[0] {
                        SETUP_FAILED => {
                            let len = (self.buf[1] as usize).min(total.saturating_sub(8));
                            let reason =
                                String::from_utf8_lossy(&self.buf[8..8 + len]).into_owned();
                            return Err(FramingError::AuthRefused(reason));
                        }
                        SETUP_AUTHENTICATE => return Err(FramingError::AuthIncomplete),
                        SETUP_SUCCESS => {}
                        other => return Err(FramingError::BadAuthOpcode(other)),
                    }
                    if total < 16 {
                        return Err(FramingError::SetupTooShort);
                    }
                    let packet = self.buf[..total].to_vec();
                    self.buf.advance(total);
                    out.push(ServerPacket::Setup(packet));
                    self.phase = ServerPhase::ResponseHeader;
                }
                ServerPhase::ResponseHeader => {
                    if self.buf.len() < 32 {
                        return Ok(());
                    }
                    if self.buf[0] == 1 {
                        let order = order.ok_or(FramingError::ReplyBeforeEndianness)?;
                        let extra = order.u32_at(&self.buf, 4).unwrap_or(0) as usize;
                        self.phase = ServerPhase::ReplyBody {
                            total: 32 + extra * 4,
                        };
                    } else {
                        let packet = self.buf[..32].to_vec();
                        self.buf.advance(32);
                        out.push(ServerPacket::Response(packet));
                    }
                }
                ServerPhase::ReplyBody { total } => {
                    if self.buf.len() < total {
                        return Ok(());
                    }
                    let packet = self.buf[..total].to_vec();
                    self.buf.advance(total);
                    out.push(ServerPacket::Response(packet));
                    self.phase = ServerPhase::ResponseHeader;
                }
            }
        }
    }
}

impl Default for ServerDemux {
    fn default() -> Self {
        Self::new()
    }
}

fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_prefix_le() -> Vec<u8> {
        vec![0x6C, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    }

    #[test]
    fn test_client_setup_then_request() {
        let mut demux = ClientDemux::new();
        let mut out = Vec::new();
        let mut stream = setup_prefix_le();
        stream.extend_from_slice(&[8, 0, 1, 0]); // MapWindow-sized request
        demux.feed(&stream, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], ClientPacket::Endianness(ByteOrder::LittleEndian));
        assert_eq!(out[1], ClientPacket::Request(vec![8, 0, 1, 0]));
    }

    #[test]
    fn test_client_byte_at_a_time() {
        let mut demux = ClientDemux::new();
        let mut out = Vec::new();
        let mut stream = setup_prefix_le();
        stream.extend_from_slice(&[16, 1, 3, 0, 4, 0, 0, 0, b'W', b'M', b'_', b'S']);
        for &b in &stream {
            demux.feed(&[b], &mut out).unwrap();
        }
        assert_eq!(out.len(), 2);
        match &out[1] {
            ClientPacket::Request(data) => assert_eq!(data.len(), 12),
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_client_auth_payload_is_skipped() {
        let mut demux = ClientDemux::new();
        let mut out = Vec::new();
        // 5-byte auth name (pads to 8), 2-byte auth data (pads to 4)
        let mut stream = vec![0x6C, 0, 11, 0, 0, 0, 5, 0, 2, 0, 0, 0];
        stream.extend_from_slice(&[0; 12]);
        stream.extend_from_slice(&[127, 0, 1, 0]);
        demux.feed(&stream, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], ClientPacket::Request(vec![127, 0, 1, 0]));
    }

    #[test]
    fn test_client_bad_endianness() {
        let mut demux = ClientDemux::new();
        let mut out = Vec::new();
        let err = demux.feed(&[0x42; 12], &mut out);
        // 0x42 is 'B': valid marker but the version bytes are wrong
        assert_eq!(err, Err(FramingError::BadMajorVersion(0x4242)));
        let mut demux = ClientDemux::new();
        let err = demux.feed(&[0x00; 12], &mut out);
        assert_eq!(err, Err(FramingError::BadEndianness(0)));
    }

    #[test]
    fn test_big_request_splice() {
        let mut demux = ClientDemux::attached(ByteOrder::LittleEndian);
        let mut out = Vec::new();
        // opcode 0x62, zero length word, 32-bit length = 16 words
        let mut stream = vec![0x62, 0x00, 0x00, 0x00];
        stream.extend_from_slice(&16u32.to_le_bytes());
        stream.extend_from_slice(&vec![0xAA; 16 * 4 - 8]);
        demux.feed(&stream, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        match &out[0] {
            ClientPacket::Request(data) => {
                assert_eq!(data.len(), 16 * 4 - 4);
                assert_eq!(&data[..4], &[0x62, 0x00, 0x00, 0x00]);
                assert!(data[4..].iter().all(|&b| b == 0xAA));
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_server_setup_accept_and_response() {
        let mut demux = ServerDemux::new();
        let mut out = Vec::new();
        // 8-byte header with 2 additional words, then a 32-byte event
        let mut stream = vec![1u8, 0, 11, 0, 0, 0, 2, 0];
        stream.extend_from_slice(&[0; 8]);
        let mut event = vec![12u8; 32];
        event[0] = 12;
        stream.extend_from_slice(&event);
        demux
            .feed(Some(ByteOrder::LittleEndian), &stream, &mut out)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], ServerPacket::Setup(d) if d.len() == 16));
        assert!(matches!(&out[1], ServerPacket::Response(d) if d.len() == 32));
    }

    #[test]
    fn test_server_reply_with_extra_words() {
        let mut demux = ServerDemux::attached();
        let mut out = Vec::new();
        let mut reply = vec![0u8; 40];
        reply[0] = 1;
        reply[4..8].copy_from_slice(&2u32.to_le_bytes());
        demux
            .feed(Some(ByteOrder::LittleEndian), &reply, &mut out)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], ServerPacket::Response(d) if d.len() == 40));
    }

    #[test]
    fn test_server_auth_refused() {
        let mut demux = ServerDemux::new();
        let mut out = Vec::new();
        let mut stream = vec![0u8, 2, 11, 0, 0, 0, 1, 0];
        stream.extend_from_slice(b"no\0\0");
        let err = demux.feed(Some(ByteOrder::LittleEndian), &stream, &mut out);
        assert_eq!(err, Err(FramingError::AuthRefused("no".to_string())));
    }
}
