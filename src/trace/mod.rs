//! Connection Tracing Core
//!
//! A [`Tracer`] owns everything one X11 session needs: the two stream
//! demultiplexers, the per-connection protocol state, the outstanding
//! request table, and a handle on the shared output sink. The transport
//! layer feeds it raw bytes per direction; it emits strace-style lines.

pub mod connection;
pub mod demux;
pub mod filter;
pub mod requests;
pub mod sink;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::decode::{self, params::Emitter};
use crate::protocol::ByteOrder;
use crate::protocol::types::{EVENT_KEYMAP_NOTIFY, RESPONSE_ERROR, RESPONSE_REPLY};
use connection::{ConnectionState, HandshakePhase, TraceMode};
use demux::{ClientDemux, ClientPacket, ServerDemux, ServerPacket};
use filter::Filters;
use requests::{ReplyExpectation, RequestRecord, RequestTable};
use sink::LogContext;

static NEXT_TRACER_ID: AtomicU64 = AtomicU64::new(1);

/// Knobs shared by every traced connection.
#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    pub filters: Filters,
    /// Approximate cap on one line's length; 0 means unlimited
    pub size_limit: usize,
    /// Log the decoded server setup message
    pub log_server_init: bool,
    /// Also dump raw traffic as hex
    pub raw_hex_dump: bool,
}

/// The per-connection tracing engine.
pub struct Tracer {
    id: u64,
    conn: ConnectionState,
    client: ClientDemux,
    server: ServerDemux,
    table: RequestTable,
    log: Arc<Mutex<LogContext>>,
    options: Arc<TraceOptions>,
    c2s_offset: u64,
    s2c_offset: u64,
}

impl Tracer {
    pub fn new(mode: TraceMode, log: Arc<Mutex<LogContext>>, options: Arc<TraceOptions>) -> Self {
        let (client, server) = match mode {
            TraceMode::Full => (ClientDemux::new(), ServerDemux::new()),
            TraceMode::Attached => (
                ClientDemux::attached(ByteOrder::LittleEndian),
                ServerDemux::attached(),
            ),
        };
        Self {
            id: NEXT_TRACER_ID.fetch_add(1, Ordering::Relaxed),
            conn: ConnectionState::new(mode),
            client,
            server,
            table: RequestTable::new(),
            log,
            options,
            c2s_offset: 0,
            s2c_offset: 0,
        }
    }

    /// Byte order override for attached (X RECORD) tracing, where the
    /// record headers carry it instead of a setup prefix.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.conn.byte_order = Some(order);
        self.client.set_order(order);
    }

    /// Sequence counter override for attached tracing.
    pub fn set_next_sequence(&mut self, seq: u32) {
        self.table.set_next_seq(seq as u16);
    }

    /// Client id override for attached tracing.
    pub fn set_client_id(&mut self, id: u32) {
        self.conn.client_id = Some(id);
    }

    /// Bytes flowing from the traced client towards the server.
    pub fn feed_client_to_server(&mut self, data: &[u8]) {
        if self.options.raw_hex_dump {
            let mut log = self.log.lock().unwrap();
            log.hexdump(self.conn.client_id, data, self.c2s_offset, ">>> ");
            self.c2s_offset += data.len() as u64;
        }
        if self.conn.phase == HandshakePhase::Errored {
            return;
        }
        let mut packets = Vec::new();
        if let Err(e) = self.client.feed(data, &mut packets) {
            self.poison(&e.to_string());
        }
        for packet in packets {
            match packet {
                ClientPacket::Endianness(order) => {
                    self.conn.byte_order = Some(order);
                    self.conn.phase = HandshakePhase::AwaitingSetup;
                }
                ClientPacket::Request(data) => self.handle_request(&data),
            }
        }
    }

    /// Bytes flowing from the server back to the traced client.
    pub fn feed_server_to_client(&mut self, data: &[u8]) {
        if self.options.raw_hex_dump {
            let mut log = self.log.lock().unwrap();
            log.hexdump(self.conn.client_id, data, self.s2c_offset, "<<< ");
            self.s2c_offset += data.len() as u64;
        }
        if self.conn.phase == HandshakePhase::Errored {
            return;
        }
        let mut packets = Vec::new();
        if let Err(e) = self.server.feed(self.conn.byte_order, data, &mut packets) {
            self.poison(&e.to_string());
        }
        for packet in packets {
            match packet {
                ServerPacket::Setup(data) => self.handle_setup(&data),
                ServerPacket::Response(data) => self.handle_response(&data),
            }
        }
    }

    /// The transport dropped the connection. Partial packets are
    /// discarded silently.
    pub fn close(self) {
        debug!(
            tracer = self.id,
            outstanding = self.table.len(),
            "connection closed"
        );
    }

    fn poison(&mut self, message: &str) {
        let mut log = self.log.lock().unwrap();
        log.protocol_error(self.conn.client_id, message);
        self.conn.phase = HandshakePhase::Errored;
    }

    fn handle_request(&mut self, data: &[u8]) {
        let opcode = data[0];
        let minor = data.get(1).copied().unwrap_or(0);
        let mut rec = RequestRecord::new(self.conn.request_key(opcode, minor));
        let mut em = Emitter::new(data, self.conn.order(), self.options.size_limit);
        decode::decode_request(&mut em, &mut self.conn, &self.options.filters, &mut rec);
        rec.text = em.finish();
        let rec = self.table.push(rec);
        let mut log = self.log.lock().unwrap();
        log.request_done(self.id, self.conn.client_id, rec);
    }

    fn handle_setup(&mut self, data: &[u8]) {
        decode::extract_setup_state(&mut self.conn, data);
        self.conn.phase = HandshakePhase::Established;
        let mut log = self.log.lock().unwrap();
        log.client_seen();
        if self.options.log_server_init {
            let mut em = Emitter::new(data, self.conn.order(), self.options.size_limit);
            decode::decode_server_init(&mut em);
            let text = em.finish();
            log.info_line(self.conn.client_id, &text);
        }
    }

    fn handle_response(&mut self, data: &[u8]) {
        let first = data[0];
        let order = self.conn.order();
        let seq = order.u16_at(data, 2).unwrap_or(0);

        // KeymapNotify carries no sequence number, and neither may events
        // we cannot identify; everything else advances the request queue
        let code = first & 0x7F;
        let advances = code != EVENT_KEYMAP_NOTIFY
            && (first < 2 || decode::decode_event_name_known(&self.conn, code));
        if advances {
            for released in self.table.release_older(seq) {
                match released.replies {
                    ReplyExpectation::Single | ReplyExpectation::MultiUnseen => {
                        let mut log = self.log.lock().unwrap();
                        log.respond_to(self.id, self.conn.client_id, Some(&released));
                        log.response_done(Some(&released), "<no reply received?!>");
                    }
                    _ => {}
                }
            }
        }

        match first {
            RESPONSE_REPLY => self.handle_reply(data, seq),
            RESPONSE_ERROR => self.handle_error(data, seq),
            _ => self.handle_event(data),
        }
    }

    fn handle_reply(&mut self, data: &[u8], seq: u16) {
        let order = self.conn.order();
        let limit = self.options.size_limit;
        match self.table.head_if_matches(seq) {
            Some(rec) => {
                if rec.replies == ReplyExpectation::MultiUnseen {
                    rec.replies = ReplyExpectation::MultiSeen;
                }
                let rec = &*rec;
                let mut em = Emitter::new(data, order, limit);
                decode::decode_reply(&mut em, &mut self.conn, rec);
                let text = em.finish();
                let single = rec.replies == ReplyExpectation::Single;
                {
                    let mut log = self.log.lock().unwrap();
                    log.respond_to(self.id, self.conn.client_id, Some(rec));
                    log.response_done(Some(rec), &text);
                }
                if single {
                    self.table.pop_head();
                }
            }
            None => {
                let mut log = self.log.lock().unwrap();
                log.unknown_reply(self.conn.client_id, seq);
            }
        }
    }

    fn handle_error(&mut self, data: &[u8], seq: u16) {
        let order = self.conn.order();
        let mut em = Emitter::new(data, order, self.options.size_limit);
        decode::decode_error(&mut em, &self.conn);
        let text = em.finish();
        match self.table.head_if_matches(seq) {
            Some(_) => {
                let rec = self.table.pop_head().expect("head just matched");
                let mut log = self.log.lock().unwrap();
                log.respond_to(self.id, self.conn.client_id, Some(&rec));
                log.response_done(Some(&rec), &text);
            }
            None => {
                let mut log = self.log.lock().unwrap();
                log.respond_to(self.id, self.conn.client_id, None);
                log.response_done(None, &text);
            }
        }
    }

    fn handle_event(&mut self, data: &[u8]) {
        let mut em = Emitter::new(data, self.conn.order(), self.options.size_limit);
        let filter_name = decode::decode_event(&mut em, &self.conn, 0);
        let text = em.finish();
        if self.options.filters.events.matches(&filter_name) {
            let mut log = self.log.lock().unwrap();
            log.event_line(self.conn.client_id, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        tracer: Tracer,
        out: SharedBuf,
    }

    impl Harness {
        fn new(options: TraceOptions) -> Self {
            let out = SharedBuf(Arc::new(Mutex::new(Vec::new())));
            let log = Arc::new(Mutex::new(LogContext::new(Box::new(out.clone()))));
            let tracer = Tracer::new(TraceMode::Full, log, Arc::new(options));
            Self { tracer, out }
        }

        fn attached(options: TraceOptions) -> Self {
            let out = SharedBuf(Arc::new(Mutex::new(Vec::new())));
            let log = Arc::new(Mutex::new(LogContext::new(Box::new(out.clone()))));
            let mut tracer = Tracer::new(TraceMode::Attached, log, Arc::new(options));
            tracer.set_byte_order(ByteOrder::BigEndian);
            Self { tracer, out }
        }

        fn text(&self) -> String {
            String::from_utf8(self.out.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Big-endian setup prefix with no authorisation payload.
    const SETUP_PREFIX_BE: [u8; 12] = [0x42, 0, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0];

    /// A minimal accepted big-endian server setup: no vendor string, no
    /// screens, no pixmap formats.
    fn server_setup_be() -> Vec<u8> {
        let mut d = vec![0u8; 48];
        d[0] = 1; // accepted
        d[7] = 10; // 10 additional words
        d[12..16].copy_from_slice(&0x0020_0000u32.to_be_bytes()); // rid base
        d[32] = 32; // bitmap scanline unit
        d[33] = 32; // bitmap scanline pad
        d
    }

    fn reply_packet_be(seq: u16, extra_words: u32) -> Vec<u8> {
        let mut p = vec![0u8; 32 + 4 * extra_words as usize];
        p[0] = 1;
        p[2..4].copy_from_slice(&seq.to_be_bytes());
        p[4..8].copy_from_slice(&extra_words.to_be_bytes());
        p
    }

    #[test]
    fn test_scenario_minimal_handshake_then_intern_atom() {
        let mut h = Harness::new(TraceOptions::default());
        h.tracer.feed_client_to_server(&SETUP_PREFIX_BE);
        h.tracer.feed_server_to_client(&server_setup_be());
        h.tracer.feed_client_to_server(&[
            0x10, 0x01, 0x00, 0x03, // InternAtom, only-if-exists, 3 words
            0x00, 0x04, 0x00, 0x00, // name length 4
            0x57, 0x4D, 0x5F, 0x53, // "WM_S"
        ]);
        assert_eq!(h.text(), "InternAtom(name=\"WM_S\", only-if-exists=True)");
        h.tracer.feed_server_to_client(&reply_packet_be(1, 0));
        assert_eq!(
            h.text(),
            "InternAtom(name=\"WM_S\", only-if-exists=True) = {atom=None}\n"
        );
    }

    #[test]
    fn test_scenario_reply_arrives_after_next_request() {
        let mut h = Harness::new(TraceOptions::default());
        h.tracer.feed_client_to_server(&SETUP_PREFIX_BE);
        h.tracer.feed_server_to_client(&server_setup_be());
        h.tracer.feed_client_to_server(&[
            0x0E, 0x00, 0x00, 0x02, 0x12, 0x34, 0x56, 0x78, // GetGeometry
        ]);
        h.tracer.feed_client_to_server(&[
            0x10, 0x00, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00, 0x58, 0x00, 0x00, 0x00,
        ]);
        // the GetGeometry reply overtakes the pending InternAtom line
        let mut reply = reply_packet_be(1, 0);
        reply[1] = 24; // depth
        h.tracer.feed_server_to_client(&reply);
        let text = h.text();
        assert!(
            text.contains("InternAtom(name=\"X\", only-if-exists=False) = <unfinished>\n"),
            "got: {}",
            text
        );
        assert!(
            text.contains(" ... GetGeometry(drawable=wp#12345678) = {root=w#00000000, depth=24,"),
            "got: {}",
            text
        );
    }

    #[test]
    fn test_scenario_unknown_reply_sequence() {
        let mut h = Harness::attached(TraceOptions::default());
        h.tracer.feed_server_to_client(&reply_packet_be(42, 0));
        assert_eq!(
            h.text(),
            "--- reply received for unknown request sequence number 42\n"
        );
    }

    #[test]
    fn test_scenario_big_request_dispatch() {
        let mut h = Harness::attached(TraceOptions::default());
        let mut stream = vec![0x62, 0x00, 0x00, 0x00];
        stream.extend_from_slice(&16u32.to_be_bytes());
        stream.extend_from_slice(&vec![0u8; 16 * 4 - 8]);
        h.tracer.feed_client_to_server(&stream);
        // opcode 0x62 is QueryExtension; the zero length field was
        // spliced out, so the decoder saw the full 16-word packet
        assert_eq!(h.text(), "QueryExtension(name=\"\")");
    }

    #[test]
    fn test_scenario_filtered_request_still_bookkeeps() {
        let mut options = TraceOptions::default();
        options.filters.apply_spec("!CreateGC").unwrap();
        let mut h = Harness::new(options);
        h.tracer.feed_client_to_server(&SETUP_PREFIX_BE);
        h.tracer.feed_server_to_client(&server_setup_be());
        // CreateGC (suppressed, sequence 1)
        h.tracer.feed_client_to_server(&[
            0x37, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
            0x00, 0x00,
        ]);
        // GetInputFocus (sequence 2)
        h.tracer.feed_client_to_server(&[0x2B, 0x00, 0x00, 0x01]);
        h.tracer.feed_server_to_client(&reply_packet_be(2, 0));
        // the reply joins with a plain `=`: no intervening line was
        // emitted for the filtered request
        assert_eq!(
            h.text(),
            "GetInputFocus = {focus=None, revert-to=None}\n"
        );
    }

    #[test]
    fn test_scenario_size_limit_truncates_property_data() {
        let options = TraceOptions {
            size_limit: 40,
            ..Default::default()
        };
        let mut h = Harness::new(options);
        h.tracer.feed_client_to_server(&SETUP_PREFIX_BE);
        h.tracer.feed_server_to_client(&server_setup_be());
        let payload_len = 1000usize;
        let words = 6 + payload_len / 4;
        let mut req = vec![0x12, 0x00];
        req.extend_from_slice(&(words as u16).to_be_bytes());
        req.extend_from_slice(&0x100u32.to_be_bytes()); // window
        req.extend_from_slice(&0x20u32.to_be_bytes()); // property
        req.extend_from_slice(&0x1Fu32.to_be_bytes()); // type
        req.extend_from_slice(&[8, 0, 0, 0]); // format 8
        req.extend_from_slice(&(payload_len as u32).to_be_bytes());
        req.extend_from_slice(&vec![b'x'; payload_len]);
        h.tracer.feed_client_to_server(&req);
        let text = h.text();
        assert!(text.contains("data=\"xxxx"), "got: {}", text);
        assert!(text.contains("\"...") , "got: {}", text);
        assert!(text.len() < 150, "got: {}", text);
    }

    #[test]
    fn test_missing_reply_note_on_overtaken_request() {
        let mut h = Harness::new(TraceOptions::default());
        h.tracer.feed_client_to_server(&SETUP_PREFIX_BE);
        h.tracer.feed_server_to_client(&server_setup_be());
        // GetInputFocus (seq 1) then NoOperation (seq 2)
        h.tracer.feed_client_to_server(&[0x2B, 0x00, 0x00, 0x01]);
        h.tracer.feed_client_to_server(&[0x7F, 0x00, 0x00, 0x01]);
        // an event at sequence 2 skips past the expecting request
        let mut event = vec![0u8; 32];
        event[0] = 12; // Expose
        event[2..4].copy_from_slice(&2u16.to_be_bytes());
        h.tracer.feed_server_to_client(&event);
        let text = h.text();
        assert!(
            text.contains("GetInputFocus = <no reply received?!>\n"),
            "got: {}",
            text
        );
        assert!(text.contains("--- Expose("), "got: {}", text);
    }

    #[test]
    fn test_event_filtering() {
        let mut options = TraceOptions::default();
        options.filters.apply_spec("events=!Expose").unwrap();
        let mut h = Harness::attached(options);
        let mut event = vec![0u8; 32];
        event[0] = 12;
        h.tracer.feed_server_to_client(&event);
        assert_eq!(h.text(), "");
        let mut event = vec![0u8; 32];
        event[0] = 14; // NoExposure
        h.tracer.feed_server_to_client(&event);
        assert!(h.text().starts_with("--- NoExposure("));
    }

    #[test]
    fn test_protocol_error_poisons_connection() {
        let mut h = Harness::new(TraceOptions::default());
        h.tracer.feed_client_to_server(&[0x00; 12]);
        assert_eq!(
            h.text(),
            "protocol error: initial endianness byte (0x00) unrecognised\n"
        );
        // further traffic is ignored
        h.tracer.feed_client_to_server(&[0x7F, 0x00, 0x00, 0x01]);
        assert_eq!(
            h.text(),
            "protocol error: initial endianness byte (0x00) unrecognised\n"
        );
    }

    #[test]
    fn test_extension_remap_round_trip() {
        let mut h = Harness::attached(TraceOptions::default());
        // QueryExtension "MIT-SHM" (seq 1)
        let mut req = vec![0x62, 0x00, 0x00, 0x04];
        req.extend_from_slice(&7u16.to_be_bytes());
        req.extend_from_slice(&[0, 0]);
        req.extend_from_slice(b"MIT-SHM\0");
        h.tracer.feed_client_to_server(&req);
        // reply: present, major 140, first-event 65, first-error 128
        let mut reply = reply_packet_be(1, 0);
        reply[8] = 1;
        reply[9] = 140;
        reply[10] = 65;
        reply[11] = 128;
        h.tracer.feed_server_to_client(&reply);
        // a ShmAttach through major 140 now decodes structurally
        let mut attach = vec![140u8, 1, 0, 4];
        attach.extend_from_slice(&0x11u32.to_be_bytes());
        attach.extend_from_slice(&0x22u32.to_be_bytes());
        attach.extend_from_slice(&[1, 0, 0, 0]);
        h.tracer.feed_client_to_server(&attach);
        let text = h.text();
        assert!(
            text.contains("ShmAttach(shmseg=0x00000011, shmid=0x00000022, read-only=True)"),
            "got: {}",
            text
        );
    }

    /// Little-endian client prefix plus an accepted setup carrying one
    /// pixmap format (depth 24, 32 bpp, pad 32).
    fn handshake_le(h: &mut Harness) {
        h.tracer
            .feed_client_to_server(&[0x6C, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut setup = vec![0u8; 48];
        setup[0] = 1;
        setup[6] = 10; // additional words
        setup[12..16].copy_from_slice(&0x0120_0000u32.to_le_bytes()); // rid base
        setup[29] = 1; // one pixmap format
        setup[30] = 0; // LSBFirst images
        setup[32] = 32; // bitmap scanline unit
        setup[33] = 32; // bitmap scanline pad
        setup[40] = 24;
        setup[41] = 32;
        setup[42] = 32;
        h.tracer.feed_server_to_client(&setup);
    }

    #[test]
    fn test_short_session_with_joined_reply() {
        let mut h = Harness::new(TraceOptions::default());
        handshake_le(&mut h);

        // MapWindow, then GetGeometry on the same window and its reply
        let mut req = vec![8u8, 0, 2, 0];
        req.extend_from_slice(&0x0120_0002u32.to_le_bytes());
        h.tracer.feed_client_to_server(&req);
        let mut req = vec![14u8, 0, 2, 0];
        req.extend_from_slice(&0x0120_0002u32.to_le_bytes());
        h.tracer.feed_client_to_server(&req);
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[1] = 24;
        reply[2..4].copy_from_slice(&2u16.to_le_bytes());
        reply[8..12].copy_from_slice(&0x53u32.to_le_bytes()); // root
        reply[16..18].copy_from_slice(&640u16.to_le_bytes()); // width
        reply[18..20].copy_from_slice(&480u16.to_le_bytes()); // height
        h.tracer.feed_server_to_client(&reply);

        assert_eq!(
            h.text(),
            "MapWindow(window=w#01200002)\n\
             GetGeometry(drawable=wp#01200002) = {root=w#00000053, depth=24, x=0, y=0, \
             width=640, height=480, border-width=0}\n"
        );
    }

    #[test]
    fn test_error_reported_against_its_request() {
        let mut h = Harness::new(TraceOptions::default());
        handshake_le(&mut h);

        // MapWindow on a bogus id, answered by BadWindow
        let mut req = vec![8u8, 0, 2, 0];
        req.extend_from_slice(&0xDEADu32.to_le_bytes());
        h.tracer.feed_client_to_server(&req);
        let mut error = vec![0u8; 32];
        error[1] = 3; // BadWindow
        error[2..4].copy_from_slice(&1u16.to_le_bytes());
        error[4..8].copy_from_slice(&0xDEADu32.to_le_bytes());
        h.tracer.feed_server_to_client(&error);

        assert_eq!(
            h.text(),
            "MapWindow(window=w#0000DEAD)\n\
             \x20... MapWindow(window=w#0000DEAD) = BadWindow(window=w#0000DEAD)\n"
        );
    }

    #[test]
    fn test_error_for_unknown_sequence() {
        let mut h = Harness::attached(TraceOptions::default());
        let mut error = vec![0u8; 32];
        error[1] = 8; // BadMatch
        error[2..4].copy_from_slice(&9u16.to_be_bytes());
        h.tracer.feed_server_to_client(&error);
        assert_eq!(
            h.text(),
            "--- error received for unknown request: BadMatch\n"
        );
    }

    #[test]
    fn test_event_between_request_and_reply() {
        let mut h = Harness::new(TraceOptions::default());
        handshake_le(&mut h);

        // GetInputFocus, then an Expose at the same sequence number
        // before the reply arrives
        h.tracer.feed_client_to_server(&[43, 0, 1, 0]);
        let mut event = vec![0u8; 32];
        event[0] = 12;
        event[2..4].copy_from_slice(&1u16.to_le_bytes());
        event[4..8].copy_from_slice(&0x77u32.to_le_bytes());
        h.tracer.feed_server_to_client(&event);
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&1u16.to_le_bytes());
        h.tracer.feed_server_to_client(&reply);

        assert_eq!(
            h.text(),
            "GetInputFocus = <unfinished>\n\
             --- Expose(window=w#00000077, x=0, y=0, width=0, height=0, count=0)\n\
             \x20... GetInputFocus = {focus=None, revert-to=None}\n"
        );
    }

    #[test]
    fn test_put_image_payload_uses_pixmap_format() {
        let mut h = Harness::new(TraceOptions::default());
        handshake_le(&mut h);

        // 2x1 ZPixmap at depth 24 (32 bpp per the format table)
        let mut req = vec![72u8, 2, 0, 0];
        req.extend_from_slice(&0x0120_0002u32.to_le_bytes()); // drawable
        req.extend_from_slice(&0x0120_0003u32.to_le_bytes()); // gc
        req.extend_from_slice(&2u16.to_le_bytes()); // width
        req.extend_from_slice(&1u16.to_le_bytes()); // height
        req.extend_from_slice(&[0, 0, 0, 0]); // dst-x, dst-y
        req.extend_from_slice(&[0, 24, 0, 0]); // left-pad, depth, pad
        req.extend_from_slice(&[0x11, 0x22, 0x33, 0x44]); // pixel 0
        req.extend_from_slice(&[0x55, 0x66, 0x77, 0x88]); // pixel 1
        let words = (req.len() / 4) as u16;
        req[2..4].copy_from_slice(&words.to_le_bytes());
        h.tracer.feed_client_to_server(&req);

        let text = h.text();
        assert!(
            text.contains("image-data=44332211:88776655"),
            "got: {}",
            text
        );
    }

    #[test]
    fn test_render_glyph_depths_follow_pict_formats() {
        let mut h = Harness::new(TraceOptions::default());
        handshake_le(&mut h);

        // QueryExtension RENDER (seq 1)
        let mut req = vec![98u8, 0, 4, 0];
        req.extend_from_slice(&6u16.to_le_bytes());
        req.extend_from_slice(&[0, 0]);
        req.extend_from_slice(b"RENDER\0\0");
        h.tracer.feed_client_to_server(&req);
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&1u16.to_le_bytes());
        reply[8] = 1; // present
        reply[9] = 139; // major opcode
        reply[11] = 170; // first error
        h.tracer.feed_server_to_client(&reply);
        let text = h.text();
        assert!(
            text.contains("QueryExtension(name=\"RENDER\") = {present=True, major-opcode=139"),
            "got: {}",
            text
        );

        // RenderQueryPictFormats (seq 2) and a reply advertising one
        // format of depth 24
        h.tracer.feed_client_to_server(&[139, 1, 1, 0]);
        let mut reply = vec![0u8; 32 + 28];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&2u16.to_le_bytes());
        reply[4..8].copy_from_slice(&7u32.to_le_bytes()); // extra words
        reply[8..12].copy_from_slice(&1u32.to_le_bytes()); // one format
        reply[32..36].copy_from_slice(&0x99u32.to_le_bytes()); // pictformat id
        reply[36] = 1; // Direct
        reply[37] = 24; // depth 24: 32 bpp per the format table
        h.tracer.feed_server_to_client(&reply);

        // RenderCreateGlyphSet referencing that format (seq 3), then
        // RenderAddGlyphs with one 1x1 glyph
        let mut req = vec![139u8, 17, 3, 0];
        req.extend_from_slice(&0x5000u32.to_le_bytes());
        req.extend_from_slice(&0x99u32.to_le_bytes());
        h.tracer.feed_client_to_server(&req);

        let mut req = vec![139u8, 20, 0, 0];
        req.extend_from_slice(&0x5000u32.to_le_bytes()); // glyphset
        req.extend_from_slice(&1u32.to_le_bytes()); // one glyph
        req.extend_from_slice(&0x41u32.to_le_bytes()); // glyph id
        // GLYPHINFO: 1x1, origin 0, advance 1,0
        req.extend_from_slice(&1u16.to_le_bytes());
        req.extend_from_slice(&1u16.to_le_bytes());
        req.extend_from_slice(&0u16.to_le_bytes());
        req.extend_from_slice(&0u16.to_le_bytes());
        req.extend_from_slice(&1u16.to_le_bytes());
        req.extend_from_slice(&0u16.to_le_bytes());
        // one 32-bit pixel of image data
        req.extend_from_slice(&[0xAB, 0xCD, 0xEF, 0x01]);
        let words = (req.len() / 4) as u16;
        req[2..4].copy_from_slice(&words.to_le_bytes());
        h.tracer.feed_client_to_server(&req);

        let text = h.text();
        assert!(
            text.contains("RenderAddGlyphs(glyphset=gs#00005000, glyphids[0]=0x00000041"),
            "got: {}",
            text
        );
        assert!(text.contains("glyphimages[0]=01EFCDAB"), "got: {}", text);
    }

    #[test]
    fn test_attached_mode_sequence_override() {
        let mut h = Harness::attached(TraceOptions::default());
        h.tracer.set_next_sequence(0x1234);
        h.tracer.feed_client_to_server(&[43, 0, 0, 1]); // GetInputFocus
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&0x1234u16.to_be_bytes());
        h.tracer.feed_server_to_client(&reply);
        assert_eq!(
            h.text(),
            "GetInputFocus = {focus=None, revert-to=None}\n"
        );
    }

    #[test]
    fn test_second_connection_enables_prefixes() {
        let out = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        let log = Arc::new(Mutex::new(LogContext::new(Box::new(out.clone()))));
        let options = Arc::new(TraceOptions::default());
        let mut first = Tracer::new(TraceMode::Full, Arc::clone(&log), Arc::clone(&options));
        let mut second = Tracer::new(TraceMode::Full, Arc::clone(&log), Arc::clone(&options));

        let prefix = [0x6C, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut setup = vec![0u8; 48];
        setup[0] = 1;
        setup[6] = 10;
        setup[12..16].copy_from_slice(&0x0120_0000u32.to_le_bytes());

        first.feed_client_to_server(&prefix);
        first.feed_server_to_client(&setup);
        second.feed_client_to_server(&prefix);
        setup[12..16].copy_from_slice(&0x0140_0000u32.to_le_bytes());
        second.feed_server_to_client(&setup);

        first.feed_client_to_server(&[127, 0, 1, 0]);
        second.feed_client_to_server(&[127, 0, 1, 0]);

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "01200000: NoOperation\n01400000: NoOperation\n");
    }
}
