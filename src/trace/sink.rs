//! Trace Output Sink
//!
//! All connections multiplex their log lines into one [`LogContext`]. It
//! owns the output writer, the "pending request" state (the last request
//! printed without a trailing newline because its reply may join the same
//! line), and client-id prefixing once more than one connection is seen.

use std::io::Write;

use tracing::warn;

use super::requests::RequestRecord;

/// Identity of the request a partially printed line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRequest {
    conn: u64,
    seq: u16,
}

/// Process-wide trace output state.
pub struct LogContext {
    out: Box<dyn Write + Send>,
    pending: Option<PendingRequest>,
    print_client_ids: bool,
    clients_seen: u32,
}

impl LogContext {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            pending: None,
            print_client_ids: false,
            clients_seen: 0,
        }
    }

    /// Force client-id prefixes on every line regardless of how many
    /// connections appear.
    pub fn force_client_ids(&mut self) {
        self.print_client_ids = true;
    }

    /// Count a completed handshake; from the second connection on, lines
    /// are prefixed with the owning client's id.
    pub fn client_seen(&mut self) {
        self.clients_seen += 1;
        if self.clients_seen > 1 {
            self.print_client_ids = true;
        }
    }

    /// Terminate any pending line, then start a fresh one with the
    /// client-id prefix if enabled.
    fn new_line(&mut self, client_id: Option<u32>) {
        if self.pending.take().is_some() {
            self.write(" = <unfinished>\n");
        }
        if self.print_client_ids {
            match client_id {
                None => self.write("new-conn: "),
                Some(id) => self.write(&format!("{:08x}: ", id)),
            }
        }
    }

    /// A request line is complete. When a reply is expected the newline is
    /// withheld so the reply can join it.
    pub fn request_done(&mut self, conn: u64, client_id: Option<u32>, record: &RequestRecord) {
        if !record.printed {
            return;
        }
        self.new_line(client_id);
        if record.replies.expects_reply() {
            self.write(&record.text);
            self.pending = Some(PendingRequest {
                conn,
                seq: record.seq,
            });
        } else {
            self.write(&record.text);
            self.write("\n");
        }
        self.flush();
    }

    /// Announce that a response to `record` follows. Joins the pending
    /// line with ` = ` when it belongs to the same request, otherwise
    /// reprints the stored request text.
    pub fn respond_to(&mut self, conn: u64, client_id: Option<u32>, record: Option<&RequestRecord>) {
        match record {
            Some(record) => {
                if !record.printed {
                    return;
                }
                let here = PendingRequest {
                    conn,
                    seq: record.seq,
                };
                if self.pending == Some(here) {
                    self.pending = None;
                    self.write(" = ");
                } else {
                    self.new_line(client_id);
                    self.write(&format!(" ... {} = ", record.text));
                }
            }
            None => {
                self.new_line(client_id);
                self.write("--- error received for unknown request: ");
            }
        }
    }

    /// Finish the response started by [`respond_to`].
    pub fn response_done(&mut self, record: Option<&RequestRecord>, text: &str) {
        if record.is_none_or(|r| r.printed) {
            self.write(text);
            self.write("\n");
            self.flush();
        }
        self.pending = None;
    }

    /// A reply arrived whose sequence number matches nothing outstanding.
    pub fn unknown_reply(&mut self, client_id: Option<u32>, seq: u16) {
        self.new_line(client_id);
        self.write(&format!(
            "--- reply received for unknown request sequence number {}\n",
            seq
        ));
        self.flush();
    }

    /// Emit an event on its own line.
    pub fn event_line(&mut self, client_id: Option<u32>, text: &str) {
        self.new_line(client_id);
        self.write(&format!("--- {}\n", text));
        self.flush();
    }

    /// Emit a free-standing annotation line (server init message).
    pub fn info_line(&mut self, client_id: Option<u32>, text: &str) {
        self.new_line(client_id);
        self.write(text);
        self.write("\n");
        self.flush();
    }

    /// Report a protocol error that poisons the connection's decoding.
    pub fn protocol_error(&mut self, client_id: Option<u32>, message: &str) {
        self.new_line(client_id);
        self.write(&format!("protocol error: {}\n", message));
        self.flush();
    }

    /// Raw hex/ASCII dump of a traffic slice, 16 bytes per line, with a
    /// running offset and a direction prefix.
    pub fn hexdump(
        &mut self,
        client_id: Option<u32>,
        data: &[u8],
        start_offset: u64,
        prefix: &str,
    ) {
        let mut line_offset = start_offset & !15;
        let lead = (start_offset & 15) as usize;
        let mut index = 0usize;
        while index < data.len() {
            let skip = if index == 0 { lead } else { 0 };
            let take = (16 - skip).min(data.len() - index);
            let chunk = &data[index..index + take];
            let mut hex = String::new();
            let mut ascii = String::new();
            for _ in 0..skip {
                hex.push_str("   ");
                ascii.push(' ');
            }
            for &b in chunk {
                hex.push_str(&format!("{:02X} ", b));
                ascii.push(if (32..=126).contains(&b) { b as char } else { '.' });
            }
            for _ in (skip + take)..16 {
                hex.push_str("   ");
            }
            self.new_line(client_id);
            self.write(&format!("{}{:08X}  {} {}\n", prefix, line_offset, hex, ascii));
            index += take;
            line_offset += 16;
        }
        self.flush();
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            warn!("trace output write failed: {}", e);
        }
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::requests::{ReplyExpectation, RequestRecord};
    use std::sync::{Arc, Mutex};

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

    fn context() -> (LogContext, SharedBuf) {
        let buf = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        (LogContext::new(Box::new(buf.clone())), buf)
    }

    fn record(seq: u16, text: &str, replies: ReplyExpectation) -> RequestRecord {
        let mut r = RequestRecord::new(0);
        r.seq = seq;
        r.text = text.to_string();
        r.replies = replies;
        r
    }

    fn text_of(buf: &SharedBuf) -> String {
        String::from_utf8(buf.0.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_adjacent_reply_joins_line() {
        let (mut ctx, buf) = context();
        let req = record(1, "GetGeometry(drawable=wp#00000001)", ReplyExpectation::Single);
        ctx.request_done(7, None, &req);
        ctx.respond_to(7, None, Some(&req));
        ctx.response_done(Some(&req), "{depth=24}");
        assert_eq!(text_of(&buf), "GetGeometry(drawable=wp#00000001) = {depth=24}\n");
    }

    #[test]
    fn test_interleaved_reply_reprints_request() {
        let (mut ctx, buf) = context();
        let first = record(1, "GetGeometry(drawable=wp#00000001)", ReplyExpectation::Single);
        let second = record(2, "InternAtom(name=\"X\")", ReplyExpectation::Single);
        ctx.request_done(7, None, &first);
        ctx.request_done(7, None, &second);
        ctx.respond_to(7, None, Some(&first));
        ctx.response_done(Some(&first), "{depth=24}");
        assert_eq!(
            text_of(&buf),
            "GetGeometry(drawable=wp#00000001) = <unfinished>\n\
             InternAtom(name=\"X\") = <unfinished>\n\
             \x20... GetGeometry(drawable=wp#00000001) = {depth=24}\n"
        );
    }

    #[test]
    fn test_filtered_request_produces_nothing() {
        let (mut ctx, buf) = context();
        let mut req = record(1, "CreateGC(cid=g#00000001)", ReplyExpectation::None);
        req.printed = false;
        ctx.request_done(7, None, &req);
        ctx.respond_to(7, None, Some(&req));
        ctx.response_done(Some(&req), "{}");
        assert_eq!(text_of(&buf), "");
    }

    #[test]
    fn test_unknown_reply_line() {
        let (mut ctx, buf) = context();
        ctx.unknown_reply(None, 42);
        assert_eq!(
            text_of(&buf),
            "--- reply received for unknown request sequence number 42\n"
        );
    }

    #[test]
    fn test_client_id_prefixes() {
        let (mut ctx, buf) = context();
        ctx.force_client_ids();
        ctx.event_line(None, "Expose(window=w#00000001)");
        ctx.event_line(Some(0x0120_0000), "Expose(window=w#00000001)");
        assert_eq!(
            text_of(&buf),
            "new-conn: --- Expose(window=w#00000001)\n\
             01200000: --- Expose(window=w#00000001)\n"
        );
    }

    #[test]
    fn test_second_client_enables_prefixes() {
        let (mut ctx, _) = context();
        ctx.client_seen();
        assert!(!ctx.print_client_ids);
        ctx.client_seen();
        assert!(ctx.print_client_ids);
    }

    #[test]
    fn test_hexdump_format() {
        let (mut ctx, buf) = context();
        ctx.hexdump(None, b"AB", 0, ">>> ");
        let line = text_of(&buf);
        assert!(line.starts_with(">>> 00000000  41 42 "));
        assert!(line.trim_end().ends_with("AB"));
    }
}
