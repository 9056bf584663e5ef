//! Per-Connection Protocol State
//!
//! Everything the decoder has to remember about one traced X11 session:
//! handshake progress, byte order, the server's image-layout parameters,
//! and the extension number-space assignments learned from QueryExtension
//! replies.

use std::collections::BTreeMap;

use crate::protocol::opcodes::{self, DispatchKey};
use crate::protocol::{ByteOrder, PixmapFormat, Xid};

/// How the tracer joined this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// Watching from the first byte: expect the setup handshake
    Full,
    /// Attached mid-stream via X RECORD: skip straight to the main phase
    Attached,
}

/// Handshake progress of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Nothing seen yet
    Unknown,
    /// Client prefix seen, waiting for the server's setup response
    AwaitingSetup,
    /// Setup accepted; requests and responses flow
    Established,
    /// Framing or authorisation failed; decoding has ceased
    Errored,
}

/// Per-connection bookkeeping shared by the demultiplexer and decoder.
#[derive(Debug)]
pub struct ConnectionState {
    pub mode: TraceMode,
    pub phase: HandshakePhase,
    /// Set by the first byte of the client's setup packet
    pub byte_order: Option<ByteOrder>,
    /// Resource-id base from the server setup; doubles as the client id
    /// in log prefixes. None until setup completes.
    pub client_id: Option<u32>,
    /// Server image-layout parameters from the setup message
    pub bitmap_scanline_unit: u8,
    pub bitmap_scanline_pad: u8,
    /// 0 = LSBFirst, 1 = MSBFirst
    pub image_byte_order: u8,
    pub pixmap_formats: Vec<PixmapFormat>,
    /// Extension name for each major opcode >= 128, as learned from
    /// QueryExtension replies (known or not)
    ext_request_names: [Option<String>; 128],
    /// Known-extension base key for each major opcode >= 128
    ext_request_bases: [DispatchKey; 128],
    /// Extension name based at a given event code
    ext_event_names: [Option<String>; 128],
    /// Known-extension key for each remapped event code
    ext_event_keys: [DispatchKey; 128],
    /// Extension name based at a given error code
    ext_error_names: [Option<String>; 256],
    /// Known-extension key for each remapped error code
    ext_error_keys: [DispatchKey; 256],
    /// Depth of every PICTFORMAT and GLYPHSET seen, for sizing the image
    /// data embedded in RenderAddGlyphs
    resource_depths: BTreeMap<Xid, u8>,
}

impl ConnectionState {
    pub fn new(mode: TraceMode) -> Self {
        Self {
            mode,
            phase: match mode {
                TraceMode::Full => HandshakePhase::Unknown,
                TraceMode::Attached => HandshakePhase::Established,
            },
            byte_order: None,
            client_id: None,
            bitmap_scanline_unit: 0,
            bitmap_scanline_pad: 0,
            image_byte_order: 0,
            pixmap_formats: Vec::new(),
            ext_request_names: [const { None }; 128],
            ext_request_bases: [0; 128],
            ext_event_names: [const { None }; 128],
            ext_event_keys: [0; 128],
            ext_error_names: [const { None }; 256],
            ext_error_keys: [0; 256],
            resource_depths: BTreeMap::new(),
        }
    }

    /// Byte order, defaulting to little-endian before the handshake has
    /// settled it (only reachable in attached mode).
    pub fn order(&self) -> ByteOrder {
        self.byte_order.unwrap_or(ByteOrder::LittleEndian)
    }

    /// Record what a QueryExtension reply revealed: the extension's major
    /// opcode, first event and first error. For recognised extensions the
    /// whole event/error sub-range is remapped into the dispatch keyspace.
    pub fn register_extension(
        &mut self,
        name: &str,
        base: DispatchKey,
        major_opcode: u8,
        first_event: u8,
        first_error: u8,
    ) {
        if major_opcode >= opcodes::FIRST_EXTENSION_OPCODE {
            let slot = (major_opcode - opcodes::FIRST_EXTENSION_OPCODE) as usize;
            if self.ext_request_names[slot].is_none() {
                self.ext_request_names[slot] = Some(name.to_string());
                self.ext_request_bases[slot] = base;
            }
        }
        let ev = first_event as usize;
        if ev < 128 && self.ext_event_names[ev].is_none() {
            self.ext_event_names[ev] = Some(name.to_string());
            if let Some(ext) = opcodes::extension_of(base) {
                for i in 0..ext.num_events as usize {
                    if ev + i < 128 {
                        self.ext_event_keys[ev + i] = base | i as DispatchKey;
                    }
                }
            }
        }
        let er = first_error as usize;
        if self.ext_error_names[er].is_none() {
            self.ext_error_names[er] = Some(name.to_string());
            if let Some(ext) = opcodes::extension_of(base) {
                for i in 0..ext.num_errors as usize {
                    if er + i < 256 {
                        self.ext_error_keys[er + i] = base | i as DispatchKey;
                    }
                }
            }
        }
    }

    /// Dispatch key for a request: known extension majors combine their
    /// base with the minor opcode, everything else is the bare opcode.
    pub fn request_key(&self, opcode: u8, minor: u8) -> DispatchKey {
        if opcode >= opcodes::FIRST_EXTENSION_OPCODE {
            let base = self.ext_request_bases[(opcode - opcodes::FIRST_EXTENSION_OPCODE) as usize];
            if base != 0 {
                return base | minor as DispatchKey;
            }
        }
        opcode as DispatchKey
    }

    /// Name of the (unrecognised) extension owning a major opcode.
    pub fn request_extension_name(&self, opcode: u8) -> Option<&str> {
        if opcode >= opcodes::FIRST_EXTENSION_OPCODE {
            self.ext_request_names[(opcode - opcodes::FIRST_EXTENSION_OPCODE) as usize].as_deref()
        } else {
            None
        }
    }

    /// Remap an event code (synthetic bit already stripped) into the
    /// dispatch keyspace.
    pub fn event_key(&self, code: u8) -> DispatchKey {
        let key = self.ext_event_keys[(code & 0x7F) as usize];
        if key != 0 { key } else { code as DispatchKey }
    }

    /// Remap an error code into the dispatch keyspace.
    pub fn error_key(&self, code: u8) -> DispatchKey {
        let key = self.ext_error_keys[code as usize];
        if key != 0 { key } else { code as DispatchKey }
    }

    /// Walk downwards from an unknown event code to the nearest extension
    /// base, for `NAME:UnknownEvent<k>` renderings.
    pub fn nearest_event_extension(&self, code: u8) -> Option<(&str, u8)> {
        let code = (code & 0x7F) as usize;
        (0..=code)
            .rev()
            .find_map(|base| self.ext_event_names[base].as_deref().map(|n| (n, (code - base) as u8)))
    }

    /// Walk downwards from an unknown error code to the nearest extension
    /// base, for `NAME:UnknownError<k>` renderings.
    pub fn nearest_error_extension(&self, code: u8) -> Option<(&str, u8)> {
        let code = code as usize;
        (0..=code)
            .rev()
            .find_map(|base| self.ext_error_names[base].as_deref().map(|n| (n, (code - base) as u8)))
    }

    /// Remember the pixel depth of a PICTFORMAT or GLYPHSET, replacing
    /// any earlier entry for the same id.
    pub fn set_resource_depth(&mut self, resource: Xid, depth: u8) {
        self.resource_depths.insert(resource, depth);
    }

    pub fn resource_depth(&self, resource: Xid) -> Option<u8> {
        self.resource_depths.get(&resource).copied()
    }

    /// Wire layout for Z-pixmap data of a given depth.
    pub fn pixmap_format_for_depth(&self, depth: u8) -> Option<PixmapFormat> {
        self.pixmap_formats.iter().find(|f| f.depth == depth).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::opcodes::{EXT_MITSHM, EXT_RENDER};

    #[test]
    fn test_request_key_core_and_extension() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        assert_eq!(conn.request_key(16, 0), 16);
        // unregistered extension major stays bare
        assert_eq!(conn.request_key(150, 3), 150);
        conn.register_extension("RENDER", EXT_RENDER, 150, 0, 170);
        assert_eq!(conn.request_key(150, 3), EXT_RENDER | 3);
    }

    #[test]
    fn test_event_and_error_remap_round_trip() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.register_extension("MIT-SHM", EXT_MITSHM, 140, 65, 128);
        assert_eq!(conn.event_key(65), EXT_MITSHM);
        assert_eq!(conn.error_key(128), EXT_MITSHM);
        // codes outside the registered ranges stay bare
        assert_eq!(conn.event_key(64), 64);
        assert_eq!(conn.error_key(129), 129);
    }

    #[test]
    fn test_nearest_extension_for_unknown_codes() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.register_extension("MIT-SHM", EXT_MITSHM, 140, 65, 128);
        assert_eq!(conn.nearest_event_extension(67), Some(("MIT-SHM", 2)));
        assert_eq!(conn.nearest_event_extension(64), None);
    }

    #[test]
    fn test_resource_depth_replaces() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.set_resource_depth(0x99, 24);
        conn.set_resource_depth(0x99, 32);
        assert_eq!(conn.resource_depth(0x99), Some(32));
        assert_eq!(conn.resource_depth(0x98), None);
    }

    #[test]
    fn test_attached_mode_starts_established() {
        let conn = ConnectionState::new(TraceMode::Attached);
        assert_eq!(conn.phase, HandshakePhase::Established);
    }
}
