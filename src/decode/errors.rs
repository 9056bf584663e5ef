//! Error Decoding
//!
//! Core error codes 1..=17 plus the MIT-SHM and RENDER extension errors,
//! remapped through the connection's error table. Each known code prints
//! the offending parameter carried in the packet.

use super::params::{Emitter, Value};
use crate::protocol::DispatchKey;
use crate::protocol::opcodes::{EXT_MITSHM, EXT_RENDER};
use crate::trace::connection::ConnectionState;

/// Canonical name of an error dispatch key, or None if unrecognised.
pub fn error_name(key: DispatchKey) -> Option<&'static str> {
    Some(match key {
        1 => "BadRequest",
        2 => "BadValue",
        3 => "BadWindow",
        4 => "BadPixmap",
        5 => "BadAtom",
        6 => "BadCursor",
        7 => "BadFont",
        8 => "BadMatch",
        9 => "BadDrawable",
        10 => "BadAccess",
        11 => "BadAlloc",
        12 => "BadColormap",
        13 => "BadGContext",
        14 => "BadIDChoice",
        15 => "BadName",
        16 => "BadLength",
        17 => "BadImplementation",
        _ if key == EXT_MITSHM => "BadShmSeg",
        _ if key == EXT_RENDER => "BadPictFormat",
        _ if key == EXT_RENDER | 1 => "BadPicture",
        _ if key == EXT_RENDER | 2 => "BadPictOp",
        _ if key == EXT_RENDER | 3 => "BadGlyphSet",
        _ if key == EXT_RENDER | 4 => "BadGlyph",
        _ => return None,
    })
}

/// Decode one error packet into `em`.
pub fn decode_error(em: &mut Emitter<'_>, conn: &ConnectionState) {
    let code = em.fetch8(1) as u8;
    let key = conn.error_key(code);
    match error_name(key) {
        Some(name) => em.raw(name),
        None => match conn.nearest_error_extension(code) {
            Some((ext, offset)) => em.raw(&format!("{}:UnknownError{}", ext, offset)),
            None => em.raw(&format!("UnknownError{}", code)),
        },
    }

    let value = |em: &mut Emitter<'_>, name: &str, v: Value<'_>| {
        em.raw("(");
        em.suppress_comma();
        em.param(name, v);
        em.raw(")");
    };

    match key {
        2 => value(em, "value", Value::Hex32(em.fetch32(4))),
        3 => value(em, "window", Value::Window(em.fetch32(4))),
        4 => value(em, "pixmap", Value::Pixmap(em.fetch32(4))),
        5 => value(em, "atom", Value::Atom(em.fetch32(4))),
        6 => value(em, "cursor", Value::Cursor(em.fetch32(4))),
        7 => value(em, "font", Value::Font(em.fetch32(4))),
        9 => value(em, "drawable", Value::Drawable(em.fetch32(4))),
        12 => value(em, "colormap", Value::Colormap(em.fetch32(4))),
        13 => value(em, "gc", Value::GContext(em.fetch32(4))),
        14 => value(em, "id", Value::Hex32(em.fetch32(4))),
        k if k == EXT_MITSHM => value(em, "shmseg", Value::Hex32(em.fetch32(4))),
        k if k == EXT_RENDER => value(em, "format", Value::PictFormat(em.fetch32(4))),
        k if k == EXT_RENDER | 1 => value(em, "picture", Value::Picture(em.fetch32(4))),
        k if k == EXT_RENDER | 2 => value(em, "op", Value::Hex32(em.fetch32(4))),
        k if k == EXT_RENDER | 3 => value(em, "glyphset", Value::GlyphSet(em.fetch32(4))),
        k if k == EXT_RENDER | 4 => value(em, "glyph", Value::Hex32(em.fetch32(4))),
        // BadRequest, BadMatch, BadAccess, BadAlloc, BadName, BadLength,
        // BadImplementation and unknown codes carry no useful datum
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ByteOrder;
    use crate::trace::connection::TraceMode;

    fn decode(conn: &ConnectionState, packet: &[u8]) -> String {
        let mut em = Emitter::new(packet, ByteOrder::LittleEndian, 0);
        decode_error(&mut em, conn);
        em.finish()
    }

    fn error_packet(code: u8, value: u32) -> Vec<u8> {
        let mut p = vec![0u8, code, 1, 0];
        p.extend_from_slice(&value.to_le_bytes());
        p.resize(32, 0);
        p
    }

    #[test]
    fn test_core_error_with_parameter() {
        let conn = ConnectionState::new(TraceMode::Full);
        assert_eq!(
            decode(&conn, &error_packet(3, 0x42)),
            "BadWindow(window=w#00000042)"
        );
        assert_eq!(decode(&conn, &error_packet(8, 0)), "BadMatch");
    }

    #[test]
    fn test_extension_error_remap() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.register_extension("RENDER", EXT_RENDER, 150, 0, 170);
        assert_eq!(
            decode(&conn, &error_packet(171, 0x77)),
            "BadPicture(picture=pc#00000077)"
        );
    }

    #[test]
    fn test_unknown_error_includes_code() {
        let conn = ConnectionState::new(TraceMode::Full);
        assert_eq!(decode(&conn, &error_packet(200, 0)), "UnknownError200");
    }

    #[test]
    fn test_unknown_extension_suberror() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.register_extension("RENDER", EXT_RENDER, 150, 0, 170);
        // one past the last RENDER error code
        assert_eq!(decode(&conn, &error_packet(175, 0)), "RENDER:UnknownError5");
    }
}
