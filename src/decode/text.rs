//! Font and Text Requests
//!
//! Core opcodes 45..=52 and the text-drawing family 74..=77, with their
//! replies.

use byteorder::{BigEndian, ByteOrder as _};

use super::common::{char_info, font_prop};
use super::params::{Emitter, HexWidth, Value};
use super::{ReplyScope, RequestScope};
use crate::protocol::ByteOrder;

const DRAW_DIRECTION: &[(u32, &str)] = &[(0, "LeftToRight"), (1, "RightToLeft")];

pub(super) fn open_font(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "OpenFont");
    em.param("fid", Value::Font(em.fetch32(4)));
    let len = em.fetch16(8) as usize;
    em.param("name", Value::String(em.fetch_bytes(12, len)));
}

pub(super) fn close_font(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CloseFont");
    em.param("font", Value::Font(em.fetch32(4)));
}

pub(super) fn query_font(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryFont");
    em.param("font", Value::Fontable(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn query_text_extents(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryTextExtents");
    em.param("font", Value::Fontable(em.fetch32(4)));
    // an odd-length flag in the header means the last CHAR2B is padding
    let mut chars = em.packet_len().saturating_sub(8) / 2;
    if em.fetch8(1) != 0 {
        chars = chars.saturating_sub(1);
    }
    em.param(
        "string",
        Value::Hex(
            HexWidth::Two,
            Some(ByteOrder::BigEndian),
            em.fetch_bytes(8, 2 * chars),
        ),
    );
    s.expect_reply();
}

pub(super) fn list_fonts(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ListFonts");
    let len = em.fetch16(6) as usize;
    em.param("pattern", Value::String(em.fetch_bytes(8, len)));
    em.param("max-names", Value::Unsigned(em.fetch16(4)));
    s.expect_reply();
}

pub(super) fn list_fonts_with_info(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ListFontsWithInfo");
    let len = em.fetch16(6) as usize;
    em.param("pattern", Value::String(em.fetch_bytes(8, len)));
    em.param("max-names", Value::Unsigned(em.fetch16(4)));
    s.expect_multiple_replies();
}

pub(super) fn set_font_path(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetFontPath");
    let n = em.fetch16(4) as usize;
    let mut pos = 8;
    for i in 0..n {
        let len = em.fetch8(pos) as usize;
        em.param(
            &format!("path[{}]", i),
            Value::String(em.fetch_bytes(pos + 1, len)),
        );
        pos += len + 1;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_font_path(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetFontPath");
    s.expect_reply();
}

/// The TEXTITEM8/TEXTITEM16 stream of PolyText8 and PolyText16: packed
/// items that are either (length, delta, string) or a font change
/// introduced by the escape length 255.
fn poly_text_items(em: &mut Emitter<'_>, wide: bool) {
    let len = em.packet_len();
    let mut pos = 16;
    let mut i = 0;
    while pos + 3 <= len {
        let item_len = em.fetch8(pos) as usize;
        if item_len == 0 && pos + 3 == len {
            // a delta-only record right at the end is 3-byte padding
            break;
        }
        em.set_begin(&format!("items[{}]", i));
        if item_len == 255 {
            // font ids in text items are big-endian regardless of the
            // connection byte order
            let raw = em.fetch_bytes(pos + 1, 4);
            let font = if raw.len() == 4 { BigEndian::read_u32(raw) } else { 0 };
            em.param("font", Value::Font(font));
            pos += 5;
        } else {
            em.param("delta", Value::Signed8(em.fetch8(pos + 1)));
            if wide {
                em.param(
                    "string",
                    Value::Hex(
                        HexWidth::Two,
                        Some(ByteOrder::BigEndian),
                        em.fetch_bytes(pos + 2, 2 * item_len),
                    ),
                );
                pos += 2 * item_len + 2;
            } else {
                em.param("string", Value::String(em.fetch_bytes(pos + 2, item_len)));
                pos += item_len + 2;
            }
        }
        em.set_end();
        i += 1;
        if pos < len && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn poly_text8(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyText8");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
    poly_text_items(em, false);
}

pub(super) fn poly_text16(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyText16");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
    poly_text_items(em, true);
}

pub(super) fn image_text8(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ImageText8");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
    let len = em.fetch8(1) as usize;
    em.param("string", Value::String(em.fetch_bytes(16, len)));
}

pub(super) fn image_text16(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ImageText16");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
    let len = em.fetch8(1) as usize;
    em.param(
        "string",
        Value::Hex(
            HexWidth::Two,
            Some(ByteOrder::BigEndian),
            em.fetch_bytes(16, 2 * len),
        ),
    );
}

/// Font metrics block shared by QueryFont and ListFontsWithInfo replies.
fn font_header(em: &mut Emitter<'_>) {
    em.param("draw-direction", Value::Enum(em.fetch8(48), DRAW_DIRECTION));
    em.param("min-char-or-byte2", Value::Unsigned(em.fetch16(40)));
    em.param("max-char-or-byte2", Value::Unsigned(em.fetch16(42)));
    em.param("min-byte1", Value::Unsigned(em.fetch8(49)));
    em.param("max-byte1", Value::Unsigned(em.fetch8(50)));
    em.param("all-chars-exist", Value::Bool(em.fetch8(51)));
    em.param("default-char", Value::Unsigned(em.fetch16(44)));
    em.set_begin("min-bounds");
    char_info(em, 8);
    em.set_end();
    em.set_begin("max-bounds");
    char_info(em, 24);
    em.set_end();
    em.param("font-ascent", Value::Signed16(em.fetch16(52)));
    em.param("font-descent", Value::Signed16(em.fetch16(54)));
}

pub(super) fn query_font_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    font_header(em);
    let mut pos = 60;
    let n = em.fetch16(46) as usize;
    let mut printing = true;
    for i in 0..n {
        if printing {
            em.set_begin(&format!("properties[{}]", i));
            font_prop(em, pos);
            em.set_end();
        }
        // char-infos follow the properties, so the walk continues even
        // after the limit stops the printing
        pos += 8;
        if printing && i + 1 < n && em.list_limit_reached() {
            printing = false;
        }
    }
    let n = em.fetch32(56) as usize;
    for i in 0..n {
        em.set_begin(&format!("char-infos[{}]", i));
        char_info(em, pos);
        em.set_end();
        pos += 12;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn query_text_extents_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("draw-direction", Value::Enum(em.fetch8(1), DRAW_DIRECTION));
    em.param("font-ascent", Value::Signed16(em.fetch16(8)));
    em.param("font-descent", Value::Signed16(em.fetch16(10)));
    em.param("overall-ascent", Value::Signed16(em.fetch16(12)));
    em.param("overall-descent", Value::Signed16(em.fetch16(14)));
    em.param("overall-width", Value::Signed32(em.fetch32(16)));
    em.param("overall-left", Value::Signed32(em.fetch32(20)));
    em.param("overall-right", Value::Signed32(em.fetch32(24)));
}

/// STR-list reply body shared by ListFonts and GetFontPath.
fn string_list_reply(em: &mut Emitter<'_>, label: &str) {
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        let len = em.fetch8(pos) as usize;
        em.param(
            &format!("{}[{}]", label, i),
            Value::String(em.fetch_bytes(pos + 1, len)),
        );
        pos += len + 1;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn list_fonts_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    string_list_reply(em, "names");
}

pub(super) fn list_fonts_with_info_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let name_len = em.fetch8(1) as usize;
    if name_len == 0 {
        em.param("last-reply", Value::Bool(1));
        return;
    }
    let name_pos = 60 + 8 * em.fetch16(46) as usize;
    em.param("name", Value::String(em.fetch_bytes(name_pos, name_len)));
    font_header(em);
    let n = em.fetch16(46) as usize;
    let mut pos = 60;
    for i in 0..n {
        em.set_begin(&format!("properties[{}]", i));
        font_prop(em, pos);
        em.set_end();
        pos += 8;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
    em.param("replies-hint", Value::Signed16(em.fetch32(56)));
}

pub(super) fn get_font_path_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    string_list_reply(em, "path");
}
