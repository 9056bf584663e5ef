//! Shared Substructure Decoders
//!
//! Small wire structures (rectangles, arcs, character metrics, ...) that
//! recur across requests, replies and events, plus the image-data sizing
//! logic shared by PutImage, GetImage and RenderAddGlyphs.

use crate::protocol::ByteOrder;
use crate::protocol::types::{IMAGE_FORMAT_Z_PIXMAP, Xid};
use crate::trace::connection::ConnectionState;

use super::params::{Emitter, HexWidth, Value};

pub(crate) fn rectangle(em: &mut Emitter<'_>, pos: usize) {
    let x = em.fetch16(pos);
    em.param("x", Value::Signed16(x));
    let y = em.fetch16(pos + 2);
    em.param("y", Value::Signed16(y));
    let w = em.fetch16(pos + 4);
    em.param("width", Value::Unsigned(w));
    let h = em.fetch16(pos + 6);
    em.param("height", Value::Unsigned(h));
}

pub(crate) fn point(em: &mut Emitter<'_>, pos: usize) {
    let x = em.fetch16(pos);
    em.param("x", Value::Signed16(x));
    let y = em.fetch16(pos + 2);
    em.param("y", Value::Signed16(y));
}

pub(crate) fn arc(em: &mut Emitter<'_>, pos: usize) {
    rectangle(em, pos);
    let a1 = em.fetch16(pos + 8);
    em.param("angle1", Value::Signed16(a1));
    let a2 = em.fetch16(pos + 10);
    em.param("angle2", Value::Signed16(a2));
}

pub(crate) fn segment(em: &mut Emitter<'_>, pos: usize) {
    let x1 = em.fetch16(pos);
    em.param("x1", Value::Signed16(x1));
    let y1 = em.fetch16(pos + 2);
    em.param("y1", Value::Signed16(y1));
    let x2 = em.fetch16(pos + 4);
    em.param("x2", Value::Signed16(x2));
    let y2 = em.fetch16(pos + 6);
    em.param("y2", Value::Signed16(y2));
}

pub(crate) fn color_item(em: &mut Emitter<'_>, pos: usize) {
    let mask = em.fetch8(pos + 10);
    let pixel = em.fetch32(pos);
    em.param("pixel", Value::Hex32(pixel));
    if mask & 1 != 0 {
        let v = em.fetch16(pos + 4);
        em.param("red", Value::Hex16(v));
    }
    if mask & 2 != 0 {
        let v = em.fetch16(pos + 6);
        em.param("green", Value::Hex16(v));
    }
    if mask & 4 != 0 {
        let v = em.fetch16(pos + 8);
        em.param("blue", Value::Hex16(v));
    }
}

pub(crate) fn time_coord(em: &mut Emitter<'_>, pos: usize) {
    let x = em.fetch16(pos + 4);
    em.param("x", Value::Signed16(x));
    let y = em.fetch16(pos + 6);
    em.param("y", Value::Signed16(y));
    let t = em.fetch32(pos);
    em.param("time", Value::Hex32(t));
}

pub(crate) fn font_prop(em: &mut Emitter<'_>, pos: usize) {
    let name = em.fetch32(pos);
    em.param("name", Value::Atom(name));
    let value = em.fetch32(pos + 4);
    em.param("value", Value::Hex32(value));
}

pub(crate) fn char_info(em: &mut Emitter<'_>, pos: usize) {
    let v = em.fetch16(pos);
    em.param("left-side-bearing", Value::Signed16(v));
    let v = em.fetch16(pos + 2);
    em.param("right-side-bearing", Value::Signed16(v));
    let v = em.fetch16(pos + 4);
    em.param("character-width", Value::Signed16(v));
    let v = em.fetch16(pos + 6);
    em.param("ascent", Value::Signed16(v));
    let v = em.fetch16(pos + 8);
    em.param("descent", Value::Signed16(v));
    let v = em.fetch16(pos + 10);
    em.param("attributes", Value::Signed16(v));
}

/// Hex element width for image data of a given bits-per-pixel, in the
/// server's image byte order.
fn image_hex_type(image_byte_order: u8, bits: u8) -> (HexWidth, Option<ByteOrder>) {
    let order = Some(if image_byte_order != 0 {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    });
    match bits {
        32 => (HexWidth::Four, order),
        24 => (HexWidth::Three, order),
        16 => (HexWidth::Two, order),
        _ => (HexWidth::One, None),
    }
}

/// Size and emit a packed image payload. Z-pixmaps take their layout from
/// the pixmap-format table by depth; XY formats use the connection's
/// bitmap scanline unit/pad with one plane per depth bit. Returns the
/// number of payload bytes consumed, or None when the depth has no known
/// format.
pub(crate) fn image_data(
    em: &mut Emitter<'_>,
    conn: &ConnectionState,
    name: &str,
    start: usize,
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
) -> Option<usize> {
    // bits_per_pixel sizes a scanline; unit_bits fixes the hex element
    // width of the dump
    let (bits_per_pixel, pad, planes, unit_bits) = if format == IMAGE_FORMAT_Z_PIXMAP {
        match conn.pixmap_format_for_depth(depth as u8) {
            Some(f) => (
                f.bits_per_pixel as u32,
                f.scanline_pad as u32,
                1,
                f.bits_per_pixel,
            ),
            None => {
                em.marker("<unrecognised image depth>");
                return None;
            }
        }
    } else {
        // XY formats carry one bit per pixel per plane
        (
            1,
            conn.bitmap_scanline_pad as u32,
            depth,
            conn.bitmap_scanline_unit,
        )
    };
    if bits_per_pixel == 0 || pad == 0 {
        em.marker("<unrecognised image depth>");
        return None;
    }

    let scanline_bytes = ((width * bits_per_pixel + pad - 1) & !(pad - 1)) / 8;
    let unit_size = (unit_bits as usize).div_ceil(8).max(1);
    let units = (scanline_bytes as usize / unit_size) * height as usize * planes as usize;
    let total = units * unit_size;

    let (hex_width, order) = image_hex_type(conn.image_byte_order, unit_bits);
    let bytes = em.fetch_bytes(start, total);
    em.param(name, Value::Hex(hex_width, order, bytes));
    Some(total)
}

/// Round up to the protocol's 4-byte padding.
pub(crate) fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

/// Depth bookkeeping shared by RenderCreateGlyphSet and
/// RenderReferenceGlyphSet: the new id inherits the depth of the
/// PICTFORMAT or GLYPHSET it was created from.
pub(crate) fn inherit_resource_depth(conn: &mut ConnectionState, new_id: Xid, source_id: Xid) {
    if let Some(depth) = conn.resource_depth(source_id) {
        conn.set_resource_depth(new_id, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PixmapFormat;
    use crate::trace::connection::TraceMode;

    fn conn_with_formats() -> ConnectionState {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.byte_order = Some(ByteOrder::LittleEndian);
        conn.bitmap_scanline_unit = 32;
        conn.bitmap_scanline_pad = 32;
        conn.image_byte_order = 0;
        conn.pixmap_formats = vec![
            PixmapFormat {
                depth: 1,
                bits_per_pixel: 1,
                scanline_pad: 32,
            },
            PixmapFormat {
                depth: 24,
                bits_per_pixel: 32,
                scanline_pad: 32,
            },
        ];
        conn
    }

    #[test]
    fn test_zpixmap_sizing() {
        let conn = conn_with_formats();
        // 2x2 at depth 24 (32bpp): 2 pixels * 4 bytes per scanline, no pad
        let payload: Vec<u8> = (0..16).collect();
        let mut em = Emitter::new(&payload, ByteOrder::LittleEndian, 0);
        em.begin_args();
        let used = image_data(&mut em, &conn, "image-data", 0, IMAGE_FORMAT_Z_PIXMAP, 2, 2, 24);
        assert_eq!(used, Some(16));
        assert_eq!(
            em.finish(),
            "(image-data=03020100:07060504:0B0A0908:0F0E0D0C"
        );
    }

    #[test]
    fn test_bitmap_sizing_uses_scanline_unit() {
        let conn = conn_with_formats();
        // 9 pixels wide at 1 bit: padded to one 32-bit unit per scanline
        let payload = vec![0u8; 8];
        let mut em = Emitter::new(&payload, ByteOrder::LittleEndian, 0);
        em.begin_args();
        let used = image_data(&mut em, &conn, "bits", 0, 0, 9, 2, 1);
        assert_eq!(used, Some(8));
    }

    #[test]
    fn test_unknown_depth_marker() {
        let conn = conn_with_formats();
        let mut em = Emitter::new(&[], ByteOrder::LittleEndian, 0);
        em.begin_args();
        let used = image_data(&mut em, &conn, "image-data", 0, IMAGE_FORMAT_Z_PIXMAP, 2, 2, 15);
        assert_eq!(used, None);
        assert_eq!(em.finish(), "(<unrecognised image depth>");
    }
}
