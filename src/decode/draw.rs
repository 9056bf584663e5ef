//! Pixmap, Graphics-Context and Drawing Requests
//!
//! Core opcodes 53..=73, with the GetImage reply.

use super::common::{arc, image_data, point, rectangle, segment};
use super::params::{Emitter, Value};
use super::{ReplyScope, RequestScope};

const COORDINATE_MODE: &[(u32, &str)] = &[(0, "Origin"), (1, "Previous")];

const IMAGE_FORMAT: &[(u32, &str)] = &[(0, "Bitmap"), (1, "XYPixmap"), (2, "ZPixmap")];

pub(super) fn create_pixmap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CreatePixmap");
    em.param("pid", Value::Pixmap(em.fetch32(4)));
    em.param("drawable", Value::Drawable(em.fetch32(8)));
    em.param("depth", Value::Unsigned(em.fetch8(1)));
    em.param("width", Value::Unsigned(em.fetch16(10)));
    em.param("height", Value::Unsigned(em.fetch16(12)));
}

pub(super) fn free_pixmap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "FreePixmap");
    em.param("pixmap", Value::Pixmap(em.fetch32(4)));
}

/// The GC value list shared by CreateGC and ChangeGC. `pos` is the offset
/// of the BITMASK.
fn gc_values(em: &mut Emitter<'_>, pos: usize) {
    let bitmask = em.fetch32(pos);
    let mut i = pos + 4;
    if bitmask & 0x0000_0001 != 0 {
        em.param(
            "function",
            Value::Enum(
                em.fetch8(i),
                &[
                    (0, "Clear"),
                    (1, "And"),
                    (2, "AndReverse"),
                    (3, "Copy"),
                    (4, "AndInverted"),
                    (5, "NoOp"),
                    (6, "Xor"),
                    (7, "Or"),
                    (8, "Nor"),
                    (9, "Equiv"),
                    (10, "Invert"),
                    (11, "OrReverse"),
                    (12, "CopyInverted"),
                    (13, "OrInverted"),
                    (14, "Nand"),
                    (15, "Set"),
                ],
            ),
        );
        i += 4;
    }
    if bitmask & 0x0000_0002 != 0 {
        em.param("plane-mask", Value::Hex32(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0004 != 0 {
        em.param("foreground", Value::Hex32(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0008 != 0 {
        em.param("background", Value::Hex32(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0010 != 0 {
        em.param("line-width", Value::Unsigned(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0000_0020 != 0 {
        em.param(
            "line-style",
            Value::Enum(em.fetch8(i), &[(0, "Solid"), (1, "OnOffDash"), (2, "DoubleDash")]),
        );
        i += 4;
    }
    if bitmask & 0x0000_0040 != 0 {
        em.param(
            "cap-style",
            Value::Enum(
                em.fetch8(i),
                &[(0, "NotLast"), (1, "Butt"), (2, "Round"), (3, "Projecting")],
            ),
        );
        i += 4;
    }
    if bitmask & 0x0000_0080 != 0 {
        em.param(
            "join-style",
            Value::Enum(em.fetch8(i), &[(0, "Miter"), (1, "Round"), (2, "Bevel")]),
        );
        i += 4;
    }
    if bitmask & 0x0000_0100 != 0 {
        em.param(
            "fill-style",
            Value::Enum(
                em.fetch8(i),
                &[(0, "Solid"), (1, "Tiled"), (2, "Stippled"), (3, "OpaqueStippled")],
            ),
        );
        i += 4;
    }
    if bitmask & 0x0000_0200 != 0 {
        em.param(
            "fill-rule",
            Value::Enum(em.fetch8(i), &[(0, "EvenOdd"), (1, "Winding")]),
        );
        i += 4;
    }
    if bitmask & 0x0000_0400 != 0 {
        em.param("tile", Value::Pixmap(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0800 != 0 {
        em.param("stipple", Value::Pixmap(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_1000 != 0 {
        em.param("tile-stipple-x-origin", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0000_2000 != 0 {
        em.param("tile-stipple-y-origin", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0000_4000 != 0 {
        em.param("font", Value::Font(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_8000 != 0 {
        em.param(
            "subwindow-mode",
            Value::Enum(em.fetch8(i), &[(0, "ClipByChildren"), (1, "IncludeInferiors")]),
        );
        i += 4;
    }
    if bitmask & 0x0001_0000 != 0 {
        em.param("graphics-exposures", Value::Bool(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0002_0000 != 0 {
        em.param("clip-x-origin", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0004_0000 != 0 {
        em.param("clip-y-origin", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0008_0000 != 0 {
        em.param_spec("clip-mask", Value::Pixmap(em.fetch32(i)), &[(0, "None")]);
        i += 4;
    }
    if bitmask & 0x0010_0000 != 0 {
        em.param("dash-offset", Value::Unsigned(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0020_0000 != 0 {
        em.param("dashes", Value::Unsigned(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0040_0000 != 0 {
        em.param(
            "arc-mode",
            Value::Enum(em.fetch8(i), &[(0, "Chord"), (1, "PieSlice")]),
        );
    }
}

pub(super) fn create_gc(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CreateGC");
    em.param("cid", Value::GContext(em.fetch32(4)));
    em.param("drawable", Value::Drawable(em.fetch32(8)));
    gc_values(em, 12);
}

pub(super) fn change_gc(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeGC");
    em.param("gc", Value::GContext(em.fetch32(4)));
    gc_values(em, 8);
}

pub(super) fn copy_gc(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CopyGC");
    em.param("src-gc", Value::GContext(em.fetch32(4)));
    em.param("dst-gc", Value::GContext(em.fetch32(8)));
    em.param(
        "value-mask",
        Value::Mask(
            em.fetch32(12),
            &[
                (0x0000_0001, "function"),
                (0x0000_0002, "plane-mask"),
                (0x0000_0004, "foreground"),
                (0x0000_0008, "background"),
                (0x0000_0010, "line-width"),
                (0x0000_0020, "line-style"),
                (0x0000_0040, "cap-style"),
                (0x0000_0080, "join-style"),
                (0x0000_0100, "fill-style"),
                (0x0000_0200, "fill-rule"),
                (0x0000_0400, "tile"),
                (0x0000_0800, "stipple"),
                (0x0000_1000, "tile-stipple-x-origin"),
                (0x0000_2000, "tile-stipple-y-origin"),
                (0x0000_4000, "font"),
                (0x0000_8000, "subwindow-mode"),
                (0x0001_0000, "graphics-exposures"),
                (0x0002_0000, "clip-x-origin"),
                (0x0004_0000, "clip-y-origin"),
                (0x0008_0000, "clip-mask"),
                (0x0010_0000, "dash-offset"),
                (0x0020_0000, "dashes"),
                (0x0040_0000, "arc-mode"),
            ],
        ),
    );
}

pub(super) fn set_dashes(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetDashes");
    em.param("gc", Value::GContext(em.fetch32(4)));
    em.param("dash-offset", Value::Unsigned(em.fetch16(8)));
    let n = em.fetch16(10) as usize;
    for i in 0..n {
        em.param(&format!("dashes[{}]", i), Value::Unsigned(em.fetch8(12 + i)));
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn set_clip_rectangles(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetClipRectangles");
    em.param("gc", Value::GContext(em.fetch32(4)));
    em.param("clip-x-origin", Value::Signed16(em.fetch16(8)));
    em.param("clip-y-origin", Value::Signed16(em.fetch16(10)));
    struct_list(em, 12, 8, "rectangles", rectangle);
    em.param(
        "ordering",
        Value::Enum(
            em.fetch8(1),
            &[(0, "UnSorted"), (1, "YSorted"), (2, "YXSorted"), (3, "YXBanded")],
        ),
    );
}

pub(super) fn free_gc(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "FreeGC");
    em.param("gc", Value::GContext(em.fetch32(4)));
}

pub(super) fn clear_area(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ClearArea");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param("x", Value::Signed16(em.fetch16(8)));
    em.param("y", Value::Signed16(em.fetch16(10)));
    em.param("width", Value::Unsigned(em.fetch16(12)));
    em.param("height", Value::Unsigned(em.fetch16(14)));
    em.param("exposures", Value::Bool(em.fetch8(1)));
}

pub(super) fn copy_area(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CopyArea");
    em.param("src-drawable", Value::Drawable(em.fetch32(4)));
    em.param("dst-drawable", Value::Drawable(em.fetch32(8)));
    em.param("gc", Value::GContext(em.fetch32(12)));
    em.param("src-x", Value::Signed16(em.fetch16(16)));
    em.param("src-y", Value::Signed16(em.fetch16(18)));
    em.param("width", Value::Unsigned(em.fetch16(24)));
    em.param("height", Value::Unsigned(em.fetch16(26)));
    em.param("dst-x", Value::Signed16(em.fetch16(20)));
    em.param("dst-y", Value::Signed16(em.fetch16(22)));
}

pub(super) fn copy_plane(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CopyPlane");
    em.param("src-drawable", Value::Drawable(em.fetch32(4)));
    em.param("dst-drawable", Value::Drawable(em.fetch32(8)));
    em.param("gc", Value::GContext(em.fetch32(12)));
    em.param("src-x", Value::Signed16(em.fetch16(16)));
    em.param("src-y", Value::Signed16(em.fetch16(18)));
    em.param("width", Value::Unsigned(em.fetch16(24)));
    em.param("height", Value::Unsigned(em.fetch16(26)));
    em.param("dst-x", Value::Signed16(em.fetch16(20)));
    em.param("dst-y", Value::Signed16(em.fetch16(22)));
    em.param("bit-plane", Value::Unsigned(em.fetch32(28)));
}

/// A run of fixed-stride structures filling the rest of the packet.
fn struct_list(
    em: &mut Emitter<'_>,
    start: usize,
    stride: usize,
    label: &str,
    body: fn(&mut Emitter<'_>, usize),
) {
    let len = em.packet_len();
    let mut pos = start;
    let mut i = 0;
    while pos + stride <= len {
        em.set_begin(&format!("{}[{}]", label, i));
        body(em, pos);
        em.set_end();
        pos += stride;
        i += 1;
        if pos < len && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn poly_point(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyPoint");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("coordinate-mode", Value::Enum(em.fetch8(1), COORDINATE_MODE));
    struct_list(em, 12, 4, "points", point);
}

pub(super) fn poly_line(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyLine");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("coordinate-mode", Value::Enum(em.fetch8(1), COORDINATE_MODE));
    struct_list(em, 12, 4, "points", point);
}

pub(super) fn poly_segment(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolySegment");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    struct_list(em, 12, 8, "segments", segment);
}

pub(super) fn poly_rectangle(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyRectangle");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    struct_list(em, 12, 8, "rectangles", rectangle);
}

pub(super) fn poly_arc(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyArc");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    struct_list(em, 12, 12, "arcs", arc);
}

pub(super) fn fill_poly(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "FillPoly");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param(
        "shape",
        Value::Enum(em.fetch8(12), &[(0, "Complex"), (1, "Nonconvex"), (2, "Convex")]),
    );
    em.param("coordinate-mode", Value::Enum(em.fetch8(13), COORDINATE_MODE));
    struct_list(em, 16, 4, "points", point);
}

pub(super) fn poly_fill_rectangle(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyFillRectangle");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    struct_list(em, 12, 8, "rectangles", rectangle);
}

pub(super) fn poly_fill_arc(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PolyFillArc");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    struct_list(em, 12, 12, "arcs", arc);
}

pub(super) fn put_image(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "PutImage");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("gc", Value::GContext(em.fetch32(8)));
    em.param("depth", Value::Unsigned(em.fetch8(21)));
    em.param("width", Value::Unsigned(em.fetch16(12)));
    em.param("height", Value::Unsigned(em.fetch16(14)));
    em.param("dst-x", Value::Signed16(em.fetch16(16)));
    em.param("dst-y", Value::Signed16(em.fetch16(18)));
    em.param("left-pad", Value::Unsigned(em.fetch8(20)));
    em.param("format", Value::Enum(em.fetch8(1), IMAGE_FORMAT));
    let format = em.fetch8(1);
    let width = em.fetch16(12) + em.fetch8(20);
    let height = em.fetch16(14);
    let depth = em.fetch8(21);
    image_data(em, s.conn, "image-data", 24, format, width, height, depth);
}

pub(super) fn get_image(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetImage");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("x", Value::Signed16(em.fetch16(8)));
    em.param("y", Value::Signed16(em.fetch16(10)));
    em.param("width", Value::Unsigned(em.fetch16(12)));
    em.param("height", Value::Unsigned(em.fetch16(14)));
    em.param("plane-mask", Value::Hex32(em.fetch32(16)));
    em.param(
        "format",
        Value::Enum(em.fetch8(1), &[(1, "XYPixmap"), (2, "ZPixmap")]),
    );
    s.expect_reply();
    s.rec.image_format = em.fetch8(1);
    s.rec.image_width = em.fetch16(12);
    s.rec.image_height = em.fetch16(14);
}

pub(super) fn get_image_reply(em: &mut Emitter<'_>, s: &mut ReplyScope<'_>) {
    em.param("depth", Value::Unsigned(em.fetch8(1)));
    em.param_spec("visual", Value::VisualId(em.fetch32(8)), &[(0, "None")]);
    let depth = em.fetch8(1);
    image_data(
        em,
        s.conn,
        "image-data",
        32,
        s.rec.image_format,
        s.rec.image_width,
        s.rec.image_height,
        depth,
    );
}

#[cfg(test)]
mod tests {
    use super::super::decode_request;
    use super::*;
    use crate::protocol::ByteOrder;
    use crate::trace::connection::{ConnectionState, TraceMode};
    use crate::trace::filter::Filters;
    use crate::trace::requests::RequestRecord;

    fn decode(data: &[u8]) -> String {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.byte_order = Some(ByteOrder::LittleEndian);
        let filters = Filters::default();
        let mut rec = RequestRecord::new(data[0] as u16);
        let mut em = Emitter::new(data, ByteOrder::LittleEndian, 0);
        decode_request(&mut em, &mut conn, &filters, &mut rec);
        em.finish()
    }

    #[test]
    fn test_create_gc_value_list() {
        let mut req = vec![55u8, 0, 6, 0];
        req.extend_from_slice(&1u32.to_le_bytes()); // cid
        req.extend_from_slice(&2u32.to_le_bytes()); // drawable
        req.extend_from_slice(&0x0000_0005u32.to_le_bytes()); // function | foreground
        req.extend_from_slice(&[3, 0, 0, 0]); // GXcopy
        req.extend_from_slice(&0x00FF_00FFu32.to_le_bytes());
        assert_eq!(
            decode(&req),
            "CreateGC(cid=g#00000001, drawable=wp#00000002, function=Copy, \
             foreground=0x00FF00FF)"
        );
    }

    #[test]
    fn test_poly_fill_rectangle_list() {
        let mut req = vec![70u8, 0, 7, 0];
        req.extend_from_slice(&9u32.to_le_bytes()); // drawable
        req.extend_from_slice(&7u32.to_le_bytes()); // gc
        for rect in [(1i16, 2i16, 3u16, 4u16), (-5, 6, 7, 8)] {
            req.extend_from_slice(&rect.0.to_le_bytes());
            req.extend_from_slice(&rect.1.to_le_bytes());
            req.extend_from_slice(&rect.2.to_le_bytes());
            req.extend_from_slice(&rect.3.to_le_bytes());
        }
        assert_eq!(
            decode(&req),
            "PolyFillRectangle(drawable=wp#00000009, gc=g#00000007, \
             rectangles[0]={x=1, y=2, width=3, height=4}, \
             rectangles[1]={x=-5, y=6, width=7, height=8})"
        );
    }

    #[test]
    fn test_configure_window_partial_mask() {
        let mut req = vec![12u8, 0, 5, 0];
        req.extend_from_slice(&0x42u32.to_le_bytes()); // window
        req.extend_from_slice(&0x000Cu16.to_le_bytes()); // width | height
        req.extend_from_slice(&[0, 0]);
        req.extend_from_slice(&640u32.to_le_bytes());
        req.extend_from_slice(&480u32.to_le_bytes());
        assert_eq!(
            decode(&req),
            "ConfigureWindow(window=w#00000042, width=640, height=480)"
        );
    }
}
