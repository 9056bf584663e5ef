//! RENDER Extension
//!
//! Picture requests (minors 0..=36), the query replies, and the depth
//! bookkeeping that RenderAddGlyphs needs: glyphset depths are inherited
//! from the PICTFORMAT or GLYPHSET they were created from, and picture
//! format depths come from the RenderQueryPictFormats reply.

use super::common::{image_data, inherit_resource_depth, pad4, rectangle};
use super::params::{Emitter, HexWidth, Value};
use super::{ReplyScope, RequestScope};
use crate::protocol::types::IMAGE_FORMAT_Z_PIXMAP;

/// Porter-Duff and conjoint/disjoint compositing operators.
const PICT_OP: &[(u32, &str)] = &[
    (0, "Clear"),
    (1, "Src"),
    (2, "Dst"),
    (3, "Over"),
    (4, "OverReverse"),
    (5, "In"),
    (6, "InReverse"),
    (7, "Out"),
    (8, "OutReverse"),
    (9, "Atop"),
    (10, "AtopReverse"),
    (11, "Xor"),
    (12, "Add"),
    (13, "Saturate"),
    (0x10, "DisjointClear"),
    (0x11, "DisjointSrc"),
    (0x12, "DisjointDst"),
    (0x13, "DisjointOver"),
    (0x14, "DisjointOverReverse"),
    (0x15, "DisjointIn"),
    (0x16, "DisjointInReverse"),
    (0x17, "DisjointOut"),
    (0x18, "DisjointOutReverse"),
    (0x19, "DisjointAtop"),
    (0x1A, "DisjointAtopReverse"),
    (0x1B, "DisjointXor"),
    (0x20, "ConjointClear"),
    (0x21, "ConjointSrc"),
    (0x22, "ConjointDst"),
    (0x23, "ConjointOver"),
    (0x24, "ConjointOverReverse"),
    (0x25, "ConjointIn"),
    (0x26, "ConjointInReverse"),
    (0x27, "ConjointOut"),
    (0x28, "ConjointOutReverse"),
    (0x29, "ConjointAtop"),
    (0x2A, "ConjointAtopReverse"),
    (0x2B, "ConjointXor"),
];

/// The picture-attribute value list shared by RenderCreatePicture and
/// RenderChangePicture. `pos` is the offset of the BITMASK.
fn picture_values(em: &mut Emitter<'_>, pos: usize) {
    let bitmask = em.fetch32(pos);
    let mut i = pos + 4;
    if bitmask & 0x0000_0001 != 0 {
        em.param(
            "repeat",
            Value::Enum(
                em.fetch32(i),
                &[(0, "None"), (1, "Normal"), (2, "Pad"), (3, "Reflect")],
            ),
        );
        i += 4;
    }
    if bitmask & 0x0000_0002 != 0 {
        em.param_spec("alpha-map", Value::Picture(em.fetch32(i)), &[(0, "None")]);
        i += 4;
    }
    if bitmask & 0x0000_0004 != 0 {
        em.param("alpha-x-origin", Value::Signed16(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0008 != 0 {
        em.param("alpha-y-origin", Value::Signed16(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0010 != 0 {
        em.param("clip-x-origin", Value::Signed16(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0020 != 0 {
        em.param("clip-y-origin", Value::Signed16(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0040 != 0 {
        em.param_spec("clip-mask", Value::Pixmap(em.fetch32(i)), &[(0, "None")]);
        i += 4;
    }
    if bitmask & 0x0000_0080 != 0 {
        em.param("graphics-exposures", Value::Bool(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0100 != 0 {
        em.param(
            "subwindow-mode",
            Value::Enum(em.fetch32(i), &[(0, "ClipByChildren"), (1, "IncludeInferiors")]),
        );
        i += 4;
    }
    if bitmask & 0x0000_0200 != 0 {
        em.param(
            "poly-edge",
            Value::Enum(em.fetch32(i), &[(0, "Sharp"), (1, "Smooth")]),
        );
        i += 4;
    }
    if bitmask & 0x0000_0400 != 0 {
        em.param(
            "poly-mode",
            Value::Enum(em.fetch32(i), &[(0, "Precise"), (1, "Imprecise")]),
        );
        i += 4;
    }
    if bitmask & 0x0000_0800 != 0 {
        em.param_spec("dither", Value::Atom(em.fetch32(i)), &[(0, "None")]);
        i += 4;
    }
    if bitmask & 0x0000_1000 != 0 {
        em.param("component-alpha", Value::Bool(em.fetch32(i)));
    }
}

/// Common head of the composite-style requests: op, src, dst and an
/// optional mask format.
fn composite_geometry_head(em: &mut Emitter<'_>) {
    em.param("op", Value::Enum(em.fetch8(4), PICT_OP));
    em.param("src", Value::Picture(em.fetch32(8)));
    em.param("src-x", Value::Signed16(em.fetch16(20)));
    em.param("src-y", Value::Signed16(em.fetch16(22)));
    em.param("dst", Value::Picture(em.fetch32(12)));
    em.param_spec("mask-format", Value::PictFormat(em.fetch32(16)), &[(0, "None")]);
}

/// An RGBA color as a nested set.
fn render_color(em: &mut Emitter<'_>, name: &str, pos: usize) {
    em.set_begin(name);
    em.param("red", Value::Hex16(em.fetch16(pos)));
    em.param("green", Value::Hex16(em.fetch16(pos + 2)));
    em.param("blue", Value::Hex16(em.fetch16(pos + 4)));
    em.param("alpha", Value::Hex16(em.fetch16(pos + 6)));
    em.set_end();
}

/// A fixed-point point as a nested set.
fn render_point(em: &mut Emitter<'_>, name: &str, pos: usize) {
    em.set_begin(name);
    em.param("x", Value::Fixed(em.fetch32(pos)));
    em.param("y", Value::Fixed(em.fetch32(pos + 4)));
    em.set_end();
}

/// The stop list shared by the three gradient constructors.
fn gradient_stops(em: &mut Emitter<'_>, count_pos: usize) {
    let n = em.fetch32(count_pos) as usize;
    let mut pos = count_pos + 4;
    for i in 0..n {
        em.param(&format!("stops[{}]", i), Value::Fixed(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            return;
        }
    }
    for i in 0..n {
        render_color(em, &format!("stop_colors[{}]", i), pos);
        pos += 8;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn request(em: &mut Emitter<'_>, s: &mut RequestScope<'_>, minor: u8) {
    match minor {
        0 => {
            s.name(em, "RenderQueryVersion");
            em.param("client-major-version", Value::Unsigned(em.fetch32(4)));
            em.param("client-minor-version", Value::Unsigned(em.fetch32(8)));
            s.expect_reply();
        }
        1 => {
            s.name(em, "RenderQueryPictFormats");
            s.expect_reply();
        }
        2 => {
            s.name(em, "RenderQueryPictIndexValues");
            em.param("format", Value::PictFormat(em.fetch32(4)));
            s.expect_reply();
        }
        3 => {
            // not supported by X.Org or Xlib, so the payload layout is
            // unknown
            s.name(em, "RenderQueryDithers");
            em.marker("<unknown request format>");
            s.expect_reply();
        }
        4 => {
            s.name(em, "RenderCreatePicture");
            em.param("pid", Value::Picture(em.fetch32(4)));
            em.param("drawable", Value::Drawable(em.fetch32(8)));
            em.param("format", Value::PictFormat(em.fetch32(12)));
            picture_values(em, 16);
        }
        5 => {
            s.name(em, "RenderChangePicture");
            em.param("picture", Value::Picture(em.fetch32(4)));
            picture_values(em, 8);
        }
        6 => {
            s.name(em, "RenderSetPictureClipRectangles");
            em.param("picture", Value::Picture(em.fetch32(4)));
            em.param("clip-x-origin", Value::Signed16(em.fetch16(8)));
            em.param("clip-y-origin", Value::Signed16(em.fetch16(10)));
            let len = em.packet_len();
            let mut pos = 12;
            let mut i = 0;
            while pos + 8 <= len {
                em.set_begin(&format!("rectangles[{}]", i));
                rectangle(em, pos);
                em.set_end();
                pos += 8;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        7 => {
            s.name(em, "RenderFreePicture");
            em.param("picture", Value::Picture(em.fetch32(4)));
        }
        8 => {
            s.name(em, "RenderComposite");
            em.param("op", Value::Enum(em.fetch8(4), PICT_OP));
            em.param("src", Value::Picture(em.fetch32(8)));
            em.param_spec("mask", Value::Picture(em.fetch32(12)), &[(0, "None")]);
            em.param("dst", Value::Picture(em.fetch32(16)));
            em.param("src-x", Value::Signed16(em.fetch16(20)));
            em.param("src-y", Value::Signed16(em.fetch16(22)));
            em.param("mask-x", Value::Signed16(em.fetch16(24)));
            em.param("mask-y", Value::Signed16(em.fetch16(26)));
            em.param("dst-x", Value::Signed16(em.fetch16(28)));
            em.param("dst-y", Value::Signed16(em.fetch16(30)));
            em.param("width", Value::Unsigned(em.fetch16(32)));
            em.param("height", Value::Unsigned(em.fetch16(34)));
        }
        9 => {
            s.name(em, "RenderScale");
            em.param("src", Value::Picture(em.fetch32(4)));
            em.param("dst", Value::Picture(em.fetch32(8)));
            em.param("color-scale", Value::Hex32(em.fetch32(12)));
            em.param("alpha-scale", Value::Hex32(em.fetch32(16)));
            em.param("src-x", Value::Signed16(em.fetch16(20)));
            em.param("src-y", Value::Signed16(em.fetch16(22)));
            em.param("dst-x", Value::Signed16(em.fetch16(24)));
            em.param("dst-y", Value::Signed16(em.fetch16(26)));
            em.param("width", Value::Unsigned(em.fetch16(28)));
            em.param("height", Value::Unsigned(em.fetch16(30)));
        }
        10 => {
            s.name(em, "RenderTrapezoids");
            composite_geometry_head(em);
            let len = em.packet_len();
            let mut pos = 24;
            let mut i = 0;
            while pos + 40 <= len {
                em.set_begin(&format!("trapezoids[{}]", i));
                em.param("top", Value::Fixed(em.fetch32(pos)));
                em.param("bottom", Value::Fixed(em.fetch32(pos + 4)));
                em.param("left.p1.x", Value::Fixed(em.fetch32(pos + 8)));
                em.param("left.p1.y", Value::Fixed(em.fetch32(pos + 12)));
                em.param("left.p2.x", Value::Fixed(em.fetch32(pos + 16)));
                em.param("left.p2.y", Value::Fixed(em.fetch32(pos + 20)));
                em.param("right.p1.x", Value::Fixed(em.fetch32(pos + 24)));
                em.param("right.p1.y", Value::Fixed(em.fetch32(pos + 28)));
                em.param("right.p2.x", Value::Fixed(em.fetch32(pos + 32)));
                em.param("right.p2.y", Value::Fixed(em.fetch32(pos + 36)));
                em.set_end();
                pos += 40;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        11 => {
            s.name(em, "RenderTriangles");
            composite_geometry_head(em);
            let len = em.packet_len();
            let mut pos = 24;
            let mut i = 0;
            while pos + 24 <= len {
                em.set_begin(&format!("triangles[{}]", i));
                em.param("p1.x", Value::Fixed(em.fetch32(pos)));
                em.param("p1.y", Value::Fixed(em.fetch32(pos + 4)));
                em.param("p2.x", Value::Fixed(em.fetch32(pos + 8)));
                em.param("p2.y", Value::Fixed(em.fetch32(pos + 12)));
                em.param("p3.x", Value::Fixed(em.fetch32(pos + 16)));
                em.param("p3.y", Value::Fixed(em.fetch32(pos + 20)));
                em.set_end();
                pos += 24;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        12 | 13 => {
            s.name(em, if minor == 12 { "RenderTriStrip" } else { "RenderTriFan" });
            composite_geometry_head(em);
            let len = em.packet_len();
            let mut pos = 24;
            let mut i = 0;
            while pos + 8 <= len {
                render_point(em, &format!("points[{}]", i), pos);
                pos += 8;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        14 => {
            s.name(em, "RenderColorTrapezoids");
            em.marker("<unknown request format>");
        }
        15 => {
            s.name(em, "RenderColorTriangles");
            em.marker("<unknown request format>");
        }
        16 => {
            s.name(em, "RenderTransform");
            em.marker("<unknown request format>");
        }
        17 | 18 => {
            if minor == 17 {
                s.name(em, "RenderCreateGlyphSet");
                em.param("gsid", Value::GlyphSet(em.fetch32(4)));
                em.param("format", Value::PictFormat(em.fetch32(8)));
            } else {
                s.name(em, "RenderReferenceGlyphSet");
                em.param("gsid", Value::GlyphSet(em.fetch32(4)));
                em.param("existing", Value::GlyphSet(em.fetch32(8)));
            }
            if !em.overflowed() {
                let new_id = em.fetch32(4);
                let source = em.fetch32(8);
                inherit_resource_depth(s.conn, new_id, source);
            }
        }
        19 => {
            s.name(em, "RenderFreeGlyphSet");
            em.param("glyphset", Value::GlyphSet(em.fetch32(4)));
        }
        20 => {
            s.name(em, "RenderAddGlyphs");
            em.param("glyphset", Value::GlyphSet(em.fetch32(4)));
            let n = em.fetch32(8) as usize;
            let mut pos = 12;
            for i in 0..n {
                em.param(&format!("glyphids[{}]", i), Value::Hex32(em.fetch32(pos)));
                pos += 4;
                if i + 1 < n && em.list_limit_reached() {
                    break;
                }
            }
            let info_base = 12 + 4 * n;
            pos = info_base;
            for i in 0..n {
                em.set_begin(&format!("glyphs[{}]", i));
                em.param("width", Value::Unsigned(em.fetch16(pos)));
                em.param("height", Value::Unsigned(em.fetch16(pos + 2)));
                em.param("x", Value::Signed16(em.fetch16(pos + 4)));
                em.param("y", Value::Signed16(em.fetch16(pos + 6)));
                em.param("off-x", Value::Signed16(em.fetch16(pos + 8)));
                em.param("off-y", Value::Signed16(em.fetch16(pos + 10)));
                em.set_end();
                pos += 12;
                if i + 1 < n && em.list_limit_reached() {
                    break;
                }
            }
            let depth = s.conn.resource_depth(em.fetch32(4)).unwrap_or(0);
            pos = info_base + 12 * n;
            for i in 0..n {
                let width = em.fetch16(info_base + 12 * i);
                let height = em.fetch16(info_base + 12 * i + 2);
                match image_data(
                    em,
                    s.conn,
                    &format!("glyphimages[{}]", i),
                    pos,
                    IMAGE_FORMAT_Z_PIXMAP,
                    width,
                    height,
                    depth as u32,
                ) {
                    // without a known depth there is no way to find the
                    // next image
                    None => break,
                    Some(used) => pos += pad4(used),
                }
                if i + 1 < n && em.list_limit_reached() {
                    break;
                }
            }
        }
        21 => {
            s.name(em, "RenderAddGlyphsFromPicture");
            em.marker("<unknown request format>");
        }
        22 => {
            s.name(em, "RenderFreeGlyphs");
            em.param("glyphset", Value::GlyphSet(em.fetch32(4)));
            let n = em.fetch32(8) as usize;
            let mut pos = 12;
            for i in 0..n {
                em.param(&format!("glyphs[{}]", i), Value::Hex32(em.fetch32(pos)));
                pos += 4;
                if i + 1 < n && em.list_limit_reached() {
                    break;
                }
            }
        }
        23 | 24 | 25 => {
            s.name(
                em,
                match minor {
                    23 => "RenderCompositeGlyphs8",
                    24 => "RenderCompositeGlyphs16",
                    _ => "RenderCompositeGlyphs32",
                },
            );
            em.param("op", Value::Enum(em.fetch8(4), PICT_OP));
            em.param("src", Value::Picture(em.fetch32(8)));
            em.param("dst", Value::Picture(em.fetch32(12)));
            em.param_spec("mask-format", Value::PictFormat(em.fetch32(16)), &[(0, "None")]);
            em.param("glyphset", Value::Glyphable(em.fetch32(20)));
            em.param("src-x", Value::Signed16(em.fetch16(24)));
            em.param("src-y", Value::Signed16(em.fetch16(26)));
            // a GLYPHITEM stream: 8-byte headers followed by packed glyph
            // ids, or a glyphset change under the escape length 255
            let len = em.packet_len();
            let mut pos = 28;
            let mut i = 0;
            while pos < len {
                let item_len = em.fetch8(pos) as usize;
                em.set_begin(&format!("items[{}]", i));
                if item_len == 255 {
                    em.param("glyphset", Value::GlyphSet(em.fetch32(pos + 8)));
                    pos += 12;
                } else {
                    em.param("delta-x", Value::Signed16(em.fetch16(pos + 4)));
                    em.param("delta-y", Value::Signed16(em.fetch16(pos + 6)));
                    pos += 8;
                    let elsize = match minor {
                        23 => 1,
                        24 => 2,
                        _ => 4,
                    };
                    let width = match minor {
                        23 => HexWidth::One,
                        24 => HexWidth::Two,
                        _ => HexWidth::Four,
                    };
                    em.param(
                        "string",
                        Value::Hex(width, None, em.fetch_bytes(pos, item_len * elsize)),
                    );
                    pos = pad4(pos + item_len * elsize);
                }
                em.set_end();
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        26 => {
            s.name(em, "RenderFillRectangles");
            em.param("op", Value::Enum(em.fetch8(4), PICT_OP));
            em.param("dst", Value::Picture(em.fetch32(8)));
            render_color(em, "color", 12);
            let len = em.packet_len();
            let mut pos = 20;
            let mut i = 0;
            while pos + 8 <= len {
                em.set_begin(&format!("rectangles[{}]", i));
                rectangle(em, pos);
                em.set_end();
                pos += 8;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        27 => {
            s.name(em, "RenderCreateCursor");
            em.param("cid", Value::Cursor(em.fetch32(4)));
            em.param("src", Value::Picture(em.fetch32(8)));
            em.param("x", Value::Unsigned(em.fetch16(12)));
            em.param("y", Value::Unsigned(em.fetch16(14)));
        }
        28 => {
            s.name(em, "RenderSetPictureTransform");
            em.param("picture", Value::Picture(em.fetch32(4)));
            em.set_begin("transform");
            em.param("p11", Value::Fixed(em.fetch32(8)));
            em.param("p12", Value::Fixed(em.fetch32(12)));
            em.param("p13", Value::Fixed(em.fetch32(16)));
            em.param("p21", Value::Fixed(em.fetch32(20)));
            em.param("p22", Value::Fixed(em.fetch32(24)));
            em.param("p23", Value::Fixed(em.fetch32(28)));
            em.param("p31", Value::Fixed(em.fetch32(32)));
            em.param("p32", Value::Fixed(em.fetch32(36)));
            em.param("p33", Value::Fixed(em.fetch32(40)));
            em.set_end();
        }
        29 => {
            s.name(em, "RenderQueryFilters");
            em.param("drawable", Value::Drawable(em.fetch32(4)));
            s.expect_reply();
        }
        30 => {
            s.name(em, "RenderSetPictureFilter");
            em.param("picture", Value::Picture(em.fetch32(4)));
            let name_len = em.fetch16(8) as usize;
            em.param("name", Value::String(em.fetch_bytes(12, name_len)));
            let len = em.packet_len();
            let mut pos = pad4(12 + name_len);
            let mut i = 0;
            while pos + 4 <= len {
                em.param(&format!("values[{}]", i), Value::Fixed(em.fetch32(pos)));
                pos += 4;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        31 => {
            s.name(em, "RenderCreateAnimCursor");
            em.param("cid", Value::Cursor(em.fetch32(4)));
            let len = em.packet_len();
            let mut pos = 8;
            let mut i = 0;
            while pos + 8 <= len {
                em.set_begin(&format!("cursors[{}]", i));
                em.param("cursor", Value::Cursor(em.fetch32(pos)));
                em.param("delay", Value::Unsigned(em.fetch32(pos + 4)));
                em.set_end();
                pos += 8;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        32 => {
            s.name(em, "RenderAddTraps");
            em.param("picture", Value::Picture(em.fetch32(4)));
            em.param("off-x", Value::Signed16(em.fetch16(8)));
            em.param("off-y", Value::Signed16(em.fetch16(10)));
            let len = em.packet_len();
            let mut pos = 12;
            let mut i = 0;
            while pos + 24 <= len {
                em.set_begin(&format!("trapezoids[{}]", i));
                em.set_begin("top");
                em.param("l", Value::Fixed(em.fetch32(pos)));
                em.param("r", Value::Fixed(em.fetch32(pos + 4)));
                em.param("y", Value::Fixed(em.fetch32(pos + 8)));
                em.set_end();
                em.set_begin("bot");
                em.param("l", Value::Fixed(em.fetch32(pos + 12)));
                em.param("r", Value::Fixed(em.fetch32(pos + 16)));
                em.param("y", Value::Fixed(em.fetch32(pos + 20)));
                em.set_end();
                em.set_end();
                pos += 24;
                i += 1;
                if pos < len && em.list_limit_reached() {
                    break;
                }
            }
        }
        33 => {
            s.name(em, "RenderCreateSolidFill");
            em.param("pid", Value::Picture(em.fetch32(4)));
            render_color(em, "color", 8);
        }
        34 => {
            s.name(em, "RenderCreateLinearGradient");
            em.param("pid", Value::Picture(em.fetch32(4)));
            render_point(em, "p1", 8);
            render_point(em, "p2", 16);
            gradient_stops(em, 24);
        }
        35 => {
            s.name(em, "RenderCreateRadialGradient");
            em.param("pid", Value::Picture(em.fetch32(4)));
            render_point(em, "inner_center", 8);
            render_point(em, "outer_center", 16);
            em.param("inner_radius", Value::Fixed(em.fetch32(24)));
            em.param("outer_radius", Value::Fixed(em.fetch32(28)));
            gradient_stops(em, 32);
        }
        36 => {
            s.name(em, "RenderCreateConicalGradient");
            em.param("pid", Value::Picture(em.fetch32(4)));
            render_point(em, "center", 8);
            em.param("angle", Value::Fixed(em.fetch32(16)));
            gradient_stops(em, 20);
        }
        _ => {
            s.named(em, &format!("RENDER:UnknownExtensionRequest{}", minor), false);
            em.param("bytes", Value::Unsigned(em.packet_len() as u32));
        }
    }
}

pub(super) fn reply(em: &mut Emitter<'_>, s: &mut ReplyScope<'_>, minor: u8) {
    match minor {
        0 => {
            em.param("major-version", Value::Unsigned(em.fetch32(8)));
            em.param("minor-version", Value::Unsigned(em.fetch32(12)));
        }
        1 => query_pict_formats_reply(em, s),
        2 => {
            let n = em.fetch32(8) as usize;
            let mut pos = 32;
            for i in 0..n {
                em.set_begin(&format!("values[{}]", i));
                em.param("pixel", Value::Hex32(em.fetch32(pos)));
                em.param("red", Value::Hex16(em.fetch16(pos + 4)));
                em.param("green", Value::Hex16(em.fetch16(pos + 6)));
                em.param("blue", Value::Hex16(em.fetch16(pos + 8)));
                em.param("alpha", Value::Hex16(em.fetch16(pos + 10)));
                em.set_end();
                pos += 12;
                if i + 1 < n && em.list_limit_reached() {
                    break;
                }
            }
        }
        // RenderQueryDithers has no documented reply layout
        3 => {}
        29 => {
            let n = em.fetch32(8) as usize;
            let mut pos = 32;
            for i in 0..n {
                em.param(&format!("aliases[{}]", i), Value::Unsigned(em.fetch16(pos)));
                pos += 2;
                if i + 1 < n && em.list_limit_reached() {
                    return;
                }
            }
            let n = em.fetch32(12) as usize;
            for i in 0..n {
                let len = em.fetch8(pos) as usize;
                em.param(
                    &format!("filters[{}]", i),
                    Value::String(em.fetch_bytes(pos + 1, len)),
                );
                pos += 1 + len;
                if i + 1 < n && em.list_limit_reached() {
                    break;
                }
            }
        }
        _ => em.marker("<unable to decode reply data>"),
    }
}

fn query_pict_formats_reply(em: &mut Emitter<'_>, s: &mut ReplyScope<'_>) {
    // first pass: remember the depth of every advertised picture format
    let n = em.fetch32(8) as usize;
    let mut pos = 32;
    for _ in 0..n {
        let id = em.fetch32(pos);
        let depth = em.fetch8(pos + 5) as u8;
        if !em.overflowed() {
            s.conn.set_resource_depth(id, depth);
        }
        pos += 28;
    }

    // second pass: log as usual
    let mut pos = 32;
    for i in 0..n {
        em.set_begin(&format!("formats[{}]", i));
        em.param("id", Value::PictFormat(em.fetch32(pos)));
        em.param(
            "type",
            Value::Enum(em.fetch8(pos + 4), &[(0, "Indexed"), (1, "Direct")]),
        );
        em.param("depth", Value::Unsigned(em.fetch8(pos + 5)));
        em.set_begin("direct");
        em.param("red-shift", Value::Unsigned(em.fetch16(pos + 8)));
        em.param("red-mask", Value::Hex16(em.fetch16(pos + 10)));
        em.param("green-shift", Value::Unsigned(em.fetch16(pos + 12)));
        em.param("green-mask", Value::Hex16(em.fetch16(pos + 14)));
        em.param("blue-shift", Value::Unsigned(em.fetch16(pos + 16)));
        em.param("blue-mask", Value::Hex16(em.fetch16(pos + 18)));
        em.param("alpha-shift", Value::Unsigned(em.fetch16(pos + 20)));
        em.param("alpha-mask", Value::Hex16(em.fetch16(pos + 22)));
        em.set_end();
        em.param_spec("colormap", Value::Colormap(em.fetch32(pos + 24)), &[(0, "None")]);
        em.set_end();
        pos += 28;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }

    let nscreens = em.fetch32(12) as usize;
    for i in 0..nscreens {
        let screen_start = pos;
        em.set_begin(&format!("screens[{}]", i));
        let ndepths = em.fetch32(pos) as usize;
        pos += 8;
        for j in 0..ndepths {
            em.set_begin(&format!("depths[{}]", j));
            em.param("depth", Value::Unsigned(em.fetch8(pos)));
            let nvisuals = em.fetch16(pos + 2) as usize;
            pos += 8;
            for k in 0..nvisuals {
                em.set_begin(&format!("visuals[{}]", k));
                em.param_spec("visual", Value::VisualId(em.fetch32(pos)), &[(0, "None")]);
                em.param("format", Value::PictFormat(em.fetch32(pos + 4)));
                em.set_end();
                pos += 8;
                if k + 1 < nvisuals && em.list_limit_reached() {
                    break;
                }
            }
            em.set_end();
            if j + 1 < ndepths && em.list_limit_reached() {
                break;
            }
        }
        em.param("fallback", Value::PictFormat(em.fetch32(screen_start + 4)));
        em.set_end();
        if i + 1 < nscreens && em.list_limit_reached() {
            break;
        }
    }

    let nsubpixels = em.fetch32(24) as usize;
    for i in 0..nsubpixels {
        em.param(
            &format!("subpixels[{}]", i),
            Value::Enum(
                em.fetch8(pos),
                &[
                    (0, "Unknown"),
                    (1, "HorizontalRGB"),
                    (2, "HorizontalBGR"),
                    (3, "VerticalRGB"),
                    (4, "VerticalBGR"),
                    (5, "None"),
                ],
            ),
        );
        pos += 1;
        if i + 1 < nsubpixels && em.list_limit_reached() {
            break;
        }
    }
}
