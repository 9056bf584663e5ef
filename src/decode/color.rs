//! Colormap and Cursor Requests
//!
//! Core opcodes 78..=97, with their replies.

use super::common::color_item;
use super::params::{Emitter, Value};
use super::{ReplyScope, RequestScope};

pub(super) fn create_colormap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CreateColormap");
    em.param("mid", Value::Colormap(em.fetch32(4)));
    em.param("visual", Value::VisualId(em.fetch32(12)));
    em.param("window", Value::Window(em.fetch32(8)));
    em.param("alloc", Value::Enum(em.fetch8(1), &[(0, "None"), (1, "All")]));
}

pub(super) fn free_colormap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "FreeColormap");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
}

pub(super) fn copy_colormap_and_free(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CopyColormapAndFree");
    em.param("mid", Value::Colormap(em.fetch32(4)));
    em.param("src-cmap", Value::Colormap(em.fetch32(8)));
}

pub(super) fn install_colormap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "InstallColormap");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
}

pub(super) fn uninstall_colormap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UninstallColormap");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
}

pub(super) fn list_installed_colormaps(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ListInstalledColormaps");
    em.param("window", Value::Window(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn alloc_color(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "AllocColor");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    em.param("red", Value::Hex16(em.fetch16(8)));
    em.param("green", Value::Hex16(em.fetch16(10)));
    em.param("blue", Value::Hex16(em.fetch16(12)));
    s.expect_reply();
}

pub(super) fn alloc_named_color(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "AllocNamedColor");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    let len = em.fetch16(8) as usize;
    em.param("name", Value::String(em.fetch_bytes(12, len)));
    s.expect_reply();
}

pub(super) fn alloc_color_cells(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "AllocColorCells");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    em.param("colors", Value::Unsigned(em.fetch16(8)));
    em.param("planes", Value::Unsigned(em.fetch16(10)));
    em.param("contiguous", Value::Bool(em.fetch8(1)));
    s.expect_reply();
}

pub(super) fn alloc_color_planes(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "AllocColorPlanes");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    em.param("colors", Value::Unsigned(em.fetch16(8)));
    em.param("reds", Value::Unsigned(em.fetch16(10)));
    em.param("greens", Value::Unsigned(em.fetch16(12)));
    em.param("blues", Value::Unsigned(em.fetch16(14)));
    em.param("contiguous", Value::Bool(em.fetch8(1)));
    s.expect_reply();
}

pub(super) fn free_colors(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "FreeColors");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    let len = em.packet_len();
    let mut pos = 12;
    let mut i = 0;
    while pos + 4 <= len {
        em.param(&format!("pixels[{}]", i), Value::Hex32(em.fetch32(pos)));
        pos += 4;
        i += 1;
        if pos < len && em.list_limit_reached() {
            break;
        }
    }
    em.param("plane-mask", Value::Hex32(em.fetch32(8)));
}

pub(super) fn store_colors(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "StoreColors");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    let len = em.packet_len();
    let mut pos = 8;
    let mut i = 0;
    while pos + 12 <= len {
        em.set_begin(&format!("items[{}]", i));
        color_item(em, pos);
        em.set_end();
        pos += 12;
        i += 1;
        if pos < len && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn store_named_color(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "StoreNamedColor");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    em.param("pixel", Value::Hex32(em.fetch32(8)));
    let len = em.fetch16(12) as usize;
    em.param("name", Value::String(em.fetch_bytes(16, len)));
    em.param("do-red", Value::Bool(em.fetch8(1) & 1));
    em.param("do-green", Value::Bool((em.fetch8(1) >> 1) & 1));
    em.param("do-blue", Value::Bool((em.fetch8(1) >> 2) & 1));
}

pub(super) fn query_colors(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryColors");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    let len = em.packet_len();
    let mut pos = 8;
    let mut i = 0;
    while pos + 4 <= len {
        em.param(&format!("pixels[{}]", i), Value::Hex32(em.fetch32(pos)));
        pos += 4;
        i += 1;
        if pos < len && em.list_limit_reached() {
            break;
        }
    }
    s.expect_reply();
}

pub(super) fn lookup_color(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "LookupColor");
    em.param("cmap", Value::Colormap(em.fetch32(4)));
    let len = em.fetch16(8) as usize;
    em.param("name", Value::String(em.fetch_bytes(12, len)));
    s.expect_reply();
}

pub(super) fn create_cursor(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CreateCursor");
    em.param("cid", Value::Cursor(em.fetch32(4)));
    em.param("source", Value::Pixmap(em.fetch32(8)));
    em.param_spec("mask", Value::Pixmap(em.fetch32(12)), &[(0, "None")]);
    em.param("fore-red", Value::Hex16(em.fetch16(16)));
    em.param("fore-green", Value::Hex16(em.fetch16(18)));
    em.param("fore-blue", Value::Hex16(em.fetch16(20)));
    em.param("back-red", Value::Hex16(em.fetch16(22)));
    em.param("back-green", Value::Hex16(em.fetch16(24)));
    em.param("back-blue", Value::Hex16(em.fetch16(26)));
    em.param("x", Value::Unsigned(em.fetch16(28)));
    em.param("y", Value::Unsigned(em.fetch16(30)));
}

pub(super) fn create_glyph_cursor(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CreateGlyphCursor");
    em.param("cid", Value::Cursor(em.fetch32(4)));
    em.param("source-font", Value::Font(em.fetch32(8)));
    em.param_spec("mask-font", Value::Font(em.fetch32(12)), &[(0, "None")]);
    em.param("source-char", Value::Unsigned(em.fetch16(16)));
    em.param("mask-char", Value::Unsigned(em.fetch16(18)));
    em.param("fore-red", Value::Hex16(em.fetch16(20)));
    em.param("fore-green", Value::Hex16(em.fetch16(22)));
    em.param("fore-blue", Value::Hex16(em.fetch16(24)));
    em.param("back-red", Value::Hex16(em.fetch16(26)));
    em.param("back-green", Value::Hex16(em.fetch16(28)));
    em.param("back-blue", Value::Hex16(em.fetch16(30)));
}

pub(super) fn free_cursor(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "FreeCursor");
    em.param("cursor", Value::Cursor(em.fetch32(4)));
}

pub(super) fn recolor_cursor(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "RecolorCursor");
    em.param("cursor", Value::Cursor(em.fetch32(4)));
    em.param("fore-red", Value::Hex16(em.fetch16(8)));
    em.param("fore-green", Value::Hex16(em.fetch16(10)));
    em.param("fore-blue", Value::Hex16(em.fetch16(12)));
    em.param("back-red", Value::Hex16(em.fetch16(14)));
    em.param("back-green", Value::Hex16(em.fetch16(16)));
    em.param("back-blue", Value::Hex16(em.fetch16(18)));
}

pub(super) fn query_best_size(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryBestSize");
    em.param(
        "class",
        Value::Enum(em.fetch8(1), &[(0, "Cursor"), (1, "Tile"), (2, "Stipple")]),
    );
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    em.param("width", Value::Unsigned(em.fetch16(8)));
    em.param("height", Value::Unsigned(em.fetch16(10)));
    s.expect_reply();
}

pub(super) fn list_installed_colormaps_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.param(&format!("cmaps[{}]", i), Value::Colormap(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn alloc_color_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("pixel", Value::Hex32(em.fetch32(16)));
    em.param("red", Value::Hex16(em.fetch16(8)));
    em.param("green", Value::Hex16(em.fetch16(10)));
    em.param("blue", Value::Hex16(em.fetch16(12)));
}

pub(super) fn alloc_named_color_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("pixel", Value::Hex32(em.fetch32(8)));
    em.param("exact-red", Value::Hex16(em.fetch16(12)));
    em.param("exact-green", Value::Hex16(em.fetch16(14)));
    em.param("exact-blue", Value::Hex16(em.fetch16(16)));
    em.param("visual-red", Value::Hex16(em.fetch16(18)));
    em.param("visual-green", Value::Hex16(em.fetch16(20)));
    em.param("visual-blue", Value::Hex16(em.fetch16(22)));
}

pub(super) fn alloc_color_cells_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    let mut printing = true;
    for i in 0..n {
        if printing {
            em.param(&format!("pixels[{}]", i), Value::Hex32(em.fetch32(pos)));
        }
        // masks follow the pixels, so keep walking even once truncated
        pos += 4;
        if printing && i + 1 < n && em.list_limit_reached() {
            printing = false;
        }
    }
    let n = em.fetch16(10) as usize;
    for i in 0..n {
        em.param(&format!("masks[{}]", i), Value::Hex32(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn alloc_color_planes_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.param(&format!("pixels[{}]", i), Value::Hex32(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
    em.param("red-mask", Value::Hex32(em.fetch32(12)));
    em.param("green-mask", Value::Hex32(em.fetch32(16)));
    em.param("blue-mask", Value::Hex32(em.fetch32(20)));
}

pub(super) fn query_colors_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.set_begin(&format!("colors[{}]", i));
        em.param("red", Value::Hex16(em.fetch16(pos)));
        em.param("green", Value::Hex16(em.fetch16(pos + 2)));
        em.param("blue", Value::Hex16(em.fetch16(pos + 4)));
        em.set_end();
        pos += 8;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn lookup_color_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("exact-red", Value::Hex16(em.fetch16(8)));
    em.param("exact-green", Value::Hex16(em.fetch16(10)));
    em.param("exact-blue", Value::Hex16(em.fetch16(12)));
    em.param("visual-red", Value::Hex16(em.fetch16(14)));
    em.param("visual-green", Value::Hex16(em.fetch16(16)));
    em.param("visual-blue", Value::Hex16(em.fetch16(18)));
}

pub(super) fn query_best_size_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("width", Value::Unsigned(em.fetch16(8)));
    em.param("height", Value::Unsigned(em.fetch16(10)));
}
