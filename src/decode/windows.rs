//! Window, Property and Selection Requests
//!
//! Core opcodes 1..=25 and RotateProperties, with their replies.

use super::params::{Emitter, HexWidth, Value};
use super::{ReplyScope, RequestScope, events};

const BIT_GRAVITY: &[(u32, &str)] = &[
    (0, "Forget"),
    (1, "NorthWest"),
    (2, "North"),
    (3, "NorthEast"),
    (4, "West"),
    (5, "Center"),
    (6, "East"),
    (7, "SouthWest"),
    (8, "South"),
    (9, "SouthEast"),
    (10, "Static"),
];

const WIN_GRAVITY: &[(u32, &str)] = &[
    (0, "Unmap"),
    (1, "NorthWest"),
    (2, "North"),
    (3, "NorthEast"),
    (4, "West"),
    (5, "Center"),
    (6, "East"),
    (7, "SouthWest"),
    (8, "South"),
    (9, "SouthEast"),
    (10, "Static"),
];

const BACKING_STORE: &[(u32, &str)] = &[(0, "NotUseful"), (1, "WhenMapped"), (2, "Always")];

const STACK_MODE: &[(u32, &str)] = &[
    (0, "Above"),
    (1, "Below"),
    (2, "TopIf"),
    (3, "BottomIf"),
    (4, "Opposite"),
];

/// The window-attribute value list shared by CreateWindow and
/// ChangeWindowAttributes. `pos` is the offset of the BITMASK.
fn window_attributes(em: &mut Emitter<'_>, pos: usize) {
    let bitmask = em.fetch32(pos);
    let mut i = pos + 4;
    if bitmask & 0x0000_0001 != 0 {
        em.param_spec(
            "background-pixmap",
            Value::Pixmap(em.fetch32(i)),
            &[(0, "None"), (1, "ParentRelative")],
        );
        i += 4;
    }
    if bitmask & 0x0000_0002 != 0 {
        em.param("background-pixel", Value::Hex32(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0004 != 0 {
        em.param_spec(
            "border-pixmap",
            Value::Pixmap(em.fetch32(i)),
            &[(0, "None"), (1, "CopyFromParent")],
        );
        i += 4;
    }
    if bitmask & 0x0000_0008 != 0 {
        em.param("border-pixel", Value::Hex32(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0010 != 0 {
        em.param("bit-gravity", Value::Enum(em.fetch8(i), BIT_GRAVITY));
        i += 4;
    }
    if bitmask & 0x0000_0020 != 0 {
        em.param("win-gravity", Value::Enum(em.fetch8(i), WIN_GRAVITY));
        i += 4;
    }
    if bitmask & 0x0000_0040 != 0 {
        em.param("backing-store", Value::Enum(em.fetch8(i), BACKING_STORE));
        i += 4;
    }
    if bitmask & 0x0000_0080 != 0 {
        em.param("backing-planes", Value::Unsigned(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0100 != 0 {
        em.param("backing-pixel", Value::Hex32(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_0200 != 0 {
        em.param("override-redirect", Value::Bool(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0000_0400 != 0 {
        em.param("save-under", Value::Bool(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0000_0800 != 0 {
        em.param("event-mask", Value::EventMask(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_1000 != 0 {
        em.param("do-not-propagate-mask", Value::EventMask(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0000_2000 != 0 {
        em.param_spec(
            "colormap",
            Value::Colormap(em.fetch32(i)),
            &[(0, "CopyFromParent")],
        );
        i += 4;
    }
    if bitmask & 0x0000_4000 != 0 {
        em.param_spec("cursor", Value::Cursor(em.fetch32(i)), &[(0, "None")]);
    }
}

pub(super) fn create_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CreateWindow");
    em.param("wid", Value::Window(em.fetch32(4)));
    em.param("parent", Value::Window(em.fetch32(8)));
    em.param_spec(
        "class",
        Value::Enum(em.fetch16(22), &[(1, "InputOutput"), (2, "InputOnly")]),
        &[(0, "CopyFromParent")],
    );
    em.param("depth", Value::Unsigned(em.fetch8(1)));
    em.param_spec(
        "visual",
        Value::VisualId(em.fetch32(24)),
        &[(0, "CopyFromParent")],
    );
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
    em.param("width", Value::Unsigned(em.fetch16(16)));
    em.param("height", Value::Unsigned(em.fetch16(18)));
    em.param("border-width", Value::Unsigned(em.fetch16(20)));
    window_attributes(em, 28);
}

pub(super) fn change_window_attributes(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeWindowAttributes");
    em.param("window", Value::Window(em.fetch32(4)));
    window_attributes(em, 8);
}

pub(super) fn get_window_attributes(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetWindowAttributes");
    em.param("window", Value::Window(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn destroy_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "DestroyWindow");
    em.param("window", Value::Window(em.fetch32(4)));
}

pub(super) fn destroy_subwindows(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "DestroySubwindows");
    em.param("window", Value::Window(em.fetch32(4)));
}

pub(super) fn change_save_set(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeSaveSet");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param(
        "mode",
        Value::Enum(em.fetch8(1), &[(0, "Insert"), (1, "Delete")]),
    );
}

pub(super) fn reparent_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ReparentWindow");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param("parent", Value::Window(em.fetch32(8)));
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
}

pub(super) fn map_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "MapWindow");
    em.param("window", Value::Window(em.fetch32(4)));
}

pub(super) fn map_subwindows(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "MapSubwindows");
    em.param("window", Value::Window(em.fetch32(4)));
}

pub(super) fn unmap_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UnmapWindow");
    em.param("window", Value::Window(em.fetch32(4)));
}

pub(super) fn unmap_subwindows(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UnmapSubwindows");
    em.param("window", Value::Window(em.fetch32(4)));
}

pub(super) fn configure_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ConfigureWindow");
    em.param("window", Value::Window(em.fetch32(4)));
    let bitmask = em.fetch16(8);
    let mut i = 12;
    if bitmask & 0x0001 != 0 {
        em.param("x", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0002 != 0 {
        em.param("y", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0004 != 0 {
        em.param("width", Value::Unsigned(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0008 != 0 {
        em.param("height", Value::Unsigned(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0010 != 0 {
        em.param("border-width", Value::Unsigned(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0020 != 0 {
        em.param("sibling", Value::Window(em.fetch32(i)));
        i += 4;
    }
    if bitmask & 0x0040 != 0 {
        em.param("stack-mode", Value::Enum(em.fetch8(i), STACK_MODE));
    }
}

pub(super) fn circulate_window(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "CirculateWindow");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param(
        "direction",
        Value::Enum(em.fetch8(1), &[(0, "RaiseLowest"), (1, "LowerHighest")]),
    );
}

pub(super) fn get_geometry(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetGeometry");
    em.param("drawable", Value::Drawable(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn query_tree(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryTree");
    em.param("window", Value::Window(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn intern_atom(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "InternAtom");
    let len = em.fetch16(4) as usize;
    em.param("name", Value::String(em.fetch_bytes(8, len)));
    em.param("only-if-exists", Value::Bool(em.fetch8(1)));
    s.expect_reply();
}

pub(super) fn get_atom_name(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetAtomName");
    em.param("atom", Value::Atom(em.fetch32(4)));
    s.expect_reply();
}

/// The format-dependent property payload shared by ChangeProperty and the
/// GetProperty reply.
fn property_data(em: &mut Emitter<'_>, format: u32, count: u32, pos: usize) {
    let count = count as usize;
    match format {
        8 => em.param("data", Value::String(em.fetch_bytes(pos, count))),
        16 => em.param(
            "data",
            Value::Hex(HexWidth::Two, None, em.fetch_bytes(pos, 2 * count)),
        ),
        32 => em.param(
            "data",
            Value::Hex(HexWidth::Four, None, em.fetch_bytes(pos, 4 * count)),
        ),
        _ => em.raw("<unknown format of data>"),
    }
}

pub(super) fn change_property(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeProperty");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param("property", Value::Atom(em.fetch32(8)));
    em.param("type", Value::Atom(em.fetch32(12)));
    em.param("format", Value::Unsigned(em.fetch8(16)));
    em.param(
        "mode",
        Value::Enum(em.fetch8(1), &[(0, "Replace"), (1, "Prepend"), (2, "Append")]),
    );
    let format = em.fetch8(16);
    let count = em.fetch32(20);
    property_data(em, format, count, 24);
}

pub(super) fn delete_property(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "DeleteProperty");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param("property", Value::Atom(em.fetch32(8)));
}

pub(super) fn get_property(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetProperty");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param("property", Value::Atom(em.fetch32(8)));
    em.param_spec(
        "type",
        Value::Atom(em.fetch32(12)),
        &[(0, "AnyPropertyType")],
    );
    em.param("long-offset", Value::Unsigned(em.fetch32(16)));
    em.param("long-length", Value::Unsigned(em.fetch32(20)));
    em.param("delete", Value::Bool(em.fetch8(1)));
    s.expect_reply();
}

pub(super) fn list_properties(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ListProperties");
    em.param("window", Value::Window(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn set_selection_owner(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetSelectionOwner");
    em.param("selection", Value::Atom(em.fetch32(8)));
    em.param("owner", Value::Window(em.fetch32(4)));
    em.param_spec("time", Value::Hex32(em.fetch32(12)), &[(0, "CurrentTime")]);
}

pub(super) fn get_selection_owner(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetSelectionOwner");
    em.param("selection", Value::Atom(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn convert_selection(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ConvertSelection");
    em.param("selection", Value::Atom(em.fetch32(8)));
    em.param("target", Value::Atom(em.fetch32(12)));
    em.param("property", Value::Atom(em.fetch32(16)));
    em.param("requestor", Value::Window(em.fetch32(4)));
    em.param_spec("time", Value::Hex32(em.fetch32(20)), &[(0, "CurrentTime")]);
}

pub(super) fn send_event(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SendEvent");
    em.param_spec(
        "destination",
        Value::Window(em.fetch32(4)),
        &[(0, "PointerWindow"), (1, "InputFocus")],
    );
    em.param("propagate", Value::Bool(em.fetch8(1)));
    em.param("event-mask", Value::EventMask(em.fetch32(8)));
    em.param("event", Value::Nothing);
    events::embedded_event(em, s.conn, 12);
}

pub(super) fn rotate_properties(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "RotateProperties");
    em.param("window", Value::Window(em.fetch32(4)));
    em.param("delta", Value::Signed16(em.fetch16(10)));
    let n = em.fetch16(8) as usize;
    let mut pos = 12;
    for i in 0..n {
        em.param(&format!("properties[{}]", i), Value::Atom(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_window_attributes_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("visual", Value::VisualId(em.fetch32(8)));
    em.param(
        "class",
        Value::Enum(em.fetch16(12), &[(1, "InputOutput"), (2, "InputOnly")]),
    );
    em.param("bit-gravity", Value::Enum(em.fetch8(14), BIT_GRAVITY));
    em.param("win-gravity", Value::Enum(em.fetch8(15), WIN_GRAVITY));
    em.param("backing-store", Value::Enum(em.fetch8(1), BACKING_STORE));
    em.param("backing-planes", Value::Hex32(em.fetch32(16)));
    em.param("backing-pixel", Value::Hex32(em.fetch32(20)));
    em.param("save-under", Value::Bool(em.fetch8(24)));
    em.param("colormap", Value::Colormap(em.fetch32(28)));
    em.param("map-is-installed", Value::Bool(em.fetch8(25)));
    em.param(
        "map-state",
        Value::Enum(
            em.fetch8(26),
            &[(0, "Unmapped"), (1, "Unviewable"), (2, "Viewable")],
        ),
    );
    em.param("all-event-masks", Value::EventMask(em.fetch32(32)));
    em.param("your-event-mask", Value::EventMask(em.fetch32(36)));
    em.param("do-not-propagate-mask", Value::EventMask(em.fetch16(40)));
    em.param("override-redirect", Value::Bool(em.fetch8(27)));
}

pub(super) fn get_geometry_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("root", Value::Window(em.fetch32(8)));
    em.param("depth", Value::Unsigned(em.fetch8(1)));
    em.param("x", Value::Signed16(em.fetch16(12)));
    em.param("y", Value::Signed16(em.fetch16(14)));
    em.param("width", Value::Unsigned(em.fetch16(16)));
    em.param("height", Value::Unsigned(em.fetch16(18)));
    em.param("border-width", Value::Unsigned(em.fetch16(20)));
}

pub(super) fn query_tree_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("root", Value::Window(em.fetch32(8)));
    em.param_spec("parent", Value::Window(em.fetch32(12)), &[(0, "None")]);
    let n = em.fetch16(16) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.param(&format!("children[{}]", i), Value::Window(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn intern_atom_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param_spec("atom", Value::Atom(em.fetch32(8)), &[(0, "None")]);
}

pub(super) fn get_atom_name_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let len = em.fetch16(8) as usize;
    em.param("name", Value::String(em.fetch_bytes(32, len)));
}

pub(super) fn get_property_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param_spec("type", Value::Atom(em.fetch32(8)), &[(0, "None")]);
    if em.fetch32(8) != 0 {
        em.param("format", Value::Unsigned(em.fetch8(1)));
        em.param("bytes-after", Value::Unsigned(em.fetch32(12)));
        let format = em.fetch8(1);
        let count = em.fetch32(16);
        property_data(em, format, count, 32);
    }
}

pub(super) fn list_properties_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.param(&format!("atoms[{}]", i), Value::Atom(em.fetch32(pos)));
        pos += 4;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_selection_owner_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param_spec("owner", Value::Window(em.fetch32(8)), &[(0, "None")]);
}
