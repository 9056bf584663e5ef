//! Event Decoding
//!
//! Core events 2..=34 plus extension events remapped through the
//! connection's event table. Events synthesised by SendEvent carry the
//! high bit of their code and are logged with a prefix; the same decoder
//! also renders the event embedded in a SendEvent request.

use super::params::{Emitter, Value};
use super::shm;
use crate::protocol::opcodes::EXT_MITSHM;
use crate::protocol::{DispatchKey, types};
use crate::trace::connection::ConnectionState;

/// Canonical name of an event dispatch key, or None if unrecognised.
pub fn event_name(key: DispatchKey) -> Option<&'static str> {
    Some(match key {
        2 => "KeyPress",
        3 => "KeyRelease",
        4 => "ButtonPress",
        5 => "ButtonRelease",
        6 => "MotionNotify",
        7 => "EnterNotify",
        8 => "LeaveNotify",
        9 => "FocusIn",
        10 => "FocusOut",
        11 => "KeymapNotify",
        12 => "Expose",
        13 => "GraphicsExposure",
        14 => "NoExposure",
        15 => "VisibilityNotify",
        16 => "CreateNotify",
        17 => "DestroyNotify",
        18 => "UnmapNotify",
        19 => "MapNotify",
        20 => "MapRequest",
        21 => "ReparentNotify",
        22 => "ConfigureNotify",
        23 => "ConfigureRequest",
        24 => "GravityNotify",
        25 => "ResizeRequest",
        26 => "CirculateNotify",
        27 => "CirculateRequest",
        28 => "PropertyNotify",
        29 => "SelectionClear",
        30 => "SelectionRequest",
        31 => "SelectionNotify",
        32 => "ColormapNotify",
        33 => "ClientMessage",
        34 => "MappingNotify",
        _ if key == EXT_MITSHM => "ShmCompletion",
        _ => return None,
    })
}

/// Decode the event starting at `pos`, returning the name the event
/// filter should be consulted with.
pub fn decode_event(em: &mut Emitter<'_>, conn: &ConnectionState, pos: usize) -> String {
    let mut code = em.fetch8(pos) as u8;
    if code & types::EVENT_SYNTHETIC_BIT != 0 {
        em.raw("SendEvent-generated ");
        code &= !types::EVENT_SYNTHETIC_BIT;
    }
    let key = conn.event_key(code);
    let filter_name = match event_name(key) {
        Some(name) => {
            em.raw(name);
            name.to_string()
        }
        None => {
            match conn.nearest_event_extension(code) {
                Some((ext, offset)) => em.raw(&format!("{}:UnknownEvent{}", ext, offset)),
                None => em.raw(&format!("UnknownEvent{}", code)),
            }
            "UnknownEvent".to_string()
        }
    };
    body(em, key, pos);
    filter_name
}

/// Render the event embedded in a SendEvent request.
pub(super) fn embedded_event(em: &mut Emitter<'_>, conn: &ConnectionState, pos: usize) {
    decode_event(em, conn, pos);
}

fn open(em: &mut Emitter<'_>) {
    em.raw("(");
    em.suppress_comma();
}

fn close(em: &mut Emitter<'_>) {
    em.raw(")");
}

fn body(em: &mut Emitter<'_>, key: DispatchKey, pos: usize) {
    match key {
        2..=8 => pointer_event(em, key, pos),
        9 | 10 => focus_event(em, pos),
        11 => keymap_notify(em, pos),
        12 => expose(em, pos),
        13 => graphics_exposure(em, pos),
        14 => no_exposure(em, pos),
        15 => visibility_notify(em, pos),
        16 => create_notify(em, pos),
        17 => destroy_notify(em, pos),
        18 => unmap_notify(em, pos),
        19 => map_notify(em, pos),
        20 => map_request(em, pos),
        21 => reparent_notify(em, pos),
        22 => configure_notify(em, pos),
        23 => configure_request(em, pos),
        24 => gravity_notify(em, pos),
        25 => resize_request(em, pos),
        26 | 27 => circulate(em, pos),
        28 => property_notify(em, pos),
        29 => selection_clear(em, pos),
        30 => selection_request(em, pos),
        31 => selection_notify(em, pos),
        32 => colormap_notify(em, pos),
        33 => client_message(em, pos),
        34 => mapping_notify(em, pos),
        k if k == EXT_MITSHM => shm::completion_event(em, pos),
        _ => {}
    }
}

/// KeyPress, KeyRelease, ButtonPress, ButtonRelease, MotionNotify,
/// EnterNotify and LeaveNotify share one layout.
fn pointer_event(em: &mut Emitter<'_>, key: DispatchKey, pos: usize) {
    open(em);
    em.param("root", Value::Window(em.fetch32(pos + 8)));
    em.param("event", Value::Window(em.fetch32(pos + 12)));
    em.param_spec("child", Value::Window(em.fetch32(pos + 16)), &[(0, "None")]);
    if key < 7 {
        em.param("same-screen", Value::Bool(em.fetch8(pos + 30)));
    } else {
        em.param(
            "mode",
            Value::Enum(em.fetch8(pos + 30), &[(0, "Normal"), (1, "Grab"), (2, "Ungrab")]),
        );
        em.param("same-screen", Value::Bool((em.fetch8(pos + 31) >> 1) & 1));
        em.param("focus", Value::Bool(em.fetch8(pos + 31) & 1));
    }
    em.param("root-x", Value::Signed16(em.fetch16(pos + 20)));
    em.param("root-y", Value::Signed16(em.fetch16(pos + 22)));
    em.param("event-x", Value::Signed16(em.fetch16(pos + 24)));
    em.param("event-y", Value::Signed16(em.fetch16(pos + 26)));
    if key < 6 {
        em.param("detail", Value::Unsigned(em.fetch8(pos + 1)));
    } else if key == 6 {
        em.param(
            "detail",
            Value::Enum(em.fetch8(pos + 1), &[(0, "Normal"), (1, "Hint")]),
        );
    } else {
        em.param(
            "detail",
            Value::Enum(
                em.fetch8(pos + 1),
                &[
                    (0, "Ancestor"),
                    (1, "Virtual"),
                    (2, "Inferior"),
                    (3, "Nonlinear"),
                    (4, "NonlinearVirtual"),
                ],
            ),
        );
    }
    em.param("state", Value::Hex16(em.fetch16(pos + 28)));
    em.param("time", Value::Hex32(em.fetch32(pos + 4)));
    close(em);
}

fn focus_event(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param(
        "mode",
        Value::Enum(
            em.fetch8(pos + 8),
            &[(0, "Normal"), (1, "Grab"), (2, "Ungrab"), (3, "WhileGrabbed")],
        ),
    );
    em.param(
        "detail",
        Value::Enum(
            em.fetch8(pos + 1),
            &[
                (0, "Ancestor"),
                (1, "Virtual"),
                (2, "Inferior"),
                (3, "Nonlinear"),
                (4, "NonlinearVirtual"),
                (5, "Pointer"),
                (6, "PointerRoot"),
                (7, "None"),
            ],
        ),
    );
    close(em);
}

fn keymap_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    // the keymap bytes start right after the code, keys 0..7 having no
    // byte of their own
    let mut ppos = pos + 1;
    for i in 1..32 {
        em.param(&format!("keys[{}]", i), Value::Hex8(em.fetch8(ppos)));
        ppos += 1;
        if i + 1 < 32 && em.list_limit_reached() {
            break;
        }
    }
    close(em);
}

fn expose(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("window", Value::Window(em.fetch32(pos + 4)));
    em.param("x", Value::Unsigned(em.fetch16(pos + 8)));
    em.param("y", Value::Unsigned(em.fetch16(pos + 10)));
    em.param("width", Value::Unsigned(em.fetch16(pos + 12)));
    em.param("height", Value::Unsigned(em.fetch16(pos + 14)));
    em.param("count", Value::Unsigned(em.fetch16(pos + 16)));
    close(em);
}

const EXPOSURE_MAJOR: &[(u32, &str)] = &[(62, "CopyArea"), (63, "CopyPlane")];

fn graphics_exposure(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("drawable", Value::Drawable(em.fetch32(pos + 4)));
    em.param("x", Value::Unsigned(em.fetch16(pos + 8)));
    em.param("y", Value::Unsigned(em.fetch16(pos + 10)));
    em.param("width", Value::Unsigned(em.fetch16(pos + 12)));
    em.param("height", Value::Unsigned(em.fetch16(pos + 14)));
    em.param("count", Value::Unsigned(em.fetch16(pos + 18)));
    em.param_spec("major-opcode", Value::Unsigned(em.fetch8(pos + 20)), EXPOSURE_MAJOR);
    em.param("minor-opcode", Value::Unsigned(em.fetch16(pos + 16)));
    close(em);
}

fn no_exposure(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("drawable", Value::Drawable(em.fetch32(pos + 4)));
    em.param_spec("major-opcode", Value::Unsigned(em.fetch8(pos + 10)), EXPOSURE_MAJOR);
    em.param("minor-opcode", Value::Unsigned(em.fetch16(pos + 8)));
    close(em);
}

fn visibility_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("window", Value::Window(em.fetch32(pos + 4)));
    em.param(
        "state",
        Value::Enum(
            em.fetch8(pos + 8),
            &[(0, "Unobscured"), (1, "PartiallyObscured"), (2, "FullyObscured")],
        ),
    );
    close(em);
}

fn create_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("parent", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("x", Value::Signed16(em.fetch16(pos + 12)));
    em.param("y", Value::Signed16(em.fetch16(pos + 14)));
    em.param("width", Value::Unsigned(em.fetch16(pos + 16)));
    em.param("height", Value::Unsigned(em.fetch16(pos + 18)));
    em.param("border-width", Value::Unsigned(em.fetch16(pos + 20)));
    em.param("override-redirect", Value::Bool(em.fetch8(pos + 22)));
    close(em);
}

fn destroy_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    close(em);
}

fn unmap_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("from-configure", Value::Bool(em.fetch8(pos + 12)));
    close(em);
}

fn map_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("override-redirect", Value::Bool(em.fetch8(pos + 12)));
    close(em);
}

fn map_request(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("parent", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    close(em);
}

fn reparent_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("parent", Value::Window(em.fetch32(pos + 12)));
    em.param("x", Value::Signed16(em.fetch16(pos + 16)));
    em.param("y", Value::Signed16(em.fetch16(pos + 18)));
    em.param("override-redirect", Value::Bool(em.fetch8(pos + 20)));
    close(em);
}

fn configure_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("x", Value::Signed16(em.fetch16(pos + 16)));
    em.param("y", Value::Signed16(em.fetch16(pos + 18)));
    em.param("width", Value::Unsigned(em.fetch16(pos + 20)));
    em.param("height", Value::Unsigned(em.fetch16(pos + 22)));
    em.param("border-width", Value::Unsigned(em.fetch16(pos + 24)));
    em.param_spec(
        "above-sibling",
        Value::Window(em.fetch32(pos + 12)),
        &[(0, "None")],
    );
    em.param("override-redirect", Value::Bool(em.fetch8(pos + 26)));
    close(em);
}

fn configure_request(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("parent", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("x", Value::Signed16(em.fetch16(pos + 16)));
    em.param("y", Value::Signed16(em.fetch16(pos + 18)));
    em.param("width", Value::Unsigned(em.fetch16(pos + 20)));
    em.param("height", Value::Unsigned(em.fetch16(pos + 22)));
    em.param("border-width", Value::Unsigned(em.fetch16(pos + 24)));
    em.param_spec("sibling", Value::Window(em.fetch32(pos + 12)), &[(0, "None")]);
    em.param(
        "stack-mode",
        Value::Enum(
            em.fetch8(pos + 1),
            &[(0, "Above"), (1, "Below"), (2, "TopIf"), (3, "BottomIf"), (4, "Opposite")],
        ),
    );
    // unusually, this mask does not mark absent fields: everything above
    // is filled in, and the mask says which of them just changed
    em.param(
        "value-mask",
        Value::Mask(
            em.fetch16(pos + 26),
            &[
                (0x0001, "x"),
                (0x0002, "y"),
                (0x0004, "width"),
                (0x0008, "height"),
                (0x0010, "border-width"),
                (0x0020, "sibling"),
                (0x0040, "stack-mode"),
            ],
        ),
    );
    close(em);
}

fn gravity_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param("x", Value::Signed16(em.fetch16(pos + 12)));
    em.param("y", Value::Signed16(em.fetch16(pos + 14)));
    close(em);
}

fn resize_request(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("window", Value::Window(em.fetch32(pos + 4)));
    em.param("width", Value::Signed16(em.fetch16(pos + 8)));
    em.param("height", Value::Signed16(em.fetch16(pos + 10)));
    close(em);
}

fn circulate(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("event", Value::Window(em.fetch32(pos + 4)));
    em.param("window", Value::Window(em.fetch32(pos + 8)));
    em.param(
        "place",
        Value::Enum(em.fetch8(pos + 16), &[(0, "Top"), (1, "Bottom")]),
    );
    close(em);
}

fn property_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("window", Value::Window(em.fetch32(pos + 4)));
    em.param("atom", Value::Atom(em.fetch32(pos + 8)));
    em.param(
        "state",
        Value::Enum(em.fetch8(pos + 16), &[(0, "NewValue"), (1, "Deleted")]),
    );
    em.param("time", Value::Hex32(em.fetch32(pos + 12)));
    close(em);
}

fn selection_clear(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("owner", Value::Window(em.fetch32(pos + 8)));
    em.param("selection", Value::Atom(em.fetch32(pos + 12)));
    em.param("time", Value::Hex32(em.fetch32(pos + 4)));
    close(em);
}

fn selection_request(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("owner", Value::Window(em.fetch32(pos + 8)));
    em.param("selection", Value::Atom(em.fetch32(pos + 16)));
    em.param("target", Value::Atom(em.fetch32(pos + 20)));
    em.param_spec("property", Value::Atom(em.fetch32(pos + 24)), &[(0, "None")]);
    em.param("requestor", Value::Window(em.fetch32(pos + 12)));
    em.param_spec("time", Value::Hex32(em.fetch32(pos + 4)), &[(0, "CurrentTime")]);
    close(em);
}

fn selection_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("requestor", Value::Window(em.fetch32(pos + 8)));
    em.param("selection", Value::Atom(em.fetch32(pos + 12)));
    em.param("target", Value::Atom(em.fetch32(pos + 16)));
    em.param_spec("property", Value::Atom(em.fetch32(pos + 20)), &[(0, "None")]);
    em.param_spec("time", Value::Hex32(em.fetch32(pos + 4)), &[(0, "CurrentTime")]);
    close(em);
}

fn colormap_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("window", Value::Window(em.fetch32(pos + 4)));
    em.param_spec("colormap", Value::Colormap(em.fetch32(pos + 8)), &[(0, "None")]);
    em.param("new", Value::Bool(em.fetch8(pos + 12)));
    em.param(
        "state",
        Value::Enum(em.fetch8(pos + 13), &[(0, "Uninstalled"), (1, "Installed")]),
    );
    close(em);
}

fn client_message(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param("window", Value::Window(em.fetch32(pos + 4)));
    em.param("type", Value::Atom(em.fetch32(pos + 8)));
    em.param("format", Value::Unsigned(em.fetch8(pos + 1)));
    em.param(
        "data",
        Value::Hex(
            super::params::HexWidth::One,
            None,
            em.fetch_bytes(pos + 12, 20),
        ),
    );
    close(em);
}

fn mapping_notify(em: &mut Emitter<'_>, pos: usize) {
    open(em);
    em.param(
        "request",
        Value::Enum(
            em.fetch8(pos + 4),
            &[(0, "Modifier"), (1, "Keyboard"), (2, "Pointer")],
        ),
    );
    em.param("first-keycode", Value::Unsigned(em.fetch8(pos + 5)));
    em.param("count", Value::Unsigned(em.fetch8(pos + 6)));
    close(em);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::connection::TraceMode;

    fn key_press_packet(code: u8) -> Vec<u8> {
        let mut p = vec![0u8; 32];
        p[0] = code;
        p[1] = 9; // keycode
        p[4..8].copy_from_slice(&0x99u32.to_le_bytes()); // time
        p[8..12].copy_from_slice(&0x11u32.to_le_bytes()); // root
        p[12..16].copy_from_slice(&0x22u32.to_le_bytes()); // event
        p[20..22].copy_from_slice(&100i16.to_le_bytes()); // root-x
        p[22..24].copy_from_slice(&200i16.to_le_bytes()); // root-y
        p[24..26].copy_from_slice(&10i16.to_le_bytes()); // event-x
        p[26..28].copy_from_slice(&20i16.to_le_bytes()); // event-y
        p[28..30].copy_from_slice(&1u16.to_le_bytes()); // state
        p[30] = 1; // same-screen
        p
    }

    fn decode(conn: &ConnectionState, packet: &[u8]) -> (String, String) {
        let mut em = Emitter::new(packet, crate::protocol::ByteOrder::LittleEndian, 0);
        let name = decode_event(&mut em, conn, 0);
        (name, em.finish())
    }

    #[test]
    fn test_key_press_layout() {
        let conn = ConnectionState::new(TraceMode::Full);
        let (name, text) = decode(&conn, &key_press_packet(2));
        assert_eq!(name, "KeyPress");
        assert_eq!(
            text,
            "KeyPress(root=w#00000011, event=w#00000022, child=None, same-screen=True, \
             root-x=100, root-y=200, event-x=10, event-y=20, detail=9, state=0x0001, \
             time=0x00000099)"
        );
    }

    #[test]
    fn test_synthetic_event_prefix() {
        let conn = ConnectionState::new(TraceMode::Full);
        let (name, text) = decode(&conn, &key_press_packet(2 | 0x80));
        assert_eq!(name, "KeyPress");
        assert!(text.starts_with("SendEvent-generated KeyPress("));
    }

    #[test]
    fn test_unknown_event_keeps_numeric_code() {
        let conn = ConnectionState::new(TraceMode::Full);
        let mut packet = vec![0u8; 32];
        packet[0] = 90;
        let (name, text) = decode(&conn, &packet);
        assert_eq!(name, "UnknownEvent");
        assert_eq!(text, "UnknownEvent90");
    }

    #[test]
    fn test_client_message_data_dump() {
        let conn = ConnectionState::new(TraceMode::Full);
        let mut packet = vec![0u8; 32];
        packet[0] = 33;
        packet[1] = 32; // format
        packet[4..8].copy_from_slice(&0x7u32.to_le_bytes());
        packet[8..12].copy_from_slice(&0x1Fu32.to_le_bytes());
        packet[12] = 0xAA;
        let (name, text) = decode(&conn, &packet);
        assert_eq!(name, "ClientMessage");
        assert!(text.starts_with(
            "ClientMessage(window=w#00000007, type=a#31, format=32, data=AA:00:"
        ));
    }
}
