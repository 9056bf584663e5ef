//! Pointer, Keyboard and Grab Requests
//!
//! Core opcodes 26..=44 plus the keyboard/pointer configuration family
//! (100..=106, 116..=119), with their replies.

use super::common::time_coord;
use super::params::{Emitter, Value};
use super::{ReplyScope, RequestScope};

const SYNC_MODE: &[(u32, &str)] = &[(0, "Synchronous"), (1, "Asynchronous")];

const GRAB_STATUS: &[(u32, &str)] = &[
    (0, "Success"),
    (1, "AlreadyGrabbed"),
    (2, "InvalidTime"),
    (3, "NotViewable"),
    (4, "Frozen"),
];

const GRAB_WINDOW_SPECIALS: &[(u32, &str)] = &[(0, "PointerWindow"), (1, "InputFocus")];

pub(super) fn grab_pointer(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GrabPointer");
    em.param_spec("grab-window", Value::Window(em.fetch32(4)), GRAB_WINDOW_SPECIALS);
    em.param("owner-events", Value::Bool(em.fetch8(1)));
    em.param("event-mask", Value::EventMask(em.fetch16(8)));
    em.param("pointer-mode", Value::Enum(em.fetch8(10), SYNC_MODE));
    em.param("keyboard-mode", Value::Enum(em.fetch8(11), SYNC_MODE));
    em.param_spec("confine-to", Value::Window(em.fetch32(12)), &[(0, "None")]);
    em.param_spec("cursor", Value::Cursor(em.fetch32(16)), &[(0, "None")]);
    em.param_spec("time", Value::Hex32(em.fetch32(20)), &[(0, "CurrentTime")]);
    s.expect_reply();
}

pub(super) fn ungrab_pointer(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UngrabPointer");
    em.param_spec("time", Value::Hex32(em.fetch32(4)), &[(0, "CurrentTime")]);
}

pub(super) fn grab_button(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GrabButton");
    em.param_spec(
        "modifiers",
        Value::KeyMask(em.fetch16(22)),
        &[(0x8000, "AnyModifier")],
    );
    em.param_spec("button", Value::Unsigned(em.fetch8(20)), &[(0, "AnyButton")]);
    em.param_spec("grab-window", Value::Window(em.fetch32(4)), GRAB_WINDOW_SPECIALS);
    em.param("owner-events", Value::Bool(em.fetch8(1)));
    em.param("event-mask", Value::EventMask(em.fetch16(8)));
    em.param("pointer-mode", Value::Enum(em.fetch8(10), SYNC_MODE));
    em.param("keyboard-mode", Value::Enum(em.fetch8(11), SYNC_MODE));
    em.param_spec("confine-to", Value::Window(em.fetch32(12)), &[(0, "None")]);
    em.param_spec("cursor", Value::Cursor(em.fetch32(16)), &[(0, "None")]);
}

pub(super) fn ungrab_button(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UngrabButton");
    em.param_spec(
        "modifiers",
        Value::KeyMask(em.fetch16(8)),
        &[(0x8000, "AnyModifier")],
    );
    em.param_spec("button", Value::Unsigned(em.fetch8(1)), &[(0, "AnyButton")]);
    em.param_spec("grab-window", Value::Window(em.fetch32(4)), GRAB_WINDOW_SPECIALS);
}

pub(super) fn change_active_pointer_grab(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeActivePointerGrab");
    em.param("event-mask", Value::EventMask(em.fetch16(12)));
    em.param_spec("cursor", Value::Cursor(em.fetch32(4)), &[(0, "None")]);
    em.param_spec("time", Value::Hex32(em.fetch32(8)), &[(0, "CurrentTime")]);
}

pub(super) fn grab_keyboard(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GrabKeyboard");
    em.param_spec("grab-window", Value::Window(em.fetch32(4)), GRAB_WINDOW_SPECIALS);
    em.param("owner-events", Value::Bool(em.fetch8(1)));
    em.param("pointer-mode", Value::Enum(em.fetch8(12), SYNC_MODE));
    em.param("keyboard-mode", Value::Enum(em.fetch8(13), SYNC_MODE));
    em.param_spec("time", Value::Hex32(em.fetch32(8)), &[(0, "CurrentTime")]);
    s.expect_reply();
}

pub(super) fn ungrab_keyboard(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UngrabKeyboard");
    em.param_spec("time", Value::Hex32(em.fetch32(4)), &[(0, "CurrentTime")]);
}

pub(super) fn grab_key(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GrabKey");
    em.param_spec("key", Value::Unsigned(em.fetch8(10)), &[(0, "AnyKey")]);
    em.param_spec(
        "modifiers",
        Value::KeyMask(em.fetch16(8)),
        &[(0x8000, "AnyModifier")],
    );
    em.param_spec("grab-window", Value::Window(em.fetch32(4)), GRAB_WINDOW_SPECIALS);
    em.param("owner-events", Value::Bool(em.fetch8(1)));
    em.param("pointer-mode", Value::Enum(em.fetch8(11), SYNC_MODE));
    em.param("keyboard-mode", Value::Enum(em.fetch8(12), SYNC_MODE));
}

pub(super) fn ungrab_key(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UngrabKey");
    em.param_spec("key", Value::Unsigned(em.fetch8(1)), &[(0, "AnyKey")]);
    em.param_spec(
        "modifiers",
        Value::KeyMask(em.fetch16(8)),
        &[(0x8000, "AnyModifier")],
    );
    em.param_spec("grab-window", Value::Window(em.fetch32(4)), GRAB_WINDOW_SPECIALS);
}

pub(super) fn allow_events(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "AllowEvents");
    em.param(
        "mode",
        Value::Enum(
            em.fetch8(1),
            &[
                (0, "AsyncPointer"),
                (1, "SyncPointer"),
                (2, "ReplayPointer"),
                (3, "AsyncKeyboard"),
                (4, "SyncKeyboard"),
                (5, "ReplayKeyboard"),
                (6, "AsyncBoth"),
                (7, "SyncBoth"),
            ],
        ),
    );
    em.param_spec("time", Value::Hex32(em.fetch32(4)), &[(0, "CurrentTime")]);
}

pub(super) fn grab_server(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GrabServer");
}

pub(super) fn ungrab_server(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "UngrabServer");
}

pub(super) fn query_pointer(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryPointer");
    em.param("window", Value::Window(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn get_motion_events(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetMotionEvents");
    em.param_spec("start", Value::Hex32(em.fetch32(8)), &[(0, "CurrentTime")]);
    em.param_spec("stop", Value::Hex32(em.fetch32(12)), &[(0, "CurrentTime")]);
    em.param("window", Value::Window(em.fetch32(4)));
    s.expect_reply();
}

pub(super) fn translate_coordinates(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "TranslateCoordinates");
    em.param("src-window", Value::Window(em.fetch32(4)));
    em.param("dst-window", Value::Window(em.fetch32(8)));
    em.param("src-x", Value::Signed16(em.fetch16(12)));
    em.param("src-y", Value::Signed16(em.fetch16(14)));
    s.expect_reply();
}

pub(super) fn warp_pointer(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "WarpPointer");
    em.param_spec("src-window", Value::Window(em.fetch32(4)), &[(0, "None")]);
    em.param_spec("dst-window", Value::Window(em.fetch32(8)), &[(0, "None")]);
    em.param("src-x", Value::Signed16(em.fetch16(12)));
    em.param("src-y", Value::Signed16(em.fetch16(14)));
    em.param("src-width", Value::Unsigned(em.fetch16(16)));
    em.param("src-height", Value::Unsigned(em.fetch16(18)));
    em.param("dst-x", Value::Signed16(em.fetch16(20)));
    em.param("dst-y", Value::Signed16(em.fetch16(22)));
}

pub(super) fn set_input_focus(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetInputFocus");
    em.param("focus", Value::Window(em.fetch32(4)));
    em.param(
        "revert-to",
        Value::Enum(em.fetch8(1), &[(0, "None"), (1, "PointerRoot"), (2, "Parent")]),
    );
    em.param_spec("time", Value::Hex32(em.fetch32(8)), &[(0, "CurrentTime")]);
}

pub(super) fn get_input_focus(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetInputFocus");
    s.expect_reply();
}

pub(super) fn query_keymap(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryKeymap");
    s.expect_reply();
}

pub(super) fn change_keyboard_mapping(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeKeyboardMapping");
    let mut keycode = em.fetch8(4);
    let mut remaining = em.fetch8(1);
    let keysyms_per_keycode = em.fetch8(5) as usize;
    let mut pos = 8;
    while remaining > 0 {
        em.set_begin(&format!("keycode[{}]", keycode));
        for i in 0..keysyms_per_keycode {
            em.param(&format!("keysyms[{}]", i), Value::Hex32(em.fetch32(pos)));
            pos += 4;
        }
        em.set_end();
        keycode += 1;
        remaining -= 1;
        if remaining > 0 && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_keyboard_mapping(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetKeyboardMapping");
    s.rec.first_keycode = em.fetch8(4) as u8;
    s.rec.keycode_count = em.fetch8(5) as u8;
    em.param("first-keycode", Value::Unsigned(s.rec.first_keycode as u32));
    em.param("count", Value::Unsigned(s.rec.keycode_count as u32));
    s.expect_reply();
}

pub(super) fn change_keyboard_control(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeKeyboardControl");
    let bitmask = em.fetch32(4);
    let mut i = 8;
    if bitmask & 0x0000_0001 != 0 {
        em.param("key-click-percent", Value::Signed8(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0000_0002 != 0 {
        em.param("bell-percent", Value::Signed8(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0000_0004 != 0 {
        em.param("bell-pitch", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0000_0008 != 0 {
        em.param("bell-duration", Value::Signed16(em.fetch16(i)));
        i += 4;
    }
    if bitmask & 0x0000_0010 != 0 {
        em.param("led", Value::Unsigned(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0000_0020 != 0 {
        em.param("led-mode", Value::Enum(em.fetch8(i), &[(0, "Off"), (1, "On")]));
        i += 4;
    }
    if bitmask & 0x0000_0040 != 0 {
        em.param("key", Value::Unsigned(em.fetch8(i)));
        i += 4;
    }
    if bitmask & 0x0000_0080 != 0 {
        em.param(
            "auto-repeat-mode",
            Value::Enum(em.fetch8(i), &[(0, "Off"), (1, "On"), (2, "Default")]),
        );
    }
}

pub(super) fn get_keyboard_control(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetKeyboardControl");
    s.expect_reply();
}

pub(super) fn bell(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "Bell");
    em.param("percent", Value::Signed8(em.fetch8(1)));
}

pub(super) fn change_pointer_control(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangePointerControl");
    if em.fetch8(10) != 0 {
        em.param(
            "acceleration",
            Value::Rational16(em.fetch16(4), em.fetch16(6)),
        );
    }
    if em.fetch8(11) != 0 {
        em.param("threshold", Value::Signed16(em.fetch16(8)));
    }
}

pub(super) fn get_pointer_control(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetPointerControl");
    s.expect_reply();
}

pub(super) fn set_pointer_mapping(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetPointerMapping");
    let n = em.fetch8(1) as usize;
    let mut pos = 4;
    for i in 0..n {
        em.param(&format!("map[{}]", i), Value::Unsigned(em.fetch8(pos)));
        pos += 1;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
    s.expect_reply();
}

pub(super) fn get_pointer_mapping(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetPointerMapping");
    s.expect_reply();
}

pub(super) fn set_modifier_mapping(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetModifierMapping");
    let per_modifier = em.fetch8(1) as usize;
    let mut pos = 4;
    for modifier in 0..8 {
        em.set_begin(&format!("modifier[{}]", modifier));
        for i in 0..per_modifier {
            em.param(&format!("keycodes[{}]", i), Value::Unsigned(em.fetch8(pos)));
            pos += 1;
        }
        em.set_end();
        if modifier + 1 < 8 && em.list_limit_reached() {
            break;
        }
    }
    s.expect_reply();
}

pub(super) fn get_modifier_mapping(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetModifierMapping");
    s.expect_reply();
}

pub(super) fn grab_pointer_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("status", Value::Enum(em.fetch8(1), GRAB_STATUS));
}

pub(super) fn grab_keyboard_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("status", Value::Enum(em.fetch8(1), GRAB_STATUS));
}

pub(super) fn query_pointer_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("root", Value::Window(em.fetch32(8)));
    em.param_spec("child", Value::Window(em.fetch32(12)), &[(0, "None")]);
    em.param("same-screen", Value::Bool(em.fetch8(1)));
    em.param("root-x", Value::Signed16(em.fetch16(16)));
    em.param("root-y", Value::Signed16(em.fetch16(18)));
    em.param("win-x", Value::Signed16(em.fetch16(20)));
    em.param("win-y", Value::Signed16(em.fetch16(22)));
    em.param("mask", Value::Hex16(em.fetch16(24)));
}

pub(super) fn get_motion_events_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch32(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.set_begin(&format!("events[{}]", i));
        time_coord(em, pos);
        em.set_end();
        pos += 8;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn translate_coordinates_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("same-screen", Value::Bool(em.fetch8(1)));
    em.param_spec("child", Value::Window(em.fetch32(8)), &[(0, "None")]);
    em.param("dst-x", Value::Signed16(em.fetch16(12)));
    em.param("dst-y", Value::Signed16(em.fetch16(14)));
}

pub(super) fn get_input_focus_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param_spec(
        "focus",
        Value::Window(em.fetch32(8)),
        &[(0, "None"), (1, "PointerRoot")],
    );
    em.param(
        "revert-to",
        Value::Enum(em.fetch8(1), &[(0, "None"), (1, "PointerRoot"), (2, "Parent")]),
    );
}

pub(super) fn query_keymap_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let mut pos = 8;
    for i in 0..32 {
        em.param(&format!("keys[{}]", i), Value::Unsigned(em.fetch8(pos)));
        pos += 1;
        if i + 1 < 32 && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_keyboard_mapping_reply(em: &mut Emitter<'_>, s: &mut ReplyScope<'_>) {
    let mut keycode = s.rec.first_keycode as u32;
    let mut remaining = s.rec.keycode_count;
    let keysyms_per_keycode = em.fetch8(1) as usize;
    let mut pos = 32;
    while remaining > 0 {
        em.set_begin(&format!("keycode[{}]", keycode));
        for i in 0..keysyms_per_keycode {
            em.param(&format!("keysyms[{}]", i), Value::Hex32(em.fetch32(pos)));
            pos += 4;
        }
        em.set_end();
        keycode += 1;
        remaining -= 1;
        if remaining > 0 && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_keyboard_control_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("key-click-percent", Value::Unsigned(em.fetch8(12)));
    em.param("bell-percent", Value::Unsigned(em.fetch8(13)));
    em.param("bell-pitch", Value::Unsigned(em.fetch16(14)));
    em.param("bell-duration", Value::Unsigned(em.fetch16(16)));
    em.param("led-mask", Value::Hex32(em.fetch32(8)));
    em.param(
        "global-auto-repeat",
        Value::Enum(em.fetch8(1), &[(0, "Off"), (1, "On")]),
    );
    let mut pos = 20;
    for i in 0..32 {
        em.param(&format!("auto-repeats[{}]", i), Value::Hex8(em.fetch8(pos)));
        pos += 1;
        if i + 1 < 32 && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_pointer_control_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param(
        "acceleration",
        Value::Rational16(em.fetch16(8), em.fetch16(10)),
    );
    em.param("threshold", Value::Signed16(em.fetch16(12)));
}

pub(super) fn set_pointer_mapping_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param(
        "status",
        Value::Enum(em.fetch8(1), &[(0, "Success"), (1, "Busy")]),
    );
}

pub(super) fn get_pointer_mapping_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch8(1) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.param(&format!("map[{}]", i), Value::Unsigned(em.fetch8(pos)));
        pos += 1;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn set_modifier_mapping_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param(
        "status",
        Value::Enum(em.fetch8(1), &[(0, "Success"), (1, "Busy"), (2, "Failed")]),
    );
}

pub(super) fn get_modifier_mapping_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let per_modifier = em.fetch8(1) as usize;
    let mut pos = 32;
    for modifier in 0..8 {
        em.set_begin(&format!("modifier[{}]", modifier));
        for i in 0..per_modifier {
            em.param(&format!("keycodes[{}]", i), Value::Unsigned(em.fetch8(pos)));
            pos += 1;
        }
        em.set_end();
        if modifier + 1 < 8 && em.list_limit_reached() {
            break;
        }
    }
}
