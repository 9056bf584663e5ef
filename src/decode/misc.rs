//! Extension Queries and Housekeeping Requests
//!
//! QueryExtension/ListExtensions, the screen-saver and access-control
//! family, KillClient, NoOperation, the BIG-REQUESTS enable request, and
//! the fallbacks for unrecognised opcodes.

use super::params::{Emitter, HexWidth, Value};
use super::{ReplyScope, RequestScope};
use crate::protocol::opcodes;

const YES_NO_DEFAULT: &[(u32, &str)] = &[(0, "No"), (1, "Yes"), (2, "Default")];

const HOST_FAMILY: &[(u32, &str)] = &[(0, "Internet"), (1, "DECnet"), (2, "Chaos")];

pub(super) fn query_extension(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "QueryExtension");
    let len = em.fetch16(4) as usize;
    let name = em.fetch_bytes(8, len);
    em.param("name", Value::String(name));
    if !em.overflowed() {
        let name = String::from_utf8_lossy(name).into_owned();
        s.rec.extension_base = opcodes::known_extension(&name).map_or(0, |e| e.base);
        s.rec.extension_name = Some(name);
    }
    s.expect_reply();
}

pub(super) fn list_extensions(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ListExtensions");
    s.expect_reply();
}

pub(super) fn set_screen_saver(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetScreenSaver");
    em.param("timeout", Value::Signed16(em.fetch16(4)));
    em.param("interval", Value::Signed16(em.fetch16(6)));
    em.param("prefer-blanking", Value::Enum(em.fetch8(8), YES_NO_DEFAULT));
    em.param("allow-exposures", Value::Enum(em.fetch8(9), YES_NO_DEFAULT));
}

pub(super) fn get_screen_saver(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "GetScreenSaver");
    s.expect_reply();
}

pub(super) fn change_hosts(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ChangeHosts");
    em.param(
        "mode",
        Value::Enum(em.fetch8(1), &[(0, "Insert"), (1, "Delete")]),
    );
    em.param("family", Value::Enum(em.fetch8(4), HOST_FAMILY));
    let len = em.fetch16(6) as usize;
    em.param(
        "address",
        Value::Hex(HexWidth::One, None, em.fetch_bytes(8, len)),
    );
}

pub(super) fn list_hosts(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ListHosts");
    s.expect_reply();
}

pub(super) fn set_access_control(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetAccessControl");
    em.param(
        "mode",
        Value::Enum(em.fetch8(1), &[(0, "Disable"), (1, "Enable")]),
    );
}

pub(super) fn set_close_down_mode(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "SetCloseDownMode");
    em.param(
        "mode",
        Value::Enum(
            em.fetch8(1),
            &[(0, "Destroy"), (1, "RetainPermanent"), (2, "RetainTemporary")],
        ),
    );
}

pub(super) fn kill_client(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "KillClient");
    em.param_spec(
        "resource",
        Value::Hex32(em.fetch32(4)),
        &[(0, "AllTemporary")],
    );
}

pub(super) fn force_screen_saver(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "ForceScreenSaver");
    em.param(
        "mode",
        Value::Enum(em.fetch8(1), &[(0, "Reset"), (1, "Activate")]),
    );
}

pub(super) fn no_operation(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "NoOperation");
}

pub(super) fn big_req_enable(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    s.name(em, "BigReqEnable");
    s.expect_reply();
}

/// Anything the dispatcher has no decoder for: name it by number (with
/// the owning extension's name when one is known) and log the length.
pub(super) fn unknown_request(em: &mut Emitter<'_>, s: &mut RequestScope<'_>) {
    let opcode = em.fetch8(0) as u8;
    let name = if opcode >= opcodes::FIRST_EXTENSION_OPCODE {
        let minor = em.fetch8(1);
        match s.conn.request_extension_name(opcode) {
            Some(ext) => format!("{}:UnknownExtensionRequest{}", ext, minor),
            None => format!("{}:UnknownExtensionRequest{}", opcode, minor),
        }
    } else {
        format!("UnknownRequest{}", opcode)
    };
    s.named(em, &name, false);
    em.param("bytes", Value::Unsigned(em.packet_len() as u32));
}

pub(super) fn query_extension_reply(em: &mut Emitter<'_>, s: &mut ReplyScope<'_>) {
    em.param("present", Value::Bool(em.fetch8(8)));
    em.param("major-opcode", Value::Unsigned(em.fetch8(9)));
    em.param("first-event", Value::Unsigned(em.fetch8(10)));
    em.param("first-error", Value::Unsigned(em.fetch8(11)));
    if !em.overflowed() && em.fetch8(8) != 0 {
        if let Some(name) = s.rec.extension_name.as_deref() {
            let major = em.fetch8(9) as u8;
            let first_event = em.fetch8(10) as u8;
            let first_error = em.fetch8(11) as u8;
            s.conn
                .register_extension(name, s.rec.extension_base, major, first_event, first_error);
        }
    }
}

pub(super) fn list_extensions_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    let n = em.fetch8(1) as usize;
    let mut pos = 32;
    for i in 0..n {
        let len = em.fetch8(pos) as usize;
        em.param(
            &format!("names[{}]", i),
            Value::String(em.fetch_bytes(pos + 1, len)),
        );
        pos += len + 1;
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn get_screen_saver_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("timeout", Value::Signed16(em.fetch16(8)));
    em.param("interval", Value::Signed16(em.fetch16(10)));
    em.param(
        "prefer-blanking",
        Value::Enum(em.fetch8(12), &[(0, "No"), (1, "Yes")]),
    );
    em.param(
        "allow-exposures",
        Value::Enum(em.fetch8(13), &[(0, "No"), (1, "Yes")]),
    );
}

pub(super) fn list_hosts_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param(
        "mode",
        Value::Enum(em.fetch8(1), &[(0, "Disabled"), (1, "Enabled")]),
    );
    let n = em.fetch16(8) as usize;
    let mut pos = 32;
    for i in 0..n {
        em.set_begin(&format!("hosts[{}]", i));
        em.param("family", Value::Enum(em.fetch8(pos), HOST_FAMILY));
        let len = em.fetch16(pos + 2) as usize;
        em.param(
            "address",
            Value::Hex(HexWidth::One, None, em.fetch_bytes(pos + 4, len)),
        );
        em.set_end();
        pos += 4 + ((len + 3) & !3);
        if i + 1 < n && em.list_limit_reached() {
            break;
        }
    }
}

pub(super) fn big_req_enable_reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>) {
    em.param("maximum-request-length", Value::Unsigned(em.fetch32(8)));
}
