//! MIT-SHM Extension
//!
//! Shared-memory image requests (minors 0..=5), the two replies, and the
//! ShmCompletion event.

use super::params::{Emitter, Value};
use super::{ReplyScope, RequestScope};

const SHM_FORMAT: &[(u32, &str)] = &[(0, "Bitmap"), (1, "XYPixmap"), (2, "ZPixmap")];

pub(super) fn request(em: &mut Emitter<'_>, s: &mut RequestScope<'_>, minor: u8) {
    match minor {
        0 => {
            s.name(em, "ShmQueryVersion");
            s.expect_reply();
        }
        1 => {
            s.name(em, "ShmAttach");
            em.param("shmseg", Value::Hex32(em.fetch32(4)));
            em.param("shmid", Value::Hex32(em.fetch32(8)));
            em.param("read-only", Value::Bool(em.fetch8(12)));
        }
        2 => {
            s.name(em, "ShmDetach");
            em.param("shmseg", Value::Hex32(em.fetch32(4)));
        }
        3 => {
            s.name(em, "ShmPutImage");
            em.param("drawable", Value::Drawable(em.fetch32(4)));
            em.param("gc", Value::GContext(em.fetch32(8)));
            em.param("total-width", Value::Unsigned(em.fetch16(12)));
            em.param("total-height", Value::Unsigned(em.fetch16(14)));
            em.param("src-x", Value::Unsigned(em.fetch16(16)));
            em.param("src-y", Value::Unsigned(em.fetch16(18)));
            em.param("src-width", Value::Unsigned(em.fetch16(20)));
            em.param("src-height", Value::Unsigned(em.fetch16(22)));
            em.param("dst-x", Value::Signed16(em.fetch16(24)));
            em.param("dst-y", Value::Signed16(em.fetch16(26)));
            em.param("depth", Value::Unsigned(em.fetch8(28)));
            em.param("format", Value::Enum(em.fetch8(29), SHM_FORMAT));
            em.param("send-event", Value::Bool(em.fetch8(30)));
            em.param("shmseg", Value::Hex32(em.fetch32(32)));
            em.param("offset", Value::Hex32(em.fetch32(36)));
        }
        4 => {
            s.name(em, "ShmGetImage");
            em.param("drawable", Value::Drawable(em.fetch32(4)));
            em.param("x", Value::Signed16(em.fetch16(8)));
            em.param("y", Value::Signed16(em.fetch16(10)));
            em.param("width", Value::Unsigned(em.fetch16(12)));
            em.param("height", Value::Unsigned(em.fetch16(14)));
            em.param("plane-mask", Value::Hex32(em.fetch32(16)));
            em.param("format", Value::Enum(em.fetch8(20), SHM_FORMAT));
            em.param("shmseg", Value::Hex32(em.fetch32(24)));
            em.param("offset", Value::Hex32(em.fetch32(28)));
            s.expect_reply();
        }
        5 => {
            s.name(em, "ShmCreatePixmap");
            em.param("pid", Value::Pixmap(em.fetch32(4)));
            em.param("drawable", Value::Drawable(em.fetch32(8)));
            em.param("width", Value::Unsigned(em.fetch16(12)));
            em.param("height", Value::Unsigned(em.fetch16(14)));
            em.param("depth", Value::Unsigned(em.fetch8(16)));
            em.param("shmseg", Value::Hex32(em.fetch32(20)));
            em.param("offset", Value::Hex32(em.fetch32(24)));
        }
        _ => {
            s.named(em, &format!("MIT-SHM:UnknownExtensionRequest{}", minor), false);
            em.param("bytes", Value::Unsigned(em.packet_len() as u32));
        }
    }
}

pub(super) fn reply(em: &mut Emitter<'_>, _s: &mut ReplyScope<'_>, minor: u8) {
    match minor {
        0 => {
            em.param("shared-pixmaps", Value::Bool(em.fetch8(1)));
            em.param("major-version", Value::Unsigned(em.fetch16(8)));
            em.param("minor-version", Value::Unsigned(em.fetch16(10)));
            em.param("uid", Value::Unsigned(em.fetch16(12)));
            em.param("gid", Value::Unsigned(em.fetch16(14)));
            em.param("pixmap-format", Value::Enum(em.fetch8(16), SHM_FORMAT));
        }
        4 => {
            em.param("depth", Value::Unsigned(em.fetch8(1)));
            em.param("visual", Value::VisualId(em.fetch32(8)));
            em.param("size", Value::Unsigned(em.fetch32(12)));
        }
        _ => em.marker("<unable to decode reply data>"),
    }
}

/// The ShmCompletion event body (sub-event 0).
pub(super) fn completion_event(em: &mut Emitter<'_>, pos: usize) {
    em.raw("(");
    em.suppress_comma();
    em.param("drawable", Value::Drawable(em.fetch32(pos + 4)));
    em.param("shmseg", Value::Hex32(em.fetch32(pos + 8)));
    em.param("minor-event", Value::Unsigned(em.fetch16(pos + 12)));
    em.param("major-event", Value::Unsigned(em.fetch8(pos + 14)));
    em.param("offset", Value::Hex32(em.fetch32(pos + 16)));
    em.raw(")");
}
