//! Typed Parameter Emission
//!
//! Decoders describe a packet as an ordered sequence of named, typed
//! parameters. The [`Emitter`] renders them into a single text line,
//! tracking separator state (`(`, `, `, nested `{}` sets), the per-line
//! size limit, and the packet-overflow condition: once any fetch runs past
//! the end of the packet, a single `<packet ends prematurely>` annotation
//! is printed and every later parameter becomes a no-op.
//!
//! Parameter emission is effectfully ordered; calls must happen in wire
//! order.

use std::cell::Cell;

use bitflags::bitflags;

use crate::protocol::ByteOrder;

bitflags! {
    /// Core protocol event mask (SETofEVENT)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventMask: u32 {
        const KEY_PRESS              = 0x0000_0001;
        const KEY_RELEASE            = 0x0000_0002;
        const BUTTON_PRESS           = 0x0000_0004;
        const BUTTON_RELEASE         = 0x0000_0008;
        const ENTER_WINDOW           = 0x0000_0010;
        const LEAVE_WINDOW           = 0x0000_0020;
        const POINTER_MOTION         = 0x0000_0040;
        const POINTER_MOTION_HINT    = 0x0000_0080;
        const BUTTON1_MOTION         = 0x0000_0100;
        const BUTTON2_MOTION         = 0x0000_0200;
        const BUTTON3_MOTION         = 0x0000_0400;
        const BUTTON4_MOTION         = 0x0000_0800;
        const BUTTON5_MOTION         = 0x0000_1000;
        const BUTTON_MOTION          = 0x0000_2000;
        const KEYMAP_STATE           = 0x0000_4000;
        const EXPOSURE               = 0x0000_8000;
        const VISIBILITY_CHANGE      = 0x0001_0000;
        const STRUCTURE_NOTIFY       = 0x0002_0000;
        const RESIZE_REDIRECT        = 0x0004_0000;
        const SUBSTRUCTURE_NOTIFY    = 0x0008_0000;
        const SUBSTRUCTURE_REDIRECT  = 0x0010_0000;
        const FOCUS_CHANGE           = 0x0020_0000;
        const PROPERTY_CHANGE        = 0x0040_0000;
        const COLORMAP_CHANGE        = 0x0080_0000;
        const OWNER_GRAB_BUTTON      = 0x0100_0000;
    }
}

bitflags! {
    /// Core protocol modifier/button mask (SETofKEYBUTMASK)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyButMask: u16 {
        const SHIFT   = 0x0001;
        const LOCK    = 0x0002;
        const CONTROL = 0x0004;
        const MOD1    = 0x0008;
        const MOD2    = 0x0010;
        const MOD3    = 0x0020;
        const MOD4    = 0x0040;
        const MOD5    = 0x0080;
        const BUTTON1 = 0x0100;
        const BUTTON2 = 0x0200;
        const BUTTON3 = 0x0400;
        const BUTTON4 = 0x0800;
        const BUTTON5 = 0x1000;
    }
}

/// Protocol display names for [`EventMask`] bits, in bit order.
const EVENT_MASK_NAMES: &[(EventMask, &str)] = &[
    (EventMask::KEY_PRESS, "KeyPress"),
    (EventMask::KEY_RELEASE, "KeyRelease"),
    (EventMask::BUTTON_PRESS, "ButtonPress"),
    (EventMask::BUTTON_RELEASE, "ButtonRelease"),
    (EventMask::ENTER_WINDOW, "EnterWindow"),
    (EventMask::LEAVE_WINDOW, "LeaveWindow"),
    (EventMask::POINTER_MOTION, "PointerMotion"),
    (EventMask::POINTER_MOTION_HINT, "PointerMotionHint"),
    (EventMask::BUTTON1_MOTION, "Button1Motion"),
    (EventMask::BUTTON2_MOTION, "Button2Motion"),
    (EventMask::BUTTON3_MOTION, "Button3Motion"),
    (EventMask::BUTTON4_MOTION, "Button4Motion"),
    (EventMask::BUTTON5_MOTION, "Button5Motion"),
    (EventMask::BUTTON_MOTION, "ButtonMotion"),
    (EventMask::KEYMAP_STATE, "KeymapState"),
    (EventMask::EXPOSURE, "Exposure"),
    (EventMask::VISIBILITY_CHANGE, "VisibilityChange"),
    (EventMask::STRUCTURE_NOTIFY, "StructureNotify"),
    (EventMask::RESIZE_REDIRECT, "ResizeRedirect"),
    (EventMask::SUBSTRUCTURE_NOTIFY, "SubstructureNotify"),
    (EventMask::SUBSTRUCTURE_REDIRECT, "SubstructureRedirect"),
    (EventMask::FOCUS_CHANGE, "FocusChange"),
    (EventMask::PROPERTY_CHANGE, "PropertyChange"),
    (EventMask::COLORMAP_CHANGE, "ColormapChange"),
    (EventMask::OWNER_GRAB_BUTTON, "OwnerGrabButton"),
];

/// Protocol display names for [`KeyButMask`] bits, in bit order.
const KEY_MASK_NAMES: &[(KeyButMask, &str)] = &[
    (KeyButMask::SHIFT, "Shift"),
    (KeyButMask::LOCK, "Lock"),
    (KeyButMask::CONTROL, "Control"),
    (KeyButMask::MOD1, "Mod1"),
    (KeyButMask::MOD2, "Mod2"),
    (KeyButMask::MOD3, "Mod3"),
    (KeyButMask::MOD4, "Mod4"),
    (KeyButMask::MOD5, "Mod5"),
    (KeyButMask::BUTTON1, "Button1"),
    (KeyButMask::BUTTON2, "Button2"),
    (KeyButMask::BUTTON3, "Button3"),
    (KeyButMask::BUTTON4, "Button4"),
    (KeyButMask::BUTTON5, "Button5"),
];

/// Element width of a hex-string parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexWidth {
    One,
    Two,
    Three,
    Four,
}

impl HexWidth {
    fn bytes(self) -> usize {
        match self {
            HexWidth::One => 1,
            HexWidth::Two => 2,
            HexWidth::Three => 3,
            HexWidth::Four => 4,
        }
    }

    /// Characters one rendered element plus separator occupies.
    fn render_width(self) -> usize {
        self.bytes() * 2 + 1
    }

    /// Minimum number of elements kept when truncating to the size limit.
    fn truncation_floor(self) -> usize {
        match self {
            HexWidth::One => 8,
            HexWidth::Two => 4,
            HexWidth::Three => 2,
            HexWidth::Four => 2,
        }
    }
}

/// A rendering request for one parameter value. The variants are display
/// types, not wire types: e.g. a WINDOW and a PIXMAP are both CARD32 on
/// the wire but render with different prefixes.
#[derive(Debug, Clone, Copy)]
pub enum Value<'a> {
    /// Unsigned decimal
    Unsigned(u32),
    /// Signed decimal, sign-extended from 8 bits
    Signed8(u32),
    /// Signed decimal, sign-extended from 16 bits
    Signed16(u32),
    /// Signed decimal of the full 32 bits
    Signed32(u32),
    Hex8(u32),
    Hex16(u32),
    Hex32(u32),
    /// numerator/denominator, both sign-extended from 16 bits
    Rational16(u32, u32),
    Bool(u32),
    /// RENDER signed 16.16 fixed point
    Fixed(u32),
    Window(u32),
    Pixmap(u32),
    Font(u32),
    GContext(u32),
    Cursor(u32),
    Colormap(u32),
    /// Window or pixmap; live-id tracking would be needed to tell which
    Drawable(u32),
    /// Font or graphics context
    Fontable(u32),
    VisualId(u32),
    Atom(u32),
    Picture(u32),
    PictFormat(u32),
    GlyphSet(u32),
    /// Fontable or glyphset
    Glyphable(u32),
    EventMask(u32),
    KeyMask(u32),
    /// Caller-supplied (bit, name) pairs
    Mask(u32, &'a [(u32, &'static str)]),
    /// Caller-supplied (value, name) pairs; unexpected values render
    /// `Unknown<n>` so a mismatch is visible
    Enum(u32, &'a [(u32, &'static str)]),
    /// Text, C-escaped and quoted
    String(&'a [u8]),
    /// Raw data as colon-joined hex elements. The byte order applies to
    /// widths 2..4; None means the connection byte order.
    Hex(HexWidth, Option<ByteOrder>, &'a [u8]),
    /// Print `name=` alone; the caller appends its own rendering
    Nothing,
}

impl Value<'_> {
    /// The raw integer compared against special-value sentinels.
    fn raw(&self) -> Option<u32> {
        match *self {
            Value::Unsigned(v)
            | Value::Signed8(v)
            | Value::Signed16(v)
            | Value::Signed32(v)
            | Value::Hex8(v)
            | Value::Hex16(v)
            | Value::Hex32(v)
            | Value::Bool(v)
            | Value::Fixed(v)
            | Value::Window(v)
            | Value::Pixmap(v)
            | Value::Font(v)
            | Value::GContext(v)
            | Value::Cursor(v)
            | Value::Colormap(v)
            | Value::Drawable(v)
            | Value::Fontable(v)
            | Value::VisualId(v)
            | Value::Atom(v)
            | Value::Picture(v)
            | Value::PictFormat(v)
            | Value::GlyphSet(v)
            | Value::Glyphable(v)
            | Value::EventMask(v)
            | Value::KeyMask(v)
            | Value::Mask(v, _)
            | Value::Enum(v, _) => Some(v),
            _ => None,
        }
    }
}

/// Separator state between parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitState {
    /// No parameter yet: the next one opens the argument list
    Start,
    /// Mid-list: the next parameter is preceded by `, `
    Normal,
    /// The packet ended prematurely; remaining parameters are dropped
    Overflowed,
    /// Immediately after `{` or an explicit `(`: suppress one comma
    NoComma,
}

/// Renders one packet's parameters into a text line.
pub struct Emitter<'a> {
    data: &'a [u8],
    order: ByteOrder,
    buf: String,
    limit: usize,
    state: EmitState,
    overflow: Cell<bool>,
}

impl<'a> Emitter<'a> {
    /// Start rendering `data` (one framed packet) with the connection's
    /// byte order. `limit` of 0 means no size limit.
    pub fn new(data: &'a [u8], order: ByteOrder, limit: usize) -> Self {
        Self {
            data,
            order,
            buf: String::new(),
            limit,
            state: EmitState::NoComma,
            overflow: Cell::new(false),
        }
    }

    /// Packet length in bytes.
    pub fn packet_len(&self) -> usize {
        self.data.len()
    }

    /// Connection byte order the packet is decoded with.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// True once any fetch has run past the end of the packet.
    pub fn overflowed(&self) -> bool {
        self.overflow.get()
    }

    /// Fetch an unsigned byte, flagging overflow past the packet end.
    pub fn fetch8(&self, pos: usize) -> u32 {
        match self.data.get(pos) {
            Some(&b) => b as u32,
            None => {
                self.overflow.set(true);
                0
            }
        }
    }

    /// Fetch a 16-bit integer in the connection byte order.
    pub fn fetch16(&self, pos: usize) -> u32 {
        match self.order.u16_at(self.data, pos) {
            Some(v) => v as u32,
            None => {
                self.overflow.set(true);
                0
            }
        }
    }

    /// Fetch a 32-bit integer in the connection byte order.
    pub fn fetch32(&self, pos: usize) -> u32 {
        match self.order.u32_at(self.data, pos) {
            Some(v) => v,
            None => {
                self.overflow.set(true);
                0
            }
        }
    }

    /// Fetch `len` raw bytes, flagging overflow and yielding an empty
    /// slice if they run past the packet end.
    pub fn fetch_bytes(&self, pos: usize, len: usize) -> &'a [u8] {
        match self.data.get(pos..pos.saturating_add(len)) {
            Some(s) => s,
            None => {
                self.overflow.set(true);
                &[]
            }
        }
    }

    /// Begin the argument list of a request whose name has already been
    /// written to the line.
    pub fn begin_args(&mut self) {
        self.state = EmitState::Start;
    }

    /// Append literal text (request/event names, explicit parentheses).
    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Suppress the comma before the next parameter.
    pub fn suppress_comma(&mut self) {
        if self.state != EmitState::Overflowed {
            self.state = EmitState::NoComma;
        }
    }

    /// Emit one named, typed parameter.
    pub fn param(&mut self, name: &str, value: Value<'_>) {
        self.param_spec(name, value, &[]);
    }

    /// Emit one parameter, first checking `specials`: if the raw value
    /// matches a sentinel, its name is printed instead of the rendering.
    pub fn param_spec(&mut self, name: &str, value: Value<'_>, specials: &[(u32, &str)]) {
        if !self.separate() {
            return;
        }
        self.buf.push_str(name);
        self.buf.push('=');
        if let Some(raw) = value.raw() {
            if let Some((_, s)) = specials.iter().find(|(v, _)| *v == raw) {
                self.buf.push_str(s);
                return;
            }
        }
        self.render(value);
    }

    /// Emit a bare annotation with no `=value` part (`...`,
    /// `<unrecognised image depth>` and friends).
    pub fn marker(&mut self, text: &str) {
        if !self.separate() {
            return;
        }
        self.buf.push_str(text);
    }

    /// Open a nested `{` set under the given parameter name.
    pub fn set_begin(&mut self, name: &str) {
        if !self.separate() {
            return;
        }
        self.buf.push_str(name);
        self.buf.push_str("={");
        self.state = EmitState::NoComma;
    }

    /// Close a nested set.
    pub fn set_end(&mut self) {
        self.buf.push('}');
        if self.state != EmitState::Overflowed {
            self.state = EmitState::Normal;
        }
    }

    /// Open the `{` of a reply rendering.
    pub fn reply_begin(&mut self) {
        self.buf.push('{');
        self.state = EmitState::NoComma;
    }

    /// Close the `}` of a reply rendering.
    pub fn reply_end(&mut self) {
        self.buf.push('}');
    }

    /// Close the argument list of a request, unless nothing was opened.
    pub fn end_args(&mut self) {
        if self.state != EmitState::Start {
            self.buf.push(')');
        }
    }

    /// Size-limit check for repeated substructures: when the line has
    /// outgrown the limit, emit a `...` marker and tell the caller to stop
    /// iterating.
    pub fn list_limit_reached(&mut self) -> bool {
        if self.limit > 0 && self.buf.len() > self.limit {
            self.marker("...");
            return true;
        }
        false
    }

    /// Consume the emitter, yielding the rendered text.
    pub fn finish(self) -> String {
        self.buf
    }

    /// Write the separator due before a parameter. Returns false when the
    /// parameter must be dropped (after an overflow annotation).
    fn separate(&mut self) -> bool {
        match self.state {
            EmitState::Start => {
                self.buf.push('(');
                self.state = EmitState::Normal;
            }
            EmitState::NoComma => {
                self.state = EmitState::Normal;
            }
            EmitState::Normal => {
                self.buf.push_str(", ");
            }
            EmitState::Overflowed => return false,
        }
        if self.overflow.get() {
            self.buf.push_str("<packet ends prematurely>");
            self.state = EmitState::Overflowed;
            return false;
        }
        true
    }

    fn render(&mut self, value: Value<'_>) {
        match value {
            Value::Unsigned(v) => {
                self.buf.push_str(&v.to_string());
            }
            Value::Signed8(v) => {
                self.buf.push_str(&(v as u8 as i8).to_string());
            }
            Value::Signed16(v) => {
                self.buf.push_str(&(v as u16 as i16).to_string());
            }
            Value::Signed32(v) => {
                self.buf.push_str(&(v as i32).to_string());
            }
            Value::Hex8(v) => {
                self.buf.push_str(&format!("0x{:02X}", v));
            }
            Value::Hex16(v) => {
                self.buf.push_str(&format!("0x{:04X}", v));
            }
            Value::Hex32(v) => {
                self.buf.push_str(&format!("0x{:08X}", v));
            }
            Value::Rational16(n, d) => {
                let n = n as u16 as i16;
                let d = d as u16 as i16;
                self.buf.push_str(&format!("{}/{}", n, d));
            }
            Value::Bool(v) => match v {
                0 => self.buf.push_str("False"),
                1 => self.buf.push_str("True"),
                n => self.buf.push_str(&format!("BadBool{}", n)),
            },
            Value::Fixed(v) => {
                self.buf.push_str(&format!("{:.5}", (v as i32) as f64 / 65536.0));
            }
            Value::Window(v) => self.resource("w#", v),
            Value::Pixmap(v) => self.resource("p#", v),
            Value::Font(v) => self.resource("f#", v),
            Value::GContext(v) => self.resource("g#", v),
            // Longer prefixes keep CURSOR and COLORMAP apart at a glance
            Value::Cursor(v) => self.resource("cur#", v),
            Value::Colormap(v) => self.resource("col#", v),
            Value::Drawable(v) => self.resource("wp#", v),
            Value::Fontable(v) => self.resource("fg#", v),
            Value::VisualId(v) => self.resource("v#", v),
            Value::Picture(v) => self.resource("pc#", v),
            Value::PictFormat(v) => self.resource("pf#", v),
            Value::GlyphSet(v) => self.resource("gs#", v),
            Value::Glyphable(v) => self.resource("gsfg#", v),
            Value::Atom(v) => {
                self.buf.push_str(&format!("a#{}", v));
            }
            Value::EventMask(v) => {
                let mask = EventMask::from_bits_truncate(v);
                self.flags(EVENT_MASK_NAMES.iter().filter(|(b, _)| mask.contains(*b)));
            }
            Value::KeyMask(v) => {
                let mask = KeyButMask::from_bits_truncate(v as u16);
                self.flags(KEY_MASK_NAMES.iter().filter(|(b, _)| mask.contains(*b)));
            }
            Value::Mask(v, names) => self.mask(v, names),
            Value::Enum(v, names) => match names.iter().find(|(n, _)| *n == v) {
                Some((_, s)) => self.buf.push_str(s),
                // An ENUM is expected to always hit one of its values, so
                // surprises are rendered loudly
                None => self.buf.push_str(&format!("Unknown{}", v)),
            },
            Value::String(bytes) => self.string(bytes),
            Value::Hex(width, order, bytes) => self.hex_string(width, order, bytes),
            Value::Nothing => {}
        }
    }

    fn resource(&mut self, prefix: &str, v: u32) {
        self.buf.push_str(prefix);
        self.buf.push_str(&format!("{:08X}", v));
    }

    fn mask(&mut self, v: u32, names: &[(u32, &'static str)]) {
        self.flags(names.iter().filter(|(bit, _)| v & bit != 0));
    }

    /// Join set flag names with `|`, or print `0` when none are set.
    fn flags<'n, T: 'n>(&mut self, set: impl Iterator<Item = &'n (T, &'static str)>) {
        let mut sep = "";
        for (_, name) in set {
            self.buf.push_str(sep);
            self.buf.push_str(name);
            sep = "|";
        }
        if sep.is_empty() {
            self.buf.push('0');
        }
    }

    fn string(&mut self, bytes: &[u8]) {
        let mut n = bytes.len();
        let mut trail = "";
        if self.limit > 0 && self.buf.len() + n > self.limit {
            let keep = self.limit.saturating_sub(self.buf.len()).max(20);
            if n > keep {
                n = keep;
                trail = "...";
            }
        }
        self.buf.push('"');
        for &b in &bytes[..n] {
            match b {
                b'\n' => self.buf.push_str("\\n"),
                b'\r' => self.buf.push_str("\\r"),
                b'\t' => self.buf.push_str("\\t"),
                0x08 => self.buf.push_str("\\b"),
                b'\\' => self.buf.push_str("\\\\"),
                b'"' => self.buf.push_str("\\\""),
                32..=126 => self.buf.push(b as char),
                _ => self.buf.push_str(&format!("\\{:03o}", b)),
            }
        }
        self.buf.push('"');
        self.buf.push_str(trail);
    }

    fn hex_string(&mut self, width: HexWidth, order: Option<ByteOrder>, bytes: &[u8]) {
        let order = order.unwrap_or(self.order);
        let elsize = width.bytes();
        let mut count = bytes.len() / elsize;
        let mut trail = "";
        let w = width.render_width();
        if self.limit > 0 && self.buf.len() + w * count > self.limit + 1 {
            let keep = ((self.limit + 1).saturating_sub(self.buf.len()) / w)
                .max(width.truncation_floor());
            if count > keep {
                count = keep;
                trail = "...";
            }
        }
        let mut sep = "";
        for i in 0..count {
            let pos = i * elsize;
            self.buf.push_str(sep);
            let rendered = match width {
                HexWidth::One => format!("{:02X}", bytes[pos]),
                HexWidth::Two => format!("{:04X}", order.u16_at(bytes, pos).unwrap_or(0)),
                HexWidth::Three => format!("{:06X}", order.u24_at(bytes, pos).unwrap_or(0)),
                HexWidth::Four => format!("{:08X}", order.u32_at(bytes, pos).unwrap_or(0)),
            };
            self.buf.push_str(&rendered);
            sep = ":";
        }
        if !trail.is_empty() {
            self.buf.push_str(sep);
            self.buf.push_str(trail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter(data: &[u8]) -> Emitter<'_> {
        Emitter::new(data, ByteOrder::LittleEndian, 0)
    }

    #[test]
    fn test_basic_param_sequence() {
        let mut em = emitter(&[]);
        em.raw("MapWindow");
        em.begin_args();
        em.param("window", Value::Window(0x123));
        em.param("flag", Value::Bool(1));
        em.end_args();
        assert_eq!(em.finish(), "MapWindow(window=w#00000123, flag=True)");
    }

    #[test]
    fn test_no_args_omits_parens() {
        let mut em = emitter(&[]);
        em.raw("GrabServer");
        em.begin_args();
        em.end_args();
        assert_eq!(em.finish(), "GrabServer");
    }

    #[test]
    fn test_special_value_sentinel() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.param_spec("time", Value::Hex32(0), &[(0, "CurrentTime")]);
        em.param_spec("cursor", Value::Cursor(5), &[(0, "None")]);
        assert_eq!(em.finish(), "(time=CurrentTime, cursor=cur#00000005");
    }

    #[test]
    fn test_nested_set() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.set_begin("rectangles[0]");
        em.param("x", Value::Signed16(0xFFFF));
        em.param("y", Value::Signed16(2));
        em.set_end();
        em.param("gc", Value::GContext(1));
        assert_eq!(em.finish(), "(rectangles[0]={x=-1, y=2}, gc=g#00000001");
    }

    #[test]
    fn test_overflow_annotation_once() {
        let data = [1u8, 2];
        let mut em = Emitter::new(&data, ByteOrder::LittleEndian, 0);
        em.begin_args();
        let ok = em.fetch8(0);
        em.param("a", Value::Unsigned(ok));
        let bad = em.fetch32(0);
        em.param("b", Value::Unsigned(bad));
        em.param("c", Value::Unsigned(9));
        em.end_args();
        assert_eq!(em.finish(), "(a=1, <packet ends prematurely>)");
    }

    #[test]
    fn test_masks() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.param("event-mask", Value::EventMask(0x0000_8005));
        em.param("none", Value::EventMask(0));
        em.param("mods", Value::KeyMask(0x0005));
        assert_eq!(
            em.finish(),
            "(event-mask=KeyPress|ButtonPress|Exposure, none=0, mods=Shift|Control"
        );
    }

    #[test]
    fn test_string_escaping() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.param("name", Value::String(b"a\"b\\c\n\x01"));
        assert_eq!(em.finish(), "(name=\"a\\\"b\\\\c\\n\\001\"");
    }

    #[test]
    fn test_string_truncated_by_limit() {
        let mut em = Emitter::new(&[], ByteOrder::LittleEndian, 40);
        em.begin_args();
        em.param("data", Value::String(&[b'x'; 1000]));
        let text = em.finish();
        assert!(text.ends_with("\"..."));
        assert!(text.len() < 80);
    }

    #[test]
    fn test_hex_strings() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.param("h1", Value::Hex(HexWidth::One, None, &[0xDE, 0xAD]));
        em.param(
            "h2",
            Value::Hex(HexWidth::Two, Some(ByteOrder::BigEndian), &[0x12, 0x34, 0x56, 0x78]),
        );
        em.param("h4", Value::Hex(HexWidth::Four, None, &[1, 0, 0, 0]));
        assert_eq!(em.finish(), "(h1=DE:AD, h2=1234:5678, h4=00000001");
    }

    #[test]
    fn test_fixed_and_rational() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.param("f", Value::Fixed(0x0001_8000));
        em.param("r", Value::Rational16(0xFFFF, 2));
        assert_eq!(em.finish(), "(f=1.50000, r=-1/2");
    }

    #[test]
    fn test_enum_fallback() {
        let mut em = emitter(&[]);
        em.begin_args();
        em.param("mode", Value::Enum(7, &[(0, "Replace"), (1, "Prepend")]));
        assert_eq!(em.finish(), "(mode=Unknown7");
    }

    #[test]
    fn test_list_limit_marker() {
        let mut em = Emitter::new(&[], ByteOrder::LittleEndian, 10);
        em.begin_args();
        em.param("first", Value::Unsigned(123456789));
        assert!(em.list_limit_reached());
        assert_eq!(em.finish(), "(first=123456789, ...");
    }
}
