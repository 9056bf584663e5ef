//! X11 Packet Decoder
//!
//! Turns framed packets into strace-style text. Dispatch is a flat match
//! on the 16-bit dispatch key (core opcodes bare, extension requests as
//! `base | minor`), with one decoder function per request, reply, event
//! and error. The [`params::Emitter`] does the actual text assembly and
//! enforces size limits and packet-overflow handling.

pub mod params;

mod color;
mod common;
mod draw;
mod errors;
mod events;
mod input;
mod misc;
mod render;
mod setup;
mod shm;
mod text;
mod windows;

pub use errors::decode_error;
pub use events::decode_event;
pub use setup::{decode_server_init, extract_setup_state};

/// Whether an event code maps to something the decoder can name, and so
/// carries a usable sequence number in its packet.
pub fn decode_event_name_known(
    conn: &crate::trace::connection::ConnectionState,
    code: u8,
) -> bool {
    events::event_name(conn.event_key(code)).is_some()
}

use crate::protocol::opcodes::{EXT_BIGREQUESTS, EXT_MITSHM, EXT_RENDER};
use crate::trace::connection::ConnectionState;
use crate::trace::filter::Filters;
use crate::trace::requests::{ReplyExpectation, RequestRecord};
use params::Emitter;

/// Everything a request decoder may touch.
pub(crate) struct RequestScope<'a> {
    pub conn: &'a mut ConnectionState,
    pub filters: &'a Filters,
    pub rec: &'a mut RequestRecord,
}

impl RequestScope<'_> {
    /// Set the request's display name and decide, once, whether the
    /// filter lets this record print at all.
    pub fn name(&mut self, em: &mut Emitter<'_>, name: &str) {
        self.named(em, name, true);
    }

    /// Like [`Self::name`], but unrecognised requests filter under the
    /// collective name `UnknownRequest`.
    pub fn named(&mut self, em: &mut Emitter<'_>, name: &str, known: bool) {
        let filter_key = if known { name } else { "UnknownRequest" };
        if !self.filters.requests.matches(filter_key) {
            self.rec.printed = false;
        }
        em.raw(name);
        em.begin_args();
    }

    pub fn expect_reply(&mut self) {
        self.rec.replies = ReplyExpectation::Single;
    }

    pub fn expect_multiple_replies(&mut self) {
        self.rec.replies = ReplyExpectation::MultiUnseen;
    }
}

/// Everything a reply decoder may touch. The matched request supplies the
/// payload captured at request time.
pub(crate) struct ReplyScope<'a> {
    pub conn: &'a mut ConnectionState,
    pub rec: &'a RequestRecord,
}

/// Decode one client request packet into `em`, updating the record's
/// name/filter/reply bookkeeping. The packet's opcode has already been
/// translated into `rec.key`.
pub fn decode_request(
    em: &mut Emitter<'_>,
    conn: &mut ConnectionState,
    filters: &Filters,
    rec: &mut RequestRecord,
) {
    let mut s = RequestScope { conn, filters, rec };
    let s = &mut s;
    match s.rec.key {
        1 => windows::create_window(em, s),
        2 => windows::change_window_attributes(em, s),
        3 => windows::get_window_attributes(em, s),
        4 => windows::destroy_window(em, s),
        5 => windows::destroy_subwindows(em, s),
        6 => windows::change_save_set(em, s),
        7 => windows::reparent_window(em, s),
        8 => windows::map_window(em, s),
        9 => windows::map_subwindows(em, s),
        10 => windows::unmap_window(em, s),
        11 => windows::unmap_subwindows(em, s),
        12 => windows::configure_window(em, s),
        13 => windows::circulate_window(em, s),
        14 => windows::get_geometry(em, s),
        15 => windows::query_tree(em, s),
        16 => windows::intern_atom(em, s),
        17 => windows::get_atom_name(em, s),
        18 => windows::change_property(em, s),
        19 => windows::delete_property(em, s),
        20 => windows::get_property(em, s),
        21 => windows::list_properties(em, s),
        22 => windows::set_selection_owner(em, s),
        23 => windows::get_selection_owner(em, s),
        24 => windows::convert_selection(em, s),
        25 => windows::send_event(em, s),
        26 => input::grab_pointer(em, s),
        27 => input::ungrab_pointer(em, s),
        28 => input::grab_button(em, s),
        29 => input::ungrab_button(em, s),
        30 => input::change_active_pointer_grab(em, s),
        31 => input::grab_keyboard(em, s),
        32 => input::ungrab_keyboard(em, s),
        33 => input::grab_key(em, s),
        34 => input::ungrab_key(em, s),
        35 => input::allow_events(em, s),
        36 => input::grab_server(em, s),
        37 => input::ungrab_server(em, s),
        38 => input::query_pointer(em, s),
        39 => input::get_motion_events(em, s),
        40 => input::translate_coordinates(em, s),
        41 => input::warp_pointer(em, s),
        42 => input::set_input_focus(em, s),
        43 => input::get_input_focus(em, s),
        44 => input::query_keymap(em, s),
        45 => text::open_font(em, s),
        46 => text::close_font(em, s),
        47 => text::query_font(em, s),
        48 => text::query_text_extents(em, s),
        49 => text::list_fonts(em, s),
        50 => text::list_fonts_with_info(em, s),
        51 => text::set_font_path(em, s),
        52 => text::get_font_path(em, s),
        53 => draw::create_pixmap(em, s),
        54 => draw::free_pixmap(em, s),
        55 => draw::create_gc(em, s),
        56 => draw::change_gc(em, s),
        57 => draw::copy_gc(em, s),
        58 => draw::set_dashes(em, s),
        59 => draw::set_clip_rectangles(em, s),
        60 => draw::free_gc(em, s),
        61 => draw::clear_area(em, s),
        62 => draw::copy_area(em, s),
        63 => draw::copy_plane(em, s),
        64 => draw::poly_point(em, s),
        65 => draw::poly_line(em, s),
        66 => draw::poly_segment(em, s),
        67 => draw::poly_rectangle(em, s),
        68 => draw::poly_arc(em, s),
        69 => draw::fill_poly(em, s),
        70 => draw::poly_fill_rectangle(em, s),
        71 => draw::poly_fill_arc(em, s),
        72 => draw::put_image(em, s),
        73 => draw::get_image(em, s),
        74 => text::poly_text8(em, s),
        75 => text::poly_text16(em, s),
        76 => text::image_text8(em, s),
        77 => text::image_text16(em, s),
        78 => color::create_colormap(em, s),
        79 => color::free_colormap(em, s),
        80 => color::copy_colormap_and_free(em, s),
        81 => color::install_colormap(em, s),
        82 => color::uninstall_colormap(em, s),
        83 => color::list_installed_colormaps(em, s),
        84 => color::alloc_color(em, s),
        85 => color::alloc_named_color(em, s),
        86 => color::alloc_color_cells(em, s),
        87 => color::alloc_color_planes(em, s),
        88 => color::free_colors(em, s),
        89 => color::store_colors(em, s),
        90 => color::store_named_color(em, s),
        91 => color::query_colors(em, s),
        92 => color::lookup_color(em, s),
        93 => color::create_cursor(em, s),
        94 => color::create_glyph_cursor(em, s),
        95 => color::free_cursor(em, s),
        96 => color::recolor_cursor(em, s),
        97 => color::query_best_size(em, s),
        98 => misc::query_extension(em, s),
        99 => misc::list_extensions(em, s),
        100 => input::change_keyboard_mapping(em, s),
        101 => input::get_keyboard_mapping(em, s),
        102 => input::change_keyboard_control(em, s),
        103 => input::get_keyboard_control(em, s),
        104 => input::bell(em, s),
        105 => input::change_pointer_control(em, s),
        106 => input::get_pointer_control(em, s),
        107 => misc::set_screen_saver(em, s),
        108 => misc::get_screen_saver(em, s),
        109 => misc::change_hosts(em, s),
        110 => misc::list_hosts(em, s),
        111 => misc::set_access_control(em, s),
        112 => misc::set_close_down_mode(em, s),
        113 => misc::kill_client(em, s),
        114 => windows::rotate_properties(em, s),
        115 => misc::force_screen_saver(em, s),
        116 => input::set_pointer_mapping(em, s),
        117 => input::get_pointer_mapping(em, s),
        118 => input::set_modifier_mapping(em, s),
        119 => input::get_modifier_mapping(em, s),
        127 => misc::no_operation(em, s),
        k if k == EXT_BIGREQUESTS => misc::big_req_enable(em, s),
        k if k & 0xFF00 == EXT_MITSHM => shm::request(em, s, (k & 0xFF) as u8),
        k if k & 0xFF00 == EXT_RENDER => render::request(em, s, (k & 0xFF) as u8),
        _ => misc::unknown_request(em, s),
    }
    em.end_args();
}

/// Decode one reply packet into `em`, keyed by the matched request.
pub fn decode_reply(em: &mut Emitter<'_>, conn: &mut ConnectionState, rec: &RequestRecord) {
    let mut s = ReplyScope { conn, rec };
    let s = &mut s;
    em.reply_begin();
    match s.rec.key {
        3 => windows::get_window_attributes_reply(em, s),
        14 => windows::get_geometry_reply(em, s),
        15 => windows::query_tree_reply(em, s),
        16 => windows::intern_atom_reply(em, s),
        17 => windows::get_atom_name_reply(em, s),
        20 => windows::get_property_reply(em, s),
        21 => windows::list_properties_reply(em, s),
        23 => windows::get_selection_owner_reply(em, s),
        26 => input::grab_pointer_reply(em, s),
        31 => input::grab_keyboard_reply(em, s),
        38 => input::query_pointer_reply(em, s),
        39 => input::get_motion_events_reply(em, s),
        40 => input::translate_coordinates_reply(em, s),
        43 => input::get_input_focus_reply(em, s),
        44 => input::query_keymap_reply(em, s),
        47 => text::query_font_reply(em, s),
        48 => text::query_text_extents_reply(em, s),
        49 => text::list_fonts_reply(em, s),
        50 => text::list_fonts_with_info_reply(em, s),
        52 => text::get_font_path_reply(em, s),
        73 => draw::get_image_reply(em, s),
        83 => color::list_installed_colormaps_reply(em, s),
        84 => color::alloc_color_reply(em, s),
        85 => color::alloc_named_color_reply(em, s),
        86 => color::alloc_color_cells_reply(em, s),
        87 => color::alloc_color_planes_reply(em, s),
        91 => color::query_colors_reply(em, s),
        92 => color::lookup_color_reply(em, s),
        97 => color::query_best_size_reply(em, s),
        98 => misc::query_extension_reply(em, s),
        99 => misc::list_extensions_reply(em, s),
        101 => input::get_keyboard_mapping_reply(em, s),
        103 => input::get_keyboard_control_reply(em, s),
        106 => input::get_pointer_control_reply(em, s),
        108 => misc::get_screen_saver_reply(em, s),
        110 => misc::list_hosts_reply(em, s),
        116 => input::set_pointer_mapping_reply(em, s),
        117 => input::get_pointer_mapping_reply(em, s),
        118 => input::set_modifier_mapping_reply(em, s),
        119 => input::get_modifier_mapping_reply(em, s),
        k if k == EXT_BIGREQUESTS => misc::big_req_enable_reply(em, s),
        k if k & 0xFF00 == EXT_MITSHM => shm::reply(em, s, (k & 0xFF) as u8),
        k if k & 0xFF00 == EXT_RENDER => render::reply(em, s, (k & 0xFF) as u8),
        _ => em.marker("<unable to decode reply data>"),
    }
    em.reply_end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ByteOrder;
    use crate::trace::connection::TraceMode;

    fn decode(data: &[u8]) -> (RequestRecord, String) {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.byte_order = Some(ByteOrder::LittleEndian);
        let filters = Filters::default();
        let mut rec = RequestRecord::new(conn.request_key(data[0], *data.get(1).unwrap_or(&0)));
        let mut em = Emitter::new(data, ByteOrder::LittleEndian, 0);
        decode_request(&mut em, &mut conn, &filters, &mut rec);
        (rec, em.finish())
    }

    #[test]
    fn test_intern_atom_request() {
        // InternAtom, only-if-exists=true, name "WM_S"
        let data = [
            0x10, 0x01, 0x04, 0x00, 0x04, 0x00, 0x00, 0x00, b'W', b'M', b'_', b'S',
        ];
        let (rec, text) = decode(&data);
        assert_eq!(text, "InternAtom(name=\"WM_S\", only-if-exists=True)");
        assert_eq!(rec.replies, ReplyExpectation::Single);
    }

    #[test]
    fn test_get_geometry_request() {
        let data = [0x0E, 0x00, 0x02, 0x00, 0x78, 0x56, 0x34, 0x12];
        let (rec, text) = decode(&data);
        assert_eq!(text, "GetGeometry(drawable=wp#12345678)");
        assert_eq!(rec.replies, ReplyExpectation::Single);
    }

    #[test]
    fn test_truncated_request_annotated() {
        let data = [0x0E, 0x00, 0x02, 0x00];
        let (_, text) = decode(&data);
        assert_eq!(text, "GetGeometry(<packet ends prematurely>)");
    }

    #[test]
    fn test_unknown_core_request() {
        let data = [120, 0, 1, 0];
        let (rec, text) = decode(&data);
        assert_eq!(text, "UnknownRequest120(bytes=4)");
        assert_eq!(rec.replies, ReplyExpectation::None);
    }

    #[test]
    fn test_unregistered_extension_request() {
        let data = [200, 7, 1, 0];
        let (_, text) = decode(&data);
        assert_eq!(text, "200:UnknownExtensionRequest7(bytes=4)");
    }

    #[test]
    fn test_no_operation() {
        let data = [127, 0, 1, 0];
        let (_, text) = decode(&data);
        assert_eq!(text, "NoOperation");
    }
}
