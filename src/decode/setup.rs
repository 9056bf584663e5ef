//! Server Setup Message
//!
//! The server's setup response both feeds the decoder's per-connection
//! state (image layout, pixmap formats, client id) and can optionally be
//! logged in full.

use super::params::{Emitter, Value};
use crate::protocol::PixmapFormat;
use crate::trace::connection::ConnectionState;

/// Pull the fields later packets depend on out of an accepted setup
/// payload: byte orders, scanline layout, the pixmap-format table and the
/// resource-id base that doubles as the client id.
pub fn extract_setup_state(conn: &mut ConnectionState, data: &[u8]) {
    let order = conn.order();
    conn.client_id = order.u32_at(data, 12);
    conn.image_byte_order = data.get(30).copied().unwrap_or(0);
    conn.bitmap_scanline_unit = data.get(32).copied().unwrap_or(0);
    conn.bitmap_scanline_pad = data.get(33).copied().unwrap_or(0);

    let vendor_len = order.u16_at(data, 24).unwrap_or(0) as usize;
    let nformats = data.get(29).copied().unwrap_or(0) as usize;
    let mut pos = (40 + vendor_len + 3) & !3;
    conn.pixmap_formats.clear();
    for _ in 0..nformats {
        let Some(&depth) = data.get(pos) else { break };
        let Some(&bits_per_pixel) = data.get(pos + 1) else {
            break;
        };
        let Some(&scanline_pad) = data.get(pos + 2) else {
            break;
        };
        conn.pixmap_formats.push(PixmapFormat {
            depth,
            bits_per_pixel,
            scanline_pad,
        });
        pos += 8;
    }
}

/// Render the whole setup message (the `-I` option's output line).
pub fn decode_server_init(em: &mut Emitter<'_>) {
    em.raw("--- server init message: ");
    em.suppress_comma();
    em.param("protocol-major-version", Value::Unsigned(em.fetch16(2)));
    em.param("protocol-minor-version", Value::Unsigned(em.fetch16(4)));
    em.param("release-number", Value::Unsigned(em.fetch32(8)));
    em.param("resource-id-base", Value::Hex32(em.fetch32(12)));
    em.param("resource-id-mask", Value::Hex32(em.fetch32(16)));
    em.param("motion-buffer-size", Value::Unsigned(em.fetch32(20)));
    em.param("maximum-request-length", Value::Unsigned(em.fetch16(26)));
    em.param(
        "image-byte-order",
        Value::Enum(em.fetch8(30), &[(0, "LSBFirst"), (1, "MSBFirst")]),
    );
    em.param(
        "bitmap-bit-order",
        Value::Enum(em.fetch8(31), &[(0, "LeastSignificant"), (1, "MostSignificant")]),
    );
    em.param("bitmap-scanline-unit", Value::Unsigned(em.fetch8(32)));
    em.param("bitmap-scanline-pad", Value::Unsigned(em.fetch8(33)));
    em.param("min-keycode", Value::Unsigned(em.fetch8(34)));
    em.param("max-keycode", Value::Unsigned(em.fetch8(35)));
    let vendor_len = em.fetch16(24) as usize;
    em.param("vendor", Value::String(em.fetch_bytes(40, vendor_len)));

    let mut pos = (40 + vendor_len + 3) & !3;
    let nformats = em.fetch8(29) as usize;
    let mut printing = true;
    for i in 0..nformats {
        if printing {
            em.set_begin(&format!("pixmap-formats[{}]", i));
            em.param("depth", Value::Unsigned(em.fetch8(pos)));
            em.param("bits-per-pixel", Value::Unsigned(em.fetch8(pos + 1)));
            em.param("scanline-pad", Value::Unsigned(em.fetch8(pos + 2)));
            em.set_end();
        }
        // the roots follow the format list, so the walk must finish even
        // after the size limit stops the printing
        pos += 8;
        if printing && i + 1 < nformats && em.list_limit_reached() {
            printing = false;
        }
    }

    let nroots = em.fetch8(28) as usize;
    for i in 0..nroots {
        em.set_begin(&format!("roots[{}]", i));
        em.param("root", Value::Window(em.fetch32(pos)));
        em.param("default-colormap", Value::Colormap(em.fetch32(pos + 4)));
        em.param("white-pixel", Value::Hex32(em.fetch32(pos + 8)));
        em.param("black-pixel", Value::Hex32(em.fetch32(pos + 12)));
        em.param("current-input-masks", Value::EventMask(em.fetch32(pos + 16)));
        em.param("width-in-pixels", Value::Unsigned(em.fetch16(pos + 20)));
        em.param("height-in-pixels", Value::Unsigned(em.fetch16(pos + 22)));
        em.param("width-in-mm", Value::Unsigned(em.fetch16(pos + 24)));
        em.param("height-in-mm", Value::Unsigned(em.fetch16(pos + 26)));
        em.param("min-installed-maps", Value::Unsigned(em.fetch16(pos + 28)));
        em.param("max-installed-maps", Value::Unsigned(em.fetch16(pos + 30)));
        em.param("root-visual", Value::VisualId(em.fetch32(pos + 32)));
        em.param(
            "backing-stores",
            Value::Enum(
                em.fetch8(pos + 36),
                &[(0, "Never"), (1, "WhenMapped"), (2, "Always")],
            ),
        );
        em.param("save-unders", Value::Bool(em.fetch8(pos + 37)));
        em.param("root-depth", Value::Unsigned(em.fetch8(pos + 38)));
        let ndepths = em.fetch8(pos + 39) as usize;
        pos += 40;
        for j in 0..ndepths {
            em.set_begin(&format!("allowed-depths[{}]", j));
            em.param("depth", Value::Unsigned(em.fetch8(pos)));
            let nvisuals = em.fetch16(pos + 2) as usize;
            pos += 8;
            for k in 0..nvisuals {
                em.set_begin(&format!("visuals[{}]", k));
                em.param("visual-id", Value::VisualId(em.fetch32(pos)));
                em.param(
                    "class",
                    Value::Enum(
                        em.fetch8(pos + 4),
                        &[
                            (0, "StaticGray"),
                            (1, "GrayScale"),
                            (2, "StaticColor"),
                            (3, "PseudoColor"),
                            (4, "TrueColor"),
                            (5, "DirectColor"),
                        ],
                    ),
                );
                em.param("bits-per-rgb-value", Value::Unsigned(em.fetch8(pos + 5)));
                em.param("colormap-entries", Value::Unsigned(em.fetch16(pos + 6)));
                em.param("red-mask", Value::Hex32(em.fetch32(pos + 8)));
                em.param("green-mask", Value::Hex32(em.fetch32(pos + 12)));
                em.param("blue-mask", Value::Hex32(em.fetch32(pos + 16)));
                em.set_end();
                pos += 24;
                if k + 1 < nvisuals && em.list_limit_reached() {
                    break;
                }
            }
            em.set_end();
            if j + 1 < ndepths && em.list_limit_reached() {
                break;
            }
        }
        em.set_end();
        if i + 1 < nroots && em.list_limit_reached() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ByteOrder;
    use crate::trace::connection::TraceMode;

    /// A minimal accepted setup payload: vendor "AB", one pixmap format,
    /// no screens.
    fn setup_payload() -> Vec<u8> {
        let mut d = vec![0u8; 48];
        d[0] = 1; // success
        d[2] = 11; // protocol major
        d[12..16].copy_from_slice(&0x00A0_0000u32.to_le_bytes()); // rid base
        d[24] = 2; // vendor length
        d[28] = 0; // roots
        d[29] = 1; // pixmap formats
        d[30] = 0; // image byte order LSBFirst
        d[32] = 32; // scanline unit
        d[33] = 32; // scanline pad
        d[40] = b'A';
        d[41] = b'B';
        // format entry at pad4(40 + 2) = 44
        d[44] = 24; // depth
        d[45] = 32; // bits per pixel
        d[46] = 32; // scanline pad
        d
    }

    #[test]
    fn test_extract_setup_state() {
        let mut conn = ConnectionState::new(TraceMode::Full);
        conn.byte_order = Some(ByteOrder::LittleEndian);
        extract_setup_state(&mut conn, &setup_payload());
        assert_eq!(conn.client_id, Some(0x00A0_0000));
        assert_eq!(conn.bitmap_scanline_unit, 32);
        assert_eq!(conn.bitmap_scanline_pad, 32);
        assert_eq!(conn.pixmap_formats.len(), 1);
        assert_eq!(conn.pixmap_formats[0].bits_per_pixel, 32);
    }

    #[test]
    fn test_decode_server_init_line() {
        let payload = setup_payload();
        let mut em = Emitter::new(&payload, ByteOrder::LittleEndian, 0);
        let text = {
            decode_server_init(&mut em);
            em.finish()
        };
        assert!(text.starts_with("--- server init message: protocol-major-version=11"));
        assert!(text.contains("vendor=\"AB\""));
        assert!(text.contains("pixmap-formats[0]={depth=24, bits-per-pixel=32, scanline-pad=32}"));
    }
}
