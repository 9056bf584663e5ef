//! X11 Opcode and Extension Tables
//!
//! Requests are dispatched on a uniform 16-bit keyspace: core opcodes use
//! the key directly (0..=127), extension requests use the extension's base
//! id in the high byte ORed with the minor opcode. Events and errors that
//! extensions allocate at runtime are remapped into the same keyspace once
//! a QueryExtension reply has been observed.

/// Dispatch key combining an extension base with a minor opcode. Core
/// requests use the bare opcode (high byte zero).
pub type DispatchKey = u16;

/// Base keys of the extensions this tracer decodes structurally.
pub const EXT_BIGREQUESTS: DispatchKey = 0x0100;
pub const EXT_MITSHM: DispatchKey = 0x0200;
pub const EXT_RENDER: DispatchKey = 0x0300;

/// A protocol extension the decoder knows the internals of.
#[derive(Debug, Clone, Copy)]
pub struct KnownExtension {
    /// Protocol-level name, as sent in QueryExtension
    pub name: &'static str,
    /// Base dispatch key (high byte = internal extension id)
    pub base: DispatchKey,
    /// Number of event codes the extension defines
    pub num_events: u8,
    /// Number of error codes the extension defines
    pub num_errors: u8,
}

/// Registry of extensions with structural decoders.
pub const KNOWN_EXTENSIONS: &[KnownExtension] = &[
    KnownExtension {
        name: "BIG-REQUESTS",
        base: EXT_BIGREQUESTS,
        num_events: 0,
        num_errors: 0,
    },
    KnownExtension {
        name: "MIT-SHM",
        base: EXT_MITSHM,
        num_events: 1,
        num_errors: 1,
    },
    KnownExtension {
        name: "RENDER",
        base: EXT_RENDER,
        num_events: 0,
        num_errors: 5,
    },
];

/// Look up a known extension by its protocol name.
pub fn known_extension(name: &str) -> Option<&'static KnownExtension> {
    KNOWN_EXTENSIONS.iter().find(|e| e.name == name)
}

/// Look up a known extension by the high byte of a dispatch key.
pub fn extension_of(key: DispatchKey) -> Option<&'static KnownExtension> {
    KNOWN_EXTENSIONS.iter().find(|e| e.base == key & 0xFF00)
}

/// First major opcode available to extensions.
pub const FIRST_EXTENSION_OPCODE: u8 = 128;

/// NoOperation, the highest core opcode.
pub const OPCODE_NO_OPERATION: u8 = 127;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(known_extension("RENDER").unwrap().base, EXT_RENDER);
        assert_eq!(known_extension("MIT-SHM").unwrap().num_errors, 1);
        assert!(known_extension("XInputExtension").is_none());
    }

    #[test]
    fn test_extension_of_key() {
        assert_eq!(extension_of(EXT_RENDER | 20).unwrap().name, "RENDER");
        assert!(extension_of(0x0014).is_none());
    }
}
