//! Output Filtering
//!
//! Which requests and events get printed is controlled by two name sets,
//! each in include or exclude mode, configured with an strace-like `-e`
//! grammar: `[<class>=][!]<name>[,<name>...]` where `<class>` selects the
//! request or event set.

use std::collections::BTreeSet;

use thiserror::Error;

/// A single include/exclude name set.
#[derive(Debug, Clone)]
pub struct FilterSet {
    names: BTreeSet<String>,
    include: bool,
}

impl Default for FilterSet {
    /// The default set excludes nothing.
    fn default() -> Self {
        Self {
            names: BTreeSet::new(),
            include: false,
        }
    }
}

impl FilterSet {
    /// Whether a message with this name should be printed.
    pub fn matches(&self, name: &str) -> bool {
        self.names.contains(name) == self.include
    }
}

/// Both filter sets of a tracer.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub requests: FilterSet,
    pub events: FilterSet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("unknown filter class '{0}' (expected 'requests' or 'events')")]
    UnknownClass(String),
}

impl Filters {
    /// Apply one `-e` style specification. Each call replaces the chosen
    /// set's previous contents.
    pub fn apply_spec(&mut self, spec: &str) -> Result<(), FilterParseError> {
        let (set, mut rest) = match spec.split_once('=') {
            Some((class, rest)) => {
                let set = match class {
                    "requests" | "request" | "reqs" | "req" => &mut self.requests,
                    "events" | "event" => &mut self.events,
                    other => return Err(FilterParseError::UnknownClass(other.to_string())),
                };
                (set, rest)
            }
            None => (&mut self.requests, spec),
        };

        if let Some(stripped) = rest.strip_prefix('!') {
            set.include = false;
            rest = stripped;
        } else {
            set.include = true;
        }
        set.names.clear();

        for token in rest.split(',').filter(|t| !t.is_empty()) {
            match token {
                // placeholder: selects nothing
                "none" => {}
                "all" => {
                    // everything is in this set: flip the polarity with an
                    // empty name list, and nothing later can change that
                    set.names.clear();
                    set.include = !set.include;
                    break;
                }
                name => {
                    set.names.insert(name.to_string());
                }
            }
        }
        Ok(())
    }
}

/// Parse a size-limit argument: a positive decimal, or one of the aliases
/// for "no limit".
pub fn parse_size_limit(value: &str) -> Option<usize> {
    match value.to_ascii_lowercase().as_str() {
        "infinite" | "infinity" | "inf" | "unlimited" | "none" | "nolimit" => Some(0),
        v => v.parse().ok(),
    }
}

/// Parse a resource id: decimal or 0x-prefixed hex. Anything else is
/// rejected rather than silently read as zero.
pub fn parse_resource_id(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if value.chars().all(|c| c.is_ascii_hexdigit()) && !value.is_empty() {
        // xkill-style bare hex ids
        u32::from_str_radix(value, 16).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_everything() {
        let f = Filters::default();
        assert!(f.requests.matches("CreateGC"));
        assert!(f.events.matches("Expose"));
    }

    #[test]
    fn test_include_list() {
        let mut f = Filters::default();
        f.apply_spec("InternAtom,GetProperty").unwrap();
        assert!(f.requests.matches("InternAtom"));
        assert!(f.requests.matches("GetProperty"));
        assert!(!f.requests.matches("CreateGC"));
        // the events set is untouched
        assert!(f.events.matches("Expose"));
    }

    #[test]
    fn test_exclude_list() {
        let mut f = Filters::default();
        f.apply_spec("!CreateGC").unwrap();
        assert!(!f.requests.matches("CreateGC"));
        assert!(f.requests.matches("InternAtom"));
    }

    #[test]
    fn test_event_class_prefix() {
        let mut f = Filters::default();
        f.apply_spec("events=!MotionNotify").unwrap();
        assert!(!f.events.matches("MotionNotify"));
        assert!(f.events.matches("KeyPress"));
        assert!(f.requests.matches("CreateGC"));
    }

    #[test]
    fn test_all_inverts_polarity() {
        let mut f = Filters::default();
        // "all" flips an include set into everything-is-in, so nothing is
        // excluded; "!all" is the empty include set
        f.apply_spec("all").unwrap();
        assert!(f.requests.matches("Anything"));
        f.apply_spec("!all").unwrap();
        assert!(!f.requests.matches("Anything"));
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut f = Filters::default();
        assert_eq!(
            f.apply_spec("bogus=KeyPress"),
            Err(FilterParseError::UnknownClass("bogus".to_string()))
        );
    }

    #[test]
    fn test_size_limit_parsing() {
        assert_eq!(parse_size_limit("256"), Some(256));
        assert_eq!(parse_size_limit("unlimited"), Some(0));
        assert_eq!(parse_size_limit("Infinity"), Some(0));
        assert_eq!(parse_size_limit("soon"), None);
    }

    #[test]
    fn test_resource_id_parsing() {
        assert_eq!(parse_resource_id("0x1400002"), Some(0x1400002));
        assert_eq!(parse_resource_id("1400002"), Some(0x1400002));
        assert_eq!(parse_resource_id("xyzzy"), None);
        assert_eq!(parse_resource_id(""), None);
    }
}
