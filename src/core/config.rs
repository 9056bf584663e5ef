//! Configuration
//!
//! The CLI knobs can also live in a TOML file; explicit command-line
//! options win over file values. The resolved configuration is what the
//! rest of the program consumes.

use serde::Deserialize;

use super::args::CommandlineArgs;
use super::error::{Error, Result};
use crate::trace::TraceOptions;
use crate::trace::filter::{Filters, parse_resource_id, parse_size_limit};

/// On-disk configuration, all fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub display: Option<String>,
    pub size_limit: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    pub server_init: Option<bool>,
    pub raw_dump: Option<bool>,
    pub client_ids: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path, e)))?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path, e)))
    }
}

/// Everything main needs to run, resolved from file and CLI.
#[derive(Debug)]
pub struct TracerConfig {
    pub display: Option<String>,
    pub output: Option<String>,
    pub attach: Option<u32>,
    pub client_ids: bool,
    pub command: Vec<String>,
    pub trace: TraceOptions,
}

impl TracerConfig {
    /// Merge a config file (if named) under the command-line arguments.
    pub fn resolve(args: &CommandlineArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut filters = Filters::default();
        for spec in file.filters.iter().chain(&args.filters) {
            filters.apply_spec(spec)?;
        }

        let size_limit = match args.size_limit.as_ref().or(file.size_limit.as_ref()) {
            // the default mirrors a reasonable terminal width
            None => 256,
            Some(v) => parse_size_limit(v)
                .ok_or_else(|| Error::Config(format!("bad size limit '{}'", v)))?,
        };

        let attach = match &args.attach {
            None => None,
            Some(v) => Some(
                parse_resource_id(v)
                    .ok_or_else(|| Error::Config(format!("bad resource id '{}'", v)))?,
            ),
        };

        if attach.is_none() && args.command.is_empty() {
            return Err(Error::Config(
                "must specify a command to run, or -p".to_string(),
            ));
        }

        Ok(Self {
            display: args.display.clone().or(file.display),
            output: args.output.clone().or(file.output),
            attach,
            client_ids: args.client_ids || file.client_ids.unwrap_or(false),
            command: args.command.clone(),
            trace: TraceOptions {
                filters,
                size_limit,
                log_server_init: args.server_init || file.server_init.unwrap_or(false),
                raw_hex_dump: args.raw_dump || file.raw_dump.unwrap_or(false),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_resolve_defaults() {
        let args = CommandlineArgs::parse_from(["xtap", "xterm"]);
        let config = TracerConfig::resolve(&args).unwrap();
        assert_eq!(config.trace.size_limit, 256);
        assert_eq!(config.command, vec!["xterm"]);
        assert!(config.attach.is_none());
    }

    #[test]
    fn test_resolve_attach_mode() {
        let args = CommandlineArgs::parse_from(["xtap", "-p", "0x1400002"]);
        let config = TracerConfig::resolve(&args).unwrap();
        assert_eq!(config.attach, Some(0x1400002));
    }

    #[test]
    fn test_resolve_rejects_missing_command() {
        let args = CommandlineArgs::parse_from(["xtap"]);
        assert!(TracerConfig::resolve(&args).is_err());
    }

    #[test]
    fn test_resolve_rejects_bad_limit() {
        let args = CommandlineArgs::parse_from(["xtap", "-s", "soon", "xterm"]);
        assert!(TracerConfig::resolve(&args).is_err());
    }

    #[test]
    fn test_file_config_parses() {
        let file: FileConfig = toml::from_str(
            "size_limit = \"unlimited\"\nfilters = [\"events=!MotionNotify\"]\nserver_init = true\n",
        )
        .unwrap();
        assert_eq!(file.size_limit.as_deref(), Some("unlimited"));
        assert_eq!(file.filters.len(), 1);
        assert_eq!(file.server_init, Some(true));
    }
}
