//! Transport Layer
//!
//! The two ways traffic reaches the tracing core: a proxy display that
//! sits between a freshly spawned client and the real server, and an
//! X RECORD control channel that taps a client already connected to the
//! real server. Both feed raw bytes to a [`crate::trace::Tracer`].

pub mod proxy;
pub mod record;

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tracing::debug;

use crate::core::error::{Error, Result};

/// Any bidirectional byte stream the proxy can carry.
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// A parsed DISPLAY specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayAddr {
    /// None means the local unix-socket transport
    pub host: Option<String>,
    pub display: u16,
    pub screen: u16,
}

impl DisplayAddr {
    /// Parse `[host]:display[.screen]` as accepted by Xlib.
    pub fn parse(spec: &str) -> Result<Self> {
        let (host, rest) = spec
            .rsplit_once(':')
            .ok_or_else(|| Error::Display(format!("malformed display '{}'", spec)))?;
        let host = match host {
            "" | "unix" => None,
            h => Some(h.to_string()),
        };
        let (display, screen) = match rest.split_once('.') {
            Some((d, s)) => (d, s),
            None => (rest, "0"),
        };
        let display = display
            .parse()
            .map_err(|_| Error::Display(format!("malformed display number in '{}'", spec)))?;
        let screen = screen
            .parse()
            .map_err(|_| Error::Display(format!("malformed screen number in '{}'", spec)))?;
        Ok(Self {
            host,
            display,
            screen,
        })
    }

    /// The unix socket path of a local display.
    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(format!("/tmp/.X11-unix/X{}", self.display))
    }

    /// The TCP port of a networked display.
    pub fn tcp_port(&self) -> u16 {
        6000 + self.display
    }

    /// Connect to the real X server this display names.
    pub async fn connect(&self) -> Result<Box<dyn ByteStream>> {
        match &self.host {
            None => {
                let path = self.socket_path();
                debug!(path = %path.display(), "connecting to X server");
                let stream = UnixStream::connect(&path).await?;
                Ok(Box::new(stream))
            }
            Some(host) => {
                let addr = (host.as_str(), self.tcp_port());
                debug!(host = %host, port = self.tcp_port(), "connecting to X server");
                let stream = TcpStream::connect(addr).await?;
                Ok(Box::new(stream))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_display() {
        let addr = DisplayAddr::parse(":0").unwrap();
        assert_eq!(
            addr,
            DisplayAddr {
                host: None,
                display: 0,
                screen: 0
            }
        );
        assert_eq!(addr.socket_path(), PathBuf::from("/tmp/.X11-unix/X0"));
    }

    #[test]
    fn test_parse_remote_display_with_screen() {
        let addr = DisplayAddr::parse("remote:10.2").unwrap();
        assert_eq!(addr.host.as_deref(), Some("remote"));
        assert_eq!(addr.display, 10);
        assert_eq!(addr.screen, 2);
        assert_eq!(addr.tcp_port(), 6010);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DisplayAddr::parse("nodisplay").is_err());
        assert!(DisplayAddr::parse(":abc").is_err());
    }
}
