//! Proxy Display
//!
//! Allocates a fresh display number, listens on its unix socket and TCP
//! port, and pumps every accepted connection to the real server while
//! feeding both directions through a [`Tracer`]. Authorisation cookies
//! pass through untouched. The traced command is spawned with DISPLAY
//! pointing at the proxy.

use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::{ByteStream, DisplayAddr};
use crate::core::error::{Error, Result};
use crate::trace::connection::TraceMode;
use crate::trace::sink::LogContext;
use crate::trace::{TraceOptions, Tracer};

const PUMP_BUFFER: usize = 16384;

/// A listening proxy display.
pub struct ProxyDisplay {
    display: u16,
    tcp: TcpListener,
    unix: Option<UnixListener>,
    upstream: DisplayAddr,
    log: Arc<Mutex<LogContext>>,
    options: Arc<TraceOptions>,
}

impl ProxyDisplay {
    /// Bind the first free display number at or above `min_display`.
    pub async fn bind(
        upstream: DisplayAddr,
        min_display: u16,
        log: Arc<Mutex<LogContext>>,
        options: Arc<TraceOptions>,
    ) -> Result<Self> {
        for display_num in min_display..min_display + 50 {
            let port = 6000 + display_num;
            let tcp = match TcpListener::bind(("127.0.0.1", port)).await {
                Ok(listener) => listener,
                Err(e) => {
                    debug!(port, "proxy port unavailable: {}", e);
                    continue;
                }
            };
            let path = format!("/tmp/.X11-unix/X{}", display_num);
            let unix = match UnixListener::bind(&path) {
                Ok(listener) => Some(listener),
                Err(e) => {
                    warn!(%path, "cannot bind unix socket ({}), TCP only", e);
                    None
                }
            };
            info!(display_num, "proxy display listening");
            return Ok(Self {
                display: display_num,
                tcp,
                unix,
                upstream,
                log,
                options,
            });
        }
        Err(Error::Transport(format!(
            "no free display number at or above :{}",
            min_display
        )))
    }

    /// The DISPLAY value traced clients should use.
    pub fn display_name(&self) -> String {
        format!(":{}", self.display)
    }

    /// Accept and trace connections forever.
    pub async fn run(self) -> Result<()> {
        loop {
            let client: Box<dyn ByteStream> = match &self.unix {
                Some(unix) => {
                    tokio::select! {
                        conn = unix.accept() => Box::new(conn?.0),
                        conn = self.tcp.accept() => Box::new(conn?.0),
                    }
                }
                None => Box::new(self.tcp.accept().await?.0),
            };
            info!("new client connection");
            let upstream = self.upstream.clone();
            let tracer = Tracer::new(
                TraceMode::Full,
                Arc::clone(&self.log),
                Arc::clone(&self.options),
            );
            tokio::spawn(async move {
                match upstream.connect().await {
                    Ok(server) => {
                        if let Err(e) = pump(client, server, tracer).await {
                            debug!("session ended with error: {}", e);
                        } else {
                            info!("session ended");
                        }
                    }
                    Err(e) => error!("cannot connect to X display: {}", e),
                }
            });
        }
    }
}

impl Drop for ProxyDisplay {
    fn drop(&mut self) {
        if self.unix.is_some() {
            let _ = std::fs::remove_file(format!("/tmp/.X11-unix/X{}", self.display));
        }
    }
}

/// Copy bytes both ways between client and server, teeing each direction
/// into the tracer. Returns when either side closes.
pub async fn pump(
    client: Box<dyn ByteStream>,
    server: Box<dyn ByteStream>,
    mut tracer: Tracer,
) -> Result<()> {
    let (mut client_rd, mut client_wr) = tokio::io::split(client);
    let (mut server_rd, mut server_wr) = tokio::io::split(server);
    let mut c2s = vec![0u8; PUMP_BUFFER];
    let mut s2c = vec![0u8; PUMP_BUFFER];
    loop {
        tokio::select! {
            read = client_rd.read(&mut c2s) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                tracer.feed_client_to_server(&c2s[..n]);
                server_wr.write_all(&c2s[..n]).await?;
            }
            read = server_rd.read(&mut s2c) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                tracer.feed_server_to_client(&s2c[..n]);
                client_wr.write_all(&s2c[..n]).await?;
            }
        }
    }
    tracer.close();
    Ok(())
}

/// Spawn the traced command with DISPLAY pointing at the proxy. Returns
/// its exit status.
pub async fn spawn_traced_command(display: &str, command: &[String]) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Config("no command to trace".to_string()))?;
    let mut child = Command::new(program)
        .args(args)
        .env("DISPLAY", display)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| Error::Transport(format!("cannot exec {}: {}", program, e)))?;
    let status = child.wait().await?;
    Ok(status.code().unwrap_or(127))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::filter::Filters;
    use std::io::Write;

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Drive the pump with mock streams: the client sends a setup prefix
    /// and one request, the server stays silent, and both sides see the
    /// other's bytes unchanged.
    #[test]
    fn test_pump_tees_traffic_into_tracer() {
        let mut prefix = vec![0x6C, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        prefix.extend_from_slice(&[127, 0, 1, 0]); // NoOperation
        let client = tokio_test::io::Builder::new().read(&prefix).build();
        let server = tokio_test::io::Builder::new().write(&prefix).build();

        let out = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        let log = Arc::new(Mutex::new(LogContext::new(Box::new(out.clone()))));
        let options = Arc::new(TraceOptions {
            filters: Filters::default(),
            size_limit: 0,
            log_server_init: false,
            raw_hex_dump: false,
        });
        let tracer = Tracer::new(TraceMode::Full, log, options);

        tokio_test::block_on(pump(Box::new(client), Box::new(server), tracer)).unwrap();
        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "NoOperation\n");
    }
}
