//! Search engine notification.
//!
//! Pings are best effort: one plain HTTP/1.1 GET, no retry, and transport
//! failures come back as the response text instead of an error.

use std::{
    fmt,
    io::{Read, Write},
    net::TcpStream,
};

use sitemapr_core::config::NotificationConfig;
use tracing::{info, warn};

/// Delivers a sitemap ping.
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Send the ping with the given query string (without `?`) and return
    /// the response text, or the transport error message.
    fn ping(&self, query: &str) -> String;
}

/// Query string announcing `sitemap_url`.
pub fn ping_query(sitemap_url: &str) -> String {
    format!("sitemap={}", urlencoding::encode(sitemap_url))
}

/// Ping over a raw TCP connection, closed after one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpPing {
    host: String,
    path: String,
    port: u16,
}

impl TcpPing {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            port: 80,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The request written to the socket.
    pub fn request(&self, query: &str) -> String {
        let query = if query.is_empty() {
            String::new()
        } else {
            format!("?{query}")
        };
        format!(
            "GET {}{query} HTTP/1.1\r\nHost: {}\r\nConnection: Close\r\n\r\n",
            self.path, self.host
        )
    }

    fn send(&self, query: &str) -> std::io::Result<String> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.write_all(self.request(query).as_bytes())?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response)?;
        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}

impl From<&NotificationConfig> for TcpPing {
    fn from(config: &NotificationConfig) -> Self {
        Self::new(&config.host, &config.path).with_port(config.port)
    }
}

impl Notifier for TcpPing {
    fn ping(&self, query: &str) -> String {
        match self.send(query) {
            Ok(response) => {
                info!(host = %self.host, bytes = response.len(), "sent sitemap ping");
                response
            }
            Err(e) => {
                warn!(host = %self.host, port = self.port, error = %e, "sitemap ping failed");
                e.to_string()
            }
        }
    }
}
