//! Ping command - notify the search engine that the sitemap changed

use std::path::Path;

use color_eyre::eyre::Result;

/// Run the ping command.
///
/// Returns the ping response, or `None` when notifications are disabled or
/// the site is not live.
pub fn run(config_path: &Path) -> Result<Option<String>> {
    tracing::info!(?config_path, "Sending sitemap ping");

    let (config, sitemap) = crate::open_sitemap(config_path)?;
    let response = sitemap.notify_update();

    println!();
    match &response {
        Some(response) => {
            let status = response.lines().next().unwrap_or_default();
            println!("  Pinged {} for {}", config.notifications.host, sitemap.index_url());
            println!("  Response: {status}");
        }
        None if !sitemap.notifications_enabled() => {
            println!("  Notifications are disabled (notifications.enabled = false)");
        }
        None => {
            println!("  Site is not live, ping skipped (site.mode = live to enable)");
        }
    }
    println!();

    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    use super::*;

    fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("sitemapr.toml");
        std::fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn test_ping_skipped_when_not_live() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = write_config(
            dir.path(),
            r#"
[site]
base_url = "https://example.com"

[notifications]
enabled = true
host = "127.0.0.1"
port = 9
"#,
        );

        assert_eq!(run(&config_path).expect("ping"), None);
    }

    #[test]
    fn test_ping_live_site() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = [0u8; 1024];
            let n = stream.read(&mut buf).expect("read");
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
                .expect("write");
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = write_config(
            dir.path(),
            &format!(
                r#"
[site]
base_url = "https://example.com"
mode = "live"

[notifications]
enabled = true
host = "127.0.0.1"
path = "/ping"
port = {port}
"#
            ),
        );

        let response = run(&config_path).expect("ping").expect("response");
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        let request = server.join().expect("join");
        assert!(request.starts_with(
            "GET /ping?sitemap=https%3A%2F%2Fexample.com%2Fsitemap.xml HTTP/1.1\r\n"
        ));
    }
}
