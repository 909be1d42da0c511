//! Serve command - HTTP server for the sitemap documents

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;

use crate::server::create_router;

/// Run the serve command.
///
/// Serves `/sitemap.xml` and the class pages until interrupted. `addr`
/// overrides `server.addr` from the configuration.
pub async fn run(config_path: &Path, addr: Option<&str>) -> Result<()> {
    tracing::info!(?config_path, ?addr, "Starting sitemap server");

    let (config, sitemap) = crate::open_sitemap(config_path)?;
    let addr = addr.unwrap_or(&config.server.addr).to_string();

    let classes = sitemap.registered_classes();
    tracing::info!(?classes, "Registered sitemap classes");

    let app = create_router(sitemap);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Sitemap server running at http://{addr}/sitemap.xml");
    println!("  Public index URL: {}", config.url_for("sitemap.xml"));
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}
