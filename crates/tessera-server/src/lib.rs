pub mod error;
pub mod inventory;
pub mod router;

use std::net::SocketAddr;

pub use error::ServerError;
pub use router::{build_router, SiteDirs};

/// Where to serve from and where to listen.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub dirs: SiteDirs,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fails on a missing root, chunk directory or entry page.
    pub fn validate(&self) -> Result<(), ServerError> {
        if !self.dirs.root.is_dir() {
            return Err(ServerError::MissingDirectory(self.dirs.root.clone()));
        }
        if !self.dirs.chunks.is_dir() {
            return Err(ServerError::MissingDirectory(self.dirs.chunks.clone()));
        }
        let entry = self.dirs.entry_page();
        if !entry.is_file() {
            return Err(ServerError::MissingIndex(entry));
        }
        Ok(())
    }
}

/// Run the static server until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    let chunks = inventory::scan_chunk_dir(&config.dirs.chunks)?;
    if chunks.is_empty() {
        log::warn!(
            "No chunk files in {}; run bake-chunks first",
            router::display_path(&config.dirs.chunks)
        );
    } else {
        log::info!(
            "Serving {} chunks from {}",
            chunks.len(),
            router::display_path(&config.dirs.chunks)
        );
    }
    log::info!("Site root: {}", router::display_path(&config.dirs.root));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local: SocketAddr = listener.local_addr()?;
    log::info!("Listening on http://{}", local);

    axum::serve(listener, build_router(&config.dirs))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(root: &std::path::Path, chunks: &std::path::Path) -> ServerConfig {
        ServerConfig {
            dirs: SiteDirs::new(root, chunks),
            host: "127.0.0.1".into(),
            port: 0,
        }
    }

    #[test]
    fn test_validate_requires_entry_page() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = dir.path().join("chunks");
        fs::create_dir(&chunks).unwrap();

        let cfg = config(dir.path(), &chunks);
        assert!(matches!(cfg.validate(), Err(ServerError::MissingIndex(_))));

        fs::write(dir.path().join("index.html"), "").unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_chunk_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "").unwrap();
        let cfg = config(dir.path(), &dir.path().join("missing"));
        assert!(matches!(
            cfg.validate(),
            Err(ServerError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_addr_format() {
        let cfg = config(std::path::Path::new("."), std::path::Path::new("chunks"));
        assert_eq!(cfg.addr(), "127.0.0.1:0");
    }
}
