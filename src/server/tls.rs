//! In-process TLS for deployments that are not behind a terminating proxy.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::ServerConfig;
use crate::error::Result;

/// Certificate and key to serve with, if TLS should be terminated here.
///
/// Hosted deployments (`PORT` handed in by the platform) terminate TLS
/// upstream, so local certificates are ignored there.
pub fn tls_files(server: &ServerConfig, hosted: bool) -> Option<(&Path, &Path)> {
    if hosted {
        return None;
    }

    let cert = Path::new(&server.tls_cert);
    let key = Path::new(&server.tls_key);
    (cert.is_file() && key.is_file()).then_some((cert, key))
}

pub async fn load_rustls_config(server: &ServerConfig, hosted: bool) -> Result<Option<RustlsConfig>> {
    let Some((cert, key)) = tls_files(server, hosted) else {
        return Ok(None);
    };

    // Fails only if a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = RustlsConfig::from_pem_file(cert, key).await?;
    tracing::info!(cert = %cert.display(), key = %key.display(), "TLS certificate loaded");

    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_pair() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("signaling-tls-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let cert = dir.join("cert.pem");
        let key = dir.join("key.pem");
        fs::write(&cert, "cert").unwrap();
        fs::write(&key, "key").unwrap();
        (cert, key)
    }

    fn server_with(cert: &Path, key: &Path) -> ServerConfig {
        ServerConfig {
            tls_cert: cert.display().to_string(),
            tls_key: key.display().to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_missing_files_serve_plain_http() {
        let server = server_with(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"));
        assert!(tls_files(&server, false).is_none());
    }

    #[test]
    fn test_present_files_enable_tls() {
        let (cert, key) = temp_pair();
        let server = server_with(&cert, &key);

        let (found_cert, found_key) = tls_files(&server, false).unwrap();
        assert_eq!(found_cert, cert.as_path());
        assert_eq!(found_key, key.as_path());
    }

    #[test]
    fn test_hosted_ignores_local_certificates() {
        let (cert, key) = temp_pair();
        let server = server_with(&cert, &key);

        assert!(tls_files(&server, true).is_none());
    }

    #[tokio::test]
    async fn test_load_without_files_is_none() {
        let server = server_with(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"));
        assert!(load_rustls_config(&server, false).await.unwrap().is_none());
    }
}
