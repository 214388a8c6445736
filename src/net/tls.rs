//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

/// Error type for certificate and key loading.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}: no certificates found")]
    NoCertificates(PathBuf),
    #[error("{0}: no private key found")]
    NoPrivateKey(PathBuf),
    #[error("building rustls config: {0}")]
    Config(#[source] std::io::Error),
}

/// Load a certificate chain and private key from PEM files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path).await?;
    let key_pem = read(key_path).await?;

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .map(|cert| cert.map(|der| der.to_vec()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .map_err(|source| TlsError::Io {
            path: key_path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.to_path_buf()))?;

    tracing::debug!(
        cert = %cert_path.display(),
        chain_len = certs.len(),
        "Loaded TLS certificate chain"
    );

    RustlsConfig::from_der(certs, key.secret_der().to_vec())
        .await
        .map_err(TlsError::Config)
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tls_config(&dir.path().join("cert.pem"), &dir.path().join("key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::Io { .. }));
    }

    #[tokio::test]
    async fn pem_without_certificates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "not a certificate\n").unwrap();
        std::fs::write(&key, "not a key\n").unwrap();

        let err = load_tls_config(&cert, &key).await.unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)), "{err}");
    }
}
