//! TLS material handling for the listener.
//!
//! The certificate and key arrive through the environment, get written to
//! `server.crt` / `server.key` (mode 0600), and are read back from there to
//! build the listener configuration.

use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::CertificateDer;
use rustls::ServerConfig;

use crate::config::TlsMaterial;
use crate::proxy::trust::crypto_provider;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TlsError + '_ {
    move |source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write the certificate and key to their files, readable by the owner only.
pub fn write_tls_material(material: &TlsMaterial) -> Result<(PathBuf, PathBuf), TlsError> {
    fs::create_dir_all(&material.dir).map_err(io_error(&material.dir))?;

    let cert_path = material.cert_path();
    let key_path = material.key_path();
    write_private(&cert_path, material.certificate.as_bytes())?;
    write_private(&key_path, material.key.as_bytes())?;

    tracing::debug!(cert = ?cert_path, key = ?key_path, "TLS material written");
    Ok((cert_path, key_path))
}

fn write_private(path: &Path, contents: &[u8]) -> Result<(), TlsError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let mut file = options.open(path).map_err(io_error(path))?;
        // `mode` only applies when the file is created.
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(io_error(path))?;
        file.write_all(contents).map_err(io_error(path))?;
    }
    #[cfg(not(unix))]
    {
        let mut file = options.open(path).map_err(io_error(path))?;
        file.write_all(contents).map_err(io_error(path))?;
    }
    Ok(())
}

/// Build the listener's rustls configuration from PEM files.
///
/// Advertises HTTP/2 and HTTP/1.1 over ALPN.
pub fn server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig, TlsError> {
    let cert_file = fs::File::open(cert_path).map_err(io_error(cert_path))?;
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<_, _>>()
        .map_err(io_error(cert_path))?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key_file = fs::File::open(key_path).map_err(io_error(key_path))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(io_error(key_path))?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.to_path_buf()))?;

    let mut config = ServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

/// Load the listener configuration from certificate and key files.
pub fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let config = server_config(cert_path, key_path)?;
    Ok(RustlsConfig::from_config(Arc::new(config)))
}
