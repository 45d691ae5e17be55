//! TLS bootstrap: load the PEM certificate chain and private key into a
//! rustls server config and wrap it in a tokio acceptor.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio_rustls::TlsAcceptor;

/// Build a [`TlsAcceptor`] from PEM files on disk.
///
/// # Errors
///
/// Any failure here (missing file, no key in the file, cert/key
/// mismatch) is a bootstrap error; the caller exits non-zero.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> anyhow::Result<TlsAcceptor> {
    let cert_file = File::open(cert_path)
        .with_context(|| format!("cannot open certificate file {}", cert_path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<Vec<_>, _>>()
        .context("cannot parse certificate file")?;

    let key_file = File::open(key_path)
        .with_context(|| format!("cannot open private key file {}", key_path.display()))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .context("cannot parse private key file")?
        .context("no private key found in key file")?;

    let provider = rustls::crypto::ring::default_provider();
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .context("TLS protocol configuration failed")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("invalid certificate chain or private key")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_fail() {
        let result = load_acceptor(
            Path::new("/nonexistent/server.crt"),
            Path::new("/nonexistent/server.key"),
        );
        assert!(result.is_err());
    }
}
