//! TLS certificate material for the relay endpoint
//!
//! The relay core never inspects certificate contents; this module only
//! produces the rustls configuration that secures the listening endpoint.
//! Identity comes either from PEM files on disk or from a self-signed
//! certificate generated at startup (ECDSA P-256, one year of validity,
//! issued for `localhost`).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

/// ALPN protocol identifier spoken by relay servers and clients.
pub const ALPN_RELAY: &[u8] = b"relay";

const SELF_SIGNED_HOST: &str = "localhost";
const SELF_SIGNED_VALIDITY_DAYS: i64 = 365;

/// Where the server's certificate and key come from.
#[derive(Debug, Clone)]
pub enum CertSource {
    /// Generate an in-memory self-signed certificate at startup.
    SelfSigned,
    /// Load a PEM certificate chain and PEM private key from disk.
    Files { cert: PathBuf, key: PathBuf },
}

impl Default for CertSource {
    fn default() -> Self {
        CertSource::SelfSigned
    }
}

/// Error type for certificate loading and generation.
#[derive(Debug)]
pub enum TlsError {
    /// Certificate generation failed.
    Certificate(rcgen::Error),
    /// rustls rejected the certificate/key material.
    Crypto(rustls::Error),
    /// The configured crypto provider cannot secure the QUIC handshake.
    Provider(String),
    /// No private key found in the key file.
    MissingPrivateKey(PathBuf),
    /// Reading certificate material from disk failed.
    Io(std::io::Error),
}

impl std::fmt::Display for TlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsError::Certificate(e) => write!(f, "certificate generation failed: {}", e),
            TlsError::Crypto(e) => write!(f, "invalid certificate material: {}", e),
            TlsError::Provider(e) => write!(f, "crypto provider unusable for quic: {}", e),
            TlsError::MissingPrivateKey(path) => {
                write!(f, "no private key found in {}", path.display())
            }
            TlsError::Io(e) => write!(f, "failed to read certificate material: {}", e),
        }
    }
}

impl std::error::Error for TlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TlsError::Certificate(e) => Some(e),
            TlsError::Crypto(e) => Some(e),
            TlsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rcgen::Error> for TlsError {
    fn from(e: rcgen::Error) -> Self {
        TlsError::Certificate(e)
    }
}

impl From<rustls::Error> for TlsError {
    fn from(e: rustls::Error) -> Self {
        TlsError::Crypto(e)
    }
}

impl From<std::io::Error> for TlsError {
    fn from(e: std::io::Error) -> Self {
        TlsError::Io(e)
    }
}

/// Build the rustls server configuration for the listening endpoint.
pub fn server_crypto(source: &CertSource) -> Result<rustls::ServerConfig, TlsError> {
    // Idempotent; a no-op when the application already picked a provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let (certs, key) = match source {
        CertSource::SelfSigned => self_signed_identity()?,
        CertSource::Files { cert, key } => (load_certs(cert)?, load_private_key(key)?),
    };

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![ALPN_RELAY.to_vec()];
    Ok(config)
}

/// Build the rustls client configuration, trusting the given PEM
/// certificate (for self-signed deployments, the relay's own certificate).
pub fn client_crypto(root_cert: &Path) -> Result<rustls::ClientConfig, TlsError> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut roots = rustls::RootCertStore::empty();
    for cert in load_certs(root_cert)? {
        roots.add(cert)?;
    }

    let mut config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![ALPN_RELAY.to_vec()];
    Ok(config)
}

/// Generate a self-signed certificate and write it to disk as PEM, for
/// deployments that want a persistent identity clients can pin.
pub fn write_self_signed(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    let (cert, key_pair) = generate_self_signed()?;
    std::fs::write(cert_path, cert.pem())?;
    std::fs::write(key_path, key_pair.serialize_pem())?;
    Ok(())
}

fn self_signed_identity(
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsError> {
    let (cert, key_pair) = generate_self_signed()?;
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    Ok((vec![cert.der().clone()], key))
}

fn generate_self_signed() -> Result<(rcgen::Certificate, rcgen::KeyPair), TlsError> {
    let mut params = rcgen::CertificateParams::new(vec![SELF_SIGNED_HOST.to_string()])?;
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, SELF_SIGNED_HOST);
    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(SELF_SIGNED_VALIDITY_DAYS);

    // Default key algorithm is ECDSA P-256.
    let key_pair = rcgen::KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;
    Ok((cert, key_pair))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| TlsError::MissingPrivateKey(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_signed_identity() {
        let (certs, _key) = self_signed_identity().unwrap();
        assert_eq!(certs.len(), 1);
        assert!(!certs[0].as_ref().is_empty());
    }

    #[test]
    fn test_server_crypto_sets_alpn() {
        let config = server_crypto(&CertSource::SelfSigned).unwrap();
        assert_eq!(config.alpn_protocols, vec![ALPN_RELAY.to_vec()]);
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let dir = std::env::temp_dir();
        let cert_path = dir.join(format!("relay-rs-test-{}-cert.pem", std::process::id()));
        let key_path = dir.join(format!("relay-rs-test-{}-key.pem", std::process::id()));

        write_self_signed(&cert_path, &key_path).unwrap();

        let certs = load_certs(&cert_path).unwrap();
        assert_eq!(certs.len(), 1);
        let key = load_private_key(&key_path).unwrap();
        assert!(matches!(key, PrivateKeyDer::Pkcs8(_)));

        // A client can trust the written certificate directly.
        let client = client_crypto(&cert_path).unwrap();
        assert_eq!(client.alpn_protocols, vec![ALPN_RELAY.to_vec()]);

        let _ = std::fs::remove_file(&cert_path);
        let _ = std::fs::remove_file(&key_path);
    }

    #[test]
    fn test_missing_key_file_is_io_error() {
        let result = load_private_key(Path::new("/nonexistent/relay-key.pem"));
        assert!(matches!(result, Err(TlsError::Io(_))));
    }
}
