//! Client identity loading from a password-protected PKCS#12 container.
//!
//! The publisher authenticates itself to the ingestion endpoint with
//! mutual TLS. The certificate chain and private key live together in a
//! single PKCS#12 (.pfx/.p12) file, protected by a passphrase supplied via
//! configuration. Loading happens exactly once at startup; the resulting
//! `ClientIdentity` is consumed by client construction and presented on
//! every TLS handshake for the rest of the process lifetime.
//!
//! Any failure here is fatal. A missing container, a corrupt container or
//! a wrong passphrase will not fix themselves by retrying, so the caller
//! is expected to log the error and exit non-zero.

use std::{fmt, fs, path::Path};

use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading the client identity container.
///
/// All variants are startup-fatal; none of them is retried.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The container file is missing or unreadable.
    #[error("Failed to read identity container {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a valid PKCS#12 structure.
    #[error("Identity container is not valid PKCS#12: {0}")]
    Malformed(String),

    /// The container MAC does not verify against the supplied passphrase.
    #[error("Passphrase rejected for identity container")]
    BadPassphrase,

    /// The container decrypted cleanly but holds no certificate.
    #[error("Identity container holds no certificate")]
    MissingCertificate,

    /// The container decrypted cleanly but holds no private key.
    #[error("Identity container holds no private key")]
    MissingKey,
}

/// A client certificate chain plus its private key, ready to present
/// during the TLS handshake.
///
/// Immutable after load. The key never leaves this struct except through
/// `into_parts`, which hands it to the TLS configuration builder.
pub struct ClientIdentity {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl ClientIdentity {
    /// Loads and decrypts an identity from a PKCS#12 container on disk.
    ///
    /// # Arguments
    /// - `path`: filesystem path of the container file
    /// - `passphrase`: the container passphrase from configuration
    ///
    /// # Errors
    ///
    /// Returns a `CredentialError` if the file cannot be read, is not
    /// PKCS#12, the passphrase is wrong, or the container is missing a
    /// certificate or key. No side effects beyond the file read.
    pub fn load(path: &Path, passphrase: &str) -> Result<Self, CredentialError> {
        let container = fs::read(path).map_err(|source| CredentialError::Read {
            path: path.display().to_string(),
            source,
        })?;
        debug!(
            "Read identity container {} ({} bytes)",
            path.display(),
            container.len()
        );
        Self::from_der(&container, passphrase)
    }

    /// Decrypts an identity from in-memory container bytes.
    ///
    /// Split out from `load` so callers holding the container some other
    /// way (and tests) don't need a file on disk.
    pub fn from_der(container: &[u8], passphrase: &str) -> Result<Self, CredentialError> {
        let pfx = p12::PFX::parse(container)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;

        // The MAC check is the passphrase check: a wrong passphrase fails
        // here, before any bag decryption is attempted.
        if !pfx.verify_mac(passphrase) {
            return Err(CredentialError::BadPassphrase);
        }

        let certs = pfx
            .cert_x509_bags(passphrase)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;
        if certs.is_empty() {
            return Err(CredentialError::MissingCertificate);
        }

        let mut keys = pfx
            .key_bags(passphrase)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;
        if keys.is_empty() {
            return Err(CredentialError::MissingKey);
        }
        // Key bags decrypt to PKCS#8 PrivateKeyInfo DER.
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(keys.remove(0)));

        Ok(Self {
            cert_chain: certs.into_iter().map(CertificateDer::from).collect(),
            key,
        })
    }

    /// The certificate chain, leaf first as stored in the container.
    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    /// Consumes the identity, yielding the pieces the TLS configuration
    /// builder wants.
    pub(crate) fn into_parts(self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.cert_chain, self.key)
    }
}

/// Keeps the private key out of debug output and logs.
impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("cert_chain", &self.cert_chain.len())
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write};

    use tempfile::TempDir;

    use super::*;

    /// Builds a throwaway PKCS#12 container around a freshly minted
    /// self-signed certificate.
    fn test_container(passphrase: &str) -> Vec<u8> {
        let minted = rcgen::generate_simple_self_signed(vec!["device.local".into()])
            .expect("Failed to mint test certificate");
        let cert_der = minted.cert.der().to_vec();
        let key_der = minted.key_pair.serialize_der();
        p12::PFX::new(&cert_der, &key_der, None, passphrase, "device")
            .expect("Failed to assemble test container")
            .to_der()
    }

    #[test]
    fn loads_identity_with_correct_passphrase() {
        let container = test_container("hunter2");
        let identity = ClientIdentity::from_der(&container, "hunter2").unwrap();
        assert_eq!(identity.cert_chain().len(), 1);
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let container = test_container("hunter2");
        let err = ClientIdentity::from_der(&container, "letmein").unwrap_err();
        assert!(matches!(err, CredentialError::BadPassphrase));
    }

    #[test]
    fn garbage_container_is_malformed() {
        let err = ClientIdentity::from_der(b"definitely not pkcs12", "x").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err =
            ClientIdentity::load(Path::new("/nonexistent/device.pfx"), "hunter2").unwrap_err();
        match err {
            CredentialError::Read { path, .. } => assert!(path.contains("device.pfx")),
            other => panic!("expected Read error, got {other:?}"),
        }
    }

    #[test]
    fn load_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.pfx");
        File::create(&path)
            .unwrap()
            .write_all(&test_container("hunter2"))
            .unwrap();

        let identity = ClientIdentity::load(&path, "hunter2").unwrap();
        assert_eq!(identity.cert_chain().len(), 1);
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let container = test_container("hunter2");
        let identity = ClientIdentity::from_der(&container, "hunter2").unwrap();
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
