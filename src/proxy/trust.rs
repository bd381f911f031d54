//! Upstream certificate trust policy.
//!
//! The policy is fixed at startup. `SkipVerification` accepts any server
//! certificate (self-signed, expired, wrong name) and exists for platforms
//! whose backends present internally issued certificates.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore};

/// Whether upstream certificate chains are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Validate against the platform's native root store.
    #[default]
    Verify,
    /// Accept any certificate the upstream presents.
    SkipVerification,
}

impl TrustPolicy {
    pub fn skips_validation(&self) -> bool {
        matches!(self, TrustPolicy::SkipVerification)
    }

    /// Build the rustls client configuration for this policy.
    pub fn client_config(&self) -> Result<ClientConfig, rustls::Error> {
        let provider = crypto_provider();
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?;

        let config = match self {
            TrustPolicy::Verify => builder
                .with_root_certificates(native_roots())
                .with_no_client_auth(),
            TrustPolicy::SkipVerification => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier::new(provider)))
                .with_no_client_auth(),
        };
        Ok(config)
    }
}

/// The crypto provider used for both the listener and upstream connections.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn native_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let loaded = rustls_native_certs::load_native_certs();
    for error in &loaded.errors {
        tracing::warn!(error = %error, "Failed to load a native root certificate");
    }
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    if added == 0 {
        tracing::warn!("No native root certificates found, every upstream TLS handshake will fail");
    }
    tracing::debug!(added, ignored, "Native root certificates loaded");
    roots
}

/// Certificate verifier that accepts every server certificate.
///
/// Handshake signatures are still checked so the peer must hold the key for
/// the certificate it presents.
#[derive(Debug)]
pub struct NoVerifier {
    provider: Arc<CryptoProvider>,
}

impl NoVerifier {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_validates() {
        assert_eq!(TrustPolicy::default(), TrustPolicy::Verify);
        assert!(!TrustPolicy::Verify.skips_validation());
        assert!(TrustPolicy::SkipVerification.skips_validation());
    }

    #[test]
    fn no_verifier_supported_schemes() {
        let verifier = NoVerifier::new(crypto_provider());
        let schemes = verifier.supported_verify_schemes();
        assert!(schemes.contains(&rustls::SignatureScheme::RSA_PKCS1_SHA256));
        assert!(schemes.contains(&rustls::SignatureScheme::ECDSA_NISTP256_SHA256));
        assert!(schemes.contains(&rustls::SignatureScheme::ED25519));
    }

    #[test]
    fn builds_client_config_for_both_policies() {
        assert!(TrustPolicy::Verify.client_config().is_ok());
        assert!(TrustPolicy::SkipVerification.client_config().is_ok());
    }
}
