//! TLS certificate inspection.
//!
//! Primary path: a verified TLS handshake against port 443 using the webpki
//! root store, reading the peer certificate off the live connection.
//! Fallback path: the same handshake with certificate verification disabled,
//! for hosts whose chains do not verify. The first successful path wins; a
//! fallback failure never overwrites an error recorded by the primary
//! attempt.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::config::{TCP_CONNECT_TIMEOUT_SECS, TLS_HANDSHAKE_TIMEOUT_SECS};

/// Subject and issuer fields read from a host's TLS certificate.
#[derive(Debug, Default, Clone)]
pub struct CertificateSignals {
    /// Subject organization (O).
    pub organization: Option<String>,
    /// Subject country (C).
    pub country: Option<String>,
    /// Subject state or province (ST).
    pub state: Option<String>,
    /// Subject locality (L).
    pub locality: Option<String>,
    /// Subject common name (CN).
    pub common_name: Option<String>,
    /// Issuer organization (O).
    pub issuer: Option<String>,
    /// Issuer country (C).
    pub issuer_country: Option<String>,
    /// Issuer common name (CN).
    pub issuer_common_name: Option<String>,
    /// Error from the first failing path, if any path failed.
    pub error: Option<String>,
}

/// Collects certificate signals for `domain`. Never fails: on total failure
/// the returned structure is empty except for `error`.
pub async fn collect_certificate_signals(domain: &str) -> CertificateSignals {
    let mut signals = CertificateSignals::default();

    match peer_certificate(domain, true).await {
        Ok(der) => {
            if extract_fields(&mut signals, &der) {
                log::info!("certificate fields extracted for {domain} (verified)");
                return signals;
            }
        }
        Err(e) => {
            log::warn!("verified TLS probe failed for {domain}: {e:#}");
            signals.error = Some(format!("{e:#}"));
        }
    }

    // Fallback: decode the certificate from an unverified connection.
    match peer_certificate(domain, false).await {
        Ok(der) => {
            if extract_fields(&mut signals, &der) {
                log::info!("certificate fields extracted for {domain} (unverified fallback)");
            }
        }
        Err(e) => {
            log::error!("unverified TLS fallback failed for {domain}: {e:#}");
            if signals.error.is_none() {
                signals.error = Some(format!("{e:#}"));
            }
        }
    }

    signals
}

/// Connects to `domain:443` and returns the peer's leaf certificate in DER
/// form. Both the TCP connect and the handshake carry explicit timeouts.
async fn peer_certificate(domain: &str, verify: bool) -> Result<Vec<u8>> {
    let config = if verify {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    } else {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::NoVerification::new()))
            .with_no_client_auth()
    };

    let server_name =
        ServerName::try_from(domain.to_string()).context("invalid server name")?;

    let sock = tokio::time::timeout(
        Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
        TcpStream::connect((domain, 443)),
    )
    .await
    .with_context(|| format!("TCP connection timeout for {domain}:443"))?
    .with_context(|| format!("failed to connect to {domain}:443"))?;

    let connector = TlsConnector::from(Arc::new(config));
    let tls_stream = tokio::time::timeout(
        Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
        connector.connect(server_name, sock),
    )
    .await
    .with_context(|| format!("TLS handshake timeout for {domain}"))?
    .with_context(|| format!("TLS handshake failed for {domain}"))?;

    let (_, connection) = tls_stream.get_ref();
    let certs = connection
        .peer_certificates()
        .context("no peer certificates presented")?;
    let leaf = certs.first().context("empty certificate chain")?;
    Ok(leaf.as_ref().to_vec())
}

/// Parses the DER certificate and fills the subject/issuer fields. Returns
/// `false` (recording an error if none is set) when parsing fails.
fn extract_fields(signals: &mut CertificateSignals, der: &[u8]) -> bool {
    match x509_parser::parse_x509_certificate(der) {
        Ok((_, cert)) => {
            let subject = cert.subject();
            signals.organization = first_attribute(subject.iter_organization());
            signals.country = first_attribute(subject.iter_country());
            signals.state = first_attribute(subject.iter_state_or_province());
            signals.locality = first_attribute(subject.iter_locality());
            signals.common_name = first_attribute(subject.iter_common_name());

            let issuer = cert.issuer();
            signals.issuer = first_attribute(issuer.iter_organization());
            signals.issuer_country = first_attribute(issuer.iter_country());
            signals.issuer_common_name = first_attribute(issuer.iter_common_name());
            true
        }
        Err(e) => {
            log::warn!("failed to parse peer certificate: {e}");
            if signals.error.is_none() {
                signals.error = Some(format!("certificate parse failure: {e}"));
            }
            false
        }
    }
}

fn first_attribute<'a, I>(mut attributes: I) -> Option<String>
where
    I: Iterator<Item = &'a x509_parser::x509::AttributeTypeAndValue<'a>>,
{
    attributes
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}

mod danger {
    //! Certificate verifier that accepts any chain. Only used by the
    //! fallback path, which exists to read fields out of certificates that
    //! do not verify.

    use rustls::client::danger::{
        HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
    };
    use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, SignatureScheme};

    #[derive(Debug)]
    pub(super) struct NoVerification(CryptoProvider);

    impl NoVerification {
        pub(super) fn new() -> Self {
            Self(rustls::crypto::ring::default_provider())
        }
    }

    impl ServerCertVerifier for NoVerification {
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
                &self.0.signature_verification_algorithms,
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
                &self.0.signature_verification_algorithms,
            )
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fields_rejects_garbage() {
        let mut signals = CertificateSignals::default();
        assert!(!extract_fields(&mut signals, b"not a certificate"));
        assert!(signals.error.is_some());
        assert!(signals.organization.is_none());
    }

    #[test]
    fn test_extract_fields_keeps_existing_error() {
        // A fallback parse failure must not overwrite the primary error.
        let mut signals = CertificateSignals {
            error: Some("primary failure".to_string()),
            ..CertificateSignals::default()
        };
        assert!(!extract_fields(&mut signals, b"still not a certificate"));
        assert_eq!(signals.error.as_deref(), Some("primary failure"));
    }

    #[tokio::test]
    async fn test_peer_certificate_invalid_server_name() {
        crate::initialization::init_crypto_provider();
        let result = peer_certificate("not a hostname", true).await;
        assert!(result.is_err());
    }
}
