//! TLS material for the QUIC transport.
//!
//! - Server: certificate/key loaded from PEM files, or an ephemeral
//!   self-signed certificate generated in memory.
//! - Client: skips certificate verification; the listener is expected to
//!   present a self-signed certificate.
//!
//! Both sides speak TLS 1.3 only and advertise the `qcat` ALPN.

use std::sync::Arc;

use qcat_config::TlsConfig;
use qcat_core::defaults::{QUIC_ALPN, SELF_SIGNED_SUBJECT};
use rcgen::{CertificateParams, KeyPair, PKCS_ECDSA_P256_SHA256};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use crate::error::TransportError;

type CertChain = (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>);

/// Server-side rustls config for the QUIC listener.
pub fn server_crypto(tls: Option<&TlsConfig>) -> Result<rustls::ServerConfig, TransportError> {
    let (certs, key) = match tls {
        Some(cfg) => load_cert_files(&cfg.cert, &cfg.key)?,
        None => generate_self_signed()?,
    };

    let mut config = rustls::ServerConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![QUIC_ALPN.to_vec()];
    Ok(config)
}

/// Client-side rustls config that accepts any server certificate.
pub fn insecure_client_crypto() -> Result<rustls::ClientConfig, TransportError> {
    let mut config = rustls::ClientConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![QUIC_ALPN.to_vec()];
    Ok(config)
}

/// The process-wide provider when one is installed, aws-lc-rs otherwise.
fn provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// Generate a self-signed certificate for `localhost` using rcgen.
pub fn generate_self_signed() -> Result<CertChain, TransportError> {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
        .map_err(|e| TransportError::CertGeneration(e.to_string()))?;

    let params = CertificateParams::new(vec![SELF_SIGNED_SUBJECT.to_string()])
        .map_err(|e| TransportError::CertGeneration(e.to_string()))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| TransportError::CertGeneration(e.to_string()))?;

    let cert_der = CertificateDer::from(cert.der().to_vec());
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    Ok((vec![cert_der], key_der))
}

/// Load certificate chain and private key from PEM files.
pub fn load_cert_files(cert_path: &str, key_path: &str) -> Result<CertChain, TransportError> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(cert_path)?);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .filter_map(|c| c.ok().map(|v| v.into_owned()))
        .collect();

    if certs.is_empty() {
        return Err(TransportError::Config(format!(
            "no certificates found in {cert_path}"
        )));
    }

    let mut reader = std::io::BufReader::new(std::fs::File::open(key_path)?);
    let key = loop {
        match rustls_pemfile::read_one(&mut reader)? {
            Some(rustls_pemfile::Item::Pkcs8Key(key)) => break PrivateKeyDer::Pkcs8(key),
            Some(rustls_pemfile::Item::Pkcs1Key(key)) => break PrivateKeyDer::Pkcs1(key),
            Some(rustls_pemfile::Item::Sec1Key(key)) => break PrivateKeyDer::Sec1(key),
            Some(_) => continue,
            None => {
                return Err(TransportError::Config(format!(
                    "no private key found in {key_path}"
                )));
            }
        }
    };

    Ok((certs, key))
}

/// Accepts any server certificate.
#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn self_signed_server_config_advertises_alpn() {
        let config = server_crypto(None).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"qcat".to_vec()]);
    }

    #[test]
    fn client_config_advertises_alpn() {
        let config = insecure_client_crypto().unwrap();
        assert_eq!(config.alpn_protocols, vec![b"qcat".to_vec()]);
    }

    #[test]
    fn loads_pem_files() {
        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
        let cert = CertificateParams::new(vec!["localhost".into()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();

        let mut cert_file = tempfile::NamedTempFile::new().unwrap();
        cert_file.write_all(cert.pem().as_bytes()).unwrap();
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        key_file
            .write_all(key_pair.serialize_pem().as_bytes())
            .unwrap();

        let tls = TlsConfig {
            cert: cert_file.path().to_string_lossy().into_owned(),
            key: key_file.path().to_string_lossy().into_owned(),
        };
        let (certs, _key) = load_cert_files(&tls.cert, &tls.key).unwrap();
        assert_eq!(certs.len(), 1);
        server_crypto(Some(&tls)).unwrap();
    }

    #[test]
    fn empty_pem_is_rejected() {
        let empty = tempfile::NamedTempFile::new().unwrap();
        let path = empty.path().to_string_lossy().into_owned();
        assert!(matches!(
            load_cert_files(&path, &path),
            Err(TransportError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_cert_files("/nonexistent/cert.pem", "/nonexistent/key.pem"),
            Err(TransportError::Io(_))
        ));
    }
}
