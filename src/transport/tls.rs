use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig as RustlsClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::error::{Error, ErrorKind};

/// TLS client configuration. Defaults to verifying the peer, per spec §9
/// Open Question 1 — the original C++ source disabled verification
/// everywhere; this rewrite flips the default and exposes the insecure mode
/// as an explicit opt-out instead.
#[derive(Clone)]
pub struct TlsConfig {
    connector: TlsConnector,
}

impl TlsConfig {
    /// Verifies the peer certificate chain against the Mozilla root store
    /// (via `webpki-roots`).
    pub fn verify_peer() -> Self {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = RustlsClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsConfig {
            connector: TlsConnector::from(Arc::new(config)),
        }
    }

    /// Disables peer verification entirely. Unsafe outside a closed test
    /// harness (spec §9 Open Question 1) — preserved because the original
    /// source relied on it, not recommended for production use.
    pub fn verify_none() -> Self {
        let mut config = RustlsClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth();
        config.enable_sni = true;
        TlsConfig {
            connector: TlsConnector::from(Arc::new(config)),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig::verify_peer()
    }
}

#[derive(Debug)]
struct NoVerifier;

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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
        ]
    }
}

pub struct TlsTransport {
    config: TlsConfig,
    stream: Option<TlsStream<TcpStream>>,
}

impl TlsTransport {
    pub fn new(config: TlsConfig) -> Self {
        TlsTransport {
            config,
            stream: None,
        }
    }

    pub(super) async fn handshake(&mut self, tcp: TcpStream, host: &str) -> Result<(), Error> {
        let _ = tcp.set_nodelay(true);
        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|e| Error::new(ErrorKind::Handshake, e.to_string()))?;
        let stream = self
            .config
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::new(ErrorKind::Handshake, e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    pub(super) fn stream(&mut self) -> Result<&mut TlsStream<TcpStream>, Error> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::Write, "transport not connected"))
    }

    /// Same liveness check as [`super::tcp::TcpTransport::idle_peer_closed`],
    /// performed on the raw TCP socket underneath the TLS session — safe
    /// because this transport is torn down as soon as staleness is
    /// detected, so bypassing the TLS record layer for that one read
    /// doesn't need to interoperate with further reads through it. Never
    /// blocks — safe to call from `Pool::acquire`.
    pub(super) fn idle_peer_closed(&self) -> std::io::Result<bool> {
        let Some(stream) = &self.stream else {
            return Ok(false);
        };
        let tcp = stream.get_ref().0;
        let mut buf = [0u8; 1];
        match tcp.try_read(&mut buf) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Graceful close bounded by [`super::CONNECT_TIMEOUT`]; end-of-stream
    /// while closing counts as success (spec §4.1).
    pub(super) async fn shutdown(&mut self) {
        use tokio::io::AsyncWriteExt;

        if let Some(mut s) = self.stream.take() {
            match tokio::time::timeout(super::CONNECT_TIMEOUT, s.shutdown()).await {
                Ok(Ok(())) | Err(_) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {}
                Ok(Err(e)) => log::warn!("TLS graceful close failed (forcing socket close): {e}"),
            }
        }
    }
}
