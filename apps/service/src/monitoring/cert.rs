//! Reading the expiry date of a peer's TLS certificate.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, ring, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Port used for certificate checks
pub const TLS_PORT: u16 = 443;

const SECONDS_PER_DAY: i64 = 86_400;

/// Accepts any chain so expired or self-signed certificates can still be read.
///
/// Handshake signatures are still verified against the presented key.
#[derive(Debug)]
struct ExpiryOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for ExpiryOnlyVerifier {
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
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

fn client_config() -> Result<ClientConfig> {
    let provider = Arc::new(ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(ExpiryOnlyVerifier { provider }))
        .with_no_client_auth();
    Ok(config)
}

/// Whole days from `now` until `not_after` (Unix seconds), rounded down.
pub fn days_until(not_after: i64, now: DateTime<Utc>) -> i64 {
    (not_after - now.timestamp()).div_euclid(SECONDS_PER_DAY)
}

/// Handshake with `host:port` and return the leaf certificate's `notAfter`
/// as Unix seconds.
pub async fn fetch_not_after(host: &str, port: u16, timeout: Duration) -> Result<i64> {
    let connector = TlsConnector::from(Arc::new(client_config()?));
    let server_name = ServerName::try_from(host.to_string())
        .with_context(|| format!("Invalid TLS server name '{host}'"))?;

    let handshake = async {
        let stream = TcpStream::connect((host, port)).await.context("TCP connect failed")?;
        let tls = connector.connect(server_name, stream).await.context("TLS handshake failed")?;
        let (_, session) = tls.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| anyhow!("Peer presented no certificate"))?;
        let (_, certificate) = x509_parser::parse_x509_certificate(leaf.as_ref())
            .map_err(|e| anyhow!("Certificate parse failed: {e}"))?;
        Ok::<_, anyhow::Error>(certificate.validity().not_after.timestamp())
    };

    let not_after = tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| anyhow!("TLS handshake timed out after {}s", timeout.as_secs()))??;
    debug!(host, port, not_after, "Read peer certificate");
    Ok(not_after)
}

/// Days until the certificate served by `host` on port 443 expires.
pub async fn certificate_expiry_days(host: &str, timeout: Duration) -> Result<i64> {
    let not_after = fetch_not_after(host, TLS_PORT, timeout).await?;
    Ok(days_until(not_after, Utc::now()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_days_until_rounds_down() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let in_ten_days = now.timestamp() + 10 * SECONDS_PER_DAY + 3_600;
        assert_eq!(days_until(in_ten_days, now), 10);
    }

    #[test]
    fn test_days_until_negative_when_expired() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(days_until(now.timestamp() - 3_600, now), -1);
        assert_eq!(days_until(now.timestamp() - 2 * SECONDS_PER_DAY, now), -2);
    }

    #[tokio::test]
    async fn test_plain_tcp_peer_fails_handshake() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                use tokio::io::AsyncWriteExt;
                let _ = socket.write_all(b"not tls\r\n").await;
            }
        });

        let result = fetch_not_after("127.0.0.1", port, Duration::from_secs(2)).await;
        assert!(result.is_err());
    }
}
