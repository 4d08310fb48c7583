use crate::error::{AttemptError, ErrorKind};
use crate::method::CheckMethod;
use crate::model::{CipherInfo, ConnectOptions};
use crate::util::alpn_wire_format;
use async_trait::async_trait;
use futures::FutureExt;
use openssl::ssl::{SslConnector, SslMethod, SslOptions, SslRef, SslVerifyMode, SslVersion};
use std::pin::Pin;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;
use tracing::trace;

pub struct HandshakeRequest {
    pub method: Option<CheckMethod>,
    pub options: ConnectOptions,
}

/// What the live connection reported after a completed handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub version: String,
    pub cipher: CipherInfo,
}

/// The connection primitive: one TLS client handshake per call.
#[async_trait]
pub trait Handshaker: Send + Sync {
    async fn handshake(&self, request: &HandshakeRequest) -> Result<Negotiated, AttemptError>;
}

#[derive(Debug, Clone)]
pub struct OpensslHandshaker {
    connect_timeout: Duration,
}

impl OpensslHandshaker {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Handshaker for OpensslHandshaker {
    async fn handshake(&self, request: &HandshakeRequest) -> Result<Negotiated, AttemptError> {
        let options = &request.options;
        let connector = build_connector(request.method, &options.alpn_protocols)
            .map_err(|err| AttemptError::context(err.to_string()))?;
        let ssl = connector
            .configure()
            .and_then(|cfg| cfg.verify_hostname(false).into_ssl(&options.servername))
            .map_err(|err| AttemptError::context(format!("failed to configure TLS SNI: {err}")))?;

        let stream = match timeout(
            self.connect_timeout,
            TcpStream::connect((options.host.as_str(), options.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(AttemptError::connect(err.to_string())),
            Err(_) => return Err(AttemptError::new(ErrorKind::Timeout, "connect timeout")),
        };

        let mut tls_stream = SslStream::new(ssl, stream).map_err(|err| {
            AttemptError::handshake(format!("failed to initialize TLS stream: {err}"))
        })?;
        Pin::new(&mut tls_stream)
            .connect()
            .await
            .map_err(|err| AttemptError::handshake(err.to_string()))?;

        let negotiated = negotiated_info(tls_stream.ssl());
        if let Err(err) = tls_stream.shutdown().await {
            trace!(error = %err, "TLS shutdown failed");
        }
        Ok(negotiated)
    }
}

fn pinned_version(method: CheckMethod) -> Option<SslVersion> {
    match method {
        CheckMethod::Negotiate => None,
        CheckMethod::Tls13 => Some(SslVersion::TLS1_3),
        CheckMethod::Tls12 => Some(SslVersion::TLS1_2),
        CheckMethod::Tls11 => Some(SslVersion::TLS1_1),
        CheckMethod::Tls10 => Some(SslVersion::TLS1),
        CheckMethod::Ssl3 => Some(SslVersion::SSL3),
    }
}

/// Builds the secure context for one method. Fails when the local OpenSSL
/// cannot represent the method at all, or has it compiled out or disabled.
pub fn build_connector(
    method: Option<CheckMethod>,
    alpn_protocols: &[String],
) -> anyhow::Result<SslConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())
        .map_err(|err| anyhow::anyhow!("failed to create TLS connector: {err}"))?;
    // Only the negotiated parameters matter, so accept any certificate.
    builder.set_verify(SslVerifyMode::NONE);

    let forced = method.filter(|m| m.is_forced());
    if let Some(method) = forced {
        if let Some(version) = pinned_version(method) {
            builder.set_min_proto_version(Some(version)).map_err(|err| {
                anyhow::anyhow!("{} is not supported by this OpenSSL: {err}", method)
            })?;
            builder.set_max_proto_version(Some(version)).map_err(|err| {
                anyhow::anyhow!("{} is not supported by this OpenSSL: {err}", method)
            })?;
        }
        if method == CheckMethod::Ssl3 {
            // SslConnector::builder turns SSLv3 off unconditionally.
            builder.clear_options(SslOptions::NO_SSLV3);
        }
        if matches!(
            method,
            CheckMethod::Tls11 | CheckMethod::Tls10 | CheckMethod::Ssl3
        ) {
            // Default security levels refuse pre-1.2 handshakes client side.
            builder
                .set_cipher_list("DEFAULT:@SECLEVEL=0")
                .map_err(|err| anyhow::anyhow!("failed to enable legacy ciphers: {err}"))?;
        }
    }

    if !alpn_protocols.is_empty() {
        let wire = alpn_wire_format(alpn_protocols)?;
        builder
            .set_alpn_protos(&wire)
            .map_err(|err| anyhow::anyhow!("failed to set ALPN protocols: {err}"))?;
    }

    let connector = builder.build();
    if let Some(method) = forced {
        ensure_handshake_starts(&connector)
            .map_err(|err| anyhow::anyhow!("{} is unavailable in this OpenSSL: {err}", method))?;
    }
    Ok(connector)
}

/// Starts a handshake against an in-memory peer that never answers.
///
/// OpenSSL only notices that no enabled protocol is left (SSLv3 compiled
/// out, a version barred by configuration) once it tries to write the
/// ClientHello. Doing that here keeps the failure off the network path.
pub fn ensure_handshake_starts(connector: &SslConnector) -> anyhow::Result<()> {
    let ssl = connector
        .configure()
        .and_then(|cfg| cfg.verify_hostname(false).into_ssl("localhost"))
        .map_err(|err| anyhow::anyhow!("failed to configure TLS session: {err}"))?;
    // The peer half has to outlive the poll or the write fails with EPIPE.
    let (local, _peer) = tokio::io::duplex(64 * 1024);
    let mut stream = SslStream::new(ssl, local)
        .map_err(|err| anyhow::anyhow!("failed to initialize TLS stream: {err}"))?;

    match Pin::new(&mut stream).connect().now_or_never() {
        Some(Err(err)) => Err(anyhow::anyhow!("{err}")),
        // Pending on the peer's reply: the ClientHello went out.
        Some(Ok(())) | None => Ok(()),
    }
}

fn negotiated_info(ssl: &SslRef) -> Negotiated {
    let cipher = ssl
        .current_cipher()
        .map(|cipher| CipherInfo {
            name: cipher.name().to_string(),
            standard_name: cipher.standard_name().map(str::to_string),
            version: cipher.version().to_string(),
            bits: cipher.bits().secret,
        })
        .unwrap_or_else(|| CipherInfo {
            name: String::new(),
            standard_name: None,
            version: String::new(),
            bits: 0,
        });

    Negotiated {
        version: ssl.version_str().to_string(),
        cipher,
    }
}
