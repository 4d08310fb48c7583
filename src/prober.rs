use crate::connector::{HandshakeRequest, Handshaker, OpensslHandshaker};
use crate::error::{AttemptError, CheckError, ErrorKind};
use crate::method::CheckMethod;
use crate::model::{AttemptData, AttemptResult, CheckerOptions, Config, ConnectOptions, Target};
use crate::policy::Policy;
use crate::report::CheckReport;
use crate::util::now_epoch_millis;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(10000);

/// Probes one target with every candidate method in its policy.
#[derive(Clone)]
pub struct Prober {
    target: Arc<Target>,
    policy: Arc<Policy>,
    handshaker: Arc<dyn Handshaker>,
    attempt_timeout: Duration,
}

impl Prober {
    pub fn new(options: CheckerOptions, policy: Policy) -> Self {
        Self::with_handshaker(
            options,
            policy,
            Arc::new(OpensslHandshaker::new(DEFAULT_CONNECT_TIMEOUT)),
        )
    }

    pub fn with_handshaker(
        options: CheckerOptions,
        policy: Policy,
        handshaker: Arc<dyn Handshaker>,
    ) -> Self {
        Self {
            target: Arc::new(Target::from(options)),
            policy: Arc::new(policy),
            handshaker,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::with_handshaker(
            cfg.options.clone(),
            cfg.policy.clone(),
            Arc::new(OpensslHandshaker::new(cfg.connect_timeout)),
        )
        .attempt_timeout(cfg.attempt_timeout)
    }

    /// Deadline for one whole attempt, connect and handshake included.
    pub fn attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Runs one handshake. Always settles; failures are carried in the result.
    pub async fn connect(&self, method: Option<CheckMethod>) -> AttemptResult {
        let time = now_epoch_millis();
        let host = self.target.host.clone().unwrap_or_default();
        let options = ConnectOptions::for_method(&host, &self.target, method);
        let request = HandshakeRequest {
            method,
            options: options.clone(),
        };

        let outcome = match timeout(self.attempt_timeout, self.handshaker.handshake(&request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(AttemptError::new(
                ErrorKind::Timeout,
                format!("attempt exceeded {} ms", self.attempt_timeout.as_millis()),
            )),
        };

        match outcome {
            Ok(negotiated) => {
                debug!(
                    method = ?method,
                    version = %negotiated.version,
                    cipher = %negotiated.cipher.name,
                    "handshake succeeded"
                );
                AttemptResult {
                    checked_method: method,
                    time,
                    success: true,
                    version: Some(negotiated.version),
                    data: Some(AttemptData::Cipher(negotiated.cipher)),
                    options: Some(options),
                }
            }
            Err(err) => {
                debug!(method = ?method, error = %err, "handshake failed");
                failed_attempt(method, time, err, options)
            }
        }
    }

    /// Tries every candidate method concurrently and reduces the outcomes.
    #[instrument(skip(self), fields(host = ?self.target.host, port = self.target.port))]
    pub async fn check(&self) -> Result<CheckReport, CheckError> {
        if self.target.host.is_none() {
            return Err(CheckError::MissingHost);
        }
        if self.target.port == 0 {
            return Err(CheckError::MissingPort);
        }

        let methods = self.policy.methods().to_vec();
        let handles = methods.iter().map(|&method| {
            let prober = self.clone();
            tokio::spawn(async move { prober.connect(Some(method)).await })
        });
        let joined = join_all(handles).await;

        let results = joined
            .into_iter()
            .zip(methods)
            .map(|(joined, method)| match joined {
                Ok(result) => result,
                Err(err) => {
                    let host = self.target.host.clone().unwrap_or_default();
                    failed_attempt(
                        Some(method),
                        now_epoch_millis(),
                        AttemptError::new(ErrorKind::Join, err.to_string()),
                        ConnectOptions::for_method(&host, &self.target, Some(method)),
                    )
                }
            })
            .collect();

        let report = CheckReport::from_results(results, &self.policy);
        debug!(
            supported = ?report.supported,
            unsupported = ?report.unsupported,
            is_good = report.is_good,
            "check finished"
        );
        Ok(report)
    }
}

/// A context failure never reached the wire, so it carries no version and
/// its options fall back to the method-less set.
fn failed_attempt(
    method: Option<CheckMethod>,
    time: i64,
    err: AttemptError,
    options: ConnectOptions,
) -> AttemptResult {
    let (version, options) = if err.is_pre_connect() {
        let plain = ConnectOptions {
            secure_protocol: None,
            min_version: None,
            max_version: None,
            ..options
        };
        (None, plain)
    } else {
        (method.map(|m| m.version_label().to_string()), options)
    };

    AttemptResult {
        checked_method: method,
        time,
        success: false,
        version,
        data: Some(AttemptData::Error(err)),
        options: Some(options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Negotiated;
    use crate::model::CipherInfo;
    use async_trait::async_trait;

    struct Fixed(Result<Negotiated, AttemptError>);

    #[async_trait]
    impl Handshaker for Fixed {
        async fn handshake(
            &self,
            _request: &HandshakeRequest,
        ) -> Result<Negotiated, AttemptError> {
            self.0.clone()
        }
    }

    struct Hang;

    #[async_trait]
    impl Handshaker for Hang {
        async fn handshake(
            &self,
            _request: &HandshakeRequest,
        ) -> Result<Negotiated, AttemptError> {
            std::future::pending().await
        }
    }

    fn prober(handshaker: Arc<dyn Handshaker>) -> Prober {
        Prober::with_handshaker(
            CheckerOptions::new("example.com"),
            Policy::default(),
            handshaker,
        )
    }

    #[tokio::test]
    async fn success_reports_negotiated_version_not_requested() {
        let negotiated = Negotiated {
            version: "TLSv1.3".into(),
            cipher: CipherInfo {
                name: "TLS_AES_128_GCM_SHA256".into(),
                standard_name: Some("TLS_AES_128_GCM_SHA256".into()),
                version: "TLSv1.3".into(),
                bits: 128,
            },
        };
        let result = prober(Arc::new(Fixed(Ok(negotiated))))
            .connect(Some(CheckMethod::Negotiate))
            .await;
        assert!(result.success);
        assert_eq!(result.version.as_deref(), Some("TLSv1.3"));
        assert_eq!(result.cipher().map(|c| c.bits), Some(128));
        let options = result.options.unwrap();
        assert_eq!(options.secure_protocol.as_deref(), Some("TLS_method"));
        assert_eq!(options.servername, "example.com");
    }

    #[tokio::test]
    async fn handshake_failure_records_requested_label() {
        let result = prober(Arc::new(Fixed(Err(AttemptError::handshake("alert")))))
            .connect(Some(CheckMethod::Tls11))
            .await;
        assert!(!result.success);
        assert_eq!(result.version.as_deref(), Some("TLSv1.1"));
        assert_eq!(result.error().map(|e| e.kind), Some(ErrorKind::Handshake));
    }

    #[tokio::test]
    async fn context_failure_has_no_version() {
        let result = prober(Arc::new(Fixed(Err(AttemptError::context("disabled")))))
            .connect(Some(CheckMethod::Ssl3))
            .await;
        assert!(!result.success);
        assert!(result.version.is_none());
        assert!(result.options.unwrap().secure_protocol.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempt_hits_deadline() {
        let result = prober(Arc::new(Hang))
            .attempt_timeout(Duration::from_millis(50))
            .connect(Some(CheckMethod::Tls12))
            .await;
        assert!(!result.success);
        assert_eq!(result.version.as_deref(), Some("TLSv1.2"));
        assert_eq!(result.error().map(|e| e.kind), Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn zero_port_is_rejected() {
        let prober = Prober::with_handshaker(
            CheckerOptions::new("example.com").port(0),
            Policy::default(),
            Arc::new(Hang),
        );
        assert_eq!(prober.check().await.unwrap_err(), CheckError::MissingPort);
    }
}
