use crate::error::AttemptError;
use crate::method::CheckMethod;
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_ALPN: [&str; 3] = ["http/3", "http/2", "http/1.1"];

/// Constructor input for a `Prober`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckerOptions {
    pub host: Option<String>,
    pub servername: Option<String>,
    pub port: Option<u16>,
    pub protocols: Option<Vec<String>>,
}

impl CheckerOptions {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn servername(mut self, servername: impl Into<String>) -> Self {
        self.servername = Some(servername.into());
        self
    }

    pub fn protocols<S: AsRef<str>>(mut self, protocols: &[S]) -> Self {
        self.protocols = Some(protocols.iter().map(|p| p.as_ref().to_string()).collect());
        self
    }
}

/// Connection target, fixed once the prober is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: Option<String>,
    pub servername: Option<String>,
    pub port: u16,
    pub alpn_protocols: Vec<String>,
}

impl From<CheckerOptions> for Target {
    fn from(opts: CheckerOptions) -> Self {
        let host = opts.host.filter(|h| !h.is_empty());
        let servername = opts
            .servername
            .filter(|s| !s.is_empty())
            .or_else(|| host.clone());
        Target {
            host,
            servername,
            port: opts.port.unwrap_or(DEFAULT_PORT),
            alpn_protocols: opts
                .protocols
                .unwrap_or_else(|| DEFAULT_ALPN.iter().map(|p| p.to_string()).collect()),
        }
    }
}

/// Options actually used for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    pub host: String,
    pub servername: String,
    pub port: u16,
    #[serde(rename = "ALPNProtocols")]
    pub alpn_protocols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
}

impl ConnectOptions {
    /// Resolves the per-method context override on top of the target fields.
    pub fn for_method(host: &str, target: &Target, method: Option<CheckMethod>) -> Self {
        let mut options = ConnectOptions {
            host: host.to_string(),
            servername: target
                .servername
                .clone()
                .unwrap_or_else(|| host.to_string()),
            port: target.port,
            alpn_protocols: target.alpn_protocols.clone(),
            secure_protocol: None,
            min_version: None,
            max_version: None,
        };

        match method {
            None => {}
            Some(CheckMethod::Tls13) => {
                options.min_version = Some(CheckMethod::Tls13.version_label().into());
                options.max_version = Some(CheckMethod::Tls13.version_label().into());
            }
            Some(other) => options.secure_protocol = Some(other.openssl_name().into()),
        }

        options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherInfo {
    pub name: String,
    /// IANA/RFC name of the suite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_name: Option<String>,
    /// Protocol version that introduced the cipher, as OpenSSL names it.
    pub version: String,
    pub bits: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptData {
    Cipher(CipherInfo),
    Error(AttemptError),
}

/// Outcome of one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub checked_method: Option<CheckMethod>,
    /// Epoch milliseconds at attempt start.
    pub time: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AttemptData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ConnectOptions>,
}

impl AttemptResult {
    pub fn error(&self) -> Option<&AttemptError> {
        match &self.data {
            Some(AttemptData::Error(err)) => Some(err),
            _ => None,
        }
    }

    pub fn cipher(&self) -> Option<&CipherInfo> {
        match &self.data {
            Some(AttemptData::Cipher(cipher)) => Some(cipher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub options: CheckerOptions,
    pub policy: Policy,
    pub connect_timeout: Duration,
    pub attempt_timeout: Duration,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Jsonl,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}
