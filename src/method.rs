use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A negotiation mode forced for one probing attempt.
///
/// Each variant maps to exactly one version label, which is also the string
/// OpenSSL reports for a connection negotiated at that version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckMethod {
    #[serde(rename = "TLS_method")]
    Negotiate,
    #[serde(rename = "TLSv1_3_client_method")]
    Tls13,
    #[serde(rename = "TLSv1_2_client_method")]
    Tls12,
    #[serde(rename = "TLSv1_1_client_method")]
    Tls11,
    #[serde(rename = "TLSv1_client_method")]
    Tls10,
    #[serde(rename = "SSLv3_client_method")]
    Ssl3,
}

impl CheckMethod {
    pub const ALL: [CheckMethod; 6] = [
        CheckMethod::Negotiate,
        CheckMethod::Tls13,
        CheckMethod::Tls12,
        CheckMethod::Tls11,
        CheckMethod::Tls10,
        CheckMethod::Ssl3,
    ];

    /// Historical OpenSSL method name.
    pub fn openssl_name(self) -> &'static str {
        match self {
            CheckMethod::Negotiate => "TLS_method",
            CheckMethod::Tls13 => "TLSv1_3_client_method",
            CheckMethod::Tls12 => "TLSv1_2_client_method",
            CheckMethod::Tls11 => "TLSv1_1_client_method",
            CheckMethod::Tls10 => "TLSv1_client_method",
            CheckMethod::Ssl3 => "SSLv3_client_method",
        }
    }

    pub fn version_label(self) -> &'static str {
        match self {
            CheckMethod::Negotiate => "TLS",
            CheckMethod::Tls13 => "TLSv1.3",
            CheckMethod::Tls12 => "TLSv1.2",
            CheckMethod::Tls11 => "TLSv1.1",
            CheckMethod::Tls10 => "TLSv1",
            CheckMethod::Ssl3 => "SSLv3",
        }
    }

    /// Whether this method pins the handshake to a single protocol version.
    pub fn is_forced(self) -> bool {
        !matches!(self, CheckMethod::Negotiate)
    }
}

impl fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.openssl_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown TLS method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for CheckMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(method) = CheckMethod::ALL
            .into_iter()
            .find(|m| m.openssl_name() == trimmed)
        {
            return Ok(method);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "any" | "tls" | "negotiate" => Ok(CheckMethod::Negotiate),
            "tls1.3" | "tlsv1.3" | "tls13" => Ok(CheckMethod::Tls13),
            "tls1.2" | "tlsv1.2" | "tls12" => Ok(CheckMethod::Tls12),
            "tls1.1" | "tlsv1.1" | "tls11" => Ok(CheckMethod::Tls11),
            "tls1.0" | "tls1" | "tlsv1" | "tls10" => Ok(CheckMethod::Tls10),
            "ssl3" | "sslv3" => Ok(CheckMethod::Ssl3),
            _ => Err(UnknownMethod(trimmed.to_string())),
        }
    }
}
