use crate::method::CheckMethod;
use crate::model::{CheckerOptions, Config, OutputConfig, OutputFormat};
use crate::policy::Policy;
use crate::prober::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
use clap::{ArgAction, Parser};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(author, version, about = "Probe which TLS versions a server accepts", long_about = None)]
pub struct Cli {
    /// Target settings as key=value pairs (host, port, servername, protocols)
    #[arg(value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,

    /// Host to probe
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Port to probe [default: 443]
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// SNI server name, defaults to the host
    #[arg(long = "servername", value_name = "NAME")]
    pub servername: Option<String>,

    /// ALPN protocols to offer, comma separated
    #[arg(long = "alpn", value_delimiter = ',')]
    pub alpn: Option<Vec<String>>,

    /// Methods to try, comma separated (e.g. TLSv1_2_client_method or tls1.2)
    #[arg(long = "methods", value_delimiter = ',')]
    pub methods: Option<Vec<CheckMethod>>,

    /// Versions that count toward a good verdict
    #[arg(long = "good", value_delimiter = ',')]
    pub good: Option<Vec<String>>,

    /// Versions that make the verdict fail when supported
    #[arg(long = "bad", value_delimiter = ',')]
    pub bad: Option<Vec<String>>,

    /// TCP connect timeout in milliseconds
    #[arg(
        long = "connect-timeout",
        default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
    )]
    pub connect_timeout_ms: u64,

    /// Deadline for a whole attempt in milliseconds
    #[arg(
        long = "timeout",
        default_value_t = DEFAULT_ATTEMPT_TIMEOUT.as_millis() as u64
    )]
    pub attempt_timeout_ms: u64,

    /// Output format
    #[arg(long = "output", default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Shorthand for --output pretty
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pub pretty: bool,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        if self.connect_timeout_ms == 0 || self.attempt_timeout_ms == 0 {
            anyhow::bail!("timeouts must be greater than zero");
        }

        let mut options = parse_assignments(&self.assignments)?;
        if let Some(host) = self.host {
            options.host = Some(host);
        }
        if let Some(port) = self.port {
            options.port = Some(port);
        }
        if let Some(servername) = self.servername {
            options.servername = Some(servername);
        }
        if let Some(alpn) = self.alpn {
            options.protocols = Some(alpn);
        }

        let mut policy = Policy::default();
        if let Some(methods) = self.methods {
            if methods.is_empty() {
                anyhow::bail!("--methods needs at least one method");
            }
            policy.set_methods(&methods);
        }
        if let Some(good) = self.good {
            policy.set_good_versions(&good);
        }
        if let Some(bad) = self.bad {
            policy.set_bad_versions(&bad);
        }

        Ok(Config {
            options,
            policy,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            output: OutputConfig {
                format: if self.pretty {
                    OutputFormat::Pretty
                } else {
                    self.output
                },
            },
        })
    }
}

fn parse_assignments(assignments: &[String]) -> anyhow::Result<CheckerOptions> {
    let mut options = CheckerOptions::default();
    for assignment in assignments {
        let Some((key, value)) = assignment.split_once('=') else {
            anyhow::bail!("expected key=value, got {assignment:?}");
        };
        match key.trim() {
            "host" => options.host = Some(value.to_string()),
            "servername" => options.servername = Some(value.to_string()),
            "port" => {
                let port = value
                    .parse()
                    .map_err(|err| anyhow::anyhow!("invalid port {value:?}: {err}"))?;
                options.port = Some(port);
            }
            "protocols" => {
                options.protocols = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            other => anyhow::bail!("unknown setting {other:?}"),
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Config> {
        let mut argv = vec!["tls-checker"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.into_config()
    }

    #[test]
    fn accepts_key_value_pairs() {
        let cfg = parse(&["host=example.com", "port=8443", "servername=www.example.com"]).unwrap();
        assert_eq!(cfg.options.host.as_deref(), Some("example.com"));
        assert_eq!(cfg.options.port, Some(8443));
        assert_eq!(cfg.options.servername.as_deref(), Some("www.example.com"));
        assert_eq!(cfg.policy, Policy::default());
    }

    #[test]
    fn timeout_defaults_follow_prober() {
        let cfg = parse(&["host=example.com"]).unwrap();
        assert_eq!(cfg.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(cfg.attempt_timeout, DEFAULT_ATTEMPT_TIMEOUT);
    }

    #[test]
    fn flags_override_pairs() {
        let cfg = parse(&["host=a.example", "--host", "b.example", "--pretty"]).unwrap();
        assert_eq!(cfg.options.host.as_deref(), Some("b.example"));
        assert_eq!(cfg.output.format, OutputFormat::Pretty);
    }

    #[test]
    fn policy_lists_from_flags() {
        let cfg = parse(&[
            "--host",
            "example.com",
            "--methods",
            "tls1.3,TLSv1_client_method",
            "--good",
            "TLSv1.3",
            "--bad",
            "TLSv1",
        ])
        .unwrap();
        assert_eq!(cfg.policy.methods(), [CheckMethod::Tls13, CheckMethod::Tls10]);
        assert_eq!(cfg.policy.good_versions(), ["TLSv1.3".to_string()]);
        assert_eq!(cfg.policy.bad_versions(), ["TLSv1".to_string()]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse(&["host"]).is_err());
        assert!(parse(&["color=red"]).is_err());
        assert!(parse(&["port=https"]).is_err());
        assert!(parse(&["--methods", "tls2.0"]).is_err());
        assert!(parse(&["--timeout", "0"]).is_err());
    }
}
