use crate::model::{AttemptData, OutputConfig, OutputFormat};
use crate::report::CheckReport;
use std::io::{BufWriter, Write};

pub struct OutputSink<W: Write> {
    cfg: OutputConfig,
    writer: BufWriter<W>,
}

impl OutputSink<std::io::Stdout> {
    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, std::io::stdout())
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(cfg: OutputConfig, writer: W) -> Self {
        Self {
            cfg,
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_report(
        &mut self,
        host: &str,
        port: u16,
        report: &CheckReport,
    ) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, report)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Jsonl => {
                let line = serde_json::to_string(report)?;
                writeln!(self.writer, "{line}")?;
            }
            OutputFormat::Pretty => self.write_pretty(host, port, report)?,
        }

        self.writer.flush()?;
        Ok(())
    }

    fn write_pretty(
        &mut self,
        host: &str,
        port: u16,
        report: &CheckReport,
    ) -> anyhow::Result<()> {
        let verdict = if report.is_good { "good" } else { "not good" };
        writeln!(self.writer, "{host}:{port} -> {verdict}")?;
        for result in &report.results {
            let method = result
                .checked_method
                .map(|m| m.openssl_name())
                .unwrap_or("default");
            let version = result.version.as_deref().unwrap_or("-");
            match &result.data {
                Some(AttemptData::Cipher(cipher)) => {
                    writeln!(self.writer, "  {method:<24} ok    {version:<8} {}", cipher.name)?
                }
                Some(AttemptData::Error(err)) => {
                    writeln!(self.writer, "  {method:<24} fail  {version:<8} {err}")?
                }
                None => writeln!(self.writer, "  {method:<24} ?     {version}")?,
            }
        }
        writeln!(self.writer, "  supported:   {}", report.supported.join(", "))?;
        writeln!(self.writer, "  unsupported: {}", report.unsupported.join(", "))?;
        Ok(())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush output: {}", err.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttemptError;
    use crate::method::CheckMethod;
    use crate::model::{AttemptResult, CipherInfo};
    use crate::policy::Policy;

    fn report() -> CheckReport {
        let results = vec![
            AttemptResult {
                checked_method: Some(CheckMethod::Tls12),
                time: 0,
                success: true,
                version: Some("TLSv1.2".into()),
                data: Some(AttemptData::Cipher(CipherInfo {
                    name: "ECDHE-RSA-AES128-GCM-SHA256".into(),
                    standard_name: None,
                    version: "TLSv1.2".into(),
                    bits: 128,
                })),
                options: None,
            },
            AttemptResult {
                checked_method: Some(CheckMethod::Tls10),
                time: 0,
                success: false,
                version: Some("TLSv1".into()),
                data: Some(AttemptData::Error(AttemptError::handshake("protocol version"))),
                options: None,
            },
        ];
        CheckReport::from_results(results, &Policy::default())
    }

    fn render(format: OutputFormat) -> String {
        let mut sink = OutputSink::new(OutputConfig { format }, Vec::new());
        sink.write_report("example.com", 443, &report()).unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn pretty_lists_each_method() {
        let text = render(OutputFormat::Pretty);
        assert!(text.starts_with("example.com:443 -> good"));
        assert!(text.contains("TLSv1_2_client_method"));
        assert!(text.contains("handshake: protocol version"));
        assert!(text.contains("unsupported: TLSv1"));
    }

    #[test]
    fn jsonl_is_one_line() {
        let text = render(OutputFormat::Jsonl);
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["isGood"], true);
    }
}
