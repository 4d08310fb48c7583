pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Encodes protocol names as the length-prefixed list ALPN puts on the wire.
pub fn alpn_wire_format<S: AsRef<str>>(protocols: &[S]) -> anyhow::Result<Vec<u8>> {
    let mut wire = Vec::new();
    for protocol in protocols {
        let bytes = protocol.as_ref().as_bytes();
        if bytes.is_empty() || bytes.len() > u8::MAX as usize {
            anyhow::bail!("invalid ALPN protocol name {:?}", protocol.as_ref());
        }
        wire.push(bytes.len() as u8);
        wire.extend_from_slice(bytes);
    }
    Ok(wire)
}
