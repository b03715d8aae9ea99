//! Platform-independent helpers for CoreAudio results.

/// Render an `OSStatus` the way Apple documents it: as a four-character
/// code when all four bytes are printable, otherwise as a number.
pub fn describe_status(status: i32) -> String {
    let bytes = status.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        let code: String = bytes.iter().map(|b| *b as char).collect();
        format!("'{}' ({})", code, status)
    } else {
        format!("OSStatus {}", status)
    }
}

/// Private aggregate devices CoreAudio creates for its own use.
pub fn is_hidden_device(name: &str) -> bool {
    name.starts_with("CADefaultDeviceAggregate")
}
