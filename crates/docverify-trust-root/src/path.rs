//! Normalization of configured paths
//!
//! Paths arrive from configuration files and environment variables, sometimes
//! wrapped in quotes and sometimes with UTF-8 text that was decoded as
//! Latin-1 somewhere upstream (`Ã–mer` instead of `Ömer`).

use std::path::PathBuf;

/// Characters whose presence confirms that a Latin-1 to UTF-8 repair produced
/// Turkish text rather than noise
const REPAIR_CONFIRMATION: &[char] = &[
    'Ö', 'ö', 'ı', 'İ', 'ş', 'Ş', 'ğ', 'Ğ', 'ü', 'Ü', 'ç', 'Ç',
];

/// Trim, strip one pair of matching quotes and repair double-decoded UTF-8.
///
/// Idempotent: normalizing an already normalized path returns it unchanged.
pub fn normalize_path(raw: &str) -> String {
    let unquoted = strip_quotes(raw.trim());
    repair_mojibake(unquoted)
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Best-effort repair of UTF-8 bytes that were read as Latin-1.
///
/// Applied only when the text contains `Ã` or `Ä`, every character fits in one
/// Latin-1 byte, those bytes form valid UTF-8, and the result contains one of
/// the Turkish letters in [`REPAIR_CONFIRMATION`]. Anything else is returned
/// as is.
fn repair_mojibake(s: &str) -> String {
    if !s.contains(['Ã', 'Ä']) {
        return s.to_string();
    }

    let mut bytes = Vec::with_capacity(s.len());
    for c in s.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(b) => bytes.push(b),
            Err(_) => return s.to_string(),
        }
    }

    match String::from_utf8(bytes) {
        Ok(decoded) if decoded.contains(REPAIR_CONFIRMATION) => {
            tracing::debug!("repaired mis-decoded path text: {}", decoded);
            decoded
        }
        _ => s.to_string(),
    }
}

/// Turn a normalized location into a filesystem path.
///
/// Removes a `file:` scheme (`file:///etc/x` and `file:/etc/x` both give
/// `/etc/x`) and drops the slash in front of a Windows drive (`file:/C:/x`
/// gives `C:/x`).
pub fn to_filesystem_path(location: &str) -> PathBuf {
    let Some(rest) = location.strip_prefix("file:") else {
        return PathBuf::from(location);
    };

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let bytes = rest.as_bytes();
    let has_drive = bytes.len() >= 3
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && bytes[2] == b':';

    if has_drive {
        PathBuf::from(&rest[1..])
    } else {
        PathBuf::from(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode as UTF-8, then read each byte back as a Latin-1 character
    fn mangle(s: &str) -> String {
        s.as_bytes().iter().map(|&b| char::from(b)).collect()
    }

    #[test]
    fn test_trim_and_quotes() {
        assert_eq!(normalize_path("  \"/opt/certs\"  "), "/opt/certs");
        assert_eq!(normalize_path("'/opt/certs'"), "/opt/certs");
        assert_eq!(normalize_path("\"/opt/certs'"), "\"/opt/certs'");
        assert_eq!(normalize_path("\""), "\"");
    }

    #[test]
    fn test_repairs_double_decoded_turkish_path() {
        let original = "/home/Ömer/Belgeler/şifreli kök";
        let broken = mangle(original);
        assert_ne!(broken, original);
        assert!(broken.contains('Ã'));
        assert_eq!(normalize_path(&broken), original);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let broken = mangle("C:/Kullanıcılar/Çağrı/kok.xml");
        let once = normalize_path(&broken);
        assert_eq!(normalize_path(&once), once);

        for clean in ["/srv/Äpfel/roots", "/tmp/ÖZEL", "/plain/ascii"] {
            assert_eq!(normalize_path(clean), clean);
        }
    }

    #[test]
    fn test_no_repair_without_turkish_letters() {
        // Valid double-decoded UTF-8, but the result has no confirming letter
        let broken = mangle("/data/é");
        assert!(broken.contains('Ã'));
        assert_eq!(normalize_path(&broken), broken);
    }

    #[test]
    fn test_file_prefix() {
        assert_eq!(to_filesystem_path("file:/C:/roots/depo.xml"), PathBuf::from("C:/roots/depo.xml"));
        assert_eq!(to_filesystem_path("file:///etc/depo.xml"), PathBuf::from("/etc/depo.xml"));
        assert_eq!(to_filesystem_path("file:/etc/depo.xml"), PathBuf::from("/etc/depo.xml"));
        assert_eq!(to_filesystem_path("/etc/depo.xml"), PathBuf::from("/etc/depo.xml"));
    }
}
