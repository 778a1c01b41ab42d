//! Charset decoding cascade (spec §4.1): explicit override, then the
//! response's Content-Type charset, then UTF-8 with lossy replacement.

use encoding_rs::Encoding;

pub fn decode_body(bytes: &[u8], content_type: Option<&str>, encoding_override: Option<&str>) -> String {
    if let Some(label) = encoding_override {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding.decode(bytes).0.into_owned();
        }
    }

    if let Some(ct) = content_type {
        if let Some(label) = charset_from_content_type(ct) {
            if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                return encoding.decode(bytes).0.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .find_map(|segment| segment.trim().strip_prefix("charset="))
        .map(|v| v.trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8_by_default() {
        let body = decode_body("héllo".as_bytes(), None, None);
        assert_eq!(body, "héllo");
    }

    #[test]
    fn extracts_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=GBK"),
            Some("GBK")
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn explicit_override_wins_over_content_type() {
        let body = decode_body("abc".as_bytes(), Some("text/html; charset=GBK"), Some("utf-8"));
        assert_eq!(body, "abc");
    }

    #[test]
    fn invalid_utf8_falls_back_to_lossy_replacement() {
        let bytes = vec![0x68, 0x65, 0xff, 0x6c, 0x6c, 0x6f];
        let body = decode_body(&bytes, None, None);
        assert!(body.contains('\u{FFFD}'));
    }
}
