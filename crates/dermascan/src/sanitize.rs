//! Helpers for keeping sensitive data out of span attributes and object keys.
//!
//! Patient photos arrive with whatever name the clinician's device gave
//! them; only the final path component ever reaches logs or storage keys.

/// Returns only the last path component of a client-supplied file name.
pub fn redact_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Makes a file name safe to embed in an object-store key.
///
/// Path separators and control characters become `_`; leading dots are
/// stripped so a name can never climb out of the upload prefix.
pub fn sanitize_object_name(name: &str) -> String {
    let cleaned: String = redact_file_name(name)
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.').trim();

    if trimmed.is_empty() || trimmed == "<unknown>" {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Masks the `key` query parameter of a URL (API keys travel this way).
///
/// - `https://host/v1/m:generate?key=abc` → `https://host/v1/m:generate?key=****`
/// - `https://host/predict` → unchanged
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if name.eq_ignore_ascii_case("key") => format!("{}=****", name),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", base, redacted.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_file_name_strips_directories() {
        assert_eq!(redact_file_name("/home/dr/photos/lesion.jpg"), "lesion.jpg");
        assert_eq!(redact_file_name("C:\\scans\\arm.png"), "arm.png");
        assert_eq!(redact_file_name("lesion.jpg"), "lesion.jpg");
    }

    #[test]
    fn test_redact_file_name_empty() {
        assert_eq!(redact_file_name(""), "<unknown>");
        assert_eq!(redact_file_name("dir/"), "<unknown>");
    }

    #[test]
    fn test_sanitize_object_name() {
        assert_eq!(sanitize_object_name("lesion 1.jpg"), "lesion 1.jpg");
        assert_eq!(sanitize_object_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_object_name(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_object_name("bad\nname.jpg"), "bad_name.jpg");
        assert_eq!(sanitize_object_name(""), "upload");
    }

    #[test]
    fn test_redact_url_masks_key() {
        assert_eq!(
            redact_url("https://api.example.com/v1/models/m:generateContent?key=secret"),
            "https://api.example.com/v1/models/m:generateContent?key=****"
        );
        assert_eq!(
            redact_url("https://api.example.com/x?alt=json&key=secret"),
            "https://api.example.com/x?alt=json&key=****"
        );
    }

    #[test]
    fn test_redact_url_without_query() {
        assert_eq!(
            redact_url("http://127.0.0.1:5000/predict"),
            "http://127.0.0.1:5000/predict"
        );
    }
}
