//! Cache keys and source format negotiation.

use md5::{Digest, Md5};

/// Extension of transcoded files, which also selects the output format.
pub const TARGET_EXTENSION: &str = "webp";

/// Format of the bytes behind a source URL, judged by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Heic,
    Webp,
    Other,
}

impl SourceFormat {
    /// Detects the format from the URL path suffix, ignoring case.
    pub fn detect(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if has_suffix(&lower, ".heic") {
            SourceFormat::Heic
        } else if has_suffix(&lower, ".webp") {
            SourceFormat::Webp
        } else {
            SourceFormat::Other
        }
    }

    /// Extension used for the temporary source file.
    pub fn temp_extension(self) -> &'static str {
        match self {
            SourceFormat::Heic => "heic",
            SourceFormat::Webp => "webp",
            SourceFormat::Other => "src",
        }
    }
}

// `.ext` either ends the URL or is followed by the query string
fn has_suffix(lower_url: &str, ext: &str) -> bool {
    lower_url.ends_with(ext) || lower_url.contains(&format!("{ext}?"))
}

/// Derives the content-addressed file name for `(source_url, width)`.
///
/// `md5(url)` in lowercase hex, then `_<width>.webp`.
pub fn cache_key(source_url: &str, width: u32) -> String {
    let digest = Md5::digest(normalize_url(source_url).as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hex}_{width}.{TARGET_EXTENSION}")
}

fn normalize_url(url: &str) -> &str {
    url.trim()
}

/// Picks the URL to fetch and the format of what it returns.
///
/// The media host serves the same picture as heavyweight HEIC or as a
/// pre-optimized WebP depending on the extension. A WebP URL is rewritten to
/// its HEIC twin so the transcoder always starts from the full source.
pub fn negotiate_source(source_url: &str) -> (String, SourceFormat) {
    let url = normalize_url(source_url);
    match SourceFormat::detect(url) {
        SourceFormat::Webp => (swap_extension(url, ".webp", ".heic"), SourceFormat::Heic),
        format => (url.to_string(), format),
    }
}

// Replaces the first `from?` (or a trailing `from`) case-insensitively
fn swap_extension(url: &str, from: &str, to: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let with_query = format!("{from}?");

    if let Some(pos) = lower.find(&with_query) {
        return format!("{}{}{}", &url[..pos], to, &url[pos + from.len()..]);
    }
    if lower.ends_with(from) {
        return format!("{}{}", &url[..url.len() - from.len()], to);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_shape() {
        let key = cache_key("https://cdn.example/cover.heic?x=1", 400);

        let (hash, rest) = key.split_once('_').unwrap();
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(rest, "400.webp");
    }

    #[test]
    fn test_cache_key_known_digest() {
        // md5("") is a fixed, well-known value
        assert_eq!(cache_key("", 10), "d41d8cd98f00b204e9800998ecf8427e_10.webp");
    }

    #[test]
    fn test_cache_key_is_stable_and_width_sensitive() {
        let url = "https://cdn.example/a.heic";

        assert_eq!(cache_key(url, 300), cache_key(url, 300));
        assert_ne!(cache_key(url, 300), cache_key(url, 600));
        assert_ne!(cache_key(url, 300), cache_key("https://cdn.example/b.heic", 300));
        assert_eq!(cache_key(url, 300), cache_key(" https://cdn.example/a.heic ", 300));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(SourceFormat::detect("https://x/a.HEIC"), SourceFormat::Heic);
        assert_eq!(SourceFormat::detect("https://x/a.heic?sig=1"), SourceFormat::Heic);
        assert_eq!(SourceFormat::detect("https://x/a.webp?sig=1"), SourceFormat::Webp);
        assert_eq!(SourceFormat::detect("https://x/a.jpg"), SourceFormat::Other);
    }

    #[test]
    fn test_negotiate_rewrites_webp_to_heic() {
        let (url, format) = negotiate_source("https://x/img/a.WEBP?sig=abc&e=1");
        assert_eq!(url, "https://x/img/a.heic?sig=abc&e=1");
        assert_eq!(format, SourceFormat::Heic);

        let (url, _) = negotiate_source("https://x/img/a.webp");
        assert_eq!(url, "https://x/img/a.heic");
    }

    #[test]
    fn test_negotiate_keeps_heic_and_other() {
        let (url, format) = negotiate_source("https://x/a.heic?sig=1");
        assert_eq!(url, "https://x/a.heic?sig=1");
        assert_eq!(format, SourceFormat::Heic);

        let (url, format) = negotiate_source("https://x/a.png");
        assert_eq!(url, "https://x/a.png");
        assert_eq!(format, SourceFormat::Other);
    }
}
