//! Resolving the content id the widget is opened for.

use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivationError {
    #[error("not a video page: {0}")]
    NotAVideoPage(String),
    #[error("invalid video id: {0:?}")]
    InvalidId(String),
}

const WATCH_HOSTS: [&str; 3] = ["www.youtube.com", "youtube.com", "m.youtube.com"];

/// Content id for a `youtube.com/watch?v=...` URL or a bare video id.
///
/// Anything else (channel pages, search, other sites) means the widget
/// does not activate.
pub fn content_id_from_url(input: &str) -> Result<String, ActivationError> {
    let input = input.trim();
    if !input.contains("://") {
        return validate_id(input);
    }

    let url = Url::parse(input).map_err(|_| ActivationError::NotAVideoPage(input.to_string()))?;
    let is_watch_page = matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|h| WATCH_HOSTS.contains(&h))
        && url.path() == "/watch";
    if !is_watch_page {
        return Err(ActivationError::NotAVideoPage(input.to_string()));
    }

    let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") else {
        return Err(ActivationError::NotAVideoPage(input.to_string()));
    };
    validate_id(&id)
}

fn validate_id(id: &str) -> Result<String, ActivationError> {
    let ok = !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok { Ok(id.to_string()) } else { Err(ActivationError::InvalidId(id.to_string())) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_url_yields_video_id() {
        assert_eq!(content_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(content_id_from_url("https://m.youtube.com/watch?t=42&v=abc_DEF-1").unwrap(), "abc_DEF-1");
        assert_eq!(content_id_from_url("http://youtube.com/watch?v=x1").unwrap(), "x1");
    }

    #[test]
    fn bare_id_is_accepted() {
        assert_eq!(content_id_from_url("  dQw4w9WgXcQ \n").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn non_watch_pages_do_not_activate() {
        for url in [
            "https://www.youtube.com/",
            "https://www.youtube.com/results?search_query=rust",
            "https://www.youtube.com/@channel",
            "https://vimeo.com/watch?v=abc",
            "ftp://www.youtube.com/watch?v=abc",
        ] {
            assert!(matches!(content_id_from_url(url), Err(ActivationError::NotAVideoPage(_))), "{url}");
        }
    }

    #[test]
    fn watch_page_without_id_does_not_activate() {
        assert!(matches!(
            content_id_from_url("https://www.youtube.com/watch?list=PL1"),
            Err(ActivationError::NotAVideoPage(_))
        ));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(content_id_from_url(""), Err(ActivationError::InvalidId(String::new())));
        assert!(matches!(content_id_from_url("../etc/passwd"), Err(ActivationError::InvalidId(_))));
        assert!(matches!(
            content_id_from_url("https://www.youtube.com/watch?v=a%20b"),
            Err(ActivationError::InvalidId(_))
        ));
    }
}
