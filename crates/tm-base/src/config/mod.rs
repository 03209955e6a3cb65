//! YAML configuration for the user-facing strings of the chat widget.
use std::sync::LazyLock;

use serde::Deserialize;

pub mod constants;

// ============================================================================
// Strings Configuration
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct StringsConfig {
    /// First assistant message written to a fresh history
    pub greeting: String,
    /// Substring marking a backend answer as a deferred placeholder
    pub deferred_marker: String,
    /// Shown when the backend reply carries neither an answer nor an error
    pub no_response: String,
    /// Prefix for inline dispatch failures
    pub error_prefix: String,
    /// Replaces a placeholder whose pending query expired
    pub expired_notice: String,
    pub loading: String,
    pub title: String,
    pub input_placeholder: String,
}

impl StringsConfig {
    /// Inline text for a dispatch that never reached a usable reply.
    pub fn error_text(&self, reason: &str) -> String {
        format!("{}{}", self.error_prefix, reason)
    }
}

// ============================================================================
// Loading
// ============================================================================

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

/// Embedded at compile time.
pub static STRINGS: LazyLock<StringsConfig> =
    LazyLock::new(|| parse_yaml("strings.yaml", include_str!("../../../../yamls/strings.yaml")));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_strings_parse() {
        assert!(!STRINGS.greeting.is_empty());
        assert_eq!(STRINGS.deferred_marker, "analyzing this long video");
    }

    #[test]
    fn error_text_uses_prefix() {
        assert_eq!(STRINGS.error_text("connection refused"), "Error: connection refused");
    }
}
