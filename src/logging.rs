//! Safe display of credential material in logs and CLI output

use std::fmt;

/// Number of leading characters left visible
const VISIBLE_PREFIX: usize = 4;

/// Masked view of a secret value.
///
/// Shows the first few characters followed by `***`; short values are fully masked.
///
/// ```
/// use portfolio_assistant::logging::MaskedSecret;
///
/// assert_eq!(MaskedSecret::new("sk-1234567890abcdef").to_string(), "sk-1***");
/// assert_eq!(MaskedSecret::new("short").to_string(), "***");
/// ```
#[derive(Clone, Copy)]
pub struct MaskedSecret<'a> {
    inner: &'a str,
}

impl<'a> MaskedSecret<'a> {
    pub fn new(secret: &'a str) -> Self {
        Self { inner: secret }
    }
}

impl fmt::Display for MaskedSecret<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Anything shorter than 12 chars would leak a third of itself
        if self.inner.chars().count() < 12 {
            return write!(f, "***");
        }

        let prefix: String = self.inner.chars().take(VISIBLE_PREFIX).collect();
        write!(f, "{}***", prefix)
    }
}

impl fmt::Debug for MaskedSecret<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// Mask a value that may or may not be present
pub fn mask_optional(value: Option<&str>) -> String {
    match value {
        Some(v) => MaskedSecret::new(v).to_string(),
        None => "(unset)".to_string(),
    }
}
