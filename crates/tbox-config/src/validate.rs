//! Parsing helpers for raw environment values.

use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Parse an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is not a valid HTTP URL.
pub fn parse_http_url(field: &'static str, raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::invalid(field, raw, "not_a_url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(field, raw, "unsupported_scheme"));
    }
    Ok(url)
}

/// Parse a non-negative integer.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is not an unsigned integer.
pub fn parse_u32(field: &'static str, raw: &str) -> ConfigResult<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::invalid(field, raw, "not_an_integer"))
}

/// Parse a strictly positive integer.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is zero or not an integer.
pub fn parse_positive_u32(field: &'static str, raw: &str) -> ConfigResult<u32> {
    match parse_u32(field, raw)? {
        0 => Err(ConfigError::invalid(field, raw, "zero")),
        value => Ok(value),
    }
}

/// Parse a duration expressed in whole seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is not an unsigned integer.
pub fn parse_secs(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::invalid(field, raw, "not_an_integer"))
}

/// Parse a duration expressed in milliseconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is not an unsigned integer.
pub fn parse_millis(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::invalid(field, raw, "not_an_integer"))
}

/// Parse a boolean flag (`1/true/yes/on` or `0/false/no/off`).
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` for any other spelling.
pub fn parse_flag(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, raw, "not_a_flag")),
    }
}

/// Require a value that is not blank after trimming.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is blank.
pub fn parse_non_empty(field: &'static str, raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, raw, "empty"));
    }
    Ok(trimmed.to_string())
}

/// Require a key segment: non-blank and free of `/`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is blank or contains a slash.
pub fn parse_key_segment(field: &'static str, raw: &str) -> ConfigResult<String> {
    let value = parse_non_empty(field, raw)?;
    let value = value.trim_matches('/').to_string();
    if value.is_empty() || value.contains('/') {
        return Err(ConfigError::invalid(field, raw, "not_a_single_segment"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: &ConfigError) -> Option<&'static str> {
        match err {
            ConfigError::InvalidField { reason, .. } => Some(*reason),
            ConfigError::MissingField { .. } => None,
        }
    }

    #[test]
    fn parse_http_url_rejects_other_schemes() {
        let err = parse_http_url("TBOX_QBIT_URL", "ftp://host").unwrap_err();
        assert_eq!(reason(&err), Some("unsupported_scheme"));
        assert!(parse_http_url("TBOX_QBIT_URL", " http://127.0.0.1:8080 ").is_ok());
        assert!(parse_http_url("TBOX_QBIT_URL", "not a url").is_err());
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert!(parse_flag("flag", "TrUe").unwrap());
        assert!(parse_flag("flag", "on").unwrap());
        assert!(!parse_flag("flag", "0").unwrap());
        assert!(!parse_flag("flag", "No").unwrap());
        assert_eq!(reason(&parse_flag("flag", "maybe").unwrap_err()), Some("not_a_flag"));
    }

    #[test]
    fn parse_positive_u32_rejects_zero() {
        assert_eq!(
            reason(&parse_positive_u32("attempts", "0").unwrap_err()),
            Some("zero")
        );
        assert_eq!(parse_positive_u32("attempts", " 12 ").unwrap(), 12);
    }

    #[test]
    fn parse_key_segment_strips_slashes_and_rejects_nesting() {
        assert_eq!(parse_key_segment("ns", "/bucket/").unwrap(), "bucket");
        assert_eq!(
            reason(&parse_key_segment("ns", "a/b").unwrap_err()),
            Some("not_a_single_segment")
        );
        assert_eq!(reason(&parse_key_segment("ns", "  ").unwrap_err()), Some("empty"));
    }

    #[test]
    fn durations_parse_units() {
        assert_eq!(parse_secs("delay", "10").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_millis("interval", "250").unwrap(), Duration::from_millis(250));
        assert!(parse_secs("delay", "-1").is_err());
    }
}
