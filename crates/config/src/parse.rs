//! Typed coercion of raw environment strings.

use std::num::NonZeroUsize;

use crate::error::{ConfigError, ConfigResult};

/// Parse a TCP port in `1..=65535`.
pub fn port(key: &'static str, raw: &str) -> ConfigResult<u16> {
    let value = raw.trim();
    let port: u16 = value
        .parse()
        .map_err(|_| ConfigError::invalid(key, raw, "expected an integer in 1..=65535"))?;
    if port == 0 {
        return Err(ConfigError::invalid(key, raw, "port 0 is not allowed"));
    }
    Ok(port)
}

/// Parse a strictly positive count.
pub fn positive(key: &'static str, raw: &str) -> ConfigResult<NonZeroUsize> {
    raw.trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::invalid(key, raw, "expected a positive integer"))
}

/// Parse a boolean flag.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitive.
pub fn flag(key: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}

/// Parse a non-empty string.
pub fn non_empty(key: &'static str, raw: &str) -> ConfigResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::invalid(key, raw, "must not be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_rejects_zero_and_overflow() {
        assert!(port("APP_PORT", "0").is_err());
        assert!(port("APP_PORT", "65536").is_err());
        assert!(port("APP_PORT", "-1").is_err());
        assert_eq!(port("APP_PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn flag_accepts_common_spellings() {
        for raw in ["true", "TRUE", "1", "yes", "On"] {
            assert!(flag("DEBUG", raw).unwrap(), "{raw}");
        }
        for raw in ["false", "False", "0", "no", "OFF"] {
            assert!(!flag("DEBUG", raw).unwrap(), "{raw}");
        }
        assert!(flag("DEBUG", "maybe").is_err());
        assert!(flag("DEBUG", "").is_err());
    }

    #[test]
    fn positive_rejects_zero() {
        let err = positive("WORKERS", "0").unwrap_err();
        assert_eq!(err.key(), "WORKERS");
        assert_eq!(positive("WORKERS", "4").unwrap().get(), 4);
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("APP_HOST", " 127.0.0.1 ").unwrap(), "127.0.0.1");
        assert!(non_empty("APP_HOST", "   ").is_err());
    }
}
