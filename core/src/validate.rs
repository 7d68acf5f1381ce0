//! Construction-time validation primitives.
//!
//! Every node constructor in [`crate::schema`] routes its raw inputs through
//! these checks, so an invalid identifier, key, unit or UCD aborts tree
//! construction at the node where it appears. Nothing is re-validated later.
//!
//! # Examples
//!
//! ```
//! use fits_schema_core::*;
//!
//! assert!(validate_identifier("energy").is_ok());
//! assert!(validate_identifier("2fast").is_err());
//! assert_eq!(normalize_fits_key("geolon").unwrap(), "GEOLON");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Pattern every element name and IVOA key must match.
pub const IDENTIFIER_PATTERN: &str = "^[A-Za-z_][A-Za-z0-9_]*$";

/// Keys longer than this are rendered with the `HIERARCH` convention.
pub const FITS_KEY_WIDTH: usize = 8;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("static regex must compile"));

static FITS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_\-]+(?: [A-Z0-9_\-]+)*$").expect("static regex must compile"));

/// Schema construction errors.
///
/// Each variant names the offending value so the caller can locate it in the
/// tree being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Name or IVOA key does not match [`IDENTIFIER_PATTERN`].
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    /// FITS keyword is empty or contains characters outside `A-Z0-9_-`.
    #[error("invalid FITS key: {0:?}")]
    InvalidFitsKey(String),
    /// Unit string is not a recognized physical unit.
    #[error("invalid unit {unit:?}: {reason}")]
    InvalidUnit { unit: String, reason: String },
    /// UCD string fails the controlled vocabulary.
    #[error("invalid UCD {ucd:?}: {reason}")]
    InvalidUcd { ucd: String, reason: String },
    /// Description is empty or whitespace-only.
    #[error("description of {0:?} cannot be empty")]
    EmptyDescription(String),
    /// Column declared with the `none` data type.
    #[error("column {0:?} must declare a data type")]
    UntypedColumn(String),
    /// Classification list longer than HDUCLASS + HDUCLAS1..4.
    #[error("class hierarchy has {0} levels, at most 5 are supported")]
    TooManyClassLevels(usize),
    /// Provenance tag that is not one of the known standards.
    #[error("unknown keyword origin: {0:?}")]
    UnknownOrigin(String),
    /// Data type name outside the supported enumeration.
    #[error("unknown data type: {0:?}")]
    UnknownDataType(String),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Checks that `value` matches [`IDENTIFIER_PATTERN`] and returns it owned.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidIdentifier`] on mismatch.
pub fn validate_identifier(value: &str) -> Result<String> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(SchemaError::InvalidIdentifier(value.to_string()))
    }
}

/// Normalizes a FITS keyword to its uppercase canonical form.
///
/// Surrounding whitespace is dropped and the input case is irrelevant:
/// `"geoLon"`, `"GEOLON"` and `" geolon "` all yield `"GEOLON"`. Inner single
/// spaces are kept because `HIERARCH` keys may be multi-word.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidFitsKey`] for empty keys, `=`, quotes or
/// other characters a card cannot carry.
pub fn normalize_fits_key(value: &str) -> Result<String> {
    let key = value.trim().to_ascii_uppercase();
    if FITS_KEY_RE.is_match(&key) {
        Ok(key)
    } else {
        Err(SchemaError::InvalidFitsKey(value.to_string()))
    }
}

/// Rejects empty descriptions; `owner` names the element for the message.
pub fn validate_description(owner: &str, description: &str) -> Result<String> {
    if description.trim().is_empty() {
        return Err(SchemaError::EmptyDescription(owner.to_string()));
    }
    Ok(description.to_string())
}

/// Returns `true` if `key` needs the `HIERARCH` long-key encoding.
pub fn is_long_key(key: &str) -> bool {
    key.len() > FITS_KEY_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_accepts_underscore_and_digits() {
        assert_eq!(validate_identifier("_fov_x2").unwrap(), "_fov_x2");
        assert_eq!(validate_identifier("EVENTS").unwrap(), "EVENTS");
    }

    #[test]
    fn test_identifier_rejects_leading_digit_and_punctuation() {
        for bad in ["", "1abc", "geo-lon", "a b", "é"] {
            assert_eq!(
                validate_identifier(bad),
                Err(SchemaError::InvalidIdentifier(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_fits_key_is_uppercased_regardless_of_input_case() {
        for raw in ["obs_id", "OBS_ID", "Obs_Id", "  obs_id "] {
            assert_eq!(normalize_fits_key(raw).unwrap(), "OBS_ID");
        }
        assert_eq!(normalize_fits_key("date-obs").unwrap(), "DATE-OBS");
    }

    #[test]
    fn test_fits_key_rejects_card_syntax() {
        assert!(normalize_fits_key("").is_err());
        assert!(normalize_fits_key("A=B").is_err());
        assert!(normalize_fits_key("QUOTE'").is_err());
        assert!(normalize_fits_key("TWO  SPACES").is_err());
    }

    #[test]
    fn test_long_key_threshold() {
        assert!(!is_long_key("ALTITUDE"));
        assert!(is_long_key("ALTITUDES"));
    }

    #[test]
    fn test_empty_description_is_rejected() {
        assert_eq!(
            validate_description("energy", "   "),
            Err(SchemaError::EmptyDescription("energy".to_string()))
        );
        assert!(validate_description("energy", "reconstructed energy").is_ok());
    }
}
