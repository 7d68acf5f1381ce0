//! Enumerations shared by headers and columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validate::SchemaError;

/// Data type of a header value or table column.
///
/// # Examples
///
/// ```
/// use fits_schema_core::DataType;
///
/// assert_eq!(DataType::Float64.fits_code(), Some("D"));
/// assert_eq!("int32".parse::<DataType>().unwrap(), DataType::Int32);
/// assert_eq!(DataType::None.fits_code(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// No declared type (headers only).
    #[default]
    None,
    Float32,
    Float64,
    Int16,
    Int32,
    Int64,
    Char,
    /// ISO-8601 time string.
    Isotime,
    /// UUID in its textual form.
    Uuid,
}

impl DataType {
    /// All variants in declaration order.
    pub const ALL: [DataType; 9] = [
        DataType::None,
        DataType::Float32,
        DataType::Float64,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Char,
        DataType::Isotime,
        DataType::Uuid,
    ];

    /// Lowercase name as written in schema documents.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::None => "none",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Char => "char",
            DataType::Isotime => "isotime",
            DataType::Uuid => "uuid",
        }
    }

    /// FITS binary table `TFORMn` code for this type.
    ///
    /// | TFORM | Description                     |
    /// |-------|---------------------------------|
    /// | `I`   | 16-bit integer                  |
    /// | `J`   | 32-bit integer                  |
    /// | `K`   | 64-bit integer                  |
    /// | `A`   | character                       |
    /// | `E`   | single precision floating point |
    /// | `D`   | double precision floating point |
    pub fn fits_code(self) -> Option<&'static str> {
        match self {
            DataType::Float32 => Some("E"),
            DataType::Float64 => Some("D"),
            DataType::Int16 => Some("I"),
            DataType::Int32 => Some("J"),
            DataType::Int64 => Some("K"),
            DataType::Char | DataType::Isotime | DataType::Uuid => Some("A"),
            DataType::None => None,
        }
    }

    /// Returns `true` for integer and floating point types, whose values are
    /// written unquoted in header cards.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Float32
                | DataType::Float64
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s.trim())
            .ok_or_else(|| SchemaError::UnknownDataType(s.to_string()))
    }
}

/// Standard that defines a header keyword.
///
/// Documents may name an origin either by its short tag (`ogip`) or by its
/// full reference text (`"OGIP"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Origin {
    Fits,
    FitsV4,
    Heasarc,
    Ogip,
    Vodf,
    FitsTimerep,
}

impl Origin {
    pub const ALL: [Origin; 6] = [
        Origin::Fits,
        Origin::FitsV4,
        Origin::Heasarc,
        Origin::Ogip,
        Origin::Vodf,
        Origin::FitsTimerep,
    ];

    /// Short tag used in schema documents.
    pub fn tag(self) -> &'static str {
        match self {
            Origin::Fits => "fits",
            Origin::FitsV4 => "fits_v4",
            Origin::Heasarc => "heasarc",
            Origin::Ogip => "ogip",
            Origin::Vodf => "vodf",
            Origin::FitsTimerep => "fits_timerep",
        }
    }

    /// Full reference text.
    pub fn reference(self) -> &'static str {
        match self {
            Origin::Fits => "FITS Standard",
            Origin::FitsV4 => "FITS Standard, version 4",
            Origin::Heasarc => "HEASARC",
            Origin::Ogip => "OGIP",
            Origin::Vodf => "VODF",
            Origin::FitsTimerep => {
                "Representations of time coordinates in FITS, A&A 574, A36 (2015)"
            }
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reference())
    }
}

impl FromStr for Origin {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Origin::ALL
            .into_iter()
            .find(|o| o.tag().eq_ignore_ascii_case(needle) || o.reference() == needle)
            .ok_or_else(|| SchemaError::UnknownOrigin(s.to_string()))
    }
}

impl TryFrom<String> for Origin {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.tag().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_codes() {
        assert_eq!(DataType::Float32.fits_code(), Some("E"));
        assert_eq!(DataType::Float64.fits_code(), Some("D"));
        assert_eq!(DataType::Int16.fits_code(), Some("I"));
        assert_eq!(DataType::Int32.fits_code(), Some("J"));
        assert_eq!(DataType::Int64.fits_code(), Some("K"));
        assert_eq!(DataType::Char.fits_code(), Some("A"));
        assert_eq!(DataType::Isotime.fits_code(), Some("A"));
    }

    #[test]
    fn test_data_type_names_round_trip() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
        }
        assert!("uint8".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_serde_is_lowercase() {
        let dt: DataType = serde_json::from_str("\"float64\"").unwrap();
        assert_eq!(dt, DataType::Float64);
    }

    #[test]
    fn test_origin_accepts_tag_or_reference() {
        assert_eq!("ogip".parse::<Origin>().unwrap(), Origin::Ogip);
        assert_eq!("OGIP".parse::<Origin>().unwrap(), Origin::Ogip);
        assert_eq!(
            "FITS Standard, version 4".parse::<Origin>().unwrap(),
            Origin::FitsV4
        );
        assert!(matches!(
            "NASA Extended Keywords".parse::<Origin>(),
            Err(SchemaError::UnknownOrigin(_))
        ));
    }
}
