//! Serde-backed schema documents.
//!
//! A [`SchemaDocument`] is the unvalidated, on-disk description of a schema
//! tree. Loading only checks syntax; [`SchemaDocument::build`] then feeds every
//! entry through the node constructors in [`crate::schema`], so the same
//! construction-time rules apply to documents and to hand-built trees.
//!
//! # Example YAML
//!
//! ```yaml
//! name: event_file
//! description: A DL3 event list
//! extensions:
//!   - name: EVENTS
//!     description: Event list
//!     version: 1
//!     class_hierarchy: [OGIP, EVENTS, ALL]
//!     headers:
//!       - header:
//!           name: obs_id
//!           fits_key: OBS_ID
//!           description: Observation identifier
//!           dtype: int64
//!       - header_group:
//!           name: location
//!           description: Array location
//!           headers:
//!             - { name: geo_lon, fits_key: GEOLON, description: Longitude, unit: deg }
//!     columns:
//!       - column:
//!           name: energy
//!           description: Reconstructed energy
//!           dtype: float32
//!           unit: TeV
//!           ucd: phys.energy
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schema::{
    Classification, Column, ColumnGroup, Extension, FitsFile, Header, HeaderGroup, TableExtension,
};
use crate::validate::SchemaError;
use crate::{ColumnEntry, DataType, HeaderEntry, Origin};

/// Errors raised while reading or building a schema document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A node failed construction-time validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// File extension is neither YAML nor JSON.
    #[error("unsupported schema document format: {0}")]
    UnsupportedFormat(String),
}

fn default_true() -> bool {
    true
}

/// Literal header value as written in a document.
///
/// Documents may write numbers and booleans unquoted; they are kept in their
/// textual form for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            ScalarValue::Int(i) => write!(f, "{i}"),
            ScalarValue::Float(x) => write!(f, "{x:?}"),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderSpec {
    pub name: String,
    pub fits_key: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ivoa_key: Option<String>,
}

impl HeaderSpec {
    fn build(&self) -> Result<Header, SchemaError> {
        let mut header = Header::new(&self.name, &self.fits_key, &self.description)?
            .with_required(self.required)
            .with_dtype(self.dtype.unwrap_or_default())
            .with_allowed_values(self.allowed_values.iter().map(ToString::to_string));
        if let Some(unit) = &self.unit {
            header = header.with_unit(unit)?;
        }
        if let Some(value) = &self.value {
            header = header.with_value(value.to_string());
        }
        if let Some(origin) = self.origin {
            header = header.with_origin(origin);
        }
        if let Some(key) = &self.ivoa_key {
            header = header.with_ivoa_key(key)?;
        }
        Ok(header)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderGroupSpec {
    pub name: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub headers: Vec<HeaderSpec>,
}

/// A tagged `header:` or `header_group:` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderEntrySpec {
    Header(HeaderSpec),
    HeaderGroup(HeaderGroupSpec),
}

impl HeaderEntrySpec {
    fn build(&self) -> Result<HeaderEntry, SchemaError> {
        Ok(match self {
            HeaderEntrySpec::Header(spec) => spec.build()?.into(),
            HeaderEntrySpec::HeaderGroup(spec) => {
                let headers = spec
                    .headers
                    .iter()
                    .map(HeaderSpec::build)
                    .collect::<Result<Vec<_>, _>>()?;
                HeaderGroup::new(&spec.name, &spec.description)?
                    .with_required(spec.required)
                    .with_headers(headers)
                    .into()
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub name: String,
    pub description: String,
    pub dtype: DataType,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub ndims: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ucd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColumnSpec {
    fn build(&self) -> Result<Column, SchemaError> {
        let mut column = Column::new(&self.name, &self.description, self.dtype)?
            .with_required(self.required)
            .with_ndims(self.ndims);
        if let Some(unit) = &self.unit {
            column = column.with_unit(unit)?;
        }
        if let Some(ucd) = &self.ucd {
            column = column.with_ucd(ucd)?;
        }
        if let Some(format) = &self.format {
            column = column.with_format(format.clone());
        }
        Ok(column)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnGroupSpec {
    pub name: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

/// A tagged `column:` or `column_group:` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnEntrySpec {
    Column(ColumnSpec),
    ColumnGroup(ColumnGroupSpec),
}

impl ColumnEntrySpec {
    fn build(&self) -> Result<ColumnEntry, SchemaError> {
        Ok(match self {
            ColumnEntrySpec::Column(spec) => spec.build()?.into(),
            ColumnEntrySpec::ColumnGroup(spec) => {
                let columns = spec
                    .columns
                    .iter()
                    .map(ColumnSpec::build)
                    .collect::<Result<Vec<_>, _>>()?;
                ColumnGroup::new(&spec.name, &spec.description)?
                    .with_required(spec.required)
                    .with_columns(columns)
                    .into()
            }
        })
    }
}

/// A table extension entry.
///
/// Classification may be given either as the `class_name` / `subclass1..4`
/// slots or as a `class_hierarchy` list. When the list is present the slots
/// are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSpec {
    pub name: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub version: u32,
    /// Overrides the datamodel passed to [`SchemaDocument::build`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datamodel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_hierarchy: Option<Vec<String>>,
    /// Entries are single-key maps (`header:` / `header_group:`).
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub headers: Vec<HeaderEntrySpec>,
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub columns: Vec<ColumnEntrySpec>,
}

impl ExtensionSpec {
    fn classification(&self) -> Result<Classification, SchemaError> {
        match &self.class_hierarchy {
            Some(levels) => Classification::from_levels(levels.iter().cloned()),
            None => Ok(Classification::new(
                self.class_name.clone(),
                [
                    self.subclass1.clone(),
                    self.subclass2.clone(),
                    self.subclass3.clone(),
                    self.subclass4.clone(),
                ],
            )),
        }
    }

    fn build(&self, datamodel: &str) -> Result<TableExtension, SchemaError> {
        let headers = self
            .headers
            .iter()
            .map(HeaderEntrySpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        let columns = self
            .columns
            .iter()
            .map(ColumnEntrySpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        let datamodel = self.datamodel.as_deref().unwrap_or(datamodel);
        let extension = Extension::new(&self.name, &self.description, datamodel)?
            .with_required(self.required)
            .with_version(self.version)
            .with_classification(self.classification()?)
            .with_headers(headers);
        Ok(TableExtension::from_extension(extension).with_columns(columns))
    }
}

/// Root of a schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub extensions: Vec<ExtensionSpec>,
}

impl SchemaDocument {
    /// Loads a document, choosing the parser from the file extension
    /// (`.yaml`/`.yml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] for other extensions and
    /// the I/O or parse error otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        debug!(path = %path.display(), format = %ext, "Loading schema document");

        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let document = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(reader)?,
            "json" => serde_json::from_reader(reader)?,
            _ => return Err(DocumentError::UnsupportedFormat(path.display().to_string())),
        };
        Ok(document)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds the validated tree. `datamodel` is the HDUVERS identifier given
    /// to every extension that does not set its own.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] raised by a node constructor.
    ///
    /// # Examples
    ///
    /// ```
    /// use fits_schema_core::SchemaDocument;
    ///
    /// let doc = SchemaDocument::from_yaml_str(
    ///     "name: f\ndescription: d\nextensions:\n  - name: EVENTS\n    description: e\n",
    /// )
    /// .unwrap();
    /// let file = doc.build("VODF-0.1.0").unwrap();
    /// assert_eq!(file.extensions()[0].extension().datamodel(), "VODF-0.1.0");
    /// ```
    pub fn build(&self, datamodel: &str) -> Result<FitsFile, SchemaError> {
        let extensions = self
            .extensions
            .iter()
            .map(|spec| spec.build(datamodel))
            .collect::<Result<Vec<_>, _>>()?;
        let file = FitsFile::new(&self.name, &self.description)?.with_extensions(extensions);
        debug!(
            name = %self.name,
            extensions = file.extensions().len(),
            headers = file.header_count(),
            columns = file.column_count(),
            "Built schema tree"
        );
        Ok(file)
    }
}

/// Loads and builds a schema file in one step.
pub fn load_fits_file(path: impl AsRef<Path>, datamodel: &str) -> Result<FitsFile, DocumentError> {
    Ok(SchemaDocument::load(path)?.build(datamodel)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaNode;

    const SAMPLE: &str = r#"
name: event_file
description: A DL3 event list
extensions:
  - name: EVENTS
    description: Event list
    version: 1
    class_hierarchy: [OGIP, EVENTS, ALL]
    headers:
      - header:
          name: obs_id
          fits_key: obs_id
          description: Observation identifier
          dtype: int64
          value: 42
      - header_group:
          name: location
          description: Array location
          headers:
            - { name: geo_lon, fits_key: GEOLON, description: Longitude, unit: degree, origin: vodf }
            - { name: geo_lat, fits_key: GEOLAT, description: Latitude, unit: deg, required: false }
    columns:
      - column:
          name: energy
          description: Reconstructed energy
          dtype: float32
          unit: TeV
          ucd: phys.energy
      - column_group:
          name: fov
          description: Field of view coordinates
          columns:
            - { name: fov_lon, description: lon, dtype: float64, unit: deg }
            - { name: fov_lat, description: lat, dtype: float64, unit: deg }
"#;

    #[test]
    fn test_yaml_document_builds_tree() {
        let doc = SchemaDocument::from_yaml_str(SAMPLE).unwrap();
        let file = doc.build("VODF-test").unwrap();
        assert_eq!(file.name(), "event_file");
        assert_eq!(file.header_count(), 3);
        assert_eq!(file.column_count(), 3);

        let events = &file.extensions()[0];
        assert_eq!(events.extension().version(), 1);
        assert_eq!(events.extension().datamodel(), "VODF-test");
        assert_eq!(
            events.extension().class_hierarchy(),
            vec!["OGIP", "EVENTS", "ALL"]
        );

        let obs_id = events.extension().headers_flat().next().unwrap();
        assert_eq!(obs_id.fits_key(), "OBS_ID");
        assert_eq!(obs_id.value(), Some("42"));

        let geo_lat = events.extension().headers_flat().nth(2).unwrap();
        assert!(!geo_lat.required());
    }

    #[test]
    fn test_tagged_entries_keep_their_kind() {
        let doc = SchemaDocument::from_yaml_str(SAMPLE).unwrap();
        let events = &doc.extensions[0];
        assert!(matches!(events.headers[0], HeaderEntrySpec::Header(_)));
        assert!(matches!(events.headers[1], HeaderEntrySpec::HeaderGroup(_)));
        assert!(matches!(events.columns[0], ColumnEntrySpec::Column(_)));
        assert!(matches!(events.columns[1], ColumnEntrySpec::ColumnGroup(_)));

        let text = serde_yaml::to_string(&doc).unwrap();
        assert!(text.contains("- header:"));
        assert!(text.contains("- column_group:"));
    }

    #[test]
    fn test_float_values_keep_decimal_point() {
        let text = SAMPLE.replace("value: 42", "value: 1.0");
        let file = SchemaDocument::from_yaml_str(&text)
            .unwrap()
            .build("VODF-test")
            .unwrap();
        let obs_id = file.extensions()[0].extension().headers_flat().next().unwrap();
        assert_eq!(obs_id.value(), Some("1.0"));

        assert_eq!(ScalarValue::Float(1.0e30).to_string(), "1e30");
        assert_eq!(ScalarValue::Float(-2.5).to_string(), "-2.5");
        assert_eq!(ScalarValue::Int(7).to_string(), "7");
    }

    #[test]
    fn test_json_document_matches_yaml() {
        let yaml = SchemaDocument::from_yaml_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&yaml).unwrap();
        let doc = SchemaDocument::from_json_str(&json).unwrap();
        assert_eq!(
            doc.build("VODF-test").unwrap(),
            yaml.build("VODF-test").unwrap()
        );
    }

    #[test]
    fn test_invalid_ucd_aborts_build() {
        let text = SAMPLE.replace("ucd: phys.energy", "ucd: not-a-real-ucd");
        let doc = SchemaDocument::from_yaml_str(&text).unwrap();
        assert!(matches!(
            doc.build("VODF-test"),
            Err(SchemaError::InvalidUcd { .. })
        ));
    }

    #[test]
    fn test_extension_datamodel_override() {
        let text = SAMPLE.replace("    version: 1\n", "    version: 1\n    datamodel: GADF-0.3\n");
        let file = SchemaDocument::from_yaml_str(&text)
            .unwrap()
            .build("VODF-test")
            .unwrap();
        assert_eq!(file.extensions()[0].extension().datamodel(), "GADF-0.3");
    }

    #[test]
    fn test_too_many_class_levels() {
        let text = SAMPLE.replace("[OGIP, EVENTS, ALL]", "[A, B, C, D, E, F]");
        let doc = SchemaDocument::from_yaml_str(&text).unwrap();
        assert_eq!(
            doc.build("VODF-test"),
            Err(SchemaError::TooManyClassLevels(6))
        );
    }

    #[test]
    fn test_slot_classification() {
        let text = SAMPLE.replace(
            "class_hierarchy: [OGIP, EVENTS, ALL]",
            "class_name: OGIP\n    subclass1: EVENTS",
        );
        let file = SchemaDocument::from_yaml_str(&text)
            .unwrap()
            .build("VODF-test")
            .unwrap();
        assert_eq!(
            file.extensions()[0].extension().class_hierarchy(),
            vec!["OGIP", "EVENTS"]
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let text = SAMPLE.replace("dtype: float32", "dtype: float32\n          colour: red");
        assert!(matches!(
            SchemaDocument::from_yaml_str(&text),
            Err(DocumentError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert!(matches!(
            SchemaDocument::load(&path),
            Err(DocumentError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_fits_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yml");
        std::fs::write(&path, SAMPLE).unwrap();
        let file = load_fits_file(&path, "VODF-test").unwrap();
        assert_eq!(file.extensions().len(), 1);
    }
}
