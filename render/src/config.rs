//! Render configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! datamodel: "VODF-0.1.0"
//! column_index_base: 1
//! number_columns: false
//! template:
//!   header_comment_width: 50
//!   column_comment_width: 70
//!   wrap_width: 70
//! diagram:
//!   verbose: false
//! ```
//!
//! Every field is optional; missing fields take the values above.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Widths used by the FITS template renderer.
///
/// # Examples
///
/// ```
/// # use fits_schema_render::TemplateOptions;
/// let opts = TemplateOptions::default();
/// assert_eq!(opts.column_comment_width, 70);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Header descriptions longer than this are truncated in the card comment.
    pub header_comment_width: usize,
    /// `TTYPEn` comments longer than this are truncated.
    pub column_comment_width: usize,
    /// Width of wrapped banner text, including the comment prefix.
    pub wrap_width: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            header_comment_width: 50,
            column_comment_width: 70,
            wrap_width: 70,
        }
    }
}

/// Settings for the PlantUML renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramOptions {
    /// List every non-empty attribute instead of the identifying one.
    pub verbose: bool,
}

/// Top-level render configuration, typically loaded from a YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// HDUVERS identifier given to extensions that do not set their own.
    pub datamodel: String,
    /// First column number used when substituting `TTYPE#` placeholders.
    pub column_index_base: usize,
    /// Substitute column placeholders in template output.
    pub number_columns: bool,
    pub template: TemplateOptions,
    pub diagram: DiagramOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            datamodel: fits_schema_core::default_datamodel_id(),
            column_index_base: 1,
            number_columns: false,
            template: TemplateOptions::default(),
            diagram: DiagramOptions::default(),
        }
    }
}

impl RenderConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RenderError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::RenderError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: RenderConfig = serde_yaml::from_str(
            r#"
datamodel: GADF-0.3
template:
  wrap_width: 60
"#,
        )
        .unwrap();
        assert_eq!(config.datamodel, "GADF-0.3");
        assert_eq!(config.column_index_base, 1);
        assert_eq!(config.template.wrap_width, 60);
        assert_eq!(config.template.header_comment_width, 50);
        assert!(!config.diagram.verbose);
    }

    #[test]
    fn test_default_datamodel_names_crate_version() {
        let config = RenderConfig::default();
        assert!(config.datamodel.starts_with("VODF-"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.yml");
        let mut config = RenderConfig::default();
        config.number_columns = true;
        config.diagram.verbose = true;
        config.save(&path).unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RenderConfig::load("/nonexistent/render.yml").unwrap_err();
        assert!(matches!(err, crate::RenderError::Io(_)));
    }
}
