//! Typed meta-model for FITS-like file layouts.
//!
//! This crate defines the schema tree that renderers walk:
//!
//! - [`Header`] and [`HeaderGroup`]: metadata key/value descriptors.
//! - [`Column`] and [`ColumnGroup`]: binary table field descriptors.
//! - [`Extension`] and [`TableExtension`]: HDUs with their classification.
//! - [`FitsFile`]: the root, an ordered list of table extensions.
//!
//! Every node is validated when it is constructed. Identifiers, FITS keys,
//! physical units ([`Unit`]) and UCDs ([`validate_ucd`]) are checked and
//! normalized up front, so renderers can assume canonical values.
//!
//! Schema trees can also be loaded from YAML or JSON with
//! [`SchemaDocument`].
//!
//! # Example
//!
//! ```
//! use fits_schema_core::*;
//!
//! let events = TableExtension::new("EVENTS", "Event list", "VODF-0.1.0")
//!     .unwrap()
//!     .with_class_hierarchy(["OGIP", "EVENTS"])
//!     .unwrap()
//!     .with_header(
//!         Header::new("obs_id", "OBS_ID", "Observation identifier")
//!             .unwrap()
//!             .with_dtype(DataType::Int64),
//!     )
//!     .with_column(
//!         Column::new("energy", "Reconstructed energy", DataType::Float32)
//!             .unwrap()
//!             .with_unit("TeV")
//!             .unwrap(),
//!     );
//!
//! let file = FitsFile::new("events", "DL3 event file")
//!     .unwrap()
//!     .with_extension(events);
//!
//! assert_eq!(file.header_count(), 1);
//! assert_eq!(file.column_count(), 1);
//! assert!(Column::new("bad", "x", DataType::Float32).unwrap().with_unit("bogus-unit").is_err());
//! ```

mod document;
mod schema;
mod types;
mod ucd;
mod units;
mod validate;

pub use document::{
    ColumnEntrySpec, ColumnGroupSpec, ColumnSpec, DocumentError, ExtensionSpec, HeaderEntrySpec,
    HeaderGroupSpec, HeaderSpec, ScalarValue, SchemaDocument, load_fits_file,
};
pub use schema::{
    CLASS_LEVELS, Classification, Column, ColumnEntry, ColumnGroup, Extension, FitsFile, Header,
    HeaderEntry, HeaderGroup, NodeKind, SchemaElement, SchemaNode, TableExtension,
};
pub use types::{DataType, Origin};
pub use ucd::{UcdUsage, ucd_word_usage, validate_ucd};
pub use units::{Unit, UnitFactor};
pub use validate::{
    FITS_KEY_WIDTH, IDENTIFIER_PATTERN, Result, SchemaError, is_long_key, normalize_fits_key,
    validate_description, validate_identifier,
};

/// Default HDUVERS identifier: the meta-model name plus this crate's version.
///
/// Only used to seed configuration defaults; node constructors always take
/// the identifier explicitly.
pub fn default_datamodel_id() -> String {
    format!("VODF-{}", env!("CARGO_PKG_VERSION"))
}
