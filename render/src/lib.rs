//! Renderers for FITS schema trees.
//!
//! Rendering is built on a small exact-type [`Dispatcher`]: each output
//! format owns one dispatcher that maps every node type of
//! [`fits_schema_core`] to a render function. Two formats are provided:
//!
//! - [`fits_template`]: FITS header-card templates, terminated by `END`.
//! - [`plantuml`]: PlantUML class diagrams of the tree structure.
//!
//! Both return lazily generated [`Lines`]. Dispatch errors are raised
//! before any line is produced, and [`write_lines`] only replaces its
//! destination once every line was written.
//!
//! # Example
//!
//! ```
//! use fits_schema_core::*;
//! use fits_schema_render::*;
//!
//! let energy = Column::new("energy", "Reconstructed energy", DataType::Float32)
//!     .unwrap()
//!     .with_unit("TeV")
//!     .unwrap()
//!     .with_ucd("phys.energy")
//!     .unwrap();
//! let file = FitsFile::new("events", "DL3 event file")
//!     .unwrap()
//!     .with_extension(
//!         TableExtension::new("EVENTS", "Event list", "VODF-0.1.0")
//!             .unwrap()
//!             .with_column(energy),
//!     );
//!
//! let config = RenderConfig::default();
//! let lines: Vec<String> = fits_template(&file, &config.template).unwrap().collect();
//! assert_eq!(lines.last().map(String::as_str), Some("END"));
//! assert!(lines.iter().any(|l| l.starts_with("TTYPE#") && l.contains("energy")));
//! assert!(lines.iter().any(|l| l.starts_with("TFORM#") && l.contains('E')));
//! ```

mod config;
mod diagram;
mod dispatch;
mod error;
mod numbering;
mod template;
mod write;

pub use config::{DiagramOptions, RenderConfig, TemplateOptions};
pub use diagram::{class_dispatcher, plantuml, relation_dispatcher};
pub use dispatch::{Dispatcher, Lines, RenderFn};
pub use error::{RenderError, Result};
pub use numbering::{COLUMN_KEYWORDS, COLUMN_PLACEHOLDER, NumberColumns, number_columns};
pub use template::{fits_template, template_dispatcher};
pub use write::{template_lines, write_diagram, write_fits_template, write_lines, write_to};
