//! Writing rendered artifacts.
//!
//! Files are written through a temporary file in the destination directory
//! and only moved into place once every line was written. Rendering happens
//! before the temporary file is created, so a dispatch error never touches
//! the filesystem.

use std::any::Any;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::config::RenderConfig;
use crate::diagram::plantuml;
use crate::dispatch::Lines;
use crate::error::Result;
use crate::numbering::number_columns;
use crate::template::fits_template;

/// Streams `lines` into `writer`, one line per `\n`. Returns the number of
/// lines written.
pub fn write_to<I, W>(lines: I, writer: W) -> Result<usize>
where
    I: IntoIterator<Item = String>,
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    let mut count = 0;
    for line in lines {
        writeln!(writer, "{line}")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Writes `lines` to `path`, replacing any existing file only on success.
///
/// # Errors
///
/// Returns [`Io`](crate::RenderError::Io) if the temporary file cannot be
/// created or written, or [`Persist`](crate::RenderError::Persist) if it
/// cannot be moved to `path`. In both cases `path` is left untouched.
pub fn write_lines<I>(lines: I, path: impl AsRef<Path>) -> Result<usize>
where
    I: IntoIterator<Item = String>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    let count = write_to(lines, file.as_file_mut())?;
    file.persist(path)?;
    info!(path = %path.display(), lines = count, "Wrote artifact");
    Ok(count)
}

/// Renders the FITS template for `node`, numbering columns when the
/// configuration asks for it.
pub fn template_lines<'a, T: Any>(node: &'a T, config: &'a RenderConfig) -> Result<Lines<'a>> {
    let lines = fits_template(node, &config.template)?;
    if config.number_columns {
        Ok(Box::new(number_columns(lines, config.column_index_base)))
    } else {
        Ok(lines)
    }
}

/// Renders `node` as a FITS template and writes it to `path`.
///
/// # Examples
///
/// ```no_run
/// use fits_schema_core::FitsFile;
/// use fits_schema_render::{RenderConfig, write_fits_template};
///
/// let file = FitsFile::new("events", "DL3 event file").unwrap();
/// write_fits_template(&file, "events.tpl", &RenderConfig::default()).unwrap();
/// ```
pub fn write_fits_template<T: Any>(
    node: &T,
    path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<usize> {
    write_lines(template_lines(node, config)?, path)
}

/// Renders `node` as a PlantUML diagram and writes it to `path`.
pub fn write_diagram<T: Any>(
    node: &T,
    path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<usize> {
    write_lines(plantuml(node, &config.diagram)?, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RenderError;

    #[test]
    fn test_write_to_appends_newlines() {
        let mut buf = Vec::new();
        let count = write_to(vec!["a".to_string(), String::new(), "b".to_string()], &mut buf).unwrap();
        assert_eq!(count, 3);
        assert_eq!(String::from_utf8(buf).unwrap(), "a\n\nb\n");
    }

    #[test]
    fn test_write_lines_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tpl");
        std::fs::write(&path, "old").unwrap();
        write_lines(vec!["END".to_string()], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "END\n");
    }

    #[test]
    fn test_missing_directory_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.tpl");
        let err = write_lines(vec!["END".to_string()], &path).unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_unregistered_type_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tpl");
        let err = write_fits_template(&"not a node", &path, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::NoRenderer { .. }));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
