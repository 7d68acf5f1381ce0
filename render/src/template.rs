//! FITS template renderer.
//!
//! Turns a schema tree into header-card text, one card per line:
//!
//! ```text
//! OBS_ID  =                      / Observation identifier (int64)
//! HIERARCH GEOLONGITUDE = 12.5                 / Earth longitude [deg] (float64)
//! TTYPE#  = 'energy'             / Reconstructed energy
//! TFORM#  = 'E'                  / float32
//! ```
//!
//! Column cards carry a `#` placeholder instead of the column number; see
//! [`number_columns`](crate::number_columns) for the substitution pass.
//! Absent optional attributes omit their card entirely.

use std::any::Any;
use std::sync::LazyLock;

use fits_schema_core::{
    Column, ColumnEntry, ColumnGroup, DataType, Extension, FitsFile, Header, HeaderEntry,
    HeaderGroup, SchemaNode, TableExtension, is_long_key,
};

use crate::config::TemplateOptions;
use crate::dispatch::{Dispatcher, Lines, concat, deferred};
use crate::error::Result;

/// Longest string chunk per card when a value is continued.
const STRING_CHUNK: usize = 67;

/// Prefix for wrapped banner text.
const INDENT: &str = "/    ";

static TEMPLATE: LazyLock<Dispatcher<TemplateOptions>> = LazyLock::new(|| {
    Dispatcher::new("fits_template")
        .with::<Header>(render_header)
        .with::<HeaderGroup>(render_header_group)
        .with::<Column>(render_column)
        .with::<ColumnGroup>(render_column_group)
        .with::<Extension>(render_extension)
        .with::<TableExtension>(render_table)
        .with::<FitsFile>(render_file)
});

/// The dispatcher behind [`fits_template`].
pub fn template_dispatcher() -> &'static Dispatcher<TemplateOptions> {
    &TEMPLATE
}

/// Renders any schema node as FITS template lines.
///
/// # Errors
///
/// Returns [`RenderError::NoRenderer`](crate::RenderError::NoRenderer) if
/// `T` is not a schema node type.
///
/// # Examples
///
/// ```
/// use fits_schema_core::*;
/// use fits_schema_render::{TemplateOptions, fits_template};
///
/// let hdr = Header::new("geo_lon", "GEOLON", "Earth longitude")
///     .unwrap()
///     .with_unit("deg")
///     .unwrap()
///     .with_dtype(DataType::Float64);
///
/// let opts = TemplateOptions::default();
/// let lines: Vec<String> = fits_template(&hdr, &opts).unwrap().collect();
/// assert_eq!(lines, vec!["GEOLON  =                      / Earth longitude [deg] (float64)"]);
/// ```
pub fn fits_template<'a, T: Any>(node: &'a T, options: &'a TemplateOptions) -> Result<Lines<'a>> {
    TEMPLATE.render(node, options)
}

fn rule(fill: char, width: usize) -> String {
    let mut line = String::from("/ ");
    line.extend(std::iter::repeat_n(fill, width));
    line
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Joins multi-line text (YAML block scalars) into one line.
fn one_line(text: &str) -> String {
    if !text.contains(['\n', '\r']) {
        return text.to_string();
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Greedy word wrap behind the banner prefix. `width` includes the prefix.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let base = INDENT.chars().count();
    let mut lines = Vec::new();
    let mut current = String::from(INDENT);
    let mut used = base;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if used > base && used + 1 + len > width {
            lines.push(std::mem::replace(&mut current, String::from(INDENT)));
            used = base;
        }
        if used > base {
            current.push(' ');
            used += 1;
        }
        current.push_str(word);
        used += len;
    }
    if used > base {
        lines.push(current);
    }
    lines
}

fn with_comment(mut line: String, comment: &str) -> String {
    if !comment.is_empty() {
        line.push_str(" / ");
        line.push_str(&one_line(comment));
    }
    line.truncate(line.trim_end().len());
    line
}

/// One `KEY = value / comment` card; keys over eight characters use the
/// `HIERARCH` convention.
fn card(key: &str, value: &str, comment: &str) -> String {
    let value = one_line(value);
    let line = if is_long_key(key) {
        format!("HIERARCH {key} = {value:<20}")
    } else {
        format!("{key:<8}= {value:<20}")
    };
    with_comment(line, comment)
}

/// A quoted string card, continued over `CONTINUE` cards when too long.
/// The comment goes on the last card.
fn string_cards(key: &str, value: &str, comment: &str) -> Vec<String> {
    let value = one_line(value);
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= STRING_CHUNK {
        return vec![card(key, &quote(&value), comment)];
    }
    let chunks: Vec<String> = chars
        .chunks(STRING_CHUNK)
        .map(|c| c.iter().collect())
        .collect();
    let last = chunks.len() - 1;
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let (text, comment) = if i == last {
                (quote(chunk), comment)
            } else {
                (quote(&format!("{chunk}&")), "")
            };
            if i == 0 {
                card(key, &text, comment)
            } else {
                with_comment(format!("CONTINUE  {text}"), comment)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

fn header_comment(hdr: &Header, opts: &TemplateOptions) -> String {
    let mut comment = truncate(&one_line(hdr.description()), opts.header_comment_width);
    if let Some(unit) = hdr.unit() {
        comment.push_str(&format!(" [{unit}]"));
    }
    if let Some(dtype) = hdr.dtype() {
        comment.push_str(&format!(" ({dtype})"));
    }
    if !hdr.allowed_values().is_empty() {
        comment.push_str(&format!(" (one of: {})", hdr.allowed_values().join(", ")));
    }
    if !hdr.required() {
        comment.push_str(" (OPTIONAL)");
    }
    comment
}

fn header_cards(hdr: &Header, opts: &TemplateOptions) -> Vec<String> {
    let comment = header_comment(hdr, opts);
    let numeric = hdr.dtype().is_some_and(DataType::is_numeric);
    match hdr.value() {
        Some(value) if !numeric => string_cards(hdr.fits_key(), value, &comment),
        Some(value) => vec![card(hdr.fits_key(), value, &comment)],
        None => vec![card(hdr.fits_key(), "", &comment)],
    }
}

fn render_header<'a>(
    _: &Dispatcher<TemplateOptions>,
    hdr: &'a Header,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    Ok(deferred(move || header_cards(hdr, opts)))
}

fn render_header_group<'a>(
    d: &Dispatcher<TemplateOptions>,
    group: &'a HeaderGroup,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || {
        let mut lines = vec![String::new(), rule('=', 78)];
        lines.extend(wrap(group.description(), opts.wrap_width));
        lines.push(rule('=', 78));
        lines
    })];
    for header in group.headers() {
        parts.push(d.render(header, opts)?);
    }
    Ok(concat(parts))
}

fn render_header_entries<'a>(
    d: &Dispatcher<TemplateOptions>,
    entries: &'a [HeaderEntry],
    opts: &'a TemplateOptions,
) -> Result<Vec<Lines<'a>>> {
    entries
        .iter()
        .map(|entry| match entry {
            HeaderEntry::Header(hdr) => d.render(hdr, opts),
            HeaderEntry::Group(group) => d.render(group, opts),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

fn column_cards(col: &Column, opts: &TemplateOptions) -> Vec<String> {
    let mut description = one_line(col.description());
    if !col.required() {
        description.push_str(" (OPTIONAL)");
    }
    let code = col.dtype().fits_code().unwrap_or_default();

    let mut lines = vec![
        card(
            "TTYPE#",
            &quote(col.name()),
            &truncate(&description, opts.column_comment_width),
        ),
        card("TFORM#", &quote(code), col.dtype().as_str()),
    ];
    if let Some(unit) = col.unit() {
        let comment = unit
            .physical_type()
            .map(|t| format!("or convertible to '{t}'"))
            .unwrap_or_default();
        lines.push(card("TUNIT#", &quote(&unit.to_fits_string()), &comment));
    }
    if let Some(ucd) = col.ucd() {
        lines.push(card("TUCD#", &quote(ucd), ""));
    }
    if col.ndims() > 0 {
        lines.push(card(
            "TDIM#",
            &col.ndims().to_string(),
            &format!("{}-dimensional array values", col.ndims()),
        ));
    }
    if let Some(format) = col.format() {
        lines.push(card("TDISP#", &quote(format), "display format"));
    }
    lines.push(String::new());
    lines
}

fn render_column<'a>(
    _: &Dispatcher<TemplateOptions>,
    col: &'a Column,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    Ok(deferred(move || column_cards(col, opts)))
}

fn render_column_group<'a>(
    d: &Dispatcher<TemplateOptions>,
    group: &'a ColumnGroup,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || {
        let mut lines = vec![String::new(), rule('-', 60)];
        lines.extend(wrap(group.description(), opts.wrap_width));
        lines.push(rule('-', 60));
        lines
    })];
    for col in group.columns() {
        parts.push(d.render(col, opts)?);
    }
    Ok(concat(parts))
}

fn render_column_entries<'a>(
    d: &Dispatcher<TemplateOptions>,
    entries: &'a [ColumnEntry],
    opts: &'a TemplateOptions,
) -> Result<Vec<Lines<'a>>> {
    entries
        .iter()
        .map(|entry| match entry {
            ColumnEntry::Column(col) => d.render(col, opts),
            ColumnEntry::Group(group) => d.render(group, opts),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Extensions and files
// ---------------------------------------------------------------------------

fn extension_preamble(ext: &Extension, opts: &TemplateOptions) -> Vec<String> {
    let mut lines = vec![
        rule('#', 78),
        format!("/ HDU: {}", ext.name()),
        "/ DESCRIPTION:".to_string(),
    ];
    lines.extend(wrap(ext.description(), opts.wrap_width));
    lines.push(rule('#', 78));

    lines.push(card("XTENSION", &quote("BINTABLE"), "binary table extension"));
    lines.push(card("EXTNAME", &quote(ext.name()), "extension name"));
    lines.push(card("EXTVER", &ext.version().to_string(), "extension version"));
    lines.extend(string_cards("HDUDOC", ext.description(), "extension documentation"));
    lines.push(card("HDUVERS", &quote(ext.datamodel()), "data model version"));

    let class = ext.classification();
    if let Some(name) = class.class_name() {
        lines.push(card("HDUCLASS", &quote(name), "classification standard"));
    }
    for level in 1..=4 {
        if let Some(sub) = class.subclass(level) {
            lines.push(card(
                &format!("HDUCLAS{level}"),
                &quote(sub),
                &format!("classification level {level}"),
            ));
        }
    }
    lines
}

fn render_extension<'a>(
    d: &Dispatcher<TemplateOptions>,
    ext: &'a Extension,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || extension_preamble(ext, opts))];
    parts.extend(render_header_entries(d, ext.headers(), opts)?);
    Ok(concat(parts))
}

fn render_table<'a>(
    d: &Dispatcher<TemplateOptions>,
    table: &'a TableExtension,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![
        d.render(table.extension(), opts)?,
        deferred(|| {
            vec![
                String::new(),
                rule('=', 78),
                "/ Table Columns".to_string(),
                rule('=', 78),
            ]
        }),
    ];
    parts.extend(render_column_entries(d, table.columns(), opts)?);
    Ok(concat(parts))
}

fn file_preamble(file: &FitsFile, opts: &TemplateOptions) -> Vec<String> {
    let mut lines = vec![rule('*', 78), format!("/ FITS FILE: {}", file.name())];
    lines.extend(wrap(file.description(), opts.wrap_width));
    lines.push("/".to_string());
    lines.push("/ EXTENSIONS SUMMARY:".to_string());
    for (i, table) in file.extensions().iter().enumerate() {
        let ext = table.extension();
        lines.push(format!(
            "/  {:3}. {:<20} v{} [{}]",
            i + 1,
            ext.name(),
            ext.version(),
            ext.class_hierarchy().join(", ")
        ));
    }
    lines.push(rule('*', 78));
    lines.push(String::new());
    lines
}

fn render_file<'a>(
    d: &Dispatcher<TemplateOptions>,
    file: &'a FitsFile,
    opts: &'a TemplateOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || file_preamble(file, opts))];
    for table in file.extensions() {
        parts.push(d.render(table, opts)?);
    }
    parts.push(Box::new(std::iter::once("END".to_string())));
    Ok(concat(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Any>(node: &T) -> Vec<String> {
        fits_template(node, &TemplateOptions::default())
            .unwrap()
            .collect()
    }

    #[test]
    fn test_short_key_is_padded_to_eight() {
        let hdr = Header::new("obs_id", "obs_id", "Observation identifier")
            .unwrap()
            .with_dtype(DataType::Int64)
            .with_value("42");
        let lines = render(&hdr);
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][..8], "OBS_ID  ");
        assert_eq!(&lines[0][8..9], "=");
        assert_eq!(
            lines[0],
            "OBS_ID  = 42                   / Observation identifier (int64)"
        );
    }

    #[test]
    fn test_long_key_uses_hierarch() {
        let hdr = Header::new("geo_lon", "geolongitude", "Earth longitude").unwrap();
        let lines = render(&hdr);
        assert!(lines[0].starts_with("HIERARCH GEOLONGITUDE = "));
    }

    #[test]
    fn test_header_comment_suffixes() {
        let hdr = Header::new("obs_mode", "OBS_MODE", "Observation mode")
            .unwrap()
            .with_dtype(DataType::Char)
            .with_allowed_values(["POINTING", "DRIFT"])
            .optional();
        assert_eq!(
            render(&hdr)[0],
            "OBS_MODE=                      / Observation mode (char) (one of: POINTING, DRIFT) (OPTIONAL)"
        );
    }

    #[test]
    fn test_string_values_are_quoted_and_escaped() {
        let hdr = Header::new("observer", "OBSERVER", "Who")
            .unwrap()
            .with_value("O'Brien");
        assert_eq!(render(&hdr)[0], "OBSERVER= 'O''Brien'           / Who");
    }

    #[test]
    fn test_long_value_is_continued() {
        let long = "x".repeat(150);
        let lines = string_cards("HDUDOC", &long, "doc");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("HDUDOC  = 'xxx"));
        assert!(lines[0].ends_with("&'"));
        assert!(lines[1].starts_with("CONTINUE  '"));
        assert!(lines[1].ends_with("&'"));
        assert!(lines[2].starts_with("CONTINUE  '"));
        assert!(lines[2].ends_with("' / doc"));
        let total: usize = lines.iter().map(|l| l.matches('x').count()).sum();
        assert_eq!(total, 150);
    }

    #[test]
    fn test_multiline_text_stays_on_one_card() {
        let hdr = Header::new("creator", "CREATOR", "Software that\nwrote the file\n")
            .unwrap()
            .with_value("gammapy\n1.2");
        assert_eq!(
            render(&hdr),
            vec!["CREATOR = 'gammapy 1.2'        / Software that wrote the file"]
        );

        let col = Column::new("time", "arrival\r\ntime", DataType::Float64).unwrap();
        assert_eq!(render(&col)[0], "TTYPE#  = 'time'               / arrival time");
    }

    #[test]
    fn test_header_description_truncated() {
        let hdr = Header::new("a", "A", &"d".repeat(80)).unwrap();
        let opts = TemplateOptions {
            header_comment_width: 10,
            ..TemplateOptions::default()
        };
        let lines: Vec<_> = fits_template(&hdr, &opts).unwrap().collect();
        assert!(lines[0].ends_with(&format!("/ {}", "d".repeat(10))));
    }

    #[test]
    fn test_column_minimal_cards() {
        let col = Column::new("time", "arrival time", DataType::Float64).unwrap();
        let lines = render(&col);
        assert_eq!(
            lines,
            vec![
                "TTYPE#  = 'time'               / arrival time",
                "TFORM#  = 'D'                  / float64",
                "",
            ]
        );
    }

    #[test]
    fn test_column_full_cards() {
        let col = Column::new("direction", "pointing", DataType::Float32)
            .unwrap()
            .with_unit("deg")
            .unwrap()
            .with_ucd("pos.eq.ra")
            .unwrap()
            .with_ndims(2)
            .with_format("F8.3")
            .optional();
        let lines = render(&col);
        assert_eq!(lines[0], "TTYPE#  = 'direction'          / pointing (OPTIONAL)");
        assert_eq!(lines[2], "TUNIT#  = 'deg'                / or convertible to 'angle'");
        assert_eq!(lines[3], "TUCD#   = 'pos.eq.ra'");
        assert_eq!(lines[4], "TDIM#   = 2                    / 2-dimensional array values");
        assert_eq!(lines[5], "TDISP#  = 'F8.3'               / display format");
        assert_eq!(lines[6], "");
    }

    #[test]
    fn test_column_comment_truncated() {
        let col = Column::new("a", &"w".repeat(100), DataType::Int16).unwrap();
        let lines = render(&col);
        assert!(lines[0].ends_with(&format!("/ {}", "w".repeat(70))));
    }

    #[test]
    fn test_group_banners() {
        let group = ColumnGroup::new("fov", "Field of view")
            .unwrap()
            .with_column(Column::new("fov_lon", "lon", DataType::Float64).unwrap());
        let lines = render(&group);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], rule('-', 60));
        assert_eq!(lines[2], "/    Field of view");
        assert_eq!(lines[3], rule('-', 60));
        assert!(lines[4].starts_with("TTYPE#"));
    }

    #[test]
    fn test_classification_cards_only_when_set() {
        let ext = Extension::new("EVENTS", "Event list", "VODF-test")
            .unwrap()
            .with_class_hierarchy(["OGIP", "EVENTS"])
            .unwrap();
        let lines = render(&ext);
        assert!(lines.iter().any(|l| l.starts_with("HDUCLASS= 'OGIP'")));
        assert!(lines.iter().any(|l| l.starts_with("HDUCLAS1= 'EVENTS'")));
        assert!(!lines.iter().any(|l| l.starts_with("HDUCLAS2")));
        assert!(lines.iter().any(|l| l.starts_with("HDUVERS = 'VODF-test'")));
        assert!(lines.iter().any(|l| l.starts_with("XTENSION= 'BINTABLE'")));
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";
        let lines = wrap(text, 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert!(lines.iter().all(|l| l.starts_with(INDENT)));
        let words: Vec<&str> = lines
            .iter()
            .flat_map(|l| l.trim_start_matches('/').split_whitespace())
            .collect();
        assert_eq!(words.join(" "), text);
    }
}
