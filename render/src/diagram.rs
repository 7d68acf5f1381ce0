//! PlantUML class diagram renderer.
//!
//! A diagram is produced by two independent walks over the same tree: the
//! class pass declares one class per node, the relationship pass links every
//! container to its children. Group and extension children are drawn with
//! aggregation (`o--`), header and column children with composition (`*--`).

use std::any::Any;
use std::collections::HashSet;
use std::sync::LazyLock;

use fits_schema_core::{
    Column, ColumnEntry, ColumnGroup, Extension, FitsFile, Header, HeaderEntry, HeaderGroup,
    SchemaNode, TableExtension,
};
use tracing::warn;

use crate::config::DiagramOptions;
use crate::dispatch::{Dispatcher, Lines, concat, deferred};
use crate::error::Result;

const PREAMBLE: [&str; 3] = [
    "@startuml",
    "skinparam  wrapWidth 200",
    "skinparam defaultFontName Helvetica",
];

static CLASS_PASS: LazyLock<Dispatcher<DiagramOptions>> = LazyLock::new(|| {
    Dispatcher::new("plantuml_class")
        .with::<Header>(leaf_class)
        .with::<Column>(leaf_class)
        .with::<HeaderGroup>(header_group_class)
        .with::<ColumnGroup>(column_group_class)
        .with::<Extension>(extension_class)
        .with::<TableExtension>(table_class)
        .with::<FitsFile>(file_class)
});

static RELATION_PASS: LazyLock<Dispatcher<DiagramOptions>> = LazyLock::new(|| {
    Dispatcher::new("plantuml_relationship")
        .with::<Header>(no_relations)
        .with::<Column>(no_relations)
        .with::<HeaderGroup>(header_group_relations)
        .with::<ColumnGroup>(column_group_relations)
        .with::<Extension>(extension_relations)
        .with::<TableExtension>(table_relations)
        .with::<FitsFile>(file_relations)
});

/// Dispatcher for the class-declaration pass.
pub fn class_dispatcher() -> &'static Dispatcher<DiagramOptions> {
    &CLASS_PASS
}

/// Dispatcher for the relationship pass.
pub fn relation_dispatcher() -> &'static Dispatcher<DiagramOptions> {
    &RELATION_PASS
}

/// Renders a complete PlantUML document for `node`.
///
/// # Errors
///
/// Returns [`RenderError::NoRenderer`](crate::RenderError::NoRenderer) if
/// either pass has no handler for a node type in the tree.
///
/// # Examples
///
/// ```
/// use fits_schema_core::*;
/// use fits_schema_render::{DiagramOptions, plantuml};
///
/// let table = TableExtension::new("EVENTS", "Event list", "VODF-0.1.0")
///     .unwrap()
///     .with_column(Column::new("energy", "energy", DataType::Float32).unwrap());
///
/// let opts = DiagramOptions::default();
/// let lines: Vec<String> = plantuml(&table, &opts).unwrap().collect();
/// assert_eq!(lines.first().map(String::as_str), Some("@startuml"));
/// assert!(lines.contains(&"class energy <<Column>> {".to_string()));
/// assert!(lines.contains(&"EVENTS *-- energy".to_string()));
/// assert_eq!(lines.last().map(String::as_str), Some("@enduml"));
/// ```
pub fn plantuml<'a, T: Any>(node: &'a T, options: &'a DiagramOptions) -> Result<Lines<'a>> {
    let classes = CLASS_PASS.render(node, options)?;
    let relations = RELATION_PASS.render(node, options)?;
    Ok(Box::new(
        PREAMBLE
            .into_iter()
            .map(String::from)
            .chain(classes)
            .chain(relations)
            .chain(std::iter::once("@enduml".to_string())),
    ))
}

// ---------------------------------------------------------------------------
// Class pass
// ---------------------------------------------------------------------------

fn class_lines(node: &dyn SchemaNode, opts: &DiagramOptions) -> Vec<String> {
    let attributes = if opts.verbose {
        node.attributes()
    } else {
        node.summary_attributes()
    };
    let head = format!("class {} <<{}>>", node.name(), node.kind());
    if attributes.is_empty() {
        return vec![head];
    }
    let mut lines = vec![format!("{head} {{")];
    lines.extend(
        attributes
            .into_iter()
            .map(|(key, value)| format!("    + **{key}** = {value}")),
    );
    lines.push("}".to_string());
    lines
}

fn leaf_class<'a, T: SchemaNode>(
    _: &Dispatcher<DiagramOptions>,
    node: &'a T,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    Ok(deferred(move || class_lines(node, opts)))
}

fn header_entry_classes<'a>(
    d: &Dispatcher<DiagramOptions>,
    entries: &'a [HeaderEntry],
    opts: &'a DiagramOptions,
) -> Result<Vec<Lines<'a>>> {
    entries
        .iter()
        .map(|entry| match entry {
            HeaderEntry::Header(hdr) => d.render(hdr, opts),
            HeaderEntry::Group(group) => d.render(group, opts),
        })
        .collect()
}

fn column_entry_classes<'a>(
    d: &Dispatcher<DiagramOptions>,
    entries: &'a [ColumnEntry],
    opts: &'a DiagramOptions,
) -> Result<Vec<Lines<'a>>> {
    entries
        .iter()
        .map(|entry| match entry {
            ColumnEntry::Column(col) => d.render(col, opts),
            ColumnEntry::Group(group) => d.render(group, opts),
        })
        .collect()
}

fn header_group_class<'a>(
    d: &Dispatcher<DiagramOptions>,
    group: &'a HeaderGroup,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || class_lines(group, opts))];
    for hdr in group.headers() {
        parts.push(d.render(hdr, opts)?);
    }
    Ok(concat(parts))
}

fn column_group_class<'a>(
    d: &Dispatcher<DiagramOptions>,
    group: &'a ColumnGroup,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || class_lines(group, opts))];
    for col in group.columns() {
        parts.push(d.render(col, opts)?);
    }
    Ok(concat(parts))
}

fn extension_class<'a>(
    d: &Dispatcher<DiagramOptions>,
    ext: &'a Extension,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || class_lines(ext, opts))];
    parts.extend(header_entry_classes(d, ext.headers(), opts)?);
    Ok(concat(parts))
}

fn table_class<'a>(
    d: &Dispatcher<DiagramOptions>,
    table: &'a TableExtension,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || class_lines(table, opts))];
    parts.extend(header_entry_classes(d, table.extension().headers(), opts)?);
    parts.extend(column_entry_classes(d, table.columns(), opts)?);
    Ok(concat(parts))
}

fn file_class<'a>(
    d: &Dispatcher<DiagramOptions>,
    file: &'a FitsFile,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    let mut parts = vec![deferred(move || class_lines(file, opts))];
    for table in file.extensions() {
        parts.push(d.render(table, opts)?);
    }
    Ok(concat(parts))
}

// ---------------------------------------------------------------------------
// Relationship pass
// ---------------------------------------------------------------------------

fn relation(parent: &str, child: &dyn SchemaNode) -> String {
    let arrow = if child.kind().is_leaf() { "*--" } else { "o--" };
    format!("{parent} {arrow} {}", child.name())
}

/// Warns about repeated names among `names`, given sibling names already
/// checked in `known`.
fn warn_duplicates<'n>(
    parent: &str,
    known: impl IntoIterator<Item = &'n str>,
    names: impl IntoIterator<Item = &'n str>,
) {
    let mut seen: HashSet<&str> = known.into_iter().collect();
    for name in names {
        if !seen.insert(name) {
            warn!(
                parent = parent,
                child = name,
                "Duplicate sibling name, diagram relations are ambiguous"
            );
        }
    }
}

fn no_relations<'a, T>(
    _: &Dispatcher<DiagramOptions>,
    _: &'a T,
    _: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    Ok(Box::new(std::iter::empty()))
}

fn header_group_relations<'a>(
    _: &Dispatcher<DiagramOptions>,
    group: &'a HeaderGroup,
    _: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    warn_duplicates(group.name(), [], group.headers().iter().map(|h| h.name()));
    Ok(Box::new(
        group.headers().iter().map(move |hdr| relation(group.name(), hdr)),
    ))
}

fn column_group_relations<'a>(
    _: &Dispatcher<DiagramOptions>,
    group: &'a ColumnGroup,
    _: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    warn_duplicates(group.name(), [], group.columns().iter().map(|c| c.name()));
    Ok(Box::new(
        group.columns().iter().map(move |col| relation(group.name(), col)),
    ))
}

fn extension_relations<'a>(
    d: &Dispatcher<DiagramOptions>,
    ext: &'a Extension,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    warn_duplicates(ext.name(), [], ext.headers().iter().map(|e| e.as_node().name()));
    let mut parts: Vec<Lines<'a>> = Vec::new();
    for entry in ext.headers() {
        parts.push(Box::new(std::iter::once_with(move || {
            relation(ext.name(), entry.as_node())
        })));
        if let HeaderEntry::Group(group) = entry {
            parts.push(d.render(group, opts)?);
        }
    }
    Ok(concat(parts))
}

fn table_relations<'a>(
    d: &Dispatcher<DiagramOptions>,
    table: &'a TableExtension,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    let headers = table.extension().headers();
    warn_duplicates(
        table.name(),
        headers.iter().map(|e| e.as_node().name()),
        table.columns().iter().map(|e| e.as_node().name()),
    );
    // Header links come from the Extension handler; both share the same name.
    let mut parts = vec![d.render(table.extension(), opts)?];
    for entry in table.columns() {
        parts.push(Box::new(std::iter::once_with(move || {
            relation(table.name(), entry.as_node())
        })));
        if let ColumnEntry::Group(group) = entry {
            parts.push(d.render(group, opts)?);
        }
    }
    Ok(concat(parts))
}

fn file_relations<'a>(
    d: &Dispatcher<DiagramOptions>,
    file: &'a FitsFile,
    opts: &'a DiagramOptions,
) -> Result<Lines<'a>> {
    warn_duplicates(file.name(), [], file.extensions().iter().map(|t| t.name()));
    let mut parts: Vec<Lines<'a>> = Vec::new();
    for table in file.extensions() {
        parts.push(Box::new(std::iter::once_with(move || {
            relation(file.name(), table)
        })));
        parts.push(d.render(table, opts)?);
    }
    Ok(concat(parts))
}
