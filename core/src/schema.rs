//! Schema meta-model: headers, columns, their groups, extensions and files.
//!
//! Nodes are validated when constructed and expose no mutation afterwards.
//! Builder methods take `self` by value, so a node is only ever observable in
//! its final state. Containers own their children exclusively; the tree has no
//! shared or cyclic references.
//!
//! Heterogeneous child lists are modeled as sum types ([`HeaderEntry`],
//! [`ColumnEntry`]) rather than trait objects, so renderers match on the
//! variant to pick a handler.
//!
//! # Example
//!
//! ```
//! use fits_schema_core::*;
//!
//! let energy = Column::new("energy", "reconstructed energy", DataType::Float32)
//!     .unwrap()
//!     .with_unit("TeV")
//!     .unwrap()
//!     .with_ucd("phys.energy")
//!     .unwrap();
//!
//! let events = TableExtension::new("EVENTS", "Event list", "VODF-0.1.0")
//!     .unwrap()
//!     .with_column(energy);
//!
//! let file = FitsFile::new("event_file", "A DL3 event file")
//!     .unwrap()
//!     .with_extension(events);
//!
//! assert_eq!(file.extensions()[0].columns_flat().count(), 1);
//! ```

use std::any::Any;
use std::fmt;

use crate::ucd::validate_ucd;
use crate::units::Unit;
use crate::validate::{
    Result, SchemaError, normalize_fits_key, validate_description, validate_identifier,
};
use crate::{DataType, Origin};

/// Concrete node types of the meta-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Header,
    HeaderGroup,
    Column,
    ColumnGroup,
    Extension,
    TableExtension,
    FitsFile,
}

impl NodeKind {
    /// Type name used in diagrams and extension summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Header => "Header",
            NodeKind::HeaderGroup => "HeaderGroup",
            NodeKind::Column => "Column",
            NodeKind::ColumnGroup => "ColumnGroup",
            NodeKind::Extension => "Extension",
            NodeKind::TableExtension => "TableExtension",
            NodeKind::FitsFile => "FITSFile",
        }
    }

    /// Returns `true` for header and column descriptors.
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Header | NodeKind::Column)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity shared by every node: name, description and whether the element
/// is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    name: String,
    description: String,
    required: bool,
}

impl SchemaElement {
    /// Validates `name` against the identifier pattern and rejects an empty
    /// description. `required` defaults to `true`.
    pub fn new(name: &str, description: &str) -> Result<Self> {
        let name = validate_identifier(name)?;
        let description = validate_description(&name, description)?;
        Ok(Self {
            name,
            description,
            required: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

/// Behavior common to every node type.
///
/// Renderers dispatch on the concrete type (through [`Any`]); this trait only
/// exposes the shared identity and attribute listings.
pub trait SchemaNode: Any + fmt::Debug + Send + Sync {
    /// Shared name/description/required identity.
    fn element(&self) -> &SchemaElement;

    /// Concrete node type.
    fn kind(&self) -> NodeKind;

    /// Every non-empty scalar attribute except the name, in a stable order.
    fn attributes(&self) -> Vec<(&'static str, String)>;

    /// The attributes that identify this node at a glance.
    fn summary_attributes(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn name(&self) -> &str {
        self.element().name()
    }

    fn description(&self) -> &str {
        self.element().description()
    }

    fn required(&self) -> bool {
        self.element().required()
    }
}

fn base_attributes(element: &SchemaElement) -> Vec<(&'static str, String)> {
    vec![
        ("description", element.description.clone()),
        ("required", element.required.to_string()),
    ]
}

macro_rules! builder_common {
    () => {
        /// Marks the element as optional.
        pub fn optional(mut self) -> Self {
            self.element.required = false;
            self
        }

        /// Sets whether the element is mandatory.
        pub fn with_required(mut self, required: bool) -> Self {
            self.element.required = required;
            self
        }
    };
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// A metadata key/value descriptor.
///
/// # Examples
///
/// ```
/// use fits_schema_core::*;
///
/// let hdr = Header::new("geo_lon", "geolon", "Earth longitude")
///     .unwrap()
///     .with_unit("degree")
///     .unwrap()
///     .with_origin(Origin::Vodf)
///     .optional();
///
/// assert_eq!(hdr.fits_key(), "GEOLON");
/// assert_eq!(hdr.unit().unwrap().to_string(), "deg");
/// assert!(!hdr.required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    element: SchemaElement,
    fits_key: String,
    dtype: Option<DataType>,
    unit: Option<Unit>,
    value: Option<String>,
    allowed_values: Vec<String>,
    origin: Option<Origin>,
    ivoa_key: Option<String>,
}

impl Header {
    /// Creates a header; the FITS key is normalized to uppercase.
    ///
    /// # Errors
    ///
    /// Fails on an invalid name, FITS key or empty description.
    pub fn new(name: &str, fits_key: &str, description: &str) -> Result<Self> {
        Ok(Self {
            element: SchemaElement::new(name, description)?,
            fits_key: normalize_fits_key(fits_key)?,
            dtype: None,
            unit: None,
            value: None,
            allowed_values: Vec::new(),
            origin: None,
            ivoa_key: None,
        })
    }

    builder_common!();

    /// Sets the value type.
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = match dtype {
            DataType::None => None,
            other => Some(other),
        };
        self
    }

    /// Sets the unit, normalizing it to canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidUnit`] for unrecognized units.
    pub fn with_unit(mut self, unit: &str) -> Result<Self> {
        self.unit = Some(Unit::parse(unit)?);
        Ok(self)
    }

    /// Sets a fixed or default value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Restricts the header to the listed literal values.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Records which standard defines the keyword.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the IVOA cross-reference identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidIdentifier`] if the key does not match
    /// the identifier pattern.
    pub fn with_ivoa_key(mut self, key: &str) -> Result<Self> {
        self.ivoa_key = Some(validate_identifier(key)?);
        Ok(self)
    }

    /// Uppercase FITS keyword.
    pub fn fits_key(&self) -> &str {
        &self.fits_key
    }

    pub fn dtype(&self) -> Option<DataType> {
        self.dtype
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    pub fn ivoa_key(&self) -> Option<&str> {
        self.ivoa_key.as_deref()
    }
}

impl SchemaNode for Header {
    fn element(&self) -> &SchemaElement {
        &self.element
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Header
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = base_attributes(&self.element);
        attrs.push(("fits_key", self.fits_key.clone()));
        if let Some(dtype) = self.dtype {
            attrs.push(("dtype", dtype.to_string()));
        }
        if let Some(unit) = &self.unit {
            attrs.push(("unit", unit.to_string()));
        }
        if let Some(origin) = self.origin {
            attrs.push(("origin", origin.to_string()));
        }
        if let Some(value) = &self.value {
            attrs.push(("value", value.clone()));
        }
        if !self.allowed_values.is_empty() {
            attrs.push(("allowed_values", self.allowed_values.join(", ")));
        }
        if let Some(key) = &self.ivoa_key {
            attrs.push(("ivoa_key", key.clone()));
        }
        attrs
    }

    fn summary_attributes(&self) -> Vec<(&'static str, String)> {
        vec![("fits_key", self.fits_key.clone())]
    }
}

/// Headers sharing one description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderGroup {
    element: SchemaElement,
    headers: Vec<Header>,
}

impl HeaderGroup {
    pub fn new(name: &str, description: &str) -> Result<Self> {
        Ok(Self {
            element: SchemaElement::new(name, description)?,
            headers: Vec::new(),
        })
    }

    builder_common!();

    /// Appends a header.
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Appends several headers in order.
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }
}

impl SchemaNode for HeaderGroup {
    fn element(&self) -> &SchemaElement {
        &self.element
    }

    fn kind(&self) -> NodeKind {
        NodeKind::HeaderGroup
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        base_attributes(&self.element)
    }
}

/// One entry of an extension's header list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEntry {
    Header(Header),
    Group(HeaderGroup),
}

impl HeaderEntry {
    /// The entry as a type-erased node.
    pub fn as_node(&self) -> &dyn SchemaNode {
        match self {
            HeaderEntry::Header(h) => h,
            HeaderEntry::Group(g) => g,
        }
    }

    /// Headers contained in this entry, flattening groups.
    pub fn headers(&self) -> Box<dyn Iterator<Item = &Header> + '_> {
        match self {
            HeaderEntry::Header(h) => Box::new(std::iter::once(h)),
            HeaderEntry::Group(g) => Box::new(g.headers.iter()),
        }
    }
}

impl From<Header> for HeaderEntry {
    fn from(header: Header) -> Self {
        HeaderEntry::Header(header)
    }
}

impl From<HeaderGroup> for HeaderEntry {
    fn from(group: HeaderGroup) -> Self {
        HeaderEntry::Group(group)
    }
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A table-field descriptor.
///
/// # Examples
///
/// ```
/// use fits_schema_core::*;
///
/// assert!(Column::new("energy", "energy", DataType::Float32)
///     .unwrap()
///     .with_ucd("not-a-real-ucd")
///     .is_err());
///
/// let col = Column::new("energy", "energy", DataType::Float32)
///     .unwrap()
///     .with_ucd("phys.energy")
///     .unwrap();
/// assert_eq!(col.ucd(), Some("phys.energy"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    element: SchemaElement,
    dtype: DataType,
    ndims: u32,
    unit: Option<Unit>,
    ucd: Option<String>,
    format: Option<String>,
}

impl Column {
    /// Creates a scalar column.
    ///
    /// # Errors
    ///
    /// Fails on an invalid name, empty description, or [`DataType::None`].
    pub fn new(name: &str, description: &str, dtype: DataType) -> Result<Self> {
        let element = SchemaElement::new(name, description)?;
        if dtype == DataType::None {
            return Err(SchemaError::UntypedColumn(element.name));
        }
        Ok(Self {
            element,
            dtype,
            ndims: 0,
            unit: None,
            ucd: None,
            format: None,
        })
    }

    builder_common!();

    /// Sets the array dimensionality (0 = scalar).
    pub fn with_ndims(mut self, ndims: u32) -> Self {
        self.ndims = ndims;
        self
    }

    /// Sets the unit, normalizing it to canonical form.
    pub fn with_unit(mut self, unit: &str) -> Result<Self> {
        self.unit = Some(Unit::parse(unit)?);
        Ok(self)
    }

    /// Sets the UCD after checking it against the controlled vocabulary.
    pub fn with_ucd(mut self, ucd: &str) -> Result<Self> {
        self.ucd = Some(validate_ucd(ucd)?);
        Ok(self)
    }

    /// Sets the display format (`TDISPn`).
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn ndims(&self) -> u32 {
        self.ndims
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn ucd(&self) -> Option<&str> {
        self.ucd.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }
}

impl SchemaNode for Column {
    fn element(&self) -> &SchemaElement {
        &self.element
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Column
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = base_attributes(&self.element);
        attrs.push(("dtype", self.dtype.to_string()));
        attrs.push(("ndims", self.ndims.to_string()));
        if let Some(unit) = &self.unit {
            attrs.push(("unit", unit.to_string()));
        }
        if let Some(ucd) = &self.ucd {
            attrs.push(("ucd", ucd.clone()));
        }
        if let Some(format) = &self.format {
            attrs.push(("format", format.clone()));
        }
        attrs
    }
}

/// Logically related columns with a shared description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    element: SchemaElement,
    columns: Vec<Column>,
}

impl ColumnGroup {
    pub fn new(name: &str, description: &str) -> Result<Self> {
        Ok(Self {
            element: SchemaElement::new(name, description)?,
            columns: Vec::new(),
        })
    }

    builder_common!();

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl SchemaNode for ColumnGroup {
    fn element(&self) -> &SchemaElement {
        &self.element
    }

    fn kind(&self) -> NodeKind {
        NodeKind::ColumnGroup
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        base_attributes(&self.element)
    }
}

/// One entry of a table's column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnEntry {
    Column(Column),
    Group(ColumnGroup),
}

impl ColumnEntry {
    pub fn as_node(&self) -> &dyn SchemaNode {
        match self {
            ColumnEntry::Column(c) => c,
            ColumnEntry::Group(g) => g,
        }
    }

    /// Columns contained in this entry, flattening groups.
    pub fn columns(&self) -> Box<dyn Iterator<Item = &Column> + '_> {
        match self {
            ColumnEntry::Column(c) => Box::new(std::iter::once(c)),
            ColumnEntry::Group(g) => Box::new(g.columns.iter()),
        }
    }
}

impl From<Column> for ColumnEntry {
    fn from(column: Column) -> Self {
        ColumnEntry::Column(column)
    }
}

impl From<ColumnGroup> for ColumnEntry {
    fn from(group: ColumnGroup) -> Self {
        ColumnEntry::Group(group)
    }
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

/// Number of classification levels (HDUCLASS plus HDUCLAS1..4).
pub const CLASS_LEVELS: usize = 5;

/// Four-slot classification of an extension within a standard's taxonomy.
///
/// # Examples
///
/// ```
/// use fits_schema_core::Classification;
///
/// let class = Classification::from_levels(["OGIP", "EVENTS", "ALL"]).unwrap();
/// assert_eq!(class.subclass(1), Some("EVENTS"));
/// assert_eq!(class.levels(), vec!["OGIP", "EVENTS", "ALL"]);
/// assert!(Classification::from_levels(["A", "B", "C", "D", "E", "F"]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    class_name: Option<String>,
    subclasses: [Option<String>; 4],
}

impl Classification {
    /// Builds from explicit slots; `subclasses[i]` is HDUCLAS`i+1`.
    pub fn new(class_name: Option<String>, subclasses: [Option<String>; 4]) -> Self {
        let clean = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            class_name: clean(class_name),
            subclasses: subclasses.map(clean),
        }
    }

    /// Builds from an ordered list: the first entry is the class, the rest
    /// fill the subclass slots in order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TooManyClassLevels`] beyond five levels.
    pub fn from_levels<I, S>(levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        if levels.len() > CLASS_LEVELS {
            return Err(SchemaError::TooManyClassLevels(levels.len()));
        }
        let mut iter = levels.into_iter();
        let class_name = iter.next();
        let mut subclasses: [Option<String>; 4] = Default::default();
        for (slot, level) in subclasses.iter_mut().zip(iter) {
            *slot = Some(level);
        }
        Ok(Self::new(class_name, subclasses))
    }

    /// HDUCLASS value.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// HDUCLAS`level` value for `level` in `1..=4`.
    pub fn subclass(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|i| self.subclasses.get(i))
            .and_then(|s| s.as_deref())
    }

    /// Ordered list of set levels; empty when no class is set.
    pub fn levels(&self) -> Vec<&str> {
        let Some(class_name) = self.class_name.as_deref() else {
            return Vec::new();
        };
        std::iter::once(class_name)
            .chain(self.subclasses.iter().filter_map(|s| s.as_deref()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.class_name.is_none() && self.subclasses.iter().all(Option::is_none)
    }
}

/// A header-only HDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    element: SchemaElement,
    headers: Vec<HeaderEntry>,
    version: u32,
    datamodel: String,
    classification: Classification,
}

impl Extension {
    /// Creates an extension; `datamodel` is the HDUVERS identifier (for
    /// example the value of the render configuration's `datamodel`).
    pub fn new(name: &str, description: &str, datamodel: impl Into<String>) -> Result<Self> {
        Ok(Self {
            element: SchemaElement::new(name, description)?,
            headers: Vec::new(),
            version: 0,
            datamodel: datamodel.into(),
            classification: Classification::default(),
        })
    }

    builder_common!();

    /// Appends a header or header group.
    pub fn with_header(mut self, entry: impl Into<HeaderEntry>) -> Self {
        self.headers.push(entry.into());
        self
    }

    pub fn with_headers<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<HeaderEntry>,
    {
        self.headers.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Sets EXTVER, used to tell apart HDUs with the same name.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    /// Sets the classification from an ordered list of levels.
    pub fn with_class_hierarchy<I, S>(self, levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.with_classification(Classification::from_levels(levels)?))
    }

    pub fn headers(&self) -> &[HeaderEntry] {
        &self.headers
    }

    /// All headers, with groups flattened.
    pub fn headers_flat(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter().flat_map(HeaderEntry::headers)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn datamodel(&self) -> &str {
        &self.datamodel
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Flattened classification levels.
    pub fn class_hierarchy(&self) -> Vec<&str> {
        self.classification.levels()
    }

    fn extension_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![
            ("version", self.version.to_string()),
            ("datamodel", self.datamodel.clone()),
        ];
        let hierarchy = self.class_hierarchy();
        if !hierarchy.is_empty() {
            attrs.push(("class_hierarchy", hierarchy.join(", ")));
        }
        attrs
    }
}

impl SchemaNode for Extension {
    fn element(&self) -> &SchemaElement {
        &self.element
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Extension
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = base_attributes(&self.element);
        attrs.extend(self.extension_attributes());
        attrs
    }

    fn summary_attributes(&self) -> Vec<(&'static str, String)> {
        self.extension_attributes()
    }
}

/// A binary-table HDU: an [`Extension`] plus its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExtension {
    extension: Extension,
    columns: Vec<ColumnEntry>,
}

impl TableExtension {
    pub fn new(name: &str, description: &str, datamodel: impl Into<String>) -> Result<Self> {
        Ok(Self::from_extension(Extension::new(
            name,
            description,
            datamodel,
        )?))
    }

    /// Wraps an already-built extension.
    pub fn from_extension(extension: Extension) -> Self {
        Self {
            extension,
            columns: Vec::new(),
        }
    }

    /// The header part of the table.
    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn optional(mut self) -> Self {
        self.extension = self.extension.optional();
        self
    }

    pub fn with_header(mut self, entry: impl Into<HeaderEntry>) -> Self {
        self.extension = self.extension.with_header(entry);
        self
    }

    pub fn with_headers<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<HeaderEntry>,
    {
        self.extension = self.extension.with_headers(entries);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.extension = self.extension.with_version(version);
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.extension = self.extension.with_classification(classification);
        self
    }

    pub fn with_class_hierarchy<I, S>(mut self, levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extension = self.extension.with_class_hierarchy(levels)?;
        Ok(self)
    }

    /// Appends a column or column group.
    pub fn with_column(mut self, entry: impl Into<ColumnEntry>) -> Self {
        self.columns.push(entry.into());
        self
    }

    pub fn with_columns<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ColumnEntry>,
    {
        self.columns.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn columns(&self) -> &[ColumnEntry] {
        &self.columns
    }

    /// All columns, with groups flattened.
    pub fn columns_flat(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().flat_map(ColumnEntry::columns)
    }
}

impl SchemaNode for TableExtension {
    fn element(&self) -> &SchemaElement {
        self.extension.element()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::TableExtension
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        self.extension.attributes()
    }

    fn summary_attributes(&self) -> Vec<(&'static str, String)> {
        self.extension.summary_attributes()
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Root of a schema tree: an ordered list of table extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsFile {
    element: SchemaElement,
    extensions: Vec<TableExtension>,
}

impl FitsFile {
    pub fn new(name: &str, description: &str) -> Result<Self> {
        Ok(Self {
            element: SchemaElement::new(name, description)?,
            extensions: Vec::new(),
        })
    }

    pub fn with_extension(mut self, extension: TableExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = TableExtension>) -> Self {
        self.extensions.extend(extensions);
        self
    }

    pub fn extensions(&self) -> &[TableExtension] {
        &self.extensions
    }

    /// Total number of headers across all extensions.
    pub fn header_count(&self) -> usize {
        self.extensions
            .iter()
            .map(|t| t.extension().headers_flat().count())
            .sum()
    }

    /// Total number of columns across all extensions.
    pub fn column_count(&self) -> usize {
        self.extensions.iter().map(|t| t.columns_flat().count()).sum()
    }
}

impl SchemaNode for FitsFile {
    fn element(&self) -> &SchemaElement {
        &self.element
    }

    fn kind(&self) -> NodeKind {
        NodeKind::FitsFile
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        base_attributes(&self.element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_defaults() {
        let hdr = Header::new("obs_id", "obs_id", "Observation identifier").unwrap();
        assert_eq!(hdr.fits_key(), "OBS_ID");
        assert!(hdr.required());
        assert!(hdr.dtype().is_none());
        assert!(hdr.unit().is_none());
        assert!(hdr.allowed_values().is_empty());
    }

    #[test]
    fn test_header_rejects_invalid_inputs() {
        assert!(matches!(
            Header::new("obs id", "OBS_ID", "x"),
            Err(SchemaError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            Header::new("obs_id", "OBS=ID", "x"),
            Err(SchemaError::InvalidFitsKey(_))
        ));
        assert!(matches!(
            Header::new("obs_id", "OBS_ID", ""),
            Err(SchemaError::EmptyDescription(_))
        ));
        let hdr = Header::new("obs_id", "OBS_ID", "x").unwrap();
        assert!(matches!(
            hdr.clone().with_unit("bogus-unit"),
            Err(SchemaError::InvalidUnit { .. })
        ));
        assert!(matches!(
            hdr.with_ivoa_key("facility-name"),
            Err(SchemaError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_header_unit_is_normalized() {
        let hdr = Header::new("boop", "BOOP", "Things")
            .unwrap()
            .with_unit("TeV")
            .unwrap();
        assert_eq!(hdr.unit().unwrap().to_string(), "TeV");
    }

    #[test]
    fn test_header_none_dtype_is_unset() {
        let hdr = Header::new("a", "A", "a").unwrap().with_dtype(DataType::None);
        assert!(hdr.dtype().is_none());
    }

    #[test]
    fn test_column_validation() {
        assert!(matches!(
            Column::new("time", "arrival time", DataType::None),
            Err(SchemaError::UntypedColumn(_))
        ));
        let col = Column::new("time", "arrival time", DataType::Float64).unwrap();
        assert!(col.clone().with_unit("invalid-unit").is_err());
        assert!(col.clone().with_ucd("some-invalid-name").is_err());
        let col = col.with_unit("s").unwrap().with_ucd("time.epoch").unwrap();
        assert_eq!(col.ucd(), Some("time.epoch"));
        assert_eq!(col.ndims(), 0);
    }

    #[test]
    fn test_column_group_keeps_order() {
        let c1 = Column::new("energy", "gamma ray energy", DataType::Float32)
            .unwrap()
            .with_ucd("phys.energy;em.gamma")
            .unwrap();
        let c2 = Column::new("time", "arrival time", DataType::Float64).unwrap();
        let group = ColumnGroup::new("group", "A group of columns")
            .unwrap()
            .with_columns([c1.clone(), c2]);
        assert_eq!(group.columns()[0], c1);
        assert_eq!(group.columns().len(), 2);
    }

    #[test]
    fn test_class_hierarchy_flattening() {
        let ext = Extension::new("EVENTS", "events", "VODF-test").unwrap();
        assert!(ext.class_hierarchy().is_empty());

        let ext = ext.with_classification(Classification::new(
            Some("OGIP".into()),
            [Some("EVENTS".into()), None, None, None],
        ));
        assert_eq!(ext.class_hierarchy(), vec!["OGIP", "EVENTS"]);

        let ext = ext.with_class_hierarchy(["OGIP", "EVENTS", "ALL"]).unwrap();
        assert_eq!(ext.classification().subclass(2), Some("ALL"));
        assert_eq!(ext.classification().subclass(3), None);
        assert_eq!(ext.classification().subclass(0), None);
    }

    #[test]
    fn test_subclasses_without_class_flatten_to_nothing() {
        let class = Classification::new(None, [Some("EVENTS".into()), None, None, None]);
        assert!(class.levels().is_empty());
        assert!(!class.is_empty());
    }

    #[test]
    fn test_table_extension_delegates_identity() {
        let table = TableExtension::new("EVENTS", "Event list", "VODF-test")
            .unwrap()
            .with_version(2)
            .with_column(Column::new("energy", "energy", DataType::Float32).unwrap());
        assert_eq!(table.name(), "EVENTS");
        assert_eq!(table.kind(), NodeKind::TableExtension);
        assert_eq!(table.extension().version(), 2);
        assert_eq!(table.extension().kind(), NodeKind::Extension);
    }

    #[test]
    fn test_flattened_counts() {
        let group = HeaderGroup::new("location", "Earth location")
            .unwrap()
            .with_headers([
                Header::new("geo_lon", "GEOLON", "lon").unwrap(),
                Header::new("geo_lat", "GEOLAT", "lat").unwrap(),
            ]);
        let table = TableExtension::new("EVENTS", "events", "VODF-test")
            .unwrap()
            .with_header(Header::new("test", "BOOP", "Things").unwrap())
            .with_header(group)
            .with_column(Column::new("a", "a", DataType::Int32).unwrap())
            .with_column(
                ColumnGroup::new("fov", "fov")
                    .unwrap()
                    .with_column(Column::new("fov_x", "x", DataType::Float64).unwrap())
                    .with_column(Column::new("fov_y", "y", DataType::Float64).unwrap()),
            );
        let file = FitsFile::new("f", "file")
            .unwrap()
            .with_extensions([table.clone(), table]);
        assert_eq!(file.header_count(), 6);
        assert_eq!(file.column_count(), 6);
    }

    #[test]
    fn test_attributes_skip_unset_values() {
        let hdr = Header::new("alt", "ALTITUDE", "Altitude").unwrap();
        let keys: Vec<&str> = hdr.attributes().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["description", "required", "fits_key"]);
        assert_eq!(
            hdr.summary_attributes(),
            vec![("fits_key", "ALTITUDE".to_string())]
        );

        let col = Column::new("energy", "Energy", DataType::Float32).unwrap();
        assert!(col.summary_attributes().is_empty());
        assert!(col.attributes().contains(&("dtype", "float32".to_string())));
    }
}
