//! Schema validation of written sitemap files.
//!
//! Validation always re-reads what landed on disk. Two engines implement the
//! [`SchemaValidator`] capability:
//! - [`XsdValidator`]: the embedded XSDs compiled and enforced by libxml2
//! - [`StructuralValidator`]: pure-Rust checks of element order, `changefreq`
//!   membership, `priority` range and `lastmod` date format
//!
//! [`validate_output`] applies either engine to a generated layout, checking
//! the index first and then every shard it references, in referenced order.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rayon::ThreadPool;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SitemapError};
use crate::libxml2::{CompiledSchema, LibXml2, XsdOutcome};
use crate::planner::{Layout, SINGLE_SITEMAP_FILE, SITEMAP_INDEX_FILE};
use crate::resolve::file_name_of;
use crate::schema::{CHANGE_FREQUENCIES, SITEMAP_NAMESPACE, SchemaKind};

/// Pluggable schema validation of a file on disk
#[cfg_attr(test, mockall::automock)]
pub trait SchemaValidator: Send + Sync {
    /// `Ok(())` when the file conforms; `SchemaViolation` when it does not
    fn validate(&self, path: &Path, kind: SchemaKind) -> Result<()>;
}

/// Which validation engine to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationEngine {
    #[default]
    Libxml2,
    Structural,
}

impl std::str::FromStr for ValidationEngine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "libxml2" | "xsd" => Ok(ValidationEngine::Libxml2),
            "structural" => Ok(ValidationEngine::Structural),
            other => Err(format!("unknown validation engine: {}", other)),
        }
    }
}

/// Build the validator for `engine`
pub fn build_validator(engine: ValidationEngine) -> Result<Box<dyn SchemaValidator>> {
    Ok(match engine {
        ValidationEngine::Libxml2 => Box::new(XsdValidator::new()?),
        ValidationEngine::Structural => Box::new(StructuralValidator),
    })
}

/// Open and read from `path` so unreadable files and directories surface as
/// storage errors before libxml2 sees them
fn ensure_readable(path: &Path) -> Result<()> {
    fs::File::open(path)
        .and_then(|mut file| file.read(&mut [0u8; 1]))
        .map(|_| ())
        .map_err(|e| SitemapError::storage(path, e))
}

fn violation(path: &Path, details: impl Into<String>) -> SitemapError {
    SitemapError::SchemaViolation {
        file: path.to_path_buf(),
        details: details.into(),
    }
}

/// libxml2-backed validator holding both compiled sitemap schemas
pub struct XsdValidator {
    libxml2: LibXml2,
    urlset: CompiledSchema,
    sitemap_index: CompiledSchema,
}

impl XsdValidator {
    pub fn new() -> Result<Self> {
        let libxml2 = LibXml2::new();
        let urlset = libxml2.compile_schema(SchemaKind::UrlSet.xsd().as_bytes())?;
        let sitemap_index = libxml2.compile_schema(SchemaKind::SitemapIndex.xsd().as_bytes())?;
        Ok(Self {
            libxml2,
            urlset,
            sitemap_index,
        })
    }

    fn schema(&self, kind: SchemaKind) -> &CompiledSchema {
        match kind {
            SchemaKind::UrlSet => &self.urlset,
            SchemaKind::SitemapIndex => &self.sitemap_index,
        }
    }
}

impl SchemaValidator for XsdValidator {
    fn validate(&self, path: &Path, kind: SchemaKind) -> Result<()> {
        ensure_readable(path)?;

        match self.libxml2.validate_file(self.schema(kind), path) {
            Ok(XsdOutcome::Valid) => Ok(()),
            Ok(XsdOutcome::Invalid {
                error_count,
                errors,
            }) => {
                let details = if errors.is_empty() {
                    format!("{} schema error(s)", error_count)
                } else {
                    errors.join("; ")
                };
                Err(violation(path, details))
            }
            Ok(XsdOutcome::InternalError { code }) => Err(SitemapError::LibXml2Internal {
                details: format!("{}: validation aborted with code {}", path.display(), code),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

/// Minimal element tree used by the structural checks
#[derive(Debug, Default)]
struct Element {
    name: String,
    xmlns: Option<String>,
    text: String,
    children: Vec<Element>,
}

fn element_from(start: &BytesStart<'_>) -> std::result::Result<Element, String> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == b"xmlns" {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            element.xmlns = Some(value.into_owned());
        }
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> std::result::Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err("document has more than one root element".to_string()),
    }
    Ok(())
}

fn parse_tree(bytes: &[u8]) -> std::result::Result<Element, String> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(element_from(&e)?),
            Ok(Event::Empty(e)) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unbalanced end tag".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None => return Err("character content outside the root element".to_string()),
                }
            }
            Ok(Event::CData(c)) => match stack.last_mut() {
                Some(element) => element.text.push_str(&String::from_utf8_lossy(&c)),
                None => return Err("CDATA outside the root element".to_string()),
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err("document ended inside an open element".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

/// `YYYY-MM-DD` with an optional `Z` or `+HH:MM`/`-HH:MM` zone, as `xs:date`
fn is_xs_date(value: &str) -> bool {
    let (date, zone) = if value.len() > 10 && value.is_char_boundary(10) {
        value.split_at(10)
    } else {
        (value, "")
    };
    if date.len() != 10 || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return false;
    }
    match zone.as_bytes() {
        [] | [b'Z'] => true,
        [sign, h1, h2, b':', m1, m2]
            if (*sign == b'+' || *sign == b'-')
                && [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit()) =>
        {
            let hours = (*h1 - b'0') * 10 + (*h2 - b'0');
            let minutes = (*m1 - b'0') * 10 + (*m2 - b'0');
            minutes < 60 && (hours < 14 || (hours == 14 && minutes == 0))
        }
        _ => false,
    }
}

/// Whether an `xs:decimal` lexical value lies in `[0, 1]`, compared on the
/// digits themselves so no precision is lost. `None` when not a decimal.
fn decimal_in_unit_range(value: &str) -> Option<bool> {
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let well_formed = (!int_part.is_empty() || !frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return None;
    }

    let significant_int = int_part.trim_start_matches('0');
    let has_fraction = frac_part.bytes().any(|b| b != b'0');
    let is_zero = significant_int.is_empty() && !has_fraction;

    Some(match significant_int {
        _ if is_zero => true,
        _ if negative => false,
        "" => true,
        "1" => !has_fraction,
        _ => false,
    })
}

fn check_field(
    record: &str,
    index: usize,
    field: &Element,
    errors: &mut Vec<String>,
) {
    let at = format!("{}[{}]/{}", record, index + 1, field.name);
    if !field.children.is_empty() {
        errors.push(format!("{}: element content is not allowed", at));
        return;
    }
    let value = field.text.as_str();
    match field.name.as_str() {
        "loc" => {
            if value.is_empty() {
                errors.push(format!("{}: location is empty", at));
            } else if let Err(e) = Url::parse(value) {
                errors.push(format!("{}: '{}' is not a valid URI ({})", at, value, e));
            }
        }
        "lastmod" => {
            if !is_xs_date(value) {
                errors.push(format!("{}: '{}' is not a valid xs:date", at, value));
            }
        }
        "changefreq" => {
            if !CHANGE_FREQUENCIES.contains(&value) {
                errors.push(format!(
                    "{}: '{}' is not one of {}",
                    at,
                    value,
                    CHANGE_FREQUENCIES.join(", ")
                ));
            }
        }
        "priority" => match decimal_in_unit_range(value) {
            Some(true) => {}
            Some(false) => errors.push(format!(
                "{}: '{}' is outside the range 0.0 to 1.0",
                at, value
            )),
            None => errors.push(format!("{}: '{}' is not a valid decimal", at, value)),
        },
        _ => {}
    }
}

fn check_record(kind: SchemaKind, index: usize, record: &Element, errors: &mut Vec<String>) {
    let allowed: &[&str] = match kind {
        SchemaKind::UrlSet => &["loc", "lastmod", "changefreq", "priority"],
        SchemaKind::SitemapIndex => &["loc", "lastmod"],
    };
    let name = kind.record_element();

    if !record.text.is_empty() {
        errors.push(format!("{}[{}]: unexpected character content", name, index + 1));
    }
    if record.children.first().map(|c| c.name.as_str()) != Some("loc") {
        errors.push(format!("{}[{}]: missing leading 'loc' element", name, index + 1));
    }

    let mut position = 0;
    for field in &record.children {
        match allowed[position..].iter().position(|a| *a == field.name) {
            Some(offset) => {
                position += offset + 1;
                check_field(name, index, field, errors);
            }
            None => errors.push(format!(
                "{}[{}]: unexpected element '{}' (expected one of {})",
                name,
                index + 1,
                field.name,
                allowed[position..].join(", ")
            )),
        }
    }
}

fn check_document(root: &Element, kind: SchemaKind) -> Vec<String> {
    let mut errors = Vec::new();
    let root_name = kind.root_element();
    let record_name = kind.record_element();

    if root.name != root_name {
        errors.push(format!(
            "root element is '{}', expected '{}'",
            root.name, root_name
        ));
        return errors;
    }
    if root.xmlns.as_deref() != Some(SITEMAP_NAMESPACE) {
        errors.push(format!(
            "'{}' must declare xmlns=\"{}\"",
            root_name, SITEMAP_NAMESPACE
        ));
    }
    if !root.text.is_empty() {
        errors.push(format!("'{}': unexpected character content", root_name));
    }
    if root.children.is_empty() {
        errors.push(format!(
            "'{}' requires at least one '{}' element",
            root_name, record_name
        ));
    }

    for (index, child) in root.children.iter().enumerate() {
        if child.name == record_name {
            check_record(kind, index, child, &mut errors);
        } else {
            errors.push(format!(
                "'{}': unexpected element '{}' (expected '{}')",
                root_name, child.name, record_name
            ));
        }
    }
    errors
}

/// Hand-rolled structural checks mirroring the sitemap XSDs
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Check an in-memory document; the file path is used for reporting only
    pub fn validate_bytes(&self, path: &Path, bytes: &[u8], kind: SchemaKind) -> Result<()> {
        let root = parse_tree(bytes).map_err(|e| violation(path, e))?;
        let errors = check_document(&root, kind);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(violation(path, errors.join("; ")))
        }
    }
}

impl SchemaValidator for StructuralValidator {
    fn validate(&self, path: &Path, kind: SchemaKind) -> Result<()> {
        let bytes = fs::read(path).map_err(|e| SitemapError::storage(path, e))?;
        self.validate_bytes(path, &bytes, kind)
    }
}

/// Parse an index file back and return the `loc` of every `<sitemap>`, in order
pub fn read_index_locations(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| SitemapError::storage(path, e))?;
    let parse_error = |details: String| SitemapError::IndexParse {
        file: path.to_path_buf(),
        details,
    };

    let mut reader = Reader::from_reader(bytes.as_slice());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut locations = Vec::new();
    let mut saw_root = false;
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut current_loc: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" => saw_root = true,
                b"sitemap" if saw_root => {
                    in_sitemap = true;
                    current_loc = None;
                }
                b"loc" if in_sitemap => in_loc = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"sitemap" if in_sitemap => {
                    let loc = current_loc
                        .take()
                        .ok_or_else(|| parse_error("<sitemap> without <loc>".to_string()))?;
                    locations.push(loc);
                    in_sitemap = false;
                }
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => {
                let text = t.unescape().map_err(|e| parse_error(e.to_string()))?;
                current_loc = Some(text.trim().to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(parse_error("missing <sitemapindex> root".to_string()));
    }
    Ok(locations)
}

/// Validate a generated layout in `dir`.
///
/// For an indexed layout the index is validated first, then parsed back, then
/// every shard it references is validated in referenced order. With a pool
/// the shards are checked concurrently, but the reported failure is still the
/// one with the lowest shard position. Returns the validated paths in order.
pub fn validate_output(
    validator: &dyn SchemaValidator,
    dir: &Path,
    layout: Layout,
    pool: Option<&ThreadPool>,
) -> Result<Vec<PathBuf>> {
    if layout == Layout::Single {
        let path = dir.join(SINGLE_SITEMAP_FILE);
        validator.validate(&path, SchemaKind::UrlSet)?;
        tracing::debug!(path = %path.display(), "Validated sitemap");
        return Ok(vec![path]);
    }

    let index_path = dir.join(SITEMAP_INDEX_FILE);
    validator.validate(&index_path, SchemaKind::SitemapIndex)?;
    tracing::debug!(path = %index_path.display(), "Validated sitemap index");

    let shard_paths = read_index_locations(&index_path)?
        .into_iter()
        .map(|loc| {
            file_name_of(&loc)
                .map(|name| dir.join(name))
                .ok_or_else(|| SitemapError::IndexParse {
                    file: index_path.clone(),
                    details: format!("cannot derive a file name from '{}'", loc),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    match pool {
        Some(pool) => {
            let outcomes: Vec<Result<()>> = pool.install(|| {
                shard_paths
                    .par_iter()
                    .map(|path| validator.validate(path, SchemaKind::UrlSet))
                    .collect()
            });
            outcomes.into_iter().collect::<Result<Vec<()>>>()?;
        }
        None => {
            for path in &shard_paths {
                validator.validate(path, SchemaKind::UrlSet)?;
                tracing::debug!(path = %path.display(), "Validated sitemap shard");
            }
        }
    }

    let mut validated = Vec::with_capacity(shard_paths.len() + 1);
    validated.push(index_path);
    validated.extend(shard_paths);
    Ok(validated)
}
