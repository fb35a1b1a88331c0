//! XML rendering and writing of `urlset` and `sitemapindex` documents.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::entry::UrlEntry;
use crate::error::{Result, SitemapError};
use crate::schema::{SITEMAP_NAMESPACE, SchemaKind};

/// One `<sitemap>` record of an index document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapIndexEntry {
    pub location: String,
    pub last_modified: String,
}

fn serialization<E: std::fmt::Display>(err: E) -> SitemapError {
    SitemapError::Serialization(err.to_string())
}

/// Check that `href` can sit verbatim inside the `xml-stylesheet` instruction.
///
/// Instruction content is not entity-decoded, so the URL is written as given
/// and anything that would end the pseudo-attribute or the instruction is
/// rejected instead.
pub fn check_stylesheet_href(href: &str) -> Result<()> {
    if href.contains('"') || href.contains("?>") {
        return Err(SitemapError::MalformedUrl {
            url: href.to_string(),
            reason: "stylesheet URL cannot contain '\"' or '?>'".to_string(),
        });
    }
    Ok(())
}

/// Streaming document builder with two-space indentation
struct DocumentWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl DocumentWriter {
    fn new(kind: SchemaKind, stylesheet: Option<&str>) -> Result<Self> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(serialization)?;

        if let Some(href) = stylesheet {
            check_stylesheet_href(href)?;
            let content = format!(r#"xml-stylesheet type="text/xsl" href="{}""#, href);
            writer
                .write_event(Event::PI(BytesPI::new(content)))
                .map_err(serialization)?;
        }

        let mut root = BytesStart::new(kind.root_element());
        root.push_attribute(("xmlns", SITEMAP_NAMESPACE));
        writer
            .write_event(Event::Start(root))
            .map_err(serialization)?;

        Ok(Self { writer })
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(serialization)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(serialization)
    }

    /// `<name>text</name>`, skipped entirely when the value is absent or empty
    fn text_element(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        self.start(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(serialization)?;
        self.end(name)
    }

    fn finish(mut self, kind: SchemaKind) -> Result<Vec<u8>> {
        self.end(kind.root_element())?;
        let mut bytes = self.writer.into_inner().into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Render a `urlset` document for already-resolved entries
pub fn render_urlset(entries: &[UrlEntry], stylesheet: Option<&str>) -> Result<Vec<u8>> {
    let kind = SchemaKind::UrlSet;
    let mut doc = DocumentWriter::new(kind, stylesheet)?;
    for entry in entries {
        doc.start(kind.record_element())?;
        doc.text_element("loc", Some(&entry.location))?;
        doc.text_element("lastmod", entry.last_modified.as_deref())?;
        doc.text_element("changefreq", entry.change_frequency.as_deref())?;
        doc.text_element("priority", entry.priority.as_deref())?;
        doc.end(kind.record_element())?;
    }
    doc.finish(kind)
}

/// Render a `sitemapindex` document
pub fn render_index(shards: &[SitemapIndexEntry], stylesheet: Option<&str>) -> Result<Vec<u8>> {
    let kind = SchemaKind::SitemapIndex;
    let mut doc = DocumentWriter::new(kind, stylesheet)?;
    for shard in shards {
        doc.start(kind.record_element())?;
        doc.text_element("loc", Some(&shard.location))?;
        doc.text_element("lastmod", Some(&shard.last_modified))?;
        doc.end(kind.record_element())?;
    }
    doc.finish(kind)
}

/// Write a complete document to `dir/file_name` in a single call
pub fn write_document(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, bytes).map_err(|e| SitemapError::storage(&path, e))?;
    Ok(path)
}

/// Render and write one `urlset` file, returning its path and size
pub fn emit_file(
    dir: &Path,
    file_name: &str,
    entries: &[UrlEntry],
    stylesheet: Option<&str>,
) -> Result<(PathBuf, u64)> {
    let bytes = render_urlset(entries, stylesheet)?;
    let path = write_document(dir, file_name, &bytes)?;
    Ok((path, bytes.len() as u64))
}

/// Render and write the index file, returning its path and size
pub fn emit_index(
    dir: &Path,
    file_name: &str,
    shards: &[SitemapIndexEntry],
    stylesheet: Option<&str>,
) -> Result<(PathBuf, u64)> {
    let bytes = render_index(shards, stylesheet)?;
    let path = write_document(dir, file_name, &bytes)?;
    Ok((path, bytes.len() as u64))
}
