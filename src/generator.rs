//! Sitemap generation: plan, resolve, write, validate.
//!
//! A run is synchronous and all-or-nothing up to the first write: every entry
//! location and every shard reference is resolved before the output directory
//! is touched, so a malformed URL never leaves partial output behind. Once
//! writing starts, a failure leaves the earlier files on disk.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

use crate::config::{GenerationConfig, ValidationConfig};
use crate::emitter::{SitemapIndexEntry, check_stylesheet_href, emit_file, emit_index};
use crate::entry::{DATE_FORMAT, UrlCollection, UrlEntry, normalize_last_modified, today_utc};
use crate::error::{Result, SitemapError};
use crate::planner::{Layout, PartitionPlan, SITEMAP_INDEX_FILE, plan};
use crate::resolve::{resolve, resolve_sitemap_url, trim_base};
use crate::schema::SchemaKind;
use crate::validator::{SchemaValidator, build_validator, validate_output};

/// One file produced by a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub kind: SchemaKind,
    /// `<url>` entries for a urlset, `<sitemap>` records for an index
    pub url_count: usize,
    pub bytes: u64,
    /// Exceeds the advisory size limit
    pub over_size_limit: bool,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub layout: Layout,
    pub output_dir: PathBuf,
    /// Shards in order, then the index when there is one
    pub files: Vec<WrittenFile>,
    pub total_urls: usize,
    pub validated: bool,
    pub generated_on: NaiveDate,
    pub duration: Duration,
}

impl GenerationReport {
    pub fn index_file(&self) -> Option<&WrittenFile> {
        self.files
            .iter()
            .find(|file| file.kind == SchemaKind::SitemapIndex)
    }

    pub fn oversized_files(&self) -> impl Iterator<Item = &WrittenFile> {
        self.files.iter().filter(|file| file.over_size_limit)
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.bytes).sum()
    }
}

/// Generates sitemap files from an immutable configuration
pub struct SitemapGenerator {
    config: GenerationConfig,
    content_base: String,
    validator: Option<Box<dyn SchemaValidator>>,
    pool: Option<ThreadPool>,
}

impl std::fmt::Debug for SitemapGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitemapGenerator")
            .field("config", &self.config)
            .field("validates", &self.validator.is_some())
            .field("parallel", &self.pool.is_some())
            .finish()
    }
}

impl SitemapGenerator {
    /// Build a generator, selecting the validation engine from `validation`
    pub fn new(config: GenerationConfig, validation: &ValidationConfig) -> Result<Self> {
        let validator = if validation.enabled {
            Some(build_validator(validation.engine)?)
        } else {
            None
        };
        Self::with_validator(config, validator, validation)
    }

    /// Build a generator around a caller-supplied validator (or none)
    pub fn with_validator(
        config: GenerationConfig,
        validator: Option<Box<dyn SchemaValidator>>,
        validation: &ValidationConfig,
    ) -> Result<Self> {
        if config.max_urls_per_file == 0 {
            return Err(SitemapError::Config(
                "Maximum URLs per file must be greater than 0".to_string(),
            ));
        }

        let pool = if validator.is_some() && validation.parallel {
            let threads = validation.threads.unwrap_or_else(num_cpus::get);
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("sitemap-validate-{}", i))
                .build()
                .map_err(|e| SitemapError::Config(format!("thread pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        let content_base = trim_base(&config.base_url).to_string();
        Ok(Self {
            config,
            content_base,
            validator,
            pool,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate the sitemap files for `collection`
    pub fn generate(&self, collection: &UrlCollection) -> Result<GenerationReport> {
        self.generate_on(collection.entries(), today_utc())
    }

    /// Generate with an explicit generation date.
    ///
    /// `lastmod` values are normalized against `today`, which is also the
    /// `lastmod` of every index record.
    pub fn generate_on(&self, entries: &[UrlEntry], today: NaiveDate) -> Result<GenerationReport> {
        let started = Instant::now();

        if entries.is_empty() {
            return Err(SitemapError::NoEntries);
        }

        let partition = plan(entries.len(), self.config.max_urls_per_file);
        tracing::info!(
            urls = entries.len(),
            files = partition.file_count(),
            layout = ?partition.layout(),
            "Planned sitemap layout"
        );

        let resolved = self.resolve_entries(entries, today)?;
        let index_entries = self.resolve_index_entries(&partition, today)?;
        let stylesheet = self.config.stylesheet_url.as_deref();
        if let Some(href) = stylesheet {
            check_stylesheet_href(href)?;
        }

        let dir = self.config.output_dir.as_path();
        std::fs::create_dir_all(dir).map_err(|e| SitemapError::storage(dir, e))?;

        let mut files = Vec::with_capacity(partition.file_count() + 1);

        for shard in partition.shards() {
            let slice = &resolved[shard.start..shard.end];
            let (path, bytes) = emit_file(dir, &shard.file_name, slice, stylesheet)?;
            files.push(self.record(path, SchemaKind::UrlSet, slice.len(), bytes));
        }

        if let Some(index_entries) = &index_entries {
            let (path, bytes) = emit_index(dir, SITEMAP_INDEX_FILE, index_entries, stylesheet)?;
            files.push(self.record(path, SchemaKind::SitemapIndex, index_entries.len(), bytes));
        }

        let validated = match &self.validator {
            Some(validator) => {
                validate_output(validator.as_ref(), dir, partition.layout(), self.pool.as_ref())?;
                true
            }
            None => false,
        };

        Ok(GenerationReport {
            layout: partition.layout(),
            output_dir: dir.to_path_buf(),
            files,
            total_urls: entries.len(),
            validated,
            generated_on: today,
            duration: started.elapsed(),
        })
    }

    fn resolve_entries(&self, entries: &[UrlEntry], today: NaiveDate) -> Result<Vec<UrlEntry>> {
        entries
            .iter()
            .map(|entry| {
                Ok(UrlEntry {
                    location: resolve(&self.content_base, &entry.location)?,
                    last_modified: Some(normalize_last_modified(
                        entry.last_modified.as_deref(),
                        today,
                    )),
                    change_frequency: entry.change_frequency.clone(),
                    priority: entry.priority.clone(),
                })
            })
            .collect()
    }

    fn resolve_index_entries(
        &self,
        partition: &PartitionPlan,
        today: NaiveDate,
    ) -> Result<Option<Vec<SitemapIndexEntry>>> {
        if partition.layout() == Layout::Single {
            return Ok(None);
        }

        let sitemap_base = self.config.effective_sitemap_base_url();
        let last_modified = today.format(DATE_FORMAT).to_string();
        partition
            .shards()
            .iter()
            .map(|shard| {
                Ok(SitemapIndexEntry {
                    location: resolve_sitemap_url(sitemap_base, &shard.file_name)?,
                    last_modified: last_modified.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn record(&self, path: PathBuf, kind: SchemaKind, url_count: usize, bytes: u64) -> WrittenFile {
        let over_size_limit = bytes > self.config.max_file_size_bytes;
        if over_size_limit {
            tracing::warn!(
                path = %path.display(),
                bytes,
                limit = self.config.max_file_size_bytes,
                "Sitemap file exceeds the advisory size limit"
            );
        } else {
            tracing::debug!(path = %path.display(), url_count, bytes, "Wrote sitemap file");
        }
        WrittenFile {
            path,
            kind,
            url_count,
            bytes,
            over_size_limit,
        }
    }
}

/// Generate sitemaps for `entries` into `output_dir` with libxml2 validation.
///
/// Relative entry locations resolve against `content_base_url`; shard files
/// are referenced from the index under `index_base_url`, or under
/// `content_base_url` when that is blank.
pub fn generate(
    output_dir: &Path,
    content_base_url: &str,
    index_base_url: &str,
    stylesheet_url: Option<&str>,
    entries: &[UrlEntry],
    max_per_file: usize,
) -> Result<GenerationReport> {
    let config = GenerationConfig {
        output_dir: output_dir.to_path_buf(),
        base_url: content_base_url.to_string(),
        sitemap_base_url: Some(index_base_url.to_string()),
        stylesheet_url: stylesheet_url.map(str::to_string),
        max_urls_per_file: max_per_file,
        ..Default::default()
    };
    SitemapGenerator::new(config, &ValidationConfig::default())?.generate_on(entries, today_utc())
}
