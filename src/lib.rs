//! # sitemap-gen Library
//!
//! Generates sitemaps.org XML sitemaps from a list of URL entries. Collections
//! that exceed the per-file limit are split into numbered shards referenced
//! from a `sitemap_index.xml`. Every written file can be validated against the
//! embedded protocol schemas, either through libxml2 or a pure-Rust structural
//! checker.

pub mod cli;
pub mod config;
pub mod emitter;
pub mod entry;
pub mod error;
pub mod generator;
pub mod input;
pub mod libxml2;
pub mod logging;
pub mod output;
pub mod planner;
pub mod resolve;
pub mod schema;
pub mod validator;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, GenerationConfig, ValidationConfig};
pub use emitter::{SitemapIndexEntry, emit_file, emit_index, render_index, render_urlset};
pub use entry::{UrlCollection, UrlEntry, normalize_last_modified};
pub use error::{LibXml2Error, Result, SitemapError};
pub use generator::{GenerationReport, SitemapGenerator, WrittenFile, generate};
pub use libxml2::{CompiledSchema, LibXml2, XsdOutcome};
pub use output::Output;
pub use planner::{Layout, PartitionPlan, Shard, plan};
pub use resolve::resolve;
pub use schema::SchemaKind;
pub use validator::{
    SchemaValidator, StructuralValidator, ValidationEngine, XsdValidator, read_index_locations,
    validate_output,
};
