mod common;

use std::fs;
use std::path::Path;

use common::numbered_entries;
use sitemap_gen::config::{GenerationConfig, ValidationConfig};
use sitemap_gen::validator::build_validator;
use sitemap_gen::{
    Layout, SchemaKind, SchemaValidator, SitemapError, SitemapGenerator, StructuralValidator,
    ValidationEngine, XsdValidator, read_index_locations, validate_output,
};
use tempfile::TempDir;

/// Write an indexed layout of `n` entries, two per shard, without validating it
fn write_unvalidated(dir: &Path, n: usize) {
    let config = GenerationConfig {
        max_urls_per_file: 2,
        ..GenerationConfig::new(dir, "https://example.com")
    };
    let validation = ValidationConfig {
        enabled: false,
        ..Default::default()
    };
    let report = SitemapGenerator::new(config, &validation)
        .unwrap()
        .generate(&numbered_entries(n).into_iter().collect())
        .unwrap();
    assert!(!report.validated);
}

fn engines() -> Vec<(&'static str, Box<dyn SchemaValidator>)> {
    vec![
        (
            "libxml2",
            Box::new(XsdValidator::new().unwrap()) as Box<dyn SchemaValidator>,
        ),
        ("structural", Box::new(StructuralValidator) as Box<dyn SchemaValidator>),
    ]
}

#[test]
fn test_generated_layout_passes_both_engines() {
    let temp_dir = TempDir::new().unwrap();
    write_unvalidated(temp_dir.path(), 5);

    for (name, validator) in engines() {
        let validated =
            validate_output(validator.as_ref(), temp_dir.path(), Layout::Indexed, None)
                .unwrap_or_else(|e| panic!("{} rejected generated output: {}", name, e));
        assert_eq!(validated.len(), 4, "{}", name);
        assert_eq!(validated[0], temp_dir.path().join("sitemap_index.xml"));
        assert_eq!(validated[3], temp_dir.path().join("sitemap_3.xml"));
    }
}

#[test]
fn test_tampered_shard_detected_by_both_engines() {
    let temp_dir = TempDir::new().unwrap();
    write_unvalidated(temp_dir.path(), 6);

    let shard = temp_dir.path().join("sitemap_2.xml");
    let content = fs::read_to_string(&shard).unwrap();
    let tampered = content.replacen("</loc>", "</loc>\n    <priority>7</priority>", 1);
    fs::write(&shard, tampered).unwrap();

    for (name, validator) in engines() {
        match validate_output(validator.as_ref(), temp_dir.path(), Layout::Indexed, None) {
            Err(SitemapError::SchemaViolation { file, .. }) => assert_eq!(file, shard, "{}", name),
            other => panic!("{}: expected SchemaViolation, got {:?}", name, other),
        }
    }
}

#[test]
fn test_parallel_validation_reports_first_failing_shard() {
    let temp_dir = TempDir::new().unwrap();
    write_unvalidated(temp_dir.path(), 12);

    for n in [3, 5] {
        let shard = temp_dir.path().join(format!("sitemap_{}.xml", n));
        let content = fs::read_to_string(&shard).unwrap();
        fs::write(&shard, content.replace("<url>", "<url><bogus/>")).unwrap();
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let validator = build_validator(ValidationEngine::Libxml2).unwrap();

    for _ in 0..5 {
        match validate_output(validator.as_ref(), temp_dir.path(), Layout::Indexed, Some(&pool)) {
            Err(SitemapError::SchemaViolation { file, .. }) => {
                assert_eq!(file, temp_dir.path().join("sitemap_3.xml"))
            }
            other => panic!("Expected SchemaViolation, got {:?}", other),
        }
    }
}

#[test]
fn test_missing_shard_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    write_unvalidated(temp_dir.path(), 4);
    fs::remove_file(temp_dir.path().join("sitemap_2.xml")).unwrap();

    let validator = build_validator(ValidationEngine::Structural).unwrap();
    let result = validate_output(validator.as_ref(), temp_dir.path(), Layout::Indexed, None);

    assert!(matches!(result, Err(SitemapError::Storage { .. })));
}

#[test]
fn test_index_locations_map_to_shard_files() {
    let temp_dir = TempDir::new().unwrap();
    write_unvalidated(temp_dir.path(), 3);

    let locations = read_index_locations(&temp_dir.path().join("sitemap_index.xml")).unwrap();
    assert_eq!(
        locations,
        vec![
            "https://example.com/sitemap_1.xml",
            "https://example.com/sitemap_2.xml",
        ]
    );
}

#[test]
fn test_urlset_is_not_an_index() {
    let temp_dir = TempDir::new().unwrap();
    write_unvalidated(temp_dir.path(), 3);
    let shard = temp_dir.path().join("sitemap_1.xml");

    for (name, validator) in engines() {
        let err = validator.validate(&shard, SchemaKind::SitemapIndex).unwrap_err();
        assert!(err.is_schema_violation(), "{}: {:?}", name, err);
    }
}
