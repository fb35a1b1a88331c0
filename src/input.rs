//! Loading URL entries from an input file.
//!
//! `.json` files hold an array of `{loc, lastmod, changefreq, priority}`
//! objects. Anything else is read as one location per line, skipping blank
//! lines and `#` comments.

use std::path::Path;

use crate::entry::UrlEntry;
use crate::error::{Result, SitemapError};

pub async fn load_entries(path: &Path) -> Result<Vec<UrlEntry>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SitemapError::storage(path, e))?;

    let entries = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(path, &content)?,
        _ => parse_lines(&content),
    };

    tracing::info!(path = %path.display(), entries = entries.len(), "Loaded URL entries");
    Ok(entries)
}

fn parse_json(path: &Path, content: &str) -> Result<Vec<UrlEntry>> {
    serde_json::from_str(content).map_err(|e| SitemapError::InvalidInput {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// One location per non-blank, non-comment line
pub fn parse_lines(content: &str) -> Vec<UrlEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(UrlEntry::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_lines() {
        let entries = parse_lines("# pages\n/\n\n  /about  \n# end\nhttps://other.example/x\n");
        let locations: Vec<_> = entries.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, vec!["/", "/about", "https://other.example/x"]);
        assert!(entries.iter().all(|e| e.last_modified.is_none()));
    }

    #[tokio::test]
    async fn test_load_json_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");
        fs::write(
            &path,
            r#"[
  {"loc": "/", "lastmod": "2023-10-25", "changefreq": "daily", "priority": "1.0"},
  {"loc": "/about"}
]"#,
        )
        .unwrap();

        let entries = load_entries(&path).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            UrlEntry::new("/")
                .with_last_modified("2023-10-25")
                .with_change_frequency("daily")
                .with_priority("1.0")
        );
        assert_eq!(entries[1], UrlEntry::new("/about"));
    }

    #[tokio::test]
    async fn test_load_text_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.txt");
        fs::write(&path, "/\n/about\n").unwrap();

        let entries = load_entries(&path).await.unwrap();
        assert_eq!(entries, vec![UrlEntry::new("/"), UrlEntry::new("/about")]);
    }

    #[tokio::test]
    async fn test_invalid_json_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");
        fs::write(&path, "{ not an array").unwrap();

        let result = load_entries(&path).await;
        assert!(matches!(result, Err(SitemapError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_missing_input_is_storage_error() {
        let result = load_entries(Path::new("/definitely/not/here.txt")).await;
        assert!(matches!(result, Err(SitemapError::Storage { .. })));
    }
}
