//! URL entries and the append-only collection they are gathered into.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Calendar-date format used for `lastmod` values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single `<url>` record of a sitemap
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UrlEntry {
    /// Absolute or base-relative location of the page
    #[serde(rename = "loc")]
    pub location: String,
    #[serde(rename = "lastmod", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(rename = "changefreq", default, skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl UrlEntry {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_last_modified(mut self, last_modified: impl Into<String>) -> Self {
        self.last_modified = Some(last_modified.into());
        self
    }

    pub fn with_change_frequency(mut self, change_frequency: impl Into<String>) -> Self {
        self.change_frequency = Some(change_frequency.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }
}

/// Today's calendar date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Normalize a caller-supplied `lastmod` value against `today`.
///
/// Missing, unparseable and future-dated values all become `today`; any other
/// value is returned verbatim.
pub fn normalize_last_modified(value: Option<&str>, today: NaiveDate) -> String {
    match value {
        Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) if date <= today => raw.to_string(),
            _ => {
                tracing::debug!(lastmod = raw, "Replacing invalid or future lastmod");
                today.format(DATE_FORMAT).to_string()
            }
        },
        None => today.format(DATE_FORMAT).to_string(),
    }
}

/// Ordered, append-only collection of entries awaiting generation
#[derive(Debug, Clone, Default)]
pub struct UrlCollection {
    entries: Vec<UrlEntry>,
}

impl UrlCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, normalizing its `lastmod` against today's UTC date
    pub fn add_url(&mut self, entry: UrlEntry) {
        self.add_url_on(entry, today_utc());
    }

    pub fn add_urls(&mut self, entries: impl IntoIterator<Item = UrlEntry>) {
        let today = today_utc();
        for entry in entries {
            self.add_url_on(entry, today);
        }
    }

    /// Append an entry, normalizing against an explicit `today`
    pub fn add_url_on(&mut self, mut entry: UrlEntry, today: NaiveDate) {
        let normalized = normalize_last_modified(entry.last_modified.as_deref(), today);
        entry.last_modified = Some(normalized);
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[UrlEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<UrlEntry> {
        self.entries
    }
}

impl FromIterator<UrlEntry> for UrlCollection {
    fn from_iter<I: IntoIterator<Item = UrlEntry>>(iter: I) -> Self {
        let mut collection = UrlCollection::new();
        collection.add_urls(iter);
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_past_date_preserved() {
        let today = date("2024-06-01");
        assert_eq!(
            normalize_last_modified(Some("2023-10-25"), today),
            "2023-10-25"
        );
    }

    #[test]
    fn test_today_is_not_future() {
        let today = date("2024-06-01");
        assert_eq!(
            normalize_last_modified(Some("2024-06-01"), today),
            "2024-06-01"
        );
    }

    #[test]
    fn test_future_date_reset() {
        let today = date("2024-06-01");
        assert_eq!(
            normalize_last_modified(Some("2024-06-02"), today),
            "2024-06-01"
        );
    }

    #[test]
    fn test_invalid_dates_reset() {
        let today = date("2024-06-01");
        for raw in ["invalid-date", "2024-02-30", "2024-13-01", "", "2024-06-01T10:00:00Z"] {
            assert_eq!(normalize_last_modified(Some(raw), today), "2024-06-01", "{raw}");
        }
    }

    #[test]
    fn test_missing_date_defaults() {
        let today = date("2024-06-01");
        assert_eq!(normalize_last_modified(None, today), "2024-06-01");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let today = date("2024-06-01");
        for raw in [Some("2020-01-01"), Some("garbage"), Some("2099-01-01"), None] {
            let once = normalize_last_modified(raw, today);
            let twice = normalize_last_modified(Some(&once), today);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_collection_preserves_order_and_fields() {
        let today = date("2024-06-01");
        let mut collection = UrlCollection::new();
        collection.add_url_on(
            UrlEntry::new("/")
                .with_last_modified("2023-10-25")
                .with_change_frequency("daily")
                .with_priority("1.0"),
            today,
        );
        collection.add_url_on(
            UrlEntry::new("/about").with_last_modified("invalid-date"),
            today,
        );

        assert_eq!(collection.len(), 2);
        let entries = collection.entries();
        assert_eq!(entries[0].location, "/");
        assert_eq!(entries[0].last_modified.as_deref(), Some("2023-10-25"));
        assert_eq!(entries[0].change_frequency.as_deref(), Some("daily"));
        assert_eq!(entries[0].priority.as_deref(), Some("1.0"));
        assert_eq!(entries[1].location, "/about");
        assert_eq!(entries[1].last_modified.as_deref(), Some("2024-06-01"));
        assert_eq!(entries[1].change_frequency, None);
    }

    #[test]
    fn test_entry_json_field_names() {
        let json = r#"{"loc": "/blog", "lastmod": "2024-01-15", "changefreq": "weekly"}"#;
        let entry: UrlEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.location, "/blog");
        assert_eq!(entry.last_modified.as_deref(), Some("2024-01-15"));
        assert_eq!(entry.change_frequency.as_deref(), Some("weekly"));
        assert_eq!(entry.priority, None);
    }
}
