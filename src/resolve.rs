//! RFC 3986 reference resolution for entry locations and shard references.

use url::Url;

use crate::error::{Result, SitemapError};

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| SitemapError::MalformedUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `reference` against `base`.
///
/// Absolute references come back as-is (in normalized form); relative ones
/// are joined onto `base`. An empty reference is rejected rather than
/// silently resolving to the base itself.
pub fn resolve(base: &str, reference: &str) -> Result<String> {
    if reference.trim().is_empty() {
        return Err(SitemapError::MalformedUrl {
            url: reference.to_string(),
            reason: "empty location".to_string(),
        });
    }

    let base_url = parse_base(base)?;
    base_url
        .join(reference)
        .map(String::from)
        .map_err(|e| SitemapError::MalformedUrl {
            url: reference.to_string(),
            reason: e.to_string(),
        })
}

/// Content base URL with trailing slashes removed
pub fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// Resolve a shard file name against the sitemap base, which is treated as a
/// directory whatever its trailing slashes.
pub fn resolve_sitemap_url(sitemap_base: &str, file_name: &str) -> Result<String> {
    let directory = format!("{}/", trim_base(sitemap_base));
    resolve(&directory, file_name)
}

/// Last path segment of an absolute URL, used to map index entries back to
/// files on disk
pub fn file_name_of(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
