//! Partitioning of entries into a single sitemap or an index plus shards.

use serde::Serialize;

pub const SINGLE_SITEMAP_FILE: &str = "sitemap.xml";
pub const SITEMAP_INDEX_FILE: &str = "sitemap_index.xml";

/// File name of the 1-based `number`th shard
pub fn shard_file_name(number: usize) -> String {
    format!("sitemap_{}.xml", number)
}

/// A contiguous window of the input entries destined for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub file_name: String,
    pub start: usize,
    pub end: usize,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Which on-disk layout a plan produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Single,
    Indexed,
}

/// Outcome of planning: either one `sitemap.xml` or N ordered shards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionPlan {
    Single(Shard),
    Indexed(Vec<Shard>),
}

impl PartitionPlan {
    pub fn layout(&self) -> Layout {
        match self {
            PartitionPlan::Single(_) => Layout::Single,
            PartitionPlan::Indexed(_) => Layout::Indexed,
        }
    }

    /// Shards in output order (the single file counts as one)
    pub fn shards(&self) -> &[Shard] {
        match self {
            PartitionPlan::Single(shard) => std::slice::from_ref(shard),
            PartitionPlan::Indexed(shards) => shards,
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            PartitionPlan::Single(_) => 1,
            PartitionPlan::Indexed(shards) => shards.len() + 1,
        }
    }
}

/// Split `total` entries into files holding at most `max_per_file` each.
///
/// `max_per_file` must be non-zero; configuration validation guarantees it.
pub fn plan(total: usize, max_per_file: usize) -> PartitionPlan {
    debug_assert!(max_per_file > 0);

    if total <= max_per_file {
        return PartitionPlan::Single(Shard {
            file_name: SINGLE_SITEMAP_FILE.to_string(),
            start: 0,
            end: total,
        });
    }

    let file_count = total.div_ceil(max_per_file);
    let shards = (0..file_count)
        .map(|i| {
            let start = i * max_per_file;
            Shard {
                file_name: shard_file_name(i + 1),
                start,
                end: (start + max_per_file).min(total),
            }
        })
        .collect();

    PartitionPlan::Indexed(shards)
}
