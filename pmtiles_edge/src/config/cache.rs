use crate::server::DEFAULT_EDGE_CACHE_ENTRIES;
use pmtiles_edge_archive::DEFAULT_MAX_ENTRIES;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
	/// Number of decoded headers, directories and metadata documents kept in memory.
	#[serde(default = "default_archive_entries")]
	pub archive_entries: usize,

	/// Number of complete responses kept by the edge cache.
	#[serde(default = "default_edge_entries")]
	pub edge_entries: usize,
}

fn default_archive_entries() -> usize {
	DEFAULT_MAX_ENTRIES
}

fn default_edge_entries() -> usize {
	DEFAULT_EDGE_CACHE_ENTRIES
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			archive_entries: default_archive_entries(),
			edge_entries: default_edge_entries(),
		}
	}
}
