//! A bounded cache of decoded archive structures, shared by every archive the
//! process serves.
//!
//! Entries are keyed by archive key, so concurrently open archives never see each
//! other's values. Directory and metadata entries additionally carry the etag of
//! the header they were read under. Only finished values are stored: the lock is
//! never held while a read is in flight.

use crate::{ArchiveError, ArchiveResult, Decompressor, DefaultDecompressor, Directory, Header, RangeResponse, RangeSource};
use anyhow::Context;
use log::trace;
use lru::LruCache;
use parking_lot::Mutex;
use pmtiles_edge_core::{Blob, ByteRange};
use std::{fmt, num::NonZeroUsize, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Size of the first read of an archive. The root directory usually lies inside
/// it, which saves a second round trip.
pub const HEADER_PREFETCH: u64 = 16_384;

pub const DEFAULT_MAX_ENTRIES: usize = 25;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum CacheKey {
	Header {
		archive: String,
	},
	Directory {
		archive: String,
		range: ByteRange,
		etag: Option<String>,
	},
	Metadata {
		archive: String,
		etag: Option<String>,
	},
}

impl CacheKey {
	fn archive(&self) -> &str {
		match self {
			CacheKey::Header { archive } | CacheKey::Directory { archive, .. } | CacheKey::Metadata { archive, .. } => {
				archive
			}
		}
	}
}

#[derive(Clone)]
enum CacheValue {
	Header(Arc<Header>),
	Directory(Arc<Directory>),
	Metadata(Arc<serde_json::Value>),
}

pub struct ResolvedValueCache {
	entries: Mutex<LruCache<CacheKey, CacheValue>>,
	decompressor: Arc<dyn Decompressor>,
}

impl ResolvedValueCache {
	pub fn new(max_entries: usize, decompressor: Arc<dyn Decompressor>) -> ResolvedValueCache {
		let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
		ResolvedValueCache {
			entries: Mutex::new(LruCache::new(capacity)),
			decompressor,
		}
	}

	pub fn decompressor(&self) -> &dyn Decompressor {
		self.decompressor.as_ref()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Drops every entry that belongs to `archive`.
	pub fn invalidate(&self, archive: &str) {
		let mut entries = self.entries.lock();
		let stale: Vec<CacheKey> = entries
			.iter()
			.filter(|(key, _)| key.archive() == archive)
			.map(|(key, _)| key.clone())
			.collect();
		for key in &stale {
			entries.pop(key);
		}
		trace!("invalidated {} cache entries of archive '{archive}'", stale.len());
	}

	fn get(&self, key: &CacheKey) -> Option<CacheValue> {
		self.entries.lock().get(key).cloned()
	}

	fn put(&self, key: CacheKey, value: CacheValue) {
		self.entries.lock().put(key, value);
	}

	/// Returns the header of the archive, reading the first 16 KiB on a miss. If
	/// the root directory lies inside that read it is decoded and cached as well.
	pub async fn get_header(&self, source: &dyn RangeSource, cancel: &CancellationToken) -> ArchiveResult<Arc<Header>> {
		let key = CacheKey::Header {
			archive: source.key().to_string(),
		};
		if let Some(CacheValue::Header(header)) = self.get(&key) {
			return Ok(header);
		}

		let response = source.get_bytes(ByteRange::new(0, HEADER_PREFETCH), cancel, None).await?;
		let header = Header::deserialize(&response.data, response.etag.clone())
			.with_context(|| format!("failed to read header of archive '{}'", source.key()))?;

		let prefetched = ByteRange::new(0, response.data.len());
		if header.root_dir.length > 0 && prefetched.contains(&header.root_dir) {
			let directory = self.decode_directory(response.data.read_range(&header.root_dir)?, &header)?;
			self.put(
				CacheKey::Directory {
					archive: source.key().to_string(),
					range: header.root_dir,
					etag: header.etag.clone(),
				},
				CacheValue::Directory(Arc::new(directory)),
			);
		}

		let header = Arc::new(header);
		self.put(key, CacheValue::Header(header.clone()));
		Ok(header)
	}

	pub async fn get_directory(
		&self,
		source: &dyn RangeSource,
		range: ByteRange,
		header: &Header,
		cancel: &CancellationToken,
	) -> ArchiveResult<Arc<Directory>> {
		let key = CacheKey::Directory {
			archive: source.key().to_string(),
			range,
			etag: header.etag.clone(),
		};
		if let Some(CacheValue::Directory(directory)) = self.get(&key) {
			return Ok(directory);
		}

		let data = read_consistent(source, range, header, cancel).await?.data;
		let directory = Arc::new(self.decode_directory(data, header)?);
		self.put(key, CacheValue::Directory(directory.clone()));
		Ok(directory)
	}

	pub async fn get_metadata(
		&self,
		source: &dyn RangeSource,
		header: &Header,
		cancel: &CancellationToken,
	) -> ArchiveResult<Arc<serde_json::Value>> {
		let key = CacheKey::Metadata {
			archive: source.key().to_string(),
			etag: header.etag.clone(),
		};
		if let Some(CacheValue::Metadata(metadata)) = self.get(&key) {
			return Ok(metadata);
		}

		let data = read_consistent(source, header.metadata, header, cancel).await?.data;
		let data = self.decompressor.decompress(data, header.internal_compression)?;
		let metadata: serde_json::Value = if data.is_empty() {
			serde_json::Value::Object(serde_json::Map::new())
		} else {
			serde_json::from_slice(data.as_slice()).context("failed to parse archive metadata as JSON")?
		};

		let metadata = Arc::new(metadata);
		self.put(key, CacheValue::Metadata(metadata.clone()));
		Ok(metadata)
	}

	fn decode_directory(&self, data: Blob, header: &Header) -> ArchiveResult<Directory> {
		let data = self.decompressor.decompress(data, header.internal_compression)?;
		Ok(Directory::deserialize(&data)?)
	}
}

/// Reads `range` under the header's etag and fails with
/// [`ArchiveError::EtagMismatch`] if the source answers for a different version.
pub(crate) async fn read_consistent(
	source: &dyn RangeSource,
	range: ByteRange,
	header: &Header,
	cancel: &CancellationToken,
) -> ArchiveResult<RangeResponse> {
	let response = source.get_bytes(range, cancel, header.etag.as_deref()).await?;
	match (&header.etag, &response.etag) {
		(Some(expected), Some(actual)) if expected != actual => Err(ArchiveError::EtagMismatch),
		_ => Ok(response),
	}
}

impl Default for ResolvedValueCache {
	fn default() -> Self {
		ResolvedValueCache::new(DEFAULT_MAX_ENTRIES, Arc::new(DefaultDecompressor))
	}
}

impl fmt::Debug for ResolvedValueCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedValueCache")
			.field("entries", &self.len())
			.field("decompressor", &self.decompressor)
			.finish()
	}
}
