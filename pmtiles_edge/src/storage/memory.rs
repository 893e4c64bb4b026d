use super::{Bucket, GetOptions, HttpMetadata, ObjectBody};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use pmtiles_edge_core::Blob;
use std::{collections::HashMap, fmt};
use xxhash_rust::xxh3::xxh3_64;

struct MemoryObject {
	data: Blob,
	etag: String,
	http_metadata: HttpMetadata,
}

/// Keeps objects in memory. Etags are quoted xxh3 hashes of the content, so
/// writing different bytes under a key changes its etag.
#[derive(Default)]
pub struct MemoryBucket {
	objects: RwLock<HashMap<String, MemoryObject>>,
}

impl MemoryBucket {
	pub fn new() -> MemoryBucket {
		MemoryBucket::default()
	}

	/// Stores `data` under `key` and returns the new etag.
	pub fn put(&self, key: &str, data: impl Into<Blob>) -> String {
		self.put_with_metadata(key, data, HttpMetadata::default())
	}

	pub fn put_with_metadata(&self, key: &str, data: impl Into<Blob>, http_metadata: HttpMetadata) -> String {
		let data = data.into();
		let etag = format!("\"{:016x}\"", xxh3_64(data.as_slice()));
		self.objects.write().insert(
			key.to_string(),
			MemoryObject {
				data,
				etag: etag.clone(),
				http_metadata,
			},
		);
		etag
	}

	pub fn delete(&self, key: &str) -> bool {
		self.objects.write().remove(key).is_some()
	}
}

#[async_trait]
impl Bucket for MemoryBucket {
	async fn get(&self, key: &str, options: &GetOptions) -> Result<Option<ObjectBody>> {
		let objects = self.objects.read();
		let Some(object) = objects.get(key) else {
			return Ok(None);
		};

		let matches = options.only_if_etag.as_ref().is_none_or(|etag| *etag == object.etag);
		let body = if matches {
			Some(match options.range {
				Some(range) => object.data.read_range(&range.clamp_to(object.data.len()))?,
				None => object.data.clone(),
			})
		} else {
			None
		};

		Ok(Some(ObjectBody {
			etag: Some(object.etag.clone()),
			body,
			http_metadata: object.http_metadata.clone(),
		}))
	}
}

impl fmt::Debug for MemoryBucket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryBucket")
			.field("objects", &self.objects.read().len())
			.finish()
	}
}
