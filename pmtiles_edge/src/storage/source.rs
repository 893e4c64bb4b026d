use super::{Bucket, GetOptions};
use async_trait::async_trait;
use pmtiles_edge_archive::{ArchiveError, ArchiveResult, RangeResponse, RangeSource};
use pmtiles_edge_core::ByteRange;
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Object key of archive `name`. A template containing `{name}` has every
/// occurrence replaced; otherwise the key is `{name}.pmtiles`.
pub fn pmtiles_path(name: &str, template: Option<&str>) -> String {
	match template {
		Some(template) if template.contains("{name}") => template.replace("{name}", name),
		_ => format!("{name}.pmtiles"),
	}
}

/// Reads one archive out of a [`Bucket`].
pub struct BucketSource {
	bucket: Arc<dyn Bucket>,
	name: String,
	object_key: String,
}

impl BucketSource {
	pub fn new(bucket: Arc<dyn Bucket>, name: &str, template: Option<&str>) -> BucketSource {
		BucketSource {
			bucket,
			name: name.to_string(),
			object_key: pmtiles_path(name, template),
		}
	}

	pub fn object_key(&self) -> &str {
		&self.object_key
	}
}

#[async_trait]
impl RangeSource for BucketSource {
	fn key(&self) -> &str {
		&self.name
	}

	async fn get_bytes(
		&self,
		range: ByteRange,
		cancel: &CancellationToken,
		etag: Option<&str>,
	) -> ArchiveResult<RangeResponse> {
		let options = GetOptions {
			range: Some(range),
			only_if_etag: etag.map(str::to_string),
		};

		let object = tokio::select! {
			biased;
			() = cancel.cancelled() => return Err(ArchiveError::Cancelled),
			result = self.bucket.get(&self.object_key, &options) => result?,
		};

		let Some(object) = object else {
			return Err(ArchiveError::KeyNotFound(self.name.clone()));
		};
		let Some(data) = object.body else {
			return Err(ArchiveError::EtagMismatch);
		};

		Ok(RangeResponse {
			data,
			etag: object.etag,
			cache_control: object.http_metadata.cache_control,
			expires: object.http_metadata.cache_expiry,
		})
	}
}

impl fmt::Debug for BucketSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BucketSource")
			.field("name", &self.name)
			.field("object_key", &self.object_key)
			.finish()
	}
}
