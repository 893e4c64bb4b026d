//! A bucket backed by a local directory; object keys are relative file paths.

use super::{Bucket, GetOptions, HttpMetadata, ObjectBody};
use anyhow::{Context, Result, bail, ensure};
use async_trait::async_trait;
use pmtiles_edge_core::{Blob, ByteRange};
use std::{
	io::{ErrorKind, SeekFrom},
	path::{Component, Path, PathBuf},
	time::UNIX_EPOCH,
};
use tokio::{
	fs::File,
	io::{AsyncReadExt, AsyncSeekExt},
};

#[derive(Debug)]
pub struct FolderBucket {
	root: PathBuf,
}

impl FolderBucket {
	pub fn new(root: &Path) -> Result<FolderBucket> {
		ensure!(root.is_dir(), "bucket folder {root:?} does not exist");
		let root = root.canonicalize().with_context(|| format!("failed to resolve bucket folder {root:?}"))?;
		Ok(FolderBucket { root })
	}

	fn resolve(&self, key: &str) -> Result<PathBuf> {
		let relative = Path::new(key);
		for component in relative.components() {
			match component {
				Component::Normal(_) | Component::CurDir => {}
				_ => bail!("object key '{key}' must stay inside the bucket folder"),
			}
		}
		Ok(self.root.join(relative))
	}
}

/// Etag of a file version, derived from size and modification time.
fn file_etag(metadata: &std::fs::Metadata) -> String {
	let modified = metadata
		.modified()
		.ok()
		.and_then(|time| time.duration_since(UNIX_EPOCH).ok())
		.map_or(0, |duration| duration.as_nanos());
	format!("\"{:x}-{modified:x}\"", metadata.len())
}

#[async_trait]
impl Bucket for FolderBucket {
	async fn get(&self, key: &str, options: &GetOptions) -> Result<Option<ObjectBody>> {
		let path = self.resolve(key)?;

		let mut file = match File::open(&path).await {
			Ok(file) => file,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err).with_context(|| format!("failed to open {path:?}")),
		};
		let metadata = file.metadata().await?;
		if !metadata.is_file() {
			return Ok(None);
		}

		let etag = file_etag(&metadata);
		let mut object = ObjectBody {
			etag: Some(etag.clone()),
			body: None,
			http_metadata: HttpMetadata::default(),
		};
		if options.only_if_etag.as_ref().is_some_and(|expected| *expected != etag) {
			return Ok(Some(object));
		}

		let size = metadata.len();
		let range = options.range.map_or_else(
			|| ByteRange::new(0, size),
			|range| range.clamp_to(size),
		);

		let mut buffer = vec![0; range.length as usize];
		file.seek(SeekFrom::Start(range.offset)).await?;
		file
			.read_exact(&mut buffer)
			.await
			.with_context(|| format!("failed to read range {range} of {path:?}"))?;

		object.body = Some(Blob::from(buffer));
		Ok(Some(object))
	}
}
