//! The shared HTTP response cache in front of the archive reader.
//!
//! Entries are keyed by the exact request URL and hold complete responses
//! without any CORS headers; those are added per request on the way out.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
	body::Body,
	http::{HeaderMap, StatusCode, header::CACHE_CONTROL},
	response::Response,
};
use bytes::Bytes;
use log::trace;
use lru::LruCache;
use parking_lot::Mutex;
use std::{fmt, num::NonZeroUsize, time::Duration};
use tokio::time::Instant;

#[derive(Clone, Debug, PartialEq)]
pub struct CachedResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl CachedResponse {
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> CachedResponse {
		CachedResponse {
			status,
			headers,
			body: body.into(),
		}
	}

	pub fn into_response(self) -> Response<Body> {
		let mut response = Response::new(Body::from(self.body));
		*response.status_mut() = self.status;
		*response.headers_mut() = self.headers;
		response
	}
}

#[async_trait]
pub trait EdgeCache: fmt::Debug + Send + Sync {
	async fn lookup(&self, url: &str) -> Result<Option<CachedResponse>>;
	async fn store(&self, url: &str, response: CachedResponse) -> Result<()>;
}

/// How long a response may be served from cache, taken from `s-maxage` or
/// `max-age`. `None` if it must not be stored.
pub fn freshness_lifetime(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(CACHE_CONTROL)?.to_str().ok()?.to_ascii_lowercase();

	let mut max_age = None;
	let mut s_maxage = None;
	for directive in value.split(',').map(str::trim) {
		match directive.split_once('=') {
			Some(("max-age", seconds)) => max_age = seconds.trim_matches('"').parse::<u64>().ok(),
			Some(("s-maxage", seconds)) => s_maxage = seconds.trim_matches('"').parse::<u64>().ok(),
			_ if directive == "no-store" || directive == "private" => return None,
			_ => {}
		}
	}

	s_maxage
		.or(max_age)
		.filter(|seconds| *seconds > 0)
		.map(Duration::from_secs)
}

/// In-process [`EdgeCache`] with a fixed number of entries.
pub struct MemoryEdgeCache {
	entries: Mutex<LruCache<String, (Instant, CachedResponse)>>,
}

impl MemoryEdgeCache {
	pub fn new(max_entries: usize) -> MemoryEdgeCache {
		let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
		MemoryEdgeCache {
			entries: Mutex::new(LruCache::new(capacity)),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
	async fn lookup(&self, url: &str) -> Result<Option<CachedResponse>> {
		let mut entries = self.entries.lock();
		let expired = match entries.get(url) {
			None => return Ok(None),
			Some((expires, response)) if *expires > Instant::now() => return Ok(Some(response.clone())),
			Some(_) => true,
		};
		if expired {
			trace!("edge cache entry for '{url}' expired");
			entries.pop(url);
		}
		Ok(None)
	}

	async fn store(&self, url: &str, response: CachedResponse) -> Result<()> {
		let Some(lifetime) = freshness_lifetime(&response.headers) else {
			trace!("not caching '{url}', response is not cacheable");
			return Ok(());
		};
		let expires = Instant::now() + lifetime;
		self.entries.lock().put(url.to_string(), (expires, response));
		Ok(())
	}
}

impl fmt::Debug for MemoryEdgeCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryEdgeCache").field("entries", &self.len()).finish()
	}
}
