//! Request handling and response composition.
//!
//! Every request runs through the same pipeline: method check, path parsing,
//! CORS resolution, edge-cache lookup, and on a miss the archive reader.
//! Responses built from archive data are "cacheable": they receive the
//! configured `Cache-Control`, are written to the edge cache in the background,
//! and are returned with CORS headers added.

use super::{CachedResponse, EdgeCache, ExecutionContext, MemoryEdgeCache, allowed_origin};
use crate::{
	path::TilePath,
	storage::{Bucket, BucketSource},
};
use anyhow::{Context, Result};
use axum::{
	body::Body,
	http::{
		HeaderMap, HeaderValue, Method, StatusCode, Uri,
		header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, HOST, ORIGIN, VARY},
		uri::Authority,
	},
	response::Response,
};
use bytes::Bytes;
use log::{debug, warn};
use pmtiles_edge_archive::{ArchiveError, ArchiveResult, DEFAULT_MAX_ENTRIES, PMTiles, ResolvedValueCache};
use pmtiles_edge_core::TileCoord;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=86400";
pub const DEFAULT_EDGE_CACHE_ENTRIES: usize = 10_000;
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Clone, Debug, PartialEq)]
pub struct HandlerSettings {
	/// Entries are `*` or exact origins; see [`allowed_origin`].
	pub allowed_origins: Vec<String>,
	pub cache_control: String,
	/// Object key template, see [`pmtiles_path`](crate::storage::pmtiles_path).
	pub pmtiles_path: Option<String>,
	/// Host used in TileJSON tile URLs instead of the request host.
	pub public_hostname: Option<String>,
	pub archive_cache_entries: usize,
	pub edge_cache_entries: usize,
}

impl Default for HandlerSettings {
	fn default() -> Self {
		HandlerSettings {
			allowed_origins: Vec::new(),
			cache_control: DEFAULT_CACHE_CONTROL.to_string(),
			pmtiles_path: None,
			public_hostname: None,
			archive_cache_entries: DEFAULT_MAX_ENTRIES,
			edge_cache_entries: DEFAULT_EDGE_CACHE_ENTRIES,
		}
	}
}

#[derive(Debug)]
pub struct TileHandler {
	bucket: Arc<dyn Bucket>,
	value_cache: Arc<ResolvedValueCache>,
	edge_cache: Arc<dyn EdgeCache>,
	context: ExecutionContext,
	settings: HandlerSettings,
}

impl TileHandler {
	pub fn new(bucket: Arc<dyn Bucket>, settings: HandlerSettings) -> TileHandler {
		let value_cache = Arc::new(ResolvedValueCache::new(
			settings.archive_cache_entries,
			Arc::new(pmtiles_edge_archive::DefaultDecompressor),
		));
		let edge_cache = Arc::new(MemoryEdgeCache::new(settings.edge_cache_entries));
		TileHandler {
			bucket,
			value_cache,
			edge_cache,
			context: ExecutionContext::new(),
			settings,
		}
	}

	#[must_use]
	pub fn with_edge_cache(mut self, edge_cache: Arc<dyn EdgeCache>) -> Self {
		self.edge_cache = edge_cache;
		self
	}

	#[must_use]
	pub fn with_value_cache(mut self, value_cache: Arc<ResolvedValueCache>) -> Self {
		self.value_cache = value_cache;
		self
	}

	pub fn context(&self) -> &ExecutionContext {
		&self.context
	}

	pub fn settings(&self) -> &HandlerSettings {
		&self.settings
	}

	/// Opens archive `name` for the duration of one request.
	pub fn open_archive(&self, name: &str) -> PMTiles {
		let source = BucketSource::new(self.bucket.clone(), name, self.settings.pmtiles_path.as_deref());
		PMTiles::new(Arc::new(source), self.value_cache.clone())
	}

	/// Answers one request. Errors are failures that must become a 500 and never
	/// reach the edge cache.
	pub async fn fetch(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<Response<Body>> {
		if *method != Method::GET && *method != Method::HEAD {
			return Ok(empty_response(StatusCode::METHOD_NOT_ALLOWED));
		}

		let Some(tile_path) = TilePath::parse(uri.path()) else {
			debug!("send 404 for invalid path '{}'", uri.path());
			return Ok(text_response(StatusCode::NOT_FOUND, "Invalid URL"));
		};

		let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
		let allowed_origin = allowed_origin(&self.settings.allowed_origins, origin);

		let url = request_url(uri, headers);
		match self.edge_cache.lookup(&url).await {
			Ok(Some(cached)) => {
				debug!("edge cache hit for '{url}'");
				let mut response = cached.into_response();
				add_cors_headers(response.headers_mut(), allowed_origin);
				return Ok(response);
			}
			Ok(None) => {}
			Err(err) => warn!("edge cache lookup for '{url}' failed: {err:#}"),
		}

		// Fires when this future is dropped, e.g. because the client went away.
		let cancel = CancellationToken::new();
		let _cancel_on_drop = cancel.clone().drop_guard();

		let hostname = request_hostname(uri, headers);
		let reply = match self.resolve(&tile_path, &hostname, &cancel).await {
			Ok(reply) => reply,
			Err(ArchiveError::KeyNotFound(name)) => {
				debug!("archive '{name}' not found");
				CachedResponse::new(StatusCode::NOT_FOUND, text_headers(), "Archive not found")
			}
			Err(err) => {
				return Err(anyhow::Error::from(err)).with_context(|| format!("failed to serve '{tile_path}'"));
			}
		};

		Ok(self.cacheable_response(url, reply, allowed_origin))
	}

	/// Resolves a parsed path against its archive.
	async fn resolve(
		&self,
		tile_path: &TilePath,
		hostname: &str,
		cancel: &CancellationToken,
	) -> ArchiveResult<CachedResponse> {
		let pmtiles = self.open_archive(&tile_path.name);
		let header = pmtiles.header(cancel).await?;
		let mut headers = HeaderMap::new();

		let Some((z, x, y)) = tile_path.tile else {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
			let host = self.settings.public_hostname.as_deref().unwrap_or(hostname);
			let base_url = format!("https://{host}/{}", tile_path.name);
			let tilejson = pmtiles.tile_json(&base_url, cancel).await?;
			return Ok(CachedResponse::new(StatusCode::OK, headers, tilejson.to_json_string()));
		};

		if !header.contains_zoom(z) {
			debug!("zoom {z} of '{tile_path}' outside {}..={}", header.min_zoom, header.max_zoom);
			return Ok(CachedResponse::new(StatusCode::NOT_FOUND, headers, Bytes::new()));
		}

		let tile_type = header.tile_type;
		if !tile_type.accepts_extension(&tile_path.extension) {
			let message = format!(
				"Bad request: requested .{} but archive has type .{}",
				tile_path.extension,
				tile_type.extension().unwrap_or_default()
			);
			return Ok(CachedResponse::new(StatusCode::BAD_REQUEST, text_headers(), message));
		}

		let coord = TileCoord::from_signed(z, x, y)?;
		let tile = pmtiles.get_tile(&coord, cancel).await?;

		if let Some(mime) = tile_type.mime() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime));
		}

		Ok(match tile {
			Some(tile) if !tile.data.is_empty() => CachedResponse::new(StatusCode::OK, headers, tile.data.into_bytes()),
			_ => CachedResponse::new(StatusCode::NO_CONTENT, headers, Bytes::new()),
		})
	}

	/// Stamps `Cache-Control`, hands a copy to the edge cache without waiting for
	/// it, and returns the response with CORS headers.
	fn cacheable_response(&self, url: String, mut reply: CachedResponse, allowed_origin: Option<&str>) -> Response<Body> {
		match HeaderValue::from_str(&self.settings.cache_control) {
			Ok(value) => {
				reply.headers.insert(CACHE_CONTROL, value);
			}
			Err(err) => warn!("invalid Cache-Control value '{}': {err}", self.settings.cache_control),
		}

		let edge_cache = self.edge_cache.clone();
		let stored = reply.clone();
		self.context.wait_until(async move {
			if let Err(err) = edge_cache.store(&url, stored).await {
				warn!("failed to store '{url}' in edge cache: {err:#}");
			}
		});

		let mut response = reply.into_response();
		add_cors_headers(response.headers_mut(), allowed_origin);
		response
	}
}

fn add_cors_headers(headers: &mut HeaderMap, allowed_origin: Option<&str>) {
	if let Some(value) = allowed_origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
		headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
	}
	headers.insert(VARY, HeaderValue::from_static("Origin"));
}

fn empty_response(status: StatusCode) -> Response<Body> {
	let mut response = Response::new(Body::empty());
	*response.status_mut() = status;
	response
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Body> {
	let mut response = Response::new(Body::from(message));
	*response.status_mut() = status;
	*response.headers_mut() = text_headers();
	response
}

fn text_headers() -> HeaderMap {
	let mut headers = HeaderMap::new();
	headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
	headers
}

fn request_authority(uri: &Uri, headers: &HeaderMap) -> String {
	uri.authority()
		.map(Authority::to_string)
		.or_else(|| {
			headers
				.get(HOST)
				.and_then(|value| value.to_str().ok())
				.map(str::to_string)
		})
		.unwrap_or_else(|| "localhost".to_string())
}

/// The full URL a request was made for; the edge cache key.
pub(crate) fn request_url(uri: &Uri, headers: &HeaderMap) -> String {
	let scheme = uri.scheme_str().unwrap_or("http");
	let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
	format!("{scheme}://{}{path_and_query}", request_authority(uri, headers))
}

/// Host of the request without port.
pub(crate) fn request_hostname(uri: &Uri, headers: &HeaderMap) -> String {
	let authority = request_authority(uri, headers);
	match authority.parse::<Authority>() {
		Ok(authority) => authority.host().to_string(),
		Err(_) => authority,
	}
}
