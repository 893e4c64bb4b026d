//! A bucket served over HTTP(S), e.g. a public object storage endpoint. Each
//! read is one conditional range request for `{base_url}/{key}`.

use super::{Bucket, GetOptions, HttpMetadata, ObjectBody};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::warn;
use pmtiles_edge_core::{Blob, ByteRange};
use reqwest::{
	Client, StatusCode, Url,
	header::{CACHE_CONTROL, ETAG, EXPIRES, HeaderMap, IF_MATCH, RANGE},
};
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime, macros::format_description};
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;

#[derive(Debug)]
pub struct HttpBucket {
	client: Client,
	base_url: String,
}

impl HttpBucket {
	pub fn new(base_url: &str) -> Result<HttpBucket> {
		let url = Url::parse(base_url).with_context(|| format!("invalid bucket url '{base_url}'"))?;
		match url.scheme() {
			"http" | "https" => (),
			other => bail!("unsupported URL scheme '{other}' in '{base_url}', expected 'http' or 'https'"),
		}

		let client = Client::builder().tcp_keepalive(Duration::from_secs(600)).build()?;
		Ok(HttpBucket {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	fn object_url(&self, key: &str) -> String {
		format!("{}/{key}", self.base_url)
	}
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout()
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
	headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// Parses an IMF-fixdate such as `Wed, 21 Oct 2015 07:28:00 GMT`.
pub(crate) fn parse_http_date(value: &str) -> Option<OffsetDateTime> {
	let format = format_description!(
		"[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
	);
	PrimitiveDateTime::parse(value.trim(), &format).ok().map(PrimitiveDateTime::assume_utc)
}

#[async_trait]
impl Bucket for HttpBucket {
	async fn get(&self, key: &str, options: &GetOptions) -> Result<Option<ObjectBody>> {
		let url = self.object_url(key);

		for attempt in 0..=MAX_RETRIES {
			if attempt > 0 {
				let backoff = Duration::from_millis(100 << attempt);
				warn!("retry attempt {attempt}/{MAX_RETRIES} reading '{url}', waiting {backoff:?}");
				sleep(backoff).await;
			}

			let mut request = self.client.get(&url);
			if let Some(range) = options.range {
				let last = range.end().max(range.offset + 1) - 1;
				request = request.header(RANGE, format!("bytes={}-{last}", range.offset));
			}
			if let Some(etag) = &options.only_if_etag {
				request = request.header(IF_MATCH, etag);
			}

			let response = match request.send().await {
				Ok(response) => response,
				Err(err) if is_retryable_error(&err) && attempt < MAX_RETRIES => {
					warn!("retryable error: {err}");
					continue;
				}
				Err(err) => return Err(err).with_context(|| format!("failed to request '{url}'")),
			};

			let status = response.status();
			let headers = response.headers();
			let mut object = ObjectBody {
				etag: header_string(headers, ETAG),
				body: None,
				http_metadata: HttpMetadata {
					cache_control: header_string(headers, CACHE_CONTROL),
					cache_expiry: header_string(headers, EXPIRES).and_then(|value| parse_http_date(&value)),
				},
			};

			match status {
				StatusCode::NOT_FOUND => return Ok(None),
				StatusCode::PRECONDITION_FAILED => return Ok(Some(object)),
				StatusCode::RANGE_NOT_SATISFIABLE => {
					object.body = Some(Blob::new_empty());
					return Ok(Some(object));
				}
				status if status.is_success() => {}
				status => bail!("HTTP request for '{url}' failed with status {status}"),
			}

			let bytes = response
				.bytes()
				.await
				.with_context(|| format!("failed to read response body of '{url}'"))?;
			let mut body = Blob::from(bytes);

			if let Some(range) = options.range {
				// Servers without range support answer with the whole object.
				body = if status == StatusCode::OK {
					body.read_range(&range.clamp_to(body.len()))?
				} else if body.len() > range.length {
					body.read_range(&ByteRange::new(0, range.length))?
				} else {
					body
				};
			}

			object.body = Some(body);
			return Ok(Some(object));
		}

		bail!("request for '{url}' failed after {MAX_RETRIES} retries")
	}
}
