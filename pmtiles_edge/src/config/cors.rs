//! Cross-Origin Resource Sharing settings.
//!
//! An entry is either `*` or an exact origin such as `https://example.org`.
//! When several entries match a request, the last one wins. Without any entry
//! no `Access-Control-Allow-Origin` header is sent.
//!
//! ```yaml
//! cors:
//!   allowed_origins:
//!     - "https://example.org"
//!     - "*"
//! ```

use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
	#[serde(default)]
	pub allowed_origins: Vec<String>,
}

impl CorsConfig {
	/// Replaces the list when `origins` is not empty.
	pub fn override_allowed_origins(&mut self, origins: &[String]) {
		let origins: Vec<String> = origins
			.iter()
			.map(|origin| origin.trim().to_string())
			.filter(|origin| !origin.is_empty())
			.collect();
		if !origins.is_empty() {
			self.allowed_origins = origins;
		}
	}
}
