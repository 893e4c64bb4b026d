use super::{CacheConfig, CorsConfig, ServerConfig};
use crate::server::{DEFAULT_CACHE_CONTROL, HandlerSettings};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// HTTP server configuration
	#[serde(default)]
	pub server: ServerConfig,

	/// Cross-Origin Resource Sharing settings
	#[serde(default)]
	pub cors: CorsConfig,

	/// Cache capacities
	#[serde(default)]
	pub cache: CacheConfig,

	/// Where archives are stored: a folder, `http(s)://` URL or `memory:`.
	pub bucket: Option<String>,

	/// `Cache-Control` value of cacheable responses. Default: `public, max-age=86400`
	pub cache_control: Option<String>,

	/// Object key template, `{name}` is replaced by the archive name.
	/// Default: `{name}.pmtiles`
	pub pmtiles_path: Option<String>,

	/// Hostname used in TileJSON tile URLs instead of the request's host.
	pub public_hostname: Option<String>,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open config file {path:?}"))?;
		Config::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse config file {path:?}"))
	}

	fn override_optional(target: &mut Option<String>, value: &Option<String>) {
		if value.is_some() {
			*target = value.clone();
		}
	}

	pub fn override_optional_bucket(&mut self, bucket: &Option<String>) {
		Self::override_optional(&mut self.bucket, bucket);
	}

	pub fn override_optional_cache_control(&mut self, cache_control: &Option<String>) {
		Self::override_optional(&mut self.cache_control, cache_control);
	}

	pub fn override_optional_pmtiles_path(&mut self, pmtiles_path: &Option<String>) {
		Self::override_optional(&mut self.pmtiles_path, pmtiles_path);
	}

	pub fn override_optional_public_hostname(&mut self, public_hostname: &Option<String>) {
		Self::override_optional(&mut self.public_hostname, public_hostname);
	}

	/// Settings for the request handler. Empty strings count as unset.
	pub fn handler_settings(&self) -> HandlerSettings {
		let non_empty = |value: &Option<String>| value.as_ref().filter(|v| !v.trim().is_empty()).cloned();
		HandlerSettings {
			allowed_origins: self.cors.allowed_origins.clone(),
			cache_control: non_empty(&self.cache_control).unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_string()),
			pmtiles_path: non_empty(&self.pmtiles_path),
			public_hostname: non_empty(&self.public_hostname),
			archive_cache_entries: self.cache.archive_entries,
			edge_cache_entries: self.cache.edge_entries,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::io::Write;

	#[test]
	fn parse_full_config() {
		let cfg = Config::from_string(
			"server:\n  ip: 127.0.0.1\n  port: 51234\ncors:\n  allowed_origins:\n    - https://example.org\n    - \"*\"\ncache:\n  archive_entries: 100\nbucket: ./data\ncache_control: public, max-age=60\npmtiles_path: tiles/{name}/archive.pmtiles\npublic_hostname: tiles.example.org\n",
		)
		.unwrap();

		assert_eq!(
			cfg,
			Config {
				server: ServerConfig {
					ip: Some("127.0.0.1".to_string()),
					port: Some(51234),
				},
				cors: CorsConfig {
					allowed_origins: vec!["https://example.org".to_string(), "*".to_string()],
				},
				cache: CacheConfig {
					archive_entries: 100,
					edge_entries: 10_000,
				},
				bucket: Some("./data".to_string()),
				cache_control: Some("public, max-age=60".to_string()),
				pmtiles_path: Some("tiles/{name}/archive.pmtiles".to_string()),
				public_hostname: Some("tiles.example.org".to_string()),
			}
		);
	}

	#[test]
	fn parse_empty_config() {
		assert_eq!(Config::from_string("").unwrap(), Config::default());
	}

	#[test]
	fn reject_unknown_keys() {
		assert!(Config::from_string("server:\n  pi: 3.14").is_err());
		assert!(Config::from_string("buckets: ./data").is_err());
	}

	#[test]
	fn from_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "bucket: \"memory:\"").unwrap();
		let cfg = Config::from_path(file.path()).unwrap();
		assert_eq!(cfg.bucket.as_deref(), Some("memory:"));

		let err = Config::from_path(Path::new("/does/not/exist.yml")).unwrap_err();
		assert!(err.to_string().starts_with("failed to open config file"));
	}

	#[test]
	fn overrides_replace_only_given_values() {
		let mut cfg = Config::from_string("cache_control: no-cache\nbucket: a").unwrap();
		cfg.override_optional_bucket(&Some("b".to_string()));
		cfg.override_optional_cache_control(&None);
		cfg.override_optional_public_hostname(&Some("example.org".to_string()));
		cfg.override_optional_pmtiles_path(&None);
		assert_eq!(cfg.bucket.as_deref(), Some("b"));
		assert_eq!(cfg.cache_control.as_deref(), Some("no-cache"));
		assert_eq!(cfg.public_hostname.as_deref(), Some("example.org"));
		assert_eq!(cfg.pmtiles_path, None);
	}

	#[test]
	fn handler_settings_fall_back_to_defaults() {
		let settings = Config::from_string("cache_control: \"\"\npmtiles_path: \"\"").unwrap().handler_settings();
		assert_eq!(settings.cache_control, "public, max-age=86400");
		assert_eq!(settings.pmtiles_path, None);
		assert_eq!(settings.public_hostname, None);
		assert_eq!(settings.archive_cache_entries, 25);
		assert_eq!(settings.edge_cache_entries, 10_000);
		assert!(settings.allowed_origins.is_empty());
	}
}
