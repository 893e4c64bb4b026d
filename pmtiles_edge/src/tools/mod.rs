pub mod probe;
pub mod serve;

use anyhow::Result;
use pmtiles_edge::Config;
use std::path::PathBuf;

/// Where archives come from. Shared by all subcommands.
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
	/// YAML configuration file. Command line arguments and environment
	/// variables override its settings.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0)]
	pub config: Option<PathBuf>,

	/// Bucket holding the archives: a local folder, an http(s):// URL or "memory:"
	#[arg(short = 'b', long, env = "BUCKET", display_order = 0)]
	pub bucket: Option<String>,

	/// Object key template for archives, "{name}" is replaced by the archive name.
	/// Default: "{name}.pmtiles"
	#[arg(long, env = "PMTILES_PATH", display_order = 1)]
	pub pmtiles_path: Option<String>,
}

impl SourceArgs {
	pub fn load_config(&self) -> Result<Config> {
		let mut config = if let Some(path) = &self.config {
			Config::from_path(path)?
		} else {
			Config::default()
		};
		config.override_optional_bucket(&self.bucket);
		config.override_optional_pmtiles_path(&self.pmtiles_path);
		Ok(config)
	}
}
