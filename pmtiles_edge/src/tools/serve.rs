use super::SourceArgs;
use anyhow::Result;
use pmtiles_edge::TileServer;
use tokio::time::{Duration, sleep};

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true, verbatim_doc_comment)]
pub struct Subcommand {
	#[command(flatten)]
	pub source: SourceArgs,

	/// Serve via socket ip. Default: 0.0.0.0
	#[arg(short = 'i', long, display_order = 0)]
	pub ip: Option<String>,

	/// Serve via port. Default: 8080
	#[arg(short, long, display_order = 0)]
	pub port: Option<u16>,

	/// Origins allowed to read responses, comma separated: "*" or exact origins
	#[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',', display_order = 2)]
	pub allowed_origins: Vec<String>,

	/// Cache-Control header of cacheable responses. Default: "public, max-age=86400"
	#[arg(long, env = "CACHE_CONTROL", display_order = 2)]
	pub cache_control: Option<String>,

	/// Hostname used in TileJSON tile URLs instead of the request's host
	#[arg(long, env = "PUBLIC_HOSTNAME", display_order = 2)]
	pub public_hostname: Option<String>,

	/// Shutdown server automatically after x milliseconds.
	#[arg(long, display_order = 4)]
	pub auto_shutdown: Option<u64>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = arguments.source.load_config()?;
	config.server.override_optional_ip(&arguments.ip);
	config.server.override_optional_port(&arguments.port);
	config.cors.override_allowed_origins(&arguments.allowed_origins);
	config.override_optional_cache_control(&arguments.cache_control);
	config.override_optional_public_hostname(&arguments.public_hostname);

	let mut server = TileServer::from_config(&config)?;
	server.start().await?;
	if let Some(addr) = server.local_addr() {
		eprintln!("serving archives of {:?} at http://{addr}/", config.bucket.unwrap_or_default());
	}

	if let Some(milliseconds) = arguments.auto_shutdown {
		sleep(Duration::from_millis(milliseconds)).await;
	} else {
		tokio::signal::ctrl_c().await?;
	}

	server.stop().await;
	Ok(())
}
