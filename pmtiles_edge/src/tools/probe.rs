use super::SourceArgs;
use anyhow::{Context, Result};
use pmtiles_edge::TileHandler;
use pmtiles_edge_archive::Header;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// Name of the archive, as used in request paths
	pub name: String,

	#[command(flatten)]
	pub source: SourceArgs,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = arguments.source.load_config()?;
	let location = config.bucket.as_deref().context("no bucket configured")?;
	let bucket = pmtiles_edge::storage::bucket_from_location(location)?;
	let handler = TileHandler::new(bucket, config.handler_settings());
	let pmtiles = handler.open_archive(&arguments.name);
	let cancel = CancellationToken::new();

	let header = pmtiles
		.header(&cancel)
		.await
		.with_context(|| format!("failed to read header of '{}'", arguments.name))?;
	println!("{}", describe_header(&header));

	let host = config.public_hostname.as_deref().unwrap_or("localhost");
	let tile_json = pmtiles
		.tile_json(&format!("https://{host}/{}", arguments.name), &cancel)
		.await
		.with_context(|| format!("failed to read metadata of '{}'", arguments.name))?;
	println!("{}", tile_json.to_json_string());
	Ok(())
}

fn describe_header(header: &Header) -> String {
	let [min_lon, min_lat, max_lon, max_lat] = header.bounds();
	let (center_lon, center_lat, center_zoom) = header.center();
	[
		format!("tile type:            {}", header.tile_type),
		format!("tile compression:     {}", header.tile_compression),
		format!("internal compression: {}", header.internal_compression),
		format!("zoom levels:          {}..={}", header.min_zoom, header.max_zoom),
		format!("bounds:               [{min_lon}, {min_lat}, {max_lon}, {max_lat}]"),
		format!("center:               [{center_lon}, {center_lat}, {center_zoom}]"),
		format!("addressed tiles:      {}", header.addressed_tiles_count),
		format!("tile entries:         {}", header.tile_entries_count),
		format!("tile contents:        {}", header.tile_contents_count),
		format!("clustered:            {}", header.clustered),
		format!("etag:                 {}", header.etag.as_deref().unwrap_or("-")),
	]
	.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::run_command;
	use pmtiles_edge_archive::testing::ArchiveBuilder;
	use pmtiles_edge_core::{TileCoord, TileType};

	#[test]
	fn probe_folder_archive() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let blob = ArchiveBuilder::new(TileType::Png)
			.tile(TileCoord::new(0, 0, 0)?, b"png".to_vec())
			.build()?;
		std::fs::write(dir.path().join("world.pmtiles"), blob.as_slice())?;

		run_command(vec![
			"pmtiles-edge",
			"probe",
			"world",
			"--bucket",
			dir.path().to_str().unwrap(),
		])?;
		Ok(())
	}

	#[test]
	fn probe_missing_archive() {
		let dir = tempfile::tempdir().unwrap();
		let err = run_command(vec![
			"pmtiles-edge",
			"probe",
			"nothing",
			"--bucket",
			dir.path().to_str().unwrap(),
		])
		.unwrap_err();
		assert_eq!(err.to_string(), "failed to read header of 'nothing'");
	}

	#[test]
	fn header_description() -> Result<()> {
		let blob = ArchiveBuilder::new(TileType::Mvt)
			.zoom_range(2, 5)
			.tile(TileCoord::new(2, 1, 1)?, b"mvt".to_vec())
			.build()?;
		let header = Header::deserialize(&blob, Some("\"abc\"".to_string()))?;
		let text = describe_header(&header);
		assert!(text.contains("tile type:            mvt"));
		assert!(text.contains("zoom levels:          2..=5"));
		assert!(text.contains("etag:                 \"abc\""));
		Ok(())
	}
}
