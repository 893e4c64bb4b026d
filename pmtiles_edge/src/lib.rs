//! Serves PMTiles archives from object storage over HTTP.
//!
//! Requests look like `/{name}/{z}/{x}/{y}.{ext}` for tiles and `/{name}.json`
//! for TileJSON. The archive `name` is mapped to an object key, read with
//! conditional range requests and answered through an in-process edge cache.
//!
//! - [`path`]: URL path parsing
//! - [`storage`]: buckets and the range source adapter
//! - [`server`]: request handling, caching and the axum server
//! - [`config`]: YAML configuration

pub mod config;
pub mod path;
pub mod server;
pub mod storage;

pub use config::Config;
pub use path::TilePath;
pub use server::{TileHandler, TileServer};
