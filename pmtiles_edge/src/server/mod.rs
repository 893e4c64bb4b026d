//! HTTP side of the edge server: request handling, response composition, the
//! edge cache and the axum server around them.

mod context;
mod cors;
mod edge_cache;
mod handler;
mod tile_server;

pub use context::ExecutionContext;
pub use cors::allowed_origin;
pub use edge_cache::{CachedResponse, EdgeCache, MemoryEdgeCache};
pub use handler::{DEFAULT_CACHE_CONTROL, DEFAULT_EDGE_CACHE_ENTRIES, HandlerSettings, TileHandler};
pub use tile_server::{TileServer, router};
