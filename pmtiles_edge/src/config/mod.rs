//! Server configuration.
//!
//! Settings are layered: built-in defaults, then a YAML file, then environment
//! variables and command line flags (the last two are applied by the CLI through
//! the `override_optional_*` methods).
//!
//! - [`Config`]: top-level YAML document
//! - [`ServerConfig`]: socket settings
//! - [`CorsConfig`]: allowed origins
//! - [`CacheConfig`]: capacities of the in-process caches

mod cache;
mod cors;
mod main;
mod server;

pub use cache::CacheConfig;
pub use cors::CorsConfig;
pub use main::Config;
pub use server::ServerConfig;
