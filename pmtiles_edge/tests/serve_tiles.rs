//! End-to-end behavior of the router: archives in a memory bucket, requests
//! through `tower::ServiceExt::oneshot`.

use axum::{
	Router,
	body::{Body, to_bytes},
	http::{HeaderMap, Method, Request, StatusCode, header},
};
use pmtiles_edge::{
	server::{HandlerSettings, TileHandler, router},
	storage::MemoryBucket,
};
use pmtiles_edge_archive::testing::ArchiveBuilder;
use pmtiles_edge_core::{TileCompression, TileCoord, TileType};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tower::ServiceExt;

struct TestServer {
	app: Router,
	handler: Arc<TileHandler>,
	bucket: Arc<MemoryBucket>,
}

fn vector_archive() -> ArchiveBuilder {
	ArchiveBuilder::new(TileType::Mvt)
		.tile_compression(TileCompression::Gzip)
		.zoom_range(0, 2)
		.metadata(serde_json::json!({
			"name": "World",
			"attribution": "© contributors",
			"vector_layers": [{ "id": "water", "fields": {} }],
		}))
		.tile(TileCoord::new(0, 0, 0).unwrap(), b"root tile".to_vec())
		.tile(TileCoord::new(1, 0, 1).unwrap(), b"tile 1/0/1".to_vec())
		.tile(TileCoord::new(1, 1, 1).unwrap(), Vec::new())
}

fn server(settings: HandlerSettings) -> TestServer {
	let bucket = Arc::new(MemoryBucket::new());
	bucket.put("world.pmtiles", vector_archive().build().unwrap());
	bucket.put(
		"raster/satellite.pmtiles",
		ArchiveBuilder::new(TileType::Png)
			.tile(TileCoord::new(0, 0, 0).unwrap(), b"png".to_vec())
			.build()
			.unwrap(),
	);
	let handler = Arc::new(TileHandler::new(bucket.clone(), settings));
	TestServer {
		app: router(handler.clone()),
		handler,
		bucket,
	}
}

struct Reply {
	status: StatusCode,
	headers: HeaderMap,
	body: String,
}

impl TestServer {
	async fn request(&self, method: Method, path: &str, extra: &[(&str, &str)]) -> Reply {
		let mut builder = Request::builder().method(method).uri(path).header(header::HOST, "tiles.example.com");
		for (name, value) in extra {
			builder = builder.header(*name, *value);
		}
		let response = self.app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
		let status = response.status();
		let headers = response.headers().clone();
		let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		Reply {
			status,
			headers,
			body: String::from_utf8_lossy(&body).to_string(),
		}
	}

	async fn get(&self, path: &str) -> Reply {
		self.request(Method::GET, path, &[]).await
	}
}

fn header<'a>(reply: &'a Reply, name: &str) -> Option<&'a str> {
	reply.headers.get(name).map(|v| v.to_str().unwrap())
}

#[tokio::test]
async fn serves_tiles() {
	let server = server(HandlerSettings::default());

	let reply = server.get("/world/1/0/1.mvt").await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(reply.body, "tile 1/0/1");
	assert_eq!(header(&reply, "content-type"), Some("application/x-protobuf"));
	assert_eq!(header(&reply, "cache-control"), Some("public, max-age=86400"));

	let reply = server.get("/raster/satellite/0/0/0.png").await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(reply.body, "png");
	assert_eq!(header(&reply, "content-type"), Some("image/png"));
}

#[tokio::test]
async fn pbf_is_accepted_for_vector_archives() {
	let server = server(HandlerSettings::default());
	let reply = server.get("/world/0/0/0.pbf").await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(reply.body, "root tile");
}

#[tokio::test]
async fn empty_and_missing_tiles_are_no_content() {
	let server = server(HandlerSettings::default());

	for path in ["/world/1/1/1.mvt", "/world/2/3/3.mvt"] {
		let reply = server.get(path).await;
		assert_eq!(reply.status, StatusCode::NO_CONTENT, "{path}");
		assert_eq!(reply.body, "");
		assert_eq!(header(&reply, "content-type"), Some("application/x-protobuf"));
		assert_eq!(header(&reply, "cache-control"), Some("public, max-age=86400"));
	}
}

#[tokio::test]
async fn zoom_outside_the_archive_is_not_found() {
	let server = server(HandlerSettings::default());
	let reply = server.get("/world/3/0/0.mvt").await;
	assert_eq!(reply.status, StatusCode::NOT_FOUND);
	assert_eq!(reply.body, "");
	assert_eq!(header(&reply, "cache-control"), Some("public, max-age=86400"));

	// zoom is checked before the extension
	let reply = server.get("/world/9/0/0.png").await;
	assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_extension_is_a_bad_request() {
	let server = server(HandlerSettings::default());

	let reply = server.get("/world/0/0/0.png").await;
	assert_eq!(reply.status, StatusCode::BAD_REQUEST);
	assert_eq!(reply.body, "Bad request: requested .png but archive has type .mvt");
	assert_eq!(header(&reply, "content-type"), Some("text/plain; charset=utf-8"));

	let reply = server.get("/raster/satellite/0/0/0.mvt").await;
	assert_eq!(reply.status, StatusCode::BAD_REQUEST);
	assert_eq!(reply.body, "Bad request: requested .mvt but archive has type .png");
}

#[tokio::test]
async fn invalid_paths_are_not_found_and_not_cached() {
	let server = server(HandlerSettings {
		allowed_origins: vec!["*".to_string()],
		..HandlerSettings::default()
	});

	for path in ["/", "/world", "/world/1/0.mvt", "/world/a/0/0.mvt", "/world/0/0/0"] {
		let reply = server.request(Method::GET, path, &[("origin", "https://a.org")]).await;
		assert_eq!(reply.status, StatusCode::NOT_FOUND, "{path}");
		assert_eq!(reply.body, "Invalid URL");
		assert_eq!(header(&reply, "content-type"), Some("text/plain; charset=utf-8"));
		assert_eq!(header(&reply, "cache-control"), None);
		assert_eq!(header(&reply, "access-control-allow-origin"), None);
	}
}

#[tokio::test]
async fn unknown_archive_is_not_found() {
	let server = server(HandlerSettings::default());
	let reply = server.get("/nowhere/0/0/0.mvt").await;
	assert_eq!(reply.status, StatusCode::NOT_FOUND);
	assert_eq!(reply.body, "Archive not found");
	assert_eq!(header(&reply, "cache-control"), Some("public, max-age=86400"));
	assert_eq!(header(&reply, "content-type"), Some("text/plain; charset=utf-8"));

	let reply = server.get("/nowhere.json").await;
	assert_eq!(reply.status, StatusCode::NOT_FOUND);
	assert_eq!(reply.body, "Archive not found");
}

#[tokio::test]
async fn only_get_and_head_are_allowed() {
	let server = server(HandlerSettings::default());

	for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
		let reply = server.request(method.clone(), "/world/0/0/0.mvt", &[]).await;
		assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
		assert_eq!(header(&reply, "cache-control"), None);
	}

	let reply = server.request(Method::HEAD, "/world/0/0/0.mvt", &[]).await;
	assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn serves_tilejson() {
	let server = server(HandlerSettings::default());
	let reply = server.get("/world.json").await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(header(&reply, "content-type"), Some("application/json"));

	let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
	assert_eq!(json["tilejson"], "3.0.0");
	assert_eq!(json["scheme"], "xyz");
	assert_eq!(json["tiles"][0], "https://tiles.example.com/world/{z}/{x}/{y}.mvt");
	assert_eq!(json["name"], "World");
	assert_eq!(json["attribution"], "© contributors");
	assert_eq!(json["vector_layers"][0]["id"], "water");
	assert_eq!(json["minzoom"], 0);
	assert_eq!(json["maxzoom"], 2);
	assert!(json.get("description").is_none());
}

#[tokio::test]
async fn tilejson_uses_public_hostname() {
	let server = server(HandlerSettings {
		public_hostname: Some("cdn.example.org".to_string()),
		..HandlerSettings::default()
	});
	let reply = server.get("/world.json").await;
	let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
	assert_eq!(json["tiles"][0], "https://cdn.example.org/world/{z}/{x}/{y}.mvt");
}

#[tokio::test]
async fn configured_cache_control() {
	let server = server(HandlerSettings {
		cache_control: "public, max-age=60, immutable".to_string(),
		..HandlerSettings::default()
	});
	let reply = server.get("/world/0/0/0.mvt").await;
	assert_eq!(header(&reply, "cache-control"), Some("public, max-age=60, immutable"));
}

#[tokio::test]
async fn cors_wildcard() {
	let server = server(HandlerSettings {
		allowed_origins: vec!["*".to_string()],
		..HandlerSettings::default()
	});

	let reply = server.request(Method::GET, "/world/0/0/0.mvt", &[("origin", "https://a.org")]).await;
	assert_eq!(header(&reply, "access-control-allow-origin"), Some("*"));
	assert_eq!(header(&reply, "vary"), Some("Origin"));

	let reply = server.get("/world/0/0/0.mvt").await;
	assert_eq!(header(&reply, "access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn cors_exact_match() {
	let server = server(HandlerSettings {
		allowed_origins: vec!["https://a.org".to_string()],
		..HandlerSettings::default()
	});

	let reply = server.request(Method::GET, "/world/0/0/0.mvt", &[("origin", "https://a.org")]).await;
	assert_eq!(header(&reply, "access-control-allow-origin"), Some("https://a.org"));

	let reply = server.request(Method::GET, "/world/0/0/0.mvt", &[("origin", "https://b.org")]).await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(header(&reply, "access-control-allow-origin"), None);
	assert_eq!(header(&reply, "vary"), Some("Origin"));
}

#[tokio::test]
async fn cached_replies_differ_only_in_cors_headers() {
	let server = server(HandlerSettings {
		allowed_origins: vec!["https://a.org".to_string(), "https://b.org".to_string()],
		..HandlerSettings::default()
	});

	let first = server.request(Method::GET, "/world/1/0/1.mvt", &[("origin", "https://a.org")]).await;
	server.handler.context().drain().await;

	// the archive is gone, so the second reply can only come from the edge cache
	assert!(server.bucket.delete("world.pmtiles"));
	let second = server.request(Method::GET, "/world/1/0/1.mvt", &[("origin", "https://b.org")]).await;

	assert_eq!(first.status, second.status);
	assert_eq!(first.body, second.body);
	assert_eq!(header(&first, "access-control-allow-origin"), Some("https://a.org"));
	assert_eq!(header(&second, "access-control-allow-origin"), Some("https://b.org"));

	let strip = |headers: &HeaderMap| {
		let mut headers = headers.clone();
		headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);
		headers
	};
	assert_eq!(strip(&first.headers), strip(&second.headers));

	let uncached = server.get("/world/0/0/0.mvt").await;
	assert_eq!(uncached.status, StatusCode::NOT_FOUND);
	assert_eq!(uncached.body, "Archive not found");
}

#[tokio::test]
async fn replaced_archive_is_read_again() {
	let server = server(HandlerSettings {
		cache_control: "no-store".to_string(),
		..HandlerSettings::default()
	});

	let reply = server.get("/world/0/0/0.mvt").await;
	assert_eq!(reply.body, "root tile");

	server.bucket.put(
		"world.pmtiles",
		vector_archive()
			.tile(TileCoord::new(0, 0, 0).unwrap(), b"new root tile".to_vec())
			.build()
			.unwrap(),
	);

	let reply = server.get("/world/0/0/0.mvt").await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(reply.body, "new root tile");
}

#[tokio::test]
async fn upstream_failures_are_internal_errors_and_not_cached() {
	let server = server(HandlerSettings::default());
	server.bucket.put("broken.pmtiles", b"this is not a pmtiles archive".to_vec());

	let reply = server.get("/broken/0/0/0.mvt").await;
	assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(reply.body, "Internal Server Error");
	assert_eq!(header(&reply, "content-type"), Some("text/plain; charset=utf-8"));
	assert_eq!(header(&reply, "cache-control"), None);
	server.handler.context().drain().await;

	server.bucket.put(
		"broken.pmtiles",
		ArchiveBuilder::new(TileType::Mvt)
			.tile(TileCoord::new(0, 0, 0).unwrap(), b"ok".to_vec())
			.build()
			.unwrap(),
	);

	let reply = server.get("/broken/0/0/0.mvt").await;
	assert_eq!(reply.status, StatusCode::OK);
	assert_eq!(reply.body, "ok");
	assert_eq!(header(&reply, "content-type"), Some("application/x-protobuf"));
}
