//! Server lifecycle: building the router, listening on a socket and shutting
//! down gracefully. Request semantics live in [`TileHandler`].

use super::TileHandler;
use crate::{config::Config, storage::bucket_from_location};
use anyhow::{Context, Result};
use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Method, StatusCode, Uri, header},
	response::Response,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Routes every request to the handler. Handler failures become a plain 500
/// that is never cached.
pub fn router(handler: Arc<TileHandler>) -> Router {
	Router::new().fallback(serve_request).with_state(handler)
}

async fn serve_request(
	State(handler): State<Arc<TileHandler>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
) -> Response<Body> {
	log::debug!("handle {method} request: {uri}");
	match handler.fetch(&method, &uri, &headers).await {
		Ok(response) => response,
		Err(err) => {
			log::warn!("send 500 for {method} request: {uri}. Error:\n{}", format_error_chain(&err));
			error_500()
		}
	}
}

fn format_error_chain(err: &anyhow::Error) -> String {
	let mut result = err.to_string();
	for (i, cause) in err.chain().skip(1).enumerate() {
		if i == 0 {
			result.push_str("\n  Caused by:");
		}
		result.push_str(&format!("\n    {cause}"));
	}
	result
}

fn error_500() -> Response<Body> {
	let mut response = Response::new(Body::from("Internal Server Error"));
	*response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
	response
		.headers_mut()
		.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain; charset=utf-8"));
	response
}

#[derive(Debug)]
pub struct TileServer {
	ip: String,
	port: u16,
	handler: Arc<TileHandler>,
	/// One-shot channel to signal graceful shutdown to the serving task.
	exit_signal: Option<oneshot::Sender<()>>,
	join: Option<JoinHandle<()>>,
	local_addr: Option<SocketAddr>,
}

impl TileServer {
	pub fn new(ip: &str, port: u16, handler: Arc<TileHandler>) -> TileServer {
		TileServer {
			ip: ip.to_owned(),
			port,
			handler,
			exit_signal: None,
			join: None,
			local_addr: None,
		}
	}

	/// Opens the configured bucket and creates a server for it.
	pub fn from_config(config: &Config) -> Result<TileServer> {
		let location = config.bucket.as_deref().context("no bucket configured")?;
		let bucket = bucket_from_location(location).with_context(|| format!("failed to open bucket '{location}'"))?;
		let handler = Arc::new(TileHandler::new(bucket, config.handler_settings()));
		Ok(TileServer::new(config.server.ip(), config.server.port(), handler))
	}

	/// Address the server listens on, once started. Useful with port `0`.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		self.local_addr
	}

	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() {
			self.stop().await;
		}

		let addr = format!("{}:{}", self.ip, self.port);
		log::info!("server binding on {addr}");

		let listener = TcpListener::bind(&addr).await?;
		self.local_addr = Some(listener.local_addr()?);
		let (tx, rx) = oneshot::channel::<()>();
		let app = router(self.handler.clone());

		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
			{
				log::error!("server task exited with error: {err}");
			}
		});

		self.exit_signal = Some(tx);
		self.join = Some(handle);
		Ok(())
	}

	/// Stops accepting requests, waits for in-flight ones, then waits for
	/// pending background work such as edge-cache writes.
	pub async fn stop(&mut self) {
		if self.exit_signal.is_none() && self.join.is_none() {
			return;
		}

		log::info!("stopping server");

		if let Some(tx) = self.exit_signal.take() {
			let _ = tx.send(());
		}

		if let Some(handle) = self.join.take() {
			match tokio::time::timeout(Duration::from_secs(10), handle).await {
				Ok(Err(join_err)) => log::warn!("server task join error: {join_err}"),
				Ok(Ok(())) => {}
				Err(_) => log::warn!("server task did not shutdown within timeout; continuing"),
			}
		}

		self.handler.context().drain().await;
		self.local_addr = None;
	}
}
