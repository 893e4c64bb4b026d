use std::future::Future;
use tokio_util::task::TaskTracker;

/// Runs work that must complete after the response has been sent, such as
/// edge-cache writes.
///
/// Tasks are detached from the request: the response never waits for them and
/// their outcome never changes it. [`ExecutionContext::drain`] waits for all of
/// them, which the server does during shutdown.
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
	tracker: TaskTracker,
}

impl ExecutionContext {
	pub fn new() -> ExecutionContext {
		ExecutionContext::default()
	}

	pub fn wait_until<F>(&self, future: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		self.tracker.spawn(future);
	}

	/// Number of tasks still running.
	pub fn pending(&self) -> usize {
		self.tracker.len()
	}

	pub async fn drain(&self) {
		self.tracker.close();
		self.tracker.wait().await;
		self.tracker.reopen();
	}
}
