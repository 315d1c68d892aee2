/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A running poll loop. Dropping the handle does not stop the loop; call
/// `stop` or cancel the token.
pub struct PollHandle {
	shutdown: CancellationToken,
	task: JoinHandle<()>,
}

impl PollHandle {
	pub fn token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	/// Cancels the loop and waits for it to finish. Any fetch in flight is
	/// abandoned and its result is never handed to the sink.
	pub async fn stop(self) {
		self.shutdown.cancel();
		self.wait().await;
	}

	/// Waits for the loop to end, which only happens once it is cancelled.
	pub async fn wait(self) {
		if let Err(e) = self.task.await {
			tracing::error!("poll task ended abnormally: {}", e);
		}
	}
}

/// Runs `fetch` on a fixed interval, starting immediately, and hands each
/// result to `sink`. Fetches never overlap: when one outlasts the interval
/// the ticks it missed are skipped rather than bunched up.
pub fn spawn<F, Fut, T, S>(
	interval: Duration,
	shutdown: CancellationToken,
	mut fetch: F,
	mut sink: S,
) -> PollHandle
where
	F: FnMut() -> Fut + Send + 'static,
	Fut: Future<Output = T> + Send + 'static,
	T: Send + 'static,
	S: FnMut(T) + Send + 'static,
{
	let token = shutdown.clone();
	let task = tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

		loop {
			tokio::select! {
				_ = ticker.tick() => {},
				_ = token.cancelled() => break,
			}

			tokio::select! {
				result = fetch() => sink(result),
				_ = token.cancelled() => break,
			}
		}
		tracing::debug!("poller stopped");
	});

	PollHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	#[tokio::test]
	async fn test_polls_until_stopped() {
		let fetches = Arc::new(AtomicUsize::new(0));
		let delivered = Arc::new(AtomicUsize::new(0));
		let (f, d) = (fetches.clone(), delivered.clone());

		let handle = spawn(
			Duration::from_millis(10),
			CancellationToken::new(),
			move || {
				let f = f.clone();
				async move { f.fetch_add(1, Ordering::SeqCst) }
			},
			move |_| {
				d.fetch_add(1, Ordering::SeqCst);
			},
		);

		tokio::time::sleep(Duration::from_millis(60)).await;
		handle.stop().await;

		let seen = delivered.load(Ordering::SeqCst);
		assert!(seen >= 2, "expected several polls, saw {}", seen);

		tokio::time::sleep(Duration::from_millis(40)).await;
		assert_eq!(delivered.load(Ordering::SeqCst), seen);
		assert_eq!(fetches.load(Ordering::SeqCst), seen);
	}

	#[tokio::test]
	async fn test_cancelling_token_ends_slow_fetch() {
		let delivered = Arc::new(AtomicUsize::new(0));
		let d = delivered.clone();
		let token = CancellationToken::new();

		let handle = spawn(
			Duration::from_millis(5),
			token.clone(),
			|| tokio::time::sleep(Duration::from_secs(60)),
			move |_| {
				d.fetch_add(1, Ordering::SeqCst);
			},
		);

		tokio::time::sleep(Duration::from_millis(20)).await;
		token.cancel();
		tokio::time::timeout(Duration::from_secs(1), handle.wait())
			.await
			.unwrap();
		assert_eq!(delivered.load(Ordering::SeqCst), 0);
	}
}
