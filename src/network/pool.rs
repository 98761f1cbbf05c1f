// Copyright 2022 Parity Technologies (UK) Ltd.
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Bounded pool of workers draining a shared packet queue.

use crate::core::{Error, QueueDiscipline};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Processes one queued item.
pub type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct Queue<T> {
	items: VecDeque<T>,
	capacity: usize,
	discipline: QueueDiscipline,
}

impl<T> Queue<T> {
	fn remaining_capacity(&self) -> usize {
		debug_assert!(self.items.len() <= self.capacity);
		self.capacity - self.items.len()
	}

	fn pop(&mut self) -> Option<T> {
		match self.discipline {
			QueueDiscipline::Fifo => self.items.pop_front(),
			QueueDiscipline::Lifo => self.items.pop_back(),
		}
	}
}

struct Inner<T> {
	queue: Mutex<Queue<T>>,
	/// One permit per worker allowed to run.
	tokens: Arc<Semaphore>,
	max_parallel_jobs: usize,
	handler: Handler<T>,
}

/// Runs `handler` on pushed items, at most `max_parallel_jobs` at a time. A worker keeps taking
/// items from the queue until it is empty, then returns its token.
///
/// Must be used from within a tokio runtime.
pub struct WorkerPool<T> {
	inner: Arc<Inner<T>>,
}

impl<T> Clone for WorkerPool<T> {
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}

impl<T: Send + 'static> WorkerPool<T> {
	pub fn new(
		max_parallel_jobs: usize,
		queue_capacity: usize,
		discipline: QueueDiscipline,
		handler: Handler<T>,
	) -> Self {
		debug_assert_ne!(max_parallel_jobs, 0);
		Self {
			inner: Arc::new(Inner {
				queue: Mutex::new(Queue {
					items: VecDeque::with_capacity(queue_capacity),
					capacity: queue_capacity,
					discipline,
				}),
				tokens: Arc::new(Semaphore::new(max_parallel_jobs)),
				max_parallel_jobs,
				handler,
			}),
		}
	}

	/// Queue `item` and wake a worker if a token is free.
	pub fn push(&self, item: T) -> Result<(), Error> {
		{
			let mut queue = self.inner.queue.lock();
			if queue.remaining_capacity() == 0 {
				return Err(Error::QueueFull)
			}
			queue.items.push_back(item);
		}
		schedule(&self.inner);
		Ok(())
	}

	/// Number of items waiting for a worker.
	pub fn queued(&self) -> usize {
		self.inner.queue.lock().items.len()
	}

	/// Number of workers currently running.
	pub fn active(&self) -> usize {
		self.inner.max_parallel_jobs - self.inner.tokens.available_permits()
	}
}

/// Start workers for queued items while tokens are available.
fn schedule<T: Send + 'static>(inner: &Arc<Inner<T>>) {
	while let Ok(token) = inner.tokens.clone().try_acquire_owned() {
		let Some(item) = inner.queue.lock().pop() else {
			// Token is returned on drop
			return
		};
		tokio::spawn(run(inner.clone(), token, item));
	}
}

async fn run<T: Send + 'static>(inner: Arc<Inner<T>>, token: OwnedSemaphorePermit, item: T) {
	let mut item = item;
	loop {
		(inner.handler)(item).await;
		let next = inner.queue.lock().pop();
		match next {
			Some(next) => item = next,
			None => break,
		}
	}
	drop(token);
	// An item may have been pushed after we found the queue empty but before the token was back
	schedule(&inner);
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::FutureExt;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tokio::sync::{mpsc, Notify};

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn bounded_parallelism() {
		let running = Arc::new(AtomicUsize::new(0));
		let max_running = Arc::new(AtomicUsize::new(0));
		let (done_tx, mut done_rx) = mpsc::unbounded_channel();

		let handler: Handler<usize> = {
			let running = running.clone();
			let max_running = max_running.clone();
			Arc::new(move |i| {
				let running = running.clone();
				let max_running = max_running.clone();
				let done_tx = done_tx.clone();
				async move {
					let now = running.fetch_add(1, Ordering::SeqCst) + 1;
					max_running.fetch_max(now, Ordering::SeqCst);
					tokio::time::sleep(std::time::Duration::from_millis(2)).await;
					running.fetch_sub(1, Ordering::SeqCst);
					let _ = done_tx.send(i);
				}
				.boxed()
			})
		};

		let pool = WorkerPool::new(4, 100, QueueDiscipline::Fifo, handler);
		for i in 0..50 {
			pool.push(i).unwrap();
		}

		let mut done = Vec::new();
		for _ in 0..50 {
			done.push(done_rx.recv().await.unwrap());
		}
		done.sort();
		assert_eq!(done, (0..50).collect::<Vec<_>>());
		assert!(max_running.load(Ordering::SeqCst) <= 4);
		assert_eq!(pool.queued(), 0);
	}

	fn gated_pool(
		discipline: QueueDiscipline,
		capacity: usize,
	) -> (WorkerPool<u32>, Arc<Notify>, mpsc::UnboundedReceiver<u32>) {
		let gate = Arc::new(Notify::new());
		let (done_tx, done_rx) = mpsc::unbounded_channel();
		let handler: Handler<u32> = {
			let gate = gate.clone();
			Arc::new(move |i| {
				let gate = gate.clone();
				let done_tx = done_tx.clone();
				async move {
					if i == 0 {
						gate.notified().await;
					}
					let _ = done_tx.send(i);
				}
				.boxed()
			})
		};
		(WorkerPool::new(1, capacity, discipline, handler), gate, done_rx)
	}

	async fn drain_order(discipline: QueueDiscipline) -> Vec<u32> {
		let (pool, gate, mut done_rx) = gated_pool(discipline, 8);
		for i in 0..4 {
			pool.push(i).unwrap();
		}
		assert_eq!(pool.active(), 1);
		assert_eq!(pool.queued(), 3);
		gate.notify_one();
		let mut order = Vec::new();
		for _ in 0..4 {
			order.push(done_rx.recv().await.unwrap());
		}
		order
	}

	#[tokio::test]
	async fn fifo_order() {
		assert_eq!(drain_order(QueueDiscipline::Fifo).await, vec![0, 1, 2, 3]);
	}

	#[tokio::test]
	async fn lifo_order() {
		assert_eq!(drain_order(QueueDiscipline::Lifo).await, vec![0, 3, 2, 1]);
	}

	#[tokio::test]
	async fn full_queue() {
		let (pool, gate, mut done_rx) = gated_pool(QueueDiscipline::Fifo, 2);
		// First item goes straight to the worker
		pool.push(0).unwrap();
		pool.push(1).unwrap();
		pool.push(2).unwrap();
		assert_eq!(pool.push(3), Err(Error::QueueFull));
		gate.notify_one();
		for expected in 0..3 {
			assert_eq!(done_rx.recv().await, Some(expected));
		}
		pool.push(3).unwrap();
		assert_eq!(done_rx.recv().await, Some(3));
	}
}
