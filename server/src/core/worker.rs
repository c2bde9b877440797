//! Worker pool. Offloads synchronous CPU-bound work (password hashing, key
//! generation) from the async runtime onto dedicated OS threads, with two
//! priority levels.

use flume::{Receiver, Sender};
use futures::channel::oneshot;
use std::{sync::Arc, thread};

use crate::prelude::*;

type Job = Box<dyn FnOnce() + Send>;

#[derive(Debug)]
pub struct WorkerPool {
	tx_immed: Sender<Job>,
	tx_normal: Sender<Job>,
}

fn worker_loop(queues: Vec<Arc<Receiver<Job>>>) {
	loop {
		// Drain higher priority queues first, then block on the full set
		let mut selector = flume::Selector::new();
		let mut done = false;
		for rx in &queues {
			if let Ok(job) = rx.try_recv() {
				job();
				done = true;
				break;
			}
			selector = selector.recv(rx.as_ref(), |job| job);
		}
		if done {
			continue;
		}
		match selector.wait() {
			Ok(job) => job(),
			Err(_) => return,
		}
	}
}

impl WorkerPool {
	/// Starts `n_immed` threads serving only the immediate queue and
	/// `n_normal` threads serving both queues.
	pub fn new(n_immed: usize, n_normal: usize) -> Self {
		let (tx_immed, rx_immed) = flume::unbounded();
		let (tx_normal, rx_normal) = flume::unbounded();

		let rx_immed = Arc::new(rx_immed);
		let rx_normal = Arc::new(rx_normal);

		for _ in 0..n_immed {
			let rx_immed = Arc::clone(&rx_immed);
			thread::spawn(move || worker_loop(vec![rx_immed]));
		}

		for _ in 0..n_normal {
			let rx_immed = Arc::clone(&rx_immed);
			let rx_normal = Arc::clone(&rx_normal);
			thread::spawn(move || worker_loop(vec![rx_immed, rx_normal]));
		}

		Self { tx_immed, tx_normal }
	}

	fn submit<F, T>(tx: &Sender<Job>, f: F) -> impl std::future::Future<Output = GhResult<T>>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		let (res_tx, res_rx) = oneshot::channel();

		let job = Box::new(move || {
			let result = f();
			let _ignore = res_tx.send(result);
		});

		if tx.send(job).is_err() {
			error!("Failed to send job to worker queue");
		}

		async move {
			res_rx.await.map_err(|_| Error::Internal("worker pool lost result".into()))
		}
	}

	/// Runs a closure on the normal queue; returns a future for the result.
	pub fn run<F, T>(&self, f: F) -> impl std::future::Future<Output = GhResult<T>>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		Self::submit(&self.tx_normal, f)
	}

	/// Runs a closure ahead of queued normal work.
	pub fn run_immed<F, T>(&self, f: F) -> impl std::future::Future<Output = GhResult<T>>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		Self::submit(&self.tx_immed, f)
	}
}


// vim: ts=4
