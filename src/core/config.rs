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

//! Packet layer configuration.

use super::{
	por::{Balance, RELAY_FEE},
	replay_filter::DEFAULT_REPLAY_CAPACITY,
	store::DEFAULT_UNACKNOWLEDGED_CAPACITY,
};
use std::time::Duration;

/// Order in which queued packets are handed to workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueDiscipline {
	/// Oldest packet first.
	Fifo,
	/// Most recently queued packet first.
	Lifo,
}

/// Configuration data for a packet layer node.
#[derive(Clone, Debug)]
pub struct Config {
	/// Log target for all messages logged by the node.
	pub log_target: &'static str,
	/// Fee charged, and expected from the previous hop, for relaying a packet.
	pub relay_fee: Balance,
	/// Maximum number of packets processed concurrently.
	pub max_parallel_jobs: usize,
	/// Maximum number of packets waiting for a worker. Further packets are dropped.
	pub queue_capacity: usize,
	pub queue_discipline: QueueDiscipline,
	/// Time allowed for dialing the next hop and sending a packet to it. The dial is attempted at
	/// most twice, with a peer lookup in between.
	pub forward_timeout: Duration,
	/// Number of recent packet tags remembered for replay detection. A packet replayed after
	/// this many newer packets is not recognised.
	pub replay_capacity: usize,
	/// Maximum number of tickets kept while waiting for acknowledgements.
	pub unacknowledged_capacity: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_target: "mixpacket",
			relay_fee: RELAY_FEE,
			max_parallel_jobs: 20,
			queue_capacity: 1024,
			queue_discipline: QueueDiscipline::Fifo,
			forward_timeout: Duration::from_secs(2),
			replay_capacity: DEFAULT_REPLAY_CAPACITY,
			unacknowledged_capacity: DEFAULT_UNACKNOWLEDGED_CAPACITY,
		}
	}
}
