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

//! In-memory store for replay tags and tickets.

use super::{
	error::StoreError,
	keys::Hash,
	por::{AcknowledgedTicket, UnacknowledgedTicket},
	replay_filter::ReplayFilter,
	sphinx::PacketTag,
};
use crate::traits::Store;
use async_trait::async_trait;
use hashlink::LinkedHashMap;
use log::debug;
use parking_lot::Mutex;

/// Default number of unacknowledged tickets kept.
pub const DEFAULT_UNACKNOWLEDGED_CAPACITY: usize = 4096;

struct Tickets {
	/// Maximum number of unacknowledged tickets to keep.
	capacity: usize,
	/// In insertion order: oldest at the front.
	unacknowledged: LinkedHashMap<Hash, UnacknowledgedTicket>,
	acknowledged: Vec<AcknowledgedTicket>,
}

/// Store keeping everything in memory. Replay tags are exact within a bounded window of the
/// most recent packets.
pub struct MemoryStore {
	replay_filter: Mutex<ReplayFilter>,
	tickets: Mutex<Tickets>,
	log_target: &'static str,
}

impl MemoryStore {
	pub fn new(
		replay_capacity: usize,
		unacknowledged_capacity: usize,
		log_target: &'static str,
	) -> Self {
		debug_assert_ne!(unacknowledged_capacity, 0);
		Self {
			replay_filter: Mutex::new(ReplayFilter::new(replay_capacity)),
			tickets: Mutex::new(Tickets {
				capacity: unacknowledged_capacity,
				unacknowledged: LinkedHashMap::with_capacity(unacknowledged_capacity),
				acknowledged: Vec::new(),
			}),
			log_target,
		}
	}

	/// Tickets that can be redeemed.
	pub fn acknowledged_tickets(&self) -> Vec<AcknowledgedTicket> {
		self.tickets.lock().acknowledged.clone()
	}

	/// Remove and return the redeemable tickets, e.g. once they are handed off for settlement.
	pub fn take_acknowledged(&self) -> Vec<AcknowledgedTicket> {
		std::mem::take(&mut self.tickets.lock().acknowledged)
	}

	pub fn num_replay_tags(&self) -> usize {
		self.replay_filter.lock().len()
	}

	pub fn num_unacknowledged(&self) -> usize {
		self.tickets.lock().unacknowledged.len()
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn has_tag(&self, tag: &PacketTag) -> Result<bool, StoreError> {
		Ok(self.replay_filter.lock().contains(tag))
	}

	async fn put_tag(&self, tag: &PacketTag) -> Result<(), StoreError> {
		self.replay_filter.lock().insert(*tag);
		Ok(())
	}

	async fn check_and_insert_tag(&self, tag: &PacketTag) -> Result<bool, StoreError> {
		Ok(self.replay_filter.lock().insert(*tag))
	}

	async fn store_unacknowledged(
		&self,
		ack_challenge: Hash,
		ticket: UnacknowledgedTicket,
	) -> Result<(), StoreError> {
		let mut tickets = self.tickets.lock();
		// Discard the oldest ticket if we're already at capacity
		debug_assert!(tickets.unacknowledged.len() <= tickets.capacity);
		if tickets.unacknowledged.len() == tickets.capacity &&
			!tickets.unacknowledged.contains_key(&ack_challenge)
		{
			debug!(target: self.log_target, "Too many unacknowledged tickets; evicting oldest");
			tickets.unacknowledged.pop_front();
		}
		tickets.unacknowledged.insert(ack_challenge, ticket);
		Ok(())
	}

	async fn take_unacknowledged(
		&self,
		ack_challenge: &Hash,
	) -> Result<Option<UnacknowledgedTicket>, StoreError> {
		Ok(self.tickets.lock().unacknowledged.remove(ack_challenge))
	}

	async fn store_acknowledged(&self, ticket: AcknowledgedTicket) -> Result<(), StoreError> {
		self.tickets.lock().acknowledged.push(ticket);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::{
		keys::{keccak256, Keypair},
		por::SignedTicket,
	};

	fn unacknowledged(keypair: &Keypair, index: u64) -> UnacknowledgedTicket {
		UnacknowledgedTicket {
			ticket: SignedTicket::issue(keypair, *keypair.address(), 1, index, keccak256(b"c")),
			own_key: [0; 32],
			signer: *keypair.address(),
			next_hop: *keypair.address(),
		}
	}

	#[tokio::test]
	async fn tags_are_checked_atomically() {
		let store = MemoryStore::new(16, 4, "test");
		let tag = [1; 16];
		assert!(!store.has_tag(&tag).await.unwrap());
		assert!(store.check_and_insert_tag(&tag).await.unwrap());
		assert!(store.has_tag(&tag).await.unwrap());
		assert!(!store.check_and_insert_tag(&tag).await.unwrap());

		store.put_tag(&[2; 16]).await.unwrap();
		assert!(!store.check_and_insert_tag(&[2; 16]).await.unwrap());
	}

	#[tokio::test]
	async fn evicts_oldest_unacknowledged() {
		let keypair = Keypair::gen(&mut rand::thread_rng());
		let store = MemoryStore::new(16, 2, "test");
		for i in 0..3u8 {
			store.store_unacknowledged([i; 32], unacknowledged(&keypair, i.into())).await.unwrap();
		}
		assert_eq!(store.num_unacknowledged(), 2);
		assert_eq!(store.take_unacknowledged(&[0; 32]).await.unwrap(), None);
		assert_eq!(
			store.take_unacknowledged(&[2; 32]).await.unwrap(),
			Some(unacknowledged(&keypair, 2))
		);
		assert_eq!(store.take_unacknowledged(&[2; 32]).await.unwrap(), None);
	}

	#[tokio::test]
	async fn replay_window_is_exact_and_bounded() {
		let store = MemoryStore::new(2, 4, "test");
		assert!(store.check_and_insert_tag(&[1; 16]).await.unwrap());
		assert!(store.check_and_insert_tag(&[2; 16]).await.unwrap());
		assert!(!store.check_and_insert_tag(&[1; 16]).await.unwrap());
		assert!(store.check_and_insert_tag(&[3; 16]).await.unwrap());
		assert_eq!(store.num_replay_tags(), 2);
		// Only the oldest tag has been forgotten
		assert!(!store.has_tag(&[1; 16]).await.unwrap());
		assert!(store.has_tag(&[2; 16]).await.unwrap());
		assert!(store.has_tag(&[3; 16]).await.unwrap());
	}

	#[tokio::test]
	async fn acknowledged_tickets_are_drained() {
		let keypair = Keypair::gen(&mut rand::thread_rng());
		let store = MemoryStore::new(16, 2, "test");
		let ticket = unacknowledged(&keypair, 0);
		let acknowledged = AcknowledgedTicket {
			ticket: ticket.ticket,
			response: [0; 64],
			signer: ticket.signer,
		};
		store.store_acknowledged(acknowledged.clone()).await.unwrap();
		store.store_acknowledged(acknowledged.clone()).await.unwrap();
		assert_eq!(store.acknowledged_tickets().len(), 2);
		assert_eq!(store.take_acknowledged(), vec![acknowledged.clone(), acknowledged]);
		assert!(store.take_acknowledged().is_empty());
		assert!(store.acknowledged_tickets().is_empty());
	}
}
