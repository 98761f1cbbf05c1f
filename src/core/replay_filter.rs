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

//! Replay protection for packet tags.
//!
//! Tags are kept exactly, in arrival order, up to a fixed capacity. Once full, the oldest tag is
//! forgotten to make room, so a packet replayed after `capacity` newer packets is accepted again.

use super::sphinx::PacketTag;
use hashlink::LinkedHashSet;

/// Default number of packet tags remembered.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1 << 18;

pub struct ReplayFilter {
	capacity: usize,
	/// Oldest at the front.
	tags: LinkedHashSet<PacketTag>,
}

impl ReplayFilter {
	pub fn new(capacity: usize) -> Self {
		debug_assert_ne!(capacity, 0);
		Self { capacity, tags: LinkedHashSet::new() }
	}

	pub fn len(&self) -> usize {
		self.tags.len()
	}

	pub fn contains(&self, tag: &PacketTag) -> bool {
		self.tags.contains(tag)
	}

	/// Record `tag`, forgetting the oldest tag if full. Returns `false`, and changes nothing, if
	/// `tag` is already present.
	pub fn insert(&mut self, tag: PacketTag) -> bool {
		if self.tags.contains(&tag) {
			return false
		}
		debug_assert!(self.tags.len() <= self.capacity);
		if self.tags.len() == self.capacity {
			self.tags.pop_front();
		}
		self.tags.insert(tag)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::{RngCore, SeedableRng};

	fn random_tags(rng: &mut impl RngCore, n: usize) -> Vec<PacketTag> {
		(0..n)
			.map(|_| {
				let mut tag = PacketTag::default();
				rng.fill_bytes(&mut tag);
				tag
			})
			.collect()
	}

	#[test]
	fn membership_is_exact() {
		let mut rng = rand_xoshiro::Xoshiro256StarStar::seed_from_u64(0);
		let inserted = random_tags(&mut rng, 20_000);
		let others = random_tags(&mut rng, 20_000);

		let mut filter = ReplayFilter::new(inserted.len());
		for tag in &inserted {
			assert!(filter.insert(*tag));
		}
		assert_eq!(filter.len(), inserted.len());
		assert!(inserted.iter().all(|tag| filter.contains(tag)));
		assert!(!others.iter().any(|tag| filter.contains(tag)));
		assert!(inserted.iter().all(|tag| !filter.insert(*tag)));
	}

	#[test]
	fn oldest_tag_is_forgotten_when_full() {
		let mut filter = ReplayFilter::new(3);
		for i in 1..=4 {
			assert!(filter.insert([i; 16]));
		}
		assert_eq!(filter.len(), 3);
		assert!(!filter.contains(&[1; 16]));
		assert!((2..=4).all(|i| filter.contains(&[i; 16])));

		// Forgotten tags are accepted again, pushing out the next oldest
		assert!(filter.insert([1; 16]));
		assert!(!filter.contains(&[2; 16]));
	}

	#[test]
	fn duplicate_leaves_order_unchanged() {
		let mut filter = ReplayFilter::new(2);
		assert!(filter.insert([1; 16]));
		assert!(filter.insert([2; 16]));
		assert!(!filter.insert([1; 16]));
		assert!(filter.insert([3; 16]));
		assert!(!filter.contains(&[1; 16]));
		assert!(filter.contains(&[2; 16]));
	}
}
