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

//! Proof-of-relay.
//!
//! Every hop's shared secret yields two key halves. The ticket paying a relay is locked to the
//! hash of its own half combined with the hashed half of the next hop; the relay learns the
//! missing half from the next hop's acknowledgement and only then can redeem the ticket.

mod acknowledgement;
mod challenge;
mod ticket;

pub use acknowledgement::{Acknowledgement, ACKNOWLEDGEMENT_SIZE};
pub use challenge::{Challenge, CHALLENGE_SIZE};
pub use ticket::{AcknowledgedTicket, Balance, SignedTicket, UnacknowledgedTicket, TICKET_SIZE};

use super::{
	keys::{keccak256, Hash, HASH_SIZE},
	sphinx::{
		derive_ack_key, derive_last_key, derive_last_key_blinding, derive_own_key, PorKey,
		SharedSecret, TicketKeyShare, POR_KEY_SIZE,
	},
};
use subtle::ConstantTimeEq;

/// Default fee charged by each relay.
pub const RELAY_FEE: Balance = 10;

/// Preimage of a ticket challenge.
pub type TicketResponse = [u8; POR_KEY_SIZE + HASH_SIZE];

fn concat(key: &PorKey, hash: &Hash) -> TicketResponse {
	let mut data = [0; POR_KEY_SIZE + HASH_SIZE];
	data[..POR_KEY_SIZE].copy_from_slice(key);
	data[POR_KEY_SIZE..].copy_from_slice(hash);
	data
}

fn hash_pair(key: &PorKey, hash: &Hash) -> Hash {
	keccak256(&concat(key, hash))
}

/// Hash of the key half the hop owning `secret` reveals in its acknowledgement.
pub fn ack_challenge(secret: &SharedSecret) -> Hash {
	keccak256(&derive_ack_key(secret))
}

/// Challenge of the ticket paying a relay, given the acknowledgement challenge of the hop after
/// it.
pub fn relay_ticket_challenge(secret: &SharedSecret, next_ack_challenge: &Hash) -> Hash {
	hash_pair(&derive_own_key(secret), next_ack_challenge)
}

/// Challenge of the ticket paying the destination, which it can check on its own.
pub fn last_ticket_challenge(secret: &SharedSecret) -> Hash {
	hash_pair(&derive_last_key(secret), &keccak256(&derive_last_key_blinding(secret)))
}

/// Challenge of the ticket paying hop `i` of a path with the given shared secrets.
pub fn ticket_challenge(secrets: &[SharedSecret], i: usize) -> Hash {
	match secrets.get(i + 1) {
		Some(next) => relay_ticket_challenge(&secrets[i], &ack_challenge(next)),
		None => last_ticket_challenge(&secrets[i]),
	}
}

/// Key share placed in the routing information of hop `i - 1`, for paying hop `i`.
pub fn key_share(secrets: &[SharedSecret], i: usize) -> TicketKeyShare {
	TicketKeyShare {
		ack_challenge: ack_challenge(&secrets[i]),
		ticket_challenge: ticket_challenge(secrets, i),
	}
}

/// Check, as the hop owning `secret`, the challenge of the ticket paying us. `next_ack_challenge`
/// is `None` when we are the destination.
pub fn ticket_challenge_ok(
	secret: &SharedSecret,
	next_ack_challenge: Option<&Hash>,
	challenge: &Hash,
) -> bool {
	let expected = match next_ack_challenge {
		Some(next) => relay_ticket_challenge(secret, next),
		None => last_ticket_challenge(secret),
	};
	expected.ct_eq(challenge).into()
}

/// Complete the ticket key of a relay with the key half revealed by the next hop.
pub fn ticket_response(own_key: &PorKey, key_half: &PorKey) -> TicketResponse {
	concat(own_key, &keccak256(key_half))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::sphinx::SHARED_SECRET_SIZE;

	fn secrets(n: usize) -> Vec<SharedSecret> {
		(0..n).map(|i| [i as u8 + 1; SHARED_SECRET_SIZE]).collect()
	}

	#[test]
	fn key_share_chains_hops() {
		let secrets = secrets(3);
		let share = key_share(&secrets, 1);
		assert_eq!(share.ack_challenge, ack_challenge(&secrets[1]));
		assert!(ticket_challenge_ok(
			&secrets[1],
			Some(&ack_challenge(&secrets[2])),
			&share.ticket_challenge
		));
		let last = key_share(&secrets, 2);
		assert!(ticket_challenge_ok(&secrets[2], None, &last.ticket_challenge));
		assert!(!ticket_challenge_ok(&secrets[2], None, &share.ticket_challenge));
	}

	#[test]
	fn ack_key_completes_ticket_key() {
		let secrets = secrets(2);
		let challenge = ticket_challenge(&secrets, 0);
		let own_key = derive_own_key(&secrets[0]);
		assert_eq!(keccak256(&ticket_response(&own_key, &derive_ack_key(&secrets[1]))), challenge);
		assert_ne!(keccak256(&ticket_response(&own_key, &derive_ack_key(&secrets[0]))), challenge);
	}
}
