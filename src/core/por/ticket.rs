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

//! Payment tickets.
//!
//! Settlement is not handled here; tickets are only issued, checked, and stored until the key
//! needed to redeem them is known.

use super::{ticket_response, TicketResponse};
use crate::core::{
	error::Error,
	keys::{keccak256, Address, Hash, Keypair, Signature, ADDRESS_SIZE, HASH_SIZE, SIGNATURE_SIZE},
	sphinx::PorKey,
};
use arrayref::{array_refs, mut_array_refs};
use subtle::ConstantTimeEq;

pub type Balance = u64;

const BALANCE_SIZE: usize = 8;
const INDEX_SIZE: usize = 8;
const SIGNED_DATA_SIZE: usize = ADDRESS_SIZE + BALANCE_SIZE + INDEX_SIZE + HASH_SIZE;
pub const TICKET_SIZE: usize = SIGNED_DATA_SIZE + SIGNATURE_SIZE;

/// Ticket paying `counterparty`, redeemable once the preimage of `challenge` is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTicket {
	pub counterparty: Address,
	pub amount: Balance,
	pub index: u64,
	pub challenge: Hash,
	signature: Signature,
}

fn encode_signed_data(
	counterparty: &Address,
	amount: Balance,
	index: u64,
	challenge: &Hash,
) -> [u8; SIGNED_DATA_SIZE] {
	let mut data = [0; SIGNED_DATA_SIZE];
	let (data_counterparty, data_amount, data_index, data_challenge) =
		mut_array_refs![&mut data, ADDRESS_SIZE, BALANCE_SIZE, INDEX_SIZE, HASH_SIZE];
	*data_counterparty = *counterparty;
	*data_amount = amount.to_be_bytes();
	*data_index = index.to_be_bytes();
	*data_challenge = *challenge;
	data
}

impl SignedTicket {
	pub fn issue(
		keypair: &Keypair,
		counterparty: Address,
		amount: Balance,
		index: u64,
		challenge: Hash,
	) -> Self {
		let hash = keccak256(&encode_signed_data(&counterparty, amount, index, &challenge));
		let signature = keypair.sign_hash(&hash);
		Self { counterparty, amount, index, challenge, signature }
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	fn signed_hash(&self) -> Hash {
		keccak256(&encode_signed_data(&self.counterparty, self.amount, self.index, &self.challenge))
	}

	/// Recover the issuer. Returns `None` if the signature is malformed.
	pub fn signer(&self) -> Option<Address> {
		self.signature.recover(&self.signed_hash())
	}

	pub fn to_bytes(&self) -> [u8; TICKET_SIZE] {
		let mut bytes = [0; TICKET_SIZE];
		let (data, signature) = mut_array_refs![&mut bytes, SIGNED_DATA_SIZE, SIGNATURE_SIZE];
		*data = encode_signed_data(&self.counterparty, self.amount, self.index, &self.challenge);
		*signature = *self.signature.as_bytes();
		bytes
	}

	pub fn from_bytes(bytes: &[u8; TICKET_SIZE]) -> Self {
		let (counterparty, amount, index, challenge, signature) =
			array_refs![bytes, ADDRESS_SIZE, BALANCE_SIZE, INDEX_SIZE, HASH_SIZE, SIGNATURE_SIZE];
		Self {
			counterparty: *counterparty,
			amount: Balance::from_be_bytes(*amount),
			index: u64::from_be_bytes(*index),
			challenge: *challenge,
			signature: Signature::from_bytes(signature),
		}
	}
}

/// Ticket received by a relay, waiting for the next hop to reveal the other key half.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnacknowledgedTicket {
	pub ticket: SignedTicket,
	/// Our half of the ticket key.
	pub own_key: PorKey,
	/// Previous hop, who issued the ticket.
	pub signer: Address,
	/// Next hop, who must sign the acknowledgement.
	pub next_hop: Address,
}

impl UnacknowledgedTicket {
	/// Complete the ticket key with the half revealed by the next hop.
	pub fn acknowledge(self, key_half: &PorKey) -> Result<AcknowledgedTicket, Error> {
		let response = ticket_response(&self.own_key, key_half);
		if keccak256(&response).ct_eq(&self.ticket.challenge).unwrap_u8() == 0 {
			return Err(Error::InvalidAcknowledgement)
		}
		Ok(AcknowledgedTicket { ticket: self.ticket, response, signer: self.signer })
	}
}

/// Ticket whose challenge preimage is known, ready for settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcknowledgedTicket {
	pub ticket: SignedTicket,
	/// Preimage of the ticket challenge.
	pub response: TicketResponse,
	pub signer: Address,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn signer_survives_encoding() {
		let mut rng = rand::thread_rng();
		let issuer = Keypair::gen(&mut rng);
		let counterparty = Keypair::gen(&mut rng);
		let ticket =
			SignedTicket::issue(&issuer, *counterparty.address(), 30, 7, keccak256(b"challenge"));
		let decoded = SignedTicket::from_bytes(&ticket.to_bytes());
		assert_eq!(decoded, ticket);
		assert_eq!(decoded.signature(), ticket.signature());
		assert_eq!(decoded.signer(), Some(*issuer.address()));

		let mut tampered = ticket.to_bytes();
		// Amount
		tampered[ADDRESS_SIZE + BALANCE_SIZE - 1] ^= 1;
		assert_ne!(SignedTicket::from_bytes(&tampered).signer(), Some(*issuer.address()));
	}
}
