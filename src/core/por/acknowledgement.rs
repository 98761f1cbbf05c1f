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

//! Acknowledgement returned by a hop to the previous one, revealing the key half the previous
//! hop needs to redeem its ticket.

use super::{Challenge, CHALLENGE_SIZE};
use crate::{
	core::{
		keys::{Address, Hash, Signature, SIGNATURE_SIZE},
		sphinx::{PorKey, POR_KEY_SIZE},
	},
	traits::Connector,
};
use arrayref::{array_refs, mut_array_refs};
use subtle::ConstantTimeEq;

const SIGNED_DATA_SIZE: usize = CHALLENGE_SIZE + POR_KEY_SIZE;
pub const ACKNOWLEDGEMENT_SIZE: usize = SIGNED_DATA_SIZE + SIGNATURE_SIZE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Acknowledgement {
	challenge: Challenge,
	key_half: PorKey,
	signature: Signature,
}

fn encode_signed_data(challenge: &Challenge, key_half: &PorKey) -> [u8; SIGNED_DATA_SIZE] {
	let mut data = [0; SIGNED_DATA_SIZE];
	let (data_challenge, data_key_half) = mut_array_refs![&mut data, CHALLENGE_SIZE, POR_KEY_SIZE];
	*data_challenge = challenge.to_bytes();
	*data_key_half = *key_half;
	data
}

impl Acknowledgement {
	/// Acknowledge `challenge`, the signed challenge we received, by revealing `key_half`. Signed
	/// with the key of `connector`.
	pub fn create(connector: &dyn Connector, challenge: Challenge, key_half: PorKey) -> Self {
		let signature = connector.sign(&connector.hash(&encode_signed_data(&challenge, &key_half)));
		Self { challenge, key_half, signature }
	}

	pub fn challenge(&self) -> &Challenge {
		&self.challenge
	}

	pub fn key_half(&self) -> &PorKey {
		&self.key_half
	}

	fn signed_hash(&self, connector: &dyn Connector) -> Hash {
		connector.hash(&encode_signed_data(&self.challenge, &self.key_half))
	}

	pub fn verify(&self, connector: &dyn Connector, address: &Address) -> bool {
		connector.verify(&self.signed_hash(connector), &self.signature, address)
	}

	/// Recover the hop that sent this acknowledgement.
	pub fn response_signing_party(&self, connector: &dyn Connector) -> Option<Address> {
		connector.recover(&self.signed_hash(connector), &self.signature)
	}

	/// Check that the revealed key half matches the challenge it answers.
	pub fn validate_key_half(&self, connector: &dyn Connector) -> bool {
		connector.hash(&self.key_half).ct_eq(self.challenge.hashed_key()).into()
	}

	pub fn to_bytes(&self) -> [u8; ACKNOWLEDGEMENT_SIZE] {
		let mut bytes = [0; ACKNOWLEDGEMENT_SIZE];
		let (data, signature) = mut_array_refs![&mut bytes, SIGNED_DATA_SIZE, SIGNATURE_SIZE];
		*data = encode_signed_data(&self.challenge, &self.key_half);
		*signature = *self.signature.as_bytes();
		bytes
	}

	pub fn from_bytes(bytes: &[u8; ACKNOWLEDGEMENT_SIZE]) -> Self {
		let (challenge, key_half, signature) =
			array_refs![bytes, CHALLENGE_SIZE, POR_KEY_SIZE, SIGNATURE_SIZE];
		Self {
			challenge: Challenge::from_bytes(challenge),
			key_half: *key_half,
			signature: Signature::from_bytes(signature),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::connector::KeyConnector;

	#[test]
	fn recover_and_validate() {
		let mut rng = rand::thread_rng();
		let previous = KeyConnector::gen(&mut rng);
		let next = KeyConnector::gen(&mut rng);

		let key_half = [7; POR_KEY_SIZE];
		let challenge = Challenge::create(previous.hash(&key_half), 10).sign(&previous);
		let ack = Acknowledgement::create(&next, challenge.clone(), key_half);

		assert!(ack.validate_key_half(&previous));
		assert!(ack.verify(&previous, next.address()));
		assert!(!ack.verify(&previous, previous.address()));
		assert_eq!(ack.response_signing_party(&previous), Some(*next.address()));
		assert_eq!(ack.challenge().counterparty(&previous), Some(*previous.address()));

		let decoded = Acknowledgement::from_bytes(&ack.to_bytes());
		assert_eq!(decoded, ack);

		let forged = Acknowledgement::create(&next, challenge, [8; POR_KEY_SIZE]);
		assert!(!forged.validate_key_half(&previous));
	}
}
