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

//! Signed commitment to the key half a hop will reveal in its acknowledgement.

use super::Balance;
use crate::{
	core::keys::{Address, Hash, Signature, HASH_SIZE, SIGNATURE_SIZE},
	traits::Connector,
};
use arrayref::{array_refs, mut_array_refs};

const FEE_SIZE: usize = 8;
pub const CHALLENGE_SIZE: usize = HASH_SIZE + FEE_SIZE + SIGNATURE_SIZE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
	hashed_key: Hash,
	fee: Balance,
	signature: Option<Signature>,
}

impl Challenge {
	/// Unsigned challenge.
	pub fn create(hashed_key: Hash, fee: Balance) -> Self {
		Self { hashed_key, fee, signature: None }
	}

	pub fn hashed_key(&self) -> &Hash {
		&self.hashed_key
	}

	pub fn fee(&self) -> Balance {
		self.fee
	}

	pub fn signature(&self) -> Option<&Signature> {
		self.signature.as_ref()
	}

	fn signed_hash(&self, connector: &dyn Connector) -> Hash {
		let mut data = [0; HASH_SIZE + FEE_SIZE];
		data[..HASH_SIZE].copy_from_slice(&self.hashed_key);
		data[HASH_SIZE..].copy_from_slice(&self.fee.to_be_bytes());
		connector.hash(&data)
	}

	pub fn sign(mut self, connector: &dyn Connector) -> Self {
		self.signature = Some(connector.sign(&self.signed_hash(connector)));
		self
	}

	/// Check that the challenge is signed by `address`. Never fails loudly; an unsigned or badly
	/// signed challenge is simply not valid.
	pub fn verify(&self, connector: &dyn Connector, address: &Address) -> bool {
		self.signature.as_ref().map_or(false, |signature| {
			connector.verify(&self.signed_hash(connector), signature, address)
		})
	}

	/// Recover the signer from the signature.
	pub fn counterparty(&self, connector: &dyn Connector) -> Option<Address> {
		let signature = self.signature.as_ref()?;
		connector.recover(&self.signed_hash(connector), signature)
	}

	pub fn to_bytes(&self) -> [u8; CHALLENGE_SIZE] {
		let signature = self.signature.as_ref().expect("Challenges are signed before encoding");
		let mut bytes = [0; CHALLENGE_SIZE];
		let (bytes_key, bytes_fee, bytes_signature) =
			mut_array_refs![&mut bytes, HASH_SIZE, FEE_SIZE, SIGNATURE_SIZE];
		*bytes_key = self.hashed_key;
		*bytes_fee = self.fee.to_be_bytes();
		*bytes_signature = *signature.as_bytes();
		bytes
	}

	pub fn from_bytes(bytes: &[u8; CHALLENGE_SIZE]) -> Self {
		let (hashed_key, fee, signature) = array_refs![bytes, HASH_SIZE, FEE_SIZE, SIGNATURE_SIZE];
		Self {
			hashed_key: *hashed_key,
			fee: Balance::from_be_bytes(*fee),
			signature: Some(Signature::from_bytes(signature)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::{connector::KeyConnector, keys::keccak256};

	#[test]
	fn sign_verify_recover() {
		let mut rng = rand::thread_rng();
		let connector = KeyConnector::gen(&mut rng);
		let other = KeyConnector::gen(&mut rng);

		let challenge = Challenge::create(keccak256(b"key"), 20).sign(&connector);
		assert!(challenge.verify(&connector, connector.address()));
		assert!(!challenge.verify(&connector, other.address()));
		assert_eq!(challenge.counterparty(&connector), Some(*connector.address()));

		let decoded = Challenge::from_bytes(&challenge.to_bytes());
		assert_eq!(decoded, challenge);
		assert_eq!(decoded.fee(), 20);
		assert_eq!(decoded.signature(), challenge.signature());

		let mut corrupted = challenge.to_bytes();
		corrupted[HASH_SIZE + FEE_SIZE + 3] ^= 0x40;
		assert!(!Challenge::from_bytes(&corrupted).verify(&connector, connector.address()));

		// Fee is covered by the signature
		let mut corrupted = challenge.to_bytes();
		corrupted[HASH_SIZE + FEE_SIZE - 1] ^= 1;
		assert!(!Challenge::from_bytes(&corrupted).verify(&connector, connector.address()));
	}

	#[test]
	fn unsigned_challenge_does_not_verify() {
		let mut rng = rand::thread_rng();
		let connector = KeyConnector::gen(&mut rng);
		let challenge = Challenge::create(keccak256(b"key"), 0);
		assert!(challenge.signature().is_none());
		assert!(!challenge.verify(&connector, connector.address()));
		assert_eq!(challenge.counterparty(&connector), None);
	}
}
