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

//! Node identity key pair and signatures.
//!
//! The same secp256k1 key is used for key exchange with packet senders and for signing
//! challenges, tickets, and acknowledgements.

use super::{
	error::Error,
	sphinx::{compress, derive_shared_secret, parse_point, Alpha, SharedSecret},
};
use k256::{
	ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey},
	ProjectivePoint,
};
use rand::{CryptoRng, Rng};
use sha3::{Digest, Keccak256};

/// Size in bytes of an [`Address`].
pub const ADDRESS_SIZE: usize = 33;
/// Compressed public key of a node. Serves as both its network identity and its key-exchange
/// public key.
pub type Address = [u8; ADDRESS_SIZE];

pub const HASH_SIZE: usize = 32;
pub type Hash = [u8; HASH_SIZE];

pub const SIGNATURE_SIZE: usize = 65;

pub fn keccak256(data: &[u8]) -> Hash {
	Keccak256::digest(data).into()
}

/// Recoverable ECDSA signature: `r ‖ s ‖ recovery id`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
	pub fn from_bytes(bytes: &[u8; SIGNATURE_SIZE]) -> Self {
		Self(*bytes)
	}

	pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
		&self.0
	}

	/// Recover the address of the key that signed `hash`. Returns `None` if the signature is
	/// malformed.
	pub fn recover(&self, hash: &Hash) -> Option<Address> {
		let signature = EcdsaSignature::from_slice(&self.0[..64]).ok()?;
		let recovery_id = RecoveryId::from_byte(self.0[64])?;
		let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id).ok()?;
		compress(&ProjectivePoint::from(*key.as_affine()))
	}

	/// Check that `hash` was signed by `address`.
	pub fn verify(&self, hash: &Hash, address: &Address) -> bool {
		self.recover(hash).map_or(false, |signer| &signer == address)
	}
}

impl std::fmt::Debug for Signature {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Signature(")?;
		for b in &self.0[..8] {
			write!(f, "{:02x}", b)?;
		}
		write!(f, "..)")
	}
}

pub struct Keypair {
	/// Boxed to avoid leaving copies of the secret key around in memory if `Keypair` is moved.
	/// `SigningKey` zeroizes itself on drop.
	secret: Box<SigningKey>,
	address: Address,
}

impl Keypair {
	pub fn gen(rng: &mut (impl Rng + CryptoRng)) -> Self {
		Box::new(SigningKey::random(rng)).into()
	}

	/// Build a key pair from a 32-byte big-endian secret scalar.
	pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, Error> {
		let secret = SigningKey::from_bytes(secret.into()).map_err(|_| Error::InvalidKey)?;
		Ok(Box::new(secret).into())
	}

	pub fn address(&self) -> &Address {
		&self.address
	}

	/// Key exchange with the packet sender. Returns `None` if `alpha` is not a valid group
	/// element.
	pub fn exchange(&self, alpha: &Alpha) -> Option<SharedSecret> {
		let point = parse_point(alpha)?;
		derive_shared_secret(&point, self.secret.as_nonzero_scalar())
	}

	pub fn sign_hash(&self, hash: &Hash) -> Signature {
		let (signature, recovery_id) = self
			.secret
			.sign_prehash_recoverable(hash)
			.expect("Hash size is fixed and large enough");
		let mut bytes = [0; SIGNATURE_SIZE];
		bytes[..64].copy_from_slice(&signature.to_bytes());
		bytes[64] = recovery_id.to_byte();
		Signature(bytes)
	}
}

impl From<Box<SigningKey>> for Keypair {
	fn from(secret: Box<SigningKey>) -> Self {
		let public = ProjectivePoint::from(*secret.verifying_key().as_affine());
		let address =
			compress(&public).expect("Public key of a non-zero scalar is not the identity");
		Self { secret, address }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sign_and_recover() {
		let mut rng = rand::thread_rng();
		let keypair = Keypair::gen(&mut rng);
		let other = Keypair::gen(&mut rng);
		let hash = keccak256(b"challenge");
		let signature = keypair.sign_hash(&hash);
		assert_eq!(signature.recover(&hash), Some(*keypair.address()));
		assert!(signature.verify(&hash, keypair.address()));
		assert!(!signature.verify(&hash, other.address()));
		assert!(!signature.verify(&keccak256(b"other"), keypair.address()));
	}

	#[test]
	fn exchange_is_symmetric() {
		let mut rng = rand::thread_rng();
		let a = Keypair::gen(&mut rng);
		let b = Keypair::gen(&mut rng);
		assert_eq!(a.exchange(b.address()), b.exchange(a.address()));
		assert!(a.exchange(&[0; ADDRESS_SIZE]).is_none());
	}

	#[test]
	fn from_bytes_rejects_zero() {
		assert_eq!(Keypair::from_bytes(&[0; 32]).err(), Some(Error::InvalidKey));
		let mut secret = [0; 32];
		secret[31] = 1;
		let keypair = Keypair::from_bytes(&secret).unwrap();
		assert_eq!(keypair.address()[0], 0x02);
	}
}
