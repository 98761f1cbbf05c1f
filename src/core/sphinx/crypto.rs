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

//! Key exchange, secret derivation, MAC computation, and encryption.

use super::packet::{Alpha, Mac, GROUP_ELEMENT_SIZE, MAX_HOPS};
use crate::core::error::Error;
use arrayvec::ArrayVec;
use blake2::{
	digest::{consts::U32, Mac as DigestMac},
	Blake2bMac,
};
use c2_chacha::{
	stream_cipher::{NewStreamCipher, SyncStreamCipher},
	ChaCha20,
};
use hkdf::Hkdf;
use k256::{
	elliptic_curve::{group::Group, ops::Reduce, sec1::ToEncodedPoint, Field},
	FieldBytes, ProjectivePoint, PublicKey, Scalar, U256,
};
use lioness::LionessDefault;
use rand::{CryptoRng, Rng};
use sha2::Sha256;

const BLINDING_FACTOR_PERSONAL: &[u8; 16] = b"mixpkt-blind-fac";

const PRG_SALT: &[u8] = b"mixpkt-prg";
const PRP_SALT: &[u8] = b"mixpkt-prp";
const MAC_KEY_SALT: &[u8] = b"mixpkt-mac-key";
const PACKET_TAG_SALT: &[u8] = b"mixpkt-packet-tag";
const OWN_KEY_SALT: &[u8] = b"mixpkt-own-key";
const ACK_KEY_SALT: &[u8] = b"mixpkt-ack-key";
const LAST_KEY_SALT: &[u8] = b"mixpkt-last-key";
const LAST_KEY_BLINDING_SALT: &[u8] = b"mixpkt-last-key-blinding";

/// Size in bytes of a [`SharedSecret`].
pub const SHARED_SECRET_SIZE: usize = GROUP_ELEMENT_SIZE;
/// Compressed group element shared between the sender and one hop.
pub type SharedSecret = [u8; SHARED_SECRET_SIZE];

/// Default bound on the number of fresh secrets tried when building a header.
pub const MAX_KEY_GENERATION_ATTEMPTS: usize = 16;

////////////////////////////////////////////////////////////////////////////////
// Group operations
////////////////////////////////////////////////////////////////////////////////

/// Parse a compressed group element. Returns `None` for invalid encodings and for the identity.
pub fn parse_point(bytes: &[u8; GROUP_ELEMENT_SIZE]) -> Option<ProjectivePoint> {
	PublicKey::from_sec1_bytes(bytes).ok().map(|public| public.to_projective())
}

/// Compress a group element. Returns `None` for the identity, which has no compressed form of
/// the right size.
pub fn compress(point: &ProjectivePoint) -> Option<[u8; GROUP_ELEMENT_SIZE]> {
	if bool::from(point.is_identity()) {
		return None
	}
	let encoded = point.to_affine().to_encoded_point(true);
	encoded.as_bytes().try_into().ok()
}

/// Derive the public group element corresponding to a secret scalar.
pub fn derive_alpha(secret: &Scalar) -> Option<Alpha> {
	compress(&(ProjectivePoint::GENERATOR * secret))
}

/// Multiply a public group element by a secret scalar.
pub fn derive_shared_secret(public: &ProjectivePoint, secret: &Scalar) -> Option<SharedSecret> {
	compress(&(public * secret))
}

/// Derive the scalar used to blind `alpha` between hops. Returns `None` if the factor is zero.
pub fn derive_blinding_factor(alpha: &Alpha, shared_secret: &SharedSecret) -> Option<Scalar> {
	let mut h = Blake2bMac::<U32>::new_with_salt_and_personal(
		shared_secret,
		b"",
		BLINDING_FACTOR_PERSONAL,
	)
	.expect("Key, salt, and personalisation sizes are fixed and small enough");
	h.update(alpha);
	let bytes: FieldBytes = h.finalize().into_bytes();
	let factor = <Scalar as Reduce<U256>>::reduce_bytes(&bytes);
	(!bool::from(factor.is_zero())).then_some(factor)
}

/// Blind `alpha` for the next hop. Returns `None` if `alpha` does not parse or the result is
/// degenerate.
pub fn blind_alpha(alpha: &Alpha, shared_secret: &SharedSecret) -> Option<Alpha> {
	let point = parse_point(alpha)?;
	let factor = derive_blinding_factor(alpha, shared_secret)?;
	compress(&(point * factor))
}

fn try_gen_alpha_and_shared_secrets(
	rng: &mut (impl Rng + CryptoRng),
	path: &[ProjectivePoint],
) -> Option<(Alpha, ArrayVec<SharedSecret, MAX_HOPS>)> {
	let mut secret = Scalar::random(&mut *rng);
	if bool::from(secret.is_zero()) {
		return None
	}
	let first_alpha = derive_alpha(&secret)?;
	let mut shared_secrets = ArrayVec::new();

	for (i, public) in path.iter().enumerate() {
		let alpha = if i == 0 { first_alpha } else { derive_alpha(&secret)? };
		let shared_secret = derive_shared_secret(public, &secret)?;
		secret *= derive_blinding_factor(&alpha, &shared_secret)?;
		shared_secrets.push(shared_secret);
	}

	Some((first_alpha, shared_secrets))
}

/// Generate the alpha to go in a packet and the corresponding shared secrets for each hop.
///
/// A degenerate draw (zero scalar, identity point, zero blinding factor) is retried with fresh
/// randomness, at most `max_attempts` times.
pub fn gen_alpha_and_shared_secrets(
	rng: &mut (impl Rng + CryptoRng),
	path: &[ProjectivePoint],
	max_attempts: usize,
) -> Result<(Alpha, ArrayVec<SharedSecret, MAX_HOPS>), Error> {
	debug_assert!(path.len() <= MAX_HOPS);
	(0..max_attempts)
		.find_map(|_| try_gen_alpha_and_shared_secrets(rng, path))
		.ok_or(Error::KeyGenerationExhausted)
}

////////////////////////////////////////////////////////////////////////////////
// Additional secret derivation
////////////////////////////////////////////////////////////////////////////////

fn derive_secret(derived: &mut [u8], shared_secret: &SharedSecret, salt: &[u8]) {
	Hkdf::<Sha256>::new(Some(salt), shared_secret)
		.expand(b"", derived)
		.expect("Output sizes are fixed and small enough");
}

pub const MAC_KEY_SIZE: usize = 32;
pub type MacKey = [u8; MAC_KEY_SIZE];

pub fn derive_mac_key(shared_secret: &SharedSecret) -> MacKey {
	let mut derived = [0; MAC_KEY_SIZE];
	derive_secret(&mut derived, shared_secret, MAC_KEY_SALT);
	derived
}

pub const PACKET_TAG_SIZE: usize = 16;
/// Replay tag of a packet, derived from the shared secret of the hop receiving it.
pub type PacketTag = [u8; PACKET_TAG_SIZE];

pub fn derive_packet_tag(shared_secret: &SharedSecret) -> PacketTag {
	let mut derived = [0; PACKET_TAG_SIZE];
	derive_secret(&mut derived, shared_secret, PACKET_TAG_SALT);
	derived
}

pub const POR_KEY_SIZE: usize = 32;
/// Key material of the proof-of-relay hierarchy.
pub type PorKey = [u8; POR_KEY_SIZE];

/// Half of the ticket key known to the hop that owns `shared_secret`.
pub fn derive_own_key(shared_secret: &SharedSecret) -> PorKey {
	let mut derived = [0; POR_KEY_SIZE];
	derive_secret(&mut derived, shared_secret, OWN_KEY_SALT);
	derived
}

/// Key half revealed in the acknowledgement sent by the hop that owns `shared_secret`.
pub fn derive_ack_key(shared_secret: &SharedSecret) -> PorKey {
	let mut derived = [0; POR_KEY_SIZE];
	derive_secret(&mut derived, shared_secret, ACK_KEY_SALT);
	derived
}

pub fn derive_last_key(shared_secret: &SharedSecret) -> PorKey {
	let mut derived = [0; POR_KEY_SIZE];
	derive_secret(&mut derived, shared_secret, LAST_KEY_SALT);
	derived
}

pub fn derive_last_key_blinding(shared_secret: &SharedSecret) -> PorKey {
	let mut derived = [0; POR_KEY_SIZE];
	derive_secret(&mut derived, shared_secret, LAST_KEY_BLINDING_SALT);
	derived
}

////////////////////////////////////////////////////////////////////////////////
// MAC computation
////////////////////////////////////////////////////////////////////////////////

pub fn compute_mac(data: &[u8], key: &MacKey) -> Mac {
	let mut h = Blake2bMac::<U32>::new_from_slice(key).expect("Key size is fixed and small enough");
	h.update(data);
	h.finalize().into_bytes().into()
}

/// Constant-time MAC check.
pub fn mac_ok(mac: &Mac, data: &[u8], key: &MacKey) -> bool {
	let mut h = Blake2bMac::<U32>::new_from_slice(key).expect("Key size is fixed and small enough");
	h.update(data);
	h.verify_slice(mac).is_ok()
}

////////////////////////////////////////////////////////////////////////////////
// Pseudo-random generator
////////////////////////////////////////////////////////////////////////////////

const PRG_KEY_SIZE: usize = 32;
const PRG_IV_SIZE: usize = 8;

/// Keystream generator keyed by a shared secret.
pub struct Prg {
	key: [u8; PRG_KEY_SIZE],
	iv: [u8; PRG_IV_SIZE],
}

impl Prg {
	pub fn new(shared_secret: &SharedSecret) -> Self {
		let mut derived = [0; PRG_KEY_SIZE + PRG_IV_SIZE];
		derive_secret(&mut derived, shared_secret, PRG_SALT);
		let mut key = [0; PRG_KEY_SIZE];
		let mut iv = [0; PRG_IV_SIZE];
		key.copy_from_slice(&derived[..PRG_KEY_SIZE]);
		iv.copy_from_slice(&derived[PRG_KEY_SIZE..]);
		Self { key, iv }
	}

	/// Keystream bytes `from..to`.
	pub fn digest(&self, from: usize, to: usize) -> Vec<u8> {
		debug_assert!(from <= to);
		let mut keystream = vec![0; to];
		self.apply(&mut keystream);
		keystream.drain(..from);
		keystream
	}

	/// XOR the keystream, starting at offset 0, into `data`.
	pub fn apply(&self, data: &mut [u8]) {
		let mut c = ChaCha20::new((&self.key).into(), (&self.iv).into());
		c.apply_keystream(data);
	}
}

pub fn apply_keystream(data: &mut [u8], keystream: &[u8]) {
	for (d, k) in data.iter_mut().zip(keystream) {
		*d ^= *k;
	}
}

////////////////////////////////////////////////////////////////////////////////
// Pseudo-random permutation
////////////////////////////////////////////////////////////////////////////////

pub const PRP_KEY_SIZE: usize = 192;

/// Wide-block cipher used for the onion-encrypted message.
pub struct Prp(LionessDefault);

impl Prp {
	pub fn new(shared_secret: &SharedSecret) -> Self {
		let mut key = [0; PRP_KEY_SIZE];
		derive_secret(&mut key, shared_secret, PRP_SALT);
		Self(LionessDefault::new_raw(&key))
	}

	pub fn permutate(&self, data: &mut [u8]) {
		self.0.encrypt(data).expect("Message size is fixed and large enough");
	}

	pub fn inverse(&self, data: &mut [u8]) {
		self.0.decrypt(data).expect("Message size is fixed and large enough");
	}
}
