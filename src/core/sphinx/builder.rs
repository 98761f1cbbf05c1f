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

//! Header construction.

use super::{
	crypto::{
		apply_keystream, compute_mac, derive_mac_key, gen_alpha_and_shared_secrets, parse_point,
		Prg, SharedSecret, MAX_KEY_GENERATION_ATTEMPTS,
	},
	packet::{
		split_header_mut, write_hop, write_last_hop, Beta, Mac, PacketIdentifier, RawHeader,
		BETA_LENGTH, HEADER_SIZE, LAST_HOP_SIZE, MAX_HOPS, PER_HOP_SIZE,
	},
};
use crate::core::{error::Error, keys::Address, por::key_share};
use arrayref::array_mut_ref;
use arrayvec::ArrayVec;
use rand::{CryptoRng, Rng};

/// Output of [`HeaderBuilder::create`].
pub struct CreatedHeader {
	pub header: RawHeader,
	/// One shared secret per hop, in path order.
	pub secrets: ArrayVec<SharedSecret, MAX_HOPS>,
	pub identifier: PacketIdentifier,
}

/// Builds fixed-size onion headers.
#[derive(Clone, Copy, Debug)]
pub struct HeaderBuilder {
	max_attempts: usize,
}

impl Default for HeaderBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl HeaderBuilder {
	pub fn new() -> Self {
		Self { max_attempts: MAX_KEY_GENERATION_ATTEMPTS }
	}

	/// Override the number of fresh ephemeral secrets tried before giving up.
	pub fn with_max_attempts(max_attempts: usize) -> Self {
		Self { max_attempts }
	}

	/// Build a header routing through `path`. The last address in `path` is the destination.
	pub fn create(
		&self,
		rng: &mut (impl Rng + CryptoRng),
		path: &[Address],
	) -> Result<CreatedHeader, Error> {
		if path.is_empty() || path.len() > MAX_HOPS {
			return Err(Error::InvalidPath)
		}
		if path.windows(2).any(|pair| pair[0] == pair[1]) {
			return Err(Error::InvalidPath)
		}
		let points = path
			.iter()
			.map(parse_point)
			.collect::<Option<ArrayVec<_, MAX_HOPS>>>()
			.ok_or(Error::InvalidPath)?;

		let (alpha, secrets) = gen_alpha_and_shared_secrets(rng, &points, self.max_attempts)?;
		let identifier: PacketIdentifier = rng.gen();

		let mut header = [0; HEADER_SIZE];
		{
			let (header_alpha, beta, gamma) = split_header_mut(&mut header);
			*header_alpha = alpha;
			*gamma = build_beta(beta, rng, path, &secrets, &identifier);
		}

		Ok(CreatedHeader { header, secrets, identifier })
	}
}

/// Generate the filler that the relays of a path append, one [`PER_HOP_SIZE`] chunk each, as
/// they peel their layers. `secrets` are those of the relays, not including the destination.
pub fn gen_filler(secrets: &[SharedSecret]) -> Vec<u8> {
	let mut filler = vec![0; secrets.len() * PER_HOP_SIZE];
	for (i, secret) in secrets.iter().enumerate() {
		let len = (i + 1) * PER_HOP_SIZE;
		let keystream =
			Prg::new(secret).digest(BETA_LENGTH + PER_HOP_SIZE - len, BETA_LENGTH + PER_HOP_SIZE);
		apply_keystream(&mut filler[..len], &keystream);
	}
	filler
}

/// Fill in beta, from the destination layer outwards, and return the MAC of the outermost layer.
fn build_beta(
	beta: &mut Beta,
	rng: &mut impl Rng,
	path: &[Address],
	secrets: &[SharedSecret],
	identifier: &PacketIdentifier,
) -> Mac {
	let num_hops = path.len();
	let last = num_hops - 1;
	let last_len = BETA_LENGTH - last * PER_HOP_SIZE;

	// Destination layer, padded with random bytes for unused hops, then the filler
	write_last_hop(array_mut_ref![beta, 0, LAST_HOP_SIZE], &path[last], identifier);
	rng.fill_bytes(&mut beta[LAST_HOP_SIZE..last_len]);
	Prg::new(&secrets[last]).apply(&mut beta[..last_len]);
	beta[last_len..].copy_from_slice(&gen_filler(&secrets[..last]));
	let mut gamma = compute_mac(beta, &derive_mac_key(&secrets[last]));

	for i in (0..last).rev() {
		beta.copy_within(..BETA_LENGTH - PER_HOP_SIZE, PER_HOP_SIZE);
		write_hop(
			array_mut_ref![beta, 0, PER_HOP_SIZE],
			&path[i + 1],
			&gamma,
			&key_share(secrets, i + 1),
		);
		Prg::new(&secrets[i]).apply(beta);
		gamma = compute_mac(beta, &derive_mac_key(&secrets[i]));
	}

	gamma
}
