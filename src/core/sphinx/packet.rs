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

//! Sphinx header format.
//!
//! Headers consist of the following, in order:
//!
//! - [`Alpha`]: the blinded key-exchange group element.
//! - Beta: onion-encrypted routing information, [`BETA_LENGTH`] bytes.
//! - Gamma: a [`Mac`] over beta.
//!
//! Once decrypted by a relay, the first [`PER_HOP_SIZE`] bytes of beta contain, in order:
//!
//! - The [`Address`] of the next hop.
//! - The [`Mac`] the next hop will find in its header.
//! - The [`TicketKeyShare`] for the next hop.
//!
//! The destination instead finds its own [`Address`] followed by a [`PacketIdentifier`].

use crate::core::keys::{Address, Hash, ADDRESS_SIZE, HASH_SIZE};
use arrayref::{array_ref, array_refs, mut_array_refs};

/// Size in bytes of a compressed group element.
pub const GROUP_ELEMENT_SIZE: usize = 33;
pub const ALPHA_SIZE: usize = GROUP_ELEMENT_SIZE;
/// Blinded key-exchange public key.
pub type Alpha = [u8; ALPHA_SIZE];

pub const MAC_SIZE: usize = 32;
pub type Mac = [u8; MAC_SIZE];

/// Maximum number of hops a packet can traverse, destination included.
pub const MAX_HOPS: usize = 4;

pub const IDENTIFIER_SIZE: usize = 16;
/// Random identifier placed in the last hop's routing information.
pub type PacketIdentifier = [u8; IDENTIFIER_SIZE];

pub const TICKET_KEY_SHARE_SIZE: usize = 2 * HASH_SIZE;
/// Routing information for one relay.
pub const PER_HOP_SIZE: usize = ADDRESS_SIZE + MAC_SIZE + TICKET_KEY_SHARE_SIZE;
/// Routing information for the destination.
pub const LAST_HOP_SIZE: usize = ADDRESS_SIZE + IDENTIFIER_SIZE;

pub const BETA_LENGTH: usize = (MAX_HOPS - 1) * PER_HOP_SIZE + LAST_HOP_SIZE;
pub type Beta = [u8; BETA_LENGTH];
/// Beta with room for the padding a relay appends before decrypting.
pub const EXTENDED_BETA_LENGTH: usize = BETA_LENGTH + PER_HOP_SIZE;

pub const HEADER_SIZE: usize = ALPHA_SIZE + BETA_LENGTH + MAC_SIZE;
pub type RawHeader = [u8; HEADER_SIZE];

/// Split a raw header into alpha, beta, and gamma.
pub fn split_header(header: &RawHeader) -> (&Alpha, &Beta, &Mac) {
	array_refs![header, ALPHA_SIZE, BETA_LENGTH, MAC_SIZE]
}

pub fn split_header_mut(header: &mut RawHeader) -> (&mut Alpha, &mut Beta, &mut Mac) {
	mut_array_refs![header, ALPHA_SIZE, BETA_LENGTH, MAC_SIZE]
}

/// Commitments a relay needs to pay the next hop: the hash of the acknowledgement key half the
/// next hop will reveal, and the challenge to put in the next hop's ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicketKeyShare {
	pub ack_challenge: Hash,
	pub ticket_challenge: Hash,
}

impl TicketKeyShare {
	pub fn to_bytes(&self) -> [u8; TICKET_KEY_SHARE_SIZE] {
		let mut bytes = [0; TICKET_KEY_SHARE_SIZE];
		bytes[..HASH_SIZE].copy_from_slice(&self.ack_challenge);
		bytes[HASH_SIZE..].copy_from_slice(&self.ticket_challenge);
		bytes
	}

	pub fn from_bytes(bytes: &[u8; TICKET_KEY_SHARE_SIZE]) -> Self {
		let (ack_challenge, ticket_challenge) = array_refs![bytes, HASH_SIZE, HASH_SIZE];
		Self { ack_challenge: *ack_challenge, ticket_challenge: *ticket_challenge }
	}
}

/// Decrypted routing information for a relay.
pub struct EncodedHop<'a>(pub &'a [u8; PER_HOP_SIZE]);

impl<'a> EncodedHop<'a> {
	pub fn address(&self) -> &Address {
		array_ref![self.0, 0, ADDRESS_SIZE]
	}

	pub fn mac(&self) -> &Mac {
		array_ref![self.0, ADDRESS_SIZE, MAC_SIZE]
	}

	pub fn key_share(&self) -> TicketKeyShare {
		TicketKeyShare::from_bytes(array_ref![
			self.0,
			ADDRESS_SIZE + MAC_SIZE,
			TICKET_KEY_SHARE_SIZE
		])
	}

	/// Interpret the same bytes as last-hop routing information.
	pub fn identifier(&self) -> &PacketIdentifier {
		array_ref![self.0, ADDRESS_SIZE, IDENTIFIER_SIZE]
	}
}

/// Write relay routing information for the next hop into `hop`.
pub fn write_hop(
	hop: &mut [u8; PER_HOP_SIZE],
	address: &Address,
	mac: &Mac,
	key_share: &TicketKeyShare,
) {
	let (hop_address, hop_mac, hop_key_share) =
		mut_array_refs![hop, ADDRESS_SIZE, MAC_SIZE, TICKET_KEY_SHARE_SIZE];
	*hop_address = *address;
	*hop_mac = *mac;
	*hop_key_share = key_share.to_bytes();
}

/// Write last-hop routing information into `hop`.
pub fn write_last_hop(
	hop: &mut [u8; LAST_HOP_SIZE],
	destination: &Address,
	identifier: &PacketIdentifier,
) {
	let (hop_destination, hop_identifier) = mut_array_refs![hop, ADDRESS_SIZE, IDENTIFIER_SIZE];
	*hop_destination = *destination;
	*hop_identifier = *identifier;
}
