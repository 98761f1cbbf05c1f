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

//! Per-hop header processing.

use super::{
	crypto::{blind_alpha, derive_mac_key, mac_ok, Prg, SharedSecret},
	packet::{
		split_header, split_header_mut, EncodedHop, Mac, PacketIdentifier, RawHeader,
		TicketKeyShare, BETA_LENGTH, EXTENDED_BETA_LENGTH, PER_HOP_SIZE,
	},
};
use crate::core::{
	error::Error,
	keys::{Address, Keypair},
};
use arrayref::array_ref;
use zeroize::Zeroizing;

/// Processing state of a [`Header`]. Each operation requires the state left by the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderState {
	Fresh,
	SecretDerived,
	Verified,
	Extracted,
	/// Rewritten for the next hop.
	Transformed,
	/// We are the destination.
	Delivered,
}

/// Which part of the decrypted routing information is valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
	/// `next hop ‖ next gamma ‖ key share`, followed by the beta for the next hop.
	Relay,
	/// `destination ‖ identifier`.
	LastHop,
}

/// Routing information revealed by peeling one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutingInfo {
	Relay { next_hop: Address, key_share: TicketKeyShare },
	Final { identifier: PacketIdentifier },
}

/// A header as received by a node.
pub struct Header {
	raw: RawHeader,
	/// Decrypted beta, extended by one hop of keystream.
	decrypted: Box<[u8; EXTENDED_BETA_LENGTH]>,
	window: Option<Window>,
	routing_info: Option<RoutingInfo>,
	secret: Option<Zeroizing<SharedSecret>>,
	state: HeaderState,
}

impl Header {
	pub fn from_bytes(raw: &RawHeader) -> Self {
		Self {
			raw: *raw,
			decrypted: Box::new([0; EXTENDED_BETA_LENGTH]),
			window: None,
			routing_info: None,
			secret: None,
			state: HeaderState::Fresh,
		}
	}

	pub fn as_bytes(&self) -> &RawHeader {
		&self.raw
	}

	pub fn state(&self) -> HeaderState {
		self.state
	}

	pub fn window(&self) -> Option<Window> {
		self.window
	}

	fn expect_state(&self, expected: HeaderState) {
		if self.state != expected {
			panic!("Header operation called in state {:?}, expected {:?}", self.state, expected);
		}
	}

	/// Shared secret derived by [`derive_secret`](Self::derive_secret).
	pub fn secret(&self) -> &SharedSecret {
		self.secret.as_deref().expect("Shared secret requested before it was derived")
	}

	/// Derive the secret shared with the sender. Fails if alpha is not a valid group element.
	pub fn derive_secret(&mut self, keypair: &Keypair) -> Result<&SharedSecret, Error> {
		self.expect_state(HeaderState::Fresh);
		let (alpha, _, _) = split_header(&self.raw);
		let secret = keypair.exchange(alpha).ok_or(Error::InvalidHeader)?;
		self.state = HeaderState::SecretDerived;
		let secret = self.secret.insert(Zeroizing::new(secret));
		Ok(&**secret)
	}

	/// Check gamma against beta.
	pub fn verify(&mut self) -> bool {
		self.expect_state(HeaderState::SecretDerived);
		let (_, beta, gamma) = split_header(&self.raw);
		let ok = mac_ok(gamma, beta, &derive_mac_key(self.secret()));
		if ok {
			self.state = HeaderState::Verified;
		}
		ok
	}

	/// Peel one layer of beta. `own_address` is compared against the revealed address to tell
	/// whether we are the destination.
	pub fn extract_header_information(&mut self, own_address: &Address) -> &RoutingInfo {
		self.expect_state(HeaderState::Verified);
		let (_, beta, _) = split_header(&self.raw);
		self.decrypted[..BETA_LENGTH].copy_from_slice(beta);
		self.decrypted[BETA_LENGTH..].fill(0);
		Prg::new(self.secret()).apply(&mut self.decrypted[..]);

		let hop = EncodedHop(array_ref![self.decrypted, 0, PER_HOP_SIZE]);
		let (window, routing_info) = if hop.address() == own_address {
			(Window::LastHop, RoutingInfo::Final { identifier: *hop.identifier() })
		} else {
			let next_hop = *hop.address();
			(Window::Relay, RoutingInfo::Relay { next_hop, key_share: hop.key_share() })
		};
		self.window = Some(window);
		self.state = HeaderState::Extracted;
		self.routing_info.insert(routing_info)
	}

	/// Routing information revealed by
	/// [`extract_header_information`](Self::extract_header_information).
	pub fn routing_info(&self) -> Option<&RoutingInfo> {
		self.routing_info.as_ref()
	}

	/// Rewrite the header for the next hop: blind alpha and replace beta and gamma with the ones
	/// revealed by peeling.
	pub fn transform_for_next_node(&mut self) -> Result<(), Error> {
		self.expect_state(HeaderState::Extracted);
		assert_eq!(self.window, Some(Window::Relay), "Only relays transform headers");
		let secret = Zeroizing::new(*self.secret());
		let next_gamma: Mac = *EncodedHop(array_ref![self.decrypted, 0, PER_HOP_SIZE]).mac();
		let (alpha, beta, gamma) = split_header_mut(&mut self.raw);
		*alpha = blind_alpha(alpha, &secret).ok_or(Error::InvalidHeader)?;
		beta.copy_from_slice(&self.decrypted[PER_HOP_SIZE..]);
		*gamma = next_gamma;
		self.state = HeaderState::Transformed;
		Ok(())
	}

	/// Record that the packet terminated here.
	pub fn mark_delivered(&mut self) {
		self.expect_state(HeaderState::Extracted);
		assert_eq!(self.window, Some(Window::LastHop), "Only the destination delivers");
		self.state = HeaderState::Delivered;
	}
}

const _: () = assert!(EXTENDED_BETA_LENGTH - PER_HOP_SIZE == BETA_LENGTH);
