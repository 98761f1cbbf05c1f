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

//! Packets: header, ticket, challenge, and message, and their processing at each hop.

use super::{
	error::Error,
	keys::{Address, Keypair},
	message::{Message, RawMessage, MESSAGE_SIZE},
	por::{
		ack_challenge, ticket_challenge, ticket_challenge_ok, AcknowledgedTicket,
		Acknowledgement, Balance, Challenge, SignedTicket, UnacknowledgedTicket, CHALLENGE_SIZE,
		TICKET_SIZE,
	},
	sphinx::{
		derive_ack_key, derive_own_key, derive_packet_tag, Header, HeaderBuilder,
		PacketIdentifier, PorKey, RawHeader, RoutingInfo, HEADER_SIZE,
	},
};
use crate::traits::{Connector, Store};
use arrayref::{array_refs, mut_array_refs};
use rand::{CryptoRng, Rng};

/// Size in bytes of a packet on the wire.
pub const PACKET_SIZE: usize = HEADER_SIZE + TICKET_SIZE + CHALLENGE_SIZE + MESSAGE_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketState {
	/// Built by the sender.
	Created,
	Received,
	SecretDerived,
	Verified,
	Extracted,
	/// Rewritten for the next hop.
	Forwarding,
	Delivering,
	Done,
}

pub struct Packet {
	header: Header,
	ticket: SignedTicket,
	challenge: Challenge,
	message: Message,
	state: PacketState,
}

/// Outcome of [`Packet::forward_transform`].
pub enum Transformed {
	/// Send `packet` to `next_hop`, then `ack` to the previous hop.
	Forward { next_hop: Address, packet: Packet, ack: PendingAcknowledgement },
	/// We are the destination.
	Deliver { plaintext: Vec<u8>, identifier: PacketIdentifier, ack: PendingAcknowledgement },
}

/// Acknowledgement owed to the previous hop, not yet signed.
#[derive(Clone, Debug)]
pub struct PendingAcknowledgement {
	pub previous_hop: Address,
	challenge: Challenge,
	key_half: PorKey,
}

impl PendingAcknowledgement {
	pub fn sign(self, connector: &dyn Connector) -> Acknowledgement {
		Acknowledgement::create(connector, self.challenge, self.key_half)
	}
}

impl Packet {
	/// Build a packet carrying `plaintext` along `path`. The last address in `path` is the
	/// destination. Each relay on the path takes `relay_fee` from the ticket value.
	pub async fn create(
		rng: &mut (impl Rng + CryptoRng),
		connector: &dyn Connector,
		plaintext: &[u8],
		path: &[Address],
		relay_fee: Balance,
	) -> Result<Self, Error> {
		let mut message = Message::create_plain(plaintext)?;
		let created = HeaderBuilder::new().create(rng, path)?;
		message.onion_encrypt(&created.secrets);

		let fee = (path.len() as Balance - 1).checked_mul(relay_fee).ok_or(Error::FeeOverflow)?;
		let challenge = Challenge::create(ack_challenge(&created.secrets[0]), fee).sign(connector);
		let ticket = connector
			.issue_ticket(&path[0], fee, &ticket_challenge(&created.secrets, 0))
			.await?;

		Ok(Self {
			header: Header::from_bytes(&created.header),
			ticket,
			challenge,
			message,
			state: PacketState::Created,
		})
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
		let bytes: &[u8; PACKET_SIZE] = bytes.try_into().map_err(|_| Error::InvalidPacketSize)?;
		let (header, ticket, challenge, message) =
			array_refs![bytes, HEADER_SIZE, TICKET_SIZE, CHALLENGE_SIZE, MESSAGE_SIZE];
		Ok(Self {
			header: Header::from_bytes(header),
			ticket: SignedTicket::from_bytes(ticket),
			challenge: Challenge::from_bytes(challenge),
			message: Message::from_bytes(message),
			state: PacketState::Received,
		})
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = [0; PACKET_SIZE];
		{
			let (header, ticket, challenge, message) = mut_array_refs![
				&mut bytes,
				HEADER_SIZE,
				TICKET_SIZE,
				CHALLENGE_SIZE,
				MESSAGE_SIZE
			];
			*header = *self.header.as_bytes();
			*ticket = self.ticket.to_bytes();
			*challenge = self.challenge.to_bytes();
			*message = *self.message.as_bytes();
		}
		bytes.to_vec()
	}

	pub fn state(&self) -> PacketState {
		self.state
	}

	pub fn header(&self) -> &RawHeader {
		self.header.as_bytes()
	}

	pub fn ticket(&self) -> &SignedTicket {
		&self.ticket
	}

	pub fn challenge(&self) -> &Challenge {
		&self.challenge
	}

	pub fn message(&self) -> &RawMessage {
		self.message.as_bytes()
	}

	/// Process a received packet: peel one layer and either rewrite it for the next hop or
	/// recover the plaintext.
	///
	/// Every error means the packet must be dropped without telling anyone why.
	pub async fn forward_transform(
		mut self,
		keypair: &Keypair,
		connector: &dyn Connector,
		store: &dyn Store,
		relay_fee: Balance,
	) -> Result<Transformed, Error> {
		assert_eq!(self.state, PacketState::Received, "Only received packets can be transformed");

		let secret = *self.header.derive_secret(keypair)?;
		self.state = PacketState::SecretDerived;

		if !store.check_and_insert_tag(&derive_packet_tag(&secret)).await? {
			return Err(Error::ReplayDetected)
		}

		if !self.header.verify() {
			return Err(Error::InvalidHeader)
		}
		self.state = PacketState::Verified;

		let routing_info = *self.header.extract_header_information(keypair.address());
		self.message.decrypt(&secret);
		self.state = PacketState::Extracted;

		// The previous hop signed the challenge and must have signed the ticket
		let previous_hop = self.challenge.counterparty(connector).ok_or(Error::SignatureInvalid)?;
		if self.ticket.signer() != Some(previous_hop) ||
			&self.ticket.counterparty != keypair.address() ||
			self.challenge.hashed_key() != &ack_challenge(&secret)
		{
			return Err(Error::InvalidTicket)
		}
		let next_ack_challenge = match &routing_info {
			RoutingInfo::Relay { key_share, .. } => Some(&key_share.ack_challenge),
			RoutingInfo::Final { .. } => None,
		};
		if !ticket_challenge_ok(&secret, next_ack_challenge, &self.ticket.challenge) {
			return Err(Error::InvalidTicket)
		}

		let ack = PendingAcknowledgement {
			previous_hop,
			challenge: self.challenge.clone(),
			key_half: derive_ack_key(&secret),
		};

		match routing_info {
			RoutingInfo::Final { identifier } => {
				self.state = PacketState::Delivering;
				self.header.mark_delivered();
				self.message.mark_plaintext();
				let plaintext = self.message.plaintext()?.to_vec();
				self.state = PacketState::Done;
				Ok(Transformed::Deliver { plaintext, identifier, ack })
			},
			RoutingInfo::Relay { next_hop, key_share } => {
				let amount =
					self.ticket.amount.checked_sub(relay_fee).ok_or(Error::InvalidTicket)?;
				self.header.transform_for_next_node()?;

				store
					.store_unacknowledged(
						key_share.ack_challenge,
						UnacknowledgedTicket {
							ticket: self.ticket,
							own_key: derive_own_key(&secret),
							signer: previous_hop,
							next_hop,
						},
					)
					.await?;

				let challenge = Challenge::create(key_share.ack_challenge, amount).sign(connector);
				let ticket =
					connector.issue_ticket(&next_hop, amount, &key_share.ticket_challenge).await?;
				let packet = Packet {
					header: self.header,
					ticket,
					challenge,
					message: self.message,
					state: PacketState::Forwarding,
				};
				Ok(Transformed::Forward { next_hop, packet, ack })
			},
		}
	}

	/// Mark a forwarded packet as handed to the transport.
	pub fn mark_done(&mut self) {
		assert_eq!(self.state, PacketState::Forwarding, "Only forwarded packets are sent");
		self.state = PacketState::Done;
	}
}

/// Process an acknowledgement sent by the next hop of a packet we relayed. Returns the ticket it
/// made redeemable.
pub async fn handle_acknowledgement(
	ack: &Acknowledgement,
	own_address: &Address,
	connector: &dyn Connector,
	store: &dyn Store,
) -> Result<AcknowledgedTicket, Error> {
	if !ack.validate_key_half(connector) ||
		ack.challenge().counterparty(connector).as_ref() != Some(own_address)
	{
		return Err(Error::InvalidAcknowledgement)
	}
	let ack_challenge = ack.challenge().hashed_key();
	let unacknowledged =
		store.take_unacknowledged(ack_challenge).await?.ok_or(Error::InvalidAcknowledgement)?;
	if ack.response_signing_party(connector) != Some(unacknowledged.next_hop) {
		// Not from the next hop; keep waiting for the real one
		store.store_unacknowledged(*ack_challenge, unacknowledged).await?;
		return Err(Error::InvalidAcknowledgement)
	}
	let acknowledged = unacknowledged.acknowledge(ack.key_half())?;
	store.store_acknowledged(acknowledged.clone()).await?;
	Ok(acknowledged)
}
