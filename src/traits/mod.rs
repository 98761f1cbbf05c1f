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

//! Interfaces to the collaborators of the packet layer.

use crate::core::{
	keccak256,
	por::{AcknowledgedTicket, Balance, SignedTicket, UnacknowledgedTicket},
	sphinx::PacketTag,
	Address, ConnectorError, Hash, Signature, StoreError, TransportError,
};
use async_trait::async_trait;

/// Signing, hashing, and ticket issuance on behalf of the local node.
#[async_trait]
pub trait Connector: Send + Sync {
	/// Address of the key this connector signs with.
	fn address(&self) -> &Address;

	fn hash(&self, data: &[u8]) -> Hash {
		keccak256(data)
	}

	fn sign(&self, hash: &Hash) -> Signature;

	fn verify(&self, hash: &Hash, signature: &Signature, address: &Address) -> bool {
		signature.verify(hash, address)
	}

	/// Recover the address that produced `signature` over `hash`.
	fn recover(&self, hash: &Hash, signature: &Signature) -> Option<Address> {
		signature.recover(hash)
	}

	/// Issue a ticket worth `amount` to `counterparty`, locked to `challenge`.
	async fn issue_ticket(
		&self,
		counterparty: &Address,
		amount: Balance,
		challenge: &Hash,
	) -> Result<SignedTicket, ConnectorError>;
}

/// Protocols spoken between nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
	Packet,
	Acknowledgement,
}

/// Connections to other nodes.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	type Stream: Send;

	/// Open a stream to `peer`.
	async fn dial(&self, peer: &Address, protocol: Protocol)
		-> Result<Self::Stream, TransportError>;

	async fn send(&self, stream: &mut Self::Stream, data: &[u8]) -> Result<(), TransportError>;

	/// Refresh the network address of `peer`. Called once before redialing a peer that could not
	/// be reached.
	async fn lookup(&self, peer: &Address) -> Result<(), TransportError>;
}

/// Replay tags and ticket persistence.
#[async_trait]
pub trait Store: Send + Sync {
	async fn has_tag(&self, tag: &PacketTag) -> Result<bool, StoreError>;

	async fn put_tag(&self, tag: &PacketTag) -> Result<(), StoreError>;

	/// Insert `tag`, atomically with respect to concurrent callers. Returns `false` if it was
	/// already present.
	async fn check_and_insert_tag(&self, tag: &PacketTag) -> Result<bool, StoreError>;

	/// Keep `ticket` until an acknowledgement revealing the preimage of `ack_challenge` arrives.
	async fn store_unacknowledged(
		&self,
		ack_challenge: Hash,
		ticket: UnacknowledgedTicket,
	) -> Result<(), StoreError>;

	async fn take_unacknowledged(
		&self,
		ack_challenge: &Hash,
	) -> Result<Option<UnacknowledgedTicket>, StoreError>;

	async fn store_acknowledged(&self, ticket: AcknowledgedTicket) -> Result<(), StoreError>;
}

/// Receiver of messages for which the local node is the destination.
pub trait OutputSink: Send + Sync {
	fn deliver(&self, plaintext: Vec<u8>);
}

impl OutputSink for tokio::sync::mpsc::UnboundedSender<Vec<u8>> {
	fn deliver(&self, plaintext: Vec<u8>) {
		// Receiver gone means nobody is interested any more
		let _ = self.send(plaintext);
	}
}
