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

//! Packet layer of an incentivised mix network.
//!
//! Senders wrap a message in a fixed-size onion [`Packet`] routed through up to
//! [`MAX_HOPS`](sphinx::MAX_HOPS) nodes. Each relay peels one layer, is paid by the previous hop
//! with a ticket it can only redeem once the next hop acknowledges the packet, and forwards the
//! packet. Replayed packets are dropped.

mod core;
mod network;
mod traits;

pub use crate::core::{
	handle_acknowledgement, keccak256, por, sphinx, AcknowledgedTicket, Acknowledgement, Address,
	Config, ConnectorError, Error, Hash, KeyConnector, Keypair, MemoryStore, Message, Packet,
	PacketState, PendingAcknowledgement, QueueDiscipline, Signature, SignedTicket, StoreError,
	Transformed, TransportError, UnacknowledgedTicket, ADDRESS_SIZE, HASH_SIZE, MAX_PAYLOAD_SIZE,
	MESSAGE_SIZE, PACKET_SIZE, SIGNATURE_SIZE,
};
pub use network::{Handler, Node, WorkerPool};
pub use traits::{Connector, OutputSink, Protocol, Store, Transport};
