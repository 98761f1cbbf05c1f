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

//! Packet construction and processing.

mod config;
mod connector;
mod error;
mod keys;
mod message;
mod packet;
pub mod por;
mod replay_filter;
pub mod sphinx;
mod store;

pub use self::{
	config::{Config, QueueDiscipline},
	connector::KeyConnector,
	error::{ConnectorError, Error, StoreError, TransportError},
	keys::{
		keccak256, Address, Hash, Keypair, Signature, ADDRESS_SIZE, HASH_SIZE, SIGNATURE_SIZE,
	},
	message::{Message, MAX_PAYLOAD_SIZE, MESSAGE_SIZE},
	packet::{
		handle_acknowledgement, Packet, PacketState, PendingAcknowledgement, Transformed,
		PACKET_SIZE,
	},
	por::{
		AcknowledgedTicket, Acknowledgement, SignedTicket, UnacknowledgedTicket,
		ACKNOWLEDGEMENT_SIZE,
	},
	store::MemoryStore,
};
