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

//! Error handling.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Failure reported by a [`Store`](crate::Store) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Failure reported by a [`Connector`](crate::Connector) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConnectorError(pub String);

/// Packet layer error.
///
/// Relays never report the variant of a dropped packet to the outside; it is only logged
/// locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// Path is empty, longer than the maximum, or contains an unusable or repeated address.
	#[error("Invalid path.")]
	InvalidPath,
	/// Payload does not fit in a message.
	#[error("Payload is too large.")]
	PayloadTooLarge,
	/// MAC mismatch or malformed routing information.
	#[error("Invalid header.")]
	InvalidHeader,
	/// Packet was already processed by this node.
	#[error("Replay detected.")]
	ReplayDetected,
	/// Message plaintext requested before all layers were removed.
	#[error("Message is still encrypted.")]
	StillEncrypted,
	/// Rejection sampling of the ephemeral secret hit its cap.
	#[error("Key generation attempts exhausted.")]
	KeyGenerationExhausted,
	/// Next hop could not be reached, even after the fallback attempt.
	#[error("Forwarding timed out.")]
	ForwardTimeout,
	#[error("Invalid signature.")]
	SignatureInvalid,
	/// Ticket not addressed to us, not signed by the previous hop, or with a wrong challenge or
	/// value.
	#[error("Invalid ticket.")]
	InvalidTicket,
	/// Total relay fees for the path do not fit in a ticket value.
	#[error("Relay fees overflow the ticket value.")]
	FeeOverflow,
	/// Decrypted message has an invalid length prefix or padding marker.
	#[error("Invalid message.")]
	InvalidMessage,
	#[error("Invalid packet size.")]
	InvalidPacketSize,
	/// Acknowledgement does not match any pending ticket.
	#[error("Invalid acknowledgement.")]
	InvalidAcknowledgement,
	#[error("Invalid key.")]
	InvalidKey,
	/// Packet queue is full.
	#[error("Packet queue is full.")]
	QueueFull,
	#[error("Transport error: {0}")]
	Transport(#[from] TransportError),
	#[error("Store error: {0}")]
	Store(#[from] StoreError),
	#[error("Connector error: {0}")]
	Connector(#[from] ConnectorError),
}
