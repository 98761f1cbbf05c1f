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

//! A packet layer node: receives packets and acknowledgements, relays or delivers packets, and
//! sends its own messages.

mod pool;

pub use pool::{Handler, WorkerPool};

use crate::{
	core::{
		handle_acknowledgement, AcknowledgedTicket, Acknowledgement, Address, Config, Error,
		KeyConnector, Keypair, Packet, PendingAcknowledgement, Transformed, ACKNOWLEDGEMENT_SIZE,
	},
	traits::{Connector, OutputSink, Protocol, Store, Transport},
};
use futures::FutureExt;
use rand::rngs::OsRng;
use std::{fmt, sync::Arc};

/// Short hex form of an address, for logging.
struct ShortAddress<'a>(&'a Address);

impl<'a> fmt::Display for ShortAddress<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for b in &self.0[..6] {
			write!(f, "{b:02x}")?;
		}
		write!(f, "..")
	}
}

struct Inner<T, S> {
	config: Config,
	keypair: Arc<Keypair>,
	connector: Arc<dyn Connector>,
	transport: Arc<T>,
	store: Arc<S>,
	sink: Arc<dyn OutputSink>,
}

pub struct Node<T, S> {
	inner: Arc<Inner<T, S>>,
	pool: WorkerPool<Vec<u8>>,
}

impl<T: Transport, S: Store + 'static> Node<T, S> {
	/// Create a node signing and exchanging keys with `keypair`.
	pub fn new(
		config: Config,
		keypair: Arc<Keypair>,
		transport: Arc<T>,
		store: Arc<S>,
		sink: Arc<dyn OutputSink>,
	) -> Self {
		let connector = Arc::new(KeyConnector::new(keypair.clone()));
		Self::with_connector(config, keypair, connector, transport, store, sink)
	}

	/// Like [`new`](Self::new), but with a custom [`Connector`]. `connector` must sign with
	/// `keypair`.
	pub fn with_connector(
		config: Config,
		keypair: Arc<Keypair>,
		connector: Arc<dyn Connector>,
		transport: Arc<T>,
		store: Arc<S>,
		sink: Arc<dyn OutputSink>,
	) -> Self {
		debug_assert_eq!(connector.address(), keypair.address());
		let inner = Arc::new(Inner { config, keypair, connector, transport, store, sink });
		let handler: Handler<Vec<u8>> = {
			let inner = inner.clone();
			Arc::new(move |data| {
				let inner = inner.clone();
				async move { inner.process_packet(data).await }.boxed()
			})
		};
		let pool = WorkerPool::new(
			inner.config.max_parallel_jobs,
			inner.config.queue_capacity,
			inner.config.queue_discipline,
			handler,
		);
		Self { inner, pool }
	}

	pub fn address(&self) -> &Address {
		self.inner.keypair.address()
	}

	pub fn store(&self) -> &Arc<S> {
		&self.inner.store
	}

	/// Send `plaintext` along `path`. The last address in `path` is the destination.
	pub async fn send_message(&self, plaintext: &[u8], path: &[Address]) -> Result<(), Error> {
		let inner = &self.inner;
		let packet = Packet::create(
			&mut OsRng,
			&*inner.connector,
			plaintext,
			path,
			inner.config.relay_fee,
		)
		.await?;
		log::trace!(target: inner.config.log_target, "Sending packet to {}", ShortAddress(&path[0]));
		inner.send_with_fallback(&path[0], Protocol::Packet, &packet.to_bytes()).await
	}

	/// Handle data received from another node. Packets are queued for the worker pool; the only
	/// error reported for them is a full queue. Invalid acknowledgements are dropped silently.
	pub async fn receive(&self, protocol: Protocol, data: Vec<u8>) -> Result<(), Error> {
		match protocol {
			Protocol::Packet => self.pool.push(data),
			Protocol::Acknowledgement => {
				if let Err(err) = self.handle_acknowledgement(&data).await {
					log::debug!(target: self.inner.config.log_target,
						"Dropping acknowledgement: {err}");
				}
				Ok(())
			},
		}
	}

	/// Process an acknowledgement for a packet we relayed, returning the ticket it made
	/// redeemable.
	pub async fn handle_acknowledgement(&self, data: &[u8]) -> Result<AcknowledgedTicket, Error> {
		let inner = &self.inner;
		let data: &[u8; ACKNOWLEDGEMENT_SIZE] =
			data.try_into().map_err(|_| Error::InvalidAcknowledgement)?;
		let ack = Acknowledgement::from_bytes(data);
		handle_acknowledgement(&ack, self.address(), &*inner.connector, &*inner.store).await
	}
}

impl<T: Transport, S: Store + 'static> Inner<T, S> {
	async fn process_packet(self: Arc<Self>, data: Vec<u8>) {
		let log_target = self.config.log_target;
		let transformed = match Packet::from_bytes(&data) {
			Ok(packet) =>
				packet
					.forward_transform(
						&self.keypair,
						&*self.connector,
						&*self.store,
						self.config.relay_fee,
					)
					.await,
			Err(err) => Err(err),
		};

		match transformed {
			Err(err) => log::debug!(target: log_target, "Dropping packet: {err}"),
			Ok(Transformed::Deliver { plaintext, identifier, ack }) => {
				log::trace!(target: log_target, "Delivering message {identifier:02x?}");
				self.sink.deliver(plaintext);
				self.send_acknowledgement(ack);
			},
			Ok(Transformed::Forward { next_hop, mut packet, ack }) => {
				match self.send_with_fallback(&next_hop, Protocol::Packet, &packet.to_bytes()).await {
					Ok(()) => {
						packet.mark_done();
						self.send_acknowledgement(ack);
					},
					Err(err) => log::debug!(target: log_target,
						"Dropping packet for {}: {err}", ShortAddress(&next_hop)),
				}
			},
		}
	}

	/// Sign and send `ack` in the background. Failure does not affect the packet.
	fn send_acknowledgement(self: &Arc<Self>, ack: PendingAcknowledgement) {
		let this = self.clone();
		tokio::spawn(async move {
			let previous_hop = ack.previous_hop;
			let ack = ack.sign(&*this.connector);
			if let Err(err) = this
				.send_with_fallback(&previous_hop, Protocol::Acknowledgement, &ack.to_bytes())
				.await
			{
				log::debug!(target: this.config.log_target,
					"Failed to acknowledge packet from {}: {err}", ShortAddress(&previous_hop));
			}
		});
	}

	async fn dial_and_send(
		&self,
		peer: &Address,
		protocol: Protocol,
		data: &[u8],
	) -> Result<(), Error> {
		let mut stream = self.transport.dial(peer, protocol).await?;
		self.transport.send(&mut stream, data).await?;
		Ok(())
	}

	/// Send `data` to `peer`, giving up after the forward timeout. If the first attempt fails,
	/// look the peer up and try once more.
	async fn send_with_fallback(
		&self,
		peer: &Address,
		protocol: Protocol,
		data: &[u8],
	) -> Result<(), Error> {
		let timeout = self.config.forward_timeout;
		let log_target = self.config.log_target;
		match tokio::time::timeout(timeout, self.dial_and_send(peer, protocol, data)).await {
			Ok(Ok(())) => return Ok(()),
			Ok(Err(err)) =>
				log::trace!(target: log_target, "Sending to {} failed: {err}", ShortAddress(peer)),
			Err(_) => log::trace!(target: log_target, "Sending to {} timed out", ShortAddress(peer)),
		}

		match tokio::time::timeout(timeout, self.transport.lookup(peer)).await {
			Ok(Ok(())) => (),
			Ok(Err(err)) => {
				log::trace!(target: log_target, "Lookup of {} failed: {err}", ShortAddress(peer));
				return Err(Error::ForwardTimeout)
			},
			Err(_) => return Err(Error::ForwardTimeout),
		}

		match tokio::time::timeout(timeout, self.dial_and_send(peer, protocol, data)).await {
			Ok(Ok(())) => Ok(()),
			_ => Err(Error::ForwardTimeout),
		}
	}
}
