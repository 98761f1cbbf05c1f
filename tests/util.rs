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

#![allow(dead_code)]

use async_trait::async_trait;
use mixpacket::{
	Address, Config, Keypair, MemoryStore, Node, Protocol, Transport, TransportError,
};
use parking_lot::Mutex;
use std::{
	collections::{HashMap, HashSet},
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, OnceLock,
	},
};
use tokio::sync::mpsc;

pub fn log_target(peer_index: usize) -> &'static str {
	static LOG_TARGETS: OnceLock<Mutex<HashMap<usize, &'static str>>> = OnceLock::new();
	let mut log_targets = LOG_TARGETS.get_or_init(|| Mutex::new(HashMap::new())).lock();
	*log_targets
		.entry(peer_index)
		.or_insert_with(|| &*Box::leak(format!("mixpacket({peer_index})").into_boxed_str()))
}

pub type Inbox = mpsc::UnboundedSender<(Protocol, Vec<u8>)>;

/// Inboxes of all nodes, by address.
#[derive(Clone, Default)]
pub struct Network {
	inboxes: Arc<Mutex<HashMap<Address, Inbox>>>,
}

/// Transport delivering straight into the inboxes of a [`Network`].
pub struct ChannelTransport {
	network: Network,
	/// Dials to these peers never complete.
	unreachable: Mutex<HashSet<Address>>,
	dials: AtomicUsize,
	lookups: AtomicUsize,
}

impl ChannelTransport {
	pub fn new(network: Network) -> Self {
		Self {
			network,
			unreachable: Mutex::new(HashSet::new()),
			dials: AtomicUsize::new(0),
			lookups: AtomicUsize::new(0),
		}
	}

	pub fn make_unreachable(&self, peer: Address) {
		self.unreachable.lock().insert(peer);
	}

	pub fn dials(&self) -> usize {
		self.dials.load(Ordering::SeqCst)
	}

	pub fn lookups(&self) -> usize {
		self.lookups.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Transport for ChannelTransport {
	type Stream = (Protocol, Inbox);

	async fn dial(
		&self,
		peer: &Address,
		protocol: Protocol,
	) -> Result<Self::Stream, TransportError> {
		self.dials.fetch_add(1, Ordering::SeqCst);
		if self.unreachable.lock().contains(peer) {
			futures::future::pending::<()>().await;
		}
		let inbox = self.network.inboxes.lock().get(peer).cloned();
		inbox.map(|inbox| (protocol, inbox)).ok_or_else(|| TransportError("Unknown peer".into()))
	}

	async fn send(&self, stream: &mut Self::Stream, data: &[u8]) -> Result<(), TransportError> {
		stream
			.1
			.send((stream.0, data.to_vec()))
			.map_err(|_| TransportError("Peer gone".into()))
	}

	async fn lookup(&self, _peer: &Address) -> Result<(), TransportError> {
		self.lookups.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

pub struct Peer {
	pub node: Arc<Node<ChannelTransport, MemoryStore>>,
	pub transport: Arc<ChannelTransport>,
	pub delivered: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Peer {
	pub fn address(&self) -> Address {
		*self.node.address()
	}
}

/// Create `num_peers` nodes attached to `network`, each with a task feeding its inbox to it.
pub fn spawn_peers(network: &Network, num_peers: usize) -> Vec<Peer> {
	let mut rng = rand::thread_rng();
	(0..num_peers)
		.map(|peer_index| {
			let config = Config { log_target: log_target(peer_index), ..Default::default() };
			let keypair = Arc::new(Keypair::gen(&mut rng));
			let transport = Arc::new(ChannelTransport::new(network.clone()));
			let store = Arc::new(MemoryStore::new(
				config.replay_capacity,
				config.unacknowledged_capacity,
				config.log_target,
			));
			let (sink, delivered) = mpsc::unbounded_channel();
			let node = Arc::new(Node::new(
				config,
				keypair,
				transport.clone(),
				store,
				Arc::new(sink),
			));

			let (inbox, mut inbox_rx) = mpsc::unbounded_channel();
			network.inboxes.lock().insert(*node.address(), inbox);
			let receiver = node.clone();
			tokio::spawn(async move {
				while let Some((protocol, data)) = inbox_rx.recv().await {
					let _ = receiver.receive(protocol, data).await;
				}
			});

			Peer { node, transport, delivered }
		})
		.collect()
}
