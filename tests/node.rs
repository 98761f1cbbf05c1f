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

//! Node tests over an in-memory network.

#[path = "util.rs"]
mod util;

use mixpacket::{por::RELAY_FEE, Error, KeyConnector, Packet, Protocol};
use std::time::Duration;
use util::{spawn_peers, Network};

async fn wait_for(mut condition: impl FnMut() -> bool) {
	for _ in 0..500 {
		if condition() {
			return
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("Condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hello_mix() {
	let _ = env_logger::try_init();

	let network = Network::default();
	let mut peers = spawn_peers(&network, 4);
	let path = [peers[1].address(), peers[2].address(), peers[3].address()];

	peers[0].node.send_message(b"hello-mix", &path).await.unwrap();
	assert_eq!(peers[3].delivered.recv().await.unwrap(), b"hello-mix");

	// Both relays get acknowledged, redeemable tickets
	wait_for(|| {
		peers[1..3].iter().all(|peer| peer.node.store().acknowledged_tickets().len() == 1)
	})
	.await;
	assert!(peers[1..3].iter().all(|peer| peer.node.store().num_unacknowledged() == 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_messages() {
	let network = Network::default();
	let mut peers = spawn_peers(&network, 4);
	let path = [peers[1].address(), peers[2].address(), peers[3].address()];

	for i in 0..100u32 {
		peers[0].node.send_message(&i.to_be_bytes(), &path).await.unwrap();
	}
	let mut delivered = Vec::new();
	for _ in 0..100 {
		let message = peers[3].delivered.recv().await.unwrap();
		delivered.push(u32::from_be_bytes(message.try_into().unwrap()));
	}
	delivered.sort();
	assert_eq!(delivered, (0..100).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_are_delivered_once() {
	let network = Network::default();
	let mut peers = spawn_peers(&network, 1);
	let sender = KeyConnector::gen(&mut rand::thread_rng());
	let bytes = Packet::create(
		&mut rand::thread_rng(),
		&sender,
		b"only once",
		&[peers[0].address()],
		RELAY_FEE,
	)
	.await
	.unwrap()
	.to_bytes();

	let receives = (0..10).map(|_| {
		let node = peers[0].node.clone();
		let bytes = bytes.clone();
		tokio::spawn(async move { node.receive(Protocol::Packet, bytes).await })
	});
	for result in futures::future::join_all(receives).await {
		result.unwrap().unwrap();
	}

	assert_eq!(peers[0].delivered.recv().await.unwrap(), b"only once");
	tokio::time::sleep(Duration::from_millis(200)).await;
	assert!(peers[0].delivered.try_recv().is_err());
	assert_eq!(peers[0].node.store().num_replay_tags(), 1);
}

#[tokio::test]
async fn garbage_is_dropped() {
	let network = Network::default();
	let mut peers = spawn_peers(&network, 2);

	peers[1].node.receive(Protocol::Packet, vec![0; 10]).await.unwrap();
	peers[1].node.receive(Protocol::Packet, vec![0; mixpacket::PACKET_SIZE]).await.unwrap();
	peers[1].node.receive(Protocol::Acknowledgement, vec![1; 5]).await.unwrap();
	assert_eq!(
		peers[1].node.handle_acknowledgement(&[1; 5]).await.err(),
		Some(Error::InvalidAcknowledgement)
	);

	// Still works afterwards
	peers[0].node.send_message(b"after", &[peers[1].address()]).await.unwrap();
	assert_eq!(peers[1].delivered.recv().await.unwrap(), b"after");
	assert!(peers[1].delivered.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn unreachable_next_hop() {
	let network = Network::default();
	let peers = spawn_peers(&network, 2);
	peers[0].transport.make_unreachable(peers[1].address());

	let result = peers[0].node.send_message(b"lost", &[peers[1].address()]).await;
	assert_eq!(result, Err(Error::ForwardTimeout));
	assert_eq!(peers[0].transport.dials(), 2);
	assert_eq!(peers[0].transport.lookups(), 1);
}
