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

//! Connector backed by a local key.

use super::{
	error::ConnectorError,
	keys::{Address, Hash, Keypair, Signature},
	por::{Balance, SignedTicket},
};
use crate::traits::Connector;
use async_trait::async_trait;
use rand::{CryptoRng, Rng};
use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// Signs with a local [`Keypair`] and issues tickets with a monotonically increasing index.
pub struct KeyConnector {
	keypair: Arc<Keypair>,
	ticket_index: AtomicU64,
}

impl KeyConnector {
	pub fn new(keypair: Arc<Keypair>) -> Self {
		Self { keypair, ticket_index: AtomicU64::new(0) }
	}

	pub fn gen(rng: &mut (impl Rng + CryptoRng)) -> Self {
		Self::new(Arc::new(Keypair::gen(rng)))
	}
}

#[async_trait]
impl Connector for KeyConnector {
	fn address(&self) -> &Address {
		self.keypair.address()
	}

	fn sign(&self, hash: &Hash) -> Signature {
		self.keypair.sign_hash(hash)
	}

	async fn issue_ticket(
		&self,
		counterparty: &Address,
		amount: Balance,
		challenge: &Hash,
	) -> Result<SignedTicket, ConnectorError> {
		let index = self.ticket_index.fetch_add(1, Ordering::Relaxed);
		Ok(SignedTicket::issue(&self.keypair, *counterparty, amount, index, *challenge))
	}
}
