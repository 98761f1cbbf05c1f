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

//! Onion-encrypted message envelope.
//!
//! Plaintext layout: `length (u32, big endian) ‖ padding marker ‖ payload ‖ zeros`.

use super::{
	error::Error,
	sphinx::{Prp, SharedSecret},
};

/// Size in bytes of the message block carried by every packet.
pub const MESSAGE_SIZE: usize = 500;
pub type RawMessage = [u8; MESSAGE_SIZE];

const LENGTH_PREFIX_SIZE: usize = 4;
const PADDING_MARKER: u8 = 0x01;
/// Bytes of a message block not available for payload.
pub const MESSAGE_OVERHEAD: usize = LENGTH_PREFIX_SIZE + 1;
pub const MAX_PAYLOAD_SIZE: usize = MESSAGE_SIZE - MESSAGE_OVERHEAD;

pub struct Message {
	data: Box<RawMessage>,
	encrypted: bool,
}

impl Message {
	/// Lay out `payload` in a plaintext block.
	pub fn create_plain(payload: &[u8]) -> Result<Self, Error> {
		if payload.len() > MAX_PAYLOAD_SIZE {
			return Err(Error::PayloadTooLarge)
		}
		let mut data = Box::new([0; MESSAGE_SIZE]);
		let len = u32::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge)?;
		data[..LENGTH_PREFIX_SIZE].copy_from_slice(&len.to_be_bytes());
		data[LENGTH_PREFIX_SIZE] = PADDING_MARKER;
		data[MESSAGE_OVERHEAD..MESSAGE_OVERHEAD + payload.len()].copy_from_slice(payload);
		Ok(Self { data, encrypted: false })
	}

	/// Wrap a received block. It is assumed to carry at least one layer of encryption.
	pub fn from_bytes(data: &RawMessage) -> Self {
		Self { data: Box::new(*data), encrypted: true }
	}

	pub fn as_bytes(&self) -> &RawMessage {
		&self.data
	}

	pub fn is_encrypted(&self) -> bool {
		self.encrypted
	}

	/// Add one layer per hop. The last hop's layer is applied first so that the first hop
	/// removes the outermost layer.
	pub fn onion_encrypt(&mut self, secrets: &[SharedSecret]) {
		for secret in secrets.iter().rev() {
			Prp::new(secret).permutate(&mut self.data[..]);
		}
		self.encrypted = true;
	}

	/// Remove one layer. The message stays flagged as encrypted until
	/// [`mark_plaintext`](Self::mark_plaintext) is called.
	pub fn decrypt(&mut self, secret: &SharedSecret) {
		Prp::new(secret).inverse(&mut self.data[..]);
	}

	/// Assert that all layers have been removed.
	pub fn mark_plaintext(&mut self) {
		self.encrypted = false;
	}

	/// The payload, with the length prefix and padding stripped.
	pub fn plaintext(&self) -> Result<&[u8], Error> {
		if self.encrypted {
			return Err(Error::StillEncrypted)
		}
		let mut len = [0; LENGTH_PREFIX_SIZE];
		len.copy_from_slice(&self.data[..LENGTH_PREFIX_SIZE]);
		let len = u32::from_be_bytes(len) as usize;
		if len > MAX_PAYLOAD_SIZE || self.data[LENGTH_PREFIX_SIZE] != PADDING_MARKER {
			return Err(Error::InvalidMessage)
		}
		let (payload, padding) = self.data[MESSAGE_OVERHEAD..].split_at(len);
		if padding.iter().any(|b| *b != 0) {
			return Err(Error::InvalidMessage)
		}
		Ok(payload)
	}
}
