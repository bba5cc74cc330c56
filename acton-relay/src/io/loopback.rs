/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::io::{BrokerError, ConnectionBackend, ConnectionHandle, ConnectionSink, ReceivePolicy};

/// An in-memory connection.
///
/// A lone loopback connection is driven by the test or program holding it:
/// [`LoopbackConnection::inject`] plays bytes arriving from the network and
/// [`LoopbackConnection::take_transmitted`] collects what the owner flushed.
/// The two ends of a [`LoopbackConnection::pair`] feed each other, which makes
/// an in-process pipe between two brokers.
///
/// Loopback input is buffered without bound; the reader is whoever injects.
#[derive(Debug)]
pub struct LoopbackConnection {
    sink: ConnectionSink,
    peer: Mutex<Weak<LoopbackConnection>>,
    transmitted: Mutex<Vec<u8>>,
    closed: AtomicBool,
}

impl LoopbackConnection {
    /// A connection not connected to anything.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sink: ConnectionSink::new(
                ConnectionHandle::next(),
                ReceivePolicy::default(),
                usize::MAX,
            ),
            peer: Mutex::new(Weak::new()),
            transmitted: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Two connections whose output is the other's input.
    #[must_use]
    pub fn pair() -> (Arc<Self>, Arc<Self>) {
        let left = Self::new();
        let right = Self::new();
        *left.peer.lock() = Arc::downgrade(&right);
        *right.peer.lock() = Arc::downgrade(&left);
        (left, right)
    }

    /// Delivers `chunk` as if it had just been read from the network.
    pub fn inject(&self, chunk: &[u8]) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.sink.ingest(chunk)
    }

    /// The remote side closed the connection.
    pub fn hang_up(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            trace!(connection = %self.sink.handle(), "loopback hung up");
            self.sink.closed();
        }
    }

    /// Takes the bytes flushed so far by an unpaired connection.
    pub fn take_transmitted(&self) -> Vec<u8> {
        std::mem::take(&mut *self.transmitted.lock())
    }

    /// True once either side closed the connection.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl ConnectionBackend for LoopbackConnection {
    fn sink(&self) -> &ConnectionSink {
        &self.sink
    }

    fn transmit(&self, bytes: Vec<u8>) -> Result<(), BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::ConnectionClosed(self.sink.handle()));
        }
        let peer = self.peer.lock().upgrade();
        match peer {
            Some(peer) => {
                peer.inject(&bytes);
            }
            None => self.transmitted.lock().extend_from_slice(&bytes),
        }
        Ok(())
    }

    fn close(&self) {
        self.hang_up();
        let peer = self.peer.lock().upgrade();
        if let Some(peer) = peer {
            peer.hang_up();
        }
    }
}
