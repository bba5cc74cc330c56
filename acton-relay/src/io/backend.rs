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

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::trace;

use crate::io::{
    AcceptHandle, BrokerError, ConnectionClosed, ConnectionHandle, FrameAssembler, NewConnection,
    NewData, ReceivePolicy,
};
use crate::message::{Address, Envelope, Priority};
use crate::payload;

/// One connection as seen by the reactor that drives it.
///
/// Brokers only ever talk to connections through this trait. Implementations
/// move bytes; the shared [`ConnectionSink`] turns what they receive into
/// messages for the owning broker.
pub trait ConnectionBackend: Send + Sync + Debug {
    /// The sink receiving this connection's input.
    fn sink(&self) -> &ConnectionSink;

    /// Hands flushed bytes to the reactor. Must not block.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ConnectionClosed`] once the connection is gone.
    fn transmit(&self, bytes: Vec<u8>) -> Result<(), BrokerError>;

    /// Closes the connection after the bytes already transmitted are written.
    /// The owner receives [`ConnectionClosed`] once that happens.
    fn close(&self);

    /// The connection's handle.
    fn handle(&self) -> ConnectionHandle {
        self.sink().handle()
    }

    /// Sets the framing used for the next `NewData`.
    fn configure_read(&self, policy: ReceivePolicy) {
        self.sink().configure_read(policy);
    }

    /// Moves the connection to another owner. Frames not yet delivered go to
    /// the new owner once it calls [`resume`](Self::resume).
    fn set_owner(&self, owner: Address) {
        self.sink().set_owner(owner);
    }

    /// Called by the owner once it has handled the last event of this
    /// connection, releasing the next frame.
    fn resume(&self) {
        self.sink().resume();
    }
}

#[derive(Debug)]
struct SinkState {
    owner: Address,
    assembler: FrameAssembler,
    /// An event of this connection sits in the owner's mailbox, or the owner
    /// has not yet asked for the first frame.
    in_flight: bool,
    closed: bool,
}

/// Turns received bytes into `NewData` messages for the connection's owner.
///
/// At most one event per connection is in the owner's mailbox at a time. The
/// next frame is cut when the owner has handled the previous one, so a read
/// policy set from a handler governs the very next frame.
///
/// A reactor reading from a socket calls [`wait_for_room`](Self::wait_for_room)
/// before each read, so a peer faster than its broker is slowed down rather
/// than buffered without bound.
#[derive(Debug)]
pub struct ConnectionSink {
    handle: ConnectionHandle,
    read_ahead: usize,
    state: Mutex<SinkState>,
    room: Notify,
}

impl ConnectionSink {
    /// A sink without owner. Frames wait until an owner takes the connection.
    /// `read_ahead` bounds the bytes buffered before [`wait_for_room`](Self::wait_for_room)
    /// holds the reactor back.
    #[must_use]
    pub fn new(handle: ConnectionHandle, policy: ReceivePolicy, read_ahead: usize) -> Self {
        Self {
            handle,
            read_ahead,
            state: Mutex::new(SinkState {
                owner: Address::invalid(),
                assembler: FrameAssembler::new(policy),
                in_flight: false,
                closed: false,
            }),
            room: Notify::new(),
        }
    }

    /// The connection's handle.
    #[must_use]
    pub const fn handle(&self) -> ConnectionHandle {
        self.handle
    }

    /// The current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.state.lock().owner.clone()
    }

    /// The current read policy.
    #[must_use]
    pub fn policy(&self) -> ReceivePolicy {
        self.state.lock().assembler.policy()
    }

    /// Bytes received but not yet delivered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.state.lock().assembler.buffered()
    }

    /// Announces the connection to `owner` with a [`NewConnection`]. Frames
    /// wait until the owner has handled the announcement.
    pub(crate) fn announce(
        &self,
        owner: Address,
        source: AcceptHandle,
        link: Arc<dyn ConnectionBackend>,
    ) -> bool {
        let mut state = self.state.lock();
        state.owner = owner;
        state.in_flight = true;
        state.owner.enqueue(Envelope::anonymous(
            Priority::Normal,
            payload!(NewConnection {
                source,
                handle: self.handle,
                link,
            }),
        ))
    }

    /// Buffers a received chunk. Returns `false` when the reactor should stop
    /// reading because the connection is closed or the owner is gone.
    pub fn ingest(&self, chunk: &[u8]) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.assembler.push(chunk);
        self.pump(&mut state)
    }

    /// True while fewer than `read_ahead` bytes are buffered, or once closed.
    #[must_use]
    pub fn has_room(&self) -> bool {
        let state = self.state.lock();
        state.closed || state.assembler.buffered() < self.read_ahead
    }

    /// Waits until [`has_room`](Self::has_room) holds.
    pub async fn wait_for_room(&self) {
        loop {
            let drained = self.room.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();
            if self.has_room() {
                return;
            }
            trace!(connection = %self.handle, "read ahead exhausted, waiting for the owner");
            drained.await;
        }
    }

    /// Sets the framing used for the next frame.
    pub fn configure_read(&self, policy: ReceivePolicy) {
        let mut state = self.state.lock();
        state.assembler.set_policy(policy);
        self.pump(&mut state);
    }

    /// Moves the connection to `owner`. Delivery is held until the new owner
    /// calls [`resume`](Self::resume), so it can set a read policy first.
    pub fn set_owner(&self, owner: Address) {
        let mut state = self.state.lock();
        trace!(connection = %self.handle, from = %state.owner, to = %owner, "connection changes owner");
        state.owner = owner;
        state.in_flight = true;
    }

    /// Releases the next frame.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        state.in_flight = false;
        self.pump(&mut state);
    }

    /// Marks the connection closed. Complete frames still buffered are
    /// delivered first, then exactly one [`ConnectionClosed`].
    pub fn closed(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        while let Some(buf) = state.assembler.next_frame() {
            let frame = NewData {
                handle: self.handle,
                buf,
            };
            state.owner.enqueue(Envelope::anonymous(Priority::Normal, payload!(frame)));
        }
        state.closed = true;
        self.room.notify_waiters();
        trace!(connection = %self.handle, "connection closed");
        state.owner.enqueue(Envelope::anonymous(
            Priority::Normal,
            payload!(ConnectionClosed {
                handle: self.handle,
            }),
        ));
    }

    /// Delivers the next frame unless one is already in flight. Returns
    /// `false` when the owner can no longer receive.
    fn pump(&self, state: &mut SinkState) -> bool {
        if state.closed || state.in_flight || !state.owner.is_valid() {
            return true;
        }
        let Some(buf) = state.assembler.next_frame() else {
            return true;
        };
        state.in_flight = true;
        self.room.notify_waiters();
        state.owner.enqueue(Envelope::anonymous(
            Priority::Normal,
            payload!(NewData {
                handle: self.handle,
                buf,
            }),
        ))
    }
}
