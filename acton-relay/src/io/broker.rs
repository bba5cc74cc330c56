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

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::actor::{Behavior, Idle, ManagedActor, Started};
use crate::common::ActorHandle;
use crate::io::tcp;
use crate::io::{
    AcceptHandle, BrokerError, ConnectionBackend, ConnectionClosed, ConnectionHandle,
    NewConnection, NewData, ReceivePolicy,
};
use crate::message::{Address, Envelope};

/// Lifecycle of a connection owned by a broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionLifecycle {
    /// Reading and writing.
    Open,
    /// `close_connection` was called; waiting for the reactor to confirm.
    Closing,
    /// Confirmed closed. The broker forgets the connection after handling
    /// the `ConnectionClosed` message.
    Closed,
}

struct ConnectionState {
    backend: Arc<dyn ConnectionBackend>,
    policy: ReceivePolicy,
    write_buf: Vec<u8>,
    lifecycle: ConnectionLifecycle,
}

impl ConnectionState {
    fn new(backend: Arc<dyn ConnectionBackend>) -> Self {
        let policy = backend.sink().policy();
        Self {
            backend,
            policy,
            write_buf: Vec::new(),
            lifecycle: ConnectionLifecycle::Open,
        }
    }

    fn flush(&mut self, handle: ConnectionHandle) -> Result<(), BrokerError> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        let bytes = std::mem::take(&mut self.write_buf);
        trace!(connection = %handle, bytes = bytes.len(), "flushing");
        self.backend.transmit(bytes)
    }
}

/// Connections and acceptors owned by one broker. Only the broker's own task
/// touches it.
#[derive(Default)]
pub(crate) struct BrokerIo {
    connections: BTreeMap<ConnectionHandle, ConnectionState>,
    acceptors: HashMap<AcceptHandle, CancellationToken>,
    /// Connections taken over whose delivery waits for the current handler
    /// (or the initialisation) to finish.
    held: Vec<ConnectionHandle>,
}

impl BrokerIo {
    fn insert(&mut self, backend: Arc<dyn ConnectionBackend>) -> ConnectionHandle {
        let handle = backend.handle();
        self.connections.insert(handle, ConnectionState::new(backend));
        handle
    }

    fn take_over(&mut self, backend: Arc<dyn ConnectionBackend>, owner: Address) -> ConnectionHandle {
        backend.set_owner(owner);
        let handle = self.insert(backend);
        self.held.push(handle);
        handle
    }

    fn connection(&mut self, handle: ConnectionHandle) -> Result<&mut ConnectionState, BrokerError> {
        self.connections
            .get_mut(&handle)
            .ok_or(BrokerError::UnknownHandle(handle))
    }

    fn open_connection(&mut self, handle: ConnectionHandle) -> Result<&mut ConnectionState, BrokerError> {
        let state = self.connection(handle)?;
        if state.lifecycle == ConnectionLifecycle::Open {
            Ok(state)
        } else {
            Err(BrokerError::ConnectionClosed(handle))
        }
    }
}

impl Debug for BrokerIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerIo")
            .field("connections", &self.connections.keys().collect::<Vec<_>>())
            .field("acceptors", &self.acceptors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<Model: Default + Send + Debug + 'static> ManagedActor<Idle, Model> {
    /// Makes this broker the owner of `backend` before it starts. Received
    /// bytes are delivered once the initialisation has run, so it can choose
    /// a read policy first.
    ///
    /// # Errors
    ///
    /// [`BrokerError::NotABroker`] when the actor was not created as a broker.
    pub fn attach_connection(
        &mut self,
        backend: Arc<dyn ConnectionBackend>,
    ) -> Result<ConnectionHandle, BrokerError> {
        let owner = self.address.clone();
        let io = self.io.as_mut().ok_or(BrokerError::NotABroker)?;
        Ok(io.take_over(backend, owner))
    }
}

impl<Model: Default + Send + Debug + 'static> ManagedActor<Started, Model> {
    fn io_mut(&mut self) -> Result<&mut BrokerIo, BrokerError> {
        self.io.as_mut().ok_or(BrokerError::NotABroker)
    }

    /// Handles of the connections this broker owns.
    #[must_use]
    pub fn connections(&self) -> Vec<ConnectionHandle> {
        self.io
            .as_ref()
            .map(|io| io.connections.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Lifecycle of an owned connection.
    #[must_use]
    pub fn connection_lifecycle(&self, handle: ConnectionHandle) -> Option<ConnectionLifecycle> {
        self.io
            .as_ref()
            .and_then(|io| io.connections.get(&handle))
            .map(|state| state.lifecycle)
    }

    /// The read policy last configured for `handle`.
    #[must_use]
    pub fn read_policy(&self, handle: ConnectionHandle) -> Option<ReceivePolicy> {
        self.io
            .as_ref()
            .and_then(|io| io.connections.get(&handle))
            .map(|state| state.policy)
    }

    /// Takes ownership of `backend`. Delivery starts after the current handler
    /// returns.
    ///
    /// # Errors
    ///
    /// [`BrokerError::NotABroker`] when the actor was not created as a broker.
    pub fn add_connection(
        &mut self,
        backend: Arc<dyn ConnectionBackend>,
    ) -> Result<ConnectionHandle, BrokerError> {
        let owner = self.address.clone();
        let handle = self.io_mut()?.take_over(backend, owner);
        debug!(connection = %handle, "connection added");
        Ok(handle)
    }

    /// Sets how the next frames of `handle` are cut.
    ///
    /// # Errors
    ///
    /// [`BrokerError::FrameTooLarge`] when one frame would need more than the
    /// configured `limits.max_frame_size`, [`BrokerError::UnknownHandle`] or
    /// [`BrokerError::NotABroker`].
    pub fn configure_read(
        &mut self,
        handle: ConnectionHandle,
        policy: ReceivePolicy,
    ) -> Result<(), BrokerError> {
        let limit = self.runtime.config().limits.max_frame_size;
        let state = self.io_mut()?.connection(handle)?;
        let requested = policy.required_bytes();
        if requested > limit {
            return Err(BrokerError::FrameTooLarge {
                handle,
                requested,
                limit,
            });
        }
        state.policy = policy;
        state.backend.configure_read(policy);
        trace!(connection = %handle, ?policy, "read policy configured");
        Ok(())
    }

    /// Appends `bytes` to the output buffer of `handle`. Nothing is sent
    /// before [`flush`](Self::flush).
    ///
    /// # Errors
    ///
    /// [`BrokerError::UnknownHandle`], [`BrokerError::ConnectionClosed`] or
    /// [`BrokerError::NotABroker`].
    pub fn write(&mut self, handle: ConnectionHandle, bytes: &[u8]) -> Result<(), BrokerError> {
        self.io_mut()?
            .open_connection(handle)?
            .write_buf
            .extend_from_slice(bytes);
        Ok(())
    }

    /// The output buffer of `handle`, for writing in place.
    ///
    /// # Errors
    ///
    /// As for [`write`](Self::write).
    pub fn write_buffer(&mut self, handle: ConnectionHandle) -> Result<&mut Vec<u8>, BrokerError> {
        Ok(&mut self.io_mut()?.open_connection(handle)?.write_buf)
    }

    /// Hands the output buffer of `handle` to the reactor. Never blocks.
    ///
    /// # Errors
    ///
    /// As for [`write`](Self::write), plus [`BrokerError::ConnectionClosed`]
    /// when the reactor already dropped the connection.
    pub fn flush(&mut self, handle: ConnectionHandle) -> Result<(), BrokerError> {
        self.io_mut()?.open_connection(handle)?.flush(handle)
    }

    /// Flushes and closes `handle`. A [`ConnectionClosed`] follows.
    ///
    /// # Errors
    ///
    /// [`BrokerError::UnknownHandle`] or [`BrokerError::NotABroker`].
    #[instrument(skip(self), fields(actor = %self.id))]
    pub fn close_connection(&mut self, handle: ConnectionHandle) -> Result<(), BrokerError> {
        let state = self.io_mut()?.connection(handle)?;
        if state.lifecycle != ConnectionLifecycle::Open {
            return Ok(());
        }
        if let Err(error) = state.flush(handle) {
            debug!(%error, "pending output dropped");
        }
        state.lifecycle = ConnectionLifecycle::Closing;
        state.backend.close();
        Ok(())
    }

    /// Moves `handle` to a new broker running `init`. This broker keeps no
    /// rights over the connection; bytes it had not flushed are flushed first.
    ///
    /// # Errors
    ///
    /// [`BrokerError::UnknownHandle`] or [`BrokerError::NotABroker`].
    #[instrument(skip(self, model, init), fields(actor = %self.id))]
    pub fn fork<Child, F>(
        &mut self,
        handle: ConnectionHandle,
        model: Child,
        init: F,
    ) -> Result<ActorHandle, BrokerError>
    where
        Child: Default + Send + Debug + 'static,
        F: FnOnce(&mut ManagedActor<Started, Child>, ConnectionHandle) -> anyhow::Result<Behavior<Child>>
            + Send
            + 'static,
    {
        let mut state = self
            .io_mut()?
            .connections
            .remove(&handle)
            .ok_or(BrokerError::UnknownHandle(handle))?;
        if let Err(error) = state.flush(handle) {
            debug!(%error, "pending output dropped");
        }
        let mut child = self.runtime.new_broker::<Child>();
        child.model = model;
        child.attach_connection(state.backend)?;
        debug!(connection = %handle, child = %child.address(), "connection forked");
        Ok(child.start(move |actor| init(actor, handle)))
    }

    /// Listens on `host:port` (port 0 picks a free port). Every accepted
    /// connection is announced to this broker with a [`NewConnection`].
    ///
    /// Returns the acceptor's handle and the bound port.
    ///
    /// # Errors
    ///
    /// [`BrokerError::Io`] when binding fails, or [`BrokerError::NotABroker`].
    #[instrument(skip(self), fields(actor = %self.id))]
    pub fn add_tcp_doorman(&mut self, port: u16, host: &str) -> Result<(AcceptHandle, u16), BrokerError> {
        let owner = self.address.clone();
        let runtime = self.runtime.clone();
        let cancellation = runtime.cancellation_token().child_token();
        let io = self.io_mut()?;
        let (listener, port) = tcp::bind(host, port)?;
        let handle = AcceptHandle::next();
        io.acceptors.insert(handle, cancellation.clone());
        tcp::spawn_doorman(listener, handle, owner, cancellation, runtime);
        debug!(acceptor = %handle, port, "listening");
        Ok((handle, port))
    }

    /// Stops accepting on `handle`. An `AcceptorClosed` follows.
    ///
    /// # Errors
    ///
    /// [`BrokerError::UnknownAcceptor`] or [`BrokerError::NotABroker`].
    pub fn close_acceptor(&mut self, handle: AcceptHandle) -> Result<(), BrokerError> {
        let cancellation = self
            .io_mut()?
            .acceptors
            .remove(&handle)
            .ok_or(BrokerError::UnknownAcceptor(handle))?;
        cancellation.cancel();
        Ok(())
    }

    /// Bookkeeping before the behavior sees an I/O event: register a connection
    /// announced by one of this broker's acceptors, or mark a connection the
    /// reactor reported closed.
    pub(crate) fn prepare_io_event(&mut self, envelope: &Envelope) {
        let Some(io) = self.io.as_mut() else {
            return;
        };
        let payload = envelope.payload();
        if payload.len() != 1 {
            return;
        }
        if let Some(announcement) = payload.get::<NewConnection>(0) {
            let handle = io.insert(announcement.link.clone());
            trace!(connection = %handle, acceptor = %announcement.source, "connection adopted");
        } else if let Some(closed) = payload.get::<ConnectionClosed>(0) {
            if let Some(state) = io.connections.get_mut(&closed.handle) {
                state.lifecycle = ConnectionLifecycle::Closed;
            }
        }
    }

    /// Starts delivery on connections taken over since the last call.
    pub(crate) fn release_held_connections(&mut self) {
        let Some(io) = self.io.as_mut() else {
            return;
        };
        for handle in std::mem::take(&mut io.held) {
            if let Some(state) = io.connections.get(&handle) {
                state.backend.resume();
            }
        }
    }

    /// Bookkeeping once the behavior has handled a message: release the next
    /// frame of a connection still owned, forget a closed one.
    pub(crate) fn settle_io_event(&mut self, envelope: &Envelope) {
        let Some(io) = self.io.as_mut() else {
            return;
        };
        let payload = envelope.payload();
        if payload.len() == 1 {
            if let Some(closed) = payload.get::<ConnectionClosed>(0) {
                if io.connections.remove(&closed.handle).is_some() {
                    trace!(connection = %closed.handle, "connection forgotten");
                }
            } else if let Some(handle) = payload
                .get::<NewData>(0)
                .map(|data| data.handle)
                .or_else(|| payload.get::<NewConnection>(0).map(|announcement| announcement.handle))
            {
                if let Some(state) = io.connections.get(&handle) {
                    if !io.held.contains(&handle) {
                        state.backend.resume();
                    }
                }
            }
        }
        self.release_held_connections();
    }

    /// Closes every connection and acceptor. Runs when the broker terminates.
    pub(crate) fn close_all_io(&mut self) {
        let Some(io) = self.io.as_mut() else {
            return;
        };
        for (handle, mut state) in std::mem::take(&mut io.connections) {
            if state.lifecycle == ConnectionLifecycle::Open {
                if let Err(error) = state.flush(handle) {
                    trace!(connection = %handle, %error, "pending output dropped");
                }
            }
            state.backend.close();
        }
        for (_, cancellation) in io.acceptors.drain() {
            cancellation.cancel();
        }
    }
}
