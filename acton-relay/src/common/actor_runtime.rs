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

use acton_ern::Ern;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, instrument, trace, warn};

use crate::actor::{Behavior, Idle, ManagedActor, MonitorRegistry, Started};
use crate::common::acton_inner::ActonInner;
use crate::common::{ActonConfig, ActorHandle, ScopedActor};
use crate::io::{BrokerError, ConnectionHandle, TcpConnection};
use crate::message::{
    send, send_exit, Address, CorrelationId, DownMsg, Envelope, ExitMsg, ExitReason, Priority,
};
use crate::payload;

/// A running actor system.
///
/// Cloning is cheap; all clones share the same actors, relations and configuration.
#[derive(Debug, Clone)]
pub struct ActorRuntime(pub(crate) Arc<ActonInner>);

impl ActorRuntime {
    pub(crate) fn new(config: ActonConfig) -> Self {
        Self(Arc::new(ActonInner::new(config)))
    }

    /// The configuration this runtime was launched with.
    #[must_use]
    pub fn config(&self) -> &ActonConfig {
        &self.0.config
    }

    /// Number of actors that have started and not yet terminated.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.0.actors.len()
    }

    /// Creates an idle actor named after `defaults.actor_name`.
    #[must_use]
    pub fn new_actor<Model: Default + Send + Debug + 'static>(&self) -> ManagedActor<Idle, Model> {
        let name = self.0.config.defaults.actor_name.clone();
        self.new_actor_with_name(name)
    }

    /// Creates an idle actor with the given name.
    #[must_use]
    pub fn new_actor_with_name<Model: Default + Send + Debug + 'static>(
        &self,
        name: impl Into<String>,
    ) -> ManagedActor<Idle, Model> {
        ManagedActor::new(self, self.ern(name.into()), false)
    }

    /// Creates an idle broker named after `defaults.broker_name`.
    #[must_use]
    pub fn new_broker<Model: Default + Send + Debug + 'static>(&self) -> ManagedActor<Idle, Model> {
        let name = self.0.config.defaults.broker_name.clone();
        self.new_broker_with_name(name)
    }

    /// Creates an idle broker with the given name.
    #[must_use]
    pub fn new_broker_with_name<Model: Default + Send + Debug + 'static>(
        &self,
        name: impl Into<String>,
    ) -> ManagedActor<Idle, Model> {
        ManagedActor::new(self, self.ern(name.into()), true)
    }

    /// Creates and starts an actor with `model` as its initial state.
    pub fn spawn<Model, F>(&self, model: Model, init: F) -> ActorHandle
    where
        Model: Default + Send + Debug + 'static,
        F: FnOnce(&mut ManagedActor<Started, Model>) -> anyhow::Result<Behavior<Model>> + Send + 'static,
    {
        let mut actor = self.new_actor::<Model>();
        actor.model = model;
        actor.start(init)
    }

    /// Creates and starts a broker with `model` as its initial state.
    pub fn spawn_broker<Model, F>(&self, model: Model, init: F) -> ActorHandle
    where
        Model: Default + Send + Debug + 'static,
        F: FnOnce(&mut ManagedActor<Started, Model>) -> anyhow::Result<Behavior<Model>> + Send + 'static,
    {
        let mut broker = self.new_broker::<Model>();
        broker.model = model;
        broker.start(init)
    }

    /// Connects to `host:port` and starts a broker owning the connection.
    ///
    /// `init` receives the handle of the new connection.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Io`] when the connection cannot be established.
    #[instrument(skip(self, model, init))]
    pub async fn spawn_io_client<Model, F>(
        &self,
        host: &str,
        port: u16,
        model: Model,
        init: F,
    ) -> Result<ActorHandle, BrokerError>
    where
        Model: Default + Send + Debug + 'static,
        F: FnOnce(&mut ManagedActor<Started, Model>, ConnectionHandle) -> anyhow::Result<Behavior<Model>>
            + Send
            + 'static,
    {
        let stream = tokio::net::TcpStream::connect((host, port)).await?;
        let mut broker = self.new_broker::<Model>();
        broker.model = model;
        let connection = TcpConnection::spawn(stream, None, self);
        let handle = broker.attach_connection(connection)?;
        debug!(%handle, "client connection established");
        Ok(broker.start(move |actor| init(actor, handle)))
    }

    /// Creates a [`ScopedActor`] for driving the system from ordinary async code.
    #[must_use]
    pub fn scoped(&self) -> ScopedActor {
        ScopedActor::new(self.clone(), self.ern("scoped".to_string()))
    }

    /// Waits until every started actor has terminated.
    pub async fn await_all_actors_done(&self) {
        loop {
            let handles = self.live_handles();
            if handles.is_empty() {
                return;
            }
            trace!(remaining = handles.len(), "waiting for actors");
            join_all(handles.iter().map(ActorHandle::wait_for_exit)).await;
        }
    }

    /// Kills every actor and waits for them, bounded by the system shutdown timeout.
    /// Afterwards all I/O tasks of the runtime are cancelled.
    ///
    /// # Errors
    ///
    /// Fails when actors are still running once the timeout elapses.
    #[instrument(skip(self))]
    pub async fn shutdown_all(&self) -> anyhow::Result<()> {
        let timeout = self.0.config.system_shutdown_timeout();
        let handles = self.live_handles();
        trace!(actors = handles.len(), "sending kill to all actors");
        for handle in &handles {
            send_exit(handle.address(), ExitReason::Kill);
        }
        let finished = tokio::time::timeout(timeout, async {
            join_all(handles.iter().map(ActorHandle::wait_for_exit)).await;
            self.0.tracker.close();
            self.0.tracker.wait().await;
        })
        .await;
        self.0.cancellation_token.cancel();
        if finished.is_err() {
            error!("System-wide shutdown timeout expired after {:?}", timeout);
            return Err(anyhow::anyhow!(
                "timeout while waiting for actors to shut down after {timeout:?}"
            ));
        }
        trace!("System shutdown complete.");
        Ok(())
    }

    fn live_handles(&self) -> Vec<ActorHandle> {
        self.0
            .actors
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn ern(&self, name: String) -> Ern {
        match Ern::with_root(name.clone()) {
            Ok(ern) => ern,
            Err(e) => {
                warn!(name = %name, error = ?e, "invalid actor name, using the default");
                Ern::default()
            }
        }
    }

    pub(crate) fn registry(&self) -> &MonitorRegistry {
        &self.0.registry
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.0.tracker
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.0.cancellation_token.clone()
    }

    pub(crate) fn register(&self, handle: &ActorHandle) {
        self.0.actors.insert(handle.id(), handle.clone());
    }

    /// Publishes the termination of `address`: a high-priority [`DownMsg`] to each
    /// watcher and an [`ExitMsg`] to each linked actor. The exit reason must
    /// already be recorded on the address.
    pub(crate) fn release(&self, address: &Address, reason: &ExitReason) {
        let watchers = self.0.registry.take_watchers(address);
        for watcher in &watchers {
            watcher.enqueue(Envelope::new(
                address.clone(),
                CorrelationId::NONE,
                Priority::High,
                payload!(DownMsg::new(address.clone(), reason.clone())),
            ));
        }
        let peers = self.0.registry.take_links(address);
        for peer in peers.iter().filter(|_| !reason.is_normal()) {
            send(
                address,
                peer,
                Priority::High,
                payload!(ExitMsg::new(address.clone(), reason.clone())),
            );
        }
        self.0.actors.remove(&address.id());
        trace!(
            actor = %address,
            watchers = watchers.len(),
            links = peers.len(),
            "termination published"
        );
    }
}
