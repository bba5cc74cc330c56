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

use std::collections::HashSet;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use acton_ern::Ern;
use tokio::sync::watch;
use tracing::{instrument, trace};

use crate::actor::pending::PendingRequests;
use crate::actor::{Behavior, Mailbox, ManagedActor, Started, UnexpectedPolicy};
use crate::common::{ActorHandle, ActorRuntime};
use crate::io::BrokerIo;
use crate::message::{Address, ExitReason};

/// Type-state marker for a [`ManagedActor`] that has been created but not started.
///
/// An idle actor already has its address, so the address can be shared and
/// messages can be sent before [`ManagedActor::start`] runs the actor. They
/// wait in the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Idle;

/// Publishes [`ExitReason::Unreachable`] for an actor dropped without being
/// started, so its watchers and linked actors still hear of it.
#[derive(Debug)]
pub(crate) struct UnstartedGuard {
    address: Address,
    runtime: ActorRuntime,
    armed: bool,
}

impl UnstartedGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for UnstartedGuard {
    fn drop(&mut self) {
        if self.armed && self.address.mark_terminated(ExitReason::Unreachable) {
            trace!(actor = %self.address, "actor dropped before start");
            self.runtime.release(&self.address, &ExitReason::Unreachable);
        }
    }
}

impl<Model: Default + Send + Debug + 'static> ManagedActor<Idle, Model> {
    pub(crate) fn new(runtime: &ActorRuntime, id: Ern, broker: bool) -> Self {
        let mailbox = Arc::new(Mailbox::new());
        let address = Address::new(id.clone(), &mailbox);
        let (exit_signal, _) = watch::channel(None);
        let unexpected_policy = UnexpectedPolicy::from(runtime.config().behavior.unexpected_message);
        let unstarted = UnstartedGuard {
            address: address.clone(),
            runtime: runtime.clone(),
            armed: true,
        };
        trace!(actor = %id, broker, "created actor");
        Self {
            address,
            id,
            runtime: runtime.clone(),
            model: Model::default(),
            mailbox,
            behaviors: Vec::new(),
            pending: PendingRequests::default(),
            monitored: HashSet::new(),
            io: broker.then(BrokerIo::default),
            unexpected_policy,
            unexpected_count: 0,
            current: None,
            reply_delegated: false,
            exit_request: None,
            exit_signal,
            unstarted: Some(unstarted),
            _actor_state: PhantomData,
        }
    }

    /// Chooses what the actor does with messages its behavior does not match.
    ///
    /// Defaults to the `behavior.unexpected_message` configuration setting.
    pub fn set_unexpected_policy(&mut self, policy: UnexpectedPolicy) -> &mut Self {
        self.unexpected_policy = policy;
        self
    }

    /// Starts the actor.
    ///
    /// `init` runs on the actor's own task before the first message is handled
    /// and returns the initial behavior. An `Err` or a panic terminates the actor
    /// with [`ExitReason::Failure`](crate::message::ExitReason::Failure).
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[instrument(skip(self, init), fields(actor = %self.id))]
    pub fn start<F>(mut self, init: F) -> ActorHandle
    where
        F: FnOnce(&mut ManagedActor<Started, Model>) -> anyhow::Result<Behavior<Model>>
            + Send
            + 'static,
    {
        let handle = ActorHandle::new(
            self.address.clone(),
            self.exit_signal.subscribe(),
            self.runtime.config().actor_shutdown_timeout(),
        );
        if let Some(guard) = self.unstarted.as_mut() {
            guard.disarm();
        }
        let runtime = self.runtime.clone();
        runtime.register(&handle);
        let actor: ManagedActor<Started, Model> = self.into_state();
        runtime.tracker().spawn(actor.wake(Box::new(init)));
        trace!("actor task spawned");
        handle
    }
}
