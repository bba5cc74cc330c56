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
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::marker::PhantomData;
use std::sync::Arc;

use acton_ern::Ern;
use tokio::sync::watch;

pub use idle::Idle;
use idle::UnstartedGuard;
pub use started::Started;

use crate::actor::pending::PendingRequests;
use crate::actor::{Behavior, Mailbox, UnexpectedPolicy};
use crate::common::ActorRuntime;
use crate::io::BrokerIo;
use crate::message::{Address, Envelope, ExitReason};

/// Public operations of a running actor, used from inside handlers.
mod context;
mod idle;
/// Contains the `Started` type-state marker and the dispatch loop.
mod started;

/// An actor: private state (`Model`) plus the machinery the runtime drives it with.
///
/// The `ActorState` type parameter tracks the lifecycle:
///
/// *   [`Idle`]: created but not yet running. The address already exists, so it can
///     be handed out and messages sent to it are queued.
/// *   [`Started`]: running. Handlers receive `&mut ManagedActor<Started, Model>`
///     and use it to reach the model, reply, send, switch behavior and supervise.
///
/// # Type Parameters
///
/// *   `ActorState`: [`Idle`] or [`Started`].
/// *   `Model`: the user-defined state. It must implement `Default`, `Send` and `Debug`.
pub struct ManagedActor<ActorState, Model: Default + Send + Debug + 'static> {
    pub(crate) address: Address,

    /// The actor's name.
    pub(crate) id: Ern,
    pub(crate) runtime: ActorRuntime,

    /// The user-defined state, owned exclusively by this actor.
    pub model: Model,

    /// Strong reference to the mailbox; addresses only hold weak ones.
    pub(crate) mailbox: Arc<Mailbox>,
    /// Behavior stack. The top governs dispatch; an empty stack terminates the actor.
    pub(crate) behaviors: Vec<Arc<Behavior<Model>>>,
    pub(crate) pending: PendingRequests<Model>,
    /// Targets this actor monitors, released on termination.
    pub(crate) monitored: HashSet<Address>,
    /// Connection state, present only for brokers.
    pub(crate) io: Option<BrokerIo>,
    pub(crate) unexpected_policy: UnexpectedPolicy,
    pub(crate) unexpected_count: u64,
    /// The envelope being handled.
    pub(crate) current: Option<Envelope>,
    /// Set when the current handler forwarded its message or took a response promise.
    pub(crate) reply_delegated: bool,
    pub(crate) exit_request: Option<ExitReason>,
    pub(crate) exit_signal: watch::Sender<Option<ExitReason>>,
    /// Present until the actor starts.
    unstarted: Option<UnstartedGuard>,
    _actor_state: PhantomData<ActorState>,
}

impl<ActorState, Model: Default + Send + Debug + 'static> ManagedActor<ActorState, Model> {
    /// The actor's name.
    #[inline]
    pub const fn id(&self) -> &Ern {
        &self.id
    }

    /// Root segment of the actor's name.
    #[inline]
    pub fn name(&self) -> &str {
        self.id.root.as_str()
    }

    /// The actor's own address.
    #[inline]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// The runtime this actor belongs to.
    #[inline]
    pub const fn runtime(&self) -> &ActorRuntime {
        &self.runtime
    }

    /// Envelopes waiting in the mailbox.
    pub fn mailbox_len(&self) -> usize {
        self.mailbox.len()
    }

    /// True for actors created as brokers.
    pub const fn is_broker(&self) -> bool {
        self.io.is_some()
    }

    /// Moves every field into a new lifecycle state.
    fn into_state<Next>(self) -> ManagedActor<Next, Model> {
        ManagedActor {
            address: self.address,
            id: self.id,
            runtime: self.runtime,
            model: self.model,
            mailbox: self.mailbox,
            behaviors: self.behaviors,
            pending: self.pending,
            monitored: self.monitored,
            io: self.io,
            unexpected_policy: self.unexpected_policy,
            unexpected_count: self.unexpected_count,
            current: self.current,
            reply_delegated: self.reply_delegated,
            exit_request: self.exit_request,
            exit_signal: self.exit_signal,
            unstarted: None,
            _actor_state: PhantomData,
        }
    }
}

impl<ActorState, Model: Default + Send + Debug + 'static> Debug
    for ManagedActor<ActorState, Model>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedActor")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("model", &self.model)
            .field("behaviors", &self.behaviors.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
