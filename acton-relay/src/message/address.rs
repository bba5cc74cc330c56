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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use acton_ern::Ern;
use tracing::trace;

use crate::actor::Mailbox;
use crate::message::{Envelope, ExitReason};

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Numeric identity of an actor, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ActorId(u64);

impl ActorId {
    /// The id of the invalid address.
    pub const INVALID: Self = Self(0);

    pub(crate) fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// False only for [`ActorId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct AddressInner {
    id: ActorId,
    name: Ern,
    mailbox: Weak<Mailbox>,
    exit_reason: OnceLock<ExitReason>,
}

/// An opaque reference to an actor's mailbox.
///
/// Addresses are cheap to clone and compare by actor identity. The invalid
/// address ([`Address::invalid`], also the `Default`) refers to nothing;
/// sending to it, or to an actor that has terminated, silently does nothing.
/// An address never keeps its actor alive.
#[derive(Clone, Default)]
pub struct Address {
    inner: Option<Arc<AddressInner>>,
}

impl Address {
    pub(crate) fn new(name: Ern, mailbox: &Arc<Mailbox>) -> Self {
        Self {
            inner: Some(Arc::new(AddressInner {
                id: ActorId::next(),
                name,
                mailbox: Arc::downgrade(mailbox),
                exit_reason: OnceLock::new(),
            })),
        }
    }

    /// The address that refers to no actor.
    #[must_use]
    pub const fn invalid() -> Self {
        Self { inner: None }
    }

    /// False for the invalid address.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// True while the referenced actor can still receive messages.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.as_ref().is_some_and(|inner| {
            inner.exit_reason.get().is_none()
                && inner
                    .mailbox
                    .upgrade()
                    .is_some_and(|mailbox| !mailbox.is_closed())
        })
    }

    /// The actor's numeric identity ([`ActorId::INVALID`] for the invalid address).
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.inner.as_ref().map_or(ActorId::INVALID, |inner| inner.id)
    }

    /// The actor's name, if the address is valid.
    #[must_use]
    pub fn ern(&self) -> Option<&Ern> {
        self.inner.as_ref().map(|inner| &inner.name)
    }

    /// The root component of the actor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner
            .as_ref()
            .map_or("invalid", |inner| inner.name.root.as_str())
    }

    /// Why the actor terminated, once it has.
    #[must_use]
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.exit_reason.get().cloned())
    }

    /// The exit reason, or [`ExitReason::Unreachable`] when the mailbox vanished
    /// without one being recorded. `None` while the actor is alive.
    pub(crate) fn termination(&self) -> Option<ExitReason> {
        let inner = self.inner.as_ref()?;
        if let Some(reason) = inner.exit_reason.get() {
            return Some(reason.clone());
        }
        match inner.mailbox.upgrade() {
            Some(_) => None,
            None => Some(ExitReason::Unreachable),
        }
    }

    /// Records the exit reason. Only the first call has an effect.
    pub(crate) fn mark_terminated(&self, reason: ExitReason) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.exit_reason.set(reason).is_ok())
    }

    /// Appends `envelope` to the referenced mailbox.
    ///
    /// Returns `false` when nothing was enqueued: invalid address, terminated
    /// actor or closed mailbox.
    pub(crate) fn enqueue(&self, envelope: Envelope) -> bool {
        let Some(inner) = &self.inner else {
            trace!(payload = ?envelope.payload(), "dropping message sent to the invalid address");
            return false;
        };
        let Some(mailbox) = inner.mailbox.upgrade() else {
            trace!(target_actor = %inner.name, "dropping message sent to a terminated actor");
            return false;
        };
        mailbox.enqueue(envelope)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => write!(f, "Address({} {})", inner.id, inner.name.root.as_str()),
            None => f.write_str("Address(invalid)"),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => write!(f, "{}", inner.name),
            None => f.write_str("invalid"),
        }
    }
}
