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

use std::time::Duration;

use acton_ern::Ern;
use tokio::sync::watch;
use tracing::{instrument, trace};

use crate::message::{send_anonymous, send_exit, ActorId, Address, ExitReason, IntoMessage, Priority};

/// External handle to a started actor.
///
/// Sends from a handle are anonymous. The handle can also stop the actor and
/// wait for it to terminate.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    address: Address,
    exit: watch::Receiver<Option<ExitReason>>,
    stop_timeout: Duration,
}

impl ActorHandle {
    pub(crate) fn new(
        address: Address,
        exit: watch::Receiver<Option<ExitReason>>,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            address,
            exit,
            stop_timeout,
        }
    }

    /// The actor's address.
    #[inline]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// The actor's numeric identity.
    #[inline]
    pub fn id(&self) -> ActorId {
        self.address.id()
    }

    /// The actor's name.
    pub fn ern(&self) -> Option<&Ern> {
        self.address.ern()
    }

    /// Root segment of the actor's name.
    pub fn name(&self) -> &str {
        self.address.name()
    }

    /// Sends `payload` with normal priority.
    pub fn send(&self, payload: impl IntoMessage) {
        send_anonymous(&self.address, Priority::Normal, payload);
    }

    /// Sends `payload` with the given priority.
    pub fn send_with_priority(&self, priority: Priority, payload: impl IntoMessage) {
        send_anonymous(&self.address, priority, payload);
    }

    /// Asks the actor to terminate with `reason`.
    pub fn send_exit(&self, reason: ExitReason) {
        send_exit(&self.address, reason);
    }

    /// Why the actor terminated, once it has.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit.borrow().clone()
    }

    /// True until the actor has terminated.
    pub fn is_alive(&self) -> bool {
        self.exit.borrow().is_none()
    }

    /// Waits for the actor to terminate and returns its exit reason.
    pub async fn wait_for_exit(&self) -> ExitReason {
        let mut exit = self.exit.clone();
        loop {
            if let Some(reason) = exit.borrow_and_update().clone() {
                return reason;
            }
            if exit.changed().await.is_err() {
                let reason = exit.borrow().clone();
                return reason
                    .or_else(|| self.address.exit_reason())
                    .unwrap_or(ExitReason::Unreachable);
            }
        }
    }

    /// Asks the actor to stop with [`ExitReason::UserShutdown`] and waits for it,
    /// up to the configured actor shutdown timeout.
    ///
    /// # Errors
    ///
    /// Fails when the actor does not terminate in time.
    #[instrument(skip(self), fields(actor = %self.address))]
    pub async fn stop(&self) -> anyhow::Result<ExitReason> {
        let timeout = self.stop_timeout;
        self.send_exit(ExitReason::UserShutdown);
        trace!("waiting for actor to stop");
        tokio::time::timeout(timeout, self.wait_for_exit())
            .await
            .map_err(|_| anyhow::anyhow!("actor {} did not stop within {timeout:?}", self.address))
    }
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for ActorHandle {}
