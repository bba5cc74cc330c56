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

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use acton_ern::Ern;
use tokio::time::Instant;
use tracing::trace;

use crate::actor::Mailbox;
use crate::actor::supervision::Registration;
use crate::common::ActorRuntime;
use crate::message::{
    send, Address, CorrelationId, DownMsg, Envelope, ExitMsg, ExitReason, IntoMessage, Message,
    Priority, RequestError,
};
use crate::payload;
use crate::typed::{ContractViolation, TypedAddress};

/// An actor driven from ordinary async code instead of a behavior.
///
/// A scoped actor has a real address: it can be monitored, receive replies and
/// be passed to other actors. It blocks (asynchronously) in [`receive`](Self::receive)
/// and [`request`](Self::request). Dropping it terminates it with
/// [`ExitReason::Normal`], notifying its watchers.
#[derive(Debug)]
pub struct ScopedActor {
    address: Address,
    mailbox: Arc<Mailbox>,
    runtime: ActorRuntime,
    /// Messages that arrived while a request was waiting for its response.
    stash: VecDeque<Envelope>,
    monitored: HashSet<Address>,
}

impl ScopedActor {
    pub(crate) fn new(runtime: ActorRuntime, name: Ern) -> Self {
        let mailbox = Arc::new(Mailbox::new());
        let address = Address::new(name, &mailbox);
        Self {
            address,
            mailbox,
            runtime,
            stash: VecDeque::new(),
            monitored: HashSet::new(),
        }
    }

    /// This actor's address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Sends `payload` to `to` with normal priority.
    pub fn send(&self, to: &Address, payload: impl IntoMessage) {
        send(&self.address, to, Priority::Normal, payload);
    }

    /// Sends `payload` to `to` with the given priority.
    pub fn send_with_priority(&self, to: &Address, priority: Priority, payload: impl IntoMessage) {
        send(&self.address, to, priority, payload);
    }

    /// Asks `to` to terminate with `reason`.
    pub fn send_exit(&self, to: &Address, reason: ExitReason) {
        send(
            &self.address,
            to,
            Priority::High,
            payload!(ExitMsg::new(self.address.clone(), reason)),
        );
    }

    /// Watches `target`; a [`DownMsg`] arrives through [`receive`](Self::receive).
    pub fn monitor(&mut self, target: &Address) {
        match self.runtime.registry().monitor(&self.address, target) {
            Registration::Added => {
                self.monitored.insert(target.clone());
            }
            Registration::TargetDown(reason) => {
                self.address.enqueue(Envelope::new(
                    target.clone(),
                    CorrelationId::NONE,
                    Priority::High,
                    payload!(DownMsg::new(target.clone(), reason)),
                ));
            }
            Registration::AlreadyPresent | Registration::Ignored => {}
        }
    }

    /// Stops watching `target`.
    pub fn demonitor(&mut self, target: &Address) -> bool {
        self.monitored.remove(target);
        self.runtime.registry().demonitor(&self.address, target)
    }

    /// Waits up to `timeout` for the next message. Responses to requests that
    /// already gave up are dropped along the way.
    pub async fn receive(&mut self, timeout: Duration) -> Option<Envelope> {
        if let Some(envelope) = self.stash.pop_front() {
            return Some(envelope);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let envelope = tokio::time::timeout_at(deadline, self.mailbox.dequeue())
                .await
                .ok()
                .flatten()?;
            if envelope.correlation().is_response() {
                trace!(correlation = %envelope.correlation(), "dropping orphaned response");
                continue;
            }
            return Some(envelope);
        }
    }

    /// Waits up to `timeout` for the next message and returns its payload.
    pub async fn receive_message(&mut self, timeout: Duration) -> Option<Message> {
        self.receive(timeout)
            .await
            .map(|envelope| envelope.payload().clone())
    }

    /// Sends a request and waits for its response.
    ///
    /// Other messages arriving in the meantime are kept for [`receive`](Self::receive).
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Timeout`] when no response arrives within `timeout`.
    pub async fn request(
        &mut self,
        target: &Address,
        payload: impl IntoMessage,
        timeout: Duration,
    ) -> Result<Message, RequestError> {
        self.await_response(target, payload.into_message(), timeout).await
    }

    /// Like [`request`](Self::request), waiting at most the runtime's configured
    /// `timeouts.default_request_timeout_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Timeout`] when no response arrives in time.
    pub async fn ask(&mut self, target: &Address, payload: impl IntoMessage) -> Result<Message, RequestError> {
        let timeout = self.runtime.config().default_request_timeout();
        self.await_response(target, payload.into_message(), timeout).await
    }

    /// Sends a request through a typed contract and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ContractViolation`] without sending when the payload
    /// matches no single signature, or when the response has the wrong shape, and
    /// [`RequestError::Timeout`] when no response arrives in time.
    pub async fn request_typed(
        &mut self,
        target: &TypedAddress,
        payload: impl IntoMessage,
        timeout: Duration,
    ) -> Result<Message, RequestError> {
        let message = payload.into_message();
        let expected = target.check(&message.shape())?.output().clone();
        let response = self.await_response(target.address(), message, timeout).await?;
        if response.shape() != expected {
            return Err(ContractViolation::ReplyMismatch {
                expected,
                received: response.shape(),
            }
            .into());
        }
        Ok(response)
    }

    async fn await_response(
        &mut self,
        target: &Address,
        message: Message,
        timeout: Duration,
    ) -> Result<Message, RequestError> {
        let correlation = CorrelationId::next_request();
        let deadline = Instant::now() + timeout;
        if !target.enqueue(Envelope::new(self.address.clone(), correlation, Priority::Normal, message)) {
            trace!(receiver = %target, %correlation, "request target unreachable");
        }
        loop {
            let Ok(Some(envelope)) = tokio::time::timeout_at(deadline, self.mailbox.dequeue()).await else {
                return Err(RequestError::Timeout);
            };
            let answer = envelope.correlation();
            if answer.is_response() {
                if answer.request_id() == correlation.request_id() {
                    return Ok(envelope.payload().clone());
                }
                trace!(correlation = %answer, "dropping orphaned response");
            } else {
                self.stash.push_back(envelope);
            }
        }
    }
}

impl Drop for ScopedActor {
    fn drop(&mut self) {
        self.address.mark_terminated(ExitReason::Normal);
        self.mailbox.close();
        for target in self.monitored.drain() {
            self.runtime.registry().demonitor(&self.address, &target);
        }
        self.runtime.release(&self.address, &ExitReason::Normal);
    }
}
