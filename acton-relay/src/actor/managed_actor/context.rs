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
use std::time::Duration;

use tracing::trace;

use crate::actor::pending::PendingRequest;
use crate::actor::supervision::Registration;
use crate::actor::{Behavior, ManagedActor, Started};
use crate::common::{HandlerResult, ResponsePromise};
use crate::message::{
    send, Address, CorrelationId, DownMsg, Envelope, ExitMsg, ExitReason, IntoMessage, Message,
    Priority, RequestDeadline, RequestError, Shape,
};
use crate::payload;
use crate::typed::{ContractViolation, TypedAddress};

impl<Model: Default + Send + Debug + 'static> ManagedActor<Started, Model> {
    /// Sender of the message being handled; invalid for anonymous messages.
    #[must_use]
    pub fn sender(&self) -> Address {
        self.current
            .as_ref()
            .map_or_else(Address::invalid, |envelope| envelope.sender().clone())
    }

    /// The envelope being handled.
    #[must_use]
    pub fn current_envelope(&self) -> Option<&Envelope> {
        self.current.as_ref()
    }

    /// Sends `payload` to `to` with normal priority.
    pub fn send(&self, to: &Address, payload: impl IntoMessage) {
        send(&self.address, to, Priority::Normal, payload);
    }

    /// Sends `payload` to `to` with the given priority.
    pub fn send_with_priority(&self, to: &Address, priority: Priority, payload: impl IntoMessage) {
        send(&self.address, to, priority, payload);
    }

    /// Asks `to` to terminate with `reason`. Exit requests travel with high priority.
    pub fn send_exit(&self, to: &Address, reason: ExitReason) {
        send(
            &self.address,
            to,
            Priority::High,
            payload!(ExitMsg::new(self.address.clone(), reason)),
        );
    }

    /// Sends `payload` to `to` once `delay` has elapsed.
    pub fn delayed_send(&self, to: &Address, delay: Duration, payload: impl IntoMessage) {
        let from = self.address.clone();
        let to = to.clone();
        let message = payload.into_message();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            send(&from, &to, Priority::Normal, message);
        });
    }

    /// Passes the message being handled on to `to`, keeping its original sender
    /// and correlation, so `to` answers the original requester directly.
    ///
    /// The current handler's own reply is suppressed.
    pub fn forward_to(&mut self, to: &Address) {
        let Some(envelope) = &self.current else {
            return;
        };
        let forwarded = Envelope::new(
            envelope.sender().clone(),
            envelope.correlation(),
            envelope.priority(),
            envelope.payload().clone(),
        );
        if !to.enqueue(forwarded) {
            trace!(receiver = %to, "forward dropped");
        }
        self.reply_delegated = true;
    }

    /// Defers the answer to the message being handled.
    ///
    /// The current handler's own reply is suppressed; the promise delivers later.
    pub fn make_response_promise(&mut self) -> ResponsePromise {
        self.reply_delegated = true;
        let (requester, correlation) = self
            .current
            .as_ref()
            .map_or((Address::invalid(), CorrelationId::NONE), |envelope| {
                (envelope.sender().clone(), envelope.correlation())
            });
        ResponsePromise::new(self.address.clone(), requester, correlation)
    }

    /// Sends a request to `target`.
    ///
    /// `continuation` runs exactly once on this actor: with the response, or with
    /// [`RequestError::Timeout`] when `timeout` elapses first. A response arriving
    /// after the timeout is dropped.
    pub fn request<F>(&mut self, target: &Address, payload: impl IntoMessage, timeout: Duration, continuation: F)
    where
        F: FnOnce(&mut ManagedActor<Started, Model>, Result<Message, RequestError>) -> HandlerResult
            + Send
            + 'static,
    {
        self.issue_request(target, Priority::Normal, payload.into_message(), timeout, None, continuation);
    }

    /// Like [`request`](Self::request), with the runtime's configured default timeout.
    pub fn ask<F>(&mut self, target: &Address, payload: impl IntoMessage, continuation: F)
    where
        F: FnOnce(&mut ManagedActor<Started, Model>, Result<Message, RequestError>) -> HandlerResult
            + Send
            + 'static,
    {
        let timeout = self.runtime.config().default_request_timeout();
        self.issue_request(target, Priority::Normal, payload.into_message(), timeout, None, continuation);
    }

    /// Like [`request`](Self::request), with the request and its response sent at `priority`.
    pub fn request_with_priority<F>(
        &mut self,
        target: &Address,
        priority: Priority,
        payload: impl IntoMessage,
        timeout: Duration,
        continuation: F,
    ) where
        F: FnOnce(&mut ManagedActor<Started, Model>, Result<Message, RequestError>) -> HandlerResult
            + Send
            + 'static,
    {
        self.issue_request(target, priority, payload.into_message(), timeout, None, continuation);
    }

    /// Sends a request through a typed contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] without sending anything when the payload
    /// does not match exactly one signature. A response of the wrong shape
    /// reaches the continuation as [`RequestError::ContractViolation`].
    pub fn request_typed<F>(
        &mut self,
        target: &TypedAddress,
        payload: impl IntoMessage,
        timeout: Duration,
        continuation: F,
    ) -> Result<(), ContractViolation>
    where
        F: FnOnce(&mut ManagedActor<Started, Model>, Result<Message, RequestError>) -> HandlerResult
            + Send
            + 'static,
    {
        let message = payload.into_message();
        let signature = target.check(&message.shape())?;
        let expected = signature.output().clone();
        self.issue_request(
            target.address(),
            Priority::Normal,
            message,
            timeout,
            Some(expected),
            continuation,
        );
        Ok(())
    }

    /// Sends through a typed contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] without sending when the payload does not
    /// match exactly one signature.
    pub fn send_typed(&self, target: &TypedAddress, payload: impl IntoMessage) -> Result<(), ContractViolation> {
        target.send_as(&self.address, Priority::Normal, payload)
    }

    fn issue_request<F>(
        &mut self,
        target: &Address,
        priority: Priority,
        message: Message,
        timeout: Duration,
        expected: Option<Shape>,
        continuation: F,
    ) where
        F: FnOnce(&mut ManagedActor<Started, Model>, Result<Message, RequestError>) -> HandlerResult
            + Send
            + 'static,
    {
        let correlation = match priority {
            Priority::High => CorrelationId::next_request().with_high_priority(),
            Priority::Normal => CorrelationId::next_request(),
        };

        let me = self.address.clone();
        let deadline = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            me.enqueue(Envelope::new(
                Address::invalid(),
                correlation.response_id(),
                correlation.reply_priority(),
                payload!(RequestDeadline),
            ));
        })
        .abort_handle();

        self.pending.insert(
            correlation.request_id(),
            PendingRequest::new(Box::new(continuation), expected, deadline),
        );
        let request = Envelope::new(self.address.clone(), correlation, priority, message);
        if !target.enqueue(request) {
            trace!(receiver = %target, %correlation, "request target unreachable");
        }
    }

    /// Outstanding requests awaiting a response or timeout.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Replaces the current behavior. The next message is dispatched against `behavior`.
    pub fn set_behavior(&mut self, behavior: Behavior<Model>) {
        self.behaviors.pop();
        self.behaviors.push(Arc::new(behavior));
    }

    /// Pushes `behavior` on top of the current one, keeping the old for [`pop_behavior`](Self::pop_behavior).
    pub fn push_behavior(&mut self, behavior: Behavior<Model>) {
        self.behaviors.push(Arc::new(behavior));
    }

    /// Returns to the previous behavior. Popping the last one terminates the actor
    /// normally after the current handler.
    pub fn pop_behavior(&mut self) -> bool {
        self.behaviors.pop().is_some()
    }

    /// Depth of the behavior stack.
    #[must_use]
    pub fn behavior_depth(&self) -> usize {
        self.behaviors.len()
    }

    /// Terminates the actor with `reason` once the current handler returns.
    /// Messages still in the mailbox are discarded.
    pub fn quit(&mut self, reason: ExitReason) {
        self.exit_request = Some(reason);
    }

    /// Messages that matched neither the behavior nor the default exit handling.
    #[must_use]
    pub const fn unexpected_count(&self) -> u64 {
        self.unexpected_count
    }

    /// Watches `target`: exactly one [`DownMsg`] arrives when it terminates, or
    /// immediately if it already has. Monitoring the same target twice has no
    /// further effect; monitoring the invalid address does nothing.
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

    /// Stops watching `target`. Returns whether a monitor was removed.
    pub fn demonitor(&mut self, target: &Address) -> bool {
        self.monitored.remove(target);
        self.runtime.registry().demonitor(&self.address, target)
    }

    /// Links this actor with `peer`: when either terminates with a reason other
    /// than `Normal`, the other receives an [`ExitMsg`] with the reason. Linking
    /// to an actor that already failed delivers that exit immediately.
    pub fn link_to(&mut self, peer: &Address) {
        match self.runtime.registry().link(&self.address, peer) {
            Registration::TargetDown(reason) if !reason.is_normal() => {
                self.address.enqueue(Envelope::new(
                    peer.clone(),
                    CorrelationId::NONE,
                    Priority::High,
                    payload!(ExitMsg::new(peer.clone(), reason)),
                ));
            }
            _ => {}
        }
    }

    /// Removes a link. Returns whether one existed.
    pub fn unlink_from(&mut self, peer: &Address) -> bool {
        self.runtime.registry().unlink(&self.address, peer)
    }
}
