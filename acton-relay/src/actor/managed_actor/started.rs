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

use std::any::Any;
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, error, instrument, trace, warn};

use crate::actor::behavior::Dispatch;
use crate::actor::pending::PendingRequest;
use crate::actor::{ManagedActor, UnexpectedAction};
use crate::common::{deliver_reply, ActorInit, HandlerResult, Reply};
use crate::message::{Envelope, ExitMsg, ExitReason, RequestDeadline, RequestError};
use crate::typed::ContractViolation;

/// Type-state marker for a [`ManagedActor`] whose task is running.
///
/// Message handlers receive `&mut ManagedActor<Started, Model>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Started;

/// Text of a caught panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl<Model: Default + Send + Debug + 'static> ManagedActor<Started, Model> {
    /// The actor's main loop: install the initial behavior, then handle one
    /// envelope at a time until an exit is requested or the behavior stack empties.
    #[instrument(skip_all, fields(actor = %self.id))]
    pub(crate) async fn wake(mut self, init: ActorInit<Model>) {
        match catch_unwind(AssertUnwindSafe(|| init(&mut self))) {
            Ok(Ok(behavior)) => {
                self.behaviors.push(Arc::new(behavior));
                self.release_held_connections();
            }
            Ok(Err(failure)) => {
                error!(error = %format!("{failure:#}"), "actor initialisation failed");
                self.exit_request = Some(ExitReason::Failure(format!("{failure:#}")));
            }
            Err(panic) => {
                let description = panic_message(&*panic);
                error!(panic = %description, "actor initialisation panicked");
                self.exit_request = Some(ExitReason::Failure(description));
            }
        }

        let cancellation = self.runtime.cancellation_token();
        while self.exit_request.is_none() {
            if self.behaviors.is_empty() {
                trace!("behavior stack empty");
                self.exit_request = Some(ExitReason::Normal);
                break;
            }
            let next = tokio::select! {
                biased;
                () = cancellation.cancelled() => None,
                envelope = self.mailbox.dequeue() => envelope,
            };
            match next {
                Some(envelope) => self.process(envelope),
                None => {
                    trace!("runtime cancelled");
                    self.exit_request = Some(ExitReason::Kill);
                }
            }
        }

        let reason = self.exit_request.take().unwrap_or(ExitReason::Normal);
        self.terminate(reason);
    }

    fn process(&mut self, envelope: Envelope) {
        trace!(
            sender = %envelope.sender(),
            correlation = %envelope.correlation(),
            payload = ?envelope.payload(),
            "dispatching"
        );

        if let Some((exit,)) = envelope.payload().extract::<(ExitMsg,)>() {
            if exit.reason.is_hard() {
                debug!(source = %exit.source, "hard exit");
                self.exit_request = Some(exit.reason);
                return;
            }
        }

        if envelope.correlation().is_response() {
            self.complete_request(&envelope);
            return;
        }

        if self.io.is_some() {
            self.prepare_io_event(&envelope);
        }

        let Some(behavior) = self.behaviors.last().cloned() else {
            return;
        };
        self.current = Some(envelope.clone());
        self.reply_delegated = false;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            behavior.dispatch(self, envelope.payload())
        }))
        .unwrap_or_else(|panic| {
            Dispatch::Handled(Err(anyhow!("handler panicked: {}", panic_message(&*panic))))
        });
        match outcome {
            Dispatch::Handled(result) => self.conclude(&envelope, result),
            Dispatch::Unmatched => self.handle_unmatched(&envelope),
        }
        self.current = None;

        if self.io.is_some() {
            self.settle_io_event(&envelope);
        }
    }

    /// Applies a handler's result: send the reply, or fail the actor.
    fn conclude(&mut self, envelope: &Envelope, result: HandlerResult) {
        match result {
            Ok(Reply::Empty) => {}
            Ok(Reply::Message(reply)) => {
                if !self.reply_delegated {
                    deliver_reply(&self.address, envelope.sender(), envelope.correlation(), reply);
                }
            }
            Err(failure) => {
                let description = format!("{failure:#}");
                error!(error = %description, "handler failed");
                self.exit_request = Some(ExitReason::Failure(description));
            }
        }
    }

    fn handle_unmatched(&mut self, envelope: &Envelope) {
        if let Some((exit,)) = envelope.payload().extract::<(ExitMsg,)>() {
            if exit.reason.is_normal() {
                trace!(source = %exit.source, "ignoring normal exit request");
            } else {
                debug!(source = %exit.source, reason = %exit.reason, "exiting on request");
                self.exit_request = Some(exit.reason);
            }
            return;
        }

        self.unexpected_count += 1;
        match self.unexpected_policy.decide(envelope) {
            UnexpectedAction::Discard => {
                if self.runtime.config().behavior.log_unexpected {
                    warn!(
                        shape = %envelope.shape(),
                        sender = %envelope.sender(),
                        "discarding unexpected message"
                    );
                }
            }
            UnexpectedAction::Terminate(reason) => {
                warn!(shape = %envelope.shape(), %reason, "terminating on unexpected message");
                self.exit_request = Some(reason);
            }
        }
    }

    /// Runs the continuation of the request `envelope` answers, or drops the
    /// envelope when the request was already resolved.
    fn complete_request(&mut self, envelope: &Envelope) {
        let correlation = envelope.correlation();
        let Some((continuation, expected)) = self
            .pending
            .take(correlation.request_id())
            .and_then(PendingRequest::resolve)
        else {
            trace!(%correlation, "dropping orphaned response");
            return;
        };

        let outcome = if envelope.payload().matches::<(RequestDeadline,)>() {
            debug!(%correlation, "request timed out");
            Err(RequestError::Timeout)
        } else {
            match expected {
                Some(shape) if shape != envelope.shape() => {
                    Err(RequestError::from(ContractViolation::ReplyMismatch {
                        expected: shape,
                        received: envelope.shape(),
                    }))
                }
                _ => Ok(envelope.payload().clone()),
            }
        };

        self.current = Some(envelope.clone());
        self.reply_delegated = false;
        let result = catch_unwind(AssertUnwindSafe(|| continuation(self, outcome)))
            .unwrap_or_else(|panic| Err(anyhow!("continuation panicked: {}", panic_message(&*panic))));
        self.conclude(envelope, result);
        self.current = None;
    }

    /// Tears the actor down. The exit reason is published last, once every
    /// watcher and linked actor has been told.
    fn terminate(mut self, reason: ExitReason) {
        self.address.mark_terminated(reason.clone());
        let discarded = self.mailbox.close();
        self.pending.clear();
        self.close_all_io();
        let registry = self.runtime.registry();
        for target in self.monitored.drain() {
            registry.demonitor(&self.address, &target);
        }
        self.runtime.release(&self.address, &reason);
        debug!(
            %reason,
            discarded = discarded.len(),
            unexpected = self.unexpected_count,
            "actor terminated"
        );
        self.exit_signal.send_replace(Some(reason));
    }
}
