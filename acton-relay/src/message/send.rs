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

use tracing::trace;

use crate::message::{Address, CorrelationId, Envelope, ExitMsg, ExitReason, IntoMessage, Priority};
use crate::payload;

/// Sends `payload` from `from` to `to`.
///
/// Does nothing when `to` is invalid or has terminated. Messages from one sender
/// to one receiver at the same priority arrive in send order.
pub fn send(from: &Address, to: &Address, priority: Priority, payload: impl IntoMessage) {
    if !to.is_valid() {
        return;
    }
    let envelope = Envelope::new(from.clone(), CorrelationId::NONE, priority, payload.into_message());
    if !to.enqueue(envelope) {
        trace!(receiver = %to, "message dropped");
    }
}

/// Sends `payload` to `to` without a sender.
pub fn send_anonymous(to: &Address, priority: Priority, payload: impl IntoMessage) {
    send(&Address::invalid(), to, priority, payload);
}

/// Asks `to` to terminate with `reason`, anonymously and with high priority.
pub fn send_exit(to: &Address, reason: ExitReason) {
    send_anonymous(to, Priority::High, payload!(ExitMsg::new(Address::invalid(), reason)));
}
