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

use derive_new::new;

use crate::message::Address;

/// Why an actor terminated, or why another actor asks it to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExitReason {
    /// Finished its work.
    Normal,
    /// A handler returned an error or panicked.
    Failure(String),
    /// Terminated because a message matched no handler.
    UnhandledMessage,
    /// Asked to stop by user code.
    UserShutdown,
    /// Hard exit: terminates the receiver without consulting its behavior.
    Kill,
    /// The actor could not be reached, for example because it never started.
    Unreachable,
    /// An application-defined reason.
    User(u32),
}

impl ExitReason {
    /// True for [`ExitReason::Normal`].
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// True for reasons that bypass the receiver's behavior.
    #[must_use]
    pub const fn is_hard(&self) -> bool {
        matches!(self, Self::Kill)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Failure(description) => write!(f, "failure: {description}"),
            Self::UnhandledMessage => f.write_str("unhandled message"),
            Self::UserShutdown => f.write_str("user shutdown"),
            Self::Kill => f.write_str("kill"),
            Self::Unreachable => f.write_str("unreachable"),
            Self::User(code) => write!(f, "user-defined ({code})"),
        }
    }
}

/// Delivered to every watcher of an actor when that actor terminates.
///
/// Exactly one `DownMsg` reaches each watcher, even if the watch was registered
/// after the termination.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct DownMsg {
    /// The terminated actor.
    pub source: Address,
    /// Why it terminated.
    pub reason: ExitReason,
}

/// Asks the receiver to terminate.
///
/// A behavior may handle soft exits like any other message. Without a matching
/// case, a [`ExitReason::Normal`] exit is ignored and any other reason terminates
/// the receiver with that reason. [`ExitReason::Kill`] always terminates.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct ExitMsg {
    /// Who requested the exit; invalid for anonymous exits.
    pub source: Address,
    /// The requested reason.
    pub reason: ExitReason,
}

/// Enqueued by a request's deadline timer; turns into `RequestError::Timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestDeadline;
