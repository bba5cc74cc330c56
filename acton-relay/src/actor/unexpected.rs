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
use std::sync::Arc;

use crate::common::config::UnexpectedMessageMode;
use crate::message::{Envelope, ExitReason};

/// The outcome a custom unexpected-message callback chooses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnexpectedAction {
    /// Drop the message and keep running.
    Discard,
    /// Terminate the actor with the given reason.
    Terminate(ExitReason),
}

/// Callback deciding what to do with a message no behavior case matched.
pub type UnexpectedCallback = Arc<dyn Fn(&Envelope) -> UnexpectedAction + Send + Sync>;

/// What an actor does with a message that matches nothing in its current behavior.
#[derive(Clone, Default)]
pub enum UnexpectedPolicy {
    /// Log the message and drop it.
    #[default]
    LogAndDiscard,
    /// Terminate with [`ExitReason::UnhandledMessage`].
    Terminate,
    /// Let a callback decide.
    Custom(UnexpectedCallback),
}

impl UnexpectedPolicy {
    /// Wraps a closure as a [`UnexpectedPolicy::Custom`] policy.
    pub fn custom<F>(callback: F) -> Self
    where
        F: Fn(&Envelope) -> UnexpectedAction + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(callback))
    }

    pub(crate) fn decide(&self, envelope: &Envelope) -> UnexpectedAction {
        match self {
            Self::LogAndDiscard => UnexpectedAction::Discard,
            Self::Terminate => UnexpectedAction::Terminate(ExitReason::UnhandledMessage),
            Self::Custom(callback) => callback(envelope),
        }
    }
}

impl From<UnexpectedMessageMode> for UnexpectedPolicy {
    fn from(mode: UnexpectedMessageMode) -> Self {
        match mode {
            UnexpectedMessageMode::Discard => Self::LogAndDiscard,
            UnexpectedMessageMode::Terminate => Self::Terminate,
        }
    }
}

impl fmt::Debug for UnexpectedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogAndDiscard => f.write_str("LogAndDiscard"),
            Self::Terminate => f.write_str("Terminate"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
