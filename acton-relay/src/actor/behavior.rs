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
use std::fmt::Debug;

use crate::actor::{ManagedActor, Started};
use crate::common::{CaseHandler, CatchAllHandler, HandlerResult};
use crate::message::{DownMsg, ExitMsg, FromMessage, Message, Shape};

struct Case<Model: Default + Send + Debug + 'static> {
    shape: Shape,
    handler: Box<CaseHandler<Model>>,
}

/// What happened when a message was offered to a behavior.
pub(crate) enum Dispatch {
    /// A case (or the catch-all) ran and produced this result.
    Handled(HandlerResult),
    /// Nothing matched the message's shape.
    Unmatched,
}

/// An ordered list of message handlers.
///
/// Each case accepts exactly one [`Shape`]; the first case whose shape equals
/// the message's shape runs. An optional catch-all ([`Behavior::others`])
/// receives whatever no case matched. A behavior is immutable once installed.
///
/// ```rust,ignore
/// let behavior = Behavior::<Counter>::new()
///     .on::<(Increment, u32), _>(|actor, (_, by)| {
///         actor.model.count += by;
///         Reply::ready()
///     })
///     .on::<(Get,), _>(|actor, _| Reply::with((actor.model.count,)));
/// ```
pub struct Behavior<Model: Default + Send + Debug + 'static> {
    cases: Vec<Case<Model>>,
    others: Option<Box<CatchAllHandler<Model>>>,
}

impl<Model: Default + Send + Debug + 'static> Behavior<Model> {
    /// A behavior with no cases.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            others: None,
        }
    }

    /// Appends a case for messages shaped like the tuple `P`.
    ///
    /// The handler receives the extracted elements. Cases are tried in the
    /// order they were added.
    #[must_use]
    pub fn on<P, F>(mut self, handler: F) -> Self
    where
        P: FromMessage + 'static,
        F: Fn(&mut ManagedActor<Started, Model>, P) -> HandlerResult + Send + Sync + 'static,
    {
        self.cases.push(Case {
            shape: P::shape(),
            handler: Box::new(move |actor, message| {
                P::from_message(message).map(|elements| handler(actor, elements))
            }),
        });
        self
    }

    /// Handles [`DownMsg`] notifications from monitored actors.
    #[must_use]
    pub fn on_down<F>(self, handler: F) -> Self
    where
        F: Fn(&mut ManagedActor<Started, Model>, DownMsg) -> HandlerResult + Send + Sync + 'static,
    {
        self.on::<(DownMsg,), _>(move |actor, (down,)| handler(actor, down))
    }

    /// Handles soft [`ExitMsg`] requests instead of the default exit handling.
    #[must_use]
    pub fn on_exit<F>(self, handler: F) -> Self
    where
        F: Fn(&mut ManagedActor<Started, Model>, ExitMsg) -> HandlerResult + Send + Sync + 'static,
    {
        self.on::<(ExitMsg,), _>(move |actor, (exit,)| handler(actor, exit))
    }

    /// Installs a catch-all for messages no case matches.
    #[must_use]
    pub fn others<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ManagedActor<Started, Model>, &Message) -> HandlerResult + Send + Sync + 'static,
    {
        self.others = Some(Box::new(handler));
        self
    }

    /// Number of cases, not counting the catch-all.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// True when there are no cases and no catch-all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.others.is_none()
    }

    /// True when some case (or the catch-all) accepts `shape`.
    #[must_use]
    pub fn handles(&self, shape: &Shape) -> bool {
        self.others.is_some() || self.cases.iter().any(|case| &case.shape == shape)
    }

    pub(crate) fn dispatch(
        &self,
        actor: &mut ManagedActor<Started, Model>,
        message: &Message,
    ) -> Dispatch {
        let shape = message.shape();
        for case in self.cases.iter().filter(|case| case.shape == shape) {
            if let Some(result) = (case.handler)(actor, message) {
                return Dispatch::Handled(result);
            }
        }
        match &self.others {
            Some(others) => Dispatch::Handled(others(actor, message)),
            None => Dispatch::Unmatched,
        }
    }
}

impl<Model: Default + Send + Debug + 'static> Default for Behavior<Model> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Model: Default + Send + Debug + 'static> Debug for Behavior<Model> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field(
                "cases",
                &self.cases.iter().map(|case| &case.shape).collect::<Vec<_>>(),
            )
            .field("others", &self.others.is_some())
            .finish()
    }
}
