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

//! Type aliases for the erased closures stored by behaviors, requests and actors.

use crate::actor::{Behavior, ManagedActor, Started};
use crate::common::HandlerResult;
use crate::message::{Message, RequestError};

/// A behavior case: extracts its tuple from the message and runs the user handler.
/// Returns `None` when extraction fails.
pub type CaseHandler<Model> = dyn Fn(&mut ManagedActor<Started, Model>, &Message) -> Option<HandlerResult>
    + Send
    + Sync
    + 'static;

/// A behavior's catch-all handler.
pub type CatchAllHandler<Model> =
    dyn Fn(&mut ManagedActor<Started, Model>, &Message) -> HandlerResult + Send + Sync + 'static;

/// Runs once with the response to a request, or with the reason there is none.
pub type Continuation<Model> = dyn FnOnce(&mut ManagedActor<Started, Model>, Result<Message, RequestError>) -> HandlerResult
    + Send
    + 'static;

/// Builds an actor's initial behavior once its task is running.
pub type ActorInit<Model> =
    Box<dyn FnOnce(&mut ManagedActor<Started, Model>) -> anyhow::Result<Behavior<Model>> + Send + 'static>;

/// Short alias for the actor type handlers receive.
pub type ActorContext<Model> = ManagedActor<Started, Model>;
