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
#![allow(unused)]

use acton_relay::prelude::*;

#[relay_message(comparable)]
pub struct Ping(pub u32);

#[relay_message(comparable)]
pub struct Pong(pub u32);

/// Carries a number to be recorded.
#[relay_message(comparable)]
pub struct Num(pub u32);

/// Asks an actor for what it has recorded so far.
#[relay_message]
pub struct Report;

/// Answer to [`Report`].
#[relay_message(comparable)]
pub struct Recorded(pub Vec<u32>);

/// Tells an actor to stop.
#[relay_message]
pub struct Stop;

#[relay_message]
pub struct Fail;

#[relay_message]
pub struct Panic;

/// Installs a different behavior.
#[relay_message]
pub struct Switch;

/// Returns to the previous behavior.
#[relay_message]
pub struct Revert;

/// Something nobody handles.
#[relay_message]
pub struct Stray;

#[relay_message]
pub struct Add;

#[relay_message]
pub struct Reset;

/// What a request continuation saw.
#[relay_message(comparable)]
pub enum Outcome {
    Answered(u32),
    TimedOut,
    Mismatched,
}

/// A line of text sent over a connection.
#[relay_message(comparable)]
pub struct Line(pub String);
