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

use acton_relay::prelude::*;

use crate::setup::actors::{Observer, Silent};
use crate::setup::messages::{Add, Outcome, Reset};
use crate::setup::{next_as, runtime, PATIENCE, QUIET};

mod setup;

fn calculator_contract() -> Contract {
    Contract::new()
        .signature::<(Add, i64, i64), (i64,)>()
        .signature::<(Reset,), ()>()
}

fn calculator() -> Behavior<Silent> {
    Behavior::new()
        .on::<(Add, i64, i64), _>(|_, (_, a, b)| Reply::with((a + b,)))
        .on::<(Reset,), _>(|_, _| Reply::with(()))
}

/// Answers additions with text instead of a number.
fn liar() -> Behavior<Silent> {
    Behavior::new().on::<(Add, i64, i64), _>(|_, (_, a, b)| Reply::with((format!("{a}+{b}"),)))
}

/// A payload outside the contract fails at the call site and never reaches
/// the mailbox; an accepted one is enqueued like any other message.
#[tokio::test]
async fn rejected_payloads_never_reach_the_mailbox() -> anyhow::Result<()> {
    let runtime = runtime();
    let idle = runtime.new_actor::<Silent>();
    let typed = TypedAddress::new(idle.address().clone(), calculator_contract());

    let rejected = typed_send(&typed, (Add, 1_i64));
    assert_eq!(
        rejected,
        Err(ContractViolation::Rejected {
            offered: Shape::of::<(Add, i64)>(),
        })
    );
    assert_eq!(idle.mailbox_len(), 0);

    typed_send(&typed, (Add, 1_i64, 2_i64))?;
    typed.send((Reset,))?;
    assert_eq!(idle.mailbox_len(), 2);

    send_anonymous(typed.address(), Priority::Normal, ("untyped sends bypass the contract",));
    assert_eq!(idle.mailbox_len(), 3);
    Ok(())
}

/// Typed requests check the reply against the declared output shape.
#[tokio::test]
async fn typed_requests_check_the_reply_shape() -> anyhow::Result<()> {
    let runtime = runtime();
    let honest = runtime.spawn(Silent, |_| Ok(calculator()));
    let lying = runtime.spawn(Silent, |_| Ok(liar()));
    let mut scoped = runtime.scoped();

    let typed = TypedAddress::new(honest.address().clone(), calculator_contract());
    let sum = scoped.request_typed(&typed, (Add, 2_i64, 3_i64), PATIENCE).await?;
    assert_eq!(sum.extract::<(i64,)>(), Some((5,)));
    let reset = scoped.request_typed(&typed, (Reset,), PATIENCE).await?;
    assert!(reset.is_empty());

    let typed = TypedAddress::new(lying.address().clone(), calculator_contract());
    let error = scoped
        .request_typed(&typed, (Add, 2_i64, 3_i64), PATIENCE)
        .await
        .unwrap_err();
    assert_eq!(
        error,
        RequestError::ContractViolation(ContractViolation::ReplyMismatch {
            expected: Shape::of::<(i64,)>(),
            received: Shape::of::<(String,)>(),
        })
    );

    let refused = scoped.request_typed(&typed, (Reset, Reset), PATIENCE).await;
    assert!(matches!(
        refused,
        Err(RequestError::ContractViolation(ContractViolation::Rejected { .. }))
    ));
    runtime.shutdown_all().await?;
    Ok(())
}

/// Inside an actor, a mismatched reply reaches the continuation as an error.
#[tokio::test]
async fn actor_typed_requests_report_mismatches() -> anyhow::Result<()> {
    let runtime = runtime();
    let lying = runtime.spawn(Silent, |_| Ok(liar()));
    let typed = TypedAddress::new(lying.address().clone(), calculator_contract());
    let mut scoped = runtime.scoped();

    let _requester = runtime.spawn(Observer::reporting_to(scoped.address()), move |actor| {
        let refused = actor.request_typed(&typed, (Add,), PATIENCE, |_, _| Reply::ready());
        assert!(refused.is_err());
        assert_eq!(actor.pending_requests(), 0);

        actor.request_typed(&typed, (Add, 1_i64, 1_i64), PATIENCE, |actor, result| {
            let outcome = match result {
                Ok(_) => Outcome::Answered(0),
                Err(RequestError::ContractViolation(ContractViolation::ReplyMismatch { .. })) => {
                    Outcome::Mismatched
                }
                Err(_) => Outcome::TimedOut,
            };
            actor.model.notify((outcome,));
            Reply::ready()
        })?;
        actor.send_typed(&typed, (Reset,))?;
        Ok(Behavior::new().on::<(Reset,), _>(|_, _| Reply::ready()))
    });

    let outcome = next_as::<(Outcome,)>(&mut scoped, PATIENCE).await;
    assert_eq!(outcome, Some((Outcome::Mismatched,)));
    assert!(scoped.receive(QUIET).await.is_none());
    runtime.shutdown_all().await?;
    Ok(())
}
