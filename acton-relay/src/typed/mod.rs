//! Typed actor contracts.
//!
//! A [`Contract`] lists the input shapes an actor accepts and the output shape
//! it answers each with. A [`TypedAddress`] pairs an address with a contract and
//! refuses, before anything is enqueued, payloads that match no signature.
//!
//! # Key Components
//!
//! *   [`Signature`]: one `input -> output` pair of shapes.
//! *   [`Contract`]: the ordered set of signatures.
//! *   [`TypedAddress`] and [`typed_send`]: checked sending.
//! *   [`ContractViolation`]: why a payload or reply was refused.

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

use crate::message::{send, Address, FromMessage, IntoMessage, Priority, Shape};

/// One accepted input shape and the output shape it is answered with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    input: Shape,
    output: Shape,
}

impl Signature {
    /// Creates a signature from explicit shapes.
    #[must_use]
    pub fn new(input: Shape, output: Shape) -> Self {
        Self { input, output }
    }

    /// The accepted input shape.
    #[must_use]
    pub fn input(&self) -> &Shape {
        &self.input
    }

    /// The shape of the answer.
    #[must_use]
    pub fn output(&self) -> &Shape {
        &self.output
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

/// The set of signatures a typed actor accepts.
///
/// ```rust,ignore
/// let calculator = Contract::new()
///     .signature::<(Add, i64, i64), (i64,)>()
///     .signature::<(Reset,), ()>();
/// assert!(calculator.accepts(&Shape::of::<(Reset,)>()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contract {
    signatures: Vec<Signature>,
}

impl Contract {
    /// An empty contract, accepting nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the signature `In -> Out`.
    #[must_use]
    pub fn signature<In: FromMessage, Out: FromMessage>(self) -> Self {
        self.with_signature(Signature::new(In::shape(), Out::shape()))
    }

    /// Adds an explicit signature.
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// The signatures in declaration order.
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// True when exactly one signature accepts `shape`.
    #[must_use]
    pub fn accepts(&self, shape: &Shape) -> bool {
        self.signature_for(shape).is_ok()
    }

    /// The single signature whose input is `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::Rejected`] when no signature matches and
    /// [`ContractViolation::Ambiguous`] when several do.
    pub fn signature_for(&self, shape: &Shape) -> Result<&Signature, ContractViolation> {
        let mut matching = self.signatures.iter().filter(|signature| &signature.input == shape);
        match (matching.next(), matching.count()) {
            (Some(signature), 0) => Ok(signature),
            (Some(_), others) => Err(ContractViolation::Ambiguous {
                offered: shape.clone(),
                matches: others + 1,
            }),
            (None, _) => Err(ContractViolation::Rejected {
                offered: shape.clone(),
            }),
        }
    }
}

/// Why a typed send or typed request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// No signature accepts the offered shape.
    Rejected {
        /// The refused shape.
        offered: Shape,
    },
    /// More than one signature accepts the offered shape.
    Ambiguous {
        /// The offered shape.
        offered: Shape,
        /// How many signatures matched.
        matches: usize,
    },
    /// A response did not have the declared output shape.
    ReplyMismatch {
        /// The declared output.
        expected: Shape,
        /// What arrived.
        received: Shape,
    },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { offered } => write!(f, "contract does not accept {offered}"),
            Self::Ambiguous { offered, matches } => {
                write!(f, "{matches} signatures accept {offered}")
            }
            Self::ReplyMismatch { expected, received } => {
                write!(f, "expected a reply shaped {expected}, received {received}")
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

/// An address restricted to a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedAddress {
    address: Address,
    contract: Arc<Contract>,
}

impl TypedAddress {
    /// Restricts `address` to `contract`.
    #[must_use]
    pub fn new(address: Address, contract: Contract) -> Self {
        Self {
            address,
            contract: Arc::new(contract),
        }
    }

    /// The underlying, unrestricted address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// The contract.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// The signature accepting `shape`.
    ///
    /// # Errors
    ///
    /// See [`Contract::signature_for`].
    pub fn check(&self, shape: &Shape) -> Result<&Signature, ContractViolation> {
        self.contract.signature_for(shape)
    }

    /// Sends `payload` anonymously after checking it against the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`]; nothing is enqueued in that case.
    pub fn send(&self, payload: impl IntoMessage) -> Result<(), ContractViolation> {
        self.send_as(&Address::invalid(), Priority::Normal, payload)
    }

    /// Sends `payload` from `from` after checking it against the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`]; nothing is enqueued in that case.
    pub fn send_as(
        &self,
        from: &Address,
        priority: Priority,
        payload: impl IntoMessage,
    ) -> Result<(), ContractViolation> {
        let message = payload.into_message();
        self.check(&message.shape())?;
        send(from, &self.address, priority, message);
        Ok(())
    }
}

/// Sends `payload` to `target` only if its contract accepts it.
///
/// # Errors
///
/// Returns [`ContractViolation`] when the payload's shape matches no single
/// signature; nothing is enqueued in that case.
pub fn typed_send(target: &TypedAddress, payload: impl IntoMessage) -> Result<(), ContractViolation> {
    target.send(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Add;
    #[derive(Debug, Clone)]
    struct Reset;

    fn calculator() -> Contract {
        Contract::new()
            .signature::<(Add, i64, i64), (i64,)>()
            .signature::<(Reset,), ()>()
    }

    #[test]
    fn accepts_declared_inputs_only() {
        let contract = calculator();
        assert!(contract.accepts(&Shape::of::<(Add, i64, i64)>()));
        assert!(contract.accepts(&Shape::of::<(Reset,)>()));
        assert!(!contract.accepts(&Shape::of::<(Add, i64)>()));
        assert!(!contract.accepts(&Shape::of::<(i64, i64, Add)>()));
    }

    #[test]
    fn signature_reports_the_output() {
        let contract = calculator();
        let signature = contract
            .signature_for(&Shape::of::<(Add, i64, i64)>())
            .unwrap();
        assert_eq!(signature.output(), &Shape::of::<(i64,)>());
    }

    #[test]
    fn duplicate_inputs_are_ambiguous() {
        let contract = calculator().signature::<(Reset,), (bool,)>();
        assert_eq!(
            contract.signature_for(&Shape::of::<(Reset,)>()),
            Err(ContractViolation::Ambiguous {
                offered: Shape::of::<(Reset,)>(),
                matches: 2,
            })
        );
    }

    #[test]
    fn rejected_payloads_are_not_sent() {
        let typed = TypedAddress::new(Address::invalid(), calculator());
        let result = typed_send(&typed, (Add, 1_i64));
        assert_eq!(
            result,
            Err(ContractViolation::Rejected {
                offered: Shape::of::<(Add, i64)>(),
            })
        );
        assert!(typed_send(&typed, (Reset,)).is_ok());
    }
}
