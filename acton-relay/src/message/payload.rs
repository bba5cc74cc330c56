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
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::traits::RelayMessage;

/// A single, shared element of a [`Message`].
pub type Element = Arc<dyn RelayMessage>;

/// The runtime type of one message element.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct ElementType {
    id: TypeId,
    name: &'static str,
}

impl ElementType {
    /// The element type of `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The type of a concrete element, resolved through its vtable.
    #[must_use]
    pub fn of_element(element: &Element) -> Self {
        let value: &dyn RelayMessage = element.as_ref();
        Self {
            id: RelayMessage::as_any(value).type_id(),
            name: RelayMessage::type_name(value),
        }
    }

    /// The [`TypeId`] of the element.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// The full Rust type name of the element.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementType {}

impl Hash for ElementType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_name(self.name))
    }
}

/// Strips the module path from non-generic type names.
fn short_name(name: &'static str) -> &'static str {
    if name.contains('<') {
        return name;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// The ordered list of element types of a message.
///
/// Shapes drive dispatch: a behavior case matches a message when the shapes are equal.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape(Vec<ElementType>);

impl Shape {
    /// Creates a shape from element types.
    #[must_use]
    pub fn new(elements: Vec<ElementType>) -> Self {
        Self(elements)
    }

    /// The shape produced by the Rust type `P` (a tuple of elements).
    #[must_use]
    pub fn of<P: FromMessage>() -> Self {
        P::shape()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the shape of the empty message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The element types in order.
    #[must_use]
    pub fn elements(&self) -> &[ElementType] {
        &self.0
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, element) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{element:?}")?;
        }
        f.write_str(")")
    }
}

/// An immutable, ordered sequence of typed elements.
///
/// Cloning a message is cheap: the elements are shared, never copied.
#[derive(Clone, Default)]
pub struct Message {
    elements: Arc<[Element]>,
}

impl Message {
    /// The message with no elements.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a message from already-erased elements.
    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self {
            elements: elements.into(),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when the message carries no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements in order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The ordered element types of this message.
    #[must_use]
    pub fn shape(&self) -> Shape {
        Shape(self.elements.iter().map(ElementType::of_element).collect())
    }

    /// Borrows element `index` if it exists and has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        let value: &dyn RelayMessage = self.elements.get(index)?.as_ref();
        RelayMessage::as_any(value).downcast_ref::<T>()
    }

    /// True if this message has exactly the shape of `P`.
    #[must_use]
    pub fn matches<P: FromMessage>(&self) -> bool {
        self.shape() == P::shape()
    }

    /// Extracts the elements as the tuple `P` when the shapes match.
    #[must_use]
    pub fn extract<P: FromMessage>(&self) -> Option<P> {
        P::from_message(self)
    }

    /// Returns a new message with `value` appended.
    #[must_use]
    pub fn with<T: RelayMessage>(&self, value: T) -> Self {
        let mut elements: Vec<Element> = self.elements.to_vec();
        elements.push(Arc::new(value));
        Self::from_elements(elements)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, element) in self.elements.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{element:?}")?;
        }
        f.write_str(")")
    }
}

/// Conversion of a value into a [`Message`].
///
/// Implemented for [`Message`] itself, `()` and tuples of up to eight elements.
pub trait IntoMessage {
    /// Performs the conversion.
    fn into_message(self) -> Message;
}

/// Typed extraction of a [`Message`] into a tuple of elements.
pub trait FromMessage: Sized {
    /// The shape this type accepts.
    fn shape() -> Shape;

    /// Extracts the elements when the message has exactly [`FromMessage::shape`].
    fn from_message(message: &Message) -> Option<Self>;
}

impl IntoMessage for Message {
    #[inline]
    fn into_message(self) -> Message {
        self
    }
}

impl IntoMessage for &Message {
    #[inline]
    fn into_message(self) -> Message {
        self.clone()
    }
}

impl IntoMessage for () {
    fn into_message(self) -> Message {
        Message::empty()
    }
}

impl FromMessage for () {
    fn shape() -> Shape {
        Shape::default()
    }

    fn from_message(message: &Message) -> Option<Self> {
        message.is_empty().then_some(())
    }
}

macro_rules! impl_tuple_payload {
    ($($idx:tt => $T:ident),+) => {
        impl<$($T),+> IntoMessage for ($($T,)+)
        where
            $($T: RelayMessage,)+
        {
            fn into_message(self) -> Message {
                Message::from_elements(vec![$(Arc::new(self.$idx) as Element),+])
            }
        }

        impl<$($T),+> FromMessage for ($($T,)+)
        where
            $($T: RelayMessage + Clone,)+
        {
            fn shape() -> Shape {
                Shape::new(vec![$(ElementType::of::<$T>()),+])
            }

            fn from_message(message: &Message) -> Option<Self> {
                let arity = [$($idx),+].len();
                if message.len() != arity {
                    return None;
                }
                Some(($(message.get::<$T>($idx)?.clone(),)+))
            }
        }
    };
}

impl_tuple_payload!(0 => A);
impl_tuple_payload!(0 => A, 1 => B);
impl_tuple_payload!(0 => A, 1 => B, 2 => C);
impl_tuple_payload!(0 => A, 1 => B, 2 => C, 3 => D);
impl_tuple_payload!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_tuple_payload!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
impl_tuple_payload!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
impl_tuple_payload!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);

/// Builds a [`Message`](crate::prelude::Message) from a list of values.
///
/// ```rust,ignore
/// let message = payload!(Ping, 42_u32);
/// assert_eq!(message.len(), 2);
/// ```
#[macro_export]
macro_rules! payload {
    () => {
        $crate::prelude::Message::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::prelude::Message::from_elements(vec![
            $(::std::sync::Arc::new($value) as $crate::prelude::Element),+
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping;

    #[test]
    fn shape_follows_element_order() {
        let message = (Ping, 7_i32).into_message();
        assert_eq!(message.shape(), Shape::of::<(Ping, i32)>());
        assert_ne!(message.shape(), Shape::of::<(i32, Ping)>());
        assert_eq!(message.shape().to_string(), "(Ping, i32)");
    }

    #[test]
    fn extraction_requires_exact_shape() {
        let message = (Ping, 7_i32).into_message();
        assert_eq!(message.extract::<(Ping, i32)>(), Some((Ping, 7)));
        assert!(message.extract::<(Ping,)>().is_none());
        assert!(message.extract::<(Ping, i32, i32)>().is_none());
        assert!(message.extract::<(i32, Ping)>().is_none());
    }

    #[test]
    fn erased_elements_report_their_concrete_type() {
        let element: Element = Arc::new(5_u8);
        assert_eq!(ElementType::of_element(&element), ElementType::of::<u8>());
    }

    #[test]
    fn empty_message_matches_unit() {
        let message = ().into_message();
        assert!(message.is_empty());
        assert!(message.matches::<()>());
        assert_eq!(payload!().shape(), Shape::default());
    }

    #[test]
    fn with_appends_without_touching_the_original() {
        let original = (Ping,).into_message();
        let extended = original.with(3_u16);
        assert_eq!(original.len(), 1);
        assert_eq!(extended.extract::<(Ping, u16)>(), Some((Ping, 3)));
    }
}
