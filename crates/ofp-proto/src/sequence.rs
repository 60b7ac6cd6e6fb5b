//! Lists of elements that fill the rest of a view.

use std::ops::{Deref, DerefMut};

use crate::{
    Item,
    buffer::{View, ViewMut},
    codec::Wire,
    errors::{ProtocolError, Result},
};

/// Homogeneous list with no length prefix of its own.
///
/// Decoding consumes the view to exhaustion, so the enclosing structure's
/// length (or a sibling length field, see [`Sequence::decode_bounded`])
/// decides where the list ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<E>(Vec<E>);

impl<E> Sequence<E> {
    /// Empty list
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append one element
    pub fn push(&mut self, element: E) {
        self.0.push(element);
    }

    /// Take the backing vector
    #[must_use]
    pub fn into_vec(self) -> Vec<E> {
        self.0
    }
}

impl<E: Wire> Sequence<E> {
    /// Decode a list occupying exactly the next `len` bytes.
    ///
    /// # Errors
    ///
    /// `Available(Sequence)` if fewer than `len` bytes remain, `Excess(Sequence)`
    /// if the last element overran the budget, or any element fault.
    pub fn decode_bounded(view: &mut View<'_>, len: usize) -> Result<Self> {
        if !view.available(len) {
            return Err(ProtocolError::Available(Item::Sequence));
        }
        let mut sub = view.constrain(len);
        let list = Self::decode(&mut sub)?;
        if view.update(&sub) { Ok(list) } else { Err(ProtocolError::Excess(Item::Sequence)) }
    }
}

impl<E> Default for Sequence<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Deref for Sequence<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.0
    }
}

impl<E> DerefMut for Sequence<E> {
    fn deref_mut(&mut self) -> &mut [E] {
        &mut self.0
    }
}

impl<E> From<Vec<E>> for Sequence<E> {
    fn from(elements: Vec<E>) -> Self {
        Self(elements)
    }
}

impl<E> FromIterator<E> for Sequence<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<E> IntoIterator for Sequence<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a Sequence<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<E: Wire> Wire for Sequence<E> {
    const ITEM: Item = Item::Sequence;

    fn bytes(&self) -> usize {
        self.0.iter().map(Wire::bytes).sum()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        for element in &self.0 {
            if !view.available(element.bytes()) {
                return Err(ProtocolError::Excess(Item::Sequence));
            }
            element.encode(view)?;
        }
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        let mut elements = Vec::new();
        while !view.is_empty() {
            elements.push(E::decode(view)?);
        }
        Ok(Self(elements))
    }

    fn validate(&self) -> Result<()> {
        self.0.iter().try_for_each(Wire::validate)
    }
}
