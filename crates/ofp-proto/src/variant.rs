//! Tag-selected payloads.
//!
//! Most structures in the protocol are "one of N shapes, chosen by a type
//! field that lives in an enclosing header". Each such family is a Rust enum
//! implementing [`Payload`], keyed by a [`Tag`] enum that mirrors the wire
//! type field.
//!
//! The enum carries its own discriminant, so there is no way to pair a value
//! with the wrong tag: [`Payload::tag`] is derived from the value. The tag is
//! only supplied from outside at construction time, when a decoder has read
//! the type field and needs an empty shape to decode into.
//!
//! [`Variant`] adds the "not yet constructed" state for slots that are filled
//! later (for example a statistics request whose body is chosen by the
//! caller), with the construct/assign/destroy lifecycle those slots need.

use std::{fmt, hash::Hash};

use crate::{
    Item,
    buffer::{Scalar, View, ViewMut},
    errors::{ProtocolError, Result},
};

/// Wire type field selecting a payload shape.
pub trait Tag: Copy + Eq + Ord + Hash + fmt::Debug {
    /// Scalar the tag is encoded as
    type Raw: Scalar + fmt::Debug;

    /// Map a wire value to a known tag, `None` for unknown enumerants
    fn from_raw(raw: Self::Raw) -> Option<Self>;

    /// Wire value of this tag
    fn to_raw(self) -> Self::Raw;
}

/// A closed family of shapes selected by a [`Tag`].
pub trait Payload: Clone + PartialEq + fmt::Debug {
    /// Tag enumeration for this family
    type Tag: Tag;

    /// Structure named in errors raised by this family
    const ITEM: Item;

    /// Tag of the held shape
    fn tag(&self) -> Self::Tag;

    /// Default-initialized shape for `tag`
    fn construct(tag: Self::Tag) -> Self;

    /// Encoded size of the held shape
    fn bytes(&self) -> usize;

    /// Value-range and cross-field checks
    ///
    /// # Errors
    ///
    /// Returns `Bad(_)` naming the offending structure.
    fn validate(&self) -> Result<()>;

    /// Write the shape. The caller has ensured `bytes()` are available.
    ///
    /// # Errors
    ///
    /// Propagates nested encode failures.
    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()>;

    /// Decode into an already constructed shape, consuming from `view`.
    ///
    /// # Errors
    ///
    /// Any condition raised by the shape's codec.
    fn decode(&mut self, view: &mut View<'_>) -> Result<()>;
}

/// Slot holding either nothing or exactly one payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant<P> {
    /// Not constructed
    Uninit,
    /// Holds one shape
    Init(P),
}

impl<P> Default for Variant<P> {
    fn default() -> Self {
        Self::Uninit
    }
}

impl<P> From<P> for Variant<P> {
    fn from(payload: P) -> Self {
        Self::Init(payload)
    }
}

impl<P: Payload> Variant<P> {
    /// Empty slot
    #[must_use]
    pub const fn new() -> Self {
        Self::Uninit
    }

    /// Slot holding the default shape for `tag`
    #[must_use]
    pub fn construct(tag: P::Tag) -> Self {
        Self::Init(P::construct(tag))
    }

    /// True if a shape is held
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self, Self::Init(_))
    }

    /// Tag of the held shape
    #[must_use]
    pub fn tag(&self) -> Option<P::Tag> {
        self.get().map(Payload::tag)
    }

    /// Borrow the held shape
    #[must_use]
    pub const fn get(&self) -> Option<&P> {
        match self {
            Self::Init(payload) => Some(payload),
            Self::Uninit => None,
        }
    }

    /// Mutably borrow the held shape
    pub fn get_mut(&mut self) -> Option<&mut P> {
        match self {
            Self::Init(payload) => Some(payload),
            Self::Uninit => None,
        }
    }

    /// Take the held shape out of the slot
    #[must_use]
    pub fn into_inner(self) -> Option<P> {
        match self {
            Self::Init(payload) => Some(payload),
            Self::Uninit => None,
        }
    }

    /// Drop the held shape; a no-op on an empty slot
    pub fn destroy(&mut self) {
        *self = Self::Uninit;
    }

    /// Make `self` hold what `src` holds.
    ///
    /// Same-tag shapes are assigned in place, an empty destination is
    /// constructed, and an empty source empties the destination.
    pub fn assign(&mut self, src: &Self) {
        match src {
            Self::Uninit => self.destroy(),
            Self::Init(payload) => match self {
                Self::Init(dst) if dst.tag() == payload.tag() => dst.clone_from(payload),
                _ => *self = Self::Init(payload.clone()),
            },
        }
    }

    /// Encoded size, zero for an empty slot
    #[must_use]
    pub fn bytes(&self) -> usize {
        self.get().map_or(0, Payload::bytes)
    }

    /// Validate the held shape
    ///
    /// # Errors
    ///
    /// `Bad(P::ITEM)` for an empty slot, otherwise the shape's own result.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Init(payload) => payload.validate(),
            Self::Uninit => Err(ProtocolError::Bad(P::ITEM)),
        }
    }

    /// Encode the held shape
    ///
    /// # Errors
    ///
    /// `Bad(P::ITEM)` for an empty slot.
    pub fn to_buffer(&self, view: &mut ViewMut<'_>) -> Result<()> {
        match self {
            Self::Init(payload) => payload.encode(view),
            Self::Uninit => Err(ProtocolError::Bad(P::ITEM)),
        }
    }

    /// Construct the shape for `tag` and decode it from `view`.
    ///
    /// On failure the slot is left empty.
    ///
    /// # Errors
    ///
    /// Any condition raised by the shape's codec.
    pub fn from_buffer(&mut self, tag: P::Tag, view: &mut View<'_>) -> Result<()> {
        let mut payload = P::construct(tag);
        match payload.decode(view) {
            Ok(()) => {
                *self = Self::Init(payload);
                Ok(())
            },
            Err(err) => {
                self.destroy();
                Err(err)
            },
        }
    }
}

/// Declare a fieldless wire enum and its [`Tag`] impl.
///
/// The raw type must be an unsigned integer identifier (`u8`, `u16`, `u32`).
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $raw:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde_repr::Serialize_repr, serde_repr::Deserialize_repr,
        )]
        #[repr($raw)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $crate::variant::Tag for $name {
            type Raw = $raw;

            fn from_raw(raw: $raw) -> Option<Self> {
                match raw {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn to_raw(self) -> $raw {
                self as $raw
            }
        }
    };
}

pub(crate) use wire_enum;

/// Declare a payload family and its [`Payload`] impl.
///
/// Every listed shape implements [`Wire`](crate::codec::Wire) and `Default`,
/// and each variant name must also name a variant of the tag enum. Shapes
/// with no fields go in the `empty` block, which encodes each of them as
/// the given number of zero padding bytes.
macro_rules! payload_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $tag:ident, $item:path {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($shape:ty)
            ),* $(,)?
        }
        empty($pad:expr) {
            $(
                $(#[$umeta:meta])*
                $unit:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($shape),
            )*
            $(
                $(#[$umeta])*
                $unit,
            )*
        }

        impl $crate::variant::Payload for $name {
            type Tag = $tag;

            const ITEM: $crate::Item = $item;

            fn tag(&self) -> $tag {
                match self {
                    $(Self::$variant(_) => $tag::$variant,)*
                    $(Self::$unit => $tag::$unit,)*
                }
            }

            fn construct(tag: $tag) -> Self {
                match tag {
                    $($tag::$variant => Self::$variant(<$shape as Default>::default()),)*
                    $($tag::$unit => Self::$unit,)*
                }
            }

            fn bytes(&self) -> usize {
                match self {
                    $(Self::$variant(shape) => $crate::codec::Wire::bytes(shape),)*
                    $(Self::$unit => $pad,)*
                }
            }

            fn validate(&self) -> $crate::errors::Result<()> {
                match self {
                    $(Self::$variant(shape) => $crate::codec::Wire::validate(shape),)*
                    $(Self::$unit => Ok(()),)*
                }
            }

            fn encode(
                &self,
                view: &mut $crate::buffer::ViewMut<'_>,
            ) -> $crate::errors::Result<()> {
                match self {
                    $(Self::$variant(shape) => $crate::codec::Wire::encode(shape, view),)*
                    $(Self::$unit => {
                        if !view.available($pad) {
                            return Err($crate::errors::ProtocolError::Available($item));
                        }
                        view.pad($pad);
                        Ok(())
                    },)*
                }
            }

            fn decode(
                &mut self,
                view: &mut $crate::buffer::View<'_>,
            ) -> $crate::errors::Result<()> {
                match self {
                    $(Self::$variant(shape) => *shape = $crate::codec::Wire::decode(view)?,)*
                    $(Self::$unit => {
                        if !view.available($pad) {
                            return Err($crate::errors::ProtocolError::Available($item));
                        }
                        view.pad($pad);
                    },)*
                }
                Ok(())
            }
        }
    };
}

pub(crate) use payload_enum;
