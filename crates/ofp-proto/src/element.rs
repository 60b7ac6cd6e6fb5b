//! Length-prefixed elements.
//!
//! An element is a fixed header carrying a type tag and a header-inclusive
//! length, followed by the payload shape that tag selects. Messages, actions,
//! instructions and queue properties are all elements; only their header
//! layout differs, so the decode and encode procedures live here once.
//!
//! # Decoding
//!
//! 1. The header must be available (`Available(header)`).
//! 2. The header is read and checked (`Bad(version)` for messages).
//! 3. The tag must be a known enumerant (`Bad(header)`).
//! 4. The declared length must cover the header itself (`Bad(header)`).
//! 5. The payload bytes must be available (`Available(payload)`).
//! 6. The payload is decoded from a sub-view holding exactly those bytes.
//! 7. The sub-view must be fully consumed (`Excess(payload)`).
//!
//! Step 7 is what catches lengths that claim more or less structure than the
//! payload holds. Encoding derives the length from `bytes()`, so there is no
//! equivalent check on the way out.

use std::{fmt, marker::PhantomData};

use crate::{
    Item,
    buffer::{View, ViewMut},
    codec::Wire,
    errors::{ProtocolError, Result},
    variant::{Payload, Tag},
};

/// Fixed-size header in front of a tagged payload.
pub trait ElementHeader: Copy + PartialEq + fmt::Debug {
    /// Tag enumeration carried in the header
    type Tag: Tag;

    /// Encoded header size
    const SIZE: usize;

    /// Structure named in header faults
    const ITEM: Item;

    /// Largest total length the length field can carry
    const MAX_LENGTH: usize = u16::MAX as usize;

    /// Read the header. The caller has checked `SIZE` bytes are available.
    fn read(view: &mut View<'_>) -> Self;

    /// Write the header. The caller has checked `SIZE` bytes are available.
    fn write(&self, view: &mut ViewMut<'_>);

    /// Tag field as it appeared on the wire
    fn raw_tag(&self) -> <Self::Tag as Tag>::Raw;

    /// Declared header-inclusive length
    fn length(&self) -> usize;

    /// Set tag and length for encoding
    fn stamp(&mut self, tag: Self::Tag, length: usize);

    /// Header checks beyond tag and length
    ///
    /// # Errors
    ///
    /// `Bad(_)` for an unacceptable header field.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// A header plus the payload its tag selects.
#[derive(Clone)]
pub struct Element<H, P> {
    header: H,
    payload: P,
}

impl<H: ElementHeader, P: Payload<Tag = H::Tag>> Element<H, P> {
    /// Pair `payload` with `header`, stamping tag and length
    pub fn with_header(mut header: H, payload: P) -> Self {
        header.stamp(payload.tag(), H::SIZE + payload.bytes());
        Self { header, payload }
    }

    /// Header with tag and length matching the current payload
    pub fn header(&self) -> H {
        let mut header = self.header;
        header.stamp(self.payload.tag(), self.bytes());
        header
    }

    /// Mutably borrow the header. Tag and length are re-stamped on read and
    /// encode, so only the remaining fields matter.
    pub fn header_mut(&mut self) -> &mut H {
        &mut self.header
    }

    /// Tag of the payload
    pub fn tag(&self) -> H::Tag {
        self.payload.tag()
    }

    /// Borrow the payload
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutably borrow the payload; the length is re-derived on encode
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Take the payload
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<H: ElementHeader + Default, P: Payload<Tag = H::Tag>> Element<H, P> {
    /// Element with a default header around `payload`
    pub fn new(payload: P) -> Self {
        Self::with_header(H::default(), payload)
    }
}

impl<H: ElementHeader, P: Payload<Tag = H::Tag>> PartialEq for Element<H, P> {
    fn eq(&self, other: &Self) -> bool {
        self.header() == other.header() && self.payload == other.payload
    }
}

impl<H: ElementHeader + Eq, P: Payload<Tag = H::Tag> + Eq> Eq for Element<H, P> {}

impl<H: ElementHeader, P: Payload<Tag = H::Tag>> fmt::Debug for Element<H, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("header", &self.header())
            .field("payload", &self.payload)
            .finish()
    }
}

impl<H: ElementHeader, P: Payload<Tag = H::Tag>> Wire for Element<H, P> {
    const ITEM: Item = H::ITEM;

    fn bytes(&self) -> usize {
        H::SIZE + self.payload.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let length = self.bytes();
        if length > H::MAX_LENGTH {
            return Err(ProtocolError::Excess(P::ITEM));
        }
        if !view.available(length) {
            return Err(ProtocolError::Available(H::ITEM));
        }

        let mut header = self.header;
        header.stamp(self.payload.tag(), length);
        header.write(view);
        self.payload.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        if !view.available(H::SIZE) {
            return Err(ProtocolError::Available(H::ITEM));
        }
        let header = H::read(view);
        header.check()?;

        let tag = H::Tag::from_raw(header.raw_tag()).ok_or(ProtocolError::Bad(H::ITEM))?;
        let payload_len = header
            .length()
            .checked_sub(H::SIZE)
            .ok_or(ProtocolError::Bad(H::ITEM))?;
        if !view.available(payload_len) {
            return Err(ProtocolError::Available(P::ITEM));
        }

        let mut sub = view.constrain(payload_len);
        let mut payload = P::construct(tag);
        payload.decode(&mut sub)?;
        if !view.update(&sub) {
            return Err(ProtocolError::Excess(P::ITEM));
        }

        Ok(Self { header, payload })
    }

    fn validate(&self) -> Result<()> {
        self.header().check()?;
        self.payload.validate()
    }
}

/// Tags that travel in a plain `{type: u16, length: u16}` header.
pub trait TlvTag: Tag<Raw = u16> {
    /// Structure named in header faults
    const HEADER_ITEM: Item;

    /// Reserved bytes after the length field
    const PAD: usize = 0;
}

/// Type/length header shared by actions, instructions and queue properties.
pub struct TlvHeader<T> {
    kind: u16,
    length: u16,
    _tag: PhantomData<T>,
}

impl<T> TlvHeader<T> {
    /// Raw type field
    #[must_use]
    pub const fn kind(&self) -> u16 {
        self.kind
    }
}

impl<T> Clone for TlvHeader<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TlvHeader<T> {}

impl<T> Default for TlvHeader<T> {
    fn default() -> Self {
        Self { kind: 0, length: 0, _tag: PhantomData }
    }
}

impl<T> PartialEq for TlvHeader<T> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.length == other.length
    }
}

impl<T> Eq for TlvHeader<T> {}

impl<T> fmt::Debug for TlvHeader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlvHeader")
            .field("kind", &format_args!("{:#06x}", self.kind))
            .field("length", &self.length)
            .finish()
    }
}

impl<T: TlvTag> ElementHeader for TlvHeader<T> {
    type Tag = T;

    const SIZE: usize = 4 + T::PAD;
    const ITEM: Item = T::HEADER_ITEM;

    fn read(view: &mut View<'_>) -> Self {
        let kind = view.get();
        let length = view.get();
        view.pad(T::PAD);
        Self { kind, length, _tag: PhantomData }
    }

    fn write(&self, view: &mut ViewMut<'_>) {
        view.put(self.kind);
        view.put(self.length);
        view.pad(T::PAD);
    }

    fn raw_tag(&self) -> u16 {
        self.kind
    }

    fn length(&self) -> usize {
        usize::from(self.length)
    }

    fn stamp(&mut self, tag: T, length: usize) {
        self.kind = tag.to_raw();
        // Encode rejects lengths above MAX_LENGTH before this is written.
        self.length = u16::try_from(length).unwrap_or(u16::MAX);
    }
}
