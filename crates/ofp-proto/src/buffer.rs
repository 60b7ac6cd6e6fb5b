//! Owned byte blocks and bounded cursors over them.
//!
//! A [`Buffer`] owns the bytes and a health flag. Codecs never touch the
//! buffer directly; they work through a [`View`] (reading) or a [`ViewMut`]
//! (writing), each a `[first, last)` window that advances as it is consumed.
//!
//! # Bounds Discipline
//!
//! Callers check [`View::available`] before a run of primitive accesses and
//! then read or write without further branching. A failed check records how
//! many bytes were missing on the owning buffer's health flag, so the
//! transport can tell "need more input" apart from garbage.
//!
//! Multi-byte integers are converted from and to network byte order
//! (most-significant byte first) here and nowhere else.
//!
//! # Sub-views
//!
//! [`View::constrain`] carves a budget of `n` bytes out of a view. After the
//! sub-view has been decoded, [`View::update`] reconciles it with its parent:
//! the parent advances only if the sub-view was consumed exactly. A `false`
//! return is how the element codec detects declared lengths that promised
//! more (or less) structure than was present.

use std::{cell::Cell, fs, io, path::Path};

use bytes::{Bytes, BytesMut};

/// Health of a buffer after codec activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    /// No failed bounds check recorded
    #[default]
    Good,
    /// A bounds check failed; this many more bytes were needed
    Missing(usize),
    /// Contents were rejected as malformed
    Bad,
}

/// Owned, resizable byte block with a health flag.
///
/// Views borrow the buffer; they never outlive it and are not shared across
/// threads (the health flag is a `Cell`).
#[derive(Debug, Default)]
pub struct Buffer {
    data: BytesMut,
    health: Cell<Health>,
}

impl Buffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero-filled buffer of `len` bytes
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        let mut data = BytesMut::with_capacity(len);
        data.resize(len, 0);
        Self { data, health: Cell::new(Health::Good) }
    }

    /// Create a buffer holding a copy of `bytes`
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self { data: BytesMut::from(bytes), health: Cell::new(Health::Good) }
    }

    /// Create a buffer holding the contents of a file
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let contents = fs::read(path)?;
        Ok(Self::from_slice(&contents))
    }

    /// Number of bytes held
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the buffer holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow (zero-filling) or shrink the buffer
    pub fn resize(&mut self, len: usize) {
        self.data.resize(len, 0);
    }

    /// Borrow the contents
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Current health flag
    #[must_use]
    pub fn health(&self) -> Health {
        self.health.get()
    }

    /// Flag the contents as malformed
    pub fn mark_bad(&self) {
        self.health.set(Health::Bad);
    }

    /// Clear any recorded fault
    pub fn reset_health(&self) {
        self.health.set(Health::Good);
    }

    /// Read cursor over the whole buffer
    #[must_use]
    pub fn view(&self) -> View<'_> {
        View::new(&self.data, &self.health)
    }

    /// Write cursor over the whole buffer
    #[must_use]
    pub fn view_mut(&mut self) -> ViewMut<'_> {
        ViewMut::new(&mut self.data, &self.health)
    }

    /// Convert into immutable bytes for the transport
    #[must_use]
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

/// Fixed-width value with a network byte order representation.
pub trait Scalar: Copy {
    /// Encoded width in bytes
    const SIZE: usize;

    /// Decode from the first `SIZE` bytes of `src`
    fn read(src: &[u8]) -> Self;

    /// Encode into the first `SIZE` bytes of `dst`
    fn write(self, dst: &mut [u8]);
}

macro_rules! scalar_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn read(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::SIZE]);
                    <$ty>::from_be_bytes(raw)
                }

                fn write(self, dst: &mut [u8]) {
                    dst[..Self::SIZE].copy_from_slice(&self.to_be_bytes());
                }
            }
        )*
    };
}

scalar_int!(u8, u16, u32, u64);

impl<const N: usize> Scalar for [u8; N] {
    const SIZE: usize = N;

    fn read(src: &[u8]) -> Self {
        let mut raw = [0u8; N];
        raw.copy_from_slice(&src[..N]);
        raw
    }

    fn write(self, dst: &mut [u8]) {
        dst[..N].copy_from_slice(&self);
    }
}

/// Bounded read cursor.
///
/// Copying a view is cheap; the copy has its own `first` and shares the
/// underlying bytes and health flag.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    bytes: &'a [u8],
    first: usize,
    last: usize,
    health: &'a Cell<Health>,
}

impl<'a> View<'a> {
    /// View over `bytes`, reporting faults into `health`
    #[must_use]
    pub fn new(bytes: &'a [u8], health: &'a Cell<Health>) -> Self {
        Self { bytes, first: 0, last: bytes.len(), health }
    }

    /// Bytes left between the cursor and the end of the window
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.last - self.first
    }

    /// True once the window is fully consumed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// Offset of the cursor from the start of the underlying bytes
    #[must_use]
    pub fn position(&self) -> usize {
        self.first
    }

    /// Check that `n` bytes can be read.
    ///
    /// On failure records `Missing(n - remaining)` on the owning buffer.
    #[must_use]
    pub fn available(&self, n: usize) -> bool {
        let remaining = self.remaining();
        if remaining >= n {
            true
        } else {
            self.health.set(Health::Missing(n - remaining));
            false
        }
    }

    /// Read one scalar and advance. Requires a prior `available` check.
    pub fn get<T: Scalar>(&mut self) -> T {
        debug_assert!(self.remaining() >= T::SIZE, "unchecked read past end of view");
        let value = T::read(&self.bytes[self.first..self.first + T::SIZE]);
        self.first += T::SIZE;
        value
    }

    /// Borrow the next `n` bytes and advance. Requires a prior `available`
    /// check.
    pub fn get_bytes(&mut self, n: usize) -> &'a [u8] {
        debug_assert!(self.remaining() >= n, "unchecked read past end of view");
        let slice = &self.bytes[self.first..self.first + n];
        self.first += n;
        slice
    }

    /// Borrow everything left in the window and consume it
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.first..self.last];
        self.first = self.last;
        slice
    }

    /// Skip `n` reserved bytes without looking at them
    pub fn pad(&mut self, n: usize) {
        debug_assert!(self.remaining() >= n, "unchecked pad past end of view");
        self.first += n;
    }

    /// Unconsumed bytes, without advancing
    #[must_use]
    pub fn peek(&self) -> &'a [u8] {
        &self.bytes[self.first..self.last]
    }

    /// Sub-view over the next `n` bytes. Requires `n <= remaining()`.
    #[must_use]
    pub fn constrain(&self, n: usize) -> View<'a> {
        debug_assert!(n <= self.remaining(), "constrain beyond end of view");
        View { bytes: self.bytes, first: self.first, last: self.first + n, health: self.health }
    }

    /// Reconcile a sub-view made by [`constrain`](Self::constrain).
    ///
    /// Advances past the sub-view and returns `true` only if it was fully
    /// consumed; otherwise leaves `self` untouched.
    #[must_use]
    pub fn update(&mut self, sub: &View<'a>) -> bool {
        debug_assert!(sub.last <= self.last && sub.first >= self.first, "foreign sub-view");
        if sub.first == sub.last {
            self.first = sub.last;
            true
        } else {
            false
        }
    }
}

/// Bounded write cursor.
#[derive(Debug)]
pub struct ViewMut<'a> {
    bytes: &'a mut [u8],
    first: usize,
    health: &'a Cell<Health>,
}

impl<'a> ViewMut<'a> {
    /// Write cursor over `bytes`, reporting faults into `health`
    #[must_use]
    pub fn new(bytes: &'a mut [u8], health: &'a Cell<Health>) -> Self {
        Self { bytes, first: 0, health }
    }

    /// Capacity left for writing
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.first
    }

    /// Bytes written so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.first
    }

    /// Check that `n` bytes can be written.
    ///
    /// On failure records `Missing(n - remaining)` on the owning buffer.
    #[must_use]
    pub fn available(&self, n: usize) -> bool {
        let remaining = self.remaining();
        if remaining >= n {
            true
        } else {
            self.health.set(Health::Missing(n - remaining));
            false
        }
    }

    /// Write one scalar and advance. Requires a prior `available` check.
    pub fn put<T: Scalar>(&mut self, value: T) {
        debug_assert!(self.remaining() >= T::SIZE, "unchecked write past end of view");
        value.write(&mut self.bytes[self.first..self.first + T::SIZE]);
        self.first += T::SIZE;
    }

    /// Copy `src` and advance. Requires a prior `available` check.
    pub fn put_bytes(&mut self, src: &[u8]) {
        debug_assert!(self.remaining() >= src.len(), "unchecked write past end of view");
        self.bytes[self.first..self.first + src.len()].copy_from_slice(src);
        self.first += src.len();
    }

    /// Write `n` zero padding bytes and advance
    pub fn pad(&mut self, n: usize) {
        debug_assert!(self.remaining() >= n, "unchecked pad past end of view");
        self.bytes[self.first..self.first + n].fill(0);
        self.first += n;
    }
}
