//! Splitting a byte stream into whole messages.
//!
//! Messages are self-delimiting: the header's length field covers the whole
//! message, so a stream reader only needs the first 8 bytes to know how much
//! more to wait for. [`FrameReader`] accumulates arbitrary chunks and yields
//! one message-sized block at a time.

use bytes::{Bytes, BytesMut};

use crate::{
    Item, Message, MessageHeader,
    errors::{ProtocolError, Result},
};

/// Incremental message splitter
///
/// # Invariants
///
/// - Bytes are yielded in arrival order and never reordered or duplicated.
/// - A block is yielded only when all of its declared length has arrived.
/// - A declared length shorter than the header is fatal for the stream: the
///   reader cannot resynchronize, so the error repeats until [`clear`] is
///   called.
///
/// [`clear`]: FrameReader::clear
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
}

impl FrameReader {
    /// Empty reader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty reader with room for `capacity` bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(capacity) }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete message block, header included.
    ///
    /// Returns `Ok(None)` until enough bytes have arrived.
    ///
    /// # Errors
    ///
    /// `Bad(MessageHeader)` if the declared length is below the header size.
    pub fn read_frame(&mut self) -> Result<Option<Bytes>> {
        let Some(length) = Message::peek_length(&self.buffer) else {
            return Ok(None);
        };
        if length < MessageHeader::SIZE {
            return Err(ProtocolError::Bad(Item::MessageHeader));
        }
        if self.buffer.len() < length {
            return Ok(None);
        }
        Ok(Some(self.buffer.split_to(length).freeze()))
    }

    /// Take and decode the next complete message
    ///
    /// # Errors
    ///
    /// Framing errors from [`read_frame`](Self::read_frame) or any decode
    /// condition. A block that fails to decode has already been consumed.
    pub fn read_message(&mut self) -> Result<Option<Message>> {
        match self.read_frame()? {
            Some(block) => Message::from_bytes(&block).map(Some),
            None => Ok(None),
        }
    }

    /// Bytes waiting for the rest of their message
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
