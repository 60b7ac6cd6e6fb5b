//! The codec trait shared by every wire structure.

use bytes::Bytes;

use crate::{
    Item,
    buffer::{Buffer, View, ViewMut},
    errors::{ProtocolError, Result},
};

/// A structure with a binary wire form.
///
/// `bytes()` is always the exact number of bytes `encode` writes, so callers
/// can size a buffer up front and derive enclosing length fields.
pub trait Wire: Sized {
    /// Structure named in errors raised by this codec
    const ITEM: Item;

    /// Encoded size in bytes
    fn bytes(&self) -> usize;

    /// Write `self` and advance the view.
    ///
    /// # Errors
    ///
    /// `Available(_)` if the view is too short, `Excess(_)` if a length field
    /// would overflow.
    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()>;

    /// Read one value and advance the view.
    ///
    /// # Errors
    ///
    /// Any `Available`, `Bad` or `Excess` condition met while decoding.
    fn decode(view: &mut View<'_>) -> Result<Self>;

    /// Value-range and cross-field checks beyond what decoding enforces
    ///
    /// # Errors
    ///
    /// `Bad(_)` naming the offending structure.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Encode `value` into a freshly sized byte block.
///
/// # Errors
///
/// Propagates encode failures.
pub fn to_bytes<T: Wire>(value: &T) -> Result<Bytes> {
    let mut buffer = Buffer::with_len(value.bytes());
    let mut view = buffer.view_mut();
    value.encode(&mut view)?;
    debug_assert_eq!(view.remaining(), 0, "bytes() disagrees with encode()");
    Ok(buffer.freeze())
}

/// Decode exactly one value from `bytes`.
///
/// # Errors
///
/// Decode failures, or `Excess(T::ITEM)` if bytes are left over.
pub fn from_bytes<T: Wire>(bytes: &[u8]) -> Result<T> {
    let buffer = Buffer::from_slice(bytes);
    let mut view = buffer.view();
    let value = T::decode(&mut view)?;
    if view.is_empty() {
        Ok(value)
    } else {
        Err(ProtocolError::Excess(T::ITEM))
    }
}

/// Check that `n` bytes can be read, naming `item` on failure
pub(crate) fn need(view: &View<'_>, n: usize, item: Item) -> Result<()> {
    if view.available(n) { Ok(()) } else { Err(ProtocolError::Available(item)) }
}

/// Check that `n` bytes can be written, naming `item` on failure
pub(crate) fn room(view: &ViewMut<'_>, n: usize, item: Item) -> Result<()> {
    if view.available(n) { Ok(()) } else { Err(ProtocolError::Available(item)) }
}

/// Fixed-size zero-padded ASCII field.
///
/// Decoding stops at the first NUL; encoding truncates to `N - 1` bytes so the
/// field always stays NUL terminated.
pub(crate) fn read_str<const N: usize>(view: &mut View<'_>) -> String {
    let raw: [u8; N] = view.get();
    let end = raw.iter().position(|&b| b == 0).unwrap_or(N);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

pub(crate) fn write_str<const N: usize>(value: &str, view: &mut ViewMut<'_>) {
    let mut raw = [0u8; N];
    let len = value.len().min(N - 1);
    raw[..len].copy_from_slice(&value.as_bytes()[..len]);
    view.put(raw);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, ActionBody, action::Output};

    #[test]
    fn from_bytes_rejects_trailing_bytes() {
        let action = Action::new(ActionBody::Output(Output { port: 1, max_len: 0 }));
        let mut bytes = to_bytes(&action).unwrap().to_vec();
        assert_eq!(from_bytes::<Action>(&bytes).unwrap(), action);

        bytes.push(0);
        assert_eq!(from_bytes::<Action>(&bytes), Err(ProtocolError::Excess(Item::ActionHeader)));
    }

    #[test]
    fn strings_are_nul_terminated() {
        let mut buffer = Buffer::with_len(4);
        write_str::<4>("abcdef", &mut buffer.view_mut());
        assert_eq!(buffer.as_slice(), b"abc\0");

        let mut view = buffer.view();
        assert_eq!(read_str::<4>(&mut view), "abc");
    }
}
