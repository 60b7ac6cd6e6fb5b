//! # ofp-proto: Wire Format
//!
//! Binary codec for a versioned, length-prefixed switch control protocol
//! modelled on OpenFlow 1.3.
//!
//! ## Layers
//!
//! - [`Buffer`], [`View`] and [`ViewMut`] are bounded big-endian cursors
//!   that record the first shortfall they meet instead of panicking.
//! - [`Wire`] is the codec contract every structure implements.
//! - [`Element`] is the generic "header with type and length, then the body
//!   that type selects" codec. Messages, actions, instructions and queue
//!   properties are all elements over different headers.
//! - [`Sequence`] is a run of elements filling whatever length its parent
//!   gives it.
//! - [`Variant`] is a slot holding zero or one tag-selected payload.
//!
//! ## Errors
//!
//! Every failure is a [`ProtocolError`]: `Available`, `Bad` or `Excess`,
//! each naming the [`Item`] being processed. Decoding stops at the first
//! failure at any depth and returns it unchanged.
//!
//! ## Implementation Notes
//!
//! - **Zero-Copy Header**: [`MessageHeader`] is a `zerocopy` type, so stream
//!   readers can learn a message's length from 8 raw bytes without decoding
//!   anything else.
//! - **Closed Payload Families**: each payload family is an enum whose
//!   discriminant is the wire tag, so a body can never be paired with the
//!   wrong type field.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod buffer;
pub mod codec;
pub mod element;
pub mod errors;
pub mod flags;
pub mod frame;
pub mod header;
pub mod instruction;
pub mod oxm;
pub mod payloads;
pub mod sequence;
pub mod types;
pub mod variant;

pub use action::{Action, ActionBody, ActionHeader, ActionType};
pub use buffer::{Buffer, Health, View, ViewMut};
pub use codec::{Wire, from_bytes, to_bytes};
pub use element::{Element, ElementHeader, TlvHeader, TlvTag};
pub use errors::{Item, ProtocolError, Result};
pub use flags::{Capabilities, ConfigFlags, FlowModFlags, PortConfig, PortFeatures, PortState, StatsFlags};
pub use frame::FrameReader;
pub use header::MessageHeader;
pub use instruction::{Instruction, InstructionBody, InstructionHeader, InstructionType};
pub use oxm::{Match, OxmField};
pub use payloads::{Body, Message};
pub use sequence::Sequence;
pub use types::{MessageType, NO_BUFFER};
pub use variant::{Payload, Tag, Variant};
