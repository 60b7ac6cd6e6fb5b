//! Flow entry instructions.
//!
//! Write/apply-actions instructions nest a full action list, so decoding an
//! instruction recurses into the action element codec.

use crate::{
    Item,
    action::{Action, Experimenter},
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    element::{Element, TlvHeader, TlvTag},
    errors::{ProtocolError, Result},
    sequence::Sequence,
    types::table_id,
    variant::{payload_enum, wire_enum},
};

wire_enum! {
    /// Instruction type field
    pub enum InstructionType: u16 {
        /// Continue in a later table
        GotoTable = 1,
        /// Write metadata under a mask
        WriteMetadata = 2,
        /// Merge actions into the action set
        WriteActions = 3,
        /// Apply actions immediately
        ApplyActions = 4,
        /// Clear the action set
        ClearActions = 5,
        /// Apply a meter
        Meter = 6,
        /// Vendor instruction
        Experimenter = 0xffff,
    }
}

impl TlvTag for InstructionType {
    const HEADER_ITEM: Item = Item::InstructionHeader;
}

/// Instruction header
pub type InstructionHeader = TlvHeader<InstructionType>;

/// One instruction
pub type Instruction = Element<InstructionHeader, InstructionBody>;

payload_enum! {
    /// Instruction bodies keyed by [`InstructionType`]
    pub enum InstructionBody: InstructionType, Item::Instruction {
        /// Continue in a later table
        GotoTable(GotoTable),
        /// Write metadata under a mask
        WriteMetadata(WriteMetadata),
        /// Merge actions into the action set
        WriteActions(Actions),
        /// Apply actions immediately
        ApplyActions(Actions),
        /// Apply a meter
        Meter(Meter),
        /// Vendor instruction
        Experimenter(Experimenter),
    }
    empty(4) {
        /// Clear the action set
        ClearActions,
    }
}

/// Next table to process the packet in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GotoTable {
    /// Table id
    pub table_id: u8,
}

impl Wire for GotoTable {
    const ITEM: Item = Item::Instruction;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Instruction)?;
        view.put(self.table_id);
        view.pad(3);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Instruction)?;
        let table_id = view.get();
        view.pad(3);
        Ok(Self { table_id })
    }

    fn validate(&self) -> Result<()> {
        if self.table_id <= table_id::MAX { Ok(()) } else { Err(ProtocolError::Bad(Item::Instruction)) }
    }
}

/// Metadata write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteMetadata {
    /// New metadata bits
    pub metadata: u64,
    /// Bits of `metadata` to apply
    pub mask: u64,
}

impl Wire for WriteMetadata {
    const ITEM: Item = Item::Instruction;

    fn bytes(&self) -> usize {
        20
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 20, Item::Instruction)?;
        view.pad(4);
        view.put(self.metadata);
        view.put(self.mask);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 20, Item::Instruction)?;
        view.pad(4);
        let metadata = view.get();
        let mask = view.get();
        Ok(Self { metadata, mask })
    }
}

/// Action list after 4 reserved bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    /// Actions in order
    pub actions: Sequence<Action>,
}

impl Wire for Actions {
    const ITEM: Item = Item::Instruction;

    fn bytes(&self) -> usize {
        4 + self.actions.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Instruction)?;
        view.pad(4);
        self.actions.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Instruction)?;
        view.pad(4);
        Ok(Self { actions: Sequence::decode(view)? })
    }

    fn validate(&self) -> Result<()> {
        self.actions.validate()
    }
}

impl Actions {
    /// Action list from `actions`
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self { actions: actions.into_iter().collect() }
    }
}

/// Meter to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Meter {
    /// Meter id
    pub meter_id: u32,
}

impl Wire for Meter {
    const ITEM: Item = Item::Instruction;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Instruction)?;
        view.put(self.meter_id);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Instruction)?;
        Ok(Self { meter_id: view.get() })
    }

    fn validate(&self) -> Result<()> {
        if self.meter_id == 0 { Err(ProtocolError::Bad(Item::Instruction)) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ActionBody,
        action::{Output, SetQueue},
        from_bytes, to_bytes,
        variant::Payload,
    };

    #[test]
    fn nested_actions_round_trip() {
        let apply = Instruction::new(InstructionBody::ApplyActions(Actions::new([
            Action::new(ActionBody::SetQueue(SetQueue { queue_id: 1 })),
            Action::new(ActionBody::Output(Output { port: 2, max_len: 0 })),
        ])));
        assert_eq!(apply.bytes(), 8 + 8 + 16);
        let bytes = to_bytes(&apply).unwrap();
        assert_eq!(from_bytes::<Instruction>(&bytes).unwrap(), apply);
    }

    #[test]
    fn nested_action_fault_propagates_unchanged() {
        let apply = Instruction::new(InstructionBody::WriteActions(Actions::new([Action::new(
            ActionBody::Output(Output { port: 2, max_len: 0 }),
        )])));
        let mut bytes = to_bytes(&apply).unwrap().to_vec();
        // corrupt the nested action's type
        bytes[8] = 0x7f;
        assert_eq!(from_bytes::<Instruction>(&bytes), Err(ProtocolError::Bad(Item::ActionHeader)));
    }

    #[test]
    fn fixed_instruction_sizes() {
        let cases = [
            (InstructionBody::GotoTable(GotoTable { table_id: 1 }), 8),
            (InstructionBody::WriteMetadata(WriteMetadata { metadata: 1, mask: 1 }), 24),
            (InstructionBody::ClearActions, 8),
            (InstructionBody::Meter(Meter { meter_id: 1 }), 8),
        ];
        for (body, size) in cases {
            let tag = body.tag();
            let instruction = Instruction::new(body);
            assert_eq!(instruction.bytes(), size, "{tag:?}");
            let bytes = to_bytes(&instruction).unwrap();
            assert_eq!(from_bytes::<Instruction>(&bytes).unwrap(), instruction);
        }
    }

    #[test]
    fn goto_table_all_is_bad() {
        let goto = Instruction::new(InstructionBody::GotoTable(GotoTable { table_id: table_id::ALL }));
        assert_eq!(goto.validate(), Err(ProtocolError::Bad(Item::Instruction)));
    }
}
