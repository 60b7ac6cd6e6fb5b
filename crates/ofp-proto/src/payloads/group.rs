//! Group table modification.

use crate::{
    Item,
    action::Action,
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    errors::{ProtocolError, Result},
    sequence::Sequence,
    types::{group_id, port_no},
    variant::{Tag, wire_enum},
};

wire_enum! {
    /// Group-mod operation
    pub enum GroupModCommand: u16 {
        /// Add a group
        Add = 0,
        /// Replace a group's buckets
        Modify = 1,
        /// Delete a group
        Delete = 2,
    }
}

wire_enum! {
    /// How a group uses its buckets
    pub enum GroupType: u8 {
        /// Execute every bucket
        All = 0,
        /// Execute one bucket, chosen by weight
        Select = 1,
        /// Execute the single bucket
        Indirect = 2,
        /// Execute the first live bucket
        FastFailover = 3,
    }
}

/// Action list with selection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Relative weight for select groups
    pub weight: u16,
    /// Port whose liveness gates this bucket
    pub watch_port: u32,
    /// Group whose liveness gates this bucket
    pub watch_group: u32,
    /// Actions executed for this bucket
    pub actions: Sequence<Action>,
}

impl Bucket {
    /// Fixed part before the action list
    pub const HEADER_LEN: usize = 16;

    /// Unwatched bucket running `actions`
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self { actions: actions.into_iter().collect(), ..Self::default() }
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Self { weight: 0, watch_port: port_no::ANY, watch_group: group_id::ANY, actions: Sequence::new() }
    }
}

impl Wire for Bucket {
    const ITEM: Item = Item::Bucket;

    fn bytes(&self) -> usize {
        Self::HEADER_LEN + self.actions.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let len = u16::try_from(self.bytes()).map_err(|_| ProtocolError::Excess(Item::Bucket))?;
        room(view, self.bytes(), Item::Bucket)?;
        view.put(len);
        view.put(self.weight);
        view.put(self.watch_port);
        view.put(self.watch_group);
        view.pad(4);
        self.actions.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, Self::HEADER_LEN, Item::Bucket)?;
        let len = usize::from(view.get::<u16>());
        let actions_len = len.checked_sub(Self::HEADER_LEN).ok_or(ProtocolError::Bad(Item::Bucket))?;
        let weight = view.get();
        let watch_port = view.get();
        let watch_group = view.get();
        view.pad(4);
        need(view, actions_len, Item::Bucket)?;

        let mut sub = view.constrain(actions_len);
        let actions = Sequence::decode(&mut sub)?;
        if !view.update(&sub) {
            return Err(ProtocolError::Excess(Item::Bucket));
        }
        Ok(Self { weight, watch_port, watch_group, actions })
    }

    fn validate(&self) -> Result<()> {
        self.actions.validate()
    }
}

/// Group table modification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMod {
    /// Operation
    pub command: GroupModCommand,
    /// Group semantics
    pub group_type: GroupType,
    /// Target group, [`group_id::ALL`] only for deletes
    pub group_id: u32,
    /// Buckets, empty for deletes
    pub buckets: Sequence<Bucket>,
}

impl Default for GroupMod {
    fn default() -> Self {
        Self { command: GroupModCommand::Add, group_type: GroupType::All, group_id: 0, buckets: Sequence::new() }
    }
}

impl Wire for GroupMod {
    const ITEM: Item = Item::GroupMod;

    fn bytes(&self) -> usize {
        8 + self.buckets.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::GroupMod)?;
        view.put(self.command.to_raw());
        view.put(self.group_type.to_raw());
        view.pad(1);
        view.put(self.group_id);
        self.buckets.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::GroupMod)?;
        let command = GroupModCommand::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::GroupMod))?;
        let group_type = GroupType::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::GroupMod))?;
        view.pad(1);
        let group_id = view.get();
        Ok(Self { command, group_type, group_id, buckets: Sequence::decode(view)? })
    }

    fn validate(&self) -> Result<()> {
        let bad = Err(ProtocolError::Bad(Item::GroupMod));
        let id_ok = self.group_id <= group_id::MAX
            || (self.command == GroupModCommand::Delete && self.group_id == group_id::ALL);
        if !id_ok {
            return bad;
        }
        if self.command != GroupModCommand::Delete
            && self.group_type == GroupType::Indirect
            && self.buckets.len() != 1
        {
            return bad;
        }
        self.buckets.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionBody, action::Output, from_bytes, to_bytes};

    fn bucket(port: u32) -> Bucket {
        Bucket::new([Action::new(ActionBody::Output(Output { port, max_len: 0 }))])
    }

    #[test]
    fn group_mod_round_trip() {
        let group = GroupMod {
            command: GroupModCommand::Add,
            group_type: GroupType::Select,
            group_id: 5,
            buckets: [bucket(1), bucket(2)].into_iter().collect(),
        };
        let bytes = to_bytes(&group).unwrap();
        assert_eq!(bytes.len(), 8 + 2 * (16 + 16));
        assert_eq!(from_bytes::<GroupMod>(&bytes).unwrap(), group);
        group.validate().unwrap();
    }

    #[test]
    fn bucket_length_below_header_is_bad() {
        let mut bytes = to_bytes(&bucket(1)).unwrap().to_vec();
        bytes[1] = 8;
        assert_eq!(from_bytes::<Bucket>(&bytes), Err(ProtocolError::Bad(Item::Bucket)));
    }

    #[test]
    fn bucket_length_past_end_is_available() {
        let mut bytes = to_bytes(&bucket(1)).unwrap().to_vec();
        bytes[1] = 40;
        assert_eq!(from_bytes::<Bucket>(&bytes), Err(ProtocolError::Available(Item::Bucket)));
    }

    #[test]
    fn indirect_needs_one_bucket() {
        let mut group = GroupMod { group_type: GroupType::Indirect, group_id: 1, ..GroupMod::default() };
        assert_eq!(group.validate(), Err(ProtocolError::Bad(Item::GroupMod)));
        group.buckets.push(bucket(1));
        group.validate().unwrap();
        group.buckets.push(bucket(2));
        assert_eq!(group.validate(), Err(ProtocolError::Bad(Item::GroupMod)));
    }

    #[test]
    fn group_all_only_for_delete() {
        let mut group = GroupMod { group_id: group_id::ALL, ..GroupMod::default() };
        assert_eq!(group.validate(), Err(ProtocolError::Bad(Item::GroupMod)));
        group.command = GroupModCommand::Delete;
        group.validate().unwrap();
    }
}
