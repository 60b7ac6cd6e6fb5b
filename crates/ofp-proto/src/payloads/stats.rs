//! Statistics (multipart) requests and replies.
//!
//! Both directions share an 8-byte sub-header after the message header:
//!
//! ```text
//! ┌─────────────┬──────────────┬───────────┬────────────────────┐
//! │ type (u16)  │ flags (u16)  │ pad (4)   │ body by type ...   │
//! └─────────────┴──────────────┴───────────┴────────────────────┘
//! ```
//!
//! The body slot is a [`Variant`], so a request can be built with its flags
//! first and the body chosen later. Encoding an empty slot is `Bad(stats body)`.

use std::fmt;

use crate::{
    Item, StatsFlags,
    buffer::{View, ViewMut},
    codec::{Wire, need, read_str, room, write_str},
    errors::{ProtocolError, Result},
    instruction::Instruction,
    oxm::Match,
    payloads::port::Port,
    sequence::Sequence,
    types::{group_id, port_no, table_id},
    variant::{Payload, Tag, Variant, payload_enum, wire_enum},
};

wire_enum! {
    /// Statistics kind
    pub enum StatsType: u16 {
        /// Switch description
        Desc = 0,
        /// Individual flow statistics
        Flow = 1,
        /// Aggregate flow statistics
        Aggregate = 2,
        /// Flow table statistics
        Table = 3,
        /// Port statistics
        PortStats = 4,
        /// Port descriptions
        PortDesc = 13,
    }
}

payload_enum! {
    /// Request bodies keyed by [`StatsType`]
    pub enum StatsRequestBody: StatsType, Item::StatsBody {
        /// Flows matching a filter
        Flow(FlowStatsRequest),
        /// Totals over flows matching a filter
        Aggregate(FlowStatsRequest),
        /// One port or all ports
        PortStats(PortStatsRequest),
    }
    empty(0) {
        /// Switch description
        Desc,
        /// All tables
        Table,
        /// All port descriptions
        PortDesc,
    }
}

payload_enum! {
    /// Reply bodies keyed by [`StatsType`]
    pub enum StatsReplyBody: StatsType, Item::StatsBody {
        /// Switch description
        Desc(Desc),
        /// One entry per flow
        Flow(Sequence<FlowStats>),
        /// Totals
        Aggregate(AggregateStats),
        /// One entry per table
        Table(Sequence<TableStats>),
        /// One entry per port
        PortStats(Sequence<PortStats>),
        /// One description per port
        PortDesc(Sequence<Port>),
    }
    empty(0) {}
}

/// Statistics message: flags plus a type-selected body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats<P> {
    /// Request or reply flags
    pub flags: StatsFlags,
    /// Body, selected by the type field
    pub body: Variant<P>,
}

/// Statistics request body
pub type StatsRequest = Stats<StatsRequestBody>;

/// Statistics reply body
pub type StatsReply = Stats<StatsReplyBody>;

impl<P: Payload<Tag = StatsType>> Stats<P> {
    /// Stats message with no flags
    #[must_use]
    pub fn new(body: P) -> Self {
        Self { flags: StatsFlags::empty(), body: Variant::Init(body) }
    }

    /// Type of the held body
    #[must_use]
    pub fn kind(&self) -> Option<StatsType> {
        self.body.tag()
    }

    /// True if further replies of the same request follow
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.flags.contains(StatsFlags::MORE)
    }
}

impl<P> Default for Stats<P> {
    fn default() -> Self {
        Self { flags: StatsFlags::empty(), body: Variant::Uninit }
    }
}

impl<P: Payload<Tag = StatsType>> Wire for Stats<P> {
    const ITEM: Item = Item::StatsHeader;

    fn bytes(&self) -> usize {
        8 + self.body.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let kind = self.kind().ok_or(ProtocolError::Bad(Item::StatsBody))?;
        room(view, self.bytes(), Item::StatsHeader)?;
        view.put(kind.to_raw());
        view.put(self.flags.bits());
        view.pad(4);
        self.body.to_buffer(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::StatsHeader)?;
        let kind = StatsType::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::StatsHeader))?;
        let flags = StatsFlags::from_bits_retain(view.get());
        view.pad(4);
        let mut body = Variant::new();
        body.from_buffer(kind, view)?;
        Ok(Self { flags, body })
    }

    fn validate(&self) -> Result<()> {
        self.body.validate()
    }
}

/// Filter shared by flow and aggregate requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStatsRequest {
    /// Table to read, or [`table_id::ALL`]
    pub table_id: u8,
    /// Output port filter, or [`port_no::ANY`]
    pub out_port: u32,
    /// Output group filter, or [`group_id::ANY`]
    pub out_group: u32,
    /// Cookie value to match
    pub cookie: u64,
    /// Cookie bits that must match, 0 for none
    pub cookie_mask: u64,
    /// Flow match filter
    pub pattern: Match,
}

impl Default for FlowStatsRequest {
    fn default() -> Self {
        Self {
            table_id: table_id::ALL,
            out_port: port_no::ANY,
            out_group: group_id::ANY,
            cookie: 0,
            cookie_mask: 0,
            pattern: Match::default(),
        }
    }
}

impl Wire for FlowStatsRequest {
    const ITEM: Item = Item::StatsBody;

    fn bytes(&self) -> usize {
        32 + self.pattern.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::StatsBody)?;
        view.put(self.table_id);
        view.pad(3);
        view.put(self.out_port);
        view.put(self.out_group);
        view.pad(4);
        view.put(self.cookie);
        view.put(self.cookie_mask);
        self.pattern.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 32, Item::StatsBody)?;
        let table_id = view.get();
        view.pad(3);
        let out_port = view.get();
        let out_group = view.get();
        view.pad(4);
        let cookie = view.get();
        let cookie_mask = view.get();
        Ok(Self { table_id, out_port, out_group, cookie, cookie_mask, pattern: Match::decode(view)? })
    }

    fn validate(&self) -> Result<()> {
        self.pattern.validate()
    }
}

/// Port filter for port statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortStatsRequest {
    /// Port to read, or [`port_no::ANY`]
    pub port_no: u32,
}

impl Default for PortStatsRequest {
    fn default() -> Self {
        Self { port_no: port_no::ANY }
    }
}

impl Wire for PortStatsRequest {
    const ITEM: Item = Item::StatsBody;

    fn bytes(&self) -> usize {
        8
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 8, Item::StatsBody)?;
        view.put(self.port_no);
        view.pad(4);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::StatsBody)?;
        let port_no = view.get();
        view.pad(4);
        Ok(Self { port_no })
    }
}

const DESC_STR_LEN: usize = 256;
const SERIAL_NUM_LEN: usize = 32;

/// Switch description strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Desc {
    /// Manufacturer
    pub mfr_desc: String,
    /// Hardware revision
    pub hw_desc: String,
    /// Software revision
    pub sw_desc: String,
    /// Serial number
    pub serial_num: String,
    /// Human readable datapath description
    pub dp_desc: String,
}

impl Desc {
    /// Encoded size
    pub const SIZE: usize = 4 * DESC_STR_LEN + SERIAL_NUM_LEN;
}

impl Wire for Desc {
    const ITEM: Item = Item::Desc;

    fn bytes(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, Self::SIZE, Item::Desc)?;
        write_str::<DESC_STR_LEN>(&self.mfr_desc, view);
        write_str::<DESC_STR_LEN>(&self.hw_desc, view);
        write_str::<DESC_STR_LEN>(&self.sw_desc, view);
        write_str::<SERIAL_NUM_LEN>(&self.serial_num, view);
        write_str::<DESC_STR_LEN>(&self.dp_desc, view);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, Self::SIZE, Item::Desc)?;
        Ok(Self {
            mfr_desc: read_str::<DESC_STR_LEN>(view),
            hw_desc: read_str::<DESC_STR_LEN>(view),
            sw_desc: read_str::<DESC_STR_LEN>(view),
            serial_num: read_str::<SERIAL_NUM_LEN>(view),
            dp_desc: read_str::<DESC_STR_LEN>(view),
        })
    }

    fn validate(&self) -> Result<()> {
        let fits = [&self.mfr_desc, &self.hw_desc, &self.sw_desc, &self.dp_desc]
            .iter()
            .all(|s| s.len() < DESC_STR_LEN)
            && self.serial_num.len() < SERIAL_NUM_LEN;
        if fits { Ok(()) } else { Err(ProtocolError::Bad(Item::Desc)) }
    }
}

/// Statistics for one flow entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowStats {
    /// Table the entry lives in
    pub table_id: u8,
    /// Seconds alive
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`
    pub duration_nsec: u32,
    /// Entry priority
    pub priority: u16,
    /// Idle timeout
    pub idle_timeout: u16,
    /// Hard timeout
    pub hard_timeout: u16,
    /// Entry flags
    pub flags: u16,
    /// Entry cookie
    pub cookie: u64,
    /// Packets matched
    pub packet_count: u64,
    /// Bytes matched
    pub byte_count: u64,
    /// Entry match
    pub pattern: Match,
    /// Entry instructions
    pub instructions: Sequence<Instruction>,
}

impl FlowStats {
    const FIXED_LEN: usize = 48;
}

impl Wire for FlowStats {
    const ITEM: Item = Item::FlowStats;

    fn bytes(&self) -> usize {
        Self::FIXED_LEN + self.pattern.bytes() + self.instructions.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let length = u16::try_from(self.bytes()).map_err(|_| ProtocolError::Excess(Item::FlowStats))?;
        room(view, self.bytes(), Item::FlowStats)?;
        view.put(length);
        view.put(self.table_id);
        view.pad(1);
        view.put(self.duration_sec);
        view.put(self.duration_nsec);
        view.put(self.priority);
        view.put(self.idle_timeout);
        view.put(self.hard_timeout);
        view.put(self.flags);
        view.pad(4);
        view.put(self.cookie);
        view.put(self.packet_count);
        view.put(self.byte_count);
        self.pattern.encode(view)?;
        self.instructions.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, Self::FIXED_LEN, Item::FlowStats)?;
        let length = usize::from(view.get::<u16>());
        if length < Self::FIXED_LEN {
            return Err(ProtocolError::Bad(Item::FlowStats));
        }
        need(view, length - 2, Item::FlowStats)?;

        let mut sub = view.constrain(length - 2);
        let table_id = sub.get();
        sub.pad(1);
        let duration_sec = sub.get();
        let duration_nsec = sub.get();
        let priority = sub.get();
        let idle_timeout = sub.get();
        let hard_timeout = sub.get();
        let flags = sub.get();
        sub.pad(4);
        let stats = Self {
            table_id,
            duration_sec,
            duration_nsec,
            priority,
            idle_timeout,
            hard_timeout,
            flags,
            cookie: sub.get(),
            packet_count: sub.get(),
            byte_count: sub.get(),
            pattern: Match::decode(&mut sub)?,
            instructions: Sequence::decode(&mut sub)?,
        };
        if !view.update(&sub) {
            return Err(ProtocolError::Excess(Item::FlowStats));
        }
        Ok(stats)
    }

    fn validate(&self) -> Result<()> {
        self.pattern.validate()?;
        self.instructions.validate()
    }
}

/// Totals over a set of flows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Packets matched
    pub packet_count: u64,
    /// Bytes matched
    pub byte_count: u64,
    /// Flows counted
    pub flow_count: u32,
}

impl Wire for AggregateStats {
    const ITEM: Item = Item::Aggregate;

    fn bytes(&self) -> usize {
        24
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 24, Item::Aggregate)?;
        view.put(self.packet_count);
        view.put(self.byte_count);
        view.put(self.flow_count);
        view.pad(4);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 24, Item::Aggregate)?;
        let packet_count = view.get();
        let byte_count = view.get();
        let flow_count = view.get();
        view.pad(4);
        Ok(Self { packet_count, byte_count, flow_count })
    }
}

/// Statistics for one flow table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Table id
    pub table_id: u8,
    /// Active entries
    pub active_count: u32,
    /// Packets looked up
    pub lookup_count: u64,
    /// Packets that hit an entry
    pub matched_count: u64,
}

impl Wire for TableStats {
    const ITEM: Item = Item::TableStats;

    fn bytes(&self) -> usize {
        24
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 24, Item::TableStats)?;
        view.put(self.table_id);
        view.pad(3);
        view.put(self.active_count);
        view.put(self.lookup_count);
        view.put(self.matched_count);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 24, Item::TableStats)?;
        let table_id = view.get();
        view.pad(3);
        Ok(Self { table_id, active_count: view.get(), lookup_count: view.get(), matched_count: view.get() })
    }
}

/// Counters for one port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    /// Port number
    pub port_no: u32,
    /// Received packets
    pub rx_packets: u64,
    /// Transmitted packets
    pub tx_packets: u64,
    /// Received bytes
    pub rx_bytes: u64,
    /// Transmitted bytes
    pub tx_bytes: u64,
    /// Packets dropped on receive
    pub rx_dropped: u64,
    /// Packets dropped on transmit
    pub tx_dropped: u64,
    /// Receive errors
    pub rx_errors: u64,
    /// Transmit errors
    pub tx_errors: u64,
    /// Frame alignment errors
    pub rx_frame_err: u64,
    /// Receive overruns
    pub rx_over_err: u64,
    /// CRC errors
    pub rx_crc_err: u64,
    /// Collisions
    pub collisions: u64,
    /// Seconds the port has been alive
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`
    pub duration_nsec: u32,
}

impl PortStats {
    /// Encoded size
    pub const SIZE: usize = 112;

    fn counters(&self) -> [u64; 12] {
        [
            self.rx_packets,
            self.tx_packets,
            self.rx_bytes,
            self.tx_bytes,
            self.rx_dropped,
            self.tx_dropped,
            self.rx_errors,
            self.tx_errors,
            self.rx_frame_err,
            self.rx_over_err,
            self.rx_crc_err,
            self.collisions,
        ]
    }
}

impl Wire for PortStats {
    const ITEM: Item = Item::PortStats;

    fn bytes(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, Self::SIZE, Item::PortStats)?;
        view.put(self.port_no);
        view.pad(4);
        for counter in self.counters() {
            view.put(counter);
        }
        view.put(self.duration_sec);
        view.put(self.duration_nsec);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, Self::SIZE, Item::PortStats)?;
        let port_no = view.get();
        view.pad(4);
        let [rx_packets, tx_packets, rx_bytes, tx_bytes, rx_dropped, tx_dropped, rx_errors, tx_errors, rx_frame_err, rx_over_err, rx_crc_err, collisions] =
            std::array::from_fn(|_| view.get::<u64>());
        Ok(Self {
            port_no,
            rx_packets,
            tx_packets,
            rx_bytes,
            tx_bytes,
            rx_dropped,
            tx_dropped,
            rx_errors,
            tx_errors,
            rx_frame_err,
            rx_over_err,
            rx_crc_err,
            collisions,
            duration_sec: view.get(),
            duration_nsec: view.get(),
        })
    }
}

impl fmt::Display for StatsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Desc => "desc",
            Self::Flow => "flow",
            Self::Aggregate => "aggregate",
            Self::Table => "table",
            Self::PortStats => "port-stats",
            Self::PortDesc => "port-desc",
        };
        f.write_str(name)
    }
}
