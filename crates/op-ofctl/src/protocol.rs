//! OpenFlow wire versions and flow-format dialects
//!
//! A switch speaks one OpenFlow wire version per session, but a single
//! version can carry flow tables in more than one encoding (plain OpenFlow
//! 1.0 matches, Nicira NXM extensions, OXM, with or without table ids). A
//! `Protocol` names one such version × encoding pair; a `ProtocolSet` is a
//! bitset of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;

use crate::error::OfctlError;

// ============================================================================
// Wire versions
// ============================================================================

/// OpenFlow wire protocol version, as carried in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OfpVersion {
    Of10,
    Of11,
    Of12,
    Of13,
    Of14,
    Of15,
}

impl OfpVersion {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(OfpVersion::Of10),
            0x02 => Some(OfpVersion::Of11),
            0x03 => Some(OfpVersion::Of12),
            0x04 => Some(OfpVersion::Of13),
            0x05 => Some(OfpVersion::Of14),
            0x06 => Some(OfpVersion::Of15),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            OfpVersion::Of10 => 0x01,
            OfpVersion::Of11 => 0x02,
            OfpVersion::Of12 => 0x03,
            OfpVersion::Of13 => 0x04,
            OfpVersion::Of14 => 0x05,
            OfpVersion::Of15 => 0x06,
        }
    }
}

impl fmt::Display for OfpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OfpVersion::Of10 => "OpenFlow 1.0",
            OfpVersion::Of11 => "OpenFlow 1.1",
            OfpVersion::Of12 => "OpenFlow 1.2",
            OfpVersion::Of13 => "OpenFlow 1.3",
            OfpVersion::Of14 => "OpenFlow 1.4",
            OfpVersion::Of15 => "OpenFlow 1.5",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Dialects
// ============================================================================

/// One flow-format dialect. Exactly one is active on a connection at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// OpenFlow 1.0 standard flow format
    Of10Std,
    /// OpenFlow 1.0 with the Nicira table-id extension
    Of10StdTid,
    /// OpenFlow 1.0 carrying NXM matches
    Of10Nxm,
    /// NXM with the table-id extension
    Of10NxmTid,
    Of11Std,
    Of12Oxm,
    Of13Oxm,
    Of14Oxm,
    Of15Oxm,
}

impl Protocol {
    /// Every dialect in canonical preference order, most preferred first.
    ///
    /// Negotiation walks this list front to back, so position is the only
    /// tie-break between two acceptable dialects.
    pub const ALL: [Protocol; 9] = [
        Protocol::Of10Std,
        Protocol::Of10StdTid,
        Protocol::Of10Nxm,
        Protocol::Of10NxmTid,
        Protocol::Of11Std,
        Protocol::Of12Oxm,
        Protocol::Of13Oxm,
        Protocol::Of14Oxm,
        Protocol::Of15Oxm,
    ];

    fn bit(self) -> u32 {
        match self {
            Protocol::Of10Std => 1 << 0,
            Protocol::Of10StdTid => 1 << 1,
            Protocol::Of10Nxm => 1 << 2,
            Protocol::Of10NxmTid => 1 << 3,
            Protocol::Of11Std => 1 << 4,
            Protocol::Of12Oxm => 1 << 5,
            Protocol::Of13Oxm => 1 << 6,
            Protocol::Of14Oxm => 1 << 7,
            Protocol::Of15Oxm => 1 << 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Protocol::Of10Std => "OpenFlow10",
            Protocol::Of10StdTid => "OpenFlow10+table_id",
            Protocol::Of10Nxm => "NXM",
            Protocol::Of10NxmTid => "NXM+table_id",
            Protocol::Of11Std => "OpenFlow11",
            Protocol::Of12Oxm => "OXM-OpenFlow12",
            Protocol::Of13Oxm => "OXM-OpenFlow13",
            Protocol::Of14Oxm => "OXM-OpenFlow14",
            Protocol::Of15Oxm => "OXM-OpenFlow15",
        }
    }

    /// The dialect a freshly connected session speaks for a wire version.
    pub fn from_ofp_version(version: OfpVersion) -> Self {
        match version {
            OfpVersion::Of10 => Protocol::Of10Std,
            OfpVersion::Of11 => Protocol::Of11Std,
            OfpVersion::Of12 => Protocol::Of12Oxm,
            OfpVersion::Of13 => Protocol::Of13Oxm,
            OfpVersion::Of14 => Protocol::Of14Oxm,
            OfpVersion::Of15 => Protocol::Of15Oxm,
        }
    }

    /// Wire version that carries this dialect.
    pub fn version(self) -> OfpVersion {
        match self {
            Protocol::Of10Std
            | Protocol::Of10StdTid
            | Protocol::Of10Nxm
            | Protocol::Of10NxmTid => OfpVersion::Of10,
            Protocol::Of11Std => OfpVersion::Of11,
            Protocol::Of12Oxm => OfpVersion::Of12,
            Protocol::Of13Oxm => OfpVersion::Of13,
            Protocol::Of14Oxm => OfpVersion::Of14,
            Protocol::Of15Oxm => OfpVersion::Of15,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = OfctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OfctlError::InvalidProtocol(s.to_string()))
    }
}

// ============================================================================
// Dialect sets
// ============================================================================

/// Bitset of dialects. Used for the allowed (policy) and usable (per-flow)
/// sets; the active dialect is always a single `Protocol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtocolSet(u32);

impl ProtocolSet {
    pub const NONE: ProtocolSet = ProtocolSet(0);
    pub const ANY: ProtocolSet = ProtocolSet((1 << 9) - 1);

    pub fn of(protocols: &[Protocol]) -> Self {
        protocols.iter().copied().collect()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, protocol: Protocol) -> bool {
        self.0 & protocol.bit() != 0
    }

    pub fn insert(&mut self, protocol: Protocol) {
        self.0 |= protocol.bit();
    }

    /// Members in canonical preference order.
    pub fn iter(self) -> impl Iterator<Item = Protocol> {
        Protocol::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

impl From<Protocol> for ProtocolSet {
    fn from(protocol: Protocol) -> Self {
        ProtocolSet(protocol.bit())
    }
}

impl FromIterator<Protocol> for ProtocolSet {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        let mut set = ProtocolSet::NONE;
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl BitAnd for ProtocolSet {
    type Output = ProtocolSet;

    fn bitand(self, rhs: Self) -> Self::Output {
        ProtocolSet(self.0 & rhs.0)
    }
}

impl BitOr for ProtocolSet {
    type Output = ProtocolSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        ProtocolSet(self.0 | rhs.0)
    }
}

impl fmt::Display for ProtocolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        if *self == ProtocolSet::ANY {
            return f.write_str("any");
        }
        let names: Vec<&str> = self.iter().map(Protocol::name).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for ProtocolSet {
    type Err = OfctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = ProtocolSet::NONE;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("any") {
                set = set | ProtocolSet::ANY;
            } else if token.eq_ignore_ascii_case("none") {
                continue;
            } else {
                set.insert(token.parse()?);
            }
        }
        Ok(set)
    }
}

impl TryFrom<String> for ProtocolSet {
    type Error = OfctlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProtocolSet> for String {
    fn from(set: ProtocolSet) -> Self {
        set.to_string()
    }
}
