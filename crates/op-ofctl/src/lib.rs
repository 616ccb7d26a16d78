//! op-ofctl: OpenFlow control-plane client
//!
//! This crate provides:
//! - Flow-format dialects and dialect sets (`protocol`)
//! - Negotiation of one dialect shared by policy, flow and switch
//! - No-reply transactions that surface any switch reply as a rejection
//! - `OfctlClient`, which opens a switch, negotiates and applies flow mods
//!
//! Sockets, message encoding and flow-text parsing plug in through the
//! `Connector`, `MessageCodec` and `FlowParser` traits.

pub mod channel;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod flow;
pub mod message;
pub mod negotiate;
pub mod protocol;
pub mod transaction;

#[cfg(test)]
mod testing;

pub use channel::{ControlChannel, Connector};
pub use codec::{FlowParser, MessageCodec};
pub use config::OfctlConfig;
pub use driver::{OfctlClient, OfctlCommand};
pub use error::{OfctlError, Result};
pub use flow::{FlowAction, FlowMod, FlowModCommand, MatchField};
pub use message::OfpBuf;
pub use negotiate::Negotiator;
pub use protocol::{OfpVersion, Protocol, ProtocolSet};
pub use transaction::Transaction;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::channel::{ControlChannel, Connector};
    pub use super::codec::{FlowParser, MessageCodec};
    pub use super::driver::OfctlClient;
    pub use super::error::OfctlError;
    pub use super::protocol::{Protocol, ProtocolSet};
}
