//! Message codec and flow parser seams
//!
//! Encoding individual OpenFlow message types and parsing flow text are
//! delegated to implementations of these traits.

use crate::flow::FlowModCommand;
use crate::message::OfpBuf;
use crate::protocol::{OfpVersion, Protocol, ProtocolSet};

pub trait MessageCodec: Send + Sync {
    /// Flow mutation record this codec encodes, usually `crate::FlowMod`
    type FlowMod: Send;

    fn encode_features_request(&self, version: OfpVersion) -> OfpBuf;

    fn encode_port_desc_request(&self, version: OfpVersion) -> OfpBuf;

    /// OpenFlow 1.3 and later dropped the port list from the features
    /// reply; those switches need a separate port description request.
    fn features_has_ports(&self, reply: &OfpBuf) -> bool;

    /// Build the next request that moves a session from `current` toward
    /// `want`, along with the dialect the session will be in once the
    /// switch accepts it. Returns None when no request is needed, either
    /// because `current == want` or because no message can get there.
    fn encode_set_protocol(&self, current: Protocol, want: Protocol) -> Option<(OfpBuf, Protocol)>;

    fn encode_flow_mod(&self, flow_mod: &Self::FlowMod, protocol: Protocol) -> OfpBuf;

    /// Human-readable rendering of any message, replies included
    fn to_text(&self, msg: &OfpBuf, verbosity: u8) -> String;
}

pub trait FlowParser: Send + Sync {
    type FlowMod;

    /// Parse flow text into a record plus the dialects able to express it.
    /// Errors are operator-facing text.
    fn parse(
        &self,
        text: &str,
        command: FlowModCommand,
    ) -> Result<(Self::FlowMod, ProtocolSet), String>;
}
