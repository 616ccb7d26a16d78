//! OpenFlow client error types
//!
//! Every failure the client can hit is a variant here. None of them is
//! retried: the caller reports the message and exits non-zero.

use thiserror::Error;

use crate::protocol::ProtocolSet;

/// OpenFlow control-plane client errors
#[derive(Error, Debug)]
pub enum OfctlError {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    #[error("{switch}: failed to connect to socket {target} ({source})")]
    Transport {
        switch: String,
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{switch}: control channel failed ({source})")]
    Channel {
        switch: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{switch}: session negotiated unsupported OpenFlow version 0x{version:02x}")]
    UnsupportedVersion { switch: String, version: u8 },

    // ========================================================================
    // Negotiation Errors
    // ========================================================================
    #[error(
        "none of the usable flow formats ({usable}) is among the allowed flow formats ({allowed})"
    )]
    PolicyConflict {
        usable: ProtocolSet,
        allowed: ProtocolSet,
    },

    #[error("switch does not support any of the usable flow formats ({usable})")]
    NegotiationExhausted { usable: ProtocolSet },

    // ========================================================================
    // Switch Errors
    // ========================================================================
    #[error("{switch}: switch rejected request: {detail}")]
    SwitchRejection { switch: String, detail: String },

    #[error("OpenFlow message of {len} bytes exceeds the 65535-byte length field")]
    MessageTooLong { len: usize },

    // ========================================================================
    // Input Errors
    // ========================================================================
    #[error("{0}")]
    Parse(String),

    #[error("unknown flow format: {0}")]
    InvalidProtocol(String),
}

/// Result type alias using OfctlError
pub type Result<T> = std::result::Result<T, OfctlError>;

impl OfctlError {
    /// Get a helpful suggestion for resolving this error
    pub fn suggestion(&self) -> &'static str {
        match self {
            OfctlError::Transport { .. } => {
                "Check that ovs-vswitchd is running and the bridge name is correct"
            }
            OfctlError::Channel { .. } => "The switch closed the management connection",
            OfctlError::UnsupportedVersion { .. } => {
                "Restrict the session to OpenFlow 1.0 through 1.5"
            }
            OfctlError::PolicyConflict { .. } => {
                "Widen OFCTL_PROTOCOLS or rewrite the flow so an allowed format can express it"
            }
            OfctlError::NegotiationExhausted { .. } => {
                "Enable a matching OpenFlow version on the bridge (ovs-vsctl set bridge <br> protocols=...)"
            }
            OfctlError::SwitchRejection { .. } => "Fix the flow and run the command again",
            OfctlError::MessageTooLong { .. } => "Split the flow's actions across several flows",
            OfctlError::Parse(_) => "Check the flow syntax",
            OfctlError::InvalidProtocol(_) => "Valid names include OpenFlow10, NXM, OXM-OpenFlow13, any",
        }
    }
}
