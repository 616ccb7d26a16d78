//! Flow-table mutation records
//!
//! A `FlowMod` is what a flow parser produces from text like
//! `priority=100,in_port=1,actions=output:2`. The client treats the match
//! and action contents as opaque and hands the record to the codec.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Flow-mod commands (ofp_flow_mod_command)
// ============================================================================
pub const OFPFC_ADD: u16 = 0;
pub const OFPFC_MODIFY: u16 = 1;
pub const OFPFC_MODIFY_STRICT: u16 = 2;
pub const OFPFC_DELETE: u16 = 3;
pub const OFPFC_DELETE_STRICT: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowModCommand {
    Add,
    Modify,
    ModifyStrict,
    Delete,
    DeleteStrict,
}

impl FlowModCommand {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            OFPFC_ADD => Some(FlowModCommand::Add),
            OFPFC_MODIFY => Some(FlowModCommand::Modify),
            OFPFC_MODIFY_STRICT => Some(FlowModCommand::ModifyStrict),
            OFPFC_DELETE => Some(FlowModCommand::Delete),
            OFPFC_DELETE_STRICT => Some(FlowModCommand::DeleteStrict),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            FlowModCommand::Add => OFPFC_ADD,
            FlowModCommand::Modify => OFPFC_MODIFY,
            FlowModCommand::ModifyStrict => OFPFC_MODIFY_STRICT,
            FlowModCommand::Delete => OFPFC_DELETE,
            FlowModCommand::DeleteStrict => OFPFC_DELETE_STRICT,
        }
    }
}

impl fmt::Display for FlowModCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowModCommand::Add => "ADD",
            FlowModCommand::Modify => "MOD",
            FlowModCommand::ModifyStrict => "MOD_STRICT",
            FlowModCommand::Delete => "DEL",
            FlowModCommand::DeleteStrict => "DEL_STRICT",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Match and actions
// ============================================================================

/// One `field=value` match criterion, kept in parser order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchField {
    pub name: String,
    pub value: String,
}

impl MatchField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    Output(u32),
    Normal,
    Controller { max_len: u16 },
    SetField { field: String, value: String },
    Drop,
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowAction::Output(port) => write!(f, "output:{}", port),
            FlowAction::Normal => f.write_str("NORMAL"),
            FlowAction::Controller { max_len } => write!(f, "CONTROLLER:{}", max_len),
            FlowAction::SetField { field, value } => write!(f, "set_field:{}->{}", value, field),
            FlowAction::Drop => f.write_str("drop"),
        }
    }
}

// ============================================================================
// Flow mutation record
// ============================================================================

/// Structured description of one forwarding-table change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMod {
    pub command: FlowModCommand,
    /// None means "all tables" for deletes and table 0 otherwise
    pub table_id: Option<u8>,
    pub priority: u16,
    pub cookie: u64,
    pub match_fields: Vec<MatchField>,
    pub actions: Vec<FlowAction>,
}

pub const OFP_DEFAULT_PRIORITY: u16 = 0x8000;

impl FlowMod {
    pub fn new(command: FlowModCommand) -> Self {
        Self {
            command,
            table_id: None,
            priority: OFP_DEFAULT_PRIORITY,
            cookie: 0,
            match_fields: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_match(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.match_fields.push(MatchField::new(name, value));
        self
    }

    pub fn with_action(mut self, action: FlowAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }
}

impl fmt::Display for FlowMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} priority={}", self.command, self.priority)?;
        if let Some(table) = self.table_id {
            write!(f, ",table={}", table)?;
        }
        if self.cookie != 0 {
            write!(f, ",cookie={:#x}", self.cookie)?;
        }
        for m in &self.match_fields {
            write!(f, ",{}={}", m.name, m.value)?;
        }
        let actions: Vec<String> = self.actions.iter().map(ToString::to_string).collect();
        if actions.is_empty() {
            f.write_str(" actions=drop")
        } else {
            write!(f, " actions={}", actions.join(","))
        }
    }
}
