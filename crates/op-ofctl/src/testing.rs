//! In-memory switch, codec and parser used by the unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::channel::{ControlChannel, Connector};
use crate::codec::{FlowParser, MessageCodec};
use crate::error::{OfctlError, Result};
use crate::flow::{FlowAction, FlowMod, FlowModCommand, MatchField};
use crate::message::OfpBuf;
use crate::protocol::{OfpVersion, Protocol, ProtocolSet};

pub const OFPT_ERROR: u8 = 1;
pub const OFPT_VENDOR: u8 = 4;
pub const OFPT_FEATURES_REQUEST: u8 = 5;
pub const OFPT_FEATURES_REPLY: u8 = 6;
pub const OFPT_FLOW_MOD: u8 = 14;
pub const OFPT_MULTIPART_REQUEST: u8 = 18;
pub const OFPT_MULTIPART_REPLY: u8 = 19;

const NX_VENDOR_ID: u32 = 0x0000_2320;
const NXT_SET_FLOW_FORMAT: u32 = 12;
const NXT_FLOW_MOD_TABLE_ID: u32 = 15;
const OFPMP_PORT_DESC: u16 = 13;

fn protocol_index(protocol: Protocol) -> u8 {
    Protocol::ALL.iter().position(|p| *p == protocol).unwrap() as u8
}

fn protocol_at(index: u8) -> Protocol {
    Protocol::ALL[index as usize]
}

/// (nxm, table_id) flags of the OpenFlow 1.0 dialects
fn of10_flags(protocol: Protocol) -> Option<(bool, bool)> {
    match protocol {
        Protocol::Of10Std => Some((false, false)),
        Protocol::Of10StdTid => Some((false, true)),
        Protocol::Of10Nxm => Some((true, false)),
        Protocol::Of10NxmTid => Some((true, true)),
        _ => None,
    }
}

fn of10_from_flags(nxm: bool, tid: bool) -> Protocol {
    match (nxm, tid) {
        (false, false) => Protocol::Of10Std,
        (false, true) => Protocol::Of10StdTid,
        (true, false) => Protocol::Of10Nxm,
        (true, true) => Protocol::Of10NxmTid,
    }
}

// ============================================================================
// Records with observable release
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A `FlowMod` that counts how many times it is released
#[derive(Debug)]
pub struct TrackedFlowMod {
    pub flow_mod: FlowMod,
    drops: DropCounter,
}

impl TrackedFlowMod {
    pub fn new(flow_mod: FlowMod, drops: &DropCounter) -> Self {
        Self {
            flow_mod,
            drops: drops.clone(),
        }
    }

    pub fn untracked(flow_mod: FlowMod) -> Self {
        Self::new(flow_mod, &DropCounter::default())
    }
}

impl Drop for TrackedFlowMod {
    fn drop(&mut self) {
        self.drops.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Nicira-flavoured codec: set-protocol is a vendor message, flow mods carry
/// their record as JSON so the switch side can inspect them.
#[derive(Debug, Default)]
pub struct TestCodec {
    xid: AtomicU32,
    rendered: AtomicUsize,
}

impl TestCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages rendered to text so far
    pub fn rendered(&self) -> usize {
        self.rendered.load(Ordering::SeqCst)
    }

    fn next_xid(&self) -> u32 {
        self.xid.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub fn decode_flow_mod(msg: &OfpBuf) -> (Protocol, FlowMod) {
    let body = msg.body();
    let flow_mod = serde_json::from_slice(&body[1..]).unwrap();
    (protocol_at(body[0]), flow_mod)
}

impl MessageCodec for TestCodec {
    type FlowMod = TrackedFlowMod;

    fn encode_features_request(&self, version: OfpVersion) -> OfpBuf {
        OfpBuf::new(version, OFPT_FEATURES_REQUEST, self.next_xid())
    }

    fn encode_port_desc_request(&self, version: OfpVersion) -> OfpBuf {
        let mut buf = OfpBuf::new(version, OFPT_MULTIPART_REQUEST, self.next_xid());
        buf.put_u16(OFPMP_PORT_DESC);
        buf.put_u16(0);
        buf.put(&[0u8; 4]);
        buf
    }

    fn features_has_ports(&self, reply: &OfpBuf) -> bool {
        reply.version().is_some_and(|v| v < OfpVersion::Of13)
    }

    fn encode_set_protocol(&self, current: Protocol, want: Protocol) -> Option<(OfpBuf, Protocol)> {
        if current == want || current.version() != want.version() {
            return None;
        }
        let (cur_nxm, cur_tid) = of10_flags(current)?;
        let (want_nxm, want_tid) = of10_flags(want)?;

        let (subtype, next) = if cur_nxm != want_nxm {
            (NXT_SET_FLOW_FORMAT, of10_from_flags(want_nxm, cur_tid))
        } else {
            (NXT_FLOW_MOD_TABLE_ID, of10_from_flags(cur_nxm, want_tid))
        };

        let mut buf = OfpBuf::new(current.version(), OFPT_VENDOR, self.next_xid());
        buf.put_u32(NX_VENDOR_ID);
        buf.put_u32(subtype);
        buf.put_u8(protocol_index(next));
        Some((buf, next))
    }

    fn encode_flow_mod(&self, flow_mod: &TrackedFlowMod, protocol: Protocol) -> OfpBuf {
        let mut buf = OfpBuf::new(protocol.version(), OFPT_FLOW_MOD, self.next_xid());
        buf.put_u8(protocol_index(protocol));
        buf.put(&serde_json::to_vec(&flow_mod.flow_mod).unwrap());
        buf
    }

    fn to_text(&self, msg: &OfpBuf, _verbosity: u8) -> String {
        self.rendered.fetch_add(1, Ordering::SeqCst);
        let version = msg
            .version()
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("0x{:02x}", msg.raw_version()));
        match msg.msg_type() {
            OFPT_ERROR => format!(
                "OFPT_ERROR ({}) (xid={:#x}): {}",
                version,
                msg.xid(),
                String::from_utf8_lossy(msg.body())
            ),
            OFPT_FEATURES_REPLY => format!(
                "OFPT_FEATURES_REPLY ({}) (xid={:#x}): dpid:0000000000000001",
                version,
                msg.xid()
            ),
            OFPT_MULTIPART_REPLY => format!(
                "OFPST_PORT_DESC reply ({}) (xid={:#x}):\n LOCAL(br0): addr:00:00:00:00:00:01",
                version,
                msg.xid()
            ),
            OFPT_FLOW_MOD => {
                let (protocol, flow_mod) = decode_flow_mod(msg);
                format!("OFPT_FLOW_MOD ({}) (xid={:#x}): {}", protocol, msg.xid(), flow_mod)
            }
            other => format!("OFPT_UNKNOWN type {} ({})", other, version),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parses `key=value,...,actions=a,b`. Table ids need a table-id capable
/// dialect; everything else is usable anywhere.
#[derive(Debug, Default)]
pub struct TestParser {
    drops: DropCounter,
}

impl FlowParser for TestParser {
    type FlowMod = TrackedFlowMod;

    fn parse(
        &self,
        text: &str,
        command: FlowModCommand,
    ) -> std::result::Result<(TrackedFlowMod, ProtocolSet), String> {
        let (matches, actions) = match text.split_once("actions=") {
            Some((m, a)) => (m, a),
            None => (text, ""),
        };

        let mut flow_mod = FlowMod::new(command);
        for token in matches.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, value) = token
                .split_once('=')
                .ok_or_else(|| format!("{}: missing value", token))?;
            match name {
                "priority" => {
                    flow_mod.priority = value
                        .parse()
                        .map_err(|_| format!("{}: invalid priority", value))?
                }
                "table" => {
                    flow_mod.table_id = Some(
                        value
                            .parse()
                            .map_err(|_| format!("{}: invalid table id", value))?,
                    )
                }
                _ => flow_mod.match_fields.push(MatchField::new(name, value)),
            }
        }

        for action in actions.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            let parsed = match action.split_once(':') {
                Some(("output", port)) => FlowAction::Output(
                    port.parse()
                        .map_err(|_| format!("{}: invalid port", port))?,
                ),
                None if action.eq_ignore_ascii_case("normal") => FlowAction::Normal,
                None if action == "drop" => FlowAction::Drop,
                _ => return Err(format!("{}: unknown action", action)),
            };
            flow_mod.actions.push(parsed);
        }

        let usable = if flow_mod.table_id.is_some() {
            ProtocolSet::of(&[
                Protocol::Of10StdTid,
                Protocol::Of10NxmTid,
                Protocol::Of11Std,
                Protocol::Of12Oxm,
                Protocol::Of13Oxm,
                Protocol::Of14Oxm,
                Protocol::Of15Oxm,
            ])
        } else {
            ProtocolSet::ANY
        };

        Ok((TrackedFlowMod::new(flow_mod, &self.drops), usable))
    }
}

// ============================================================================
// Switch
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    SetProtocol(Protocol),
    Rejected,
    FlowMod(FlowMod),
    Features,
    PortDesc,
    Closed,
}

#[derive(Debug, Default)]
pub struct SwitchState {
    pub events: Vec<SwitchEvent>,
    pub sent: Vec<OfpBuf>,
    pub round_trips: usize,
    pub closes: usize,
    pub opened: Vec<String>,
    pub flow_mod_protocols: Vec<Protocol>,
    refused: ProtocolSet,
    reject_flow_mod_at: Option<usize>,
    flow_mods_seen: usize,
    break_noreply_at: Option<usize>,
    noreply_calls: usize,
    fail_close: bool,
}

pub type SharedState = Arc<Mutex<SwitchState>>;

impl SwitchState {
    /// Answer set-protocol requests for `protocol` with an error
    pub fn refuse(&mut self, protocol: Protocol) {
        self.refused.insert(protocol);
    }

    /// Answer the `nth` flow mod (1-based) with an error
    pub fn reject_flow_mod(&mut self, nth: usize) {
        self.reject_flow_mod_at = Some(nth);
    }

    /// Fail the `nth` no-reply transaction (1-based) with a broken pipe
    /// before any of its requests reach the switch
    pub fn break_on_noreply(&mut self, nth: usize) {
        self.break_noreply_at = Some(nth);
    }

    /// Make `close` report an I/O error after recording the close
    pub fn fail_close(&mut self) {
        self.fail_close = true;
    }

    fn receive(&mut self, request: &OfpBuf) -> Option<OfpBuf> {
        match request.msg_type() {
            OFPT_VENDOR => {
                let target = protocol_at(request.body()[8]);
                self.events.push(SwitchEvent::SetProtocol(target));
                self.refused
                    .contains(target)
                    .then(|| error_reply(request, "OFPBRC_EPERM"))
            }
            OFPT_FLOW_MOD => {
                let (protocol, flow_mod) = decode_flow_mod(request);
                self.flow_mods_seen += 1;
                self.events.push(SwitchEvent::FlowMod(flow_mod));
                self.flow_mod_protocols.push(protocol);
                (self.reject_flow_mod_at == Some(self.flow_mods_seen))
                    .then(|| error_reply(request, "OFPBAC_BAD_OUT_PORT"))
            }
            _ => Some(error_reply(request, "OFPBRC_BAD_TYPE")),
        }
    }
}

fn broken_pipe(switch: &str) -> OfctlError {
    OfctlError::Channel {
        switch: switch.to_string(),
        source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
    }
}

fn error_reply(request: &OfpBuf, text: &str) -> OfpBuf {
    let version = request.version().unwrap_or(OfpVersion::Of10);
    let mut reply = OfpBuf::new(version, OFPT_ERROR, request.xid());
    reply.put(text.as_bytes());
    reply.update_length().unwrap();
    reply
}

pub struct MockSwitch {
    name: String,
    version: u8,
    state: SharedState,
}

impl MockSwitch {
    pub fn new(name: &str, version: OfpVersion) -> (Self, SharedState) {
        Self::with_raw_version(name, version.to_wire())
    }

    pub fn with_raw_version(name: &str, version: u8) -> (Self, SharedState) {
        let state = SharedState::default();
        (Self::attach(name, version, state.clone()), state)
    }

    fn attach(name: &str, version: u8, state: SharedState) -> Self {
        Self {
            name: name.to_string(),
            version,
            state,
        }
    }
}

#[async_trait]
impl ControlChannel for MockSwitch {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u8 {
        self.version
    }

    async fn transact(&mut self, request: OfpBuf) -> Result<OfpBuf> {
        let mut state = self.state.lock().unwrap();
        state.round_trips += 1;
        let version = request.version().unwrap_or(OfpVersion::Of10);
        let reply = match request.msg_type() {
            OFPT_FEATURES_REQUEST => {
                state.events.push(SwitchEvent::Features);
                OfpBuf::new(version, OFPT_FEATURES_REPLY, request.xid())
            }
            OFPT_MULTIPART_REQUEST => {
                state.events.push(SwitchEvent::PortDesc);
                OfpBuf::new(version, OFPT_MULTIPART_REPLY, request.xid())
            }
            _ => error_reply(&request, "OFPBRC_BAD_TYPE"),
        };
        state.sent.push(request);
        Ok(reply)
    }

    async fn transact_multiple_noreply(&mut self, requests: Vec<OfpBuf>) -> Result<Option<OfpBuf>> {
        let mut state = self.state.lock().unwrap();
        state.noreply_calls += 1;
        if state.break_noreply_at == Some(state.noreply_calls) {
            return Err(broken_pipe(&self.name));
        }
        state.round_trips += 1;
        for request in requests {
            let reply = state.receive(&request);
            state.sent.push(request);
            if reply.is_some() {
                state.events.push(SwitchEvent::Rejected);
                return Ok(reply);
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closes += 1;
        state.events.push(SwitchEvent::Closed);
        if state.fail_close {
            return Err(broken_pipe(&self.name));
        }
        Ok(())
    }
}

pub struct MockConnector {
    version: OfpVersion,
    state: SharedState,
    reachable: bool,
}

impl MockConnector {
    pub fn new(version: OfpVersion) -> Self {
        Self {
            version,
            state: SharedState::default(),
            reachable: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(OfpVersion::Of10)
        }
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Channel = MockSwitch;

    async fn open(&self, target: &str) -> std::io::Result<MockSwitch> {
        if !self.reachable {
            return Err(std::io::Error::from(std::io::ErrorKind::NotFound));
        }
        self.state.lock().unwrap().opened.push(target.to_string());
        Ok(MockSwitch::attach(
            target,
            self.version.to_wire(),
            self.state.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_mod_text_survives_every_usable_dialect() {
        let codec = TestCodec::new();
        let parser = TestParser::default();
        let (record, usable) = parser
            .parse(
                "priority=200,table=3,in_port=1,actions=output:2,NORMAL",
                FlowModCommand::Add,
            )
            .unwrap();

        for protocol in usable.iter() {
            let msg = codec.encode_flow_mod(&record, protocol);
            let text = codec.to_text(&msg, 0);
            assert!(text.contains(protocol.name()));
            assert!(text.ends_with(&record.flow_mod.to_string()));
            assert_eq!(decode_flow_mod(&msg), (protocol, record.flow_mod.clone()));
        }
    }
}
