//! Client configuration
//!
//! Policy (which flow formats may ever be used) and verbosity are fixed
//! when the client is built and never change afterwards.

use op_core::config::{get_config, get_config_int, get_config_opt, load_environment};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{OfctlError, Result};
use crate::protocol::ProtocolSet;

pub const ENV_PROTOCOLS: &str = "OFCTL_PROTOCOLS";
pub const ENV_VERBOSITY: &str = "OFCTL_VERBOSITY";
pub const ENV_RUNDIR: &str = "OVS_RUNDIR";

pub const DEFAULT_RUNDIR: &str = "/var/run/openvswitch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfctlConfig {
    /// Flow formats the client may use (default: any)
    #[serde(default = "default_allowed_protocols")]
    pub allowed_protocols: ProtocolSet,

    /// Detail level for rendered switch messages
    #[serde(default)]
    pub verbosity: u8,

    /// Directory holding the switches' `<bridge>.mgmt` sockets
    #[serde(default = "default_rundir")]
    pub rundir: PathBuf,
}

fn default_allowed_protocols() -> ProtocolSet {
    ProtocolSet::ANY
}

fn default_rundir() -> PathBuf {
    PathBuf::from(DEFAULT_RUNDIR)
}

impl Default for OfctlConfig {
    fn default() -> Self {
        Self {
            allowed_protocols: default_allowed_protocols(),
            verbosity: 0,
            rundir: default_rundir(),
        }
    }
}

impl OfctlConfig {
    /// Build from `OFCTL_PROTOCOLS`, `OFCTL_VERBOSITY` and `OVS_RUNDIR`,
    /// after seeding the environment from the op-ofctl environment file.
    ///
    /// An empty allowed set would turn every flow mod into a policy
    /// conflict, so it is refused here.
    pub fn from_env() -> Result<Self> {
        load_environment();

        let protocols = get_config(ENV_PROTOCOLS, "any");
        let allowed_protocols: ProtocolSet = protocols.parse()?;
        if allowed_protocols.is_empty() {
            return Err(OfctlError::InvalidProtocol(protocols));
        }
        let verbosity = get_config_int(ENV_VERBOSITY, 0).clamp(0, u8::MAX as i64) as u8;
        let rundir = get_config_opt(ENV_RUNDIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_rundir);

        Ok(Self {
            allowed_protocols,
            verbosity,
            rundir,
        })
    }

    /// Connection target for a switch.
    ///
    /// A bare bridge name maps to its management socket; anything that
    /// already names a transport (`unix:`, `tcp:`, ...) is used verbatim.
    pub fn mgmt_target(&self, switch: &str) -> String {
        if switch.contains(':') {
            return switch.to_string();
        }
        let socket = self.rundir.join(format!("{}.mgmt", switch));
        format!("unix:{}", socket.display())
    }
}
