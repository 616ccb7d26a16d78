//! OpenFlow client entry points
//!
//! `OfctlClient` ties a connector, a codec and the client configuration
//! together. Each call opens its own connection, does its work strictly in
//! order on that one connection, and closes it before returning.

use tracing::{debug, error, info, warn};

use crate::channel::{ControlChannel, Connector};
use crate::codec::{FlowParser, MessageCodec};
use crate::config::OfctlConfig;
use crate::error::{OfctlError, Result};
use crate::flow::FlowModCommand;
use crate::negotiate::{session_protocol, Negotiator};
use crate::protocol::{Protocol, ProtocolSet};
use crate::transaction::Transaction;

/// One operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfctlCommand {
    Show { switch: String },
    Add { switch: String, flow: String },
    Modify { switch: String, flow: String },
    Delete { switch: String, flow: String },
}

impl OfctlCommand {
    pub fn switch(&self) -> &str {
        match self {
            OfctlCommand::Show { switch }
            | OfctlCommand::Add { switch, .. }
            | OfctlCommand::Modify { switch, .. }
            | OfctlCommand::Delete { switch, .. } => switch,
        }
    }
}

pub struct OfctlClient<N: Connector, K: MessageCodec> {
    connector: N,
    codec: K,
    config: OfctlConfig,
}

impl<N: Connector, K: MessageCodec> OfctlClient<N, K> {
    pub fn new(connector: N, codec: K, config: OfctlConfig) -> Self {
        Self {
            connector,
            codec,
            config,
        }
    }

    pub fn config(&self) -> &OfctlConfig {
        &self.config
    }

    pub fn codec(&self) -> &K {
        &self.codec
    }

    pub fn negotiator(&self) -> Negotiator<'_, K> {
        Negotiator::new(&self.codec, self.config.allowed_protocols)
    }

    /// Run one command. `Show` returns the rendered switch description.
    ///
    /// Failures are logged with a hint for the operator and returned
    /// unchanged; the caller exits non-zero on any error.
    pub async fn execute<P>(&self, parser: &P, command: &OfctlCommand) -> Result<Option<String>>
    where
        P: FlowParser<FlowMod = K::FlowMod>,
    {
        let outcome = self.dispatch(parser, command).await;
        if let Err(e) = &outcome {
            error!("{}: {}", command.switch(), e);
            info!("hint: {}", e.suggestion());
        }
        outcome
    }

    async fn dispatch<P>(&self, parser: &P, command: &OfctlCommand) -> Result<Option<String>>
    where
        P: FlowParser<FlowMod = K::FlowMod>,
    {
        match command {
            OfctlCommand::Show { switch } => self.show(switch).await.map(Some),
            OfctlCommand::Add { switch, flow } => {
                self.add_flow(parser, switch, flow).await.map(|_| None)
            }
            OfctlCommand::Modify { switch, flow } => {
                self.mod_flow(parser, switch, flow).await.map(|_| None)
            }
            OfctlCommand::Delete { switch, flow } => {
                self.del_flow(parser, switch, flow).await.map(|_| None)
            }
        }
    }

    pub async fn add_flow<P>(&self, parser: &P, switch: &str, flow: &str) -> Result<()>
    where
        P: FlowParser<FlowMod = K::FlowMod>,
    {
        self.parse_and_apply(parser, switch, flow, FlowModCommand::Add)
            .await
    }

    /// Strict modify: only the flow with exactly this match and priority
    pub async fn mod_flow<P>(&self, parser: &P, switch: &str, flow: &str) -> Result<()>
    where
        P: FlowParser<FlowMod = K::FlowMod>,
    {
        self.parse_and_apply(parser, switch, flow, FlowModCommand::ModifyStrict)
            .await
    }

    /// Strict delete: only the flow with exactly this match and priority
    pub async fn del_flow<P>(&self, parser: &P, switch: &str, flow: &str) -> Result<()>
    where
        P: FlowParser<FlowMod = K::FlowMod>,
    {
        self.parse_and_apply(parser, switch, flow, FlowModCommand::DeleteStrict)
            .await
    }

    async fn parse_and_apply<P>(
        &self,
        parser: &P,
        switch: &str,
        flow: &str,
        command: FlowModCommand,
    ) -> Result<()>
    where
        P: FlowParser<FlowMod = K::FlowMod>,
    {
        let (flow_mod, usable) = parser.parse(flow, command).map_err(OfctlError::Parse)?;
        self.flow_mod(switch, vec![flow_mod], usable).await
    }

    /// Apply `flow_mods` to `switch` in order, using one dialect from `usable`.
    ///
    /// Stops at the first rejection; earlier mutations stay applied.
    pub async fn flow_mod(
        &self,
        switch: &str,
        flow_mods: Vec<K::FlowMod>,
        usable: ProtocolSet,
    ) -> Result<()> {
        // Policy conflicts are known before touching the switch.
        self.negotiator().candidates(usable)?;

        let count = flow_mods.len();
        let mut channel = self.open(switch).await?;
        let outcome = self.flow_mod_on(&mut channel, flow_mods, usable).await;
        let protocol = self.finish(channel, outcome).await?;

        info!(
            "{}: applied {} flow mod(s) using {}",
            switch, count, protocol
        );
        Ok(())
    }

    async fn flow_mod_on(
        &self,
        channel: &mut N::Channel,
        flow_mods: Vec<K::FlowMod>,
        usable: ProtocolSet,
    ) -> Result<Protocol> {
        let protocol = self.negotiator().negotiate(channel, usable).await?;

        let mut transaction = Transaction::new(channel, &self.codec, self.config.verbosity);
        for flow_mod in flow_mods {
            let request = self.codec.encode_flow_mod(&flow_mod, protocol);
            let sent = transaction.send_noreply(request).await;
            drop(flow_mod);
            sent?;
        }
        Ok(protocol)
    }

    /// Describe the switch: features plus, when the features reply lacks
    /// them, its ports. Read-only, so no negotiation.
    pub async fn show(&self, switch: &str) -> Result<String> {
        let mut channel = self.open(switch).await?;
        let outcome = self.show_on(&mut channel).await;
        self.finish(channel, outcome).await
    }

    async fn show_on(&self, channel: &mut N::Channel) -> Result<String> {
        let version = session_protocol(channel)?.version();
        let verbosity = self.config.verbosity.saturating_add(1);

        let mut request = self.codec.encode_features_request(version);
        request.update_length()?;
        let reply = channel.transact(request).await?;
        let mut text = self.codec.to_text(&reply, verbosity);

        if !self.codec.features_has_ports(&reply) {
            debug!("{}: features reply has no ports, requesting port descriptions", channel.name());
            let mut request = self.codec.encode_port_desc_request(version);
            request.update_length()?;
            let reply = channel.transact(request).await?;
            text.push('\n');
            text.push_str(&self.codec.to_text(&reply, verbosity));
        }

        Ok(text)
    }

    async fn open(&self, switch: &str) -> Result<N::Channel> {
        let target = self.config.mgmt_target(switch);
        debug!("{}: opening {}", switch, target);
        self.connector
            .open(&target)
            .await
            .map_err(|source| OfctlError::Transport {
                switch: switch.to_string(),
                target,
                source,
            })
    }

    /// Close the channel and merge its result with the operation's.
    /// The operation's own error takes precedence.
    async fn finish<T>(&self, mut channel: N::Channel, outcome: Result<T>) -> Result<T> {
        let closed = channel.close().await;
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("{}: close failed after error: {}", channel.name(), close_err);
                Err(e)
            }
        }
    }
}
