//! Flow-format negotiation
//!
//! A fresh session speaks the default dialect of its wire version. If that
//! dialect cannot express the pending flows, or policy forbids it, the
//! negotiator walks every dialect in canonical order and asks the switch to
//! switch to the first acceptable one it agrees to.

use tracing::{debug, info, warn};

use crate::channel::ControlChannel;
use crate::codec::MessageCodec;
use crate::error::{OfctlError, Result};
use crate::protocol::{OfpVersion, Protocol, ProtocolSet};

/// Verbosity used when rendering a switch's refusal of a set-protocol request
const HANDSHAKE_VERBOSITY: u8 = 2;

pub struct Negotiator<'a, K: MessageCodec> {
    codec: &'a K,
    allowed: ProtocolSet,
}

impl<'a, K: MessageCodec> Negotiator<'a, K> {
    pub fn new(codec: &'a K, allowed: ProtocolSet) -> Self {
        Self { codec, allowed }
    }

    pub fn allowed(&self) -> ProtocolSet {
        self.allowed
    }

    /// Dialects that are both usable for the pending work and allowed by policy.
    ///
    /// An empty intersection is a configuration error and is never retried.
    pub fn candidates(&self, usable: ProtocolSet) -> Result<ProtocolSet> {
        let candidates = usable & self.allowed;
        if candidates.is_empty() {
            return Err(OfctlError::PolicyConflict {
                usable,
                allowed: self.allowed,
            });
        }
        Ok(candidates)
    }

    /// Converge `channel` on one dialect from `usable ∩ allowed` and return it.
    pub async fn negotiate<C: ControlChannel>(
        &self,
        channel: &mut C,
        usable: ProtocolSet,
    ) -> Result<Protocol> {
        let candidates = self.candidates(usable)?;

        // If the initial flow format is allowed and usable, keep it.
        let mut current = session_protocol(channel)?;
        if candidates.contains(current) {
            debug!(
                "{}: keeping initial flow format {}",
                channel.name(),
                current
            );
            return Ok(current);
        }

        for want in Protocol::ALL {
            if want == current || !candidates.contains(want) {
                continue;
            }

            debug!(
                "{}: trying flow format {} (session is {})",
                channel.name(),
                want,
                current
            );
            if self.try_set_protocol(channel, want, &mut current).await? {
                info!("{}: negotiated flow format {}", channel.name(), want);
                return Ok(want);
            }
        }

        Err(OfctlError::NegotiationExhausted { usable })
    }

    /// Drive one set-protocol sub-handshake toward `want`.
    ///
    /// `current` tracks the session's dialect through intermediate steps and
    /// keeps its last value if the switch refuses part way.
    async fn try_set_protocol<C: ControlChannel>(
        &self,
        channel: &mut C,
        want: Protocol,
        current: &mut Protocol,
    ) -> Result<bool> {
        loop {
            let Some((mut request, next)) = self.codec.encode_set_protocol(*current, want) else {
                return Ok(*current == want);
            };

            request.update_length()?;
            if let Some(reply) = channel.transact_noreply(request).await? {
                let s = self.codec.to_text(&reply, HANDSHAKE_VERBOSITY);
                warn!(
                    "{}: failed to set protocol, switch replied: {}",
                    channel.name(),
                    s
                );
                return Ok(false);
            }

            debug!("{}: flow format now {}", channel.name(), next);
            *current = next;
        }
    }
}

/// Dialect of a freshly connected session, from its negotiated wire version.
pub fn session_protocol<C: ControlChannel>(channel: &C) -> Result<Protocol> {
    let raw = channel.version();
    OfpVersion::from_wire(raw)
        .map(Protocol::from_ofp_version)
        .ok_or_else(|| OfctlError::UnsupportedVersion {
            switch: channel.name().to_string(),
            version: raw,
        })
}
