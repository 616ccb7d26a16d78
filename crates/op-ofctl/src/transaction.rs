//! No-reply transactions
//!
//! State-mutating requests get no answer when the switch accepts them, so
//! any reply that does arrive is a rejection. It is rendered to text and
//! returned as `OfctlError::SwitchRejection`; the caller decides whether to
//! exit.

use tracing::{debug, error};

use crate::channel::ControlChannel;
use crate::codec::MessageCodec;
use crate::error::{OfctlError, Result};
use crate::message::OfpBuf;

pub struct Transaction<'a, C: ControlChannel, K: MessageCodec> {
    channel: &'a mut C,
    codec: &'a K,
    verbosity: u8,
}

impl<'a, C: ControlChannel, K: MessageCodec> Transaction<'a, C, K> {
    pub fn new(channel: &'a mut C, codec: &'a K, verbosity: u8) -> Self {
        Self {
            channel,
            codec,
            verbosity,
        }
    }

    pub async fn send_noreply(&mut self, request: OfpBuf) -> Result<()> {
        self.send_batch_noreply(vec![request]).await
    }

    /// Send `requests` in order as one transaction.
    ///
    /// Stops at the first reply; requests after the rejected one are never
    /// sent.
    pub async fn send_batch_noreply(&mut self, mut requests: Vec<OfpBuf>) -> Result<()> {
        for request in &mut requests {
            request.update_length()?;
        }

        debug!(
            "{}: sending {} request(s) without reply",
            self.channel.name(),
            requests.len()
        );

        match self.channel.transact_multiple_noreply(requests).await? {
            None => Ok(()),
            Some(reply) => {
                let detail = self.codec.to_text(&reply, self.verbosity.saturating_add(2));
                error!("{}: {}", self.channel.name(), detail);
                Err(OfctlError::SwitchRejection {
                    switch: self.channel.name().to_string(),
                    detail,
                })
            }
        }
    }
}
