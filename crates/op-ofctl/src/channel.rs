//! Control-channel abstraction
//!
//! The client does not open sockets itself. A `Connector` turns a target
//! such as `unix:/var/run/openvswitch/br0.mgmt` into a connected
//! `ControlChannel`, which already completed the hello exchange and knows
//! its wire version.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::OfpBuf;

/// A connected management session with one switch.
///
/// Every method blocks (awaits) until the outcome is known. Callers hold
/// the channel by `&mut`, so at most one transaction is in flight.
#[async_trait]
pub trait ControlChannel: Send {
    /// Name used in diagnostics, usually the target string
    fn name(&self) -> &str;

    /// Raw OpenFlow version negotiated by the hello exchange
    fn version(&self) -> u8;

    /// Send a request and wait for its reply
    async fn transact(&mut self, request: OfpBuf) -> Result<OfpBuf>;

    /// Send a batch of requests that expect no reply on success.
    ///
    /// Returns `Some(reply)` as soon as the switch answers any of them,
    /// which means that request was rejected; later requests are not sent.
    async fn transact_multiple_noreply(&mut self, requests: Vec<OfpBuf>) -> Result<Option<OfpBuf>>;

    /// Single-request form of `transact_multiple_noreply`
    async fn transact_noreply(&mut self, request: OfpBuf) -> Result<Option<OfpBuf>> {
        self.transact_multiple_noreply(vec![request]).await
    }

    async fn close(&mut self) -> Result<()>;
}

/// Opens control channels.
///
/// Failures are plain I/O errors; the client wraps them with the switch
/// name and target it was connecting for.
#[async_trait]
pub trait Connector: Send + Sync {
    type Channel: ControlChannel;

    async fn open(&self, target: &str) -> std::io::Result<Self::Channel>;
}
