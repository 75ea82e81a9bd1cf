//! The seam between a console and its remote execution channel.

use crate::Result;
use sandterm_types::ChannelRequest;

/// Outbound half of a remote channel.
pub trait Transport {
    /// Deliver a command or control request to the remote side.
    fn send(&mut self, request: &ChannelRequest) -> Result<()>;

    /// Release the channel. Must be idempotent.
    fn close(&mut self);
}

/// Inbound events from a remote channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Raw output bytes, split at arbitrary points.
    Output(Vec<u8>),
    /// Remote side finished normally.
    Closed,
    /// Channel broke.
    Failed(String),
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: &ChannelRequest) -> Result<()> {
        (**self).send(request)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
