//! Consumer of transport protocol messages

use crate::error::TransportError;
use crate::transport::Message;

/// Anything that accepts the transport message protocol
///
/// Panel drivers emit messages into a sink in valid state-machine order;
/// [`BusTransport`](crate::transport::BusTransport) is the production sink.
pub trait MessageSink {
    /// Handle one message
    fn handle(&mut self, message: Message<'_>) -> Result<(), TransportError>;

    /// Emit `START`, one `SEND` per fragment, then `END`
    fn transaction(&mut self, fragments: &[&[u8]]) -> Result<(), TransportError> {
        self.handle(Message::Start)?;
        for fragment in fragments {
            self.handle(Message::Send(fragment))?;
        }
        self.handle(Message::End)
    }
}

impl<T: MessageSink + ?Sized> MessageSink for &mut T {
    fn handle(&mut self, message: Message<'_>) -> Result<(), TransportError> {
        (**self).handle(message)
    }
}
