use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The terminal error a [crate::datagram_queue::DatagramQueue] was closed with. It is handed
///  out verbatim to every caller that observes the closure, so it is shared rather than copied.
///
/// NB: Equality is identity - two reasons are equal if they originate from the same `close` call
#[derive(Clone, Debug)]
pub struct CloseReason(Arc<anyhow::Error>);

impl CloseReason {
    pub fn new(err: anyhow::Error) -> CloseReason {
        CloseReason(Arc::new(err))
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for CloseReason {
    fn from(value: anyhow::Error) -> Self {
        CloseReason::new(value)
    }
}

impl PartialEq for CloseReason {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for CloseReason {}

impl Display for CloseReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum DatagramError {
    /// The send backlog is saturated. This is expected under load, and the datagram is dropped -
    ///  there is no retry, datagrams are unreliable anyway.
    #[error("datagram queue full, dropping datagram")]
    QueueFull,
    #[error("datagram queue closed: {0}")]
    Closed(CloseReason),
}
