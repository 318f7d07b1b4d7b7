use anyhow::bail;

/// Number of outbound DATAGRAM frames that can be queued before `enqueue` fails fast
pub const DEFAULT_SEND_QUEUE_LEN: usize = 16;

/// Number of received DATAGRAM payloads buffered for the application before new ones are dropped
pub const DEFAULT_RECEIVE_QUEUE_LEN: usize = 128;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DatagramConfig {
    /// This is the capacity of the backlog of outbound frames, i.e. the number of frames the
    ///  application can register for sending before the packet assembler picks them up.
    ///
    /// NB: This includes the frame that is staged for the packet assembler
    pub send_queue_len: usize,

    /// This is the capacity of the inbox for received payloads. Payloads arriving while the
    ///  inbox is full are dropped - there is no backpressure towards the peer.
    pub receive_queue_len: usize,
}

impl Default for DatagramConfig {
    fn default() -> Self {
        DatagramConfig {
            send_queue_len: DEFAULT_SEND_QUEUE_LEN,
            receive_queue_len: DEFAULT_RECEIVE_QUEUE_LEN,
        }
    }
}

impl DatagramConfig {
    pub fn new(send_queue_len: usize, receive_queue_len: usize) -> DatagramConfig {
        DatagramConfig {
            send_queue_len,
            receive_queue_len,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.send_queue_len == 0 {
            bail!("send queue length must be positive");
        }
        if self.receive_queue_len == 0 {
            bail!("receive queue length must be positive");
        }

        Ok(())
    }
}
