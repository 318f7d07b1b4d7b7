use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use bytes::Bytes;
#[cfg(test)] use mockall::automock;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use crate::bounded_queue::BoundedQueue;
use crate::config::DatagramConfig;
use crate::datagram_frame::DatagramFrame;
use crate::error::{CloseReason, DatagramError};
use crate::protocol_version::ProtocolVersion;

/// Callback to the packet assembler, signalling that a DATAGRAM frame is ready to be sent.
///
/// This is an edge-triggered 'there is more work' signal rather than a queue of events: it may
///  be invoked redundantly, and implementations must return quickly without blocking.
#[cfg_attr(test, automock)]
pub trait SendReadySignal: Send + Sync + 'static {
    fn on_datagram_ready(&self);
}

/// The frame pulled out of the send backlog ahead of time, so its size can be inspected
///  without removing it.
///
/// NB: `frame` is `None` iff the backlog was empty when it was last refilled
#[derive(Default)]
struct StagedFrame {
    frame: Option<DatagramFrame>,
    size: usize,
}

impl StagedFrame {
    fn refill(&mut self, frame: Option<DatagramFrame>, version: ProtocolVersion) {
        self.size = frame.as_ref()
            .map(|f| f.length(version))
            .unwrap_or(0);
        self.frame = frame;
    }
}

/// Decouples application code sending and receiving unreliable DATAGRAM frames from the packet
///  assembly and frame parsing paths of a connection.
///
/// There are four distinct call surfaces:
/// * the application enqueues outbound frames ([DatagramQueue::enqueue])
/// * the packet assembler takes them out ([DatagramQueue::peek_next_size], [DatagramQueue::dequeue])
/// * the frame parser hands over received frames ([DatagramQueue::handle_incoming])
/// * the application consumes received payloads ([DatagramQueue::receive])
///
/// All of these except `receive` return immediately: the send side fails fast when full, and
///  the receive side silently drops frames that do not fit.
pub struct DatagramQueue {
    config: DatagramConfig,
    version: ProtocolVersion,

    staged: Mutex<StagedFrame>,
    send_queue: BoundedQueue<DatagramFrame>,
    receive_queue: BoundedQueue<Bytes>,

    closed: watch::Sender<Option<CloseReason>>,

    ready_signal: Arc<dyn SendReadySignal>,
    num_dropped_incoming: AtomicU64,
}

impl DatagramQueue {
    pub fn new(config: DatagramConfig, version: ProtocolVersion, ready_signal: Arc<dyn SendReadySignal>) -> anyhow::Result<DatagramQueue> {
        config.validate()?;

        let (closed, _) = watch::channel(None);

        Ok(DatagramQueue {
            send_queue: BoundedQueue::new(config.send_queue_len),
            receive_queue: BoundedQueue::new(config.receive_queue_len),
            config,
            version,
            staged: Default::default(),
            closed,
            ready_signal,
            num_dropped_incoming: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &DatagramConfig {
        &self.config
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.closed.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.borrow().is_some()
    }

    /// number of received frames that were discarded because the application did not keep up
    pub fn num_dropped_incoming(&self) -> u64 {
        self.num_dropped_incoming.load(Ordering::Relaxed)
    }

    /// Registers a frame for sending. This never waits for room in the send backlog: if it is
    ///  full, the frame is dropped and [DatagramError::QueueFull] is returned.
    ///
    /// NB: If the queue is closed concurrently, the close reason is returned even though the
    ///      frame was accepted - there is no guarantee it will actually be sent
    pub fn enqueue(&self, frame: DatagramFrame) -> Result<(), DatagramError> {
        if let Some(reason) = self.close_reason() {
            return Err(DatagramError::Closed(reason));
        }

        {
            let mut staged = self.staged.lock().unwrap();

            // the staged frame counts towards the send backlog's capacity
            let num_held = self.send_queue.len() + usize::from(staged.frame.is_some());
            if num_held >= self.config.send_queue_len {
                debug!("datagram send queue full, dropping frame with {} bytes payload", frame.data.len());
                return Err(DatagramError::QueueFull);
            }

            trace!("enqueueing DATAGRAM frame with {} bytes payload", frame.data.len());
            if self.send_queue.try_push(frame).is_err() {
                return Err(DatagramError::QueueFull);
            }

            if staged.frame.is_none() {
                // all removals from the send backlog happen while holding the lock on the staged
                //  frame, so the frame we just added is still there
                let next = self.send_queue.try_pop();
                debug_assert!(next.is_some());
                staged.refill(next, self.version);
            }
        }

        self.ready_signal.on_datagram_ready();

        match self.close_reason() {
            Some(reason) => Err(DatagramError::Closed(reason)),
            None => Ok(()),
        }
    }

    /// Takes out the staged frame (if any) for sending, pulling the next frame from the backlog
    ///  into its place.
    pub fn dequeue(&self) -> Option<DatagramFrame> {
        let mut staged = self.staged.lock().unwrap();

        let result = staged.frame.take();
        let next = self.send_queue.try_pop();
        staged.refill(next, self.version);

        if let Some(frame) = &result {
            trace!("dequeued DATAGRAM frame with {} bytes payload", frame.data.len());
        }
        result
    }

    /// The encoded length of the frame the next call to [DatagramQueue::dequeue] returns, or 0
    ///  if there is nothing to send. This allows the packet assembler to check if the frame
    ///  fits into the packet before committing to it.
    pub fn peek_next_size(&self) -> usize {
        self.staged.lock().unwrap().size
    }

    /// Called by the frame parser for a received frame. The payload is copied since the
    ///  parser's buffer can be reused as soon as this call returns.
    ///
    /// If the application does not keep up with received frames and the inbox is full, the new
    ///  frame is discarded. This is not an error: DATAGRAM frames carry no delivery guarantee.
    pub fn handle_incoming(&self, frame: &DatagramFrame) {
        let data = Bytes::copy_from_slice(frame.data.as_ref());

        if let Err(dropped) = self.receive_queue.try_push(data) {
            self.num_dropped_incoming.fetch_add(1, Ordering::Relaxed);
            debug!(payload_len = dropped.len(), "discarding DATAGRAM frame: receive queue is full");
        }
    }

    /// Waits for the next received payload. Returns the close reason once the queue is closed,
    ///  even if there are still payloads that were not consumed.
    pub async fn receive(&self) -> Result<Bytes, DatagramError> {
        let mut closed = self.closed.subscribe();

        select! {
            biased;
            Ok(reason) = closed.wait_for(Option::is_some) => {
                let reason = (*reason).clone()
                    .expect("this is a bug: wait_for should only return a close reason");
                Err(DatagramError::Closed(reason))
            }
            data = self.receive_queue.pop() => Ok(data),
        }
    }

    /// Closes the queue, waking all tasks waiting in [DatagramQueue::receive]. The reason is
    ///  returned to them and to all subsequent calls to `receive` or `enqueue`.
    ///
    /// Closing is one-shot: calling this again has no effect, the first reason stays in place.
    ///  Returns `true` if this call closed the queue.
    pub fn close(&self, err: anyhow::Error) -> bool {
        let reason = CloseReason::new(err);

        let newly_closed = self.closed.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason.clone());
            true
        });

        if newly_closed {
            debug!("closed datagram queue: {}", reason);
        }
        else {
            warn!("datagram queue was closed before - ignoring new close reason {}", reason);
        }
        newly_closed
    }
}
