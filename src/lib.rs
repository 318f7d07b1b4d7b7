//! Support for unreliable datagrams next to the reliable stream traffic of a connection, plus a
//!  priority queue used for scheduling decisions in the transport.
//!
//! ## Datagram queue
//!
//! [datagram_queue::DatagramQueue] sits between the application and the connection's packet
//!  handling, in both directions:
//!
//! ```ascii
//! application --enqueue--> [backlog] -> [staged frame] --dequeue--> packet assembler
//! frame parser --handle_incoming--> [inbox] --receive--> application
//! ```
//!
//! * Memory is bounded in both directions by capacities fixed at construction time
//!   ([config::DatagramConfig])
//! * Sending never waits: if the backlog is full, `enqueue` fails with
//!   [error::DatagramError::QueueFull] and the datagram is dropped
//! * One frame is pulled out of the backlog ahead of time so that the packet assembler can
//!   check its size before committing to send it
//! * Received datagrams are copied out of the parser's buffer. If the application does not keep
//!   up, new datagrams are dropped silently - there is no backpressure towards the peer
//! * Closing is one-shot and is observed by all waiting and future callers
//!
//! Datagrams are never retransmitted. Wire encoding, packet assembly, flow control and
//!  connection lifecycle are handled elsewhere.
//!
//! ## Priority queue
//!
//! [priority_queue::PriorityQueue] is a max-heap by priority with ties broken by timestamp
//!  (earliest first), supporting in-place priority updates through handles. It has no internal
//!  synchronization.

pub mod bounded_queue;
pub mod config;
pub mod datagram_frame;
pub mod datagram_queue;
pub mod error;
pub mod priority_queue;
pub mod protocol_version;
pub mod varint;
