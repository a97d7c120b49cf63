//! Point-to-point messaging between workers.
//!
//! The simulation only needs blocking, exact-length `send`/`recv` matched by
//! `(peer, tag)`. Anything that provides that (an MPI binding, sockets, the
//! in-process [`ChannelTransport`]) can drive the ring.

pub mod channel;

pub use channel::ChannelTransport;

use crate::error::Result;

/// Message tags used by the halo exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// First interior row, sent to the predecessor (becomes its bottom halo).
    Upward = 0,
    /// Last interior row, sent to the successor (becomes its top halo).
    Downward = 1,
}

impl Tag {
    pub const ALL: [Tag; 2] = [Tag::Upward, Tag::Downward];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Identity of the current worker within a fixed-size group.
pub trait RankProvider {
    fn rank(&self) -> usize;
    fn world_size(&self) -> usize;
}

/// Blocking point-to-point transport.
pub trait Transport: RankProvider {
    /// Send all of `bytes` to `peer`.
    fn send(&mut self, peer: usize, tag: Tag, bytes: &[u8]) -> Result<()>;

    /// Receive a message from `peer` that must be exactly `buf.len()` bytes long.
    fn recv(&mut self, peer: usize, tag: Tag, buf: &mut [u8]) -> Result<()>;

    /// True if `send` can complete before the peer posts the matching receive.
    fn buffers_sends(&self) -> bool {
        false
    }
}
