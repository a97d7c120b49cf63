//! In-process transport: one worker per thread, connected by bounded channels.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use super::{RankProvider, Tag, Transport};
use crate::error::{LifeError, Result};

const POLL_INTERVAL: Duration = Duration::from_micros(200);

/// One endpoint of a fully connected group of workers.
///
/// There is a separate channel for every (source, destination, tag), so a
/// receive only ever sees messages from the peer and tag it asked for, in
/// the order they were sent. A capacity of 0 makes every send a rendezvous
/// with the matching receive.
pub struct ChannelTransport {
    rank: usize,
    world_size: usize,
    /// `outboxes[dst][tag]`
    outboxes: Vec<Vec<SyncSender<Vec<u8>>>>,
    /// `inboxes[src][tag]`
    inboxes: Vec<Vec<Receiver<Vec<u8>>>>,
    capacity: usize,
    timeout: Option<Duration>,
}

impl ChannelTransport {
    /// Build `world_size` connected endpoints, indexed by rank.
    ///
    /// With a `timeout`, a send or receive that cannot complete in time fails
    /// with `PeerUnresponsive` instead of blocking forever.
    pub fn ring(world_size: usize, capacity: usize, timeout: Option<Duration>) -> Vec<Self> {
        let mut outboxes: Vec<Vec<Vec<SyncSender<Vec<u8>>>>> = (0..world_size)
            .map(|_| (0..world_size).map(|_| Vec::new()).collect())
            .collect();
        let mut inboxes: Vec<Vec<Vec<Receiver<Vec<u8>>>>> = (0..world_size)
            .map(|_| (0..world_size).map(|_| Vec::new()).collect())
            .collect();

        for src in 0..world_size {
            for dst in 0..world_size {
                for _ in Tag::ALL {
                    let (tx, rx) = mpsc::sync_channel(capacity);
                    outboxes[src][dst].push(tx);
                    inboxes[dst][src].push(rx);
                }
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ChannelTransport {
                rank,
                world_size,
                outboxes,
                inboxes,
                capacity,
                timeout,
            })
            .collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn check_peer(&self, peer: usize) -> Result<()> {
        if peer >= self.world_size {
            return Err(LifeError::Config(format!(
                "peer {} is outside a group of {}",
                peer, self.world_size
            )));
        }
        Ok(())
    }
}

impl RankProvider for ChannelTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, peer: usize, tag: Tag, bytes: &[u8]) -> Result<()> {
        self.check_peer(peer)?;
        let tx = &self.outboxes[peer][tag.index()];
        let mut message = bytes.to_vec();

        let timeout = match self.timeout {
            None => {
                return tx
                    .send(message)
                    .map_err(|_| LifeError::TransportClosed { peer })
            }
            Some(timeout) => timeout,
        };

        // SyncSender has no send_timeout; poll until the deadline.
        let deadline = Instant::now() + timeout;
        loop {
            match tx.try_send(message) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(_)) => {
                    return Err(LifeError::TransportClosed { peer })
                }
                Err(TrySendError::Full(returned)) => {
                    if Instant::now() >= deadline {
                        return Err(LifeError::PeerUnresponsive { peer, timeout });
                    }
                    message = returned;
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }

    fn buffers_sends(&self) -> bool {
        self.capacity > 0
    }

    fn recv(&mut self, peer: usize, tag: Tag, buf: &mut [u8]) -> Result<()> {
        self.check_peer(peer)?;
        let rx = &self.inboxes[peer][tag.index()];

        let message = match self.timeout {
            None => rx.recv().map_err(|_| LifeError::TransportClosed { peer })?,
            Some(timeout) => rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => LifeError::PeerUnresponsive { peer, timeout },
                RecvTimeoutError::Disconnected => LifeError::TransportClosed { peer },
            })?,
        };

        if message.len() != buf.len() {
            return Err(LifeError::DimensionMismatch(format!(
                "expected {} bytes from peer {}, got {}",
                buf.len(),
                peer,
                message.len()
            )));
        }
        buf.copy_from_slice(&message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_endpoints() {
        let ring = ChannelTransport::ring(3, 1, None);
        assert_eq!(ring.len(), 3);
        for (rank, endpoint) in ring.iter().enumerate() {
            assert_eq!(endpoint.rank(), rank);
            assert_eq!(endpoint.world_size(), 3);
            assert_eq!(endpoint.timeout(), None);
            assert!(endpoint.buffers_sends());
        }

        let rendezvous = ChannelTransport::ring(2, 0, Some(Duration::from_millis(5)));
        assert_eq!(rendezvous[1].timeout(), Some(Duration::from_millis(5)));
        assert!(!rendezvous[1].buffers_sends());
    }

    #[test]
    fn test_messages_matched_by_peer_and_tag() {
        let mut ring = ChannelTransport::ring(3, 2, None);
        let mut c = ring.pop().unwrap();
        let mut b = ring.pop().unwrap();
        let mut a = ring.pop().unwrap();

        a.send(2, Tag::Downward, &[1, 1]).unwrap();
        b.send(2, Tag::Downward, &[2, 2]).unwrap();
        a.send(2, Tag::Upward, &[3, 3]).unwrap();

        let mut buf = [0u8; 2];
        c.recv(1, Tag::Downward, &mut buf).unwrap();
        assert_eq!(buf, [2, 2]);
        c.recv(0, Tag::Upward, &mut buf).unwrap();
        assert_eq!(buf, [3, 3]);
        c.recv(0, Tag::Downward, &mut buf).unwrap();
        assert_eq!(buf, [1, 1]);
    }

    #[test]
    fn test_rendezvous_across_threads() {
        let mut ring = ChannelTransport::ring(2, 0, None);
        let mut b = ring.pop().unwrap();
        let mut a = ring.pop().unwrap();

        let sender = thread::spawn(move || a.send(1, Tag::Upward, &[7, 8, 9]));
        let mut buf = [0u8; 3];
        b.recv(0, Tag::Upward, &mut buf).unwrap();
        sender.join().unwrap().unwrap();
        assert_eq!(buf, [7, 8, 9]);
    }

    #[test]
    fn test_length_mismatch() {
        let mut ring = ChannelTransport::ring(2, 1, None);
        ring[0].send(1, Tag::Upward, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 2];
        assert!(matches!(
            ring[1].recv(0, Tag::Upward, &mut buf),
            Err(LifeError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_timeouts_surface_peer_unresponsive() {
        let timeout = Duration::from_millis(20);
        let mut ring = ChannelTransport::ring(2, 0, Some(timeout));

        let mut buf = [0u8; 1];
        assert!(matches!(
            ring[0].recv(1, Tag::Downward, &mut buf),
            Err(LifeError::PeerUnresponsive { peer: 1, .. })
        ));
        // nobody is receiving, so a rendezvous send cannot complete
        assert!(matches!(
            ring[0].send(1, Tag::Downward, &[1]),
            Err(LifeError::PeerUnresponsive { peer: 1, .. })
        ));
    }

    #[test]
    fn test_dropped_peer_closes_channels() {
        let mut ring = ChannelTransport::ring(2, 1, None);
        drop(ring.pop());
        let mut buf = [0u8; 1];
        assert!(matches!(
            ring[0].recv(1, Tag::Upward, &mut buf),
            Err(LifeError::TransportClosed { peer: 1 })
        ));
        assert!(matches!(
            ring[0].send(1, Tag::Upward, &[1]),
            Err(LifeError::TransportClosed { peer: 1 })
        ));
    }

    #[test]
    fn test_unknown_peer() {
        let mut ring = ChannelTransport::ring(1, 1, None);
        assert!(matches!(
            ring[0].send(3, Tag::Upward, &[1]),
            Err(LifeError::Config(_))
        ));
    }
}
