//! Halo exchange between ring neighbors.
//!
//! Every generation a worker sends its first interior row to its predecessor
//! (`Tag::Upward`) and its last interior row to its successor
//! (`Tag::Downward`), then receives its bottom halo from the successor and
//! its top halo from the predecessor: two sends and two receives.
//!
//! Ordering invariant: odd ranks send both rows before receiving, even ranks
//! receive both rows before sending. Adjacent ranks therefore run in
//! complementary order, except across the wrap of an odd ring where rank N-1
//! and rank 0 are both even. Two adjacent receive-first ranks wait on each
//! other forever, so the last rank of an odd ring sends first. That leaves
//! two adjacent send-first ranks, which only completes when the transport
//! buffers sends; an odd ring of size > 1 needs a buffered transport.
//! Giving every rank the same order deadlocks any ring of size >= 2.

use tracing::{debug, warn};

use crate::automaton::BitGrid;
use crate::error::{LifeError, Result};
use crate::partition::Partition;
use crate::transport::{Tag, Transport};

/// Which half of the exchange a rank performs first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeOrder {
    SendFirst,
    ReceiveFirst,
}

impl ExchangeOrder {
    pub fn for_rank(rank: usize, total_ranks: usize) -> Self {
        let odd_ring_tail = total_ranks > 1 && total_ranks % 2 == 1 && rank == total_ranks - 1;
        if rank % 2 == 1 || odd_ring_tail {
            ExchangeOrder::SendFirst
        } else {
            ExchangeOrder::ReceiveFirst
        }
    }

    /// Whether a ring of `total_ranks` needs sends that complete without a
    /// matching receive already waiting.
    pub fn needs_buffered_sends(total_ranks: usize) -> bool {
        total_ranks > 1 && total_ranks % 2 == 1
    }
}

/// Refreshes the two halo rows of a worker's local band.
pub struct RingExchange {
    partition: Partition,
    order: ExchangeOrder,
    row_buf: Vec<u8>,
}

impl RingExchange {
    pub fn new(partition: Partition) -> Self {
        RingExchange {
            partition,
            order: ExchangeOrder::for_rank(partition.rank(), partition.total_ranks()),
            row_buf: Vec::new(),
        }
    }

    pub fn order(&self) -> ExchangeOrder {
        self.order
    }

    /// Run one exchange round on `grid`, whose first and last rows are halos.
    ///
    /// A single worker is its own neighbor on both sides: the halos are copied
    /// locally and the transport is never used.
    pub fn exchange<T>(&mut self, grid: &mut BitGrid, transport: &mut T) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        if grid.height() < 3 {
            return Err(LifeError::DimensionMismatch(format!(
                "a band of height {} has no interior rows to exchange",
                grid.height()
            )));
        }
        let bottom_halo = grid.height() - 1;

        if self.partition.total_ranks() == 1 {
            self.row_buf.clear();
            self.row_buf.extend_from_slice(grid.row(bottom_halo - 1)?);
            grid.set_row(0, &self.row_buf)?;
            self.row_buf.clear();
            self.row_buf.extend_from_slice(grid.row(1)?);
            return grid.set_row(bottom_halo, &self.row_buf);
        }

        let result = match self.order {
            ExchangeOrder::SendFirst => self
                .send_rows(grid, transport)
                .and_then(|()| self.recv_rows(grid, transport)),
            ExchangeOrder::ReceiveFirst => self
                .recv_rows(grid, transport)
                .and_then(|()| self.send_rows(grid, transport)),
        };

        if let Err(err) = &result {
            warn!(rank = self.partition.rank(), "halo exchange failed: {}", err);
        } else {
            debug!(rank = self.partition.rank(), order = ?self.order, "halo exchange done");
        }
        result
    }

    fn send_rows<T>(&self, grid: &BitGrid, transport: &mut T) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        let last_interior = grid.height() - 2;
        transport.send(self.partition.predecessor(), Tag::Upward, grid.row(1)?)?;
        transport.send(
            self.partition.successor(),
            Tag::Downward,
            grid.row(last_interior)?,
        )
    }

    fn recv_rows<T>(&mut self, grid: &mut BitGrid, transport: &mut T) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        self.row_buf.resize(grid.bytes_per_row(), 0);
        transport.recv(self.partition.successor(), Tag::Upward, &mut self.row_buf)?;
        grid.set_row(grid.height() - 1, &self.row_buf)?;
        transport.recv(self.partition.predecessor(), Tag::Downward, &mut self.row_buf)?;
        grid.set_row(0, &self.row_buf)
    }
}
