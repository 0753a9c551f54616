use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::guide::{merge_grid, ReconcileConfig};
use crate::models::Grid;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Handle for one in-flight guide fetch.
///
/// The sequence number orders results; the token is cancelled once a newer
/// fetch has been applied, at which point this fetch's result would be
/// discarded anyway.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    seq: u64,
    cancel: CancellationToken,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when a newer fetch has superseded this one.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// The held grid changed; this is the new one.
    Replaced(Arc<Grid>),
    /// The fetch carried nothing new; the held grid is unchanged.
    Unchanged,
    /// A newer fetch was already applied; this result was dropped.
    Stale,
}

impl ApplyOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, ApplyOutcome::Replaced(_))
    }
}

/// The current guide grid for one browsing session.
///
/// Owned by a single task; wrap it in a lock if it must be shared.
#[derive(Debug, Default)]
pub struct GridStore {
    current: Option<Arc<Grid>>,
    config: ReconcileConfig,
    next_seq: u64,
    applied_seq: Option<u64>,
    outstanding: Vec<FetchTicket>,
}

impl GridStore {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn get(&self) -> Option<Arc<Grid>> {
        self.current.clone()
    }

    /// Sets the held grid without merging, e.g. from the warm-start cache.
    pub fn replace(&mut self, grid: Arc<Grid>) {
        self.current = Some(grid);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Drops the held grid and invalidates every ticket handed out so far.
    ///
    /// Results for those tickets come back `Stale`; tickets issued after the
    /// reset apply normally.
    pub fn reset(&mut self) {
        self.current = None;
        for pending in self.outstanding.drain(..) {
            log_debug!("cancelling guide fetch #{} on reset", pending.seq);
            pending.cancel.cancel();
        }
        self.applied_seq = Some(self.next_seq);
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = FetchTicket {
            seq: self.next_seq,
            cancel: CancellationToken::new(),
        };
        self.next_seq += 1;
        self.outstanding.push(ticket.clone());
        ticket
    }

    /// Merge a fetch result into the held grid, in ticket order.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        incoming: Grid,
        preserve_existing_window: bool,
    ) -> ApplyOutcome {
        self.outstanding.retain(|pending| pending.seq != ticket.seq);

        if self.applied_seq.is_some_and(|applied| ticket.seq < applied) {
            log_info!(
                "dropping guide fetch #{} (already applied #{})",
                ticket.seq,
                self.applied_seq.unwrap_or_default()
            );
            return ApplyOutcome::Stale;
        }

        self.applied_seq = Some(ticket.seq);
        self.cancel_older_than(ticket.seq);

        let merged = merge_grid(
            self.current.as_ref(),
            Arc::new(incoming),
            preserve_existing_window,
            &self.config,
        );

        if self
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &merged))
        {
            return ApplyOutcome::Unchanged;
        }

        self.current = Some(Arc::clone(&merged));
        ApplyOutcome::Replaced(merged)
    }

    fn cancel_older_than(&mut self, seq: u64) {
        self.outstanding.retain(|pending| {
            if pending.seq < seq {
                log_debug!("cancelling superseded guide fetch #{}", pending.seq);
                pending.cancel.cancel();
                false
            } else {
                true
            }
        });
    }
}
