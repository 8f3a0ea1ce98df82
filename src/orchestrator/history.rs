//! History cache kept consistent with the caption service by full re-fetches.

use crate::api::{ApiError, CaptionApi};
use crate::model::HistoryRecord;

/// Sequence number of an issued refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Default)]
pub struct HistorySynchronizer {
    records: Vec<HistoryRecord>,
    issued: u64,
    applied: u64,
}

impl HistorySynchronizer {
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Whether a favorite action should be offered for `id`.
    pub fn can_favorite(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id && !r.favorite)
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Replace the cache with a fetched snapshot. Failures and snapshots older
    /// than the last applied one leave the cache untouched. Returns whether the
    /// cache was replaced.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        outcome: Result<Vec<HistoryRecord>, ApiError>,
    ) -> bool {
        if ticket.0 <= self.applied {
            tracing::debug!(ticket = ticket.0, applied = self.applied, "stale history snapshot dropped");
            return false;
        }
        match outcome {
            Ok(records) => {
                tracing::debug!(count = records.len(), "history refreshed");
                self.records = records;
                self.applied = ticket.0;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "history refresh failed");
                false
            }
        }
    }

    /// Fetch the full list and replace the cache.
    pub async fn refresh(&mut self, api: &dyn CaptionApi) -> &[HistoryRecord] {
        let ticket = self.begin_refresh();
        let outcome = api.list_captions().await;
        self.apply_refresh(ticket, outcome);
        &self.records
    }

    /// Favorite a record, then reconcile with a refresh whatever the mutation's outcome.
    pub async fn favorite(
        &mut self,
        api: &dyn CaptionApi,
        id: &str,
        index: usize,
    ) -> &[HistoryRecord] {
        log_favorite_outcome(id, index, api.favorite(id, index).await);
        self.refresh(api).await
    }
}

pub(crate) fn log_favorite_outcome(id: &str, index: usize, outcome: Result<(), ApiError>) {
    match outcome {
        Ok(()) => tracing::info!(id, index, "favorite sent"),
        Err(e) => tracing::warn!(id, index, error = %e, "favorite failed"),
    }
}
