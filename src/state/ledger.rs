/// Read-through cache of the backend's VIN ledger.
///
/// The ledger is never edited locally. Every change arrives as a full
/// snapshot that replaces the previous one in a single assignment, so
/// readers see either the old ledger or the new one, never a mix.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::api::VinRecords;
use crate::error::ApiError;

use super::vin::{self, DONE_PREFIX};

/// Matched/pending VIN suffixes as last reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VinLedger {
    matched: BTreeSet<String>,
    pending: BTreeSet<String>,
    all_vins: Vec<String>,
}

impl VinLedger {
    /// Build a ledger from the wire format. A VIN reported as both matched
    /// and pending is kept as matched only.
    pub fn from_records(records: VinRecords) -> Self {
        let matched: BTreeSet<String> = records
            .matched
            .iter()
            .map(|v| v.to_ascii_uppercase())
            .collect();
        let pending: BTreeSet<String> = records
            .pending
            .iter()
            .map(|v| v.to_ascii_uppercase())
            .filter(|v| !matched.contains(v))
            .collect();

        let overlap = records.pending.len().saturating_sub(pending.len());
        if overlap > 0 {
            debug!("Ledger reported {} VINs as both matched and pending", overlap);
        }

        Self {
            matched,
            pending,
            all_vins: records.vins.iter().map(|v| v.to_ascii_uppercase()).collect(),
        }
    }

    pub fn matched(&self) -> &BTreeSet<String> {
        &self.matched
    }

    pub fn pending(&self) -> &BTreeSet<String> {
        &self.pending
    }

    pub fn all_vins(&self) -> &[String] {
        &self.all_vins
    }

    pub fn is_matched(&self, vin: &str) -> bool {
        self.matched.contains(vin)
    }

    /// Matched VINs first, then pending, each sorted. `true` marks matched.
    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.matched
            .iter()
            .map(|v| (v.as_str(), true))
            .chain(self.pending.iter().map(|v| (v.as_str(), false)))
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.pending.is_empty()
    }
}

/// Freshness of the cached ledger, shown as a status indicator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LedgerStatus {
    #[default]
    NotLoaded,
    Loading,
    Fresh,
    /// Last refresh failed; the previous snapshot is still shown
    Stale(String),
}

#[derive(Debug, Default)]
pub struct LedgerClient {
    snapshot: VinLedger,
    status: LedgerStatus,
    /// Generation of the most recent refresh request
    requested: u64,
    /// Generation of the most recent refresh whose result was applied
    applied: u64,
}

impl LedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &VinLedger {
        &self.snapshot
    }

    pub fn status(&self) -> &LedgerStatus {
        &self.status
    }

    /// Start a refresh and return its generation; the caller fetches
    /// `GET vins` and hands the result back to [`LedgerClient::apply`].
    pub fn begin_refresh(&mut self) -> u64 {
        self.requested += 1;
        self.status = LedgerStatus::Loading;
        self.requested
    }

    /// Apply a finished refresh. Results older than one already applied are
    /// dropped. On failure the previous snapshot is retained.
    /// Returns whether the snapshot changed.
    pub fn apply(&mut self, generation: u64, result: Result<VinRecords, ApiError>) -> bool {
        if generation <= self.applied || generation > self.requested {
            debug!("Dropping stale ledger refresh (generation {})", generation);
            return false;
        }
        self.applied = generation;

        match result {
            Ok(records) => {
                self.snapshot = VinLedger::from_records(records);
                self.status = LedgerStatus::Fresh;
                debug!(
                    "Ledger refreshed: {} matched, {} pending",
                    self.snapshot.matched.len(),
                    self.snapshot.pending.len()
                );
                true
            }
            Err(err) => {
                warn!("Ledger refresh failed, keeping previous snapshot: {}", err);
                self.status = LedgerStatus::Stale(err.to_string());
                false
            }
        }
    }

    /// True for `DONE_`-prefixed names and for names whose candidate VIN is
    /// already matched in the ledger.
    pub fn is_processed(&self, filename: &str) -> bool {
        let done = filename
            .get(..DONE_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(DONE_PREFIX));
        if done {
            return true;
        }
        vin::extract_vin(filename)
            .map(|v| self.snapshot.is_matched(&v))
            .unwrap_or(false)
    }
}
