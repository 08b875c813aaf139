/// Batch progress, derived on demand from the queue and the ledger.
///
/// Nothing here is stored, so the numbers cannot drift from their inputs.

use super::ledger::VinLedger;
use super::queue::ReviewQueue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub total: usize,
    pub matched: usize,
    pub pending: usize,
    /// 0.0 ..= 100.0 (may exceed 100 if the backend over-reports matches)
    pub percentage: f32,
    /// "N of M processed" counter for the current queue
    pub processed: usize,
    pub queued: usize,
}

impl Progress {
    /// Ledger counts win when the ledger has data; otherwise fall back to
    /// the queue length and the backend's processed count.
    pub fn derive(queue: &ReviewQueue, ledger: &VinLedger) -> Self {
        let total = if ledger.all_vins().is_empty() {
            queue.len()
        } else {
            ledger.all_vins().len()
        };
        let matched = if ledger.matched().is_empty() {
            queue.processed_count()
        } else {
            ledger.matched().len()
        };
        let percentage = if total == 0 {
            0.0
        } else {
            matched as f32 / total as f32 * 100.0
        };

        Self {
            total,
            matched,
            pending: total.saturating_sub(matched),
            percentage,
            processed: queue.processed_count(),
            queued: queue.len(),
        }
    }
}
