/// Side effects requested by the session and the completions they produce.
///
/// The session never calls the backend itself. Operator actions return
/// `Effect`s; the runtime executes them with [`run`] and feeds the resulting
/// `Completion` back into `TaggingSession::handle`. Keeping the exchange as
/// plain values is what lets the session check, on completion, that the
/// response still belongs to the state that asked for it.

use std::time::Duration;

use tracing::debug;

use crate::api::{
    Backend, BackendConfig, ImageAsset, ImageListing, RenameOutcome, ResolveRequest, VinRecords,
};
use crate::error::ApiError;

use super::data::RecordId;

/// Identifies one mutating exchange. A completion is applied only if its
/// ticket matches the exchange the session is still waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub record: RecordId,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadQueue,
    FetchConfig,
    RefreshLedger { generation: u64 },
    Rename { ticket: Ticket, filename: String, vin: String },
    Delete { ticket: Ticket, filename: String },
    Resolve { ticket: Ticket, request: ResolveRequest },
    FetchImage(ImageAsset),
    /// Wake the session after `delay` to move past `record`
    AdvanceAfter { record: RecordId, delay: Duration },
}

impl Effect {
    /// Rename, delete and resolve change files on the backend
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Effect::Rename { .. } | Effect::Delete { .. } | Effect::Resolve { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum Completion {
    QueueLoaded(Result<ImageListing, ApiError>),
    ConfigLoaded(Result<BackendConfig, ApiError>),
    LedgerRefreshed { generation: u64, result: Result<VinRecords, ApiError> },
    Renamed { ticket: Ticket, result: Result<RenameOutcome, ApiError> },
    Deleted { ticket: Ticket, result: Result<Option<String>, ApiError> },
    Resolved { ticket: Ticket, result: Result<Option<String>, ApiError> },
    ImageLoaded { asset: ImageAsset, result: Result<Vec<u8>, ApiError> },
    AdvanceDue { record: RecordId },
}

/// Execute one effect against the backend
pub async fn run<B: Backend>(backend: B, effect: Effect) -> Completion {
    if effect.is_mutating() {
        debug!("Backend mutation: {:?}", effect);
    }

    match effect {
        Effect::LoadQueue => Completion::QueueLoaded(backend.list_images().await),
        Effect::FetchConfig => Completion::ConfigLoaded(backend.config().await),
        Effect::RefreshLedger { generation } => Completion::LedgerRefreshed {
            generation,
            result: backend.list_vins().await,
        },
        Effect::Rename { ticket, filename, vin } => Completion::Renamed {
            ticket,
            result: backend.rename(filename, vin).await,
        },
        Effect::Delete { ticket, filename } => Completion::Deleted {
            ticket,
            result: backend.delete(filename).await,
        },
        Effect::Resolve { ticket, request } => Completion::Resolved {
            ticket,
            result: backend.resolve_duplicate(request).await,
        },
        Effect::FetchImage(asset) => {
            let result = backend.fetch_image(asset.clone()).await;
            Completion::ImageLoaded { asset, result }
        }
        Effect::AdvanceAfter { record, delay } => {
            tokio::time::sleep(delay).await;
            Completion::AdvanceDue { record }
        }
    }
}
