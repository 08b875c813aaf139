/// In-memory backend for session tests: scripted responses, recorded calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    Backend, BackendConfig, ImageAsset, ImageListing, RenameOutcome, RenameReceipt,
    ResolveRequest, VinRecords,
};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListImages,
    Config,
    ListVins,
    Rename { filename: String, vin: String },
    Resolve(ResolveRequest),
    Delete { filename: String },
    FetchImage(ImageAsset),
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(self, Call::Rename { .. } | Call::Resolve(_) | Call::Delete { .. })
    }
}

#[derive(Debug, Default)]
struct Script {
    calls: Vec<Call>,
    images: ImageListing,
    vins: VinRecords,
    vins_error: Option<ApiError>,
    rename: VecDeque<Result<RenameOutcome, ApiError>>,
    resolve: VecDeque<Result<Option<String>, ApiError>>,
    delete: VecDeque<Result<Option<String>, ApiError>>,
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    pub fn with_images(names: &[&str]) -> Self {
        let backend = Self::default();
        backend.lock().images = ImageListing {
            images: names.iter().map(|s| s.to_string()).collect(),
            processed_count: 0,
        };
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("mock backend lock poisoned")
    }

    pub fn set_vins(&self, vins: VinRecords) {
        self.lock().vins = vins;
    }

    pub fn fail_vins(&self, err: ApiError) {
        self.lock().vins_error = Some(err);
    }

    pub fn push_rename(&self, result: Result<RenameOutcome, ApiError>) {
        self.lock().rename.push_back(result);
    }

    pub fn push_resolve(&self, result: Result<Option<String>, ApiError>) {
        self.lock().resolve.push_back(result);
    }

    pub fn push_delete(&self, result: Result<Option<String>, ApiError>) {
        self.lock().delete.push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }
}

impl Backend for MockBackend {
    async fn list_images(&self) -> Result<ImageListing, ApiError> {
        self.record(Call::ListImages);
        Ok(self.lock().images.clone())
    }

    async fn config(&self) -> Result<BackendConfig, ApiError> {
        self.record(Call::Config);
        Ok(BackendConfig {
            processed_dir: "/tmp/processed".to_string(),
        })
    }

    async fn list_vins(&self) -> Result<VinRecords, ApiError> {
        self.record(Call::ListVins);
        let script = self.lock();
        match &script.vins_error {
            Some(err) => Err(err.clone()),
            None => Ok(script.vins.clone()),
        }
    }

    async fn rename(&self, filename: String, vin: String) -> Result<RenameOutcome, ApiError> {
        self.record(Call::Rename { filename, vin });
        self.lock()
            .rename
            .pop_front()
            .unwrap_or_else(|| Ok(RenameOutcome::Renamed(RenameReceipt::default())))
    }

    async fn resolve_duplicate(&self, request: ResolveRequest) -> Result<Option<String>, ApiError> {
        self.record(Call::Resolve(request));
        self.lock().resolve.pop_front().unwrap_or(Ok(None))
    }

    async fn delete(&self, filename: String) -> Result<Option<String>, ApiError> {
        self.record(Call::Delete { filename });
        self.lock().delete.pop_front().unwrap_or(Ok(None))
    }

    async fn fetch_image(&self, asset: ImageAsset) -> Result<Vec<u8>, ApiError> {
        self.record(Call::FetchImage(asset));
        Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
    }
}
