/// Tagging backend API
///
/// The backend owns the files: it lists the batch, renames (tags) photos,
/// deletes them, arbitrates duplicate VINs and serves image assets.
/// This module holds the wire types and the `Backend` seam; `http.rs`
/// is the reqwest implementation used by the app.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::ApiError;
use crate::state::data::DisplayMode;

pub mod http;

#[cfg(test)]
pub mod mock;

pub use http::HttpBackend;

/// `GET /api/images`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageListing {
    pub images: Vec<String>,
    #[serde(default)]
    pub processed_count: usize,
}

/// `GET /api/config` (display only)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub processed_dir: String,
}

/// `GET /api/vins`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VinRecords {
    #[serde(default)]
    pub vins: Vec<String>,
    #[serde(default)]
    pub matched: Vec<String>,
    #[serde(default)]
    pub pending: Vec<String>,
}

/// Successful rename details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReceipt {
    /// The raw file was renamed too; the queue entry must follow it
    pub raw_file_renamed: bool,
    pub raw_file_new_name: Option<String>,
    pub vin_updated: bool,
    pub message: Option<String>,
}

/// Result of `POST /api/rename` that is not a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed(RenameReceipt),
    /// Another file already carries this VIN
    Duplicate { existing_file: String },
}

/// Raw `POST /api/rename` response body
#[derive(Debug, Deserialize)]
pub struct RenameResponse {
    pub success: bool,
    #[serde(default)]
    pub duplicate: bool,
    pub existing_file: Option<String>,
    #[serde(default)]
    pub raw_file_renamed: bool,
    pub raw_file_new_name: Option<String>,
    #[serde(default)]
    pub vin_updated: bool,
    pub message: Option<String>,
}

impl RenameResponse {
    pub fn into_outcome(self) -> Result<RenameOutcome, ApiError> {
        if self.success {
            return Ok(RenameOutcome::Renamed(RenameReceipt {
                raw_file_renamed: self.raw_file_renamed,
                raw_file_new_name: self.raw_file_new_name,
                vin_updated: self.vin_updated,
                message: self.message,
            }));
        }

        match (self.duplicate, self.existing_file) {
            (true, Some(existing_file)) => Ok(RenameOutcome::Duplicate { existing_file }),
            (true, None) => Err(ApiError::Decode(
                "duplicate response without existing_file".to_string(),
            )),
            (false, _) => Err(ApiError::Backend {
                message: self.message.unwrap_or_else(|| "Unknown error".to_string()),
            }),
        }
    }
}

/// `{success, message?}` body shared by delete and resolve
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl StatusResponse {
    /// Success carries the optional backend message through
    pub fn into_result(self) -> Result<Option<String>, ApiError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ApiError::Backend {
                message: self.message.unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }
}

/// Operator's decision on a duplicate VIN. The backend alone decides what
/// "keep" means on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    KeepExisting,
    KeepNew,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::KeepExisting => "keep-existing",
            Resolution::KeepNew => "keep-new",
        }
    }
}

/// `POST /api/resolve-duplicate` body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolveRequest {
    pub existing_file: String,
    pub new_file: String,
    pub vin: String,
    pub choice: Resolution,
}

/// Where an image asset is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSource {
    /// Unprocessed batch (`/image/<name>?mode=`)
    Raw(DisplayMode),
    /// Already-tagged files (`/processed/<name>`)
    Processed,
}

/// A read-only image fetch. `token` busts HTTP caches so a renamed file
/// never shows a stale picture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageAsset {
    pub source: AssetSource,
    pub filename: String,
    pub token: i64,
}

impl ImageAsset {
    pub fn raw(filename: impl Into<String>, mode: DisplayMode) -> Self {
        Self {
            source: AssetSource::Raw(mode),
            filename: filename.into(),
            token: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn processed(filename: impl Into<String>) -> Self {
        Self {
            source: AssetSource::Processed,
            filename: filename.into(),
            token: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Operations the tagging session consumes.
///
/// Futures are `Send` so the iced runtime can drive them on tokio.
pub trait Backend: Clone + Send + Sync + 'static {
    fn list_images(&self) -> impl Future<Output = Result<ImageListing, ApiError>> + Send;

    fn config(&self) -> impl Future<Output = Result<BackendConfig, ApiError>> + Send;

    fn list_vins(&self) -> impl Future<Output = Result<VinRecords, ApiError>> + Send;

    fn rename(
        &self,
        filename: String,
        vin: String,
    ) -> impl Future<Output = Result<RenameOutcome, ApiError>> + Send;

    fn resolve_duplicate(
        &self,
        request: ResolveRequest,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn delete(&self, filename: String)
        -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn fetch_image(&self, asset: ImageAsset)
        -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename_response(json: &str) -> Result<RenameOutcome, ApiError> {
        serde_json::from_str::<RenameResponse>(json)
            .expect("valid rename json")
            .into_outcome()
    }

    #[test]
    fn test_rename_success() {
        let outcome = rename_response(
            r#"{"success": true, "raw_file_renamed": true, "raw_file_new_name": "DONE_AB12C3_a.jpg", "vin_updated": true}"#,
        );
        assert_eq!(
            outcome,
            Ok(RenameOutcome::Renamed(RenameReceipt {
                raw_file_renamed: true,
                raw_file_new_name: Some("DONE_AB12C3_a.jpg".to_string()),
                vin_updated: true,
                message: None,
            }))
        );
    }

    #[test]
    fn test_rename_duplicate() {
        let outcome = rename_response(
            r#"{"success": false, "duplicate": true, "existing_file": "VIN-B1024-AB12C3.jpg", "message": "VIN AB12C3 already exists"}"#,
        );
        assert_eq!(
            outcome,
            Ok(RenameOutcome::Duplicate {
                existing_file: "VIN-B1024-AB12C3.jpg".to_string()
            })
        );
    }

    #[test]
    fn test_rename_failure_is_backend_error() {
        let outcome = rename_response(r#"{"success": false, "message": "Source file not found: a.jpg"}"#);
        assert_eq!(
            outcome,
            Err(ApiError::Backend {
                message: "Source file not found: a.jpg".to_string()
            })
        );
    }

    #[test]
    fn test_resolution_wire_names() {
        let request = ResolveRequest {
            existing_file: "old.jpg".to_string(),
            new_file: "new.jpg".to_string(),
            vin: "AB12C3".to_string(),
            choice: Resolution::KeepNew,
        };
        let json = serde_json::to_value(&request).expect("serializable");
        assert_eq!(json["choice"], "keep-new");
        assert_eq!(json["existing_file"], "old.jpg");
        assert_eq!(Resolution::KeepExisting.as_str(), "keep-existing");
    }

    #[test]
    fn test_listing_defaults_processed_count() {
        let listing: ImageListing = serde_json::from_str(r#"{"images": ["a.jpg"]}"#).expect("json");
        assert_eq!(listing.processed_count, 0);
    }
}
