use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{
    AssetSource, Backend, BackendConfig, ImageAsset, ImageListing, RenameOutcome,
    RenameResponse, ResolveRequest, StatusResponse, VinRecords,
};
use crate::error::ApiError;

const USER_AGENT: &str = concat!("vin-tagger/", env!("CARGO_PKG_VERSION"));

/// reqwest client for the tagging backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("Invalid backend URL {}: {}", base_url, e)))?;

        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "Backend URL cannot be a base: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Backend URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of an image asset, including display mode and cache-busting token
    pub fn asset_url(&self, asset: &ImageAsset) -> Result<Url, ApiError> {
        let mut url = match asset.source {
            AssetSource::Raw(_) => self.endpoint(&["image", asset.filename.as_str()])?,
            AssetSource::Processed => self.endpoint(&["processed", asset.filename.as_str()])?,
        };

        {
            let mut query = url.query_pairs_mut();
            if let AssetSource::Raw(mode) = asset.source {
                query.append_pair("mode", mode.as_param());
            }
            query.append_pair("t", &asset.token.to_string());
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

impl Backend for HttpBackend {
    async fn list_images(&self) -> Result<ImageListing, ApiError> {
        self.get_json(&["api", "images"]).await
    }

    async fn config(&self) -> Result<BackendConfig, ApiError> {
        self.get_json(&["api", "config"]).await
    }

    async fn list_vins(&self) -> Result<VinRecords, ApiError> {
        self.get_json(&["api", "vins"]).await
    }

    async fn rename(&self, filename: String, vin: String) -> Result<RenameOutcome, ApiError> {
        let body = serde_json::json!({ "filename": filename, "vin": vin });
        let response: RenameResponse = self.post_json(&["api", "rename"], &body).await?;
        response.into_outcome()
    }

    async fn resolve_duplicate(&self, request: ResolveRequest) -> Result<Option<String>, ApiError> {
        let response: StatusResponse = self
            .post_json(&["api", "resolve-duplicate"], &request)
            .await?;
        response.into_result()
    }

    async fn delete(&self, filename: String) -> Result<Option<String>, ApiError> {
        let body = serde_json::json!({ "filename": filename });
        let response: StatusResponse = self.post_json(&["api", "delete"], &body).await?;
        response.into_result()
    }

    async fn fetch_image(&self, asset: ImageAsset) -> Result<Vec<u8>, ApiError> {
        let url = self.asset_url(&asset)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
