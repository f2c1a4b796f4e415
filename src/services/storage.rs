//! Object storage service implementation
//!
//! This service handles the remote object store that holds event posters and
//! profile images: HTTP client setup, uploads, download-URL resolution with
//! Redis caching, deletion, and key derivation from logical names.

use std::time::Duration;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, debug};
use crate::config::settings::Settings;
use crate::services::redis::RedisService;
use crate::utils::errors::{GatherlyError, StorageError, Result};
use crate::utils::helpers::sanitize_filename;
use crate::utils::logging::log_storage_operation;

/// Listing response returned by the storage API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageListResponse {
    pub objects: Vec<StorageObject>,
}

/// A single stored object entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageObject {
    pub key: String,
    pub size: u64,
}

/// Object storage service for poster and profile images
#[derive(Clone)]
#[derive(Debug)]
pub struct StorageService {
    client: Client,
    redis_service: RedisService,
    settings: Settings,
}

impl StorageService {
    /// Create a new StorageService instance
    pub fn new(redis_service: RedisService, settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.storage.timeout_seconds))
            .user_agent("Gatherly-Bot/1.0")
            .build()
            .map_err(GatherlyError::Http)?;

        Ok(Self {
            client,
            redis_service,
            settings,
        })
    }

    /// Storage key for an event poster, derived from the event name
    pub fn poster_key(event_name: &str) -> String {
        format!("event_posters/event_posters_{}.jpg", sanitize_filename(event_name))
    }

    /// Storage key for a user profile image
    pub fn profile_image_key(user_id: i64) -> String {
        format!("profile_images/profile_{}.jpg", user_id)
    }

    /// Upload raw image bytes, overwriting any existing object with the key
    pub async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        debug!(key = %key, size = bytes.len(), "Uploading object");

        let url = self.object_url(key);
        let response = self.client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            log_storage_operation("upload", key, false);
            warn!(key = %key, status = %response.status(), "Object upload rejected");
            return Err(StorageError::RequestFailed(
                format!("upload of {} returned {}", key, response.status())
            ).into());
        }

        // A fresh upload invalidates any cached download URL
        let _ = self.redis_service.delete(&Self::url_cache_key(key)).await;

        log_storage_operation("upload", key, true);
        info!(key = %key, "Object uploaded successfully");
        Ok(url)
    }

    /// Resolve a download URL for a stored object.
    ///
    /// Resolved URLs are cached in Redis so repeated list renders do not
    /// re-probe the store for every row.
    pub async fn download_url(&self, key: &str) -> Result<String> {
        let cache_key = Self::url_cache_key(key);

        match self.redis_service.get::<String>(&cache_key).await {
            Ok(Some(url)) => {
                debug!(key = %key, "Download URL served from cache");
                return Ok(url);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "URL cache lookup failed, probing store");
            }
        }

        let url = self.object_url(key);
        let response = self.client
            .head(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        match response.status() {
            StatusCode::OK => {
                if let Err(e) = self.redis_service
                    .set(&cache_key, &url, Some(self.settings.storage.url_cache_seconds))
                    .await
                {
                    warn!(key = %key, error = %e, "Failed to cache download URL");
                }
                Ok(url)
            }
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(key.to_string()).into()),
            status => Err(StorageError::RequestFailed(
                format!("probe of {} returned {}", key, status)
            ).into()),
        }
    }

    /// Resolve a download URL, falling back to the configured placeholder
    /// image when the object is missing or the store is unreachable
    pub async fn download_url_or_placeholder(&self, key: &str) -> String {
        match self.download_url(key).await {
            Ok(url) => url,
            Err(e) => {
                debug!(key = %key, error = %e, "Falling back to placeholder image");
                self.settings.storage.placeholder_url.clone()
            }
        }
    }

    /// Delete a stored object
    pub async fn delete(&self, key: &str) -> Result<()> {
        debug!(key = %key, "Deleting object");

        let url = self.object_url(key);
        let response = self.client
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        match response.status() {
            status if status.is_success() => {
                let _ = self.redis_service.delete(&Self::url_cache_key(key)).await;
                log_storage_operation("delete", key, true);
                info!(key = %key, "Object deleted successfully");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(key.to_string()).into()),
            status => {
                log_storage_operation("delete", key, false);
                Err(StorageError::RequestFailed(
                    format!("delete of {} returned {}", key, status)
                ).into())
            }
        }
    }

    /// List stored objects under a key prefix (admin image browser)
    pub async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>> {
        let url = format!(
            "{}/{}?prefix={}",
            self.settings.storage.base_url.trim_end_matches('/'),
            self.settings.storage.bucket,
            urlencoding::encode(prefix)
        );

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            return Err(StorageError::RequestFailed(
                format!("listing {} returned {}", prefix, response.status())
            ).into());
        }

        let listing: StorageListResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        Ok(listing.objects)
    }

    /// Public URL of an object, key segments are percent-encoded
    fn object_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}/{}/{}",
            self.settings.storage.base_url.trim_end_matches('/'),
            self.settings.storage.bucket,
            encoded.join("/")
        )
    }

    fn url_cache_key(key: &str) -> String {
        format!("storage:url:{}", key)
    }

    fn map_request_error(&self, error: reqwest::Error) -> GatherlyError {
        if error.is_timeout() {
            StorageError::Timeout.into()
        } else if error.is_connect() {
            StorageError::ServiceUnavailable.into()
        } else {
            GatherlyError::Http(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> StorageService {
        let mut settings = Settings::default();
        settings.storage.base_url = "https://store.test".to_string();
        settings.storage.bucket = "media".to_string();
        let redis = RedisService::new(settings.clone()).expect("redis client");
        StorageService::new(redis, settings).expect("storage service")
    }

    #[test]
    fn test_poster_key_sanitizes_event_name() {
        assert_eq!(
            StorageService::poster_key("Summer Dance 2024!"),
            "event_posters/event_posters_Summer_Dance_2024_.jpg"
        );
        assert_eq!(
            StorageService::poster_key("plain"),
            "event_posters/event_posters_plain.jpg"
        );
    }

    #[test]
    fn test_profile_image_key() {
        assert_eq!(StorageService::profile_image_key(42), "profile_images/profile_42.jpg");
    }

    #[test]
    fn test_object_url_encodes_segments() {
        let service = test_service();
        assert_eq!(
            service.object_url("event_posters/a b.jpg"),
            "https://store.test/media/event_posters/a%20b.jpg"
        );
    }

    #[test]
    fn test_placeholder_fallback_when_store_unreachable() {
        let mut settings = Settings::default();
        settings.storage.base_url = "http://127.0.0.1:9".to_string();
        settings.storage.placeholder_url = "https://placeholder.test/event.jpg".to_string();
        settings.storage.timeout_seconds = 1;
        let redis = RedisService::new(settings.clone()).expect("redis client");
        let service = StorageService::new(redis, settings).expect("storage service");

        let url = tokio_test::block_on(service.download_url_or_placeholder("event_posters/missing.jpg"));
        assert_eq!(url, "https://placeholder.test/event.jpg");
    }
}
