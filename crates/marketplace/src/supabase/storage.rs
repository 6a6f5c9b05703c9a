//! Object storage REST client.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;
use url::Url;

use super::{SupabaseError, api_error, endpoint};
use crate::config::SupabaseConfig;

/// An object written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Path inside the bucket.
    pub path: String,
    /// Publicly readable URL.
    pub public_url: String,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

/// Client for one storage bucket.
///
/// Only constructed when a service-role key is configured.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: Url,
    bucket: String,
    service_key: SecretString,
}

impl StorageClient {
    /// Create a storage client, or `None` when no service-role key is set.
    #[must_use]
    pub fn from_config(http: reqwest::Client, config: &SupabaseConfig) -> Option<Self> {
        let service_key = config.service_role_key.clone()?;
        Some(Self {
            http,
            base_url: config.url.clone(),
            bucket: config.storage_bucket.clone(),
            service_key,
        })
    }

    /// Public URL for an object path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL cannot carry a path.
    pub fn public_url(&self, path: &str) -> Result<String, SupabaseError> {
        let url = endpoint(
            &self.base_url,
            &["storage", "v1", "object", "public", &self.bucket, path],
        )?;
        Ok(url.into())
    }

    /// Upload bytes to `path`, replacing an existing object when `upsert` is set.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if storage rejects the upload (for example
    /// a duplicate path without `upsert`).
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<StoredObject, SupabaseError> {
        let url = endpoint(&self.base_url, &["storage", "v1", "object", &self.bucket, path])?;
        let key = self.service_key.expose_secret();

        let response = self
            .http
            .post(url)
            .header("apikey", key)
            .bearer_auth(key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(StoredObject {
            path: path.to_string(),
            public_url: self.public_url(path)?,
        })
    }

    /// Remove an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage call fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &str) -> Result<(), SupabaseError> {
        let url = endpoint(&self.base_url, &["storage", "v1", "object", &self.bucket])?;
        let key = self.service_key.expose_secret();

        let response = self
            .http
            .delete(url)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&RemoveRequest { prefixes: [path] })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(service_key: Option<&str>) -> SupabaseConfig {
        SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: "anon".to_string(),
            service_role_key: service_key.map(SecretString::from),
            storage_bucket: "marketplace".to_string(),
        }
    }

    #[test]
    fn test_storage_requires_service_key() {
        assert!(StorageClient::from_config(reqwest::Client::new(), &config(None)).is_none());
    }

    #[test]
    fn test_public_url() {
        let client =
            StorageClient::from_config(reqwest::Client::new(), &config(Some("service"))).unwrap();
        assert_eq!(
            client.public_url("products/p1/photo.png").unwrap(),
            "https://abc.supabase.co/storage/v1/object/public/marketplace/products/p1/photo.png"
        );
    }
}
