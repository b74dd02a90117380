//! Cloudflare R2 image storage.

use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;
use chrono::Utc;
use uuid::Uuid;

use crate::store::BlobStore;
use crate::util::{is_http_url, normalize_text_option, sanitize_file_name, trim_base_url};
use crate::{Error, Result};

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

const IMAGE_PREFIX: &str = "images";

/// Cloudflare R2 configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Public URL base images are served from.
    pub public_base_url: String,
}

impl std::fmt::Debug for R2Config {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl R2Config {
    /// Parse R2 settings through a variable lookup.
    ///
    /// Returns `Ok(None)` when no R2 variable is set and an error when only
    /// part of the configuration is present. Uploaded images must be
    /// reachable by URL, so the public base URL is required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let read = |key: &str| lookup(key).map(|value| value.trim().to_string());
        let account_id = read(ENV_ACCOUNT_ID);
        let bucket = read(ENV_BUCKET);
        let access_key_id = read(ENV_ACCESS_KEY_ID);
        let secret_access_key = read(ENV_SECRET_ACCESS_KEY);
        let public_base_url = read(ENV_PUBLIC_BASE_URL);

        let any_present = [
            &account_id,
            &bucket,
            &access_key_id,
            &secret_access_key,
            &public_base_url,
        ]
        .iter()
        .any(|value| value.is_some());
        if !any_present {
            return Ok(None);
        }

        let required = [
            (ENV_ACCOUNT_ID, account_id),
            (ENV_BUCKET, bucket),
            (ENV_ACCESS_KEY_ID, access_key_id),
            (ENV_SECRET_ACCESS_KEY, secret_access_key),
            (ENV_PUBLIC_BASE_URL, public_base_url),
        ];
        let missing = required
            .iter()
            .filter(|(_, value)| value.as_ref().map_or(true, String::is_empty))
            .map(|(key, _)| *key)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "R2 configuration is incomplete. Missing: {}",
                missing.join(", ")
            )));
        }

        let [account_id, bucket, access_key_id, secret_access_key, public_base_url] =
            required.map(|(_, value)| value.unwrap_or_default());
        if !is_http_url(&public_base_url) {
            return Err(Error::validation(format!(
                "{ENV_PUBLIC_BASE_URL} must start with http:// or https://"
            )));
        }

        Ok(Some(Self {
            account_id,
            bucket,
            access_key_id,
            secret_access_key,
            public_base_url: trim_base_url(&public_base_url),
        }))
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    /// Public URL an object key is served from.
    #[must_use]
    pub fn public_object_url(&self, object_key: &str) -> String {
        format!("{}/{}", self.public_base_url, object_key.trim_matches('/'))
    }
}

/// R2-backed blob store for note images.
#[derive(Clone, Debug)]
pub struct R2BlobStore {
    config: R2Config,
    client: Client,
}

impl R2BlobStore {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Object key for a freshly uploaded image: `images/{ts}-{uuid}-{name}`.
    #[must_use]
    pub fn build_image_key(file_name: &str) -> String {
        let ts = Utc::now().timestamp_millis();
        let id = Uuid::now_v7();
        format!("{IMAGE_PREFIX}/{ts}-{id}-{}", sanitize_file_name(file_name))
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, error))?;
        Ok(())
    }
}

impl BlobStore for R2BlobStore {
    async fn upload_blob(
        &self,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let object_key = Self::build_image_key(file_name);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()));
        if let Some(content_type) = normalize_text_option(Some(content_type.to_string())) {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|error| {
            storage_error("put_object", &self.config.bucket, Some(&object_key), error)
        })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %object_key,
            bytes = bytes.len(),
            "Uploaded image to R2"
        );
        Ok(self.config.public_object_url(&object_key))
    }
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "stickies-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::Storage(format!("R2 {operation} failed for {target}: {error}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse_from_map(map: &HashMap<&str, &str>) -> Result<Option<R2Config>> {
        R2Config::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    fn full_map() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_ACCOUNT_ID, "account-1"),
            (ENV_BUCKET, "bucket-a"),
            (ENV_ACCESS_KEY_ID, "AKID123"),
            (ENV_SECRET_ACCESS_KEY, "SECRET123"),
            (ENV_PUBLIC_BASE_URL, "https://cdn.example.com/images/"),
        ])
    }

    #[test]
    fn from_lookup_none_returns_none() {
        assert!(parse_from_map(&HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn from_lookup_lists_missing_values() {
        let map = HashMap::from([(ENV_ACCOUNT_ID, "account"), (ENV_BUCKET, "bucket")]);

        match parse_from_map(&map).unwrap_err() {
            Error::Validation(message) => {
                assert!(message.contains(ENV_ACCESS_KEY_ID));
                assert!(message.contains(ENV_SECRET_ACCESS_KEY));
                assert!(message.contains(ENV_PUBLIC_BASE_URL));
                assert!(!message.contains(ENV_BUCKET));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_lookup_normalizes_public_url() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        assert_eq!(config.public_base_url, "https://cdn.example.com/images");
        assert_eq!(
            config.endpoint_url(),
            "https://account-1.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn from_lookup_rejects_non_http_public_url() {
        let mut map = full_map();
        map.insert(ENV_PUBLIC_BASE_URL, "cdn.example.com");

        let error = parse_from_map(&map).unwrap_err();
        assert!(error.to_string().contains(ENV_PUBLIC_BASE_URL));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("SECRET123"));
    }

    #[test]
    fn image_key_is_namespaced_and_sanitized() {
        let key = R2BlobStore::build_image_key("My Photo (1).PNG");
        assert!(key.starts_with("images/"));
        assert!(key.ends_with("-my-photo-1.png"));
    }

    #[test]
    fn public_object_url_joins_key() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        assert_eq!(
            config.public_object_url("/images/a.png"),
            "https://cdn.example.com/images/images/a.png"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires local R2 env vars plus network access"]
    async fn r2_bucket_exists_and_is_reachable() {
        let _ = dotenvy::dotenv();

        let config = R2Config::from_lookup(|key| std::env::var(key).ok())
            .expect("R2 env parsing should not error")
            .expect("R2 config should be present");
        let storage = R2BlobStore::new(config.clone());

        storage.bucket_is_reachable().await.unwrap_or_else(|error| {
            panic!(
                "R2 bucket health check failed for bucket '{}': {error}",
                config.bucket
            )
        });
    }
}
