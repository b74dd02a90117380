//! Runtime configuration for clients.
//!
//! Everything is read from environment variables through a lookup function so
//! parsing can be exercised without touching the process environment. A REST
//! store and R2 image storage are used when configured; otherwise notes and
//! images live under a local data directory.

mod backend;

use std::env;
use std::path::PathBuf;

use crate::repository::{CallPolicy, DEFAULT_COLLECTION};
use crate::storage::R2Config;
use crate::store::RestConfig;
use crate::util::{is_http_url, normalize_text_option, trim_base_url};
use crate::{Error, Result};

pub use backend::{ConfiguredBlobStore, ConfiguredDocumentStore, ConfiguredRepository};

const ENV_STORE_URL: &str = "STICKIES_STORE_URL";
const ENV_STORE_TOKEN: &str = "STICKIES_STORE_TOKEN";
const ENV_COLLECTION: &str = "STICKIES_COLLECTION";
const ENV_DATA_DIR: &str = "STICKIES_DATA_DIR";
const ENV_MAX_ATTEMPTS: &str = "STICKIES_MAX_ATTEMPTS";

const APP_DIR_NAME: &str = "stickies";
const IMAGES_DIR_NAME: &str = "images";

/// Where note documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Rest(RestConfig),
    /// JSON files under this directory.
    Local(PathBuf),
}

/// Where uploaded images are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    R2(R2Config),
    /// Files under this directory, referenced by `file://` URLs.
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub blobs: BlobBackend,
    pub collection: String,
    pub policy: CallPolicy,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match optional_trimmed(&lookup, ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir().ok_or_else(|| {
                Error::validation(format!(
                    "Could not resolve a data directory; set {ENV_DATA_DIR}"
                ))
            })?,
        };

        let store = match optional_trimmed(&lookup, ENV_STORE_URL) {
            Some(url) if !is_http_url(&url) => {
                return Err(Error::validation(format!(
                    "{ENV_STORE_URL} must start with http:// or https://"
                )));
            }
            Some(url) => StoreBackend::Rest(
                RestConfig::new(trim_base_url(&url))
                    .with_bearer_token(optional_trimmed(&lookup, ENV_STORE_TOKEN)),
            ),
            None => StoreBackend::Local(data_dir.clone()),
        };

        let blobs = match R2Config::from_lookup(&lookup)? {
            Some(config) => BlobBackend::R2(config),
            None => BlobBackend::Local(data_dir.join(IMAGES_DIR_NAME)),
        };

        let collection = optional_trimmed(&lookup, ENV_COLLECTION)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let policy = match optional_trimmed(&lookup, ENV_MAX_ATTEMPTS) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .and_then(|attempts| CallPolicy::new(attempts).ok())
                .ok_or_else(|| {
                    Error::validation(format!("{ENV_MAX_ATTEMPTS} must be an integer >= 1"))
                })?,
            None => CallPolicy::default(),
        };

        Ok(Self {
            store,
            blobs,
            collection,
            policy,
            data_dir,
        })
    }

    /// Whether notes go to a remote store rather than the local data directory.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self.store, StoreBackend::Rest(_))
    }
}

/// Platform data directory for the app, e.g. `~/.local/share/stickies`.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_to_local_backends_under_data_dir() {
        let config = parse(&[(ENV_DATA_DIR, "/tmp/stickies-test")]).unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Local(PathBuf::from("/tmp/stickies-test"))
        );
        assert_eq!(
            config.blobs,
            BlobBackend::Local(PathBuf::from("/tmp/stickies-test/images"))
        );
        assert_eq!(config.collection, "notes");
        assert_eq!(config.policy, CallPolicy::default());
        assert!(!config.is_remote());
    }

    #[test]
    fn store_url_selects_rest_backend_with_token() {
        let config = parse(&[
            (ENV_DATA_DIR, "/tmp/s"),
            (ENV_STORE_URL, " https://api.example.com/v1/ "),
            (ENV_STORE_TOKEN, "tok"),
            (ENV_COLLECTION, "stickies"),
        ])
        .unwrap();

        let StoreBackend::Rest(rest) = &config.store else {
            panic!("expected REST backend, got {:?}", config.store);
        };
        assert_eq!(rest.base_url, "https://api.example.com/v1");
        assert_eq!(rest.bearer_token.as_deref(), Some("tok"));
        assert_eq!(config.collection, "stickies");
        assert!(config.is_remote());
    }

    #[test]
    fn non_http_store_url_is_rejected() {
        let error = parse(&[(ENV_DATA_DIR, "/tmp/s"), (ENV_STORE_URL, "ftp://x")]).unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
    }

    #[test]
    fn max_attempts_must_be_positive_integer() {
        for raw in ["0", "-1", "many"] {
            assert!(
                parse(&[(ENV_DATA_DIR, "/tmp/s"), (ENV_MAX_ATTEMPTS, raw)]).is_err(),
                "{raw} should be rejected"
            );
        }
        let config = parse(&[(ENV_DATA_DIR, "/tmp/s"), (ENV_MAX_ATTEMPTS, "3")]).unwrap();
        assert_eq!(config.policy.max_attempts(), 3);
    }

    #[test]
    fn complete_r2_settings_select_r2_backend() {
        let config = parse(&[
            (ENV_DATA_DIR, "/tmp/s"),
            ("R2_ACCOUNT_ID", "acct"),
            ("R2_BUCKET", "notes"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
            ("R2_PUBLIC_BASE_URL", "https://cdn.example.com"),
        ])
        .unwrap();
        assert!(matches!(config.blobs, BlobBackend::R2(_)));
    }

    #[test]
    fn partial_r2_settings_are_an_error() {
        let error = parse(&[(ENV_DATA_DIR, "/tmp/s"), ("R2_BUCKET", "notes")]).unwrap_err();
        assert!(error.to_string().contains("R2_ACCOUNT_ID"));
    }

    #[cfg(unix)]
    #[test]
    fn from_env_tolerates_unrelated_non_unicode_variables() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        env::set_var(
            "STICKIES_TEST_NON_UNICODE",
            OsStr::from_bytes(&[0x66, 0x6f, 0xff]),
        );
        let _ = AppConfig::from_env();
        env::remove_var("STICKIES_TEST_NON_UNICODE");
    }
}
