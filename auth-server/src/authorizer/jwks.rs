use super::VerifyError;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use log::{debug, info, warn};
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::Duration;

/// Key sets kept at once; one per issuer is all the gateway needs
const MAX_KEY_SETS: u64 = 16;

/// Cache of published signing keys, fetched on first use and refreshed when
/// a token names a key the cached set does not contain. Such forced
/// refreshes happen at most once per refresh interval for each key set, so
/// tokens with made-up key ids cannot turn into one download each.
#[derive(Clone)]
pub struct JwksCache {
    cache: MokaCache<String, Arc<JwkSet>>,
    /// Key sets downloaded again because of an unknown key id, until the
    /// refresh interval elapses
    recently_refreshed: MokaCache<String, ()>,
    client: reqwest::Client,
}

impl JwksCache {
    pub fn new(
        ttl_secs: u64,
        timeout_secs: u64,
        refresh_interval_secs: u64,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create JWKS HTTP client: {e}"))?;

        let cache = MokaCache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .max_capacity(MAX_KEY_SETS)
            .build();
        let recently_refreshed = MokaCache::builder()
            .time_to_live(Duration::from_secs(refresh_interval_secs))
            .max_capacity(MAX_KEY_SETS)
            .build();

        Ok(Self {
            cache,
            recently_refreshed,
            client,
        })
    }

    /// Find the key with this id, downloading the set again if the cached
    /// one predates a key rotation.
    pub async fn get_key(&self, jwks_uri: &str, kid: &str) -> Result<Jwk, VerifyError> {
        // Concurrent cold lookups share a single download
        let keys = self
            .cache
            .try_get_with(jwks_uri.to_string(), self.fetch(jwks_uri))
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;
        if let Some(jwk) = keys.find(kid) {
            return Ok(jwk.clone());
        }

        let unknown = || {
            warn!("Token signed with unknown key {}", kid);
            VerifyError::UnknownKey(kid.to_string())
        };

        let claimed = self
            .recently_refreshed
            .entry(jwks_uri.to_string())
            .or_insert(())
            .await
            .is_fresh();
        if !claimed {
            debug!("Key set {} refreshed recently, not fetching for key {}", jwks_uri, kid);
            return Err(unknown());
        }

        debug!("Key {} not in cached key set, refreshing", kid);
        let keys = self.fetch(jwks_uri).await.map_err(VerifyError::KeyFetch)?;
        self.cache.insert(jwks_uri.to_string(), keys.clone()).await;
        keys.find(kid).cloned().ok_or_else(unknown)
    }

    async fn fetch(&self, jwks_uri: &str) -> Result<Arc<JwkSet>, String> {
        debug!("Fetching JWKS from {}", jwks_uri);

        let response = self
            .client
            .get(jwks_uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| format!("invalid key set: {e}"))?;

        info!("Fetched {} signing keys from {}", keys.keys.len(), jwks_uri);
        Ok(Arc::new(keys))
    }
}
