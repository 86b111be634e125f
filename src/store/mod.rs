//! Plant persistence.
//!
//! One trait, two backends: a remote Supabase-backed store and a local
//! JSON-file store. Which one runs is decided once at startup from the
//! config and fixed for the process lifetime; everything above this module
//! talks to `dyn PlantStore` and cannot tell the difference.

pub mod local;
pub mod remote;

use crate::config::Config;
use crate::plant::{Plant, PlantDraft};
use crate::storage;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage contract shared by both backends.
///
/// `list` returns plants newest-first (creation order). All operations are
/// partitioned by `user_id` when one is supplied; local demo mode passes
/// `None` and sees the whole file.
#[async_trait]
pub trait PlantStore: Send + Sync {
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Plant>>;

    /// Insert a new plant. The id is assigned here (not by the caller) so
    /// the caller never holds a record the store hasn't seen.
    async fn create(&self, draft: PlantDraft) -> Result<Plant>;

    /// Full-record replace keyed by id.
    async fn update(&self, plant: &Plant) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Backend label for the startup banner ("remote" / "local").
    fn name(&self) -> &'static str;
}

/// Freshly generated plant id. Both backends use the same scheme so records
/// are portable between them.
pub fn new_plant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Select and construct the backend from config, once at startup.
///
/// `access_token` is the signed-in user's token, used by the remote backend
/// in place of the anon key when present.
pub fn open(config: &Config, access_token: Option<String>) -> Result<Arc<dyn PlantStore>> {
    if config.supabase.is_configured() {
        let url = config.supabase.url.clone().unwrap_or_default();
        let anon_key = config.supabase.anon_key.clone().unwrap_or_default();
        Ok(Arc::new(remote::RemotePlantStore::new(
            url,
            anon_key,
            access_token,
        )))
    } else {
        let path = storage::leaflink_dir()?.join("plants.json");
        Ok(Arc::new(local::LocalPlantStore::new(path)))
    }
}
