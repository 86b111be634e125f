//! Remote plant store over the Supabase REST (PostgREST) API.
//!
//! One network call per operation against `{url}/rest/v1/plants`. The
//! table's columns match the plant record's serde shape, so rows serialize
//! straight through. Reads filter by `userId` first, then order by the
//! server-side `created_at` column, newest first.
//!
//! `list` fails open: a backend error logs and yields an empty garden
//! rather than raising. Mutations surface the backend's error message so
//! the controller can show it and roll back.

use super::{PlantStore, new_plant_id};
use crate::logging;
use crate::plant::{Plant, PlantDraft};
use anyhow::Result;
use async_trait::async_trait;

pub struct RemotePlantStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RemotePlantStore {
    pub fn new(base_url: String, anon_key: String, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            access_token,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/plants", self.base_url)
    }

    fn list_url(&self, user_id: Option<&str>) -> String {
        match user_id {
            Some(user) => format!(
                "{}?select=*&userId=eq.{}&order=created_at.desc",
                self.table_url(),
                urlencoding::encode(user)
            ),
            None => format!("{}?select=*&order=created_at.desc", self.table_url()),
        }
    }

    fn row_url(&self, id: &str) -> String {
        format!("{}?id=eq.{}", self.table_url(), urlencoding::encode(id))
    }

    /// Bearer token: the signed-in user's JWT when present, else the anon key.
    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }
}

/// Extract a readable message from a PostgREST error body.
fn backend_message(status: reqwest::StatusCode, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string);

    match message {
        Some(msg) => msg,
        None if body.trim().is_empty() => format!("request failed with status {}", status),
        None => format!("request failed with status {}: {}", status, body.trim()),
    }
}

#[async_trait]
impl PlantStore for RemotePlantStore {
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Plant>> {
        let result: Result<Vec<Plant>> = async {
            let resp = self
                .request(reqwest::Method::GET, &self.list_url(user_id))
                .send()
                .await?;
            let status = resp.status();
            let body = resp.text().await?;
            if !status.is_success() {
                anyhow::bail!("{}", backend_message(status, &body));
            }
            Ok(serde_json::from_str(&body)?)
        }
        .await;

        // Fail open: an unreachable or failing backend reads as an empty
        // garden, never as a hard error.
        match result {
            Ok(plants) => Ok(plants),
            Err(e) => {
                logging::error(&format!("Remote list failed: {}", e));
                Ok(Vec::new())
            }
        }
    }

    async fn create(&self, draft: PlantDraft) -> Result<Plant> {
        let plant = draft.into_plant(new_plant_id());
        let resp = self
            .request(reqwest::Method::POST, &self.table_url())
            .header("Prefer", "return=representation")
            .json(&plant)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("{}", backend_message(status, &body));
        }

        // PostgREST returns the inserted rows as an array
        let mut rows: Vec<Plant> = serde_json::from_str(&body)?;
        rows.pop()
            .ok_or_else(|| anyhow::anyhow!("Insert returned no row"))
    }

    async fn update(&self, plant: &Plant) -> Result<()> {
        let resp = self
            .request(reqwest::Method::PATCH, &self.row_url(&plant.id))
            .json(plant)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("{}", backend_message(status, &body));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let resp = self
            .request(reqwest::Method::DELETE, &self.row_url(id))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("{}", backend_message(status, &body));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
