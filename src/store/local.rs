//! Local plant store: the whole garden as one JSON array on disk.
//!
//! Every mutation is a read-modify-write of the full collection, written
//! atomically (tmp + rename). New plants are prepended, so file order is
//! creation time descending and `list` needs no sort. A single active
//! writer per file is assumed; the in-process lock only keeps concurrent
//! tasks from interleaving a read-modify-write.

use super::{PlantStore, new_plant_id};
use crate::plant::{Plant, PlantDraft};
use crate::storage;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct LocalPlantStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalPlantStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Vec<Plant>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        storage::read_json(&self.path)
    }

    fn write_all(&self, plants: &[Plant]) -> Result<()> {
        storage::write_json(&self.path, plants)
    }
}

#[async_trait]
impl PlantStore for LocalPlantStore {
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Plant>> {
        let _guard = self.lock.lock().unwrap();
        let plants = self.read_all()?;
        Ok(match user_id {
            Some(user) => plants
                .into_iter()
                .filter(|p| p.user_id.as_deref() == Some(user))
                .collect(),
            None => plants,
        })
    }

    async fn create(&self, draft: PlantDraft) -> Result<Plant> {
        let _guard = self.lock.lock().unwrap();
        let plant = draft.into_plant(new_plant_id());
        let mut plants = self.read_all()?;
        plants.insert(0, plant.clone());
        self.write_all(&plants)?;
        Ok(plant)
    }

    async fn update(&self, plant: &Plant) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut plants = self.read_all()?;
        for stored in plants.iter_mut() {
            if stored.id == plant.id {
                *stored = plant.clone();
            }
        }
        self.write_all(&plants)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut plants = self.read_all()?;
        plants.retain(|p| p.id != id);
        self.write_all(&plants)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store() -> (tempfile::TempDir, LocalPlantStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPlantStore::new(dir.path().join("plants.json"));
        (dir, store)
    }

    fn draft(name: &str, user: Option<&str>) -> PlantDraft {
        PlantDraft {
            name: name.to_string(),
            species: "Pothos".to_string(),
            water_frequency_days: 7,
            last_watered_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            image_url: None,
            light_needs: None,
            notes: None,
            user_id: user.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let (_dir, store) = store();
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_prepends_newest_first() {
        let (_dir, store) = store();
        let first = store.create(draft("first", None)).await.unwrap();
        let second = store.create(draft("second", None)).await.unwrap();
        assert_ne!(first.id, second.id);

        let listed = store.list(None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "second");
        assert_eq!(listed[1].name, "first");
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (_dir, store) = store();
        store.create(draft("a", None)).await.unwrap();
        let mut target = store.create(draft("b", None)).await.unwrap();

        target.last_watered_date = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        target.notes = Some("repotted".to_string());
        store.update(&target).await.unwrap();

        let listed = store.list(None).await.unwrap();
        assert_eq!(listed[0], target);
        assert_eq!(listed[1].name, "a");
    }

    #[tokio::test]
    async fn test_delete_removes_only_target() {
        let (_dir, store) = store();
        let keep = store.create(draft("keep", None)).await.unwrap();
        let gone = store.create(draft("gone", None)).await.unwrap();

        store.delete(&gone.id).await.unwrap();
        let listed = store.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);

        // Deleting an unknown id is a no-op
        store.delete("missing").await.unwrap();
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partition_isolation() {
        let (_dir, store) = store();
        store.create(draft("a1", Some("a@x.io"))).await.unwrap();
        store.create(draft("b1", Some("b@x.io"))).await.unwrap();
        store.create(draft("a2", Some("a@x.io"))).await.unwrap();
        store.create(draft("b2", Some("b@x.io"))).await.unwrap();

        let for_a = store.list(Some("a@x.io")).await.unwrap();
        assert_eq!(for_a.len(), 2);
        assert!(for_a.iter().all(|p| p.user_id.as_deref() == Some("a@x.io")));
        assert_eq!(for_a[0].name, "a2");
        assert_eq!(for_a[1].name, "a1");

        // Unpartitioned (demo) listing sees everything
        assert_eq!(store.list(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_collection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plants.json");

        let created = {
            let store = LocalPlantStore::new(path.clone());
            store.create(draft("persisted", None)).await.unwrap()
        };

        let reopened = LocalPlantStore::new(path);
        let listed = reopened.list(None).await.unwrap();
        assert_eq!(listed, vec![created]);
    }
}
