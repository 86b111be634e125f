//! Mock plant store for e2e tests
//!
//! In-memory backend with per-operation failure injection, so tests can
//! exercise the controller's rollback paths without a network. Ids are
//! sequential ("mock-1", "mock-2", ...) rather than UUIDs, which keeps the
//! backend-parity assertions honest about ignoring the id scheme.

use anyhow::Result;
use async_trait::async_trait;
use leaflink::plant::{Plant, PlantDraft};
use leaflink::store::PlantStore;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct MockStore {
    plants: Mutex<Vec<Plant>>,
    next_id: AtomicU64,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The durable side, for asserting what the store actually holds.
    pub fn stored(&self) -> Vec<Plant> {
        self.plants.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlantStore for MockStore {
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Plant>> {
        let plants = self.plants.lock().unwrap();
        Ok(plants
            .iter()
            .filter(|p| user_id.is_none() || p.user_id.as_deref() == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, draft: PlantDraft) -> Result<Plant> {
        if self.fail_create.load(Ordering::SeqCst) {
            anyhow::bail!("mock store rejected create");
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let plant = draft.into_plant(format!("mock-{}", n));
        self.plants.lock().unwrap().insert(0, plant.clone());
        Ok(plant)
    }

    async fn update(&self, plant: &Plant) -> Result<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            anyhow::bail!("mock store rejected update");
        }
        let mut plants = self.plants.lock().unwrap();
        for stored in plants.iter_mut() {
            if stored.id == plant.id {
                *stored = plant.clone();
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("mock store rejected delete");
        }
        self.plants.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
