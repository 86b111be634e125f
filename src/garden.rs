//! The garden controller.
//!
//! Owns the in-memory plant collection that the UI layer renders; the
//! store is the durable side. Mutations keep the two consistent with a
//! three-phase optimistic protocol: snapshot, apply tentatively, then
//! either keep the new state (store confirmed) or restore the snapshot and
//! post an error (store rejected). The collection never shows a mutation
//! the store refused.
//!
//! All mutating methods take `&mut self`, so within one process the borrow
//! checker serializes them; two operations can only interleave across
//! processes, where the store's last-write-wins contract applies.

use crate::logging;
use crate::notify::{Notice, Notifications};
use crate::notify_email::EmailNotifier;
use crate::plant::{Plant, PlantDraft};
use crate::schedule::{self, Filter, GardenStats};
use crate::session::DEMO_USER;
use crate::store::PlantStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Inverse of a tentative mutation, applied if the store rejects it.
type Undo = Box<dyn FnOnce(&mut Vec<Plant>) + Send>;

pub struct GardenController {
    store: Arc<dyn PlantStore>,
    mailer: EmailNotifier,
    plants: Vec<Plant>,
    identity: Option<String>,
    loading: bool,
    notices: Notifications,
}

impl GardenController {
    pub fn new(store: Arc<dyn PlantStore>, mailer: EmailNotifier) -> Self {
        Self {
            store,
            mailer,
            plants: Vec::new(),
            identity: None,
            loading: false,
            notices: Notifications::new(),
        }
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_notice(&self) -> Option<Notice> {
        self.notices.current()
    }

    /// Notices posted so far (success + error).
    #[cfg(test)]
    pub fn notices_posted(&self) -> u64 {
        self.notices.posted()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> GardenStats {
        schedule::stats(&self.plants, now)
    }

    pub fn filtered(&self, filter: Filter, now: DateTime<Utc>) -> Vec<&Plant> {
        schedule::filter_plants(&self.plants, filter, now)
    }

    /// Replace the collection wholesale from the store. A failed load reads
    /// as an empty garden; the cause goes to the log, not the user.
    pub async fn load(&mut self, identity: Option<&str>) {
        self.identity = identity.map(str::to_string);
        self.loading = true;
        match self.store.list(identity).await {
            Ok(plants) => self.plants = plants,
            Err(e) => {
                logging::error(&format!("Failed to load plants: {}", e));
                self.plants = Vec::new();
            }
        }
        self.loading = false;
    }

    /// Add a plant. Not optimistic: the record appears only after the store
    /// confirms it, at the head of the collection.
    pub async fn add(&mut self, mut draft: PlantDraft) {
        if let Err(e) = draft.validate() {
            self.notices.error(format!("Failed to add plant: {}", e));
            return;
        }

        let owner = self
            .identity
            .clone()
            .unwrap_or_else(|| DEMO_USER.to_string());
        draft.user_id = Some(owner.clone());

        match self.store.create(draft).await {
            Ok(plant) => {
                self.plants.insert(0, plant.clone());
                self.notices.success("Plant added to your garden!");

                // Best-effort email, off the critical path
                let mailer = self.mailer.clone();
                tokio::spawn(async move {
                    mailer.plant_added(&plant, &owner).await;
                });
            }
            Err(e) => {
                self.notices.error(format!("Failed to add plant: {}", e));
            }
        }
    }

    /// Mark a plant watered now. Optimistic: the timestamp moves first and
    /// is restored bit-for-bit if the store rejects the update.
    pub async fn water(&mut self, id: &str, now: DateTime<Utc>) {
        let Some(plant) = self.plants.iter_mut().find(|p| p.id == id) else {
            self.notices.error(format!("No plant with id {}", id));
            return;
        };

        let previous = plant.last_watered_date;
        plant.last_watered_date = now;
        let updated = plant.clone();

        let target = id.to_string();
        let undo: Undo = Box::new(move |plants| {
            if let Some(p) = plants.iter_mut().find(|p| p.id == target) {
                p.last_watered_date = previous;
            }
        });
        self.commit_or_revert(updated, undo).await;
    }

    /// General edit, same optimistic protocol as watering.
    pub async fn update_plant(&mut self, updated: Plant) {
        let Some(slot) = self.plants.iter_mut().find(|p| p.id == updated.id) else {
            self.notices.error(format!("No plant with id {}", updated.id));
            return;
        };

        let previous = slot.clone();
        *slot = updated.clone();

        let target = previous.id.clone();
        let undo: Undo = Box::new(move |plants| {
            if let Some(p) = plants.iter_mut().find(|p| p.id == target) {
                *p = previous;
            }
        });
        self.commit_or_revert(updated, undo).await;
    }

    /// Phase three of the optimistic protocol: push the tentative record to
    /// the store, and on rejection run the inverse and surface the cause.
    async fn commit_or_revert(&mut self, updated: Plant, undo: Undo) {
        match self.store.update(&updated).await {
            Ok(()) => {}
            Err(e) => {
                undo(&mut self.plants);
                self.notices.error(format!("Failed to update: {}", e));
            }
        }
    }

    /// Remove a plant. Confirmation is the caller's job; this runs only
    /// after the user said yes. The store goes first, and the in-memory
    /// record is dropped only once the store confirms — a failed delete
    /// leaves the garden untouched.
    pub async fn remove(&mut self, id: &str) {
        match self.store.delete(id).await {
            Ok(()) => {
                self.plants.retain(|p| p.id != id);
                self.notices.success("Plant removed from garden");
            }
            Err(e) => {
                self.notices.error(format!("Failed to delete: {}", e));
            }
        }
    }
}
