//! End-to-end tests for leaflink
//!
//! Drive the garden controller against the real file-backed store and
//! against a mock store with failure injection, without a network or a
//! Supabase project.

mod mock_store;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use leaflink::config::EmailConfig;
use leaflink::garden::GardenController;
use leaflink::notify::NoticeKind;
use leaflink::notify_email::EmailNotifier;
use leaflink::plant::{Plant, PlantDraft};
use leaflink::schedule::{self, WaterState};
use leaflink::store::PlantStore;
use leaflink::store::local::LocalPlantStore;
use mock_store::MockStore;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn mailer() -> EmailNotifier {
    EmailNotifier::new(EmailConfig::default())
}

fn ts(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

fn draft(name: &str, species: &str, every: i64) -> PlantDraft {
    PlantDraft {
        name: name.to_string(),
        species: species.to_string(),
        water_frequency_days: every,
        last_watered_date: ts(2024, 1, 1, 9),
        image_url: None,
        light_needs: None,
        notes: None,
        user_id: None,
    }
}

/// What a record looks like with the backend-assigned id stripped.
fn fingerprint(p: &Plant) -> (String, String, i64, DateTime<Utc>, Option<String>) {
    (
        p.name.clone(),
        p.species.clone(),
        p.water_frequency_days,
        p.last_watered_date,
        p.user_id.clone(),
    )
}

/// Add, water and remove plants through the controller with the garden on
/// disk, then reopen the file and check the durable side kept up.
#[tokio::test]
async fn test_garden_lifecycle_on_local_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plants.json");

    let store = Arc::new(LocalPlantStore::new(path.clone()));
    let mut garden = GardenController::new(store, mailer());
    garden.load(None).await;
    assert!(garden.plants().is_empty());

    garden.add(draft("Figgy", "Fiddle Leaf Fig", 7)).await;
    garden.add(draft("Spidey", "Spider Plant", 10)).await;
    assert_eq!(garden.plants().len(), 2);
    // Newest first
    assert_eq!(garden.plants()[0].name, "Spidey");
    assert_eq!(garden.plants()[1].name, "Figgy");

    // A week on, Figgy is due and Spidey is not
    let now = ts(2024, 1, 8, 15);
    let figgy_id = garden.plants()[1].id.clone();
    assert_eq!(
        schedule::evaluate(&garden.plants()[1], now).state,
        WaterState::DueToday
    );
    assert_eq!(garden.stats(now).thirsty, 1);

    garden.water(&figgy_id, now).await;
    assert_eq!(garden.plants()[1].last_watered_date, now);

    let spidey_id = garden.plants()[0].id.clone();
    garden.remove(&spidey_id).await;
    assert_eq!(garden.plants().len(), 1);
    assert_eq!(
        garden.current_notice().map(|n| n.kind),
        Some(NoticeKind::Success)
    );

    // Fresh process over the same file sees the same garden
    let mut reopened = GardenController::new(Arc::new(LocalPlantStore::new(path)), mailer());
    reopened.load(None).await;
    assert_eq!(reopened.plants().len(), 1);
    assert_eq!(reopened.plants()[0].name, "Figgy");
    assert_eq!(reopened.plants()[0].last_watered_date, now);
    Ok(())
}

/// A rejected update must restore the prior timestamp and surface exactly
/// the backend's message; the durable side never saw the mutation.
#[tokio::test]
async fn test_water_rollback_against_failing_store() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let planted = store.create(draft("Figgy", "Fiddle Leaf Fig", 7)).await?;
    let before = planted.last_watered_date;

    let mut garden = GardenController::new(store.clone(), mailer());
    garden.load(None).await;

    store.fail_update.store(true, Ordering::SeqCst);
    garden.water(&planted.id, ts(2024, 1, 8, 15)).await;

    assert_eq!(garden.plants()[0].last_watered_date, before);
    assert_eq!(store.stored()[0].last_watered_date, before);

    let notice = garden.current_notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.message.contains("mock store rejected update"));
    Ok(())
}

/// A rejected create leaves both sides empty; add is not optimistic.
#[tokio::test]
async fn test_failed_add_never_reaches_the_garden() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let mut garden = GardenController::new(store.clone(), mailer());
    garden.load(None).await;

    store.fail_create.store(true, Ordering::SeqCst);
    garden.add(draft("Ghost", "Monstera", 9)).await;

    assert!(garden.plants().is_empty());
    assert!(store.stored().is_empty());
    assert_eq!(
        garden.current_notice().map(|n| n.kind),
        Some(NoticeKind::Error)
    );
    Ok(())
}

/// The same sequence of store calls lands both backends in the same final
/// state, id-generation scheme aside.
#[tokio::test]
async fn test_backends_agree_on_the_same_call_sequence() -> Result<()> {
    async fn drive(store: &dyn PlantStore) -> Result<Vec<Plant>> {
        let kept = store.create(draft("Figgy", "Fiddle Leaf Fig", 7)).await?;
        let dropped = store.create(draft("Spidey", "Spider Plant", 10)).await?;

        let mut watered = kept.clone();
        watered.last_watered_date = ts(2024, 1, 8, 15);
        store.update(&watered).await?;
        store.delete(&dropped.id).await?;
        store.list(None).await
    }

    let dir = tempfile::tempdir()?;
    let local = LocalPlantStore::new(dir.path().join("plants.json"));
    let mock = MockStore::new();

    let local_final = drive(&local).await?;
    let mock_final = drive(&mock).await?;

    assert_eq!(
        local_final.iter().map(fingerprint).collect::<Vec<_>>(),
        mock_final.iter().map(fingerprint).collect::<Vec<_>>()
    );
    // The id schemes genuinely differ; only the records agree
    assert_ne!(local_final[0].id, mock_final[0].id);
    Ok(())
}

/// Listing one user's garden never leaks another user's plants, however
/// the creates interleave.
#[tokio::test]
async fn test_partition_isolation_across_interleaved_creates() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = LocalPlantStore::new(dir.path().join("plants.json"));

    for (name, owner) in [
        ("a1", "ash@example.com"),
        ("b1", "birch@example.com"),
        ("a2", "ash@example.com"),
        ("b2", "birch@example.com"),
        ("a3", "ash@example.com"),
    ] {
        let mut d = draft(name, "Pothos", 7);
        d.user_id = Some(owner.to_string());
        store.create(d).await?;
    }

    let ash = store.list(Some("ash@example.com")).await?;
    assert_eq!(ash.len(), 3);
    assert!(
        ash.iter()
            .all(|p| p.user_id.as_deref() == Some("ash@example.com"))
    );
    // Newest first within the partition
    assert_eq!(ash[0].name, "a3");
    assert_eq!(ash[2].name, "a1");

    let birch = store.list(Some("birch@example.com")).await?;
    assert_eq!(birch.len(), 2);
    Ok(())
}
