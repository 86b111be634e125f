//! Watering-schedule evaluation.
//!
//! Pure functions from a plant record and a caller-supplied "now" to the
//! three-way watering status. Calendar-day comparison wins over raw day
//! arithmetic: a plant whose due date falls anywhere on today's date is
//! DueToday even when time-of-day truncation says zero or negative days.

use crate::clock;
use crate::plant::Plant;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterState {
    /// Due date is on an earlier calendar day than now.
    Overdue,
    /// Due date falls on today's calendar day.
    DueToday,
    /// Due date is on a later calendar day.
    Upcoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterStatus {
    pub due_date: DateTime<Utc>,
    /// Whole calendar days until the due date; negative when overdue.
    pub days_until: i64,
    pub state: WaterState,
}

impl WaterStatus {
    /// Short human label, e.g. "3 days overdue", "Water today", "In 5 days".
    pub fn label(&self) -> String {
        match self.state {
            WaterState::Overdue => {
                let days = -self.days_until;
                if days == 1 {
                    "1 day overdue".to_string()
                } else {
                    format!("{} days overdue", days)
                }
            }
            WaterState::DueToday => "Water today".to_string(),
            WaterState::Upcoming => {
                if self.days_until == 1 {
                    "In 1 day".to_string()
                } else {
                    format!("In {} days", self.days_until)
                }
            }
        }
    }
}

pub fn evaluate(plant: &Plant, now: DateTime<Utc>) -> WaterStatus {
    let due_date = clock::add_days(plant.last_watered_date, plant.water_frequency_days);
    let days_until = clock::days_between(due_date, now);

    let state = if clock::is_today(due_date, now) {
        WaterState::DueToday
    } else if clock::is_before(due_date, now) {
        WaterState::Overdue
    } else {
        WaterState::Upcoming
    };

    WaterStatus {
        due_date,
        days_until,
        state,
    }
}

pub fn is_thirsty(plant: &Plant, now: DateTime<Utc>) -> bool {
    matches!(
        evaluate(plant, now).state,
        WaterState::Overdue | WaterState::DueToday
    )
}

pub fn is_healthy(plant: &Plant, now: DateTime<Utc>) -> bool {
    evaluate(plant, now).state == WaterState::Upcoming
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Thirsty,
    Healthy,
}

/// Plants matching the filter, in their original relative order.
pub fn filter_plants<'a>(
    plants: &'a [Plant],
    filter: Filter,
    now: DateTime<Utc>,
) -> Vec<&'a Plant> {
    plants
        .iter()
        .filter(|p| match filter {
            Filter::All => true,
            Filter::Thirsty => is_thirsty(p, now),
            Filter::Healthy => is_healthy(p, now),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GardenStats {
    pub total: usize,
    pub thirsty: usize,
}

pub fn stats(plants: &[Plant], now: DateTime<Utc>) -> GardenStats {
    GardenStats {
        total: plants.len(),
        thirsty: plants.iter().filter(|p| is_thirsty(p, now)).count(),
    }
}
