//! "Plant added" emails via the EmailJS REST API.
//!
//! Fire-and-forget: the controller spawns these off the add path, and every
//! failure ends up in the log, never in front of the user. Unconfigured
//! credentials skip the send entirely.

use crate::config::EmailConfig;
use crate::logging;
use crate::plant::Plant;

const API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Clone)]
pub struct EmailNotifier {
    client: reqwest::Client,
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Send the "new plant added" email to the garden's owner. Never fails;
    /// problems are logged and swallowed.
    pub async fn plant_added(&self, plant: &Plant, recipient: &str) {
        if !self.config.is_configured() {
            logging::info("Email notification skipped: EmailJS not configured");
            return;
        }
        // Demo owners have no mailbox
        if !recipient.contains('@') {
            logging::debug(&format!(
                "Email notification skipped: '{}' is not an address",
                recipient
            ));
            return;
        }

        let body = serde_json::json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": template_params(plant, recipient),
        });

        let result = self.client.post(API_URL).json(&body).send().await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                logging::info(&format!("Plant-added email sent to {}", recipient));
            }
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                logging::error(&format!(
                    "Plant-added email rejected ({}): {}",
                    status,
                    text.trim()
                ));
            }
            Err(e) => {
                logging::error(&format!("Plant-added email failed: {}", e));
            }
        }
    }
}

fn template_params(plant: &Plant, recipient: &str) -> serde_json::Value {
    let to_name = recipient.split('@').next().unwrap_or(recipient);
    serde_json::json!({
        "to_email": recipient,
        "email": recipient,
        "reply_to": recipient,
        "to_name": to_name,
        "plant_name": plant.display_name(),
        "plant_species": plant.species,
        "water_freq": plant.water_frequency_days,
        "message": format!(
            "Your new plant {} ({}) has been added to your LeafLink garden. \
             We will remind you to water it every {} days. Happy growing!",
            plant.display_name(),
            plant.species,
            plant.water_frequency_days
        ),
    })
}
