use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored client record. `id` and `created_at` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub pronouns: String,
    pub over_18: bool,
    pub preferred_contact: String,
    pub phone_number: i64,
    pub created_at: DateTime<Utc>,
}

/// Body accepted by `POST /clients`. Missing fields take their zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewClient {
    pub name: String,
    pub pronouns: String,
    pub over_18: bool,
    pub preferred_contact: String,
    pub phone_number: i64,
}

/// Body accepted by `PUT /clients/{id}`. Only the fields present are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub pronouns: Option<String>,
    pub over_18: Option<bool>,
    pub preferred_contact: Option<String>,
    pub phone_number: Option<i64>,
}

impl Client {
    /// Build a fresh record with a new id, stamped with the current UTC time.
    pub fn create(new: NewClient) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            pronouns: new.pronouns,
            over_18: new.over_18,
            preferred_contact: new.preferred_contact,
            phone_number: new.phone_number,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(pronouns) = patch.pronouns {
            self.pronouns = pronouns;
        }
        if let Some(over_18) = patch.over_18 {
            self.over_18 = over_18;
        }
        if let Some(contact) = patch.preferred_contact {
            self.preferred_contact = contact;
        }
        if let Some(phone) = patch.phone_number {
            self.phone_number = phone;
        }
    }
}
