use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub event_reminders: bool,
    pub new_resources: bool,
    pub community_updates: bool,
    pub news_updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            event_reminders: true,
            new_resources: true,
            community_updates: true,
            news_updates: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub accessibility_needs: Vec<String>,
    #[serde(default)]
    pub notification_preferences: NotificationPreferences,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone_number: None,
            bio: None,
            location: None,
            interests: Vec::new(),
            accessibility_needs: Vec::new(),
            notification_preferences: NotificationPreferences::default(),
        }
    }
}

impl Entity for User {
    fn id(&self) -> Uuid {
        self.id
    }
}
