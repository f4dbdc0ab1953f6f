use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    #[serde(rename = "Workshop")]
    Workshop,
    #[serde(rename = "Conference")]
    Conference,
    #[serde(rename = "Webinar")]
    Webinar,
    #[serde(rename = "Rally")]
    Rally,
    #[serde(rename = "Community Meeting")]
    Meeting,
    #[serde(rename = "Training")]
    Training,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Workshop,
        EventCategory::Conference,
        EventCategory::Webinar,
        EventCategory::Rally,
        EventCategory::Meeting,
        EventCategory::Training,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Workshop => "Workshop",
            EventCategory::Conference => "Conference",
            EventCategory::Webinar => "Webinar",
            EventCategory::Rally => "Rally",
            EventCategory::Meeting => "Community Meeting",
            EventCategory::Training => "Training",
        }
    }

    /// Parse a stored display string. Unknown values fall back to `Workshop`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .unwrap_or(EventCategory::Workshop)
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventDateFilter {
    #[default]
    All,
    Upcoming,
    Past,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(rename = "registrationURL", default)]
    pub registration_url: Option<String>,
    #[serde(rename = "eventURL", default)]
    pub event_url: Option<String>,
    pub category: EventCategory,
    #[serde(default)]
    pub accessibility_notes: Option<String>,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
        location: impl Into<String>,
        category: EventCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            date,
            location: location.into(),
            is_virtual: false,
            registration_url: None,
            event_url: None,
            category,
            accessibility_notes: None,
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date >= now
    }
}

impl Entity for Event {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Collection for Event {
    const FILENAME: &'static str = "Events.json";
    const LABEL: &'static str = "events";
}

/// Filter events by category and date window, sorted soonest first.
pub fn filter_events(
    events: &[Event],
    category: Option<EventCategory>,
    date_filter: EventDateFilter,
    now: DateTime<Utc>,
) -> Vec<Event> {
    let mut filtered: Vec<Event> = events
        .iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .filter(|e| match date_filter {
            EventDateFilter::All => true,
            EventDateFilter::Upcoming => e.is_upcoming(now),
            EventDateFilter::Past => !e.is_upcoming(now),
        })
        .cloned()
        .collect();
    filtered.sort_by(|a, b| a.date.cmp(&b.date));
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_url_fields_keep_uppercase_names() {
        let mut e = Event::new("Town Hall", "Q&A", Utc::now(), "Library", EventCategory::Meeting);
        e.registration_url = Some("https://example.org/register".to_string());
        let value = serde_json::to_value(&e).unwrap();
        assert!(value.get("registrationURL").is_some());
        assert!(value.get("isVirtual").is_some());
        assert_eq!(value["category"], "Community Meeting");
    }

    #[test]
    fn test_filter_upcoming_and_past() {
        let now = Utc::now();
        let events = vec![
            Event::new("Later", "", now + Duration::days(10), "Online", EventCategory::Webinar),
            Event::new("Past", "", now - Duration::days(3), "Hall", EventCategory::Rally),
            Event::new("Soon", "", now + Duration::days(1), "Hall", EventCategory::Webinar),
        ];

        let upcoming = filter_events(&events, None, EventDateFilter::Upcoming, now);
        let titles: Vec<_> = upcoming.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Soon", "Later"]);

        let past = filter_events(&events, None, EventDateFilter::Past, now);
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].title, "Past");

        let rallies = filter_events(&events, Some(EventCategory::Rally), EventDateFilter::All, now);
        assert_eq!(rallies.len(), 1);
    }

    #[test]
    fn test_all_filter_sorts_soonest_first() {
        let now = Utc::now();
        let events = vec![
            Event::new("B", "", now + Duration::days(2), "", EventCategory::Training),
            Event::new("A", "", now - Duration::days(2), "", EventCategory::Training),
        ];
        let all = filter_events(&events, None, EventDateFilter::All, now);
        assert_eq!(all[0].title, "A");
        assert_eq!(all[1].title, "B");
    }
}
