use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::models::{Entity, Event, EventCategory, NotificationPreferences, Resource, ResourceCategory, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn sql(&self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        }
    }
}

/// Sortable resource fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSort {
    DateAdded,
    Title,
}

/// Sortable event fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSort {
    Date,
    Title,
}

/// Sortable user fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Name,
}

/// A model that maps to one table in the structured store.
pub trait Record: Entity + Sized {
    type Sort: Copy;

    const TABLE: &'static str;
    /// Column list in the order `from_row` reads them.
    const COLUMNS: &'static str;

    fn sort_column(sort: Self::Sort) -> &'static str;

    /// Insert, or overwrite every field of the row with the same id.
    fn upsert(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn select_sql(sort: Self::Sort, order: Order) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {} {}",
            Self::COLUMNS,
            Self::TABLE,
            Self::sort_column(sort),
            order.sql()
        )
    }
}

pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    url TEXT,
    tags TEXT NOT NULL,
    date_added TEXT NOT NULL,
    is_favorite INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_resources_favorite ON resources(is_favorite);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    date TEXT NOT NULL,
    location TEXT NOT NULL,
    is_virtual INTEGER NOT NULL,
    registration_url TEXT,
    event_url TEXT,
    category TEXT NOT NULL,
    accessibility_notes TEXT
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone_number TEXT,
    bio TEXT,
    location TEXT,
    interests TEXT NOT NULL,
    accessibility_needs TEXT NOT NULL,
    event_reminders INTEGER NOT NULL,
    new_resources INTEGER NOT NULL,
    community_updates INTEGER NOT NULL,
    news_updates INTEGER NOT NULL
);
"#;

// ===== Column Conversions =====

pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn list_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Fixed-width UTC timestamps so text order matches time order.
fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode_list(values: &[String]) -> String {
    // Serializing a slice of strings cannot fail
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

// ===== Resource =====

impl Record for Resource {
    type Sort = ResourceSort;

    const TABLE: &'static str = "resources";
    const COLUMNS: &'static str = "id, title, description, category, url, tags, date_added";

    fn sort_column(sort: ResourceSort) -> &'static str {
        match sort {
            ResourceSort::DateAdded => "date_added",
            ResourceSort::Title => "title",
        }
    }

    fn upsert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        // is_favorite survives upserts
        conn.execute(
            "INSERT INTO resources (id, title, description, category, url, tags, date_added)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                url = excluded.url,
                tags = excluded.tags,
                date_added = excluded.date_added",
            params![
                self.id.to_string(),
                self.title,
                self.description,
                self.category.as_str(),
                self.url,
                encode_list(&self.tags),
                encode_time(&self.date_added),
            ],
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category: String = row.get(3)?;
        Ok(Resource {
            id: uuid_column(row, 0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: ResourceCategory::from_label(&category),
            url: row.get(4)?,
            tags: list_column(row, 5)?,
            date_added: time_column(row, 6)?,
        })
    }
}

// ===== Event =====

impl Record for Event {
    type Sort = EventSort;

    const TABLE: &'static str = "events";
    const COLUMNS: &'static str = "id, title, description, date, location, is_virtual, \
        registration_url, event_url, category, accessibility_notes";

    fn sort_column(sort: EventSort) -> &'static str {
        match sort {
            EventSort::Date => "date",
            EventSort::Title => "title",
        }
    }

    fn upsert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO events (id, title, description, date, location, is_virtual,
                                 registration_url, event_url, category, accessibility_notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                date = excluded.date,
                location = excluded.location,
                is_virtual = excluded.is_virtual,
                registration_url = excluded.registration_url,
                event_url = excluded.event_url,
                category = excluded.category,
                accessibility_notes = excluded.accessibility_notes",
            params![
                self.id.to_string(),
                self.title,
                self.description,
                encode_time(&self.date),
                self.location,
                self.is_virtual,
                self.registration_url,
                self.event_url,
                self.category.as_str(),
                self.accessibility_notes,
            ],
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category: String = row.get(8)?;
        Ok(Event {
            id: uuid_column(row, 0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            date: time_column(row, 3)?,
            location: row.get(4)?,
            is_virtual: row.get(5)?,
            registration_url: row.get(6)?,
            event_url: row.get(7)?,
            category: EventCategory::from_label(&category),
            accessibility_notes: row.get(9)?,
        })
    }
}

// ===== User =====

impl Record for User {
    type Sort = UserSort;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, name, email, phone_number, bio, location, interests, \
        accessibility_needs, event_reminders, new_resources, community_updates, news_updates";

    fn sort_column(sort: UserSort) -> &'static str {
        match sort {
            UserSort::Name => "name",
        }
    }

    fn upsert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let prefs = &self.notification_preferences;
        conn.execute(
            "INSERT INTO users (id, name, email, phone_number, bio, location, interests,
                                accessibility_needs, event_reminders, new_resources,
                                community_updates, news_updates)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone_number = excluded.phone_number,
                bio = excluded.bio,
                location = excluded.location,
                interests = excluded.interests,
                accessibility_needs = excluded.accessibility_needs,
                event_reminders = excluded.event_reminders,
                new_resources = excluded.new_resources,
                community_updates = excluded.community_updates,
                news_updates = excluded.news_updates",
            params![
                self.id.to_string(),
                self.name,
                self.email,
                self.phone_number,
                self.bio,
                self.location,
                encode_list(&self.interests),
                encode_list(&self.accessibility_needs),
                prefs.event_reminders,
                prefs.new_resources,
                prefs.community_updates,
                prefs.news_updates,
            ],
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: uuid_column(row, 0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone_number: row.get(3)?,
            bio: row.get(4)?,
            location: row.get(5)?,
            interests: list_column(row, 6)?,
            accessibility_needs: list_column(row, 7)?,
            notification_preferences: NotificationPreferences {
                event_reminders: row.get(8)?,
                new_resources: row.get(9)?,
                community_updates: row.get(10)?,
                news_updates: row.get(11)?,
            },
        })
    }
}
