use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    #[serde(rename = "Legal Rights")]
    Legal,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Employment")]
    Employment,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Assistive Technology")]
    Technology,
    #[serde(rename = "Community Support")]
    Community,
    #[serde(rename = "Government Services")]
    Government,
    #[serde(rename = "Advocacy Organizations")]
    Advocacy,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 8] = [
        ResourceCategory::Legal,
        ResourceCategory::Education,
        ResourceCategory::Employment,
        ResourceCategory::Healthcare,
        ResourceCategory::Technology,
        ResourceCategory::Community,
        ResourceCategory::Government,
        ResourceCategory::Advocacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Legal => "Legal Rights",
            ResourceCategory::Education => "Education",
            ResourceCategory::Employment => "Employment",
            ResourceCategory::Healthcare => "Healthcare",
            ResourceCategory::Technology => "Assistive Technology",
            ResourceCategory::Community => "Community Support",
            ResourceCategory::Government => "Government Services",
            ResourceCategory::Advocacy => "Advocacy Organizations",
        }
    }

    /// Parse a stored display string. Unknown values fall back to `Legal`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .unwrap_or(ResourceCategory::Legal)
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date_added: DateTime<Utc>,
}

impl Resource {
    pub fn new(title: impl Into<String>, description: impl Into<String>, category: ResourceCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            category,
            url: None,
            tags: Vec::new(),
            date_added: Utc::now(),
        }
    }

    /// Case-insensitive match against title, description and tags.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

impl Entity for Resource {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Collection for Resource {
    const FILENAME: &'static str = "Resources.json";
    const LABEL: &'static str = "resources";
}

/// Filter resources by search text (trimmed, ignored when blank) and category.
pub fn filter_resources(
    resources: &[Resource],
    search: &str,
    category: Option<ResourceCategory>,
) -> Vec<Resource> {
    let search = search.trim();
    resources
        .iter()
        .filter(|r| search.is_empty() || r.matches(search))
        .filter(|r| category.map_or(true, |c| r.category == c))
        .cloned()
        .collect()
}
