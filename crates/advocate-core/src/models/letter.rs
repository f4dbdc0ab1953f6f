use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

/// Key of the placeholder that defaults to today's date.
pub const DATE_KEY: &str = "Date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterCategory {
    #[serde(rename = "Legislator")]
    Legislator,
    #[serde(rename = "Employer")]
    Employer,
    #[serde(rename = "Service Provider")]
    ServiceProvider,
    #[serde(rename = "School/University")]
    School,
    #[serde(rename = "Accommodation Request")]
    Accommodation,
    #[serde(rename = "Complaint")]
    Complaint,
}

impl LetterCategory {
    pub const ALL: [LetterCategory; 6] = [
        LetterCategory::Legislator,
        LetterCategory::Employer,
        LetterCategory::ServiceProvider,
        LetterCategory::School,
        LetterCategory::Accommodation,
        LetterCategory::Complaint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterCategory::Legislator => "Legislator",
            LetterCategory::Employer => "Employer",
            LetterCategory::ServiceProvider => "Service Provider",
            LetterCategory::School => "School/University",
            LetterCategory::Accommodation => "Accommodation Request",
            LetterCategory::Complaint => "Complaint",
        }
    }
}

impl std::fmt::Display for LetterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `[key]` slot in a template's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub id: Uuid,
    pub key: String,
    pub label: String,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Pre-filled value, used when the caller supplies none.
    #[serde(default)]
    pub value: String,
}

fn default_required() -> bool {
    true
}

impl Placeholder {
    pub fn new(key: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            label: label.into(),
            required,
            value: String::new(),
        }
    }

    pub fn token(&self) -> String {
        format!("[{}]", self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterTemplate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: LetterCategory,
    pub template_text: String,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
}

impl LetterTemplate {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: LetterCategory,
        template_text: impl Into<String>,
        placeholders: Vec<Placeholder>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            category,
            template_text: template_text.into(),
            placeholders,
        }
    }

    /// Value for `placeholder`: the caller's entry, else its pre-filled value.
    fn value_of<'a>(placeholder: &'a Placeholder, values: &'a HashMap<String, String>) -> &'a str {
        values
            .get(&placeholder.key)
            .map(String::as_str)
            .unwrap_or(placeholder.value.as_str())
    }

    /// Labels of required placeholders that are still blank.
    pub fn missing_required(&self, values: &HashMap<String, String>) -> Vec<&str> {
        self.placeholders
            .iter()
            .filter(|p| p.required && Self::value_of(p, values).trim().is_empty())
            .map(|p| p.label.as_str())
            .collect()
    }

    pub fn can_generate(&self, values: &HashMap<String, String>) -> bool {
        self.missing_required(values).is_empty()
    }

    /// Fill every `[key]` with its value. Blank placeholders become empty,
    /// except `[Date]`, which falls back to `today` in long form.
    pub fn generate(&self, values: &HashMap<String, String>, today: NaiveDate) -> String {
        let today = today.format("%B %-d, %Y").to_string();
        let mut letter = self.template_text.clone();
        for placeholder in &self.placeholders {
            let value = Self::value_of(placeholder, values);
            let value = if placeholder.key == DATE_KEY && value.trim().is_empty() {
                today.as_str()
            } else {
                value
            };
            letter = letter.replace(&placeholder.token(), value);
        }
        letter.replace(&format!("[{}]", DATE_KEY), &today)
    }
}

impl Entity for LetterTemplate {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Built-in templates offered before any are downloaded.
pub fn sample_templates() -> Vec<LetterTemplate> {
    vec![
        LetterTemplate::new(
            "Accommodation Request - Workplace",
            "Request reasonable accommodations from your employer",
            LetterCategory::Employer,
            WORKPLACE_ACCOMMODATION,
            vec![
                Placeholder::new("Your Name", "Your Name", true),
                Placeholder::new("Your Address", "Your Address", true),
                Placeholder::new("City, State ZIP", "City, State, ZIP Code", true),
                Placeholder::new(DATE_KEY, "Date", true),
                Placeholder::new("Employer Name", "Employer/Human Resources Name", true),
                Placeholder::new("Employer Address", "Employer Address", false),
                Placeholder::new("Your Position", "Your Position", true),
                Placeholder::new("Company Name", "Company Name", true),
                Placeholder::new("Describe Accommodation", "Describe Your Accommodation Request", true),
            ],
        ),
        LetterTemplate::new(
            "Contact Your Legislator",
            "Write to your elected representative about disability rights",
            LetterCategory::Legislator,
            LEGISLATOR,
            vec![
                Placeholder::new("Your Name", "Your Name", true),
                Placeholder::new("Your Address", "Your Address", true),
                Placeholder::new("City, State ZIP", "City, State, ZIP Code", true),
                Placeholder::new(DATE_KEY, "Date", true),
                Placeholder::new("Legislator Name", "Legislator Name", true),
                Placeholder::new("Office Address", "Legislator Office Address", false),
                Placeholder::new("Title", "Title (Representative/Senator)", true),
                Placeholder::new("Issue/Topic", "Issue or Topic", true),
                Placeholder::new("Describe your concern", "Describe Your Concern", true),
                Placeholder::new("Specific Action or Bill", "Specific Action or Bill Number", false),
            ],
        ),
        LetterTemplate::new(
            "Service Provider Accommodation",
            "Request accommodations from service providers",
            LetterCategory::ServiceProvider,
            SERVICE_PROVIDER,
            vec![
                Placeholder::new("Your Name", "Your Name", true),
                Placeholder::new("Your Address", "Your Address", false),
                Placeholder::new("City, State ZIP", "City, State, ZIP Code", false),
                Placeholder::new(DATE_KEY, "Date", true),
                Placeholder::new("Service Provider Name", "Service Provider Name", true),
                Placeholder::new("Service Provider Address", "Service Provider Address", false),
                Placeholder::new("Contact Person", "Contact Person Name", false),
                Placeholder::new("Service/Location", "Service or Location", true),
                Placeholder::new("Describe Accommodations", "Describe Required Accommodations", true),
                Placeholder::new("Your Phone/Email", "Your Phone or Email", true),
            ],
        ),
    ]
}

const WORKPLACE_ACCOMMODATION: &str = "\
[Your Name]
[Your Address]
[City, State ZIP]
[Date]

[Employer Name]
[Employer Address]
[City, State ZIP]

Dear [Employer Name],

I am writing to request a reasonable accommodation under the Americans with Disabilities Act (ADA) for my position as [Your Position] at [Company Name].

I have a disability that requires the following accommodation(s): [Describe Accommodation]

This accommodation will enable me to perform the essential functions of my job effectively. I am happy to discuss alternative accommodations or provide additional medical documentation if needed.

I would appreciate the opportunity to meet and discuss this request at your earliest convenience.

Thank you for your consideration.

Sincerely,
[Your Name]
";

const LEGISLATOR: &str = "\
[Your Name]
[Your Address]
[City, State ZIP]
[Date]

The Honorable [Legislator Name]
[Office Address]

Dear [Title] [Legislator Name],

I am writing as a constituent and a person with a disability to express my concerns about [Issue/Topic].

[Describe your concern]

I urge you to support legislation that protects and expands the rights of people with disabilities. Specifically, I would like you to consider [Specific Action or Bill].

Thank you for your time and consideration. I look forward to your response.

Sincerely,
[Your Name]
";

const SERVICE_PROVIDER: &str = "\
[Your Name]
[Your Address]
[City, State ZIP]
[Date]

[Service Provider Name]
[Service Provider Address]

Dear [Contact Person],

I am writing to request accommodations for my disability when using your services at [Service/Location].

I require the following accommodations: [Describe Accommodations]

These accommodations are necessary for me to access your services on an equal basis with others. Under the Americans with Disabilities Act, you are required to provide reasonable accommodations unless doing so would cause undue hardship.

Please contact me at [Your Phone/Email] to confirm these accommodations can be provided.

Sincerely,
[Your Name]
";
