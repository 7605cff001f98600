use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "0-3")]
    Infant,
    #[serde(rename = "4-9")]
    Child,
    #[serde(rename = "10-12")]
    PreTeen,
    #[serde(rename = "13-17")]
    Teen,
    #[serde(rename = "18+")]
    Adult,
}

impl AgeCategory {
    pub const ALL: [AgeCategory; 5] = [
        Self::Infant,
        Self::Child,
        Self::PreTeen,
        Self::Teen,
        Self::Adult,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Infant => "0-3",
            Self::Child => "4-9",
            Self::PreTeen => "10-12",
            Self::Teen => "13-17",
            Self::Adult => "18+",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Infant => "Baby care",
            Self::Child => "Child services",
            Self::PreTeen => "Pre-teen",
            Self::Teen => "Teen support",
            Self::Adult => "Adult services",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Infant => "Baby and toddler care services",
            Self::Child => "Child care and school-age services",
            Self::PreTeen => "Pre-teen services and support",
            Self::Teen => "Teen support services and peer groups",
            Self::Adult => "Adult services and resources",
        }
    }
}

impl std::fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Outcome of one verification run. Only built by the verification flow, so
/// `age_category` always matches `age` and `has_guardian` is set exactly when
/// the age is under 18.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRecord {
    age: u8,
    age_category: AgeCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_guardian: Option<bool>,
}

impl AgeRecord {
    pub(crate) fn new(age: u8, age_category: AgeCategory, has_guardian: Option<bool>) -> Self {
        Self {
            age,
            age_category,
            has_guardian,
        }
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn age_category(&self) -> AgeCategory {
        self.age_category
    }

    pub fn has_guardian(&self) -> Option<bool> {
        self.has_guardian
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            city: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.city.as_deref().unwrap_or("Custom location")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Food,
    Shelter,
    Medical,
    MentalHealth,
    CommunityNgos,
    RetirementHomes,
    Other,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 7] = [
        Self::Food,
        Self::Shelter,
        Self::Medical,
        Self::MentalHealth,
        Self::CommunityNgos,
        Self::RetirementHomes,
        Self::Other,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "FOOD" => Some(Self::Food),
            "SHELTER" => Some(Self::Shelter),
            "MEDICAL" => Some(Self::Medical),
            "MENTAL_HEALTH" => Some(Self::MentalHealth),
            "COMMUNITY_NGOS" => Some(Self::CommunityNgos),
            "RETIREMENT_HOMES" => Some(Self::RetirementHomes),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Shelter => "SHELTER",
            Self::Medical => "MEDICAL",
            Self::MentalHealth => "MENTAL_HEALTH",
            Self::CommunityNgos => "COMMUNITY_NGOS",
            Self::RetirementHomes => "RETIREMENT_HOMES",
            Self::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "Food & Nutrition",
            Self::Shelter => "Shelter & Housing",
            Self::Medical => "Medical Help",
            Self::MentalHealth => "Mental Health Support",
            Self::CommunityNgos => "Community NGOs",
            Self::RetirementHomes => "Retirement Homes",
            Self::Other => "Other Essential Services",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceAvailability {
    Available,
    Limited,
    Unknown,
}

impl ServiceAvailability {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "AVAILABLE" => Self::Available,
            "LIMITED" => Self::Limited,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Limited => "LIMITED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub category: ServiceCategory,
    pub distance_km: f64,
    pub availability: ServiceAvailability,
    pub address: String,
    #[serde(default, alias = "contact", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTranscriptEntry {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatTranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }
}
