//! Wire models exchanged with the adoption backend, and the normalisation
//! applied to records before they are listed or rendered.

pub mod donation;

use serde::{Deserialize, Deserializer, Serialize};

pub use donation::{format_time_ago, Donation, DonationMessage, DonationRequest};

const DOG_PLACEHOLDER: &str = "https://images.unsplash.com/photo-1552053831-71594a27632d?ixlib=rb-4.0.3&auto=format&fit=crop&w=600&q=80";
const CAT_PLACEHOLDER: &str = "https://images.unsplash.com/photo-1514888286974-6d03bdeacba8?ixlib=rb-4.0.3&auto=format&fit=crop&w=600&q=80";
const PET_PLACEHOLDER: &str = "https://images.unsplash.com/photo-1548767797-d8c844163c4c?ixlib=rb-4.0.3&auto=format&fit=crop&w=600&q=80";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

// Ids arrive as Mongo object ids from the backend and as integers from older fixtures.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn deserialize_nullable_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_nullable_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn deserialize_nullable_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A listed animal. Missing wire fields deserialize to empty values and are
/// filled in by [`Animal::normalized`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub name: String,
    #[serde(
        rename = "type",
        alias = "species",
        default,
        deserialize_with = "deserialize_nullable_string"
    )]
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub breed: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub age: String,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub age_category: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub gender: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub size: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub location: String,
    #[serde(
        default,
        alias = "spayedNeutered",
        deserialize_with = "deserialize_nullable_bool"
    )]
    pub neutered: bool,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub status: String,
    #[serde(
        default,
        alias = "imageUrl",
        deserialize_with = "deserialize_nullable_string"
    )]
    pub image: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub story: String,
    #[serde(
        default,
        alias = "traits",
        deserialize_with = "deserialize_nullable_list"
    )]
    pub personality: Vec<String>,
}

impl Animal {
    /// Fills defaults for missing optional fields; never fails.
    pub fn normalized(mut self) -> Self {
        self.kind = normalize_kind(&self.kind);
        self.gender = normalize_gender(&self.gender);
        if self.image.trim().is_empty() {
            self.image = placeholder_image(&self.kind).to_string();
        }
        if self.breed.trim().is_empty() {
            self.breed = "Mixed Breed".to_string();
        }
        if self.age.trim().is_empty() {
            self.age = "Unknown".to_string();
        }
        if self.location.trim().is_empty() {
            self.location = "Unknown".to_string();
        }
        self.personality.retain(|p| !p.trim().is_empty());
        self
    }

    pub fn status(&self) -> AnimalStatus {
        AnimalStatus::from_status(&self.status)
    }

    pub fn is_dog(&self) -> bool {
        self.kind.eq_ignore_ascii_case("dog")
    }

    pub fn is_cat(&self) -> bool {
        self.kind.eq_ignore_ascii_case("cat")
    }

    /// "Dog · Beagle" style label used on cards.
    pub fn breed_label(&self) -> String {
        let kind = if self.is_dog() {
            "Dog"
        } else if self.is_cat() {
            "Cat"
        } else {
            "Pet"
        };
        if self.breed.trim().is_empty() {
            kind.to_string()
        } else {
            format!("{kind} · {}", self.breed)
        }
    }

    /// Lower-cased concatenation of every field free-text search looks at.
    pub fn searchable_text(&self) -> String {
        let personality = self.personality.join(" ");
        [
            self.name.as_str(),
            self.breed.as_str(),
            self.kind.as_str(),
            self.location.as_str(),
            personality.as_str(),
            self.story.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

pub fn placeholder_image(kind: &str) -> &'static str {
    let lower = kind.to_lowercase();
    if lower.contains("dog") {
        DOG_PLACEHOLDER
    } else if lower.contains("cat") {
        CAT_PLACEHOLDER
    } else {
        PET_PLACEHOLDER
    }
}

pub fn normalize_gender(gender: &str) -> String {
    let trimmed = gender.trim();
    if trimmed.is_empty() {
        return "Unknown".to_string();
    }
    match trimmed.to_lowercase().as_str() {
        "male" | "m" => "Male".to_string(),
        "female" | "f" => "Female".to_string(),
        _ => trimmed.to_string(),
    }
}

pub fn normalize_kind(kind: &str) -> String {
    let lower = kind.trim().to_lowercase();
    if lower.is_empty() {
        return "other".to_string();
    }
    if lower.contains("dog") || lower == "canine" {
        return "dog".to_string();
    }
    if lower.contains("cat") || lower == "feline" {
        return "cat".to_string();
    }
    lower
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimalStatus {
    Available,
    Reserved,
    Adopted,
    Pending,
}

impl AnimalStatus {
    /// Unknown or missing statuses are treated as available.
    pub fn from_status(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "RESERVED" => Self::Reserved,
            "ADOPTED" => Self::Adopted,
            "PENDING" => Self::Pending,
            _ => Self::Available,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available for Adoption",
            Self::Reserved => "Reserved",
            Self::Adopted => "Adopted",
            Self::Pending => "Pending Review",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Available => "status-available",
            Self::Reserved | Self::Pending => "status-reserved",
            Self::Adopted => "status-adopted",
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Adopted => "ADOPTED",
            Self::Pending => "PENDING",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, rename = "isVolunteer", alias = "volunteer")]
    pub is_volunteer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volunteer_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_date: Option<String>,
}

fn default_role() -> String {
    "USER".to_string()
}

impl User {
    pub fn display_name(&self) -> &str {
        let present = |s: &&str| !s.trim().is_empty();
        self.full_name
            .as_deref()
            .filter(present)
            .or_else(|| self.name.as_deref().filter(present))
            .unwrap_or("My Account")
    }

    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("ADMIN")
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Acknowledgement bodies such as `{"message": "..."}`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub experience: String,
    pub availability: String,
    pub user_id: Option<String>,
    pub application_date: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnimalUpdateResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub animal: Option<Animal>,
}

/// Field-wise edit applied by the admin update flow; `None` keeps the
/// current value.
#[derive(Clone, Debug, Default)]
pub struct AnimalPatch {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub neutered: Option<bool>,
    pub status: Option<AnimalStatus>,
    pub image: Option<String>,
    pub story: Option<String>,
    pub personality: Option<Vec<String>>,
}

impl AnimalPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.breed.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.size.is_none()
            && self.location.is_none()
            && self.neutered.is_none()
            && self.status.is_none()
            && self.image.is_none()
            && self.story.is_none()
            && self.personality.is_none()
    }

    pub fn apply(&self, animal: &mut Animal) {
        let set = |target: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *target = v.clone();
            }
        };
        set(&mut animal.name, &self.name);
        set(&mut animal.kind, &self.kind);
        set(&mut animal.breed, &self.breed);
        set(&mut animal.age, &self.age);
        set(&mut animal.gender, &self.gender);
        set(&mut animal.size, &self.size);
        set(&mut animal.location, &self.location);
        set(&mut animal.image, &self.image);
        set(&mut animal.story, &self.story);
        if let Some(neutered) = self.neutered {
            animal.neutered = neutered;
        }
        if let Some(status) = self.status {
            animal.status = status.as_wire().to_string();
        }
        if let Some(personality) = self.personality.as_ref() {
            animal.personality = personality.clone();
        }
    }
}
