use serde::{Deserialize, Serialize};

use crate::models::Animal;

/// Active filter and search constraints. Every `None` or blank value means
/// "no constraint"; the rest are combined with AND.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterCriteria {
    pub animal_type: Option<String>,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub neutered: Option<String>,
    pub personality: Option<String>,
    pub search: Option<String>,
}

fn active(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn eq_lower(field: &str, wanted: &str) -> bool {
    field.trim().to_lowercase() == wanted
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.active_keys().is_empty()
    }

    /// Names of the constraints that are currently in effect.
    pub fn active_keys(&self) -> Vec<&'static str> {
        let fields: [(&'static str, &Option<String>); 9] = [
            ("type", &self.animal_type),
            ("breed", &self.breed),
            ("age", &self.age),
            ("gender", &self.gender),
            ("size", &self.size),
            ("location", &self.location),
            ("neutered", &self.neutered),
            ("personality", &self.personality),
            ("search", &self.search),
        ];
        fields
            .into_iter()
            .filter(|(_, v)| active(v).is_some())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn matches(&self, animal: &Animal) -> bool {
        if let Some(kind) = active(&self.animal_type) {
            if !eq_lower(&animal.kind, &kind) {
                return false;
            }
        }

        if let Some(breed) = active(&self.breed) {
            let field = animal.breed.to_lowercase();
            let ok = if breed == "mixed" {
                field.contains("mixed") || field.contains("mutt")
            } else {
                field.contains(&breed)
            };
            if !ok {
                return false;
            }
        }

        if let Some(age) = active(&self.age) {
            if !eq_lower(&animal.age_category, &age) {
                return false;
            }
        }

        if let Some(gender) = active(&self.gender) {
            if !eq_lower(&animal.gender, &gender) {
                return false;
            }
        }

        if let Some(size) = active(&self.size) {
            if !eq_lower(&animal.size, &size) {
                return false;
            }
        }

        if let Some(location) = active(&self.location) {
            if !eq_lower(&animal.location, &location) {
                return false;
            }
        }

        if let Some(neutered) = active(&self.neutered) {
            let actual = if animal.neutered { "yes" } else { "no" };
            if actual != neutered {
                return false;
            }
        }

        if let Some(trait_) = active(&self.personality) {
            if !animal.personality.iter().any(|p| eq_lower(p, &trait_)) {
                return false;
            }
        }

        if let Some(term) = active(&self.search) {
            if !animal.searchable_text().contains(&term) {
                return false;
            }
        }

        true
    }
}
