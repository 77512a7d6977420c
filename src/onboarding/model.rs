//! Onboarding form data models.
//!
//! Form data is grouped by domain (identity, body measurements, training
//! preferences) instead of one open-ended key-value bag. Every field is
//! optional: the same type doubles as a partial update, where `None` means
//! "leave as is" and `Some` overwrites.

use serde::{Deserialize, Serialize};

/// Self-reported gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Fields that make up the user's identity record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// ISO-8601 calendar date, e.g. `1990-04-12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

/// Physical measurements, imperial units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weight_lbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight_lbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_in: Option<f64>,
}

/// Goals, fitness status, and training preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vo2_max: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_days: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_device: Option<String>,
}

/// Everything collected during onboarding, or a partial update to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingData {
    #[serde(default)]
    pub identity: IdentityFields,
    #[serde(default)]
    pub body: BodyMeasurements,
    #[serde(default)]
    pub preferences: TrainingPreferences,
}

/// Overwrite `dst` with every `Some` in `src`.
macro_rules! merge_fields {
    ($dst:expr, $src:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(v) = $src.$field {
                $dst.$field = Some(v);
            }
        )*
    };
}

impl IdentityFields {
    fn merge(&mut self, patch: IdentityFields) {
        merge_fields!(self, patch, [first_name, last_name, gender, birth_date]);
    }
}

impl BodyMeasurements {
    fn merge(&mut self, patch: BodyMeasurements) {
        merge_fields!(self, patch, [current_weight_lbs, target_weight_lbs, height_in]);
    }
}

impl TrainingPreferences {
    fn merge(&mut self, patch: TrainingPreferences) {
        merge_fields!(
            self,
            patch,
            [
                primary_goal,
                fitness_level,
                vo2_max,
                race_time,
                medical_conditions,
                workout_types,
                training_days,
                selected_device,
            ]
        );
    }
}

impl OnboardingData {
    /// Shallow merge: fields set in `patch` overwrite, unset fields are kept.
    /// Nothing is ever removed.
    pub fn merge(&mut self, patch: OnboardingData) {
        self.identity.merge(patch.identity);
        self.body.merge(patch.body);
        self.preferences.merge(patch.preferences);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    // ── Patch builders ──────────────────────────────────────────────

    pub fn name(first: &str, last: &str) -> Self {
        Self {
            identity: IdentityFields {
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn gender(gender: Gender) -> Self {
        Self {
            identity: IdentityFields {
                gender: Some(gender),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn birth_date(date: &str) -> Self {
        Self {
            identity: IdentityFields {
                birth_date: Some(date.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn current_weight(lbs: f64) -> Self {
        Self {
            body: BodyMeasurements {
                current_weight_lbs: Some(lbs),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn primary_goal(goal: &str) -> Self {
        Self {
            preferences: TrainingPreferences {
                primary_goal: Some(goal.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn medical_conditions<I, S>(conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preferences: TrainingPreferences {
                medical_conditions: Some(conditions.into_iter().map(Into::into).collect()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_set_fields_only() {
        let mut data = OnboardingData::name("Ada", "Lovelace");
        data.merge(OnboardingData::gender(Gender::Female));
        data.merge(OnboardingData::name("Grace", "Lovelace"));

        assert_eq!(data.identity.first_name.as_deref(), Some("Grace"));
        assert_eq!(data.identity.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(data.identity.gender, Some(Gender::Female));
    }

    #[test]
    fn merge_never_removes() {
        let mut data = OnboardingData::current_weight(180.0);
        data.merge(OnboardingData::default());
        assert_eq!(data.body.current_weight_lbs, Some(180.0));
    }

    #[test]
    fn merge_across_domains() {
        let mut data = OnboardingData::default();
        assert!(data.is_empty());
        data.merge(OnboardingData::primary_goal("lose_weight"));
        data.merge(OnboardingData::medical_conditions(["asthma"]));
        data.merge(OnboardingData::birth_date("1990-01-01"));

        assert!(!data.is_empty());
        assert_eq!(data.preferences.primary_goal.as_deref(), Some("lose_weight"));
        assert_eq!(
            data.preferences.medical_conditions,
            Some(vec!["asthma".to_string()])
        );
        assert_eq!(data.identity.birth_date.as_deref(), Some("1990-01-01"));
    }

    #[test]
    fn partial_json_deserializes() {
        let json = r#"{"identity": {"first_name": "A"}}"#;
        let patch: OnboardingData = serde_json::from_str(json).unwrap();
        assert_eq!(patch.identity.first_name.as_deref(), Some("A"));
        assert!(patch.body.current_weight_lbs.is_none());

        // Unset fields are omitted on the way out.
        let out = serde_json::to_value(&patch).unwrap();
        assert_eq!(out["identity"], serde_json::json!({"first_name": "A"}));
    }

    #[test]
    fn gender_serde() {
        let g: Gender = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(g, Gender::Other);
        assert_eq!(Gender::Male.to_string(), "male");
    }
}
