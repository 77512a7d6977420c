//! Step payloads: the request bodies a step's critical data is written with.

use serde::{Deserialize, Serialize};

use super::model::{Gender, OnboardingData};

/// Which slice of form data a step persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Name,
    Gender,
    BirthDate,
    CurrentWeight,
    Goals,
    MedicalConditions,
}

/// `PUT /onboarding/profile` body. Partial: only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalInput {
    pub goal_type: String,
    pub priority: String,
}

/// A write of step-specific data to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPayload {
    Profile(ProfileUpdate),
    Goals(Vec<GoalInput>),
    MedicalConditions(Vec<String>),
    CurrentWeight { weight_lbs: f64 },
}

impl StepPayload {
    /// Build the payload for `kind` from collected data.
    ///
    /// Returns `None` while the fields the step needs are still missing.
    pub fn build(kind: PayloadKind, data: &OnboardingData) -> Option<Self> {
        let identity = &data.identity;
        match kind {
            PayloadKind::Name => {
                let first = identity.first_name.as_ref().filter(|s| !s.trim().is_empty())?;
                let last = identity.last_name.as_ref().filter(|s| !s.trim().is_empty())?;
                Some(Self::Profile(ProfileUpdate {
                    first_name: Some(first.clone()),
                    last_name: Some(last.clone()),
                    ..Default::default()
                }))
            }
            PayloadKind::Gender => Some(Self::Profile(ProfileUpdate {
                gender: Some(identity.gender?),
                ..Default::default()
            })),
            PayloadKind::BirthDate => Some(Self::Profile(ProfileUpdate {
                birth_date: Some(identity.birth_date.clone()?),
                ..Default::default()
            })),
            PayloadKind::CurrentWeight => Some(Self::CurrentWeight {
                weight_lbs: data.body.current_weight_lbs?,
            }),
            PayloadKind::Goals => {
                let goal = data.preferences.primary_goal.clone()?;
                Some(Self::Goals(vec![GoalInput {
                    goal_type: goal,
                    priority: "high".to_string(),
                }]))
            }
            PayloadKind::MedicalConditions => Some(Self::MedicalConditions(
                data.preferences.medical_conditions.clone()?,
            )),
        }
    }

    /// Everything written during final submission, in write order.
    pub fn final_submission(data: &OnboardingData) -> Vec<Self> {
        let mut out = Vec::new();
        let identity = &data.identity;
        if identity.first_name.is_some() {
            out.push(Self::Profile(ProfileUpdate {
                first_name: identity.first_name.clone(),
                last_name: identity.last_name.clone(),
                gender: identity.gender,
                birth_date: identity.birth_date.clone(),
            }));
        }
        if let Some(goals) = Self::build(PayloadKind::Goals, data) {
            out.push(goals);
        }
        if let Some(weight) = Self::build(PayloadKind::CurrentWeight, data) {
            out.push(weight);
        }
        out
    }

    /// Path relative to the API base.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Profile(_) => "/onboarding/profile",
            Self::Goals(_) => "/onboarding/input/goals",
            Self::MedicalConditions(_) => "/onboarding/input/training-preferences",
            Self::CurrentWeight { .. } => "/onboarding/input/weight/current",
        }
    }

    /// Profile writes replace fields in place; the input endpoints append.
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Profile(_))
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Profile(p) => serde_json::to_value(p).unwrap_or_default(),
            Self::Goals(goals) => serde_json::to_value(goals).unwrap_or_default(),
            Self::MedicalConditions(conditions) => {
                serde_json::json!({ "medical_conditions": conditions })
            }
            Self::CurrentWeight { weight_lbs } => serde_json::json!({ "weight_lbs": weight_lbs }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_requires_both_fields() {
        let mut data = OnboardingData::default();
        data.identity.first_name = Some("A".into());
        assert!(StepPayload::build(PayloadKind::Name, &data).is_none());

        data.identity.last_name = Some("  ".into());
        assert!(StepPayload::build(PayloadKind::Name, &data).is_none());

        data.merge(OnboardingData::name("A", "B"));
        let payload = StepPayload::build(PayloadKind::Name, &data).unwrap();
        assert_eq!(payload.endpoint(), "/onboarding/profile");
        assert!(payload.is_update());
        assert_eq!(
            payload.body(),
            serde_json::json!({"first_name": "A", "last_name": "B"})
        );
    }

    #[test]
    fn profile_updates_are_partial() {
        let mut data = OnboardingData::name("A", "B");
        data.merge(OnboardingData::gender(Gender::Other));
        let payload = StepPayload::build(PayloadKind::Gender, &data).unwrap();
        assert_eq!(payload.body(), serde_json::json!({"gender": "other"}));
    }

    #[test]
    fn input_payload_shapes() {
        let mut data = OnboardingData::primary_goal("run_marathon");
        data.merge(OnboardingData::medical_conditions(["asthma", "knee"]));
        data.merge(OnboardingData::current_weight(172.5));

        let goals = StepPayload::build(PayloadKind::Goals, &data).unwrap();
        assert_eq!(goals.endpoint(), "/onboarding/input/goals");
        assert!(!goals.is_update());
        assert_eq!(
            goals.body(),
            serde_json::json!([{"goal_type": "run_marathon", "priority": "high"}])
        );

        let medical = StepPayload::build(PayloadKind::MedicalConditions, &data).unwrap();
        assert_eq!(
            medical.body(),
            serde_json::json!({"medical_conditions": ["asthma", "knee"]})
        );

        let weight = StepPayload::build(PayloadKind::CurrentWeight, &data).unwrap();
        assert_eq!(weight.endpoint(), "/onboarding/input/weight/current");
        assert_eq!(weight.body(), serde_json::json!({"weight_lbs": 172.5}));
    }

    #[test]
    fn final_submission_skips_missing_sections() {
        let data = OnboardingData::current_weight(150.0);
        let writes = StepPayload::final_submission(&data);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].endpoint(), "/onboarding/input/weight/current");

        let mut full = OnboardingData::name("A", "B");
        full.merge(OnboardingData::birth_date("1990-02-03"));
        full.merge(OnboardingData::primary_goal("strength"));
        full.merge(OnboardingData::current_weight(150.0));
        let writes = StepPayload::final_submission(&full);
        let endpoints: Vec<_> = writes.iter().map(|w| w.endpoint()).collect();
        assert_eq!(
            endpoints,
            vec![
                "/onboarding/profile",
                "/onboarding/input/goals",
                "/onboarding/input/weight/current"
            ]
        );
        assert_eq!(
            writes[0].body(),
            serde_json::json!({"first_name": "A", "last_name": "B", "birth_date": "1990-02-03"})
        );
    }
}
