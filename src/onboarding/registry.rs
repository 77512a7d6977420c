//! Step registry: static mapping from step number to backend category and
//! screen route.
//!
//! The registry is configuration data. It is validated once at construction:
//! steps must be numbered `1..=N` with no gaps, every step needs a route, and
//! critical-step membership is declared on the same descriptors, so the
//! critical set can never drift onto a different numbering scheme.

use serde::{Deserialize, Serialize};

use super::payload::PayloadKind;
use crate::error::RegistryError;

/// Domain bucket the backend groups frontend steps under.
///
/// Several step numbers may share one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendCategory {
    BasicInfo,
    Weight,
    HealthMetrics,
    Goals,
    TrainingPreferences,
    WorkoutPreferences,
    Completed,
}

impl std::fmt::Display for BackendCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BasicInfo => "basic_info",
            Self::Weight => "weight",
            Self::HealthMetrics => "health_metrics",
            Self::Goals => "goals",
            Self::TrainingPreferences => "training_preferences",
            Self::WorkoutPreferences => "workout_preferences",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// One entry of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub step: u32,
    pub category: BackendCategory,
    /// Opaque identifier the navigation layer resolves.
    pub route: String,
    /// Whether this step's data must be confirmed persisted before advancing.
    pub critical: bool,
    /// The slice of form data this step writes to the backend, if any.
    pub persists: Option<PayloadKind>,
}

impl StepDescriptor {
    pub fn new(step: u32, category: BackendCategory, route: &str) -> Self {
        Self {
            step,
            category,
            route: route.to_string(),
            critical: false,
            persists: None,
        }
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn persists(mut self, kind: PayloadKind) -> Self {
        self.persists = Some(kind);
        self
    }
}

/// Validated, immutable step table.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// Build a registry, rejecting gaps, misordering, empty routes, and
    /// critical steps with nothing to persist.
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, RegistryError> {
        validate(&steps)?;
        Ok(Self { steps })
    }

    /// Build a registry and mark the given steps critical.
    ///
    /// Fails if any critical step is outside the registered range.
    pub fn with_critical(
        mut steps: Vec<StepDescriptor>,
        critical: &[u32],
    ) -> Result<Self, RegistryError> {
        for &step in critical {
            let desc = steps
                .get_mut((step as usize).wrapping_sub(1))
                .filter(|d| d.step == step)
                .ok_or(RegistryError::UnknownCriticalStep { step })?;
            desc.critical = true;
        }
        Self::new(steps)
    }

    /// Check that a flow of `total_steps` is fully covered by this registry.
    pub fn validate_total(&self, total_steps: u32) -> Result<(), RegistryError> {
        if total_steps != self.total() {
            return Err(RegistryError::TotalMismatch {
                declared: total_steps,
                covered: self.total(),
            });
        }
        Ok(())
    }

    /// The standard eleven-step fitness onboarding flow.
    pub fn standard() -> Self {
        use BackendCategory::*;
        use PayloadKind as P;
        let steps = vec![
            StepDescriptor::new(1, BasicInfo, "/(onboarding)/name-screen")
                .persists(P::Name)
                .critical(),
            StepDescriptor::new(2, BasicInfo, "/(onboarding)/gender-screen")
                .persists(P::Gender)
                .critical(),
            StepDescriptor::new(3, BasicInfo, "/(onboarding)/birthday-screen")
                .persists(P::BirthDate)
                .critical(),
            StepDescriptor::new(4, Weight, "/(onboarding)/weight-screen").persists(P::CurrentWeight),
            StepDescriptor::new(5, HealthMetrics, "/(onboarding)/height-screen"),
            StepDescriptor::new(6, Goals, "/(onboarding)/goals-screen").persists(P::Goals),
            StepDescriptor::new(7, Goals, "/(onboarding)/fitness-screen"),
            StepDescriptor::new(8, TrainingPreferences, "/(onboarding)/medical-screen")
                .persists(P::MedicalConditions)
                .critical(),
            StepDescriptor::new(9, TrainingPreferences, "/(onboarding)/fitness-status"),
            StepDescriptor::new(10, WorkoutPreferences, "/(onboarding)/moods-screen"),
            StepDescriptor::new(11, Completed, "/(onboarding)/train-screen"),
        ];
        Self { steps }
    }

    pub fn total(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn descriptor(&self, step: u32) -> Option<&StepDescriptor> {
        if step == 0 {
            return None;
        }
        self.steps.get(step as usize - 1)
    }

    pub fn category(&self, step: u32) -> Option<BackendCategory> {
        self.descriptor(step).map(|d| d.category)
    }

    pub fn route(&self, step: u32) -> Option<&str> {
        self.descriptor(step).map(|d| d.route.as_str())
    }

    pub fn persists(&self, step: u32) -> Option<PayloadKind> {
        self.descriptor(step).and_then(|d| d.persists)
    }

    pub fn is_critical(&self, step: u32) -> bool {
        self.descriptor(step).is_some_and(|d| d.critical)
    }

    /// Critical step numbers in ascending order.
    pub fn critical_steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.steps.iter().filter(|d| d.critical).map(|d| d.step)
    }

    /// Resolve a string-encoded step pointer (as stored remotely).
    pub fn resolve(&self, encoded: &str) -> Option<&StepDescriptor> {
        let step: u32 = encoded.trim().parse().ok()?;
        self.descriptor(step)
    }

    /// The first step of the flow.
    pub fn first(&self) -> &StepDescriptor {
        // Non-empty by construction.
        &self.steps[0]
    }
}

fn validate(steps: &[StepDescriptor]) -> Result<(), RegistryError> {
    if steps.is_empty() {
        return Err(RegistryError::Empty);
    }
    for (idx, desc) in steps.iter().enumerate() {
        let expected = idx as u32 + 1;
        if desc.step != expected {
            return Err(RegistryError::OutOfOrder {
                step: desc.step,
                expected,
            });
        }
        if desc.route.trim().is_empty() {
            return Err(RegistryError::EmptyRoute { step: desc.step });
        }
        if desc.critical && desc.persists.is_none() {
            return Err(RegistryError::CriticalWithoutData { step: desc.step });
        }
    }
    Ok(())
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_is_valid() {
        let standard = StepRegistry::standard();
        let rebuilt = StepRegistry::new(standard.steps.clone()).unwrap();
        assert_eq!(rebuilt.total(), 11);
        assert!(rebuilt.validate_total(11).is_ok());
    }

    #[test]
    fn every_step_has_category_and_route() {
        let registry = StepRegistry::standard();
        for step in 1..=registry.total() {
            assert!(registry.category(step).is_some(), "step {step} has no category");
            assert!(registry.route(step).is_some(), "step {step} has no route");
        }
        assert!(registry.descriptor(0).is_none());
        assert!(registry.descriptor(12).is_none());
    }

    #[test]
    fn standard_critical_steps() {
        let registry = StepRegistry::standard();
        let critical: Vec<u32> = registry.critical_steps().collect();
        assert_eq!(critical, vec![1, 2, 3, 8]);
        assert!(registry.is_critical(1));
        assert!(!registry.is_critical(4));
        assert!(!registry.is_critical(99));
    }

    #[test]
    fn standard_critical_steps_all_persist_data() {
        let registry = StepRegistry::standard();
        for step in registry.critical_steps() {
            assert!(
                registry.persists(step).is_some(),
                "critical step {step} has nothing to persist"
            );
        }
        assert_eq!(registry.persists(8), Some(PayloadKind::MedicalConditions));
        assert_eq!(registry.persists(5), None);
    }

    #[test]
    fn categories_are_shared() {
        let registry = StepRegistry::standard();
        assert_eq!(registry.category(1), Some(BackendCategory::BasicInfo));
        assert_eq!(registry.category(3), Some(BackendCategory::BasicInfo));
        assert_eq!(registry.category(11), Some(BackendCategory::Completed));
    }

    #[test]
    fn rejects_gaps_and_empty() {
        use BackendCategory::*;
        assert_eq!(StepRegistry::new(vec![]).unwrap_err(), RegistryError::Empty);

        let err = StepRegistry::new(vec![
            StepDescriptor::new(1, BasicInfo, "/a"),
            StepDescriptor::new(3, Goals, "/c"),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::OutOfOrder { step: 3, expected: 2 });

        let err = StepRegistry::new(vec![StepDescriptor::new(1, BasicInfo, "  ")]).unwrap_err();
        assert_eq!(err, RegistryError::EmptyRoute { step: 1 });
    }

    #[test]
    fn critical_steps_must_be_registered() {
        use BackendCategory::*;
        let steps = vec![
            StepDescriptor::new(1, BasicInfo, "/a"),
            StepDescriptor::new(2, Goals, "/b").persists(PayloadKind::Goals),
        ];
        let registry = StepRegistry::with_critical(steps.clone(), &[2]).unwrap();
        assert!(registry.is_critical(2));
        assert!(!registry.is_critical(1));

        let err = StepRegistry::with_critical(steps.clone(), &[5]).unwrap_err();
        assert_eq!(err, RegistryError::UnknownCriticalStep { step: 5 });
        let err = StepRegistry::with_critical(steps.clone(), &[0]).unwrap_err();
        assert_eq!(err, RegistryError::UnknownCriticalStep { step: 0 });

        // Step 1 persists nothing, so it cannot be critical.
        let err = StepRegistry::with_critical(steps, &[1]).unwrap_err();
        assert_eq!(err, RegistryError::CriticalWithoutData { step: 1 });
    }

    #[test]
    fn total_mismatch_is_reported() {
        let registry = StepRegistry::standard();
        assert_eq!(
            registry.validate_total(9).unwrap_err(),
            RegistryError::TotalMismatch {
                declared: 9,
                covered: 11
            }
        );
    }

    #[test]
    fn resolve_parses_string_pointer() {
        let registry = StepRegistry::standard();
        assert_eq!(registry.resolve("4").map(|d| d.step), Some(4));
        assert_eq!(registry.resolve(" 10 ").map(|d| d.step), Some(10));
        assert!(registry.resolve("").is_none());
        assert!(registry.resolve("abc").is_none());
        assert!(registry.resolve("0").is_none());
        assert!(registry.resolve("42").is_none());
        assert!(registry.resolve("-1").is_none());
    }

    #[test]
    fn category_display_matches_serde() {
        use BackendCategory::*;
        for category in [
            BasicInfo,
            Weight,
            HealthMetrics,
            Goals,
            TrainingPreferences,
            WorkoutPreferences,
            Completed,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(format!("\"{category}\""), json);
        }
    }
}
