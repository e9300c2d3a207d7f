use crate::domain::money::{Money, PaymentAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Durable internal identifier, assigned by the repository at creation.
pub type ProjectId = u64;

/// First value of the shared human-id counter; the first project ever
/// created gets suffix `1000000001`.
pub const HUMAN_ID_BASE: u64 = 1_000_000_000;

/// Display-facing project code, e.g. `MUM-1000000001`.
///
/// The numeric suffix comes from a monotonic counter shared across all
/// projects; it is never reused or reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanId {
    pub prefix: String,
    pub number: u64,
}

impl fmt::Display for HumanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.number)
    }
}

/// Derives a 3-letter locality prefix from a city name (`"Mumbai"` -> `"MUM"`).
///
/// Falls back to `PRJ` when the city has no alphabetic characters.
pub fn locality_prefix(city: &str) -> String {
    let prefix: String = city
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if prefix.is_empty() {
        "PRJ".to_string()
    } else {
        prefix
    }
}

/// A `(stageIndex, subStepIndex)` pair, mostly for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub stage: u8,
    pub sub_step: u8,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} sub-step {}", self.stage, self.sub_step)
    }
}

/// A value recorded against a stage-specific field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    /// Durable reference returned by the artifact store (URL or key).
    Artifact(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Artifact(s) => s.trim().is_empty(),
        }
    }
}

/// The project aggregate.
///
/// `stage_data` maps a stage id to that stage's open record of fields; the
/// engine only ever writes into the active stage's map, so stages own
/// disjoint keys by construction. `revision` is the optimistic-concurrency
/// token bumped by every successful repository patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub human_id: HumanId,
    pub name: String,
    pub customer_name: String,
    pub city: String,
    pub state: String,
    /// Active stage, 1-based; `stage_count + 1` marks the project completed.
    pub stage_index: u8,
    /// Position within the active stage, 1-based; `sub_step_count + 1` means
    /// every sub-step is satisfied and the stage is ready to promote.
    pub sub_step_index: u8,
    pub stage_data: BTreeMap<String, BTreeMap<String, FieldValue>>,
    pub total_quote: Money,
    /// Payment milestones recorded against the quote, keyed by paid field
    /// (`initial_paid`, `detail_paid`, ...). Increment-only.
    pub payments: BTreeMap<String, Money>,
    pub completed_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

impl Project {
    pub fn position(&self) -> Position {
        Position {
            stage: self.stage_index,
            sub_step: self.sub_step_index,
        }
    }

    /// Point read into a stage's record.
    pub fn stage_field(&self, stage_id: &str, field: &str) -> Option<&FieldValue> {
        self.stage_data.get(stage_id)?.get(field)
    }

    /// Sum of the payments recorded under the given field names.
    pub fn paid_total(&self, fields: &[&str]) -> Money {
        fields
            .iter()
            .filter_map(|f| self.payments.get(*f))
            .fold(Money::ZERO, |acc, m| acc + *m)
    }

    /// Sum of every payment recorded on the project.
    pub fn paid_sum(&self) -> Money {
        self.payments.values().fold(Money::ZERO, |acc, m| acc + *m)
    }
}

/// Descriptive fields supplied by the caller at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub customer_name: String,
    pub city: String,
    pub state: String,
}

/// A batch of field writes applied atomically by `advance`.
///
/// Stage fields land in the active stage's record; quote and payments are
/// project-level. The patch is applied before any gate is re-evaluated, so
/// evidence and the advance it unlocks travel in one call.
#[derive(Debug, Clone, Default)]
pub struct FieldPatch {
    pub fields: Vec<(String, FieldValue)>,
    pub total_quote: Option<Money>,
    pub payments: Vec<(String, PaymentAmount)>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.total_quote.is_none() && self.payments.is_empty()
    }

    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .push((field.into(), FieldValue::Text(value.into())));
        self
    }

    pub fn artifact(mut self, field: impl Into<String>, reference: impl Into<String>) -> Self {
        self.fields
            .push((field.into(), FieldValue::Artifact(reference.into())));
        self
    }

    pub fn total_quote(mut self, quote: Money) -> Self {
        self.total_quote = Some(quote);
        self
    }

    pub fn payment(mut self, field: impl Into<String>, amount: PaymentAmount) -> Self {
        self.payments.push((field.into(), amount));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_project() -> Project {
        Project {
            id: 1,
            human_id: HumanId {
                prefix: "MUM".to_string(),
                number: 1_000_000_001,
            },
            name: "Villa Renovation".to_string(),
            customer_name: "A. Mehta".to_string(),
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            stage_index: 1,
            sub_step_index: 1,
            stage_data: BTreeMap::new(),
            total_quote: Money::ZERO,
            payments: BTreeMap::new(),
            completed_at: None,
            revision: 1,
        }
    }

    #[test]
    fn test_human_id_display() {
        let id = HumanId {
            prefix: "MUM".to_string(),
            number: 1_000_000_001,
        };
        assert_eq!(id.to_string(), "MUM-1000000001");
    }

    #[test]
    fn test_locality_prefix() {
        assert_eq!(locality_prefix("Mumbai"), "MUM");
        assert_eq!(locality_prefix("bangalore"), "BAN");
        assert_eq!(locality_prefix("Al Ain"), "ALA");
        assert_eq!(locality_prefix("42"), "PRJ");
    }

    #[test]
    fn test_paid_total_sums_only_named_fields() {
        let mut project = sample_project();
        project
            .payments
            .insert("initial_paid".to_string(), Money::new(dec!(100)));
        project
            .payments
            .insert("detail_paid".to_string(), Money::new(dec!(50)));

        assert_eq!(
            project.paid_total(&["initial_paid"]),
            Money::new(dec!(100))
        );
        assert_eq!(
            project.paid_total(&["initial_paid", "detail_paid"]),
            Money::new(dec!(150))
        );
        assert_eq!(project.paid_total(&["production_paid"]), Money::ZERO);
        assert_eq!(project.paid_sum(), Money::new(dec!(150)));
    }

    #[test]
    fn test_stage_field_lookup_is_per_stage() {
        let mut project = sample_project();
        project.stage_data.insert(
            "initial".to_string(),
            BTreeMap::from([(
                "floor_plan_url".to_string(),
                FieldValue::Artifact("mem://1/floor_plan_url/1".to_string()),
            )]),
        );

        assert!(project.stage_field("initial", "floor_plan_url").is_some());
        assert!(project.stage_field("detail", "floor_plan_url").is_none());
    }

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Text("   ".to_string()).is_empty());
        assert!(!FieldValue::Text("3BHK full interior".to_string()).is_empty());
        assert!(FieldValue::Artifact(String::new()).is_empty());
    }

    #[test]
    fn test_field_patch_builder() {
        let patch = FieldPatch::new()
            .artifact("floor_plan_url", "mem://1/floor_plan_url/1")
            .text("scope_details", "3BHK full interior")
            .payment("initial_paid", PaymentAmount::new(dec!(100)).unwrap());

        assert!(!patch.is_empty());
        assert_eq!(patch.fields.len(), 2);
        assert_eq!(patch.payments.len(), 1);
        assert!(FieldPatch::new().is_empty());
    }
}
