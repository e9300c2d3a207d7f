use crate::domain::money::Percent;
use rust_decimal_macros::dec;
use std::fmt;

/// The condition that must hold before a sub-step counts as complete.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    None,
    /// An artifact reference must be recorded under `field`.
    ArtifactUploaded { field: &'static str },
    /// A non-empty value must be recorded under `field`.
    FieldNonEmpty { field: &'static str },
    /// The payments listed in `paid_fields` must cover `percent` of the quote.
    FinancialGateMet {
        percent: Percent,
        paid_fields: &'static [&'static str],
    },
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::None => write!(f, "no requirement"),
            Requirement::ArtifactUploaded { field } => {
                write!(f, "artifact '{field}' uploaded")
            }
            Requirement::FieldNonEmpty { field } => write!(f, "field '{field}' filled in"),
            Requirement::FinancialGateMet {
                percent,
                paid_fields,
            } => write!(
                f,
                "{}% of quote paid across {}",
                (percent.value() * dec!(100)).normalize(),
                paid_fields.join(", ")
            ),
        }
    }
}

/// One ordered task within a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SubStepDefinition {
    pub label: &'static str,
    pub requirement: Requirement,
    /// Relative sizing within the stage for progress computation.
    pub weight: u32,
}

impl SubStepDefinition {
    pub fn new(label: &'static str, requirement: Requirement) -> Self {
        Self {
            label,
            requirement,
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

/// One of the fixed top-level pipeline phases.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDefinition {
    /// Stable key under which the stage's fields live in `Project::stage_data`.
    pub id: &'static str,
    pub name: &'static str,
    pub sub_steps: Vec<SubStepDefinition>,
}

/// Static, ordered catalog of stages and their gated sub-steps.
///
/// Loaded once at process start and shared read-only; every index in the
/// public API is 1-based to match the aggregate's `stage_index` /
/// `sub_step_index` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StageRegistry {
    stages: Vec<StageDefinition>,
}

impl StageRegistry {
    /// Builds a registry from an ordered stage list.
    ///
    /// Malformed configuration is a programmer error and fails fast.
    pub fn new(stages: Vec<StageDefinition>) -> Self {
        assert!(!stages.is_empty(), "registry requires at least one stage");
        for stage in &stages {
            assert!(
                !stage.sub_steps.is_empty(),
                "stage '{}' has no sub-steps",
                stage.id
            );
            assert!(
                stage.sub_steps.iter().all(|s| s.weight > 0),
                "stage '{}' has a zero-weight sub-step",
                stage.id
            );
        }
        Self { stages }
    }

    /// The interior-design pipeline: Initial Design, Detail Design,
    /// Production, Installation & Handover.
    pub fn standard() -> Self {
        use Requirement::*;
        Self::new(vec![
            StageDefinition {
                id: "initial",
                name: "Initial Design",
                sub_steps: vec![
                    SubStepDefinition::new(
                        "Floor Plan Upload",
                        ArtifactUploaded {
                            field: "floor_plan_url",
                        },
                    ),
                    SubStepDefinition::new(
                        "Scope & Requirements",
                        FieldNonEmpty {
                            field: "scope_details",
                        },
                    ),
                    SubStepDefinition::new(
                        "Initial Quotation",
                        ArtifactUploaded {
                            field: "initial_quote_url",
                        },
                    ),
                    SubStepDefinition::new(
                        "Booking Payment (10%)",
                        FinancialGateMet {
                            percent: Percent::from_raw(dec!(0.10)),
                            paid_fields: &["initial_paid"],
                        },
                    ),
                ],
            },
            StageDefinition {
                id: "detail",
                name: "Detail Design",
                sub_steps: vec![
                    SubStepDefinition::new(
                        "Site Measurements",
                        ArtifactUploaded {
                            field: "site_measurement_url",
                        },
                    ),
                    SubStepDefinition::new(
                        "2D Layout Finalization",
                        ArtifactUploaded {
                            field: "layout_2d_url",
                        },
                    ),
                    SubStepDefinition::new(
                        "Quotation Approval",
                        ArtifactUploaded {
                            field: "approved_quote_url",
                        },
                    ),
                    SubStepDefinition::new(
                        "BOQ & Design QC",
                        ArtifactUploaded { field: "boq_url" },
                    ),
                    SubStepDefinition::new(
                        "Design Payment (50%)",
                        FinancialGateMet {
                            percent: Percent::from_raw(dec!(0.50)),
                            paid_fields: &["initial_paid", "detail_paid"],
                        },
                    ),
                ],
            },
            StageDefinition {
                id: "production",
                name: "Production",
                sub_steps: vec![
                    SubStepDefinition::new(
                        "Bill of Materials",
                        ArtifactUploaded { field: "bom_url" },
                    ),
                    SubStepDefinition::new(
                        "Production Drawing",
                        ArtifactUploaded {
                            field: "production_drawing_url",
                        },
                    ),
                    SubStepDefinition::new(
                        "Material Procurement",
                        FieldNonEmpty {
                            field: "procurement_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "On-Site Work Start",
                        FieldNonEmpty {
                            field: "site_work_start_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Material Reached Factory",
                        FieldNonEmpty {
                            field: "material_reach_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Production Start",
                        FieldNonEmpty {
                            field: "production_start_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Production End",
                        FieldNonEmpty {
                            field: "production_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "On-Site Work End",
                        FieldNonEmpty {
                            field: "site_work_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Dispatch",
                        FieldNonEmpty {
                            field: "dispatch_date",
                        },
                    ),
                ],
            },
            StageDefinition {
                id: "handover",
                name: "Installation & Handover",
                sub_steps: vec![
                    SubStepDefinition::new(
                        "Material Received at Site",
                        FieldNonEmpty {
                            field: "material_received_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Installation Start",
                        FieldNonEmpty {
                            field: "installation_start_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Missing & Damage Raised",
                        FieldNonEmpty {
                            field: "missing_damage_raised_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "M&D Procurement Start",
                        FieldNonEmpty {
                            field: "md_procurement_start_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "M&D Procurement Completion",
                        FieldNonEmpty {
                            field: "md_procurement_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "M&D Production Start",
                        FieldNonEmpty {
                            field: "md_production_start_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "M&D Production Completion",
                        FieldNonEmpty {
                            field: "md_production_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "M&D Dispatch",
                        FieldNonEmpty {
                            field: "md_dispatch_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "M&D Received at Site",
                        FieldNonEmpty {
                            field: "md_received_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Installation Completion",
                        FieldNonEmpty {
                            field: "installation_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "Handover Duration",
                        FieldNonEmpty {
                            field: "handover_end_date",
                        },
                    ),
                    SubStepDefinition::new(
                        "NPS & Project Closure",
                        ArtifactUploaded {
                            field: "nps_document_url",
                        },
                    ),
                ],
            },
        ])
    }

    pub fn stage_count(&self) -> u8 {
        self.stages.len() as u8
    }

    /// Index of the "completed" sentinel (`stage_count + 1`).
    pub fn completed_stage_index(&self) -> u8 {
        self.stage_count() + 1
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn stage(&self, stage_index: u8) -> Option<&StageDefinition> {
        if stage_index == 0 {
            return None;
        }
        self.stages.get(stage_index as usize - 1)
    }

    pub fn sub_step(&self, stage_index: u8, sub_step_index: u8) -> Option<&SubStepDefinition> {
        if sub_step_index == 0 {
            return None;
        }
        self.stage(stage_index)?
            .sub_steps
            .get(sub_step_index as usize - 1)
    }

    pub fn sub_step_count(&self, stage_index: u8) -> Option<u8> {
        self.stage(stage_index).map(|s| s.sub_steps.len() as u8)
    }

    pub fn weight_of(&self, stage_index: u8, sub_step_index: u8) -> Option<u32> {
        self.sub_step(stage_index, sub_step_index).map(|s| s.weight)
    }
}
