//! Derives a project's overall completion percentage.

use crate::domain::project::Project;
use crate::domain::stage::StageRegistry;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

/// Overall completion in `[0, 100]`.
///
/// Stages strictly before the active one contribute their full share; the
/// active stage contributes the weight fraction of its confirmed sub-steps.
/// The result is capped at 99 while the project is mid-pipeline and is
/// exactly 100 once the completed sentinel is reached.
pub fn progress_percent(registry: &StageRegistry, project: &Project) -> u8 {
    let stage_count = registry.stage_count();
    if project.stage_index > stage_count {
        return 100;
    }
    let stage = match registry.stage(project.stage_index) {
        Some(stage) => stage,
        // Indexes outside the catalog never survive validation.
        None => return 0,
    };

    let per_stage = dec!(100) / Decimal::from(stage_count);
    let base = Decimal::from(project.stage_index - 1) * per_stage;

    let total_weight: u32 = stage.sub_steps.iter().map(|s| s.weight).sum();
    let confirmed: u32 = stage
        .sub_steps
        .iter()
        .take(project.sub_step_index.saturating_sub(1) as usize)
        .map(|s| s.weight)
        .sum();
    let fraction = Decimal::from(confirmed) / Decimal::from(total_weight);

    let percent = base + fraction * per_stage;
    percent.round().to_u8().unwrap_or(0).min(99)
}
