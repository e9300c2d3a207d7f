use crate::domain::finance;
use crate::domain::progress;
use crate::domain::project::Project;
use crate::domain::stage::StageRegistry;
use crate::error::Result;
use std::io::Write;

/// Writes project summaries as CSV.
///
/// One row per project: display id, name, position, derived progress, and
/// the financial totals against the quote.
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_projects(
        &mut self,
        registry: &StageRegistry,
        projects: Vec<Project>,
    ) -> Result<()> {
        self.writer.write_record([
            "human_id",
            "name",
            "stage",
            "sub_step",
            "progress",
            "total_quote",
            "paid",
            "balance",
        ])?;

        for project in projects {
            let paid = project.paid_sum();
            let balance = finance::final_balance(project.total_quote, paid);
            let percent = progress::progress_percent(registry, &project);
            self.writer.write_record([
                project.human_id.to_string(),
                project.name.clone(),
                project.stage_index.to_string(),
                project.sub_step_index.to_string(),
                percent.to_string(),
                project.total_quote.value().to_string(),
                paid.value().to_string(),
                balance.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
