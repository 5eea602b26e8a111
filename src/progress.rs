//! progress messages and the reporter receiving run events

use std::time::Duration;

use crate::tasks::{ExecutionPhase, TaskFailure};

/// percentage in hundredths of percent, floored so that 100.00 appears only when all is done.
fn hundredths_of_percent(completed: usize, total: usize) -> u128 {
    if total == 0 {
        return 10_000;
    }
    (completed as u128 * 10_000) / total as u128
}

fn format_progress(completed: usize, total: usize, items: &str) -> String {
    let pct = hundredths_of_percent(completed, total);
    format!(
        "Finished processing {} of {} ({}.{:02}%) {}.",
        completed,
        total,
        pct / 100,
        pct % 100,
        items
    )
}

/// one line message giving the completion of a phase
pub fn report(completed: usize, total: usize) -> String {
    format_progress(completed, total, "items")
}

/// same as [report], naming what the phase processes
pub fn report_phase(phase: ExecutionPhase, completed: usize, total: usize) -> String {
    format_progress(completed, total, phase.item_label())
}

//==========================================================================================

/// Receives the events of a run. An instance is given to the orchestrator and lives
/// as long as the run.
pub trait Reporter: Send + Sync {
    fn phase_started(&self, phase: ExecutionPhase, nb_tasks: usize, cpus_per_task: usize, nb_workers: usize);

    /// called after each task with the number of tasks done
    fn progress(&self, phase: ExecutionPhase, completed: usize, total: usize);

    fn task_failed(&self, failure: &TaskFailure);

    fn phase_finished(&self, phase: ExecutionPhase, elapsed: Duration);
}

/// reporter writing through the log crate
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn phase_started(&self, phase: ExecutionPhase, nb_tasks: usize, cpus_per_task: usize, nb_workers: usize) {
        match phase {
            ExecutionPhase::Build => log::info!("Creating diamond databases:"),
            ExecutionPhase::Search => log::info!("Identifying diamond hits between all pairs of genomes:"),
        }
        log::info!(
            "    {} tasks, {} concurrent workers, {} thread(s) per task",
            nb_tasks,
            nb_workers,
            cpus_per_task
        );
    }

    fn progress(&self, phase: ExecutionPhase, completed: usize, total: usize) {
        log::info!("    {}", report_phase(phase, completed, total));
    }

    fn task_failed(&self, failure: &TaskFailure) {
        log::warn!("{}", failure);
    }

    fn phase_finished(&self, phase: ExecutionPhase, elapsed: Duration) {
        log::info!("{} phase done, elapsed system time(s) {:.3}", phase, elapsed.as_secs_f32());
    }
}

//==========================================================================================
