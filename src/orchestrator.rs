//! Runs the two phases of an all pairs reciprocal search.
//!
//! BUILD : one index per genome. Only when every build task has returned are the search tasks
//! generated, as they reference the index files.
//! SEARCH : two directed searches per pair of genomes.
//!
//! Each phase asks [allocate_cpus] how many threads each invocation gets and hands its tasks to the
//! [TaskRunner] with at most [pool_size] tasks at once. When a phase is drained its failures are
//! handled according to the [FailurePolicy] of the run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;
use strum_macros::Display;

use crate::cpus::{allocate_cpus, pool_size};
use crate::diamond::Diamond;
use crate::errors::{RbhError, Result};
use crate::genome::GenomeRecord;
use crate::process::{inspect, locate_tool, ProcessLauncher};
use crate::progress::Reporter;
use crate::runner::TaskRunner;
use crate::tasks::*;
use crate::utils::files::ensure_output_dir;
use crate::utils::parameters::{FailurePolicy, RunParams};

/// one line per task : phase, task, status, failure detail
pub const SUMMARY_FILE: &str = "rbhsearch.tasks.tsv";

/// START -> BUILD_RUNNING -> BUILD_DONE -> SEARCH_RUNNING -> SEARCH_DONE
/// With less than 2 genomes BUILD_DONE goes directly to SEARCH_DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "shouty_snake_case")]
pub enum RunState {
    Start,
    BuildRunning,
    BuildDone,
    SearchRunning,
    SearchDone,
}

/// what happened in a phase
#[derive(Debug, Clone)]
pub struct PhaseSummary {
    phase: ExecutionPhase,
    cpus_per_task: usize,
    nb_workers: usize,
    reports: Vec<TaskReport>,
    /// first failure in time
    first_failure: Option<TaskFailure>,
}

impl PhaseSummary {
    pub fn get_phase(&self) -> ExecutionPhase {
        self.phase
    }

    pub fn get_nb_tasks(&self) -> usize {
        self.reports.len()
    }

    pub fn get_cpus_per_task(&self) -> usize {
        self.cpus_per_task
    }

    pub fn get_nb_workers(&self) -> usize {
        self.nb_workers
    }

    pub fn get_reports(&self) -> &[TaskReport] {
        &self.reports
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskFailure> {
        self.reports.iter().flat_map(|r| r.get_failures().iter())
    }

    pub fn nb_failed(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }

    pub fn nb_skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.get_status() == TaskStatus::Skipped)
            .count()
    }
} // end of impl PhaseSummary

/// Summary of a run. A phase that was not entered is None.
#[derive(Debug, Clone)]
pub struct RunSummary {
    nb_genomes: usize,
    build: Option<PhaseSummary>,
    search: Option<PhaseSummary>,
}

impl RunSummary {
    pub fn get_nb_genomes(&self) -> usize {
        self.nb_genomes
    }

    pub fn get_build(&self) -> Option<&PhaseSummary> {
        self.build.as_ref()
    }

    pub fn get_search(&self) -> Option<&PhaseSummary> {
        self.search.as_ref()
    }

    /// failed tasks in both phases
    pub fn nb_failed(&self) -> usize {
        self.phases().map(|p| p.nb_failed()).sum()
    }

    fn phases(&self) -> impl Iterator<Item = &PhaseSummary> {
        [self.build.as_ref(), self.search.as_ref()].into_iter().flatten()
    }
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    phase: ExecutionPhase,
    task: &'a str,
    status: TaskStatus,
    detail: String,
}

//==========================================================================================

// runs the invocations of a task one after the other and collects their failures
fn execute_task<T: Task, L: ProcessLauncher>(
    phase: ExecutionPhase,
    task: &T,
    diamond: &Diamond,
    launcher: &L,
    nb_threads: usize,
) -> TaskReport {
    let label = task.label();
    let mut failures = Vec::new();
    for invocation in task.invocations(diamond, nb_threads) {
        log::debug!("{} task {} : {}", phase, label, invocation.command_line());
        let result = invocation
            .clear_outputs()
            .and_then(|_| launcher.launch(&invocation));
        if let Some(failure) = inspect(phase, &label, &invocation, result) {
            failures.push(failure);
        }
    }
    TaskReport::finished(phase, label, failures)
} // end of execute_task

/// Drives diamond over all genomes of a run.
pub struct ReciprocalSearch<'a, L: ProcessLauncher, E: TaskRunner> {
    params: RunParams,
    diamond: Diamond,
    launcher: L,
    runner: E,
    reporter: &'a dyn Reporter,
    state: RunState,
}

impl<'a, L: ProcessLauncher, E: TaskRunner> ReciprocalSearch<'a, L, E> {
    /// checks parameters and that the aligner can be found. Nothing is run if this fails.
    pub fn new(params: RunParams, launcher: L, runner: E, reporter: &'a dyn Reporter) -> Result<Self> {
        params.validate()?;
        let program = locate_tool(params.get_tool())?;
        Ok(Self::with_program(params, &program, launcher, runner, reporter))
    }

    /// same as new with an already located aligner
    pub fn with_program(
        params: RunParams,
        program: &Path,
        launcher: L,
        runner: E,
        reporter: &'a dyn Reporter,
    ) -> Self {
        let diamond = Diamond::new(program, params.get_evalue());
        log::info!(
            "using {:?} with e-value threshold {}",
            diamond.get_program(),
            diamond.get_evalue()
        );
        ReciprocalSearch {
            params,
            diamond,
            launcher,
            runner,
            reporter,
            state: RunState::Start,
        }
    }

    pub fn get_state(&self) -> RunState {
        self.state
    }

    pub fn get_params(&self) -> &RunParams {
        &self.params
    }

    /// builds indexes of all genomes, then runs the searches of all pairs.
    pub fn run(&mut self, genomes: &[GenomeRecord]) -> Result<RunSummary> {
        let output_dir = self.params.get_output_dir().to_path_buf();
        ensure_output_dir(&output_dir)?;
        self.params.dump_json(&output_dir)?;
        let mut summary = RunSummary {
            nb_genomes: genomes.len(),
            build: None,
            search: None,
        };
        //
        self.state = RunState::BuildRunning;
        let build_tasks = generate_build_tasks(genomes, &output_dir);
        if build_tasks.is_empty() {
            log::warn!("no genome to process");
        } else {
            summary.build = Some(self.run_phase(ExecutionPhase::Build, &build_tasks));
        }
        self.state = RunState::BuildDone;
        if let Err(e) = self.check_phase(summary.build.as_ref()) {
            self.write_summary_after_error(&summary);
            return Err(e);
        }
        //
        let search_tasks = generate_search_tasks(genomes, &output_dir);
        if search_tasks.is_empty() {
            log::info!("less than 2 genomes, no search between pairs");
        } else {
            self.state = RunState::SearchRunning;
            summary.search = Some(self.run_phase(ExecutionPhase::Search, &search_tasks));
        }
        self.state = RunState::SearchDone;
        if let Err(e) = self.check_phase(summary.search.as_ref()) {
            self.write_summary_after_error(&summary);
            return Err(e);
        }
        self.write_summary(&summary)?;
        Ok(summary)
    } // end of run

    // dispatches tasks of a phase and waits for all of them
    fn run_phase<T: Task>(&self, phase: ExecutionPhase, tasks: &[T]) -> PhaseSummary {
        let cpus_per_task = allocate_cpus(self.params.get_cpus(), tasks.len());
        let nb_workers = pool_size(self.params.get_cpus(), tasks.len());
        self.reporter.phase_started(phase, tasks.len(), cpus_per_task, nb_workers);
        let start_t = SystemTime::now();
        //
        let fail_fast = self.params.get_failure_policy() == FailurePolicy::FailFast;
        let stop = AtomicBool::new(false);
        let first_failure = Mutex::new(None::<TaskFailure>);
        let diamond = &self.diamond;
        let launcher = &self.launcher;
        let reporter = self.reporter;
        let reports = self.runner.run(
            tasks,
            |task| {
                if stop.load(Ordering::Acquire) {
                    log::debug!("{} task {} skipped", phase, task.label());
                    return TaskReport::skipped(phase, task.label());
                }
                let report = execute_task(phase, task, diamond, launcher, cpus_per_task);
                if report.is_failed() {
                    for failure in report.get_failures() {
                        reporter.task_failed(failure);
                    }
                    let mut first = first_failure.lock();
                    if first.is_none() {
                        *first = report.get_failures().first().cloned();
                    }
                    if fail_fast {
                        stop.store(true, Ordering::Release);
                    }
                }
                report
            },
            |completed, total| reporter.progress(phase, completed, total),
            nb_workers,
        );
        let elapsed = start_t.elapsed().unwrap_or_default();
        self.reporter.phase_finished(phase, elapsed);
        PhaseSummary {
            phase,
            cpus_per_task,
            nb_workers,
            reports,
            first_failure: first_failure.into_inner(),
        }
    } // end of run_phase

    // applies the failure policy to a drained phase
    fn check_phase(&self, phase_summary: Option<&PhaseSummary>) -> Result<()> {
        let phase_summary = match phase_summary {
            Some(s) => s,
            None => return Ok(()),
        };
        let nb_failed = phase_summary.nb_failed();
        if nb_failed == 0 {
            return Ok(());
        }
        let phase = phase_summary.get_phase();
        match self.params.get_failure_policy() {
            FailurePolicy::Ignore => {
                log::warn!("{} failed task(s) in {} phase, going on", nb_failed, phase);
                Ok(())
            }
            FailurePolicy::FailFast => {
                let first = phase_summary
                    .first_failure
                    .clone()
                    .or_else(|| phase_summary.failures().next().cloned());
                match first {
                    Some(failure) => {
                        log::error!(
                            "{} phase stopped after a failure, {} task(s) not run",
                            phase,
                            phase_summary.nb_skipped()
                        );
                        Err(RbhError::FailFast { phase, failure })
                    }
                    None => Ok(()),
                }
            }
            FailurePolicy::Collect => {
                let failures: Vec<TaskFailure> = phase_summary.failures().cloned().collect();
                log::error!("{} failed task(s) in {} phase", nb_failed, phase);
                Err(RbhError::TaskFailures { phase, failures })
            }
        }
    } // end of check_phase

    /// writes one line per task in outdir/rbhsearch.tasks.tsv
    fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let path = self.params.get_output_dir().join(SUMMARY_FILE);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&path)?;
        for phase_summary in summary.phases() {
            for report in phase_summary.get_reports() {
                let detail: Vec<String> = report
                    .get_failures()
                    .iter()
                    .map(|f| format!("`{}` {}", f.command, f.reason))
                    .collect();
                writer.serialize(SummaryRow {
                    phase: report.get_phase(),
                    task: report.get_task(),
                    status: report.get_status(),
                    detail: detail.join("; "),
                })?;
            }
        }
        writer.flush().map_err(|e| RbhError::io(&path, e))?;
        log::info!("task summary in {:?}", path);
        Ok(path)
    } // end of write_summary

    fn write_summary_after_error(&self, summary: &RunSummary) {
        if let Err(e) = self.write_summary(summary) {
            log::error!("could not write task summary : {}", e);
        }
    }
} // end of impl ReciprocalSearch

//==========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Invocation, InvocationOutput};
    use crate::progress::report_phase;
    use crate::runner::{RayonRunner, SequentialRunner};
    use std::io;
    use std::time::Duration;

    /// records invocations, writes their expected output unless command line contains fail_on
    struct FakeLauncher {
        calls: Mutex<Vec<Invocation>>,
        fail_on: Option<String>,
    }

    impl FakeLauncher {
        fn new() -> Self {
            FakeLauncher {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(pattern: &str) -> Self {
            FakeLauncher {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(pattern.to_string()),
            }
        }

        fn subcommands(&self) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .map(|inv| inv.get_args()[0].to_string_lossy().to_string())
                .collect()
        }

        fn thread_args(&self, subcommand: &str) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .filter(|inv| inv.get_args()[0] == subcommand)
                .filter_map(|inv| {
                    let args = inv.get_args();
                    let rank = args.iter().position(|a| a == "-p")?;
                    args.get(rank + 1).map(|a| a.to_string_lossy().to_string())
                })
                .collect()
        }
    }

    impl ProcessLauncher for FakeLauncher {
        fn launch(&self, invocation: &Invocation) -> io::Result<InvocationOutput> {
            self.calls.lock().push(invocation.clone());
            if let Some(pattern) = &self.fail_on {
                if invocation.command_line().contains(pattern.as_str()) {
                    return Ok(InvocationOutput::new(Some(1), vec![], b"Error: cannot open".to_vec()));
                }
            }
            if let Some(path) = invocation.get_produced().first() {
                std::fs::write(path, b"")?;
            }
            Ok(InvocationOutput::new(Some(0), vec![], vec![]))
        }
    }

    /// exits normally without writing anything
    struct SilentLauncher;

    impl ProcessLauncher for SilentLauncher {
        fn launch(&self, _invocation: &Invocation) -> io::Result<InvocationOutput> {
            Ok(InvocationOutput::new(Some(0), vec![], vec![]))
        }
    }

    #[derive(Default)]
    struct CollectReporter {
        events: Mutex<Vec<String>>,
    }

    impl Reporter for CollectReporter {
        fn phase_started(&self, phase: ExecutionPhase, nb_tasks: usize, cpus_per_task: usize, nb_workers: usize) {
            self.events
                .lock()
                .push(format!("start {} {} {} {}", phase, nb_tasks, cpus_per_task, nb_workers));
        }

        fn progress(&self, phase: ExecutionPhase, completed: usize, total: usize) {
            self.events.lock().push(report_phase(phase, completed, total));
        }

        fn task_failed(&self, failure: &TaskFailure) {
            self.events.lock().push(format!("failed {}", failure.task));
        }

        fn phase_finished(&self, phase: ExecutionPhase, _elapsed: Duration) {
            self.events.lock().push(format!("done {}", phase));
        }
    }

    fn genomes(n: usize) -> Vec<GenomeRecord> {
        (1..=n)
            .map(|i| {
                let id = format!("g{}", i);
                GenomeRecord::new(&id, &PathBuf::from(format!("/data/{}.faa", id)))
            })
            .collect()
    }

    fn params(cpus: usize, outdir: &Path, policy: FailurePolicy) -> RunParams {
        RunParams::new(cpus, 1e-5, "faa", outdir).with_failure_policy(policy)
    }

    #[test]
    fn test_three_genomes() {
        let dir = tempfile::tempdir().unwrap();
        let outdir = dir.path().join("out");
        let reporter = CollectReporter::default();
        let launcher = FakeLauncher::new();
        let mut search = ReciprocalSearch::with_program(
            params(8, &outdir, FailurePolicy::Ignore),
            Path::new("diamond"),
            launcher,
            SequentialRunner,
            &reporter,
        );
        assert_eq!(search.get_state(), RunState::Start);
        let summary = search.run(&genomes(3)).unwrap();
        assert_eq!(search.get_state(), RunState::SearchDone);
        //
        let build = summary.get_build().unwrap();
        assert_eq!(build.get_nb_tasks(), 3);
        assert_eq!(build.get_cpus_per_task(), 2);
        assert_eq!(build.get_nb_workers(), 3);
        let search_summary = summary.get_search().unwrap();
        assert_eq!(search_summary.get_nb_tasks(), 3);
        assert_eq!(summary.nb_failed(), 0);
        //
        let subcommands = search.launcher.subcommands();
        assert_eq!(subcommands, vec!["makedb", "makedb", "makedb", "blastp", "blastp", "blastp", "blastp", "blastp", "blastp"]);
        for name in ["g1-g2", "g2-g1", "g1-g3", "g3-g1", "g2-g3", "g3-g2"] {
            assert!(outdir.join(format!("{}.blastp.tsv", name)).is_file(), "missing {}", name);
        }
        //
        let events = reporter.events.lock().clone();
        assert_eq!(events[0], "start BUILD 3 2 3");
        assert_eq!(events[1], "Finished processing 1 of 3 (33.33%) genomes.");
        assert_eq!(events[3], "Finished processing 3 of 3 (100.00%) genomes.");
        assert_eq!(events[4], "done BUILD");
        assert_eq!(events[5], "start SEARCH 3 2 3");
        assert_eq!(events[8], "Finished processing 3 of 3 (100.00%) genome pairs.");
        //
        let tsv = std::fs::read_to_string(outdir.join(SUMMARY_FILE)).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "phase\ttask\tstatus\tdetail");
        assert_eq!(lines[1], "BUILD\tg1\tcompleted\t");
        assert_eq!(lines[6], "SEARCH\tg2-g3\tcompleted\t");
        assert!(outdir.join("parameters.json").is_file());
    }

    #[test]
    fn test_cpu_split_per_phase() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(8, dir.path(), FailurePolicy::Ignore),
            Path::new("diamond"),
            FakeLauncher::new(),
            RayonRunner,
            &reporter,
        );
        let summary = search.run(&genomes(4)).unwrap();
        assert_eq!(summary.get_build().unwrap().get_cpus_per_task(), 2);
        assert_eq!(summary.get_search().unwrap().get_cpus_per_task(), 1);
        assert_eq!(summary.get_search().unwrap().get_nb_workers(), 6);
        assert_eq!(search.launcher.thread_args("makedb"), vec!["2"; 4]);
        assert_eq!(search.launcher.thread_args("blastp"), vec!["1"; 12]);
    }

    #[test]
    fn test_search_starts_after_all_builds() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(4, dir.path(), FailurePolicy::Ignore),
            Path::new("diamond"),
            FakeLauncher::new(),
            RayonRunner,
            &reporter,
        );
        search.run(&genomes(6)).unwrap();
        let subcommands = search.launcher.subcommands();
        assert_eq!(subcommands.len(), 6 + 2 * 15);
        let last_build = subcommands.iter().rposition(|s| s == "makedb").unwrap();
        let first_search = subcommands.iter().position(|s| s == "blastp").unwrap();
        assert_eq!(last_build, 5);
        assert_eq!(first_search, 6);
        // progress of each phase is monotonic and ends at 100%
        let events = reporter.events.lock().clone();
        let search_progress: Vec<&String> = events.iter().filter(|e| e.ends_with("genome pairs.")).collect();
        assert_eq!(search_progress.len(), 15);
        assert_eq!(search_progress[14], "Finished processing 15 of 15 (100.00%) genome pairs.");
    }

    #[test]
    fn test_single_genome_skips_search() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(8, dir.path(), FailurePolicy::FailFast),
            Path::new("diamond"),
            FakeLauncher::new(),
            SequentialRunner,
            &reporter,
        );
        let summary = search.run(&genomes(1)).unwrap();
        assert_eq!(summary.get_build().unwrap().get_nb_tasks(), 1);
        assert_eq!(summary.get_build().unwrap().get_cpus_per_task(), 8);
        assert!(summary.get_search().is_none());
        assert_eq!(search.launcher.subcommands(), vec!["makedb"]);
        assert_eq!(search.get_state(), RunState::SearchDone);
        assert!(!reporter.events.lock().iter().any(|e| e.contains("SEARCH")));
    }

    #[test]
    fn test_no_genome() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(2, dir.path(), FailurePolicy::Collect),
            Path::new("diamond"),
            FakeLauncher::new(),
            SequentialRunner,
            &reporter,
        );
        let summary = search.run(&[]).unwrap();
        assert!(summary.get_build().is_none());
        assert!(summary.get_search().is_none());
        assert!(search.launcher.subcommands().is_empty());
        assert!(reporter.events.lock().is_empty());
    }

    #[test]
    fn test_ignore_policy_goes_on() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(2, dir.path(), FailurePolicy::Ignore),
            Path::new("diamond"),
            FakeLauncher::failing_on("g2.faa"),
            SequentialRunner,
            &reporter,
        );
        let summary = search.run(&genomes(3)).unwrap();
        assert_eq!(summary.get_build().unwrap().nb_failed(), 1);
        // g1-g2 fails on its reverse search, g2-g3 on its forward one
        assert_eq!(summary.get_search().unwrap().nb_failed(), 2);
        assert_eq!(search.launcher.subcommands().len(), 9);
        // failed tasks still count in progress
        let events = reporter.events.lock().clone();
        assert!(events.contains(&"Finished processing 3 of 3 (100.00%) genome pairs.".to_string()));
        assert!(events.contains(&"failed g2".to_string()));
        let tsv = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(tsv.contains("BUILD\tg2\tfailed\t"));
        assert!(tsv.contains("SEARCH\tg1-g3\tcompleted\t"));
    }

    #[test]
    fn test_fail_fast_stops_before_search() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(1, dir.path(), FailurePolicy::FailFast),
            Path::new("diamond"),
            FakeLauncher::failing_on("g1.faa"),
            SequentialRunner,
            &reporter,
        );
        match search.run(&genomes(3)) {
            Err(RbhError::FailFast { phase, failure }) => {
                assert_eq!(phase, ExecutionPhase::Build);
                assert_eq!(failure.task, "g1");
            }
            other => panic!("expected fail fast error, got {:?}", other),
        }
        assert_eq!(search.get_state(), RunState::BuildDone);
        assert_eq!(search.launcher.subcommands(), vec!["makedb"]);
        let tsv = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(tsv.contains("BUILD\tg1\tfailed\t"));
        assert!(tsv.contains("BUILD\tg2\tskipped\t"));
        assert!(tsv.contains("BUILD\tg3\tskipped\t"));
    }

    #[test]
    fn test_collect_reports_all_build_failures() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(3, dir.path(), FailurePolicy::Collect),
            Path::new("diamond"),
            FakeLauncher::failing_on("makedb"),
            RayonRunner,
            &reporter,
        );
        match search.run(&genomes(3)) {
            Err(RbhError::TaskFailures { phase, failures }) => {
                assert_eq!(phase, ExecutionPhase::Build);
                assert_eq!(failures.len(), 3);
            }
            other => panic!("expected collected failures, got {:?}", other),
        }
        // every build ran, no search did
        assert_eq!(search.launcher.subcommands(), vec!["makedb"; 3]);
    }

    #[test]
    fn test_collect_search_failure() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(3, dir.path(), FailurePolicy::Collect),
            Path::new("diamond"),
            FakeLauncher::failing_on("g3-g1.blastp.tsv"),
            SequentialRunner,
            &reporter,
        );
        match search.run(&genomes(3)) {
            Err(RbhError::TaskFailures { phase, failures }) => {
                assert_eq!(phase, ExecutionPhase::Search);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].task, "g1-g3");
            }
            other => panic!("expected collected failures, got {:?}", other),
        }
        assert_eq!(search.get_state(), RunState::SearchDone);
        assert_eq!(search.launcher.subcommands().len(), 9);
    }

    #[test]
    fn test_outputs_of_previous_run_are_not_accepted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["g1.db", "g2.db", "g1-g2.blastp.tsv", "g2-g1.blastp.tsv"] {
            std::fs::write(dir.path().join(name), b"previous run").unwrap();
        }
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(2, dir.path(), FailurePolicy::Collect),
            Path::new("diamond"),
            SilentLauncher,
            SequentialRunner,
            &reporter,
        );
        match search.run(&genomes(2)) {
            Err(RbhError::TaskFailures { phase, failures }) => {
                assert_eq!(phase, ExecutionPhase::Build);
                assert_eq!(failures.len(), 2);
                for failure in &failures {
                    assert!(matches!(failure.reason, FailureReason::MissingOutput(_)));
                }
            }
            other => panic!("expected missing outputs, got {:?}", other),
        }
        assert!(!dir.path().join("g1.db").exists());
        // search outputs are only cleared by the searches themselves
        assert!(dir.path().join("g1-g2.blastp.tsv").exists());
        //
        let reporter = CollectReporter::default();
        let mut search = ReciprocalSearch::with_program(
            params(2, dir.path(), FailurePolicy::Ignore),
            Path::new("diamond"),
            SilentLauncher,
            SequentialRunner,
            &reporter,
        );
        let summary = search.run(&genomes(2)).unwrap();
        assert_eq!(summary.get_search().unwrap().nb_failed(), 1);
        assert!(!dir.path().join("g1-g2.blastp.tsv").exists());
        assert!(!dir.path().join("g2-g1.blastp.tsv").exists());
    }

    #[test]
    fn test_new_checks_before_running() {
        let reporter = CollectReporter::default();
        let params = RunParams::new(2, 1e-3, "faa", Path::new("out")).with_tool("rbhsearch-missing-aligner-xyz");
        match ReciprocalSearch::new(params, FakeLauncher::new(), SequentialRunner, &reporter) {
            Err(RbhError::ToolNotFound { tool, .. }) => assert_eq!(tool, "rbhsearch-missing-aligner-xyz"),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("aligner should not be found"),
        }
        let params = RunParams::new(0, 1e-3, "faa", Path::new("out"));
        assert!(matches!(
            ReciprocalSearch::new(params, FakeLauncher::new(), SequentialRunner, &reporter),
            Err(RbhError::InvalidParameter(_))
        ));
    }
}
