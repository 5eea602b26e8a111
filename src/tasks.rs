//! Generation of the tasks of each phase and what a task reports when done.
//!
//! The BUILD phase has one [IndexBuildTask] per genome, the SEARCH phase one [PairwiseSearchTask]
//! per unordered pair of genomes. A search task references the index files of its two genomes,
//! so search tasks must only be generated once BUILD is drained.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::diamond::Diamond;
use crate::genome::{genome_pairs, GenomeRecord};
use crate::process::Invocation;

/// suffix of index files
pub const INDEX_SUFFIX: &str = ".db";
/// suffix of hit tables
pub const HITS_SUFFIX: &str = ".blastp.tsv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionPhase {
    Build,
    Search,
}

impl ExecutionPhase {
    /// what the tasks of the phase process, used in progress messages
    pub fn item_label(&self) -> &'static str {
        match self {
            ExecutionPhase::Build => "genomes",
            ExecutionPhase::Search => "genome pairs",
        }
    }
}

/// index file of a genome : `<output_dir>/<genome_id>.db`
pub fn index_path(output_dir: &Path, genome_id: &str) -> PathBuf {
    output_dir.join(format!("{}{}", genome_id, INDEX_SUFFIX))
}

/// hits of query genome against target genome : `<output_dir>/<query_id>-<target_id>.blastp.tsv`
pub fn hits_path(output_dir: &Path, query_id: &str, target_id: &str) -> PathBuf {
    output_dir.join(format!("{}-{}{}", query_id, target_id, HITS_SUFFIX))
}

/// Something dispatched to a worker. It issues its invocations one after the other.
pub trait Task: Sync {
    /// identification in logs and summary
    fn label(&self) -> String;

    /// invocations of the aligner, each allowed to use nb_threads threads
    fn invocations(&self, diamond: &Diamond, nb_threads: usize) -> Vec<Invocation>;
}

//==========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuildTask {
    genome: GenomeRecord,
    index: PathBuf,
}

impl IndexBuildTask {
    pub fn new(genome: &GenomeRecord, output_dir: &Path) -> Self {
        IndexBuildTask {
            genome: genome.clone(),
            index: index_path(output_dir, genome.get_id()),
        }
    }

    pub fn get_genome(&self) -> &GenomeRecord {
        &self.genome
    }

    pub fn get_index_path(&self) -> &Path {
        &self.index
    }
}

impl Task for IndexBuildTask {
    fn label(&self) -> String {
        self.genome.get_id().to_string()
    }

    fn invocations(&self, diamond: &Diamond, nb_threads: usize) -> Vec<Invocation> {
        vec![diamond.makedb(self, nb_threads)]
    }
}

/// one task per genome, in input order
pub fn generate_build_tasks(genomes: &[GenomeRecord], output_dir: &Path) -> Vec<IndexBuildTask> {
    genomes
        .iter()
        .map(|g| IndexBuildTask::new(g, output_dir))
        .collect()
}

//==========================================================================================

/// query genome searched against the index of a target genome
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedSearch {
    query: GenomeRecord,
    target_id: String,
    target_index: PathBuf,
    output: PathBuf,
}

impl DirectedSearch {
    fn new(query: &GenomeRecord, target: &GenomeRecord, output_dir: &Path) -> Self {
        DirectedSearch {
            query: query.clone(),
            target_id: target.get_id().to_string(),
            target_index: index_path(output_dir, target.get_id()),
            output: hits_path(output_dir, query.get_id(), target.get_id()),
        }
    }

    pub fn get_query(&self) -> &GenomeRecord {
        &self.query
    }

    pub fn get_target_id(&self) -> &str {
        &self.target_id
    }

    pub fn get_target_index(&self) -> &Path {
        &self.target_index
    }

    pub fn get_output(&self) -> &Path {
        &self.output
    }
} // end of impl DirectedSearch

/// The two directed searches A against B and B against A of a genome pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseSearchTask {
    forward: DirectedSearch,
    reverse: DirectedSearch,
}

impl PairwiseSearchTask {
    pub fn new(first: &GenomeRecord, second: &GenomeRecord, output_dir: &Path) -> Self {
        PairwiseSearchTask {
            forward: DirectedSearch::new(first, second, output_dir),
            reverse: DirectedSearch::new(second, first, output_dir),
        }
    }

    /// A against B's index then B against A's index
    pub fn get_searches(&self) -> [&DirectedSearch; 2] {
        [&self.forward, &self.reverse]
    }

    /// the 2 hit tables the task writes : A-B and B-A
    pub fn output_paths(&self) -> [&Path; 2] {
        [self.forward.get_output(), self.reverse.get_output()]
    }
}

impl Task for PairwiseSearchTask {
    fn label(&self) -> String {
        format!("{}-{}", self.forward.get_query().get_id(), self.reverse.get_query().get_id())
    }

    fn invocations(&self, diamond: &Diamond, nb_threads: usize) -> Vec<Invocation> {
        self.get_searches()
            .iter()
            .map(|search| diamond.blastp(search, nb_threads))
            .collect()
    }
}

/// one task per unordered pair of genomes, pairs enumerated in input order
pub fn generate_search_tasks(genomes: &[GenomeRecord], output_dir: &Path) -> Vec<PairwiseSearchTask> {
    genome_pairs(genomes)
        .iter()
        .map(|pair| PairwiseSearchTask::new(pair.get_first(), pair.get_second(), output_dir))
        .collect()
}

//==========================================================================================

/// Why an invocation of a task is considered failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("could not be launched : {0}")]
    Launch(String),

    #[error("exited with status {} : {stderr}", .code.map_or("killed by signal".to_string(), |c| c.to_string()))]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("exited normally but did not produce {0:?}")]
    MissingOutput(PathBuf),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{phase} task {task}, `{command}` {reason}")]
pub struct TaskFailure {
    pub phase: ExecutionPhase,
    pub task: String,
    pub command: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// all invocations ran and produced their output
    Completed,
    /// at least one invocation failed
    Failed,
    /// not started because a failure stopped the phase
    Skipped,
}

/// what a worker returns to the runner for each task
#[derive(Debug, Clone)]
pub struct TaskReport {
    phase: ExecutionPhase,
    task: String,
    status: TaskStatus,
    failures: Vec<TaskFailure>,
}

impl TaskReport {
    pub fn finished(phase: ExecutionPhase, task: String, failures: Vec<TaskFailure>) -> Self {
        let status = if failures.is_empty() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        TaskReport {
            phase,
            task,
            status,
            failures,
        }
    }

    pub fn skipped(phase: ExecutionPhase, task: String) -> Self {
        TaskReport {
            phase,
            task,
            status: TaskStatus::Skipped,
            failures: Vec::new(),
        }
    }

    pub fn get_phase(&self) -> ExecutionPhase {
        self.phase
    }

    pub fn get_task(&self) -> &str {
        &self.task
    }

    pub fn get_status(&self) -> TaskStatus {
        self.status
    }

    pub fn get_failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
} // end of impl TaskReport

//==========================================================================================

// end of mod tests
