//! rbhsearch drives the diamond aligner to produce the hit tables needed by a
//! reciprocal best hit analysis between all pairs of a collection of genomes.
//!
//! A run has two phases separated by a barrier:
//! - BUILD : one `diamond makedb` per genome, giving `<outdir>/<genome_id>.db`
//! - SEARCH : for each unordered pair (A,B) of genomes, two `diamond blastp` with swapped roles
//!   giving `<outdir>/<idA>-<idB>.blastp.tsv` and `<outdir>/<idB>-<idA>.blastp.tsv`
//!
//! The cpu budget is split between concurrent invocations by [cpus::allocate_cpus],
//! tasks are dispatched by a [runner::TaskRunner] and progress goes to a [progress::Reporter].

pub mod cpus;
pub mod diamond;
pub mod errors;
pub mod genome;
pub mod orchestrator;
pub mod process;
pub mod progress;
pub mod runner;
pub mod tasks;
pub mod utils;

pub use errors::{RbhError, Result};
pub use genome::{GenomePair, GenomeRecord};
pub use orchestrator::{ReciprocalSearch, RunState, RunSummary};
pub use utils::parameters::{FailurePolicy, RunParams};
