//! Command lines of diamond.
//!
//! - index : `diamond makedb -p threads --in genes.faa -d outdir/genome_id.db`
//! - search : `diamond blastp --compress 0 -p threads -q query.faa -d outdir/target.db -o outdir/query-target.blastp.tsv -k 1 -e evalue`
//!
//! `-k 1` keeps the best hit of each query sequence only, `--compress 0` writes plain tables.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::process::Invocation;
use crate::tasks::{DirectedSearch, IndexBuildTask};

/// name looked up on the PATH when no tool is given
pub const DIAMOND: &str = "diamond";

/// diamond appends this to the database name it is given
const DMND_SUFFIX: &str = ".dmnd";

/// number of hits kept for each query sequence
const MAX_TARGET_SEQS: usize = 1;

#[derive(Debug, Clone)]
pub struct Diamond {
    program: PathBuf,
    evalue: f64,
}

impl Diamond {
    pub fn new(program: &Path, evalue: f64) -> Self {
        Diamond {
            program: program.to_path_buf(),
            evalue,
        }
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_evalue(&self) -> f64 {
        self.evalue
    }

    /// index construction of a genome
    pub fn makedb(&self, task: &IndexBuildTask, nb_threads: usize) -> Invocation {
        let index = task.get_index_path();
        let mut dmnd = OsString::from(index.as_os_str());
        dmnd.push(DMND_SUFFIX);
        Invocation::new(&self.program)
            .arg("makedb")
            .arg("-p")
            .arg(nb_threads.to_string())
            .arg("--in")
            .arg(task.get_genome().get_path())
            .arg("-d")
            .arg(index)
            .produces(index)
            .produces(Path::new(&dmnd))
    } // end of makedb

    /// one directed search, query genes against target index
    pub fn blastp(&self, search: &DirectedSearch, nb_threads: usize) -> Invocation {
        Invocation::new(&self.program)
            .arg("blastp")
            .arg("--compress")
            .arg("0")
            .arg("-p")
            .arg(nb_threads.to_string())
            .arg("-q")
            .arg(search.get_query().get_path())
            .arg("-d")
            .arg(search.get_target_index())
            .arg("-o")
            .arg(search.get_output())
            .arg("-k")
            .arg(MAX_TARGET_SEQS.to_string())
            .arg("-e")
            .arg(self.evalue.to_string())
            .produces(search.get_output())
    } // end of blastp
} // end of impl Diamond
