//! structures related to run parameters

use std::fs::OpenOptions;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::to_writer_pretty;
use strum_macros::{Display, EnumString};

use crate::diamond::DIAMOND;
use crate::errors::{RbhError, Result};

/// name of parameters dump in output directory
pub const PARAMETERS_FILE: &str = "parameters.json";

/// default e-value threshold of searches
pub const DEFAULT_EVALUE: f64 = 1e-3;

/// default extension of genome files
pub const DEFAULT_EXTENSION: &str = "faa";

/// What to do when an invocation of the aligner fails (non zero exit, launch error, no output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// failure is logged, task counts as completed and run goes on
    #[default]
    Ignore,
    /// no new task is started after a failure, run stops at end of phase
    FailFast,
    /// phase is drained, all failures are returned at its end
    Collect,
}

//==========================================================================================

/// Gathers what a run needs. Dumped in output directory at start of run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// total cpu budget
    cpus: usize,
    /// e-value threshold passed to searches
    evalue: f64,
    /// extension of genome files, removed to get genome ids
    extension: String,
    output_dir: PathBuf,
    /// name or path of aligner
    tool: String,
    failure_policy: FailurePolicy,
}

impl RunParams {
    pub fn new(cpus: usize, evalue: f64, extension: &str, output_dir: &Path) -> Self {
        RunParams {
            cpus,
            evalue,
            extension: extension.to_string(),
            output_dir: output_dir.to_path_buf(),
            tool: DIAMOND.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = tool.to_string();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn get_cpus(&self) -> usize {
        self.cpus
    }

    pub fn get_evalue(&self) -> f64 {
        self.evalue
    }

    pub fn get_extension(&self) -> &str {
        &self.extension
    }

    pub fn get_output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn get_tool(&self) -> &str {
        &self.tool
    }

    pub fn get_failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// cpus must be positive, evalue a positive finite number
    pub fn validate(&self) -> Result<()> {
        if self.cpus == 0 {
            return Err(RbhError::InvalidParameter("number of cpus must be at least 1".to_string()));
        }
        if !(self.evalue.is_finite() && self.evalue > 0.) {
            return Err(RbhError::InvalidParameter(format!(
                "e-value must be a positive number, got {}",
                self.evalue
            )));
        }
        if self.tool.is_empty() {
            return Err(RbhError::InvalidParameter("aligner name is empty".to_string()));
        }
        Ok(())
    } // end of validate

    /// dumps parameters in dirpath/parameters.json
    pub fn dump_json(&self, dirpath: &Path) -> Result<PathBuf> {
        let filepath = dirpath.join(PARAMETERS_FILE);
        log::info!("dumping RunParams in json file : {:?}", filepath);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&filepath)
            .map_err(|e| RbhError::io(&filepath, e))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &self)?;
        Ok(filepath)
    } // end of dump_json

    /// reload from a json dump, to check what a previous run used
    pub fn reload_json(dirpath: &Path) -> Result<Self> {
        let filepath = dirpath.join(PARAMETERS_FILE);
        log::info!("reloading RunParams from {:?}", filepath);
        let file = OpenOptions::new()
            .read(true)
            .open(&filepath)
            .map_err(|e| RbhError::io(&filepath, e))?;
        let params: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(params)
    } // end of reload_json
} // end of impl RunParams

//==========================================================================================
