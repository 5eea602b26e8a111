//! rbhsearch : diamond hits between all pairs of a set of genomes
//!
//! rbhsearch --genome-dir dir --outdir [-o] outdir [--cpus [-t] n] [--evalue [-e] e]
//!
//! Genomes (amino acid fasta of their genes) are given by exactly one of :
//!
//! --genomes : genome files listed on the command line
//!
//! --genome-list : a file with one genome file per line, blank lines and lines beginning with # are skipped
//!
//! --genome-dir : a directory scanned recursively for files ending with the extension
//!
//! --extension [-x] : removed from file names to get genome ids, ids must be unique. Default is faa.
//!     With an empty extension any file having an extension is taken and its last extension removed.
//!
//! --outdir [-o] : directory receiving indexes and hit tables. Mandatory.
//!
//! --cpus [-t] : total number of threads shared by concurrent diamond invocations. Default is the number of cpus.
//!
//! --evalue [-e] : e-value threshold of searches. Default is 1e-3.
//!
//! --on-failure : what to do when a diamond invocation fails
//!     - ignore : failures are logged, the run goes on (default)
//!     - fail-fast : no task is started after a failure and the run stops
//!     - collect : each phase runs to its end, then all failures are reported
//!
//! --tool : name or path of the diamond executable. Default is diamond, looked up on the PATH.
//!
//! --runner : rayon (default) or channel, how tasks are dispatched to workers.
//!
//! The output directory receives `<id>.db.dmnd` for each genome, `<idA>-<idB>.blastp.tsv` for each
//! ordered pair of genomes, parameters.json, and rbhsearch.tasks.tsv giving the status of each task.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use env_logger::Builder;

use rbhsearch::process::SystemLauncher;
use rbhsearch::progress::LogReporter;
use rbhsearch::runner::{ChannelRunner, RayonRunner, TaskRunner};
use rbhsearch::utils::files::{genome_records, read_genome_list, scan_genome_dir};
use rbhsearch::utils::parameters::{DEFAULT_EXTENSION, DEFAULT_EVALUE};
use rbhsearch::{FailurePolicy, GenomeRecord, ReciprocalSearch, RunParams, RunSummary};

// install a logger facility
pub fn init_log() -> u64 {
    Builder::from_default_env().init();
    println!("\n ************** initializing logger *****************\n");
    1
}

fn build_command() -> Command {
    Command::new("rbhsearch")
        .version("0.1.0")
        .about("Diamond hits between all pairs of genomes, for reciprocal best hit analysis")
        .arg(
            Arg::new("genomes")
                .long("genomes")
                .value_name("FILE")
                .help("genome files (amino acid fasta)")
                .num_args(1..)
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("genome_list")
                .long("genome-list")
                .value_name("FILE")
                .help("file with one genome file per line")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("genome_dir")
                .long("genome-dir")
                .value_name("DIR")
                .help("directory scanned recursively for genome files")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .group(
            ArgGroup::new("input")
                .args(["genomes", "genome_list", "genome_dir"])
                .required(true),
        )
        .arg(
            Arg::new("extension")
                .short('x')
                .long("extension")
                .help("extension of genome files, removed to get genome ids")
                .default_value(DEFAULT_EXTENSION)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("outdir")
                .short('o')
                .long("outdir")
                .value_name("DIR")
                .help("directory receiving indexes, hit tables and run summary")
                .required(true)
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("cpus")
                .short('t')
                .long("cpus")
                .help("total number of threads, default is the number of cpus")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("evalue")
                .short('e')
                .long("evalue")
                .help("e-value threshold of searches, default 1e-3")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("on_failure")
                .long("on-failure")
                .help("what to do when a diamond invocation fails")
                .default_value("ignore")
                .value_parser(["ignore", "fail-fast", "collect"])
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("tool")
                .long("tool")
                .help("name or path of diamond executable")
                .default_value(rbhsearch::diamond::DIAMOND)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("runner")
                .long("runner")
                .help("dispatching of tasks : rayon pool or crossbeam channel workers")
                .default_value("rayon")
                .value_parser(["rayon", "channel"])
                .action(ArgAction::Set),
        )
} // end of build_command

fn get_value<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T> {
    matches
        .get_one::<T>(id)
        .ok_or_else(|| anyhow!("argument {} has no value", id))
}

// genome records from whichever input option was given
fn parse_genomes(matches: &ArgMatches, extension: &str) -> anyhow::Result<Vec<GenomeRecord>> {
    let genomes = if let Some(files) = matches.get_many::<PathBuf>("genomes") {
        let paths: Vec<PathBuf> = files.cloned().collect();
        genome_records(&paths, extension)?
    } else if let Some(list) = matches.get_one::<PathBuf>("genome_list") {
        read_genome_list(list, extension)?
    } else if let Some(dir) = matches.get_one::<PathBuf>("genome_dir") {
        if !dir.is_dir() {
            return Err(anyhow!("not a directory : {:?}", dir));
        }
        scan_genome_dir(dir, extension)?
    } else {
        return Err(anyhow!("one of --genomes, --genome-list, --genome-dir is mandatory"));
    };
    Ok(genomes)
}

fn parse_params(matches: &ArgMatches) -> anyhow::Result<RunParams> {
    let outdir = get_value::<PathBuf>(matches, "outdir")?;
    let extension = get_value::<String>(matches, "extension")?;
    let cpus = matches.get_one::<usize>("cpus").copied().unwrap_or_else(num_cpus::get);
    let evalue = matches.get_one::<f64>("evalue").copied().unwrap_or(DEFAULT_EVALUE);
    let tool = get_value::<String>(matches, "tool")?;
    let policy = get_value::<String>(matches, "on_failure")?;
    let policy = FailurePolicy::from_str(policy).map_err(|_| anyhow!("unknown failure policy {}", policy))?;
    let params = RunParams::new(cpus, evalue, extension, outdir)
        .with_tool(tool)
        .with_failure_policy(policy);
    log::debug!("run parameters : {:?}", params);
    Ok(params)
}

fn run_with<E: TaskRunner>(params: RunParams, runner: E, genomes: &[GenomeRecord]) -> anyhow::Result<RunSummary> {
    let reporter = LogReporter;
    let mut search = ReciprocalSearch::new(params, SystemLauncher, runner, &reporter)?;
    let summary = search.run(genomes)?;
    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    let _ = init_log();
    let start_t = chrono::Local::now();
    log::info!("rbhsearch begins at time:{:#?}", start_t);
    //
    let matches = build_command().get_matches();
    let params = parse_params(&matches)?;
    let genomes = parse_genomes(&matches, params.get_extension())?;
    if genomes.is_empty() {
        log::warn!("no genome file found with extension {}", params.get_extension());
    } else {
        log::info!("processing {} genomes", genomes.len());
    }
    //
    let runner = get_value::<String>(&matches, "runner")?;
    let summary = match runner.as_str() {
        "channel" => run_with(params, ChannelRunner, &genomes)?,
        _ => run_with(params, RayonRunner, &genomes)?,
    };
    if summary.nb_failed() > 0 {
        log::warn!("{} task(s) failed, see task summary in output directory", summary.nb_failed());
    }
    //
    let end_t = chrono::Local::now();
    log::info!("rbhsearch ends at time:{:#?}", end_t);
    log::info!("elapsed time(s) {}", end_t.signed_duration_since(start_t).num_seconds());
    Ok(())
} // end of main

//==========================================================================================
