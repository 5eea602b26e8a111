//! This file contains genome file selection, identification and output directory creation

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::{RbhError, Result};
use crate::genome::GenomeRecord;

/// Genome id of a file : the file name without its directory and without extension.
/// extension can be given with or without its leading dot. If it is empty the last extension is removed,
/// if the name does not end with it the whole file name is kept.
pub fn remove_extension(path: &Path, extension: &str) -> String {
    let filename = match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => return path.to_string_lossy().to_string(),
    };
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return match Path::new(&filename).file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => filename,
        };
    }
    let dotted = format!(".{}", extension);
    match filename.strip_suffix(&dotted) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => filename,
    }
} // end of remove_extension

/// returns true if file name ends with extension. With an empty extension any file having one is kept,
/// as [remove_extension] then strips the last one.
fn has_extension(path: &Path, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return path.extension().is_some();
    }
    match path.file_name() {
        Some(name) => name.to_string_lossy().ends_with(&format!(".{}", extension)),
        None => false,
    }
}

/// two genomes with the same id would write the same index and hit files.
pub fn check_unique_ids(genomes: &[GenomeRecord]) -> Result<()> {
    let mut seen = HashMap::<&str, &Path>::with_capacity(genomes.len());
    for genome in genomes {
        if let Some(first) = seen.insert(genome.get_id(), genome.get_path()) {
            return Err(RbhError::DuplicateGenome {
                id: genome.get_id().to_string(),
                first: first.to_path_buf(),
                second: genome.get_path().to_path_buf(),
            });
        }
    }
    Ok(())
}

/// records from explicit paths, order is kept
pub fn genome_records(paths: &[PathBuf], extension: &str) -> Result<Vec<GenomeRecord>> {
    let genomes: Vec<GenomeRecord> = paths
        .iter()
        .map(|p| GenomeRecord::from_path(p, extension))
        .collect();
    check_unique_ids(&genomes)?;
    Ok(genomes)
}

/// reads a file with one genome path per line. Blank lines and lines beginning with # are skipped
pub fn read_genome_list(list: &Path, extension: &str) -> Result<Vec<GenomeRecord>> {
    let file = File::open(list).map_err(|e| RbhError::io(list, e))?;
    let mut paths = Vec::<PathBuf>::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| RbhError::io(list, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(line));
    }
    log::debug!("read {} genome paths from {:?}", paths.len(), list);
    genome_records(&paths, extension)
} // end of read_genome_list

// recursive part of scan_genome_dir
fn collect_files(dir: &Path, extension: &str, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| RbhError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| RbhError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, extension, paths)?;
        } else if has_extension(&path, extension) {
            paths.push(path);
        }
    }
    Ok(())
}

/// scan directory recursively keeping files with the genome extension, sorted by path
pub fn scan_genome_dir(dir: &Path, extension: &str) -> Result<Vec<GenomeRecord>> {
    let mut paths = Vec::<PathBuf>::new();
    collect_files(dir, extension, &mut paths)?;
    // read_dir order depends on the file system
    paths.sort();
    log::info!("found {} files with extension {} in {:?}", paths.len(), extension, dir);
    genome_records(&paths, extension)
} // end of scan_genome_dir

/// creates output directory and its parents if needed
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        log::info!("creating output directory {:?}", dir);
        fs::create_dir_all(dir).map_err(|e| RbhError::io(dir, e))?;
    }
    Ok(())
}

//==========================================================================================
