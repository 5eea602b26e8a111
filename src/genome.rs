//! genomes given as input and the pairs we compare

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::files::remove_extension;

/// A genome : its id (file name without extension) and the path of its amino acid fasta file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeRecord {
    id: String,
    path: PathBuf,
}

impl GenomeRecord {
    pub fn new(id: &str, path: &Path) -> Self {
        GenomeRecord {
            id: id.to_string(),
            path: path.to_path_buf(),
        }
    }

    /// derive the id from the file name by removing extension
    pub fn from_path(path: &Path, extension: &str) -> Self {
        let id = remove_extension(path, extension);
        GenomeRecord {
            id,
            path: path.to_path_buf(),
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }
} // end of impl GenomeRecord

//==========================================================================================

/// (A,B) with A before B in input list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomePair<'a> {
    first: &'a GenomeRecord,
    second: &'a GenomeRecord,
}

impl<'a> GenomePair<'a> {
    pub fn get_first(&self) -> &'a GenomeRecord {
        self.first
    }

    pub fn get_second(&self) -> &'a GenomeRecord {
        self.second
    }
}

/// number of unordered pairs of n genomes, n*(n-1)/2
pub fn nb_pairs(nb_genomes: usize) -> usize {
    if nb_genomes < 2 {
        0
    } else {
        nb_genomes * (nb_genomes - 1) / 2
    }
}

/// all pairs (i,j) with i < j, enumerated in input order : (0,1), (0,2) ... (1,2) ...
pub fn genome_pairs(genomes: &[GenomeRecord]) -> Vec<GenomePair<'_>> {
    let mut pairs = Vec::with_capacity(nb_pairs(genomes.len()));
    for (i, first) in genomes.iter().enumerate() {
        for second in &genomes[i + 1..] {
            pairs.push(GenomePair { first, second });
        }
    }
    pairs
} // end of genome_pairs

//==========================================================================================

// end of mod tests
