//! Frozen word-embedding table loaded from a pre-trained vector file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::{Array1, Array2};

use crate::core::{progress, Error, Result};

/// Immutable mapping from word to a fixed-dimension embedding vector.
///
/// Built once at process start and read-only afterwards. Every vector has
/// exactly `dimension` components; a mismatched line aborts the load.
#[derive(Debug)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Array1<f64>>,
    dimension: usize,
}

impl EmbeddingTable {
    /// Load a table from a text file with one `word v1 .. vD` line per entry.
    pub fn load(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::embedding(format!("cannot open {}: {e}", path.display()))
        })?;

        let spinner = progress::create_spinner("Loading embedding table...");
        let mut vectors = HashMap::new();

        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let word = fields.next().ok_or_else(|| {
                Error::embedding(format!("line {}: missing word", line_no + 1))
            })?;
            let coefficients = fields
                .map(|f| {
                    f.parse::<f64>().map_err(|e| {
                        Error::embedding(format!("line {}: {e}", line_no + 1))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            if coefficients.len() != dimension {
                return Err(Error::embedding(format!(
                    "line {}: expected {} components, found {}",
                    line_no + 1,
                    dimension,
                    coefficients.len()
                )));
            }
            vectors.insert(word.to_string(), Array1::from(coefficients));

            if vectors.len() % 10_000 == 0 {
                spinner.set_message(format!("Loading embedding table... {} words", vectors.len()));
            }
        }

        spinner.finish_and_clear();

        if vectors.is_empty() {
            return Err(Error::embedding(format!(
                "{} contains no vectors",
                path.display()
            )));
        }

        Ok(Self { vectors, dimension })
    }

    /// Build a table from in-memory pairs, validating dimensions.
    pub fn from_vectors(
        pairs: impl IntoIterator<Item = (String, Vec<f64>)>,
        dimension: usize,
    ) -> Result<Self> {
        let mut vectors = HashMap::new();
        for (word, coefficients) in pairs {
            if coefficients.len() != dimension {
                return Err(Error::embedding(format!(
                    "vector for {word:?} has {} components, expected {dimension}",
                    coefficients.len()
                )));
            }
            vectors.insert(word, Array1::from(coefficients));
        }
        Ok(Self { vectors, dimension })
    }

    /// Look up the embedding of a word.
    pub fn lookup(&self, word: &str) -> Option<&Array1<f64>> {
        self.vectors.get(word)
    }

    /// Check whether a word is in the vocabulary.
    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    /// Vector dimension D.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of words in the vocabulary.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Stack the whole vocabulary into a (len, D) matrix.
    ///
    /// Rows are ordered by word so repeated calls produce the same matrix;
    /// the global projection fit depends on this.
    pub fn stacked(&self) -> Array2<f64> {
        let mut words: Vec<&String> = self.vectors.keys().collect();
        words.sort();

        let mut matrix = Array2::zeros((words.len(), self.dimension));
        for (i, word) in words.iter().enumerate() {
            matrix.row_mut(i).assign(&self.vectors[*word]);
        }
        matrix
    }
}
