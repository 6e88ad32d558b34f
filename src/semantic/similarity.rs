//! Word-to-word cosine similarity and its reduction to document scores.
//!
//! The word matrix rewards paraphrastic overlap: each word is credited with
//! its best match in the other document. Dividing by the common-word count
//! normalizes for shared vocabulary size rather than raw length, so long
//! files are not penalized purely for being long.

use std::collections::HashSet;

use ndarray::{Array1, Array2, Axis};

use super::vectorize::DocumentVectors;

/// Similarity artifacts between one bug report and one candidate file.
#[derive(Debug, Clone)]
pub struct SimilarityArtifacts {
    /// N x M cosine matrix (bug words x file words).
    pub word_to_word: Array2<f64>,
    /// Per-bug-word maximum over file words (length N).
    pub bug_word_max: Array1<f64>,
    /// Per-file-word maximum over bug words (length M).
    pub file_word_max: Array1<f64>,
    /// Smoothed count of distinct stems shared by both documents.
    pub common_word_count: f64,
    /// Directional bug-to-file score.
    pub bug_to_file: f64,
    /// Directional file-to-bug score.
    pub file_to_bug: f64,
    /// Sum of both directions; the ranking key.
    pub combined: f64,
}

/// Compute the pairwise cosine matrix between two embedding matrices.
///
/// Rows are L2-normalized; an all-zero row (OOV token) keeps cosine 0
/// against everything, since cosine is undefined for the zero vector.
pub fn cosine_matrix(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    normalize_rows(a).dot(&normalize_rows(b).t())
}

fn normalize_rows(matrix: &Array2<f64>) -> Array2<f64> {
    let mut out = matrix.clone();
    for mut row in out.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
    out
}

/// Compare a bug report against one candidate file.
///
/// `known_bug_stems` is the bug's stem set restricted to the embedding
/// vocabulary, computed once per request. A zero-token document on either
/// side yields zero scores by convention rather than a division by zero.
pub fn compare(
    bug: &DocumentVectors,
    file: &DocumentVectors,
    known_bug_stems: &HashSet<String>,
    smoothing: f64,
) -> SimilarityArtifacts {
    let n = bug.len();
    let m = file.len();

    let file_stems: HashSet<&str> = file.tokens.iter().map(String::as_str).collect();
    let common = known_bug_stems
        .iter()
        .filter(|stem| file_stems.contains(stem.as_str()))
        .count();
    let common_word_count = common as f64 + smoothing;

    if n == 0 || m == 0 {
        return SimilarityArtifacts {
            word_to_word: Array2::zeros((n, m)),
            bug_word_max: Array1::zeros(n),
            file_word_max: Array1::zeros(m),
            common_word_count,
            bug_to_file: 0.0,
            file_to_bug: 0.0,
            combined: 0.0,
        };
    }

    let word_to_word = cosine_matrix(&bug.matrix, &file.matrix);
    let bug_word_max = word_to_word.fold_axis(Axis(1), f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let file_word_max = word_to_word.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));

    let bug_to_file = bug_word_max.sum() / common_word_count;
    let file_to_bug = file_word_max.sum() / common_word_count;

    SimilarityArtifacts {
        word_to_word,
        bug_word_max,
        file_word_max,
        common_word_count,
        bug_to_file,
        file_to_bug,
        combined: bug_to_file + file_to_bug,
    }
}
