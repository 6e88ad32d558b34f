//! The bug-to-file lexical similarity engine.
//!
//! Pipeline: raw text -> token stems -> per-token embedding matrices ->
//! word-to-word cosine similarity -> directional document scores -> ranked
//! top-K files with 2D projections, ready for serialization by the server.
//!
//! # Architecture
//!
//! - **token**: tokenizer/stemmer (camel-case splitting, Porter-family stems)
//! - **embedding**: frozen word-vector table loaded at startup
//! - **vectorize**: token sequence -> N x D matrix with OOV tracking
//! - **similarity**: cosine matrix and directional score reduction
//! - **rank**: top-K ordering and per-file top-word selection
//! - **project**: PCA/t-SNE 2D projection for the visualization front-end

pub mod embedding;
pub mod project;
pub mod rank;
pub mod similarity;
pub mod token;
pub mod vectorize;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::config::SimilarityConfig;

pub use embedding::EmbeddingTable;
pub use project::Projector;
pub use similarity::SimilarityArtifacts;
pub use token::tokenize_stems;
pub use vectorize::{vectorize, DocumentVectors};

/// Per-file artifacts for one returned candidate.
#[derive(Debug, Clone)]
pub struct FileArtifacts {
    /// Candidate filename, relative to the repository root.
    pub filename: String,
    /// The file's tokens restricted to its top word indices.
    pub tokens: Vec<String>,
    /// 2D projection of the top-word embedding rows.
    pub embedding_2d: Vec<[f64; 2]>,
    /// Word matrix trimmed to the top word columns (bug words x top words).
    pub word_to_word: Array2<f64>,
    /// Indices of the selected words in the file's full token list.
    pub top_word_indices: Vec<usize>,
    /// File-word-to-bug similarities for the selected words.
    pub file_word_to_bug: Vec<f64>,
    /// Bug-word-to-file similarities, full bug length.
    pub bug_word_to_file: Vec<f64>,
    /// Directional bug-to-file score.
    pub bug_to_file: f64,
    /// Directional file-to-bug score.
    pub file_to_bug: f64,
    /// Combined score used for ranking.
    pub combined: f64,
}

/// Result of localizing one bug report against a set of candidate files.
#[derive(Debug, Clone)]
pub struct Localization {
    /// Bug-report token stems.
    pub bug_tokens: Vec<String>,
    /// Fraction of bug tokens with an embedding.
    pub bug_found_ratio: f64,
    /// 2D projection of the bug-report embedding matrix.
    pub bug_embedding_2d: Vec<[f64; 2]>,
    /// Top-K candidates in descending combined-score order.
    pub files: Vec<FileArtifacts>,
    /// Fixed-size (filename, score) shortlist for quick display.
    pub shortlist: Vec<(String, f64)>,
}

/// Run the full localization pipeline for one bug report.
///
/// All candidate comparisons run in parallel; everything derived here is
/// request-local. Degenerate inputs (empty bug report, empty files) produce
/// zero scores rather than errors.
pub fn localize(
    bug_text: &str,
    files: &HashMap<String, Arc<DocumentVectors>>,
    table: &EmbeddingTable,
    projector: &Projector,
    config: &SimilarityConfig,
) -> Localization {
    let bug_tokens = tokenize_stems(bug_text, config.filter_stopwords);
    let bug = vectorize(bug_tokens, table);

    // Restricting to known stems keeps words without an embedding out of
    // the common-word normalization.
    let known_bug_stems: HashSet<String> = bug
        .tokens
        .iter()
        .filter(|stem| table.contains(stem))
        .cloned()
        .collect();

    let artifacts: HashMap<String, SimilarityArtifacts> = files
        .par_iter()
        .map(|(filename, vectors)| {
            let artifact = similarity::compare(&bug, vectors, &known_bug_stems, config.smoothing);
            (filename.clone(), artifact)
        })
        .collect();

    let scores: HashMap<String, f64> = artifacts
        .iter()
        .map(|(name, a)| (name.clone(), a.combined))
        .collect();

    let ranked = rank::rank_files(&scores, config.top_files);
    let shortlist = rank::rank_files(&scores, config.shortlist);

    let file_reports: Vec<FileArtifacts> = ranked
        .iter()
        .map(|(filename, _)| {
            let vectors = &files[filename];
            let artifact = &artifacts[filename];

            let indices =
                rank::top_word_indices(&vectors.tokens, &artifact.file_word_max, config.top_words);

            let tokens = indices
                .iter()
                .map(|&i| vectors.tokens[i].clone())
                .collect();
            let selected_rows = vectors.matrix.select(Axis(0), &indices);
            let word_to_word = artifact.word_to_word.select(Axis(1), &indices);
            let file_word_to_bug = indices.iter().map(|&i| artifact.file_word_max[i]).collect();

            FileArtifacts {
                filename: filename.clone(),
                tokens,
                embedding_2d: to_pairs(&projector.project(&selected_rows)),
                word_to_word,
                top_word_indices: indices,
                file_word_to_bug,
                bug_word_to_file: artifact.bug_word_max.to_vec(),
                bug_to_file: artifact.bug_to_file,
                file_to_bug: artifact.file_to_bug,
                combined: artifact.combined,
            }
        })
        .collect();

    Localization {
        bug_embedding_2d: to_pairs(&projector.project(&bug.matrix)),
        bug_found_ratio: bug.found_ratio,
        bug_tokens: bug.tokens,
        files: file_reports,
        shortlist,
    }
}

/// Convert an N x 2 coordinate matrix into row pairs.
pub fn to_pairs(coords: &Array2<f64>) -> Vec<[f64; 2]> {
    coords.outer_iter().map(|row| [row[0], row[1]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionConfig;

    fn table() -> EmbeddingTable {
        EmbeddingTable::from_vectors(
            vec![
                ("error".to_string(), vec![1.0, 0.0]),
                ("null".to_string(), vec![0.0, 1.0]),
                ("pointer".to_string(), vec![0.7, 0.7]),
            ],
            2,
        )
        .unwrap()
    }

    fn candidates(table: &EmbeddingTable) -> HashMap<String, Arc<DocumentVectors>> {
        let mut files = HashMap::new();
        for (name, content) in [
            ("Handler.java", "handleNullError()"),
            ("Widget.java", "drawButtonFrame()"),
        ] {
            let tokens = tokenize_stems(content, true);
            files.insert(name.to_string(), Arc::new(vectorize(tokens, table)));
        }
        files
    }

    #[test]
    fn test_localize_ranks_related_file_first() {
        let table = table();
        let files = candidates(&table);
        let projector = Projector::fit(&table, &ProjectionConfig::default()).unwrap();

        let result = localize(
            "NullPointerException error",
            &files,
            &table,
            &projector,
            &SimilarityConfig::default(),
        );

        assert_eq!(result.bug_tokens, vec!["null", "pointer", "except", "error"]);
        // "except" has no embedding
        assert!((result.bug_found_ratio - 0.75).abs() < 1e-12);
        assert_eq!(result.files[0].filename, "Handler.java");
        assert!(result.files[0].combined > result.files[1].combined);
        assert_eq!(result.shortlist[0].0, "Handler.java");
    }

    #[test]
    fn test_localize_trims_word_matrix() {
        let table = table();
        let files = candidates(&table);
        let projector = Projector::fit(&table, &ProjectionConfig::default()).unwrap();
        let config = SimilarityConfig {
            top_words: 2,
            ..SimilarityConfig::default()
        };

        let result = localize("NullPointerException error", &files, &table, &projector, &config);

        let handler = &result.files[0];
        assert_eq!(handler.top_word_indices.len(), 2);
        assert_eq!(handler.word_to_word.shape(), &[4, 2]);
        assert_eq!(handler.tokens.len(), 2);
        assert_eq!(handler.embedding_2d.len(), 2);
        assert_eq!(handler.bug_word_to_file.len(), 4);
    }

    #[test]
    fn test_localize_empty_bug_report() {
        let table = table();
        let files = candidates(&table);
        let projector = Projector::fit(&table, &ProjectionConfig::default()).unwrap();

        let result = localize("", &files, &table, &projector, &SimilarityConfig::default());

        assert!(result.bug_tokens.is_empty());
        assert_eq!(result.bug_found_ratio, 0.0);
        assert!(result.bug_embedding_2d.is_empty());
        for file in &result.files {
            assert_eq!(file.combined, 0.0);
        }
    }

    #[test]
    fn test_localize_respects_top_files() {
        let table = table();
        let files = candidates(&table);
        let projector = Projector::fit(&table, &ProjectionConfig::default()).unwrap();
        let config = SimilarityConfig {
            top_files: 1,
            ..SimilarityConfig::default()
        };

        let result = localize("null error", &files, &table, &projector, &config);
        assert_eq!(result.files.len(), 1);
        // shortlist is independent of the top-K truncation
        assert_eq!(result.shortlist.len(), 2);
    }
}
