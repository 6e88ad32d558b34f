//! Ranking of candidate files and selection of their most relevant words.

use std::cmp::Ordering;
use std::collections::HashMap;

use ndarray::Array1;

/// Order files by descending combined score and truncate to `top_k`.
///
/// Ties break on filename so repeated runs over the same inputs produce the
/// same ordering.
pub fn rank_files(scores: &HashMap<String, f64>, top_k: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scores
        .iter()
        .map(|(name, &score)| (name.clone(), score))
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(top_k);
    ranked
}

/// Select the indices of a file's most relevant words.
///
/// Repeated identical stems are collapsed: only the first occurrence of each
/// stem keeps its similarity, the rest are zeroed before selection, so a
/// token repeated hundreds of times is not redundantly reported. Returned
/// indices point into the file's token list, ordered by descending
/// file-word-to-bug similarity.
pub fn top_word_indices(
    tokens: &[String],
    file_word_max: &Array1<f64>,
    limit: usize,
) -> Vec<usize> {
    debug_assert_eq!(tokens.len(), file_word_max.len());

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (i, token) in tokens.iter().enumerate() {
        first_seen.entry(token.as_str()).or_insert(i);
    }

    let mut keyed: Vec<(usize, f64)> = (0..tokens.len())
        .map(|i| {
            let similarity = if first_seen[tokens[i].as_str()] == i {
                file_word_max[i]
            } else {
                0.0
            };
            (i, similarity)
        })
        .collect();

    keyed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    keyed.truncate(limit);
    keyed.into_iter().map(|(i, _)| i).collect()
}
