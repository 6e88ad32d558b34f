//! Document vectorization: token sequence to per-token embedding matrix.

use ndarray::Array2;

use super::embedding::EmbeddingTable;

/// Derived vector data for one document.
///
/// Always structurally uniform: `matrix` row i is the embedding of token i,
/// or all-zero when the token is out of vocabulary. `found_ratio` is the
/// fraction of tokens present in the table, a diagnostic only.
#[derive(Debug, Clone)]
pub struct DocumentVectors {
    /// Ordered stem sequence the matrix rows correspond to.
    pub tokens: Vec<String>,
    /// N x D embedding matrix.
    pub matrix: Array2<f64>,
    /// Fraction of tokens found in the table; 0.0 for an empty document.
    pub found_ratio: f64,
}

impl DocumentVectors {
    /// Number of tokens N.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the document has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Build the embedding matrix for a token sequence.
///
/// Pure function of its inputs; out-of-vocabulary tokens leave their row at
/// zero. The empty-document case is an explicit branch so the found ratio
/// never divides by zero.
pub fn vectorize(tokens: Vec<String>, table: &EmbeddingTable) -> DocumentVectors {
    let n = tokens.len();
    let mut matrix = Array2::zeros((n, table.dimension()));

    if n == 0 {
        return DocumentVectors {
            tokens,
            matrix,
            found_ratio: 0.0,
        };
    }

    let mut found = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if let Some(vector) = table.lookup(token) {
            matrix.row_mut(i).assign(vector);
            found += 1;
        }
    }

    DocumentVectors {
        found_ratio: found as f64 / n as f64,
        tokens,
        matrix,
    }
}
