//! 2D projection of embedding matrices for visualization.
//!
//! A PCA model is fitted once, at startup, over the whole embedding
//! vocabulary, so projected coordinates are comparable across requests. The
//! t-SNE refinement runs on top of the PCA coordinates and is only used by
//! the dedicated projection endpoint.

use linfa::dataset::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_reduction::Pca;
use ndarray::Array2;

use super::embedding::EmbeddingTable;
use crate::config::ProjectionConfig;
use crate::core::{Error, Result};

/// Minimum sample count for t-SNE refinement; below this the PCA
/// coordinates are returned unchanged.
const MIN_REFINE_SAMPLES: usize = 16;

/// Fitted 2D projection model, read-only after construction.
pub struct Projector {
    pca: Pca<f64>,
    perplexity: f64,
    epochs: usize,
}

impl Projector {
    /// Fit the PCA model over the whole embedding vocabulary.
    pub fn fit(table: &EmbeddingTable, config: &ProjectionConfig) -> Result<Self> {
        if table.len() < 2 {
            return Err(Error::projection(
                "need at least 2 vocabulary entries to fit a projection",
            ));
        }

        let dataset = DatasetBase::from(table.stacked());
        let pca = Pca::params(2)
            .fit(&dataset)
            .map_err(|e| Error::projection(e.to_string()))?;

        Ok(Self {
            pca,
            perplexity: config.perplexity,
            epochs: config.epochs,
        })
    }

    /// Project an N x D embedding matrix to N x 2 coordinates.
    pub fn project(&self, matrix: &Array2<f64>) -> Array2<f64> {
        if matrix.nrows() == 0 {
            return Array2::zeros((0, 2));
        }
        self.pca.predict(matrix)
    }

    /// Project and refine with t-SNE for better visual cluster separation.
    ///
    /// Inputs with fewer than [`MIN_REFINE_SAMPLES`] rows fall back to the
    /// plain PCA coordinates; t-SNE is degenerate there.
    pub fn refine(&self, matrix: &Array2<f64>) -> Result<Array2<f64>> {
        let coords = self.project(matrix);
        let n = coords.nrows();
        if n < MIN_REFINE_SAMPLES {
            return Ok(coords);
        }

        // bhtsne requires 3 * perplexity <= n - 1; keep a margin of one.
        let perplexity = self
            .perplexity
            .min((n as f64 - 1.0) / 3.0 - 1.0)
            .max(2.0);

        let flat: Vec<f64> = coords.iter().copied().collect();
        let samples: Vec<&[f64]> = flat.chunks(2).collect();

        let embedded: Vec<f64> = bhtsne::tSNE::<f64, &[f64], 2>::new(&samples)
            .perplexity(perplexity)
            .epochs(self.epochs)
            .barnes_hut(0.5, |a, b| {
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .embedding();

        Array2::from_shape_vec((n, 2), embedded)
            .map_err(|e| Error::projection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn projector() -> Projector {
        let table = EmbeddingTable::from_vectors(
            vec![
                ("error".to_string(), vec![1.0, 0.0, 0.0]),
                ("null".to_string(), vec![0.0, 1.0, 0.0]),
                ("pointer".to_string(), vec![0.7, 0.7, 0.0]),
                ("stream".to_string(), vec![0.1, 0.2, 0.9]),
            ],
            3,
        )
        .unwrap();
        Projector::fit(&table, &ProjectionConfig::default()).unwrap()
    }

    #[test]
    fn test_project_shape() {
        let p = projector();
        let matrix = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.7, 0.7, 0.0]];
        let coords = p.project(&matrix);
        assert_eq!(coords.shape(), &[3, 2]);
    }

    #[test]
    fn test_project_empty_matrix() {
        let p = projector();
        let coords = p.project(&Array2::zeros((0, 3)));
        assert_eq!(coords.shape(), &[0, 2]);
    }

    #[test]
    fn test_project_is_deterministic() {
        let p = projector();
        let matrix = array![[1.0, 0.0, 0.0], [0.1, 0.2, 0.9]];
        assert_eq!(p.project(&matrix), p.project(&matrix));
    }

    #[test]
    fn test_refine_small_input_falls_back_to_pca() {
        let p = projector();
        let matrix = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let refined = p.refine(&matrix).unwrap();
        assert_eq!(refined, p.project(&matrix));
    }

    #[test]
    fn test_fit_rejects_tiny_vocabulary() {
        let table = EmbeddingTable::from_vectors(
            vec![("only".to_string(), vec![1.0, 0.0])],
            2,
        )
        .unwrap();
        assert!(Projector::fit(&table, &ProjectionConfig::default()).is_err());
    }
}
