//! HTTP routes and handlers for the dowser analysis API.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::core::{Error, Result};
use crate::semantic::{self, to_pairs, tokenize_stems, vectorize, Localization};

/// Decimal digits kept in serialized numeric arrays, bounding payload size.
const ROUND_DIGITS: i32 = 6;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/bug", get(list_bugs))
        .route("/bug/:id/files", get(list_files))
        .route("/bug/:id/similarities", get(similarities))
        .route("/bug/:id/similarities/*file", get(file_similarity))
        .route("/bug/:id/tsne", post(tsne))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::BugNotFound { .. } | Error::FileNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run CPU-heavy work on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("worker task failed: {e}")))?
}

// =============================================================================
// Health & status
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "dowser"
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: String,
    bugs: usize,
    vocabulary_words: usize,
    embedding_dimension: usize,
    repository: String,
    checked_out_revision: Option<String>,
    head_revision: Option<String>,
    cached_file_vectors: usize,
    uptime_seconds: f64,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
        bugs: state.dataset.len(),
        vocabulary_words: state.embeddings.len(),
        embedding_dimension: state.embeddings.dimension(),
        repository: state.workspace.root().display().to_string(),
        checked_out_revision: state.workspace.current_revision(),
        head_revision: state.workspace.head_revision().ok(),
        cached_file_vectors: state.workspace.cached_files(),
        uptime_seconds: state.uptime_seconds(),
    })
}

// =============================================================================
// Bug listing & candidate files
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BugSummary {
    bug_id: u32,
    summary: String,
}

async fn list_bugs(State(state): State<Arc<AppState>>) -> Json<Vec<BugSummary>> {
    let bugs = state
        .dataset
        .iter()
        .map(|bug| BugSummary {
            bug_id: bug.bug_id,
            summary: bug.summary.clone(),
        })
        .collect();
    Json(bugs)
}

async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(bug_id): Path<u32>,
) -> Result<Json<Vec<String>>> {
    let files = run_blocking(move || {
        let bug = state.dataset.get(bug_id)?;
        state
            .workspace
            .files_at(&bug.commit, &state.config.repository)
    })
    .await?;
    Ok(Json(files))
}

// =============================================================================
// Similarity artifacts
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BugLocation {
    filename: String,
    score: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimilarityResponse {
    bug_report_tokens: Vec<String>,
    bug_report_found_ratio: f64,
    bug_report_embedding_2d: Vec<[f64; 2]>,
    file_tokens: BTreeMap<String, Vec<String>>,
    file_embeddings_2d: BTreeMap<String, Vec<[f64; 2]>>,
    word_to_word_similarities: BTreeMap<String, Vec<Vec<f64>>>,
    top_word_indices: BTreeMap<String, Vec<usize>>,
    file_word_to_bug_similarity: BTreeMap<String, Vec<f64>>,
    bug_word_to_file_similarities: BTreeMap<String, Vec<f64>>,
    bug_report_to_file_similarity: BTreeMap<String, f64>,
    file_to_bug_report_similarity: BTreeMap<String, f64>,
    combined_similarity: BTreeMap<String, f64>,
    bug_locations: Vec<BugLocation>,
}

impl From<Localization> for SimilarityResponse {
    fn from(result: Localization) -> Self {
        let mut file_tokens = BTreeMap::new();
        let mut file_embeddings_2d = BTreeMap::new();
        let mut word_to_word = BTreeMap::new();
        let mut top_word_indices = BTreeMap::new();
        let mut file_word_to_bug = BTreeMap::new();
        let mut bug_word_to_file = BTreeMap::new();
        let mut bug_to_file = BTreeMap::new();
        let mut file_to_bug = BTreeMap::new();
        let mut combined = BTreeMap::new();

        for file in result.files {
            let name = file.filename;
            file_tokens.insert(name.clone(), file.tokens);
            file_embeddings_2d.insert(name.clone(), round_pairs(&file.embedding_2d));
            word_to_word.insert(name.clone(), round_matrix(&file.word_to_word));
            top_word_indices.insert(name.clone(), file.top_word_indices);
            file_word_to_bug.insert(name.clone(), round_vec(&file.file_word_to_bug));
            bug_word_to_file.insert(name.clone(), round_vec(&file.bug_word_to_file));
            bug_to_file.insert(name.clone(), round6(file.bug_to_file));
            file_to_bug.insert(name.clone(), round6(file.file_to_bug));
            combined.insert(name, round6(file.combined));
        }

        Self {
            bug_report_tokens: result.bug_tokens,
            bug_report_found_ratio: round6(result.bug_found_ratio),
            bug_report_embedding_2d: round_pairs(&result.bug_embedding_2d),
            file_tokens,
            file_embeddings_2d,
            word_to_word_similarities: word_to_word,
            top_word_indices,
            file_word_to_bug_similarity: file_word_to_bug,
            bug_word_to_file_similarities: bug_word_to_file,
            bug_report_to_file_similarity: bug_to_file,
            file_to_bug_report_similarity: file_to_bug,
            combined_similarity: combined,
            bug_locations: result
                .shortlist
                .into_iter()
                .map(|(filename, score)| BugLocation {
                    filename,
                    score: round6(score),
                })
                .collect(),
        }
    }
}

fn compute_similarities(
    state: &AppState,
    bug_id: u32,
    only_file: Option<String>,
) -> Result<SimilarityResponse> {
    let bug = state.dataset.get(bug_id)?.clone();
    let mut vectors = state.workspace.vectors_at(
        &bug.commit,
        &state.config.repository,
        &state.embeddings,
        state.config.similarity.filter_stopwords,
    )?;

    if let Some(filename) = only_file {
        let doc = vectors
            .remove(&filename)
            .ok_or(Error::FileNotFound {
                filename: filename.clone(),
            })?;
        vectors = HashMap::from([(filename, doc)]);
    }

    let result = semantic::localize(
        &bug.full_text(),
        &vectors,
        &state.embeddings,
        &state.projector,
        &state.config.similarity,
    );
    Ok(SimilarityResponse::from(result))
}

async fn similarities(
    State(state): State<Arc<AppState>>,
    Path(bug_id): Path<u32>,
) -> Result<Json<SimilarityResponse>> {
    let response = run_blocking(move || compute_similarities(&state, bug_id, None)).await?;
    Ok(Json(response))
}

async fn file_similarity(
    State(state): State<Arc<AppState>>,
    Path((bug_id, filename)): Path<(u32, String)>,
) -> Result<Json<SimilarityResponse>> {
    let response =
        run_blocking(move || compute_similarities(&state, bug_id, Some(filename))).await?;
    Ok(Json(response))
}

// =============================================================================
// t-SNE projection
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsneRequest {
    filenames: Vec<String>,
    top_word_indices: HashMap<String, Vec<usize>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TsneResponse {
    bug_report_embedding_2d: Vec<[f64; 2]>,
    file_embeddings_2d: BTreeMap<String, Vec<[f64; 2]>>,
}

fn compute_tsne(state: &AppState, bug_id: u32, request: TsneRequest) -> Result<TsneResponse> {
    let bug = state.dataset.get(bug_id)?.clone();
    let vectors = state.workspace.vectors_at(
        &bug.commit,
        &state.config.repository,
        &state.embeddings,
        state.config.similarity.filter_stopwords,
    )?;

    let bug_tokens = tokenize_stems(&bug.full_text(), state.config.similarity.filter_stopwords);
    let bug_doc = vectorize(bug_tokens, &state.embeddings);
    let bug_rows = bug_doc.matrix.nrows();

    // Bug report first, then each file's selected rows; projecting them
    // jointly keeps the coordinate spaces comparable.
    let mut segments: Vec<Array2<f64>> = vec![bug_doc.matrix];
    let mut bounds: Vec<(String, usize, usize)> = Vec::new();
    let mut offset = bug_rows;

    for filename in &request.filenames {
        let doc = vectors.get(filename).ok_or_else(|| Error::FileNotFound {
            filename: filename.clone(),
        })?;
        let indices = request.top_word_indices.get(filename).ok_or_else(|| {
            Error::invalid_argument(format!("no topWordIndices entry for {filename:?}"))
        })?;
        if let Some(&bad) = indices.iter().find(|&&i| i >= doc.matrix.nrows()) {
            return Err(Error::invalid_argument(format!(
                "word index {bad} out of range for {filename:?} ({} tokens)",
                doc.matrix.nrows()
            )));
        }

        let rows = doc.matrix.select(Axis(0), indices);
        bounds.push((filename.clone(), offset, offset + rows.nrows()));
        offset += rows.nrows();
        segments.push(rows);
    }

    let views: Vec<ArrayView2<f64>> = segments.iter().map(|s| s.view()).collect();
    let stacked = ndarray::concatenate(Axis(0), &views)
        .map_err(|e| Error::Internal(format!("segment concatenation failed: {e}")))?;

    let coords = to_pairs(&state.projector.refine(&stacked)?);

    let mut file_embeddings_2d = BTreeMap::new();
    for (filename, from, to) in bounds {
        file_embeddings_2d.insert(filename, round_pairs(&coords[from..to]));
    }

    Ok(TsneResponse {
        bug_report_embedding_2d: round_pairs(&coords[..bug_rows]),
        file_embeddings_2d,
    })
}

async fn tsne(
    State(state): State<Arc<AppState>>,
    Path(bug_id): Path<u32>,
    Json(request): Json<TsneRequest>,
) -> Result<Json<TsneResponse>> {
    let response = run_blocking(move || compute_tsne(&state, bug_id, request)).await?;
    Ok(Json(response))
}

// =============================================================================
// Rounding helpers
// =============================================================================

fn round6(value: f64) -> f64 {
    let factor = 10f64.powi(ROUND_DIGITS);
    (value * factor).round() / factor
}

fn round_vec(values: &[f64]) -> Vec<f64> {
    values.iter().map(|&v| round6(v)).collect()
}

fn round_pairs(pairs: &[[f64; 2]]) -> Vec<[f64; 2]> {
    pairs
        .iter()
        .map(|p| [round6(p[0]), round6(p[1])])
        .collect()
}

fn round_matrix(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix
        .outer_iter()
        .map(|row| row.iter().map(|&v| round6(v)).collect())
        .collect()
}
