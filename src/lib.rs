//! Dowser - embedding-based bug localization backend.
//!
//! Dowser ranks the source files of a repository by lexical similarity to a
//! bug report, using a frozen pre-trained word-embedding table. It serves a
//! small set of analysis endpoints behind a visualization front-end,
//! recomputing everything per request.
//!
//! # Example
//!
//! ```no_run
//! use dowser::config::Config;
//! use dowser::semantic::localize;
//! use dowser::server::AppState;
//!
//! let config = Config::load_default(".").unwrap();
//! let state = AppState::bootstrap(config).unwrap();
//! let bug = state.dataset.get(51195).unwrap().clone();
//! let files = state
//!     .workspace
//!     .vectors_at(
//!         &bug.commit,
//!         &state.config.repository,
//!         &state.embeddings,
//!         state.config.similarity.filter_stopwords,
//!     )
//!     .unwrap();
//! let result = localize(
//!     &bug.full_text(),
//!     &files,
//!     &state.embeddings,
//!     &state.projector,
//!     &state.config.similarity,
//! );
//! println!("top file: {:?}", result.shortlist.first());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod corpus;
pub mod semantic;
pub mod server;
