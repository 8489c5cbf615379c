//! Evaluation metrics over model predictions.
//!
//! Currently provides ensemble diversity: pairwise disagreement, KL
//! divergence, and cosine similarity between ensemble members, accumulated
//! in a streaming fashion.
//!
//! # Usage
//!
//! ```rust,ignore
//! use robustness_forge::metrics::AveragePairwiseDiversity;
//!
//! let mut diversity = AveragePairwiseDiversity::new();
//! diversity.add_batch(probs.view(), 3)?;
//! let result = diversity.result();
//! println!("{}", result.summary());
//! ```
//!
//! Accumulators over disjoint batches can be combined with
//! [`AveragePairwiseDiversity::merge`]; the merged result equals a single
//! accumulator fed with every batch.

pub mod diversity;

pub use diversity::{
    argmax, cosine_distance, cosine_similarity, disagreement, kl_divergence,
    kl_divergence_single, softmax, AveragePairwiseDiversity, DiversityResult, DiversityState,
    PairStatistics, DEFAULT_SUM_TOLERANCE,
};
