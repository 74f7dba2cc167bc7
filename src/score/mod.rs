//! Scoring layer: impact scores derived from graph metrics, then a triage
//! layer on top that adds unblock and quick-win boosts.

pub mod impact;
pub mod triage_score;

pub use impact::{compute_impact_scores, ImpactBreakdown, ImpactScore};
pub use triage_score::{compute_triage_scores, TriageScore};
