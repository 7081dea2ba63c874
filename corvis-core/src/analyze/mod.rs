pub mod decisions;
pub mod extractor;

pub use decisions::{
    CorpusAnalysis, Decision, DecisionSet, MentionSummary, SystemDecisions, SystemSummary,
    TypeCounts,
};
pub use extractor::ErrorExtractor;
