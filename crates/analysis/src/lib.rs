pub mod azure;
pub mod orchestrator;
pub mod provider;
pub mod schema;

pub use azure::AzureTextAnalytics;
pub use orchestrator::Analyzer;
pub use provider::{
    BatchResult, DocumentError, DocumentResult, DocumentSentiment, PiiDocument, ProviderError,
    RecognizedEntity, SentimentScores, TextAnalyticsProvider,
};
pub use schema::{
    AnalysisResult, DetectedLanguage, Entity, EntitiesResult, KeyPhraseResult, KeyPhrases,
    LanguageResult, LinkedEntitiesResult, LinkedEntity, LinkedEntityMatch, PiiEntity, PiiResult,
    Sentiment, SentimentResult, UnifiedTextAnalysis,
};
