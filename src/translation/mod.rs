/*!
 * Translation resolution for page content.
 *
 * This module contains everything between a piece of page text and the
 * provider call. It is split into several submodules:
 *
 * - `pipeline`: request resolution (identity, cache, dictionary, provider)
 * - `batch`: ordered batch translation with size grouping
 * - `cache`: memory, SQLite and tiered cache stores
 * - `dictionary`: custom dictionary storage and rule application
 * - `protector`: placeholder protection of excluded spans
 * - `patterns`: compilation of user-supplied regexes
 * - `stages`: pluggable before/after translation transforms
 * - `stats`: performance and per-model statistics
 */

// Re-export main types for easier usage
pub use self::batch::{BatchItem, BatchResponse, COMMON_PHRASES};
pub use self::cache::{CacheStore, MemoryStore, SqliteStore, TieredCache, fingerprint};
pub use self::dictionary::{CustomDictionary, DictionaryResolver, EntryKind, LanguageDictionary};
pub use self::pipeline::{
    LiveResponse, Outcome, PipelineOptions, Priority, Resolution, TranslationPipeline, TranslationRequest,
};
pub use self::protector::{ProtectionMap, TextProtector};
pub use self::stages::{DictionaryRulesStage, FnStage, StageContext, StageRegistry, TransformStage};
pub use self::stats::{ModelStats, PerformanceStats, StatsRecorder};

// Submodules
pub mod batch;
pub mod cache;
pub mod dictionary;
pub mod patterns;
pub mod pipeline;
pub mod protector;
pub mod stages;
pub mod stats;
