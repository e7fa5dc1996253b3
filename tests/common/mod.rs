/*!
 * Common test utilities for the page-translator test suite
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use page_translator::providers::mock::MockProvider;
use page_translator::translation::patterns::PatternCache;
use page_translator::translation::{
    CacheStore, CustomDictionary, DictionaryResolver, DictionaryRulesStage, EntryKind, MemoryStore, PipelineOptions,
    StageRegistry, TranslationPipeline,
};

/// Phone numbers such as 555-1234
pub const PHONE_PATTERN: &str = r"\b\d{3}-\d{4}\b";

/// Route library logs through the test harness; repeated calls are ignored
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Italian dictionary used across the suite
pub fn italian_dictionary() -> CustomDictionary {
    let mut dictionary = CustomDictionary::new();
    let entries: &[(EntryKind, &str, Option<&str>)] = &[
        (EntryKind::Exact, "Submit", Some("Invia")),
        (EntryKind::Exact, "Hello", Some("Ciao")),
        (EntryKind::Exact, "Read", Some("Leggi")),
        (EntryKind::Exact, "Read more", Some("Continua a leggere")),
        (EntryKind::ExcludeWord, "Acme", None),
        (EntryKind::ExcludePattern, PHONE_PATTERN, None),
    ];

    for (kind, key, value) in entries {
        dictionary
            .add_entry("it", *kind, key, *value)
            .expect("valid dictionary entry");
    }
    dictionary
}

/// Pipeline over a memory cache with the given provider and dictionary
pub fn pipeline_with(provider: MockProvider, dictionary: CustomDictionary) -> TranslationPipeline {
    pipeline_with_cache(provider, dictionary, Arc::new(MemoryStore::new()))
}

pub fn pipeline_with_cache(
    provider: MockProvider,
    dictionary: CustomDictionary,
    cache: Arc<dyn CacheStore>,
) -> TranslationPipeline {
    let resolver = Arc::new(DictionaryResolver::new(dictionary, Arc::new(PatternCache::new())));
    TranslationPipeline::new(Arc::new(provider), cache, resolver).with_options(PipelineOptions::default())
}

/// Pipeline with the in-text dictionary stage registered, as the controller wires it
pub fn pipeline_with_dictionary_stage(
    provider: MockProvider,
    dictionary: CustomDictionary,
    cache: Arc<dyn CacheStore>,
) -> TranslationPipeline {
    let resolver = Arc::new(DictionaryResolver::new(dictionary, Arc::new(PatternCache::new())));
    let mut stages = StageRegistry::new();
    stages.register_before(Arc::new(DictionaryRulesStage::new(Arc::clone(&resolver))));

    TranslationPipeline::new(Arc::new(provider), cache, resolver)
        .with_options(PipelineOptions::default())
        .with_stages(stages)
}

/// `count` distinct short texts
pub fn short_texts(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Item {}", i)).collect()
}
