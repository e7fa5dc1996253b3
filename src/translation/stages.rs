/*!
 * Pluggable transform stages around the provider call.
 *
 * Stages registered as `before_translate` see the protected text just before
 * it is sent to the provider and must leave its placeholders intact;
 * `after_translate` stages see the restored, corrected output. Each list runs
 * in registration order.
 */

use std::fmt;
use std::sync::Arc;

use super::dictionary::DictionaryResolver;
use super::protector::rewrite_unprotected;
use crate::app_config::TranslationProvider;

/// Request information available to every stage
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub provider: TranslationProvider,
}

/// A single `(content, context) -> content` transform
pub trait TransformStage: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn apply(&self, content: &str, context: &StageContext<'_>) -> String;
}

/// Adapter turning a closure into a stage
pub struct FnStage<F> {
    name: String,
    transform: F,
}

impl<F> FnStage<F>
where
    F: Fn(&str, &StageContext<'_>) -> String + Send + Sync,
{
    pub fn new(name: &str, transform: F) -> Self {
        Self {
            name: name.to_string(),
            transform,
        }
    }
}

impl<F> TransformStage for FnStage<F>
where
    F: Fn(&str, &StageContext<'_>) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str, context: &StageContext<'_>) -> String {
        (self.transform)(content, context)
    }
}

/// Applies dictionary in-text exact and partial rules before translation,
/// leaving protection placeholders untouched
pub struct DictionaryRulesStage {
    resolver: Arc<DictionaryResolver>,
}

impl DictionaryRulesStage {
    pub fn new(resolver: Arc<DictionaryResolver>) -> Self {
        Self { resolver }
    }
}

impl TransformStage for DictionaryRulesStage {
    fn name(&self) -> &str {
        "dictionary_rules"
    }

    fn apply(&self, content: &str, context: &StageContext<'_>) -> String {
        rewrite_unprotected(content, |segment| {
            self.resolver.process_rules(segment, context.target_lang)
        })
    }
}

/// Ordered `before_translate` and `after_translate` stage lists
#[derive(Clone, Default)]
pub struct StageRegistry {
    before: Vec<Arc<dyn TransformStage>>,
    after: Vec<Arc<dyn TransformStage>>,
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |stages: &[Arc<dyn TransformStage>]| {
            stages.iter().map(|s| s.name().to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("StageRegistry")
            .field("before", &names(&self.before))
            .field("after", &names(&self.after))
            .finish()
    }
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_before(&mut self, stage: Arc<dyn TransformStage>) {
        self.before.push(stage);
    }

    pub fn register_after(&mut self, stage: Arc<dyn TransformStage>) {
        self.after.push(stage);
    }

    pub fn run_before(&self, content: &str, context: &StageContext<'_>) -> String {
        run(&self.before, content, context)
    }

    pub fn run_after(&self, content: &str, context: &StageContext<'_>) -> String {
        run(&self.after, content, context)
    }
}

fn run(stages: &[Arc<dyn TransformStage>], content: &str, context: &StageContext<'_>) -> String {
    stages
        .iter()
        .fold(content.to_string(), |text, stage| stage.apply(&text, context))
}
