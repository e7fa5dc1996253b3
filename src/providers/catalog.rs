/*!
 * Curated catalog of OpenRouter models.
 *
 * The catalog starts from a built-in list with hand-assigned ratings and can
 * absorb the live `/models` listing. Live data adds unknown models with
 * default ratings; for known models it only refreshes cost and context
 * length, never the curated fields.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::openrouter::ApiModel;

/// Price band of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelCategory {
    Free,
    LowCost,
    Premium,
    Specialized,
}

impl ModelCategory {
    /// Category assigned to a model only known from the live listing
    pub fn from_cost(cost_per_million_tokens: f64) -> Self {
        if cost_per_million_tokens <= 0.0 {
            Self::Free
        } else if cost_per_million_tokens < 2.0 {
            Self::LowCost
        } else {
            Self::Premium
        }
    }
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::LowCost => "low-cost",
            Self::Premium => "premium",
            Self::Specialized => "specialized",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ModelCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "low-cost" | "lowcost" | "low_cost" => Ok(Self::LowCost),
            "premium" => Ok(Self::Premium),
            "specialized" => Ok(Self::Specialized),
            _ => Err(anyhow::anyhow!("Unknown model category: {}", s)),
        }
    }
}

/// What a recommendation optimises for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UseCase {
    Speed,
    Quality,
    Cost,
    #[default]
    General,
}

impl FromStr for UseCase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "speed" => Ok(Self::Speed),
            "quality" => Ok(Self::Quality),
            "cost" => Ok(Self::Cost),
            "general" => Ok(Self::General),
            _ => Err(anyhow::anyhow!("Unknown use case: {}", s)),
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    /// Vendor of the model, e.g. "Meta"
    pub provider: String,
    pub cost_per_million_tokens: f64,
    pub category: ModelCategory,
    /// 0-10
    pub speed_rating: u8,
    /// 0-10
    pub quality_rating: f32,
    pub context_length: u32,
    pub strong_languages: BTreeSet<String>,
    pub description: String,
    pub best_for: String,
}

impl ModelDescriptor {
    pub fn is_free(&self) -> bool {
        self.cost_per_million_tokens <= 0.0
    }

    fn score(&self) -> f32 {
        self.quality_rating + f32::from(self.speed_rating)
    }
}

/// Search criteria for [`ModelCatalog::filter`]
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    /// Case-insensitive match on id, name or description
    pub search: Option<String>,
    pub category: Option<ModelCategory>,
    /// Vendor name, case-insensitive
    pub provider: Option<String>,
    pub min_quality: Option<f32>,
    pub max_cost: Option<f64>,
    pub free_only: bool,
}

impl ModelFilter {
    fn matches(&self, model: &ModelDescriptor) -> bool {
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            let haystacks = [&model.id, &model.name, &model.description];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&search)) {
                return false;
            }
        }
        if self.category.is_some_and(|category| category != model.category) {
            return false;
        }
        if let Some(provider) = &self.provider {
            if !model.provider.eq_ignore_ascii_case(provider) {
                return false;
            }
        }
        if self.min_quality.is_some_and(|min| model.quality_rating < min) {
            return false;
        }
        if self.max_cost.is_some_and(|max| model.cost_per_million_tokens > max) {
            return false;
        }
        !self.free_only || model.is_free()
    }
}

const VENDOR_PREFIXES: &[(&str, &str)] = &[
    ("meta-llama", "Meta"),
    ("anthropic", "Anthropic"),
    ("openai", "OpenAI"),
    ("google", "Google"),
    ("mistralai", "Mistral AI"),
    ("microsoft", "Microsoft"),
    ("cohere", "Cohere"),
    ("qwen", "Alibaba"),
    ("deepseek", "DeepSeek"),
    ("nousresearch", "Nous Research"),
];

/// Vendor name for a model id, "Unknown" when the prefix is not recognised
pub fn extract_provider(model_id: &str) -> &'static str {
    VENDOR_PREFIXES
        .iter()
        .find(|(prefix, _)| model_id.starts_with(prefix))
        .map_or("Unknown", |(_, vendor)| vendor)
}

/// USD per million prompt tokens of a listed model
pub fn extract_cost(model: &ApiModel) -> f64 {
    if model.id.contains(":free") {
        return 0.0;
    }

    model
        .pricing
        .as_ref()
        .and_then(|pricing| pricing.prompt.as_deref())
        .and_then(|prompt| prompt.trim().parse::<f64>().ok())
        .map_or(1.0, |per_token| per_token * 1_000_000.0)
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    id: &str,
    name: &str,
    cost: f64,
    category: ModelCategory,
    context_length: u32,
    quality_rating: f32,
    speed_rating: u8,
    languages: &[&str],
    description: &str,
    best_for: &str,
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        provider: extract_provider(id).to_string(),
        cost_per_million_tokens: cost,
        category,
        speed_rating,
        quality_rating,
        context_length,
        strong_languages: languages.iter().map(|code| code.to_string()).collect(),
        description: description.to_string(),
        best_for: best_for.to_string(),
    }
}

const MAJOR: &[&str] = &["en", "es", "fr", "de", "it", "pt", "ru", "zh", "ja", "ko"];

fn builtin_models() -> Vec<ModelDescriptor> {
    use ModelCategory::*;

    vec![
        builtin("meta-llama/llama-3.1-8b-instruct:free", "Llama 3.1 8B Instruct (Free)", 0.0, Free, 131072, 7.0, 9,
            &["en", "es", "fr", "de", "it", "pt"],
            "Fast free model with good quality for basic translations", "Quick translations, short content, testing"),
        builtin("google/gemma-2-9b-it:free", "Gemma 2 9B IT (Free)", 0.0, Free, 8192, 7.5, 8,
            &["en", "es", "fr", "de", "it", "ja", "ko"],
            "Free Google model tuned for instruction following", "Precise translations, formal language"),
        builtin("microsoft/wizardlm-2-8x22b:free", "WizardLM 2 8x22B (Free)", 0.0, Free, 65536, 8.5, 6,
            &["en", "zh", "es", "fr", "de", "ja", "ko", "ru"],
            "Large free mixture-of-experts model", "Long and complex content"),
        builtin("mistralai/mistral-7b-instruct:free", "Mistral 7B Instruct (Free)", 0.0, Free, 32768, 7.5, 8,
            &["fr", "en", "es", "de", "it", "pt"],
            "Efficient free model, strong on European languages", "European languages, everyday content"),
        builtin("openchat/openchat-7b:free", "OpenChat 7B (Free)", 0.0, Free, 8192, 7.0, 9,
            &["en", "zh", "ja", "ko", "es", "fr"],
            "Lightweight free conversational model", "Conversational text, UI strings"),
        builtin("gryphe/mythomist-7b:free", "Mythomist 7B (Free)", 0.0, Free, 32768, 7.0, 8,
            &["en", "es", "fr", "de", "it"],
            "Free model with a creative writing bias", "Marketing copy, creative content"),
        builtin("meta-llama/llama-3.1-70b-instruct", "Llama 3.1 70B Instruct", 0.59, LowCost, 131072, 9.0, 7,
            MAJOR, "Large open model with excellent price/quality ratio", "General purpose translation at scale"),
        builtin("anthropic/claude-3-haiku", "Claude 3 Haiku", 0.80, LowCost, 200000, 9.0, 9,
            &["en", "es", "fr", "de", "it", "pt", "ja", "zh"],
            "Fast Anthropic model with high translation accuracy", "Live translation, product catalogs"),
        builtin("openai/gpt-4o-mini", "GPT-4o Mini", 0.60, LowCost, 128000, 9.0, 8,
            MAJOR, "Compact OpenAI model with broad language coverage", "Balanced speed and quality"),
        builtin("google/gemini-flash-1.5", "Gemini Flash 1.5", 0.40, LowCost, 1000000, 8.5, 10,
            &["en", "zh", "ja", "ko", "hi", "es", "fr", "de", "pt", "it"],
            "Very fast model with a huge context window", "High volume, low latency translation"),
        builtin("mistralai/mistral-small", "Mistral Small", 0.50, LowCost, 32768, 8.0, 8,
            &["fr", "en", "es", "de", "it", "pt"],
            "Small hosted Mistral model", "European languages at low cost"),
        builtin("cohere/command-light", "Command Light", 0.30, LowCost, 4096, 7.0, 8,
            &["en", "es", "fr", "de"],
            "Cheap Cohere model for short strings", "Short UI strings on a budget"),
        builtin("anthropic/claude-3-sonnet", "Claude 3 Sonnet", 15.0, Premium, 200000, 10.0, 6,
            MAJOR, "High precision translation across all major languages", "Legal, technical and editorial content"),
        builtin("anthropic/claude-3-opus", "Claude 3 Opus", 75.0, Premium, 200000, 10.0, 4,
            MAJOR, "Top quality Anthropic model", "Content where accuracy matters most"),
        builtin("openai/gpt-4o", "GPT-4o", 30.0, Premium, 128000, 10.0, 6,
            MAJOR, "Flagship OpenAI model", "Nuanced and idiomatic translation"),
        builtin("google/gemini-pro-1.5", "Gemini Pro 1.5", 20.0, Premium, 1000000, 9.5, 6,
            &["en", "zh", "ja", "ko", "hi", "es", "fr", "de", "pt", "it"],
            "Google's high quality long-context model", "Whole documents, long pages"),
        builtin("meta-llama/llama-3.1-405b-instruct", "Llama 3.1 405B Instruct", 18.0, Premium, 131072, 9.5, 3,
            MAJOR, "Largest open Llama model", "Offline quality runs"),
        builtin("qwen/qwen-2-72b-instruct", "Qwen 2 72B Instruct", 0.90, Specialized, 131072, 9.0, 6,
            &["zh", "ja", "ko", "en", "es", "fr"],
            "Alibaba model specialised in Asian languages", "Chinese, Japanese and Korean content"),
        builtin("deepseek/deepseek-coder-v2", "DeepSeek Coder V2", 0.27, Specialized, 163840, 8.0, 8,
            &["en", "zh"],
            "Code oriented model", "Technical documentation"),
        builtin("nousresearch/hermes-3-llama-3.1-405b", "Hermes 3 Llama 3.1 405B", 18.0, Specialized, 131072, 9.5, 3,
            MAJOR, "Instruction tuned Llama 405B variant", "Complex instructions, long form content"),
    ]
}

/// Model catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCatalog {
    /// Catalog with the built-in models
    pub fn new() -> Self {
        Self {
            models: builtin_models(),
        }
    }

    /// Load a previously refreshed catalog, falling back to the built-in one
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model catalog: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model catalog: {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize model catalog")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write model catalog: {}", path.display()))
    }

    pub fn list_models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn find_model(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Absorb the live listing, returning how many models were new
    pub fn merge_api_models(&mut self, api_models: &[ApiModel]) -> usize {
        let mut added = 0;

        for api_model in api_models {
            match self.models.iter_mut().find(|m| m.id == api_model.id) {
                Some(existing) => {
                    if let Some(context_length) = api_model.context_length {
                        existing.context_length = context_length;
                    }
                    if api_model.pricing.is_some() {
                        existing.cost_per_million_tokens = extract_cost(api_model);
                    }
                }
                None => {
                    let cost = extract_cost(api_model);
                    self.models.push(ModelDescriptor {
                        id: api_model.id.clone(),
                        name: api_model.name.clone().unwrap_or_else(|| api_model.id.clone()),
                        provider: extract_provider(&api_model.id).to_string(),
                        cost_per_million_tokens: cost,
                        category: ModelCategory::from_cost(cost),
                        speed_rating: 6,
                        quality_rating: 7.0,
                        context_length: api_model.context_length.unwrap_or(4096),
                        strong_languages: ["en", "es", "fr", "de"].iter().map(|c| c.to_string()).collect(),
                        description: "Discovered from the model listing".to_string(),
                        best_for: "General use".to_string(),
                    });
                    added += 1;
                }
            }
        }

        added
    }

    /// Models matching `filter`, best quality+speed first
    pub fn filter(&self, filter: &ModelFilter) -> Vec<&ModelDescriptor> {
        let mut models: Vec<&ModelDescriptor> = self.models.iter().filter(|m| filter.matches(m)).collect();
        models.sort_by(|a, b| b.score().total_cmp(&a.score()));
        models
    }

    pub fn free_models(&self) -> Vec<&ModelDescriptor> {
        self.models.iter().filter(|m| m.is_free()).collect()
    }

    pub fn recommended(&self, use_case: UseCase) -> Vec<&ModelDescriptor> {
        let ids: &[&str] = match use_case {
            UseCase::Speed => &[
                "google/gemini-flash-1.5",
                "anthropic/claude-3-haiku",
                "meta-llama/llama-3.1-8b-instruct:free",
            ],
            UseCase::Quality => &[
                "anthropic/claude-3-opus",
                "anthropic/claude-3-sonnet",
                "openai/gpt-4o",
            ],
            UseCase::Cost => &[
                "meta-llama/llama-3.1-8b-instruct:free",
                "google/gemma-2-9b-it:free",
                "cohere/command-light",
            ],
            UseCase::General => &[
                "anthropic/claude-3-haiku",
                "meta-llama/llama-3.1-70b-instruct",
                "google/gemini-flash-1.5",
            ],
        };

        ids.iter().filter_map(|id| self.find_model(id)).collect()
    }

    /// Free model with the best speed rating, used for high-priority requests
    pub fn fastest_free_model(&self) -> Option<&ModelDescriptor> {
        self.models
            .iter()
            .filter(|m| m.is_free())
            // min_by keeps the first of equal elements, so catalog order breaks ties
            .min_by(|a, b| {
                b.speed_rating
                    .cmp(&a.speed_rating)
                    .then_with(|| b.quality_rating.total_cmp(&a.quality_rating))
            })
    }
}
