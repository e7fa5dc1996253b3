/*!
 * Storefront content translation.
 *
 * Shop texts (product fields, taxonomy terms, checkout labels, notices, cart
 * item names) go through the regular pipeline, with a second cache scoped by
 * content, field context and language. A field is only translated when it is
 * enabled in [`FieldSettings`]. Translation failures and translations equal
 * to the input fall back to the input and are not cached.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::language_utils::is_same_language;
use crate::translation::cache::hash_parts;
use crate::translation::{CacheStore, TranslationPipeline};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Remove HTML tags, keeping the text between them
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// Importance of a field in the settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPriority {
    High,
    Medium,
    Low,
}

/// Translatable shop content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentField {
    ProductTitle,
    ProductDescription,
    ProductShortDescription,
    ProductAttributes,
    ProductCategories,
    ProductTags,
    ProductVariations,
    ProductMeta,
    CheckoutFields,
    ShopNotices,
    CartMessages,
    CouponMessages,
}

impl ContentField {
    pub const ALL: [ContentField; 12] = [
        Self::ProductTitle,
        Self::ProductDescription,
        Self::ProductShortDescription,
        Self::ProductAttributes,
        Self::ProductCategories,
        Self::ProductTags,
        Self::ProductVariations,
        Self::ProductMeta,
        Self::CheckoutFields,
        Self::ShopNotices,
        Self::CartMessages,
        Self::CouponMessages,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::ProductTitle => "product_title",
            Self::ProductDescription => "product_description",
            Self::ProductShortDescription => "product_short_description",
            Self::ProductAttributes => "product_attributes",
            Self::ProductCategories => "product_categories",
            Self::ProductTags => "product_tags",
            Self::ProductVariations => "product_variations",
            Self::ProductMeta => "product_meta",
            Self::CheckoutFields => "checkout_fields",
            Self::ShopNotices => "shop_notices",
            Self::CartMessages => "cart_messages",
            Self::CouponMessages => "coupon_messages",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductTitle => "Product title",
            Self::ProductDescription => "Product description",
            Self::ProductShortDescription => "Short description",
            Self::ProductAttributes => "Product attributes",
            Self::ProductCategories => "Product categories",
            Self::ProductTags => "Product tags",
            Self::ProductVariations => "Product variations",
            Self::ProductMeta => "Product SEO meta",
            Self::CheckoutFields => "Checkout fields",
            Self::ShopNotices => "Shop notices",
            Self::CartMessages => "Cart messages",
            Self::CouponMessages => "Coupon messages",
        }
    }

    pub fn priority(&self) -> FieldPriority {
        match self {
            Self::ProductTitle | Self::ProductDescription | Self::ProductShortDescription | Self::ShopNotices => {
                FieldPriority::High
            }
            Self::ProductAttributes
            | Self::ProductCategories
            | Self::ProductVariations
            | Self::CheckoutFields
            | Self::CartMessages => FieldPriority::Medium,
            Self::ProductTags | Self::ProductMeta | Self::CouponMessages => FieldPriority::Low,
        }
    }

    /// Whether the field is translated when no settings were saved
    pub fn default_enabled(&self) -> bool {
        !matches!(
            self,
            Self::ProductVariations | Self::ProductMeta | Self::CouponMessages
        )
    }
}

impl fmt::Display for ContentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for ContentField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| anyhow::anyhow!("Unknown content field: {}", s))
    }
}

/// Which shop fields are translated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSettings {
    // @field: Fields sent through the translator
    #[serde(default = "default_enabled_fields")]
    pub enabled_fields: BTreeSet<ContentField>,
}

fn default_enabled_fields() -> BTreeSet<ContentField> {
    ContentField::ALL
        .into_iter()
        .filter(ContentField::default_enabled)
        .collect()
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            enabled_fields: default_enabled_fields(),
        }
    }
}

impl FieldSettings {
    pub fn is_enabled(&self, field: ContentField) -> bool {
        self.enabled_fields.contains(&field)
    }
}

/// Taxonomy of a shop term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    ProductCat,
    ProductTag,
}

impl Taxonomy {
    fn field(&self) -> ContentField {
        match self {
            Self::ProductCat => ContentField::ProductCategories,
            Self::ProductTag => ContentField::ProductTags,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Self::ProductCat => "product_cat",
            Self::ProductTag => "product_tag",
        }
    }
}

/// Category or tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub taxonomy: Taxonomy,
}

/// Label and placeholder of one checkout field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Fieldset name (billing, shipping, ...) -> field key -> field
pub type CheckoutFields = BTreeMap<String, BTreeMap<String, CheckoutField>>;

/// Source texts of a product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContent {
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
}

/// Translated product texts for one language; disabled fields stay `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTranslation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Cache key of a storefront translation
pub fn storefront_cache_key(content: &str, context: &str, target_lang: &str) -> String {
    format!("storefront_{}", hash_parts(&[content, context, target_lang]))
}

/// Translator for shop content
pub struct StorefrontTranslator {
    pipeline: Arc<TranslationPipeline>,
    cache: Arc<dyn CacheStore>,
    settings: FieldSettings,
    default_language: String,
    enabled_languages: Vec<String>,
    cache_ttl: Duration,
}

impl fmt::Debug for StorefrontTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorefrontTranslator")
            .field("settings", &self.settings)
            .field("default_language", &self.default_language)
            .field("enabled_languages", &self.enabled_languages)
            .finish()
    }
}

impl StorefrontTranslator {
    pub fn new(
        pipeline: Arc<TranslationPipeline>,
        cache: Arc<dyn CacheStore>,
        settings: FieldSettings,
        enabled_languages: Vec<String>,
    ) -> Self {
        let default_language = pipeline.options().default_language.clone();
        let cache_ttl = pipeline.options().cache_ttl;
        Self {
            pipeline,
            cache,
            settings,
            default_language,
            enabled_languages,
            cache_ttl,
        }
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    /// Translate a single field, returning the input when the field is disabled
    pub async fn translate_field(&self, content: &str, field: ContentField, target_lang: &str) -> String {
        if !self.settings.is_enabled(field) {
            return content.to_string();
        }
        self.translate_in_context(content, field.key(), target_lang).await
    }

    /// Translate a term name and description when its taxonomy is enabled
    pub async fn translate_term(&self, term: &Term, target_lang: &str) -> Term {
        if !self.settings.is_enabled(term.taxonomy.field()) {
            return term.clone();
        }

        let name_context = format!("term_{}", term.taxonomy.key());
        let description = if term.description.is_empty() {
            String::new()
        } else {
            self.translate_in_context(&term.description, "term_description", target_lang)
                .await
        };

        Term {
            name: self.translate_in_context(&term.name, &name_context, target_lang).await,
            description,
            taxonomy: term.taxonomy,
        }
    }

    /// Translate every label and placeholder
    pub async fn translate_checkout_fields(&self, fields: &CheckoutFields, target_lang: &str) -> CheckoutFields {
        if !self.settings.is_enabled(ContentField::CheckoutFields) {
            return fields.clone();
        }

        let mut translated = CheckoutFields::new();
        for (fieldset, entries) in fields {
            let mut translated_entries = BTreeMap::new();
            for (key, field) in entries {
                let label = match &field.label {
                    Some(label) => Some(self.translate_in_context(label, "checkout_field_label", target_lang).await),
                    None => None,
                };
                let placeholder = match &field.placeholder {
                    Some(placeholder) => Some(
                        self.translate_in_context(placeholder, "checkout_field_placeholder", target_lang)
                            .await,
                    ),
                    None => None,
                };
                translated_entries.insert(key.clone(), CheckoutField { label, placeholder });
            }
            translated.insert(fieldset.clone(), translated_entries);
        }

        translated
    }

    /// Translate a cart item name with its markup removed
    pub async fn translate_cart_item_name(&self, name: &str, target_lang: &str) -> String {
        if !self.settings.is_enabled(ContentField::CartMessages) {
            return name.to_string();
        }
        self.translate_in_context(&strip_tags(name), "cart_item_name", target_lang)
            .await
    }

    /// Title, short description and description in every enabled language except the default
    pub async fn translate_product(&self, product: &ProductContent) -> BTreeMap<String, ProductTranslation> {
        let mut translations = BTreeMap::new();

        for lang in &self.enabled_languages {
            if is_same_language(lang, &self.default_language) {
                continue;
            }

            let mut translation = ProductTranslation::default();
            if self.settings.is_enabled(ContentField::ProductTitle) {
                translation.title = Some(self.translate_text(&product.title, lang).await);
            }
            if self.settings.is_enabled(ContentField::ProductShortDescription) {
                translation.short_description = Some(self.translate_text(&product.short_description, lang).await);
            }
            if self.settings.is_enabled(ContentField::ProductDescription) {
                translation.description = Some(self.translate_text(&product.description, lang).await);
            }

            translations.insert(lang.clone(), translation);
        }

        translations
    }

    async fn translate_in_context(&self, content: &str, context: &str, target_lang: &str) -> String {
        if content.is_empty() || is_same_language(target_lang, &self.default_language) {
            return content.to_string();
        }

        let key = storefront_cache_key(content, context, target_lang);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(e) => warn!("Storefront cache lookup failed: {}", e),
        }

        let translation = self.translate_text(content, target_lang).await;
        if !translation.is_empty() && translation != content {
            if let Err(e) = self.cache.set(&key, &translation, self.cache_ttl).await {
                warn!("Failed to cache storefront translation: {}", e);
            }
            return translation;
        }

        content.to_string()
    }

    async fn translate_text(&self, content: &str, target_lang: &str) -> String {
        let request = self.pipeline.request(content, &self.default_language, target_lang);
        match self.pipeline.translate(&request).await {
            Ok(resolution) => resolution.text,
            Err(e) => {
                debug!("Storefront translation failed, keeping original: {}", e);
                content.to_string()
            }
        }
    }
}
