use crate::domain::locale::{Locale, DEFAULT_LOCALE, LOCALES};
use crate::utils::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Key under which the bundle lives in every store.
pub const BUNDLE_KEY: &str = "content.bundle.json";

/// Seed bundle shipped with the public assets.
pub const SEED_BUNDLE_JSON: &str = include_str!("../../public/content.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBundle {
    pub default_locale: Locale,
    pub locales: Vec<Locale>,
    pub content: BTreeMap<Locale, ContentModel>,
    /// Keys this crate does not model; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentModel {
    pub site: SiteInfo,
    pub blocks: Blocks,
    #[serde(default)]
    pub services: Vec<ServiceCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq: Option<FaqSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<ReviewsSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub brand: String,
    pub tagline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blocks {
    pub hero: HeroBlock,
    pub about: AboutBlock,
    pub services: ServicesBlock,
    pub cta: CtaBlock,
    pub footer: FooterBlock,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBlock {
    pub title: String,
    pub subtitle: String,
    pub primary_cta_text: String,
    pub primary_cta_href: String,
    pub secondary_cta_text: String,
    pub secondary_cta_href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutBlock {
    pub title: String,
    pub body_md: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicesBlock {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaBlock {
    pub title: String,
    pub body_md: String,
    pub button_text: String,
    pub button_href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterBlock {
    pub title: String,
    pub body_md: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<FaqItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub a: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewsSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<ReviewItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCard {
    pub id: String,
    pub title: String,
    pub short_md: String,
    pub full_md: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ContentBundle {
    /// A bundle with every supported locale and empty models.
    pub fn empty() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE,
            locales: LOCALES.to_vec(),
            content: LOCALES
                .iter()
                .map(|l| (*l, ContentModel::default()))
                .collect(),
            extra: Map::new(),
        }
    }

    pub fn seed() -> Result<Self> {
        Self::from_json(SEED_BUNDLE_JSON.as_bytes())
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let bundle: ContentBundle = serde_json::from_slice(bytes)?;
        Ok(bundle)
    }

    /// Two-space indented JSON, the format every store writes.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.content.contains_key(&self.default_locale) {
            return Err(SiteError::ValidationError {
                message: format!(
                    "content has no entry for default locale '{}'",
                    self.default_locale
                ),
            });
        }

        if !self.locales.contains(&self.default_locale) {
            return Err(SiteError::ValidationError {
                message: format!(
                    "default locale '{}' is not listed in locales",
                    self.default_locale
                ),
            });
        }

        for (locale, model) in &self.content {
            let mut seen = HashSet::new();
            for card in &model.services {
                if !seen.insert(card.id.as_str()) {
                    return Err(SiteError::ValidationError {
                        message: format!("duplicate service id '{}' in locale '{}'", card.id, locale),
                    });
                }
            }
        }

        Ok(())
    }

    /// Locale model, cloned from the default locale when missing.
    pub fn ensure_locale(&mut self, locale: Locale) -> &mut ContentModel {
        if !self.content.contains_key(&locale) {
            let fallback = self
                .content
                .get(&self.default_locale)
                .cloned()
                .unwrap_or_default();
            tracing::debug!("Cloning default locale '{}' into '{}'", self.default_locale, locale);
            self.content.insert(locale, fallback);
        }
        if !self.locales.contains(&locale) {
            self.locales.push(locale);
        }
        self.content.entry(locale).or_default()
    }

    /// Read-only view with the same default-locale fallback as `ensure_locale`.
    pub fn model_for(&self, locale: Locale) -> Option<&ContentModel> {
        self.content
            .get(&locale)
            .or_else(|| self.content.get(&self.default_locale))
    }

    /// Locales in editing order: listed locales first, then any extra content keys.
    pub fn ordered_locales(&self) -> Vec<Locale> {
        let mut order: Vec<Locale> = Vec::new();
        for locale in self.locales.iter().chain(self.content.keys()) {
            if !order.contains(locale) {
                order.push(*locale);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_bundle_is_valid() {
        let seed = ContentBundle::seed().unwrap();
        assert!(seed.validate().is_ok());
        assert_eq!(seed.default_locale, Locale::En);
        for locale in LOCALES {
            assert!(seed.content.contains_key(&locale), "seed lacks {}", locale);
        }
    }

    #[test]
    fn test_validate_rejects_missing_default_locale() {
        let mut bundle = ContentBundle::empty();
        bundle.content.remove(&Locale::En);
        assert!(bundle.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut bundle = ContentBundle::empty();
        let card = ServiceCard {
            id: "dup".to_string(),
            ..Default::default()
        };
        bundle
            .content
            .get_mut(&Locale::Ru)
            .unwrap()
            .services
            .extend([card.clone(), card]);
        assert!(bundle.validate().is_err());
    }

    #[test]
    fn test_ensure_locale_clones_default() {
        let mut bundle = ContentBundle::empty();
        bundle.content.get_mut(&Locale::En).unwrap().site.brand = "Brand".to_string();
        bundle.content.remove(&Locale::El);
        bundle.locales.retain(|l| *l != Locale::El);

        let model = bundle.ensure_locale(Locale::El);
        assert_eq!(model.site.brand, "Brand");
        assert!(bundle.locales.contains(&Locale::El));
    }

    #[test]
    fn test_unmodelled_keys_survive_round_trip() {
        let mut value: Value = serde_json::from_str(SEED_BUNDLE_JSON).unwrap();
        value["updatedAt"] = serde_json::json!("2024-05-01");
        value["content"]["en"]["contacts"] = serde_json::json!({ "phoneE164": "+30 210" });
        value["content"]["en"]["blocks"]["process"] = serde_json::json!({ "items": [] });

        let bundle = ContentBundle::from_json(value.to_string().as_bytes()).unwrap();
        let back: Value = serde_json::from_str(&bundle.to_pretty_json().unwrap()).unwrap();

        assert_eq!(back["updatedAt"], "2024-05-01");
        assert_eq!(back["content"]["en"]["contacts"]["phoneE164"], "+30 210");
        assert!(back["content"]["en"]["blocks"]["process"]["items"].is_array());
        assert!(back["content"]["ru"].get("contacts").is_none());
    }

    #[test]
    fn test_faq_and_reviews_are_optional() {
        let bundle = ContentBundle::empty();
        let value = serde_json::to_value(&bundle).unwrap();
        assert!(value["content"]["en"].get("faq").is_none());
        assert!(value["content"]["en"].get("reviews").is_none());

        let raw = r#"{"q":"Is it free?"}"#;
        let item: FaqItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.q, "Is it free?");
        assert_eq!(item.a, "");
    }

    #[test]
    fn test_camel_case_field_names() {
        let card = ServiceCard {
            id: "a".to_string(),
            short_md: "short".to_string(),
            image_url: Some("/uploads/a.webp".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["shortMd"], "short");
        assert_eq!(value["imageUrl"], "/uploads/a.webp");
        assert!(value.get("fullMd").is_some());
    }
}
