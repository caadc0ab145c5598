use crate::core::reconcile::{normalize_services, NormalizeReport};
use crate::core::save::DebouncedSaver;
use crate::domain::model::{
    AboutBlock, ContentBundle, ContentModel, CtaBlock, FooterBlock, HeroBlock, ServiceCard,
    ServicesBlock, SiteInfo, Theme,
};
use crate::domain::Locale;
use crate::utils::error::{Result, SiteError};
use serde::Deserialize;

const SERVICE_ID_LEN: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SitePatch {
    pub brand: Option<String>,
    pub tagline: Option<String>,
    pub accent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeroPatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub primary_cta_text: Option<String>,
    pub primary_cta_href: Option<String>,
    pub secondary_cta_text: Option<String>,
    pub secondary_cta_href: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AboutPatch {
    pub title: Option<String>,
    pub body_md: Option<String>,
    pub highlights: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesBlockPatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CtaPatch {
    pub title: Option<String>,
    pub body_md: Option<String>,
    pub button_text: Option<String>,
    pub button_href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FooterPatch {
    pub title: Option<String>,
    pub body_md: Option<String>,
}

/// Fields of a service card; `id` is never patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServicePatch {
    pub title: Option<String>,
    pub short_md: Option<String>,
    pub full_md: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Empty string clears an optional URL.
fn set_optional_url(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = Some(value).filter(|v| !v.trim().is_empty());
    }
}

impl SitePatch {
    fn apply(self, site: &mut SiteInfo) {
        set(&mut site.brand, self.brand);
        set(&mut site.tagline, self.tagline);
        if let Some(accent) = self.accent {
            site.theme.get_or_insert_with(Theme::default).accent =
                Some(accent).filter(|a| !a.is_empty());
        }
    }
}

impl HeroPatch {
    fn apply(self, hero: &mut HeroBlock) {
        set(&mut hero.title, self.title);
        set(&mut hero.subtitle, self.subtitle);
        set(&mut hero.primary_cta_text, self.primary_cta_text);
        set(&mut hero.primary_cta_href, self.primary_cta_href);
        set(&mut hero.secondary_cta_text, self.secondary_cta_text);
        set(&mut hero.secondary_cta_href, self.secondary_cta_href);
        set_optional_url(&mut hero.image_url, self.image_url);
    }
}

impl AboutPatch {
    fn apply(self, about: &mut AboutBlock) {
        set(&mut about.title, self.title);
        set(&mut about.body_md, self.body_md);
        if let Some(highlights) = self.highlights {
            about.highlights = Some(highlights);
        }
    }
}

impl ServicesBlockPatch {
    fn apply(self, block: &mut ServicesBlock) {
        set(&mut block.title, self.title);
        set(&mut block.subtitle, self.subtitle);
    }
}

impl CtaPatch {
    fn apply(self, cta: &mut CtaBlock) {
        set(&mut cta.title, self.title);
        set(&mut cta.body_md, self.body_md);
        set(&mut cta.button_text, self.button_text);
        set(&mut cta.button_href, self.button_href);
    }
}

impl FooterPatch {
    fn apply(self, footer: &mut FooterBlock) {
        set(&mut footer.title, self.title);
        set(&mut footer.body_md, self.body_md);
    }
}

impl ServicePatch {
    fn apply(self, card: &mut ServiceCard) {
        set(&mut card.title, self.title);
        set(&mut card.short_md, self.short_md);
        set(&mut card.full_md, self.full_md);
        set(&mut card.price, self.price);
        set_optional_url(&mut card.image_url, self.image_url);
    }
}

pub fn new_service_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[..SERVICE_ID_LEN].to_string()
}

/// Card filled with placeholder text, overridden by the draft.
pub fn draft_service(draft: ServicePatch) -> ServiceCard {
    let mut card = ServiceCard {
        id: new_service_id(),
        title: "New service".to_string(),
        short_md: "Short description…".to_string(),
        full_md: "Full description…".to_string(),
        price: "€0".to_string(),
        image_url: None,
    };
    draft.apply(&mut card);
    card
}

/// In-memory editing session over one bundle.
///
/// Every mutation schedules a save when autosave is attached. Structural
/// service edits (add, delete, move, import) finish with a reconciliation pass.
pub struct Editor {
    bundle: ContentBundle,
    locale: Locale,
    saver: Option<DebouncedSaver>,
}

impl Editor {
    pub fn new(mut bundle: ContentBundle) -> Result<Self> {
        bundle.validate()?;
        let locale = bundle.default_locale;
        bundle.ensure_locale(locale);
        Ok(Self {
            bundle,
            locale,
            saver: None,
        })
    }

    pub fn with_autosave(mut self, saver: DebouncedSaver) -> Self {
        self.saver = Some(saver);
        self
    }

    pub fn bundle(&self) -> &ContentBundle {
        &self.bundle
    }

    pub fn into_bundle(self) -> ContentBundle {
        self.bundle
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        let created = !self.bundle.content.contains_key(&locale);
        self.bundle.ensure_locale(locale);
        self.locale = locale;
        if created {
            self.touched();
        }
    }

    /// The active locale always has an entry: `new`, `set_locale` and `import_json` ensure it.
    pub fn model(&self) -> &ContentModel {
        &self.bundle.content[&self.locale]
    }

    fn model_mut(&mut self) -> &mut ContentModel {
        self.bundle.ensure_locale(self.locale)
    }

    fn touched(&self) {
        if let Some(saver) = &self.saver {
            saver.schedule(self.bundle.clone());
        }
    }

    pub fn patch_site(&mut self, patch: SitePatch) -> SiteInfo {
        patch.apply(&mut self.model_mut().site);
        self.touched();
        self.model().site.clone()
    }

    pub fn patch_hero(&mut self, patch: HeroPatch) -> HeroBlock {
        patch.apply(&mut self.model_mut().blocks.hero);
        self.touched();
        self.model().blocks.hero.clone()
    }

    pub fn patch_about(&mut self, patch: AboutPatch) -> AboutBlock {
        patch.apply(&mut self.model_mut().blocks.about);
        self.touched();
        self.model().blocks.about.clone()
    }

    pub fn patch_services_block(&mut self, patch: ServicesBlockPatch) -> ServicesBlock {
        patch.apply(&mut self.model_mut().blocks.services);
        self.touched();
        self.model().blocks.services.clone()
    }

    pub fn patch_cta(&mut self, patch: CtaPatch) -> CtaBlock {
        patch.apply(&mut self.model_mut().blocks.cta);
        self.touched();
        self.model().blocks.cta.clone()
    }

    pub fn patch_footer(&mut self, patch: FooterPatch) -> FooterBlock {
        patch.apply(&mut self.model_mut().blocks.footer);
        self.touched();
        self.model().blocks.footer.clone()
    }

    /// Adds to the active locale; other locales receive a clone.
    pub fn add_service(&mut self, draft: ServicePatch) -> ServiceCard {
        let card = draft_service(draft);
        self.model_mut().services.push(card.clone());
        normalize_services(&mut self.bundle);
        self.touched();
        tracing::info!("➕ Added service {} in {}", card.id, self.locale);
        card
    }

    /// Localized edit: only the active locale's card changes.
    pub fn update_service(&mut self, id: &str, patch: ServicePatch) -> Result<ServiceCard> {
        let card = self
            .model_mut()
            .services
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| SiteError::NotFound {
                what: format!("service {}", id),
            })?;
        patch.apply(card);
        let updated = card.clone();
        self.touched();
        Ok(updated)
    }

    /// Removes the card from every locale.
    pub fn delete_service(&mut self, id: &str) -> Result<()> {
        let mut removed = false;
        for model in self.bundle.content.values_mut() {
            let before = model.services.len();
            model.services.retain(|c| c.id != id);
            removed |= model.services.len() != before;
        }

        if !removed {
            return Err(SiteError::NotFound {
                what: format!("service {}", id),
            });
        }

        normalize_services(&mut self.bundle);
        self.touched();
        tracing::info!("🗑️ Deleted service {}", id);
        Ok(())
    }

    /// Moves the card to `to_index` (clamped) in every locale.
    pub fn move_service(&mut self, id: &str, to_index: usize) -> Result<()> {
        let mut moved = false;
        for model in self.bundle.content.values_mut() {
            if let Some(from) = model.services.iter().position(|c| c.id == id) {
                let card = model.services.remove(from);
                let to = to_index.min(model.services.len());
                model.services.insert(to, card);
                moved = true;
            }
        }

        if !moved {
            return Err(SiteError::NotFound {
                what: format!("service {}", id),
            });
        }

        normalize_services(&mut self.bundle);
        self.touched();
        Ok(())
    }

    pub fn normalize(&mut self) -> NormalizeReport {
        let report = normalize_services(&mut self.bundle);
        if !report.is_noop() {
            self.touched();
        }
        report
    }

    pub fn export_json(&self) -> Result<String> {
        self.bundle.to_pretty_json()
    }

    /// Replaces the whole bundle; the current one is kept if the import is invalid.
    pub fn import_json(&mut self, text: &str) -> Result<NormalizeReport> {
        let mut next = ContentBundle::from_json(text.as_bytes())?;
        next.validate()?;
        let report = normalize_services(&mut next);

        self.bundle = next;
        if !self.bundle.content.contains_key(&self.locale) {
            self.locale = self.bundle.default_locale;
        }
        self.touched();
        Ok(report)
    }

    /// Explicit save: drops any pending autosave and writes now.
    pub async fn save(&self, sink: &dyn crate::domain::ports::BundleSink) -> Result<()> {
        match &self.saver {
            Some(saver) => {
                saver.cancel();
                sink.save(&self.bundle).await
            }
            None => sink.save(&self.bundle).await,
        }
    }

    /// Explicit save through the attached autosave sink.
    pub async fn flush(&self) -> Result<()> {
        match &self.saver {
            Some(saver) => saver.save_now(&self.bundle).await,
            None => Err(SiteError::ConfigError {
                message: "editor has no autosave sink attached".to_string(),
            }),
        }
    }
}
