//! Keeps service cards aligned across locales.
//!
//! Cards are stored once per locale, so structural edits in one locale leave
//! the others behind. The canonical sequence is the default locale's order,
//! followed by ids that only exist elsewhere (in locale order). Every locale is
//! rewritten to that sequence; a locale missing a card receives a clone taken
//! from the first locale that has it, default locale first.

use crate::domain::model::{ContentBundle, ServiceCard};
use crate::domain::Locale;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Cards cloned into locales that lacked them.
    pub cloned: usize,
    /// Repeated ids removed within a locale; the first card with an id is kept.
    pub dropped_duplicates: usize,
    /// Locales whose sequence changed.
    pub changed_locales: Vec<Locale>,
}

impl NormalizeReport {
    pub fn is_noop(&self) -> bool {
        self.cloned == 0 && self.dropped_duplicates == 0 && self.changed_locales.is_empty()
    }
}

/// Default locale first, then the rest in bundle order.
fn reconcile_order(bundle: &ContentBundle) -> Vec<Locale> {
    let mut order = vec![bundle.default_locale];
    order.extend(
        bundle
            .ordered_locales()
            .into_iter()
            .filter(|l| *l != bundle.default_locale),
    );
    order
}

pub fn canonical_service_ids(bundle: &ContentBundle) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for locale in reconcile_order(bundle) {
        if let Some(model) = bundle.content.get(&locale) {
            for card in &model.services {
                if !ids.contains(&card.id) {
                    ids.push(card.id.clone());
                }
            }
        }
    }
    ids
}

/// Aligns every locale to the canonical id sequence. A locale that repeats an
/// id keeps only its first card with that id.
pub fn normalize_services(bundle: &mut ContentBundle) -> NormalizeReport {
    let order = reconcile_order(bundle);
    for locale in &order {
        bundle.ensure_locale(*locale);
    }

    let canonical = canonical_service_ids(bundle);

    let mut sources: HashMap<String, ServiceCard> = HashMap::new();
    for locale in &order {
        for card in &bundle.content[locale].services {
            sources
                .entry(card.id.clone())
                .or_insert_with(|| card.clone());
        }
    }

    let mut report = NormalizeReport::default();
    for locale in &order {
        let Some(model) = bundle.content.get_mut(locale) else {
            continue;
        };

        let before: Vec<String> = model.services.iter().map(|c| c.id.clone()).collect();
        let mut own: HashMap<String, ServiceCard> = HashMap::new();
        for card in model.services.drain(..) {
            if own.contains_key(&card.id) {
                tracing::warn!("⚠️ Dropping duplicate service id '{}' in {}", card.id, locale);
                report.dropped_duplicates += 1;
                continue;
            }
            own.insert(card.id.clone(), card);
        }

        for id in &canonical {
            let card = match own.remove(id) {
                Some(card) => card,
                None => {
                    report.cloned += 1;
                    sources[id].clone()
                }
            };
            model.services.push(card);
        }

        if before != canonical {
            report.changed_locales.push(*locale);
        }
    }

    if !report.is_noop() {
        tracing::debug!(
            "Normalized services: {} cloned, {} duplicates dropped, locales changed: {:?}",
            report.cloned,
            report.dropped_duplicates,
            report.changed_locales
        );
    }
    report
}

/// True when every locale holds the same ids in the same order.
pub fn services_aligned(bundle: &ContentBundle) -> bool {
    let mut sequences = bundle
        .content
        .values()
        .map(|m| m.services.iter().map(|c| c.id.as_str()).collect::<Vec<_>>());
    match sequences.next() {
        Some(first) => sequences.all(|s| s == first),
        None => true,
    }
}
