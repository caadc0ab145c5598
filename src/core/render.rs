//! Server-side rendering of the public page for one locale.

use crate::core::i18n::t;
use crate::core::markdown::{escape_html, md_to_safe_html, safe_href};
use crate::domain::model::{ContentBundle, ContentModel, ServiceCard};
use crate::domain::locale::{locale_from_pathname, swap_locale_in_pathname};
use crate::domain::Locale;
use std::fmt::Write;

const DEFAULT_ACCENT: &str = "#6b8f71";

/// Full HTML document for `locale`, falling back to the default locale's model.
pub fn render_page(bundle: &ContentBundle, locale: Locale) -> String {
    render_page_at(bundle, &format!("/{}/", locale))
}

/// Renders for a request path; the locale and the switcher links come from it.
pub fn render_page_at(bundle: &ContentBundle, pathname: &str) -> String {
    let locale = locale_from_pathname(pathname);
    let empty = ContentModel::default();
    let model = bundle.model_for(locale).unwrap_or(&empty);
    let accent = model
        .site
        .theme
        .as_ref()
        .and_then(|theme| theme.accent.as_deref())
        .filter(|a| is_css_color(a))
        .unwrap_or(DEFAULT_ACCENT);

    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        "<!doctype html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>:root{{--accent:{accent}}}</style>\n\
         <link rel=\"stylesheet\" href=\"/styles.css\">\n</head>\n<body>\n",
        lang = locale,
        title = escape_html(&model.site.brand),
        accent = accent,
    );

    render_header(&mut html, bundle, model, pathname, locale);
    html.push_str("<main>\n");
    render_hero(&mut html, model);
    render_about(&mut html, model);
    render_services(&mut html, model, locale);
    render_reviews(&mut html, model);
    render_faq(&mut html, model);
    render_cta(&mut html, model);
    html.push_str("</main>\n");

    let footer = &model.blocks.footer;
    let _ = write!(
        html,
        "<footer id=\"footer\">\n<h3>{}</h3>\n<div class=\"md\">{}</div>\n</footer>\n</body>\n</html>\n",
        escape_html(&footer.title),
        md_to_safe_html(&footer.body_md),
    );
    html
}

fn render_header(
    html: &mut String,
    bundle: &ContentBundle,
    model: &ContentModel,
    pathname: &str,
    locale: Locale,
) {
    let _ = write!(
        html,
        "<header>\n<a class=\"brand\" href=\"/{locale}/\">{brand}</a>\n<span class=\"tagline\">{tagline}</span>\n\
         <nav aria-label=\"{label}\">",
        locale = locale,
        brand = escape_html(&model.site.brand),
        tagline = escape_html(&model.site.tagline),
        label = t(locale, "language"),
    );
    for other in bundle.ordered_locales() {
        let current = if other == locale { " aria-current=\"page\"" } else { "" };
        let _ = write!(
            html,
            "<a href=\"{}\" hreflang=\"{}\"{}>{}</a>",
            escape_html(&swap_locale_in_pathname(pathname, other)),
            other,
            current,
            other.as_str().to_uppercase()
        );
    }
    html.push_str("</nav>\n</header>\n");
}

fn render_hero(html: &mut String, model: &ContentModel) {
    let hero = &model.blocks.hero;
    html.push_str("<section class=\"hero\">\n");
    if let Some(url) = hero.image_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(html, "<img src=\"{}\" alt=\"\">", safe_href(url));
    }
    let _ = write!(
        html,
        "<h1>{}</h1>\n<p>{}</p>\n<a class=\"button primary\" href=\"{}\">{}</a>\n\
         <a class=\"button\" href=\"{}\">{}</a>\n</section>\n",
        escape_html(&hero.title),
        escape_html(&hero.subtitle),
        safe_href(&hero.primary_cta_href),
        escape_html(&hero.primary_cta_text),
        safe_href(&hero.secondary_cta_href),
        escape_html(&hero.secondary_cta_text),
    );
}

fn render_about(html: &mut String, model: &ContentModel) {
    let about = &model.blocks.about;
    let _ = write!(
        html,
        "<section id=\"about\">\n<h2>{}</h2>\n<div class=\"md\">{}</div>\n",
        escape_html(&about.title),
        md_to_safe_html(&about.body_md),
    );
    if let Some(highlights) = about.highlights.as_ref().filter(|h| !h.is_empty()) {
        html.push_str("<ul class=\"highlights\">");
        for item in highlights {
            let _ = write!(html, "<li>{}</li>", escape_html(item));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");
}

fn render_services(html: &mut String, model: &ContentModel, locale: Locale) {
    let block = &model.blocks.services;
    let _ = write!(
        html,
        "<section id=\"services\">\n<h2>{}</h2>\n<p>{}</p>\n<div class=\"cards\">\n",
        escape_html(&block.title),
        escape_html(&block.subtitle),
    );
    for card in &model.services {
        render_card(html, card, locale);
    }
    html.push_str("</div>\n</section>\n");
}

fn render_card(html: &mut String, card: &ServiceCard, locale: Locale) {
    let _ = writeln!(html, "<article class=\"card\" id=\"{}\">", escape_html(&card.id));
    if let Some(url) = card.image_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(
            html,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            safe_href(url),
            escape_html(&card.title)
        );
    }
    let _ = write!(
        html,
        "<h3>{}</h3>\n<span class=\"price\">{}</span>\n<div class=\"md\">{}</div>\n\
         <details><summary>{}</summary><div class=\"md\">{}</div></details>\n</article>\n",
        escape_html(&card.title),
        escape_html(&card.price),
        md_to_safe_html(&card.short_md),
        t(locale, "expand"),
        md_to_safe_html(&card.full_md),
    );
}

fn render_reviews(html: &mut String, model: &ContentModel) {
    let Some(reviews) = model.reviews.as_ref().filter(|r| !r.items.is_empty()) else {
        return;
    };
    let _ = write!(
        html,
        "<section id=\"reviews\">\n<h2>{}</h2>\n<div class=\"cards\">\n",
        escape_html(&reviews.title),
    );
    for item in &reviews.items {
        let _ = write!(
            html,
            "<blockquote class=\"card review\"><h3>{}</h3><p>{}</p></blockquote>\n",
            escape_html(&item.title),
            escape_html(&item.text),
        );
    }
    html.push_str("</div>\n</section>\n");
}

fn render_faq(html: &mut String, model: &ContentModel) {
    let Some(faq) = model.faq.as_ref().filter(|f| !f.items.is_empty()) else {
        return;
    };
    let _ = writeln!(
        html,
        "<section id=\"faq\">\n<h2>{}</h2>",
        escape_html(&faq.title),
    );
    for item in &faq.items {
        let _ = writeln!(
            html,
            "<details class=\"faq\"><summary>{}</summary><p>{}</p></details>",
            escape_html(&item.q),
            escape_html(&item.a),
        );
    }
    html.push_str("</section>\n");
}

fn render_cta(html: &mut String, model: &ContentModel) {
    let cta = &model.blocks.cta;
    let _ = write!(
        html,
        "<section id=\"contact\" class=\"cta\">\n<h2>{}</h2>\n<div class=\"md\">{}</div>\n\
         <a class=\"button primary\" href=\"{}\">{}</a>\n</section>\n",
        escape_html(&cta.title),
        md_to_safe_html(&cta.body_md),
        safe_href(&cta.button_href),
        escape_html(&cta.button_text),
    );
}

/// Hex colors only; anything else could break out of the style element.
fn is_css_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FaqItem, FaqSection, ReviewItem, ReviewsSection};

    #[test]
    fn test_seed_page_renders_every_block() {
        let bundle = ContentBundle::seed().unwrap();
        let html = render_page(&bundle, Locale::En);
        let model = &bundle.content[&Locale::En];

        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains(&escape_html(&model.blocks.hero.title)));
        for card in &model.services {
            assert!(html.contains(&format!("id=\"{}\"", card.id)));
        }
        assert!(html.contains("href=\"/ru/\""));
        assert!(html.contains("href=\"/el/\""));
    }

    #[test]
    fn test_missing_locale_falls_back_to_default() {
        let mut bundle = ContentBundle::seed().unwrap();
        bundle.content.remove(&Locale::El);
        let html = render_page(&bundle, Locale::El);
        assert!(html.contains("<html lang=\"el\">"));
        assert!(html.contains(&escape_html(&bundle.content[&Locale::En].site.brand)));
    }

    #[test]
    fn test_content_is_escaped() {
        let mut bundle = ContentBundle::empty();
        {
            let en = bundle.content.get_mut(&Locale::En).unwrap();
            en.site.brand = "<b>Brand</b>".to_string();
            en.blocks.cta.button_href = "javascript:alert(1)".to_string();
            en.services.push(ServiceCard {
                id: "x".to_string(),
                title: "\"quoted\"".to_string(),
                ..Default::default()
            });
        }
        let html = render_page(&bundle, Locale::En);
        assert!(!html.contains("<b>Brand</b>"));
        assert!(html.contains("&lt;b&gt;Brand&lt;/b&gt;"));
        assert!(!html.contains("javascript:"));
        assert!(html.contains("&quot;quoted&quot;"));
    }

    #[test]
    fn test_faq_and_reviews_render_when_present() {
        let mut bundle = ContentBundle::empty();
        assert!(!render_page(&bundle, Locale::En).contains("id=\"faq\""));

        {
            let en = bundle.content.get_mut(&Locale::En).unwrap();
            en.faq = Some(FaqSection {
                title: "Questions".to_string(),
                items: vec![FaqItem {
                    q: "Online <sessions>?".to_string(),
                    a: "Yes".to_string(),
                }],
            });
            en.reviews = Some(ReviewsSection {
                title: "Clients".to_string(),
                items: vec![ReviewItem {
                    title: "Maria".to_string(),
                    text: "Helpful".to_string(),
                }],
            });
        }
        let html = render_page(&bundle, Locale::En);

        assert!(html.contains("<section id=\"faq\">\n<h2>Questions</h2>"));
        assert!(html.contains("<summary>Online &lt;sessions&gt;?</summary><p>Yes</p>"));
        assert!(html.contains("<section id=\"reviews\">\n<h2>Clients</h2>"));
        assert!(html.contains("<h3>Maria</h3><p>Helpful</p>"));
        assert!(html.find("id=\"reviews\"") < html.find("id=\"faq\""));
    }

    #[test]
    fn test_switcher_keeps_the_rest_of_the_path() {
        let bundle = ContentBundle::seed().unwrap();
        let html = render_page_at(&bundle, "/ru/");
        assert!(html.contains("<html lang=\"ru\">"));
        assert!(html.contains("<a href=\"/el/\" hreflang=\"el\">EL</a>"));
        assert!(html.contains("<a href=\"/ru/\" hreflang=\"ru\" aria-current=\"page\">RU</a>"));
    }

    #[test]
    fn test_accent_must_be_hex() {
        assert!(is_css_color("#c0ffee"));
        assert!(is_css_color("#abc"));
        assert!(!is_css_color("red;}</style>"));
        assert!(!is_css_color("#12345"));
    }
}
