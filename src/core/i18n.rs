use crate::domain::Locale;

// (key, en, ru, el)
const UI: &[(&str, &str, &str, &str)] = &[
    ("navSite", "Site", "Сайт", "Ιστότοπος"),
    ("navAdmin", "Admin", "Админ", "Διαχείριση"),
    ("loading", "Loading…", "Загрузка…", "Φόρτωση…"),
    (
        "failed",
        "Failed to load content",
        "Не удалось загрузить контент",
        "Αποτυχία φόρτωσης περιεχομένου",
    ),
    ("expand", "Expand", "Развернуть", "Άνοιγμα"),
    ("collapse", "Collapse", "Свернуть", "Κλείσιμο"),
    ("close", "Close", "Закрыть", "Κλείσιμο"),
    ("language", "Language", "Язык", "Γλώσσα"),
];

/// UI string for `key`; English when `locale` has no translation, the key itself when unknown.
pub fn t(locale: Locale, key: &str) -> &str {
    lookup(UI, locale, key)
}

fn lookup<'a>(table: &[(&'a str, &'a str, &'a str, &'a str)], locale: Locale, key: &'a str) -> &'a str {
    let Some(&(_, en, ru, el)) = table.iter().find(|(k, ..)| *k == key) else {
        return key;
    };
    let localized = match locale {
        Locale::En => en,
        Locale::Ru => ru,
        Locale::El => el,
    };
    [localized, en].into_iter().find(|s| !s.is_empty()).unwrap_or(key)
}
