// Domain layer: bundle model, locales and ports. No transport or storage code here.

pub mod locale;
pub mod model;
pub mod ports;

pub use locale::{Locale, DEFAULT_LOCALE, LOCALES};
pub use model::{ContentBundle, ContentModel, FaqItem, ReviewItem, ServiceCard, BUNDLE_KEY};
