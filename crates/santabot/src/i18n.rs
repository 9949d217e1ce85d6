use std::collections::HashMap;

use fluent_templates::{fluent_bundle::FluentValue, static_loader, Loader};
use once_cell::sync::Lazy;
use santacore::DeliveryOption;
use unic_langid::{langid, LanguageIdentifier};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "ru",
        // Telegram shows bidi isolation marks literally
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Supported languages (code, human-readable name).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[("ru", "Русский"), ("en", "English")];

/// Default language identifier used as a fallback.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| langid!("ru"));

/// Picks the UI language from a Telegram `language_code` (falls back to default).
pub fn lang_from_code(code: Option<&str>) -> LanguageIdentifier {
    let Some(code) = code else {
        return DEFAULT_LANG.clone();
    };
    let primary = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();
    match primary.as_str() {
        "en" => langid!("en"),
        _ => DEFAULT_LANG.clone(),
    }
}

/// Returns a localized string for the given key.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()))
}

/// Returns a localized string with arguments for interpolation.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &[(&str, FluentValue<'static>)]) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    })
}

/// Localized label of a delivery option.
pub fn delivery_label(lang: &LanguageIdentifier, option: DeliveryOption) -> String {
    match option {
        DeliveryOption::Pickup => t(lang, "delivery-pickup"),
        DeliveryOption::Home => t(lang, "delivery-home"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_from_code() {
        assert_eq!(lang_from_code(Some("en")), langid!("en"));
        assert_eq!(lang_from_code(Some("en-GB")), langid!("en"));
        assert_eq!(lang_from_code(Some("ru")), langid!("ru"));
        assert_eq!(lang_from_code(Some("de")), langid!("ru"));
        assert_eq!(lang_from_code(None), langid!("ru"));
    }

    #[test]
    fn test_russian_is_default() {
        let ru = lang_from_code(None);
        assert_eq!(t(&ru, "menu-register-button"), "Зарегистрироваться");
        assert_eq!(delivery_label(&ru, DeliveryOption::Pickup), "пункт выдачи");
        assert_eq!(delivery_label(&ru, DeliveryOption::Home), "до дома");
    }

    #[test]
    fn test_english_lookup() {
        let en = langid!("en");
        assert_eq!(delivery_label(&en, DeliveryOption::Home), "home delivery");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        assert_eq!(t(&langid!("ru"), "no-such-key"), "no-such-key");
    }

    #[test]
    fn test_args_are_interpolated() {
        let text = t_args(&langid!("ru"), "reg-done", &[("id", FluentValue::from(7i64))]);
        assert!(text.contains('7'), "{}", text);
    }

    #[test]
    fn test_every_supported_lang_has_menu() {
        for (code, _) in SUPPORTED_LANGS {
            let lang = lang_from_code(Some(code));
            assert_ne!(t(&lang, "menu-text"), "menu-text");
        }
    }
}
