//! # Localization Tests
//!
//! Loading Fluent resources from disk and resolving keys, attributes and
//! arguments through the `Localizer` trait.

use std::fs;

use telemenu::localization::{FluentLocalizer, Localizer};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn write_locale(dir: &TempDir, tag: &str, source: &str) {
        let locale_dir = dir.path().join(tag);
        fs::create_dir_all(&locale_dir).unwrap();
        fs::write(locale_dir.join("main.ftl"), source).unwrap();
    }

    #[test]
    fn test_bundled_locales_load() {
        let localizers = FluentLocalizer::load_all("./locales", &["en", "fr"])
            .expect("bundled locales should parse");

        assert_eq!(localizers.len(), 2);
        assert_eq!(localizers[0].tag(), "en");
        assert_eq!(localizers[1].tag(), "fr");

        for localizer in &localizers {
            for key in ["ChooseLanguage.Text", "ChooseLanguage.Button", "Welcome.Text", "Links.Text"] {
                assert!(
                    localizer.get(key).is_some(),
                    "{} is missing {key}",
                    localizer.tag()
                );
            }
        }
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        write_locale(&dir, "en", "hello = Hello\nMenu =\n    .Button = Open\n");

        let localizer = FluentLocalizer::load(dir.path(), "en").unwrap();

        assert_eq!(localizer.get("hello").as_deref(), Some("Hello"));
        assert_eq!(localizer.get("Menu.Button").as_deref(), Some("Open"));
        assert_eq!(localizer.get("Menu.Missing"), None);
        assert_eq!(localizer.get("nonexistent-key"), None);
    }

    #[test]
    fn test_arguments_are_not_isolated() {
        let dir = TempDir::new().unwrap();
        write_locale(&dir, "fr", "greeting = Bonjour { $name } !\n");

        let localizer = FluentLocalizer::load(dir.path(), "fr").unwrap();
        let text = localizer.get_with_args("greeting", &[("name", "Alice")]);

        // No bidi isolation marks around the argument
        assert_eq!(text.as_deref(), Some("Bonjour Alice !"));
    }

    #[test]
    fn test_missing_locale_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = FluentLocalizer::load(dir.path(), "de").err().unwrap();
        assert!(err.to_string().contains("main.ftl"));
    }

    #[test]
    fn test_invalid_sources_are_errors() {
        assert!(FluentLocalizer::from_ftl("not a tag!", "a = b").is_err());
        assert!(FluentLocalizer::from_ftl("en", "= broken").is_err());
        assert!(FluentLocalizer::from_ftl("en", "a = one\na = two").is_err());
    }
}
