use anyhow::{anyhow, Context, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// Key → string resolver for one language
pub trait Localizer: Send + Sync {
    /// Language tag, e.g. `en` or `fr`
    fn tag(&self) -> &str;

    /// Localized value for a key, `None` when the key is unknown
    fn get(&self, key: &str) -> Option<String>;

    /// Localized value for a key with named arguments
    fn get_with_args(&self, key: &str, args: &[(&str, &str)]) -> Option<String>;
}

/// Localizer backed by a Fluent bundle
pub struct FluentLocalizer {
    tag: String,
    bundle: FluentBundle<FluentResource>,
}

impl FluentLocalizer {
    /// Create a localizer from Fluent source text
    pub fn from_ftl(tag: &str, source: &str) -> Result<Self> {
        let locale: LanguageIdentifier = tag
            .parse()
            .with_context(|| format!("Invalid language tag: {tag}"))?;

        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Labels are compared verbatim against incoming text, so no bidi isolation marks
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Failed to parse {tag} resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Conflicting messages in {tag} resource: {errors:?}"))?;

        Ok(Self {
            tag: tag.to_string(),
            bundle,
        })
    }

    /// Load `<dir>/<tag>/main.ftl`
    pub fn load(dir: impl AsRef<Path>, tag: &str) -> Result<Self> {
        let resource_path = dir.as_ref().join(tag).join("main.ftl");
        let content = fs::read_to_string(&resource_path)
            .with_context(|| format!("Failed to read {}", resource_path.display()))?;

        debug!(tag, path = %resource_path.display(), "Loaded localization resource");
        Self::from_ftl(tag, &content)
    }

    /// Load every tag under `dir`, in the given order
    pub fn load_all(dir: impl AsRef<Path>, tags: &[&str]) -> Result<Vec<Arc<dyn Localizer>>> {
        tags.iter()
            .map(|tag| Ok(Arc::new(Self::load(dir.as_ref(), tag)?) as Arc<dyn Localizer>))
            .collect()
    }

    /// Format `id` or, for dotted keys such as `Settings.Button`, the attribute `Button` of `Settings`
    fn format(&self, key: &str, args: Option<&FluentArgs>) -> Option<String> {
        let pattern = match key.split_once('.') {
            Some((id, attribute)) => self.bundle.get_message(id)?.get_attribute(attribute)?.value(),
            None => self.bundle.get_message(key)?.value()?,
        };

        let mut errors = vec![];
        let value = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(tag = %self.tag, key, errors = ?errors, "Errors while formatting message");
        }

        Some(value.into_owned())
    }
}

impl Localizer for FluentLocalizer {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn get(&self, key: &str) -> Option<String> {
        self.format(key, None)
    }

    fn get_with_args(&self, key: &str, args: &[(&str, &str)]) -> Option<String> {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }

        self.format(key, Some(&fluent_args))
    }
}
