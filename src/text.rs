//! Text sources for menu bodies and button labels.

use std::fmt;
use std::sync::Arc;

use crate::session::SessionContext;

/// Where a piece of user-visible text comes from
///
/// Text is resolved per event against the [`SessionContext`], so the same
/// menu renders in whatever language the user picked.
pub enum TextBuilder<U> {
    /// Fixed text
    Static(String),
    /// Localization key, resolved through the event's language (the key itself when unresolved)
    LanguageKey(String),
    /// Localization key with named arguments
    LanguageKeyWithArgs {
        key: String,
        args: Vec<(String, String)>,
    },
    /// String stored in the session scratch space under this key (empty when missing)
    SessionKey(String),
    /// Computed from the context
    Deferred(Arc<dyn Fn(&SessionContext<U>) -> String + Send + Sync>),
    /// `{}` placeholders in `template` filled in order by `parts`
    Format {
        template: String,
        parts: Vec<TextBuilder<U>>,
    },
}

impl<U> TextBuilder<U> {
    pub fn static_text(text: impl Into<String>) -> Self {
        TextBuilder::Static(text.into())
    }

    pub fn key(key: impl Into<String>) -> Self {
        TextBuilder::LanguageKey(key.into())
    }

    pub fn key_with_args(key: impl Into<String>, args: &[(&str, &str)]) -> Self {
        TextBuilder::LanguageKeyWithArgs {
            key: key.into(),
            args: args
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn session_key(key: impl Into<String>) -> Self {
        TextBuilder::SessionKey(key.into())
    }

    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> String + Send + Sync + 'static,
    {
        TextBuilder::Deferred(Arc::new(f))
    }

    pub fn format(template: impl Into<String>, parts: Vec<TextBuilder<U>>) -> Self {
        TextBuilder::Format {
            template: template.into(),
            parts,
        }
    }

    /// Resolve the text for this event
    pub fn resolve(&self, ctx: &SessionContext<U>) -> String {
        match self {
            TextBuilder::Static(text) => text.clone(),
            TextBuilder::LanguageKey(key) => ctx.t(key),
            TextBuilder::LanguageKeyWithArgs { key, args } => {
                let args: Vec<(&str, &str)> = args
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str()))
                    .collect();
                ctx.t_args(key, &args)
            }
            TextBuilder::SessionKey(key) => ctx.get_str(key).unwrap_or_default().to_string(),
            TextBuilder::Deferred(f) => f(ctx),
            TextBuilder::Format { template, parts } => {
                let mut parts = parts.iter();
                let mut pieces = template.split("{}");
                let mut result = pieces.next().unwrap_or_default().to_string();
                for piece in pieces {
                    if let Some(part) = parts.next() {
                        result.push_str(&part.resolve(ctx));
                    }
                    result.push_str(piece);
                }
                result
            }
        }
    }
}

impl<U> Clone for TextBuilder<U> {
    fn clone(&self) -> Self {
        match self {
            TextBuilder::Static(text) => TextBuilder::Static(text.clone()),
            TextBuilder::LanguageKey(key) => TextBuilder::LanguageKey(key.clone()),
            TextBuilder::LanguageKeyWithArgs { key, args } => TextBuilder::LanguageKeyWithArgs {
                key: key.clone(),
                args: args.clone(),
            },
            TextBuilder::SessionKey(key) => TextBuilder::SessionKey(key.clone()),
            TextBuilder::Deferred(f) => TextBuilder::Deferred(Arc::clone(f)),
            TextBuilder::Format { template, parts } => TextBuilder::Format {
                template: template.clone(),
                parts: parts.clone(),
            },
        }
    }
}

impl<U> fmt::Debug for TextBuilder<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextBuilder::Static(text) => f.debug_tuple("Static").field(text).finish(),
            TextBuilder::LanguageKey(key) => f.debug_tuple("LanguageKey").field(key).finish(),
            TextBuilder::LanguageKeyWithArgs { key, args } => f
                .debug_struct("LanguageKeyWithArgs")
                .field("key", key)
                .field("args", args)
                .finish(),
            TextBuilder::SessionKey(key) => f.debug_tuple("SessionKey").field(key).finish(),
            TextBuilder::Deferred(_) => f.write_str("Deferred(..)"),
            TextBuilder::Format { template, parts } => f
                .debug_struct("Format")
                .field("template", template)
                .field("parts", parts)
                .finish(),
        }
    }
}

impl<U> From<&str> for TextBuilder<U> {
    fn from(text: &str) -> Self {
        TextBuilder::Static(text.to_string())
    }
}

impl<U> From<String> for TextBuilder<U> {
    fn from(text: String) -> Self {
        TextBuilder::Static(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::FluentLocalizer;
    use crate::transport::{InboundEvent, Sender};

    fn context() -> SessionContext<()> {
        let from = Sender {
            id: 1,
            ..Default::default()
        };
        SessionContext::new((), InboundEvent::text(from, 1, "hi"), "Welcome")
    }

    #[test]
    fn test_language_key_falls_back_to_key() {
        let mut ctx = context();
        let text: TextBuilder<()> = TextBuilder::key("Welcome-Main");
        assert_eq!(text.resolve(&ctx), "Welcome-Main");

        let fr = FluentLocalizer::from_ftl("fr", "Welcome-Main = Bienvenue").unwrap();
        ctx.set_language(Some(Arc::new(fr)));
        assert_eq!(text.resolve(&ctx), "Bienvenue");
    }

    #[test]
    fn test_session_key_and_format() {
        let mut ctx = context();
        ctx.set("name", "Ali");

        let text: TextBuilder<()> = TextBuilder::format(
            "Hi {}, you are in {}",
            vec![
                TextBuilder::session_key("name"),
                TextBuilder::deferred(|ctx: &SessionContext<()>| ctx.state().to_string()),
            ],
        );
        assert_eq!(text.resolve(&ctx), "Hi Ali, you are in Welcome");

        let missing: TextBuilder<()> = TextBuilder::session_key("nope");
        assert_eq!(missing.resolve(&ctx), "");
    }

    #[test]
    fn test_format_with_missing_parts() {
        let ctx = context();
        let text: TextBuilder<()> = TextBuilder::format("{} and {}", vec!["one".into()]);
        assert_eq!(text.resolve(&ctx), "one and ");
    }
}
