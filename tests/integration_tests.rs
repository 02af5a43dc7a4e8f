//! # Integration Tests
//!
//! Language selection end to end: forced choice for new users, persistence
//! of the chosen tag and localized rendering afterwards.

mod common;

use std::sync::Arc;

use anyhow::Result;

use common::{alice, click, harness, text};
use telemenu::storage::{InMemoryLanguageRepository, LanguageRepository, MenuUser};
use telemenu::transport::Keyboard;
use telemenu::{
    Action, ActionSet, FluentLocalizer, InlineAction, InlineActionSet, InlineMenu, LanguageConfig,
    Localizer, OutgoingRequest, StaticMenu, TextBuilder,
};

const EN: &str = "\
ChooseLanguage =
    .Text = Choose your language
    .Button = English
Welcome =
    .Text = Welcome
    .Settings = Settings
Settings =
    .Text = Settings
";

const FR: &str = "\
ChooseLanguage =
    .Text = Choisissez votre langue
    .Button = Français
Welcome =
    .Text = Bienvenue
    .Settings = Réglages
Settings =
    .Text = Réglages
";

#[cfg(test)]
mod tests {
    use super::*;

    fn language_config(repository: Arc<InMemoryLanguageRepository>, forced: bool) -> LanguageConfig {
        let en: Arc<dyn Localizer> = Arc::new(FluentLocalizer::from_ftl("en", EN).unwrap());
        let fr: Arc<dyn Localizer> = Arc::new(FluentLocalizer::from_ftl("fr", FR).unwrap());
        LanguageConfig::new(vec![en, fr], repository)
            .with_selection_state("ChooseLanguage")
            .force_choose(forced)
    }

    fn welcome() -> StaticMenu<MenuUser> {
        StaticMenu::new(TextBuilder::key("Welcome.Text")).with_actions(
            ActionSet::new()
                .button(Action::switch_state(TextBuilder::key("Welcome.Settings"), "Settings"))
                .button(Action::switch_state("🌐", "ChooseLanguage")),
        )
    }

    fn settings() -> StaticMenu<MenuUser> {
        StaticMenu::new(TextBuilder::key("Settings.Text"))
    }

    #[tokio::test]
    async fn test_forced_language_selection_flow() -> Result<()> {
        let languages = Arc::new(InMemoryLanguageRepository::new());
        let config = language_config(Arc::clone(&languages), true);
        let h = harness(|b| {
            b.with_language(config)
                .add_static_menu("Welcome", welcome())
                .add_static_menu("Settings", settings())
        });

        // A new user lands on the selection state
        h.engine.handle(text("hello")).await;

        let sent = h.transport.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            OutgoingRequest::SendMessage {
                chat_id: alice().id,
                text: "Choose your language\nChoisissez votre langue".to_string(),
                keyboard: Some(Keyboard::Reply(vec![vec![
                    "English".to_string(),
                    "Français".to_string()
                ]])),
            }
        );
        assert_eq!(h.state_of(alice().id).await.as_deref(), Some("ChooseLanguage"));

        // Choosing persists the tag and lands on the default state in that language
        h.engine.handle(text("Français")).await;

        assert_eq!(languages.get_user_language(alice().id).await?.as_deref(), Some("fr"));
        assert_eq!(h.state_of(alice().id).await.as_deref(), Some("Welcome"));
        assert_eq!(h.transport.take_texts(), vec!["Bienvenue".to_string()]);

        // Localized labels are matched in the user's language
        h.engine.handle(text("Réglages")).await;
        assert_eq!(h.transport.take_texts(), vec!["Réglages".to_string()]);
        assert_eq!(h.state_of(alice().id).await.as_deref(), Some("Settings"));
        assert!(h.errors().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_language_is_injected() -> Result<()> {
        let languages = Arc::new(InMemoryLanguageRepository::new());
        languages.set_user_language(alice().id, "en").await?;
        let config = language_config(Arc::clone(&languages), true);
        let h = harness(|b| {
            b.with_language(config)
                .add_static_menu("Welcome", welcome())
                .add_static_menu("Settings", settings())
        });

        h.engine.handle(text("Settings")).await;

        assert_eq!(h.transport.take_texts(), vec!["Settings".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unforced_selection_keeps_default_state() -> Result<()> {
        let languages = Arc::new(InMemoryLanguageRepository::new());
        let config = language_config(Arc::clone(&languages), false);
        let h = harness(|b| {
            b.with_language(config)
                .add_static_menu("Welcome", welcome())
                .add_static_menu("Settings", settings())
        });

        // Without a language, keys resolve to themselves
        h.engine.handle(text("hello")).await;
        assert_eq!(h.transport.take_texts(), vec!["Welcome.Text".to_string()]);

        // The selection state is still reachable through a button
        h.engine.handle(text("🌐")).await;
        assert_eq!(
            h.transport.take_texts(),
            vec!["Choose your language\nChoisissez votre langue".to_string()]
        );

        h.engine.handle(text("English")).await;
        assert_eq!(h.transport.take_texts(), vec!["Welcome".to_string()]);
        assert_eq!(languages.get_user_language(alice().id).await?.as_deref(), Some("en"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_stored_language_renders_keys() -> Result<()> {
        let languages = Arc::new(InMemoryLanguageRepository::new());
        languages.set_user_language(alice().id, "de").await?;
        let config = language_config(Arc::clone(&languages), true);
        let h = harness(|b| {
            b.with_language(config)
                .add_static_menu("Welcome", welcome())
                .add_static_menu("Settings", settings())
        });

        h.engine.handle(text("hello")).await;

        assert_eq!(h.transport.take_texts(), vec!["Welcome.Text".to_string()]);
        assert!(h.errors().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_forced_selection_applies_to_callbacks() -> Result<()> {
        let languages = Arc::new(InMemoryLanguageRepository::new());
        let config = language_config(Arc::clone(&languages), true);
        let h = harness(|b| {
            b.with_language(config)
                .add_static_menu("Welcome", welcome())
                .add_static_menu("Settings", settings())
                .add_inline_menu(
                    "Menu",
                    InlineMenu::new("menu").with_actions(
                        InlineActionSet::new().action(InlineAction::alert("Hi", "hi", "Hello", false)),
                    ),
                )
        });

        h.engine.handle(click("Menu:hi", 9)).await;

        let sent = h.transport.take();
        assert_eq!(sent.len(), 2);
        match &sent[0] {
            OutgoingRequest::SendMessage { text, .. } => {
                assert_eq!(text, "Choose your language\nChoisissez votre langue")
            }
            other => panic!("expected the selection menu, got {other:?}"),
        }
        // The redirected click is still answered
        assert_eq!(
            sent[1],
            OutgoingRequest::AnswerCallback {
                callback_id: "cb-1".to_string(),
                text: None,
                show_alert: false,
            }
        );
        assert_eq!(h.state_of(alice().id).await.as_deref(), Some("ChooseLanguage"));
        Ok(())
    }
}
