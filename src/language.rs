//! # Language Module
//!
//! Per-user language resolution and the optional language-selection state.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};
use unic_langid::LanguageIdentifier;

use crate::action::{Action, ActionSet};
use crate::handlers::{handler, Flow};
use crate::localization::Localizer;
use crate::menu::StaticMenu;
use crate::session::SessionContext;
use crate::storage::LanguageRepository;
use crate::text::TextBuilder;

/// Available languages and where each user's choice is stored
#[derive(Clone)]
pub struct LanguageConfig {
    localizers: Vec<Arc<dyn Localizer>>,
    repository: Arc<dyn LanguageRepository>,
    selection_state: Option<String>,
    force_choose: bool,
}

impl fmt::Debug for LanguageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.localizers.iter().map(|l| l.tag()).collect();
        f.debug_struct("LanguageConfig")
            .field("localizers", &tags)
            .field("selection_state", &self.selection_state)
            .field("force_choose", &self.force_choose)
            .finish()
    }
}

impl LanguageConfig {
    pub fn new(localizers: Vec<Arc<dyn Localizer>>, repository: Arc<dyn LanguageRepository>) -> Self {
        Self {
            localizers,
            repository,
            selection_state: None,
            force_choose: false,
        }
    }

    /// Register a language-selection state under this name
    pub fn with_selection_state(mut self, state: impl Into<String>) -> Self {
        self.selection_state = Some(state.into());
        self
    }

    /// Send users without a stored language to the selection state first
    pub fn force_choose(mut self, force: bool) -> Self {
        self.force_choose = force;
        self
    }

    pub fn localizers(&self) -> &[Arc<dyn Localizer>] {
        &self.localizers
    }

    pub fn repository(&self) -> &Arc<dyn LanguageRepository> {
        &self.repository
    }

    pub fn selection_state(&self) -> Option<&str> {
        self.selection_state.as_deref()
    }

    /// Whether users without a language must pick one before anything else
    pub fn is_forced(&self) -> bool {
        self.force_choose && self.selection_state.is_some()
    }

    /// Localizer for a stored tag
    ///
    /// Tags are compared verbatim, then by their canonical form (`en_us` finds `en-US`).
    pub fn localizer_for(&self, tag: &str) -> Option<Arc<dyn Localizer>> {
        if let Some(localizer) = self.localizers.iter().find(|l| l.tag() == tag) {
            return Some(Arc::clone(localizer));
        }

        let wanted = tag.replace('_', "-").parse::<LanguageIdentifier>().ok();
        let found = wanted.and_then(|wanted| {
            self.localizers.iter().find(|l| {
                l.tag()
                    .parse::<LanguageIdentifier>()
                    .map(|id| id == wanted)
                    .unwrap_or(false)
            })
        });

        if found.is_none() {
            warn!(tag = %tag, "Stored language tag has no localizer");
        }
        found.cloned()
    }

    /// Synthetic menu offering one button per localizer
    ///
    /// Choosing a language persists it, applies it to the current event and
    /// switches to `default_state`.
    pub(crate) fn selection_menu<U: 'static>(&self, state: &str, default_state: &str) -> StaticMenu<U> {
        let text_key = format!("{state}.Text");
        let button_key = format!("{state}.Button");

        let localizers = self.localizers.clone();
        let state_name = state.to_string();
        let text = TextBuilder::deferred(move |_ctx: &SessionContext<U>| {
            let mut lines: Vec<String> = Vec::with_capacity(localizers.len());
            for localizer in &localizers {
                let line = localizer
                    .get(&text_key)
                    .unwrap_or_else(|| state_name.clone());
                if !lines.contains(&line) {
                    lines.push(line);
                }
            }
            lines.join("\n")
        });

        let localizers = self.localizers.clone();
        let default_state = default_state.to_string();
        StaticMenu::new(text).with_deferred_actions(move |_ctx: &SessionContext<U>| {
            localizers.iter().fold(ActionSet::new(), |set, localizer| {
                let label = localizer
                    .get(&button_key)
                    .unwrap_or_else(|| localizer.tag().to_string());
                let chosen = Arc::clone(localizer);
                let target = default_state.clone();
                let choose = handler(move |ctx: &mut SessionContext<U>| {
                    info!(user_id = %ctx.user_id(), language = %chosen.tag(), "Language chosen");
                    ctx.choose_language(Arc::clone(&chosen));
                    Ok(Flow::switch_state(target.clone()))
                });
                set.button(Action::custom(label, choose))
            })
        })
    }
}
