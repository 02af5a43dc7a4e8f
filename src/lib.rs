//! # Telemenu
//!
//! A conversation-state and menu-routing engine for Telegram bots. Each user
//! sits in a named state rendered as a reply keyboard ("static menu");
//! message-attached keyboards ("inline menus") route clicks back through
//! compact callback data.

pub mod action;
pub mod bot;
pub mod callback_data;
pub mod config;
pub mod error;
pub mod handlers;
pub mod inline_action;
pub mod language;
pub mod layout;
pub mod localization;
pub mod menu;
pub mod session;
pub mod storage;
pub mod text;
pub mod transport;

pub use action::{Action, ActionEffect, ActionSet, NamedConditions};
pub use bot::{Engine, EngineBuilder, PanicReport};
pub use callback_data::{CallbackCodec, CallbackPayload};
pub use config::EngineConfig;
pub use error::{BuildError, RouteError};
pub use handlers::{Flow, HandlerResult, SwitchAction};
pub use inline_action::{InlineAction, InlineActionSet, InlineEffect};
pub use language::LanguageConfig;
pub use layout::{ButtonOptions, RowPolicy};
pub use localization::{FluentLocalizer, Localizer};
pub use menu::{InlineMenu, StaticMenu};
pub use session::SessionContext;
pub use text::TextBuilder;
pub use transport::{InboundEvent, OutgoingRequest, Transport};
