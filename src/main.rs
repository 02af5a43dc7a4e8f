use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use telemenu::handlers::{callback_handler, Flow};
use telemenu::storage::{
    InMemoryLanguageRepository, InMemoryUserRepository, LanguageRepository, MenuUser, PgRepository,
    UserRepository,
};
use telemenu::transport::telegram::event_from_update;
use telemenu::transport::{MediaKind, TelegramTransport};
use telemenu::{
    Action, ActionSet, Engine, EngineBuilder, EngineConfig, FluentLocalizer, InlineAction,
    InlineActionSet, InlineMenu, LanguageConfig, SessionContext, StaticMenu, TextBuilder,
};

const LANGUAGE_STATE: &str = "ChooseLanguage";
const EVENT_QUEUE_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting telemenu demo bot");

    let bot_token = env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

    let mut config = EngineConfig::from_env()?;
    if config.default_state.is_empty() {
        config.default_state = "Welcome".to_string();
    }

    let locales_dir = env::var("LOCALES_DIR").unwrap_or_else(|_| "./locales".to_string());
    let localizers = FluentLocalizer::load_all(&locales_dir, &["en", "fr"])?;

    let (users, languages): (Arc<dyn UserRepository<MenuUser>>, Arc<dyn LanguageRepository>) =
        match env::var("DATABASE_URL") {
            Ok(database_url) => {
                info!("Using PostgreSQL storage");
                let repository = Arc::new(PgRepository::connect(&database_url).await?);
                repository.init_schema().await?;
                (repository.clone(), repository)
            }
            Err(_) => {
                warn!("DATABASE_URL not set, users are kept in memory");
                (
                    Arc::new(InMemoryUserRepository::new()),
                    Arc::new(InMemoryLanguageRepository::new()),
                )
            }
        };

    let bot = Bot::new(bot_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    let language = LanguageConfig::new(localizers, languages)
        .with_selection_state(LANGUAGE_STATE)
        .force_choose(true);

    let engine = register_menus(Engine::builder(config, transport, users))
        .with_language(language)
        .build()?;

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_SIZE);
    let engine_task = tokio::spawn(engine.start(rx));

    info!("Engine ready, starting dispatcher");

    let handler = dptree::entry().endpoint(move |update: Update| {
        let tx = tx.clone();
        async move {
            if let Some(event) = event_from_update(&update) {
                if tx.send(event).await.is_err() {
                    warn!(update_id = %update.id.0, "Engine stopped, dropping update");
                }
            }
            respond(())
        }
    });

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // The dispatcher owned the last sender; the engine drains and stops
    engine_task.await.context("Engine task failed")?;

    Ok(())
}

/// Demo menu graph: a welcome state, an info state and two inline menus
fn register_menus(builder: EngineBuilder<MenuUser>) -> EngineBuilder<MenuUser> {
    let welcome = StaticMenu::new(TextBuilder::key("Welcome.Text"))
        .with_actions(
            ActionSet::new()
                .button(Action::switch_state(TextBuilder::key("Welcome.Info"), "Info"))
                .button(Action::inline_menu(TextBuilder::key("Welcome.Links"), "Links"))
                .button(
                    Action::text(
                        TextBuilder::key("Welcome.Profile"),
                        TextBuilder::deferred(|ctx: &SessionContext<MenuUser>| {
                            let username = ctx.user().username.clone().unwrap_or_default();
                            ctx.t_args("Welcome.ProfileReply", &[("username", &username)])
                        }),
                    )
                    .when("has_username"),
                )
                .button(
                    Action::switch_state(TextBuilder::key("Welcome.Language"), LANGUAGE_STATE)
                        .break_before(),
                )
                .command(Action::switch_state("/start", "Welcome")),
        )
        .define_condition("has_username", |ctx: &SessionContext<MenuUser>| {
            ctx.user().username.is_some()
        })
        .on_media(MediaKind::Photo, |ctx| {
            let reply = ctx.t("Welcome.Photo");
            ctx.reply(reply);
            Ok(Flow::Halt)
        });

    let info = StaticMenu::new(TextBuilder::deferred(|ctx: &SessionContext<MenuUser>| {
        let name = ctx.user().first_name.clone();
        ctx.t_args("Info.Text", &[("name", &name)])
    }))
    .with_actions(
        ActionSet::new().button(Action::switch_state(TextBuilder::key("Info.Back"), "Welcome")),
    )
    .on_text(|ctx| {
        let text = ctx.event().message_text().unwrap_or_default().to_string();
        let reply = ctx.t_args("Info.Echo", &[("text", &text)]);
        ctx.reply(reply);
        Ok(Flow::Halt)
    });

    let links = InlineMenu::new(TextBuilder::key("Links.Text")).with_actions(
        InlineActionSet::new()
            .action(InlineAction::url("Rust", "https://www.rust-lang.org"))
            .action(InlineAction::alert(
                TextBuilder::key("Links.Hello"),
                "hello",
                TextBuilder::key("Links.HelloAlert"),
                false,
            ))
            .action(InlineAction::inline_menu(TextBuilder::key("Links.More"), "more", "More", true))
            .action(
                InlineAction::callback(
                    TextBuilder::key("Links.Pick"),
                    "pick",
                    callback_handler(|ctx, args| {
                        let choice = args.first().cloned().unwrap_or_default();
                        let reply = ctx.t_args("Links.Picked", &[("choice", &choice)]);
                        ctx.answer_callback(Some(reply), true);
                        Ok(Flow::Halt)
                    }),
                )
                .with_args(["42"]),
            ),
    );

    let more = InlineMenu::new(TextBuilder::key("More.Text")).with_actions(
        InlineActionSet::new()
            .action(InlineAction::inline_menu(TextBuilder::key("More.Back"), "back", "Links", true))
            .action(InlineAction::switch_state(TextBuilder::key("More.Info"), "info", "Info")),
    );

    builder
        .add_static_menu("Welcome", welcome)
        .add_static_menu("Info", info)
        .add_inline_menu("Links", links)
        .add_inline_menu("More", more)
}
