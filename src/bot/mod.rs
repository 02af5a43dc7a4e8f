//! Bot module: the routing engine
//!
//! This module is split into several submodules:
//! - `dialogue_manager`: loads and persists conversation states, drives switches
//! - `message_handler`: dispatches messages to the current state's static menu
//! - `callback_handler`: dispatches inline keyboard clicks to inline menus
//! - `ui_builder`: turns menus into outgoing requests
//! - `recovery`: panic capture

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod recovery;
pub mod ui_builder;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::callback_data::CallbackCodec;
use crate::config::EngineConfig;
use crate::error::{BuildError, RouteError};
use crate::handlers::{handler, Flow, Handler, HandlerResult};
use crate::language::LanguageConfig;
use crate::menu::{InlineMenu, StaticMenu};
use crate::session::SessionContext;
use crate::storage::UserRepository;
use crate::transport::{InboundEvent, OutgoingRequest, Transport};

pub use recovery::{install_panic_hook, PanicReport};

use recovery::CaughtPanic;

/// Receives every routing, collaborator and handler error
pub type ErrorHandler = Arc<dyn Fn(&InboundEvent, &RouteError) + Send + Sync>;

/// Receives every caught panic
pub type PanicHandler = Arc<dyn Fn(&PanicReport) + Send + Sync>;

/// Telegram rejects longer messages
const MAX_REPORT_CHARS: usize = 4000;

/// Why processing of an event stopped early
pub(crate) enum Stop {
    Error(RouteError),
    Panic(CaughtPanic),
}

impl From<RouteError> for Stop {
    fn from(err: RouteError) -> Self {
        Stop::Error(err)
    }
}

impl From<CaughtPanic> for Stop {
    fn from(panic: CaughtPanic) -> Self {
        Stop::Panic(panic)
    }
}

/// Clicks carrying callback data get an answer; empty payloads are ignored
fn expects_answer(event: &InboundEvent) -> bool {
    event.callback_data().is_some_and(|data| !data.is_empty())
}

/// Run user code that does not return a [`Flow`], catching panics
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, Stop> {
    recovery::catch(f).map_err(Stop::Panic)
}

/// Registration phase of the engine
///
/// Menus, middleware and handlers are registered on an owned builder;
/// [`EngineBuilder::build`] validates the menu graph and freezes it.
pub struct EngineBuilder<U> {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    users: Arc<dyn UserRepository<U>>,
    language: Option<LanguageConfig>,
    middlewares: Vec<Handler<U>>,
    static_menus: HashMap<String, StaticMenu<U>>,
    inline_menus: HashMap<String, InlineMenu<U>>,
    error_handler: Option<ErrorHandler>,
    panic_handler: Option<PanicHandler>,
    errors: Vec<BuildError>,
}

impl<U: Send + Sync + 'static> EngineBuilder<U> {
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        users: Arc<dyn UserRepository<U>>,
    ) -> Self {
        Self {
            config,
            transport,
            users,
            language: None,
            middlewares: Vec::new(),
            static_menus: HashMap::new(),
            inline_menus: HashMap::new(),
            error_handler: None,
            panic_handler: None,
            errors: Vec::new(),
        }
    }

    /// Register a conversation state
    pub fn add_static_menu(mut self, state: impl Into<String>, menu: StaticMenu<U>) -> Self {
        let state = state.into();
        if self.static_menus.contains_key(&state) {
            self.errors.push(BuildError::DuplicateState(state));
        } else {
            self.static_menus.insert(state, menu);
        }
        self
    }

    /// Register an inline menu; its name prefixes its buttons' callback data
    pub fn add_inline_menu(mut self, name: impl Into<String>, menu: InlineMenu<U>) -> Self {
        let name = name.into();
        if self.inline_menus.contains_key(&name) {
            self.errors.push(BuildError::DuplicateInlineMenu(name));
        } else {
            self.inline_menus.insert(name, menu);
        }
        self
    }

    /// Middleware run for every private event before routing
    pub fn with_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.middlewares.push(handler(middleware));
        self
    }

    pub fn with_language(mut self, language: LanguageConfig) -> Self {
        self.language = Some(language);
        self
    }

    pub fn on_error<F>(mut self, error_handler: F) -> Self
    where
        F: Fn(&InboundEvent, &RouteError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(error_handler));
        self
    }

    pub fn on_panic<F>(mut self, panic_handler: F) -> Self
    where
        F: Fn(&PanicReport) + Send + Sync + 'static,
    {
        self.panic_handler = Some(Arc::new(panic_handler));
        self
    }

    /// Validate the registrations and freeze them into an [`Engine`]
    pub fn build(self) -> Result<Arc<Engine<U>>, BuildError> {
        let EngineBuilder {
            config,
            transport,
            users,
            language,
            middlewares,
            mut static_menus,
            inline_menus,
            error_handler,
            panic_handler,
            errors,
        } = self;

        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }

        if config.default_state.is_empty() {
            return Err(BuildError::MissingDefaultState);
        }

        if let Some(language) = &language {
            if language.localizers().is_empty() {
                return Err(BuildError::NoLocalizers);
            }

            if let Some(selection) = language.selection_state() {
                if static_menus.contains_key(selection) {
                    return Err(BuildError::DuplicateState(selection.to_string()));
                }
                let menu = language.selection_menu(selection, &config.default_state);
                static_menus.insert(selection.to_string(), menu);
            }
        }

        if !static_menus.contains_key(&config.default_state) {
            return Err(BuildError::DefaultStateNotRegistered(
                config.default_state.clone(),
            ));
        }

        let codec = CallbackCodec::new(config.callback_separator.clone());
        if let Some(name) = inline_menus
            .keys()
            .find(|name| name.contains(codec.separator()))
        {
            return Err(BuildError::InlineMenuNameContainsSeparator {
                name: name.clone(),
                separator: codec.separator().to_string(),
            });
        }

        install_panic_hook();

        info!(
            default_state = %config.default_state,
            static_menus = static_menus.len(),
            inline_menus = inline_menus.len(),
            "Engine built"
        );

        Ok(Arc::new(Engine {
            config,
            codec,
            transport,
            users,
            language,
            middlewares,
            static_menus,
            inline_menus,
            error_handler: error_handler.unwrap_or_else(|| Arc::new(log_error)),
            panic_handler: panic_handler.unwrap_or_else(|| Arc::new(log_panic)),
        }))
    }
}

fn log_error(event: &InboundEvent, err: &RouteError) {
    error!(
        user_id = %event.from_user_id(),
        update_id = %event.update_id,
        error = %err,
        "Failed to route event"
    );
}

fn log_panic(report: &PanicReport) {
    error!(
        user_id = %report.event.from_user_id(),
        update_id = %report.event.update_id,
        panic = %report.message,
        backtrace = %report.backtrace,
        "Panic while routing event"
    );
}

/// Immutable routing engine shared by every event task
pub struct Engine<U> {
    config: EngineConfig,
    codec: CallbackCodec,
    transport: Arc<dyn Transport>,
    users: Arc<dyn UserRepository<U>>,
    language: Option<LanguageConfig>,
    middlewares: Vec<Handler<U>>,
    static_menus: HashMap<String, StaticMenu<U>>,
    inline_menus: HashMap<String, InlineMenu<U>>,
    error_handler: ErrorHandler,
    panic_handler: PanicHandler,
}

impl<U> fmt::Debug for Engine<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut states: Vec<&String> = self.static_menus.keys().collect();
        states.sort();
        let mut inline_menus: Vec<&String> = self.inline_menus.keys().collect();
        inline_menus.sort();
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("states", &states)
            .field("inline_menus", &inline_menus)
            .field("language", &self.language)
            .finish()
    }
}

impl<U: Send + Sync + 'static> Engine<U> {
    pub fn builder(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        users: Arc<dyn UserRepository<U>>,
    ) -> EngineBuilder<U> {
        EngineBuilder::new(config, transport, users)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn codec(&self) -> &CallbackCodec {
        &self.codec
    }

    /// Consume events until the channel closes, one task per event
    pub async fn start(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent>) {
        info!("Engine started");
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        info!("Event channel closed, engine stopped");
    }

    /// Process one event on its own task
    ///
    /// Panics that escape handler guards unwind the task and are reported
    /// through its `JoinError`.
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let worker = Arc::clone(&engine);
            let task_event = event.clone();
            let result = tokio::spawn(async move { worker.handle(task_event).await }).await;

            if let Err(e) = result {
                if e.is_panic() {
                    let panic = recovery::from_task_panic(e.into_panic());
                    engine.report_panic(panic.into_report(event)).await;
                } else {
                    debug!(update_id = %event.update_id, "Event task cancelled");
                }
            }
        })
    }

    /// Process one event on the current task, reporting errors and panics
    pub async fn handle(&self, event: InboundEvent) {
        match self.route(&event).await {
            Ok(()) => {}
            Err(Stop::Error(err)) => self.report_error(&event, err).await,
            Err(Stop::Panic(panic)) => self.report_panic(panic.into_report(event)).await,
        }
    }

    async fn route(&self, event: &InboundEvent) -> Result<(), Stop> {
        if !event.is_private_chat() {
            debug!(chat_id = %event.chat_id, "Ignoring non-private event");
            return Ok(());
        }

        let mut ctx = match self.open_session(event).await {
            Ok(ctx) => ctx,
            Err(err) => {
                self.answer_unrouted(event).await;
                return Err(err.into());
            }
        };

        let result = self.route_session(&mut ctx).await;

        if !expects_answer(event) || ctx.callback_answered() {
            return result;
        }

        match result {
            Ok(()) => Ok(self.answer_empty(&mut ctx).await?),
            Err(stop) => {
                // Requests queued by the failing handler are dropped
                ctx.take_outbox();
                if let Err(e) = self.answer_empty(&mut ctx).await {
                    debug!(user_id = %ctx.user_id(), error = %e, "Failed to answer callback after error");
                }
                Err(stop)
            }
        }
    }

    /// Load the user and their state into a fresh context
    async fn open_session(&self, event: &InboundEvent) -> Result<SessionContext<U>, RouteError> {
        let user_id = event.from_user_id();
        let user = self
            .users
            .find_or_create(&event.from)
            .await
            .map_err(|e| RouteError::collaborator(user_id, "find_or_create_user", e))?;
        let state = self.load_state(user_id).await?;
        debug!(user_id = %user_id, state = %state, "Routing event");

        Ok(SessionContext::new(user, event.clone(), state))
    }

    async fn route_session(&self, ctx: &mut SessionContext<U>) -> Result<(), Stop> {
        if self.apply_language(ctx).await? {
            return Ok(());
        }

        for middleware in &self.middlewares {
            match self.run_guarded(ctx, |ctx| middleware(ctx)).await? {
                Flow::Continue => {}
                Flow::Halt => return Ok(()),
                Flow::Switch(action) => return self.switch(ctx, action).await,
            }
        }

        if ctx.event().message().is_some() {
            self.process_message(ctx).await
        } else {
            self.process_callback(ctx).await
        }
    }

    /// Clear the client's loading indicator unless a handler already answered
    pub(crate) async fn answer_empty(&self, ctx: &mut SessionContext<U>) -> Result<(), RouteError> {
        if !ctx.callback_answered() {
            ctx.answer_callback(None, false);
            self.flush(ctx).await?;
        }
        Ok(())
    }

    /// Answer a click whose user could not be loaded
    async fn answer_unrouted(&self, event: &InboundEvent) {
        let Some(callback) = event.callback_query().filter(|_| expects_answer(event)) else {
            return;
        };

        let request = OutgoingRequest::AnswerCallback {
            callback_id: callback.id.clone(),
            text: None,
            show_alert: false,
        };
        if let Err(e) = self.transport.send(request).await {
            debug!(user_id = %event.from_user_id(), error = %e, "Failed to answer callback");
        }
    }

    /// Inject the user's language; `true` when the event was redirected to the selection state
    async fn apply_language(&self, ctx: &mut SessionContext<U>) -> Result<bool, Stop> {
        let Some(language) = &self.language else {
            return Ok(false);
        };

        let user_id = ctx.user_id();
        let stored = language
            .repository()
            .get_user_language(user_id)
            .await
            .map_err(|e| RouteError::collaborator(user_id, "get_user_language", e))?;

        match stored {
            Some(tag) => {
                ctx.set_language(language.localizer_for(&tag));
                Ok(false)
            }
            None => match language.selection_state() {
                Some(selection) if language.is_forced() && ctx.state() != selection => {
                    debug!(user_id = %user_id, "No language chosen, redirecting to selection");
                    self.switch_state(ctx, selection.to_string()).await?;
                    Ok(true)
                }
                _ => Ok(false),
            },
        }
    }

    /// Run a middleware, handler or custom action, then flush what it queued
    pub(crate) async fn run_guarded<F>(&self, ctx: &mut SessionContext<U>, f: F) -> Result<Flow, Stop>
    where
        F: FnOnce(&mut SessionContext<U>) -> HandlerResult + Send,
    {
        let result = recovery::catch(|| f(ctx))?;
        self.flush(ctx).await?;

        result.map_err(|source| {
            Stop::Error(RouteError::Handler {
                user_id: ctx.user_id(),
                state: ctx.state().to_string(),
                source,
            })
        })
    }

    /// Persist a chosen language and send every queued request
    pub(crate) async fn flush(&self, ctx: &mut SessionContext<U>) -> Result<(), RouteError> {
        let user_id = ctx.user_id();

        if let Some(tag) = ctx.take_pending_language() {
            if let Some(language) = &self.language {
                language
                    .repository()
                    .set_user_language(user_id, &tag)
                    .await
                    .map_err(|e| RouteError::collaborator(user_id, "set_user_language", e))?;
                info!(user_id = %user_id, language = %tag, "Stored user language");
            }
        }

        for request in ctx.take_outbox() {
            self.send(user_id, request).await?;
        }

        Ok(())
    }

    pub(crate) async fn send(
        &self,
        user_id: i64,
        request: OutgoingRequest,
    ) -> Result<Option<i32>, RouteError> {
        self.transport
            .send(request)
            .await
            .map_err(|e| RouteError::collaborator(user_id, "send_request", e))
    }

    async fn report_error(&self, event: &InboundEvent, err: RouteError) {
        (self.error_handler)(event, &err);

        let serialized = serde_json::to_string_pretty(event).unwrap_or_default();
        self.send_report(format!("{err}\n\n{serialized}")).await;
    }

    async fn report_panic(&self, report: PanicReport) {
        (self.panic_handler)(&report);

        self.send_report(format!("panic: {}\n\n{}", report.message, report.backtrace))
            .await;
    }

    /// Copy a report to the configured error chat
    async fn send_report(&self, text: String) {
        let Some(chat_id) = self.config.error_chat_id else {
            return;
        };

        let request = OutgoingRequest::SendMessage {
            chat_id,
            text: text.chars().take(MAX_REPORT_CHARS).collect(),
            keyboard: None,
        };
        if let Err(e) = self.transport.send(request).await {
            error!(chat_id = %chat_id, error = %e, "Failed to send error report");
        }
    }
}
