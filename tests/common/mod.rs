//! Shared fakes for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use telemenu::storage::{InMemoryUserRepository, MenuUser, UserRepository};
use telemenu::transport::{Keyboard, Sender};
use telemenu::{Engine, EngineBuilder, EngineConfig, InboundEvent, OutgoingRequest, Transport};

/// Transport that records every request instead of calling Telegram
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<OutgoingRequest>>,
    next_message_id: AtomicI32,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn take(&self) -> Vec<OutgoingRequest> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }

    /// Make every following request fail
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Texts of sent and edited messages, in order
    pub fn take_texts(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|request| match request {
                OutgoingRequest::SendMessage { text, .. } => Some(text),
                OutgoingRequest::EditMessageText { text, .. } => Some(text),
                OutgoingRequest::AnswerCallback { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Option<i32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("network unreachable"));
        }

        let message_id = match &request {
            OutgoingRequest::AnswerCallback { .. } => None,
            _ => Some(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        self.requests.lock().unwrap().push(request);
        Ok(message_id)
    }
}

pub struct Harness {
    pub engine: Arc<Engine<MenuUser>>,
    pub transport: Arc<RecordingTransport>,
    pub users: Arc<InMemoryUserRepository>,
    pub errors: Arc<Mutex<Vec<String>>>,
    pub panics: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn panics(&self) -> Vec<String> {
        self.panics.lock().unwrap().clone()
    }

    pub async fn state_of(&self, user_id: i64) -> Option<String> {
        self.users.get_state(user_id).await.unwrap()
    }
}

/// Build an engine with default state `Welcome`
pub fn harness(
    configure: impl FnOnce(EngineBuilder<MenuUser>) -> EngineBuilder<MenuUser>,
) -> Harness {
    harness_with(EngineConfig::new("Welcome"), configure)
}

pub fn harness_with(
    config: EngineConfig,
    configure: impl FnOnce(EngineBuilder<MenuUser>) -> EngineBuilder<MenuUser>,
) -> Harness {
    let transport = Arc::new(RecordingTransport::default());
    let users = Arc::new(InMemoryUserRepository::new());
    let errors = Arc::new(Mutex::new(Vec::new()));
    let panics = Arc::new(Mutex::new(Vec::new()));

    let error_log = Arc::clone(&errors);
    let panic_log = Arc::clone(&panics);
    let user_repository: Arc<dyn UserRepository<MenuUser>> = users.clone();
    let builder = Engine::builder(config, transport.clone(), user_repository)
        .on_error(move |_event, err| error_log.lock().unwrap().push(err.to_string()))
        .on_panic(move |report| panic_log.lock().unwrap().push(report.message.clone()));

    let engine = configure(builder).build().expect("engine should build");

    Harness {
        engine,
        transport,
        users,
        errors,
        panics,
    }
}

pub fn alice() -> Sender {
    Sender {
        id: 1001,
        first_name: "Alice".to_string(),
        username: Some("alice".to_string()),
        language_code: Some("en".to_string()),
    }
}

pub fn text(message: &str) -> InboundEvent {
    InboundEvent::text(alice(), 1, message)
}

pub fn click(data: &str, message_id: i32) -> InboundEvent {
    InboundEvent::callback(alice(), "cb-1", data, Some(message_id))
}

pub fn reply_rows(request: &OutgoingRequest) -> Option<Vec<Vec<String>>> {
    match request {
        OutgoingRequest::SendMessage {
            keyboard: Some(Keyboard::Reply(rows)),
            ..
        } => Some(rows.clone()),
        _ => None,
    }
}
