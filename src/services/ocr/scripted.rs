use crate::models::image_ref::ImageRef;
use crate::models::ocr_result::RecognitionResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

use super::engine::{EngineEvent, EngineFactory, EngineFault, EventSink, RecognitionEngine};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create,
    Load,
    LoadLanguage(String),
    Initialize(String),
    Recognize,
    Terminate,
}

#[derive(Debug, Clone)]
enum Outcome {
    Text(String),
    Fail(String),
    Fatal(String),
}

#[derive(Default)]
struct ScriptInner {
    calls: Vec<Call>,
    outcomes: VecDeque<Outcome>,
    events: Vec<EngineEvent>,
    fail_load: Option<String>,
    fail_language: Option<String>,
    fail_create_once: Option<String>,
    gated: bool,
    gate_load: bool,
}

/// Test engine script: replays canned events and outcomes and records
/// every call it receives. Clones drive and inspect the same engine.
#[derive(Clone, Default)]
pub struct Script {
    inner: Arc<Mutex<ScriptInner>>,
    started: Arc<Notify>,
    release: Arc<Notify>,
    load_started: Arc<Notify>,
    load_release: Arc<Notify>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful recognition
    pub fn text(self, text: &str) -> Self {
        self.inner.lock().outcomes.push_back(Outcome::Text(text.to_string()));
        self
    }

    pub fn fail_recognition(self, msg: &str) -> Self {
        self.inner.lock().outcomes.push_back(Outcome::Fail(msg.to_string()));
        self
    }

    pub fn fatal_recognition(self, msg: &str) -> Self {
        self.inner.lock().outcomes.push_back(Outcome::Fatal(msg.to_string()));
        self
    }

    pub fn fail_load(self, msg: &str) -> Self {
        self.inner.lock().fail_load = Some(msg.to_string());
        self
    }

    pub fn fail_language(self, msg: &str) -> Self {
        self.inner.lock().fail_language = Some(msg.to_string());
        self
    }

    /// The first `create` fails; later ones succeed
    pub fn fail_create_once(self, msg: &str) -> Self {
        self.inner.lock().fail_create_once = Some(msg.to_string());
        self
    }

    /// Events emitted by every recognition, in order
    pub fn events(self, events: &[(&str, Option<f64>)]) -> Self {
        self.inner.lock().events = events
            .iter()
            .map(|(status, progress)| EngineEvent::new(*status, *progress))
            .collect();
        self
    }

    /// Hold the next recognition until `release` is called
    pub fn gated(self) -> Self {
        self.inner.lock().gated = true;
        self
    }

    /// Hold the next `load` until `release_load` is called
    pub fn gate_load(self) -> Self {
        self.inner.lock().gate_load = true;
        self
    }

    /// Hold the next recognition of an already running script
    pub fn gate_next(&self) {
        self.inner.lock().gated = true;
    }

    pub fn factory(&self) -> Arc<dyn EngineFactory> {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    /// Wait until a gated recognition has started
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Wait until a gated load has started
    pub async fn wait_load_started(&self) {
        self.load_started.notified().await;
    }

    pub fn release_load(&self) {
        self.load_release.notify_one();
    }

    fn record(&self, call: Call) {
        self.inner.lock().calls.push(call);
    }
}

impl EngineFactory for Script {
    fn create(&self) -> Result<Box<dyn RecognitionEngine>, EngineFault> {
        self.record(Call::Create);
        if let Some(msg) = self.inner.lock().fail_create_once.take() {
            return Err(EngineFault::Fatal(msg));
        }
        Ok(Box::new(ScriptedEngine {
            script: self.clone(),
        }))
    }
}

pub struct ScriptedEngine {
    script: Script,
}

#[async_trait]
impl RecognitionEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn load(&mut self) -> Result<(), EngineFault> {
        self.script.record(Call::Load);

        let gated = std::mem::take(&mut self.script.inner.lock().gate_load);
        if gated {
            self.script.load_started.notify_one();
            self.script.load_release.notified().await;
        }

        match self.script.inner.lock().fail_load.clone() {
            Some(msg) => Err(EngineFault::Fatal(msg)),
            None => Ok(()),
        }
    }

    async fn load_language(&mut self, language: &str) -> Result<(), EngineFault> {
        self.script.record(Call::LoadLanguage(language.to_string()));
        match self.script.inner.lock().fail_language.clone() {
            Some(msg) => Err(EngineFault::Fatal(msg)),
            None => Ok(()),
        }
    }

    async fn initialize(&mut self, language: &str) -> Result<(), EngineFault> {
        self.script.record(Call::Initialize(language.to_string()));
        Ok(())
    }

    async fn recognize(
        &mut self,
        _image: &ImageRef,
        events: &EventSink,
    ) -> Result<RecognitionResult, EngineFault> {
        self.script.record(Call::Recognize);

        let gated = std::mem::take(&mut self.script.inner.lock().gated);
        if gated {
            self.script.started.notify_one();
            self.script.release.notified().await;
        }

        let (script_events, outcome) = {
            let mut inner = self.script.inner.lock();
            (inner.events.clone(), inner.outcomes.pop_front())
        };
        for event in script_events {
            events.emit(event);
        }

        match outcome {
            Some(Outcome::Text(text)) => Ok(RecognitionResult::from_text(text)),
            Some(Outcome::Fail(msg)) => Err(EngineFault::Recoverable(msg)),
            Some(Outcome::Fatal(msg)) => Err(EngineFault::Fatal(msg)),
            None => Ok(RecognitionResult::default()),
        }
    }

    async fn terminate(&mut self) -> Result<(), EngineFault> {
        self.script.record(Call::Terminate);
        Ok(())
    }
}
