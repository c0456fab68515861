//! In-memory transport for tests

use std::sync::Arc;

use parking_lot::Mutex;

use super::transport::{InputPort, MidiTransport, PacketCallback, PortSelector, StopHandle};
use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened(PortSelector),
    Stopped(String),
}

#[derive(Default)]
struct Script {
    events: Vec<TransportEvent>,
    failing: Vec<PortSelector>,
    fail_listen: bool,
    callback: Option<PacketCallback>,
}

/// Records open/stop calls and lets a test play bytes into the live callback
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(&self, selector: PortSelector) {
        self.script.lock().failing.push(selector);
    }

    pub fn fail_listen(&self, fail: bool) {
        self.script.lock().fail_listen = fail;
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        self.script.lock().events.clone()
    }

    /// Deliver raw bytes as if the driver received them. False when nothing
    /// is listening.
    pub fn inject(&self, data: &[u8]) -> bool {
        let mut script = self.script.lock();
        match script.callback.as_mut() {
            Some(callback) => {
                callback(data);
                true
            }
            None => false,
        }
    }
}

impl MidiTransport for ScriptedTransport {
    fn open(&self, selector: &PortSelector) -> Result<Box<dyn InputPort>, TransportError> {
        let mut script = self.script.lock();
        script.events.push(TransportEvent::Opened(selector.clone()));

        if script.failing.contains(selector) {
            return Err(match selector {
                PortSelector::Index(index) => TransportError::IndexOutOfRange {
                    index: *index,
                    available: 0,
                },
                PortSelector::Name(name) => TransportError::NameNotFound(name.clone()),
            });
        }

        let name = match selector {
            PortSelector::Index(index) => format!("scripted #{}", index),
            PortSelector::Name(name) => format!("scripted {}", name),
        };

        Ok(Box::new(ScriptedPort {
            name,
            script: self.script.clone(),
        }))
    }
}

struct ScriptedPort {
    name: String,
    script: Arc<Mutex<Script>>,
}

impl InputPort for ScriptedPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn listen(self: Box<Self>, callback: PacketCallback) -> Result<Box<dyn StopHandle>, TransportError> {
        let ScriptedPort { name, script } = *self;

        {
            let mut state = script.lock();
            if state.fail_listen {
                return Err(TransportError::Listen {
                    port: name,
                    reason: "scripted failure".to_string(),
                });
            }
            state.callback = Some(callback);
        }

        Ok(Box::new(ScriptedStop { name, script }))
    }
}

struct ScriptedStop {
    name: String,
    script: Arc<Mutex<Script>>,
}

impl StopHandle for ScriptedStop {
    fn stop(self: Box<Self>) {
        let mut script = self.script.lock();
        script.callback = None;
        script.events.push(TransportEvent::Stopped(self.name.clone()));
    }
}
