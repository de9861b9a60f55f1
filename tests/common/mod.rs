//! Shared test helpers: a scripted in-memory conversation service
//!
//! Lets lifecycle tests control exactly what the remote service returns,
//! per session, including holding a response "in flight" behind a gate
//! so stop/reset races can be exercised deterministically.

// Not every test binary uses every helper.
#![allow(dead_code)]

use agora::catalog::Personality;
use agora::error::{AgoraError, Result};
use agora::service::{ConversationService, NextTurn, StartedSession};
use agora::session::Turn;

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One scripted answer to a next-turn request
pub enum NextScript {
    Turn(Turn),
    Done,
    Fail(String),
    /// Hold the response until the gate is notified, then answer with
    /// the inner script. Models a request that is still in flight when
    /// the user acts.
    Gated(Arc<Notify>, Box<NextScript>),
}

/// Scripted [`ConversationService`] for lifecycle tests
#[derive(Default)]
pub struct ScriptedService {
    personalities: Mutex<Vec<Personality>>,
    starts: Mutex<VecDeque<(Option<Arc<Notify>>, Result<StartedSession>)>>,
    next: Mutex<HashMap<String, VecDeque<NextScript>>>,
    pub start_calls: AtomicUsize,
    pub next_calls: AtomicUsize,
    pub resets: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_start_ok(&self, session_id: &str, speaker: &str, message: &str) {
        self.starts.lock().unwrap().push_back((
            None,
            Ok(StartedSession {
                session_id: session_id.to_string(),
                initial_turn: Turn::new(speaker, message),
            }),
        ));
    }

    /// Queue a successful start that is held in flight until `gate` is
    /// notified. Models a start request still pending when the user acts.
    pub fn queue_start_gated(&self, gate: Arc<Notify>, session_id: &str, speaker: &str, message: &str) {
        self.starts.lock().unwrap().push_back((
            Some(gate),
            Ok(StartedSession {
                session_id: session_id.to_string(),
                initial_turn: Turn::new(speaker, message),
            }),
        ));
    }

    pub fn queue_start_fail(&self, message: &str) {
        self.starts
            .lock()
            .unwrap()
            .push_back((None, Err(AgoraError::Operation(message.to_string()).into())));
    }

    pub fn queue_next(&self, session_id: &str, script: NextScript) {
        self.next
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .push_back(script);
    }

    pub fn set_personalities(&self, list: Vec<Personality>) {
        *self.personalities.lock().unwrap() = list;
    }

    async fn resolve(&self, script: NextScript) -> Result<NextTurn> {
        match script {
            NextScript::Turn(turn) => Ok(NextTurn::Turn(turn)),
            NextScript::Done => Ok(NextTurn::Done),
            NextScript::Fail(message) => Err(AgoraError::Operation(message).into()),
            NextScript::Gated(gate, inner) => {
                gate.notified().await;
                Box::pin(self.resolve(*inner)).await
            }
        }
    }
}

#[async_trait]
impl ConversationService for ScriptedService {
    async fn list_personalities(&self) -> Result<Vec<Personality>> {
        Ok(self.personalities.lock().unwrap().clone())
    }

    async fn upload_personality(&self, _filename: &str, _bytes: Vec<u8>) -> Result<Personality> {
        unimplemented!("uploads are not scripted here")
    }

    async fn start_conversation(
        &self,
        _agent_a: &str,
        _agent_b: &str,
        _topic: &str,
    ) -> Result<StartedSession> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let (gate, result) = self
            .starts
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted start response");
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn next_turn(&self, session_id: &str) -> Result<NextTurn> {
        self.next_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .next
            .lock()
            .unwrap()
            .get_mut(session_id)
            .and_then(|queue| queue.pop_front());
        match script {
            Some(script) => self.resolve(script).await,
            // An exhausted script ends the conversation normally
            None => Ok(NextTurn::Done),
        }
    }

    async fn reset_session(&self, session_id: &str) -> Result<()> {
        self.resets.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

/// Poll `condition` under the (paused) test clock until it holds
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not met within test budget");
}
