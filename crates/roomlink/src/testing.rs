//! Shared fakes for controller tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::scene::SceneDirector;
use crate::store::PreferencesStore;
use crate::transport::{SessionOptions, SessionTransport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    Connect,
    Disconnect,
    Rejoin,
    EnterLobby,
    Create(String),
    Join(String),
    JoinRandom,
    Leave,
    Nickname(String),
}

/// Scripted transport double: records every request and answers rejoins and
/// connectivity checks from shared flags the test can flip mid-scenario.
#[derive(Clone, Default)]
pub struct FakeTransport {
    pub connected: Arc<AtomicBool>,
    pub accept_rejoin: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<TransportCall>>>,
}

impl FakeTransport {
    pub fn connected_and_accepting() -> Self {
        let transport = Self::default();
        transport.connected.store(true, Ordering::SeqCst);
        transport.accept_rejoin.store(true, Ordering::SeqCst);
        transport
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, call: &TransportCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait::async_trait]
impl SessionTransport for FakeTransport {
    async fn connect(&self) {
        self.record(TransportCall::Connect);
        self.connected.store(true, Ordering::SeqCst);
    }

    async fn disconnect(&self) {
        self.record(TransportCall::Disconnect);
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn rejoin_last_session(&self) -> bool {
        self.record(TransportCall::Rejoin);
        self.accept_rejoin.load(Ordering::SeqCst)
    }

    async fn enter_lobby(&self) {
        self.record(TransportCall::EnterLobby);
    }

    async fn create_session(&self, name: &str, _options: SessionOptions) {
        self.record(TransportCall::Create(name.to_string()));
    }

    async fn join_session(&self, name: &str) {
        self.record(TransportCall::Join(name.to_string()));
    }

    async fn join_random(&self) {
        self.record(TransportCall::JoinRandom);
    }

    async fn leave_session(&self) {
        self.record(TransportCall::Leave);
    }

    async fn set_nickname(&self, nickname: &str) {
        self.record(TransportCall::Nickname(nickname.to_string()));
    }
}

#[derive(Clone, Default)]
pub struct FakeScenes {
    pub lobby_loads: Arc<AtomicUsize>,
    pub game_loads: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SceneDirector for FakeScenes {
    async fn load_lobby(&self) {
        self.lobby_loads.fetch_add(1, Ordering::SeqCst);
    }

    async fn load_game(&self) {
        self.game_loads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Preferences double backed by shared storage so tests can observe writes.
#[derive(Clone, Default)]
pub struct SharedPreferences {
    nickname: Arc<Mutex<Option<String>>>,
}

impl SharedPreferences {
    pub fn preloaded(nickname: &str) -> Self {
        let prefs = Self::default();
        *prefs.nickname.lock().expect("nickname lock") = Some(nickname.to_string());
        prefs
    }

    pub fn stored(&self) -> Option<String> {
        self.nickname.lock().expect("nickname lock").clone()
    }
}

#[async_trait::async_trait]
impl PreferencesStore for SharedPreferences {
    async fn nickname(&self) -> Option<String> {
        self.stored()
    }

    async fn set_nickname(&mut self, nickname: &str) {
        *self.nickname.lock().expect("nickname lock") = Some(nickname.to_string());
    }
}
