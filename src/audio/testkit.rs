//! Dobles de los colaboradores externos para las pruebas del núcleo.
//!
//! El motor, el resolver y la superficie de presentación se reemplazan por
//! versiones en memoria que registran cada llamada y dejan que la prueba
//! dispare las finalizaciones a mano.

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use std::collections::{HashMap, VecDeque};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use crate::{
    audio::{
        engine::{CompletionCallback, EngineError, StreamingEngine},
        track::TrackInfo,
    },
    sources::{ResolveError, TrackResolver},
    ui::presenter::{DisplayHandle, Presenter},
};

/// Cede el control al scheduler las veces suficientes para que una
/// continuación reencolada con `tokio::spawn` pase por la puerta de la
/// sesión antes de que la prueba siga afirmando.
pub async fn drain() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Connect(ChannelId),
    MoveTo(ChannelId),
    Disconnect,
    Start(String),
    Stop,
    Pause,
    Resume,
}

/// Motor de streaming en memoria.
///
/// Cada `start_stream` guarda su callback de finalización en orden de
/// despacho; la prueba los dispara con [`complete_next`](Self::complete_next).
/// `stop_stream` no dispara nada por sí mismo, igual que el corte real, cuya
/// notificación llega después por el camino asíncrono del motor.
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    completions: Mutex<VecDeque<CompletionCallback>>,
    fail_connects: AtomicUsize,
    fail_starts: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            completions: Mutex::new(VecDeque::new()),
            fail_connects: AtomicUsize::new(0),
            fail_starts: AtomicUsize::new(0),
        })
    }

    /// Los próximos `n` intentos de conexión fallan.
    pub fn fail_connects(&self, n: usize) {
        self.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Los próximos `n` despachos de stream fallan.
    pub fn fail_starts(&self, n: usize) {
        self.fail_starts.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// URIs despachadas, en orden.
    pub fn started(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Start(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    /// Dispara la finalización más antigua aún pendiente.
    pub fn complete_next(&self, error: Option<&str>) {
        let callback = self
            .completions
            .lock()
            .pop_front()
            .expect("no hay finalizaciones pendientes");
        callback(error.map(str::to_owned));
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl StreamingEngine for FakeEngine {
    async fn connect(&self, _guild_id: GuildId, channel_id: ChannelId) -> Result<(), EngineError> {
        if Self::take_failure(&self.fail_connects) {
            return Err(EngineError::Connect);
        }
        self.calls.lock().push(EngineCall::Connect(channel_id));
        Ok(())
    }

    async fn move_to(&self, _guild_id: GuildId, channel_id: ChannelId) -> Result<(), EngineError> {
        if Self::take_failure(&self.fail_connects) {
            return Err(EngineError::Connect);
        }
        self.calls.lock().push(EngineCall::MoveTo(channel_id));
        Ok(())
    }

    async fn disconnect(&self, _guild_id: GuildId) {
        self.calls.lock().push(EngineCall::Disconnect);
    }

    async fn start_stream(
        &self,
        _guild_id: GuildId,
        media_uri: &str,
        on_complete: CompletionCallback,
    ) -> Result<(), EngineError> {
        if Self::take_failure(&self.fail_starts) {
            return Err(EngineError::Stream("fallo inyectado".into()));
        }
        self.calls.lock().push(EngineCall::Start(media_uri.to_owned()));
        self.completions.lock().push_back(on_complete);
        Ok(())
    }

    async fn stop_stream(&self, _guild_id: GuildId) {
        self.calls.lock().push(EngineCall::Stop);
    }

    async fn pause_stream(&self, _guild_id: GuildId) -> Result<(), EngineError> {
        self.calls.lock().push(EngineCall::Pause);
        Ok(())
    }

    async fn resume_stream(&self, _guild_id: GuildId) -> Result<(), EngineError> {
        self.calls.lock().push(EngineCall::Resume);
        Ok(())
    }
}

/// Resolver en memoria: consulta → pista ya resuelta.
pub struct FakeResolver {
    tracks: Mutex<HashMap<String, TrackInfo>>,
    failure: Mutex<Option<ResolveError>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self {
            tracks: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn add(&self, query: &str, track: TrackInfo) {
        self.tracks.lock().insert(query.to_owned(), track);
    }

    /// La próxima resolución falla con `error` en lugar de buscar.
    pub fn fail_with(&self, error: ResolveError) {
        *self.failure.lock() = Some(error);
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<TrackInfo, ResolveError> {
        if let Some(error) = self.failure.lock().take() {
            return Err(error);
        }
        self.tracks
            .lock()
            .get(query)
            .cloned()
            .ok_or(ResolveError::NotFound)
    }
}

/// Superficie de presentación que solo registra lo que se le pidió mostrar.
pub struct RecordingPresenter {
    queued: Mutex<Vec<String>>,
    not_found: AtomicUsize,
    now_playing: Mutex<Vec<String>>,
    deleted: AtomicUsize,
    statuses: Mutex<Vec<String>>,
    next_message_id: AtomicU64,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(Vec::new()),
            not_found: AtomicUsize::new(0),
            now_playing: Mutex::new(Vec::new()),
            deleted: AtomicUsize::new(0),
            statuses: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(1),
        }
    }

    pub fn saw_not_found(&self) -> bool {
        self.not_found.load(Ordering::SeqCst) > 0
    }

    pub fn now_playing_titles(&self) -> Vec<String> {
        self.now_playing.lock().clone()
    }

    pub fn deleted_displays(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }

    pub fn queued_titles(&self) -> Vec<String> {
        self.queued.lock().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn queued_confirmation(&self, track: &TrackInfo) {
        self.queued.lock().push(track.title.clone());
    }

    async fn not_found(&self) {
        self.not_found.fetch_add(1, Ordering::SeqCst);
    }

    async fn now_playing(&self, track: &TrackInfo) -> Option<DisplayHandle> {
        self.now_playing.lock().push(track.title.clone());
        Some(DisplayHandle {
            channel_id: ChannelId::new(1),
            message_id: MessageId::new(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
        })
    }

    async fn delete_display(&self, _handle: DisplayHandle) {
        self.deleted.fetch_add(1, Ordering::SeqCst);
    }

    async fn queue_listing(&self, _tracks: &[TrackInfo]) {}

    async fn status(&self, text: &str) {
        self.statuses.lock().push(text.to_owned());
    }
}
