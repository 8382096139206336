use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    tracks::{PlayMode, TrackHandle},
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no se pudo establecer la conexión de voz")]
    Connect,

    #[error("no hay conexión de voz activa para este guild")]
    NoConnection,

    #[error("el stream no pudo iniciarse: {0}")]
    Stream(String),
}

/// Notificación de finalización de un stream despachado.
///
/// Se dispara exactamente una vez por stream: fin natural, corte forzado
/// (`stop_stream`) o error a mitad de pista (el payload describe el error).
/// Si `start_stream` devuelve `Err`, el callback se descarta sin dispararse.
pub type CompletionCallback = Box<dyn FnOnce(Option<String>) + Send + 'static>;

/// Contrato con el motor de streaming de voz.
///
/// El motor es el ejecutor real de conectar/mover/desconectar y del envío de
/// audio; las sesiones solo secuencian llamadas contra él. Cada stream lleva
/// su callback de finalización, que el motor invoca desde su propio contexto
/// de ejecución; quien lo reciba debe reencolar el trabajo en la sesión
/// dueña, nunca avanzar la reproducción dentro de esa llamada.
#[async_trait]
pub trait StreamingEngine: Send + Sync {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), EngineError>;

    async fn move_to(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), EngineError>;

    async fn disconnect(&self, guild_id: GuildId);

    async fn start_stream(
        &self,
        guild_id: GuildId,
        media_uri: &str,
        on_complete: CompletionCallback,
    ) -> Result<(), EngineError>;

    /// Corta el stream en curso; la finalización se notifica por el callback
    /// registrado al despacharlo. Sin stream activo no hace nada.
    async fn stop_stream(&self, guild_id: GuildId);

    async fn pause_stream(&self, guild_id: GuildId) -> Result<(), EngineError>;

    async fn resume_stream(&self, guild_id: GuildId) -> Result<(), EngineError>;
}

/// Implementación sobre songbird.
///
/// El `Songbird` compartido es dueño de los `Call` por guild; aquí solo
/// guardamos el `TrackHandle` del stream en curso para poder cortarlo,
/// pausarlo o reanudarlo.
pub struct SongbirdEngine {
    manager: Arc<Songbird>,
    http_client: reqwest::Client,
    tracks: DashMap<GuildId, TrackHandle>,
    default_volume: f32,
}

impl SongbirdEngine {
    pub fn new(manager: Arc<Songbird>, http_client: reqwest::Client, default_volume: f32) -> Self {
        Self {
            manager,
            http_client,
            tracks: DashMap::new(),
            default_volume,
        }
    }
}

#[async_trait]
impl StreamingEngine for SongbirdEngine {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), EngineError> {
        match self.manager.join(guild_id, channel_id).await {
            Ok(_call) => {
                info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
                Ok(())
            }
            Err(e) => {
                error!("Error al conectar a voz en guild {}: {:?}", guild_id, e);
                Err(EngineError::Connect)
            }
        }
    }

    async fn move_to(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), EngineError> {
        // songbird mueve la conexión existente al repetir el join
        match self.manager.join(guild_id, channel_id).await {
            Ok(_call) => {
                info!("🔀 Conexión movida al canal {} en guild {}", channel_id, guild_id);
                Ok(())
            }
            Err(e) => {
                error!("Error al mover la conexión en guild {}: {:?}", guild_id, e);
                Err(EngineError::Connect)
            }
        }
    }

    async fn disconnect(&self, guild_id: GuildId) {
        self.tracks.remove(&guild_id);
        if let Err(e) = self.manager.remove(guild_id).await {
            debug!("Desconexión de voz en guild {} sin efecto: {:?}", guild_id, e);
        }
    }

    async fn start_stream(
        &self,
        guild_id: GuildId,
        media_uri: &str,
        on_complete: CompletionCallback,
    ) -> Result<(), EngineError> {
        let call = self.manager.get(guild_id).ok_or(EngineError::NoConnection)?;

        let input = songbird::input::HttpRequest::new(self.http_client.clone(), media_uri.to_string());

        let handle = {
            let mut call_lock = call.lock().await;
            call_lock.play_input(input.into())
        };
        let _ = handle.set_volume(self.default_volume);

        let notifier = CompletionNotifier {
            guild_id,
            on_complete: Arc::new(parking_lot::Mutex::new(Some(on_complete))),
        };

        // Fin y error se registran por separado; el callback es de un solo
        // disparo, así que el segundo evento que llegue no hace nada.
        handle
            .add_event(Event::Track(TrackEvent::End), notifier.clone())
            .and_then(|_| handle.add_event(Event::Track(TrackEvent::Error), notifier))
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        self.tracks.insert(guild_id, handle);
        Ok(())
    }

    async fn stop_stream(&self, guild_id: GuildId) {
        if let Some((_, handle)) = self.tracks.remove(&guild_id) {
            let _ = handle.stop();
        }
    }

    async fn pause_stream(&self, guild_id: GuildId) -> Result<(), EngineError> {
        let handle = self.tracks.get(&guild_id).ok_or(EngineError::NoConnection)?;
        handle.pause().map_err(|e| EngineError::Stream(e.to_string()))
    }

    async fn resume_stream(&self, guild_id: GuildId) -> Result<(), EngineError> {
        let handle = self.tracks.get(&guild_id).ok_or(EngineError::NoConnection)?;
        handle.play().map_err(|e| EngineError::Stream(e.to_string()))
    }
}

/// Puente entre los eventos de track de songbird y el callback de
/// finalización del stream despachado.
#[derive(Clone)]
struct CompletionNotifier {
    guild_id: GuildId,
    on_complete: Arc<parking_lot::Mutex<Option<CompletionCallback>>>,
}

#[async_trait]
impl VoiceEventHandler for CompletionNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let error = match ctx {
            EventContext::Track(track_list) => track_list.iter().find_map(|(state, _)| {
                match &state.playing {
                    PlayMode::Errored(e) => Some(e.to_string()),
                    _ => None,
                }
            }),
            _ => None,
        };

        if let Some(callback) = self.on_complete.lock().take() {
            if let Some(ref e) = error {
                warn!("❌ Stream terminó con error en guild {}: {}", self.guild_id, e);
            } else {
                debug!("🎵 Stream terminó en guild {}", self.guild_id);
            }
            callback(error);
        }

        None
    }
}
