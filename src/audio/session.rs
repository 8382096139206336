use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        connection::ConnectionLifecycle,
        engine::{CompletionCallback, StreamingEngine},
        queue::PlaybackQueue,
        track::{QueuePosition, TrackInfo},
    },
    error::PlaybackError,
    sources::TrackResolver,
    ui::presenter::{DisplayHandle, Presenter},
};

/// Estado de reproducción de una sesión. Exactamente uno por guild en todo
/// momento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Sin pista despachada.
    Idle,
    /// Hay una pista despachada cuya finalización aún no llegó.
    Playing,
    /// Pista despachada pero suspendida, reanudable.
    Paused,
}

/// Estado mutable de la sesión. Solo se toca con el candado de
/// [`GuildSession`] tomado.
struct SessionInner {
    queue: PlaybackQueue,
    connection: ConnectionLifecycle,
    state: PlaybackState,
    now_playing: Option<DisplayHandle>,
    presenter: Option<Arc<dyn Presenter>>,
    /// Generación del stream despachado. Cada despacho la incrementa; una
    /// finalización que llega con una generación vieja es una continuación
    /// obsoleta (un `stop` o un despacho más nuevo le ganó la carrera).
    epoch: u64,
    idle_since: Instant,
}

/// Sesión de reproducción de un guild: cola, conexión de voz y la máquina de
/// estados que encadena pista tras pista.
///
/// La sesión es un actor: toda operación que mute estado (comandos del
/// usuario y la notificación de fin de pista del motor) pasa por el mismo
/// candado, así que para un guild corre exactamente una a la vez. Guilds
/// distintos no comparten nada más que el registro que los contiene.
///
/// La notificación de finalización llega desde el contexto de ejecución del
/// motor; nunca avanza la reproducción ahí mismo, sino que reencola
/// [`track_ended`](Self::track_ended) como tarea propia, que vuelve a entrar
/// por el candado como cualquier comando.
pub struct GuildSession {
    guild_id: GuildId,
    engine: Arc<dyn StreamingEngine>,
    inner: Mutex<SessionInner>,
}

impl GuildSession {
    pub fn new(guild_id: GuildId, engine: Arc<dyn StreamingEngine>) -> Self {
        let connection = ConnectionLifecycle::new(guild_id, Arc::clone(&engine));
        Self {
            guild_id,
            engine,
            inner: Mutex::new(SessionInner {
                queue: PlaybackQueue::new(),
                connection,
                state: PlaybackState::Idle,
                now_playing: None,
                presenter: None,
                epoch: 0,
                idle_since: Instant::now(),
            }),
        }
    }

    /// Resuelve `query`, encola el resultado y arranca la reproducción si la
    /// sesión estaba inactiva.
    ///
    /// `caller_channel` es el canal de voz del autor del comando; sin él no
    /// se muta nada. Toda la operación corre dentro del candado de la sesión,
    /// de modo que dos enqueues simultáneos no pueden ver ambos `Idle` y
    /// despachar dos streams.
    pub async fn enqueue_and_play(
        self: &Arc<Self>,
        caller_channel: Option<ChannelId>,
        query: &str,
        position: QueuePosition,
        resolver: &dyn TrackResolver,
        presenter: Arc<dyn Presenter>,
    ) -> Result<(), PlaybackError> {
        let Some(target) = caller_channel else {
            presenter.status("🔇 Debes estar en un canal de voz").await;
            return Err(PlaybackError::CallerNotConnected);
        };

        let mut inner = self.inner.lock().await;

        let track = match resolver.resolve(query).await {
            Ok(track) => track,
            Err(e) => {
                info!("🔍 Sin resultados para `{}` en guild {}: {}", query, self.guild_id, e);
                presenter.not_found().await;
                return Err(PlaybackError::TrackNotFound);
            }
        };

        presenter.queued_confirmation(&track).await;

        if let Err(e) = inner.connection.ensure_connected(target).await {
            // la cola queda intacta, sin estado a medias
            presenter.status("❌ No se pudo conectar al canal de voz").await;
            return Err(e);
        }

        match position {
            QueuePosition::Front => inner.queue.push_front(track),
            QueuePosition::Back => inner.queue.push_back(track),
        }
        inner.presenter = Some(presenter);

        if inner.state == PlaybackState::Idle {
            self.advance(&mut inner).await;
        }

        Ok(())
    }

    /// Avanza la cadena de reproducción: saca la siguiente pista de la cola y
    /// la despacha al motor. Una pista que no arranca se registra y se salta;
    /// con la cola vacía la sesión vuelve a `Idle`, que es el fin normal.
    ///
    /// Siempre se llama con el candado tomado. El encadenado pista-a-pista no
    /// es recursivo: cada finalización reentra por [`track_ended`] y esta
    /// función despacha como mucho un stream.
    fn advance<'a>(
        self: &'a Arc<Self>,
        inner: &'a mut SessionInner,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
        // el display se reemplaza, no se apila
        if let Some(handle) = inner.now_playing.take() {
            if let Some(presenter) = &inner.presenter {
                presenter.delete_display(handle).await;
            }
        }

        loop {
            let track = match inner.queue.pop_front() {
                Ok(track) => track,
                Err(_) => {
                    debug!("📭 Cola vacía en guild {}, sesión inactiva", self.guild_id);
                    inner.state = PlaybackState::Idle;
                    inner.idle_since = Instant::now();
                    return;
                }
            };

            inner.epoch += 1;
            let epoch = inner.epoch;
            let session = Arc::clone(self);
            let on_complete: CompletionCallback = Box::new(move |error| {
                // Reentrada por el candado de la sesión como tarea propia;
                // jamás avanzar dentro del contexto del motor.
                tokio::spawn(async move {
                    session.track_ended(epoch, error).await;
                });
            });

            match self
                .engine
                .start_stream(self.guild_id, &track.media_uri, on_complete)
                .await
            {
                Ok(()) => {
                    info!("▶️ Reproduciendo {} en guild {}", track, self.guild_id);
                    inner.state = PlaybackState::Playing;
                    if let Some(presenter) = &inner.presenter {
                        inner.now_playing = presenter.now_playing(&track).await;
                    }
                    return;
                }
                Err(e) => {
                    // una pista rota no debe frenar la cadena
                    warn!("⚠️ No se pudo iniciar {} en guild {}: {}", track, self.guild_id, e);
                    continue;
                }
            }
        }
        })
    }

    /// Continuación de fin de pista. La dispara el callback registrado al
    /// despachar el stream, ya reencolada fuera del contexto del motor.
    pub async fn track_ended(self: &Arc<Self>, epoch: u64, error: Option<String>) {
        let mut inner = self.inner.lock().await;

        if epoch != inner.epoch || inner.state == PlaybackState::Idle {
            // continuación obsoleta: un stop() o un despacho más nuevo ya
            // pasó por aquí; no hay nada que avanzar
            debug!(
                "Continuación obsoleta en guild {} (gen {} vs {})",
                self.guild_id, epoch, inner.epoch
            );
            return;
        }

        if let Some(e) = error {
            // se registra y se sigue con la siguiente, igual que un fin normal
            warn!("❌ Stream falló a mitad de pista en guild {}: {}", self.guild_id, e);
        }

        self.advance(&mut inner).await;
    }

    /// Pausa la pista en curso. Solo válido desde `Playing`.
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        if inner.state != PlaybackState::Playing {
            return Err(PlaybackError::NothingPlaying);
        }

        self.engine
            .pause_stream(self.guild_id)
            .await
            .map_err(|_| PlaybackError::NothingPlaying)?;
        inner.state = PlaybackState::Paused;
        info!("⏸️ Reproducción pausada en guild {}", self.guild_id);
        Ok(())
    }

    /// Reanuda una pista pausada. Solo válido desde `Paused`.
    pub async fn resume(&self) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        if inner.state != PlaybackState::Paused {
            return Err(PlaybackError::NotPaused);
        }

        self.engine
            .resume_stream(self.guild_id)
            .await
            .map_err(|_| PlaybackError::NotPaused)?;
        inner.state = PlaybackState::Playing;
        info!("▶️ Reproducción reanudada en guild {}", self.guild_id);
        Ok(())
    }

    /// Corta la pista en curso. El corte hace que el motor notifique la
    /// finalización igual que un fin natural, y esa continuación es la que
    /// avanza a la siguiente pista.
    pub async fn skip(&self) -> Result<(), PlaybackError> {
        let inner = self.inner.lock().await;
        if inner.state != PlaybackState::Playing {
            return Err(PlaybackError::NothingPlaying);
        }

        info!("⏭️ Pista saltada en guild {}", self.guild_id);
        self.engine.stop_stream(self.guild_id).await;
        Ok(())
    }

    /// Detiene todo: vacía la cola, corta el stream, libera la conexión y
    /// descarta el display. Válido en cualquier estado e idempotente; una
    /// continuación pendiente que llegue después encuentra la sesión `Idle`
    /// y no hace nada.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;

        self.engine.stop_stream(self.guild_id).await;
        inner.queue.clear();
        inner.connection.release().await;

        if let Some(handle) = inner.now_playing.take() {
            if let Some(presenter) = &inner.presenter {
                presenter.delete_display(handle).await;
            }
        }

        inner.state = PlaybackState::Idle;
        inner.idle_since = Instant::now();
        info!("⏹️ Sesión detenida en guild {}", self.guild_id);
    }

    /// Mezcla las pistas que esperan en la cola.
    pub async fn shuffle(&self) {
        self.inner.lock().await.queue.shuffle();
    }

    /// Copia del contenido de la cola en orden de reproducción.
    pub async fn queue_snapshot(&self) -> Vec<TrackInfo> {
        self.inner.lock().await.queue.snapshot().cloned().collect()
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.lock().await.state
    }

    pub async fn connected_channel(&self) -> Option<ChannelId> {
        self.inner.lock().await.connection.channel()
    }

    /// Informa si la sesión lleva inactiva al menos `max_idle` y puede
    /// desalojarse del registro. Una sesión ocupada (candado tomado) nunca
    /// está inactiva, así que aquí no se bloquea.
    pub fn is_evictable(&self, max_idle: Duration) -> bool {
        match self.inner.try_lock() {
            Ok(inner) => {
                inner.state == PlaybackState::Idle
                    && inner.queue.is_empty()
                    && !inner.connection.is_active()
                    && inner.idle_since.elapsed() >= max_idle
            }
            Err(_) => false,
        }
    }
}
