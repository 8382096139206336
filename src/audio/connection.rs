use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::debug;

use crate::{
    audio::engine::StreamingEngine,
    error::PlaybackError,
};

/// Ciclo de vida de la conexión de voz de un guild.
///
/// Como máximo una conexión por guild; una vez establecida apunta a un único
/// canal hasta que se mueva o se libere. El motor ejecuta las operaciones de
/// red, aquí solo se secuencian y se mantiene el canal actual.
pub struct ConnectionLifecycle {
    guild_id: GuildId,
    engine: Arc<dyn StreamingEngine>,
    channel: Option<ChannelId>,
}

impl ConnectionLifecycle {
    pub fn new(guild_id: GuildId, engine: Arc<dyn StreamingEngine>) -> Self {
        Self {
            guild_id,
            engine,
            channel: None,
        }
    }

    /// Garantiza una conexión al canal pedido: conecta si no hay ninguna,
    /// mueve la existente si apunta a otro canal, y no hace nada si ya
    /// estamos ahí.
    pub async fn ensure_connected(&mut self, target: ChannelId) -> Result<(), PlaybackError> {
        match self.channel {
            None => {
                self.engine
                    .connect(self.guild_id, target)
                    .await
                    .map_err(|_| PlaybackError::ConnectFailed)?;
                self.channel = Some(target);
            }
            Some(current) if current != target => {
                self.engine
                    .move_to(self.guild_id, target)
                    .await
                    .map_err(|_| PlaybackError::ConnectFailed)?;
                self.channel = Some(target);
            }
            Some(_) => {
                debug!("Ya conectados al canal {} en guild {}", target, self.guild_id);
            }
        }
        Ok(())
    }

    /// Libera la conexión. Idempotente: sin conexión activa no hace nada.
    pub async fn release(&mut self) {
        if self.channel.take().is_some() {
            self.engine.disconnect(self.guild_id).await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }
}
