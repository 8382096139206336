use async_trait::async_trait;
use serenity::{
    builder::{CreateMessage, EditInteractionResponse},
    http::Http,
    model::{
        application::CommandInteraction,
        id::{ChannelId, MessageId},
    },
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{audio::track::TrackInfo, ui::embeds};

/// Referencia opaca al mensaje de "reproduciendo ahora" de una sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayHandle {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Superficie de presentación hacia el usuario.
///
/// Las sesiones llaman estos métodos pero no son dueñas del renderizado; los
/// fallos de envío se registran y no interrumpen la reproducción.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Confirma que una pista quedó en cola.
    async fn queued_confirmation(&self, track: &TrackInfo);

    async fn not_found(&self);

    /// Publica el mensaje de "reproduciendo ahora" y devuelve su referencia
    /// para poder reemplazarlo cuando cambie la pista.
    async fn now_playing(&self, track: &TrackInfo) -> Option<DisplayHandle>;

    async fn delete_display(&self, handle: DisplayHandle);

    async fn queue_listing(&self, tracks: &[TrackInfo]);

    async fn status(&self, text: &str);
}

/// Presentador sobre una interacción slash ya diferida.
///
/// Las respuestas inmediatas (confirmación, errores, listado) editan la
/// respuesta diferida; el display de "reproduciendo ahora" vive como mensaje
/// normal del canal porque debe sobrevivir a la interacción que lo originó.
pub struct InteractionPresenter {
    http: Arc<Http>,
    channel_id: ChannelId,
    interaction: CommandInteraction,
}

impl InteractionPresenter {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self {
            http,
            channel_id: interaction.channel_id,
            interaction,
        }
    }

    async fn edit_reply(&self, builder: EditInteractionResponse) {
        if let Err(e) = self.interaction.edit_response(&self.http, builder).await {
            warn!("Error al editar la respuesta de la interacción: {:?}", e);
        }
    }
}

#[async_trait]
impl Presenter for InteractionPresenter {
    async fn queued_confirmation(&self, track: &TrackInfo) {
        self.edit_reply(EditInteractionResponse::new().embed(embeds::queued_embed(track)))
            .await;
    }

    async fn not_found(&self) {
        self.edit_reply(
            EditInteractionResponse::new()
                .content("❌ No se encontró la canción, prueba con otra URL o búsqueda"),
        )
        .await;
    }

    async fn now_playing(&self, track: &TrackInfo) -> Option<DisplayHandle> {
        let message = CreateMessage::new().embed(embeds::now_playing_embed(track));
        match self.channel_id.send_message(&self.http, message).await {
            Ok(sent) => Some(DisplayHandle {
                channel_id: self.channel_id,
                message_id: sent.id,
            }),
            Err(e) => {
                warn!("Error al publicar el mensaje de reproducción: {:?}", e);
                None
            }
        }
    }

    async fn delete_display(&self, handle: DisplayHandle) {
        if let Err(e) = handle
            .channel_id
            .delete_message(&self.http, handle.message_id)
            .await
        {
            debug!("No se pudo borrar el display anterior: {:?}", e);
        }
    }

    async fn queue_listing(&self, tracks: &[TrackInfo]) {
        self.edit_reply(EditInteractionResponse::new().embed(embeds::queue_embed(tracks)))
            .await;
    }

    async fn status(&self, text: &str) {
        self.edit_reply(EditInteractionResponse::new().content(text.to_string()))
            .await;
    }
}
