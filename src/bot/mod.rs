//! # Bot Module
//!
//! Superficie de comandos y eventos de gateway de Quaver.
//!
//! Cada comando llega etiquetado con su guild, se resuelve la sesión de ese
//! guild en el registro y se invoca la operación serializada que corresponda.
//! Aquí no vive estado de reproducción: solo traducción entre Discord y las
//! sesiones.

use anyhow::Result;
use serenity::{
    all::{Context, EventHandler, Interaction, Ready, VoiceState},
    async_trait,
    builder::{CreateInteractionResponse, CreateInteractionResponseMessage},
    model::{
        application::CommandInteraction,
        id::{ChannelId, GuildId, UserId},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub mod commands;

use crate::{
    audio::{registry::SessionRegistry, track::QueuePosition},
    config::Config,
    sources::TrackResolver,
    ui::presenter::{InteractionPresenter, Presenter},
};

pub struct QuaverBot {
    config: Arc<Config>,
    registry: Arc<SessionRegistry>,
    resolver: Arc<dyn TrackResolver>,
}

impl QuaverBot {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<SessionRegistry>,
        resolver: Arc<dyn TrackResolver>,
    ) -> Self {
        Self {
            config,
            registry,
            resolver,
        }
    }

    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                info!("🏠 Registrando comandos para guild de desarrollo {}", guild_id);
                commands::register_guild_commands(ctx, guild_id).await?;
            }
            None => {
                info!("🌐 Registrando comandos globalmente");
                commands::register_global_commands(ctx).await?;
            }
        }
        Ok(())
    }

    async fn handle_command(&self, ctx: &Context, command: CommandInteraction) -> Result<()> {
        let Some(guild_id) = command.guild_id else {
            return respond(ctx, &command, "❌ Este comando solo funciona dentro de un servidor", true).await;
        };

        info!(
            "📝 Comando /{} de {} en guild {}",
            command.data.name, command.user.name, guild_id
        );

        match command.data.name.as_str() {
            "play" => self.handle_enqueue(ctx, command, guild_id, QueuePosition::Back).await,
            "playnext" => self.handle_enqueue(ctx, command, guild_id, QueuePosition::Front).await,
            "pause" => {
                let result = self.registry.get_or_create(guild_id).pause().await;
                match result {
                    Ok(()) => respond(ctx, &command, "⏸️ Reproducción pausada", false).await,
                    Err(e) => respond(ctx, &command, &format!("❌ {e}"), true).await,
                }
            }
            "resume" => {
                let result = self.registry.get_or_create(guild_id).resume().await;
                match result {
                    Ok(()) => respond(ctx, &command, "▶️ Reproducción reanudada", false).await,
                    Err(e) => respond(ctx, &command, &format!("❌ {e}"), true).await,
                }
            }
            "skip" => {
                let result = self.registry.get_or_create(guild_id).skip().await;
                match result {
                    Ok(()) => respond(ctx, &command, "⏭️ Canción saltada", false).await,
                    Err(e) => respond(ctx, &command, &format!("❌ {e}"), true).await,
                }
            }
            "stop" => {
                self.registry.get_or_create(guild_id).stop().await;
                respond(ctx, &command, "⏹️ Reproducción detenida y cola limpiada", false).await
            }
            "shuffle" => {
                self.registry.get_or_create(guild_id).shuffle().await;
                respond(ctx, &command, "🔀 Cola mezclada", false).await
            }
            "queue" => self.handle_queue(ctx, command, guild_id).await,
            _ => respond(ctx, &command, "❌ Comando no reconocido", true).await,
        }
    }

    /// `/play` y `/playnext`: resuelve, encola y arranca si la sesión estaba
    /// inactiva. La respuesta se difiere porque la resolución tarda.
    async fn handle_enqueue(
        &self,
        ctx: &Context,
        command: CommandInteraction,
        guild_id: GuildId,
        position: QueuePosition,
    ) -> Result<()> {
        let query = command
            .data
            .options
            .iter()
            .find(|opt| opt.name == "query")
            .and_then(|opt| opt.value.as_str())
            .ok_or_else(|| anyhow::anyhow!("query no proporcionado"))?
            .to_owned();

        command
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
            )
            .await?;

        let caller_channel = user_voice_channel(ctx, guild_id, command.user.id);
        let presenter = Arc::new(InteractionPresenter::new(ctx.http.clone(), command));
        let session = self.registry.get_or_create(guild_id);

        // los rechazos ya le llegaron al usuario por el presentador
        if let Err(e) = session
            .enqueue_and_play(
                caller_channel,
                &query,
                position,
                self.resolver.as_ref(),
                presenter,
            )
            .await
        {
            info!("Enqueue rechazado en guild {}: {}", guild_id, e);
        }

        Ok(())
    }

    async fn handle_queue(
        &self,
        ctx: &Context,
        command: CommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        command
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
            )
            .await?;

        let session = self.registry.get_or_create(guild_id);
        let snapshot = session.queue_snapshot().await;

        let presenter = InteractionPresenter::new(ctx.http.clone(), command);
        presenter.queue_listing(&snapshot).await;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for QuaverBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            if let Err(e) = self.handle_command(&ctx, command).await {
                error!("Error manejando comando: {:?}", e);
            }
        }
    }

    /// Señales de presencia que detienen la sesión de un guild: el propio bot
    /// fue desconectado a la fuerza, o el último humano abandonó el canal al
    /// que estamos conectados.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let bot_id = ctx.cache.current_user().id;

        // Bot expulsado del canal de voz
        if new.user_id == bot_id && new.channel_id.is_none() {
            if let Some(guild_id) = new.guild_id {
                if let Some(session) = self.registry.get(guild_id) {
                    warn!("🔌 Bot desconectado a la fuerza en guild {}", guild_id);
                    session.stop().await;
                }
            }
            return;
        }

        // ¿Quedó el bot solo en su canal?
        let Some(guild_id) = new.guild_id else { return };
        let Some(session) = self.registry.get(guild_id) else { return };
        let Some(bot_channel) = session.connected_channel().await else { return };

        let someone_left_bot_channel = old
            .as_ref()
            .and_then(|state| state.channel_id)
            .is_some_and(|channel| channel == bot_channel && new.channel_id != Some(channel));
        if !someone_left_bot_channel {
            return;
        }

        let humans_remaining = {
            let Some(guild) = ctx.cache.guild(guild_id) else { return };
            guild
                .voice_states
                .values()
                .filter(|state| state.channel_id == Some(bot_channel) && state.user_id != bot_id)
                .count()
        };

        if humans_remaining == 0 {
            info!("🚪 Canal de voz sin humanos en guild {}, deteniendo sesión", guild_id);
            session.stop().await;
        }
    }
}

async fn respond(
    ctx: &Context,
    command: &CommandInteraction,
    content: &str,
    ephemeral: bool,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(ephemeral),
            ),
        )
        .await?;
    Ok(())
}

fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    ctx.cache
        .guild(guild_id)
        .and_then(|guild| guild.voice_states.get(&user_id).and_then(|state| state.channel_id))
}
