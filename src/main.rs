use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::{engine::SongbirdEngine, registry::SessionRegistry};
use crate::bot::QuaverBot;
use crate::config::Config;
use crate::sources::YtDlpResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quaver=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Quaver v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::load()?);

    let resolver = Arc::new(YtDlpResolver::new());
    if let Err(e) = resolver.verify_dependencies().await {
        warn!("⚠️ {}: la resolución de pistas fallará hasta instalarlo", e);
    }

    // Un único Songbird compartido: el cliente lo registra para la voz y el
    // motor lo usa para despachar streams
    let songbird = Songbird::serenity();
    let engine = Arc::new(SongbirdEngine::new(
        songbird.clone(),
        reqwest::Client::new(),
        config.default_volume,
    ));
    let registry = Arc::new(SessionRegistry::new(engine));

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let handler = QuaverBot::new(config.clone(), registry.clone(), resolver);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Barrido periódico de sesiones inactivas
    {
        let registry = registry.clone();
        let max_idle = config.session_idle_timeout;
        let every = config.session_sweep_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                registry.sweep_idle(max_idle);
            }
        });
    }

    // Shutdown con Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Error al registrar Ctrl+C");
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        std::process::exit(0);
    });

    info!("🚀 Bot iniciado");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}
