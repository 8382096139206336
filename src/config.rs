use anyhow::Result;
use std::time::Duration;

/// Configuración del bot, cargada del entorno (`.env` opcional).
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Guild de desarrollo: los comandos se registran ahí en vez de global.
    pub guild_id: Option<u64>,

    // Audio
    pub default_volume: f32,

    // Desalojo de sesiones inactivas
    pub session_idle_timeout: Duration,
    pub session_sweep_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,

            session_idle_timeout: Duration::from_secs(
                std::env::var("SESSION_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()?,
            ),
            session_sweep_interval: Duration::from_secs(
                std::env::var("SESSION_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_volume < 0.0 || self.default_volume > 2.0 {
            anyhow::bail!(
                "DEFAULT_VOLUME debe estar entre 0.0 y 2.0, llegó: {}",
                self.default_volume
            );
        }

        if self.session_sweep_interval.is_zero() {
            anyhow::bail!("SESSION_SWEEP_INTERVAL_SECS debe ser mayor que 0");
        }

        Ok(())
    }
}
