use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::audio::{engine::StreamingEngine, session::GuildSession};

/// Registro de sesiones por guild, única estructura compartida entre
/// tenants.
///
/// Las sesiones se crean perezosamente con el primer comando que referencia
/// al guild; [`get_or_create`](Self::get_or_create) es el único camino de
/// construcción y es seguro ante primeras llamadas concurrentes: la entrada
/// del mapa se resuelve una sola vez.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<GuildSession>>,
    engine: Arc<dyn StreamingEngine>,
}

impl SessionRegistry {
    pub fn new(engine: Arc<dyn StreamingEngine>) -> Self {
        Self {
            sessions: DashMap::new(),
            engine,
        }
    }

    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<GuildSession> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("🆕 Sesión creada para guild {}", guild_id);
                Arc::new(GuildSession::new(guild_id, Arc::clone(&self.engine)))
            })
            .clone()
    }

    /// Sesión existente, sin crearla. Para señales de presencia: un guild que
    /// nunca reprodujo nada no tiene nada que detener.
    pub fn get(&self, guild_id: GuildId) -> Option<Arc<GuildSession>> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }

    /// Desaloja las sesiones que llevan inactivas al menos `max_idle`.
    ///
    /// Cada sesión informa su propia inactividad sin bloquear; una sesión
    /// ocupada cuenta como activa y se revisará en la próxima pasada.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_evictable(max_idle));
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            info!("🧹 {} sesiones inactivas desalojadas", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testkit::FakeEngine;

    const GUILD_A: GuildId = GuildId::new(1001);
    const GUILD_B: GuildId = GuildId::new(1002);

    #[tokio::test]
    async fn test_get_or_create_returns_the_same_session() {
        let registry = SessionRegistry::new(FakeEngine::new());

        let first = registry.get_or_create(GUILD_A);
        let second = registry.get_or_create(GUILD_A);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_yields_exactly_one_session() {
        let registry = Arc::new(SessionRegistry::new(FakeEngine::new()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.get_or_create(GUILD_A)
            }));
        }

        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap());
        }

        assert_eq!(registry.len(), 1);
        for session in &sessions[1..] {
            assert!(Arc::ptr_eq(&sessions[0], session));
        }
    }

    #[tokio::test]
    async fn test_get_does_not_create_sessions() {
        let registry = SessionRegistry::new(FakeEngine::new());
        assert!(registry.get(GUILD_A).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_expired_idle_sessions() {
        let registry = SessionRegistry::new(FakeEngine::new());
        registry.get_or_create(GUILD_A);
        registry.get_or_create(GUILD_B);

        // nadie cumple todavía la antigüedad mínima
        assert_eq!(registry.sweep_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 2);

        // con umbral cero, ambas sesiones ociosas se van
        assert_eq!(registry.sweep_idle(Duration::ZERO), 2);
        assert!(registry.is_empty());
    }
}
