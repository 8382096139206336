use async_trait::async_trait;
use thiserror::Error;

use crate::audio::track::TrackInfo;

pub mod ytdlp;

pub use ytdlp::YtDlpResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("sin resultados")]
    NotFound,

    #[error("fallo del backend de resolución: {0}")]
    Backend(String),
}

/// Contrato con el resolver de pistas: convierte una URL o un texto libre en
/// una pista reproducible. El texto libre se resuelve como búsqueda tomando
/// el primer resultado.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<TrackInfo, ResolveError>;
}
