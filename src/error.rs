use thiserror::Error;

/// Errores de la capa de reproducción.
///
/// Todos se recuperan localmente y terminan como un mensaje para el usuario;
/// ninguno tumba la sesión del guild que lo produjo.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("debes estar en un canal de voz")]
    CallerNotConnected,

    #[error("no se encontró la canción, prueba con otra URL o búsqueda")]
    TrackNotFound,

    #[error("no se pudo conectar al canal de voz")]
    ConnectFailed,

    /// Condición normal de fin de cola, nunca llega al usuario.
    #[error("la cola está vacía")]
    EmptyQueue,

    #[error("no hay nada reproduciéndose")]
    NothingPlaying,

    #[error("la reproducción no está pausada")]
    NotPaused,
}
