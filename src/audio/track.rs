use std::fmt;

/// Descriptor inmutable de una pista ya resuelta.
///
/// Lo crea el resolver una sola vez; a partir de ahí es propiedad de la cola
/// que lo contenga. Igualdad por valor, sin identidad propia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub author: String,
    /// Localizador del medio que el motor de streaming sabe reproducir.
    pub media_uri: String,
}

impl TrackInfo {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        media_uri: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            media_uri: media_uri.into(),
        }
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` de `{}`", self.title, self.author)
    }
}

/// Dónde insertar una pista nueva en la cola.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    /// Se reproducirá a continuación (`/playnext`).
    Front,
    /// Al final de la cola (`/play`).
    Back,
}
