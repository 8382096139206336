use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use super::{ResolveError, TrackResolver};
use crate::audio::track::TrackInfo;

/// Resolver basado en yt-dlp.
///
/// Las URLs se resuelven directamente; el texto libre pasa por `ytsearch1:`
/// y se queda con el primer resultado. Se pide el formato `bestaudio` para
/// que la URI resultante sea directamente streameable.
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }

    /// Verifica que yt-dlp esté disponible en el PATH.
    pub async fn verify_dependencies(&self) -> anyhow::Result<()> {
        let output = tokio::process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                let version = String::from_utf8_lossy(&out.stdout);
                info!("✅ yt-dlp versión: {}", version.trim());
                Ok(())
            }
            _ => {
                error!("❌ yt-dlp no encontrado. Instala con: pip install yt-dlp");
                anyhow::bail!("yt-dlp no disponible")
            }
        }
    }

    fn is_url(query: &str) -> bool {
        Url::parse(query)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    fn request_for(query: &str) -> String {
        if Self::is_url(query) {
            query.to_owned()
        } else {
            format!("ytsearch1:{query}")
        }
    }

    fn parse_entry(json: &str) -> Result<TrackInfo, ResolveError> {
        let entry: YtDlpEntry = serde_json::from_str(json)
            .map_err(|e| ResolveError::Backend(format!("salida de yt-dlp inválida: {e}")))?;

        let media_uri = entry.url.ok_or(ResolveError::NotFound)?;
        let author = entry
            .channel
            .or(entry.uploader)
            .unwrap_or_else(|| "Desconocido".to_owned());

        Ok(TrackInfo::new(entry.title, author, media_uri))
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<TrackInfo, ResolveError> {
        let request = Self::request_for(query);

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "-j",
                "--no-playlist",
                "-f",
                "bestaudio",
                "--socket-timeout",
                "30",
                "--retries",
                "3",
            ])
            .arg(&request)
            .output()
            .await
            .map_err(|e| ResolveError::Backend(format!("no se pudo ejecutar yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp sin resultados para `{}`: {}", query, stderr.trim());
            return Err(ResolveError::NotFound);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or(ResolveError::NotFound)?;

        Self::parse_entry(line)
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    url: Option<String>,
}
