use serenity::{all::Timestamp, builder::{CreateEmbed, CreateEmbedFooter}};

use crate::audio::track::TrackInfo;

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Quaver";

/// Crea un embed para mostrar la canción actual
pub fn now_playing_embed(track: &TrackInfo) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("**{}**", track.title))
        .color(colors::MUSIC_PURPLE)
        .field("🎤 Artista", &track.author, true)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para mostrar que se agregó una canción a la cola
pub fn queued_embed(track: &TrackInfo) -> CreateEmbed {
    CreateEmbed::default()
        .title("✅ Canción Agregada")
        .description(format!("{} se ha agregado a la cola", track))
        .color(colors::SUCCESS_GREEN)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(
            "🎵 Se reproducirá automáticamente si no hay música sonando",
        ))
}

/// Crea un embed con el listado de la cola en orden de reproducción
pub fn queue_embed(tracks: &[TrackInfo]) -> CreateEmbed {
    let embed = CreateEmbed::default()
        .title("📋 Cola de Reproducción")
        .color(colors::INFO_BLUE)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER));

    if tracks.is_empty() {
        return embed.description("La cola está vacía");
    }

    const MAX_LISTED: usize = 20;
    let mut lines: Vec<String> = tracks
        .iter()
        .take(MAX_LISTED)
        .enumerate()
        .map(|(i, t)| format!("`{}.` {}", i + 1, t))
        .collect();

    if tracks.len() > MAX_LISTED {
        lines.push(format!("… y {} más", tracks.len() - MAX_LISTED));
    }

    embed.description(lines.join("\n"))
}
