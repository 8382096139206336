use rand::seq::SliceRandom;
use std::collections::VecDeque;
use tracing::debug;

use crate::{audio::track::TrackInfo, error::PlaybackError};

/// Cola de reproducción de un guild.
///
/// El orden de inserción define el orden de reproducción; se permiten
/// duplicados. La pista en reproducción nunca está aquí: se extrae con
/// [`pop_front`](Self::pop_front) antes de entregarla al motor.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    items: VecDeque<TrackInfo>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Agrega una pista al final de la cola.
    pub fn push_back(&mut self, track: TrackInfo) {
        debug!("➕ En cola (final): {}", track.title);
        self.items.push_back(track);
    }

    /// Agrega una pista al frente, se reproducirá a continuación.
    pub fn push_front(&mut self, track: TrackInfo) {
        debug!("➕ En cola (frente): {}", track.title);
        self.items.push_front(track);
    }

    /// Extrae la pista más antigua según el orden de la cola.
    pub fn pop_front(&mut self) -> Result<TrackInfo, PlaybackError> {
        self.items.pop_front().ok_or(PlaybackError::EmptyQueue)
    }

    /// Permuta uniformemente al azar las pistas restantes.
    ///
    /// Con cero o una pista no hace nada; no es un error.
    pub fn shuffle(&mut self) {
        if self.items.len() < 2 {
            return;
        }
        self.items.make_contiguous().shuffle(&mut rand::thread_rng());
        debug!("🔀 Cola mezclada ({} pistas)", self.items.len());
    }

    /// Vacía la cola incondicionalmente.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Vista perezosa del contenido actual para mostrarla al usuario.
    /// No muta la cola y puede recorrerse las veces que haga falta.
    pub fn snapshot(&self) -> impl Iterator<Item = &TrackInfo> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn track(title: &str) -> TrackInfo {
        TrackInfo::new(title, "artista", format!("https://media.test/{title}"))
    }

    fn titles(queue: &PlaybackQueue) -> Vec<String> {
        queue.snapshot().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_push_back_is_fifo_and_push_front_is_lifo_at_head() {
        let mut queue = PlaybackQueue::new();
        queue.push_back(track("a"));
        queue.push_back(track("b"));
        queue.push_front(track("c"));

        assert_eq!(titles(&queue), vec!["c", "a", "b"]);
        assert_eq!(queue.pop_front().unwrap().title, "c");
        assert_eq!(queue.pop_front().unwrap().title, "a");
        assert_eq!(queue.pop_front().unwrap().title, "b");
    }

    #[test]
    fn test_pop_front_on_empty_queue_fails_and_leaves_queue_unchanged() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.pop_front(), Err(PlaybackError::EmptyQueue));
        assert!(queue.is_empty());

        queue.push_back(track("a"));
        queue.pop_front().unwrap();
        assert_eq!(queue.pop_front(), Err(PlaybackError::EmptyQueue));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_shuffle_preserves_the_multiset_of_tracks() {
        let mut queue = PlaybackQueue::new();
        for title in ["a", "b", "b", "c", "d", "e"] {
            queue.push_back(track(title));
        }

        let mut expected: HashMap<String, usize> = HashMap::new();
        for t in queue.snapshot() {
            *expected.entry(t.title.clone()).or_default() += 1;
        }

        queue.shuffle();

        let mut after: HashMap<String, usize> = HashMap::new();
        for t in queue.snapshot() {
            *after.entry(t.title.clone()).or_default() += 1;
        }
        assert_eq!(after, expected);
        assert_eq!(queue.len(), 6);
    }

    #[test]
    fn test_shuffle_is_a_noop_on_small_queues() {
        let mut empty = PlaybackQueue::new();
        empty.shuffle();
        assert!(empty.is_empty());

        let mut single = PlaybackQueue::new();
        single.push_back(track("a"));
        single.shuffle();
        assert_eq!(titles(&single), vec!["a"]);
    }

    #[test]
    fn test_clear_empties_unconditionally() {
        let mut queue = PlaybackQueue::new();
        queue.push_back(track("a"));
        queue.push_back(track("b"));
        queue.clear();
        assert!(queue.is_empty());

        // repetirlo no es un error
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_does_not_mutate_and_restarts() {
        let mut queue = PlaybackQueue::new();
        queue.push_back(track("a"));
        queue.push_back(track("b"));

        let first: Vec<_> = queue.snapshot().map(|t| t.title.clone()).collect();
        let second: Vec<_> = queue.snapshot().map(|t| t.title.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(queue.len(), 2);
    }
}
