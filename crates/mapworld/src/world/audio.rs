use tracing::debug;

/// Background music sink. Playback is fire-and-forget: the world never
/// waits for a track to start.
#[cfg_attr(test, mockall::automock)]
pub trait MusicPlayer: Send + Sync {
    fn play_background_music(&self, track: &str);
}

/// Player that only logs requested tracks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentMusicPlayer;

impl MusicPlayer for SilentMusicPlayer {
    fn play_background_music(&self, track: &str) {
        debug!(track, "background_music_requested");
    }
}
