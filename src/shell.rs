//! Playback controller behind the window.
//!
//! [`PlayerShell`] owns the engine, the history and the position poller, and
//! implements every user action. It holds no UI state, so it runs the same
//! under egui or in tests.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::engine::PlaybackEngine;
use crate::error::PlayerError;
use crate::history::{HistoryEntry, HistoryTracker};
use crate::poller::{self, PositionPoller, Progress};

/// Tunables taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ShellSettings {
    pub poll_interval: Duration,
    pub seek_step_ms: u64,
    pub volume_percent: u8,
    pub save_on_exit: bool,
}

impl ShellSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.playback.poll_interval_ms.max(1)),
            seek_step_ms: config.playback.seek_step_ms,
            volume_percent: config.playback.volume_percent.min(100),
            save_on_exit: config.playback.save_on_exit,
        }
    }
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Whether the video or the online page fills the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Video,
    Online,
}

pub struct PlayerShell<E> {
    engine: E,
    history: HistoryTracker,
    poller: PositionPoller,
    settings: ShellSettings,
    current: Option<PathBuf>,
    playing: bool,
    progress: Option<Progress>,
    volume_percent: u8,
    view: View,
}

impl<E: PlaybackEngine> PlayerShell<E> {
    pub fn new(mut engine: E, history: HistoryTracker, settings: ShellSettings) -> Self {
        engine.set_volume_percent(settings.volume_percent);
        Self {
            engine,
            history,
            poller: PositionPoller::new(settings.poll_interval),
            volume_percent: settings.volume_percent,
            settings,
            current: None,
            playing: false,
            progress: None,
            view: View::Video,
        }
    }

    /// Start `path` at `start_ms` and move it to the front of the history.
    ///
    /// A missing file is rejected before the engine is touched.
    pub fn play_file(
        &mut self,
        path: &Path,
        start_ms: u64,
        now: Instant,
    ) -> Result<(), PlayerError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Skipping missing media");
            return Err(PlayerError::NotFound(path.to_path_buf()));
        }

        if let Err(e) = self.engine.play(path) {
            // The engine dropped whatever was open before.
            self.current = None;
            self.playing = false;
            self.progress = None;
            self.poller.stop();
            return Err(e);
        }
        if start_ms > 0 {
            self.engine.seek(start_ms);
        }

        self.current = Some(path.to_path_buf());
        self.playing = true;
        self.progress = None;
        self.view = View::Video;
        self.poller.start(now);
        self.remember(path, start_ms);
        Ok(())
    }

    /// Resume the history entry at `index` from its stored offset.
    pub fn open_from_history(&mut self, index: usize, now: Instant) -> Result<(), PlayerError> {
        let Some(HistoryEntry { path, resume_ms }) = self.history.list().get(index).cloned() else {
            return Ok(());
        };
        self.play_file(Path::new(&path), resume_ms, now)
    }

    /// First dropped file wins; the rest are ignored.
    pub fn open_dropped<I>(&mut self, paths: I, now: Instant) -> Result<(), PlayerError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        match paths.into_iter().next() {
            Some(path) => self.play_file(&path, 0, now),
            None => Ok(()),
        }
    }

    pub fn play(&mut self, now: Instant) {
        if self.current.is_none() {
            return;
        }
        tracing::debug!("Resume");
        self.engine.resume();
        self.playing = true;
        self.poller.start(now);
    }

    pub fn pause(&mut self) {
        tracing::debug!("Pause");
        self.engine.pause();
        self.playing = false;
    }

    pub fn toggle_play_pause(&mut self, now: Instant) {
        if self.playing {
            self.pause();
        } else {
            self.play(now);
        }
    }

    pub fn stop(&mut self) {
        tracing::debug!("Stop");
        self.engine.stop();
        self.playing = false;
        self.poller.stop();
        self.progress = poller::sample(&self.engine);
    }

    pub fn forward(&mut self) {
        let mut target = self.position_ms() + self.settings.seek_step_ms;
        if let Ok(duration) = u64::try_from(self.engine.duration_ms()) {
            if duration > 0 {
                target = target.min(duration);
            }
        }
        self.seek_to(target);
    }

    pub fn rewind(&mut self) {
        let target = self.position_ms().saturating_sub(self.settings.seek_step_ms);
        self.seek_to(target);
    }

    pub fn seek_to(&mut self, ms: u64) {
        if self.current.is_none() {
            return;
        }
        self.engine.seek(ms);
        self.progress = poller::sample(&self.engine);
    }

    pub fn set_volume_percent(&mut self, percent: u8) {
        self.volume_percent = percent.min(100);
        self.engine.set_volume_percent(self.volume_percent);
    }

    /// Pause and switch to the online page.
    pub fn open_online(&mut self) {
        self.pause();
        self.view = View::Online;
    }

    pub fn close_online(&mut self) {
        self.view = View::Video;
    }

    /// Drive the poller. Returns fresh progress when the interval elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<Progress> {
        if self.playing && self.engine.is_finished() {
            tracing::debug!("Media ended");
            self.playing = false;
            self.poller.stop();
            self.progress = poller::sample(&self.engine);
            return self.progress;
        }

        let progress = self.poller.poll(now, &self.engine)?;
        self.progress = Some(progress);
        Some(progress)
    }

    /// Stop timers and, unless disabled, store the resume offset of the
    /// current item. Media played to the end resumes from the start.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        if !self.settings.save_on_exit {
            return;
        }
        if let Some(path) = self.current.clone() {
            let position = if self.engine.is_finished() {
                0
            } else {
                self.position_ms()
            };
            tracing::info!(path = %path.display(), position, "Saving resume position");
            self.remember(&path, position);
        }
    }

    fn remember(&mut self, path: &Path, resume_ms: u64) {
        // History stores UTF-8 text; a lossy name could never be reopened.
        let Some(path) = path.to_str() else {
            tracing::warn!(path = %path.display(), "Not recording non UTF-8 path in history");
            return;
        };
        if let Err(e) = self.history.record(path, resume_ms) {
            tracing::warn!("History not saved: {e}");
        }
    }

    fn position_ms(&self) -> u64 {
        u64::try_from(self.engine.position_ms()).unwrap_or(0)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.list()
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    pub fn volume_percent(&self) -> u8 {
        self.volume_percent
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Time until the poller next fires, for repaint scheduling.
    pub fn next_poll_in(&self, now: Instant) -> Option<Duration> {
        self.poller.remaining(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryFile;
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct FakeEngine {
        opened: Vec<PathBuf>,
        playing: bool,
        position: i64,
        duration: i64,
        volume: u8,
        finished: bool,
        reject: bool,
    }

    impl PlaybackEngine for FakeEngine {
        fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
            if self.reject {
                return Err(PlayerError::Decode(anyhow::anyhow!("no video stream")));
            }
            self.opened.push(path.to_path_buf());
            self.playing = true;
            self.position = 0;
            self.finished = false;
            Ok(())
        }
        fn resume(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
        }
        fn stop(&mut self) {
            self.playing = false;
            self.position = 0;
        }
        fn seek(&mut self, offset_ms: u64) {
            self.position = offset_ms as i64;
        }
        fn position_ms(&self) -> i64 {
            self.position
        }
        fn duration_ms(&self) -> i64 {
            self.duration
        }
        fn set_volume_percent(&mut self, percent: u8) {
            self.volume = percent;
        }
        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    struct Fixture {
        dir: TempDir,
        shell: PlayerShell<FakeEngine>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_settings(ShellSettings::default())
        }

        fn with_settings(settings: ShellSettings) -> Self {
            let dir = TempDir::new().unwrap();
            let history = HistoryTracker::load(HistoryFile::new(dir.path().join("history.json")));
            let engine = FakeEngine {
                duration: 60_000,
                ..Default::default()
            };
            Self {
                shell: PlayerShell::new(engine, history, settings),
                dir,
            }
        }

        fn media(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"").unwrap();
            path
        }

        fn reload_history(&self) -> Vec<HistoryEntry> {
            HistoryTracker::load(HistoryFile::new(self.dir.path().join("history.json")))
                .list()
                .to_vec()
        }
    }

    #[test]
    fn test_missing_file_is_not_played_or_recorded() {
        let mut fx = Fixture::new();
        let missing = fx.dir.path().join("gone.mp4");

        let result = fx.shell.play_file(&missing, 0, Instant::now());

        assert!(matches!(result, Err(PlayerError::NotFound(_))));
        assert!(fx.shell.engine().opened.is_empty());
        assert!(fx.shell.history().is_empty());
        assert!(!fx.shell.is_playing());
    }

    #[test]
    fn test_undecodable_file_is_not_recorded() {
        let mut fx = Fixture::new();
        let good = fx.media("good.mp4");
        let bad = fx.media("notes.txt");
        let now = Instant::now();
        fx.shell.play_file(&good, 0, now).unwrap();

        fx.shell.engine_mut().reject = true;
        let result = fx.shell.play_file(&bad, 0, now);

        assert!(matches!(result, Err(PlayerError::Decode(_))));
        assert_eq!(fx.shell.history().len(), 1);
        assert_eq!(fx.shell.current(), None);
        assert!(!fx.shell.is_playing());
    }

    #[test]
    fn test_play_file_seeks_and_records() {
        let mut fx = Fixture::new();
        let clip = fx.media("clip.mkv");

        fx.shell.play_file(&clip, 5000, Instant::now()).unwrap();

        assert_eq!(fx.shell.engine().opened, [clip.clone()]);
        assert_eq!(fx.shell.engine().position, 5000);
        assert!(fx.shell.is_playing());
        assert_eq!(fx.shell.current(), Some(clip.as_path()));
        assert_eq!(fx.reload_history()[0].resume_ms, 5000);
    }

    #[test]
    fn test_resume_from_history_uses_stored_offset() {
        let mut fx = Fixture::new();
        let a = fx.media("a.mp4");
        let b = fx.media("b.mp4");
        let now = Instant::now();
        fx.shell.play_file(&a, 2000, now).unwrap();
        fx.shell.play_file(&b, 0, now).unwrap();

        fx.shell.open_from_history(1, now).unwrap();

        assert_eq!(fx.shell.engine().opened.last(), Some(&a));
        assert_eq!(fx.shell.engine().position, 2000);
        assert_eq!(fx.shell.history()[0].path, a.to_string_lossy());
    }

    #[test]
    fn test_out_of_range_history_index_is_ignored() {
        let mut fx = Fixture::new();
        fx.shell.open_from_history(3, Instant::now()).unwrap();
        assert!(fx.shell.engine().opened.is_empty());
    }

    #[test]
    fn test_only_first_dropped_file_plays() {
        let mut fx = Fixture::new();
        let first = fx.media("first.avi");
        let second = fx.media("second.avi");

        fx.shell
            .open_dropped(vec![first.clone(), second], Instant::now())
            .unwrap();

        assert_eq!(fx.shell.engine().opened, [first]);
        assert_eq!(fx.shell.history().len(), 1);
    }

    #[test]
    fn test_toggle_and_stop() {
        let mut fx = Fixture::new();
        let now = Instant::now();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, now).unwrap();

        fx.shell.toggle_play_pause(now);
        assert!(!fx.shell.is_playing());
        assert!(!fx.shell.engine().playing);

        fx.shell.toggle_play_pause(now);
        assert!(fx.shell.is_playing());

        fx.shell.stop();
        assert!(!fx.shell.is_playing());
        assert_eq!(fx.shell.tick(now + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_play_without_media_does_nothing() {
        let mut fx = Fixture::new();
        fx.shell.play(Instant::now());
        assert!(!fx.shell.is_playing());
    }

    #[test]
    fn test_forward_and_rewind_bounds() {
        let mut fx = Fixture::new();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, Instant::now()).unwrap();

        fx.shell.rewind();
        assert_eq!(fx.shell.engine().position, 0);

        fx.shell.seek_to(55_000);
        fx.shell.forward();
        assert_eq!(fx.shell.engine().position, 60_000);

        fx.shell.rewind();
        assert_eq!(fx.shell.engine().position, 50_000);
    }

    #[test]
    fn test_tick_reports_progress_each_interval() {
        let mut fx = Fixture::new();
        let t0 = Instant::now();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, t0).unwrap();
        fx.shell.engine_mut().position = 1500;

        assert_eq!(fx.shell.tick(t0 + Duration::from_millis(500)), None);
        let progress = fx.shell.tick(t0 + Duration::from_secs(1)).unwrap();
        assert_eq!(progress.elapsed_ms, 1500);
        assert_eq!(progress.total_ms, 60_000);
        assert_eq!(fx.shell.progress(), Some(progress));
    }

    #[test]
    fn test_end_of_media_stops_polling() {
        let mut fx = Fixture::new();
        let t0 = Instant::now();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, t0).unwrap();
        fx.shell.engine_mut().position = 60_000;
        fx.shell.engine_mut().finished = true;

        fx.shell.tick(t0);
        assert!(!fx.shell.is_playing());
        assert_eq!(fx.shell.next_poll_in(t0), None);
    }

    #[test]
    fn test_shutdown_saves_resume_position() {
        let mut fx = Fixture::new();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, Instant::now()).unwrap();
        fx.shell.engine_mut().position = 42_000;

        fx.shell.shutdown();

        let stored = fx.reload_history();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].resume_ms, 42_000);
    }

    #[test]
    fn test_shutdown_after_end_resumes_from_start() {
        let mut fx = Fixture::new();
        let t0 = Instant::now();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 30_000, t0).unwrap();
        fx.shell.engine_mut().position = 60_000;
        fx.shell.engine_mut().finished = true;
        fx.shell.tick(t0);

        fx.shell.shutdown();

        assert_eq!(fx.reload_history()[0].resume_ms, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_plays_without_history() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut fx = Fixture::new();
        let odd = fx.dir.path().join(OsStr::from_bytes(b"clip-\xff.mp4"));
        std::fs::write(&odd, b"").unwrap();

        fx.shell.play_file(&odd, 0, Instant::now()).unwrap();
        fx.shell.shutdown();

        assert_eq!(fx.shell.engine().opened, [odd]);
        assert!(fx.shell.history().is_empty());
        assert!(fx.reload_history().is_empty());
    }

    #[test]
    fn test_shutdown_respects_policy() {
        let mut fx = Fixture::with_settings(ShellSettings {
            save_on_exit: false,
            ..ShellSettings::default()
        });
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, Instant::now()).unwrap();
        fx.shell.engine_mut().position = 42_000;

        fx.shell.shutdown();

        assert_eq!(fx.reload_history()[0].resume_ms, 0);
    }

    #[test]
    fn test_online_view_pauses_playback() {
        let mut fx = Fixture::new();
        let clip = fx.media("clip.mp4");
        fx.shell.play_file(&clip, 0, Instant::now()).unwrap();

        fx.shell.open_online();
        assert_eq!(fx.shell.view(), View::Online);
        assert!(!fx.shell.engine().playing);

        fx.shell.close_online();
        assert_eq!(fx.shell.view(), View::Video);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut fx = Fixture::new();
        assert_eq!(fx.shell.engine().volume, 100);
        fx.shell.set_volume_percent(250);
        assert_eq!(fx.shell.volume_percent(), 100);
        fx.shell.set_volume_percent(35);
        assert_eq!(fx.shell.engine().volume, 35);
    }
}
