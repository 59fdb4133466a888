use std::path::Path;

use crate::error::PlayerError;

/// Media playback backend driven by the shell.
///
/// Times are milliseconds. Position and duration are signed so a backend can
/// report "not known yet" as zero or a negative value.
pub trait PlaybackEngine {
    /// Open `path` and start playing it from the beginning.
    fn play(&mut self, path: &Path) -> Result<(), PlayerError>;

    /// Continue the current media after a pause.
    fn resume(&mut self);

    fn pause(&mut self);

    /// Halt playback and rewind to the start.
    fn stop(&mut self);

    fn seek(&mut self, offset_ms: u64);

    fn position_ms(&self) -> i64;

    fn duration_ms(&self) -> i64;

    /// Output volume, 0 to 100.
    fn set_volume_percent(&mut self, percent: u8);

    /// Whether the current media played through to its end.
    fn is_finished(&self) -> bool;
}
