//! FFmpeg decoding with rodio audio output, exposed as a [`PlaybackEngine`].
//!
//! Each opened file gets a [`MediaSession`] with its own decoder thread. The
//! audio clock is the master; video frames are released against it and
//! uploaded into an egui texture from [`FfmpegEngine::update`].

mod audio;
mod clock;
mod decoder;
mod ring;
mod video;

use crossbeam_channel::{bounded, Sender};
use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::PlaybackEngine;
use crate::error::PlayerError;
use audio::ClockedSource;
use clock::AudioClock;
use decoder::{probe_media, start_decoder_thread, DecodedVideoFrame, DecoderCommand, DecoderPipes};
use ring::SampleRing;
use video::VideoFrameQueue;

pub use decoder::MediaInfo;

const FRAME_QUEUE_LEN: usize = 30;
/// Margin before the reported duration at which playback counts as finished.
const END_MARGIN_MS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Playing,
    Paused,
    Finished,
}

/// One open media file and its decoder thread.
struct MediaSession {
    info: MediaInfo,
    state: SessionState,
    seek_target: Option<u64>,

    decoder: Option<JoinHandle<()>>,
    commands: Sender<DecoderCommand>,
    stop_flag: Arc<AtomicBool>,

    sink: Sink,
    clock: AudioClock,
    frames: VideoFrameQueue,
    texture: TextureHandle,
}

impl MediaSession {
    fn open(path: &Path, ctx: &Context, output: &OutputStreamHandle) -> Result<Self, PlayerError> {
        let info = probe_media(path)?;
        tracing::debug!(?info, "Probed media");

        let clock = AudioClock::new(info.sample_rate, info.channels);

        let sink = Sink::try_new(output).map_err(|e| PlayerError::EngineUnavailable {
            component: "audio output",
            reason: e.to_string(),
        })?;
        // About one second of interleaved samples.
        let ring = SampleRing::new(info.sample_rate as usize * info.channels as usize * 2);
        sink.append(ClockedSource::new(ring.clone(), clock.clone(), info.has_audio));
        sink.pause();

        let (video_tx, video_rx) = bounded(FRAME_QUEUE_LEN);
        let (commands, command_rx) = bounded(16);
        let stop_flag = Arc::new(AtomicBool::new(false));

        let decoder = start_decoder_thread(
            path,
            DecoderPipes {
                video: video_tx,
                audio: ring,
                commands: command_rx,
                clock: clock.clone(),
                stop: stop_flag.clone(),
            },
        )?;

        let texture = ctx.load_texture(
            "video_frame",
            ColorImage::new(
                [info.width as usize, info.height as usize],
                egui::Color32::BLACK,
            ),
            TextureOptions::LINEAR,
        );

        let mut session = Self {
            info,
            state: SessionState::Stopped,
            seek_target: None,
            decoder: Some(decoder),
            commands,
            stop_flag,
            sink,
            clock,
            frames: VideoFrameQueue::new(video_rx, FRAME_QUEUE_LEN),
            texture,
        };

        // Let the decoder run until the first frame lands, so something shows.
        session.send(DecoderCommand::Resume);
        session.seek(0);
        Ok(session)
    }

    fn send(&self, command: DecoderCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Decoder thread already gone");
        }
    }

    fn play(&mut self) {
        if self.state == SessionState::Finished {
            self.seek(0);
        }
        if self.state != SessionState::Playing {
            self.state = SessionState::Playing;
            self.sink.play();
            self.send(DecoderCommand::Resume);
        }
    }

    fn pause(&mut self) {
        if self.state == SessionState::Playing {
            self.state = SessionState::Paused;
            self.sink.pause();
            self.send(DecoderCommand::Pause);
        }
    }

    fn stop(&mut self) {
        self.state = SessionState::Stopped;
        self.sink.pause();
        self.send(DecoderCommand::Pause);
        self.seek(0);
    }

    fn seek(&mut self, ms: u64) {
        let ms = match u64::try_from(self.info.duration_ms) {
            Ok(duration) if duration > 0 => ms.min(duration),
            _ => ms,
        };
        self.seek_target = Some(ms);
        // Audio stays paused until the first frame after the seek arrives.
        self.sink.pause();
        self.frames.clear();
        self.clock.set_position_ms(ms);
        if self.state == SessionState::Finished {
            self.state = SessionState::Paused;
        }
        self.send(DecoderCommand::Seek(ms));
    }

    fn position_ms(&self) -> i64 {
        let ms = self.seek_target.unwrap_or_else(|| self.clock.position_ms());
        i64::try_from(ms).unwrap_or(i64::MAX)
    }

    fn show(texture: &mut TextureHandle, frame: &DecodedVideoFrame) {
        let image = ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.rgba,
        );
        texture.set(image, TextureOptions::LINEAR);
    }

    fn update(&mut self, ctx: &Context) {
        if let Some(target) = self.seek_target {
            if let Some(frame) = self.frames.first_after_seek(target as i64) {
                Self::show(&mut self.texture, frame);
                self.clock.set_position_ms(frame.pts_ms.max(0) as u64);
                self.seek_target = None;
                if self.state == SessionState::Playing {
                    self.sink.play();
                }
            }
            // A paused decoder may never deliver; poll slowly until it does.
            if self.state == SessionState::Playing {
                ctx.request_repaint();
            } else {
                ctx.request_repaint_after(std::time::Duration::from_millis(50));
            }
            return;
        }

        if self.state != SessionState::Playing {
            return;
        }

        let now = self.clock.position_ms() as i64;
        if let Some(frame) = self.frames.frame_at(now) {
            Self::show(&mut self.texture, frame);
        }

        if reached_end(now, self.info.duration_ms, self.frames.is_drained()) {
            tracing::info!("Playback finished");
            self.state = SessionState::Finished;
            self.sink.pause();
            self.send(DecoderCommand::Pause);
        }

        ctx.request_repaint();
    }
}

/// End of media: every frame shown and the clock within [`END_MARGIN_MS`] of
/// a known duration. An unknown duration never ends by position.
fn reached_end(position_ms: i64, duration_ms: i64, drained: bool) -> bool {
    duration_ms > 0 && drained && position_ms >= duration_ms - END_MARGIN_MS
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        self.send(DecoderCommand::Stop);
        if let Some(handle) = self.decoder.take() {
            if handle.join().is_err() {
                tracing::warn!("Decoder thread panicked");
            }
        }
    }
}

/// The application's playback engine.
pub struct FfmpegEngine {
    ctx: Context,
    // Keeps the audio device open.
    _output: OutputStream,
    output: OutputStreamHandle,
    session: Option<MediaSession>,
    volume: f32,
}

impl FfmpegEngine {
    /// Initialise FFmpeg and open the default audio device.
    pub fn new(ctx: Context) -> Result<Self, PlayerError> {
        ffmpeg_next::init().map_err(|e| PlayerError::EngineUnavailable {
            component: "FFmpeg",
            reason: e.to_string(),
        })?;
        let (stream, output) =
            OutputStream::try_default().map_err(|e| PlayerError::EngineUnavailable {
                component: "audio output",
                reason: e.to_string(),
            })?;
        Ok(Self {
            ctx,
            _output: stream,
            output,
            session: None,
            volume: 1.0,
        })
    }

    /// Advance the current session; call once per UI frame.
    pub fn update(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.update(&self.ctx);
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.session.as_ref().map(|s| &s.texture)
    }

    /// Native frame size of the open media.
    pub fn video_size(&self) -> Option<(u32, u32)> {
        self.session.as_ref().map(|s| (s.info.width, s.info.height))
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Stopped, |s| s.state)
    }
}

impl PlaybackEngine for FfmpegEngine {
    fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
        // Join the old decoder before starting the next one.
        self.session = None;
        let mut session = MediaSession::open(path, &self.ctx, &self.output)?;
        session.sink.set_volume(self.volume);
        session.play();
        tracing::info!(path = %path.display(), duration_ms = session.info.duration_ms, "Playing");
        self.session = Some(session);
        Ok(())
    }

    fn resume(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.play();
        }
    }

    fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
    }

    fn seek(&mut self, offset_ms: u64) {
        if let Some(session) = self.session.as_mut() {
            session.seek(offset_ms);
        }
    }

    fn position_ms(&self) -> i64 {
        self.session.as_ref().map_or(0, MediaSession::position_ms)
    }

    fn duration_ms(&self) -> i64 {
        self.session.as_ref().map_or(0, |s| s.info.duration_ms)
    }

    fn set_volume_percent(&mut self, percent: u8) {
        self.volume = f32::from(percent.min(100)) / 100.0;
        if let Some(session) = self.session.as_ref() {
            session.sink.set_volume(self.volume);
        }
    }

    fn is_finished(&self) -> bool {
        self.state() == SessionState::Finished
    }
}
