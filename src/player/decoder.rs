use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as ResamplerContext;
use ffmpeg_next::software::scaling::{Context as ScalerContext, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};
use ffmpeg_next::{codec, Packet, Rational};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::clock::AudioClock;
use super::ring::SampleRing;

/// Interleaved channels handed to the audio output. Every source layout is
/// resampled to stereo.
pub const OUTPUT_CHANNELS: u16 = 2;
/// Output rate when the file has no audio stream.
const SILENT_RATE: u32 = 44_100;
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// RGBA frame ready for upload.
pub struct DecodedVideoFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts_ms: i64,
}

/// Requests from the UI thread to the decoder thread.
pub enum DecoderCommand {
    Seek(u64),
    Pause,
    Resume,
    Stop,
}

/// Stream properties read before decoding starts.
#[derive(Debug, Clone, Copy)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub duration_ms: i64,
    /// Rate of the samples fed to the audio output.
    pub sample_rate: u32,
    /// Interleaved channels fed to the audio output, not the source layout.
    pub channels: u16,
    pub has_audio: bool,
}

pub fn probe_media(path: &Path) -> Result<MediaInfo> {
    let input = ffmpeg_next::format::input(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let video_stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("no video stream"))?;
    let video = codec::Context::from_parameters(video_stream.parameters())?
        .decoder()
        .video()?;

    let source_rate = match input.streams().best(Type::Audio) {
        Some(stream) => {
            let audio = codec::Context::from_parameters(stream.parameters())?
                .decoder()
                .audio()?;
            tracing::debug!(
                rate = audio.rate(),
                channels = audio.channels(),
                "Audio stream resampled to stereo"
            );
            Some(audio.rate())
        }
        None => None,
    };
    let (sample_rate, channels) = output_format(source_rate);

    let duration_ms = if input.duration() > 0 {
        input.duration() * 1000 / i64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        0
    };

    Ok(MediaInfo {
        width: video.width(),
        height: video.height(),
        duration_ms,
        sample_rate,
        channels,
        has_audio: source_rate.is_some(),
    })
}

/// Rate and channel count of the samples the decoder produces. The rate
/// follows the source; the layout is always [`OUTPUT_CHANNELS`].
fn output_format(source_rate: Option<u32>) -> (u32, u16) {
    (source_rate.unwrap_or(SILENT_RATE), OUTPUT_CHANNELS)
}

/// Shared endpoints handed to the decoder thread.
pub struct DecoderPipes {
    pub video: Sender<DecodedVideoFrame>,
    pub audio: Arc<SampleRing<f32>>,
    pub commands: Receiver<DecoderCommand>,
    pub clock: AudioClock,
    pub stop: Arc<AtomicBool>,
}

pub fn start_decoder_thread(path: &Path, pipes: DecoderPipes) -> Result<JoinHandle<()>> {
    let path = path.to_path_buf();
    let handle = thread::Builder::new()
        .name("decoder".into())
        .spawn(move || {
            if let Err(e) = decode_loop(&path, pipes) {
                tracing::error!(path = %path.display(), "Decoder stopped: {e:#}");
            }
        })?;
    Ok(handle)
}

/// Outcome of draining the command channel.
enum Flow {
    Continue,
    Exit,
    /// A seek arrived; the frame being delivered is stale.
    Restart,
}

struct Transport {
    paused: bool,
    pending_seek: Option<u64>,
}

impl Transport {
    fn drain(&mut self, commands: &Receiver<DecoderCommand>, clock: &AudioClock) -> Flow {
        let mut flow = Flow::Continue;
        loop {
            match commands.try_recv() {
                Ok(DecoderCommand::Stop) | Err(TryRecvError::Disconnected) => return Flow::Exit,
                Ok(DecoderCommand::Pause) => {
                    self.paused = true;
                    clock.pause();
                }
                Ok(DecoderCommand::Resume) => {
                    self.paused = false;
                    clock.resume();
                }
                Ok(DecoderCommand::Seek(ms)) => {
                    self.pending_seek = Some(ms);
                    flow = Flow::Restart;
                }
                Err(TryRecvError::Empty) => return flow,
            }
        }
    }
}

fn decode_loop(path: &Path, pipes: DecoderPipes) -> Result<()> {
    let DecoderPipes {
        video: video_sender,
        audio: audio_ring,
        commands,
        clock,
        stop,
    } = pipes;

    let mut input = ffmpeg_next::format::input(path)?;

    let video_index = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("no video stream"))?
        .index();
    let audio_index = input.streams().best(Type::Audio).map(|s| s.index());

    let video_stream = input
        .stream(video_index)
        .ok_or_else(|| anyhow!("video stream {video_index} vanished"))?;
    let video_time_base = video_stream.time_base();
    let mut video_decoder = codec::Context::from_parameters(video_stream.parameters())?
        .decoder()
        .video()?;

    let mut audio_decoder = match audio_index.and_then(|idx| input.stream(idx)) {
        Some(stream) => Some(
            codec::Context::from_parameters(stream.parameters())?
                .decoder()
                .audio()?,
        ),
        None => None,
    };

    let mut scaler = ScalerContext::get(
        video_decoder.format(),
        video_decoder.width(),
        video_decoder.height(),
        Pixel::RGBA,
        video_decoder.width(),
        video_decoder.height(),
        Flags::BILINEAR,
    )?;

    let mut resampler = match audio_decoder.as_ref() {
        Some(decoder) => Some(ResamplerContext::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(SampleType::Packed),
            ChannelLayout::STEREO,
            clock.sample_rate(),
        )?),
        None => None,
    };

    let mut video_frame = VideoFrame::empty();
    let mut audio_frame = AudioFrame::empty();
    let mut rgba_frame = VideoFrame::empty();

    let mut transport = Transport {
        paused: true,
        pending_seek: None,
    };
    let mut at_eof = false;

    while !stop.load(Ordering::Relaxed) {
        if let Flow::Exit = transport.drain(&commands, &clock) {
            return Ok(());
        }

        if let Some(target_ms) = transport.pending_seek.take() {
            let ts = target_ms as i64 * i64::from(ffmpeg_next::ffi::AV_TIME_BASE) / 1000;
            match input.seek(ts, ..ts) {
                Ok(()) => {
                    video_decoder.flush();
                    if let Some(dec) = audio_decoder.as_mut() {
                        dec.flush();
                    }
                    clock.set_position_ms(target_ms);
                    at_eof = false;
                }
                Err(e) => tracing::warn!(target_ms, "Seek failed: {e}"),
            }
        }

        // Nothing to read until resumed or sought away from the end.
        if transport.paused || at_eof {
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        let mut packet = Packet::empty();
        match packet.read(&mut input) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => {
                tracing::debug!("Reached end of input");
                at_eof = true;
                continue;
            }
            // Corrupt packets are skipped.
            Err(_) => continue,
        }

        if packet.stream() == video_index {
            video_decoder.send_packet(&packet)?;

            'frames: while video_decoder.receive_frame(&mut video_frame).is_ok() {
                scaler.run(&video_frame, &mut rgba_frame)?;
                let mut frame = DecodedVideoFrame {
                    rgba: rgba_frame.data(0).to_vec(),
                    width: rgba_frame.width(),
                    height: rgba_frame.height(),
                    pts_ms: pts_to_ms(video_frame.pts().unwrap_or(0), video_time_base),
                };

                // Seek and stop requests take priority over a full queue.
                loop {
                    match transport.drain(&commands, &clock) {
                        Flow::Exit => return Ok(()),
                        Flow::Restart => break 'frames,
                        Flow::Continue => {}
                    }
                    match video_sender.try_send(frame) {
                        Ok(()) => break,
                        Err(TrySendError::Full(f)) => {
                            frame = f;
                            thread::sleep(Duration::from_millis(1));
                        }
                        Err(TrySendError::Disconnected(_)) => return Ok(()),
                    }
                }
            }
        } else if Some(packet.stream()) == audio_index {
            if let (Some(decoder), Some(resampler)) = (audio_decoder.as_mut(), resampler.as_mut()) {
                decoder.send_packet(&packet)?;
                while decoder.receive_frame(&mut audio_frame).is_ok() {
                    let mut resampled = AudioFrame::empty();
                    if resampler.run(&audio_frame, &mut resampled).is_err() {
                        continue;
                    }
                    // Packed f32 stereo; trailing padding is ignored.
                    let bytes = resampled.data(0);
                    let count = resampled.samples() * resampled.channels() as usize;
                    let samples: Vec<f32> = bytes
                        .chunks_exact(4)
                        .take(count)
                        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                        .collect();
                    audio_ring.push_slice(&samples);
                }
            }
        }
    }

    Ok(())
}

fn pts_to_ms(pts: i64, time_base: Rational) -> i64 {
    if time_base.denominator() == 0 {
        return 0;
    }
    pts * 1000 * i64::from(time_base.numerator()) / i64::from(time_base.denominator())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::player::audio::ClockedSource;
    use crate::player::clock::AudioClock;
    use crate::player::ring::SampleRing;

    #[test]
    fn test_output_is_stereo_whatever_the_source() {
        assert_eq!(output_format(Some(32_000)), (32_000, OUTPUT_CHANNELS));
        assert_eq!(output_format(None), (SILENT_RATE, OUTPUT_CHANNELS));
    }

    #[test]
    fn test_mono_source_clock_runs_at_real_time() {
        // One second of a mono 32 kHz file after resampling to stereo.
        let (rate, channels) = output_format(Some(32_000));
        let clock = AudioClock::new(rate, channels);
        clock.resume();
        let ring = SampleRing::new(64_000);
        ring.push_slice(&vec![0.1; 64_000]);
        let mut source = ClockedSource::new(ring, clock.clone(), true);

        for _ in 0..64_000 {
            source.next();
        }
        assert_eq!(clock.position_ms(), 1000);
    }

    #[test]
    fn test_pts_conversion() {
        assert_eq!(pts_to_ms(90_000, Rational::new(1, 90_000)), 1000);
        assert_eq!(pts_to_ms(48, Rational::new(1, 24)), 2000);
        assert_eq!(pts_to_ms(5, Rational::new(1, 0)), 0);
    }
}
