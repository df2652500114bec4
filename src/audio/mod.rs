use anyhow::{Context, Result};
use rodio::Source;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Playback backend driven by the queue. Time readings are milliseconds and
/// negative when unknown.
pub trait AudioEngine {
    fn load_and_play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn elapsed_ms(&self) -> i64;
    fn length_ms(&self) -> i64;
    fn has_ended(&self) -> bool;
    fn output_name(&self) -> String;
}

pub struct RodioAudioEngine {
    stream: OutputStream,
    sink: Sink,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
}

impl RodioAudioEngine {
    pub fn new() -> Result<Self> {
        let mut stream = quiet(|| {
            open_default_stream().or_else(|default_err| {
                open_fallback_stream().with_context(|| {
                    format!("no audio output could be started after the default failed: {default_err:#}")
                })
            })
        })?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        info!("audio output stream opened");
        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
        })
    }
}

fn open_default_stream() -> Result<OutputStream> {
    OutputStreamBuilder::from_default_device()
        .context("failed to open default system output stream")?
        .with_error_callback(|_| {})
        .open_stream_or_fallback()
        .context("failed to start default output stream")
}

/// Sort key for output devices: sound servers first, then anything called
/// default, then the rest by name.
fn device_rank(name: &str) -> (usize, String) {
    let lower = name.to_ascii_lowercase();
    let rank = ["pulse", "pipewire", "default"]
        .iter()
        .position(|hint| lower.contains(hint))
        .unwrap_or(3);
    (rank, lower)
}

fn open_fallback_stream() -> Option<OutputStream> {
    let host = rodio::cpal::default_host();
    let mut devices: Vec<_> = host
        .output_devices()
        .ok()?
        .filter_map(|device| {
            let name = device.name().ok()?;
            Some((device_rank(&name), name, device))
        })
        .collect();
    devices.sort_by(|a, b| a.0.cmp(&b.0));
    devices.dedup_by(|a, b| a.1 == b.1);

    devices.into_iter().find_map(|(_, name, device)| {
        let stream = OutputStreamBuilder::from_device(device)
            .ok()?
            .with_error_callback(|_| {})
            .open_stream_or_fallback()
            .ok()?;
        debug!(device = %name, "using fallback output device");
        Some(stream)
    })
}

impl AudioEngine for RodioAudioEngine {
    fn load_and_play(&mut self, path: &Path) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.current = None;
        self.track_duration = None;

        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.track_duration = source.total_duration();
        self.sink.append(source);
        self.current = Some(path.to_path_buf());
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.current = None;
        self.track_duration = None;
    }

    fn is_playing(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && !self.sink.empty()
    }

    fn elapsed_ms(&self) -> i64 {
        if self.current.is_none() {
            return -1;
        }
        millis(self.sink.get_pos())
    }

    fn length_ms(&self) -> i64 {
        self.track_duration.map_or(-1, millis)
    }

    fn has_ended(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }

    fn output_name(&self) -> String {
        String::from("System default output (CPAL)")
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Redirects fd 2 to /dev/null until dropped; device probing prints there.
#[cfg(unix)]
struct SilencedStderr {
    saved: libc::c_int,
}

#[cfg(unix)]
impl SilencedStderr {
    fn new() -> Option<Self> {
        let devnull = CString::new("/dev/null").ok()?;
        let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
        if saved < 0 {
            return None;
        }
        unsafe {
            let sink = libc::open(devnull.as_ptr(), libc::O_WRONLY);
            if sink >= 0 {
                libc::dup2(sink, libc::STDERR_FILENO);
                libc::close(sink);
            }
        }
        Some(Self { saved })
    }
}

#[cfg(unix)]
impl Drop for SilencedStderr {
    fn drop(&mut self) {
        unsafe {
            libc::dup2(self.saved, libc::STDERR_FILENO);
            libc::close(self.saved);
        }
    }
}

fn quiet<T>(operation: impl FnOnce() -> T) -> T {
    #[cfg(unix)]
    let _silenced = SilencedStderr::new();
    operation()
}

/// Silent engine driven by the wall clock. Used when no output device can be
/// opened, so browsing and queueing still work.
#[derive(Debug, Default)]
pub struct NullAudioEngine {
    loaded: Option<ClockTrack>,
}

#[derive(Debug)]
struct ClockTrack {
    length: Option<Duration>,
    /// Time accumulated before the current run.
    banked: Duration,
    /// `None` while paused.
    running_since: Option<Instant>,
}

impl ClockTrack {
    fn position(&self) -> Duration {
        let running = self
            .running_since
            .map_or(Duration::ZERO, |since| since.elapsed());
        let position = self.banked.saturating_add(running);
        self.length.map_or(position, |length| position.min(length))
    }

    fn finished(&self) -> bool {
        self.running_since.is_some() && self.length.is_some_and(|length| self.position() >= length)
    }
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Length as reported by the decoder; unknown for missing or unreadable files.
fn probe_length(path: &Path) -> Option<Duration> {
    let source = Decoder::try_from(File::open(path).ok()?).ok()?;
    source.total_duration().filter(|length| !length.is_zero())
}

impl AudioEngine for NullAudioEngine {
    fn load_and_play(&mut self, path: &Path) -> Result<()> {
        let length = probe_length(path);
        debug!(path = %path.display(), ?length, "null engine clock started");
        self.loaded = Some(ClockTrack {
            length,
            banked: Duration::ZERO,
            running_since: Some(Instant::now()),
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(track) = self.loaded.as_mut() {
            track.banked = track.position();
            track.running_since = None;
        }
    }

    fn resume(&mut self) {
        if let Some(track) = self.loaded.as_mut()
            && track.running_since.is_none()
        {
            track.running_since = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        self.loaded = None;
    }

    fn is_playing(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|track| track.running_since.is_some() && !track.finished())
    }

    fn elapsed_ms(&self) -> i64 {
        self.loaded
            .as_ref()
            .map_or(-1, |track| millis(track.position()))
    }

    fn length_ms(&self) -> i64 {
        self.loaded
            .as_ref()
            .and_then(|track| track.length)
            .map_or(-1, millis)
    }

    fn has_ended(&self) -> bool {
        self.loaded.as_ref().is_some_and(ClockTrack::finished)
    }

    fn output_name(&self) -> String {
        String::from("Null audio engine")
    }
}
