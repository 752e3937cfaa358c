use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{
    Container, EncoderConfig, FrameTimeline, VideoArtifact, VideoEncoder,
};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::Surface;

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// Encoder that spawns the system `ffmpeg`, streams raw frames to its stdin and collects the
/// muxed container from its stdout.
#[derive(Default)]
pub struct FfmpegEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,

    /// Last flattened frame, repeated for skipped output slots.
    scratch: Vec<u8>,
    cfg: Option<EncoderConfig>,
    timeline: Option<FrameTimeline>,
    last_elapsed_ms: Option<u64>,
}

impl FfmpegEncoder {
    /// An idle encoder; `ffmpeg` is spawned on `begin`.
    pub fn new() -> Self {
        Self::default()
    }

    fn reap(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        for drain in [self.stdout_drain.take(), self.stderr_drain.take()]
            .into_iter()
            .flatten()
        {
            let _ = drain.join();
        }
        self.cfg = None;
        self.timeline = None;
    }

    fn write_scratch(&mut self, copies: u64) -> ReelResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encode("ffmpeg encoder is already finalized"));
        };
        for _ in 0..copies {
            stdin.write_all(&self.scratch).map_err(|e| {
                ReelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
            })?;
        }
        Ok(())
    }
}

impl VideoEncoder for FfmpegEncoder {
    #[tracing::instrument(skip(self), fields(w = cfg.canvas.width, h = cfg.canvas.height))]
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        if self.cfg.is_some() {
            return Err(ReelError::encode("ffmpeg encoder already started"));
        }
        let (w, h) = (cfg.canvas.width, cfg.canvas.height);
        if w == 0 || h == 0 {
            return Err(ReelError::validation(
                "ffmpeg encoder width/height must be non-zero",
            ));
        }
        if !w.is_multiple_of(2) || !h.is_multiple_of(2) {
            return Err(ReelError::validation(
                "ffmpeg encoder width/height must be even (required for yuv420p output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: opaque RGBA8; premultiplied pixels are flattened in push_frame.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{w}x{h}"),
            "-r",
            &cfg.fps.get().to_string(),
            "-i",
            "pipe:0",
            "-an",
        ]);
        push_output_codec(&mut cmd, cfg.container);
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        self.scratch = vec![0u8; cfg.canvas.byte_len()];
        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.cfg = Some(*cfg);
        self.timeline = Some(FrameTimeline::new(cfg));
        self.last_elapsed_ms = None;
        tracing::debug!(container = ?cfg.container, fps = cfg.fps.get(), "ffmpeg started");
        Ok(())
    }

    fn push_frame(&mut self, elapsed_ms: u64, surface: &Surface) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;
        if let Some(last) = self.last_elapsed_ms
            && elapsed_ms <= last
        {
            return Err(ReelError::encode(
                "ffmpeg encoder received out-of-order timestamp",
            ));
        }
        if surface.canvas() != cfg.canvas {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                cfg.canvas.width,
                cfg.canvas.height
            )));
        }
        let bg_rgba = cfg.bg_rgba;
        self.last_elapsed_ms = Some(elapsed_ms);

        let fill = self
            .timeline
            .as_mut()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?
            .place(elapsed_ms);
        self.write_scratch(fill.repeat_previous)?;
        if fill.incoming == 0 {
            return Ok(());
        }
        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, surface.data(), bg_rgba)?;
        self.write_scratch(fill.incoming)
    }

    fn finish(&mut self) -> ReelResult<VideoArtifact> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;
        let mut timeline = self
            .timeline
            .take()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;
        let pad = timeline.pad();
        if let Err(err) = self.write_scratch(pad) {
            self.reap();
            return Err(err);
        }
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;

        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let bytes = join_drain(self.stdout_drain.take(), "stdout")?;
        let stderr_bytes = join_drain(self.stderr_drain.take(), "stderr")?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        if bytes.is_empty() {
            return Err(ReelError::encode("ffmpeg produced no output"));
        }

        let frames = timeline.written();
        tracing::debug!(bytes = bytes.len(), frames, padded = pad, "ffmpeg finished");
        Ok(VideoArtifact {
            bytes,
            media_type: cfg.container.media_type().to_string(),
            frame_count: frames,
        })
    }

    fn abort(&mut self) {
        if let Some(timeline) = &self.timeline {
            tracing::debug!(frames = timeline.written(), "ffmpeg aborted");
        }
        self.reap();
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.reap();
    }
}

fn push_output_codec(cmd: &mut Command, container: Container) {
    match container {
        Container::Webm => {
            cmd.args([
                "-c:v",
                "libvpx-vp9",
                "-pix_fmt",
                "yuv420p",
                "-b:v",
                "0",
                "-crf",
                "32",
                "-deadline",
                "realtime",
                "-f",
                "webm",
            ]);
        }
        Container::Mp4 => {
            // stdout is not seekable; fragment so the moov atom can lead.
            cmd.args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "frag_keyframe+empty_moov",
                "-f",
                "mp4",
            ]);
        }
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> Drain {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(handle: Option<Drain>, what: &str) -> ReelResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| ReelError::encode(format!("ffmpeg {what} drain thread panicked")))?
            .map_err(|e| ReelError::encode(format!("ffmpeg {what} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
