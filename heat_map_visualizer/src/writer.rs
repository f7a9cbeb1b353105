use crate::annotate::DetectCountLabel;
use crate::error::{RenderError, RenderResult};
use crate::render::HeatMapRenderer;
use crate::settings::OutputSettings;
use heat_map::{GridConfig, HeatMapRecord};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const DETECT_DIR: &str = "detect";
const VIDEO_DIR: &str = "video";

/// A shared handle to the animation file that remembers the first write error.
///
/// The encoder writes its trailer when dropped and discards any error there;
/// keeping a second handle lets `finish` flush and report it.
struct VideoSink<W> {
    state: Arc<Mutex<SinkState<W>>>,
}

struct SinkState<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W> Clone for VideoSink<W> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<W: Write> VideoSink<W> {
    fn new(inner: W) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState { inner, error: None })),
        }
    }

    fn with_state<T>(&self, op: impl FnOnce(&mut SinkState<W>) -> io::Result<T>) -> io::Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("video sink lock poisoned"))?;
        let result = op(&mut *state);
        if let Err(err) = &result {
            if state.error.is_none() {
                state.error = Some(io::Error::new(err.kind(), err.to_string()));
            }
        }
        result
    }

    /// Flushes buffered bytes and returns the first error seen on any write.
    fn close(&self) -> io::Result<()> {
        self.with_state(|state| state.inner.flush())?;
        self.with_state(|state| match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }
}

impl<W: Write> Write for VideoSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_state(|state| state.inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_state(|state| state.inner.flush())
    }
}

/// Persists each record as JSON and appends its rendering to an animation.
pub struct HeatMapWriter {
    renderer: HeatMapRenderer,
    label: DetectCountLabel,
    detect_dir: PathBuf,
    video_path: PathBuf,
    sink: VideoSink<BufWriter<File>>,
    encoder: GifEncoder<VideoSink<BufWriter<File>>>,
    delay: Delay,
    frames_written: u64,
    untimed_frames: u64,
}

impl HeatMapWriter {
    /// Creates `detect/` and `video/` under the output directory and opens the
    /// animation file.
    pub fn create(
        settings: &OutputSettings,
        geometry: &GridConfig,
        image_name: Option<&str>,
    ) -> RenderResult<Self> {
        let renderer = HeatMapRenderer::new(settings, geometry)?;
        let label = DetectCountLabel::new()?;

        let detect_dir = settings.output_dir.join(DETECT_DIR);
        let video_dir = settings.output_dir.join(VIDEO_DIR);
        fs::create_dir_all(&detect_dir).map_err(|e| RenderError::io(&detect_dir, e))?;
        fs::create_dir_all(&video_dir).map_err(|e| RenderError::io(&video_dir, e))?;

        let video_name = match image_name {
            Some(name) if !name.is_empty() => format!("{name}_heatmap.gif"),
            _ => "heatmap.gif".to_string(),
        };
        let video_path = video_dir.join(video_name);
        let file = File::create(&video_path).map_err(|e| RenderError::io(&video_path, e))?;

        let sink = VideoSink::new(BufWriter::new(file));
        let mut encoder = GifEncoder::new(sink.clone());
        encoder.set_repeat(Repeat::Infinite)?;

        info!(
            video = %video_path.display(),
            detect = %detect_dir.display(),
            fps = settings.fps,
            "heat map writer ready"
        );

        Ok(Self {
            renderer,
            label,
            detect_dir,
            video_path,
            sink,
            encoder,
            delay: Delay::from_numer_denom_ms(1000, settings.fps),
            frames_written: 0,
            untimed_frames: 0,
        })
    }

    /// Writes the record's JSON file and one animation frame. Returns the JSON path.
    ///
    /// Records without a timestamp are numbered by their own counter, so
    /// timestamped frames leave no gaps in the numbering.
    pub fn write(
        &mut self,
        record: &HeatMapRecord,
        background: Option<&DynamicImage>,
    ) -> RenderResult<PathBuf> {
        let stem = match &record.timestamp {
            Some(ts) => file_stem(ts),
            None => {
                let stem = format!("{:08}", self.untimed_frames);
                self.untimed_frames += 1;
                stem
            }
        };
        let json_path = self.detect_dir.join(format!("{stem}.json"));
        let json = record.to_json_pretty()?;
        fs::write(&json_path, json).map_err(|e| RenderError::io(&json_path, e))?;

        let mut rendered = self.renderer.render(&record.griddata, background);
        self.label.draw(&mut rendered, record.number_of_detects);
        let rgba = DynamicImage::ImageRgb8(rendered).to_rgba8();
        self.encoder
            .encode_frame(Frame::from_parts(rgba, 0, 0, self.delay))?;

        self.frames_written += 1;
        debug!(frame = self.frames_written, json = %json_path.display(), "heat map written");
        Ok(json_path)
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Writes the animation trailer, flushes the file and returns its path.
    pub fn finish(self) -> RenderResult<PathBuf> {
        let Self {
            video_path,
            sink,
            encoder,
            frames_written,
            ..
        } = self;
        drop(encoder);
        sink.close().map_err(|e| RenderError::io(&video_path, e))?;

        info!(
            frames = frames_written,
            video = %video_path.display(),
            "heat map animation closed"
        );
        Ok(video_path)
    }
}

/// Timestamps become file names; path separators and colons are replaced.
fn file_stem(timestamp: &str) -> String {
    timestamp
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}
