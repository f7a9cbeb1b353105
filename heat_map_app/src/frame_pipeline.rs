// THEORY:
// The frame pipeline connects the detection source, the accumulator and the
// writer as three stages joined by bounded channels:
//
//   source (blocking file reads) -> accumulator (async) -> writer (blocking encode)
//
// Key architectural principles:
// 1.  **Single Accumulator**: The sliding window is inherently sequential, so
//     exactly one task owns the `HeatMapPipeline`. Parallelism comes from
//     overlapping I/O and encoding with accumulation, never from splitting
//     the window.
// 2.  **Order Preserved**: Each stage is a FIFO over a FIFO channel; the n-th
//     record written is the n-th frame read.
// 3.  **Backpressure**: Channels are bounded, so a slow writer throttles the
//     reader instead of buffering the whole input in memory.
// 4.  **First Failure Wins**: When a stage fails it drops its channel ends;
//     the neighbours observe the closed channel and wind down. The error is
//     then reported once the stages are joined.

use crate::app_config::AppConfig;
use crate::local_source::{LocalDataSource, SourceError};
use anyhow::{Context, Result, anyhow};
use heat_map::{HeatMapPipeline, HeatMapRecord};
use heat_map_visualizer::{HeatMapWriter, RenderError};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

const CHANNEL_CAPACITY: usize = 8;
const PROGRESS_INTERVAL: u64 = 100;

/// A processed frame on its way to the writer.
struct RenderJob {
    record: HeatMapRecord,
    background: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub rejected: u64,
    pub video_path: PathBuf,
}

pub async fn run(config: AppConfig) -> Result<RunSummary> {
    let source = LocalDataSource::open(&config.source)?;
    let total = source.len();
    let load_backgrounds = config.output.overlay;

    let pipeline = HeatMapPipeline::new(config.geometry.clone());
    let writer = HeatMapWriter::create(
        &config.output,
        pipeline.geometry(),
        config.source.image_name.as_deref(),
    )?;

    let (frame_tx, mut frame_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (job_tx, mut job_rx) = mpsc::channel::<RenderJob>(CHANNEL_CAPACITY);

    let reader = tokio::task::spawn_blocking(move || -> Result<(), SourceError> {
        for frame in source {
            let frame = frame?;
            if frame_tx.blocking_send(frame).is_err() {
                break;
            }
        }
        Ok(())
    });

    let accumulator = tokio::spawn(async move {
        let mut pipeline = pipeline;
        let mut rejected = 0u64;
        while let Some(frame) = frame_rx.recv().await {
            let record = pipeline.process(&frame.detections).with_timestamp(frame.timestamp);
            rejected += record.rejected as u64;

            let processed = pipeline.frames_processed();
            if processed % PROGRESS_INTERVAL == 0 {
                info!(processed, total, "accumulating detections");
            }

            let job = RenderJob {
                record,
                background: frame.background.filter(|_| load_backgrounds),
            };
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        rejected
    });

    let encoder = tokio::task::spawn_blocking(move || -> Result<(u64, PathBuf), RenderError> {
        let mut writer = writer;
        while let Some(job) = job_rx.blocking_recv() {
            let background = job.background.as_deref().and_then(|path| match image::open(path) {
                Ok(image) => Some(image),
                Err(err) => {
                    warn!(image = %path.display(), %err, "background frame unreadable; drawing heat only");
                    None
                }
            });
            writer.write(&job.record, background.as_ref())?;
        }
        let frames = writer.frames_written();
        Ok((frames, writer.finish()?))
    });

    let (read_result, accumulate_result, write_result) = tokio::join!(reader, accumulator, encoder);
    let (frames, video_path) = write_result
        .map_err(|e| anyhow!("writer task panicked: {e}"))?
        .context("failed to write heat map output")?;
    read_result
        .map_err(|e| anyhow!("source task panicked: {e}"))?
        .context("failed to read detections")?;
    let rejected = accumulate_result.map_err(|e| anyhow!("accumulator task panicked: {e}"))?;

    info!(frames, rejected, video = %video_path.display(), "heat map run complete");
    Ok(RunSummary {
        frames,
        rejected,
        video_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::LocalDataSettings;
    use heat_map::{GridConfig, HeatMapParams};
    use heat_map_visualizer::{Colormap, OutputSettings};
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::Path;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("heat_map_run_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config(root: &Path, overlay: bool) -> AppConfig {
        let geometry = GridConfig::new(HeatMapParams {
            image_size_h: 40,
            image_size_v: 40,
            grid_num_h: 4,
            grid_num_v: 4,
            window_size: 2,
            spread_radius: 0,
            point_mode: false,
            point_ratio: 1.0,
        })
        .unwrap();
        AppConfig {
            source: LocalDataSettings {
                meta_dir: root.join("meta"),
                image_dir: Some(root.join("images")),
                image_name: Some("cam".to_string()),
            },
            geometry,
            output: OutputSettings {
                output_dir: root.join("out"),
                fps: 5,
                width: 40,
                height: 40,
                cmap: Colormap::Jet,
                colorbar: true,
                min: 0.0,
                max: 0.0,
                overlay,
                transparency: 0.5,
            },
        }
    }

    fn write_meta(root: &Path, name: &str, body: &str) {
        let meta = root.join("meta");
        fs::create_dir_all(&meta).unwrap();
        fs::write(meta.join(format!("{name}.json")), body).unwrap();
    }

    #[tokio::test]
    async fn runs_end_to_end() {
        let root = temp_dir("e2e");
        write_meta(&root, "f0", r#"{"detections": [{"bbox": {"left": 0, "top": 0, "right": 10, "bottom": 10}}]}"#);
        write_meta(
            &root,
            "f1",
            r#"{"timestamp": "late", "detections": [
                {"bbox": {"left": 0, "top": 0, "right": 10, "bottom": 10}},
                {"bbox": {"left": 30, "top": 0, "right": 10, "bottom": 10}}
            ]}"#,
        );
        write_meta(&root, "f2", r#"{"detections": []}"#);
        fs::create_dir_all(root.join("images")).unwrap();
        RgbImage::from_pixel(40, 40, Rgb([90, 90, 90]))
            .save(root.join("images").join("f0.png"))
            .unwrap();

        let summary = run(config(&root, true)).await.unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.video_path, root.join("out").join("video").join("cam_heatmap.gif"));
        assert!(summary.video_path.is_file());

        let detect = root.join("out").join("detect");
        let second: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(detect.join("late.json")).unwrap()).unwrap();
        assert_eq!(second["number_of_detects"], 1);
        assert_eq!(second["rejected"], 1);
        assert_eq!(second["griddata"][0][0], 2);

        let third: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(detect.join("00000001.json")).unwrap()).unwrap();
        assert_eq!(third["griddata"][0][0], 1);
        assert!(detect.join("00000000.json").is_file());
        assert!(!detect.join("00000002.json").exists());
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn malformed_input_fails_the_run() {
        let root = temp_dir("malformed");
        write_meta(&root, "f0", r#"{"detections": []}"#);
        write_meta(&root, "f1", "garbage");

        let err = run(config(&root, false)).await.unwrap_err();
        assert!(format!("{err:#}").contains("f1.json"));
        let _ = fs::remove_dir_all(&root);
    }
}
