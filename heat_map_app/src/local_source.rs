use crate::app_config::LocalDataSettings;
use heat_map::BBox;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to list detection directory {path}")]
    ListDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read detection file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("detection file {path} is malformed")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Deserialize)]
struct RawBox {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl From<RawBox> for BBox {
    fn from(raw: RawBox) -> Self {
        BBox::new(raw.left as i32, raw.top as i32, raw.right as i32, raw.bottom as i32)
    }
}

/// Class and score fields, when present, are ignored.
#[derive(Debug, Deserialize)]
struct RawDetection {
    bbox: RawBox,
}

#[derive(Debug, Deserialize)]
struct MetaFile {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    detections: Vec<RawDetection>,
}

/// One frame's worth of input for the accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFrame {
    pub name: String,
    pub detections: Vec<BBox>,
    pub background: Option<PathBuf>,
    pub timestamp: Option<String>,
}

/// Walks a directory of per-frame detection files in file-name order.
#[derive(Debug)]
pub struct LocalDataSource {
    files: Vec<PathBuf>,
    image_dir: Option<PathBuf>,
    next: usize,
}

impl LocalDataSource {
    pub fn open(settings: &LocalDataSettings) -> SourceResult<Self> {
        let dir = &settings.meta_dir;
        let list_err = |source| SourceError::ListDir {
            path: dir.display().to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let path = entry.map_err(list_err)?.path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        info!(dir = %dir.display(), frames = files.len(), "local detection source opened");
        Ok(Self {
            files,
            image_dir: settings.image_dir.clone(),
            next: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    fn read_frame(&self, path: &Path) -> SourceResult<SourceFrame> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let meta: MetaFile = serde_json::from_str(&text).map_err(|source| SourceError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let background = self.image_dir.as_deref().and_then(|dir| find_image(dir, &name));
        debug!(frame = %name, detections = meta.detections.len(), background = background.is_some(), "frame read");

        Ok(SourceFrame {
            detections: meta.detections.into_iter().map(|d| d.bbox.into()).collect(),
            name,
            background,
            timestamp: meta.timestamp,
        })
    }
}

impl Iterator for LocalDataSource {
    type Item = SourceResult<SourceFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.get(self.next)?.clone();
        self.next += 1;
        Some(self.read_frame(&path))
    }
}

fn find_image(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}
