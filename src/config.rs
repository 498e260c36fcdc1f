use std::path::{Path, PathBuf};

use crate::ContainerEngine;

pub const DEFAULT_ENGINE: &str = "docker";
pub const DEFAULT_TAG: &str = "dtdd-plex";
pub const DEFAULT_CONFIG_NAME: &str = "config.py";
pub const DEFAULT_VOLUME_PREFIX: &str = "json-output-data";
pub const DEFAULT_DATA_MOUNT: &str = "/data";
pub const DEFAULT_ARTIFACT_NAME: &str = "movies.json";
pub const DEFAULT_OUTPUT_PATH: &str = "output/movies.json";
pub const DEFAULT_PRODUCER: &str = "build_json.py";
pub const DEFAULT_CONSUMER: &str = "write_to_plex.py";

/// Everything the orchestration routines need to know that is not specific
/// to a single invocation. The binary fills this in from the command line and
/// environment, tests construct it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// The container engine program, normally "docker"
    pub engine: String,
    /// The image name/tag that is built and run
    pub tag: String,
    /// The working directory holding the build context and the active config
    pub work_dir: PathBuf,
    /// File name of the active config inside `work_dir`
    pub config_name: String,
    /// Anchor container names are this prefix plus a UUID
    pub volume_prefix: String,
    /// Where the transfer volume is mounted inside containers
    pub data_mount: String,
    /// File name of the JSON artifact inside `data_mount`
    pub artifact_name: String,
    /// Program inside the image that writes the artifact
    pub producer: String,
    /// Program inside the image that applies the artifact to Plex
    pub consumer: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_owned(),
            tag: DEFAULT_TAG.to_owned(),
            work_dir: PathBuf::from("."),
            config_name: DEFAULT_CONFIG_NAME.to_owned(),
            volume_prefix: DEFAULT_VOLUME_PREFIX.to_owned(),
            data_mount: DEFAULT_DATA_MOUNT.to_owned(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_owned(),
            producer: DEFAULT_PRODUCER.to_owned(),
            consumer: DEFAULT_CONSUMER.to_owned(),
        }
    }
}

impl OrchestratorConfig {
    pub fn engine(mut self, engine: impl AsRef<str>) -> Self {
        engine.as_ref().clone_into(&mut self.engine);
        self
    }

    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        tag.as_ref().clone_into(&mut self.tag);
        self
    }

    pub fn work_dir(mut self, work_dir: impl AsRef<Path>) -> Self {
        self.work_dir = work_dir.as_ref().to_owned();
        self
    }

    pub fn producer(mut self, producer: impl AsRef<str>) -> Self {
        producer.as_ref().clone_into(&mut self.producer);
        self
    }

    pub fn consumer(mut self, consumer: impl AsRef<str>) -> Self {
        consumer.as_ref().clone_into(&mut self.consumer);
        self
    }

    /// The container engine wrapper for `self.engine`
    pub fn container_engine(&self) -> ContainerEngine {
        ContainerEngine::new(&self.engine)
    }

    /// Relative paths are taken relative to `work_dir`, absolute paths are
    /// returned as is
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.work_dir.join(path)
        }
    }

    /// `{data_mount}/{artifact_name}`, the artifact path as seen inside
    /// containers
    pub fn container_artifact_path(&self) -> String {
        format!(
            "{}/{}",
            self.data_mount.trim_end_matches('/'),
            self.artifact_name
        )
    }
}
