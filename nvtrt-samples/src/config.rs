//! Sample configuration loaded from TOML files or built from per-sample defaults.
//!
//! # TOML Format
//! ```toml
//! data_dirs = ["data/mnist", "../data/mnist"]
//! onnx_model = "mnist.onnx"
//! input_tensor_names = ["Input3"]
//! output_tensor_names = ["Plus214_Output_0"]
//! batch_size = 1
//! dla_core = -1
//! fp16 = true
//! workspace_size = 16777216
//! engine_cache = "mnist.engine"
//! ```
//!
//! [`SampleConfig::overlay_toml`] applies such a file on top of a sample's
//! defaults, so a file only needs the keys it changes.

use crate::error::SampleError;
use std::path::{Path, PathBuf};

/// Files, tensor names and build options shared by every sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Directories searched, in order, for every data file.
    pub data_dirs: Vec<PathBuf>,
    /// Caffe network description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototxt: Option<String>,
    /// Caffe trained weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caffemodel: Option<String>,
    /// Mean image subtracted from the Caffe input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onnx_model: Option<String>,
    /// Input image for samples that read one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub input_tensor_names: Vec<String>,
    pub output_tensor_names: Vec<String>,
    pub batch_size: i32,
    /// DLA core to build for, `-1` for the GPU.
    pub dla_core: i32,
    pub int8: bool,
    pub fp16: bool,
    /// Builder workspace limit in bytes.
    pub workspace_size: usize,
    /// Serialized engine reused across runs when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_cache: Option<PathBuf>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            data_dirs: Vec::new(),
            prototxt: None,
            caffemodel: None,
            mean_file: None,
            onnx_model: None,
            image: None,
            input_tensor_names: Vec::new(),
            output_tensor_names: Vec::new(),
            batch_size: 1,
            dla_core: -1,
            int8: false,
            fp16: false,
            workspace_size: 16 << 20,
            engine_cache: None,
        }
    }
}

impl SampleConfig {
    /// MNIST classifier from Caffe files with a mean image.
    pub fn mnist_caffe() -> Self {
        Self {
            data_dirs: vec!["data/mnist".into(), "../data/mnist".into()],
            prototxt: Some("mnist.prototxt".into()),
            caffemodel: Some("mnist.caffemodel".into()),
            mean_file: Some("mnist_mean.binaryproto".into()),
            input_tensor_names: vec!["data".into()],
            output_tensor_names: vec!["prob".into()],
            ..Default::default()
        }
    }

    /// MNIST classifier from the ONNX model zoo.
    pub fn mnist_onnx() -> Self {
        Self {
            data_dirs: vec!["data/mnist".into(), "../data/mnist".into()],
            onnx_model: Some("mnist.onnx".into()),
            input_tensor_names: vec!["Input3".into()],
            output_tensor_names: vec!["Plus214_Output_0".into()],
            ..Default::default()
        }
    }

    /// YOLOv3 detector with its three detection scales.
    pub fn yolov3_onnx() -> Self {
        Self {
            data_dirs: vec!["data/yolov3".into(), "../data/yolov3".into()],
            onnx_model: Some("yolov3.onnx".into()),
            image: Some("dog.ppm".into()),
            input_tensor_names: vec!["000_net".into()],
            output_tensor_names: vec![
                "082_convolutional".into(),
                "094_convolutional".into(),
                "106_convolutional".into(),
            ],
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SampleError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SampleError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string. Missing keys keep their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, SampleError> {
        toml::from_str(toml_str)
            .map_err(|e| SampleError::Config(format!("TOML parse error: {e}")))
    }

    /// Loads a TOML file over `self`, see [`overlay_toml`](Self::overlay_toml).
    pub fn overlay_file(self, path: &Path) -> Result<Self, SampleError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SampleError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        self.overlay_toml(&content)
    }

    /// Parses TOML over `self`. Keys present in `toml_str` replace the
    /// current values, lists included; every other field is kept.
    pub fn overlay_toml(self, toml_str: &str) -> Result<Self, SampleError> {
        let overrides: toml::Table = toml::from_str(toml_str)
            .map_err(|e| SampleError::Config(format!("TOML parse error: {e}")))?;
        let mut merged = match toml::Value::try_from(&self) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => return Err(SampleError::Config("config is not a TOML table".into())),
            Err(e) => return Err(SampleError::Config(format!("TOML serialise error: {e}"))),
        };
        for (key, value) in overrides {
            merged.insert(key, value);
        }
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e| SampleError::Config(format!("TOML parse error: {e}")))
    }

    pub fn to_toml(&self) -> Result<String, SampleError> {
        toml::to_string_pretty(self)
            .map_err(|e| SampleError::Config(format!("TOML serialise error: {e}")))
    }

    /// Finds `name` in the first data directory that contains it.
    ///
    /// An absolute path is returned as is when it exists.
    pub fn locate_file(&self, name: &str) -> Result<PathBuf, SampleError> {
        let direct = Path::new(name);
        if direct.is_absolute() && direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let mut searched = Vec::with_capacity(self.data_dirs.len());
        for dir in &self.data_dirs {
            let candidate = dir.join(name);
            if candidate.is_file() {
                tracing::debug!("found {name} at {}", candidate.display());
                return Ok(candidate);
            }
            searched.push(candidate);
        }
        Err(SampleError::MissingFile {
            name: name.to_string(),
            searched,
        })
    }

    /// Like [`locate_file`](Self::locate_file) for a field that must be set.
    pub fn locate_required(&self, field: &str, name: Option<&str>) -> Result<PathBuf, SampleError> {
        let name = name.ok_or_else(|| SampleError::Config(format!("'{field}' is not set")))?;
        self.locate_file(name)
    }
}
