//! YOLOv3 object detector. Runs the raw network and reports its three
//! detection grids; box decoding is left to the caller.

use crate::ascii::{render_heatmap, TensorSummary};
use crate::config::SampleConfig;
use crate::error::SampleError;
use crate::image::{read_ppm, write_ppm};
use crate::mnist_caffe::first_name;
use crate::sample::{image_hw, NetworkSource, Sample};
use nvtrt::{
    network_flags, BufferManager, Builder, BuilderConfig, Logger, NetworkDefinition, OnnxParser,
};
use std::path::PathBuf;

/// Columns used for terminal heatmaps.
const HEATMAP_COLS: usize = 64;

pub struct Yolov3Onnx {
    config: SampleConfig,
    dump_input: Option<PathBuf>,
}

impl Yolov3Onnx {
    pub fn new(config: SampleConfig) -> Self {
        Self {
            config,
            dump_input: None,
        }
    }

    /// Write the preprocessed input back out as a PPM file.
    pub fn with_dump_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_input = Some(path.into());
        self
    }
}

/// Rec. 601 luma of a planar RGB buffer.
pub fn luminance(planar: &[f32], plane: usize) -> Vec<f32> {
    let (r, rest) = planar.split_at(plane.min(planar.len()));
    let (g, b) = rest.split_at(plane.min(rest.len()));
    r.iter()
        .zip(g)
        .zip(b)
        .map(|((r, g), b)| 0.299 * r + 0.587 * g + 0.114 * b)
        .collect()
}

/// Map `[0, 1]` floats back to bytes.
fn to_bytes(values: &[f32]) -> Vec<u8> {
    values
        .iter()
        .map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}

impl Sample for Yolov3Onnx {
    fn name(&self) -> &str {
        "yolov3-onnx"
    }

    fn config(&self) -> &SampleConfig {
        &self.config
    }

    fn network_flags(&self) -> u32 {
        network_flags::EXPLICIT_BATCH
    }

    fn build_network<'n>(
        &mut self,
        _builder: &Builder<'_>,
        network: &'n NetworkDefinition,
        _config: &mut BuilderConfig,
        logger: &'n Logger,
    ) -> Result<NetworkSource<'n>, SampleError> {
        let model = self
            .config
            .locate_required("onnx_model", self.config.onnx_model.as_deref())?;
        let parser = OnnxParser::new(network, logger)?;
        parser.parse_from_file(&model)?;

        for output in network.outputs() {
            tracing::debug!("output {} {}", output.name()?, output.dimensions());
        }
        Ok(NetworkSource::Onnx(parser))
    }

    fn process_input(&mut self, buffers: &mut BufferManager) -> Result<(), SampleError> {
        let name = first_name(&self.config.input_tensor_names, "input_tensor_names")?;
        let dims = buffers.dims(name)?;
        let (h, w) = image_hw(dims)?;
        let channels = dims.extents().iter().rev().nth(2).copied().unwrap_or(1);
        if channels != 3 {
            return Err(SampleError::Network(format!(
                "expected an RGB input, got shape {dims}"
            )));
        }

        let path = self
            .config
            .locate_required("image", self.config.image.as_deref())?;
        let image = read_ppm(&path)?;
        if (image.height, image.width) != (h, w) {
            return Err(SampleError::Network(format!(
                "{} is {}x{}, network expects {h}x{w}",
                path.display(),
                image.height,
                image.width
            )));
        }

        let host = buffers.host_buffer_mut(name)?;
        for (dst, &v) in host.iter_mut().zip(&image.data) {
            *dst = f32::from(v) / 255.0;
        }

        let planar = &host[..image.data.len().min(host.len())];
        println!(
            "Input image {}\n{}",
            path.display(),
            render_heatmap(&luminance(planar, h * w), h, w, HEATMAP_COLS)
        );
        if let Some(dump) = &self.dump_input {
            write_ppm(dump, &to_bytes(planar), w, h)?;
            tracing::info!("wrote preprocessed input to {}", dump.display());
        }
        Ok(())
    }

    fn verify_output(&self, buffers: &BufferManager) -> Result<bool, SampleError> {
        let mut finite = true;
        for name in &self.config.output_tensor_names {
            let values = buffers.host_buffer(name)?;
            let dims = buffers.dims(name)?;
            match TensorSummary::of(values) {
                Some(summary) => println!("{name} {dims}: {summary}"),
                None => println!("{name} {dims}: empty"),
            }

            if let Ok((h, w)) = image_hw(dims) {
                println!("{}", render_heatmap(values, h, w, HEATMAP_COLS));
            }
            if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
                tracing::error!("{name}: non-finite value at index {bad}");
                finite = false;
            }
        }
        Ok(finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance() {
        let planar = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let luma = luminance(&planar, 2);
        assert!((luma[0] - 0.299).abs() < 1e-6);
        assert!((luma[1] - 0.587).abs() < 1e-6);
    }

    #[test]
    fn test_luminance_short_buffer() {
        assert_eq!(luminance(&[1.0, 1.0], 2), Vec::<f32>::new());
    }

    #[test]
    fn test_to_bytes() {
        assert_eq!(to_bytes(&[0.0, 0.5, 1.0, 2.0, -1.0]), vec![0, 128, 255, 255, 0]);
    }
}
