//! MNIST digit classifier from the ONNX model zoo.

use crate::ascii::{argmax, render_digit, render_probabilities, softmax};
use crate::config::SampleConfig;
use crate::error::SampleError;
use crate::image::read_pgm;
use crate::mnist_caffe::first_name;
use crate::sample::{image_hw, NetworkSource, Sample};
use nvtrt::{
    network_flags, BufferManager, Builder, BuilderConfig, Logger, NetworkDefinition, OnnxParser,
};

pub struct MnistOnnx {
    config: SampleConfig,
    digit: u8,
}

impl MnistOnnx {
    pub fn new(config: SampleConfig) -> Self {
        Self { config, digit: 3 }
    }

    pub fn with_digit(mut self, digit: u8) -> Self {
        self.digit = digit;
        self
    }

    pub fn digit(&self) -> u8 {
        self.digit
    }
}

/// Dark strokes on a light background, as the model was trained on.
pub fn normalize_pixel(value: u8) -> f32 {
    1.0 - f32::from(value) / 255.0
}

impl Sample for MnistOnnx {
    fn name(&self) -> &str {
        "mnist-onnx"
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

        if network.nb_inputs() != 1 || network.nb_outputs() != 1 {
            return Err(SampleError::Network(format!(
                "expected 1 input and 1 output, got {} and {}",
                network.nb_inputs(),
                network.nb_outputs()
            )));
        }
        Ok(NetworkSource::Onnx(parser))
    }

    fn process_input(&mut self, buffers: &mut BufferManager) -> Result<(), SampleError> {
        let name = first_name(&self.config.input_tensor_names, "input_tensor_names")?;
        let (h, w) = image_hw(buffers.dims(name)?)?;
        let path = self.config.locate_file(&format!("{}.pgm", self.digit))?;
        let pixels = read_pgm(&path, h, w)?;

        println!("Input image\n{}", render_digit(&pixels, w));

        let host = buffers.host_buffer_mut(name)?;
        for (dst, &p) in host.iter_mut().zip(&pixels) {
            *dst = normalize_pixel(p);
        }
        Ok(())
    }

    fn verify_output(&self, buffers: &BufferManager) -> Result<bool, SampleError> {
        let name = first_name(&self.config.output_tensor_names, "output_tensor_names")?;
        let prob = softmax(buffers.host_buffer(name)?);

        print!("Output:\n{}", render_probabilities(&prob));
        let predicted = argmax(&prob);
        tracing::info!("predicted {predicted}, expected {}", self.digit);
        Ok(predicted == usize::from(self.digit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pixel() {
        assert_eq!(normalize_pixel(0), 1.0);
        assert_eq!(normalize_pixel(255), 0.0);
        assert!((normalize_pixel(51) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_explicit_batch() {
        let sample = MnistOnnx::new(SampleConfig::mnist_onnx()).with_digit(5);
        assert_eq!(sample.network_flags(), network_flags::EXPLICIT_BATCH);
        assert_eq!(sample.digit(), 5);
    }
}
