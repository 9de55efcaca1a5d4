//! MNIST digit classifier built from Caffe files, with the mean image
//! subtracted inside the network.

use crate::ascii::{argmax, render_digit, render_probabilities};
use crate::config::SampleConfig;
use crate::error::SampleError;
use crate::image::read_pgm;
use crate::sample::{image_hw, NetworkSource, Sample};
use nvtrt::{
    set_all_tensor_scales, shutdown_protobuf_library, BufferManager, Builder, BuilderConfig,
    CaffeParser, DataType, Dims, ElementWiseOperation, Logger, NetworkDefinition, Weights,
};

const DIGITS: usize = 10;

pub struct MnistCaffe {
    config: SampleConfig,
    digit: u8,
}

impl MnistCaffe {
    /// Classifies `3.pgm` unless told otherwise.
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

    fn input_name(&self) -> Result<&str, SampleError> {
        first_name(&self.config.input_tensor_names, "input_tensor_names")
    }

    fn output_name(&self) -> Result<&str, SampleError> {
        first_name(&self.config.output_tensor_names, "output_tensor_names")
    }
}

pub(crate) fn first_name<'a>(names: &'a [String], field: &str) -> Result<&'a str, SampleError> {
    names
        .first()
        .map(String::as_str)
        .ok_or_else(|| SampleError::Config(format!("'{field}' is empty")))
}

/// Subtract the mean image from the network input ahead of the first layer
/// and give every tensor an INT8 dynamic range.
fn subtract_mean(network: &NetworkDefinition, mean: &[f32]) -> Result<(), SampleError> {
    let input = network
        .input(0)
        .ok_or_else(|| SampleError::Network("network has no input".into()))?;
    let dims = input.dimensions();
    let &[_, h, w] = dims.extents() else {
        return Err(SampleError::Network(format!(
            "expected a CHW input, got {dims}"
        )));
    };
    let plane = (h * w).max(0) as usize;
    if mean.len() < plane {
        return Err(SampleError::Network(format!(
            "mean image has {} values, input plane needs {plane}",
            mean.len()
        )));
    }
    let mean = &mean[..plane];
    let max_mean = mean.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mean_layer = network.add_constant(&Dims::new(&[1, h, w])?, Weights::new(mean))?;
    let mean_out = mean_layer
        .output(0)
        .ok_or_else(|| SampleError::Network("constant layer has no output".into()))?;
    mean_out.set_dynamic_range(-max_mean, max_mean)?;
    input.set_dynamic_range(-max_mean, max_mean)?;

    let sub = network.add_element_wise(input, mean_out, ElementWiseOperation::Sub)?;
    let sub_out = sub
        .output(0)
        .ok_or_else(|| SampleError::Network("subtraction has no output".into()))?;
    sub_out.set_dynamic_range(-max_mean, max_mean)?;

    network
        .layer(0)
        .ok_or_else(|| SampleError::Network("network has no layers".into()))?
        .set_input(0, sub_out)?;
    set_all_tensor_scales(network, 127.0, 127.0)?;
    Ok(())
}

impl Sample for MnistCaffe {
    fn name(&self) -> &str {
        "mnist-caffe"
    }

    fn config(&self) -> &SampleConfig {
        &self.config
    }

    fn build_network<'n>(
        &mut self,
        _builder: &Builder<'_>,
        network: &'n NetworkDefinition,
        _config: &mut BuilderConfig,
        _logger: &'n Logger,
    ) -> Result<NetworkSource<'n>, SampleError> {
        let config = &self.config;
        let deploy = config.locate_required("prototxt", config.prototxt.as_deref())?;
        let model = config.locate_required("caffemodel", config.caffemodel.as_deref())?;
        let mean_file = config.locate_required("mean_file", config.mean_file.as_deref())?;

        let parser = CaffeParser::new()?;
        {
            let blobs = parser.parse(&deploy, &model, network, DataType::Float)?;
            for name in &config.output_tensor_names {
                network.mark_output(blobs.find(name)?);
            }
        }

        let mean = parser.parse_binary_proto(&mean_file)?;
        tracing::debug!("mean image {} from {}", mean.dims(), mean_file.display());
        subtract_mean(network, mean.data())?;

        Ok(NetworkSource::Caffe(parser))
    }

    fn process_input(&mut self, buffers: &mut BufferManager) -> Result<(), SampleError> {
        let name = self.input_name()?;
        let (h, w) = image_hw(buffers.dims(name)?)?;
        let path = self.config.locate_file(&format!("{}.pgm", self.digit))?;
        let pixels = read_pgm(&path, h, w)?;

        println!("Input image\n{}", render_digit(&pixels, w));

        let host = buffers.host_buffer_mut(name)?;
        for (dst, &p) in host.iter_mut().zip(&pixels) {
            *dst = f32::from(p);
        }
        Ok(())
    }

    fn verify_output(&self, buffers: &BufferManager) -> Result<bool, SampleError> {
        let prob = buffers.host_buffer(self.output_name()?)?;
        let prob = &prob[..prob.len().min(DIGITS)];

        print!("Output:\n{}", render_probabilities(prob));
        let predicted = argmax(prob);
        tracing::info!("predicted {predicted}, expected {}", self.digit);
        Ok(predicted == usize::from(self.digit))
    }

    fn teardown(&mut self) -> Result<(), SampleError> {
        shutdown_protobuf_library();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let names = vec!["data".to_string(), "other".to_string()];
        assert_eq!(first_name(&names, "inputs").unwrap(), "data");
        assert!(matches!(
            first_name(&[], "inputs"),
            Err(SampleError::Config(msg)) if msg.contains("inputs")
        ));
    }

    #[test]
    fn test_default_digit() {
        let sample = MnistCaffe::new(SampleConfig::mnist_caffe());
        assert_eq!(sample.digit(), 3);
        assert_eq!(sample.with_digit(7).digit(), 7);
    }

    #[cfg(feature = "mock")]
    mod mock {
        use super::*;
        use nvtrt::{LayerType, OnnxParser};

        #[test]
        fn test_subtract_mean_rewires_first_layer() {
            let dir = tempfile::tempdir().unwrap();
            let model = dir.path().join("net.onnx");
            std::fs::write(&model, "mock-input data 1 2 2\nmock-output prob 10\n").unwrap();

            let logger = Logger::new(crate::logging::TracingLogger).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder
                .create_network(nvtrt::network_flags::EXPLICIT_BATCH)
                .unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser.parse_from_file(&model).unwrap();

            subtract_mean(&network, &[1.0, 4.0, 2.0, 3.0, 99.0]).unwrap();

            assert_eq!(network.nb_layers(), 3);
            let constant = network.layer(1).unwrap();
            assert_eq!(constant.layer_type(), LayerType::Constant);
            let range = constant.output(0).unwrap().dynamic_range().unwrap();
            assert_eq!(range, (-4.0, 4.0));

            let sub = network.layer(2).unwrap();
            assert_eq!(sub.layer_type(), LayerType::ElementWise);
            let sub_out = sub.output(0).unwrap();
            let first = network.layer(0).unwrap();
            assert_eq!(
                first.input(0).unwrap().name().unwrap(),
                sub_out.name().unwrap()
            );
            assert_eq!(
                network.input(0).unwrap().dynamic_range(),
                Some((-4.0, 4.0))
            );
            // The first layer's output had no range and is not pooling.
            assert_eq!(
                first.output(0).unwrap().dynamic_range(),
                Some((-127.0, 127.0))
            );
        }

        #[test]
        fn test_subtract_mean_short_mean() {
            let dir = tempfile::tempdir().unwrap();
            let model = dir.path().join("net.onnx");
            std::fs::write(&model, "mock-input data 1 2 2\nmock-output prob 10\n").unwrap();

            let logger = Logger::new(crate::logging::TracingLogger).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder
                .create_network(nvtrt::network_flags::EXPLICIT_BATCH)
                .unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser.parse_from_file(&model).unwrap();

            assert!(matches!(
                subtract_mean(&network, &[1.0, 2.0]),
                Err(SampleError::Network(_))
            ));
        }
    }
}
