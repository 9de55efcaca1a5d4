//! ONNX model parser for TensorRT

use crate::error::{check, error_buffer, Result};
use crate::logger::Logger;
use crate::network::NetworkDefinition;
use nvtrt_sys::*;
use std::marker::PhantomData;
use std::path::Path;

/// ONNX model parser
///
/// Parsed layers are added to the network the parser was created for, which
/// must have been created with [`crate::network_flags::EXPLICIT_BATCH`].
pub struct OnnxParser<'n> {
    inner: *mut NvtrtOnnxParser,
    _network: PhantomData<&'n NetworkDefinition>,
}

impl<'n> OnnxParser<'n> {
    /// Create a new ONNX parser for the given network
    pub fn new(network: &'n NetworkDefinition, logger: &'n Logger) -> Result<Self> {
        let mut parser_ptr: *mut NvtrtOnnxParser = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_onnx_parser_create(
                network.as_ptr(),
                logger.as_ptr(),
                &mut parser_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(OnnxParser {
            inner: parser_ptr,
            _network: PhantomData,
        })
    }

    /// Parse an ONNX model from bytes
    pub fn parse(&self, model_bytes: &[u8]) -> Result<()> {
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_onnx_parser_parse(
                self.inner,
                model_bytes.as_ptr() as *const std::ffi::c_void,
                model_bytes.len(),
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)
    }

    /// Read and parse an ONNX model file
    pub fn parse_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let model_bytes = std::fs::read(path)?;
        self.parse(&model_bytes)
    }
}

impl Drop for OnnxParser<'_> {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_onnx_parser_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for OnnxParser<'_> {}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::builder::network_flags;
    use crate::logger::tests::TestLogger;
    use crate::Builder;
    use crate::Error;
    use std::io::Write;

    #[test]
    fn test_onnx_parser_creation() {
        let logger = Logger::new(TestLogger::default()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder
            .create_network(network_flags::EXPLICIT_BATCH)
            .unwrap();

        let parser = OnnxParser::new(&network, &logger);
        assert!(parser.is_ok());
    }

    #[test]
    fn test_parse_marks_outputs() {
        let logger = Logger::new(TestLogger::default()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder
            .create_network(network_flags::EXPLICIT_BATCH)
            .unwrap();

        let parser = OnnxParser::new(&network, &logger).unwrap();
        parser
            .parse(b"mock-input Input3 1 1 28 28\nmock-output Plus214_Output_0 1 10\n")
            .unwrap();
        assert_eq!(network.nb_outputs(), 1);
        assert_eq!(network.output(0).unwrap().name().unwrap(), "Plus214_Output_0");
    }

    #[test]
    fn test_parse_requires_explicit_batch() {
        let handler = TestLogger::default();
        let logger = Logger::new(handler.clone()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder.create_network(0).unwrap();

        let parser = OnnxParser::new(&network, &logger).unwrap();
        let err = parser.parse(b"mock-input x 1\nmock-output y 1\n").unwrap_err();
        assert!(matches!(err, Error::Runtime(_)));
    }

    #[test]
    fn test_parse_rejects_model_without_inputs() {
        let handler = TestLogger::default();
        let logger = Logger::new(handler.clone()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder
            .create_network(network_flags::EXPLICIT_BATCH)
            .unwrap();

        let parser = OnnxParser::new(&network, &logger).unwrap();
        assert!(parser.parse(b"not a model\n").is_err());
        assert!(handler
            .get_messages()
            .iter()
            .any(|(_, msg)| msg.contains("failed to parse ONNX model")));
    }

    #[test]
    fn test_parse_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mock-input images 1 3 8 8").unwrap();
        writeln!(file, "mock-output boxes 1 6").unwrap();

        let logger = Logger::new(TestLogger::default()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder
            .create_network(network_flags::EXPLICIT_BATCH)
            .unwrap();
        let parser = OnnxParser::new(&network, &logger).unwrap();
        parser.parse_from_file(file.path()).unwrap();
        assert_eq!(network.nb_inputs(), 1);
    }

    #[test]
    fn test_parse_from_missing_file() {
        let logger = Logger::new(TestLogger::default()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder
            .create_network(network_flags::EXPLICIT_BATCH)
            .unwrap();
        let parser = OnnxParser::new(&network, &logger).unwrap();
        let err = parser.parse_from_file("/nonexistent/model.onnx").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
