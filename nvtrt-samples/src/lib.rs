//! TensorRT samples with terminal visualization
//!
//! Each sample implements [`Sample`] and is driven through the build, infer
//! and teardown phases by a [`SampleRunner`]:
//!
//! - [`MnistCaffe`]: Caffe MNIST classifier with in-network mean subtraction
//!   and INT8 dynamic ranges
//! - [`MnistOnnx`]: ONNX MNIST classifier
//! - [`Yolov3Onnx`]: YOLOv3 detector reporting its raw output grids
//!
//! # Example
//!
//! ```rust,no_run
//! use nvtrt::Logger;
//! use nvtrt_samples::{MnistOnnx, SampleConfig, SampleRunner, TracingLogger};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Logger::new(TracingLogger)?;
//! let sample = MnistOnnx::new(SampleConfig::mnist_onnx()).with_digit(7);
//! SampleRunner::new(sample, &logger).run()?;
//! # Ok(())
//! # }
//! ```

pub mod ascii;
pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod mnist_caffe;
pub mod mnist_onnx;
pub mod sample;
pub mod yolov3_onnx;

pub use config::SampleConfig;
pub use error::{Phase, SampleError};
pub use image::{read_pgm, read_ppm, write_ppm, ImageError, PpmImage};
pub use logging::{init_tracing, TracingLogger};
pub use mnist_caffe::MnistCaffe;
pub use mnist_onnx::MnistOnnx;
pub use sample::{NetworkSource, Sample, SampleRunner};
pub use yolov3_onnx::Yolov3Onnx;
