//! Safe Rust bindings to NVIDIA TensorRT
//!
//! This crate wraps the TensorRT C++ API, exposed through the C shim in
//! `nvtrt-sys`, in RAII types that free their native objects on drop.
//!
//! # Workflow
//!
//! ## Build Phase
//!
//! 1. Create a [`Logger`] to capture TensorRT messages
//! 2. Create a [`Builder`] and a [`NetworkDefinition`]
//! 3. Populate the network with an [`OnnxParser`] or a [`CaffeParser`]
//! 4. Configure precision, device placement and memory with [`BuilderConfig`]
//! 5. Serialize the engine with [`Builder::build_serialized_network`]
//!
//! ## Inference Phase
//!
//! 1. Deserialize the engine with [`Runtime::deserialize_cuda_engine`]
//! 2. Allocate I/O memory with a [`BufferManager`]
//! 3. Create an [`ExecutionContext`], copy inputs to the device and enqueue
//! 4. Copy outputs back and synchronize the [`Stream`]
//!
//! # Example
//!
//! ```rust,no_run
//! use nvtrt::{BufferManager, Builder, Logger, OnnxParser, Runtime, Stream};
//! use nvtrt::builder::{network_flags, MemoryPoolType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Logger::colored()?;
//!
//! // Build phase
//! let builder = Builder::new(&logger)?;
//! let network = builder.create_network(network_flags::EXPLICIT_BATCH)?;
//! let parser = OnnxParser::new(&network, &logger)?;
//! parser.parse_from_file("mnist.onnx")?;
//! let mut config = builder.create_config()?;
//! config.set_memory_pool_limit(MemoryPoolType::Workspace, 16 << 20)?;
//! let engine_data = builder.build_serialized_network(&network, &config)?;
//!
//! // Inference phase
//! let runtime = Runtime::new(&logger)?;
//! let engine = runtime.deserialize_cuda_engine(&engine_data)?;
//! let mut context = engine.create_execution_context()?;
//! let mut buffers = BufferManager::new(&engine, 1)?;
//! buffers.host_buffer_mut("Input3")?.fill(0.5);
//! buffers.bind(&mut context)?;
//!
//! let stream = Stream::new()?;
//! unsafe {
//!     buffers.copy_input_to_device_async(&stream)?;
//!     context.enqueue_v3(stream.as_ptr())?;
//!     buffers.copy_output_to_host_async(&stream)?;
//! }
//! stream.synchronize()?;
//! println!("{:?}", buffers.host_buffer("Plus214_Output_0")?);
//! # Ok(())
//! # }
//! ```
//!
//! # Safety
//!
//! Setting tensor addresses, enqueueing inference and asynchronous copies
//! hand raw memory to the GPU and are marked `unsafe`.
//!
//! # Prerequisites
//!
//! - TensorRT 8.x with the ONNX and Caffe parsers
//! - CUDA Runtime
//!
//! Set `TENSORRT_DIR` and `CUDA_ROOT` if they are not in `/usr/local`.
//! With the `mock` feature everything runs on the host without either.

pub mod buffers;
pub mod builder;
pub mod caffe_parser;
pub mod cuda;
pub mod error;
pub mod logger;
pub mod network;
pub mod onnx_parser;
pub mod runtime;

// Re-export commonly used types
pub use buffers::BufferManager;
pub use builder::{
    enable_dla, network_flags, Builder, BuilderConfig, BuilderFlag, DeviceType, MemoryPoolType,
};
pub use caffe_parser::{shutdown_protobuf_library, BinaryProtoBlob, BlobNameToTensor, CaffeParser};
pub use cuda::{get_default_stream, synchronize, DeviceBuffer, Stream};
pub use error::{Error, Result};
pub use logger::{ColorLogger, LogHandler, Logger, Severity, StderrLogger};
pub use network::{
    set_all_tensor_scales, DataType, Dims, ElementWiseOperation, Layer, LayerType,
    NetworkDefinition, Tensor, Weights,
};
pub use onnx_parser::OnnxParser;
pub use runtime::{CudaEngine, ExecutionContext, Runtime, TensorIoMode};
