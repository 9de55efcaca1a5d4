//! Paired host/device buffers for every I/O tensor of an engine

use crate::cuda::{DeviceBuffer, Stream};
use crate::error::{Error, Result};
use crate::network::{DataType, Dims};
use crate::runtime::{CudaEngine, ExecutionContext, TensorIoMode};
use std::ffi::c_void;

fn as_bytes(values: &[f32]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(values.as_ptr() as *const u8, std::mem::size_of_val(values)) }
}

fn as_bytes_mut(values: &mut [f32]) -> &mut [u8] {
    unsafe {
        std::slice::from_raw_parts_mut(
            values.as_mut_ptr() as *mut u8,
            std::mem::size_of_val(values),
        )
    }
}

struct ManagedBuffer {
    name: String,
    mode: TensorIoMode,
    dims: Dims,
    host: Vec<f32>,
    device: DeviceBuffer,
}

/// Host and device memory for all I/O tensors of one engine, in engine order.
///
/// Implicit-batch engines get `batch_size` samples per buffer; explicit-batch
/// engines already carry the batch in their shapes. Only FP32 tensors are
/// supported.
pub struct BufferManager {
    buffers: Vec<ManagedBuffer>,
    batch_size: i32,
    implicit_batch: bool,
}

impl BufferManager {
    pub fn new(engine: &CudaEngine, batch_size: i32) -> Result<Self> {
        if batch_size < 1 {
            return Err(Error::InvalidArgument(format!(
                "batch size must be positive, got {batch_size}"
            )));
        }
        let implicit_batch = engine.has_implicit_batch_dimension();
        let samples = if implicit_batch { batch_size as usize } else { 1 };

        let mut buffers = Vec::new();
        for index in 0..engine.get_nb_io_tensors()? {
            let name = engine.get_tensor_name(index)?;
            let dims = engine.get_tensor_shape(&name)?;
            if dims.is_dynamic() {
                return Err(Error::InvalidArgument(format!(
                    "tensor {name} has dynamic shape {dims}"
                )));
            }
            let data_type = engine.get_tensor_data_type(&name)?;
            if data_type != DataType::Float {
                return Err(Error::InvalidArgument(format!(
                    "tensor {name} has unsupported type {data_type:?}"
                )));
            }
            let mode = engine.get_tensor_io_mode(&name)?;

            let count = dims.volume() as usize * samples;
            let device = DeviceBuffer::new(count * data_type.size())?;
            buffers.push(ManagedBuffer {
                name,
                mode,
                dims,
                host: vec![0.0; count],
                device,
            });
        }

        Ok(BufferManager {
            buffers,
            batch_size,
            implicit_batch,
        })
    }

    fn find(&self, name: &str) -> Result<&ManagedBuffer> {
        self.buffers
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::NotFound(format!("tensor {name}")))
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut ManagedBuffer> {
        self.buffers
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::NotFound(format!("tensor {name}")))
    }

    pub fn batch_size(&self) -> i32 {
        self.batch_size
    }

    pub fn has_implicit_batch(&self) -> bool {
        self.implicit_batch
    }

    /// Tensor names in engine order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buffers.iter().map(|b| b.name.as_str())
    }

    /// Names of the tensors inference writes
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.buffers
            .iter()
            .filter(|b| b.mode == TensorIoMode::Output)
            .map(|b| b.name.as_str())
    }

    /// Per-sample shape of a tensor
    pub fn dims(&self, name: &str) -> Result<&Dims> {
        Ok(&self.find(name)?.dims)
    }

    pub fn host_buffer(&self, name: &str) -> Result<&[f32]> {
        Ok(self.find(name)?.host.as_slice())
    }

    pub fn host_buffer_mut(&mut self, name: &str) -> Result<&mut [f32]> {
        Ok(self.find_mut(name)?.host.as_mut_slice())
    }

    /// Device pointers in engine order, as taken by [`ExecutionContext::enqueue`]
    pub fn device_bindings(&self) -> Vec<*mut c_void> {
        self.buffers.iter().map(|b| b.device.as_ptr()).collect()
    }

    /// Point every I/O tensor of `context` at its device buffer
    pub fn bind(&self, context: &mut ExecutionContext<'_>) -> Result<()> {
        for buffer in &self.buffers {
            // The device buffers live as long as `self`.
            unsafe { context.set_tensor_address(&buffer.name, buffer.device.as_ptr())? };
        }
        Ok(())
    }

    /// Upload every input host buffer
    pub fn copy_input_to_device(&mut self) -> Result<()> {
        for buffer in self.buffers.iter_mut().filter(|b| b.mode == TensorIoMode::Input) {
            buffer.device.copy_from_host(as_bytes(&buffer.host))?;
        }
        Ok(())
    }

    /// Download every output device buffer
    pub fn copy_output_to_host(&mut self) -> Result<()> {
        for buffer in self.buffers.iter_mut().filter(|b| b.mode == TensorIoMode::Output) {
            buffer.device.copy_to_host(as_bytes_mut(&mut buffer.host))?;
        }
        Ok(())
    }

    /// Queue uploads of every input host buffer on `stream`
    ///
    /// # Safety
    ///
    /// The manager must not be dropped or have its host buffers written
    /// before `stream` is synchronized.
    pub unsafe fn copy_input_to_device_async(&mut self, stream: &Stream) -> Result<()> {
        for buffer in self.buffers.iter_mut().filter(|b| b.mode == TensorIoMode::Input) {
            buffer.device.copy_from_host_async(as_bytes(&buffer.host), stream)?;
        }
        Ok(())
    }

    /// Queue downloads of every output device buffer on `stream`
    ///
    /// # Safety
    ///
    /// The manager must not be dropped and its host buffers must not be read
    /// before `stream` is synchronized.
    pub unsafe fn copy_output_to_host_async(&mut self, stream: &Stream) -> Result<()> {
        for buffer in self.buffers.iter_mut().filter(|b| b.mode == TensorIoMode::Output) {
            buffer
                .device
                .copy_to_host_async(as_bytes_mut(&mut buffer.host), stream)?;
        }
        Ok(())
    }
}
