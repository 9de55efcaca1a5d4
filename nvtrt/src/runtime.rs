//! Runtime for deserializing and managing TensorRT engines

use crate::error::{check, error_buffer, Error, Result};
use crate::logger::Logger;
use crate::network::{DataType, Dims};
use nvtrt_sys::*;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

/// Whether an engine I/O tensor is read or written by inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TensorIoMode {
    /// Not an I/O tensor of this engine
    None = 0,
    Input = 1,
    Output = 2,
}

impl TensorIoMode {
    fn from_raw(value: i32) -> Self {
        match value {
            1 => TensorIoMode::Input,
            2 => TensorIoMode::Output,
            _ => TensorIoMode::None,
        }
    }
}

/// A CUDA engine containing optimized inference code
pub struct CudaEngine {
    inner: *mut NvtrtCudaEngine,
}

impl CudaEngine {
    /// Get the number of I/O tensors
    pub fn get_nb_io_tensors(&self) -> Result<i32> {
        let mut count: i32 = 0;

        let result = unsafe { nvtrt_cuda_engine_get_nb_io_tensors(self.inner, &mut count) };
        check(result, &[])?;

        Ok(count)
    }

    /// Get the name of a tensor by index
    pub fn get_tensor_name(&self, index: i32) -> Result<String> {
        let mut name_ptr: *const c_char = std::ptr::null();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_engine_get_tensor_name(
                self.inner,
                index,
                &mut name_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        let name = unsafe { CStr::from_ptr(name_ptr) }
            .to_str()?
            .to_string();

        Ok(name)
    }

    /// Shape of an I/O tensor, without the batch dimension for implicit-batch engines
    pub fn get_tensor_shape(&self, name: &str) -> Result<Dims> {
        let name_cstr = CString::new(name)?;
        let mut dims = NvtrtDims::default();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_engine_get_tensor_shape(
                self.inner,
                name_cstr.as_ptr(),
                &mut dims,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(Dims::from_ffi(&dims))
    }

    pub fn get_tensor_data_type(&self, name: &str) -> Result<DataType> {
        let name_cstr = CString::new(name)?;
        let mut data_type: i32 = 0;
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_engine_get_tensor_data_type(
                self.inner,
                name_cstr.as_ptr(),
                &mut data_type,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        DataType::from_raw(data_type)
    }

    pub fn get_tensor_io_mode(&self, name: &str) -> Result<TensorIoMode> {
        let name_cstr = CString::new(name)?;
        let mut mode: i32 = 0;
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_engine_get_tensor_io_mode(
                self.inner,
                name_cstr.as_ptr(),
                &mut mode,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(TensorIoMode::from_raw(mode))
    }

    /// True for engines built from implicit-batch networks (Caffe)
    pub fn has_implicit_batch_dimension(&self) -> bool {
        unsafe { nvtrt_cuda_engine_has_implicit_batch_dimension(self.inner) != 0 }
    }

    /// Create an execution context for inference
    pub fn create_execution_context(&self) -> Result<ExecutionContext<'_>> {
        let mut context_ptr: *mut NvtrtExecutionContext = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_engine_create_execution_context(
                self.inner,
                &mut context_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(ExecutionContext {
            inner: context_ptr,
            _engine: std::marker::PhantomData,
        })
    }
}

impl Drop for CudaEngine {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_cuda_engine_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for CudaEngine {}
unsafe impl Sync for CudaEngine {}

/// Execution context for running inference
pub struct ExecutionContext<'a> {
    inner: *mut NvtrtExecutionContext,
    _engine: std::marker::PhantomData<&'a CudaEngine>,
}

impl<'a> ExecutionContext<'a> {
    /// Set the address of a tensor for input or output
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - `data` points to valid CUDA device memory
    /// - The memory remains valid for the lifetime of inference
    /// - The memory is large enough for the tensor's size
    pub unsafe fn set_tensor_address(&mut self, name: &str, data: *mut c_void) -> Result<()> {
        let name_cstr = CString::new(name)?;
        let mut error_msg = error_buffer();

        let result = nvtrt_execution_context_set_tensor_address(
            self.inner,
            name_cstr.as_ptr(),
            data,
            error_msg.as_mut_ptr(),
            error_msg.len(),
        );
        check(result, &error_msg)
    }

    /// Enqueue inference work on a CUDA stream (explicit-batch engines)
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - `cuda_stream` is a valid CUDA stream handle (or null for default stream)
    /// - All tensor addresses have been set
    /// - CUDA context is properly initialized
    pub unsafe fn enqueue_v3(&mut self, cuda_stream: *mut c_void) -> Result<()> {
        let mut error_msg = error_buffer();

        let result = nvtrt_execution_context_enqueue_v3(
            self.inner,
            cuda_stream,
            error_msg.as_mut_ptr(),
            error_msg.len(),
        );
        check(result, &error_msg)
    }

    /// Enqueue `batch_size` samples on an implicit-batch engine
    ///
    /// # Safety
    ///
    /// `bindings` must hold one device pointer per engine I/O tensor, in
    /// engine order, each large enough for `batch_size` samples, and stay
    /// valid until the stream has been synchronized.
    pub unsafe fn enqueue(
        &mut self,
        batch_size: i32,
        bindings: &[*mut c_void],
        cuda_stream: *mut c_void,
    ) -> Result<()> {
        if bindings.is_empty() {
            return Err(Error::InvalidArgument("no bindings to enqueue".to_string()));
        }
        let mut error_msg = error_buffer();

        let result = nvtrt_execution_context_enqueue(
            self.inner,
            batch_size,
            bindings.as_ptr(),
            cuda_stream,
            error_msg.as_mut_ptr(),
            error_msg.len(),
        );
        check(result, &error_msg)
    }
}

impl Drop for ExecutionContext<'_> {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_execution_context_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for ExecutionContext<'_> {}

/// Runtime for deserializing engines
pub struct Runtime<'a> {
    inner: *mut NvtrtRuntime,
    _logger: &'a Logger,
}

impl<'a> Runtime<'a> {
    /// Create a new runtime
    pub fn new(logger: &'a Logger) -> Result<Self> {
        let mut runtime_ptr: *mut NvtrtRuntime = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_runtime_create(
                logger.as_ptr(),
                &mut runtime_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(Runtime {
            inner: runtime_ptr,
            _logger: logger,
        })
    }

    /// Deserialize a CUDA engine from serialized data
    pub fn deserialize_cuda_engine(&self, data: &[u8]) -> Result<CudaEngine> {
        let mut engine_ptr: *mut NvtrtCudaEngine = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_runtime_deserialize_cuda_engine(
                self.inner,
                data.as_ptr() as *const c_void,
                data.len(),
                &mut engine_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(CudaEngine { inner: engine_ptr })
    }
}

impl Drop for Runtime<'_> {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_runtime_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for Runtime<'_> {}
