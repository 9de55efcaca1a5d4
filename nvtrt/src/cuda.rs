//! CUDA memory and stream management utilities

use crate::error::{check, error_buffer, Error, Result};
use nvtrt_sys::*;
use std::ffi::c_void;

/// RAII wrapper for CUDA device memory
pub struct DeviceBuffer {
    ptr: *mut c_void,
    size: usize,
}

impl DeviceBuffer {
    /// Allocate CUDA device memory
    pub fn new(size: usize) -> Result<Self> {
        let mut ptr: *mut c_void = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result =
            unsafe { nvtrt_cuda_malloc(&mut ptr, size, error_msg.as_mut_ptr(), error_msg.len()) };
        check(result, &error_msg)?;

        Ok(DeviceBuffer { ptr, size })
    }

    /// Get the raw device pointer
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr
    }

    /// Get the size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len > self.size {
            return Err(Error::InvalidArgument(format!(
                "{len} bytes exceed the {} byte device buffer",
                self.size
            )));
        }
        Ok(())
    }

    /// Copy data from host to device
    pub fn copy_from_host(&mut self, data: &[u8]) -> Result<()> {
        self.check_len(data.len())?;
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_memcpy_host_to_device(
                self.ptr,
                data.as_ptr() as *const c_void,
                data.len(),
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)
    }

    /// Copy data from device to host
    pub fn copy_to_host(&self, data: &mut [u8]) -> Result<()> {
        self.check_len(data.len())?;
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_memcpy_device_to_host(
                data.as_mut_ptr() as *mut c_void,
                self.ptr,
                data.len(),
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)
    }

    /// Queue a host to device copy on `stream`
    ///
    /// # Safety
    ///
    /// `data` must not be moved, freed or written until `stream` has been
    /// synchronized.
    pub unsafe fn copy_from_host_async(&mut self, data: &[u8], stream: &Stream) -> Result<()> {
        self.check_len(data.len())?;
        let mut error_msg = error_buffer();

        let result = nvtrt_cuda_memcpy_host_to_device_async(
            self.ptr,
            data.as_ptr() as *const c_void,
            data.len(),
            stream.as_ptr(),
            error_msg.as_mut_ptr(),
            error_msg.len(),
        );
        check(result, &error_msg)
    }

    /// Queue a device to host copy on `stream`
    ///
    /// # Safety
    ///
    /// `data` must stay valid and must not be read until `stream` has been
    /// synchronized.
    pub unsafe fn copy_to_host_async(&self, data: &mut [u8], stream: &Stream) -> Result<()> {
        self.check_len(data.len())?;
        let mut error_msg = error_buffer();

        let result = nvtrt_cuda_memcpy_device_to_host_async(
            data.as_mut_ptr() as *mut c_void,
            self.ptr,
            data.len(),
            stream.as_ptr(),
            error_msg.as_mut_ptr(),
            error_msg.len(),
        );
        check(result, &error_msg)
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            let mut error_msg = error_buffer();
            unsafe {
                let _ = nvtrt_cuda_free(self.ptr, error_msg.as_mut_ptr(), error_msg.len());
            }
        }
    }
}

unsafe impl Send for DeviceBuffer {}

/// RAII wrapper for a CUDA stream
pub struct Stream {
    inner: *mut c_void,
}

impl Stream {
    pub fn new() -> Result<Self> {
        let mut inner: *mut c_void = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result =
            unsafe { nvtrt_cuda_stream_create(&mut inner, error_msg.as_mut_ptr(), error_msg.len()) };
        check(result, &error_msg)?;

        Ok(Stream { inner })
    }

    /// Block until all work queued on this stream has finished
    pub fn synchronize(&self) -> Result<()> {
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_cuda_stream_synchronize(self.inner, error_msg.as_mut_ptr(), error_msg.len())
        };
        check(result, &error_msg)
    }

    /// Raw `cudaStream_t` handle
    pub fn as_ptr(&self) -> *mut c_void {
        self.inner
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            let mut error_msg = error_buffer();
            unsafe {
                let _ = nvtrt_cuda_stream_destroy(self.inner, error_msg.as_mut_ptr(), error_msg.len());
            }
        }
    }
}

unsafe impl Send for Stream {}

/// Synchronize CUDA device
pub fn synchronize() -> Result<()> {
    let mut error_msg = error_buffer();

    let result = unsafe { nvtrt_cuda_synchronize(error_msg.as_mut_ptr(), error_msg.len()) };
    check(result, &error_msg)
}

/// Get the default CUDA stream
pub fn get_default_stream() -> *mut c_void {
    unsafe { nvtrt_cuda_get_default_stream() }
}
