//! Raw FFI bindings to NVIDIA TensorRT and the CUDA runtime
//!
//! The bindings target a thin C shim (`wrapper.h`) over the TensorRT C++ API,
//! the ONNX and Caffe parsers, and the handful of CUDA runtime calls needed to
//! move tensors between host and device. For a safe, ergonomic Rust API use the
//! `nvtrt` crate instead.
//!
//! With the `mock` feature the shim is replaced by `mock.c`, a host-memory
//! implementation that needs neither TensorRT nor a GPU.
//!
//! # Safety
//!
//! All functions in this crate are `unsafe` as they directly call into C++ code
//! and perform no safety checks. Callers must ensure:
//!
//! - Pointers are valid and properly aligned
//! - Lifetimes are managed correctly
//! - Thread safety requirements are met
//! - CUDA context is properly initialized

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

#[cfg(not(feature = "mock"))]
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

#[cfg(feature = "mock")]
include!("mock_bindings.rs");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        // Verify error codes are defined
        assert_eq!(NVTRT_SUCCESS, 0);
        assert_ne!(NVTRT_ERROR_INVALID_ARGUMENT, NVTRT_SUCCESS);
        assert_eq!(NVTRT_MAX_DIMS, 8);
    }

    #[test]
    fn test_dims_default_is_empty() {
        let dims = NvtrtDims::default();
        assert_eq!(dims.nb_dims, 0);
        assert!(dims.d.iter().all(|&d| d == 0));
    }

    #[cfg(feature = "mock")]
    #[test]
    fn test_mock_malloc_roundtrip() {
        let mut ptr: *mut std::os::raw::c_void = std::ptr::null_mut();
        let mut error_msg = [0 as std::os::raw::c_char; 256];
        let status = unsafe { nvtrt_cuda_malloc(&mut ptr, 16, error_msg.as_mut_ptr(), error_msg.len()) };
        assert_eq!(status, NVTRT_SUCCESS as i32);
        assert!(!ptr.is_null());
        let status = unsafe { nvtrt_cuda_free(ptr, error_msg.as_mut_ptr(), error_msg.len()) };
        assert_eq!(status, NVTRT_SUCCESS as i32);
    }
}
