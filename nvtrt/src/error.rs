//! Error types for TensorRT operations

use std::ffi::NulError;
use std::os::raw::c_char;
use thiserror::Error;

/// Result type for TensorRT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Size of the message buffer handed to every fallible FFI call.
pub(crate) const ERROR_MSG_LEN: usize = 1024;

/// Errors that can occur when using TensorRT
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument provided to function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Out of memory
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// Runtime error from TensorRT
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// CUDA error
    #[error("CUDA error: {0}")]
    Cuda(String),

    /// A named tensor, blob or binding does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// String conversion error
    #[error("String conversion error: {0}")]
    StringConversion(#[from] NulError),

    /// UTF-8 conversion error
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create error from FFI error code and message buffer
    pub(crate) fn from_ffi(code: i32, error_msg: &[c_char]) -> Self {
        let msg = Self::parse_error_msg(error_msg);

        match code {
            code if code == nvtrt_sys::NVTRT_ERROR_INVALID_ARGUMENT as i32 => {
                Error::InvalidArgument(msg)
            }
            code if code == nvtrt_sys::NVTRT_ERROR_OUT_OF_MEMORY as i32 => Error::OutOfMemory(msg),
            code if code == nvtrt_sys::NVTRT_ERROR_RUNTIME_ERROR as i32 => Error::Runtime(msg),
            code if code == nvtrt_sys::NVTRT_ERROR_CUDA_ERROR as i32 => Error::Cuda(msg),
            code if code == nvtrt_sys::NVTRT_ERROR_NOT_FOUND as i32 => Error::NotFound(msg),
            _ => Error::Unknown(msg),
        }
    }

    /// Parse error message from C string buffer
    fn parse_error_msg(buffer: &[c_char]) -> String {
        // Find null terminator
        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());

        let bytes: Vec<u8> = buffer[..len].iter().map(|&c| c as u8).collect();

        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Turn an FFI status code into a `Result`.
pub(crate) fn check(code: i32, error_msg: &[c_char]) -> Result<()> {
    if code == nvtrt_sys::NVTRT_SUCCESS as i32 {
        Ok(())
    } else {
        Err(Error::from_ffi(code, error_msg))
    }
}

/// A zeroed message buffer for one FFI call.
pub(crate) fn error_buffer() -> [c_char; ERROR_MSG_LEN] {
    [0; ERROR_MSG_LEN]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_message(text: &[u8]) -> Vec<c_char> {
        text.iter().map(|&b| b as c_char).collect()
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("test".to_string());
        assert_eq!(err.to_string(), "Invalid argument: test");

        let err = Error::NotFound("prob".to_string());
        assert_eq!(err.to_string(), "Not found: prob");
    }

    #[test]
    fn test_parse_error_msg() {
        let msg = c_message(b"test error\0garbage");
        let parsed = Error::parse_error_msg(&msg);
        assert_eq!(parsed, "test error");
    }

    #[test]
    fn test_parse_error_msg_without_terminator() {
        let msg = c_message(b"truncated");
        assert_eq!(Error::parse_error_msg(&msg), "truncated");
    }

    #[test]
    fn test_from_ffi() {
        let msg = c_message(b"test\0");
        let err = Error::from_ffi(nvtrt_sys::NVTRT_ERROR_INVALID_ARGUMENT as i32, &msg);
        match err {
            Error::InvalidArgument(s) => assert_eq!(s, "test"),
            _ => panic!("Wrong error type"),
        }

        let err = Error::from_ffi(nvtrt_sys::NVTRT_ERROR_CUDA_ERROR as i32, &msg);
        assert!(matches!(err, Error::Cuda(_)));

        let err = Error::from_ffi(12345, &msg);
        assert!(matches!(err, Error::Unknown(_)));
    }

    #[test]
    fn test_check() {
        let msg = error_buffer();
        assert!(check(nvtrt_sys::NVTRT_SUCCESS as i32, &msg).is_ok());
        assert!(matches!(
            check(nvtrt_sys::NVTRT_ERROR_RUNTIME_ERROR as i32, &msg),
            Err(Error::Runtime(_))
        ));
    }
}
