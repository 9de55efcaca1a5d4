//! Logger interface for TensorRT

use crate::error::{check, error_buffer, Result};
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use nvtrt_sys::*;

/// Severity level for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Severity {
    /// Internal error (most severe)
    InternalError = NvtrtSeverity::NVTRT_SEVERITY_INTERNAL_ERROR as i32,
    /// Error
    Error = NvtrtSeverity::NVTRT_SEVERITY_ERROR as i32,
    /// Warning
    Warning = NvtrtSeverity::NVTRT_SEVERITY_WARNING as i32,
    /// Info
    Info = NvtrtSeverity::NVTRT_SEVERITY_INFO as i32,
    /// Verbose (most detailed)
    Verbose = NvtrtSeverity::NVTRT_SEVERITY_VERBOSE as i32,
}

impl Severity {
    fn from_ffi(severity: NvtrtSeverity) -> Self {
        match severity {
            NvtrtSeverity::NVTRT_SEVERITY_INTERNAL_ERROR => Severity::InternalError,
            NvtrtSeverity::NVTRT_SEVERITY_ERROR => Severity::Error,
            NvtrtSeverity::NVTRT_SEVERITY_WARNING => Severity::Warning,
            NvtrtSeverity::NVTRT_SEVERITY_INFO => Severity::Info,
            NvtrtSeverity::NVTRT_SEVERITY_VERBOSE => Severity::Verbose,
        }
    }
}

/// Trait for handling log messages from TensorRT
pub trait LogHandler: Send + Sync {
    /// Called when TensorRT emits a log message
    fn log(&self, severity: Severity, message: &str);
}

/// Default logger that prints to stderr
#[derive(Debug)]
pub struct StderrLogger;

impl LogHandler for StderrLogger {
    fn log(&self, severity: Severity, message: &str) {
        eprintln!("[TensorRT {:?}] {}", severity, message);
    }
}

const ANSI_RED: &str = "\x1b[38;5;9m";
const ANSI_YELLOW: &str = "\x1b[38;5;11m";
const ANSI_GREEN: &str = "\x1b[38;5;10m";
const ANSI_RESET: &str = "\x1b[0m";

/// Stderr logger with ANSI colors that drops messages less severe than a threshold.
#[derive(Debug, Clone, Copy)]
pub struct ColorLogger {
    max_severity: Severity,
}

impl ColorLogger {
    /// Emit messages at `max_severity` and everything more severe.
    pub fn new(max_severity: Severity) -> Self {
        Self { max_severity }
    }

    /// Severity threshold of this logger.
    pub fn max_severity(&self) -> Severity {
        self.max_severity
    }

    /// The colored line for `message`, or `None` if it is filtered out.
    pub fn format(&self, severity: Severity, message: &str) -> Option<String> {
        if severity > self.max_severity {
            return None;
        }
        let (color, prefix) = match severity {
            Severity::InternalError => (ANSI_RED, "TRTInternalError: "),
            Severity::Error => (ANSI_RED, "TRTError: "),
            Severity::Warning => (ANSI_YELLOW, "TRTWarning: "),
            Severity::Info | Severity::Verbose => (ANSI_GREEN, "TRT: "),
        };
        Some(format!("{color}{prefix}{message}{ANSI_RESET}"))
    }
}

impl Default for ColorLogger {
    fn default() -> Self {
        Self::new(Severity::Warning)
    }
}

impl LogHandler for ColorLogger {
    fn log(&self, severity: Severity, message: &str) {
        if let Some(line) = self.format(severity, message) {
            eprintln!("{line}");
        }
    }
}

/// Logger wrapper that interfaces with TensorRT
pub struct Logger {
    inner: *mut NvtrtLogger,
    // The callback receives a pointer to the inner box, so it must stay put on the heap.
    _handler: Box<Box<dyn LogHandler>>,
}

impl Logger {
    /// Create a new logger with a custom handler
    pub fn new<H: LogHandler + 'static>(handler: H) -> Result<Self> {
        let handler: Box<Box<dyn LogHandler>> = Box::new(Box::new(handler));
        let user_data = &*handler as *const Box<dyn LogHandler> as *mut c_void;

        let mut logger_ptr: *mut NvtrtLogger = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_logger_create(
                Some(Self::log_callback),
                user_data,
                &mut logger_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(Logger {
            inner: logger_ptr,
            _handler: handler,
        })
    }

    /// Create a logger that prints to stderr
    pub fn stderr() -> Result<Self> {
        Self::new(StderrLogger)
    }

    /// Create a colored stderr logger showing warnings and errors
    pub fn colored() -> Result<Self> {
        Self::new(ColorLogger::default())
    }

    /// Get the raw pointer (for internal use)
    pub(crate) fn as_ptr(&self) -> *mut NvtrtLogger {
        self.inner
    }

    /// C callback function that bridges to Rust trait
    unsafe extern "C" fn log_callback(
        user_data: *mut c_void,
        severity: NvtrtSeverity,
        msg: *const c_char,
    ) {
        if user_data.is_null() || msg.is_null() {
            return;
        }

        let handler = &*(user_data as *const Box<dyn LogHandler>);
        let msg_str = CStr::from_ptr(msg);

        if let Ok(msg) = msg_str.to_str() {
            handler.log(Severity::from_ffi(severity), msg);
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_logger_destroy(self.inner);
            }
        }
    }
}

// Logger must be Send and Sync to be used across threads
unsafe impl Send for Logger {}
unsafe impl Sync for Logger {}
