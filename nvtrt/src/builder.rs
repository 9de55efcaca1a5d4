//! Builder for creating TensorRT engines

use crate::error::{check, error_buffer, Error, Result};
use crate::logger::Logger;
use crate::network::NetworkDefinition;
use nvtrt_sys::*;

/// Network definition builder flags
pub mod network_flags {
    /// Explicit batch sizes
    pub const EXPLICIT_BATCH: u32 = 1 << 0;
}

/// Memory pool types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MemoryPoolType {
    /// Workspace memory
    Workspace = 0,
    /// DLA managed SRAM
    DlaManagedSram = 1,
    /// DLA local DRAM
    DlaLocalDram = 2,
    /// DLA global DRAM
    DlaGlobalDram = 3,
}

/// Build options toggled on a [`BuilderConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BuilderFlag {
    /// Allow FP16 kernels
    Fp16 = 0,
    /// Allow INT8 kernels
    Int8 = 1,
    /// Synchronize after every layer
    Debug = 2,
    /// Run layers the DLA can't handle on the GPU
    GpuFallback = 3,
    /// Honor requested layer precisions
    StrictTypes = 4,
    /// Build a refittable engine
    Refit = 5,
    /// Skip the timing cache
    DisableTimingCache = 6,
    /// Allow TF32 math
    Tf32 = 7,
}

/// Device a layer executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum DeviceType {
    /// GPU
    Gpu = 0,
    /// Deep learning accelerator
    Dla = 1,
}

/// Builder configuration
pub struct BuilderConfig {
    inner: *mut NvtrtBuilderConfig,
}

impl BuilderConfig {
    /// Set memory pool limit
    pub fn set_memory_pool_limit(&mut self, pool: MemoryPoolType, size: usize) -> Result<()> {
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_builder_config_set_memory_pool_limit(
                self.inner,
                pool as i32,
                size,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)
    }

    /// Enable a build option
    pub fn set_flag(&mut self, flag: BuilderFlag) {
        unsafe { nvtrt_builder_config_set_flag(self.inner, flag as i32) }
    }

    /// Disable a build option
    pub fn clear_flag(&mut self, flag: BuilderFlag) {
        unsafe { nvtrt_builder_config_clear_flag(self.inner, flag as i32) }
    }

    /// Whether a build option is enabled
    pub fn get_flag(&self, flag: BuilderFlag) -> bool {
        unsafe { nvtrt_builder_config_get_flag(self.inner, flag as i32) != 0 }
    }

    /// Device used for layers without an explicit placement
    pub fn set_default_device_type(&mut self, device_type: DeviceType) {
        unsafe { nvtrt_builder_config_set_default_device_type(self.inner, device_type as i32) }
    }

    /// DLA core used when the default device is [`DeviceType::Dla`]
    pub fn set_dla_core(&mut self, dla_core: i32) {
        unsafe { nvtrt_builder_config_set_dla_core(self.inner, dla_core) }
    }

    pub fn default_device_type(&self) -> DeviceType {
        match unsafe { nvtrt_builder_config_get_default_device_type(self.inner) } {
            1 => DeviceType::Dla,
            _ => DeviceType::Gpu,
        }
    }

    pub fn dla_core(&self) -> i32 {
        unsafe { nvtrt_builder_config_get_dla_core(self.inner) }
    }

    /// Get the raw pointer (for internal use)
    pub(crate) fn as_ptr(&self) -> *mut NvtrtBuilderConfig {
        self.inner
    }
}

impl Drop for BuilderConfig {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_builder_config_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for BuilderConfig {}

/// Builder for creating optimized TensorRT engines
pub struct Builder<'a> {
    inner: *mut NvtrtBuilder,
    _logger: &'a Logger,
}

impl<'a> Builder<'a> {
    /// Create a new builder
    pub fn new(logger: &'a Logger) -> Result<Self> {
        let mut builder_ptr: *mut NvtrtBuilder = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_builder_create(
                logger.as_ptr(),
                &mut builder_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(Builder {
            inner: builder_ptr,
            _logger: logger,
        })
    }

    /// Create a network definition
    ///
    /// Pass [`network_flags::EXPLICIT_BATCH`] for ONNX models, `0` for
    /// implicit-batch (Caffe) networks.
    pub fn create_network(&self, flags: u32) -> Result<NetworkDefinition> {
        let mut network_ptr: *mut NvtrtNetworkDefinition = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_builder_create_network(
                self.inner,
                flags,
                &mut network_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(NetworkDefinition::from_raw(network_ptr))
    }

    /// Create a builder configuration
    pub fn create_config(&self) -> Result<BuilderConfig> {
        let mut config_ptr: *mut NvtrtBuilderConfig = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_builder_create_builder_config(
                self.inner,
                &mut config_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(BuilderConfig { inner: config_ptr })
    }

    /// Largest batch an implicit-batch engine will accept
    pub fn set_max_batch_size(&mut self, batch_size: i32) {
        unsafe { nvtrt_builder_set_max_batch_size(self.inner, batch_size) }
    }

    /// Number of DLA cores on this platform
    pub fn nb_dla_cores(&self) -> i32 {
        unsafe { nvtrt_builder_get_nb_dla_cores(self.inner) }
    }

    /// Whether the platform has native FP16 support
    pub fn platform_has_fast_fp16(&self) -> bool {
        unsafe { nvtrt_builder_platform_has_fast_fp16(self.inner) != 0 }
    }

    /// Whether the platform has native INT8 support
    pub fn platform_has_fast_int8(&self) -> bool {
        unsafe { nvtrt_builder_platform_has_fast_int8(self.inner) != 0 }
    }

    /// Build a serialized network (engine)
    pub fn build_serialized_network(
        &self,
        network: &NetworkDefinition,
        config: &BuilderConfig,
    ) -> Result<Vec<u8>> {
        let mut data_ptr: *mut std::ffi::c_void = std::ptr::null_mut();
        let mut size: usize = 0;
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_builder_build_serialized_network(
                self.inner,
                network.as_ptr(),
                config.as_ptr(),
                &mut data_ptr,
                &mut size,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        // Copy data to Vec and free C buffer
        let data = unsafe {
            let slice = std::slice::from_raw_parts(data_ptr as *const u8, size);
            let vec = slice.to_vec();
            nvtrt_free_buffer(data_ptr);
            vec
        };

        Ok(data)
    }
}

impl Drop for Builder<'_> {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_builder_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for Builder<'_> {}

/// Route the build onto a DLA core.
///
/// A negative `dla_core` leaves the configuration untouched. Otherwise the
/// default device becomes the DLA, strict types are enforced and FP16 is
/// enabled unless the config already asks for INT8.
pub fn enable_dla(
    builder: &Builder<'_>,
    config: &mut BuilderConfig,
    dla_core: i32,
    allow_gpu_fallback: bool,
) -> Result<()> {
    if dla_core < 0 {
        return Ok(());
    }
    let available = builder.nb_dla_cores();
    if available == 0 {
        return Err(Error::InvalidArgument(format!(
            "DLA core {dla_core} requested but the platform has no DLA cores"
        )));
    }
    if dla_core >= available {
        return Err(Error::InvalidArgument(format!(
            "DLA core {dla_core} requested but only {available} are available"
        )));
    }
    if allow_gpu_fallback {
        config.set_flag(BuilderFlag::GpuFallback);
    }
    if !config.get_flag(BuilderFlag::Int8) {
        // User has not requested INT8 mode.
        config.set_flag(BuilderFlag::Fp16);
    }
    config.set_default_device_type(DeviceType::Dla);
    config.set_dla_core(dla_core);
    config.set_flag(BuilderFlag::StrictTypes);
    Ok(())
}
