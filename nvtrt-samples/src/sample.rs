//! Build, infer and teardown phases shared by every sample.

use crate::config::SampleConfig;
use crate::error::{Phase, SampleError};
use nvtrt::{
    enable_dla, BufferManager, Builder, BuilderConfig, BuilderFlag, CaffeParser, CudaEngine, Dims,
    ExecutionContext, Logger, MemoryPoolType, NetworkDefinition, OnnxParser, Runtime, Stream,
};
use std::path::{Path, PathBuf};

/// Parser that populated a network.
///
/// Parsers own the weights they hand to the network, so the runner keeps
/// this alive until the engine has been serialized.
pub enum NetworkSource<'n> {
    Onnx(OnnxParser<'n>),
    Caffe(CaffeParser),
}

/// Settings that shape a serialized engine.
#[derive(serde::Serialize)]
struct EngineKey<'a> {
    sample: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prototxt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caffemodel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    onnx_model: Option<&'a str>,
    input_tensor_names: &'a [String],
    output_tensor_names: &'a [String],
    batch_size: i32,
    dla_core: i32,
    int8: bool,
    fp16: bool,
    workspace_size: usize,
}

impl<'a> EngineKey<'a> {
    fn new(sample: &'a str, config: &'a SampleConfig) -> Self {
        Self {
            sample,
            prototxt: config.prototxt.as_deref(),
            caffemodel: config.caffemodel.as_deref(),
            mean_file: config.mean_file.as_deref(),
            onnx_model: config.onnx_model.as_deref(),
            input_tensor_names: &config.input_tensor_names,
            output_tensor_names: &config.output_tensor_names,
            batch_size: config.batch_size,
            dla_core: config.dla_core,
            int8: config.int8,
            fp16: config.fp16,
            workspace_size: config.workspace_size,
        }
    }

    fn to_toml(&self) -> Result<String, SampleError> {
        toml::to_string(self).map_err(|e| SampleError::Config(format!("TOML serialise error: {e}")))
    }
}

/// `<engine>.key`, next to the cached engine.
fn key_path(engine: &Path) -> PathBuf {
    let mut path = engine.as_os_str().to_owned();
    path.push(".key");
    PathBuf::from(path)
}

/// A model-specific sample driven by [`SampleRunner`].
pub trait Sample {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    fn config(&self) -> &SampleConfig;

    /// Flags passed to [`Builder::create_network`]. Implicit batch by default.
    fn network_flags(&self) -> u32 {
        0
    }

    /// Populate `network` and adjust `config` for this model.
    fn build_network<'n>(
        &mut self,
        builder: &Builder<'_>,
        network: &'n NetworkDefinition,
        config: &mut BuilderConfig,
        logger: &'n Logger,
    ) -> Result<NetworkSource<'n>, SampleError>;

    /// Fill the host input buffers.
    fn process_input(&mut self, buffers: &mut BufferManager) -> Result<(), SampleError>;

    /// Check the host output buffers, `Ok(false)` for a wrong answer.
    fn verify_output(&self, buffers: &BufferManager) -> Result<bool, SampleError>;

    fn teardown(&mut self) -> Result<(), SampleError> {
        Ok(())
    }
}

/// Height and width of an image tensor, taken from its last two extents.
pub fn image_hw(dims: &Dims) -> Result<(usize, usize), SampleError> {
    match dims.extents() {
        [.., h, w] if *h > 0 && *w > 0 => Ok((*h as usize, *w as usize)),
        _ => Err(SampleError::Network(format!(
            "expected an image tensor, got shape {dims}"
        ))),
    }
}

/// Owns the engine of one sample across its phases.
pub struct SampleRunner<'l, S: Sample> {
    // Dropped before the runtime that deserialized it.
    engine: Option<CudaEngine>,
    runtime: Option<Runtime<'l>>,
    logger: &'l Logger,
    sample: S,
}

impl<'l, S: Sample> SampleRunner<'l, S> {
    pub fn new(sample: S, logger: &'l Logger) -> Self {
        Self {
            engine: None,
            runtime: None,
            logger,
            sample,
        }
    }

    pub fn sample(&self) -> &S {
        &self.sample
    }

    pub fn sample_mut(&mut self) -> &mut S {
        &mut self.sample
    }

    /// The deserialized engine, once [`build`](Self::build) has succeeded.
    pub fn engine(&self) -> Option<&CudaEngine> {
        self.engine.as_ref()
    }

    /// Build or load the engine and deserialize it.
    ///
    /// An existing engine cache file built with the current settings is
    /// loaded as is and the network is not constructed. Otherwise the freshly
    /// built engine is written to the cache path, if one is configured, next
    /// to a `.key` file recording the settings it was built with.
    pub fn build(&mut self) -> Result<(), SampleError> {
        let engine_data = match self.cached_engine()? {
            Some(data) => data,
            None => {
                let data = self.build_engine()?;
                if let Some(path) = &self.sample.config().engine_cache {
                    std::fs::write(path, &data)?;
                    std::fs::write(key_path(path), self.engine_key()?)?;
                    tracing::info!("saved engine to {}", path.display());
                }
                data
            }
        };

        self.engine = None;
        let runtime = self.runtime.insert(Runtime::new(self.logger)?);
        let engine = runtime.deserialize_cuda_engine(&engine_data)?;
        tracing::debug!(
            "{}: engine has {} I/O tensors",
            self.sample.name(),
            engine.get_nb_io_tensors()?
        );
        self.engine = Some(engine);
        Ok(())
    }

    fn engine_key(&self) -> Result<String, SampleError> {
        EngineKey::new(self.sample.name(), self.sample.config()).to_toml()
    }

    fn cached_engine(&self) -> Result<Option<Vec<u8>>, SampleError> {
        let Some(path) = &self.sample.config().engine_cache else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        match std::fs::read_to_string(key_path(path)) {
            Ok(recorded) if recorded != self.engine_key()? => {
                tracing::warn!(
                    "cached engine {} was built with other settings, rebuilding",
                    path.display()
                );
                return Ok(None);
            }
            Ok(_) => {}
            Err(_) => tracing::warn!(
                "no build settings recorded for {}, reusing it as is",
                path.display()
            ),
        }
        tracing::info!("loading cached engine from {}", path.display());
        Ok(Some(std::fs::read(path)?))
    }

    fn build_engine(&mut self) -> Result<Vec<u8>, SampleError> {
        let logger = self.logger;
        tracing::info!("building {} engine", self.sample.name());

        let mut builder = Builder::new(logger)?;
        let network = builder.create_network(self.sample.network_flags())?;
        let mut config = builder.create_config()?;
        let source = self
            .sample
            .build_network(&builder, &network, &mut config, logger)?;
        tracing::debug!(
            "network has {} inputs, {} outputs, {} layers",
            network.nb_inputs(),
            network.nb_outputs(),
            network.nb_layers()
        );

        let settings = self.sample.config();
        builder.set_max_batch_size(settings.batch_size);
        config.set_memory_pool_limit(MemoryPoolType::Workspace, settings.workspace_size)?;
        config.set_flag(BuilderFlag::GpuFallback);
        config.set_flag(BuilderFlag::StrictTypes);
        if settings.int8 {
            if !builder.platform_has_fast_int8() {
                tracing::warn!("platform has no fast INT8, building anyway");
            }
            config.set_flag(BuilderFlag::Int8);
        }
        if settings.fp16 {
            if !builder.platform_has_fast_fp16() {
                tracing::warn!("platform has no fast FP16, building anyway");
            }
            config.set_flag(BuilderFlag::Fp16);
        }
        enable_dla(&builder, &mut config, settings.dla_core, true)?;

        let data = builder.build_serialized_network(&network, &config)?;
        drop(source);
        tracing::info!("engine serialized ({} bytes)", data.len());
        Ok(data)
    }

    /// Run one inference and verify the result.
    pub fn infer(&mut self) -> Result<bool, SampleError> {
        let engine = self.engine.as_ref().ok_or(SampleError::NotBuilt)?;
        let mut buffers = BufferManager::new(engine, self.sample.config().batch_size)?;
        let mut context = engine.create_execution_context()?;
        self.sample.process_input(&mut buffers)?;

        let stream = Stream::new()?;
        // Synchronize before looking at the result so no copy is still in
        // flight when `buffers` goes away.
        let queued = unsafe { enqueue(&mut buffers, &mut context, &stream) };
        stream.synchronize()?;
        queued?;

        self.sample.verify_output(&buffers)
    }

    pub fn teardown(&mut self) -> Result<(), SampleError> {
        self.sample.teardown()
    }

    /// Run every phase, printing a line for each one that fails.
    ///
    /// Inference is not attempted without an engine but is still reported
    /// as failed. Returns the first failed phase.
    pub fn run(&mut self) -> Result<(), SampleError> {
        let name = self.sample.name().to_string();
        let mut failed = Vec::new();

        let built = match self.build() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{name}: build: {e}");
                failed.push(Phase::Build);
                false
            }
        };

        let inferred = if built {
            match self.infer() {
                Ok(correct) => {
                    if !correct {
                        tracing::error!("{name}: output verification failed");
                    }
                    correct
                }
                Err(e) => {
                    tracing::error!("{name}: infer: {e}");
                    false
                }
            }
        } else {
            false
        };
        if !inferred {
            failed.push(Phase::Infer);
        }

        if let Err(e) = self.teardown() {
            tracing::error!("{name}: teardown: {e}");
            failed.push(Phase::Teardown);
        }

        for phase in &failed {
            println!("{}", SampleError::PhaseFailed(*phase));
        }
        match failed.first() {
            Some(phase) => Err(SampleError::PhaseFailed(*phase)),
            None => Ok(()),
        }
    }
}

/// Queue H2D copies, the inference and D2H copies on `stream`.
///
/// # Safety
///
/// `stream` must be synchronized before `buffers` is dropped or its host
/// memory is touched.
unsafe fn enqueue(
    buffers: &mut BufferManager,
    context: &mut ExecutionContext<'_>,
    stream: &Stream,
) -> Result<(), SampleError> {
    buffers.copy_input_to_device_async(stream)?;
    if buffers.has_implicit_batch() {
        let bindings = buffers.device_bindings();
        context.enqueue(buffers.batch_size(), &bindings, stream.as_ptr())?;
    } else {
        buffers.bind(context)?;
        context.enqueue_v3(stream.as_ptr())?;
    }
    buffers.copy_output_to_host_async(stream)?;
    Ok(())
}
