//! # trt-sample
//!
//! Command-line runner for the TensorRT samples.
//!
//! ## Usage
//! ```bash
//! # Classify data/mnist/3.pgm with the Caffe model
//! trt-sample mnist-caffe
//!
//! # ONNX MNIST in FP16, caching the engine
//! trt-sample mnist-onnx --digit 7 --fp16 --engine-cache mnist.engine
//!
//! # YOLOv3 on a custom image, with settings from a file
//! trt-sample -c yolo.toml yolov3 --image street.ppm --dump-input input.ppm
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use nvtrt::Logger;
use nvtrt_samples::{
    init_tracing, MnistCaffe, MnistOnnx, Sample, SampleConfig, SampleRunner, TracingLogger,
    Yolov3Onnx,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "trt-sample",
    about = "Build and run TensorRT sample networks",
    version
)]
struct Cli {
    /// TOML configuration file; its keys override the sample defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print TensorRT messages as colored `TRT` lines instead of through the log.
    #[arg(long, global = true)]
    color_log: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every sample; each one overrides the configuration.
#[derive(Args)]
struct BuildArgs {
    /// Directory searched before the configured data directories.
    #[arg(short, long)]
    data_dir: Vec<PathBuf>,

    /// Allow FP16 kernels.
    #[arg(long)]
    fp16: bool,

    /// Allow INT8 kernels.
    #[arg(long)]
    int8: bool,

    /// DLA core to run on; the GPU when omitted.
    #[arg(long)]
    dla_core: Option<i32>,

    /// Serialized engine to load, or to write after building.
    #[arg(long)]
    engine_cache: Option<PathBuf>,
}

impl BuildArgs {
    fn apply(self, config: &mut SampleConfig) {
        if !self.data_dir.is_empty() {
            let mut dirs = self.data_dir;
            dirs.append(&mut config.data_dirs);
            config.data_dirs = dirs;
        }
        config.fp16 |= self.fp16;
        config.int8 |= self.int8;
        if let Some(core) = self.dla_core {
            config.dla_core = core;
        }
        if self.engine_cache.is_some() {
            config.engine_cache = self.engine_cache;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// MNIST classifier from Caffe prototxt, weights and mean image.
    MnistCaffe {
        #[command(flatten)]
        build: BuildArgs,

        /// Digit whose `<digit>.pgm` is classified.
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=9))]
        digit: u8,
    },

    /// MNIST classifier from an ONNX model.
    MnistOnnx {
        #[command(flatten)]
        build: BuildArgs,

        /// Digit whose `<digit>.pgm` is classified.
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=9))]
        digit: u8,
    },

    /// YOLOv3 detector from an ONNX model.
    Yolov3 {
        #[command(flatten)]
        build: BuildArgs,

        /// PPM image to run on, instead of the configured one.
        #[arg(long)]
        image: Option<String>,

        /// Write the preprocessed input image to this PPM file.
        #[arg(long)]
        dump_input: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>, defaults: fn() -> SampleConfig) -> anyhow::Result<SampleConfig> {
    match path {
        Some(path) => defaults()
            .overlay_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(defaults()),
    }
}

fn run<S: Sample>(sample: S, logger: &Logger) -> anyhow::Result<()> {
    tracing::info!("running {}", sample.name());
    SampleRunner::new(sample, logger).run()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let logger = if cli.color_log {
        Logger::colored()
    } else {
        Logger::new(TracingLogger)
    }
    .context("creating TensorRT logger")?;
    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::MnistCaffe { build, digit } => {
            let mut config = load_config(config_path, SampleConfig::mnist_caffe)?;
            build.apply(&mut config);
            run(MnistCaffe::new(config).with_digit(digit), &logger)
        }
        Commands::MnistOnnx { build, digit } => {
            let mut config = load_config(config_path, SampleConfig::mnist_onnx)?;
            build.apply(&mut config);
            run(MnistOnnx::new(config).with_digit(digit), &logger)
        }
        Commands::Yolov3 {
            build,
            image,
            dump_input,
        } => {
            let mut config = load_config(config_path, SampleConfig::yolov3_onnx)?;
            build.apply(&mut config);
            if image.is_some() {
                config.image = image;
            }
            let mut sample = Yolov3Onnx::new(config);
            if let Some(path) = dump_input {
                sample = sample.with_dump_input(path);
            }
            run(sample, &logger)
        }
    }
}
