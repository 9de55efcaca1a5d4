//! End-to-end runs of every sample against the host-memory SDK.
//!
//! Models are mock descriptors: enqueueing copies the leading input values
//! into each output, so an image with one bright pixel at index `d` is
//! classified as digit `d`.

#![cfg(feature = "mock")]

use nvtrt::Logger;
use nvtrt_samples::{
    read_ppm, MnistCaffe, MnistOnnx, Phase, SampleConfig, SampleError, SampleRunner,
    TracingLogger, Yolov3Onnx,
};
use std::path::Path;
use std::process::Command;

const MNIST_ONNX: &str = "mock-input Input3 1 1 28 28\nmock-output Plus214_Output_0 1 10\n";

fn logger() -> Logger {
    Logger::new(TracingLogger).unwrap()
}

fn write_pgm(dir: &Path, digit: u8, pixels: &[u8]) {
    let mut contents = b"P5\n28 28\n255\n".to_vec();
    contents.extend_from_slice(pixels);
    std::fs::write(dir.join(format!("{digit}.pgm")), contents).unwrap();
}

/// A 28x28 image that is black except for pixel `index`.
fn bright_pixel(index: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; 28 * 28];
    pixels[index] = 255;
    pixels
}

/// A 28x28 image that is white except for pixel `index`.
fn dark_pixel(index: usize) -> Vec<u8> {
    let mut pixels = vec![255u8; 28 * 28];
    pixels[index] = 0;
    pixels
}

fn mnist_onnx_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mnist.onnx"), MNIST_ONNX).unwrap();
    for digit in 0..10u8 {
        write_pgm(dir.path(), digit, &dark_pixel(usize::from(digit)));
    }
    dir
}

fn mnist_onnx_config(dir: &Path) -> SampleConfig {
    SampleConfig {
        data_dirs: vec![dir.to_path_buf()],
        ..SampleConfig::mnist_onnx()
    }
}

#[test]
fn test_mnist_caffe_classifies_digit() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("mnist.prototxt"),
        "mock-input data 1 28 28\nmock-output prob 10\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("mnist.caffemodel"), b"weights").unwrap();
    let mean: Vec<u8> = (0..28 * 28)
        .flat_map(|i| (i as f32 / 784.0).to_ne_bytes())
        .collect();
    std::fs::write(dir.path().join("mnist_mean.binaryproto"), mean).unwrap();
    write_pgm(dir.path(), 3, &bright_pixel(3));

    let config = SampleConfig {
        data_dirs: vec![dir.path().to_path_buf()],
        ..SampleConfig::mnist_caffe()
    };
    let logger = logger();
    let mut runner = SampleRunner::new(MnistCaffe::new(config), &logger);
    runner.build().unwrap();
    assert!(runner.engine().unwrap().has_implicit_batch_dimension());
    assert!(runner.infer().unwrap());
    runner.teardown().unwrap();
}

#[test]
fn test_mnist_caffe_missing_mean() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("mnist.prototxt"),
        "mock-input data 1 28 28\nmock-output prob 10\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("mnist.caffemodel"), b"weights").unwrap();

    let config = SampleConfig {
        data_dirs: vec![dir.path().to_path_buf()],
        ..SampleConfig::mnist_caffe()
    };
    let logger = logger();
    let mut runner = SampleRunner::new(MnistCaffe::new(config), &logger);
    match runner.build().unwrap_err() {
        SampleError::MissingFile { name, .. } => assert_eq!(name, "mnist_mean.binaryproto"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mnist_onnx_every_digit() {
    let dir = mnist_onnx_dir();
    let logger = logger();
    for digit in 0..10 {
        let sample = MnistOnnx::new(mnist_onnx_config(dir.path())).with_digit(digit);
        let mut runner = SampleRunner::new(sample, &logger);
        runner.build().unwrap();
        assert!(runner.infer().unwrap(), "digit {digit}");
    }
}

#[test]
fn test_mnist_onnx_wrong_digit() {
    let dir = mnist_onnx_dir();
    // 5.pgm really shows a 2.
    write_pgm(dir.path(), 5, &dark_pixel(2));
    let logger = logger();
    let sample = MnistOnnx::new(mnist_onnx_config(dir.path())).with_digit(5);
    let mut runner = SampleRunner::new(sample, &logger);
    assert!(matches!(
        runner.run(),
        Err(SampleError::PhaseFailed(Phase::Infer))
    ));
}

#[test]
fn test_mnist_onnx_missing_model() {
    let dir = tempfile::tempdir().unwrap();
    let logger = logger();
    let mut runner = SampleRunner::new(MnistOnnx::new(mnist_onnx_config(dir.path())), &logger);
    assert!(matches!(
        runner.run(),
        Err(SampleError::PhaseFailed(Phase::Build))
    ));
}

#[test]
fn test_mnist_onnx_engine_cache() {
    let dir = mnist_onnx_dir();
    let cache = dir.path().join("mnist.engine");
    let logger = logger();

    let mut config = mnist_onnx_config(dir.path());
    config.engine_cache = Some(cache.clone());
    SampleRunner::new(MnistOnnx::new(config.clone()), &logger)
        .run()
        .unwrap();
    assert!(cache.is_file());

    std::fs::remove_file(dir.path().join("mnist.onnx")).unwrap();
    SampleRunner::new(MnistOnnx::new(config).with_digit(3), &logger)
        .run()
        .unwrap();
}

#[test]
fn test_yolov3_small_network() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("yolov3.onnx"),
        "mock-input 000_net 1 3 4 4\n\
         mock-output 082_convolutional 1 6 2 2\n\
         mock-output 094_convolutional 1 6 2 2\n\
         mock-output 106_convolutional 1 6 4 4\n",
    )
    .unwrap();
    let mut ppm = String::from("P3\n4 4\n255\n");
    for i in 0..16 {
        ppm.push_str(&format!("{} {} {}\n", i * 16, 255 - i * 16, i));
    }
    std::fs::write(dir.path().join("dog.ppm"), &ppm).unwrap();

    let dump = dir.path().join("input.ppm");
    let config = SampleConfig {
        data_dirs: vec![dir.path().to_path_buf()],
        ..SampleConfig::yolov3_onnx()
    };
    let logger = logger();
    let sample = Yolov3Onnx::new(config).with_dump_input(&dump);
    SampleRunner::new(sample, &logger).run().unwrap();

    let original = read_ppm(dir.path().join("dog.ppm")).unwrap();
    let dumped = read_ppm(&dump).unwrap();
    assert_eq!(dumped, original);
}

#[test]
fn test_yolov3_image_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("yolov3.onnx"),
        "mock-input 000_net 1 3 4 4\nmock-output 082_convolutional 1 6 2 2\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("dog.ppm"), "P3\n2 2\n255\n0 0 0\n").unwrap();

    let config = SampleConfig {
        data_dirs: vec![dir.path().to_path_buf()],
        output_tensor_names: vec!["082_convolutional".into()],
        ..SampleConfig::yolov3_onnx()
    };
    let logger = logger();
    let mut runner = SampleRunner::new(Yolov3Onnx::new(config), &logger);
    runner.build().unwrap();
    assert!(matches!(runner.infer(), Err(SampleError::Network(_))));
}

#[test]
fn test_cli_mnist_onnx() {
    let dir = mnist_onnx_dir();
    let output = Command::new(env!("CARGO_BIN_EXE_trt-sample"))
        .arg("mnist-onnx")
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--digit")
        .arg("6")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Input image"));
    assert!(stdout.contains("6: **\n"));
    assert!(!stdout.contains("failed."));
}

#[test]
fn test_cli_reports_failed_phase() {
    let dir = mnist_onnx_dir();
    write_pgm(dir.path(), 4, &dark_pixel(9));
    let output = Command::new(env!("CARGO_BIN_EXE_trt-sample"))
        .args(["mnist-onnx", "--digit", "4", "--data-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success());
    assert!(stdout.contains("sample infer failed."));
    assert!(!stdout.contains("sample build failed."));
}

#[test]
fn test_cli_config_file() {
    let dir = mnist_onnx_dir();
    let config = mnist_onnx_config(dir.path());
    let config_path = dir.path().join("sample.toml");
    std::fs::write(&config_path, config.to_toml().unwrap()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_trt-sample"))
        .arg("-c")
        .arg(&config_path)
        .arg("mnist-onnx")
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn test_cli_partial_config_keeps_defaults() {
    let dir = mnist_onnx_dir();
    let config_path = dir.path().join("fp16.toml");
    std::fs::write(&config_path, "fp16 = true\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_trt-sample"))
        .arg("-c")
        .arg(&config_path)
        .args(["mnist-onnx", "--digit", "8", "--data-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("8: **\n"));
}

#[test]
fn test_cli_rejects_bad_digit() {
    let output = Command::new(env!("CARGO_BIN_EXE_trt-sample"))
        .args(["mnist-onnx", "--digit", "12"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
