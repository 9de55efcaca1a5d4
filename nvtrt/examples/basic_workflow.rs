//! Basic TensorRT workflow example
//!
//! Builds an engine from an ONNX model, saves it to disk, reloads it and
//! runs one inference on a constant input.
//!
//! ```text
//! cargo run -p nvtrt --features mock --example basic_workflow -- model.onnx
//! ```
//!
//! With the `mock` feature the model is a text descriptor such as
//! `mock-input x 1 4` / `mock-output y 1 4`.

use nvtrt::builder::{network_flags, MemoryPoolType};
use nvtrt::{BufferManager, Builder, Logger, OnnxParser, Runtime, Stream};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let model_path = std::env::args()
        .nth(1)
        .ok_or("usage: basic_workflow <model.onnx>")?;

    println!("TensorRT Basic Workflow Example");
    println!("===============================\n");

    let logger = Logger::colored()?;

    println!("1. Building engine from {model_path}...");
    let builder = Builder::new(&logger)?;
    let network = builder.create_network(network_flags::EXPLICIT_BATCH)?;
    let parser = OnnxParser::new(&network, &logger)?;
    parser.parse_from_file(&model_path)?;
    println!(
        "   parsed {} inputs, {} outputs, {} layers",
        network.nb_inputs(),
        network.nb_outputs(),
        network.nb_layers()
    );

    let mut config = builder.create_config()?;
    config.set_memory_pool_limit(MemoryPoolType::Workspace, 16 << 20)?;
    let engine_data = builder.build_serialized_network(&network, &config)?;
    println!("   engine built ({} bytes)", engine_data.len());

    let engine_path = std::env::temp_dir().join("basic_workflow.engine");
    std::fs::write(&engine_path, &engine_data)?;
    println!("   engine saved to {}\n", engine_path.display());

    println!("2. Loading engine for inference...");
    let runtime = Runtime::new(&logger)?;
    let engine = runtime.deserialize_cuda_engine(&std::fs::read(&engine_path)?)?;
    for i in 0..engine.get_nb_io_tensors()? {
        let name = engine.get_tensor_name(i)?;
        println!(
            "   tensor {i}: {name} {} {:?}",
            engine.get_tensor_shape(&name)?,
            engine.get_tensor_io_mode(&name)?
        );
    }

    let mut context = engine.create_execution_context()?;
    let mut buffers = BufferManager::new(&engine, 1)?;
    let input_names: Vec<String> = buffers
        .names()
        .filter(|name| !buffers.output_names().any(|out| out == *name))
        .map(str::to_owned)
        .collect();
    for name in &input_names {
        buffers.host_buffer_mut(name)?.fill(1.0);
    }
    buffers.bind(&mut context)?;

    println!("\n3. Running inference...");
    let stream = Stream::new()?;
    unsafe {
        buffers.copy_input_to_device_async(&stream)?;
        context.enqueue_v3(stream.as_ptr())?;
        buffers.copy_output_to_host_async(&stream)?;
    }
    stream.synchronize()?;

    let output_names: Vec<String> = buffers.output_names().map(str::to_owned).collect();
    for name in &output_names {
        let values = buffers.host_buffer(name)?;
        let preview: Vec<f32> = values.iter().take(8).copied().collect();
        println!("   {name}: {preview:?}");
    }

    Ok(())
}
