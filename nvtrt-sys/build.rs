use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");

    // Check if we're in mock mode
    if env::var("CARGO_FEATURE_MOCK").is_ok() {
        println!("cargo:warning=Building in MOCK mode - no TensorRT required");
        println!("cargo:rerun-if-changed=mock.c");

        // Build mock C implementation; bindings are checked in at src/mock_bindings.rs
        cc::Build::new().file("mock.c").include(".").compile("nvtrt_mock");
        return;
    }

    println!("cargo:rerun-if-changed=wrapper.cpp");
    println!("cargo:rerun-if-env-changed=TENSORRT_DIR");
    println!("cargo:rerun-if-env-changed=CUDA_ROOT");

    // Look for a TensorRT installation
    // Users can override with TENSORRT_DIR environment variable
    let trt_dir = env::var("TENSORRT_DIR").unwrap_or_else(|_| "/usr/local/tensorrt".to_string());
    let cuda_dir = env::var("CUDA_ROOT").unwrap_or_else(|_| "/usr/local/cuda".to_string());

    let include_dir = format!("{}/include", trt_dir);
    let cuda_include_dir = format!("{}/include", cuda_dir);

    println!("cargo:rustc-link-search=native={}/lib", trt_dir);
    println!("cargo:rustc-link-search=native={}/lib64", cuda_dir);
    println!("cargo:rustc-link-lib=dylib=nvinfer");
    println!("cargo:rustc-link-lib=dylib=nvonnxparser");
    println!("cargo:rustc-link-lib=dylib=nvparsers");
    println!("cargo:rustc-link-lib=dylib=cudart");

    // Build C++ wrapper
    cc::Build::new()
        .cpp(true)
        .file("wrapper.cpp")
        .include(".")
        .include(&include_dir)
        .include(&cuda_include_dir)
        .flag("-std=c++17")
        .flag_if_supported("-Wno-deprecated-declarations")
        .compile("nvtrt_wrapper");

    // Generate bindings
    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .allowlist_function("nvtrt_.*")
        .allowlist_type("Nvtrt.*")
        .allowlist_var("NVTRT_.*")
        .rustified_enum("NvtrtSeverity")
        .derive_debug(true)
        .derive_default(true)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("Unable to generate bindings");

    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write bindings!");
}
