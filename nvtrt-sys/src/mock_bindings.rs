// Bindings for mock.c, mirroring what bindgen generates from wrapper.h.

pub const NVTRT_SUCCESS: u32 = 0;
pub const NVTRT_ERROR_INVALID_ARGUMENT: u32 = 1;
pub const NVTRT_ERROR_OUT_OF_MEMORY: u32 = 2;
pub const NVTRT_ERROR_RUNTIME_ERROR: u32 = 3;
pub const NVTRT_ERROR_CUDA_ERROR: u32 = 4;
pub const NVTRT_ERROR_NOT_FOUND: u32 = 5;
pub const NVTRT_ERROR_UNKNOWN: u32 = 99;
pub const NVTRT_MAX_DIMS: u32 = 8;

#[repr(u32)]
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum NvtrtSeverity {
    NVTRT_SEVERITY_INTERNAL_ERROR = 0,
    NVTRT_SEVERITY_ERROR = 1,
    NVTRT_SEVERITY_WARNING = 2,
    NVTRT_SEVERITY_INFO = 3,
    NVTRT_SEVERITY_VERBOSE = 4,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct NvtrtDims {
    pub nb_dims: i32,
    pub d: [i64; 8usize],
}

macro_rules! opaque {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            #[derive(Debug, Copy, Clone)]
            pub struct $name {
                _unused: [u8; 0],
            }
        )*
    };
}

opaque!(
    NvtrtLogger,
    NvtrtBuilder,
    NvtrtBuilderConfig,
    NvtrtNetworkDefinition,
    NvtrtLayer,
    NvtrtTensor,
    NvtrtOnnxParser,
    NvtrtCaffeParser,
    NvtrtBlobNameToTensor,
    NvtrtBinaryProtoBlob,
    NvtrtRuntime,
    NvtrtCudaEngine,
    NvtrtExecutionContext,
);

pub type NvtrtLoggerCallback = ::std::option::Option<
    unsafe extern "C" fn(
        user_data: *mut ::std::os::raw::c_void,
        severity: NvtrtSeverity,
        msg: *const ::std::os::raw::c_char,
    ),
>;

extern "C" {
    pub fn nvtrt_logger_create(
        callback: NvtrtLoggerCallback,
        user_data: *mut ::std::os::raw::c_void,
        out_logger: *mut *mut NvtrtLogger,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_logger_destroy(logger: *mut NvtrtLogger);

    pub fn nvtrt_builder_create(
        logger: *mut NvtrtLogger,
        out_builder: *mut *mut NvtrtBuilder,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_builder_destroy(builder: *mut NvtrtBuilder);
    pub fn nvtrt_builder_create_network(
        builder: *mut NvtrtBuilder,
        flags: u32,
        out_network: *mut *mut NvtrtNetworkDefinition,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_builder_create_builder_config(
        builder: *mut NvtrtBuilder,
        out_config: *mut *mut NvtrtBuilderConfig,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_builder_set_max_batch_size(builder: *mut NvtrtBuilder, batch_size: i32);
    pub fn nvtrt_builder_get_nb_dla_cores(builder: *mut NvtrtBuilder) -> i32;
    pub fn nvtrt_mock_builder_set_nb_dla_cores(builder: *mut NvtrtBuilder, count: i32);
    pub fn nvtrt_builder_platform_has_fast_fp16(builder: *mut NvtrtBuilder) -> i32;
    pub fn nvtrt_builder_platform_has_fast_int8(builder: *mut NvtrtBuilder) -> i32;
    pub fn nvtrt_builder_build_serialized_network(
        builder: *mut NvtrtBuilder,
        network: *mut NvtrtNetworkDefinition,
        config: *mut NvtrtBuilderConfig,
        out_data: *mut *mut ::std::os::raw::c_void,
        out_size: *mut usize,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;

    pub fn nvtrt_builder_config_destroy(config: *mut NvtrtBuilderConfig);
    pub fn nvtrt_builder_config_set_memory_pool_limit(
        config: *mut NvtrtBuilderConfig,
        pool_type: i32,
        pool_size: usize,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_builder_config_set_flag(config: *mut NvtrtBuilderConfig, flag: i32);
    pub fn nvtrt_builder_config_clear_flag(config: *mut NvtrtBuilderConfig, flag: i32);
    pub fn nvtrt_builder_config_get_flag(config: *mut NvtrtBuilderConfig, flag: i32) -> i32;
    pub fn nvtrt_builder_config_set_default_device_type(
        config: *mut NvtrtBuilderConfig,
        device_type: i32,
    );
    pub fn nvtrt_builder_config_set_dla_core(config: *mut NvtrtBuilderConfig, dla_core: i32);
    pub fn nvtrt_builder_config_get_default_device_type(config: *mut NvtrtBuilderConfig) -> i32;
    pub fn nvtrt_builder_config_get_dla_core(config: *mut NvtrtBuilderConfig) -> i32;

    pub fn nvtrt_network_destroy(network: *mut NvtrtNetworkDefinition);
    pub fn nvtrt_network_get_nb_inputs(network: *mut NvtrtNetworkDefinition) -> i32;
    pub fn nvtrt_network_get_input(
        network: *mut NvtrtNetworkDefinition,
        index: i32,
    ) -> *mut NvtrtTensor;
    pub fn nvtrt_network_get_nb_outputs(network: *mut NvtrtNetworkDefinition) -> i32;
    pub fn nvtrt_network_get_output(
        network: *mut NvtrtNetworkDefinition,
        index: i32,
    ) -> *mut NvtrtTensor;
    pub fn nvtrt_network_get_nb_layers(network: *mut NvtrtNetworkDefinition) -> i32;
    pub fn nvtrt_network_get_layer(
        network: *mut NvtrtNetworkDefinition,
        index: i32,
    ) -> *mut NvtrtLayer;
    pub fn nvtrt_network_mark_output(network: *mut NvtrtNetworkDefinition, tensor: *mut NvtrtTensor);
    pub fn nvtrt_network_add_constant(
        network: *mut NvtrtNetworkDefinition,
        dims: *const NvtrtDims,
        data_type: i32,
        values: *const ::std::os::raw::c_void,
        count: i64,
        out_layer: *mut *mut NvtrtLayer,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_network_add_element_wise(
        network: *mut NvtrtNetworkDefinition,
        input1: *mut NvtrtTensor,
        input2: *mut NvtrtTensor,
        op: i32,
        out_layer: *mut *mut NvtrtLayer,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;

    pub fn nvtrt_layer_get_nb_inputs(layer: *mut NvtrtLayer) -> i32;
    pub fn nvtrt_layer_get_input(layer: *mut NvtrtLayer, index: i32) -> *mut NvtrtTensor;
    pub fn nvtrt_layer_get_nb_outputs(layer: *mut NvtrtLayer) -> i32;
    pub fn nvtrt_layer_get_output(layer: *mut NvtrtLayer, index: i32) -> *mut NvtrtTensor;
    pub fn nvtrt_layer_get_type(layer: *mut NvtrtLayer) -> i32;
    pub fn nvtrt_layer_get_name(layer: *mut NvtrtLayer) -> *const ::std::os::raw::c_char;
    pub fn nvtrt_layer_set_input(layer: *mut NvtrtLayer, index: i32, tensor: *mut NvtrtTensor);

    pub fn nvtrt_tensor_get_name(tensor: *mut NvtrtTensor) -> *const ::std::os::raw::c_char;
    pub fn nvtrt_tensor_get_dimensions(tensor: *mut NvtrtTensor, out_dims: *mut NvtrtDims);
    pub fn nvtrt_tensor_set_dynamic_range(tensor: *mut NvtrtTensor, min: f32, max: f32) -> i32;
    pub fn nvtrt_tensor_dynamic_range_is_set(tensor: *mut NvtrtTensor) -> i32;
    pub fn nvtrt_tensor_get_dynamic_range_min(tensor: *mut NvtrtTensor) -> f32;
    pub fn nvtrt_tensor_get_dynamic_range_max(tensor: *mut NvtrtTensor) -> f32;

    pub fn nvtrt_onnx_parser_create(
        network: *mut NvtrtNetworkDefinition,
        logger: *mut NvtrtLogger,
        out_parser: *mut *mut NvtrtOnnxParser,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_onnx_parser_destroy(parser: *mut NvtrtOnnxParser);
    pub fn nvtrt_onnx_parser_parse(
        parser: *mut NvtrtOnnxParser,
        data: *const ::std::os::raw::c_void,
        size: usize,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;

    pub fn nvtrt_caffe_parser_create(
        out_parser: *mut *mut NvtrtCaffeParser,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_caffe_parser_destroy(parser: *mut NvtrtCaffeParser);
    pub fn nvtrt_caffe_parser_parse(
        parser: *mut NvtrtCaffeParser,
        deploy_file: *const ::std::os::raw::c_char,
        model_file: *const ::std::os::raw::c_char,
        network: *mut NvtrtNetworkDefinition,
        weight_type: i32,
        out_blobs: *mut *const NvtrtBlobNameToTensor,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_blob_name_to_tensor_find(
        blobs: *const NvtrtBlobNameToTensor,
        name: *const ::std::os::raw::c_char,
    ) -> *mut NvtrtTensor;
    pub fn nvtrt_caffe_parser_parse_binary_proto(
        parser: *mut NvtrtCaffeParser,
        file_name: *const ::std::os::raw::c_char,
        out_blob: *mut *mut NvtrtBinaryProtoBlob,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_binary_proto_blob_get_data(blob: *mut NvtrtBinaryProtoBlob) -> *const f32;
    pub fn nvtrt_binary_proto_blob_get_dimensions(
        blob: *mut NvtrtBinaryProtoBlob,
        out_dims: *mut NvtrtDims,
    );
    pub fn nvtrt_binary_proto_blob_destroy(blob: *mut NvtrtBinaryProtoBlob);
    pub fn nvtrt_caffe_shutdown_protobuf_library();

    pub fn nvtrt_runtime_create(
        logger: *mut NvtrtLogger,
        out_runtime: *mut *mut NvtrtRuntime,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_runtime_destroy(runtime: *mut NvtrtRuntime);
    pub fn nvtrt_runtime_deserialize_cuda_engine(
        runtime: *mut NvtrtRuntime,
        data: *const ::std::os::raw::c_void,
        size: usize,
        out_engine: *mut *mut NvtrtCudaEngine,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;

    pub fn nvtrt_cuda_engine_destroy(engine: *mut NvtrtCudaEngine);
    pub fn nvtrt_cuda_engine_create_execution_context(
        engine: *mut NvtrtCudaEngine,
        out_context: *mut *mut NvtrtExecutionContext,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_engine_get_nb_io_tensors(
        engine: *mut NvtrtCudaEngine,
        out_count: *mut i32,
    ) -> i32;
    pub fn nvtrt_cuda_engine_get_tensor_name(
        engine: *mut NvtrtCudaEngine,
        index: i32,
        out_name: *mut *const ::std::os::raw::c_char,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_engine_get_tensor_shape(
        engine: *mut NvtrtCudaEngine,
        name: *const ::std::os::raw::c_char,
        out_dims: *mut NvtrtDims,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_engine_get_tensor_data_type(
        engine: *mut NvtrtCudaEngine,
        name: *const ::std::os::raw::c_char,
        out_type: *mut i32,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_engine_get_tensor_io_mode(
        engine: *mut NvtrtCudaEngine,
        name: *const ::std::os::raw::c_char,
        out_mode: *mut i32,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_engine_has_implicit_batch_dimension(engine: *mut NvtrtCudaEngine) -> i32;

    pub fn nvtrt_execution_context_destroy(context: *mut NvtrtExecutionContext);
    pub fn nvtrt_execution_context_set_tensor_address(
        context: *mut NvtrtExecutionContext,
        tensor_name: *const ::std::os::raw::c_char,
        data: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_execution_context_enqueue_v3(
        context: *mut NvtrtExecutionContext,
        cuda_stream: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_execution_context_enqueue(
        context: *mut NvtrtExecutionContext,
        batch_size: i32,
        bindings: *const *mut ::std::os::raw::c_void,
        cuda_stream: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;

    pub fn nvtrt_cuda_malloc(
        ptr: *mut *mut ::std::os::raw::c_void,
        size: usize,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_free(
        ptr: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_memcpy_host_to_device(
        dst: *mut ::std::os::raw::c_void,
        src: *const ::std::os::raw::c_void,
        size: usize,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_memcpy_device_to_host(
        dst: *mut ::std::os::raw::c_void,
        src: *const ::std::os::raw::c_void,
        size: usize,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_memcpy_host_to_device_async(
        dst: *mut ::std::os::raw::c_void,
        src: *const ::std::os::raw::c_void,
        size: usize,
        stream: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_memcpy_device_to_host_async(
        dst: *mut ::std::os::raw::c_void,
        src: *const ::std::os::raw::c_void,
        size: usize,
        stream: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_stream_create(
        out_stream: *mut *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_stream_synchronize(
        stream: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_stream_destroy(
        stream: *mut ::std::os::raw::c_void,
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_synchronize(
        error_msg: *mut ::std::os::raw::c_char,
        error_msg_len: usize,
    ) -> i32;
    pub fn nvtrt_cuda_get_default_stream() -> *mut ::std::os::raw::c_void;

    pub fn nvtrt_free_buffer(buffer: *mut ::std::os::raw::c_void);
}
