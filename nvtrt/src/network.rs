//! Network definitions and the layer/tensor handles they own

use crate::error::{check, error_buffer, Error, Result};
use nvtrt_sys::*;
use std::cell::RefCell;
use std::ffi::CStr;
use std::fmt;
use std::marker::PhantomData;

/// Maximum number of extents in a [`Dims`]
pub const MAX_DIMS: usize = NVTRT_MAX_DIMS as usize;

/// Tensor shape
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dims {
    extents: Vec<i64>,
}

impl Dims {
    /// Build a shape from its extents
    pub fn new(extents: &[i64]) -> Result<Self> {
        if extents.len() > MAX_DIMS {
            return Err(Error::InvalidArgument(format!(
                "{} dimensions exceed the maximum of {MAX_DIMS}",
                extents.len()
            )));
        }
        Ok(Self {
            extents: extents.to_vec(),
        })
    }

    pub fn extents(&self) -> &[i64] {
        &self.extents
    }

    pub fn nb_dims(&self) -> usize {
        self.extents.len()
    }

    /// Product of all extents. An empty shape has volume 1.
    pub fn volume(&self) -> i64 {
        self.extents.iter().product()
    }

    /// Whether any extent is unknown until runtime
    pub fn is_dynamic(&self) -> bool {
        self.extents.iter().any(|&d| d < 0)
    }

    pub(crate) fn from_ffi(dims: &NvtrtDims) -> Self {
        let len = (dims.nb_dims.max(0) as usize).min(MAX_DIMS);
        Self {
            extents: dims.d[..len].to_vec(),
        }
    }

    pub(crate) fn to_ffi(&self) -> NvtrtDims {
        let mut dims = NvtrtDims::default();
        dims.nb_dims = self.extents.len() as i32;
        dims.d[..self.extents.len()].copy_from_slice(&self.extents);
        dims
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.extents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

/// Element type of a tensor or weight buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DataType {
    Float = 0,
    Half = 1,
    Int8 = 2,
    Int32 = 3,
    Bool = 4,
    Uint8 = 5,
}

impl DataType {
    pub(crate) fn from_raw(value: i32) -> Result<Self> {
        Ok(match value {
            0 => DataType::Float,
            1 => DataType::Half,
            2 => DataType::Int8,
            3 => DataType::Int32,
            4 => DataType::Bool,
            5 => DataType::Uint8,
            other => return Err(Error::Unknown(format!("unsupported data type {other}"))),
        })
    }

    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            DataType::Float | DataType::Int32 => 4,
            DataType::Half => 2,
            DataType::Int8 | DataType::Bool | DataType::Uint8 => 1,
        }
    }
}

/// Host weights for a constant layer
#[derive(Debug, Clone, Copy)]
pub struct Weights<'a> {
    values: &'a [f32],
}

impl<'a> Weights<'a> {
    pub fn new(values: &'a [f32]) -> Self {
        Self { values }
    }

    pub fn data_type(&self) -> DataType {
        DataType::Float
    }

    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }
}

/// Element-wise binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ElementWiseOperation {
    Sum = 0,
    Prod = 1,
    Max = 2,
    Min = 3,
    Sub = 4,
    Div = 5,
    Pow = 6,
}

/// Kind of a network layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Convolution,
    FullyConnected,
    Activation,
    Pooling,
    Lrn,
    Scale,
    SoftMax,
    Deconvolution,
    Concatenation,
    ElementWise,
    Plugin,
    Unary,
    Padding,
    Shuffle,
    Reduce,
    TopK,
    Gather,
    MatrixMultiply,
    RaggedSoftMax,
    Constant,
    /// Any layer kind without a dedicated variant
    Other(i32),
}

impl LayerType {
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => LayerType::Convolution,
            1 => LayerType::FullyConnected,
            2 => LayerType::Activation,
            3 => LayerType::Pooling,
            4 => LayerType::Lrn,
            5 => LayerType::Scale,
            6 => LayerType::SoftMax,
            7 => LayerType::Deconvolution,
            8 => LayerType::Concatenation,
            9 => LayerType::ElementWise,
            10 => LayerType::Plugin,
            11 => LayerType::Unary,
            12 => LayerType::Padding,
            13 => LayerType::Shuffle,
            14 => LayerType::Reduce,
            15 => LayerType::TopK,
            16 => LayerType::Gather,
            17 => LayerType::MatrixMultiply,
            18 => LayerType::RaggedSoftMax,
            19 => LayerType::Constant,
            other => LayerType::Other(other),
        }
    }
}

fn c_name(ptr: *const std::os::raw::c_char) -> Result<String> {
    if ptr.is_null() {
        return Ok(String::new());
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_str()?.to_owned())
}

/// Tensor owned by a [`NetworkDefinition`]
#[derive(Clone, Copy)]
pub struct Tensor<'n> {
    inner: *mut NvtrtTensor,
    _network: PhantomData<&'n NetworkDefinition>,
}

impl<'n> Tensor<'n> {
    pub(crate) fn from_raw(inner: *mut NvtrtTensor) -> Option<Self> {
        (!inner.is_null()).then_some(Self {
            inner,
            _network: PhantomData,
        })
    }

    pub fn name(&self) -> Result<String> {
        c_name(unsafe { nvtrt_tensor_get_name(self.inner) })
    }

    pub fn dimensions(&self) -> Dims {
        let mut dims = NvtrtDims::default();
        unsafe { nvtrt_tensor_get_dimensions(self.inner, &mut dims) };
        Dims::from_ffi(&dims)
    }

    /// Set the INT8 quantization range of this tensor
    pub fn set_dynamic_range(&self, min: f32, max: f32) -> Result<()> {
        if unsafe { nvtrt_tensor_set_dynamic_range(self.inner, min, max) } == 0 {
            return Err(Error::InvalidArgument(format!(
                "invalid dynamic range [{min}, {max}]"
            )));
        }
        Ok(())
    }

    pub fn dynamic_range_is_set(&self) -> bool {
        unsafe { nvtrt_tensor_dynamic_range_is_set(self.inner) != 0 }
    }

    /// The `(min, max)` range, if one was set
    pub fn dynamic_range(&self) -> Option<(f32, f32)> {
        self.dynamic_range_is_set().then(|| unsafe {
            (
                nvtrt_tensor_get_dynamic_range_min(self.inner),
                nvtrt_tensor_get_dynamic_range_max(self.inner),
            )
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut NvtrtTensor {
        self.inner
    }
}

impl fmt::Debug for Tensor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("name", &self.name().unwrap_or_default())
            .field("dims", &self.dimensions())
            .finish()
    }
}

/// Layer owned by a [`NetworkDefinition`]
#[derive(Clone, Copy)]
pub struct Layer<'n> {
    inner: *mut NvtrtLayer,
    _network: PhantomData<&'n NetworkDefinition>,
}

impl<'n> Layer<'n> {
    fn from_raw(inner: *mut NvtrtLayer) -> Option<Self> {
        (!inner.is_null()).then_some(Self {
            inner,
            _network: PhantomData,
        })
    }

    pub fn nb_inputs(&self) -> usize {
        unsafe { nvtrt_layer_get_nb_inputs(self.inner).max(0) as usize }
    }

    pub fn input(&self, index: usize) -> Option<Tensor<'n>> {
        let index = i32::try_from(index).ok()?;
        Tensor::from_raw(unsafe { nvtrt_layer_get_input(self.inner, index) })
    }

    /// Connected inputs; unset slots are skipped
    pub fn inputs(&self) -> Vec<Tensor<'n>> {
        (0..self.nb_inputs()).filter_map(|i| self.input(i)).collect()
    }

    pub fn nb_outputs(&self) -> usize {
        unsafe { nvtrt_layer_get_nb_outputs(self.inner).max(0) as usize }
    }

    pub fn output(&self, index: usize) -> Option<Tensor<'n>> {
        let index = i32::try_from(index).ok()?;
        Tensor::from_raw(unsafe { nvtrt_layer_get_output(self.inner, index) })
    }

    pub fn outputs(&self) -> Vec<Tensor<'n>> {
        (0..self.nb_outputs()).filter_map(|i| self.output(i)).collect()
    }

    pub fn layer_type(&self) -> LayerType {
        LayerType::from_raw(unsafe { nvtrt_layer_get_type(self.inner) })
    }

    pub fn name(&self) -> Result<String> {
        c_name(unsafe { nvtrt_layer_get_name(self.inner) })
    }

    /// Rewire input `index` of this layer to `tensor`
    pub fn set_input(&self, index: usize, tensor: Tensor<'n>) -> Result<()> {
        let index = i32::try_from(index)
            .map_err(|_| Error::InvalidArgument(format!("input index {index} out of range")))?;
        unsafe { nvtrt_layer_set_input(self.inner, index, tensor.as_ptr()) };
        Ok(())
    }
}

impl fmt::Debug for Layer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name().unwrap_or_default())
            .field("type", &self.layer_type())
            .finish()
    }
}

/// Network definition for building TensorRT engines
pub struct NetworkDefinition {
    inner: *mut NvtrtNetworkDefinition,
    // Constant weights must outlive the engine build.
    weights: RefCell<Vec<Vec<f32>>>,
}

impl NetworkDefinition {
    pub(crate) fn from_raw(inner: *mut NvtrtNetworkDefinition) -> Self {
        Self {
            inner,
            weights: RefCell::new(Vec::new()),
        }
    }

    /// Get the raw pointer (for internal use)
    pub(crate) fn as_ptr(&self) -> *mut NvtrtNetworkDefinition {
        self.inner
    }

    pub fn nb_inputs(&self) -> usize {
        unsafe { nvtrt_network_get_nb_inputs(self.inner).max(0) as usize }
    }

    pub fn input(&self, index: usize) -> Option<Tensor<'_>> {
        let index = i32::try_from(index).ok()?;
        Tensor::from_raw(unsafe { nvtrt_network_get_input(self.inner, index) })
    }

    pub fn inputs(&self) -> Vec<Tensor<'_>> {
        (0..self.nb_inputs()).filter_map(|i| self.input(i)).collect()
    }

    pub fn nb_outputs(&self) -> usize {
        unsafe { nvtrt_network_get_nb_outputs(self.inner).max(0) as usize }
    }

    pub fn output(&self, index: usize) -> Option<Tensor<'_>> {
        let index = i32::try_from(index).ok()?;
        Tensor::from_raw(unsafe { nvtrt_network_get_output(self.inner, index) })
    }

    pub fn outputs(&self) -> Vec<Tensor<'_>> {
        (0..self.nb_outputs()).filter_map(|i| self.output(i)).collect()
    }

    pub fn nb_layers(&self) -> usize {
        unsafe { nvtrt_network_get_nb_layers(self.inner).max(0) as usize }
    }

    pub fn layer(&self, index: usize) -> Option<Layer<'_>> {
        let index = i32::try_from(index).ok()?;
        Layer::from_raw(unsafe { nvtrt_network_get_layer(self.inner, index) })
    }

    pub fn layers(&self) -> Vec<Layer<'_>> {
        (0..self.nb_layers()).filter_map(|i| self.layer(i)).collect()
    }

    /// Mark a tensor as a network output
    pub fn mark_output(&self, tensor: Tensor<'_>) {
        unsafe { nvtrt_network_mark_output(self.inner, tensor.as_ptr()) }
    }

    /// Add a constant layer holding `weights` with shape `dims`
    pub fn add_constant(&self, dims: &Dims, weights: Weights<'_>) -> Result<Layer<'_>> {
        let owned = weights.values().to_vec();
        let ffi_dims = dims.to_ffi();
        let mut layer_ptr: *mut NvtrtLayer = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_network_add_constant(
                self.inner,
                &ffi_dims,
                weights.data_type() as i32,
                owned.as_ptr() as *const std::ffi::c_void,
                owned.len() as i64,
                &mut layer_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        // Moving the Vec keeps its heap buffer in place.
        self.weights.borrow_mut().push(owned);
        Layer::from_raw(layer_ptr)
            .ok_or_else(|| Error::Runtime("addConstant returned no layer".to_string()))
    }

    /// Add an element-wise layer computing `op(input1, input2)`
    pub fn add_element_wise(
        &self,
        input1: Tensor<'_>,
        input2: Tensor<'_>,
        op: ElementWiseOperation,
    ) -> Result<Layer<'_>> {
        let mut layer_ptr: *mut NvtrtLayer = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_network_add_element_wise(
                self.inner,
                input1.as_ptr(),
                input2.as_ptr(),
                op as i32,
                &mut layer_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Layer::from_raw(layer_ptr)
            .ok_or_else(|| Error::Runtime("addElementWise returned no layer".to_string()))
    }
}

impl Drop for NetworkDefinition {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_network_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for NetworkDefinition {}

/// Give every tensor without a dynamic range a symmetric one.
///
/// Layer inputs get `±in_scale`. Layer outputs get `±in_scale` when produced
/// by a pooling layer and `±out_scale` otherwise.
pub fn set_all_tensor_scales(
    network: &NetworkDefinition,
    in_scale: f32,
    out_scale: f32,
) -> Result<()> {
    let layers = network.layers();
    for layer in &layers {
        for input in layer.inputs() {
            if !input.dynamic_range_is_set() {
                input.set_dynamic_range(-in_scale, in_scale)?;
            }
        }
    }
    for layer in &layers {
        let scale = if layer.layer_type() == LayerType::Pooling {
            in_scale
        } else {
            out_scale
        };
        for output in layer.outputs() {
            if !output.dynamic_range_is_set() {
                output.set_dynamic_range(-scale, scale)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims_volume() {
        let dims = Dims::new(&[1, 3, 608, 608]).unwrap();
        assert_eq!(dims.volume(), 1_108_992);
        assert_eq!(dims.nb_dims(), 4);
        assert!(!dims.is_dynamic());
        assert_eq!(Dims::default().volume(), 1);
        assert!(Dims::new(&[-1, 3]).unwrap().is_dynamic());
    }

    #[test]
    fn test_dims_too_many_extents() {
        let err = Dims::new(&[1; MAX_DIMS + 1]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_dims_ffi_conversion() {
        let dims = Dims::new(&[1, 28, 28]).unwrap();
        let raw = dims.to_ffi();
        assert_eq!(raw.nb_dims, 3);
        assert_eq!(&raw.d[..3], &[1, 28, 28]);
        assert_eq!(Dims::from_ffi(&raw), dims);
        assert_eq!(dims.to_string(), "(1, 28, 28)");
    }

    #[test]
    fn test_data_type_sizes() {
        assert_eq!(DataType::Float.size(), 4);
        assert_eq!(DataType::Half.size(), 2);
        assert_eq!(DataType::Int8.size(), 1);
        assert_eq!(DataType::from_raw(3).unwrap(), DataType::Int32);
        assert!(DataType::from_raw(42).is_err());
    }

    #[test]
    fn test_layer_type_from_raw() {
        assert_eq!(LayerType::from_raw(3), LayerType::Pooling);
        assert_eq!(LayerType::from_raw(19), LayerType::Constant);
        assert_eq!(LayerType::from_raw(200), LayerType::Other(200));
    }

    #[cfg(feature = "mock")]
    mod mock {
        use super::*;
        use crate::builder::{network_flags, Builder};
        use crate::logger::tests::TestLogger;
        use crate::logger::Logger;
        use crate::onnx_parser::OnnxParser;

        const MODEL: &str = "\
mock-input data 1 1 4 4
mock-layer 3 pool 1 1 2 2
mock-output prob 1 4
";

        #[test]
        fn test_network_accessors() {
            let logger = Logger::new(TestLogger::default()).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder.create_network(network_flags::EXPLICIT_BATCH).unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser.parse(MODEL.as_bytes()).unwrap();

            assert_eq!(network.nb_inputs(), 1);
            assert_eq!(network.nb_outputs(), 1);
            assert_eq!(network.nb_layers(), 2);

            let input = network.input(0).unwrap();
            assert_eq!(input.name().unwrap(), "data");
            assert_eq!(input.dimensions().extents(), &[1, 1, 4, 4]);
            assert!(network.input(1).is_none());

            let pool = network.layer(0).unwrap();
            assert_eq!(pool.layer_type(), LayerType::Pooling);
            assert_eq!(pool.name().unwrap(), "pool");
            assert_eq!(pool.inputs()[0].name().unwrap(), "data");
            assert_eq!(network.layer(1).unwrap().layer_type(), LayerType::FullyConnected);
        }

        #[test]
        fn test_constant_and_element_wise() {
            let logger = Logger::new(TestLogger::default()).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder.create_network(network_flags::EXPLICIT_BATCH).unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser.parse(MODEL.as_bytes()).unwrap();

            let input = network.input(0).unwrap();
            let mean = vec![0.5f32; 16];
            let dims = Dims::new(&[1, 4, 4]).unwrap();
            let constant = network.add_constant(&dims, Weights::new(&mean)).unwrap();
            assert_eq!(constant.layer_type(), LayerType::Constant);
            let mean_tensor = constant.output(0).unwrap();
            assert_eq!(mean_tensor.dimensions(), dims);

            let sub = network
                .add_element_wise(input, mean_tensor, ElementWiseOperation::Sub)
                .unwrap();
            assert_eq!(sub.layer_type(), LayerType::ElementWise);
            assert_eq!(sub.nb_inputs(), 2);

            let first = network.layer(0).unwrap();
            first.set_input(0, sub.output(0).unwrap()).unwrap();
            assert_eq!(
                first.input(0).unwrap().name().unwrap(),
                sub.output(0).unwrap().name().unwrap()
            );
        }

        #[test]
        fn test_constant_rejects_mismatched_weights() {
            let logger = Logger::new(TestLogger::default()).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder.create_network(0).unwrap();

            let dims = Dims::new(&[1, 2, 2]).unwrap();
            let err = network.add_constant(&dims, Weights::new(&[1.0, 2.0])).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }

        #[test]
        fn test_set_all_tensor_scales() {
            let logger = Logger::new(TestLogger::default()).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder.create_network(network_flags::EXPLICIT_BATCH).unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser
                .parse(b"mock-input data 1 1 4 4\nmock-layer 3 pool 1 1 2 2\n")
                .unwrap();

            let data = network.input(0).unwrap();
            let pool_out = network.layer(0).unwrap().output(0).unwrap();
            assert!(!data.dynamic_range_is_set());
            assert_eq!(data.dynamic_range(), None);

            set_all_tensor_scales(&network, 2.0, 4.0).unwrap();
            assert_eq!(data.dynamic_range(), Some((-2.0, 2.0)));
            // Pooling outputs keep the input scale.
            assert_eq!(pool_out.dynamic_range(), Some((-2.0, 2.0)));
        }

        #[test]
        fn test_set_all_tensor_scales_keeps_existing_ranges() {
            let logger = Logger::new(TestLogger::default()).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder.create_network(network_flags::EXPLICIT_BATCH).unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser.parse(MODEL.as_bytes()).unwrap();

            let data = network.input(0).unwrap();
            data.set_dynamic_range(-1.0, 1.0).unwrap();
            set_all_tensor_scales(&network, 2.0, 4.0).unwrap();

            assert_eq!(data.dynamic_range(), Some((-1.0, 1.0)));
            let pool_out = network.layer(0).unwrap().output(0).unwrap();
            // Consumed by the next layer, so it is scaled as an input first.
            assert_eq!(pool_out.dynamic_range(), Some((-2.0, 2.0)));
            let prob = network.output(0).unwrap();
            assert_eq!(prob.dynamic_range(), Some((-4.0, 4.0)));
        }

        #[test]
        fn test_invalid_dynamic_range() {
            let logger = Logger::new(TestLogger::default()).unwrap();
            let builder = Builder::new(&logger).unwrap();
            let network = builder.create_network(network_flags::EXPLICIT_BATCH).unwrap();
            let parser = OnnxParser::new(&network, &logger).unwrap();
            parser.parse(MODEL.as_bytes()).unwrap();

            let data = network.input(0).unwrap();
            assert!(data.set_dynamic_range(1.0, -1.0).is_err());
        }
    }
}
