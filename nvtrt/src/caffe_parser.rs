//! Caffe model parser for TensorRT

use crate::error::{check, error_buffer, Error, Result};
use crate::network::{DataType, Dims, NetworkDefinition, Tensor};
use nvtrt_sys::*;
use std::ffi::CString;
use std::marker::PhantomData;
use std::path::Path;

fn path_to_cstring(path: &Path) -> Result<CString> {
    let text = path
        .to_str()
        .ok_or_else(|| Error::InvalidArgument(format!("non UTF-8 path: {}", path.display())))?;
    Ok(CString::new(text)?)
}

/// Caffe prototxt/caffemodel parser
pub struct CaffeParser {
    inner: *mut NvtrtCaffeParser,
}

impl CaffeParser {
    pub fn new() -> Result<Self> {
        let mut parser_ptr: *mut NvtrtCaffeParser = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_caffe_parser_create(&mut parser_ptr, error_msg.as_mut_ptr(), error_msg.len())
        };
        check(result, &error_msg)?;

        Ok(CaffeParser { inner: parser_ptr })
    }

    /// Populate `network` from a deploy file and its trained weights.
    ///
    /// Outputs are not marked; look them up in the returned map and call
    /// [`NetworkDefinition::mark_output`].
    pub fn parse<'a>(
        &'a self,
        deploy_file: impl AsRef<Path>,
        model_file: impl AsRef<Path>,
        network: &'a NetworkDefinition,
        weight_type: DataType,
    ) -> Result<BlobNameToTensor<'a>> {
        let deploy = path_to_cstring(deploy_file.as_ref())?;
        let model = path_to_cstring(model_file.as_ref())?;
        let mut blobs: *const NvtrtBlobNameToTensor = std::ptr::null();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_caffe_parser_parse(
                self.inner,
                deploy.as_ptr(),
                model.as_ptr(),
                network.as_ptr(),
                weight_type as i32,
                &mut blobs,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        if blobs.is_null() {
            return Err(Error::Runtime("Caffe parser returned no blobs".to_string()));
        }
        Ok(BlobNameToTensor {
            inner: blobs,
            _parser: PhantomData,
        })
    }

    /// Load a mean image or other blob stored as a binaryproto file
    pub fn parse_binary_proto(&self, file: impl AsRef<Path>) -> Result<BinaryProtoBlob> {
        let file_name = path_to_cstring(file.as_ref())?;
        let mut blob_ptr: *mut NvtrtBinaryProtoBlob = std::ptr::null_mut();
        let mut error_msg = error_buffer();

        let result = unsafe {
            nvtrt_caffe_parser_parse_binary_proto(
                self.inner,
                file_name.as_ptr(),
                &mut blob_ptr,
                error_msg.as_mut_ptr(),
                error_msg.len(),
            )
        };
        check(result, &error_msg)?;

        Ok(BinaryProtoBlob { inner: blob_ptr })
    }
}

impl Drop for CaffeParser {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_caffe_parser_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for CaffeParser {}

/// Release the protobuf library state held by the Caffe parser.
///
/// Call once, after every [`CaffeParser`] has been dropped.
pub fn shutdown_protobuf_library() {
    unsafe { nvtrt_caffe_shutdown_protobuf_library() }
}

/// Blob name to tensor lookup produced by [`CaffeParser::parse`]
pub struct BlobNameToTensor<'a> {
    inner: *const NvtrtBlobNameToTensor,
    _parser: PhantomData<&'a CaffeParser>,
}

impl<'a> BlobNameToTensor<'a> {
    pub fn find(&self, name: &str) -> Result<Tensor<'a>> {
        let c_name = CString::new(name)?;
        let tensor = unsafe { nvtrt_blob_name_to_tensor_find(self.inner, c_name.as_ptr()) };
        Tensor::from_raw(tensor).ok_or_else(|| Error::NotFound(format!("blob {name}")))
    }
}

/// Blob loaded from a binaryproto file
pub struct BinaryProtoBlob {
    inner: *mut NvtrtBinaryProtoBlob,
}

impl BinaryProtoBlob {
    pub fn dims(&self) -> Dims {
        let mut dims = NvtrtDims::default();
        unsafe { nvtrt_binary_proto_blob_get_dimensions(self.inner, &mut dims) };
        Dims::from_ffi(&dims)
    }

    pub fn data(&self) -> &[f32] {
        let len = self.dims().volume().max(0) as usize;
        let ptr = unsafe { nvtrt_binary_proto_blob_get_data(self.inner) };
        if ptr.is_null() || len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(ptr, len) }
    }
}

impl Drop for BinaryProtoBlob {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            unsafe {
                nvtrt_binary_proto_blob_destroy(self.inner);
            }
        }
    }
}

unsafe impl Send for BinaryProtoBlob {}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::logger::tests::TestLogger;
    use crate::{Builder, Logger};
    use std::io::Write;

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_parse_and_find_blobs() {
        let deploy = write_temp(b"mock-input data 1 28 28\nmock-output prob 10\n");
        let model = write_temp(b"weights");

        let logger = Logger::new(TestLogger::default()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder.create_network(0).unwrap();
        let parser = CaffeParser::new().unwrap();
        let blobs = parser
            .parse(deploy.path(), model.path(), &network, DataType::Float)
            .unwrap();

        // Caffe outputs are left for the caller to mark.
        assert_eq!(network.nb_outputs(), 0);
        let prob = blobs.find("prob").unwrap();
        network.mark_output(prob);
        assert_eq!(network.nb_outputs(), 1);

        assert!(matches!(blobs.find("missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_parse_missing_model_file() {
        let deploy = write_temp(b"mock-input data 1 28 28\nmock-output prob 10\n");

        let logger = Logger::new(TestLogger::default()).unwrap();
        let builder = Builder::new(&logger).unwrap();
        let network = builder.create_network(0).unwrap();
        let parser = CaffeParser::new().unwrap();
        let err = parser
            .parse(deploy.path(), "/nonexistent/mnist.caffemodel", &network, DataType::Float)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Runtime(_)));
    }

    #[test]
    fn test_parse_binary_proto() {
        let values: Vec<u8> = [1.0f32, 2.5, -3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let file = write_temp(&values);

        let parser = CaffeParser::new().unwrap();
        let blob = parser.parse_binary_proto(file.path()).unwrap();
        assert_eq!(blob.dims().extents(), &[1, 1, 1, 4]);
        assert_eq!(blob.data(), &[1.0, 2.5, -3.0, 4.0]);
    }

    #[test]
    fn test_parse_binary_proto_missing_file() {
        let parser = CaffeParser::new().unwrap();
        assert!(parser.parse_binary_proto("/nonexistent/mean.binaryproto").is_err());
    }
}
