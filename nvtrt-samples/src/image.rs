//! Netpbm image I/O for sample inputs.
//!
//! Color images are kept planar (CHW): the red plane, then green, then blue.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not a {expected} file")]
    BadMagic { path: PathBuf, expected: &'static str },

    #[error("malformed header in '{path}': {detail}")]
    MalformedHeader { path: PathBuf, detail: String },

    #[error("expected {expected} bytes of pixel data, found {found}")]
    ShortData { expected: usize, found: usize },
}

/// Largest channel plane accepted from a header, 16384 x 16384 pixels.
const MAX_PLANE: usize = 1 << 28;

/// `height * width`, rejecting headers that overflow or exceed [`MAX_PLANE`].
fn plane_size(path: &Path, height: usize, width: usize) -> Result<usize, ImageError> {
    height
        .checked_mul(width)
        .filter(|&plane| plane <= MAX_PLANE)
        .ok_or_else(|| ImageError::MalformedHeader {
            path: path.to_path_buf(),
            detail: format!("image size {height} x {width} is too large"),
        })
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ImageError + '_ {
    move |source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A planar 8-bit RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpmImage {
    pub width: usize,
    pub height: usize,
    /// `3 * width * height` bytes, one plane per channel.
    pub data: Vec<u8>,
}

impl PpmImage {
    /// Pixels per channel plane.
    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }
}

/// Read an ASCII (`P3`) PPM file into planar RGB.
///
/// The header is read as `magic H W max`. Pixels past the declared size are
/// ignored and a short pixel list leaves the remaining pixels black.
pub fn read_ppm(path: impl AsRef<Path>) -> Result<PpmImage, ImageError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    let mut tokens = text.split_whitespace();

    if tokens.next() != Some("P3") {
        return Err(ImageError::BadMagic {
            path: path.to_path_buf(),
            expected: "P3",
        });
    }
    let mut header = [0usize; 3];
    for (value, field) in header.iter_mut().zip(["height", "width", "max value"]) {
        *value = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| ImageError::MalformedHeader {
                path: path.to_path_buf(),
                detail: format!("missing or invalid {field}"),
            })?;
    }
    let [height, width, _max] = header;

    let plane = plane_size(path, height, width)?;
    let mut data = vec![0u8; plane * 3];
    let mut values = tokens.map_while(|t| t.parse::<i64>().ok());
    for pixel in 0..plane {
        let (Some(r), Some(g), Some(b)) = (values.next(), values.next(), values.next()) else {
            break;
        };
        data[pixel] = r as u8;
        data[pixel + plane] = g as u8;
        data[pixel + 2 * plane] = b as u8;
    }

    Ok(PpmImage {
        width,
        height,
        data,
    })
}

/// Write a planar RGB buffer as an ASCII (`P3`) PPM file, one pixel per line.
pub fn write_ppm(
    path: impl AsRef<Path>,
    data: &[u8],
    width: usize,
    height: usize,
) -> Result<(), ImageError> {
    let path = path.as_ref();
    let plane = plane_size(path, height, width)?;
    if data.len() < plane * 3 {
        return Err(ImageError::ShortData {
            expected: plane * 3,
            found: data.len(),
        });
    }

    let file = std::fs::File::create(path).map_err(io_error(path))?;
    let mut out = BufWriter::new(file);
    let write = |out: &mut BufWriter<std::fs::File>| -> std::io::Result<()> {
        write!(out, "P3\n{width} {height}\n255\n")?;
        for i in 0..plane {
            writeln!(out, "{} {} {}", data[i], data[i + plane], data[i + 2 * plane])?;
        }
        out.flush()
    };
    write(&mut out).map_err(io_error(path))
}

/// Read an `h * w` binary (`P5`) PGM file.
pub fn read_pgm(path: impl AsRef<Path>, height: usize, width: usize) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(io_error(path))?;

    let mut pos = 0;
    let mut header = Vec::with_capacity(4);
    while header.len() < 4 {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if start == pos {
            return Err(ImageError::MalformedHeader {
                path: path.to_path_buf(),
                detail: format!("expected 4 header fields, found {}", header.len()),
            });
        }
        header.push(&bytes[start..pos]);
    }
    if header[0] != b"P5" {
        return Err(ImageError::BadMagic {
            path: path.to_path_buf(),
            expected: "P5",
        });
    }

    // A single whitespace byte separates the header from the pixels.
    let start = (pos + 1).min(bytes.len());
    let expected = plane_size(path, height, width)?;
    let pixels = &bytes[start..];
    if pixels.len() < expected {
        return Err(ImageError::ShortData {
            expected,
            found: pixels.len(),
        });
    }
    Ok(pixels[..expected].to_vec())
}
