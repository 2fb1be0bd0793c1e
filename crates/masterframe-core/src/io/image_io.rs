use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;

use crate::consts::U16_FULL_SCALE;
use crate::error::{CombineError, Result};
use crate::frame::{Frame, FrameMetadata};
use crate::io::provenance::Provenance;

/// Suffix appended to an output path to name its provenance sidecar.
pub const PROVENANCE_SUFFIX: &str = ".provenance.txt";

/// Load a grayscale image file into a Frame.
///
/// Pixel values are read as 16-bit and kept in ADU (no normalization).
/// The frame id is the file name.
pub fn load_image(path: &Path) -> Result<Frame> {
    let id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_image_with_metadata(path, FrameMetadata::new(id))
}

/// Load a grayscale image file, attaching caller-supplied metadata.
pub fn load_image_with_metadata(path: &Path, metadata: FrameMetadata) -> Result<Frame> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Err(CombineError::InvalidDimensions {
            width: w as usize,
            height: h as usize,
        });
    }

    let mut data = Array2::<f64>::zeros((h as usize, w as usize));
    for (col, row, pixel) in gray.enumerate_pixels() {
        data[[row as usize, col as usize]] = f64::from(pixel.0[0]);
    }

    Ok(Frame::with_metadata(data, metadata))
}

/// Quantize ADU values to u16, rounding and clamping to the 16-bit range.
/// Non-finite values become 0.
fn to_u16_pixels(data: &Array2<f64>) -> Vec<u16> {
    data.iter()
        .map(|&v| {
            if v.is_finite() {
                v.round().clamp(0.0, U16_FULL_SCALE) as u16
            } else {
                0
            }
        })
        .collect()
}

fn to_luma16(data: &Array2<f64>) -> Result<ImageBuffer<Luma<u16>, Vec<u16>>> {
    let (h, w) = data.dim();
    let pixels = to_u16_pixels(data);
    ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels).ok_or(
        CombineError::InvalidDimensions {
            width: w,
            height: h,
        },
    )
}

/// Save ADU data as 16-bit grayscale TIFF.
pub fn save_tiff(data: &Array2<f64>, path: &Path) -> Result<()> {
    to_luma16(data)?.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save ADU data as 16-bit grayscale PNG.
pub fn save_png(data: &Array2<f64>, path: &Path) -> Result<()> {
    to_luma16(data)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save ADU data, choosing format from file extension.
pub fn save_image(data: &Array2<f64>, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(data, path),
        _ => save_tiff(data, path),
    }
}

/// Sidecar path for `output`: `out.tiff` -> `out.tiff.provenance.txt`.
pub fn provenance_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(PROVENANCE_SUFFIX);
    PathBuf::from(name)
}

/// Write writer-owned `history` lines followed by the provenance record.
pub fn write_provenance(path: &Path, provenance: &Provenance, history: &[String]) -> Result<()> {
    let mut text = String::new();
    for line in history {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(&provenance.to_string());
    fs::write(path, text)?;
    Ok(())
}

/// Save `data` to `path` together with its provenance sidecar.
///
/// Either both files exist afterwards or neither does: when the sidecar
/// cannot be written the raster is removed again.
pub fn save_with_provenance(
    data: &Array2<f64>,
    path: &Path,
    provenance: &Provenance,
    history: &[String],
) -> Result<PathBuf> {
    let sidecar = provenance_path(path);
    save_image(data, path)?;
    if let Err(err) = write_provenance(&sidecar, provenance, history) {
        // The sidecar error is returned, not the cleanup one.
        let _ = fs::remove_file(path);
        return Err(err);
    }
    Ok(sidecar)
}
