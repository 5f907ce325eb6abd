//! GeoTIFF decoding and pixel-space georeferencing.

use std::io::Cursor;

use bytes::Bytes;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use stac_common::{BoundingBox, CatalogError, CatalogResult};

// GeoTIFF tag IDs (not in the standard tiff crate tag set)
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

/// Affine pixel-to-world transform derived from the ModelPixelScale and
/// ModelTiepoint tags. North-up rasters only (no rotation terms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// World x of the left edge of pixel column 0.
    pub origin_x: f64,
    /// World y of the top edge of pixel row 0.
    pub origin_y: f64,
    /// Pixel width in world units (positive).
    pub pixel_width: f64,
    /// Pixel height in world units (positive; rows advance southward).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Convert a world coordinate to a pixel (col, row), or None if it
    /// falls outside the given raster dimensions.
    pub fn world_to_pixel(&self, x: f64, y: f64, width: usize, height: usize) -> Option<(usize, usize)> {
        let col = (x - self.origin_x) / self.pixel_width;
        let row = (self.origin_y - y) / self.pixel_height;

        if col < 0.0 || row < 0.0 {
            return None;
        }

        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if col >= width || row >= height {
            return None;
        }

        Some((col, row))
    }
}

/// A decoded GeoTIFF held in memory.
///
/// Pixel data is normalized to `f64` regardless of the on-disk sample
/// format, band-interleaved. Nodata is carried as the raw sentinel value;
/// callers decide whether to mask it.
#[derive(Debug)]
pub struct GeoTiff {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    samples: Vec<f64>,
}

impl GeoTiff {
    /// Decode a GeoTIFF from raw bytes.
    ///
    /// Fails with `UnreadableRaster` on TIFF format errors, missing
    /// georeferencing tags, or a sample buffer that disagrees with the
    /// declared dimensions.
    pub fn from_bytes(data: &Bytes) -> CatalogResult<Self> {
        let mut decoder = Decoder::new(Cursor::new(data.as_ref()))
            .map_err(|e| CatalogError::UnreadableRaster(format!("TIFF open: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| CatalogError::UnreadableRaster(format!("TIFF dimensions: {}", e)))?;
        let (width, height) = (width as usize, height as usize);

        let bands = match decoder.find_tag(Tag::SamplesPerPixel) {
            Ok(Some(value)) => value.into_u16().map(usize::from).unwrap_or(1),
            _ => 1,
        };

        let transform = read_transform(&mut decoder)?;
        let nodata = read_nodata(&mut decoder);

        let image = decoder
            .read_image()
            .map_err(|e| CatalogError::UnreadableRaster(format!("TIFF decode: {}", e)))?;
        let samples = normalize_samples(image);

        if samples.len() != width * height * bands {
            return Err(CatalogError::UnreadableRaster(format!(
                "sample count {} does not match {}x{}x{}",
                samples.len(),
                width,
                height,
                bands
            )));
        }

        debug!(width, height, bands, ?nodata, "Decoded GeoTIFF");

        Ok(Self {
            width,
            height,
            bands,
            transform,
            nodata,
            samples,
        })
    }

    /// Assemble a raster from already-decoded parts. Used by in-crate tests.
    pub(crate) fn from_parts(
        width: usize,
        height: usize,
        bands: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
        samples: Vec<f64>,
    ) -> Self {
        Self {
            width,
            height,
            bands,
            transform,
            nodata,
            samples,
        }
    }

    /// Spatial extent of the raster in world coordinates.
    pub fn bbox(&self) -> BoundingBox {
        let t = &self.transform;
        BoundingBox::new(
            t.origin_x,
            t.origin_y - self.height as f64 * t.pixel_height,
            t.origin_x + self.width as f64 * t.pixel_width,
            t.origin_y,
        )
    }

    /// Raw sample value at a pixel position for one band.
    pub fn value_at_pixel(&self, col: usize, row: usize, band: usize) -> Option<f64> {
        if col >= self.width || row >= self.height || band >= self.bands {
            return None;
        }
        Some(self.samples[(row * self.width + col) * self.bands + band])
    }

    /// Sample a band at a world coordinate. `None` means out of bounds.
    pub fn value_at(&self, x: f64, y: f64, band: usize) -> Option<f64> {
        let (col, row) = self
            .transform
            .world_to_pixel(x, y, self.width, self.height)?;
        self.value_at_pixel(col, row, band)
    }

    /// Whether a sample value is the nodata sentinel (or NaN).
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || self.nodata.map_or(false, |nd| value == nd)
    }

    /// Iterate band-0 sample values in row-major order.
    pub fn band0_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().step_by(self.bands).copied()
    }
}

fn read_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> CatalogResult<GeoTransform> {
    let scale = read_f64_vec(decoder, TAG_MODEL_PIXEL_SCALE)?.ok_or_else(|| {
        CatalogError::UnreadableRaster("missing ModelPixelScale georeferencing tag".to_string())
    })?;
    let tiepoint = read_f64_vec(decoder, TAG_MODEL_TIEPOINT)?.ok_or_else(|| {
        CatalogError::UnreadableRaster("missing ModelTiepoint georeferencing tag".to_string())
    })?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(CatalogError::UnreadableRaster(
            "malformed georeferencing tags".to_string(),
        ));
    }

    let (pixel_width, pixel_height) = (scale[0], scale[1].abs());
    if pixel_width <= 0.0 || pixel_height <= 0.0 {
        return Err(CatalogError::UnreadableRaster(
            "non-positive pixel scale".to_string(),
        ));
    }

    // ModelTiepoint is [I, J, K, X, Y, Z]: pixel (I, J) sits at world (X, Y).
    let origin_x = tiepoint[3] - tiepoint[0] * pixel_width;
    let origin_y = tiepoint[4] + tiepoint[1] * pixel_height;

    Ok(GeoTransform {
        origin_x,
        origin_y,
        pixel_width,
        pixel_height,
    })
}

fn read_f64_vec<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> CatalogResult<Option<Vec<f64>>> {
    match decoder.find_tag(Tag::from_u16_exhaustive(tag)) {
        Ok(Some(value)) => value
            .into_f64_vec()
            .map(Some)
            .map_err(|e| CatalogError::UnreadableRaster(format!("tag {}: {}", tag, e))),
        Ok(None) => Ok(None),
        Err(e) => Err(CatalogError::UnreadableRaster(format!("tag {}: {}", tag, e))),
    }
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let raw = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_NODATA))
        .ok()?;
    raw.trim().trim_end_matches('\0').parse::<f64>().ok()
}

fn normalize_samples(image: DecodingResult) -> Vec<f64> {
    match image {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    }
}
