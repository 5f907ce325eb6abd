//! Synthetic GeoTIFF builder for tests.
//!
//! Writes single-band `f32` GeoTIFFs with proper georeferencing tags
//! (ModelPixelScale, ModelTiepoint, optional GDAL nodata) so raster-access
//! can decode them exactly like production imagery.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

/// Builder for a synthetic single-band GeoTIFF.
#[derive(Debug, Clone)]
pub struct GeoTiffFixture {
    width: usize,
    height: usize,
    /// World coordinate of the raster's top-left corner (x, y).
    origin: (f64, f64),
    /// Pixel size in world units (x, y), both positive.
    pixel_size: (f64, f64),
    nodata: Option<f64>,
    pixels: Vec<f32>,
}

impl GeoTiffFixture {
    /// A raster whose pixel values ramp row-major from 0, covering
    /// `[0, 0] x [width, height]` in degrees at 1 degree per pixel.
    pub fn gradient(width: usize, height: usize) -> Self {
        let pixels = (0..width * height).map(|i| i as f32).collect();
        Self {
            width,
            height,
            origin: (0.0, height as f64),
            pixel_size: (1.0, 1.0),
            nodata: None,
            pixels,
        }
    }

    /// A raster filled with a constant value.
    pub fn constant(width: usize, height: usize, value: f32) -> Self {
        Self {
            pixels: vec![value; width * height],
            ..Self::gradient(width, height)
        }
    }

    /// Place the top-left corner at a world coordinate.
    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Set the pixel size in world units.
    pub fn with_pixel_size(mut self, x: f64, y: f64) -> Self {
        self.pixel_size = (x, y);
        self
    }

    /// Declare a nodata sentinel (written as the GDAL nodata tag).
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// Overwrite the pixel buffer. Length must stay `width * height`.
    pub fn with_pixels(mut self, pixels: Vec<f32>) -> Self {
        assert_eq!(pixels.len(), self.width * self.height);
        self.pixels = pixels;
        self
    }

    /// Set a single pixel value at (col, row).
    pub fn set_pixel(mut self, col: usize, row: usize, value: f32) -> Self {
        self.pixels[row * self.width + col] = value;
        self
    }

    /// Encode to GeoTIFF bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        self.encode(&mut buffer).expect("GeoTIFF fixture encoding");
        buffer.into_inner()
    }

    /// Write to a file and return the matching `file://` URI.
    pub fn write_to(&self, path: &Path) -> String {
        let file = File::create(path).expect("create fixture file");
        self.encode(BufWriter::new(file))
            .expect("GeoTIFF fixture encoding");
        format!("file://{}", path.display())
    }

    fn encode<W: Write + Seek>(&self, writer: W) -> Result<(), tiff::TiffError> {
        let mut encoder = TiffEncoder::new(writer)?;
        let mut image = encoder.new_image::<Gray32Float>(self.width as u32, self.height as u32)?;

        // ModelPixelScale: [ScaleX, ScaleY, ScaleZ]
        let pixel_scale = [self.pixel_size.0, self.pixel_size.1, 0.0];
        image
            .encoder()
            .write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;

        // ModelTiepoint: pixel (0, 0) sits at the origin world coordinate
        let tiepoint = [0.0, 0.0, 0.0, self.origin.0, self.origin.1, 0.0];
        image
            .encoder()
            .write_tag(Tag::Unknown(TAG_MODEL_TIEPOINT), tiepoint.as_slice())?;

        if let Some(nodata) = self.nodata {
            let nodata_str = format!("{}", nodata);
            image
                .encoder()
                .write_tag(Tag::Unknown(TAG_GDAL_NODATA), nodata_str.as_str())?;
        }

        image.write_data(&self.pixels)?;
        Ok(())
    }
}
