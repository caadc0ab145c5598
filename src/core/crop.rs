//! Fixed-aspect crop: pan/zoom viewport math and rasterization.
//!
//! The viewport is `view_w × view_h` pixels. An image pixel `(ix, iy)` lands
//! on viewport point `(tx + ix * scale, ty + iy * scale)`. The starting state
//! covers the viewport with the image centered; zoom multiplies the cover
//! scale and keeps the image point under the viewport center fixed.

use crate::utils::error::{Result, SiteError};
use crate::utils::validation::validate_file_extension;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1200;
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Source formats the crop accepts.
pub const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

const BACKGROUND: Rgba<u8> = Rgba([235, 235, 235, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aspect {
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Wide,
}

impl Aspect {
    /// Width over height.
    pub fn ratio(&self) -> f64 {
        match self {
            Aspect::Portrait => 4.0 / 5.0,
            Aspect::Square => 1.0,
            Aspect::Wide => 16.0 / 9.0,
        }
    }

    /// Suffix used in output file names, e.g. `photo-45.jpg`.
    pub fn tag(&self) -> &'static str {
        match self {
            Aspect::Portrait => "45",
            Aspect::Square => "11",
            Aspect::Wide => "169",
        }
    }

    pub fn height_for(&self, width: u32) -> u32 {
        ((width as f64) / self.ratio()).round().max(1.0) as u32
    }
}

impl FromStr for Aspect {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "4:5" => Ok(Aspect::Portrait),
            "1:1" => Ok(Aspect::Square),
            "16:9" => Ok(Aspect::Wide),
            other => Err(SiteError::CropError {
                message: format!("unsupported aspect '{}', expected 4:5, 1:1 or 16:9", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Webp,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Png => "image/png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            "png" => Ok(OutputFormat::Png),
            other => Err(SiteError::CropError {
                message: format!("unsupported output format '{}'", other),
            }),
        }
    }
}

/// Region of the source image, in source pixels; may extend past its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropViewport {
    image_w: f64,
    image_h: f64,
    view_w: f64,
    view_h: f64,
    aspect: Aspect,
    zoom: f64,
    scale: f64,
    tx: f64,
    ty: f64,
}

impl CropViewport {
    pub fn new(image_w: u32, image_h: u32, view_w: u32, aspect: Aspect) -> Result<Self> {
        if image_w == 0 || image_h == 0 || view_w == 0 {
            return Err(SiteError::CropError {
                message: "image and viewport must have non-zero size".to_string(),
            });
        }

        let mut viewport = Self {
            image_w: image_w as f64,
            image_h: image_h as f64,
            view_w: view_w as f64,
            view_h: aspect.height_for(view_w) as f64,
            aspect,
            zoom: MIN_ZOOM,
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        };
        viewport.reset();
        Ok(viewport)
    }

    /// Scale at which the image just covers the viewport.
    pub fn base_scale(&self) -> f64 {
        (self.view_w / self.image_w).max(self.view_h / self.image_h)
    }

    pub fn reset(&mut self) {
        self.zoom = MIN_ZOOM;
        self.scale = self.base_scale();
        self.tx = (self.view_w - self.image_w * self.scale) / 2.0;
        self.ty = (self.view_h - self.image_h * self.scale) / 2.0;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.tx += dx;
        self.ty += dy;
    }

    /// Clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.rescale_around_center();
    }

    /// Viewport width changed (window resize); height follows the aspect.
    pub fn resize(&mut self, view_w: u32) {
        let (ox, oy) = self.center_in_image();
        self.view_w = view_w.max(1) as f64;
        self.view_h = self.aspect.height_for(view_w.max(1)) as f64;
        self.scale = self.base_scale() * self.zoom;
        self.tx = self.view_w / 2.0 - ox * self.scale;
        self.ty = self.view_h / 2.0 - oy * self.scale;
    }

    fn rescale_around_center(&mut self) {
        let (ox, oy) = self.center_in_image();
        let (cx, cy) = (self.view_w / 2.0, self.view_h / 2.0);
        self.scale = self.base_scale() * self.zoom;
        self.tx = cx - ox * self.scale;
        self.ty = cy - oy * self.scale;
    }

    /// Image-space point under the viewport center.
    pub fn center_in_image(&self) -> (f64, f64) {
        (
            (self.view_w / 2.0 - self.tx) / self.scale,
            (self.view_h / 2.0 - self.ty) / self.scale,
        )
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    pub fn view_size(&self) -> (f64, f64) {
        (self.view_w, self.view_h)
    }

    pub fn aspect(&self) -> Aspect {
        self.aspect
    }

    pub fn source_rect(&self) -> SourceRect {
        SourceRect {
            x: -self.tx / self.scale,
            y: -self.ty / self.scale,
            width: self.view_w / self.scale,
            height: self.view_h / self.scale,
        }
    }

    /// `W × round(W / aspect)`.
    pub fn output_size(&self, out_width: u32) -> (u32, u32) {
        let width = out_width.max(1);
        (width, self.aspect.height_for(width))
    }
}

/// Draws the visible region onto an output canvas of `out_width` pixels.
pub fn render_crop(image: &DynamicImage, viewport: &CropViewport, out_width: u32) -> RgbaImage {
    let (out_w, out_h) = viewport.output_size(out_width);
    let rect = viewport.source_rect();

    // 取整數像素外框，小數偏移留到縮放後再裁掉
    let x0 = rect.x.floor();
    let y0 = rect.y.floor();
    let region_w = ((rect.x + rect.width).ceil() - x0).max(1.0);
    let region_h = ((rect.y + rect.height).ceil() - y0).max(1.0);

    // 超出原圖的區域以背景色填滿
    let mut region = RgbaImage::from_pixel(region_w as u32, region_h as u32, BACKGROUND);
    imageops::overlay(&mut region, &image.to_rgba8(), -(x0 as i64), -(y0 as i64));

    let kx = out_w as f64 / rect.width;
    let ky = out_h as f64 / rect.height;
    let scaled_w = ((region_w * kx).ceil() as u32).max(out_w);
    let scaled_h = ((region_h * ky).ceil() as u32).max(out_h);
    let scaled = imageops::resize(&region, scaled_w, scaled_h, FilterType::Lanczos3);

    let ox = (((rect.x - x0) * kx).round() as u32).min(scaled_w - out_w);
    let oy = (((rect.y - y0) * ky).round() as u32).min(scaled_h - out_h);
    imageops::crop_imm(&scaled, ox, oy, out_w, out_h).to_image()
}

pub fn encode(image: &RgbaImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            DynamicImage::ImageRgb8(rgb)
                .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))?;
        }
        OutputFormat::Webp => {
            DynamicImage::ImageRgba8(image.clone())
                .write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
        }
        OutputFormat::Png => {
            DynamicImage::ImageRgba8(image.clone()).write_with_encoder(PngEncoder::new(&mut buf))?;
        }
    }
    Ok(buf)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropOptions {
    pub aspect: Aspect,
    pub zoom: f64,
    /// Pan in viewport pixels, applied after zoom.
    pub pan: (f64, f64),
    pub view_width: u32,
    pub out_width: u32,
    pub format: OutputFormat,
    pub quality: u8,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            aspect: Aspect::Portrait,
            zoom: MIN_ZOOM,
            pan: (0.0, 0.0),
            view_width: 520,
            out_width: DEFAULT_OUTPUT_WIDTH,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub format: OutputFormat,
}

pub fn crop_image(image: &DynamicImage, source_name: &str, options: &CropOptions) -> Result<CroppedImage> {
    let mut viewport =
        CropViewport::new(image.width(), image.height(), options.view_width, options.aspect)?;
    viewport.set_zoom(options.zoom);
    viewport.pan(options.pan.0, options.pan.1);

    let rendered = render_crop(image, &viewport, options.out_width);
    let (width, height) = rendered.dimensions();
    let bytes = encode(&rendered, options.format, options.quality)?;

    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");

    tracing::debug!(
        "✂️ Cropped {} to {}x{} ({} bytes)",
        source_name,
        width,
        height,
        bytes.len()
    );

    Ok(CroppedImage {
        bytes,
        width,
        height,
        file_name: format!("{}-{}.{}", stem, options.aspect.tag(), options.format.extension()),
        format: options.format,
    })
}

pub fn crop_file(path: &Path, options: &CropOptions) -> Result<CroppedImage> {
    validate_file_extension("input", &path.to_string_lossy(), SOURCE_EXTENSIONS)?;
    let image = image::open(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    crop_image(&image, name, options)
}
