//! CPU-side pixel buffers and the image codec seam.

/// Pixel layout of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Rgba,
    Rgb,
    Alpha,
}

impl ColorFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::Rgba => 4,
            ColorFormat::Rgb => 3,
            ColorFormat::Alpha => 1,
        }
    }
}

/// Integer rectangle in pixel space. Origin is the top-left corner of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge. Computed wide so no coordinate can overflow.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// True if both far edges are representable as `i32`.
    pub fn is_representable(&self) -> bool {
        i32::try_from(self.right()).is_ok() && i32::try_from(self.bottom()).is_ok()
    }

    /// Overlapping area of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        // Bounded by the narrower rectangle, so it fits back into i32.
        let width = i32::try_from(right - i64::from(x)).ok()?;
        let height = i32::try_from(bottom - i64::from(y)).ok()?;
        let rect = PixelRect::new(x, y, width, height);
        (!rect.is_empty()).then_some(rect)
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Decoded pixel data, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: ColorFormat,
    pixels: Vec<u8>,
}

impl Image {
    /// Zero-filled image.
    pub fn new(width: u32, height: u32, format: ColorFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            pixels: vec![0; len],
        }
    }

    /// Wrap existing pixels. Returns `None` if the buffer length does not match.
    pub fn from_pixels(width: u32, height: u32, format: ColorFormat, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width as i32, self.height as i32)
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.bytes_per_pixel()
    }

    /// Bytes of the pixel at (x, y), or `None` outside the image.
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        if !self.bounds().contains(&PixelRect::new(x, y, 1, 1)) {
            return None;
        }
        let start = self.offset(x, y);
        Some(&self.pixels[start..start + self.format.bytes_per_pixel()])
    }

    /// Fill the part of `rect` that lies inside the image with `color`.
    ///
    /// `color` holds one value per channel of this image's format.
    pub fn fill_rect(&mut self, rect: PixelRect, color: &[u8]) {
        let bpp = self.format.bytes_per_pixel();
        if color.len() != bpp {
            log::error!(
                "Fill color has {} channels, image format {:?} needs {bpp}",
                color.len(),
                self.format
            );
            return;
        }
        let Some(area) = self.bounds().intersect(&rect) else {
            return;
        };
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                let start = self.offset(x, y);
                self.pixels[start..start + bpp].copy_from_slice(color);
            }
        }
    }

    /// Copy `source_rect` of `source` so its top-left lands at (x, y).
    ///
    /// Both the source rectangle and the destination are clipped; pixels
    /// falling outside either image are skipped.
    pub fn draw_image(&mut self, x: i32, y: i32, source: &Image, source_rect: PixelRect) {
        if source.format != self.format {
            log::error!(
                "Cannot draw {:?} image onto {:?} image",
                source.format,
                self.format
            );
            return;
        }
        let Some(src) = source.bounds().intersect(&source_rect) else {
            return;
        };
        // Shift the destination by however much the source was clipped.
        let shifted = |at: i32, clipped: i32, requested: i32| {
            i32::try_from(i64::from(at) + i64::from(clipped) - i64::from(requested)).ok()
        };
        let (Some(dst_x), Some(dst_y)) = (
            shifted(x, src.x, source_rect.x),
            shifted(y, src.y, source_rect.y),
        ) else {
            return;
        };
        let dst = PixelRect::new(dst_x, dst_y, src.width, src.height);
        let Some(clipped) = self.bounds().intersect(&dst) else {
            return;
        };

        let bpp = self.format.bytes_per_pixel();
        let row_len = clipped.width as usize * bpp;
        for row in 0..clipped.height {
            let dst_y = clipped.y + row;
            let src_x = src.x + (clipped.x - dst.x);
            let src_y = src.y + (dst_y - dst.y);
            let from = source.offset(src_x, src_y);
            let to = self.offset(clipped.x, dst_y);
            self.pixels[to..to + row_len].copy_from_slice(&source.pixels[from..from + row_len]);
        }
    }
}

/// Image codec seam. Failures are `None`, never panics.
pub trait ImageCodec {
    fn decode(&self, bytes: &[u8]) -> Option<Image>;

    fn encode(&self, image: &Image) -> Option<Vec<u8>>;
}

/// Uncompressed container: `LRAW`, width and height as little-endian `u32`,
/// one format byte (0 RGBA, 1 RGB, 2 alpha), then the pixels.
///
/// Used where PNG is unavailable or unwanted (headless tools, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec;

impl RawCodec {
    const MAGIC: &'static [u8; 4] = b"LRAW";
    const HEADER: usize = 13;

    fn format_byte(format: ColorFormat) -> u8 {
        match format {
            ColorFormat::Rgba => 0,
            ColorFormat::Rgb => 1,
            ColorFormat::Alpha => 2,
        }
    }

    fn format_from_byte(byte: u8) -> Option<ColorFormat> {
        match byte {
            0 => Some(ColorFormat::Rgba),
            1 => Some(ColorFormat::Rgb),
            2 => Some(ColorFormat::Alpha),
            _ => None,
        }
    }
}

impl ImageCodec for RawCodec {
    fn decode(&self, bytes: &[u8]) -> Option<Image> {
        if bytes.len() < Self::HEADER || &bytes[..4] != Self::MAGIC {
            return None;
        }
        let width = u32::from_le_bytes(bytes[4..8].try_into().ok()?);
        let height = u32::from_le_bytes(bytes[8..12].try_into().ok()?);
        let format = Self::format_from_byte(bytes[12])?;
        Image::from_pixels(width, height, format, bytes[Self::HEADER..].to_vec())
    }

    fn encode(&self, image: &Image) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::HEADER + image.pixels.len());
        out.extend_from_slice(Self::MAGIC);
        out.extend_from_slice(&image.width.to_le_bytes());
        out.extend_from_slice(&image.height.to_le_bytes());
        out.push(Self::format_byte(image.format));
        out.extend_from_slice(&image.pixels);
        Some(out)
    }
}
