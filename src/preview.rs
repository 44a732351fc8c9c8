use std::path::Path;

use image::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::meta::Point;

/// Relates preview pixels to original pixels: `ratio = display_height / original_height`.
///
/// The ratio is kept as its two integer terms so that mapping a preview
/// coordinate back to the original is an exact floor division.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayScale {
    display_height: u32,
    original_height: u32,
}

impl DisplayScale {
    pub fn new(display_height: u32, original_height: u32) -> Self {
        Self {
            display_height: display_height.max(1),
            original_height: original_height.max(1),
        }
    }

    pub fn ratio(&self) -> f64 {
        self.display_height as f64 / self.original_height as f64
    }

    pub fn display_height(&self) -> u32 {
        self.display_height
    }

    pub fn display_width(&self, original_width: u32) -> u32 {
        ((original_width as f64 * self.ratio()).round() as u32).max(1)
    }

    /// `floor(coord / ratio)` per axis.
    pub fn to_original(&self, p: Point) -> Point {
        let map = |c: u32| {
            (c as u64 * self.original_height as u64 / self.display_height as u64) as u32
        };
        Point::new(map(p.x), map(p.y))
    }

    /// Full-resolution width of a line that should appear `display_px` wide.
    pub fn original_len(&self, display_px: u32) -> u32 {
        let num = display_px as u64 * self.original_height as u64;
        num.div_ceil(self.display_height as u64)
            .clamp(1, u32::MAX as u64) as u32
    }
}

/// The full-resolution working image plus the geometry of its preview.
pub struct Preview {
    working: RgbaImage,
    scale: DisplayScale,
    display_size: (u32, u32),
}

impl Preview {
    pub fn open(path: &Path, display_height: u32) -> Result<Self> {
        let img = image::open(path).map_err(|source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(img, display_height))
    }

    pub fn from_image(img: DynamicImage, display_height: u32) -> Self {
        let working = img.to_rgba8();
        let scale = DisplayScale::new(display_height, working.height());
        let display_size = (scale.display_width(working.width()), scale.display_height());
        Self {
            working,
            scale,
            display_size,
        }
    }

    pub fn scale(&self) -> DisplayScale {
        self.scale
    }

    pub fn display_size(&self) -> (u32, u32) {
        self.display_size
    }

    pub fn original_size(&self) -> (u32, u32) {
        self.working.dimensions()
    }

    /// Draws a rectangle outline between two preview-space corners onto
    /// the full-resolution image.
    pub fn draw_outline(&mut self, a: Point, b: Point, color: Rgba<u8>, display_width: u32) {
        let a = self.scale.to_original(a);
        let b = self.scale.to_original(b);
        let t = self.scale.original_len(display_width);
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));

        let img = &mut self.working;
        fill_rect(img, x0, y0, x1, y0.saturating_add(t - 1), color);
        fill_rect(img, x0, y1.saturating_sub(t - 1), x1, y1, color);
        fill_rect(img, x0, y0, x0.saturating_add(t - 1), y1, color);
        fill_rect(img, x1.saturating_sub(t - 1), y0, x1, y1, color);
    }

    /// A downscaled copy of the working image, sized for the screen.
    pub fn display_image(&self) -> RgbaImage {
        let (w, h) = self.display_size;
        image::imageops::resize(&self.working, w, h, FilterType::Triangle)
    }

    #[cfg(test)]
    pub fn working(&self) -> &RgbaImage {
        &self.working
    }
}

/// Inclusive bounds, clipped to the image.
fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    if x0 >= w || y0 >= h {
        return;
    }
    for y in y0..=y1.min(h - 1) {
        for x in x0..=x1.min(w - 1) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Fully saturated, half-lightness colour, hue rotated by `hue_step`
/// degrees for every insert already recorded.
pub fn outline_color(index: usize, hue_step: u16) -> Rgba<u8> {
    let hue = (index as u64 * hue_step as u64 % 360) as f32;
    let [r, g, b] = hsl_to_rgb(hue, 1.0, 0.5);
    Rgba([r, g, b, 255])
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tall_image_scales_to_display_height() {
        let scale = DisplayScale::new(600, 1800);
        assert!((scale.ratio() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(scale.display_width(1200), 400);
        assert_eq!(scale.to_original(Point::new(100, 100)), Point::new(300, 300));
        assert_eq!(scale.to_original(Point::new(300, 400)), Point::new(900, 1200));
    }

    #[test]
    fn display_width_rounds() {
        // 1001 * 600 / 1000 = 600.6
        assert_eq!(DisplayScale::new(600, 1000).display_width(1001), 601);
        // 1000 * 600 / 1100 = 545.45
        assert_eq!(DisplayScale::new(600, 1100).display_width(1000), 545);
    }

    #[test]
    fn original_coordinates_map_back_within_a_pixel() {
        for original_height in [300u32, 600, 1081, 1800, 4000] {
            let scale = DisplayScale::new(600, original_height);
            for c in 0..600u32 {
                let orig = scale.to_original(Point::new(c, c));
                let back = orig.x as f64 * scale.ratio();
                assert!(
                    (back - c as f64).abs() <= 1.0 + 1e-9,
                    "h={original_height} c={c} orig={} back={back}",
                    orig.x
                );
            }
        }
    }

    #[test]
    fn small_image_is_upscaled() {
        let preview = Preview::from_image(DynamicImage::new_rgb8(150, 300), 600);
        assert_eq!(preview.display_size(), (300, 600));
        assert_eq!(preview.scale().to_original(Point::new(101, 599)), Point::new(50, 299));
    }

    #[test]
    fn outline_is_drawn_at_full_resolution() {
        let mut preview = Preview::from_image(DynamicImage::new_rgb8(1200, 1800), 600);
        let red = Rgba([255, 0, 0, 255]);
        preview.draw_outline(Point::new(100, 100), Point::new(300, 400), red, 1);

        let img = preview.working();
        // ratio 1/3: a one-pixel preview line is three pixels wide.
        assert_eq!(*img.get_pixel(300, 300), red);
        assert_eq!(*img.get_pixel(302, 600), red);
        assert_eq!(*img.get_pixel(900, 1200), red);
        assert_eq!(*img.get_pixel(600, 1198), red);
        assert_ne!(*img.get_pixel(303, 600), red);
        assert_ne!(*img.get_pixel(600, 600), red);
    }

    #[test]
    fn outline_at_the_edge_is_clipped() {
        let mut preview = Preview::from_image(DynamicImage::new_rgb8(10, 10), 10);
        let c = Rgba([0, 255, 0, 255]);
        preview.draw_outline(Point::new(5, 5), Point::new(40, 40), c, 3);
        assert_eq!(*preview.working().get_pixel(9, 5), c);
        assert_eq!(*preview.working().get_pixel(5, 9), c);
        assert_ne!(*preview.working().get_pixel(9, 9), c);
    }

    #[test]
    fn oversized_outline_fills_without_overflow() {
        let mut preview = Preview::from_image(DynamicImage::new_rgb8(40, 4000), 10);
        let c = Rgba([0, 0, 255, 255]);
        // 4000 / 10 = 400 original pixels per preview pixel
        assert_eq!(preview.scale().original_len(u32::MAX), u32::MAX);
        preview.draw_outline(Point::new(0, 0), Point::new(0, 9), c, u32::MAX);
        assert_eq!(*preview.working().get_pixel(39, 3600), c);
    }

    #[test]
    fn display_image_has_preview_dimensions() {
        let preview = Preview::from_image(DynamicImage::new_rgb8(1200, 1800), 600);
        assert_eq!(preview.display_image().dimensions(), (400, 600));
    }

    #[test]
    fn hues_rotate_per_insert() {
        assert_eq!(outline_color(0, 45), Rgba([255, 0, 0, 255]));
        assert_eq!(outline_color(2, 60), Rgba([0, 255, 0, 255]));
        assert_eq!(outline_color(4, 60), Rgba([0, 0, 255, 255]));
        assert_eq!(outline_color(8, 45), outline_color(0, 45));
        assert_ne!(outline_color(1, 45), outline_color(2, 45));
    }
}
