//! Graphics system
//!
//! Graphics statements draw through the [`DrawingSurface`] trait. `Canvas`
//! is an in-memory raster with a top-left origin; the `window` feature adds
//! a surface that shows the same raster in a desktop window.

use thiserror::Error;

#[cfg(feature = "window")]
pub mod window;

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: usize = 800;
/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: usize = 600;

/// Colors selectable with COLOR, as 0x00RRGGBB
pub const PALETTE: [u32; 10] = [
    0x000000, // 0: Black
    0xFFFFFF, // 1: White
    0xFF0000, // 2: Red
    0x00FF00, // 3: Green
    0x0000FF, // 4: Blue
    0xFFFF00, // 5: Yellow
    0xFF00FF, // 6: Magenta
    0x00FFFF, // 7: Cyan
    0x808080, // 8: Gray
    0xFF8000, // 9: Orange
];

const BACKGROUND: u32 = PALETTE[0];
const DEFAULT_COLOR: u32 = PALETTE[1];

/// Palette lookup. Indices outside 0-9 have no color.
pub fn palette_color(index: i64) -> Option<u32> {
    usize::try_from(index)
        .ok()
        .and_then(|i| PALETTE.get(i).copied())
}

/// Failure to bring up a drawing surface
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct GraphicsError(pub String);

/// Target of the graphics statements. Coordinates arrive as interpreter
/// numbers and are truncated to whole pixels by the surface. Drawing while
/// the surface is closed does nothing.
pub trait DrawingSurface {
    /// Open the surface (GRAPHICS). Opening an open surface keeps its
    /// contents.
    fn open(&mut self, mode: u32) -> Result<(), GraphicsError>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Fill with the background color
    fn clear(&mut self);

    /// Select a palette color. Unknown indices leave the color unchanged.
    fn set_color(&mut self, index: i64);

    fn point(&mut self, x: f64, y: f64);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);

    fn circle(&mut self, x: f64, y: f64, radius: f64);

    /// Rectangle outline with its top-left corner at (x, y)
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
}

/// In-memory raster surface
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Row-major 0x00RRGGBB pixels
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    open: bool,
    mode: u32,
    color: u32,
}

impl Canvas {
    /// Create a new canvas with default dimensions
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a new canvas with custom dimensions
    pub fn with_dimensions(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![BACKGROUND; width * height],
            width,
            height,
            open: false,
            mode: 0,
            color: DEFAULT_COLOR,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mode given to the last successful open
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Current drawing color
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Raw pixel buffer, row-major
    pub fn buffer(&self) -> &[u32] {
        &self.pixels
    }

    /// Color at a pixel, `None` off the canvas
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Number of pixels that differ from the background
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != BACKGROUND).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Off-canvas pixels are clipped
    fn set_pixel(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.color;
        }
    }

    /// Bresenham's line algorithm
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set_pixel(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Midpoint circle outline
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32) {
        if radius <= 0 {
            return;
        }

        let mut x = radius;
        let mut y = 0;
        let mut err = 0;

        while x >= y {
            for (px, py) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.set_pixel(cx + px, cy + py);
            }

            y += 1;
            if err <= 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let right = x.saturating_add(width - 1);
        let bottom = y.saturating_add(height - 1);
        self.draw_line(x, y, right, y);
        self.draw_line(x, bottom, right, bottom);
        self.draw_line(x, y, x, bottom);
        self.draw_line(right, y, right, bottom);
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Coordinates beyond this are clamped so line stepping cannot overflow
const COORD_LIMIT: f64 = (1 << 20) as f64;

/// Interpreter numbers to pixel coordinates, truncating toward zero. NaN
/// becomes 0.
fn px(value: f64) -> i32 {
    value.clamp(-COORD_LIMIT, COORD_LIMIT) as i32
}

impl DrawingSurface for Canvas {
    fn open(&mut self, mode: u32) -> Result<(), GraphicsError> {
        if !self.open {
            self.pixels.fill(BACKGROUND);
            self.color = DEFAULT_COLOR;
            self.open = true;
            self.mode = mode;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn clear(&mut self) {
        if self.open {
            self.pixels.fill(BACKGROUND);
        }
    }

    fn set_color(&mut self, index: i64) {
        if let Some(color) = palette_color(index) {
            self.color = color;
        }
    }

    fn point(&mut self, x: f64, y: f64) {
        if self.open {
            self.set_pixel(px(x), px(y));
        }
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        if self.open {
            self.draw_line(px(x1), px(y1), px(x2), px(y2));
        }
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) {
        if self.open {
            self.draw_circle(px(x), px(y), px(radius));
        }
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if self.open {
            self.draw_rect(px(x), px(y), px(width), px(height));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_canvas(width: usize, height: usize) -> Canvas {
        let mut canvas = Canvas::with_dimensions(width, height);
        canvas.open(0).unwrap();
        canvas
    }

    #[test]
    fn test_create_canvas() {
        let canvas = Canvas::new();
        assert_eq!(canvas.width(), DEFAULT_WIDTH);
        assert_eq!(canvas.height(), DEFAULT_HEIGHT);
        assert!(!canvas.is_open());
    }

    #[test]
    fn test_drawing_while_closed_is_ignored() {
        let mut canvas = Canvas::with_dimensions(10, 10);
        canvas.point(1.0, 1.0);
        canvas.line(0.0, 0.0, 9.0, 9.0);
        assert_eq!(canvas.lit_pixels(), 0);
    }

    #[test]
    fn test_point_truncates_coordinates() {
        let mut canvas = open_canvas(10, 10);
        canvas.point(2.9, 3.2);
        assert_eq!(canvas.pixel(2, 3), Some(PALETTE[1]));
        assert_eq!(canvas.lit_pixels(), 1);
    }

    #[test]
    fn test_draw_line() {
        let mut canvas = open_canvas(100, 100);
        canvas.line(10.0, 10.0, 20.0, 20.0);
        assert_eq!(canvas.pixel(10, 10), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(15, 15), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(20, 20), Some(PALETTE[1]));
        assert_eq!(canvas.lit_pixels(), 11);
    }

    #[test]
    fn test_circle() {
        let mut canvas = open_canvas(200, 200);
        canvas.circle(100.0, 100.0, 50.0);
        assert_eq!(canvas.pixel(150, 100), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(50, 100), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(100, 50), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(100, 100), Some(BACKGROUND));
    }

    #[test]
    fn test_rect_outline() {
        let mut canvas = open_canvas(20, 20);
        canvas.rect(2.0, 3.0, 5.0, 4.0);
        assert_eq!(canvas.pixel(2, 3), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(6, 6), Some(PALETTE[1]));
        assert_eq!(canvas.pixel(7, 3), Some(BACKGROUND));
        assert_eq!(canvas.pixel(4, 4), Some(BACKGROUND));
        // 2 * 5 + 2 * 4 - 4 shared corners
        assert_eq!(canvas.lit_pixels(), 14);
    }

    #[test]
    fn test_off_canvas_drawing_is_clipped() {
        let mut canvas = open_canvas(10, 10);
        canvas.line(-5.0, 5.0, 15.0, 5.0);
        assert_eq!(canvas.lit_pixels(), 10);
        assert_eq!(canvas.pixel(-1, 5), None);
    }

    #[test]
    fn test_set_color() {
        let mut canvas = open_canvas(10, 10);
        canvas.set_color(2);
        canvas.point(0.0, 0.0);
        assert_eq!(canvas.pixel(0, 0), Some(0xFF0000));

        // Out of range leaves the color alone
        canvas.set_color(42);
        canvas.set_color(-1);
        assert_eq!(canvas.color(), 0xFF0000);
    }

    #[test]
    fn test_clear() {
        let mut canvas = open_canvas(10, 10);
        canvas.point(5.0, 5.0);
        canvas.clear();
        assert_eq!(canvas.lit_pixels(), 0);
    }

    #[test]
    fn test_reopen_resets() {
        let mut canvas = open_canvas(10, 10);
        canvas.set_color(3);
        canvas.point(1.0, 1.0);

        // Opening again while open keeps the drawing
        canvas.open(1).unwrap();
        assert_eq!(canvas.lit_pixels(), 1);
        assert_eq!(canvas.mode(), 0);

        canvas.close();
        canvas.open(1).unwrap();
        assert_eq!(canvas.lit_pixels(), 0);
        assert_eq!(canvas.color(), PALETTE[1]);
        assert_eq!(canvas.mode(), 1);
    }

    #[test]
    fn test_palette_lookup() {
        assert_eq!(palette_color(9), Some(0xFF8000));
        assert_eq!(palette_color(10), None);
        assert_eq!(palette_color(-3), None);
    }
}
