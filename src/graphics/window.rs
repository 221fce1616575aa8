//! Desktop window surface using minifb
//!
//! Draws into a [`Canvas`] and pushes the raster to the window after every
//! call. Pushing the buffer also pumps the window's event queue, so the
//! window stays responsive while a program runs.

use super::{Canvas, DrawingSurface, GraphicsError};
use log::{debug, warn};
use minifb::{Window, WindowOptions};

const TITLE: &str = "linebasic graphics";

/// Window-backed drawing surface
pub struct WindowSurface {
    canvas: Canvas,
    window: Option<Window>,
}

impl WindowSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            canvas: Canvas::with_dimensions(width, height),
            window: None,
        }
    }

    /// The raster behind the window
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn present(&mut self) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        if !window.is_open() {
            debug!("graphics window closed by user");
            self.close();
            return;
        }
        if let Err(e) =
            window.update_with_buffer(self.canvas.buffer(), self.canvas.width(), self.canvas.height())
        {
            warn!("failed to update graphics window: {}", e);
        }
    }
}

impl DrawingSurface for WindowSurface {
    fn open(&mut self, mode: u32) -> Result<(), GraphicsError> {
        if self.window.is_none() {
            let mut window = Window::new(
                TITLE,
                self.canvas.width(),
                self.canvas.height(),
                WindowOptions::default(),
            )
            .map_err(|e| GraphicsError(format!("Failed to create window: {}", e)))?;
            // Every drawing call presents, so no frame pacing
            window.limit_update_rate(None);
            self.window = Some(window);
        }
        self.canvas.open(mode)?;
        self.present();
        Ok(())
    }

    fn close(&mut self) {
        self.window = None;
        self.canvas.close();
    }

    fn is_open(&self) -> bool {
        self.canvas.is_open()
    }

    fn clear(&mut self) {
        self.canvas.clear();
        self.present();
    }

    fn set_color(&mut self, index: i64) {
        self.canvas.set_color(index);
    }

    fn point(&mut self, x: f64, y: f64) {
        self.canvas.point(x, y);
        self.present();
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.canvas.line(x1, y1, x2, y2);
        self.present();
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) {
        self.canvas.circle(x, y, radius);
        self.present();
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.canvas.rect(x, y, width, height);
        self.present();
    }
}
