use linebasic::graphics::{palette_color, PALETTE};
use linebasic::{BufferedConsole, Canvas, DrawingSurface, Executor};

const WHITE: u32 = 0xFFFFFF;
const BLACK: u32 = 0x000000;

/// Run a program on a 100x100 canvas and hand back the canvas
fn draw(source: &str) -> Canvas {
    let mut executor = Executor::with_io(BufferedConsole::new(), Canvas::with_dimensions(100, 100));
    executor.load(source).unwrap();
    executor.run().unwrap();
    executor.graphics().clone()
}

#[test]
fn test_graphics_opens_surface() {
    let canvas = draw("10 GRAPHICS");
    assert!(canvas.is_open());
    assert_eq!(canvas.mode(), 0);
    assert_eq!(canvas.lit_pixels(), 0);

    let canvas = draw("10 GRAPHICS 3");
    assert_eq!(canvas.mode(), 3);
}

#[test]
fn test_drawing_before_graphics_is_ignored() {
    let canvas = draw("10 PLOT 5, 5\n20 CIRCLE 50, 50, 10");
    assert!(!canvas.is_open());
    assert_eq!(canvas.lit_pixels(), 0);
}

#[test]
fn test_plot_and_pset() {
    let canvas = draw("10 GRAPHICS\n20 PLOT 10, 20\n30 PSET 30.9, 40.2");
    assert_eq!(canvas.pixel(10, 20), Some(WHITE));
    assert_eq!(canvas.pixel(30, 40), Some(WHITE));
    assert_eq!(canvas.lit_pixels(), 2);
}

#[test]
fn test_line_endpoints() {
    let canvas = draw("10 GRAPHICS\n20 LINE 10, 10 TO 20, 20");
    assert_eq!(canvas.pixel(10, 10), Some(WHITE));
    assert_eq!(canvas.pixel(15, 15), Some(WHITE));
    assert_eq!(canvas.pixel(20, 20), Some(WHITE));
    assert_eq!(canvas.lit_pixels(), 11);
}

#[test]
fn test_circle_outline() {
    let canvas = draw("10 GRAPHICS\n20 CIRCLE 50, 50, 10");
    assert_eq!(canvas.pixel(60, 50), Some(WHITE));
    assert_eq!(canvas.pixel(40, 50), Some(WHITE));
    assert_eq!(canvas.pixel(50, 60), Some(WHITE));
    assert_eq!(canvas.pixel(50, 40), Some(WHITE));
    assert_eq!(canvas.pixel(50, 50), Some(BLACK));
}

#[test]
fn test_rect_outline() {
    let canvas = draw("10 GRAPHICS\n20 RECT 10, 10, 5, 4");
    assert_eq!(canvas.pixel(10, 10), Some(WHITE));
    assert_eq!(canvas.pixel(14, 13), Some(WHITE));
    assert_eq!(canvas.pixel(12, 11), Some(BLACK));
    assert_eq!(canvas.lit_pixels(), 14);
}

#[test]
fn test_color_selects_palette_entry() {
    let canvas = draw("10 GRAPHICS\n20 COLOR 4\n30 PLOT 1, 1\n40 COLOR 9.7\n50 PLOT 2, 2");
    assert_eq!(canvas.pixel(1, 1), palette_color(4));
    assert_eq!(canvas.pixel(2, 2), Some(PALETTE[9]));
}

#[test]
fn test_cls_clears_open_surface() {
    let mut executor = Executor::with_io(BufferedConsole::new(), Canvas::with_dimensions(100, 100));
    executor
        .load("10 GRAPHICS\n20 RECT 0, 0, 50, 50\n30 CLS")
        .unwrap();
    executor.run().unwrap();
    assert_eq!(executor.graphics().lit_pixels(), 0);
    // The run itself clears the text screen once, CLS went to the canvas
    assert_eq!(executor.console().clear_count(), 1);
}

#[test]
fn test_drawing_is_clipped() {
    let canvas = draw("10 GRAPHICS\n20 LINE -50, 50 TO 150, 50\n30 CIRCLE 0, 0, 5");
    assert_eq!(canvas.pixel(0, 50), Some(WHITE));
    assert_eq!(canvas.pixel(99, 50), Some(WHITE));
    assert_eq!(canvas.pixel(5, 0), Some(WHITE));
}

#[test]
fn test_expressions_as_coordinates() {
    let canvas = draw("10 GRAPHICS\n20 FOR I = 0 TO 9\n30 PSET I * 10, I * 10\n40 NEXT I");
    for i in 0..10 {
        assert_eq!(canvas.pixel(i * 10, i * 10), Some(WHITE));
    }
    assert_eq!(canvas.lit_pixels(), 10);
}

#[test]
fn test_rerun_starts_from_blank_surface() {
    let mut executor = Executor::with_io(BufferedConsole::new(), Canvas::with_dimensions(100, 100));
    executor
        .load("10 GRAPHICS\n20 IF X = 0 THEN PLOT 1, 1 ELSE PLOT 2, 2\n30 X = 1")
        .unwrap();
    executor.run().unwrap();
    executor.run().unwrap();
    let canvas = executor.graphics();
    assert_eq!(canvas.pixel(1, 1), Some(BLACK));
    assert_eq!(canvas.pixel(2, 2), Some(WHITE));
}

#[test]
fn test_surface_reopen_keeps_pixels() {
    let mut canvas = Canvas::with_dimensions(10, 10);
    canvas.open(0).unwrap();
    canvas.point(3.0, 3.0);
    canvas.open(1).unwrap();
    assert_eq!(canvas.pixel(3, 3), Some(WHITE));
    assert_eq!(canvas.mode(), 0);
}
