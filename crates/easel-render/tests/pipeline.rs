//! Import, filter, draw and export through the public API.

use easel_core::{Editor, EditorConfig, ImageFilter, InputEvent, ShapeTool, ToolKind};
use easel_render::{ImageFilters, decode_image, encode_png, export_png, render};
use image::{Rgba, RgbaImage};
use kurbo::Point;
use std::sync::Arc;
use std::time::Duration;

fn editor() -> Editor {
    Editor::new(EditorConfig {
        canvas_width: 200.0,
        canvas_height: 120.0,
        default_image_width: 40.0,
        ..Default::default()
    })
    .with_decoder(Arc::new(decode_image))
}

#[test]
fn imported_image_is_filtered_and_exported() {
    let mut editor = editor();
    let png = encode_png(&RgbaImage::from_pixel(4, 2, Rgba([200, 40, 40, 255]))).unwrap();
    editor.import_image(png, Some(Point::new(10.0, 10.0))).unwrap();
    let results = editor.wait_imports(Duration::from_secs(10));
    let id = *results[0].as_ref().unwrap();

    let object = editor.scene().get_object(id).unwrap();
    let image = object.kind.as_image().unwrap();
    assert_eq!((image.width, image.height), (40.0, 20.0));

    editor.apply_filter(id, ImageFilter::Invert, &ImageFilters::default()).unwrap();
    let pixels = render(editor.scene()).unwrap();
    assert_eq!(pixels.get_pixel(20, 15).0, [55, 215, 215, 255]);

    editor.undo().unwrap();
    let pixels = render(editor.scene()).unwrap();
    assert_eq!(pixels.get_pixel(20, 15).0, [200, 40, 40, 255]);

    let exported = export_png(editor.scene()).unwrap();
    let decoded = image::load_from_memory(&exported).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (200, 120));
    assert_eq!(decoded.get_pixel(20, 15).0, [200, 40, 40, 255]);
}

#[test]
fn failed_filter_is_not_recorded() {
    let mut editor = editor();
    let png = encode_png(&RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]))).unwrap();
    editor.import_image(png, None).unwrap();
    let id = *editor.wait_imports(Duration::from_secs(10))[0].as_ref().unwrap();
    let recorded = editor.history().undo_len();

    let tiny = ImageFilters { max_pixels: 4 };
    assert!(editor.apply_filter(id, ImageFilter::Grayscale, &tiny).is_err());
    assert!(editor.apply_filter(id, ImageFilter::Blur(-1.0), &ImageFilters::default()).is_err());
    assert_eq!(editor.history().undo_len(), recorded);
    assert!(editor.scene().get_object(id).unwrap().kind.as_image().unwrap().filters.is_empty());
}

#[test]
fn unsupported_import_reports_error() {
    let mut editor = editor();
    editor.import_image(b"GIF89a not supported".to_vec(), None).unwrap();
    let results = editor.wait_imports(Duration::from_secs(10));
    assert!(results[0].is_err());
    assert!(editor.scene().is_empty());
}

#[test]
fn drawn_stroke_appears_in_render() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Draw);
    editor.handle_event(&InputEvent::down(Point::new(20.0, 60.0)));
    editor.handle_event(&InputEvent::moved(Point::new(100.0, 60.0)));
    editor.handle_event(&InputEvent::up(Point::new(180.0, 60.0)));

    let pixels = render(editor.scene()).unwrap();
    assert_eq!(pixels.get_pixel(100, 60).0, [0, 0, 0, 255]);
    assert_eq!(pixels.get_pixel(100, 20).0, [255, 255, 255, 255]);

    editor.set_tool(ToolKind::Insert(ShapeTool::Rectangle));
    editor.handle_event(&InputEvent::down(Point::new(0.0, 0.0)));
    editor.handle_event(&InputEvent::up(Point::new(1.0, 1.0)));
    assert_eq!(editor.scene().len(), 2);
}
