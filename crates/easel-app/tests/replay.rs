//! End-to-end runs of the CLI and the toolbar surface.

use clap::Parser;
use easel_app::cli::{Cli, run};
use easel_app::{Script, Session, ToolbarAction};
use easel_core::{EditorConfig, FileStorage, ImageFilter, MemoryStorage};
use easel_render::encode_png;
use image::{Rgba, RgbaImage};
use std::fs;
use tempfile::TempDir;

fn small_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"canvas_width": 120, "canvas_height": 80, "default_image_width": 20, "grid_size": 10}"#,
    )
    .unwrap();
    path
}

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("easel").chain(args.iter().copied()))
}

#[test]
fn replay_writes_project_and_png() {
    let dir = TempDir::new().unwrap();
    let config = small_config(&dir);
    let script = dir.path().join("script.json");
    fs::write(
        &script,
        r#"[
            {"action": "toggle_snap"},
            {"action": "insert_rectangle"},
            {"event": {"PointerDown": {"x": 12, "y": 9}}},
            {"event": {"PointerMove": {"x": 30, "y": 30}}},
            {"event": {"PointerUp": {"x": 52, "y": 41}}},
            {"action": {"set_background": {"r": 0, "g": 0, "b": 255, "a": 255}}},
            {"key": "Ctrl+Z"},
            {"key": "Ctrl+Y"}
        ]"#,
    )
    .unwrap();
    let project = dir.path().join("out.json");
    let png = dir.path().join("out.png");

    run(cli(&[
        "--config",
        config.to_str().unwrap(),
        "replay",
        script.to_str().unwrap(),
        "--project",
        project.to_str().unwrap(),
        "--png",
        png.to_str().unwrap(),
    ]))
    .unwrap();

    let scene = easel_core::deserialize(&fs::read(&project).unwrap()).unwrap();
    assert_eq!(scene.len(), 1);
    assert_eq!((scene.width, scene.height), (120.0, 80.0));
    assert_eq!(scene.background.b, 255);

    let pixels = image::load_from_memory(&fs::read(&png).unwrap()).unwrap().to_rgba8();
    assert_eq!(pixels.dimensions(), (120, 80));
    assert_eq!(pixels.get_pixel(100, 70).0, [0, 0, 255, 255]);

    // `export` of the saved project reproduces the replayed render.
    let exported = dir.path().join("again.png");
    run(cli(&["export", project.to_str().unwrap(), exported.to_str().unwrap()])).unwrap();
    assert_eq!(fs::read(&exported).unwrap(), fs::read(&png).unwrap());
}

#[test]
fn replay_saves_into_store_directory() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("projects");
    let script = dir.path().join("script.json");
    fs::write(
        &script,
        r#"[{"action": "insert_ellipse"},
            {"event": {"PointerDown": {"x": 50, "y": 50}}},
            {"event": {"PointerUp": {"x": 50, "y": 50}}},
            {"action": {"save": {"name": "sketch"}}}]"#,
    )
    .unwrap();

    run(cli(&["replay", script.to_str().unwrap(), "--store", store.to_str().unwrap()])).unwrap();

    let storage = FileStorage::new(store).unwrap();
    let scene = pollster::block_on(easel_core::Storage::load(&storage, "sketch")).unwrap();
    assert_eq!(scene.len(), 1);
}

#[test]
fn info_rejects_bad_project_and_missing_file() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"version": 99, "canvas": {}, "objects": []}"#).unwrap();
    assert!(run(cli(&["info", bad.to_str().unwrap()])).is_err());

    let missing = dir.path().join("missing.json");
    assert!(run(cli(&["info", missing.to_str().unwrap()])).is_err());
}

#[test]
fn import_filter_and_export_through_toolbar() {
    let dir = TempDir::new().unwrap();
    let photo = dir.path().join("photo.png");
    fs::write(&photo, encode_png(&RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]))).unwrap()).unwrap();

    let config = EditorConfig {
        canvas_width: 60.0,
        canvas_height: 60.0,
        default_image_width: 20.0,
        ..Default::default()
    };
    let mut session = Session::new(config, Box::new(MemoryStorage::new()));
    session
        .dispatch(ToolbarAction::ImportImage {
            path: photo.clone(),
            at: None,
        })
        .unwrap();
    session.finish_imports();
    assert_eq!(session.editor().pending_imports(), 0);
    assert_eq!(session.layers().rows().len(), 1);
    assert_eq!(session.layers().rows()[0].kind, "Image");

    let id = session.layers().rows()[0].id;
    session.editor_mut().select_ids(&[id]);
    session.dispatch(ToolbarAction::ApplyFilter(ImageFilter::Invert)).unwrap();
    let frame = session.frame().unwrap();
    assert_eq!(frame.get_pixel(30, 30).0, [255, 255, 255, 255]);
    assert_eq!(frame.get_pixel(2, 2).0, [255, 255, 255, 255]);

    session.dispatch(ToolbarAction::Undo).unwrap();
    assert_eq!(session.frame().unwrap().get_pixel(30, 30).0, [0, 0, 0, 255]);

    let out = dir.path().join("out.png");
    session.dispatch(ToolbarAction::ExportPng { path: out.clone() }).unwrap();
    let pixels = image::load_from_memory(&fs::read(&out).unwrap()).unwrap().to_rgba8();
    assert_eq!(pixels.get_pixel(30, 30).0, [0, 0, 0, 255]);
}

#[test]
fn missing_import_file_fails_the_script() {
    let mut session = Session::new(EditorConfig::default(), Box::new(MemoryStorage::new()));
    let script = Script::from_json(r#"[{"action": {"import_image": {"path": "/nonexistent/x.png"}}}]"#).unwrap();
    assert!(script.run(&mut session).is_err());
    assert!(session.editor().scene().is_empty());
}

#[test]
fn property_actions_record_one_entry_each() {
    let config = EditorConfig {
        canvas_width: 200.0,
        canvas_height: 120.0,
        ..Default::default()
    };
    let mut session = Session::new(config, Box::new(MemoryStorage::new()));
    let script = Script::from_json(
        r#"[
            {"action": "insert_rectangle"},
            {"event": {"PointerDown": {"x": 10, "y": 10}}},
            {"event": {"PointerMove": {"x": 30, "y": 30}}},
            {"event": {"PointerUp": {"x": 50, "y": 40}}},
            {"action": {"set_stroke_color": {"r": 200, "g": 0, "b": 0, "a": 255}}},
            {"action": {"set_fill_color": {"r": 0, "g": 200, "b": 0, "a": 255}}},
            {"action": {"set_stroke_width": 5.0}},
            {"action": {"set_opacity": 0.5}},
            {"action": "clear_selection"},
            {"action": {"set_stroke_color": {"r": 0, "g": 0, "b": 200, "a": 255}}},
            {"action": "text"},
            {"event": {"PointerDown": {"x": 100, "y": 60}}},
            {"event": {"PointerUp": {"x": 100, "y": 60}}},
            {"event": {"Type": "Hi"}},
            {"event": "Commit"},
            {"action": {"set_font_size": 30.0}},
            {"action": {"set_font_family": "Serif"}},
            {"action": {"set_font_weight": "Bold"}},
            {"action": {"set_align": "Center"}}
        ]"#,
    )
    .unwrap();
    script.run(&mut session).unwrap();

    let editor = session.editor();
    // Rectangle, four style changes, text placement and typing, four font changes.
    assert_eq!(editor.history().undo_len(), 11);
    assert_eq!(editor.history().undo_name(), Some("Align"));

    let objects = editor.scene().list_objects();
    let rect = &objects[0].style;
    assert_eq!(rect.stroke_color.r, 200);
    assert_eq!(rect.fill_color.map(|c| c.g), Some(200));
    assert!((rect.stroke_width - 5.0).abs() < f64::EPSILON);
    assert!((rect.opacity - 0.5).abs() < f64::EPSILON);

    assert_eq!(objects[1].style.stroke_color.b, 200);
    let text = objects[1].kind.as_text().unwrap();
    assert_eq!(text.content, "Hi");
    assert!((text.font_size - 30.0).abs() < f64::EPSILON);
    assert_eq!(text.font_family, easel_core::shapes::FontFamily::Serif);
    assert_eq!(text.font_weight, easel_core::shapes::FontWeight::Bold);
    assert_eq!(text.align, easel_core::shapes::TextAlign::Center);

    session.dispatch(ToolbarAction::Undo).unwrap();
    let text = session.editor().scene().list_objects()[1].kind.as_text().unwrap().clone();
    assert_eq!(text.align, easel_core::shapes::TextAlign::Left);
    assert_eq!(text.font_weight, easel_core::shapes::FontWeight::Bold);
}
