//! Project files written by one session open unchanged in another.

use easel_core::shapes::{
    Ellipse, FontFamily, Freehand, Image, ImageFormat, Rectangle, StrokeMode, Text, TextAlign,
};
use easel_core::{
    Editor, FormatError, ImageFilter, MemoryStorage, Scene, SceneObject, SerializableColor,
    ShapeKind, ShapeStyle, Storage, deserialize, serialize,
};
use kurbo::{Point, Vec2};

fn every_kind() -> Scene {
    let mut scene = Scene::new(1024.0, 768.0).with_background(SerializableColor::new(250, 248, 240, 255));

    let mut rect = Rectangle::new(120.0, 80.0);
    rect.corner_radius = 6.0;
    let mut rect = SceneObject::new(ShapeKind::Rectangle(rect), Point::new(12.5, 40.0)).with_style(ShapeStyle {
        stroke_color: SerializableColor::new(200, 30, 30, 255),
        stroke_width: 3.5,
        fill_color: Some(SerializableColor::new(255, 230, 200, 128)),
        opacity: 0.8,
    });
    rect.transform.rotation = std::f64::consts::FRAC_PI_6;
    rect.transform.scale = Vec2::new(1.5, 0.5);
    scene.add_object(rect).unwrap();

    let ellipse = SceneObject::new(ShapeKind::Ellipse(Ellipse::new(60.0, 30.0)), Point::new(300.0, 200.0))
        .with_name("Sun");
    scene.add_object(ellipse).unwrap();

    let stroke = Freehand::from_points(
        vec![Point::new(0.0, 0.0), Point::new(10.1, 3.3), Point::new(22.7, 9.9)],
        StrokeMode::Draw,
    );
    scene
        .add_object(SceneObject::new(ShapeKind::Freehand(stroke), Point::new(400.0, 400.0)))
        .unwrap();
    let eraser = Freehand::from_points(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)], StrokeMode::Erase);
    scene
        .add_object(SceneObject::new(ShapeKind::Freehand(eraser), Point::new(401.0, 402.0)))
        .unwrap();

    let mut text = Text::new("Title\nsubtitle").with_font_size(28.0).with_font_family(FontFamily::Monospace);
    text.align = TextAlign::Center;
    let mut text = SceneObject::new(ShapeKind::Text(text), Point::new(20.0, 600.0));
    text.locked = true;
    scene.add_object(text).unwrap();

    let mut image = Image::new(&[137, 80, 78, 71, 1, 2, 3, 4], 16, 8, ImageFormat::Png).fit_width(64.0);
    image.filters = vec![ImageFilter::Grayscale, ImageFilter::Blur(1.5), ImageFilter::Brighten(-20)];
    let mut image = SceneObject::new(ShapeKind::Image(image), Point::new(700.0, 100.0));
    image.visible = false;
    scene.add_object(image).unwrap();

    scene
}

#[test]
fn every_object_kind_survives_a_round_trip() {
    let scene = every_kind();
    let bytes = serialize(&scene).unwrap();
    let decoded = deserialize(&bytes).unwrap();
    assert_eq!(decoded, scene);
    assert!(decoded.is_consistent());
    assert_eq!(serialize(&decoded).unwrap(), bytes);
}

#[test]
fn editor_opens_what_it_saved() {
    let mut first = Editor::default();
    first.replace_scene(every_kind());
    let bytes = first.save_project().unwrap();

    let mut second = Editor::default();
    second.load_project(&bytes).unwrap();
    assert_eq!(second.scene(), first.scene());
}

#[test]
fn rejected_document_leaves_scene_alone() {
    let mut editor = Editor::default();
    editor.replace_scene(every_kind());
    let before = editor.scene().clone();

    let mut value: serde_json::Value = serde_json::from_slice(&serialize(&before).unwrap()).unwrap();
    value["objects"][1]["z_index"] = 7.into();
    let result = editor.load_project(value.to_string().as_bytes());
    assert!(matches!(
        result,
        Err(easel_core::EditorError::Format(FormatError::NonContiguousZIndex))
    ));
    assert_eq!(editor.scene(), &before);

    let mut value: serde_json::Value = serde_json::from_slice(&serialize(&before).unwrap()).unwrap();
    value["version"] = 99.into();
    assert!(editor.load_project(value.to_string().as_bytes()).is_err());
    assert_eq!(editor.scene(), &before);
}

#[test]
fn storage_keeps_documents_byte_compatible() {
    let storage = MemoryStorage::new();
    let scene = every_kind();
    pollster::block_on(storage.save("kinds", &scene)).unwrap();
    let loaded = pollster::block_on(storage.load("kinds")).unwrap();
    assert_eq!(serialize(&loaded).unwrap(), serialize(&scene).unwrap());
}
