use glam::Vec2;
use luma_engine::core::sizes::select_resolution;
use luma_engine::{
    Assets, Camera, Color, ColorFormat, HeadlessBackend, HeadlessProbe, Image, ImageCodec,
    Material, MemoryFileSystem, Quad, RawCodec, Renderer, Texture, UvRect,
};

fn setup() -> (Renderer, Assets, HeadlessProbe) {
    let backend = HeadlessBackend::new();
    let probe = backend.probe();
    let mut renderer = Renderer::new(Box::new(backend), Camera::new(100.0, 100.0, Vec2::splat(100.0)));
    let image = RawCodec
        .encode(&Image::new(2, 2, ColorFormat::Rgba))
        .unwrap_or_default();
    let files = MemoryFileSystem::new()
        .with_file("red.png", image.clone())
        .with_file("blue.png", image);
    let mut assets = Assets::new(Box::new(files), Box::new(RawCodec), "", 1.0);
    assets.load_all(renderer.backend_mut());
    (renderer, assets, probe)
}

fn materials(assets: &Assets) -> (Material, Material) {
    (
        Material::textured(assets.get_asset_by_path::<Texture>("red")),
        Material::textured(assets.get_asset_by_path::<Texture>("blue")),
    )
}

fn quad(i: usize) -> Quad {
    Quad::rect(Vec2::new(i as f32, 0.0), Vec2::ONE, UvRect::FULL)
}

#[test]
fn alternating_materials_flush_every_quad() {
    let (mut renderer, assets, probe) = setup();
    let (red, blue) = materials(&assets);

    renderer.begin_render();
    for i in 0..6 {
        let material = if i % 2 == 0 { &red } else { &blue };
        assert!(renderer.render_quad(&assets, material, &quad(i), Color::WHITE));
    }
    renderer.end_render();

    assert_eq!(renderer.stats().render_calls, 6);
    assert_eq!(renderer.stats().rendered_vertices, 36);
    assert!(probe.draw_calls().iter().all(|call| call.vertex_count() == 6));
}

#[test]
fn same_material_is_one_draw_call() {
    let (mut renderer, assets, probe) = setup();
    let (red, _) = materials(&assets);

    renderer.begin_render();
    for i in 0..10 {
        renderer.render_quad(&assets, &red, &quad(i), Color::WHITE);
    }
    assert_eq!(probe.draw_call_count(), 0);
    renderer.end_render();

    assert_eq!(probe.draw_call_count(), 1);
    assert_eq!(renderer.stats().render_calls, 1);
    assert_eq!(renderer.stats().rendered_vertices, 60);

    renderer.begin_render();
    assert_eq!(renderer.stats().render_calls, 0);
    renderer.end_render();
}

#[test]
fn expired_material_is_refused() {
    let (mut renderer, mut assets, probe) = setup();
    let (red, blue) = materials(&assets);
    assets.unload("blue");

    renderer.begin_render();
    assert!(renderer.render_quad(&assets, &red, &quad(0), Color::WHITE));
    assert!(!renderer.render_quad(&assets, &blue, &quad(1), Color::WHITE));
    renderer.end_render();
    assert_eq!(probe.draw_call_count(), 1);
}

#[test]
fn camera_projection_round_trip() {
    let camera = Camera::new(100.0, 100.0, Vec2::new(100.0, 100.0));
    assert!(camera.project(Vec2::ZERO).abs_diff_eq(Vec2::new(50.0, 50.0), 1e-4));

    for p in [Vec2::new(12.5, -30.0), Vec2::new(-49.0, 49.0), Vec2::new(3.25, 0.75)] {
        assert!(camera.unproject(camera.project(p)).abs_diff_eq(p, 1e-3));
    }

    let mut zoomed = camera.clone();
    zoomed.set_zoom(2.0);
    zoomed.set_pos(Vec2::new(10.0, 5.0));
    let p = Vec2::new(20.0, -10.0);
    assert!(zoomed.unproject(zoomed.project(p)).abs_diff_eq(p, 1e-3));
}

#[test]
fn resolution_ties_pick_first_listed() {
    // HVGA is 320 high and WVGA 480: 400 is equally far from both.
    assert_eq!(select_resolution(400.0, &["WVGA", "HVGA"]), Some("WVGA"));
    assert_eq!(select_resolution(400.0, &["HVGA", "WVGA"]), Some("HVGA"));
    assert_eq!(select_resolution(1000.0, &["HVGA", "HD", "FullHD"]), Some("FullHD"));
    for _ in 0..3 {
        assert_eq!(select_resolution(700.0, &["HVGA", "HD"]), Some("HD"));
    }
}
