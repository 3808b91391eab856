//! Split-screen example.
//!
//! Two cameras look at the same world from different places. Each viewport
//! gets its own HUD bar from the shared screen-space layer. The frame is
//! rasterized on the CPU and written to `split_screen.png`.

use stratum::prelude::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// A 64×32 sheet: a grass tile on the left, a crate on the right.
fn sprite_sheet() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(64 * 32 * 4);
    for y in 0..32u32 {
        for x in 0..64u32 {
            let px = if x < 32 {
                let shade = if (x / 4 + y / 4) % 2 == 0 { 150 } else { 120 };
                [40, shade, 50, 255]
            } else {
                let (lx, ly) = (x - 32, y);
                let edge = lx < 3 || ly < 3 || lx > 28 || ly > 28 || lx == ly || lx + ly == 31;
                if edge { [90, 55, 25, 255] } else { [170, 120, 60, 255] }
            };
            pixels.extend_from_slice(&px);
        }
    }
    pixels
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut backend = SoftwareBackend::new(WIDTH, HEIGHT);
    let texture = backend.load_texture_rgba(64, 32, &sprite_sheet())?;

    let mut atlas = Atlas::new("demo", texture);
    atlas.insert_sprite("grass", SpriteData::new(0.0, 0.0, 32.0, 32.0));
    atlas.insert_sprite("crate", SpriteData::new(32.0, 0.0, 32.0, 32.0));
    let mut resources = ResourceRegistry::new();
    resources.insert_atlas(atlas)?;

    let mut store = VisualStore::new();
    store.add_sprite(
        Vec2::ZERO,
        SpriteVisual::new("grass")
            .layer(LayerId::BACKGROUND)
            .pivot(Pivot::TopLeft)
            .sized(SizeMode::Repeat, Container::CameraViewport),
    );
    for i in 0..40 {
        let x = (i % 8) as f32 * 120.0;
        let y = (i / 8) as f32 * 110.0;
        store.add_sprite(
            Vec2::new(x, y),
            SpriteVisual::new("crate").rotation(i as f32 * 9.0).z_index(i),
        );
    }
    store.add_shape(
        Vec2::new(420.0, 260.0),
        ShapeVisual::new(Shape::circle(40.0)).color(Color::YELLOW).z_index(100),
    );
    store.add_shape(
        Vec2::new(200.0, 300.0),
        ShapeVisual::new(Shape::arrow(Vec2::new(160.0, -60.0), 18.0, 4.0)).color(Color::RED),
    );
    // Drawn once per viewport.
    store.add_shape(
        Vec2::new(10.0, 10.0),
        ShapeVisual::new(Shape::rectangle(180.0, 16.0)).color(Color::GREEN).layer(LayerId::UI),
    );
    store.add_shape(
        Vec2::new(10.0, 10.0),
        ShapeVisual::new(Shape::rectangle(180.0, 16.0))
            .color(Color::WHITE)
            .outline(2.0)
            .layer(LayerId::UI)
            .z_index(1),
    );

    let mut cameras = CameraManager::new(WIDTH as f32, HEIGHT as f32);
    cameras.setup_split_screen(SplitScreenLayout::VerticalSplit);
    cameras.camera_mut(0)?.set_position(200.0, 250.0);
    let right = cameras.camera_mut(1)?;
    right.set_position(600.0, 300.0);
    right.set_zoom(0.6)?;
    right.set_rotation(10.0);

    let mut renderer = Renderer::new(LayerRegistry::default(), RenderConfig::default());
    renderer.render(&mut backend, &FrameContext::split(&cameras), &store, &resources);
    log::info!("{:?}", renderer.stats());

    backend.save_png("split_screen.png")?;
    println!("wrote split_screen.png");
    Ok(())
}
