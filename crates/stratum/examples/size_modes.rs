//! Size-mode gallery.
//!
//! The same 48×32 sprite laid out into identical containers with each
//! `SizeMode`, on a screen-space layer. Writes `size_modes.png`.

use stratum::prelude::*;

/// A 48×32 sprite with a dark border and a diagonal, so scaling and
/// aspect changes are easy to see.
fn badge() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(48 * 32 * 4);
    for y in 0..32u32 {
        for x in 0..48u32 {
            let border = x < 2 || y < 2 || x > 45 || y > 29;
            let diagonal = (x as i32 - (y as i32 * 3) / 2).abs() < 2;
            let px = if border || diagonal { [30, 30, 60, 255] } else { [90, 160, 230, 255] };
            pixels.extend_from_slice(&px);
        }
    }
    pixels
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut backend = SoftwareBackend::new(720, 260);
    let texture = backend.load_texture_rgba(48, 32, &badge())?;
    let mut atlas = Atlas::new("gallery", texture);
    atlas.insert_sprite("badge", SpriteData::new(0.0, 0.0, 48.0, 32.0));
    let mut resources = ResourceRegistry::new();
    resources.insert_atlas(atlas)?;

    let modes = [
        SizeMode::None,
        SizeMode::Stretch,
        SizeMode::Cover,
        SizeMode::Contain,
        SizeMode::ScaleDown,
        SizeMode::Repeat,
    ];
    let container = Container::Explicit { width: 100.0, height: 140.0 };

    let mut store = VisualStore::new();
    for (i, mode) in modes.into_iter().enumerate() {
        let origin = Vec2::new(15.0 + i as f32 * 117.0, 60.0);
        store.add_shape(
            origin,
            ShapeVisual::new(Shape::rectangle(100.0, 140.0)).color(Color::GRAY).layer(LayerId::UI),
        );
        // Natural-size sprites sit where their pivot lands, so center them.
        let position = if mode == SizeMode::None { origin + Vec2::new(50.0, 70.0) } else { origin };
        store.add_sprite(
            position,
            SpriteVisual::new("badge")
                .sized(mode, container)
                .pivot(if mode == SizeMode::None { Pivot::Center } else { Pivot::TopLeft })
                .layer(LayerId::UI)
                .z_index(1),
        );
        store.add_text(origin - Vec2::new(0.0, 30.0), TextVisual::new(format!("{mode:?}"), 18.0));
    }

    let camera = Camera::new(720.0, 260.0);
    let mut renderer = Renderer::new(LayerRegistry::default(), RenderConfig {
        clear_color: Color::rgb(0.1, 0.1, 0.12),
        ..RenderConfig::default()
    });
    renderer.render(&mut backend, &FrameContext::single(&camera), &store, &resources);
    log::info!("{:?}", renderer.stats());

    backend.save_png("size_modes.png")?;
    println!("wrote size_modes.png");
    Ok(())
}
