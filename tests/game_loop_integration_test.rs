#![cfg(feature = "integration-tests")]

mod common;

use std::{cell::RefCell, rc::Rc};

use flow_hooks::{
    Color, GpuTexture, PixelTexture, Size, TextureError, config::GameConfig, flow::Game,
    set_texture_pixels,
};

use crate::common::test_utils::CallLog;

const FRAMES: usize = 5;

fn checkerboard(size: Size) -> Vec<Color> {
    (0..size.height)
        .flat_map(|y| {
            (0..size.width).map(move |x| {
                if (x + y) % 2 == 0 {
                    Color::ORANGE
                } else {
                    Color::new(x as u8, y as u8, 40, 255)
                }
            })
        })
        .collect()
}

#[test]
fn game_fires_phases_in_loop_order() {
    let game = Game::new(
        GameConfig::new(64, 48)
            .with_title("lifecycle integration")
            .with_credits(false)
            .with_clear_colour(Color::CORNFLOWER_BLUE),
    );
    let hub = Rc::clone(game.hub());
    let handle = game.handle();
    let log = CallLog::new();
    let texture: Rc<RefCell<Option<GpuTexture>>> = Rc::default();
    let read_back: Rc<RefCell<Option<Vec<Color>>>> = Rc::default();

    assert_eq!(
        GpuTexture::custom(handle.graphics(), 4, 4).err(),
        Some(TextureError::UninitializedResource)
    );

    {
        let log = log.clone();
        let handle = handle.clone();
        let texture = Rc::clone(&texture);
        hub.on_initialize(move || {
            log.push("initialize");
            // 5 texels per row, so readback rows need padding
            *texture.borrow_mut() = Some(GpuTexture::custom(handle.graphics(), 5, 3)?);

            let mut flat = GpuTexture::custom(handle.graphics(), 0, 3)?;
            assert_eq!(flat.size(), Size::new(1, 3));
            set_texture_pixels(&mut flat, &[Color::RED; 3])?;
            Ok(())
        });
    }
    {
        let log = log.clone();
        let handle = handle.clone();
        hub.on_update(move |time| {
            log.push("update");
            if log.count("update") == 1 {
                assert!(time.elapsed().is_zero());
            }
            if log.count("update") == FRAMES {
                handle.exit();
            }
            Ok(())
        });
    }
    {
        let log = log.clone();
        let texture = Rc::clone(&texture);
        let read_back = Rc::clone(&read_back);
        hub.on_draw(move || {
            log.push("draw");
            if let Some(texture) = texture.borrow_mut().as_mut() {
                let colors = checkerboard(texture.size());
                set_texture_pixels(texture, &colors)?;
                *read_back.borrow_mut() = Some(texture.read_pixels()?);
            }
            Ok(())
        });
    }
    {
        let log = log.clone();
        hub.on_unload(move || {
            log.push("unload");
            Ok(())
        });
    }

    game.run().unwrap();

    let entries = log.entries();
    assert_eq!(entries.first().map(String::as_str), Some("initialize"));
    assert_eq!(entries.last().map(String::as_str), Some("unload"));
    assert_eq!(log.count("initialize"), 1);
    assert_eq!(log.count("update"), FRAMES);
    assert_eq!(log.count("unload"), 1);
    // the last update requests the exit, so its frame is never drawn
    assert!(log.count("draw") < FRAMES);
    assert!(handle.exit_requested());

    if log.count("draw") > 0 {
        assert_eq!(
            read_back.borrow().as_deref(),
            Some(checkerboard(Size::new(5, 3)).as_slice())
        );
    }
}
