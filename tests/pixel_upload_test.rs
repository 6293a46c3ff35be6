mod common;

use std::{cell::RefCell, rc::Rc};

use flow_hooks::{
    Color, CpuTexture, GpuTexture, LifecycleHub, PixelTexture, Size, TextureError,
    context::GraphicsHandle, set_texture_pixels, time::GameTime,
};

use crate::common::test_utils::{CallLog, RecordingHost};

fn gradient(size: Size) -> Vec<Color> {
    (0..size.height)
        .flat_map(|y| (0..size.width).map(move |x| Color::new(x as u8, y as u8, 7, 255)))
        .collect()
}

#[test]
fn upload_replaces_every_pixel() {
    let mut texture = CpuTexture::new(4, 3);
    let colors = gradient(texture.size());

    set_texture_pixels(&mut texture, &colors).unwrap();

    assert_eq!(texture.pixels().unwrap(), colors);
    // row-major from the top-left corner
    assert_eq!(texture.pixel(3, 0), Some(Color::new(3, 0, 7, 255)));
    assert_eq!(texture.pixel(0, 2), Some(Color::new(0, 2, 7, 255)));
}

#[test]
fn single_pixel_texture() {
    let mut texture = CpuTexture::new(1, 1);

    set_texture_pixels(&mut texture, &[Color::RED]).unwrap();

    assert_eq!(texture.pixel(0, 0), Some(Color::RED));
}

#[test]
fn later_upload_wins() {
    let mut texture = CpuTexture::new(2, 2);

    set_texture_pixels(&mut texture, &[Color::WHITE; 4]).unwrap();
    set_texture_pixels(&mut texture, &[Color::CORNFLOWER_BLUE; 4]).unwrap();

    assert_eq!(texture.pixels().unwrap(), vec![Color::CORNFLOWER_BLUE; 4]);
}

#[test]
fn wrong_length_is_rejected_without_partial_write() {
    let mut texture = CpuTexture::new(2, 2);
    set_texture_pixels(&mut texture, &[Color::WHITE; 4]).unwrap();

    let too_short = set_texture_pixels(&mut texture, &[Color::BLACK; 3]);
    let too_long = set_texture_pixels(&mut texture, &[Color::BLACK; 5]);
    let empty = set_texture_pixels(&mut texture, &[]);

    assert_eq!(
        too_short,
        Err(TextureError::InvalidBufferSize {
            expected: 4,
            actual: 3
        })
    );
    assert_eq!(
        too_long,
        Err(TextureError::InvalidBufferSize {
            expected: 4,
            actual: 5
        })
    );
    assert_eq!(
        empty,
        Err(TextureError::InvalidBufferSize {
            expected: 4,
            actual: 0
        })
    );
    assert_eq!(texture.pixels().unwrap(), vec![Color::WHITE; 4]);
}

#[test]
fn unallocated_texture_reports_uninitialized_resource() {
    let mut texture = CpuTexture::unallocated(2, 1);

    assert_eq!(
        set_texture_pixels(&mut texture, &[Color::RED, Color::BLUE]),
        Err(TextureError::UninitializedResource)
    );
    assert!(texture.pixels().is_none());

    texture.allocate();
    set_texture_pixels(&mut texture, &[Color::RED, Color::BLUE]).unwrap();
    assert_eq!(texture.pixels().unwrap(), [Color::RED, Color::BLUE]);
}

#[test]
fn gpu_texture_needs_a_running_game() {
    let graphics = GraphicsHandle::default();

    let result = GpuTexture::custom(&graphics, 8, 8);

    assert_eq!(result.err(), Some(TextureError::UninitializedResource));
}

#[test]
fn error_messages_name_both_lengths() {
    let err = TextureError::InvalidBufferSize {
        expected: 16,
        actual: 12,
    };
    let message = err.to_string();

    assert!(message.contains("16"));
    assert!(message.contains("12"));
}

#[test]
fn draw_subscriber_pushes_pixels_each_frame() {
    let log = CallLog::new();
    let hub = LifecycleHub::new();
    let texture = Rc::new(RefCell::new(CpuTexture::unallocated(2, 2)));

    let target = Rc::clone(&texture);
    hub.on_initialize(move || {
        target.borrow_mut().allocate();
        Ok(())
    });
    let target = Rc::clone(&texture);
    let mut frame = 0u8;
    hub.on_draw(move || {
        frame += 1;
        set_texture_pixels(&mut *target.borrow_mut(), &[Color::new(frame, 0, 0, 255); 4])?;
        Ok(())
    });
    let mut host = RecordingHost::new(&log);

    hub.initialize(&mut host).unwrap();
    hub.draw(&GameTime::ZERO, &mut host).unwrap();
    hub.draw(&GameTime::ZERO, &mut host).unwrap();

    assert_eq!(texture.borrow().pixel(1, 1), Some(Color::new(2, 0, 0, 255)));
    assert_eq!(log.count("base:draw"), 2);
}

#[test]
fn upload_error_surfaces_through_the_hub() {
    let log = CallLog::new();
    let hub = LifecycleHub::new();
    let texture = Rc::new(RefCell::new(CpuTexture::new(3, 3)));
    let target = Rc::clone(&texture);
    hub.on_draw(move || {
        set_texture_pixels(&mut *target.borrow_mut(), &[Color::RED; 4])?;
        Ok(())
    });
    let mut host = RecordingHost::new(&log);

    let err = hub.draw(&GameTime::ZERO, &mut host).unwrap_err();

    assert_eq!(
        err.downcast_ref::<TextureError>(),
        Some(&TextureError::InvalidBufferSize {
            expected: 9,
            actual: 4
        })
    );
    assert_eq!(log.count("base:draw"), 0);
    assert_eq!(texture.borrow().pixels().unwrap(), vec![Color::TRANSPARENT; 9]);
}
