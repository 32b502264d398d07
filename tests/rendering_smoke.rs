use cardforge::{compose_card, CardConfig, GreetingRecord};

fn record() -> GreetingRecord {
    GreetingRecord::new(
        "Asha Rao",
        "CSE",
        "2",
        "Happy New Year",
        "Line1\nLine2",
        "Dream big",
    )
}

#[test]
fn smoke_render_full_scale() {
    let scene = compose_card(&record(), &CardConfig::default(), 1.0).unwrap();
    let image = scene.render(None).unwrap();
    assert_eq!(image.width, scene.logical_width);
    assert_eq!(image.height, scene.logical_height);
    assert_eq!(&image.png_data[0..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn smoke_render_thumbnail_scale() {
    let scene = compose_card(&record(), &CardConfig::default(), 0.55).unwrap();
    let image = scene.render(Some((0x0a, 0x0a, 0x1a))).unwrap();
    assert_eq!(image.width, (scene.logical_width as f32 * 0.55).round() as u32);
    assert_eq!(image.height, (scene.logical_height as f32 * 0.55).round() as u32);
    assert!(!image.png_data.is_empty());
}
