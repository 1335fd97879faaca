use crate::renderer::fonts::FontConfig;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

pub fn horizonal_line(image: &mut RgbaImage, x: u32, y: u32, width: u32) {
    draw_line_segment_mut(
        image,
        (x as f32, y as f32),
        ((x + width) as f32, y as f32),
        Rgba([60, 60, 60, 255]),
    );
}

pub fn vertical_line(image: &mut RgbaImage, x: u32, y1: u32, y2: u32) {
    draw_line_segment_mut(
        image,
        (x as f32, y1 as f32),
        (x as f32, y2 as f32),
        Rgba([60, 60, 60, 255]),
    );
}

pub fn segment(image: &mut RgbaImage, from: (f32, f32), to: (f32, f32), colour: Rgba<u8>) {
    draw_line_segment_mut(image, from, to, colour);
}

/// Draws a dashed segment, `dash` pixels on and off.
pub fn dashed_segment(image: &mut RgbaImage, from: (f32, f32), to: (f32, f32), dash: f32, colour: Rgba<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt();
    if length <= f32::EPSILON || dash <= 0.0 {
        draw_line_segment_mut(image, from, to, colour);
        return;
    }

    let mut travelled = 0.0;
    while travelled < length {
        let end = (travelled + dash).min(length);
        let a = (from.0 + dx * travelled / length, from.1 + dy * travelled / length);
        let b = (from.0 + dx * end / length, from.1 + dy * end / length);
        draw_line_segment_mut(image, a, b, colour);
        travelled += dash * 2.0;
    }
}

pub fn text(
    image: &mut RgbaImage,
    colour: Rgba<u8>,
    x: i32,
    y: i32,
    font_config: &FontConfig,
    text: &str,
) {
    draw_text_mut(
        image,
        colour,
        x,
        y,
        font_config.scale,
        &font_config.font,
        text,
    );
}

pub fn filled_rect(image: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, colour: Rgba<u8>) {
    if width == 0 || height == 0 {
        return;
    }
    draw_filled_rect_mut(image, Rect::at(x, y).of_size(width, height), colour);
}

pub fn frame(image: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32) {
    if width == 0 || height == 0 {
        return;
    }
    draw_hollow_rect_mut(
        image,
        Rect::at(x, y).of_size(width, height),
        Rgba([100, 100, 100, 255]),
    );
}

fn blend(base: Rgba<u8>, colour: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, c: u8| (b as f32 * (1.0 - alpha) + c as f32 * alpha).round() as u8;
    Rgba([
        mix(base[0], colour[0]),
        mix(base[1], colour[1]),
        mix(base[2], colour[2]),
        255,
    ])
}

/// Fills a translucent disc clipped to `clip` (x, y, width, height). With
/// `falloff` the opacity fades linearly towards the rim.
pub fn translucent_disc(
    image: &mut RgbaImage,
    centre: (i32, i32),
    radius: i32,
    colour: Rgba<u8>,
    opacity: f32,
    falloff: bool,
    clip: (i32, i32, u32, u32),
) {
    if radius <= 0 {
        return;
    }
    let (cx, cy) = centre;
    let (clip_x, clip_y, clip_w, clip_h) = clip;
    let x_min = (cx - radius).max(clip_x).max(0);
    let y_min = (cy - radius).max(clip_y).max(0);
    let x_max = (cx + radius).min(clip_x + clip_w as i32 - 1).min(image.width() as i32 - 1);
    let y_max = (cy + radius).min(clip_y + clip_h as i32 - 1).min(image.height() as i32 - 1);

    let r = radius as f32;
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let d = (((x - cx) * (x - cx) + (y - cy) * (y - cy)) as f32).sqrt();
            if d > r {
                continue;
            }
            let alpha = if falloff { opacity * (1.0 - d / r) } else { opacity };
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            *pixel = blend(*pixel, colour, alpha);
        }
    }
}

pub fn ring(image: &mut RgbaImage, centre: (i32, i32), radius: i32, colour: Rgba<u8>) {
    if radius > 0 {
        draw_hollow_circle_mut(image, centre, radius, colour);
    }
}

/// A map pin: white-rimmed dot with a small tail underneath.
pub fn marker(image: &mut RgbaImage, centre: (i32, i32), colour: Rgba<u8>) {
    let (cx, cy) = centre;
    let white = Rgba([255, 255, 255, 255]);
    for dy in 0..6 {
        let half = 5 - dy;
        draw_line_segment_mut(
            image,
            ((cx - half) as f32, (cy + 6 + dy) as f32),
            ((cx + half) as f32, (cy + 6 + dy) as f32),
            colour,
        );
    }
    draw_filled_circle_mut(image, (cx, cy), 9, white);
    draw_filled_circle_mut(image, (cx, cy), 7, colour);
}
