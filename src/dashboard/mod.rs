use anyhow::{Context, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use log::debug;

use crate::config::AppConfig;
use crate::renderer::fonts::Fonts;
use crate::renderer::{drawing, widgets};
use crate::state::AppState;

// Render the whole dashboard for one state snapshot
pub fn create_image(config: &AppConfig, fonts: &Fonts, state: &AppState) -> DynamicImage {
    let width = config.dashboard.width.max(200);
    let height = config.dashboard.height.max(150);

    // Fill with black
    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

    // Calculate layout dimensions
    let header_height = 30u32;
    let x_split = (width as f32 * 0.6) as u32;
    let right_width = width - x_split;
    let body_height = height - header_height;

    let y_detail = header_height;
    let y_alerts = header_height + (body_height as f32 * 0.40) as u32;
    let y_chart = header_height + (body_height as f32 * 0.62) as u32;

    let mut header_ctx = widgets::RenderContext {
        config,
        state,
        fonts,
        image: &mut image,
        x: 0,
        y: 0,
        width,
        height: header_height,
    };
    widgets::render_header(&mut header_ctx);

    drawing::horizonal_line(&mut image, 0, header_height - 1, width);

    // LEFT SIDE (60% of width) - map
    let mut map_ctx = widgets::RenderContext {
        config,
        state,
        fonts,
        image: &mut image,
        x: 0,
        y: header_height,
        width: x_split,
        height: body_height,
    };
    widgets::render_map(&mut map_ctx);

    drawing::vertical_line(&mut image, x_split, header_height, height - 1);

    // RIGHT SIDE - detail, alerts, chart stacked
    let mut detail_ctx = widgets::RenderContext {
        config,
        state,
        fonts,
        image: &mut image,
        x: x_split,
        y: y_detail,
        width: right_width,
        height: y_alerts - y_detail,
    };
    widgets::render_detail(&mut detail_ctx);

    drawing::horizonal_line(&mut image, x_split, y_alerts, right_width);

    let mut alerts_ctx = widgets::RenderContext {
        config,
        state,
        fonts,
        image: &mut image,
        x: x_split,
        y: y_alerts + 2,
        width: right_width,
        height: y_chart - y_alerts - 2,
    };
    widgets::render_alerts(&mut alerts_ctx);

    drawing::horizonal_line(&mut image, x_split, y_chart, right_width);

    let mut chart_ctx = widgets::RenderContext {
        config,
        state,
        fonts,
        image: &mut image,
        x: x_split,
        y: y_chart + 4,
        width: right_width,
        height: height - y_chart - 4,
    };
    widgets::render_chart(&mut chart_ctx);

    debug!("Rendered dashboard {}x{}", width, height);
    DynamicImage::ImageRgba8(image)
}

pub fn save_image(config: &AppConfig, image: &DynamicImage) -> Result<()> {
    let target_file = &config.dashboard.file;

    image
        .save(target_file)
        .context(format!("Failed to save dashboard to {}", target_file))
}
