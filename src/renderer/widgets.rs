use crate::config::AppConfig;
use crate::format;
use crate::quality::{classify, AxisScale};
use crate::renderer::colours::Colours;
use crate::renderer::fonts::{FontConfig, Fonts};
use crate::renderer::projection::MapProjection;
use crate::renderer::drawing;
use crate::state::AppState;
use image::{Rgba, RgbaImage};

/// A rectangular slot of the dashboard plus everything a widget may read.
pub(crate) struct RenderContext<'a> {
    pub config: &'a AppConfig,
    pub state: &'a AppState,
    pub fonts: &'a Fonts,
    pub image: &'a mut RgbaImage,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn put_text(image: &mut RgbaImage, font: &Option<FontConfig>, colour: Rgba<u8>, x: u32, y: u32, text: &str) {
    if let Some(font) = font {
        drawing::text(image, colour, x as i32, y as i32, font, text);
    }
}

pub fn render_header(ctx: &mut RenderContext) {
    let colours = Colours::default();
    let fc_regular = ctx.fonts.regular();

    let filter = &ctx.state.filter;
    let scope = match (filter.city.as_str(), filter.district.as_str()) {
        ("", _) => "All locations".to_string(),
        (city, "") => format!("All {}", city),
        (city, district) => format!("{} / {}", city, district),
    };
    let header_text = format!(
        "AIR QUALITY | {} | {} points | {}",
        ctx.config.api.base_url,
        ctx.state.locations.len(),
        scope
    );
    put_text(ctx.image, &fc_regular, colours.header, ctx.x + 5, ctx.y + 4, &header_text);

    let last_update = ctx.state.last_update.as_deref().unwrap_or(format::MISSING);
    put_text(
        ctx.image,
        &fc_regular,
        colours.header,
        (ctx.x + ctx.width).saturating_sub(150),
        ctx.y + 4,
        last_update,
    );
}

pub fn render_map(ctx: &mut RenderContext) {
    let colours = Colours::default();
    let palette = &ctx.config.colours;
    let thresholds = &ctx.state.thresholds;

    drawing::filled_rect(ctx.image, ctx.x as i32, ctx.y as i32, ctx.width, ctx.height, colours.panel);

    let projection = MapProjection {
        center_lat: ctx.config.map.center_lat,
        center_lon: ctx.config.map.center_lon,
        span_deg: ctx.config.map.span_deg,
        x: ctx.x as i32,
        y: ctx.y as i32,
        width: ctx.width,
        height: ctx.height,
    };
    let clip = (ctx.x as i32, ctx.y as i32, ctx.width, ctx.height);

    // Graticule every tenth of the span
    for i in 1..10 {
        let gx = ctx.x + ctx.width * i / 10;
        let gy = ctx.y + ctx.height * i / 10;
        drawing::segment(ctx.image, (gx as f32, ctx.y as f32), (gx as f32, (ctx.y + ctx.height) as f32), colours.grid);
        drawing::segment(ctx.image, (ctx.x as f32, gy as f32), ((ctx.x + ctx.width) as f32, gy as f32), colours.grid);
    }

    let layers = ctx.state.layers;

    // Heatmap only includes locations that actually report TVOC
    if layers.heatmap {
        for loc in ctx.state.locations.iter().filter(|loc| loc.tvoc_ppb.is_some()) {
            let Some((lat, lon)) = loc.position() else {
                continue;
            };
            let c = classify(None, loc.tvoc_ppb, thresholds);
            let centre = projection.project(lat, lon);
            drawing::translucent_disc(ctx.image, centre, 35, c.colour(palette), c.intensity(), true, clip);
        }
    }

    if layers.circles {
        for loc in &ctx.state.locations {
            let Some((lat, lon)) = loc.position() else {
                continue;
            };
            let c = classify(loc.status.as_deref(), loc.tvoc_ppb, thresholds);
            let centre = projection.project(lat, lon);
            let radius = projection.metres_to_px(c.radius_m());
            drawing::translucent_disc(ctx.image, centre, radius, c.colour(palette), 0.2, false, clip);
            if projection.contains(centre) {
                drawing::ring(ctx.image, centre, radius, c.colour(palette));
            }
        }
    }

    let fc_small = ctx.fonts.small();
    let selected = ctx.state.selected.as_deref();
    if layers.markers {
        for loc in &ctx.state.locations {
            // Unplaceable points stay selectable but are not drawn
            let Some((lat, lon)) = loc.position() else {
                continue;
            };
            let centre = projection.project(lat, lon);
            if !projection.contains(centre) {
                continue;
            }
            let c = classify(loc.status.as_deref(), loc.tvoc_ppb, thresholds);
            drawing::marker(ctx.image, centre, c.colour(palette));
            if selected.is_some() && loc.device_key() == selected {
                drawing::ring(ctx.image, centre, 13, colours.text);
            }
            put_text(
                ctx.image,
                &fc_small,
                colours.text,
                (centre.0 + 12).max(0) as u32,
                (centre.1 - 8).max(0) as u32,
                loc.display_name(),
            );
        }
    }

    // Legend
    let legend = [
        ("GOOD", palette.good),
        ("MODERATE", palette.moderate),
        ("POOR", palette.poor),
        ("NO DATA", palette.no_data),
    ];
    let mut lx = ctx.x + 8;
    let ly = (ctx.y + ctx.height).saturating_sub(22);
    for (label, colour) in legend {
        drawing::filled_rect(ctx.image, lx as i32, ly as i32 + 3, 12, 12, colour);
        put_text(ctx.image, &fc_small, colours.muted, lx + 16, ly, label);
        lx += 100;
    }

    drawing::frame(ctx.image, ctx.x as i32, ctx.y as i32, ctx.width, ctx.height);
}

pub fn render_detail(ctx: &mut RenderContext) {
    let colours = Colours::default();
    let fc_title = ctx.fonts.title();
    let fc_regular = ctx.fonts.regular();
    let x = ctx.x + 8;
    let mut y_pos = ctx.y + 4;

    let Some(detail) = ctx.state.detail.as_ref() else {
        let message = match ctx.state.selected.as_deref() {
            Some(id) => format!("Waiting for {}...", id),
            None => "Select a location (select <device>)".to_string(),
        };
        put_text(ctx.image, &fc_regular, colours.muted, x, y_pos, &message);
        return;
    };

    put_text(ctx.image, &fc_title, colours.text, x, y_pos, &detail.name);
    if detail.stale {
        put_text(ctx.image, &fc_regular, colours.stale, (ctx.x + ctx.width).saturating_sub(90), y_pos, "(stale)");
    }
    y_pos += 28;

    // Badge
    let badge_colour = detail.classification.colour(&ctx.config.colours);
    drawing::filled_rect(ctx.image, x as i32, y_pos as i32, 130, 24, badge_colour);
    put_text(ctx.image, &fc_regular, colours.background, x + 8, y_pos + 3, detail.classification.label());
    put_text(ctx.image, &fc_regular, colours.muted, x + 145, y_pos + 3, &format!("Score {}", detail.score));
    y_pos += 32;

    let column = ctx.width / 2;
    let rows = [
        ("TVOC", &detail.tvoc, "eCO2", &detail.eco2),
        ("Temp", &detail.temperature, "Humidity", &detail.humidity),
    ];
    for (left_label, left, right_label, right) in rows {
        put_text(ctx.image, &fc_regular, colours.text, x, y_pos, &format!("{}: {}", left_label, left));
        put_text(ctx.image, &fc_regular, colours.text, x + column, y_pos, &format!("{}: {}", right_label, right));
        y_pos += 22;
    }
    put_text(ctx.image, &fc_regular, colours.text, x, y_pos, &format!("Pressure: {}", detail.pressure));
    y_pos += 22;
    put_text(ctx.image, &fc_regular, colours.muted, x, y_pos, &format!("Updated: {}", detail.updated));
    y_pos += 22;

    if let Some(latest) = ctx.state.latest_alert.as_ref() {
        let latest_text = format!(
            "Latest alert: {} at {}",
            latest.status.as_deref().unwrap_or("ALERT"),
            format::format_alert_time(latest.ts.as_deref())
        );
        put_text(ctx.image, &fc_regular, colours.stale, x, y_pos, &latest_text);
    }
}

pub fn render_alerts(ctx: &mut RenderContext) {
    let colours = Colours::default();
    let fc_title = ctx.fonts.title();
    let fc_small = ctx.fonts.small();
    let x = ctx.x + 8;
    let mut y_pos = ctx.y + 4;

    put_text(ctx.image, &fc_title, colours.header, x, y_pos, "RECENT ALERTS");
    y_pos += 26;

    let Some(history) = ctx.state.alerts.as_ref() else {
        return;
    };
    if history.items.is_empty() {
        put_text(ctx.image, &fc_small, colours.muted, x, y_pos, "No recent alerts");
        return;
    }

    let limit = ctx.config.api.alert_limit as usize;
    for item in history.items.iter().take(limit) {
        if y_pos + 18 > ctx.y + ctx.height {
            break;
        }
        let status = item.status.as_deref().unwrap_or("ALERT");
        let tier = classify(item.status.as_deref().or(Some("WARN")), None, &ctx.state.thresholds);
        drawing::filled_rect(ctx.image, x as i32, y_pos as i32 + 3, 8, 12, tier.colour(&ctx.config.colours));
        let line = format!(
            "{}  TVOC: {} ppb, eCO2: {} ppm  {}",
            format::format_alert_time(item.ts.as_deref()),
            format::or_na(item.tvoc_ppb),
            format::or_na(item.eco2_ppm),
            status
        );
        put_text(ctx.image, &fc_small, colours.text, x + 14, y_pos, &line);
        y_pos += 20;
    }
}

fn scale_y(value: f64, scale: &AxisScale, top: u32, height: u32) -> f32 {
    let span = if scale.span() == 0.0 { 1.0 } else { scale.span() };
    let ratio = ((value - scale.min) / span).clamp(0.0, 1.0);
    (top as f64 + height as f64 * (1.0 - ratio)) as f32
}

pub fn render_chart(ctx: &mut RenderContext) {
    let colours = Colours::default();
    let fc_small = ctx.fonts.small();
    let chart = &ctx.state.chart;

    let margin_x = 50;
    let legend_height = 20;
    let label_height = 18;
    let left = ctx.x + margin_x;
    let top = ctx.y + legend_height;
    let plot_width = ctx.width.saturating_sub(margin_x * 2);
    let plot_height = ctx.height.saturating_sub(legend_height + label_height);

    // Legend
    let legend = [
        ("TVOC (ppb)", colours.tvoc),
        ("eCO2 (ppm)", colours.eco2),
        ("Temp (C)", colours.temperature),
        ("Humidity (%)", colours.humidity),
    ];
    let mut lx = left;
    for (label, colour) in legend {
        drawing::filled_rect(ctx.image, lx as i32, ctx.y as i32 + 5, 10, 10, colour);
        put_text(ctx.image, &fc_small, colours.muted, lx + 14, ctx.y + 2, label);
        lx += plot_width / 4;
    }

    drawing::frame(ctx.image, left as i32, top as i32, plot_width, plot_height);

    if chart.is_empty() || plot_width == 0 || plot_height == 0 {
        put_text(ctx.image, &fc_small, colours.muted, left + 8, top + 8, "No chart data");
        return;
    }

    // Axis bounds
    let air = chart.air_scale;
    let env = chart.env_scale;
    put_text(ctx.image, &fc_small, colours.tvoc, ctx.x + 2, top, &format!("{:.0}", air.max));
    put_text(ctx.image, &fc_small, colours.tvoc, ctx.x + 2, top + plot_height - 14, &format!("{:.0}", air.min));
    put_text(ctx.image, &fc_small, colours.temperature, left + plot_width + 4, top, &format!("{:.1}", env.max));
    put_text(
        ctx.image,
        &fc_small,
        colours.temperature,
        left + plot_width + 4,
        top + plot_height - 14,
        &format!("{:.1}", env.min),
    );

    let n = chart.len();
    let step = if n > 1 { plot_width as f32 / (n - 1) as f32 } else { 0.0 };
    let x_at = |i: usize| left as f32 + step * i as f32;

    let series: [(&[Option<f64>], &AxisScale, Rgba<u8>, Option<f32>); 4] = [
        (chart.tvoc.as_slice(), &air, colours.tvoc, None),
        (chart.eco2.as_slice(), &air, colours.eco2, None),
        (chart.temperature.as_slice(), &env, colours.temperature, Some(5.0)),
        (chart.humidity.as_slice(), &env, colours.humidity, Some(3.0)),
    ];
    for (values, scale, colour, dash) in series {
        for i in 1..values.len() {
            let (Some(a), Some(b)) = (values[i - 1], values[i]) else {
                continue;
            };
            let from = (x_at(i - 1), scale_y(a, scale, top, plot_height));
            let to = (x_at(i), scale_y(b, scale, top, plot_height));
            match dash {
                Some(dash) => drawing::dashed_segment(ctx.image, from, to, dash, colour),
                None => drawing::segment(ctx.image, from, to, colour),
            }
        }
        if values.len() == 1 {
            if let Some(v) = values[0] {
                let y = scale_y(v, scale, top, plot_height) as i32;
                drawing::filled_rect(ctx.image, x_at(0) as i32 - 1, y - 1, 3, 3, colour);
            }
        }
    }

    // At most ten time labels
    let every = (n / 10).max(1);
    for (i, label) in chart.labels.iter().enumerate().step_by(every) {
        put_text(ctx.image, &fc_small, colours.muted, x_at(i) as u32, top + plot_height + 2, label);
    }
}
