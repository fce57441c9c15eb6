use crate::config::LayoutConfig;
use crate::ir::{Device, DeviceKind, Site};

use super::{DeviceLayout, Rect, SiteLayout};

/// Place one site's devices and decorations. `index` is the site's position in
/// the document and fixes its column on the canvas.
pub(super) fn place_site(
    site: &Site,
    index: usize,
    config: &LayoutConfig,
) -> (SiteLayout, Vec<DeviceLayout>) {
    let site_x = config.origin_x + index as f32 * config.site_pitch;
    let site_y = config.origin_y;
    let content_x = site_x + config.site_padding;
    let mut cursor_y = site_y + config.site_padding;
    let max_columns = config.max_columns.max(1);

    let mut order: Vec<usize> = (0..site.devices.len()).collect();
    // Stable: devices keep document order inside their group.
    order.sort_by_key(|idx| site.devices[*idx].kind().priority());

    let mut placed: Vec<Option<DeviceLayout>> = vec![None; site.devices.len()];
    let mut groups = 0usize;
    for group in order.chunk_by(|a, b| {
        site.devices[*a].kind().layout_class() == site.devices[*b].kind().layout_class()
    }) {
        let class = site.devices[group[0]].kind().layout_class();
        let metrics = class.metrics();
        for (slot, device_idx) in group.iter().enumerate() {
            let column = (slot % max_columns) as f32;
            let row = (slot / max_columns) as f32;
            let x = content_x + column * (metrics.width + metrics.gap_x);
            let y = cursor_y + row * (metrics.height + metrics.gap_y);
            placed[*device_idx] = Some(device_layout(
                &site.devices[*device_idx],
                &site.id,
                x,
                y,
                metrics.width,
                metrics.height,
            ));
        }
        let rows = group.len().div_ceil(max_columns) as f32;
        cursor_y += rows * metrics.height + (rows - 1.0) * metrics.gap_y + config.group_gutter;
        groups += 1;
    }

    let devices: Vec<DeviceLayout> = placed.into_iter().flatten().collect();
    let bounds = site_bounds(&devices, (site_x, site_y), config);
    tracing::debug!(
        site = %site.id,
        devices = devices.len(),
        groups,
        width = bounds.width,
        height = bounds.height,
        "placed site"
    );

    let layout = SiteLayout {
        id: site.id.clone(),
        name: site.display_name().to_string(),
        location: site.location.clone(),
        palette: config.palette_for(&site.id).clone(),
        x: bounds.x,
        y: bounds.y,
        width: bounds.width,
        height: bounds.height,
        header: header_rect(&bounds, config),
        devices: site.devices.iter().map(|device| device.id.clone()).collect(),
    };
    (layout, devices)
}

fn device_layout(device: &Device, site_id: &str, x: f32, y: f32, width: f32, height: f32) -> DeviceLayout {
    DeviceLayout {
        id: device.id.clone(),
        site_id: site_id.to_string(),
        kind: device.kind(),
        device_type: device.device_type.clone(),
        name: device.display_name().to_string(),
        ip: device.ip.clone(),
        model: device.model.clone(),
        os: device.os.clone(),
        hypervisor_type: device.hypervisor_type.clone(),
        virtual_machines: if device.kind() == DeviceKind::Hypervisor {
            device.virtual_machines.clone()
        } else {
            Vec::new()
        },
        x,
        y,
        width,
        height,
    }
}

/// Union of the device cells plus padding, grown to the minimum site size.
/// Empty sites get a minimum-size box at `origin`.
pub(super) fn site_bounds<'a, I>(devices: I, origin: (f32, f32), config: &LayoutConfig) -> Rect
where
    I: IntoIterator<Item = &'a DeviceLayout>,
{
    let mut extent: Option<(f32, f32, f32, f32)> = None;
    for device in devices {
        let (x0, y0, x1, y1) = extent.unwrap_or((f32::MAX, f32::MAX, f32::MIN, f32::MIN));
        extent = Some((
            x0.min(device.x),
            y0.min(device.y),
            x1.max(device.x + device.width),
            y1.max(device.y + device.height),
        ));
    }
    let Some((min_x, min_y, max_x, max_y)) = extent else {
        return Rect::new(origin.0, origin.1, config.site_min_width, config.site_min_height);
    };
    let pad = config.site_padding;
    let width = (max_x - min_x + 2.0 * pad).max(config.site_min_width);
    let height = (max_y - min_y + 2.0 * pad).max(config.site_min_height);
    Rect::new(min_x - pad, min_y - pad, width, height)
}

/// Header tab above the box. Width and offset are fixed fractions of the box
/// width, so the tab is only centred when the fractions add up to it.
pub(super) fn header_rect(bounds: &Rect, config: &LayoutConfig) -> Rect {
    Rect::new(
        bounds.x + bounds.width * config.header_offset_ratio,
        bounds.y - config.header_height - config.header_gap,
        bounds.width * config.header_width_ratio,
        config.header_height,
    )
}
