use crate::ir::ConnectionKind;
use crate::layout::text::{text_width, truncate_to_width};
use crate::layout::{DeviceLayout, Layout, Point, RoutedEdge, SiteLayout, shows_vm_list};
use crate::theme::Theme;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

const LEGEND_HEIGHT: f32 = 44.0;
const LABEL_PAD_X: f32 = 6.0;
const LABEL_PAD_Y: f32 = 3.0;
const CARD_ACCENT: f32 = 6.0;
const CARD_PAD_X: f32 = 10.0;
const VM_LINE: f32 = 14.0;
const VM_LIST_TOP: f32 = 72.0;
const HANDLE_RADIUS: f32 = 4.5;

/// Read-only public view or editable admin view. Only the mutation
/// affordances differ; geometry is the same.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Public,
    Admin,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Public => "public",
            ViewMode::Admin => "admin",
        }
    }

    pub fn editable(self) -> bool {
        self == ViewMode::Admin
    }
}

/// Stroke width and dash pattern for a connection kind.
pub fn edge_stroke(kind: ConnectionKind) -> (f32, Option<&'static str>) {
    match kind {
        ConnectionKind::Standard => (1.5, None),
        ConnectionKind::Vpn => (2.0, Some("8 4")),
        ConnectionKind::Trunk => (4.0, None),
        ConnectionKind::San => (2.0, Some("10 4 2 4")),
    }
}

pub fn render_svg(layout: &Layout, theme: &Theme, mode: ViewMode) -> String {
    let mut svg = String::new();
    let vb = layout.view_box;
    let width = vb.width.max(200.0);
    let height = vb.height.max(200.0) + LEGEND_HEIGHT;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{:.2} {:.2} {width:.2} {height:.2}\" data-mode=\"{}\"{}>",
        vb.x,
        vb.y,
        mode.as_str(),
        if mode.editable() { " data-editable=\"true\"" } else { "" }
    ));
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"/>",
        vb.x, vb.y, theme.background
    ));

    svg.push_str("<g class=\"sites\">");
    for site in &layout.sites {
        svg.push_str(&site_svg(site, theme));
    }
    svg.push_str("</g>");

    // VPN tunnels draw last so they sit above the other links.
    svg.push_str("<g class=\"edges\">");
    let ordered = layout
        .edges
        .iter()
        .filter(|edge| edge.kind != ConnectionKind::Vpn)
        .chain(layout.edges_of_kind(ConnectionKind::Vpn));
    for edge in ordered {
        svg.push_str(&edge_svg(edge, theme));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"devices\">");
    for device in &layout.devices {
        svg.push_str(&device_svg(device, theme, mode));
    }
    svg.push_str("</g>");

    if mode.editable() {
        svg.push_str("<g class=\"edit-handles\">");
        for edge in &layout.edges {
            svg.push_str(&handles_svg(edge, theme));
        }
        svg.push_str("</g>");
    }

    svg.push_str(&legend_svg(vb.x + 20.0, vb.y + vb.height.max(200.0) + 8.0, theme));
    svg.push_str("</svg>");
    svg
}

fn site_svg(site: &SiteLayout, theme: &Theme) -> String {
    let mut out = String::new();
    let palette = &site.palette;
    out.push_str(&format!(
        "<g class=\"site\" data-site-id=\"{}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"12\" ry=\"12\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
        escape_xml(&site.id),
        site.x,
        site.y,
        site.width,
        site.height,
        palette.fill,
        palette.stroke
    ));
    let header = site.header;
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\"/>",
        header.x, header.y, header.width, header.height, palette.header_fill
    ));
    let center_x = header.x + header.width / 2.0;
    let title_size = theme.font_size + 2.0;
    let max_text = header.width - 2.0 * CARD_PAD_X;
    let title_y = if site.location.is_empty() {
        header.y + header.height / 2.0 + title_size * 0.35
    } else {
        header.y + title_size + 4.0
    };
    out.push_str(&text_svg(
        center_x,
        title_y,
        &truncate_to_width(&site.name, max_text, title_size),
        title_size,
        &palette.header_text,
        theme,
        "middle",
        true,
    ));
    if !site.location.is_empty() {
        let sub_size = theme.font_size - 2.0;
        out.push_str(&text_svg(
            center_x,
            header.y + header.height - 7.0,
            &truncate_to_width(&site.location, max_text, sub_size),
            sub_size,
            &palette.header_text,
            theme,
            "middle",
            false,
        ));
    }
    out.push_str("</g>");
    out
}

fn edge_svg(edge: &RoutedEdge, theme: &Theme) -> String {
    let mut out = String::new();
    let (stroke_width, dash) = edge_stroke(edge.kind);
    let dash_attr = dash
        .map(|pattern| format!(" stroke-dasharray=\"{pattern}\""))
        .unwrap_or_default();
    out.push_str(&format!(
        "<g class=\"edge edge-{kind}\" data-edge-id=\"{}\" data-source=\"{}\" data-target=\"{}\"><path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{stroke_width}\"{dash_attr} stroke-linejoin=\"round\"/>",
        escape_xml(&edge.id),
        escape_xml(&edge.source),
        escape_xml(&edge.target),
        points_to_path(&edge.points),
        theme.line_color(edge.kind),
        kind = edge.kind.as_str(),
    ));

    if let Some(label) = &edge.label {
        let size = theme.font_size - 1.0;
        let (x, y) = edge.label_anchor;
        let w = text_width(label, size) + 2.0 * LABEL_PAD_X;
        let h = size + 2.0 * LABEL_PAD_Y;
        out.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
            x - w / 2.0,
            y - h / 2.0,
            h / 2.0,
            h / 2.0,
            theme.edge_label_background,
            theme.edge_label_border
        ));
        out.push_str(&text_svg(
            x,
            y + size * 0.35,
            label,
            size,
            theme.line_color(edge.kind),
            theme,
            "middle",
            false,
        ));
    }
    out.push_str("</g>");
    out
}

fn device_svg(device: &DeviceLayout, theme: &Theme, mode: ViewMode) -> String {
    let mut out = String::new();
    let class = if mode.editable() {
        format!("device device-{} draggable", device.kind.as_str())
    } else {
        format!("device device-{}", device.kind.as_str())
    };
    let accent = theme.device_accent(device.kind);
    out.push_str(&format!(
        "<g class=\"{class}\" data-device-id=\"{}\" data-type=\"{}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        escape_xml(&device.id),
        escape_xml(&device.device_type),
        device.x,
        device.y,
        device.width,
        device.height,
        theme.device_fill,
        theme.device_border
    ));
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{CARD_ACCENT}\" rx=\"3\" ry=\"3\" fill=\"{accent}\"/>",
        device.x, device.y, device.width
    ));

    let left = device.x + CARD_PAD_X;
    let max_text = device.width - 2.0 * CARD_PAD_X;
    let size = theme.font_size;
    let small = theme.font_size - 2.0;
    let mut line_y = device.y + CARD_ACCENT + size + 4.0;
    out.push_str(&text_svg(
        left,
        line_y,
        &truncate_to_width(&device.name, max_text, size),
        size,
        &theme.text_color,
        theme,
        "start",
        true,
    ));

    let mut details: Vec<String> = Vec::new();
    let type_line = match &device.hypervisor_type {
        Some(hv) if shows_vm_list(device.kind) => format!("{} · {}", device.device_type, hv),
        _ => device.device_type.clone(),
    };
    details.push(type_line);
    if let Some(ip) = &device.ip {
        details.push(ip.clone());
    }
    let platform: Vec<&str> = [device.model.as_deref(), device.os.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !platform.is_empty() {
        details.push(platform.join(" / "));
    }

    let details_bottom = if shows_vm_list(device.kind) {
        device.y + VM_LIST_TOP - 4.0
    } else {
        device.y + device.height - 4.0
    };
    for detail in details {
        if line_y + small + 3.0 > details_bottom {
            break;
        }
        line_y += small + 3.0;
        out.push_str(&text_svg(
            left,
            line_y,
            &truncate_to_width(&detail, max_text, small),
            small,
            &theme.muted_text_color,
            theme,
            "start",
            false,
        ));
    }

    if shows_vm_list(device.kind) && !device.virtual_machines.is_empty() {
        out.push_str(&vm_list_svg(device, theme));
    }
    out.push_str("</g>");
    out
}

fn vm_list_svg(device: &DeviceLayout, theme: &Theme) -> String {
    let mut out = String::new();
    let small = theme.font_size - 2.0;
    let top = device.y + VM_LIST_TOP;
    let left = device.x + CARD_PAD_X;
    let max_text = device.width - 2.0 * CARD_PAD_X;
    out.push_str(&format!(
        "<line x1=\"{left:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
        top - 2.0,
        device.x + device.width - CARD_PAD_X,
        top - 2.0,
        theme.device_border
    ));

    let capacity = (((device.height - VM_LIST_TOP - 4.0) / VM_LINE).floor().max(0.0)) as usize;
    let total = device.virtual_machines.len();
    let shown = if total > capacity {
        capacity.saturating_sub(1)
    } else {
        total
    };
    for (idx, vm) in device.virtual_machines.iter().take(shown).enumerate() {
        let mut line = vm.name.clone();
        if let Some(ip) = &vm.ip {
            line.push_str(&format!(" ({ip})"));
        }
        if let Some(os) = &vm.os {
            line.push_str(&format!(" {os}"));
        }
        out.push_str(&text_svg(
            left,
            top + (idx as f32 + 1.0) * VM_LINE - 3.0,
            &truncate_to_width(&line, max_text, small),
            small,
            &theme.text_color,
            theme,
            "start",
            false,
        ));
    }
    if shown < total && capacity > 0 {
        out.push_str(&text_svg(
            left,
            top + (shown as f32 + 1.0) * VM_LINE - 3.0,
            &format!("+{} more", total - shown),
            small,
            &theme.muted_text_color,
            theme,
            "start",
            false,
        ));
    }
    out
}

/// Drag handles on interior path points, plus one at each segment midpoint
/// where a new waypoint can be inserted.
fn handles_svg(edge: &RoutedEdge, theme: &Theme) -> String {
    let mut out = String::new();
    let interior = edge.points.len().saturating_sub(1);
    for (idx, point) in edge.points.iter().enumerate().take(interior).skip(1) {
        out.push_str(&format!(
            "<circle class=\"waypoint\" data-edge-id=\"{}\" data-index=\"{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{HANDLE_RADIUS}\" fill=\"{}\"/>",
            escape_xml(&edge.id),
            idx - 1,
            point.0,
            point.1,
            theme.handle_color
        ));
    }
    for (idx, seg) in edge.points.windows(2).enumerate() {
        let mid = ((seg[0].0 + seg[1].0) / 2.0, (seg[0].1 + seg[1].1) / 2.0);
        out.push_str(&format!(
            "<circle class=\"waypoint-insert\" data-edge-id=\"{}\" data-index=\"{idx}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>",
            escape_xml(&edge.id),
            mid.0,
            mid.1,
            HANDLE_RADIUS - 1.0,
            theme.handle_color
        ));
    }
    out
}

fn legend_svg(x: f32, y: f32, theme: &Theme) -> String {
    let mut out = String::from("<g class=\"legend\">");
    let size = theme.font_size - 1.0;
    let mut cursor = x;
    for kind in ConnectionKind::all() {
        let (stroke_width, dash) = edge_stroke(kind);
        let dash_attr = dash
            .map(|pattern| format!(" stroke-dasharray=\"{pattern}\""))
            .unwrap_or_default();
        let line_y = y + LEGEND_HEIGHT / 2.0 - 4.0;
        out.push_str(&format!(
            "<line x1=\"{cursor:.2}\" y1=\"{line_y:.2}\" x2=\"{:.2}\" y2=\"{line_y:.2}\" stroke=\"{}\" stroke-width=\"{stroke_width}\"{dash_attr}/>",
            cursor + 36.0,
            theme.line_color(kind)
        ));
        let name = kind.default_label().unwrap_or("Link");
        out.push_str(&text_svg(
            cursor + 44.0,
            line_y + size * 0.35,
            name,
            size,
            &theme.text_color,
            theme,
            "start",
            false,
        ));
        cursor += 44.0 + text_width(name, size) + 28.0;
    }
    out.push_str("</g>");
    out
}

#[allow(clippy::too_many_arguments)]
fn text_svg(
    x: f32,
    y: f32,
    text: &str,
    size: f32,
    fill: &str,
    theme: &Theme,
    anchor: &str,
    bold: bool,
) -> String {
    let weight = if bold { " font-weight=\"600\"" } else { "" };
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{size}\" fill=\"{fill}\"{weight}>{}</text>",
        escape_xml(&theme.font_family),
        escape_xml(text)
    )
}

fn points_to_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (idx, point) in points.iter().enumerate() {
        let cmd = if idx == 0 { "M" } else { " L" };
        d.push_str(&format!("{cmd} {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &crate::config::RenderConfig,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
