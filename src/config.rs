use crate::ir::ConnectionKind;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Colours for one site: the background box and its header tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub fill: String,
    pub stroke: String,
    pub header_fill: String,
    pub header_text: String,
}

impl Palette {
    pub fn blue() -> Self {
        Self {
            fill: "#EFF6FF".to_string(),
            stroke: "#93C5FD".to_string(),
            header_fill: "#2563EB".to_string(),
            header_text: "#FFFFFF".to_string(),
        }
    }

    pub fn green() -> Self {
        Self {
            fill: "#ECFDF5".to_string(),
            stroke: "#6EE7B7".to_string(),
            header_fill: "#059669".to_string(),
            header_text: "#FFFFFF".to_string(),
        }
    }

    pub fn amber() -> Self {
        Self {
            fill: "#FFFBEB".to_string(),
            stroke: "#FCD34D".to_string(),
            header_fill: "#D97706".to_string(),
            header_text: "#FFFFFF".to_string(),
        }
    }
}

/// Sites whose id starts with `prefix` use `palette`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteRule {
    pub prefix: String,
    pub palette: Palette,
}

/// Routing constants for one connection kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindRouting {
    /// Anchors closer than this vertically count as the same row.
    pub y_tolerance: f32,
    /// Anchors closer than this horizontally count as the same column.
    pub x_tolerance: f32,
    pub base_offset: f32,
    pub stagger_step: f32,
    /// Horizontal distance above which the long-range bridge route is used.
    pub cross_site_threshold: f32,
    /// Horizontal run out of / into a device before the first bend.
    pub clearance: f32,
    pub label_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub standard: KindRouting,
    pub vpn: KindRouting,
    pub trunk: KindRouting,
    pub san: KindRouting,
}

impl RoutingConfig {
    pub fn for_kind(&self, kind: ConnectionKind) -> &KindRouting {
        match kind {
            ConnectionKind::Standard => &self.standard,
            ConnectionKind::Vpn => &self.vpn,
            ConnectionKind::Trunk => &self.trunk,
            ConnectionKind::San => &self.san,
        }
    }

    fn for_kind_mut(&mut self, kind: ConnectionKind) -> &mut KindRouting {
        match kind {
            ConnectionKind::Standard => &mut self.standard,
            ConnectionKind::Vpn => &mut self.vpn,
            ConnectionKind::Trunk => &mut self.trunk,
            ConnectionKind::San => &mut self.san,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            standard: KindRouting {
                y_tolerance: 10.0,
                x_tolerance: 10.0,
                base_offset: 30.0,
                stagger_step: 12.0,
                cross_site_threshold: 600.0,
                clearance: 14.0,
                label_offset: 8.0,
            },
            vpn: KindRouting {
                y_tolerance: 16.0,
                x_tolerance: 16.0,
                base_offset: 60.0,
                stagger_step: 20.0,
                cross_site_threshold: 300.0,
                clearance: 24.0,
                label_offset: 12.0,
            },
            trunk: KindRouting {
                y_tolerance: 12.0,
                x_tolerance: 12.0,
                base_offset: 40.0,
                stagger_step: 16.0,
                cross_site_threshold: 500.0,
                clearance: 22.0,
                label_offset: 10.0,
            },
            san: KindRouting {
                y_tolerance: 14.0,
                x_tolerance: 14.0,
                base_offset: 52.0,
                stagger_step: 18.0,
                cross_site_threshold: 500.0,
                clearance: 30.0,
                label_offset: 10.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub origin_x: f32,
    pub origin_y: f32,
    /// Horizontal distance between the left edges of consecutive sites.
    pub site_pitch: f32,
    pub max_columns: usize,
    pub group_gutter: f32,
    pub site_padding: f32,
    pub site_min_width: f32,
    pub site_min_height: f32,
    pub header_height: f32,
    pub header_gap: f32,
    pub header_width_ratio: f32,
    pub header_offset_ratio: f32,
    pub canvas_margin: f32,
    pub site_palettes: Vec<PaletteRule>,
    pub default_palette: Palette,
    pub routing: RoutingConfig,
}

impl LayoutConfig {
    pub fn palette_for(&self, site_id: &str) -> &Palette {
        self.site_palettes
            .iter()
            .find(|rule| !rule.prefix.is_empty() && site_id.starts_with(rule.prefix.as_str()))
            .map(|rule| &rule.palette)
            .unwrap_or(&self.default_palette)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 60.0,
            origin_y: 110.0,
            site_pitch: 820.0,
            max_columns: 3,
            group_gutter: 48.0,
            site_padding: 40.0,
            site_min_width: 320.0,
            site_min_height: 220.0,
            header_height: 44.0,
            header_gap: 6.0,
            header_width_ratio: 0.6,
            header_offset_ratio: 0.15,
            canvas_margin: 60.0,
            site_palettes: vec![
                PaletteRule {
                    prefix: "hq".to_string(),
                    palette: Palette::blue(),
                },
                PaletteRule {
                    prefix: "branch".to_string(),
                    palette: Palette::green(),
                },
            ],
            default_palette: Palette::amber(),
            routing: RoutingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 900.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    site_palettes: Option<Vec<PaletteRule>>,
    default_palette: Option<Palette>,
    routing: Option<RoutingConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    text_color: Option<String>,
    muted_text_color: Option<String>,
    device_fill: Option<String>,
    device_border: Option<String>,
    standard_line: Option<String>,
    trunk_line: Option<String>,
    san_line: Option<String>,
    vpn_line: Option<String>,
    edge_label_background: Option<String>,
    edge_label_border: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    origin_x: Option<f32>,
    origin_y: Option<f32>,
    site_pitch: Option<f32>,
    max_columns: Option<usize>,
    group_gutter: Option<f32>,
    site_padding: Option<f32>,
    site_min_width: Option<f32>,
    site_min_height: Option<f32>,
    header_height: Option<f32>,
    header_width_ratio: Option<f32>,
    header_offset_ratio: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KindRoutingFile {
    y_tolerance: Option<f32>,
    x_tolerance: Option<f32>,
    base_offset: Option<f32>,
    stagger_step: Option<f32>,
    cross_site_threshold: Option<f32>,
    clearance: Option<f32>,
    label_offset: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct RoutingConfigFile {
    standard: Option<KindRoutingFile>,
    vpn: Option<KindRoutingFile>,
    trunk: Option<KindRoutingFile>,
    san: Option<KindRoutingFile>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Layer a JSON5 config document over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!("unknown theme `{theme_name}`, keeping the default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.muted_text_color {
            config.theme.muted_text_color = v;
        }
        if let Some(v) = vars.device_fill {
            config.theme.device_fill = v;
        }
        if let Some(v) = vars.device_border {
            config.theme.device_border = v;
        }
        if let Some(v) = vars.standard_line {
            config.theme.standard_line = v;
        }
        if let Some(v) = vars.trunk_line {
            config.theme.trunk_line = v;
        }
        if let Some(v) = vars.san_line {
            config.theme.san_line = v;
        }
        if let Some(v) = vars.vpn_line {
            config.theme.vpn_line = v;
        }
        if let Some(v) = vars.edge_label_background {
            config.theme.edge_label_background = v;
        }
        if let Some(v) = vars.edge_label_border {
            config.theme.edge_label_border = v;
        }
    }
    config.render.background = config.theme.background.clone();

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.origin_x {
            target.origin_x = v;
        }
        if let Some(v) = layout.origin_y {
            target.origin_y = v;
        }
        if let Some(v) = layout.site_pitch {
            target.site_pitch = v;
        }
        if let Some(v) = layout.max_columns {
            target.max_columns = v.max(1);
        }
        if let Some(v) = layout.group_gutter {
            target.group_gutter = v;
        }
        if let Some(v) = layout.site_padding {
            target.site_padding = v;
        }
        if let Some(v) = layout.site_min_width {
            target.site_min_width = v;
        }
        if let Some(v) = layout.site_min_height {
            target.site_min_height = v;
        }
        if let Some(v) = layout.header_height {
            target.header_height = v;
        }
        if let Some(v) = layout.header_width_ratio {
            target.header_width_ratio = v;
        }
        if let Some(v) = layout.header_offset_ratio {
            target.header_offset_ratio = v;
        }
    }

    if let Some(rules) = parsed.site_palettes {
        config.layout.site_palettes = rules;
    }
    if let Some(palette) = parsed.default_palette {
        config.layout.default_palette = palette;
    }

    if let Some(routing) = parsed.routing {
        let overrides = [
            (ConnectionKind::Standard, routing.standard),
            (ConnectionKind::Vpn, routing.vpn),
            (ConnectionKind::Trunk, routing.trunk),
            (ConnectionKind::San, routing.san),
        ];
        for (kind, file) in overrides {
            if let Some(file) = file {
                apply_kind_routing(config.layout.routing.for_kind_mut(kind), file);
            }
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    Ok(config)
}

fn apply_kind_routing(target: &mut KindRouting, file: KindRoutingFile) {
    if let Some(v) = file.y_tolerance {
        target.y_tolerance = v;
    }
    if let Some(v) = file.x_tolerance {
        target.x_tolerance = v;
    }
    if let Some(v) = file.base_offset {
        target.base_offset = v;
    }
    if let Some(v) = file.stagger_step {
        target.stagger_step = v;
    }
    if let Some(v) = file.cross_site_threshold {
        target.cross_site_threshold = v;
    }
    if let Some(v) = file.clearance {
        target.clearance = v;
    }
    if let Some(v) = file.label_offset {
        target.label_offset = v;
    }
}
