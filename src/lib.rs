#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::LoadError;
pub use ir::{ConnectionKind, Device, DeviceKind, Site, Topology};
pub use layout::{
    Diagnostic, Layout, LayoutOverrides, Placement, RoutedEdge, compute_layout,
    compute_layout_with_overrides,
};
pub use parser::load_topology;
pub use render::{ViewMode, render_svg};
pub use theme::Theme;

/// Everything needed to turn a topology document into SVG.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub mode: ViewMode,
    pub overrides: LayoutOverrides,
}

impl RenderOptions {
    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            ..Default::default()
        }
    }

    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: ViewMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_overrides(mut self, overrides: LayoutOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Load and lay out `document` without rendering.
pub fn layout_topology(document: &str, options: &RenderOptions) -> anyhow::Result<Layout> {
    let topology = load_topology(document)?;
    Ok(compute_layout_with_overrides(
        &topology,
        &options.layout,
        &options.overrides,
    ))
}

/// Load, lay out and render a topology document to SVG.
pub fn render_topology(document: &str, options: &RenderOptions) -> anyhow::Result<String> {
    let layout = layout_topology(document, options)?;
    Ok(render_svg(&layout, &options.theme, options.mode))
}
