use netmap_rs_renderer::{LayoutOverrides, RenderOptions, ViewMode, render_topology};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopologyRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    mode: Option<ViewMode>,
    overrides: Option<LayoutOverrides>,
}

fn build_render_options(options: TopologyRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("modern") {
        RenderOptions::modern()
    } else {
        RenderOptions::classic()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(mode) = options.mode {
        render_options.mode = mode;
    }
    if let Some(overrides) = options.overrides {
        render_options.overrides = overrides;
    }

    render_options
}

#[wasm_bindgen]
pub fn render_topology_svg(document: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<TopologyRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        TopologyRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_topology(document, &render_options).map_err(|error| JsValue::from_str(&format!("{error:#}")))
}

#[cfg(test)]
mod tests {
    use netmap_rs_renderer::{ViewMode, render_topology};

    use crate::{TopologyRenderOptions, build_render_options};

    #[test]
    fn renders_admin_view_from_json_options() {
        let document = r#"
sites:
  - id: hq
    devices:
      - id: r1
        type: router
        vpn_connections:
          - to_site: branch
  - id: branch
    devices:
      - id: r2
        type: router
"#;
        let options: TopologyRenderOptions =
            serde_json::from_str(r#"{"theme": "modern", "mode": "admin"}"#).expect("options");
        let options = build_render_options(options);
        assert_eq!(options.mode, ViewMode::Admin);

        let svg = render_topology(document, &options).expect("topology should render");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("data-editable"));
        assert!(svg.contains("vpn:r1-&gt;branch#0"));
    }
}
