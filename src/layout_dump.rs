use crate::layout::{Diagnostic, Layout, Placement};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub view_box: [f32; 4],
    pub sites: Vec<SiteDump>,
    pub placements: Vec<Placement>,
    pub edges: Vec<EdgeDump>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
pub struct SiteDump {
    pub id: String,
    pub name: String,
    pub location: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub devices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub kind: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub stagger: u8,
    pub route: String,
    pub manual: bool,
    pub points: Vec<[f32; 2]>,
    pub label_anchor: [f32; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let sites = layout
            .sites
            .iter()
            .map(|site| SiteDump {
                id: site.id.clone(),
                name: site.name.clone(),
                location: site.location.clone(),
                x: site.x,
                y: site.y,
                width: site.width,
                height: site.height,
                devices: site.devices.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                kind: edge.kind.as_str().to_string(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
                stagger: edge.stagger,
                route: format!("{:?}", edge.route).to_lowercase(),
                manual: edge.is_manual(),
                points: edge.points.iter().map(|p| [p.0, p.1]).collect(),
                label_anchor: [edge.label_anchor.0, edge.label_anchor.1],
            })
            .collect();

        let vb = layout.view_box;
        Self {
            width: layout.width,
            height: layout.height,
            view_box: [vb.x, vb.y, vb.width, vb.height],
            sites,
            placements: layout.placements(),
            edges,
            diagnostics: layout.diagnostics.clone(),
        }
    }
}

/// Pretty JSON to `output`, or stdout when no path is given.
pub fn write_layout_dump(output: Option<&Path>, layout: &Layout) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout);
    match output {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
