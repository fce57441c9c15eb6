use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Palette;
use crate::ir::{ConnectionKind, DeviceKind, VirtualMachine};

pub type Point = (f32, f32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the interiors intersect on both axes; touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceLayout {
    pub id: String,
    pub site_id: String,
    pub kind: DeviceKind,
    pub device_type: String,
    pub name: String,
    pub ip: Option<String>,
    pub model: Option<String>,
    pub os: Option<String>,
    pub hypervisor_type: Option<String>,
    pub virtual_machines: Vec<VirtualMachine>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DeviceLayout {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Outgoing links leave from the right-middle edge.
    pub fn source_anchor(&self) -> Point {
        (self.x + self.width, self.y + self.height / 2.0)
    }

    /// Incoming links arrive at the left-middle edge.
    pub fn target_anchor(&self) -> Point {
        (self.x, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteLayout {
    pub id: String,
    pub name: String,
    pub location: String,
    pub palette: Palette,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub header: Rect,
    pub devices: Vec<String>,
}

impl SiteLayout {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCase {
    /// Anchors on the same row: out, vertical detour, across, back in.
    Detour,
    /// Anchors in the same column: a single vertical run.
    Vertical,
    /// Long-range link: run above or below both endpoints.
    Bridge,
    /// Z-shaped path through a middle channel.
    Elbow,
    /// Target sits left of the source: exit right, cross between rows, enter left.
    Wrap,
    /// Explicit waypoints supplied by an override.
    Manual,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: ConnectionKind,
    pub label: Option<String>,
    pub points: Vec<Point>,
    pub label_anchor: Point,
    pub stagger: u8,
    pub route: RouteCase,
}

impl RoutedEdge {
    pub fn is_manual(&self) -> bool {
        self.route == RouteCase::Manual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnresolvedReference,
    DuplicateDevice,
    IgnoredOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementRole {
    Device,
    SiteBox,
    SiteHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub entity_id: String,
    pub role: PlacementRole,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Interactive edits layered over a computed layout. They live only for the
/// current session and are not part of the topology document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOverrides {
    /// Device id -> dragged top-left corner.
    pub node_positions: BTreeMap<String, Point>,
    /// Edge id -> explicit waypoints, in insertion order.
    pub edge_waypoints: BTreeMap<String, Vec<Point>>,
}

impl LayoutOverrides {
    pub fn is_empty(&self) -> bool {
        self.node_positions.is_empty() && self.edge_waypoints.is_empty()
    }

    pub fn move_node(&mut self, device_id: &str, position: Point) {
        self.node_positions.insert(device_id.to_string(), position);
    }

    /// Insert a waypoint at `index` (clamped to the end of the list).
    pub fn insert_waypoint(&mut self, edge_id: &str, index: usize, point: Point) {
        let waypoints = self.edge_waypoints.entry(edge_id.to_string()).or_default();
        let index = index.min(waypoints.len());
        waypoints.insert(index, point);
    }

    /// Move an existing waypoint; returns false when there is nothing at `index`.
    pub fn drag_waypoint(&mut self, edge_id: &str, index: usize, point: Point) -> bool {
        match self
            .edge_waypoints
            .get_mut(edge_id)
            .and_then(|waypoints| waypoints.get_mut(index))
        {
            Some(slot) => {
                *slot = point;
                true
            }
            None => false,
        }
    }

    pub fn clear_waypoints(&mut self, edge_id: &str) {
        self.edge_waypoints.remove(edge_id);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub devices: Vec<DeviceLayout>,
    pub sites: Vec<SiteLayout>,
    pub edges: Vec<RoutedEdge>,
    pub diagnostics: Vec<Diagnostic>,
    /// Drawing extents including margins; may start left of / above zero.
    pub view_box: Rect,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn device(&self, id: &str) -> Option<&DeviceLayout> {
        self.devices.iter().find(|device| device.id == id)
    }

    pub fn site(&self, id: &str) -> Option<&SiteLayout> {
        self.sites.iter().find(|site| site.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RoutedEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn edges_of_kind(&self, kind: ConnectionKind) -> impl Iterator<Item = &RoutedEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    /// Flat list of every positioned entity: devices, then each site's box and header.
    pub fn placements(&self) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(self.devices.len() + self.sites.len() * 2);
        for device in &self.devices {
            placements.push(Placement {
                entity_id: device.id.clone(),
                role: PlacementRole::Device,
                x: device.x,
                y: device.y,
                width: device.width,
                height: device.height,
            });
        }
        for site in &self.sites {
            placements.push(Placement {
                entity_id: site.id.clone(),
                role: PlacementRole::SiteBox,
                x: site.x,
                y: site.y,
                width: site.width,
                height: site.height,
            });
            placements.push(Placement {
                entity_id: site.id.clone(),
                role: PlacementRole::SiteHeader,
                x: site.header.x,
                y: site.header.y,
                width: site.header.width,
                height: site.header.height,
            });
        }
        placements
    }
}
