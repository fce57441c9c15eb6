mod routing;
mod sites;
pub(crate) mod text;
pub(crate) mod types;
pub use routing::{is_axis_aligned, path_length, stagger_index};
pub use types::*;
use routing::*;
use sites::*;

use crate::config::LayoutConfig;
use crate::ir::{ConnectionKind, DeviceKind, Topology};
use std::collections::{BTreeMap, BTreeSet};

/// Lay out a topology with no interactive edits applied.
pub fn compute_layout(topology: &Topology, config: &LayoutConfig) -> Layout {
    compute_layout_with_overrides(topology, config, &LayoutOverrides::default())
}

/// Place every site and device, then route every resolvable connection.
///
/// Pure: the same topology, config and overrides always produce the same
/// layout. Connections whose targets do not resolve are left out and reported
/// in `Layout::diagnostics`.
pub fn compute_layout_with_overrides(
    topology: &Topology,
    config: &LayoutConfig,
    overrides: &LayoutOverrides,
) -> Layout {
    let mut diagnostics = Vec::new();
    let mut sites = Vec::with_capacity(topology.sites.len());
    let mut devices = Vec::with_capacity(topology.device_count());

    for (idx, site) in topology.sites.iter().enumerate() {
        let (site_layout, site_devices) = place_site(site, idx, config);
        sites.push(site_layout);
        devices.extend(site_devices);
    }

    // First occurrence wins when ids repeat.
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, device) in devices.iter().enumerate() {
        if index.contains_key(device.id.as_str()) {
            report(
                &mut diagnostics,
                DiagnosticKind::DuplicateDevice,
                &device.id,
                format!(
                    "device id `{}` appears more than once; links resolve to the first one",
                    device.id
                ),
            );
            continue;
        }
        index.insert(device.id.as_str(), idx);
    }
    let index: BTreeMap<String, usize> = index
        .into_iter()
        .map(|(id, idx)| (id.to_string(), idx))
        .collect();

    apply_node_overrides(&mut devices, &mut sites, overrides, config, &mut diagnostics);

    let mut edges = Vec::new();
    let mut used_waypoints: BTreeSet<&str> = BTreeSet::new();
    let mut device_cursor = 0usize;
    for site in &topology.sites {
        for device in &site.devices {
            let source_idx = device_cursor;
            device_cursor += 1;

            for (kind, links) in device.device_links() {
                for (ordinal, link) in links.iter().enumerate() {
                    let id = edge_id(kind, &device.id, &link.to, ordinal);
                    let Some(&target_idx) = index.get(link.to.as_str()) else {
                        report(
                            &mut diagnostics,
                            DiagnosticKind::UnresolvedReference,
                            &id,
                            format!(
                                "{} link from `{}` targets unknown device `{}`",
                                kind.as_str(),
                                device.id,
                                link.to
                            ),
                        );
                        continue;
                    };
                    let edge = build_edge(
                        id,
                        kind,
                        link.label.as_deref(),
                        &devices[source_idx],
                        &devices[target_idx],
                        config,
                        overrides,
                        &mut used_waypoints,
                    );
                    edges.push(edge);
                }
            }

            for (ordinal, vpn) in device.vpn_connections.iter().enumerate() {
                let id = edge_id(ConnectionKind::Vpn, &device.id, &vpn.to_site, ordinal);
                let Some(target_site) = topology.find_site(&vpn.to_site) else {
                    report(
                        &mut diagnostics,
                        DiagnosticKind::UnresolvedReference,
                        &id,
                        format!(
                            "vpn link from `{}` targets unknown site `{}`",
                            device.id, vpn.to_site
                        ),
                    );
                    continue;
                };
                let Some(router) = target_site.gateway_router() else {
                    report(
                        &mut diagnostics,
                        DiagnosticKind::UnresolvedReference,
                        &id,
                        format!(
                            "vpn link from `{}` dropped: site `{}` has no router",
                            device.id, vpn.to_site
                        ),
                    );
                    continue;
                };
                // Resolve inside the target site; a repeated id elsewhere must not capture it.
                let Some(target_idx) = devices.iter().position(|candidate| {
                    candidate.site_id == target_site.id
                        && candidate.id == router.id
                        && candidate.kind == DeviceKind::Router
                }) else {
                    report(
                        &mut diagnostics,
                        DiagnosticKind::UnresolvedReference,
                        &id,
                        format!(
                            "vpn link from `{}` dropped: router `{}` in site `{}` was not placed",
                            device.id, router.id, vpn.to_site
                        ),
                    );
                    continue;
                };
                let edge = build_edge(
                    id,
                    ConnectionKind::Vpn,
                    vpn.label.as_deref(),
                    &devices[source_idx],
                    &devices[target_idx],
                    config,
                    overrides,
                    &mut used_waypoints,
                );
                edges.push(edge);
            }
        }
    }

    for edge_id in overrides.edge_waypoints.keys() {
        if !used_waypoints.contains(edge_id.as_str()) {
            report(
                &mut diagnostics,
                DiagnosticKind::IgnoredOverride,
                edge_id,
                format!("waypoints for unknown edge `{edge_id}` ignored"),
            );
        }
    }

    let view_box = canvas_bounds(&sites, &devices, &edges, config);
    Layout {
        width: view_box.width,
        height: view_box.height,
        view_box,
        devices,
        sites,
        edges,
        diagnostics,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_edge<'o>(
    id: String,
    kind: ConnectionKind,
    label: Option<&str>,
    source: &DeviceLayout,
    target: &DeviceLayout,
    config: &LayoutConfig,
    overrides: &'o LayoutOverrides,
    used_waypoints: &mut BTreeSet<&'o str>,
) -> RoutedEdge {
    let params = config.routing.for_kind(kind);
    let stagger = stagger_index(&id);
    let start = source.source_anchor();
    let end = target.target_anchor();

    let (route, points) = match overrides.edge_waypoints.get_key_value(id.as_str()) {
        Some((key, waypoints)) => {
            used_waypoints.insert(key.as_str());
            (RouteCase::Manual, route_manual(start, waypoints, end))
        }
        None => route_orthogonal(start, end, params, stagger),
    };
    tracing::debug!(edge = %id, ?route, stagger, "routed edge");

    let label = label
        .map(str::to_string)
        .or_else(|| kind.default_label().map(str::to_string));
    RoutedEdge {
        label_anchor: label_anchor(&points, params.label_offset),
        source: source.id.clone(),
        target: target.id.clone(),
        id,
        kind,
        label,
        points,
        stagger,
        route,
    }
}

fn apply_node_overrides(
    devices: &mut [DeviceLayout],
    sites: &mut [SiteLayout],
    overrides: &LayoutOverrides,
    config: &LayoutConfig,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if overrides.node_positions.is_empty() {
        return;
    }
    let mut moved_sites: BTreeSet<String> = BTreeSet::new();
    for (id, &(x, y)) in &overrides.node_positions {
        let mut found = false;
        for device in devices.iter_mut().filter(|device| &device.id == id) {
            device.x = x;
            device.y = y;
            moved_sites.insert(device.site_id.clone());
            found = true;
        }
        if !found {
            report(
                diagnostics,
                DiagnosticKind::IgnoredOverride,
                id,
                format!("position for unknown device `{id}` ignored"),
            );
        }
    }
    for site in sites.iter_mut().filter(|site| moved_sites.contains(&site.id)) {
        let members = devices.iter().filter(|device| device.site_id == site.id);
        let bounds = site_bounds(members, (site.x, site.y), config);
        site.x = bounds.x;
        site.y = bounds.y;
        site.width = bounds.width;
        site.height = bounds.height;
        site.header = header_rect(&bounds, config);
    }
}

fn report(
    diagnostics: &mut Vec<Diagnostic>,
    kind: DiagnosticKind,
    subject: &str,
    message: String,
) {
    tracing::warn!(subject, "{message}");
    diagnostics.push(Diagnostic {
        kind,
        subject: subject.to_string(),
        message,
    });
}

fn canvas_bounds(
    sites: &[SiteLayout],
    devices: &[DeviceLayout],
    edges: &[RoutedEdge],
    config: &LayoutConfig,
) -> Rect {
    let mut min_x = 0.0f32;
    let mut min_y = 0.0f32;
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    let mut include = |x: f32, y: f32| {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    };
    for site in sites {
        include(site.x, site.header.y);
        include(site.x + site.width, site.y + site.height);
    }
    for device in devices {
        include(device.x, device.y);
        include(device.x + device.width, device.y + device.height);
    }
    for edge in edges {
        for &(x, y) in &edge.points {
            include(x, y);
        }
        include(edge.label_anchor.0, edge.label_anchor.1);
    }
    let margin = config.canvas_margin;
    let x = if min_x < 0.0 { min_x - margin } else { 0.0 };
    let y = if min_y < 0.0 { min_y - margin } else { 0.0 };
    Rect::new(x, y, max_x + margin - x, max_y + margin - y)
}

/// Devices grouped by site, for checks that only make sense within one box.
pub fn devices_by_site(layout: &Layout) -> BTreeMap<&str, Vec<&DeviceLayout>> {
    let mut grouped: BTreeMap<&str, Vec<&DeviceLayout>> = BTreeMap::new();
    for device in &layout.devices {
        grouped.entry(device.site_id.as_str()).or_default().push(device);
    }
    grouped
}

/// True for device kinds whose cards list virtual machines.
pub fn shows_vm_list(kind: DeviceKind) -> bool {
    kind == DeviceKind::Hypervisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Device, Link, Site, VpnLink};

    fn link(to: &str) -> Link {
        Link {
            to: to.to_string(),
            label: None,
        }
    }

    fn two_site_topology() -> Topology {
        let mut hq = Site::new("hq");
        let mut r1 = Device::new("hq-r1", "router");
        r1.connections.push(link("hq-sw1"));
        hq.devices.push(r1);
        hq.devices.push(Device::new("hq-sw1", "switch"));

        let mut branch = Site::new("branch");
        let mut br = Device::new("br-r1", "router");
        br.vpn_connections.push(VpnLink {
            to_site: "hq".to_string(),
            label: None,
        });
        branch.devices.push(br);

        let mut topology = Topology::new();
        topology.sites.push(hq);
        topology.sites.push(branch);
        topology
    }

    #[test]
    fn routes_standard_and_vpn_edges() {
        let layout = compute_layout(&two_site_topology(), &LayoutConfig::default());
        assert_eq!(layout.edges.len(), 2);
        let standard = layout.edge("standard:hq-r1->hq-sw1#0").expect("standard edge");
        assert_eq!(standard.label, None);
        let vpn = layout.edge("vpn:br-r1->hq#0").expect("vpn edge");
        assert_eq!(vpn.source, "br-r1");
        assert_eq!(vpn.target, "hq-r1");
        assert_eq!(vpn.label.as_deref(), Some("VPN"));
        assert!(layout.diagnostics.is_empty());
    }

    #[test]
    fn explicit_labels_replace_kind_defaults() {
        let mut topology = two_site_topology();
        topology.sites[0].devices[0].trunk_connections.push(Link {
            to: "hq-sw1".to_string(),
            label: Some("LACP".to_string()),
        });
        topology.sites[0].devices[0].san_connections.push(link("hq-sw1"));
        let layout = compute_layout(&topology, &LayoutConfig::default());
        assert_eq!(
            layout.edge("trunk:hq-r1->hq-sw1#0").and_then(|e| e.label.as_deref()),
            Some("LACP")
        );
        assert_eq!(
            layout.edge("san:hq-r1->hq-sw1#0").and_then(|e| e.label.as_deref()),
            Some("SAN")
        );
    }

    #[test]
    fn dangling_targets_are_dropped_with_a_diagnostic() {
        let mut topology = two_site_topology();
        topology.sites[0].devices[1].connections.push(link("ghost"));
        let layout = compute_layout(&topology, &LayoutConfig::default());
        assert_eq!(layout.edges.len(), 2);
        assert_eq!(layout.diagnostics.len(), 1);
        assert_eq!(layout.diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
        assert_eq!(layout.diagnostics[0].subject, "standard:hq-sw1->ghost#0");
    }

    #[test]
    fn vpn_to_site_without_router_is_dropped() {
        let mut topology = two_site_topology();
        let mut lab = Site::new("lab");
        lab.devices.push(Device::new("lab-sw", "switch"));
        topology.sites.push(lab);
        topology.sites[1].devices[0].vpn_connections.push(VpnLink {
            to_site: "lab".to_string(),
            label: None,
        });
        topology.sites[1].devices[0].vpn_connections.push(VpnLink {
            to_site: "nowhere".to_string(),
            label: None,
        });
        let layout = compute_layout(&topology, &LayoutConfig::default());
        assert_eq!(layout.edges_of_kind(ConnectionKind::Vpn).count(), 1);
        assert_eq!(layout.diagnostics.len(), 2);
    }

    #[test]
    fn duplicate_device_ids_resolve_to_first() {
        let mut topology = two_site_topology();
        topology.sites[1].devices.push(Device::new("hq-sw1", "switch"));
        let layout = compute_layout(&topology, &LayoutConfig::default());
        let edge = layout.edge("standard:hq-r1->hq-sw1#0").expect("edge");
        let first = &layout.devices[1];
        assert_eq!(first.site_id, "hq");
        assert_eq!(*edge.points.last().expect("points"), first.target_anchor());
        assert!(
            layout
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::DuplicateDevice)
        );
    }

    #[test]
    fn vpn_lands_on_the_target_sites_router_despite_repeated_ids() {
        let mut first = Site::new("a");
        first.devices.push(Device::new("r", "switch"));
        let mut hq = Site::new("hq");
        hq.devices.push(Device::new("r", "router"));
        let mut branch = Site::new("br");
        let mut br_router = Device::new("br-r1", "router");
        br_router.vpn_connections.push(VpnLink {
            to_site: "hq".to_string(),
            label: None,
        });
        branch.devices.push(br_router);
        let mut topology = Topology::new();
        topology.sites.extend([first, hq, branch]);

        let layout = compute_layout(&topology, &LayoutConfig::default());
        let vpn = layout.edge("vpn:br-r1->hq#0").expect("vpn edge");
        let hq_router = layout
            .devices
            .iter()
            .find(|d| d.site_id == "hq" && d.id == "r")
            .expect("hq router");
        let a_switch = layout
            .devices
            .iter()
            .find(|d| d.site_id == "a" && d.id == "r")
            .expect("site a switch");
        assert_eq!(vpn.points.last().copied(), Some(hq_router.target_anchor()));
        assert_ne!(vpn.points.last().copied(), Some(a_switch.target_anchor()));
    }

    #[test]
    fn waypoint_override_bypasses_routing() {
        let topology = two_site_topology();
        let mut overrides = LayoutOverrides::default();
        overrides.insert_waypoint("standard:hq-r1->hq-sw1#0", 0, (400.0, 100.0));
        let layout =
            compute_layout_with_overrides(&topology, &LayoutConfig::default(), &overrides);
        let edge = layout.edge("standard:hq-r1->hq-sw1#0").expect("edge");
        assert!(edge.is_manual());
        assert_eq!(edge.points.len(), 3);
        assert_eq!(edge.points[1], (400.0, 100.0));
        let vpn = layout.edge("vpn:br-r1->hq#0").expect("vpn");
        assert!(!vpn.is_manual());
        assert!(layout.diagnostics.is_empty());
    }

    #[test]
    fn unknown_override_ids_are_reported() {
        let mut overrides = LayoutOverrides::default();
        overrides.insert_waypoint("standard:nope->nope#0", 0, (1.0, 1.0));
        overrides.move_node("ghost", (5.0, 5.0));
        let layout = compute_layout_with_overrides(
            &two_site_topology(),
            &LayoutConfig::default(),
            &overrides,
        );
        assert_eq!(layout.diagnostics.len(), 2);
        assert!(
            layout
                .diagnostics
                .iter()
                .all(|d| d.kind == DiagnosticKind::IgnoredOverride)
        );
    }

    #[test]
    fn dragged_device_moves_its_edges_and_site_box() {
        let topology = two_site_topology();
        let config = LayoutConfig::default();
        let before = compute_layout(&topology, &config);
        let mut overrides = LayoutOverrides::default();
        overrides.move_node("hq-sw1", (500.0, 600.0));
        let after = compute_layout_with_overrides(&topology, &config, &overrides);

        let sw = after.device("hq-sw1").expect("switch");
        assert_eq!((sw.x, sw.y), (500.0, 600.0));
        let edge = after.edge("standard:hq-r1->hq-sw1#0").expect("edge");
        assert_eq!(*edge.points.last().expect("points"), sw.target_anchor());

        let hq_before = before.site("hq").expect("hq");
        let hq_after = after.site("hq").expect("hq");
        assert!(hq_after.y + hq_after.height > hq_before.y + hq_before.height);
        assert_eq!(after.site("branch").map(|s| s.x), before.site("branch").map(|s| s.x));
    }

    #[test]
    fn placements_cover_devices_boxes_and_headers() {
        let layout = compute_layout(&two_site_topology(), &LayoutConfig::default());
        let placements = layout.placements();
        assert_eq!(placements.len(), 3 + 2 * 2);
        let headers = placements
            .iter()
            .filter(|p| p.role == PlacementRole::SiteHeader)
            .count();
        assert_eq!(headers, 2);
    }

    #[test]
    fn canvas_contains_every_site() {
        let layout = compute_layout(&two_site_topology(), &LayoutConfig::default());
        for site in &layout.sites {
            assert!(site.x + site.width <= layout.view_box.x + layout.view_box.width);
            assert!(site.header.y >= layout.view_box.y);
        }
    }
}
