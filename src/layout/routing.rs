use crate::config::KindRouting;
use crate::ir::ConnectionKind;

use super::{Point, RouteCase};

const POINT_EPS: f32 = 1e-4;

pub(super) fn edge_id(kind: ConnectionKind, source: &str, target: &str, ordinal: usize) -> String {
    format!("{}:{}->{}#{}", kind.as_str(), source, target, ordinal)
}

/// Sum of the UTF-16 code units of the edge id, mod 3. Parallel links between
/// the same pair of devices differ in their ordinal, so they fan out.
pub fn stagger_index(edge_id: &str) -> u8 {
    let sum = edge_id
        .encode_utf16()
        .fold(0u64, |acc, unit| acc + u64::from(unit));
    (sum % 3) as u8
}

/// Lateral lane for channel shifts: centre, one step right/down, one step left/up.
fn lane(stagger: u8) -> f32 {
    match stagger {
        0 => 0.0,
        1 => 1.0,
        _ => -1.0,
    }
}

/// Pick a route shape from the relative geometry of the anchors and build it.
pub(super) fn route_orthogonal(
    start: Point,
    end: Point,
    params: &KindRouting,
    stagger: u8,
) -> (RouteCase, Vec<Point>) {
    let (sx, sy) = start;
    let (ex, ey) = end;
    let dx = ex - sx;
    let dy = ey - sy;
    let k = f32::from(stagger);
    let offset = params.base_offset + k * params.stagger_step;
    let out_x = sx + params.clearance;
    let in_x = ex - params.clearance;

    let (case, points) = if dy.abs() <= params.y_tolerance {
        let lane_y = if stagger % 2 == 0 {
            sy - offset
        } else {
            sy + offset
        };
        (
            RouteCase::Detour,
            vec![
                start,
                (out_x, sy),
                (out_x, lane_y),
                (in_x, lane_y),
                (in_x, ey),
                end,
            ],
        )
    } else if dx.abs() <= params.x_tolerance {
        let mid_x = (sx + ex) / 2.0 + lane(stagger) * params.stagger_step;
        (
            RouteCase::Vertical,
            vec![start, (mid_x, sy), (mid_x, ey), end],
        )
    } else if dx.abs() > params.cross_site_threshold {
        let lane_y = if stagger % 2 == 0 {
            sy.min(ey) - offset
        } else {
            sy.max(ey) + offset
        };
        (
            RouteCase::Bridge,
            vec![
                start,
                (out_x, sy),
                (out_x, lane_y),
                (in_x, lane_y),
                (in_x, ey),
                end,
            ],
        )
    } else if dx > 2.0 * params.clearance {
        let mid_x = sx + dx / 2.0 + lane(stagger) * params.stagger_step / 2.0;
        (
            RouteCase::Elbow,
            vec![start, (mid_x, sy), (mid_x, ey), end],
        )
    } else {
        let mid_y = (sy + ey) / 2.0 + lane(stagger) * params.stagger_step / 2.0;
        (
            RouteCase::Wrap,
            vec![
                start,
                (out_x, sy),
                (out_x, mid_y),
                (in_x, mid_y),
                (in_x, ey),
                end,
            ],
        )
    };

    (case, compress_path(&points))
}

/// Straight segments through user waypoints; consecutive duplicates are dropped.
pub(super) fn route_manual(start: Point, waypoints: &[Point], end: Point) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::with_capacity(waypoints.len() + 2);
    for point in std::iter::once(start)
        .chain(waypoints.iter().copied())
        .chain(std::iter::once(end))
    {
        if points.last().is_some_and(|last| same_point(*last, point)) {
            continue;
        }
        points.push(point);
    }
    points
}

/// Drop repeated points and interior points that continue a straight run.
pub(super) fn compress_path(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last().is_some_and(|last| same_point(*last, point)) {
            continue;
        }
        while out.len() >= 2 && collinear(out[out.len() - 2], out[out.len() - 1], point) {
            out.pop();
        }
        if out.last().is_some_and(|last| same_point(*last, point)) {
            continue;
        }
        out.push(point);
    }
    out
}

fn same_point(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() <= POINT_EPS && (a.1 - b.1).abs() <= POINT_EPS
}

fn collinear(a: Point, b: Point, c: Point) -> bool {
    let vertical = (a.0 - b.0).abs() <= POINT_EPS && (b.0 - c.0).abs() <= POINT_EPS;
    let horizontal = (a.1 - b.1).abs() <= POINT_EPS && (b.1 - c.1).abs() <= POINT_EPS;
    vertical || horizontal
}

pub fn path_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|seg| {
            let dx = seg[1].0 - seg[0].0;
            let dy = seg[1].1 - seg[0].1;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

/// Every segment runs along exactly one axis.
pub fn is_axis_aligned(points: &[Point]) -> bool {
    points.windows(2).all(|seg| {
        let moves_x = (seg[1].0 - seg[0].0).abs() > POINT_EPS;
        let moves_y = (seg[1].1 - seg[0].1).abs() > POINT_EPS;
        moves_x != moves_y
    })
}

/// Arc-length midpoint, lifted by `lift` so the label clears the stroke.
pub(super) fn label_anchor(points: &[Point], lift: f32) -> Point {
    let Some(&first) = points.first() else {
        return (0.0, 0.0);
    };
    let half = path_length(points) / 2.0;
    let mut walked = 0.0f32;
    for seg in points.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        if len > 0.0 && walked + len >= half {
            let t = (half - walked) / len;
            return (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t - lift);
        }
        walked += len;
    }
    (first.0, first.1 - lift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;

    fn params() -> KindRouting {
        RoutingConfig::default().trunk
    }

    #[test]
    fn stagger_is_char_code_sum_mod_three() {
        // 'a' = 97, 'b' = 98, 'c' = 99
        assert_eq!(stagger_index("a"), 1);
        assert_eq!(stagger_index("b"), 2);
        assert_eq!(stagger_index("c"), 0);
        assert_eq!(stagger_index("abc"), 0);
        assert_eq!(stagger_index(""), 0);
    }

    #[test]
    fn stagger_counts_utf16_units() {
        // U+1F600 is a surrogate pair: 0xD83D + 0xDE00
        let expected = ((0xD83Du64 + 0xDE00u64) % 3) as u8;
        assert_eq!(stagger_index("\u{1F600}"), expected);
    }

    #[test]
    fn consecutive_ordinals_cover_all_stagger_indices() {
        let mut seen: Vec<u8> = (0..3)
            .map(|n| stagger_index(&edge_id(ConnectionKind::Trunk, "sw1", "sw2", n)))
            .collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn same_row_uses_detour_alternating_by_parity() {
        let p = params();
        let (case, up) = route_orthogonal((100.0, 200.0), (300.0, 200.0), &p, 0);
        assert_eq!(case, RouteCase::Detour);
        assert!(is_axis_aligned(&up));
        let min_y = up.iter().map(|pt| pt.1).fold(f32::MAX, f32::min);
        assert_eq!(min_y, 200.0 - p.base_offset);

        let (_, down) = route_orthogonal((100.0, 200.0), (300.0, 200.0), &p, 1);
        let max_y = down.iter().map(|pt| pt.1).fold(f32::MIN, f32::max);
        assert_eq!(max_y, 200.0 + p.base_offset + p.stagger_step);

        let (_, far_up) = route_orthogonal((100.0, 200.0), (300.0, 200.0), &p, 2);
        let min_y = far_up.iter().map(|pt| pt.1).fold(f32::MAX, f32::min);
        assert_eq!(min_y, 200.0 - p.base_offset - 2.0 * p.stagger_step);
    }

    #[test]
    fn same_column_is_a_vertical_run() {
        let p = params();
        let (case, points) = route_orthogonal((100.0, 0.0), (100.0, 300.0), &p, 0);
        assert_eq!(case, RouteCase::Vertical);
        assert_eq!(points, vec![(100.0, 0.0), (100.0, 300.0)]);

        let (_, shifted) = route_orthogonal((100.0, 0.0), (100.0, 300.0), &p, 1);
        assert!(is_axis_aligned(&shifted));
        assert_eq!(shifted.len(), 4);
        assert_eq!(shifted[1].0, 100.0 + p.stagger_step);
    }

    #[test]
    fn long_links_bridge_over_or_under_both_ends() {
        let p = params();
        let start = (100.0, 200.0);
        let end = (100.0 + p.cross_site_threshold + 50.0, 260.0);
        let (case, over) = route_orthogonal(start, end, &p, 0);
        assert_eq!(case, RouteCase::Bridge);
        assert!(is_axis_aligned(&over));
        assert!(over.iter().any(|pt| pt.1 < 200.0));

        let (_, under) = route_orthogonal(start, end, &p, 1);
        assert!(under.iter().any(|pt| pt.1 > 260.0));
    }

    #[test]
    fn medium_links_use_an_elbow() {
        let p = params();
        let (case, points) = route_orthogonal((0.0, 0.0), (200.0, 100.0), &p, 0);
        assert_eq!(case, RouteCase::Elbow);
        assert_eq!(
            points,
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (200.0, 100.0)]
        );
    }

    #[test]
    fn backwards_links_wrap_around_the_icons() {
        let p = params();
        let (case, points) = route_orthogonal((200.0, 0.0), (50.0, 100.0), &p, 0);
        assert_eq!(case, RouteCase::Wrap);
        assert!(is_axis_aligned(&points));
        assert_eq!(points[1], (200.0 + p.clearance, 0.0));
        assert_eq!(points[points.len() - 2], (50.0 - p.clearance, 100.0));
    }

    #[test]
    fn every_stagger_gives_a_distinct_path() {
        let p = params();
        for (start, end) in [
            ((0.0, 0.0), (300.0, 0.0)),
            ((0.0, 0.0), (0.0, 300.0)),
            ((0.0, 0.0), (900.0, 80.0)),
            ((0.0, 0.0), (200.0, 120.0)),
            ((200.0, 0.0), (40.0, 120.0)),
        ] {
            let paths: Vec<Vec<Point>> = (0..3)
                .map(|k| route_orthogonal(start, end, &p, k).1)
                .collect();
            assert_ne!(paths[0], paths[1]);
            assert_ne!(paths[1], paths[2]);
            assert_ne!(paths[0], paths[2]);
        }
    }

    #[test]
    fn compress_drops_duplicates_and_straight_runs() {
        let points = vec![
            (0.0, 0.0),
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (10.0, 10.0),
        ];
        assert_eq!(
            compress_path(&points),
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]
        );
    }

    #[test]
    fn compress_collapses_backtracking_spikes() {
        let points = vec![(0.0, 0.0), (0.0, 5.0), (0.0, 0.0), (10.0, 0.0)];
        assert_eq!(compress_path(&points), vec![(0.0, 0.0), (10.0, 0.0)]);
    }

    #[test]
    fn manual_route_follows_waypoints_in_order() {
        let points = route_manual((0.0, 0.0), &[(5.0, 5.0), (5.0, 5.0), (20.0, -3.0)], (30.0, 0.0));
        assert_eq!(
            points,
            vec![(0.0, 0.0), (5.0, 5.0), (20.0, -3.0), (30.0, 0.0)]
        );
    }

    #[test]
    fn label_sits_above_the_arc_midpoint() {
        let points = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)];
        assert_eq!(label_anchor(&points, 4.0), (10.0, -4.0));
        let straight = vec![(0.0, 20.0), (40.0, 20.0)];
        assert_eq!(label_anchor(&straight, 8.0), (20.0, 12.0));
    }

    #[test]
    fn axis_alignment_check_rejects_diagonals() {
        assert!(is_axis_aligned(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]));
        assert!(!is_axis_aligned(&[(0.0, 0.0), (5.0, 5.0)]));
        assert!(!is_axis_aligned(&[(0.0, 0.0), (0.0, 0.0)]));
    }
}
