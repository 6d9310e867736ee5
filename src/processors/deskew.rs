//! Skew estimation and rotation correction.
//!
//! The dominant text skew is estimated from the minimum-area bounding
//! rectangle of all foreground pixel coordinates (convex hull + rotating
//! calipers). The rectangle-fit angle is ambiguous up to a 90° rotation for
//! near-square foreground masks, so angles below −45° are treated as
//! `90 + angle` before correction.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Estimates the page skew in degrees, normalized into `(-45, 45]`.
///
/// Returns 0.0 when the image has too few foreground pixels to fit a
/// rectangle.
pub fn estimate_skew_angle(binary: &GrayImage) -> f32 {
    let points = foreground_points(binary);
    if points.len() < 3 {
        return 0.0;
    }

    let hull = convex_hull(points);
    if hull.len() < 3 {
        return 0.0;
    }

    let angle = min_area_rect_angle(&hull);
    if angle < -45.0 {
        90.0 + angle
    } else {
        angle
    }
}

/// Rotates `binary` about its center by the negative of `angle` when its
/// magnitude exceeds `threshold` degrees; otherwise returns it unchanged.
///
/// Rotation uses cubic interpolation. The border is filled white: imageproc
/// supports only constant fill, and binarized page margins are background
/// white, which makes the fill indistinguishable from edge replication for
/// document scans.
pub fn correct_skew(binary: GrayImage, angle: f32, threshold: f32) -> GrayImage {
    if angle.abs() <= threshold {
        return binary;
    }

    rotate_about_center(
        &binary,
        -angle.to_radians(),
        Interpolation::Bicubic,
        Luma([255u8]),
    )
}

/// Coordinates of all non-zero pixels.
fn foreground_points(binary: &GrayImage) -> Vec<(i64, i64)> {
    let mut points = Vec::new();
    for (x, y, pixel) in binary.enumerate_pixels() {
        if pixel[0] != 0 {
            points.push((x as i64, y as i64));
        }
    }
    points
}

/// Cross product of `oa` and `ob`; positive for a counter-clockwise turn.
fn cross(o: (i64, i64), a: (i64, i64), b: (i64, i64)) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Convex hull via the monotone chain, counter-clockwise without the
/// duplicated endpoints.
fn convex_hull(mut points: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    points.sort_unstable();
    points.dedup();
    let n = points.len();
    if n <= 2 {
        return points;
    }

    let mut hull = Vec::with_capacity(2 * n);
    for &p in &points {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }

    let lower_len = hull.len() + 1;
    for &p in points.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }

    hull.pop();
    hull
}

/// Angle in degrees of the minimum-area enclosing rectangle, reduced into
/// `[-90, 0)` (the OpenCV rectangle-fit convention the normalization in
/// [`estimate_skew_angle`] expects).
fn min_area_rect_angle(hull: &[(i64, i64)]) -> f32 {
    let n = hull.len();
    let mut min_area = f32::MAX;
    let mut best_angle = 0.0f32;

    for i in 0..n {
        let j = (i + 1) % n;
        let edge_x = (hull[j].0 - hull[i].0) as f32;
        let edge_y = (hull[j].1 - hull[i].1) as f32;
        let edge_length = (edge_x * edge_x + edge_y * edge_y).sqrt();
        if edge_length < f32::EPSILON {
            continue;
        }

        let nx = edge_x / edge_length;
        let ny = edge_y / edge_length;
        let px = -ny;
        let py = nx;

        let mut min_n = f32::MAX;
        let mut max_n = f32::MIN;
        let mut min_p = f32::MAX;
        let mut max_p = f32::MIN;

        for &(qx, qy) in hull {
            let dx = (qx - hull[i].0) as f32;
            let dy = (qy - hull[i].1) as f32;

            let proj_n = nx * dx + ny * dy;
            min_n = min_n.min(proj_n);
            max_n = max_n.max(proj_n);

            let proj_p = px * dx + py * dy;
            min_p = min_p.min(proj_p);
            max_p = max_p.max(proj_p);
        }

        let area = (max_n - min_n) * (max_p - min_p);
        if area < min_area {
            min_area = area;
            best_angle = ny.atan2(nx).to_degrees();
        }
    }

    let mut angle = best_angle;
    while angle >= 0.0 {
        angle -= 90.0;
    }
    while angle < -90.0 {
        angle += 90.0;
    }
    angle
}
