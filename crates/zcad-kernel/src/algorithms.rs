//! 几何算法
//!
//! 无副作用的纯函数：线段/圆求交、多边形面积周长质心、点在多边形内判断。
//! 退化输入（平行线、同心圆、点数不足的多边形）返回 `None` 或空列表，从不 panic。

use crate::math::{normalize_angle, Point2, Vector2, EPSILON};
use std::f64::consts::TAU;

/// 线段-线段交点
///
/// 参数化求解；两线段平行（叉积绝对值小于 [`EPSILON`]）或交点参数落在 `[0, 1]` 之外时返回 `None`。
pub fn line_intersection(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> Option<Point2> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;

    let cross = d1.x * d2.y - d1.y * d2.x;

    // 平行
    if cross.abs() < EPSILON {
        return None;
    }

    let d = b1 - a1;
    let t1 = (d.x * d2.y - d.y * d2.x) / cross;
    let t2 = (d.x * d1.y - d.y * d1.x) / cross;

    if (0.0..=1.0).contains(&t1) && (0.0..=1.0).contains(&t2) {
        Some(a1 + d1 * t1)
    } else {
        None
    }
}

/// 线段-圆交点（0~2个）
pub fn line_circle_intersection(start: Point2, end: Point2, center: Point2, radius: f64) -> Vec<Point2> {
    let d = end - start;
    let f = start - center;

    let a = d.dot(&d);
    if a < EPSILON {
        return vec![];
    }
    let b = 2.0 * f.dot(&d);
    let c = f.dot(&f) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return vec![];
    }

    let mut intersections = Vec::new();

    if discriminant.abs() < EPSILON {
        // 相切
        let t = -b / (2.0 * a);
        if (0.0..=1.0).contains(&t) {
            intersections.push(start + d * t);
        }
    } else {
        let sqrt_disc = discriminant.sqrt();
        for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
            if (0.0..=1.0).contains(&t) {
                intersections.push(start + d * t);
            }
        }
    }

    intersections
}

/// 圆-圆交点
///
/// 相离（`d > r1 + r2`）、内含（`d < |r1 - r2|`）或同心时为空；
/// 相切时返回唯一切点；否则返回两个交点。
pub fn circle_circle_intersection(c1: Point2, r1: f64, c2: Point2, r2: f64) -> Vec<Point2> {
    let d = (c2 - c1).norm();

    if d > r1 + r2 || d < (r1 - r2).abs() || d < EPSILON {
        return vec![];
    }

    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();

    let dir = (c2 - c1) / d;
    let p = c1 + dir * a;
    let perp = Vector2::new(-dir.y, dir.x);

    if h < EPSILON {
        vec![p]
    } else {
        vec![p + perp * h, p - perp * h]
    }
}

/// 多边形有向面积（逆时针为正）
fn signed_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// 多边形面积（鞋带公式取绝对值）
pub fn polygon_area(points: &[Point2]) -> f64 {
    signed_area(points).abs()
}

/// 多边形周长（自动闭合）
pub fn polygon_perimeter(points: &[Point2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (points[(i + 1) % points.len()] - p).norm())
        .sum()
}

/// 多边形质心
///
/// 少于三个点或面积为零（共线）时返回 `None`。
pub fn polygon_centroid(points: &[Point2]) -> Option<Point2> {
    let area = signed_area(points);
    if area.abs() < EPSILON {
        return None;
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }

    Some(Point2::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// 射线法判断点是否在多边形内
///
/// 边界上的点结果不确定，调用方不应依赖。
pub fn is_point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = &polygon[i];
        let pj = &polygon[j];
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// 线段上距离指定点最近的点
pub fn nearest_point_on_segment(start: Point2, end: Point2, point: Point2) -> Point2 {
    let v = end - start;
    let w = point - start;

    let c1 = w.dot(&v);
    if c1 <= 0.0 {
        return start;
    }

    let c2 = v.dot(&v);
    if c2 <= c1 {
        return end;
    }

    start + v * (c1 / c2)
}

/// 点到线段的距离
pub fn point_segment_distance(start: Point2, end: Point2, point: Point2) -> f64 {
    (point - nearest_point_on_segment(start, end, point)).norm()
}

/// 起止角相差一整圈（含以上）时视为整圆
pub fn is_full_sweep(start: f64, end: f64) -> bool {
    (end - start).abs() >= TAU - EPSILON
}

/// 角度是否落在从 `start` 逆时针扫到 `end` 的范围内（处理跨越 0 的情况）
pub fn angle_in_sweep(angle: f64, start: f64, end: f64) -> bool {
    if is_full_sweep(start, end) {
        return true;
    }
    let a = normalize_angle(angle);
    let s = normalize_angle(start);
    let e = normalize_angle(end);

    if s <= e {
        a >= s && a <= e
    } else {
        a >= s || a <= e
    }
}
