//! 对象捕捉系统
//!
//! 参考 LibreCAD 的设计，实现 CAD 标准的对象捕捉功能。
//!
//! 支持的捕捉类型：
//! - 端点 (Endpoint)
//! - 中点 (Midpoint)
//! - 圆心 (Center)
//! - 象限点 (Quadrant)
//! - 交点 (Intersection)
//! - 垂足 (Perpendicular)
//! - 切点 (Tangent)
//! - 最近点 (Nearest)
//! - 网格点 (Grid)
//!
//! [`snap_points_for`] 只产生与光标无关的特征点；与光标或参考点相关的候选
//! （网格、最近点、垂足、切点）由 [`SnapEngine::find_snap_point`] 追加。

use crate::algorithms::{
    circle_circle_intersection, line_circle_intersection, line_intersection,
    nearest_point_on_segment,
};
use crate::entity::{Entity, EntityId};
use crate::geometry::{Arc, Geometry};
use crate::math::{Point2, EPSILON};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 捕捉类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapType {
    /// 端点捕捉
    Endpoint,
    /// 中点捕捉
    Midpoint,
    /// 圆心捕捉
    Center,
    /// 交点捕捉
    Intersection,
    /// 垂足捕捉
    Perpendicular,
    /// 切点捕捉
    Tangent,
    /// 最近点捕捉
    Nearest,
    /// 网格点捕捉
    Grid,
    /// 象限点（圆的0°, 90°, 180°, 270°位置）
    Quadrant,
}

impl SnapType {
    /// 获取捕捉类型的名称
    pub fn name(&self) -> &'static str {
        match self {
            SnapType::Endpoint => "端点",
            SnapType::Midpoint => "中点",
            SnapType::Center => "圆心",
            SnapType::Intersection => "交点",
            SnapType::Perpendicular => "垂足",
            SnapType::Tangent => "切点",
            SnapType::Nearest => "最近点",
            SnapType::Grid => "网格点",
            SnapType::Quadrant => "象限点",
        }
    }

    /// 获取捕捉类型的快捷键
    pub fn shortcut(&self) -> &'static str {
        match self {
            SnapType::Endpoint => "END",
            SnapType::Midpoint => "MID",
            SnapType::Center => "CEN",
            SnapType::Intersection => "INT",
            SnapType::Perpendicular => "PER",
            SnapType::Tangent => "TAN",
            SnapType::Nearest => "NEA",
            SnapType::Grid => "GRI",
            SnapType::Quadrant => "QUA",
        }
    }
}

/// 捕捉点
///
/// 每次查询重新计算，不持久化。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    /// 捕捉到的世界坐标
    pub point: Point2,
    /// 捕捉类型
    pub snap_type: SnapType,
    /// 关联的实体ID（交点和网格点为 `None`）
    pub entity_id: Option<EntityId>,
    /// 到查询点的距离；由 [`snap_points_for`] 产生时为 0
    pub distance: f64,
}

impl SnapPoint {
    pub fn new(point: Point2, snap_type: SnapType, entity_id: Option<EntityId>, distance: f64) -> Self {
        Self {
            point,
            snap_type,
            entity_id,
            distance,
        }
    }
}

/// 捕捉配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// 捕捉容差（屏幕像素）
    pub tolerance: f64,
    /// 启用的捕捉类型
    pub enabled_types: SnapMask,
    /// 网格间距
    pub grid_spacing: f64,
    /// 是否显示捕捉标记
    pub show_markers: bool,
    /// 是否显示捕捉提示
    pub show_tooltips: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            tolerance: 10.0, // 10像素
            enabled_types: SnapMask::default(),
            grid_spacing: 10.0,
            show_markers: true,
            show_tooltips: true,
        }
    }
}

/// 捕捉掩码（位域，用于快速启用/禁用捕捉类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapMask {
    bits: u16,
}

impl SnapMask {
    pub const ENDPOINT: u16 = 1 << 0;
    pub const MIDPOINT: u16 = 1 << 1;
    pub const CENTER: u16 = 1 << 2;
    pub const INTERSECTION: u16 = 1 << 3;
    pub const PERPENDICULAR: u16 = 1 << 4;
    pub const TANGENT: u16 = 1 << 5;
    pub const NEAREST: u16 = 1 << 6;
    pub const GRID: u16 = 1 << 7;
    pub const QUADRANT: u16 = 1 << 8;

    pub const NONE: SnapMask = SnapMask { bits: 0 };
    pub const ALL: SnapMask = SnapMask { bits: 0xFFFF };

    pub fn new(bits: u16) -> Self {
        Self { bits }
    }

    /// 只启用给定的类型
    pub fn only(types: &[SnapType]) -> Self {
        let mut mask = Self::NONE;
        for &t in types {
            mask.set(t, true);
        }
        mask
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    fn bit(snap_type: SnapType) -> u16 {
        match snap_type {
            SnapType::Endpoint => Self::ENDPOINT,
            SnapType::Midpoint => Self::MIDPOINT,
            SnapType::Center => Self::CENTER,
            SnapType::Intersection => Self::INTERSECTION,
            SnapType::Perpendicular => Self::PERPENDICULAR,
            SnapType::Tangent => Self::TANGENT,
            SnapType::Nearest => Self::NEAREST,
            SnapType::Grid => Self::GRID,
            SnapType::Quadrant => Self::QUADRANT,
        }
    }

    pub fn is_enabled(&self, snap_type: SnapType) -> bool {
        self.bits & Self::bit(snap_type) != 0
    }

    pub fn set(&mut self, snap_type: SnapType, enabled: bool) {
        let bit = Self::bit(snap_type);
        if enabled {
            self.bits |= bit;
        } else {
            self.bits &= !bit;
        }
    }

    pub fn toggle(&mut self, snap_type: SnapType) {
        let enabled = self.is_enabled(snap_type);
        self.set(snap_type, !enabled);
    }
}

impl Default for SnapMask {
    fn default() -> Self {
        // 默认启用常用的捕捉类型
        Self {
            bits: Self::ENDPOINT | Self::MIDPOINT | Self::CENTER | Self::INTERSECTION | Self::QUADRANT,
        }
    }
}

/// 网格捕捉：每个坐标独立取整到 `spacing` 的最近倍数
///
/// `spacing` 非正（或 NaN）时原样返回。
pub fn snap_to_grid(point: Point2, spacing: f64) -> Point2 {
    if !(spacing > 0.0) {
        return point;
    }
    Point2::new(
        (point.x / spacing).round() * spacing,
        (point.y / spacing).round() * spacing,
    )
}

/// 在候选点中找离 `point` 最近且距离不超过 `max_distance` 的一个
///
/// 线性扫描；距离相同时取先出现的。返回值的 `distance` 字段为到 `point` 的距离。
pub fn nearest_snap_point(point: &Point2, candidates: &[SnapPoint], max_distance: f64) -> Option<SnapPoint> {
    let mut best: Option<SnapPoint> = None;
    for candidate in candidates {
        let dist = (candidate.point - point).norm();
        if dist > max_distance {
            continue;
        }
        if best.map_or(true, |b| dist < b.distance) {
            best = Some(SnapPoint { distance: dist, ..*candidate });
        }
    }
    best
}

/// 收集可见实体的特征捕捉点
///
/// 按 `config.enabled_types` 过滤；启用交点时对所有实体两两求交（O(n²)，
/// 调用方应先用空间索引把实体缩小到光标附近）。
///
/// 这里只看实体自身的 `visible` 标志，不知道图层状态。传入图纸里的实体时应先经过
/// [`crate::drawing::Drawing::visible_entities`] 或 `visible_in_range` 过滤掉隐藏图层上的实体。
pub fn snap_points_for<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    config: &SnapConfig,
) -> Vec<SnapPoint> {
    let mask = &config.enabled_types;
    let visible: Vec<&Entity> = entities.into_iter().filter(|e| e.visible).collect();

    let mut out = Vec::new();
    for entity in &visible {
        collect_feature_points(entity, mask, &mut out);
    }

    if mask.is_enabled(SnapType::Intersection) {
        collect_intersection_points(&visible, &mut out);
    }

    out
}

fn push_all(
    out: &mut Vec<SnapPoint>,
    mask: &SnapMask,
    snap_type: SnapType,
    id: EntityId,
    points: impl IntoIterator<Item = Point2>,
) {
    if mask.is_enabled(snap_type) {
        out.extend(points.into_iter().map(|p| SnapPoint::new(p, snap_type, Some(id), 0.0)));
    }
}

/// 单个实体的端点、中点、圆心、象限点
fn collect_feature_points(entity: &Entity, mask: &SnapMask, out: &mut Vec<SnapPoint>) {
    use SnapType::*;

    let id = entity.id;
    match &entity.geometry {
        Geometry::Line(line) => {
            push_all(out, mask, Endpoint, id, [line.start, line.end]);
            push_all(out, mask, Midpoint, id, [line.midpoint()]);
        }
        Geometry::Polyline(polyline) => {
            push_all(out, mask, Endpoint, id, polyline.points.iter().copied());
            // 包括闭合段
            push_all(
                out,
                mask,
                Midpoint,
                id,
                polyline
                    .segments()
                    .map(|(a, b)| Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)),
            );
        }
        Geometry::Circle(circle) => {
            push_all(out, mask, Center, id, [circle.center]);
            push_all(out, mask, Quadrant, id, circle.quadrant_points());
        }
        Geometry::Arc(arc) => {
            push_all(out, mask, Endpoint, id, [arc.start_point(), arc.end_point()]);
            push_all(out, mask, Midpoint, id, [arc.midpoint()]);
            push_all(out, mask, Center, id, [arc.center]);
        }
        Geometry::Rectangle(rect) => {
            push_all(out, mask, Endpoint, id, rect.corners());
            push_all(out, mask, Midpoint, id, rect.edge_midpoints());
            push_all(out, mask, Center, id, [rect.center()]);
        }
        Geometry::Polygon(polygon) => {
            push_all(out, mask, Endpoint, id, polygon.points.iter().copied());
            push_all(out, mask, Midpoint, id, polygon.edge_midpoints());
            if polygon.area() > EPSILON {
                push_all(out, mask, Center, id, polygon.centroid());
            }
        }
        // 文本只捕捉插入点
        Geometry::Text(text) => push_all(out, mask, Endpoint, id, [text.position]),
        // 标注捕捉定义点
        Geometry::Dimension(dim) => {
            push_all(out, mask, Endpoint, id, [dim.definition_point1, dim.definition_point2]);
        }
        Geometry::Hatch(hatch) => push_all(out, mask, Endpoint, id, hatch.boundary.iter().copied()),
        Geometry::Block(block) => push_all(out, mask, Endpoint, id, [block.insertion]),
    }
}

/// 参与求交的曲线片段
#[derive(Debug, Clone, Copy)]
enum Curve<'a> {
    Segment(Point2, Point2),
    Circle(Point2, f64),
    Arc(&'a Arc),
}

fn curves_of(geometry: &Geometry) -> Vec<Curve<'_>> {
    match geometry {
        Geometry::Circle(c) => vec![Curve::Circle(c.center, c.radius)],
        Geometry::Arc(a) => vec![Curve::Arc(a)],
        other => other
            .segments()
            .into_iter()
            .map(|(a, b)| Curve::Segment(a, b))
            .collect(),
    }
}

/// 两条曲线的交点；圆弧先按整圆求交再过滤掉不在弧上的点
fn curve_intersections(a: &Curve<'_>, b: &Curve<'_>) -> Vec<Point2> {
    match (a, b) {
        (Curve::Segment(a1, a2), Curve::Segment(b1, b2)) => {
            line_intersection(*a1, *a2, *b1, *b2).into_iter().collect()
        }
        (Curve::Segment(s, e), Curve::Circle(c, r)) | (Curve::Circle(c, r), Curve::Segment(s, e)) => {
            line_circle_intersection(*s, *e, *c, *r)
        }
        (Curve::Segment(s, e), Curve::Arc(arc)) | (Curve::Arc(arc), Curve::Segment(s, e)) => {
            line_circle_intersection(*s, *e, arc.center, arc.radius)
                .into_iter()
                .filter(|p| arc.spans_point(p))
                .collect()
        }
        (Curve::Circle(c1, r1), Curve::Circle(c2, r2)) => circle_circle_intersection(*c1, *r1, *c2, *r2),
        (Curve::Circle(c, r), Curve::Arc(arc)) | (Curve::Arc(arc), Curve::Circle(c, r)) => {
            circle_circle_intersection(*c, *r, arc.center, arc.radius)
                .into_iter()
                .filter(|p| arc.spans_point(p))
                .collect()
        }
        (Curve::Arc(a1), Curve::Arc(a2)) => circle_circle_intersection(a1.center, a1.radius, a2.center, a2.radius)
            .into_iter()
            .filter(|p| a1.spans_point(p) && a2.spans_point(p))
            .collect(),
    }
}

/// 不同实体之间两两求交，交点不关联实体
fn collect_intersection_points(entities: &[&Entity], out: &mut Vec<SnapPoint>) {
    let curves: Vec<Vec<Curve<'_>>> = entities.iter().map(|e| curves_of(&e.geometry)).collect();

    for i in 0..curves.len() {
        for j in (i + 1)..curves.len() {
            for a in &curves[i] {
                for b in &curves[j] {
                    out.extend(
                        curve_intersections(a, b)
                            .into_iter()
                            .map(|p| SnapPoint::new(p, SnapType::Intersection, None, 0.0)),
                    );
                }
            }
        }
    }
}

/// 捕捉引擎
///
/// 负责计算和管理对象捕捉
#[derive(Debug, Clone)]
pub struct SnapEngine {
    config: SnapConfig,
    /// 缓存的候选捕捉点
    candidates: Vec<SnapPoint>,
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Self {
        Self {
            config,
            candidates: Vec::with_capacity(64),
        }
    }

    /// 获取配置
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// 获取配置（可变）
    pub fn config_mut(&mut self) -> &mut SnapConfig {
        &mut self.config
    }

    /// 上一次查询的全部候选点
    pub fn candidates(&self) -> &[SnapPoint] {
        &self.candidates
    }

    /// 把屏幕像素容差换算为世界坐标；缩放非正时按 1 处理
    pub fn world_tolerance(&self, zoom: f64) -> f64 {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        self.config.tolerance / zoom
    }

    /// 寻找最佳捕捉点
    ///
    /// # 参数
    /// - `cursor`: 光标的世界坐标
    /// - `entities`: 要搜索的实体列表
    /// - `zoom`: 当前缩放级别（用于计算屏幕距离）
    /// - `reference_point`: 参考点（用于垂足、切点等计算）
    pub fn find_snap_point(
        &mut self,
        cursor: Point2,
        entities: &[&Entity],
        zoom: f64,
        reference_point: Option<Point2>,
    ) -> Option<SnapPoint> {
        let world_tolerance = self.world_tolerance(zoom);
        let enabled = self.config.enabled_types;

        // 1. 特征点和交点
        self.candidates = snap_points_for(entities.iter().copied(), &self.config);

        // 2. 网格捕捉
        if enabled.is_enabled(SnapType::Grid) {
            let grid_point = snap_to_grid(cursor, self.config.grid_spacing);
            self.candidates
                .push(SnapPoint::new(grid_point, SnapType::Grid, None, 0.0));
        }

        // 3. 与光标/参考点相关的候选
        for entity in entities.iter().filter(|e| e.visible) {
            for curve in curves_of(&entity.geometry) {
                if enabled.is_enabled(SnapType::Nearest) {
                    if let Some(p) = nearest_on_curve(&curve, cursor) {
                        self.candidates
                            .push(SnapPoint::new(p, SnapType::Nearest, Some(entity.id), 0.0));
                    }
                }
                let Some(reference) = reference_point else {
                    continue;
                };
                if enabled.is_enabled(SnapType::Perpendicular) {
                    if let Curve::Segment(s, e) = curve {
                        if let Some(p) = perpendicular_foot(s, e, reference) {
                            self.candidates
                                .push(SnapPoint::new(p, SnapType::Perpendicular, Some(entity.id), 0.0));
                        }
                    }
                }
                if enabled.is_enabled(SnapType::Tangent) {
                    for p in tangent_points(&curve, reference) {
                        self.candidates
                            .push(SnapPoint::new(p, SnapType::Tangent, Some(entity.id), 0.0));
                    }
                }
            }
        }

        // 4. 找到最近的捕捉点
        for candidate in &mut self.candidates {
            candidate.distance = (candidate.point - cursor).norm();
        }
        self.candidates
            .iter()
            .filter(|p| p.distance <= world_tolerance)
            .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal))
            .copied()
    }
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new(SnapConfig::default())
    }
}

// ========== 几何计算辅助方法 ==========

/// 曲线上离 `point` 最近的点；点与圆心重合或不落在弧上时返回 `None`
fn nearest_on_curve(curve: &Curve<'_>, point: Point2) -> Option<Point2> {
    match curve {
        Curve::Segment(s, e) => Some(nearest_point_on_segment(*s, *e, point)),
        Curve::Circle(c, r) => nearest_on_circle(*c, *r, point),
        Curve::Arc(arc) => nearest_on_circle(arc.center, arc.radius, point).filter(|p| arc.spans_point(p)),
    }
}

fn nearest_on_circle(center: Point2, radius: f64, point: Point2) -> Option<Point2> {
    let offset = point - center;
    let len = offset.norm();
    if len < EPSILON {
        return None;
    }
    Some(center + offset * (radius / len))
}

/// 从参考点到线段的垂足，垂足必须落在线段上
fn perpendicular_foot(start: Point2, end: Point2, reference: Point2) -> Option<Point2> {
    let v = end - start;
    let c2 = v.dot(&v);
    if c2 < EPSILON {
        return None;
    }

    let b = (reference - start).dot(&v) / c2;
    if (0.0..=1.0).contains(&b) {
        Some(start + v * b)
    } else {
        None
    }
}

/// 从参考点到圆（弧）的切点
fn tangent_points(curve: &Curve<'_>, reference: Point2) -> Vec<Point2> {
    match curve {
        Curve::Segment(..) => vec![],
        Curve::Circle(c, r) => tangent_points_to_circle(*c, *r, reference),
        Curve::Arc(arc) => tangent_points_to_circle(arc.center, arc.radius, reference)
            .into_iter()
            .filter(|p| arc.spans_point(p))
            .collect(),
    }
}

fn tangent_points_to_circle(center: Point2, radius: f64, point: Point2) -> Vec<Point2> {
    let offset = point - center;
    let d = offset.norm();

    // 点在圆内，没有切点
    if d <= radius || d < EPSILON {
        return vec![];
    }

    // 圆心看切点与参考点的夹角
    let angle = (radius / d).acos();
    let base_angle = offset.y.atan2(offset.x);

    [base_angle + angle, base_angle - angle]
        .into_iter()
        .map(|a| Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Line, Polygon, Polyline, Rectangle, Text};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn entity(geometry: Geometry) -> Entity {
        Entity::new(geometry)
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Entity {
        entity(Geometry::Line(Line::new(Point2::new(x0, y0), Point2::new(x1, y1))))
    }

    fn count(points: &[SnapPoint], snap_type: SnapType) -> usize {
        points.iter().filter(|p| p.snap_type == snap_type).count()
    }

    fn has_point(points: &[SnapPoint], snap_type: SnapType, x: f64, y: f64) -> bool {
        points
            .iter()
            .any(|p| p.snap_type == snap_type && (p.point - Point2::new(x, y)).norm() < 1e-9)
    }

    #[test]
    fn test_snap_mask() {
        let mut mask = SnapMask::default();
        assert!(mask.is_enabled(SnapType::Endpoint));
        assert!(mask.is_enabled(SnapType::Midpoint));
        assert!(mask.is_enabled(SnapType::Quadrant));
        assert!(!mask.is_enabled(SnapType::Nearest));

        mask.set(SnapType::Nearest, true);
        assert!(mask.is_enabled(SnapType::Nearest));

        mask.toggle(SnapType::Endpoint);
        assert!(!mask.is_enabled(SnapType::Endpoint));

        let only = SnapMask::only(&[SnapType::Grid]);
        assert_eq!(only.bits(), SnapMask::GRID);
    }

    #[test]
    fn test_snap_to_grid() {
        let p = snap_to_grid(Point2::new(12.0, 18.0), 10.0);
        assert_eq!(p, Point2::new(10.0, 20.0));

        let p = snap_to_grid(Point2::new(2.3, 4.7), 1.0);
        assert_eq!(p, Point2::new(2.0, 5.0));

        let p = snap_to_grid(Point2::new(-12.0, -18.0), 10.0);
        assert_eq!(p, Point2::new(-10.0, -20.0));
    }

    #[test]
    fn test_snap_to_grid_non_positive_spacing() {
        let p = Point2::new(3.3, 4.4);
        assert_eq!(snap_to_grid(p, 0.0), p);
        assert_eq!(snap_to_grid(p, -5.0), p);
    }

    #[test]
    fn test_line_snap_points() {
        let e = line(0.0, 0.0, 10.0, 0.0);
        let points = snap_points_for([&e], &SnapConfig::default());
        assert_eq!(points.len(), 3);
        assert!(has_point(&points, SnapType::Endpoint, 0.0, 0.0));
        assert!(has_point(&points, SnapType::Endpoint, 10.0, 0.0));
        assert!(has_point(&points, SnapType::Midpoint, 5.0, 0.0));
        assert!(points.iter().all(|p| p.entity_id == Some(e.id)));
    }

    #[test]
    fn test_circle_snap_points() {
        let e = entity(Geometry::Circle(Circle::new(Point2::new(1.0, 1.0), 2.0)));
        let points = snap_points_for([&e], &SnapConfig::default());
        assert_eq!(count(&points, SnapType::Center), 1);
        assert_eq!(count(&points, SnapType::Quadrant), 4);
        assert!(has_point(&points, SnapType::Quadrant, 3.0, 1.0));
        assert!(has_point(&points, SnapType::Quadrant, 1.0, -1.0));
    }

    #[test]
    fn test_rectangle_snap_points() {
        let e = entity(Geometry::Rectangle(Rectangle::new(Point2::new(0.0, 0.0), 10.0, 4.0)));
        let points = snap_points_for([&e], &SnapConfig::default());
        assert_eq!(count(&points, SnapType::Endpoint), 4);
        assert_eq!(count(&points, SnapType::Midpoint), 4);
        assert_eq!(count(&points, SnapType::Center), 1);
        assert!(has_point(&points, SnapType::Center, 5.0, 2.0));
        assert!(has_point(&points, SnapType::Midpoint, 10.0, 2.0));
    }

    #[test]
    fn test_closed_polyline_includes_closing_midpoint() {
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), Point2::new(4.0, 4.0)];
        let e = entity(Geometry::Polyline(Polyline::new(pts, true)));
        let points = snap_points_for([&e], &SnapConfig::default());
        assert_eq!(count(&points, SnapType::Endpoint), 3);
        assert_eq!(count(&points, SnapType::Midpoint), 3);
        assert!(has_point(&points, SnapType::Midpoint, 2.0, 2.0));
    }

    #[test]
    fn test_degenerate_polygon_has_no_centroid() {
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        let e = entity(Geometry::Polygon(Polygon::new(pts)));
        let points = snap_points_for([&e], &SnapConfig::default());
        assert_eq!(count(&points, SnapType::Center), 0);

        let square = entity(Geometry::Polygon(Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ])));
        let points = snap_points_for([&square], &SnapConfig::default());
        assert!(has_point(&points, SnapType::Center, 1.0, 1.0));
    }

    #[test]
    fn test_invisible_entities_skipped() {
        let e = line(0.0, 0.0, 10.0, 0.0).with_visible(false);
        let text = entity(Geometry::Text(Text::new(Point2::new(3.0, 3.0), "A", 2.5)));
        let points = snap_points_for([&e, &text], &SnapConfig::default());
        assert_eq!(points.len(), 1);
        assert!(has_point(&points, SnapType::Endpoint, 3.0, 3.0));
    }

    #[test]
    fn test_mask_gates_types() {
        let e = line(0.0, 0.0, 10.0, 0.0);
        let config = SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Midpoint]),
            ..SnapConfig::default()
        };
        let points = snap_points_for([&e], &config);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].snap_type, SnapType::Midpoint);
    }

    #[test]
    fn test_line_intersection_snap() {
        let l1 = line(0.0, 0.0, 10.0, 10.0);
        let l2 = line(0.0, 10.0, 10.0, 0.0);
        let config = SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Intersection]),
            ..SnapConfig::default()
        };
        let points = snap_points_for([&l1, &l2], &config);
        assert_eq!(points.len(), 1);
        assert!(has_point(&points, SnapType::Intersection, 5.0, 5.0));
        assert_eq!(points[0].entity_id, None);
    }

    #[test]
    fn test_line_arc_intersection_filtered_by_sweep() {
        // 上半圆弧只和水平线在 y>0 一侧相交
        let arc = entity(Geometry::Arc(Arc::new(Point2::origin(), 5.0, 0.0, PI)));
        let horizontal = line(-10.0, 3.0, 10.0, 3.0);
        let below = line(-10.0, -3.0, 10.0, -3.0);
        let config = SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Intersection]),
            ..SnapConfig::default()
        };
        let points = snap_points_for([&arc, &horizontal], &config);
        assert_eq!(points.len(), 2);
        assert!(has_point(&points, SnapType::Intersection, 4.0, 3.0));
        assert!(has_point(&points, SnapType::Intersection, -4.0, 3.0));

        let points = snap_points_for([&arc, &below], &config);
        assert!(points.is_empty());
    }

    #[test]
    fn test_nearest_snap_point() {
        let candidates = vec![
            SnapPoint::new(Point2::new(10.0, 0.0), SnapType::Endpoint, None, 0.0),
            SnapPoint::new(Point2::new(1.0, 0.0), SnapType::Midpoint, None, 0.0),
            SnapPoint::new(Point2::new(0.0, 1.0), SnapType::Center, None, 0.0),
        ];
        // 两个候选距离相同，取先出现的
        let best = nearest_snap_point(&Point2::origin(), &candidates, 5.0).unwrap();
        assert_eq!(best.snap_type, SnapType::Midpoint);
        assert!((best.distance - 1.0).abs() < 1e-12);

        assert!(nearest_snap_point(&Point2::origin(), &candidates, 0.5).is_none());
        assert!(nearest_snap_point(&Point2::origin(), &[], 100.0).is_none());
    }

    #[test]
    fn test_engine_prefers_closest_candidate() {
        let mut engine = SnapEngine::default();
        let e = line(0.0, 0.0, 10.0, 0.0);
        let snap = engine
            .find_snap_point(Point2::new(9.5, 0.3), &[&e], 1.0, None)
            .unwrap();
        assert_eq!(snap.snap_type, SnapType::Endpoint);
        assert_eq!(snap.point, Point2::new(10.0, 0.0));
        assert_eq!(snap.entity_id, Some(e.id));
    }

    #[test]
    fn test_engine_zoom_shrinks_tolerance() {
        let mut engine = SnapEngine::default();
        let e = line(0.0, 0.0, 10.0, 0.0);
        // 10 像素 / 缩放 100 = 0.1 世界单位
        assert!(engine
            .find_snap_point(Point2::new(9.5, 0.0), &[&e], 100.0, None)
            .is_none());
        assert!((engine.world_tolerance(0.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_engine_grid() {
        let mut engine = SnapEngine::new(SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Grid]),
            ..SnapConfig::default()
        });
        let snap = engine
            .find_snap_point(Point2::new(21.0, 38.0), &[], 1.0, None)
            .unwrap();
        assert_eq!(snap.snap_type, SnapType::Grid);
        assert_eq!(snap.point, Point2::new(20.0, 40.0));
    }

    #[test]
    fn test_engine_nearest_and_perpendicular() {
        let mut engine = SnapEngine::new(SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Nearest]),
            ..SnapConfig::default()
        });
        let e = line(0.0, 0.0, 10.0, 0.0);
        let snap = engine
            .find_snap_point(Point2::new(5.0, 5.0), &[&e], 1.0, None)
            .unwrap();
        assert!((snap.point - Point2::new(5.0, 0.0)).norm() < 1e-9);

        let mut engine = SnapEngine::new(SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Perpendicular]),
            ..SnapConfig::default()
        });
        let snap = engine
            .find_snap_point(Point2::new(3.0, 1.0), &[&e], 1.0, Some(Point2::new(3.0, 8.0)))
            .unwrap();
        assert_eq!(snap.snap_type, SnapType::Perpendicular);
        assert!((snap.point - Point2::new(3.0, 0.0)).norm() < 1e-9);

        // 没有参考点就没有垂足
        assert!(engine
            .find_snap_point(Point2::new(3.0, 1.0), &[&e], 1.0, None)
            .is_none());
    }

    #[test]
    fn test_tangent_points() {
        let mut engine = SnapEngine::new(SnapConfig {
            enabled_types: SnapMask::only(&[SnapType::Tangent]),
            ..SnapConfig::default()
        });
        let circle = entity(Geometry::Circle(Circle::new(Point2::origin(), 1.0)));
        // 参考点 (2,0)：切点在 60° 和 -60°
        let expected = Point2::new(0.5, (3.0f64).sqrt() / 2.0);
        let snap = engine
            .find_snap_point(Point2::new(0.5, 0.9), &[&circle], 1.0, Some(Point2::new(2.0, 0.0)))
            .unwrap();
        assert!((snap.point - expected).norm() < 1e-9);

        // 切点到参考点的连线垂直于半径
        let radius_dir = snap.point - Point2::origin();
        let tangent_dir = Point2::new(2.0, 0.0) - snap.point;
        assert!(radius_dir.dot(&tangent_dir).abs() < 1e-9);

        assert!(tangent_points_to_circle(Point2::origin(), 1.0, Point2::new(0.5, 0.0)).is_empty());
    }

    #[test]
    fn test_nearest_on_arc_outside_sweep() {
        let arc = Arc::new(Point2::origin(), 1.0, 0.0, FRAC_PI_2);
        assert!(nearest_on_curve(&Curve::Arc(&arc), Point2::new(-2.0, -2.0)).is_none());
        let p = nearest_on_curve(&Curve::Arc(&arc), Point2::new(2.0, 2.0)).unwrap();
        assert!((p.x - p.y).abs() < 1e-12);
    }

    #[test]
    fn test_hidden_layer_filtered_by_drawing() {
        use crate::drawing::Drawing;
        use crate::layer::Layer;

        let mut drawing = Drawing::new();
        let mut hidden = Layer::new("hidden");
        hidden.visible = false;
        let hidden_id = drawing.add_layer(hidden).unwrap();
        drawing.insert_entity(line(0.0, 0.0, 10.0, 0.0));
        drawing.insert_entity(line(50.0, 0.0, 60.0, 0.0).with_layer(hidden_id));

        let config = SnapConfig::default();
        // 不经过图层过滤时隐藏图层上的端点也会出现
        let raw = snap_points_for(drawing.entities(), &config);
        assert!(has_point(&raw, SnapType::Endpoint, 60.0, 0.0));

        let filtered = snap_points_for(drawing.visible_entities(), &config);
        assert!(!has_point(&filtered, SnapType::Endpoint, 60.0, 0.0));
        assert!(has_point(&filtered, SnapType::Endpoint, 10.0, 0.0));
    }
}
