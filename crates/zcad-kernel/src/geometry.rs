//! 几何图元定义
//!
//! 支持的图元：
//! - 线段 (Line)
//! - 多段线 (Polyline)
//! - 圆 (Circle)
//! - 圆弧 (Arc)
//! - 矩形 (Rectangle)
//! - 多边形 (Polygon)
//! - 文本 (Text)
//! - 尺寸标注 (Dimension)
//! - 填充 (Hatch)
//! - 块 (Block)
//!
//! 所有派生查询（包围盒、命中测试、平移）都通过对 [`Geometry`] 的显式 `match` 分派。

use crate::algorithms::{
    angle_in_sweep, is_full_sweep, is_point_in_polygon, point_segment_distance, polygon_area,
    polygon_centroid, polygon_perimeter,
};
use crate::math::{BoundingBox2, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// 几何类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Line(Line),
    Polyline(Polyline),
    Circle(Circle),
    Arc(Arc),
    Rectangle(Rectangle),
    Polygon(Polygon),
    Text(Text),
    Dimension(Dimension),
    Hatch(Hatch),
    Block(Block),
}

impl Geometry {
    /// 获取几何的包围盒
    ///
    /// 退化输入（空点集等）返回 [`BoundingBox2::empty`]。
    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Geometry::Line(l) => l.bounding_box(),
            Geometry::Polyline(pl) => pl.bounding_box(),
            Geometry::Circle(c) => c.bounding_box(),
            Geometry::Arc(a) => a.bounding_box(),
            Geometry::Rectangle(r) => r.bounding_box(),
            Geometry::Polygon(pg) => pg.bounding_box(),
            Geometry::Text(t) => t.bounding_box(),
            Geometry::Dimension(d) => d.bounding_box(),
            Geometry::Hatch(h) => h.bounding_box(),
            Geometry::Block(b) => b.bounding_box(),
        }
    }

    /// 获取几何的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Line(_) => "Line",
            Geometry::Polyline(_) => "Polyline",
            Geometry::Circle(_) => "Circle",
            Geometry::Arc(_) => "Arc",
            Geometry::Rectangle(_) => "Rectangle",
            Geometry::Polygon(_) => "Polygon",
            Geometry::Text(_) => "Text",
            Geometry::Dimension(_) => "Dimension",
            Geometry::Hatch(_) => "Hatch",
            Geometry::Block(_) => "Block",
        }
    }

    /// 检查点是否在几何上（考虑容差）
    pub fn contains_point(&self, point: &Point2, tolerance: f64) -> bool {
        match self {
            Geometry::Line(l) => l.distance_to_point(point) <= tolerance,
            Geometry::Polyline(pl) => pl.distance_to_point(point) <= tolerance,
            Geometry::Circle(c) => c.distance_to_point(point).abs() <= tolerance,
            Geometry::Arc(a) => a.distance_to_point(point) <= tolerance,
            Geometry::Rectangle(r) => r.distance_to_point(point) <= tolerance,
            Geometry::Polygon(pg) => {
                is_point_in_polygon(point, &pg.points) || pg.distance_to_point(point) <= tolerance
            }
            Geometry::Text(t) => t.contains_point(point, tolerance),
            Geometry::Dimension(d) => d.contains_point(point, tolerance),
            Geometry::Hatch(h) => {
                is_point_in_polygon(point, &h.boundary)
                    || Polygon::distance_to_points(&h.boundary, point) <= tolerance
            }
            Geometry::Block(b) => b.contains_point(point, tolerance),
        }
    }

    /// 直线段形式的边（线段、多段线、矩形、多边形、填充边界）
    ///
    /// 圆、圆弧、文本、标注和块返回空列表。
    pub fn segments(&self) -> Vec<(Point2, Point2)> {
        match self {
            Geometry::Line(l) => vec![(l.start, l.end)],
            Geometry::Polyline(pl) => pl.segments().collect(),
            Geometry::Rectangle(r) => {
                let c = r.corners();
                (0..4).map(|i| (c[i], c[(i + 1) % 4])).collect()
            }
            Geometry::Polygon(pg) => path_segments(&pg.points, true).collect(),
            Geometry::Hatch(h) => path_segments(&h.boundary, true).collect(),
            _ => vec![],
        }
    }

    /// 平移
    pub fn translate(&mut self, offset: Vector2) {
        match self {
            Geometry::Line(l) => {
                l.start += offset;
                l.end += offset;
            }
            Geometry::Polyline(pl) => pl.points.iter_mut().for_each(|p| *p += offset),
            Geometry::Circle(c) => c.center += offset,
            Geometry::Arc(a) => a.center += offset,
            Geometry::Rectangle(r) => r.top_left += offset,
            Geometry::Polygon(pg) => pg.points.iter_mut().for_each(|p| *p += offset),
            Geometry::Text(t) => t.position += offset,
            Geometry::Dimension(d) => {
                d.definition_point1 += offset;
                d.definition_point2 += offset;
                d.line_location += offset;
                if let Some(pos) = d.text_position.as_mut() {
                    *pos += offset;
                }
            }
            Geometry::Hatch(h) => h.boundary.iter_mut().for_each(|p| *p += offset),
            // 子几何在块局部坐标中，只移动插入点
            Geometry::Block(b) => b.insertion += offset,
        }
    }

    /// 返回平移后的副本
    pub fn translated(&self, offset: Vector2) -> Geometry {
        let mut g = self.clone();
        g.translate(offset);
        g
    }
}

/// 按顺序连接点集得到的线段；闭合且至少三个点时追加首尾闭合段
fn path_segments(points: &[Point2], closed: bool) -> impl Iterator<Item = (Point2, Point2)> + '_ {
    let n = points.len();
    let count = if n < 2 {
        0
    } else if closed && n >= 3 {
        n
    } else {
        n - 1
    };
    (0..count).map(move |i| (points[i], points[(i + 1) % n]))
}

fn midpoint(a: &Point2, b: &Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// 计算线段中点
    pub fn midpoint(&self) -> Point2 {
        midpoint(&self.start, &self.end)
    }

    /// 计算点到线段的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        point_segment_distance(self.start, self.end, *point)
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.start, self.end])
    }
}

/// 多段线
///
/// `closed = true` 但点数少于 3 时视为退化图形，所有查询照常工作，只是不生成闭合段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point2>,
    /// 是否闭合
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>, closed: bool) -> Self {
        Self {
            points: points.into_iter().collect(),
            closed,
        }
    }

    /// 顶点数量
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// 是否为退化的闭合多段线
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || (self.closed && self.points.len() < 3)
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        path_segments(&self.points, self.closed)
    }

    /// 线段数量
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// 计算总长度
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }

    /// 计算点到多段线的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        match self.points.as_slice() {
            [] => f64::MAX,
            [only] => (point - only).norm(),
            _ => self
                .segments()
                .map(|(a, b)| point_segment_distance(a, b, *point))
                .fold(f64::MAX, f64::min),
        }
    }

    /// 爆炸为独立的线段
    pub fn explode(&self) -> Vec<Geometry> {
        self.segments()
            .map(|(a, b)| Geometry::Line(Line::new(a, b)))
            .collect()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.points.iter().copied())
    }
}

/// 圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    /// 计算周长
    pub fn circumference(&self) -> f64 {
        TAU * self.radius
    }

    /// 计算面积
    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    /// 计算点到圆的距离（负值表示在圆内）
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        (point - self.center).norm() - self.radius
    }

    /// 获取圆上指定角度的点
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// 0°, 90°, 180°, 270° 处的象限点
    pub fn quadrant_points(&self) -> [Point2; 4] {
        [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2].map(|a| self.point_at_angle(a))
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.radius, self.center.y - self.radius),
            Point2::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

/// 圆弧（从起始角逆时针扫到终止角）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（弧度）
    pub start_angle: f64,
    /// 终止角度（弧度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius: radius.abs(),
            start_angle,
            end_angle,
        }
    }

    /// 从三点创建圆弧（起点、弧上一点、终点），三点共线时返回 `None`
    pub fn from_three_points(p1: Point2, p2: Point2, p3: Point2) -> Option<Self> {
        let d = 2.0 * (p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y));

        if d.abs() < EPSILON {
            return None;
        }

        let ux = ((p1.x * p1.x + p1.y * p1.y) * (p2.y - p3.y)
            + (p2.x * p2.x + p2.y * p2.y) * (p3.y - p1.y)
            + (p3.x * p3.x + p3.y * p3.y) * (p1.y - p2.y))
            / d;
        let uy = ((p1.x * p1.x + p1.y * p1.y) * (p3.x - p2.x)
            + (p2.x * p2.x + p2.y * p2.y) * (p1.x - p3.x)
            + (p3.x * p3.x + p3.y * p3.y) * (p2.x - p1.x))
            / d;

        let center = Point2::new(ux, uy);
        let radius = (p1 - center).norm();

        let angle_of = |p: Point2| (p.y - center.y).atan2(p.x - center.x);
        let (a1, a2, a3) = (angle_of(p1), angle_of(p2), angle_of(p3));

        // 顺时针输入时交换起止角，保证中间点落在弧上
        if angle_in_sweep(a2, a1, a3) {
            Some(Self::new(center, radius, a1, a3))
        } else {
            Some(Self::new(center, radius, a3, a1))
        }
    }

    /// 计算弧长
    pub fn length(&self) -> f64 {
        self.sweep_angle() * self.radius
    }

    /// 计算扫过的角度，范围 [0, 2π]，起止角相差一整圈时为 2π
    pub fn sweep_angle(&self) -> f64 {
        if is_full_sweep(self.start_angle, self.end_angle) {
            return TAU;
        }
        crate::math::normalize_angle(self.end_angle - self.start_angle)
    }

    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// 获取起点
    pub fn start_point(&self) -> Point2 {
        self.point_at_angle(self.start_angle)
    }

    /// 获取终点
    pub fn end_point(&self) -> Point2 {
        self.point_at_angle(self.end_angle)
    }

    /// 弧的中点
    pub fn midpoint(&self) -> Point2 {
        self.point_at_angle(self.start_angle + self.sweep_angle() / 2.0)
    }

    /// 检查角度是否在弧的范围内
    pub fn contains_angle(&self, angle: f64) -> bool {
        angle_in_sweep(angle, self.start_angle, self.end_angle)
    }

    /// 点（按其相对圆心的角度）是否落在弧的范围内
    pub fn spans_point(&self, point: &Point2) -> bool {
        self.contains_angle((point.y - self.center.y).atan2(point.x - self.center.x))
    }

    /// 计算点到圆弧的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        if self.spans_point(point) {
            ((point - self.center).norm() - self.radius).abs()
        } else {
            // 返回到端点的最小距离
            let d1 = (point - self.start_point()).norm();
            let d2 = (point - self.end_point()).norm();
            d1.min(d2)
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::from_points([self.start_point(), self.end_point()]);

        // 检查象限点
        for angle in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2] {
            if self.contains_angle(angle) {
                bbox.expand_to_include(&self.point_at_angle(angle));
            }
        }

        bbox
    }
}

/// 矩形
///
/// `top_left` 为最小坐标角，向 `+x`/`+y` 方向展开 `width`/`height`。
/// 构造函数会把负的宽高规范化；直接构造结构体时由调用方保证非负。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub top_left: Point2,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(top_left: Point2, width: f64, height: f64) -> Self {
        let mut origin = top_left;
        if width < 0.0 {
            origin.x += width;
        }
        if height < 0.0 {
            origin.y += height;
        }
        Self {
            top_left: origin,
            width: width.abs(),
            height: height.abs(),
        }
    }

    /// 由任意两个对角点创建
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        Self::new(a, b.x - a.x, b.y - a.y)
    }

    pub fn corners(&self) -> [Point2; 4] {
        let p = self.top_left;
        [
            p,
            Point2::new(p.x + self.width, p.y),
            Point2::new(p.x + self.width, p.y + self.height),
            Point2::new(p.x, p.y + self.height),
        ]
    }

    /// 四条边的中点
    pub fn edge_midpoints(&self) -> [Point2; 4] {
        let c = self.corners();
        [
            midpoint(&c[0], &c[1]),
            midpoint(&c[1], &c[2]),
            midpoint(&c[2], &c[3]),
            midpoint(&c[3], &c[0]),
        ]
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            self.top_left.x + self.width / 2.0,
            self.top_left.y + self.height / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// 点到矩形边框的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        Polygon::distance_to_points(&self.corners(), point)
    }

    /// 不做规范化：负宽高会得到 min > max 的盒子
    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            self.top_left,
            Point2::new(self.top_left.x + self.width, self.top_left.y + self.height),
        )
    }
}

/// 多边形（总是闭合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point2>,
}

impl Polygon {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// 正多边形
    pub fn regular(center: Point2, radius: f64, sides: usize) -> Self {
        let sides = sides.max(3);
        let step = TAU / sides as f64;
        Self {
            points: (0..sides)
                .map(|i| {
                    let a = step * i as f64;
                    Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
                })
                .collect(),
        }
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        polygon_perimeter(&self.points)
    }

    /// 质心，退化多边形返回 `None`
    pub fn centroid(&self) -> Option<Point2> {
        polygon_centroid(&self.points)
    }

    pub fn edge_midpoints(&self) -> Vec<Point2> {
        path_segments(&self.points, true)
            .map(|(a, b)| midpoint(&a, &b))
            .collect()
    }

    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        Self::distance_to_points(&self.points, point)
    }

    /// 点到闭合点集边界的距离
    fn distance_to_points(points: &[Point2], point: &Point2) -> f64 {
        match points {
            [] => f64::MAX,
            [only] => (point - only).norm(),
            _ => path_segments(points, true)
                .map(|(a, b)| point_segment_distance(a, b, *point))
                .fold(f64::MAX, f64::min),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.points.iter().copied())
    }
}

/// 文本对齐方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TextAlignment {
    /// 左对齐（默认）
    #[default]
    Left,
    /// 居中对齐
    Center,
    /// 右对齐
    Right,
}

/// 文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// 插入点
    pub position: Point2,
    /// 文本内容
    pub content: String,
    /// 文本高度（字号）
    pub height: f64,
    /// 旋转角度（弧度）
    pub rotation: f64,
    /// 对齐方式
    pub alignment: TextAlignment,
}

impl Text {
    pub fn new(position: Point2, content: impl Into<String>, height: f64) -> Self {
        Self {
            position,
            content: content.into(),
            height,
            rotation: 0.0,
            alignment: TextAlignment::Left,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// 估算文本宽度
    ///
    /// 不是真实字形度量：CJK 字符按字高计宽，其他字符按字高的 0.6 倍计宽。
    pub fn estimated_width(&self) -> f64 {
        let char_count = self.content.chars().count();
        let cjk_count = self.content.chars().filter(|c| Self::is_cjk(*c)).count();
        let ascii_count = char_count - cjk_count;

        (cjk_count as f64 * self.height) + (ascii_count as f64 * self.height * 0.6)
    }

    fn is_cjk(c: char) -> bool {
        matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
    }

    /// 近似包围盒（基于估算宽度）
    pub fn bounding_box(&self) -> BoundingBox2 {
        if self.content.is_empty() {
            return BoundingBox2::empty();
        }

        let width = self.estimated_width();
        let height = self.height;

        // 对齐方式决定基准点的水平偏移（在文本局部坐标系中）
        let offset_x = match self.alignment {
            TextAlignment::Left => 0.0,
            TextAlignment::Center => -width / 2.0,
            TextAlignment::Right => -width,
        };

        if self.rotation.abs() < EPSILON {
            return BoundingBox2::new(
                Point2::new(self.position.x + offset_x, self.position.y),
                Point2::new(self.position.x + offset_x + width, self.position.y + height),
            );
        }

        let (sin_r, cos_r) = self.rotation.sin_cos();
        let corners = [
            (offset_x, 0.0),
            (offset_x + width, 0.0),
            (offset_x + width, height),
            (offset_x, height),
        ];

        BoundingBox2::from_points(corners.iter().map(|&(x, y)| {
            Point2::new(
                self.position.x + x * cos_r - y * sin_r,
                self.position.y + x * sin_r + y * cos_r,
            )
        }))
    }

    /// 检查点是否在文本包围盒内
    pub fn contains_point(&self, point: &Point2, tolerance: f64) -> bool {
        let bbox = self.bounding_box();
        !bbox.is_empty() && bbox.expanded(tolerance).contains(point)
    }
}

/// 标注类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DimensionType {
    /// 对齐标注
    #[default]
    Aligned,
    /// 线性标注（水平或垂直）
    Linear,
    /// 半径标注
    Radius,
    /// 直径标注
    Diameter,
}

/// 尺寸标注
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// 第一个测量点
    pub definition_point1: Point2,
    /// 第二个测量点
    pub definition_point2: Point2,
    /// 标注线位置点
    pub line_location: Point2,
    pub dim_type: DimensionType,
    /// 覆盖文本（为空则显示测量值）
    pub text_override: Option<String>,
    pub text_height: f64,
    /// 文本位置（为 None 时自动计算）
    pub text_position: Option<Point2>,
}

impl Dimension {
    pub fn new(p1: Point2, p2: Point2, location: Point2) -> Self {
        Self {
            definition_point1: p1,
            definition_point2: p2,
            line_location: location,
            dim_type: DimensionType::Aligned,
            text_override: None,
            text_height: 10.0,
            text_position: None,
        }
    }

    pub fn with_type(mut self, dim_type: DimensionType) -> Self {
        self.dim_type = dim_type;
        self
    }

    /// 获取文本的实际显示位置
    pub fn get_text_position(&self) -> Point2 {
        self.text_position
            .unwrap_or_else(|| self.default_text_position())
    }

    /// 计算默认文本位置
    pub fn default_text_position(&self) -> Point2 {
        match self.dim_type {
            DimensionType::Aligned | DimensionType::Linear => {
                let chord = self.definition_point2 - self.definition_point1;
                if chord.norm() < EPSILON {
                    return self.line_location;
                }
                let dir = chord.normalize();
                let perp = Vector2::new(-dir.y, dir.x);
                let dist = (self.line_location - self.definition_point1).dot(&perp);

                // dist 为 0 时默认向上偏移
                let sign = if dist.abs() < EPSILON { 1.0 } else { dist.signum() };
                let total_dist = dist + sign * (self.text_height * 0.8);

                self.definition_point1 + chord * 0.5 + perp * total_dist
            }
            DimensionType::Radius | DimensionType::Diameter => self.line_location,
        }
    }

    /// 获取测量值
    pub fn measurement(&self) -> f64 {
        let delta = self.definition_point2 - self.definition_point1;
        match self.dim_type {
            DimensionType::Aligned | DimensionType::Radius => delta.norm(),
            DimensionType::Linear => delta.x.abs().max(delta.y.abs()),
            // p1 是圆心，p2 是圆上一点
            DimensionType::Diameter => delta.norm() * 2.0,
        }
    }

    /// 获取显示的文本
    pub fn display_text(&self) -> String {
        if let Some(text) = &self.text_override {
            return text.clone();
        }
        let val = self.measurement();
        match self.dim_type {
            DimensionType::Radius => format!("R{:.2}", val),
            DimensionType::Diameter => format!("%%C{:.2}", val),
            _ => format!("{:.2}", val),
        }
    }

    /// 文本包围盒（居中绘制）
    pub fn text_bounding_box(&self) -> BoundingBox2 {
        Text::new(self.get_text_position(), self.display_text(), self.text_height)
            .with_alignment(TextAlignment::Center)
            .bounding_box()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([
            self.definition_point1,
            self.definition_point2,
            self.line_location,
        ])
        .merge(&self.text_bounding_box())
    }

    /// 简化命中测试：包围盒加容差
    pub fn contains_point(&self, point: &Point2, tolerance: f64) -> bool {
        self.bounding_box().expanded(tolerance).contains(point)
    }
}

/// 填充图案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum HatchPattern {
    /// 实心填充
    #[default]
    Solid,
    /// 平行线
    Lines { angle: f64, spacing: f64 },
    /// 交叉线
    Cross { angle: f64, spacing: f64 },
}

/// 填充（闭合边界 + 图案）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hatch {
    pub boundary: Vec<Point2>,
    pub pattern: HatchPattern,
}

impl Hatch {
    pub fn new(boundary: Vec<Point2>, pattern: HatchPattern) -> Self {
        Self { boundary, pattern }
    }

    pub fn solid(boundary: Vec<Point2>) -> Self {
        Self::new(boundary, HatchPattern::Solid)
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.boundary)
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.boundary.iter().copied())
    }
}

/// 块参照：一组子几何，经缩放、旋转后放置在插入点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub insertion: Point2,
    pub scale: f64,
    /// 旋转角度（弧度）
    pub rotation: f64,
    /// 块局部坐标系中的子几何
    pub children: Vec<Geometry>,
}

impl Block {
    pub fn new(name: impl Into<String>, insertion: Point2, children: Vec<Geometry>) -> Self {
        Self {
            name: name.into(),
            insertion,
            scale: 1.0,
            rotation: 0.0,
            children,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// 局部坐标 -> 世界坐标
    pub fn to_world(&self, local: &Point2) -> Point2 {
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let x = local.x * self.scale;
        let y = local.y * self.scale;
        Point2::new(
            self.insertion.x + x * cos_r - y * sin_r,
            self.insertion.y + x * sin_r + y * cos_r,
        )
    }

    /// 世界坐标 -> 局部坐标，缩放为 0 时返回 `None`
    pub fn to_local(&self, world: &Point2) -> Option<Point2> {
        if self.scale.abs() < EPSILON {
            return None;
        }
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let dx = world.x - self.insertion.x;
        let dy = world.y - self.insertion.y;
        Some(Point2::new(
            (dx * cos_r + dy * sin_r) / self.scale,
            (-dx * sin_r + dy * cos_r) / self.scale,
        ))
    }

    /// 子几何包围盒的角点变换后再取并集；旋转时结果偏保守
    pub fn bounding_box(&self) -> BoundingBox2 {
        let boxes: Vec<BoundingBox2> = self
            .children
            .iter()
            .map(Geometry::bounding_box)
            .filter(|b| !b.is_empty())
            .map(|b| BoundingBox2::from_points(b.corners().iter().map(|c| self.to_world(c))))
            .collect();
        BoundingBox2::merge_all(&boxes)
    }

    pub fn contains_point(&self, point: &Point2, tolerance: f64) -> bool {
        let Some(local) = self.to_local(point) else {
            return false;
        };
        let local_tolerance = tolerance / self.scale.abs();
        self.children
            .iter()
            .any(|g| g.contains_point(&local, local_tolerance))
    }
}
