//! 数学基础类型
//!
//! 基于 nalgebra 的二维点/向量别名，以及所有上层模块共用的轴对齐包围盒。
//! 包围盒的相交/包含判断只在这里实现，其他模块一律调用这里的方法。

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 二维点
pub type Point2 = nalgebra::Point2<f64>;

/// 二维向量
pub type Vector2 = nalgebra::Vector2<f64>;

/// 全局数值容差（固定设计常量，不可配置）
pub const EPSILON: f64 = 1e-10;

/// 两点间的欧氏距离
#[inline]
pub fn distance(p1: &Point2, p2: &Point2) -> f64 {
    (p2 - p1).norm()
}

/// 把角度归一化到 [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid 对极小的负数可能返回 TAU 本身
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// 轴对齐包围盒
///
/// 不变量：`min <= max`（逐轴）。例外是 [`BoundingBox2::empty`] 返回的全零哨兵，
/// 退化输入（空点集等）统一返回它，调用方不能把它当作原点处的真实盒子。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    /// 按给定的最小/最大角点创建（不做规范化）
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 由任意两个对角点创建，自动规范化
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// 空包围盒哨兵 `{0, 0, 0, 0}`
    pub fn empty() -> Self {
        Self {
            min: Point2::origin(),
            max: Point2::origin(),
        }
    }

    /// 是否为空哨兵
    pub fn is_empty(&self) -> bool {
        self.min.x == 0.0 && self.min.y == 0.0 && self.max.x == 0.0 && self.max.y == 0.0
    }

    /// 由点集计算包围盒，点集为空时返回哨兵
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::empty();
        };
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    /// 原地扩展以包含指定点
    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// 两个盒子的并集（不识别哨兵，空间索引内部使用）
    pub fn union(&self, other: &BoundingBox2) -> BoundingBox2 {
        BoundingBox2 {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// 合并两个包围盒，空哨兵视为单位元
    pub fn merge(&self, other: &BoundingBox2) -> BoundingBox2 {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            self.union(other)
        }
    }

    /// 合并任意多个包围盒
    pub fn merge_all<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox2>) -> BoundingBox2 {
        boxes
            .into_iter()
            .fold(BoundingBox2::empty(), |acc, b| acc.merge(b))
    }

    /// 向四周扩展 `margin`
    pub fn expanded(&self, margin: f64) -> BoundingBox2 {
        BoundingBox2 {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// 点是否在盒内（含边界）
    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// 另一个盒子是否完全在本盒内
    pub fn contains_box(&self, other: &BoundingBox2) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// 两个盒子是否重叠（闭区间，对称）
    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// 包含 `other` 所需增加的面积
    pub fn enlargement_to_include(&self, other: &BoundingBox2) -> f64 {
        self.union(other).area() - self.area()
    }

    /// 四个角点（逆时针，从最小角开始）
    pub fn corners(&self) -> [Point2; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

impl Default for BoundingBox2 {
    fn default() -> Self {
        Self::empty()
    }
}
