//! 集成测试共用工具

#![allow(dead_code)]

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use zcad_kernel::prelude::*;

static INIT: Once = Once::new();

/// 初始化日志（每个测试二进制只安装一次）
pub fn init_logging() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Entity {
    Entity::new(Geometry::Line(Line::new(Point2::new(x0, y0), Point2::new(x1, y1))))
}

pub fn circle(x: f64, y: f64, r: f64) -> Entity {
    Entity::new(Geometry::Circle(Circle::new(Point2::new(x, y), r)))
}

pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Entity {
    Entity::new(Geometry::Rectangle(Rectangle::new(Point2::new(x, y), w, h)))
}

/// 覆盖所有实体的查询框
pub fn everything() -> BoundingBox2 {
    BoundingBox2::new(Point2::new(-1e9, -1e9), Point2::new(1e9, 1e9))
}

/// 图纸中实体集合与索引内容一致
pub fn assert_index_in_sync(drawing: &Drawing) {
    let mut indexed: Vec<(EntityId, BoundingBox2)> = drawing.index().entries();
    indexed.sort_by_key(|(id, _)| *id);
    let expected: Vec<(EntityId, BoundingBox2)> = drawing
        .entities()
        .map(|e| (e.id, e.bounding_box()))
        .collect();
    assert_eq!(indexed, expected, "spatial index out of sync with drawing");
}
