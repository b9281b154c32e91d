//! ZCAD 二维图元内核
//!
//! 提供几何图元、包围盒、R-tree 空间索引、对象捕捉和可撤销的命令历史。
//!
//! # 架构设计
//!
//! - `Geometry`: 封闭的图元枚举，所有派生查询按 `match` 分派
//! - `Entity`: 唯一ID + 几何 + 样式 + 图层引用
//! - `Drawing`: 实体和图层的唯一持有者，维护空间索引
//! - `Command` / `History`: 以快照为数据的可逆命令
//!
//! # 示例
//!
//! ```rust
//! use zcad_kernel::prelude::*;
//!
//! let mut editor = Editor::new();
//! let line = Entity::new(Geometry::Line(Line::new(Point2::origin(), Point2::new(100.0, 50.0))));
//! let id = editor.add_entity(line).unwrap();
//!
//! let hits = editor.drawing().hit_test(&Point2::new(50.0, 25.0), 0.5);
//! assert_eq!(hits, vec![id]);
//!
//! editor.undo();
//! assert!(editor.drawing().is_empty());
//! ```

pub mod algorithms;
pub mod command;
pub mod config;
pub mod drawing;
pub mod editor;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod history;
pub mod layer;
pub mod math;
pub mod properties;
pub mod snap;
pub mod spatial;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::command::{Command, CommandId, CommandKind, CommandPayload};
    pub use crate::config::KernelConfig;
    pub use crate::drawing::{Drawing, DrawingSnapshot};
    pub use crate::editor::Editor;
    pub use crate::entity::{Entity, EntityId};
    pub use crate::error::KernelError;
    pub use crate::geometry::{
        Arc, Block, Circle, Dimension, Geometry, Hatch, Line, Polygon, Polyline, Rectangle, Text,
        TextAlignment,
    };
    pub use crate::history::History;
    pub use crate::layer::{Layer, LayerId};
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::properties::{Color, LineType, Properties};
    pub use crate::snap::{
        nearest_snap_point, snap_points_for, snap_to_grid, SnapConfig, SnapEngine, SnapMask,
        SnapPoint, SnapType,
    };
    pub use crate::spatial::SpatialIndex;
}
