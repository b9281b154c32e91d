//! 图层
//!
//! 实体只通过 [`LayerId`] 引用图层；图层的可见/锁定状态在查询时生效，不会复制到实体上。

use crate::properties::{Color, LineType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 图层ID生成器，0 保留给默认图层
static LAYER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 图层唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(u64);

impl LayerId {
    /// 默认图层 "0"
    pub const DEFAULT: LayerId = LayerId(0);

    pub fn new() -> Self {
        Self(LAYER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// 从指定值创建（用于恢复快照）
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// 保证之后生成的ID都大于 `id`
    pub fn reserve_up_to(id: LayerId) {
        LAYER_COUNTER.fetch_max(id.0.saturating_add(1), Ordering::Relaxed);
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// 图层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub color: Color,
    pub line_type: LineType,
    pub line_weight: f64,
    /// 绘制顺序，越小越靠下
    pub order: i32,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            visible: true,
            locked: false,
            color: Color::WHITE,
            line_type: LineType::Continuous,
            line_weight: 0.25,
            order: 0,
        }
    }

    /// 默认图层 "0"
    pub fn default_layer() -> Self {
        Self {
            id: LayerId::DEFAULT,
            ..Self::new("0")
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }
}
