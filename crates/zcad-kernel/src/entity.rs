//! 实体标识和管理
//!
//! 实体 = 唯一ID + 几何数据 + 样式 + 图层引用 + 可见/锁定标志。
//! 实体只由 [`crate::drawing::Drawing`] 持有，其他结构（空间索引、选择集、命令目标）都只保存 [`EntityId`]。

use crate::geometry::Geometry;
use crate::layer::LayerId;
use crate::math::BoundingBox2;
use crate::properties::Properties;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 全局实体ID生成器
static ENTITY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 实体唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// 创建新的实体ID
    pub fn new() -> Self {
        Self(ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// 从指定值创建（用于恢复快照）
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// 保证之后生成的ID都大于 `id`
    pub fn reserve_up_to(id: EntityId) {
        ENTITY_COUNTER.fetch_max(id.0.saturating_add(1), Ordering::Relaxed);
    }

    /// 空ID（无效）
    pub const NULL: EntityId = EntityId(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// CAD实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// 唯一标识符
    pub id: EntityId,

    /// 几何类型和数据
    pub geometry: Geometry,

    /// 视觉属性
    pub properties: Properties,

    /// 所属图层ID
    pub layer_id: LayerId,

    /// 是否可见
    pub visible: bool,

    /// 是否锁定（不可编辑）
    pub locked: bool,
}

impl Entity {
    /// 创建新实体（放在默认图层）
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: EntityId::new(),
            geometry,
            properties: Properties::default(),
            layer_id: LayerId::DEFAULT,
            visible: true,
            locked: false,
        }
    }

    /// 获取包围盒
    pub fn bounding_box(&self) -> BoundingBox2 {
        self.geometry.bounding_box()
    }

    /// 使用指定的图层
    pub fn with_layer(mut self, layer_id: LayerId) -> Self {
        self.layer_id = layer_id;
        self
    }

    /// 使用指定的属性
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}
