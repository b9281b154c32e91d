//! 图纸：实体和图层的唯一持有者
//!
//! 实体按ID存放在有序表中，空间索引与之保持同步：每次修改实体都先从索引中移除旧条目，
//! 再按新包围盒插入。一次涉及的实体数达到 `rebuild_threshold` 时改为整体重建索引。
//!
//! 实体只能通过 [`crate::history::History`] 执行命令来修改，这里的修改方法是 crate 内部的。

use crate::config::SpatialConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{KernelError, Result};
use crate::layer::{Layer, LayerId};
use crate::math::{BoundingBox2, Point2};
use crate::spatial::SpatialIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// 图纸的纯数据快照，供外部持久化层使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSnapshot {
    pub entities: Vec<Entity>,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone)]
pub struct Drawing {
    entities: BTreeMap<EntityId, Entity>,
    layers: BTreeMap<LayerId, Layer>,
    index: SpatialIndex,
    rebuild_threshold: usize,
}

impl Drawing {
    pub fn new() -> Self {
        Self::with_config(&SpatialConfig::default())
    }

    pub fn with_config(config: &SpatialConfig) -> Self {
        let mut layers = BTreeMap::new();
        let default_layer = Layer::default_layer();
        layers.insert(default_layer.id, default_layer);
        Self {
            entities: BTreeMap::new(),
            layers,
            index: SpatialIndex::with_fanout(config.max_entries, config.min_entries),
            rebuild_threshold: config.rebuild_threshold.max(1),
        }
    }

    /// 从快照恢复，缺少默认图层时补上
    ///
    /// 全局ID生成器会推进到快照中最大的ID之后，新建的实体和图层不会与恢复的撞号。
    pub fn from_snapshot(snapshot: DrawingSnapshot, config: &SpatialConfig) -> Self {
        let mut drawing = Self::with_config(config);
        for layer in snapshot.layers {
            drawing.layers.insert(layer.id, layer);
        }
        drawing.entities = snapshot.entities.into_iter().map(|e| (e.id, e)).collect();

        if let Some(max_id) = drawing.entities.keys().next_back() {
            EntityId::reserve_up_to(*max_id);
        }
        if let Some(max_id) = drawing.layers.keys().next_back() {
            LayerId::reserve_up_to(*max_id);
        }

        drawing.rebuild_index();
        drawing
    }

    pub fn snapshot(&self) -> DrawingSnapshot {
        DrawingSnapshot {
            entities: self.entities.values().cloned().collect(),
            layers: self.layers.values().cloned().collect(),
        }
    }

    // ========== 实体查询 ==========

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// 按ID顺序遍历所有实体
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// 所有实体包围盒的并集，空图纸返回哨兵
    pub fn bounds(&self) -> BoundingBox2 {
        let boxes: Vec<BoundingBox2> = self.entities.values().map(Entity::bounding_box).collect();
        BoundingBox2::merge_all(&boxes)
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// 实体自身可见且所在图层可见
    ///
    /// 引用了不存在图层的实体按图层可见处理。
    pub fn is_entity_visible(&self, id: &EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| {
            e.visible && self.layers.get(&e.layer_id).map_or(true, |l| l.visible)
        })
    }

    /// 实体未锁定且所在图层未锁定
    pub fn is_entity_editable(&self, id: &EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| {
            !e.locked && self.layers.get(&e.layer_id).map_or(true, |l| !l.locked)
        })
    }

    /// 可见实体（考虑图层）
    pub fn visible_entities(&self) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| self.is_entity_visible(&e.id))
            .collect()
    }

    /// 包围盒与 `rect` 重叠的实体
    pub fn query_range(&self, rect: &BoundingBox2) -> Vec<EntityId> {
        self.index.query_range(rect)
    }

    /// 包围盒中心在 `radius` 以内的实体
    pub fn query_near(&self, point: &Point2, radius: f64) -> Vec<EntityId> {
        self.index.query_near(point, radius)
    }

    /// 精确命中测试
    ///
    /// 先用索引取出包围盒与容差方框重叠的候选，再逐个检查几何；只返回可见实体。
    pub fn hit_test(&self, point: &Point2, tolerance: f64) -> Vec<EntityId> {
        let search = BoundingBox2::new(*point, *point).expanded(tolerance);
        self.index
            .query_range(&search)
            .into_iter()
            .filter(|id| self.is_entity_visible(id))
            .filter(|id| {
                self.entities
                    .get(id)
                    .is_some_and(|e| e.geometry.contains_point(point, tolerance))
            })
            .collect()
    }

    /// 范围内的可见实体
    pub fn visible_in_range(&self, rect: &BoundingBox2) -> Vec<&Entity> {
        self.index
            .query_range(rect)
            .into_iter()
            .filter(|id| self.is_entity_visible(id))
            .filter_map(|id| self.entities.get(&id))
            .collect()
    }

    // ========== 图层 ==========

    /// 添加图层，ID 已存在时替换
    /// 添加图层，ID已被占用时报错
    pub fn add_layer(&mut self, layer: Layer) -> Result<LayerId> {
        let id = layer.id;
        if self.layers.contains_key(&id) {
            return Err(KernelError::DuplicateLayer(id));
        }
        debug!(layer = %id, name = %layer.name, "add layer");
        self.layers.insert(id, layer);
        Ok(id)
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// 图层的可见/锁定状态可以直接修改，不进入撤销历史
    pub fn layer_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    /// 按绘制顺序排列的图层
    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.values().collect();
        layers.sort_by_key(|l| (l.order, l.id));
        layers
    }

    /// 删除图层；默认图层和仍被实体引用的图层不能删除
    pub fn remove_layer(&mut self, id: &LayerId) -> Result<Layer> {
        if *id == LayerId::DEFAULT {
            return Err(KernelError::DefaultLayer);
        }
        if !self.layers.contains_key(id) {
            return Err(KernelError::LayerNotFound(*id));
        }
        let count = self.entities.values().filter(|e| e.layer_id == *id).count();
        if count > 0 {
            return Err(KernelError::LayerInUse { layer: *id, count });
        }
        self.layers.remove(id).ok_or(KernelError::LayerNotFound(*id))
    }

    // ========== 内部修改（只由命令调用） ==========

    /// 插入或替换实体，索引中的旧条目先移除
    pub(crate) fn insert_entity(&mut self, entity: Entity) {
        let id = entity.id;
        let bbox = entity.bounding_box();
        if let Some(old) = self.entities.insert(id, entity) {
            self.index.remove_with_hint(&id, &old.bounding_box());
        }
        trace!(%id, "insert entity");
        self.index.insert(id, bbox);
    }

    pub(crate) fn remove_entity(&mut self, id: &EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        self.index.remove_with_hint(id, &removed.bounding_box());
        trace!(%id, "remove entity");
        Some(removed)
    }

    /// 多个实体一次插入/替换
    pub(crate) fn insert_entities(&mut self, entities: impl IntoIterator<Item = Entity>) {
        let entities: Vec<Entity> = entities.into_iter().collect();
        if entities.len() >= self.rebuild_threshold {
            for entity in entities {
                self.entities.insert(entity.id, entity);
            }
            self.rebuild_index();
        } else {
            for entity in entities {
                self.insert_entity(entity);
            }
        }
    }

    pub(crate) fn remove_entities<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) {
        let ids: Vec<&EntityId> = ids.into_iter().collect();
        if ids.len() >= self.rebuild_threshold {
            for id in ids {
                self.entities.remove(id);
            }
            self.rebuild_index();
        } else {
            for id in ids {
                self.remove_entity(id);
            }
        }
    }

    /// 从实体表整体重建空间索引
    pub fn rebuild_index(&mut self) {
        debug!(entities = self.entities.len(), "rebuild spatial index");
        self.index
            .rebuild(self.entities.values().map(|e| (e.id, e.bounding_box())));
    }
}

impl Default for Drawing {
    fn default() -> Self {
        Self::new()
    }
}
