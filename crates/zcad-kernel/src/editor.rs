//! 编辑器门面
//!
//! 组合图纸、撤销历史和捕捉引擎。交互层通过这里创建并执行命令，
//! 所有实体修改都进入历史。

use crate::command::Command;
use crate::config::KernelConfig;
use crate::drawing::{Drawing, DrawingSnapshot};
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::history::History;
use crate::layer::{Layer, LayerId};
use crate::math::{BoundingBox2, Point2, Vector2};
use crate::snap::{SnapEngine, SnapPoint};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Editor {
    drawing: Drawing,
    history: History,
    snap: SnapEngine,
    config: KernelConfig,
}

impl Editor {
    pub fn new() -> Self {
        Self::build(KernelConfig::default())
    }

    /// 校验配置后创建
    pub fn with_config(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: KernelConfig) -> Self {
        Self {
            drawing: Drawing::with_config(&config.spatial),
            history: History::from_config(&config.history),
            snap: SnapEngine::new(config.snap.clone()),
            config,
        }
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn snap_engine(&self) -> &SnapEngine {
        &self.snap
    }

    pub fn snap_engine_mut(&mut self) -> &mut SnapEngine {
        &mut self.snap
    }

    /// 用快照替换当前图纸，历史被清空
    pub fn load_snapshot(&mut self, snapshot: DrawingSnapshot) {
        self.drawing = Drawing::from_snapshot(snapshot, &self.config.spatial);
        self.history.clear();
        info!(
            entities = self.drawing.entity_count(),
            layers = self.drawing.layers().len(),
            "Drawing loaded from snapshot"
        );
    }

    // ========== 命令 ==========

    pub fn execute(&mut self, command: Command) {
        self.history.execute(&mut self.drawing, command);
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.drawing)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.drawing)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        let id = entity.id;
        let command = Command::add_entity(&self.drawing, entity)?;
        self.execute(command);
        Ok(id)
    }

    pub fn add_entities(&mut self, entities: Vec<Entity>) -> Result<Vec<EntityId>> {
        let ids = entities.iter().map(|e| e.id).collect();
        let command = Command::batch_add(&self.drawing, entities)?;
        self.execute(command);
        Ok(ids)
    }

    pub fn delete_entity(&mut self, id: EntityId) -> Result<()> {
        let command = Command::delete_entity(&self.drawing, id)?;
        self.execute(command);
        Ok(())
    }

    pub fn delete_entities(&mut self, ids: &[EntityId]) -> Result<()> {
        let command = Command::batch_delete(&self.drawing, ids)?;
        self.execute(command);
        Ok(())
    }

    pub fn modify_entity(&mut self, after: Entity) -> Result<()> {
        let command = Command::modify_entity(&self.drawing, after)?;
        self.execute(command);
        Ok(())
    }

    pub fn translate_entities(&mut self, ids: &[EntityId], offset: Vector2) -> Result<()> {
        let command = Command::translate_entities(&self.drawing, ids, offset)?;
        self.execute(command);
        Ok(())
    }

    // ========== 图层（不进入历史） ==========

    pub fn add_layer(&mut self, layer: Layer) -> Result<LayerId> {
        self.drawing.add_layer(layer)
    }

    pub fn layer_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.drawing.layer_mut(id)
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Result<Layer> {
        self.drawing.remove_layer(id)
    }

    // ========== 捕捉 ==========

    /// 光标附近的最佳捕捉点
    ///
    /// 只考虑包围盒落在容差范围内的可见实体。
    pub fn snap(&mut self, cursor: Point2, zoom: f64, reference_point: Option<Point2>) -> Option<SnapPoint> {
        let tolerance = self.snap.world_tolerance(zoom);
        let search = BoundingBox2::new(cursor, cursor).expanded(tolerance);
        let nearby = self.drawing.visible_in_range(&search);
        self.snap.find_snap_point(cursor, &nearby, zoom, reference_point)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
