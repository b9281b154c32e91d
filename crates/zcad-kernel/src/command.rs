//! 可逆命令
//!
//! 命令只保存数据（实体快照），正向和反向效果都由快照推导，不捕获闭包。
//! 构造时对照当前图纸校验，构造成功后执行/撤销/重做不会失败。

use crate::drawing::Drawing;
use crate::entity::{Entity, EntityId};
use crate::error::{KernelError, Result};
use crate::math::Vector2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// 命令唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(Uuid);

impl CommandId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 命令种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Add,
    Delete,
    Modify,
    BatchAdd,
    BatchDelete,
    BatchModify,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Add => "添加",
            CommandKind::Delete => "删除",
            CommandKind::Modify => "修改",
            CommandKind::BatchAdd => "批量添加",
            CommandKind::BatchDelete => "批量删除",
            CommandKind::BatchModify => "批量修改",
        }
    }
}

/// 单个实体修改前后的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChange {
    pub before: Entity,
    pub after: Entity,
}

/// 命令数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandPayload {
    Add { entity: Entity },
    Delete { entity: Entity },
    Modify { before: Entity, after: Entity },
    BatchAdd { entities: Vec<Entity> },
    BatchDelete { entities: Vec<Entity> },
    BatchModify { changes: Vec<EntityChange> },
}

impl CommandPayload {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::Add { .. } => CommandKind::Add,
            CommandPayload::Delete { .. } => CommandKind::Delete,
            CommandPayload::Modify { .. } => CommandKind::Modify,
            CommandPayload::BatchAdd { .. } => CommandKind::BatchAdd,
            CommandPayload::BatchDelete { .. } => CommandKind::BatchDelete,
            CommandPayload::BatchModify { .. } => CommandKind::BatchModify,
        }
    }

    /// 涉及的实体数量
    pub fn entity_count(&self) -> usize {
        match self {
            CommandPayload::Add { .. } | CommandPayload::Delete { .. } | CommandPayload::Modify { .. } => 1,
            CommandPayload::BatchAdd { entities } | CommandPayload::BatchDelete { entities } => entities.len(),
            CommandPayload::BatchModify { changes } => changes.len(),
        }
    }

    /// 正向效果
    pub(crate) fn apply(&self, drawing: &mut Drawing) {
        match self {
            CommandPayload::Add { entity } => drawing.insert_entity(entity.clone()),
            CommandPayload::Delete { entity } => {
                drawing.remove_entity(&entity.id);
            }
            CommandPayload::Modify { after, .. } => drawing.insert_entity(after.clone()),
            CommandPayload::BatchAdd { entities } => drawing.insert_entities(entities.iter().cloned()),
            CommandPayload::BatchDelete { entities } => drawing.remove_entities(entities.iter().map(|e| &e.id)),
            CommandPayload::BatchModify { changes } => {
                drawing.insert_entities(changes.iter().map(|c| c.after.clone()))
            }
        }
    }

    /// 反向效果
    pub(crate) fn revert(&self, drawing: &mut Drawing) {
        match self {
            CommandPayload::Add { entity } => {
                drawing.remove_entity(&entity.id);
            }
            CommandPayload::Delete { entity } => drawing.insert_entity(entity.clone()),
            CommandPayload::Modify { before, .. } => drawing.insert_entity(before.clone()),
            CommandPayload::BatchAdd { entities } => drawing.remove_entities(entities.iter().map(|e| &e.id)),
            CommandPayload::BatchDelete { entities } => drawing.insert_entities(entities.iter().cloned()),
            CommandPayload::BatchModify { changes } => {
                drawing.insert_entities(changes.iter().map(|c| c.before.clone()))
            }
        }
    }
}

/// 可逆命令，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    id: CommandId,
    timestamp: DateTime<Utc>,
    description: String,
    payload: CommandPayload,
}

impl Command {
    fn new(description: String, payload: CommandPayload) -> Self {
        Self {
            id: CommandId::new(),
            timestamp: Utc::now(),
            description,
            payload,
        }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    /// 替换自动生成的描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    // ========== 构造 ==========

    /// 添加实体
    pub fn add_entity(drawing: &Drawing, entity: Entity) -> Result<Self> {
        check_addable(drawing, &entity)?;
        let description = format!("创建 {}", entity.geometry.type_name());
        Ok(Self::new(description, CommandPayload::Add { entity }))
    }

    /// 删除实体
    pub fn delete_entity(drawing: &Drawing, id: EntityId) -> Result<Self> {
        let entity = editable_entity(drawing, &id)?.clone();
        let description = format!("删除 {}", entity.geometry.type_name());
        Ok(Self::new(description, CommandPayload::Delete { entity }))
    }

    /// 用新快照替换实体；`after.id` 决定目标实体
    ///
    /// 可以修改图层，但目标图层必须存在且未锁定。
    pub fn modify_entity(drawing: &Drawing, after: Entity) -> Result<Self> {
        let before = editable_entity(drawing, &after.id)?.clone();
        check_layer_writable(drawing, &after)?;
        let description = format!("修改 {}", after.geometry.type_name());
        Ok(Self::new(description, CommandPayload::Modify { before, after }))
    }

    /// 一次添加多个实体，作为一个撤销步骤
    pub fn batch_add(drawing: &Drawing, entities: Vec<Entity>) -> Result<Self> {
        if entities.is_empty() {
            return Err(KernelError::EmptyBatch);
        }
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.id) {
                return Err(KernelError::DuplicateEntity(entity.id));
            }
            check_addable(drawing, entity)?;
        }
        let description = format!("创建 {} 个实体", entities.len());
        Ok(Self::new(description, CommandPayload::BatchAdd { entities }))
    }

    /// 一次删除多个实体；重复的ID只算一次
    pub fn batch_delete(drawing: &Drawing, ids: &[EntityId]) -> Result<Self> {
        if ids.is_empty() {
            return Err(KernelError::EmptyBatch);
        }
        let mut seen = HashSet::with_capacity(ids.len());
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(*id) {
                entities.push(editable_entity(drawing, id)?.clone());
            }
        }
        let description = format!("删除 {} 个实体", entities.len());
        Ok(Self::new(description, CommandPayload::BatchDelete { entities }))
    }

    /// 平移多个实体
    pub fn translate_entities(drawing: &Drawing, ids: &[EntityId], offset: Vector2) -> Result<Self> {
        if ids.is_empty() {
            return Err(KernelError::EmptyBatch);
        }
        let mut seen = HashSet::with_capacity(ids.len());
        let mut changes = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            let before = editable_entity(drawing, id)?.clone();
            let mut after = before.clone();
            after.geometry.translate(offset);
            changes.push(EntityChange { before, after });
        }
        let description = format!("移动 {} 个实体", changes.len());
        Ok(Self::new(description, CommandPayload::BatchModify { changes }))
    }
}

/// 新实体：ID 未被占用，图层存在且未锁定
fn check_addable(drawing: &Drawing, entity: &Entity) -> Result<()> {
    if drawing.contains(&entity.id) {
        return Err(KernelError::DuplicateEntity(entity.id));
    }
    check_layer_writable(drawing, entity)
}

fn check_layer_writable(drawing: &Drawing, entity: &Entity) -> Result<()> {
    let layer = drawing
        .layer(&entity.layer_id)
        .ok_or(KernelError::LayerNotFound(entity.layer_id))?;
    if layer.locked {
        return Err(KernelError::LayerLocked(layer.id));
    }
    Ok(())
}

/// 已存在且可编辑的实体
fn editable_entity<'a>(drawing: &'a Drawing, id: &EntityId) -> Result<&'a Entity> {
    let entity = drawing.entity(id).ok_or(KernelError::EntityNotFound(*id))?;
    if entity.locked {
        return Err(KernelError::EntityLocked(*id));
    }
    if drawing.layer(&entity.layer_id).is_some_and(|l| l.locked) {
        return Err(KernelError::LayerLocked(entity.layer_id));
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Geometry, Line};
    use crate::layer::{Layer, LayerId};
    use crate::math::Point2;

    fn line() -> Entity {
        Entity::new(Geometry::Line(Line::new(Point2::origin(), Point2::new(10.0, 0.0))))
    }

    #[test]
    fn test_add_validation() {
        let mut drawing = Drawing::new();
        let e = line();
        let cmd = Command::add_entity(&drawing, e.clone()).unwrap();
        assert_eq!(cmd.kind(), CommandKind::Add);
        assert_eq!(cmd.description(), "创建 Line");

        drawing.insert_entity(e.clone());
        assert!(matches!(
            Command::add_entity(&drawing, e),
            Err(KernelError::DuplicateEntity(_))
        ));

        let orphan = line().with_layer(LayerId::from_raw(9999));
        assert!(matches!(
            Command::add_entity(&drawing, orphan),
            Err(KernelError::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_locked_layer_rejected() {
        let mut drawing = Drawing::new();
        let mut layer = Layer::new("frozen");
        layer.locked = true;
        let layer_id = drawing.add_layer(layer).unwrap();

        assert!(matches!(
            Command::add_entity(&drawing, line().with_layer(layer_id)),
            Err(KernelError::LayerLocked(_))
        ));

        // 图层锁定前已在其上的实体不能删除/修改
        let e = line();
        let id = e.id;
        drawing.insert_entity(e.clone().with_layer(layer_id));
        assert!(matches!(
            Command::delete_entity(&drawing, id),
            Err(KernelError::LayerLocked(_))
        ));
        assert!(matches!(
            Command::modify_entity(&drawing, e),
            Err(KernelError::LayerLocked(_))
        ));
    }

    #[test]
    fn test_locked_entity_rejected() {
        let mut drawing = Drawing::new();
        let e = line().with_locked(true);
        let id = e.id;
        drawing.insert_entity(e);
        assert!(matches!(
            Command::delete_entity(&drawing, id),
            Err(KernelError::EntityLocked(_))
        ));
        assert!(matches!(
            Command::translate_entities(&drawing, &[id], Vector2::new(1.0, 0.0)),
            Err(KernelError::EntityLocked(_))
        ));
    }

    #[test]
    fn test_missing_entity() {
        let drawing = Drawing::new();
        let ghost = EntityId::from_raw(123_456);
        assert!(matches!(
            Command::delete_entity(&drawing, ghost),
            Err(KernelError::EntityNotFound(_))
        ));
        assert!(matches!(
            Command::batch_delete(&drawing, &[ghost]),
            Err(KernelError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_empty_and_duplicate_batches() {
        let mut drawing = Drawing::new();
        assert!(matches!(Command::batch_add(&drawing, vec![]), Err(KernelError::EmptyBatch)));
        assert!(matches!(Command::batch_delete(&drawing, &[]), Err(KernelError::EmptyBatch)));

        let e = line();
        assert!(matches!(
            Command::batch_add(&drawing, vec![e.clone(), e.clone()]),
            Err(KernelError::DuplicateEntity(_))
        ));

        let id = e.id;
        drawing.insert_entity(e);
        let cmd = Command::batch_delete(&drawing, &[id, id]).unwrap();
        assert_eq!(cmd.payload().entity_count(), 1);
    }

    #[test]
    fn test_apply_and_revert_modify() {
        let mut drawing = Drawing::new();
        let e = line();
        let id = e.id;
        drawing.insert_entity(e.clone());

        let mut after = e.clone();
        after.geometry = Geometry::Circle(Circle::new(Point2::new(50.0, 50.0), 5.0));
        let cmd = Command::modify_entity(&drawing, after.clone()).unwrap();

        cmd.payload().apply(&mut drawing);
        assert_eq!(drawing.entity(&id), Some(&after));
        cmd.payload().revert(&mut drawing);
        assert_eq!(drawing.entity(&id), Some(&e));
        assert_eq!(drawing.index().len(), 1);
    }

    #[test]
    fn test_translate_payload() {
        let mut drawing = Drawing::new();
        let e = line();
        let id = e.id;
        drawing.insert_entity(e);
        let cmd = Command::translate_entities(&drawing, &[id], Vector2::new(0.0, 5.0)).unwrap();
        assert_eq!(cmd.kind(), CommandKind::BatchModify);

        cmd.payload().apply(&mut drawing);
        let bbox = drawing.entity(&id).unwrap().bounding_box();
        assert_eq!(bbox.min, Point2::new(0.0, 5.0));
    }

    #[test]
    fn test_command_serde() {
        let drawing = Drawing::new();
        let cmd = Command::add_entity(&drawing, line())
            .unwrap()
            .with_description("画线");
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"kind\":\"add\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
        assert_eq!(back.description(), "画线");
    }
}
