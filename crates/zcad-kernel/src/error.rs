//! 内核错误定义
//!
//! 几何查询用 `Option`/空列表表达"没有结果"，不走这里。
//! 这里只有命令构造时的逻辑错误和配置加载错误；命令一旦构造成功，执行/撤销/重做都不会失败。

use crate::entity::EntityId;
use crate::layer::LayerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Entity already exists: {0}")]
    DuplicateEntity(EntityId),

    #[error("Entity is locked: {0}")]
    EntityLocked(EntityId),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(LayerId),

    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("Layer is locked: {0}")]
    LayerLocked(LayerId),

    #[error("Layer is still referenced by {count} entities: {layer}")]
    LayerInUse { layer: LayerId, count: usize },

    #[error("The default layer cannot be removed")]
    DefaultLayer,

    #[error("Batch command has no entities")]
    EmptyBatch,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KernelError>;
