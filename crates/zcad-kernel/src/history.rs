//! 撤销/重做历史
//!
//! 两个有界栈：执行新命令压入撤销栈并清空重做栈；撤销栈超过容量时丢弃最早的命令。
//! 批量命令作为一个步骤撤销/重做。

use crate::command::Command;
use crate::config::{HistoryConfig, DEFAULT_HISTORY_DEPTH};
use crate::drawing::Drawing;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct History {
    /// 队尾是最近执行的命令
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// 指定撤销栈容量（至少为 1）
    pub fn with_depth(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::with_depth(config.max_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// 调整容量，缩小时丢弃最早的命令
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!(
                    command = %evicted.id(),
                    description = evicted.description(),
                    "history full, dropping oldest command"
                );
            }
        }
    }

    /// 执行命令并记录
    pub fn execute(&mut self, drawing: &mut Drawing, command: Command) {
        debug!(
            command = %command.id(),
            kind = command.kind().name(),
            entities = command.payload().entity_count(),
            description = command.description(),
            "execute"
        );
        command.payload().apply(drawing);
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        self.trim();
    }

    /// 撤销最近的命令，没有可撤销的命令时返回 false
    pub fn undo(&mut self, drawing: &mut Drawing) -> bool {
        let Some(command) = self.undo_stack.pop_back() else {
            return false;
        };
        debug!(command = %command.id(), description = command.description(), "undo");
        command.payload().revert(drawing);
        self.redo_stack.push(command);
        true
    }

    /// 重做最近撤销的命令
    pub fn redo(&mut self, drawing: &mut Drawing) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        debug!(command = %command.id(), description = command.description(), "redo");
        command.payload().apply(drawing);
        self.undo_stack.push_back(command);
        self.trim();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// 下一次撤销的命令描述
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(Command::description)
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(Command::description)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// 撤销栈中的命令，从最早到最近
    pub fn undo_commands(&self) -> impl Iterator<Item = &Command> {
        self.undo_stack.iter()
    }

    /// 清空历史（不影响图纸）
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::geometry::{Geometry, Line};
    use crate::math::Point2;

    fn line(x: f64) -> Entity {
        Entity::new(Geometry::Line(Line::new(Point2::new(x, 0.0), Point2::new(x, 1.0))))
    }

    fn add(history: &mut History, drawing: &mut Drawing, x: f64) -> Entity {
        let e = line(x);
        let cmd = Command::add_entity(drawing, e.clone()).unwrap();
        history.execute(drawing, cmd);
        e
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new();
        let mut drawing = Drawing::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.undo(&mut drawing));
        assert!(!history.redo(&mut drawing));
        assert!(history.undo_description().is_none());
    }

    #[test]
    fn test_undo_redo_add() {
        let mut history = History::new();
        let mut drawing = Drawing::new();
        let e = add(&mut history, &mut drawing, 0.0);

        assert!(drawing.contains(&e.id));
        assert_eq!(history.undo_description(), Some("创建 Line"));

        assert!(history.undo(&mut drawing));
        assert!(!drawing.contains(&e.id));
        assert!(history.can_redo());
        assert_eq!(history.redo_description(), Some("创建 Line"));

        assert!(history.redo(&mut drawing));
        assert_eq!(drawing.entity(&e.id), Some(&e));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut history = History::new();
        let mut drawing = Drawing::new();
        add(&mut history, &mut drawing, 0.0);
        add(&mut history, &mut drawing, 1.0);
        history.undo(&mut drawing);
        assert_eq!(history.redo_len(), 1);

        add(&mut history, &mut drawing, 2.0);
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_bounded_depth_drops_oldest() {
        let mut history = History::with_depth(3);
        let mut drawing = Drawing::new();
        let first = add(&mut history, &mut drawing, 0.0);
        for i in 1..5 {
            add(&mut history, &mut drawing, i as f64);
        }
        assert_eq!(history.undo_len(), 3);

        while history.undo(&mut drawing) {}
        // 最早的两个命令已被丢弃，其效果保留
        assert_eq!(drawing.entity_count(), 2);
        assert!(drawing.contains(&first.id));
    }

    #[test]
    fn test_set_max_depth_trims() {
        let mut history = History::new();
        let mut drawing = Drawing::new();
        for i in 0..10 {
            add(&mut history, &mut drawing, i as f64);
        }
        history.set_max_depth(4);
        assert_eq!(history.undo_len(), 4);
        assert_eq!(history.max_depth(), 4);

        history.set_max_depth(0);
        assert_eq!(history.max_depth(), 1);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        let mut drawing = Drawing::new();
        add(&mut history, &mut drawing, 0.0);
        add(&mut history, &mut drawing, 1.0);
        history.undo(&mut drawing);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(drawing.entity_count(), 1);
    }
}
