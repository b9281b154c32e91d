//! 空间索引
//!
//! 基于 R-tree 的空间查询，支持：
//! - 范围查询
//! - 点击测试
//! - 近邻查询
//!
//! 索引只比较包围盒，结果可能包含与真实形状不相交的实体（假阳性），
//! 需要精确命中测试时由调用方再用 [`crate::geometry::Geometry::contains_point`] 过滤。
//!
//! 同一个ID重复插入不会去重；几何变化时必须先 `remove` 再 `insert`。
//! [`crate::drawing::Drawing`] 在每次修改实体时自动完成这一步。

use crate::entity::EntityId;
use crate::math::{BoundingBox2, Point2};
use std::cmp::Ordering;
use tracing::{debug, info, trace};

/// 默认节点最大条目数
pub const DEFAULT_MAX_ENTRIES: usize = 9;

/// 默认节点最小条目数
pub const DEFAULT_MIN_ENTRIES: usize = 4;

/// 叶子条目
#[derive(Debug, Clone, Copy)]
struct Entry {
    id: EntityId,
    bbox: BoundingBox2,
}

/// 内部节点的子节点，附带其所有后代的紧包围盒
#[derive(Debug, Clone)]
struct Child {
    bbox: BoundingBox2,
    node: Box<Node>,
}

impl Child {
    fn new(node: Node) -> Self {
        Self {
            bbox: node.bbox(),
            node: Box::new(node),
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Vec<Entry>),
    Internal(Vec<Child>),
}

impl Node {
    fn len(&self) -> usize {
        match self {
            Node::Leaf(entries) => entries.len(),
            Node::Internal(children) => children.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有条目/子节点包围盒的并集，空节点返回哨兵
    fn bbox(&self) -> BoundingBox2 {
        match self {
            Node::Leaf(entries) => union_all(entries.iter().map(|e| e.bbox)),
            Node::Internal(children) => union_all(children.iter().map(|c| c.bbox)),
        }
    }

    fn collect_overlapping(&self, rect: &BoundingBox2, out: &mut Vec<Entry>) {
        match self {
            Node::Leaf(entries) => {
                out.extend(entries.iter().filter(|e| e.bbox.intersects(rect)).copied());
            }
            Node::Internal(children) => {
                for child in children.iter().filter(|c| c.bbox.intersects(rect)) {
                    child.node.collect_overlapping(rect, out);
                }
            }
        }
    }

    fn collect_entries(&self, out: &mut Vec<Entry>) {
        match self {
            Node::Leaf(entries) => out.extend_from_slice(entries),
            Node::Internal(children) => {
                for child in children {
                    child.node.collect_entries(out);
                }
            }
        }
    }

    fn find(&self, id: &EntityId) -> Option<BoundingBox2> {
        match self {
            Node::Leaf(entries) => entries.iter().find(|e| e.id == *id).map(|e| e.bbox),
            Node::Internal(children) => children.iter().find_map(|c| c.node.find(id)),
        }
    }

    /// 插入条目；节点溢出分裂时返回新的兄弟节点
    fn insert(&mut self, entry: Entry, max_entries: usize) -> Option<Child> {
        match self {
            Node::Leaf(entries) => {
                entries.push(entry);
                if entries.len() > max_entries {
                    let right = split_items(entries, |e| e.bbox);
                    Some(Child::new(Node::Leaf(right)))
                } else {
                    None
                }
            }
            Node::Internal(children) => {
                let index = choose_subtree(children, &entry.bbox);
                let child = &mut children[index];
                child.bbox = child.bbox.union(&entry.bbox);

                let sibling = child.node.insert(entry, max_entries)?;
                // 分裂后原子节点变小，重新计算
                child.bbox = child.node.bbox();
                children.push(sibling);

                if children.len() > max_entries {
                    let right = split_items(children, |c| c.bbox);
                    Some(Child::new(Node::Internal(right)))
                } else {
                    None
                }
            }
        }
    }

    /// 删除第一个匹配的条目
    ///
    /// 路径上的包围盒按子节点并集重新计算；条目数低于 `min_entries` 的子节点被拆散，
    /// 其全部条目放入 `orphans` 等待重新插入。
    fn remove(
        &mut self,
        id: &EntityId,
        hint: Option<&BoundingBox2>,
        min_entries: usize,
        orphans: &mut Vec<Entry>,
    ) -> bool {
        match self {
            Node::Leaf(entries) => match entries.iter().position(|e| e.id == *id) {
                Some(pos) => {
                    entries.remove(pos);
                    true
                }
                None => false,
            },
            Node::Internal(children) => {
                for i in 0..children.len() {
                    if let Some(hint) = hint {
                        if !children[i].bbox.contains_box(hint) {
                            continue;
                        }
                    }
                    if !children[i].node.remove(id, hint, min_entries, orphans) {
                        continue;
                    }
                    if children[i].node.len() < min_entries {
                        let dissolved = children.remove(i);
                        dissolved.node.collect_entries(orphans);
                    } else {
                        children[i].bbox = children[i].node.bbox();
                    }
                    return true;
                }
                false
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal(children) => 1 + children.first().map_or(0, |c| c.node.depth()),
        }
    }

    fn node_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal(children) => 1 + children.iter().map(|c| c.node.node_count()).sum::<usize>(),
        }
    }
}

/// 原始并集，不把全零盒子当作哨兵跳过
fn union_all(mut boxes: impl Iterator<Item = BoundingBox2>) -> BoundingBox2 {
    match boxes.next() {
        Some(first) => boxes.fold(first, |acc, b| acc.union(&b)),
        None => BoundingBox2::empty(),
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// 选择包含新盒子所需面积增量最小的子节点，相同时取第一个
fn choose_subtree(children: &[Child], bbox: &BoundingBox2) -> usize {
    let mut best = 0;
    let mut best_enlargement = f64::INFINITY;
    for (i, child) in children.iter().enumerate() {
        let enlargement = child.bbox.enlargement_to_include(bbox);
        if enlargement < best_enlargement {
            best = i;
            best_enlargement = enlargement;
        }
    }
    best
}

/// 把溢出的节点一分为二：沿中心点分布更宽的轴排序后从中间切开。
/// 不追求面积最优，返回右半部分。
fn split_items<T>(items: &mut Vec<T>, bbox_of: impl Fn(&T) -> BoundingBox2) -> Vec<T> {
    let centers: Vec<Point2> = items.iter().map(|item| bbox_of(item).center()).collect();
    let spread = |axis: fn(&Point2) -> f64| {
        let (lo, hi) = centers
            .iter()
            .map(axis)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi - lo
    };
    let by_x = spread(|p| p.x) >= spread(|p| p.y);

    items.sort_by(|a, b| {
        let (ca, cb) = (bbox_of(a).center(), bbox_of(b).center());
        if by_x {
            compare_f64(ca.x, cb.x)
        } else {
            compare_f64(ca.y, cb.y)
        }
    });

    let half = items.len() / 2;
    items.split_off(half)
}

/// STR (Sort-Tile-Recursive) 分组：先按 x 切成竖条，条内按 y 每 `max` 个一组
fn str_pack<T>(mut items: Vec<T>, max_entries: usize, bbox_of: impl Fn(&T) -> BoundingBox2) -> Vec<Vec<T>> {
    let group_count = items.len().div_ceil(max_entries);
    let slice_count = (group_count as f64).sqrt().ceil().max(1.0) as usize;
    let slice_size = slice_count * max_entries;

    items.sort_by(|a, b| compare_f64(bbox_of(a).center().x, bbox_of(b).center().x));

    let mut groups = Vec::with_capacity(group_count);
    while !items.is_empty() {
        let rest = items.split_off(slice_size.min(items.len()));
        let mut slice = std::mem::replace(&mut items, rest);
        slice.sort_by(|a, b| compare_f64(bbox_of(a).center().y, bbox_of(b).center().y));

        while !slice.is_empty() {
            let rest = slice.split_off(max_entries.min(slice.len()));
            groups.push(std::mem::replace(&mut slice, rest));
        }
    }
    groups
}

/// 索引统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpatialIndexStats {
    /// 树高（空树为 0）
    pub depth: usize,
    pub node_count: usize,
    pub entry_count: usize,
}

/// R-tree 空间索引
///
/// 单一所有者的可变结构，不做内部同步。
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: Option<Node>,
    max_entries: usize,
    min_entries: usize,
    len: usize,
}

impl SpatialIndex {
    /// 使用默认扇出创建
    pub fn new() -> Self {
        Self::with_fanout(DEFAULT_MAX_ENTRIES, DEFAULT_MIN_ENTRIES)
    }

    /// 指定节点最大/最小条目数
    ///
    /// 参数会被夹到合法范围：`max_entries >= 2`，`1 <= min_entries <= max_entries / 2`。
    /// 需要报错而不是夹取时先用 [`crate::config::SpatialConfig::validate`] 校验。
    pub fn with_fanout(max_entries: usize, min_entries: usize) -> Self {
        let max_entries = max_entries.max(2);
        let min_entries = min_entries.clamp(1, max_entries / 2);
        Self {
            root: None,
            max_entries,
            min_entries,
            len: 0,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    /// 插入实体
    pub fn insert(&mut self, id: EntityId, bbox: BoundingBox2) {
        trace!(%id, "spatial insert");
        let entry = Entry { id, bbox };
        match self.root.as_mut() {
            None => self.root = Some(Node::Leaf(vec![entry])),
            Some(root) => {
                if let Some(sibling) = root.insert(entry, self.max_entries) {
                    // 根节点分裂：树长高一层
                    let old_root = std::mem::replace(root, Node::Internal(Vec::new()));
                    *root = Node::Internal(vec![Child::new(old_root), sibling]);
                }
            }
        }
        self.len += 1;
    }

    /// 移除实体（第一个匹配的条目），ID 不存在时返回 false
    pub fn remove(&mut self, id: &EntityId) -> bool {
        self.remove_entry(id, None)
    }

    /// 已知插入时的包围盒时，只搜索可能包含它的子树
    ///
    /// 提示与实际不符时退回全树搜索。
    pub fn remove_with_hint(&mut self, id: &EntityId, bbox: &BoundingBox2) -> bool {
        self.remove_entry(id, Some(bbox)) || self.remove_entry(id, None)
    }

    fn remove_entry(&mut self, id: &EntityId, hint: Option<&BoundingBox2>) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };

        let mut orphans = Vec::new();
        if !root.remove(id, hint, self.min_entries, &mut orphans) {
            return false;
        }
        trace!(%id, "spatial remove");

        // 只剩一个子节点的内部根节点被其子节点取代
        loop {
            let only_child = match root {
                Node::Internal(children) if children.len() == 1 => children.pop(),
                _ => None,
            };
            match only_child {
                Some(child) => *root = *child.node,
                None => break,
            }
        }
        if root.is_empty() {
            self.root = None;
        }

        self.len -= 1 + orphans.len();
        if !orphans.is_empty() {
            debug!(count = orphans.len(), "reinserting entries from underfull nodes");
        }
        for entry in orphans {
            self.insert(entry.id, entry.bbox);
        }
        true
    }

    /// 更新实体的包围盒
    pub fn update(&mut self, id: EntityId, new_bbox: BoundingBox2) {
        self.remove(&id);
        self.insert(id, new_bbox);
    }

    /// 范围查询：包围盒与 `rect` 重叠的所有实体
    pub fn query_rect(&self, rect: &BoundingBox2) -> Vec<EntityId> {
        self.overlapping(rect).into_iter().map(|e| e.id).collect()
    }

    /// 同 [`Self::query_rect`]
    pub fn query_range(&self, rect: &BoundingBox2) -> Vec<EntityId> {
        self.query_rect(rect)
    }

    fn overlapping(&self, rect: &BoundingBox2) -> Vec<Entry> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_overlapping(rect, &mut out);
        }
        out
    }

    /// 点击测试：包围盒包含指定点的所有实体
    pub fn query_point(&self, point: &Point2) -> Vec<EntityId> {
        self.query_rect(&BoundingBox2::new(*point, *point))
    }

    /// 近点查询
    ///
    /// 先用外接正方形做范围查询，再保留包围盒中心到 `point` 距离不超过 `radius` 的条目。
    /// 这是近似：比较的是盒子中心而不是形状本身。
    pub fn query_near(&self, point: &Point2, radius: f64) -> Vec<EntityId> {
        self.near_entries(point, radius)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    fn near_entries(&self, point: &Point2, radius: f64) -> Vec<(EntityId, f64)> {
        let search_bbox = BoundingBox2::new(
            Point2::new(point.x - radius, point.y - radius),
            Point2::new(point.x + radius, point.y + radius),
        );
        self.overlapping(&search_bbox)
            .into_iter()
            .map(|e| (e.id, (e.bbox.center() - point).norm()))
            .filter(|(_, dist)| *dist <= radius)
            .collect()
    }

    /// 查找包围盒中心离 `point` 最近的实体
    pub fn query_nearest(&self, point: &Point2, max_distance: f64) -> Option<EntityId> {
        self.near_entries(point, max_distance)
            .into_iter()
            .min_by(|a, b| compare_f64(a.1, b.1))
            .map(|(id, _)| id)
    }

    /// 批量重建（STR 打包）
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (EntityId, BoundingBox2)>) {
        let entries: Vec<Entry> = entries
            .into_iter()
            .map(|(id, bbox)| Entry { id, bbox })
            .collect();
        self.len = entries.len();
        self.root = if entries.is_empty() {
            None
        } else {
            Some(Self::bulk_load(entries, self.max_entries))
        };

        let stats = self.stats();
        info!(
            entries = stats.entry_count,
            depth = stats.depth,
            nodes = stats.node_count,
            "Spatial index rebuilt"
        );
    }

    fn bulk_load(entries: Vec<Entry>, max_entries: usize) -> Node {
        if entries.len() <= max_entries {
            return Node::Leaf(entries);
        }

        let mut level: Vec<Child> = str_pack(entries, max_entries, |e| e.bbox)
            .into_iter()
            .map(|group| Child::new(Node::Leaf(group)))
            .collect();

        while level.len() > max_entries {
            level = str_pack(level, max_entries, |c| c.bbox)
                .into_iter()
                .map(|group| Child::new(Node::Internal(group)))
                .collect();
        }

        Node::Internal(level)
    }

    /// 清空索引
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// 条目数量（重复插入的ID按次数计）
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// 获取实体的包围盒（遍历查找）
    pub fn get_bbox(&self, id: &EntityId) -> Option<BoundingBox2> {
        self.root.as_ref().and_then(|root| root.find(id))
    }

    /// 整棵树的包围盒，空树返回 `None`
    pub fn bounds(&self) -> Option<BoundingBox2> {
        self.root.as_ref().map(Node::bbox)
    }

    /// 所有条目
    pub fn entries(&self) -> Vec<(EntityId, BoundingBox2)> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(root) = &self.root {
            root.collect_entries(&mut out);
        }
        out.into_iter().map(|e| (e.id, e.bbox)).collect()
    }

    pub fn stats(&self) -> SpatialIndexStats {
        match &self.root {
            None => SpatialIndexStats::default(),
            Some(root) => SpatialIndexStats {
                depth: root.depth(),
                node_count: root.node_count(),
                entry_count: self.len,
            },
        }
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
