//! 撤销 / 重做历史
//!
//! 快照按顺序保存在一个列表里，游标指向当前显示的快照。
//! 撤销之后再提交会丢弃游标之后的所有快照。

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    snapshots: VecDeque<T>,
    cursor: usize,
    limit: usize,
}

impl<T: Clone> History<T> {
    /// `initial` 成为第 0 个快照；`limit` 至少为 1
    pub fn new(initial: T, limit: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(initial);
        Self {
            snapshots,
            cursor: 0,
            limit: limit.max(1),
        }
    }

    pub fn current(&self) -> &T {
        // 游标始终在范围内，且列表至少有一个快照
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// 提交新快照并成为当前快照
    ///
    /// 超过上限时丢弃最旧的快照，游标随之前移。
    pub fn push(&mut self, snapshot: T) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }
}
