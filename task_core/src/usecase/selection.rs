//! 任务选择集：持有任务身份键（`worksheet-taskNumber-columnIndex`）的
//! 值对象。所有操作返回新集合，调用方自行决定何时替换。

use std::collections::BTreeSet;

use crate::core::model::Task;

/// 已选任务键的不可变快照。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskSelection {
    keys: BTreeSet<String>,
}

impl TaskSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, task: &Task) -> bool {
        self.keys.contains(&task.key())
    }

    pub fn with(&self, task: &Task) -> Self {
        let mut keys = self.keys.clone();
        keys.insert(task.key());
        Self { keys }
    }

    pub fn without(&self, task: &Task) -> Self {
        let mut keys = self.keys.clone();
        keys.remove(&task.key());
        Self { keys }
    }

    pub fn toggled(&self, task: &Task) -> Self {
        if self.contains(task) {
            self.without(task)
        } else {
            self.with(task)
        }
    }

    /// 全选给定任务列表（通常是当前过滤后的可见列表）。
    pub fn select_all<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        Self {
            keys: tasks.into_iter().map(|t| t.key()).collect(),
        }
    }

    /// 按当前选择过滤任务列表，保持输入顺序。
    pub fn selected<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.contains(t)).collect()
    }
}
