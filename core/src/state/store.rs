//! 内存中的任务仓库与进程句柄表

use std::collections::HashMap;

use tokio::sync::oneshot;

use super::types::{Role, Task};

/// 绑定在任务上的评分进程
#[derive(Debug)]
pub struct ProcessHandle {
    pub token: u64,
    /// Roles in the work-list, in submission order.
    pub roles: Vec<Role>,
    pub stop_tx: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
    pub fn file_count(&self) -> usize {
        self.roles.len()
    }
}

/// Ordered task list plus the task-id to process-handle map.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    handles: HashMap<String, ProcessHandle>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        self.handles.remove(id);
        Some(self.tasks.remove(idx))
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn bind(&mut self, task_id: &str, handle: ProcessHandle) {
        self.handles.insert(task_id.to_string(), handle);
    }

    pub fn unbind(&mut self, task_id: &str) -> Option<ProcessHandle> {
        self.handles.remove(task_id)
    }

    /// The handle, only if it belongs to run `token`.
    pub fn bound(&self, task_id: &str, token: u64) -> Option<&ProcessHandle> {
        self.handles.get(task_id).filter(|h| h.token == token)
    }

    pub fn is_bound(&self, task_id: &str) -> bool {
        self.handles.contains_key(task_id)
    }

    pub fn bound_count(&self) -> usize {
        self.handles.len()
    }
}
