use taskbot_core::{error::TaskbotError, task::Task, traits::TaskStorage};

/// Ephemeral task storage, used by tests and `--ephemeral` runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    tasks: Vec<Task>,
    last_id: u64,
}

impl MemoryStorage {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        Self { tasks, last_id }
    }
}

impl TaskStorage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    fn append(&mut self, task: Task) -> Result<(), TaskbotError> {
        self.last_id = self.last_id.max(task.id);
        self.tasks.push(task);
        Ok(())
    }

    fn replace_all(&mut self, tasks: Vec<Task>) -> Result<(), TaskbotError> {
        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        self.last_id = self.last_id.max(max_id);
        self.tasks = tasks;
        Ok(())
    }

    fn last_id(&self) -> u64 {
        self.last_id
    }
}
