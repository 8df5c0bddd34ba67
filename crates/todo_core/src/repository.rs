//! In-memory task collection mirrored to a [`TaskStore`].
//!
//! Every successful mutation writes one full snapshot. When a write fails the
//! mutation is kept in memory, the error is returned, and the repository
//! stays dirty until a later save (or [`TaskRepository::flush`]) succeeds.

use crate::error::AppError;
use crate::model::{Task, TaskId, parse_due_date};
use crate::storage::TaskStore;
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Debug)]
pub struct TaskRepository<S> {
    store: S,
    tasks: Vec<Task>,
    dirty: bool,
}

impl<S: TaskStore> TaskRepository<S> {
    pub fn open(store: S) -> Self {
        let tasks = store.load();
        Self {
            store,
            tasks,
            dirty: false,
        }
    }

    /// Creates a pending task due on `date` (`YYYY-MM-DD`).
    pub fn add(&mut self, text: &str, date: Option<&str>) -> Result<Task, AppError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("text is required"));
        }
        let date = parse_due_date(date)?;

        let task = Task {
            id: self.next_id()?,
            text: trimmed.to_string(),
            date,
            completed: false,
        };

        self.tasks.push(task.clone());
        info!(id = task.id, date = %task.date, "added task");
        self.persist()?;

        Ok(task)
    }

    /// Flips the completion flag. Unknown ids are ignored and return `None`.
    pub fn toggle_completed(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };

        task.completed = !task.completed;
        let updated = task.clone();
        info!(id, completed = updated.completed, "toggled task");
        self.persist()?;

        Ok(Some(updated))
    }

    /// Deletes a task. Unknown ids are ignored and return `None`.
    pub fn remove(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };

        let removed = self.tasks.remove(index);
        info!(id, "removed task");
        self.persist()?;

        Ok(Some(removed))
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// True when the last save failed and memory is ahead of the store.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the current collection again, typically after a failed save.
    pub fn flush(&mut self) -> Result<(), AppError> {
        self.persist()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) -> Result<(), AppError> {
        match self.store.save(&self.tasks) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "saving tasks failed, in-memory state is ahead of the store");
                self.dirty = true;
                Err(err)
            }
        }
    }

    // Creation time in milliseconds, bumped past the newest id so two adds
    // inside the same millisecond still get distinct ids. When the newest id
    // is i64::MAX the first free id from `now` upwards is used instead.
    fn next_id(&self) -> Result<TaskId, AppError> {
        let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as TaskId;
        match self.tasks.iter().map(|task| task.id).max() {
            Some(newest) if newest >= now => match newest.checked_add(1) {
                Some(id) => Ok(id),
                None => (now..newest)
                    .find(|id| self.get(*id).is_none())
                    .ok_or_else(|| AppError::invalid_data("no unused task id left")),
            },
            _ => Ok(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskRepository;
    use crate::error::AppError;
    use crate::model::Task;
    use crate::storage::{KeyValueStore, MemoryStore, SlotStore, TASKS_SLOT, TaskStore};
    use std::collections::HashSet;
    use time::macros::date;

    /// Records every snapshot it is asked to save.
    #[derive(Default)]
    struct RecordingStore {
        initial: Vec<Task>,
        saves: Vec<Vec<Task>>,
        fail_writes: bool,
    }

    impl RecordingStore {
        fn with_tasks(initial: Vec<Task>) -> Self {
            Self {
                initial,
                ..Self::default()
            }
        }

        fn last_snapshot(&self) -> Option<&Vec<Task>> {
            self.saves.last()
        }
    }

    impl TaskStore for RecordingStore {
        fn load(&self) -> Vec<Task> {
            self.initial.clone()
        }

        fn save(&mut self, tasks: &[Task]) -> Result<(), AppError> {
            if self.fail_writes {
                return Err(AppError::io("quota exceeded"));
            }
            self.saves.push(tasks.to_vec());
            Ok(())
        }
    }

    fn task(id: i64, text: &str, completed: bool) -> Task {
        Task {
            id,
            text: text.to_string(),
            date: date!(2025 - 01 - 10),
            completed,
        }
    }

    #[test]
    fn open_starts_from_loaded_collection() {
        let repo = TaskRepository::open(RecordingStore::with_tasks(vec![task(1, "a", false)]));

        assert_eq!(repo.list().len(), 1);
        assert!(repo.store().saves.is_empty());
    }

    #[test]
    fn add_creates_pending_task_and_persists_snapshot() {
        let mut repo = TaskRepository::open(RecordingStore::default());

        let created = repo.add("  Buy milk  ", Some("2025-01-10")).unwrap();

        assert_eq!(created.text, "Buy milk");
        assert_eq!(created.date, date!(2025 - 01 - 10));
        assert!(!created.completed);
        assert_eq!(repo.list(), std::slice::from_ref(&created));
        assert_eq!(repo.store().saves.len(), 1);
        assert_eq!(repo.store().last_snapshot().unwrap().as_slice(), repo.list());
    }

    #[test]
    fn add_assigns_unique_ids() {
        let mut repo = TaskRepository::open(RecordingStore::default());

        for index in 0..50 {
            repo.add(&format!("task {index}"), Some("2025-01-10")).unwrap();
        }

        let ids: HashSet<_> = repo.list().iter().map(|task| task.id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn add_never_reuses_existing_ids() {
        let far_future = i64::MAX / 2;
        let mut repo =
            TaskRepository::open(RecordingStore::with_tasks(vec![task(far_future, "a", false)]));

        let created = repo.add("b", Some("2025-01-10")).unwrap();

        assert_eq!(created.id, far_future + 1);
    }

    #[test]
    fn add_after_max_id_picks_unused_ids() {
        let blob = serde_json::json!([
            { "id": i64::MAX, "text": "x", "date": "2025-01-01", "completed": false }
        ]);
        let mut memory = MemoryStore::new();
        memory.set(TASKS_SLOT, &blob.to_string()).unwrap();
        let mut repo = TaskRepository::open(SlotStore::new(memory));

        let first = repo.add("y", Some("2025-01-02")).unwrap();
        let second = repo.add("z", Some("2025-01-03")).unwrap();

        assert!(first.id > 0);
        assert_ne!(first.id, i64::MAX);
        assert_ne!(second.id, first.id);
        assert_ne!(second.id, i64::MAX);
        let ids: HashSet<_> = repo.list().iter().map(|task| task.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn add_rejects_blank_text_without_persisting() {
        let mut repo = TaskRepository::open(RecordingStore::default());

        let err = repo.add("   ", Some("2025-01-10")).unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(repo.list().is_empty());
        assert!(repo.store().saves.is_empty());
    }

    #[test]
    fn add_rejects_missing_or_bad_date_without_persisting() {
        let mut repo = TaskRepository::open(RecordingStore::default());

        assert_eq!(repo.add("Buy milk", None).unwrap_err().code(), "invalid_input");
        assert_eq!(repo.add("Buy milk", Some("")).unwrap_err().code(), "invalid_input");
        assert_eq!(
            repo.add("Buy milk", Some("tomorrow")).unwrap_err().code(),
            "invalid_input"
        );
        assert!(repo.list().is_empty());
        assert!(repo.store().saves.is_empty());
    }

    #[test]
    fn add_accepts_past_dates() {
        let mut repo = TaskRepository::open(RecordingStore::default());
        assert!(repo.add("History", Some("1999-12-31")).is_ok());
    }

    #[test]
    fn toggle_twice_restores_flag() {
        let mut repo = TaskRepository::open(RecordingStore::with_tasks(vec![task(1, "a", false)]));

        let first = repo.toggle_completed(1).unwrap().unwrap();
        assert!(first.completed);
        let second = repo.toggle_completed(1).unwrap().unwrap();
        assert!(!second.completed);

        assert!(!repo.list()[0].completed);
        assert_eq!(repo.store().saves.len(), 2);
    }

    #[test]
    fn toggle_unknown_id_is_silent_noop() {
        let mut repo = TaskRepository::open(RecordingStore::with_tasks(vec![task(1, "a", false)]));

        assert_eq!(repo.toggle_completed(99).unwrap(), None);
        assert!(!repo.list()[0].completed);
        assert!(repo.store().saves.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut repo = TaskRepository::open(RecordingStore::with_tasks(vec![
            task(1, "a", false),
            task(2, "b", true),
        ]));

        let removed = repo.remove(1).unwrap();
        assert_eq!(removed.map(|task| task.id), Some(1));
        assert_eq!(repo.list().len(), 1);

        assert_eq!(repo.remove(1).unwrap(), None);
        assert_eq!(repo.list().len(), 1);
        assert_eq!(repo.store().saves.len(), 1);
        assert_eq!(repo.store().last_snapshot().unwrap().as_slice(), repo.list());
    }

    #[test]
    fn failed_write_keeps_mutation_and_marks_dirty() {
        let mut repo = TaskRepository::open(RecordingStore {
            fail_writes: true,
            ..RecordingStore::default()
        });

        let err = repo.add("Buy milk", Some("2025-01-10")).unwrap_err();

        assert_eq!(err.code(), "io_error");
        assert_eq!(repo.list().len(), 1);
        assert!(repo.is_dirty());
    }

    #[test]
    fn flush_after_recovery_clears_dirty_flag() {
        let mut repo = TaskRepository::open(RecordingStore {
            fail_writes: true,
            ..RecordingStore::default()
        });
        repo.add("Buy milk", Some("2025-01-10")).unwrap_err();

        repo.store.fail_writes = false;
        repo.flush().unwrap();

        assert!(!repo.is_dirty());
        assert_eq!(repo.store().last_snapshot().unwrap().as_slice(), repo.list());
    }

    #[test]
    fn state_survives_reopen_through_slot_store() {
        let mut repo = TaskRepository::open(SlotStore::new(MemoryStore::new()));
        let created = repo.add("Pay rent", Some("2025-01-05")).unwrap();
        repo.toggle_completed(created.id).unwrap();

        let memory = repo.store().inner().clone();
        let reopened = TaskRepository::open(SlotStore::new(memory));

        assert_eq!(reopened.list(), repo.list());
        assert!(reopened.list()[0].completed);
    }
}
