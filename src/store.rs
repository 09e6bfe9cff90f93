/// Durable store module for the linkpulse link checking service
///
/// This module implements the mutex-guarded in-memory task table that is
/// mirrored to two files on every mutation: the serialized table itself and
/// the next-id counter. The in-memory table is the source of truth; the
/// files exist so ids and results survive a restart. Persistence failures
/// are logged and absorbed, never surfaced to callers.
use crate::message::{LinkStatus, ResultMap, TaskRecord};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const TASKS_FILE: &str = "tasks.json";
const NEXT_ID_FILE: &str = "next_id.txt";

#[derive(Debug)]
struct Table {
    next_id: u64,
    tasks: HashMap<u64, TaskRecord>,
}

/// Task table guarded by a single reader/writer lock.
///
/// Reads take shared access, create/update take exclusive access, and every
/// mutating operation re-serializes the full table to disk before it
/// returns. Simple, and it keeps persistence I/O on the critical path of
/// every status update, which is acceptable at this scale.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    table: RwLock<Table>,
}

impl Store {
    /// Opens the store rooted at `data_dir`, creating the directory if
    /// absent and loading any previously persisted state. Missing or
    /// corrupt files fall back to an empty table and a counter starting
    /// at 1.
    pub fn open(data_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(data_dir) {
            tracing::warn!("failed to create data directory {}: {}", data_dir.display(), e);
        }

        let store = Self {
            data_dir: data_dir.to_path_buf(),
            table: RwLock::new(Table {
                next_id: 1,
                tasks: HashMap::new(),
            }),
        };
        store.load();
        store
    }

    /// Allocates the next id, initializes every link's status to
    /// `Checking`, stores the record and persists the state. Atomic with
    /// respect to concurrent callers: no two calls observe the same id.
    pub fn create_task(&self, links: &[String]) -> TaskRecord {
        let mut table = self.table.write().expect("store lock poisoned");

        let id = table.next_id;
        table.next_id += 1;

        let result: ResultMap = links
            .iter()
            .map(|link| (link.clone(), LinkStatus::Checking))
            .collect();
        let record = TaskRecord {
            id,
            links: links.to_vec(),
            result,
        };
        table.tasks.insert(id, record.clone());

        self.persist(&table);
        record
    }

    /// Records the probe outcome for one link of one task, then persists.
    ///
    /// Unknown task ids and links outside the task's link set are ignored.
    /// Neither should occur: result keys are fixed at creation and tasks
    /// are never deleted.
    pub fn save_result(&self, id: u64, link: &str, status: LinkStatus) {
        let mut table = self.table.write().expect("store lock poisoned");

        match table.tasks.get_mut(&id) {
            Some(task) => match task.result.get_mut(link) {
                Some(slot) => *slot = status,
                None => tracing::warn!("task {} has no link {:?}, dropping result", id, link),
            },
            None => tracing::warn!("no task {}, dropping result for {:?}", id, link),
        }

        self.persist(&table);
    }

    /// Returns a snapshot of the result maps for each known id in `ids`.
    /// Unknown ids are simply absent from the returned mapping.
    pub fn get_many(&self, ids: &[u64]) -> HashMap<u64, ResultMap> {
        let table = self.table.read().expect("store lock poisoned");

        ids.iter()
            .filter_map(|id| table.tasks.get(id).map(|task| (*id, task.result.clone())))
            .collect()
    }

    /// Writes the full table and the next-id counter to their backing
    /// files. Failures are logged; the in-memory table stays authoritative.
    fn persist(&self, table: &Table) {
        match serde_json::to_vec_pretty(&table.tasks) {
            Ok(data) => {
                if let Err(e) = fs::write(self.data_dir.join(TASKS_FILE), data) {
                    tracing::warn!("failed to write {}: {}", TASKS_FILE, e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize task table: {}", e),
        }

        if let Err(e) = fs::write(self.data_dir.join(NEXT_ID_FILE), table.next_id.to_string()) {
            tracing::warn!("failed to write {}: {}", NEXT_ID_FILE, e);
        }
    }

    fn load(&self) {
        let mut table = self.table.write().expect("store lock poisoned");

        match fs::read(self.data_dir.join(TASKS_FILE)) {
            Ok(data) => match serde_json::from_slice::<HashMap<u64, TaskRecord>>(&data) {
                Ok(tasks) => table.tasks = tasks,
                Err(e) => tracing::warn!("failed to parse {}, starting empty: {}", TASKS_FILE, e),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to read {}: {}", TASKS_FILE, e),
        }

        match fs::read_to_string(self.data_dir.join(NEXT_ID_FILE)) {
            Ok(s) => match s.trim().parse::<u64>() {
                Ok(n) => table.next_id = n,
                Err(e) => tracing::warn!("failed to parse {}: {}", NEXT_ID_FILE, e),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to read {}: {}", NEXT_ID_FILE, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn links(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_task_initializes_every_link_to_checking() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());

        let record = store.create_task(&links(&["example.com", "https://rust-lang.org"]));

        assert_eq!(record.id, 1);
        assert_eq!(record.links, links(&["example.com", "https://rust-lang.org"]));
        assert_eq!(record.result.len(), 2);
        assert_eq!(record.result["example.com"], LinkStatus::Checking);
        assert_eq!(record.result["https://rust-lang.org"], LinkStatus::Checking);
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());

        let first = store.create_task(&links(&["a.example"]));
        let second = store.create_task(&links(&["b.example"]));
        let third = store.create_task(&links(&["c.example"]));

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(third.id, 3);
    }

    #[test]
    fn save_result_updates_only_known_task_and_link() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let record = store.create_task(&links(&["a.example"]));

        store.save_result(record.id, "a.example", LinkStatus::Available);
        // member of no task's link set, must not grow the map
        store.save_result(record.id, "b.example", LinkStatus::Available);
        // unknown id, must be a no-op
        store.save_result(999, "a.example", LinkStatus::NotAvailable);

        let snapshot = store.get_many(&[record.id]);
        let result = &snapshot[&record.id];
        assert_eq!(result.len(), 1);
        assert_eq!(result["a.example"], LinkStatus::Available);
    }

    #[test]
    fn get_many_omits_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let record = store.create_task(&links(&["a.example"]));

        let snapshot = store.get_many(&[record.id, 42]);

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&record.id));
        assert!(!snapshot.contains_key(&42));
    }

    #[test]
    fn reopening_reproduces_table_and_counter() {
        let dir = TempDir::new().unwrap();
        let first_id;
        {
            let store = Store::open(dir.path());
            first_id = store.create_task(&links(&["a.example", "b.example"])).id;
            store.create_task(&links(&["c.example"]));
            store.save_result(first_id, "a.example", LinkStatus::NotAvailable);
        }

        let store = Store::open(dir.path());
        let snapshot = store.get_many(&[first_id]);
        assert_eq!(snapshot[&first_id]["a.example"], LinkStatus::NotAvailable);
        assert_eq!(snapshot[&first_id]["b.example"], LinkStatus::Checking);

        // the counter survived too: no id reuse across restarts
        let record = store.create_task(&links(&["d.example"]));
        assert_eq!(record.id, 3);
    }

    #[test]
    fn corrupt_files_fall_back_to_empty_state() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TASKS_FILE), b"definitely not json").unwrap();
        fs::write(dir.path().join(NEXT_ID_FILE), b"many").unwrap();

        let store = Store::open(dir.path());
        let record = store.create_task(&links(&["a.example"]));

        assert_eq!(record.id, 1);
    }

    #[test]
    fn concurrent_creates_issue_unique_ids() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let ids = Mutex::new(Vec::new());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..5 {
                        let record = store.create_task(&links(&["a.example"]));
                        ids.lock().unwrap().push(record.id);
                    }
                });
            }
        });

        let mut ids = ids.into_inner().unwrap();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 40);
    }
}
