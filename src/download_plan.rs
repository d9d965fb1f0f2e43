use crate::store::ObjectStore;
use crate::transfer::{self, TransferOptions};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DownloadTask {
    pub key: String,
    pub output: PathBuf,
}

impl DownloadTask {
    pub fn new(key: &str, output: &Path) -> Self {
        DownloadTask {
            key: key.to_string(),
            output: output.to_path_buf(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct DownloadPlan {
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn extend(&mut self, other: DownloadPlan) {
        self.tasks.extend(other.tasks);
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Run the tasks in order, stopping at the first failure.
    pub async fn execute(
        &self,
        store: &impl ObjectStore,
        options: TransferOptions,
    ) -> Result<Vec<PathBuf>> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        for (i, task) in self.tasks.iter().enumerate() {
            log::debug!("Task {}/{}: {:?}", i + 1, self.tasks.len(), task);
            let path = transfer::download_to(store, &task.key, &task.output, options).await?;
            outputs.push(path);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use tempfile::TempDir;

    fn mock_download_plan(out_dir: &Path) -> DownloadPlan {
        DownloadPlan::new(vec![
            DownloadTask::new("path/to/file1.txt", &out_dir.join("file1.txt")),
            DownloadTask::new("path/to/file2.txt", &out_dir.join("file2.txt")),
            DownloadTask::new("path/to/file3.txt", &out_dir.join("nested/file3.txt")),
        ])
    }

    #[test]
    fn test_write_read_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_plan.json");
        let plan = mock_download_plan(dir.path());
        plan.write(&path).unwrap();
        assert!(path.exists());

        let read = DownloadPlan::read(&path).unwrap();
        assert_eq!(read.tasks().len(), 3);
        assert_eq!(read, plan);
    }

    #[tokio::test]
    async fn test_execute() {
        let dir = TempDir::new().unwrap();
        let mut store = MemoryStore::default();
        store.insert("path/to/file1.txt", b"one");
        store.insert("path/to/file2.txt", b"two");
        store.insert("path/to/file3.txt", b"three");

        let options = TransferOptions {
            progress: false,
            verify: true,
        };
        let outputs = mock_download_plan(dir.path())
            .execute(&store, options)
            .await
            .unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(fs::read(dir.path().join("nested/file3.txt")).unwrap(), b"three");
    }
}
