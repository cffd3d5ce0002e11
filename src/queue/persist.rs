//! On-disk job persistence: one JSON file per job, renamed into place so a
//! crash mid-write never leaves a truncated record.

use std::path::PathBuf;

use tokio::fs;

use crate::error::Result;
use crate::queue::job::Job;

#[derive(Debug)]
pub(crate) struct JobDir {
    dir: PathBuf,
}

impl JobDir {
    pub async fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub async fn write(&self, job: &Job) -> Result<()> {
        let data = serde_json::to_vec_pretty(job)?;
        let tmp = self.dir.join(format!("{}.json.tmp", job.id));
        let path = self.dir.join(format!("{}.json", job.id));
        fs::write(&tmp, &data).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    pub async fn load_all(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path).await?;
            match serde_json::from_slice::<Job>(&data) {
                Ok(job) => jobs.push(job),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Skipping unreadable job file");
                }
            }
        }
        Ok(jobs)
    }
}
