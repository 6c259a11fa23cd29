use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::repo::Repo;
use crate::types::TreeObjectData;

/// staging area: entries waiting for the next commit
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    staged: BTreeSet<TreeObjectData>,
}

impl Index {
    /// load the index, or an empty one if none was saved
    pub fn load(repo: &Repo) -> Result<Self> {
        let path = repo.index_path();
        match fs::read(&path) {
            Ok(bytes) => Ok(ciborium::from_reader(&bytes[..])?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(Error::Io { path, source }),
        }
    }

    /// persist the index (temp file + rename)
    pub fn save(&self, repo: &Repo) -> Result<()> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)?;

        let path = repo.index_path();
        let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(&bytes).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, &path).with_path(&path)?;
        Ok(())
    }

    /// stage an entry, replacing anything already staged for its path
    ///
    /// returns true if the index changed.
    pub fn stage(&mut self, data: TreeObjectData) -> bool {
        if self.staged.contains(&data) {
            return false;
        }
        let bare = data.path().trim_end_matches('/').to_string();
        self.staged
            .retain(|existing| existing.path().trim_end_matches('/') != bare);
        self.staged.insert(data)
    }

    /// staged entries in path order
    pub fn staged(&self) -> impl ExactSizeIterator<Item = &TreeObjectData> {
        self.staged.iter()
    }

    pub fn is_staged(&self, path: &str) -> bool {
        self.staged.iter().any(|data| data.path() == path)
    }

    pub fn clear(&mut self) {
        self.staged.clear();
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
