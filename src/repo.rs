use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;
use nix::fcntl::{Flock, FlockArg};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};
use crate::materialize::WalkOptions;
use crate::refs::{write_head, Head};

/// name of the metadata directory inside the working tree
pub const REPO_DIR: &str = ".cvs";

/// a repository: a working tree with a `.cvs` metadata directory
pub struct Repo {
    root: PathBuf,
    path: PathBuf,
    config: Config,
}

impl Repo {
    /// initialize a new repository in the given working tree
    pub fn init(root: &Path) -> Result<Self> {
        Self::init_with_config(root, Config::default())
    }

    /// initialize with an explicit configuration
    pub fn init_with_config(root: &Path, config: Config) -> Result<Self> {
        let path = root.join(REPO_DIR);
        let config_path = path.join("config.toml");
        if config_path.exists() {
            return Err(Error::RepoExists(root.to_path_buf()));
        }

        // create directory structure
        std::fs::create_dir_all(path.join("objects")).with_path(&path)?;
        std::fs::create_dir_all(path.join("refs/heads")).with_path(&path)?;
        std::fs::create_dir_all(path.join("tmp")).with_path(&path)?;

        config.save(&config_path)?;

        let repo = Self {
            root: root.to_path_buf(),
            path,
            config,
        };
        write_head(&repo, &Head::Branch(repo.config.default_branch.clone()))?;

        info!("initialized repository at {}", root.display());
        Ok(repo)
    }

    /// open an existing repository rooted at the given working tree
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(REPO_DIR);
        let config_path = path.join("config.toml");
        if !config_path.exists() {
            return Err(Error::NoRepo(root.to_path_buf()));
        }

        let config = Config::load(&config_path)?;

        Ok(Self {
            root: root.to_path_buf(),
            path,
            config,
        })
    }

    /// open the repository containing `start`, searching upwards
    ///
    /// the root of the returned repository is canonical.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = start.canonicalize().with_path(start)?;
        for dir in start.ancestors() {
            if dir.join(REPO_DIR).join("config.toml").exists() {
                return Self::open(dir);
            }
        }
        Err(Error::NoRepo(start))
    }

    /// working tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// metadata directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// save configuration changes
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.config_path())
    }

    /// walk options for working tree snapshots; the metadata dir is always skipped
    pub fn walk_options(&self) -> Result<WalkOptions> {
        let mut patterns = vec![REPO_DIR.to_string()];
        patterns.extend(self.config.ignore.iter().cloned());
        WalkOptions::from_patterns(&patterns)
    }

    /// path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.path.join("config.toml")
    }

    /// path to objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.path.join("objects")
    }

    /// path to branch refs directory
    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs/heads")
    }

    /// path to HEAD
    pub fn head_path(&self) -> PathBuf {
        self.path.join("HEAD")
    }

    /// path to the staging index
    pub fn index_path(&self) -> PathBuf {
        self.path.join("index")
    }

    /// path to tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.path.join("tmp")
    }

    /// path to lock file
    pub fn lock_path(&self) -> PathBuf {
        self.path.join(".lock")
    }

    /// acquire exclusive lock on repository
    /// returns a guard that releases the lock on drop
    pub fn lock(&self) -> Result<RepoLock> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;

        let flock = Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|_| Error::LockContention)?;

        Ok(RepoLock { _flock: flock })
    }

    /// try to acquire exclusive lock, returning None if already locked
    pub fn try_lock(&self) -> Result<Option<RepoLock>> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(RepoLock { _flock: flock })),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Ok(None),
            Err(_) => Err(Error::LockContention),
        }
    }
}

/// guard that holds repository lock until dropped
pub struct RepoLock {
    _flock: Flock<File>,
}
