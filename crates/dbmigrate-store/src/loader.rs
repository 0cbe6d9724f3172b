use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dbmigrate_common::{Error, Migration, MigrationId, Result};
use tracing::{debug, info};

use crate::fields::parse_migration_text;
use crate::map::MigrationMap;
use crate::projection::project_fields;

/// Load every migration file directly inside `dir`, with dependencies
/// resolved to shared records.
pub fn load_migrations(dir: &Path) -> Result<MigrationMap> {
    MigrationLoader::new(dir).load()
}

/// Depth-first loader for one migrations directory.
///
/// A migration is *done* once it is in `loaded` and *in progress* while its
/// ID is on the `loading` stack. Reaching an in-progress migration again
/// means the dependency graph has a cycle.
pub struct MigrationLoader {
    root: PathBuf,
    loaded: MigrationMap,
    loading: Vec<MigrationId>,
}

impl MigrationLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: MigrationMap::default(),
            loading: Vec::new(),
        }
    }

    /// Load the whole directory. The first failure aborts the load and no
    /// partial map is returned.
    pub fn load(mut self) -> Result<MigrationMap> {
        info!("loading migrations from {}", self.root.display());

        for path in migration_files(&self.root)? {
            self.load_with_deps(&path)?;
        }

        info!(
            "loaded {} migrations from {}",
            self.loaded.len(),
            self.root.display()
        );
        Ok(self.loaded)
    }

    /// Load `path` after everything it depends on. Dependencies are walked
    /// with an explicit stack of frames so long chains do not grow the
    /// native call stack.
    fn load_with_deps(&mut self, path: &Path) -> Result<()> {
        let Some(root) = self.enter(path)? else {
            return Ok(());
        };
        let mut frames = vec![root];

        while let Some(frame) = frames.last_mut() {
            let Some(dep) = frame.depends.get(frame.next).cloned() else {
                if let Some(done) = frames.pop() {
                    self.finish(done)?;
                }
                continue;
            };
            frame.next += 1;

            // Dependencies live next to the migration that names them.
            let dep_path = frame.dir().join(&dep);
            if !dep_path.is_file() {
                return Err(Error::MissingDependency {
                    id: frame.id.clone(),
                    dependency: dep,
                    path: dep_path,
                });
            }
            if let Some(child) = self.enter(&dep_path)? {
                frames.push(child);
            }
        }

        Ok(())
    }

    /// Start loading `path`. Returns `None` when the migration is already
    /// done; fails when it is already in progress.
    fn enter(&mut self, path: &Path) -> Result<Option<Frame>> {
        let id = migration_id(path)?;

        if self.loaded.contains(&id) {
            debug!("migration {id} already loaded");
            return Ok(None);
        }
        if let Some(start) = self.loading.iter().position(|in_progress| *in_progress == id) {
            let mut chain = self.loading[start..].to_vec();
            chain.push(id);
            return Err(Error::DependencyCycle { chain });
        }

        let (draft, depends) = read_migration(path, &id)?;
        self.loading.push(id.clone());

        Ok(Some(Frame {
            id,
            path: path.to_path_buf(),
            draft,
            depends,
            next: 0,
        }))
    }

    /// All of `frame`'s dependencies are loaded: resolve them and insert it.
    fn finish(&mut self, frame: Frame) -> Result<()> {
        let Frame {
            id, draft, depends, ..
        } = frame;

        let dependencies = depends
            .iter()
            .map(|dep| {
                self.loaded
                    .get(dep)
                    .cloned()
                    .ok_or_else(|| Error::UnresolvedDependency {
                        id: id.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        self.loading.pop();
        debug!(
            "loaded migration {id} with {} dependencies",
            dependencies.len()
        );
        self.loaded.insert(Arc::new(Migration {
            dependencies,
            ..draft
        }));
        Ok(())
    }
}

/// A migration whose dependencies are still being walked.
struct Frame {
    id: MigrationId,
    path: PathBuf,
    draft: Migration,
    depends: Vec<MigrationId>,
    /// Index of the next dependency to visit.
    next: usize,
}

impl Frame {
    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Regular files directly inside `dir`, sorted by path.
fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The migration ID is the file's base name.
fn migration_id(path: &Path) -> Result<MigrationId> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidFileName {
            path: path.to_path_buf(),
        })
}

/// Read one file into a draft migration (no dependencies attached) and the
/// IDs it depends on.
fn read_migration(path: &Path, id: &str) -> Result<(Migration, Vec<MigrationId>)> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let parsed = parse_migration_text(path, &text)?;
    let draft = project_fields(path, id, &parsed.fields)?;
    Ok((draft, parsed.depends))
}
