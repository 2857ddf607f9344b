//! Per-call build directory, removed when the guard drops.
use enzyme_core::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const PREFIX: &str = "enzyme-build-";

/// Uniquely named directory under the build root. Dropping the guard
/// deletes it with everything inside, on success, error or cancellation.
#[derive(Debug)]
pub struct BuildDir {
    path: PathBuf,
}

impl BuildDir {
    pub fn create(root: &Path, run_id: Uuid) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        let path = root.join(format!("{}{}", PREFIX, run_id.simple()));
        std::fs::create_dir(&path)?;
        tracing::debug!(path = %path.display(), "build directory created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for BuildDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "build directory removed"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove build directory"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("enzyme-build-dir-test-{}", Uuid::new_v4().simple()))
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let root = scratch_root();
        let path = {
            let dir = BuildDir::create(&root, Uuid::new_v4()).unwrap();
            std::fs::write(dir.join("main.c"), "int main(void) { return 0; }").unwrap();
            std::fs::create_dir(dir.join("nested")).unwrap();
            assert!(dir.path().is_dir());
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(root.is_dir());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_names_do_not_collide() {
        let root = scratch_root();
        let a = BuildDir::create(&root, Uuid::new_v4()).unwrap();
        let b = BuildDir::create(&root, Uuid::new_v4()).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(root.canonicalize().unwrap()));

        let id = Uuid::new_v4();
        let _first = BuildDir::create(&root, id).unwrap();
        assert!(BuildDir::create(&root, id).is_err());

        drop((a, b, _first));
        std::fs::remove_dir_all(&root).unwrap();
    }
}
