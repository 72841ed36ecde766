//! Path resolution
//!
//! Resolves client supplied paths against the session working directory.

use std::path::{Component, Path, PathBuf};

/// Resolves `arg` against `cwd`.
///
/// Absolute arguments are used as-is, relative ones are joined onto `cwd`.
/// The result is normalised lexically: `.` components are dropped and `..`
/// pops the previous component, never climbing above the root.
pub fn resolve_path(cwd: &Path, arg: &str) -> PathBuf {
    let candidate = Path::new(arg);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        cwd.join(candidate)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
