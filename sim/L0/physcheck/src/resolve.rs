//! Turning a command-line target into a URDF path.
//!
//! A target is a URDF file, a directory holding URDF files (directly or in
//! a `urdf/` subdirectory), or the name of a robot directory under the
//! robots root. Names and the `.urdf` suffix match case-insensitively.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::prompt::Prompter;

/// Robot directories under `root` that contain URDF files, sorted by
/// lowercase name.
///
/// A missing `root` yields an empty list.
///
/// # Errors
///
/// Returns an I/O error when an existing directory cannot be read.
pub fn list_robot_urdfs(root: &Path) -> Result<Vec<(String, Vec<PathBuf>)>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    sort_by_lowercase_name(&mut dirs);

    let mut robots = Vec::new();
    for dir in dirs {
        let urdfs = directory_urdfs(&dir)?;
        if !urdfs.is_empty() {
            robots.push((file_name(&dir), urdfs));
        }
    }
    Ok(robots)
}

/// URDF files directly inside `dir`, or inside `dir/urdf` when there are
/// none at the top level.
///
/// # Errors
///
/// Returns an I/O error when `dir` cannot be read.
pub fn directory_urdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let direct = collect_urdfs(dir)?;
    if !direct.is_empty() {
        return Ok(direct);
    }
    let nested = dir.join("urdf");
    if nested.is_dir() {
        return collect_urdfs(&nested);
    }
    Ok(Vec::new())
}

fn collect_urdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_urdf_suffix(path))
        .collect();
    sort_by_lowercase_name(&mut files);
    Ok(files)
}

fn has_urdf_suffix(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("urdf"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sort_by_lowercase_name(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| file_name(p).to_lowercase());
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve `target` to a URDF file, asking on `prompter` when several
/// candidates remain.
///
/// Without a target the user picks a robot under `robots_root`.
///
/// # Errors
///
/// Fails when nothing matches, when the prompt input ends, or on I/O
/// errors.
pub fn resolve_urdf_path<R: BufRead, W: Write>(
    target: Option<&str>,
    robots_root: &Path,
    prompter: &mut Prompter<R, W>,
) -> Result<PathBuf> {
    if let Some(target) = target {
        let candidate = PathBuf::from(target);
        if candidate.is_file() {
            return Ok(absolute(&candidate));
        }
        if candidate.is_dir() {
            let urdfs = directory_urdfs(&candidate)?;
            if urdfs.is_empty() {
                return Err(ResolveError::NoUrdfFiles(candidate));
            }
            let prompt = format!("Select URDF file inside {}:", candidate.display());
            return pick_urdf(&prompt, &urdfs, prompter);
        }
    }

    let robots = list_robot_urdfs(robots_root)?;
    let (name, urdfs) = match target {
        Some(target) => {
            let wanted = target.to_lowercase();
            robots
                .into_iter()
                .find(|(name, _)| name.to_lowercase() == wanted)
                .ok_or_else(|| ResolveError::robot_not_found(target, robots_root))?
        }
        None => {
            if robots.is_empty() {
                return Err(ResolveError::NoRobots(robots_root.to_path_buf()));
            }
            let names: Vec<String> = robots.iter().map(|(name, _)| name.clone()).collect();
            let index = prompter.choose("Select a robot:", &names)?;
            robots
                .into_iter()
                .nth(index)
                .ok_or(ResolveError::NoOptions)?
        }
    };

    debug!(robot = %name, candidates = urdfs.len(), "resolved robot");
    pick_urdf(&format!("Select a URDF for {name}:"), &urdfs, prompter)
}

fn pick_urdf<R: BufRead, W: Write>(
    prompt: &str,
    urdfs: &[PathBuf],
    prompter: &mut Prompter<R, W>,
) -> Result<PathBuf> {
    let names: Vec<String> = urdfs.iter().map(|p| file_name(p)).collect();
    let index = prompter.choose(prompt, &names)?;
    urdfs
        .get(index)
        .map(|p| absolute(p))
        .ok_or(ResolveError::NoOptions)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STUB: &str = "<robot name='stub'/>";

    fn silent(input: &str) -> Prompter<&[u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    /// robots/
    ///   Cartpole/urdf/cartpole.urdf
    ///   arm/arm_a.urdf, arm/Arm_B.URDF
    ///   empty/
    fn robots_dir() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let cartpole = dir.path().join("Cartpole").join("urdf");
        fs::create_dir_all(&cartpole).unwrap();
        fs::write(cartpole.join("cartpole.urdf"), STUB).unwrap();

        let arm = dir.path().join("arm");
        fs::create_dir_all(&arm).unwrap();
        fs::write(arm.join("arm_a.urdf"), STUB).unwrap();
        fs::write(arm.join("Arm_B.URDF"), STUB).unwrap();
        fs::write(arm.join("notes.txt"), "").unwrap();

        fs::create_dir_all(dir.path().join("empty")).unwrap();
        dir
    }

    #[test]
    fn test_list_robot_urdfs() {
        let dir = robots_dir();
        let robots = list_robot_urdfs(dir.path()).unwrap();
        let names: Vec<&str> = robots.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["arm", "Cartpole"]);

        let arm: Vec<String> = robots[0].1.iter().map(|p| file_name(p)).collect();
        assert_eq!(arm, ["arm_a.urdf", "Arm_B.URDF"]);
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let dir = tempdir().unwrap();
        assert!(list_robot_urdfs(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_direct_file() {
        let dir = robots_dir();
        let file = dir.path().join("arm").join("arm_a.urdf");
        let resolved =
            resolve_urdf_path(file.to_str(), dir.path(), &mut silent("")).unwrap();
        assert_eq!(resolved, fs::canonicalize(&file).unwrap());
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let dir = robots_dir();
        let resolved = resolve_urdf_path(Some("CARTPOLE"), dir.path(), &mut silent("")).unwrap();
        assert_eq!(file_name(&resolved), "cartpole.urdf");
    }

    #[test]
    fn test_several_urdfs_prompt() {
        let dir = robots_dir();
        let mut prompter = silent("2\n");
        let resolved = resolve_urdf_path(Some("arm"), dir.path(), &mut prompter).unwrap();
        assert_eq!(file_name(&resolved), "Arm_B.URDF");
        let text = String::from_utf8(prompter.into_output()).unwrap();
        assert!(text.contains("Select a URDF for arm:"));
    }

    #[test]
    fn test_interactive_robot_selection() {
        let dir = robots_dir();
        let resolved = resolve_urdf_path(None, dir.path(), &mut silent("2\n")).unwrap();
        assert_eq!(file_name(&resolved), "cartpole.urdf");
    }

    #[test]
    fn test_directory_target() {
        let dir = robots_dir();
        let target = dir.path().join("Cartpole");
        let resolved =
            resolve_urdf_path(target.to_str(), dir.path(), &mut silent("")).unwrap();
        assert_eq!(file_name(&resolved), "cartpole.urdf");

        let empty = dir.path().join("empty");
        assert!(matches!(
            resolve_urdf_path(empty.to_str(), dir.path(), &mut silent("")),
            Err(ResolveError::NoUrdfFiles(_))
        ));
    }

    #[test]
    fn test_unknown_robot() {
        let dir = robots_dir();
        let err = resolve_urdf_path(Some("ghost"), dir.path(), &mut silent("")).unwrap_err();
        assert!(matches!(err, ResolveError::RobotNotFound { .. }));
    }

    #[test]
    fn test_no_robots() {
        let dir = tempdir().unwrap();
        let err = resolve_urdf_path(None, dir.path(), &mut silent("")).unwrap_err();
        assert!(matches!(err, ResolveError::NoRobots(_)));
    }
}
