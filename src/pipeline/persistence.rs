// Loaded on startup, saved on quit (project) and whenever a take is finished.
use std::path::{Path, PathBuf};

use crate::pipeline::project::ProjectState;
use crate::pipeline::take::{Take, TakeId};

pub const RAYBRUSH_DIR: &str = ".raybrush";
const PROJECT_FILE: &str = "project.json";
const TAKES_DIR: &str = "takes";
pub const LOG_FILE: &str = "raybrush.log";

// <project_dir>/.raybrush
pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(RAYBRUSH_DIR)
}

// <project_dir>/.raybrush/project.json
fn project_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(PROJECT_FILE)
}

// <project_dir>/.raybrush/takes
pub fn default_takes_dir(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(TAKES_DIR)
}

pub fn take_file_path(takes_dir: &Path, id: &TakeId) -> PathBuf {
    takes_dir.join(format!("{}.json", id))
}

pub fn load_project(project_dir: &Path) -> Option<ProjectState> {
    let path = project_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(state) => Some(state),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

// Save the project state to disk, making the files if they don't exist already
pub fn save_project(project_dir: &Path, state: &ProjectState) -> anyhow::Result<()> {
    let path = project_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .raybrush/ if needed
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(&path, json)?;
    Ok(())
}

pub fn save_take(takes_dir: &Path, take: &Take) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(takes_dir)?;
    let path = take_file_path(takes_dir, &take.id);
    let json = serde_json::to_string(take)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

pub fn load_take(takes_dir: &Path, id: &TakeId) -> anyhow::Result<Take> {
    let data = std::fs::read_to_string(take_file_path(takes_dir, id))?;
    let take: Take = serde_json::from_str(&data)?;
    take.check_order()?;
    Ok(take)
}

// Every readable take in the directory; a missing directory is just no takes
pub fn load_takes(takes_dir: &Path) -> Vec<Take> {
    let entries = match std::fs::read_dir(takes_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut takes = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match load_take(takes_dir, &TakeId(stem.to_string())) {
            Ok(take) => takes.push(take),
            Err(e) => log::warn!("skipping take {}: {}", path.display(), e),
        }
    }
    takes.sort_by(|a, b| a.id.number().cmp(&b.id.number()).then_with(|| a.id.cmp(&b.id)));
    takes
}
