//! Shared fixtures for integration tests
//!
//! Remote plugin repositories are built with git2 under a temporary
//! directory, and the plugin environment clones from there with the real
//! git executable.

#![allow(dead_code)]

use git2::{Commit, ObjectType, Oid, Repository, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;
use tim::git::GitCli;
use tim::plugin::{PluginEnv, PluginName};

pub struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn remotes(&self) -> PathBuf {
        self.root.path().join("remotes")
    }

    pub fn plugins(&self) -> PathBuf {
        self.root.path().join("plugins")
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.path().join("config").join("tim.json")
    }

    pub fn env(&self) -> PluginEnv {
        PluginEnv::new(self.plugins(), Arc::new(GitCli::new()))
            .with_remote_base(self.remotes().to_string_lossy())
    }

    /// Remote repository for `name` with one commit
    pub fn create_remote(&self, name: &str) -> Repository {
        let path = self.remote_path(name);
        fs::create_dir_all(&path).expect("Failed to create remote dir");
        let repo = Repository::init(&path).expect("Failed to init remote repository");
        commit_file(&repo, "README.md", "# plugin\n", "Initial commit");
        repo
    }

    pub fn remote_path(&self, name: &str) -> PathBuf {
        self.remotes().join(format!("{}.git", name))
    }

    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.plugins().join(name)
    }
}

pub fn name(raw: &str) -> PluginName {
    PluginName::parse(raw).expect("valid plugin name")
}

/// Commit `contents` to `file` on the checked out branch
pub fn commit_file(repo: &Repository, file: &str, contents: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("non-bare repository");
    fs::write(workdir.join(file), contents).expect("Failed to write file");
    commit_paths(repo, &[file], message)
}

/// Commit an executable plugin script that records each run in a marker
/// file next to it
pub fn commit_script(repo: &Repository, file: &str, marker: &str) -> Oid {
    let workdir = repo.workdir().expect("non-bare repository");
    let script = workdir.join(file);
    fs::write(
        &script,
        format!("#!/bin/sh\necho ran >> \"$(dirname \"$0\")/{}\"\n", marker),
    )
    .expect("Failed to write script");
    make_executable(&script);
    commit_paths(repo, &[file], "Add plugin script")
}

fn commit_paths(repo: &Repository, files: &[&str], message: &str) -> Oid {
    let mut index = repo.index().expect("Failed to open index");
    for file in files {
        index.add_path(Path::new(file)).expect("Failed to stage file");
    }
    index.write().expect("Failed to write index");
    let tree = repo
        .find_tree(index.write_tree().expect("Failed to write tree"))
        .expect("Failed to find tree");

    let signature = Signature::now("Tim Tester", "tester@example.com").expect("signature");
    let parents: Vec<Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().expect("head commit")],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parent_refs)
        .expect("Failed to commit")
}

/// Lightweight tag on the current head
pub fn tag_head(repo: &Repository, tag: &str) -> Oid {
    let head = repo
        .head()
        .expect("head")
        .peel(ObjectType::Commit)
        .expect("head commit");
    repo.tag_lightweight(tag, &head, false).expect("Failed to tag");
    head.id()
}

/// Branch the remote's HEAD points at
pub fn head_branch(repo: &Repository) -> String {
    repo.head()
        .expect("head")
        .shorthand()
        .expect("utf-8 branch name")
        .to_string()
}

/// Commit checked out in the working copy at `dir`
pub fn checked_out_commit(dir: &Path) -> Oid {
    Repository::open(dir)
        .expect("Failed to open checkout")
        .head()
        .expect("head")
        .peel_to_commit()
        .expect("head commit")
        .id()
}

/// Short id as printed by `git rev-parse --short`
pub fn short_id(dir: &Path, oid: Oid) -> String {
    let output = Command::new("git")
        .args(["rev-parse", "--short", &oid.to_string()])
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
