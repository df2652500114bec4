use std::path::{Path, PathBuf};

/// A playable file. Two refs are the same track when their paths match.
#[derive(Debug, Clone, Eq)]
pub struct TrackRef {
    pub path: PathBuf,
    pub name: String,
}

impl TrackRef {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { path, name }
    }
}

impl PartialEq for TrackRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    Directory { path: PathBuf, name: String },
    Track(TrackRef),
}

impl DirEntry {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self::Directory { path, name }
    }

    pub fn track(path: impl Into<PathBuf>) -> Self {
        Self::Track(TrackRef::from_path(path))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } => name,
            Self::Track(track) => &track.name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory { path, .. } => path,
            Self::Track(track) => &track.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Browser,
    Queue,
}

impl Focus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Browser => Self::Queue,
            Self::Queue => Self::Browser,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Browser => "Browser",
            Self::Queue => "Queue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    /// Neighbouring index in this direction, or `None` when it would go below zero.
    pub fn apply(self, index: usize) -> Option<usize> {
        match self {
            Self::Up => index.checked_sub(1),
            Self::Down => index.checked_add(1),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
