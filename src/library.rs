use crate::model::{DirEntry, TrackRef};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

/// Read-only queries against the file tree. Every call hits the filesystem;
/// nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Catalog {
    extensions: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(AUDIO_EXTENSIONS.iter().copied())
    }
}

impl Catalog {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_playable(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
        self.extensions
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(supported))
    }

    /// Immediate children of `dir`: directories first, then playable files,
    /// each group in case-insensitive name order. Unreadable directories list
    /// as empty.
    pub fn list_children(&self, dir: &Path) -> Vec<DirEntry> {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                debug!(dir = %dir.display(), %err, "directory unreadable, listing as empty");
                return Vec::new();
            }
        };

        let mut folders = Vec::new();
        let mut files = Vec::new();

        for entry in read_dir.filter_map(Result::ok) {
            let path = entry.path();
            if path.is_dir() {
                folders.push(DirEntry::directory(path));
            } else if path.is_file() && self.is_playable(&path) {
                files.push(DirEntry::track(path));
            }
        }

        folders.sort_by_cached_key(|entry| entry.name().to_lowercase());
        files.sort_by_cached_key(|entry| entry.name().to_lowercase());
        folders.extend(files);
        folders
    }

    /// Every playable file under `dir` (inclusive), ordered by file name
    /// across the whole subtree. Unreadable subtrees are skipped.
    pub fn collect_tracks(&self, dir: &Path) -> Vec<TrackRef> {
        let mut tracks: Vec<TrackRef> = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && self.is_playable(entry.path()))
            .map(|entry| TrackRef::from_path(entry.into_path()))
            .collect();

        tracks.sort_by_cached_key(|track| track.name.to_lowercase());
        debug!(dir = %dir.display(), count = tracks.len(), "collected tracks");
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(path, b"").expect("fixture file");
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(DirEntry::name).collect()
    }

    #[test]
    fn lists_directories_before_tracks_case_insensitively() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("rock")).expect("dir");
        fs::create_dir(dir.path().join("Ambient")).expect("dir");
        touch(&dir.path().join("b.mp3"));
        touch(&dir.path().join("A.MP3"));
        touch(&dir.path().join("c.flac"));

        let entries = Catalog::default().list_children(dir.path());

        assert_eq!(names(&entries), vec!["Ambient", "rock", "A.MP3", "b.mp3", "c.flac"]);
        assert!(entries[0].is_dir() && entries[1].is_dir());
        assert!(entries[2..].iter().all(|entry| !entry.is_dir()));
    }

    #[test]
    fn non_playable_files_are_omitted() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("cover.jpg"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("song.mp3"));

        let entries = Catalog::default().list_children(dir.path());

        assert_eq!(names(&entries), vec!["song.mp3"]);
    }

    #[test]
    fn unreadable_directory_lists_as_empty() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("gone");
        assert!(Catalog::default().list_children(&missing).is_empty());

        let file = dir.path().join("song.mp3");
        touch(&file);
        assert!(Catalog::default().list_children(&file).is_empty());
    }

    #[test]
    fn collects_whole_subtree_sorted_by_file_name() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("z.mp3"));
        touch(&dir.path().join("Disc 1").join("b.MP3"));
        touch(&dir.path().join("Disc 2").join("A.mp3"));
        touch(&dir.path().join("Disc 2").join("deep").join("c.mp3"));
        touch(&dir.path().join("Disc 2").join("booklet.pdf"));

        let tracks = Catalog::default().collect_tracks(dir.path());
        let names: Vec<&str> = tracks.iter().map(|track| track.name.as_str()).collect();

        assert_eq!(names, vec!["A.mp3", "b.MP3", "c.mp3", "z.mp3"]);
        assert_eq!(tracks[0].path, dir.path().join("Disc 2").join("A.mp3"));
    }

    #[test]
    fn collect_on_missing_directory_is_empty() {
        let dir = tempdir().expect("tempdir");
        assert!(Catalog::default().collect_tracks(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let catalog = Catalog::new([".MP3", "", "Ogg"]);
        assert_eq!(catalog.extensions(), ["mp3", "ogg"]);
        assert!(catalog.is_playable(Path::new("x.ogg")));
        assert!(!catalog.is_playable(Path::new("x.flac")));
        assert!(!catalog.is_playable(Path::new("mp3")));
    }

    #[cfg(unix)]
    #[test]
    fn permission_denied_subtree_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("open").join("a.mp3"));
        let locked = dir.path().join("locked");
        touch(&locked.join("b.mp3"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

        let catalog = Catalog::default();
        let tracks = catalog.collect_tracks(dir.path());
        let listing = catalog.list_children(&locked);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod back");

        assert!(tracks.iter().any(|track| track.name == "a.mp3"));
        // Running as root ignores mode bits, so only assert on the result shape.
        assert!(listing.is_empty() || listing.len() == 1);
    }
}
