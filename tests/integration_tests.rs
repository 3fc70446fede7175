/// Integration tests for typecrawler
///
/// These tests drive the library the way the binary does: scan a folder,
/// select file types, organize on the worker thread, and check the tree
/// left on disk.
///
/// Test categories:
/// 1. Scanning and counting
/// 2. Organizing into category folders
/// 3. Name collisions
/// 4. Empty folder cleanup
/// 5. Dry-run mode
/// 6. Configuration and filtering
/// 7. Input errors
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use typecrawler::cli::{
    CliError, OrganizeCommand, load_filters, organize_folder, organize_folder_dry_run, run_cli,
};
use typecrawler::{CompiledFilters, Session, SessionError, scan_directory};

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers for building and checking trees.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, rel_path: &str, content: &str) {
        self.create_file(rel_path, content.as_bytes());
    }

    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create subdirectory");
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// All regular files below the root, relative and sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk(self.path(), self.path(), &mut files);
        files.sort();
        files
    }

    fn walk(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path.strip_prefix(root).unwrap().to_path_buf());
                } else if path.is_dir() {
                    Self::walk(root, &path, files);
                }
            }
        }
    }

    /// Directories below (not including) the root that have no entries.
    fn empty_dirs(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        Self::collect_empty(self.path(), &mut found);
        found
    }

    fn collect_empty(dir: &Path, found: &mut Vec<PathBuf>) {
        for entry in fs::read_dir(dir).expect("Failed to read directory").flatten() {
            let path = entry.path();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if fs::read_dir(&path).unwrap().next().is_none() {
                    found.push(path.clone());
                }
                Self::collect_empty(&path, found);
            }
        }
    }

    fn organize(&self, labels: &[&str]) -> typecrawler::OrganizeReport {
        organize_folder(self.path(), labels, false, CompiledFilters::default())
            .expect("Organize failed")
    }

    fn organize_all(&self) -> typecrawler::OrganizeReport {
        organize_folder(self.path(), &[], true, CompiledFilters::default())
            .expect("Organize failed")
    }
}

// ============================================================================
// Test Suite 1: Scanning and Counting
// ============================================================================

#[test]
fn test_scan_counts_match_file_total() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.jpg", "a");
    fixture.create_text_file("b.txt", "b");
    fixture.create_text_file("c", "c");
    fixture.create_text_file("deep/er/d.JPG", "d");
    fixture.create_text_file("deep/e.tar.gz", "e");
    fixture.create_subdir("empty/too");

    let scan = scan_directory(fixture.path(), &CompiledFilters::default()).unwrap();

    assert_eq!(scan.total_files(), fixture.list_files_recursive().len());
    assert_eq!(scan.count(".jpg"), 2);
    assert_eq!(scan.count(".txt"), 1);
    assert_eq!(scan.count(".gz"), 1);
    assert_eq!(scan.count(""), 1);
}

#[test]
fn test_scan_command_succeeds_and_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.jpg", "a");
    fixture.create_subdir("sub");

    let (_dir, config) = write_config("");
    let filters = load_filters(Some(&config)).unwrap();
    typecrawler::cli::scan_folder(fixture.path(), filters).expect("Scan failed");

    fixture.assert_file_exists("a.jpg");
    fixture.assert_dir_exists("sub");
    fixture.assert_not_exists("Organized");
}

#[test]
fn test_scan_missing_folder_fails() {
    let (_dir, config) = write_config("");
    let result = run_cli(
        OrganizeCommand::Scan {
            folder: PathBuf::from("/non/existent/path"),
        },
        Some(&config),
    );
    assert!(matches!(
        result,
        Err(CliError::Session(SessionError::Scan(_)))
    ));
}

#[test]
fn test_info_command() {
    assert!(run_cli(OrganizeCommand::Info, None).is_ok());
}

// ============================================================================
// Test Suite 2: Organizing
// ============================================================================

#[test]
fn test_end_to_end_example() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.jpg", "image");
    fixture.create_text_file("b.txt", "text");
    fixture.create_text_file("c", "bare");
    fixture.create_subdir("sub");

    let scan = scan_directory(fixture.path(), &CompiledFilters::default()).unwrap();
    let counts: Vec<(String, usize)> = scan
        .counts()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    assert_eq!(
        counts,
        vec![
            (String::new(), 1),
            (".jpg".to_string(), 1),
            (".txt".to_string(), 1),
        ]
    );

    let report = fixture.organize(&[".jpg", ".txt", "[No Extension]"]);

    fixture.assert_file_exists("Organized/images/a.jpg");
    fixture.assert_file_exists("Organized/docs/b.txt");
    fixture.assert_file_exists("Organized/Mix/no_extension/c");
    fixture.assert_not_exists("sub");
    fixture.assert_not_exists("a.jpg");
    assert_eq!(report.moved.len(), 3);
    assert_eq!(report.destination_root, scan.root().join("Organized"));
}

#[test]
fn test_organize_flattens_nested_directories() {
    let fixture = TestFixture::new();
    fixture.create_text_file("2021/trip/beach.png", "png");
    fixture.create_text_file("2022/clip.MOV", "mov");
    fixture.create_text_file("music/album/track.flac", "flac");

    fixture.organize_all();

    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            PathBuf::from("Organized/audio/track.flac"),
            PathBuf::from("Organized/images/beach.png"),
            PathBuf::from("Organized/videos/clip.MOV"),
        ]
    );
    fixture.assert_not_exists("2021");
    fixture.assert_not_exists("music");
}

#[test]
fn test_unselected_types_stay_put() {
    let fixture = TestFixture::new();
    fixture.create_text_file("docs/report.pdf", "pdf");
    fixture.create_text_file("docs/data.csv", "csv");

    fixture.organize(&["pdf"]);

    fixture.assert_file_exists("Organized/docs/report.pdf");
    fixture.assert_file_exists("docs/data.csv");
    fixture.assert_dir_exists("docs");
}

#[test]
fn test_uncategorized_types_go_to_mix() {
    let fixture = TestFixture::new();
    fixture.create_text_file("src/main.rs", "fn main() {}");
    fixture.create_text_file("backup.ZIP", "zip");
    fixture.create_text_file(".bashrc", "export A=1");

    fixture.organize_all();

    fixture.assert_file_exists("Organized/Mix/rs/main.rs");
    fixture.assert_file_exists("Organized/Mix/zip/backup.ZIP");
    fixture.assert_file_exists("Organized/Mix/no_extension/.bashrc");
}

#[cfg(unix)]
#[test]
fn test_non_utf8_extensions_get_their_own_mix_folders() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let names: [&[u8]; 2] = [b"a.\xff", b"b.\xfe"];
    for name in names {
        fs::write(fixture.path().join(OsStr::from_bytes(name)), b"raw").unwrap();
    }

    let scan = scan_directory(fixture.path(), &CompiledFilters::default()).unwrap();
    assert_eq!(scan.keys().collect::<Vec<_>>(), vec![".\\XFE", ".\\XFF"]);

    let report = organize_folder(fixture.path(), &[".\\XFF"], false, CompiledFilters::default())
        .expect("Organize failed");
    assert_eq!(report.moved.len(), 1);

    let report = fixture.organize_all();
    assert_eq!(report.moved.len(), 1);

    let mix = fixture.path().join("Organized/Mix");
    assert!(mix.join(OsStr::from_bytes(b"\xff/a.\xff")).is_file());
    assert!(mix.join(OsStr::from_bytes(b"\xfe/b.\xfe")).is_file());
    assert_eq!(fs::read_dir(&mix).unwrap().count(), 2);
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::new();
    let content = "Important document content\nwith multiple lines";
    fixture.create_text_file("notes/memo.txt", content);

    fixture.organize(&[".txt"]);

    assert_eq!(fixture.read("Organized/docs/memo.txt"), content);
}

#[test]
fn test_organize_summary_counts() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.jpg", "1");
    fixture.create_text_file("b.png", "2");
    fixture.create_text_file("c.mp3", "3");
    fixture.create_text_file("d.7z", "4");

    let report = fixture.organize_all();
    let counts = report.counts_by_folder();

    assert_eq!(counts.get(Path::new("images")), Some(&2));
    assert_eq!(counts.get(Path::new("audio")), Some(&1));
    assert_eq!(counts.get(Path::new("Mix/7z")), Some(&1));
}

#[test]
fn test_reorganize_leaves_organized_files_in_place() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.jpg", "first");
    fixture.organize_all();

    fixture.create_text_file("incoming/b.jpg", "second");
    let report = fixture.organize_all();

    fixture.assert_file_exists("Organized/images/a.jpg");
    fixture.assert_file_exists("Organized/images/b.jpg");
    fixture.assert_not_exists("Organized/images/a_1.jpg");
    assert_eq!(report.in_place.len(), 1);
    assert_eq!(report.moved.len(), 1);
}

// ============================================================================
// Test Suite 3: Name Collisions
// ============================================================================

#[test]
fn test_collision_second_file_gets_suffix() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/x.png", "from a");
    fixture.create_text_file("b/x.png", "from b");

    fixture.organize(&[".png"]);

    assert_eq!(fixture.read("Organized/images/x.png"), "from a");
    assert_eq!(fixture.read("Organized/images/x_1.png"), "from b");
    fixture.assert_not_exists("a");
    fixture.assert_not_exists("b");
}

#[test]
fn test_collision_files_before_subfolders() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/x.png", "nested");
    fixture.create_text_file("x.png", "top level");

    fixture.organize(&[".png"]);

    assert_eq!(fixture.read("Organized/images/x.png"), "top level");
    assert_eq!(fixture.read("Organized/images/x_1.png"), "nested");
}

#[test]
fn test_collision_with_existing_destination() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Organized/docs/report.txt", "old");
    fixture.create_text_file("Organized/docs/report_1.txt", "older");
    fixture.create_text_file("inbox/report.txt", "new");

    fixture.organize(&[".txt"]);

    assert_eq!(fixture.read("Organized/docs/report.txt"), "old");
    assert_eq!(fixture.read("Organized/docs/report_1.txt"), "older");
    assert_eq!(fixture.read("Organized/docs/report_2.txt"), "new");
}

#[test]
fn test_collision_many_same_names_never_overwrite() {
    let fixture = TestFixture::new();
    for i in 0..5 {
        fixture.create_text_file(&format!("dir{}/song.mp3", i), &format!("take {}", i));
    }

    let report = fixture.organize(&[".mp3"]);

    let mut destinations: Vec<_> = report.moved.iter().map(|r| r.destination.clone()).collect();
    destinations.sort();
    destinations.dedup();
    assert_eq!(destinations.len(), 5);
    fixture.assert_file_exists("Organized/audio/song.mp3");
    for i in 1..5 {
        fixture.assert_file_exists(&format!("Organized/audio/song_{}.mp3", i));
    }
}

#[test]
fn test_collision_without_extension() {
    let fixture = TestFixture::new();
    fixture.create_text_file("one/LICENSE", "1");
    fixture.create_text_file("two/LICENSE", "2");

    fixture.organize(&["[No Extension]"]);

    fixture.assert_file_exists("Organized/Mix/no_extension/LICENSE");
    fixture.assert_file_exists("Organized/Mix/no_extension/LICENSE_1");
}

// ============================================================================
// Test Suite 4: Empty Folder Cleanup
// ============================================================================

#[test]
fn test_cleanup_leaves_no_empty_directories() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/b/c/photo.jpg", "x");
    fixture.create_text_file("a/keep.csv", "x");
    fixture.create_subdir("lonely/deeper");

    let report = fixture.organize(&[".jpg"]);

    assert!(fixture.empty_dirs().is_empty(), "{:?}", fixture.empty_dirs());
    fixture.assert_file_exists("a/keep.csv");
    assert_eq!(report.removed_dirs, 4);
}

#[test]
fn test_root_is_kept_when_everything_moves_out() {
    let fixture = TestFixture::new();
    fixture.create_text_file("only/file.txt", "x");

    fixture.organize_all();

    assert!(fixture.path().is_dir());
    fixture.assert_file_exists("Organized/docs/file.txt");
}

#[test]
fn test_cleanup_is_idempotent_across_runs() {
    let fixture = TestFixture::new();
    fixture.create_text_file("x/y.txt", "x");
    fixture.organize_all();
    let before = fixture.list_files_recursive();

    let removed = typecrawler::cleaner::remove_empty_dirs(fixture.path()).unwrap();

    assert_eq!(removed, 0);
    assert_eq!(fixture.list_files_recursive(), before);
}

// ============================================================================
// Test Suite 5: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/x.png", "1");
    fixture.create_text_file("b/x.png", "2");
    fixture.create_subdir("empty");

    let before = fixture.list_files_recursive();
    let records =
        organize_folder_dry_run(fixture.path(), &[], true, CompiledFilters::default()).unwrap();

    assert_eq!(fixture.list_files_recursive(), before);
    fixture.assert_not_exists("Organized");
    fixture.assert_dir_exists("empty");

    let names: Vec<_> = records
        .iter()
        .map(|r| r.destination.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["x.png", "x_1.png"]);
}

#[test]
fn test_dry_run_matches_actual_organization() {
    let fixture = TestFixture::new();
    fixture.create_text_file("p/one.pdf", "1");
    fixture.create_text_file("q/one.pdf", "2");
    fixture.create_text_file("clip.mkv", "3");

    let planned =
        organize_folder_dry_run(fixture.path(), &[], true, CompiledFilters::default()).unwrap();
    let report = fixture.organize_all();

    let mut planned: Vec<_> = planned.into_iter().map(|r| r.destination).collect();
    let mut actual: Vec<_> = report.moved.into_iter().map(|r| r.destination).collect();
    planned.sort();
    actual.sort();
    assert_eq!(planned, actual);
}

// ============================================================================
// Test Suite 6: Configuration and Filtering
// ============================================================================

/// Writes a config file outside any fixture so scans never see it.
/// The returned directory must outlive the config path.
fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("typecrawler.toml");
    fs::write(&path, content).expect("Failed to write config");
    (dir, path)
}

#[test]
fn test_organize_with_exclude_extension() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.png", "png");
    fixture.create_text_file("debug.log", "log");

    let (_dir, config) = write_config("[filters.exclude]\nextensions = [\"log\"]\n");
    let result = run_cli(
        OrganizeCommand::Organize {
            folder: fixture.path().to_path_buf(),
            extensions: Vec::new(),
            all: true,
            dry_run: false,
        },
        Some(&config),
    );

    assert!(result.is_ok(), "Result error: {:?}", result.err());
    fixture.assert_file_exists("Organized/images/photo.png");
    fixture.assert_file_exists("debug.log");
}

#[test]
fn test_organize_with_exclude_pattern() {
    let fixture = TestFixture::new();
    fixture.create_text_file("node_modules/pkg/readme.txt", "dep");
    fixture.create_text_file("notes.txt", "mine");

    let (_dir, config) = write_config("[filters.exclude]\npatterns = [\"node_modules/**\"]\n");
    let filters = load_filters(Some(&config)).unwrap();
    let report = organize_folder(fixture.path(), &[".txt"], false, filters).unwrap();

    assert_eq!(report.moved.len(), 1);
    fixture.assert_file_exists("Organized/docs/notes.txt");
    fixture.assert_file_exists("node_modules/pkg/readme.txt");
}

#[test]
fn test_hidden_files_counted_by_default() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".env", "x");
    fixture.create_text_file(".config/app.toml", "x");

    let scan = scan_directory(fixture.path(), &CompiledFilters::default()).unwrap();
    assert_eq!(scan.total_files(), 2);

    let (_dir, config) = write_config("[filters]\nenable_hidden_files = false\n");
    let filters = load_filters(Some(&config)).unwrap();
    let scan = scan_directory(fixture.path(), &filters).unwrap();
    // Only file names are checked, so files inside hidden folders still count.
    assert_eq!(scan.count(".toml"), 1);
    assert_eq!(scan.count(""), 0);
}

#[test]
fn test_invalid_config_is_reported() {
    let (_dir, config) = write_config("[filters.exclude]\nregex = [\"[unclosed(\"]\n");
    let result = load_filters(Some(&config));
    assert!(matches!(result, Err(CliError::Config(_))));
}

// ============================================================================
// Test Suite 7: Input Errors
// ============================================================================

#[test]
fn test_organize_unknown_type_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "x");
    fixture.create_subdir("empty");

    let result = organize_folder(fixture.path(), &[".txt", ".png"], false, CompiledFilters::default());

    assert!(matches!(
        result,
        Err(CliError::Session(SessionError::UnknownExtension(_)))
    ));
    fixture.assert_file_exists("a.txt");
    fixture.assert_dir_exists("empty");
    fixture.assert_not_exists("Organized");
}

#[test]
fn test_organize_with_no_types_selected() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "x");

    let result = organize_folder(fixture.path(), &[], false, CompiledFilters::default());

    assert!(matches!(
        result,
        Err(CliError::Session(SessionError::NoTypesSelected))
    ));
    fixture.assert_file_exists("a.txt");
}

#[test]
fn test_session_without_folder() {
    let mut session = Session::new(CompiledFilters::default());
    assert!(matches!(
        session.scan_folder(),
        Err(SessionError::NoFolderSelected)
    ));
    assert!(matches!(
        session.organize(|_| {}),
        Err(SessionError::NoFolderSelected)
    ));
}
