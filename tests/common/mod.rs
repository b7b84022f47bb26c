#![allow(dead_code)]

use git2::{Oid, Repository as Git2Repo};
use packager::archive::Archiver;
use packager::config::{Config, MarkerConfig};
use packager::git::{Git2Repository, Repository};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const INIT_PY: &str = "# -*- coding: utf-8 -*-\n#\n# addon_template v20.5.4i8\n#\nimport re\n";

/// A temp dir holding a `widget` repository with one commit and a bare `origin`.
pub struct Fixture {
    _dir: TempDir,
    pub root: PathBuf,
    pub remote: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let root = dir.path().join("widget");
        let remote = dir.path().join("remote.git");
        fs::create_dir_all(root.join("src")).unwrap();

        let repo = Git2Repo::init(&root).expect("Could not init git repo");
        {
            let mut config = repo.config().expect("Could not get config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        Git2Repo::init_bare(&remote).expect("Could not init bare remote");
        repo.remote("origin", remote.to_str().unwrap()).unwrap();

        fs::write(root.join("README.md"), "widget\n").unwrap();
        fs::write(root.join("src/__init__.py"), INIT_PY).unwrap();
        fs::write(root.join("src/main.py"), "print('widget')\n").unwrap();
        fs::create_dir_all(root.join("src/assets")).unwrap();
        fs::write(root.join("src/assets/icon.svg"), "<svg/>\n").unwrap();
        fs::write(root.join("src/VERSION"), "20200504000800\n").unwrap();

        let fixture = Fixture {
            _dir: dir,
            root,
            remote,
        };
        fixture.commit_all("Initial commit");
        fixture
    }

    pub fn repo(&self) -> Git2Repository {
        Git2Repository::from_git2(Git2Repo::open(&self.root).expect("Could not open repo"))
    }

    pub fn commit_all(&self, message: &str) {
        let repo = self.repo();
        let msg_dir = TempDir::new().unwrap();
        let msg = msg_dir.path().join("message");
        fs::write(&msg, message).unwrap();
        repo.stage_all().unwrap();
        repo.commit_from_file(&msg).unwrap();
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.version.markers.push(MarkerConfig {
            path: PathBuf::from("src/__init__.py"),
            pattern: r"addon_template v(\S+)".to_string(),
        });
        config
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).unwrap()
    }

    pub fn remote_tags(&self) -> Vec<String> {
        let bare = Git2Repo::open_bare(&self.remote).unwrap();
        let names = bare.tag_names(None).unwrap();
        names.iter().flatten().map(|s| s.to_string()).collect()
    }
}

/// Writes a fake archive listing the source files, for runs without a zip program.
pub struct ListingArchiver;

impl Archiver for ListingArchiver {
    fn create_archive(&self, source_dir: &Path, destination: &Path) -> packager::Result<()> {
        let mut names = Vec::new();
        collect_files(source_dir, source_dir, &mut names);
        names.sort();
        fs::write(destination, names.join("\n"))?;
        Ok(())
    }
}

fn collect_files(base: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(base, &path, out);
        } else {
            out.push(path.strip_prefix(base).unwrap().display().to_string());
        }
    }
}

/// Delegates to a real repository, remembering every commit message file it was given.
pub struct RecordingRepository<R> {
    pub inner: R,
    pub message_files: RefCell<Vec<PathBuf>>,
}

impl<R: Repository> RecordingRepository<R> {
    pub fn new(inner: R) -> Self {
        RecordingRepository {
            inner,
            message_files: RefCell::new(Vec::new()),
        }
    }
}

impl<R: Repository> Repository for RecordingRepository<R> {
    fn workdir(&self) -> packager::Result<PathBuf> {
        self.inner.workdir()
    }

    fn dirty_paths(&self) -> packager::Result<Vec<String>> {
        self.inner.dirty_paths()
    }

    fn stage_all(&self) -> packager::Result<()> {
        self.inner.stage_all()
    }

    fn commit_from_file(&self, message_file: &Path) -> packager::Result<Oid> {
        self.message_files
            .borrow_mut()
            .push(message_file.to_path_buf());
        self.inner.commit_from_file(message_file)
    }

    fn create_tag(&self, name: &str, message: Option<&str>) -> packager::Result<()> {
        self.inner.create_tag(name, message)
    }

    fn list_tags(&self) -> packager::Result<Vec<String>> {
        self.inner.list_tags()
    }

    fn push_tags(&self, remote: &str) -> packager::Result<Vec<String>> {
        self.inner.push_tags(remote)
    }

    fn head_message(&self) -> packager::Result<Option<String>> {
        self.inner.head_message()
    }
}

fn u16_at(bytes: &[u8], at: usize) -> usize {
    u16::from_le_bytes([bytes[at], bytes[at + 1]]) as usize
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// File entries of a zip archive: name -> (crc32, uncompressed size).
///
/// Reads the central directory only; directory entries are skipped.
/// ZIP64 archives are not supported.
pub fn zip_entries(path: &Path) -> BTreeMap<String, (u32, u32)> {
    let bytes = fs::read(path).unwrap();
    assert!(
        bytes.len() >= 22,
        "{} is too short to be a zip archive ({} bytes)",
        path.display(),
        bytes.len()
    );
    let eocd = (0..=bytes.len() - 22)
        .rev()
        .find(|&i| u32_at(&bytes, i) == 0x0605_4b50)
        .expect("no end of central directory record");

    let count = u16_at(&bytes, eocd + 10);
    let cd_offset = u32_at(&bytes, eocd + 16);
    assert!(
        count != 0xffff && cd_offset != 0xffff_ffff,
        "{} is a ZIP64 archive",
        path.display()
    );
    let mut offset = cd_offset as usize;
    let mut entries = BTreeMap::new();

    for _ in 0..count {
        assert_eq!(u32_at(&bytes, offset), 0x0201_4b50, "bad central directory header");
        let crc = u32_at(&bytes, offset + 16);
        let size = u32_at(&bytes, offset + 24);
        let name_len = u16_at(&bytes, offset + 28);
        let extra_len = u16_at(&bytes, offset + 30);
        let comment_len = u16_at(&bytes, offset + 32);
        let name = String::from_utf8_lossy(&bytes[offset + 46..offset + 46 + name_len]).into_owned();

        if !name.ends_with('/') {
            entries.insert(name, (crc, size));
        }
        offset += 46 + name_len + extra_len + comment_len;
    }

    entries
}
