//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use splashpatch::editor::{ArrayElement, RecordClass, RecordEditor, RecordKind};
use splashpatch::mutation::{
    HAS_PRO_VERSION, IS_NO_WATERMARK_BUILD, IS_TRIAL, SHOW_UNITY_SPLASH_LOGO,
};
use splashpatch::{ArchivePath, Error, WriteResult, Writer};

/// Creates an in-memory container from `(name, data)` pairs, in the given
/// table order. Returns the bytes and the write statistics.
pub fn create_container_with_result(
    entries: &[(&str, &[u8])],
) -> splashpatch::Result<(Vec<u8>, WriteResult)> {
    let mut writer = Writer::create(Cursor::new(Vec::new()))?;
    for (name, data) in entries {
        writer.add_bytes(ArchivePath::new(name)?, data.to_vec())?;
    }
    let (result, cursor) = writer.finish_into_inner()?;
    Ok((cursor.into_inner(), result))
}

/// Creates an in-memory container from `(name, data)` pairs.
pub fn create_container(entries: &[(&str, &[u8])]) -> splashpatch::Result<Vec<u8>> {
    create_container_with_result(entries).map(|(bytes, _)| bytes)
}

/// Extracts the error from a Result, panicking if it's Ok.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}

/// Writes `(relative path, data)` pairs under `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (name, data) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, data).unwrap();
    }
}

/// Reads every file under `root`, keyed by `/`-separated relative path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (name, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Lists every file and directory under `root`, relative to it.
pub fn listing(root: &Path) -> BTreeSet<PathBuf> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

/// Builds bytes that the detector recognizes as a legacy serialized asset
/// file (version 17, 32-bit size field).
pub fn serialized_asset(body: &[u8]) -> Vec<u8> {
    let len = (20 + body.len()) as u32;
    let mut data = Vec::with_capacity(len as usize);
    data.extend_from_slice(&0u32.to_be_bytes()); // metadata size
    data.extend_from_slice(&len.to_be_bytes()); // file size
    data.extend_from_slice(&17u32.to_be_bytes()); // version
    data.extend_from_slice(&0u32.to_be_bytes()); // data offset
    data.extend_from_slice(&[0, 0, 0, 0]); // endianness + reserved
    data.extend_from_slice(body);
    data
}

/// Suffix [`MemoryEditor`] appends to files it writes.
pub const PATCH_MARK: &[u8] = b"|patched";

/// Field tree handed out by [`MemoryEditor`].
#[derive(Debug, Clone)]
pub struct MemoryFields {
    class: RecordClass,
    bools: HashMap<String, bool>,
    logos: Vec<ArrayElement>,
}

/// Record editor fake that keeps flags in memory and records every call.
///
/// `write_changes` writes the opened file's bytes followed by
/// [`PATCH_MARK`], so tests can see that the edit travelled through every
/// layer.
#[derive(Debug)]
pub struct MemoryEditor {
    pub build: HashMap<String, bool>,
    pub player: HashMap<String, bool>,
    pub logos: Vec<ArrayElement>,
    /// Operation name that fails with `MutationUnsupported`.
    pub fail_on: Option<&'static str>,
    /// Whether `open` creates a scratch file next to the source.
    pub make_scratch: bool,
    /// Directory where `open` also drops an `editor.log` scratch file.
    pub scratch_dir: Option<PathBuf>,
    pub events: Vec<String>,
    /// The last file opened; kept after `close`.
    pub opened: Option<(PathBuf, RecordKind)>,
    pub open_count: usize,
    pub close_count: usize,
    pub written: Vec<PathBuf>,
    source: Vec<u8>,
    scratch: Vec<PathBuf>,
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEditor {
    /// A build that still shows the splash screen, the watermark and the
    /// logos `["UnitySplash-cube", "StudioLogo"]`.
    pub fn new() -> Self {
        let build = [
            (HAS_PRO_VERSION, false),
            (IS_NO_WATERMARK_BUILD, false),
            (IS_TRIAL, true),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let player = [(SHOW_UNITY_SPLASH_LOGO, true)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            build,
            player,
            logos: named_logos(&["UnitySplash-cube", "StudioLogo"]),
            fail_on: None,
            make_scratch: false,
            scratch_dir: None,
            events: Vec::new(),
            opened: None,
            open_count: 0,
            close_count: 0,
            written: Vec::new(),
            source: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// A build where both mutations are already applied.
    pub fn already_patched() -> Self {
        let mut editor = Self::new();
        editor.build.insert(HAS_PRO_VERSION.into(), true);
        editor.build.insert(IS_NO_WATERMARK_BUILD.into(), true);
        editor.build.insert(IS_TRIAL.into(), false);
        editor.player.insert(SHOW_UNITY_SPLASH_LOGO.into(), false);
        editor
    }

    /// Fails the named operation.
    pub fn failing_on(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    fn check(&mut self, op: &str) -> splashpatch::Result<()> {
        if self.fail_on == Some(op) {
            self.events.push(format!("{op} failed"));
            return Err(Error::MutationUnsupported {
                reason: format!("{op} is not supported"),
            });
        }
        Ok(())
    }

    fn table(&self, class: RecordClass) -> &HashMap<String, bool> {
        match class {
            RecordClass::BuildSettings => &self.build,
            RecordClass::PlayerSettings => &self.player,
        }
    }
}

/// Builds logo elements with the given names.
pub fn named_logos(names: &[&str]) -> Vec<ArrayElement> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| ArrayElement {
            index,
            name: Some(name.to_string()),
        })
        .collect()
}

impl RecordEditor for MemoryEditor {
    type Record = RecordClass;
    type Fields = MemoryFields;
    type Replacer = MemoryFields;

    fn open(&mut self, source: &Path, kind: RecordKind) -> splashpatch::Result<()> {
        self.check("open")?;
        self.source = fs::read(source)?;
        self.opened = Some((source.to_path_buf(), kind));
        self.open_count += 1;
        if self.make_scratch {
            let scratch = splashpatch::staging::with_suffix(source, ".unpacked");
            fs::write(&scratch, b"scratch")?;
            self.scratch.push(scratch);
        }
        if let Some(dir) = &self.scratch_dir {
            let scratch = dir.join("editor.log");
            fs::write(&scratch, b"log")?;
            self.scratch.push(scratch);
        }
        self.events.push(format!("open {kind}"));
        Ok(())
    }

    fn locate(&mut self, class: RecordClass) -> splashpatch::Result<RecordClass> {
        self.check("locate")?;
        Ok(class)
    }

    fn base_fields(&mut self, record: &RecordClass) -> splashpatch::Result<MemoryFields> {
        self.check("base_fields")?;
        Ok(MemoryFields {
            class: *record,
            bools: self.table(*record).clone(),
            logos: match record {
                RecordClass::PlayerSettings => self.logos.clone(),
                RecordClass::BuildSettings => Vec::new(),
            },
        })
    }

    fn read_bool(&mut self, fields: &MemoryFields, name: &str) -> splashpatch::Result<bool> {
        self.check("read_bool")?;
        self.events.push(format!("read {}.{name}", fields.class));
        fields
            .bools
            .get(name)
            .copied()
            .ok_or_else(|| Error::MutationUnsupported {
                reason: format!("no field {name}"),
            })
    }

    fn write_bool(
        &mut self,
        fields: &mut MemoryFields,
        name: &str,
        value: bool,
    ) -> splashpatch::Result<()> {
        self.check("write_bool")?;
        self.events
            .push(format!("write {}.{name} = {value}", fields.class));
        fields.bools.insert(name.to_string(), value);
        Ok(())
    }

    fn array_elements(
        &mut self,
        fields: &MemoryFields,
        name: &str,
    ) -> splashpatch::Result<Vec<ArrayElement>> {
        self.check("array_elements")?;
        self.events.push(format!("list {}.{name}", fields.class));
        Ok(fields.logos.clone())
    }

    fn remove_array_element(
        &mut self,
        fields: &mut MemoryFields,
        name: &str,
        index: usize,
    ) -> splashpatch::Result<()> {
        self.check("remove_array_element")?;
        self.events
            .push(format!("remove {}.{name}[{index}]", fields.class));
        fields.logos.retain(|e| e.index != index);
        Ok(())
    }

    fn commit(
        &mut self,
        record: &RecordClass,
        fields: MemoryFields,
    ) -> splashpatch::Result<MemoryFields> {
        self.check("commit")?;
        self.events.push(format!("commit {record}"));
        Ok(fields)
    }

    fn write_changes(
        &mut self,
        dest: &Path,
        replacers: Vec<MemoryFields>,
    ) -> splashpatch::Result<()> {
        self.check("write_changes")?;
        for fields in replacers {
            match fields.class {
                RecordClass::BuildSettings => self.build = fields.bools,
                RecordClass::PlayerSettings => {
                    self.player = fields.bools;
                    self.logos = fields.logos;
                }
            }
        }
        let mut bytes = self.source.clone();
        bytes.extend_from_slice(PATCH_MARK);
        fs::write(dest, bytes)?;
        self.written.push(dest.to_path_buf());
        self.events.push("write_changes".to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.close_count += 1;
    }

    fn take_scratch_paths(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.scratch)
    }
}
