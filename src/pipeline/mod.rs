//! The patching pipeline.
//!
//! One run takes a user-selected file through
//!
//! ```text
//! Detect -> [Decompress] -> [Unpack] -> ResolveTarget -> Mutate
//!        -> [Backup -> WriteBack -> [Repack] -> [Recompress]] -> cleanup
//! ```
//!
//! Bracketed stages run only when the input needs them. Every intermediate
//! file is registered with a [`Staging`] guard before it is created and is
//! removed when the run ends, whether it succeeded or not. Only the `.bak`
//! backup and the rewritten input survive.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "process-editor")]
//! # fn main() -> splashpatch::Result<()> {
//! use std::path::Path;
//! use splashpatch::editor::ProcessEditor;
//! use splashpatch::mutation::Mutation;
//! use splashpatch::pipeline::Pipeline;
//! use splashpatch::prompt::NoPrompt;
//!
//! let mut pipeline = Pipeline::new(ProcessEditor::new("splashpatch-editor"));
//! let report = pipeline.run(
//!     Path::new("Build/WebGL.data.br"),
//!     &Mutation::RemoveWatermark,
//!     &mut NoPrompt,
//! )?;
//! println!("changed: {}", report.changed);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "process-editor"))]
//! # fn main() {}
//! ```

mod options;
mod report;

pub use options::PipelineOptions;
pub use report::RunReport;

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::editor::{RecordEditor, RecordKind};
use crate::format::detect::{self, Classification, FormatInfo};
use crate::mutation::{Mutation, MutationOutcome};
use crate::progress::{NoObserver, StageObserver};
use crate::prompt::Prompter;
use crate::staging::{self, Staging};
use crate::{Error, Result, Stage, read, write};

/// Returns where a compressed input is decompressed to: the same path with
/// its last extension removed.
///
/// ```rust
/// use std::path::Path;
/// use splashpatch::pipeline::decompressed_path_for;
///
/// assert_eq!(decompressed_path_for(Path::new("Build/WebGL.data.br")), Path::new("Build/WebGL.data"));
/// assert_eq!(decompressed_path_for(Path::new("Build/blob")), Path::new("Build/blob_decompressed"));
/// ```
pub fn decompressed_path_for(input: &Path) -> PathBuf {
    match input.extension() {
        Some(_) => input.with_extension(""),
        None => staging::with_suffix(input, "_decompressed"),
    }
}

/// Detects, unwraps, patches and rewraps one input file.
///
/// The pipeline owns its record editor and reuses it across runs. `run`
/// takes `&mut self`, so one pipeline never runs twice at once; two
/// pipelines must not be pointed at the same file concurrently, as no file
/// lock is taken.
#[derive(Debug)]
pub struct Pipeline<E> {
    editor: E,
    options: PipelineOptions,
}

impl<E: RecordEditor> Pipeline<E> {
    /// Creates a pipeline with default options.
    pub fn new(editor: E) -> Self {
        Self::with_options(editor, PipelineOptions::default())
    }

    /// Creates a pipeline with the given options.
    pub fn with_options(editor: E, options: PipelineOptions) -> Self {
        Self { editor, options }
    }

    /// Returns the options.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Returns the record editor.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Returns the record editor mutably.
    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    /// Consumes the pipeline and returns the record editor.
    pub fn into_editor(self) -> E {
        self.editor
    }

    /// Applies `mutation` to the record file reachable from `input`.
    ///
    /// # Errors
    ///
    /// Every failure is returned as [`Error::Stage`] naming the stage and
    /// file involved. Staging artifacts have been removed by then.
    pub fn run<P>(&mut self, input: &Path, mutation: &Mutation, prompter: &mut P) -> Result<RunReport>
    where
        P: Prompter + ?Sized,
    {
        self.run_with_observer(input, mutation, prompter, &mut NoObserver)
    }

    /// Like [`run`](Self::run), reporting stage transitions to `observer`.
    ///
    /// Cancellation requested through [`StageObserver::should_cancel`] is
    /// honoured before each stage and surfaces as [`Error::Cancelled`].
    pub fn run_with_observer<P, O>(
        &mut self,
        input: &Path,
        mutation: &Mutation,
        prompter: &mut P,
        observer: &mut O,
    ) -> Result<RunReport>
    where
        P: Prompter + ?Sized,
        O: StageObserver + ?Sized,
    {
        let started = Instant::now();
        log::info!("{mutation}: {}", input.display());

        let mut staging = Staging::new();
        let mut editor_open = false;
        let result = self.execute(
            input,
            mutation,
            prompter,
            observer,
            &mut staging,
            &mut editor_open,
        );

        if editor_open {
            release_editor(&mut self.editor, &mut staging, None);
        }
        let cleaned = staging.finish();
        if !cleaned.is_empty() {
            log::debug!("cleaned up {} staging artifact(s)", cleaned.len());
        }

        match result {
            Ok(mut report) => {
                report.cleaned = cleaned;
                report.elapsed = started.elapsed();
                Ok(report)
            }
            Err(e) => {
                log::debug!("run aborted: {e}");
                Err(e)
            }
        }
    }

    fn execute<P, O>(
        &mut self,
        input: &Path,
        mutation: &Mutation,
        prompter: &mut P,
        observer: &mut O,
        staging: &mut Staging,
        editor_open: &mut bool,
    ) -> Result<RunReport>
    where
        P: Prompter + ?Sized,
        O: StageObserver + ?Sized,
    {
        let info = run_stage(observer, Stage::Detect, input, || detect_input(input, prompter))?;
        log::info!(
            "detected {} (confidence {:.1})",
            info.classification,
            info.confidence
        );

        // Peel the compression layer, if any.
        let (compression, container) = match info.classification {
            Classification::Compressed(compression) => {
                let derived = decompressed_path_for(input);
                let decompressed = run_stage(observer, Stage::Decompress, input, || {
                    refuse_existing(&derived)?;
                    staging.register(&derived);
                    compression.decompress_file(input, &derived)
                })?;
                (Some(compression), decompressed)
            }
            _ => (None, input.to_path_buf()),
        };

        let inner = match compression {
            Some(_) => run_stage(observer, Stage::Detect, &container, || {
                let info = detect::classify(&container)?;
                match info.classification {
                    Classification::Compressed(_) | Classification::Unknown => {
                        Err(Error::UnknownFormat {
                            path: container.clone(),
                        })
                    }
                    other => Ok(other),
                }
            })?,
            None => info.classification,
        };

        // Open the container layer, if any, and find the record file.
        let (unpacked, target, kind) = match inner {
            Classification::RawContainer => {
                let directory = read::unpack_dir_for(&container);
                run_stage(observer, Stage::Unpack, &container, || {
                    refuse_existing(&directory)?;
                    staging.register(&directory);
                    read::unpack(&container)
                })?;
                let (target, kind) = run_stage(observer, Stage::ResolveTarget, &directory, || {
                    resolve_target(&directory, self.options.targets())
                })?;
                (Some(directory), target, kind)
            }
            other => match RecordKind::from_classification(other) {
                Some(kind) => (None, container.clone(), kind),
                None => {
                    return Err(Error::UnknownFormat {
                        path: container.clone(),
                    }
                    .at_stage(Stage::Detect, &container));
                }
            },
        };

        let mut report = RunReport::new(info.classification, target.clone());

        let editor = &mut self.editor;
        let clone = clone_path_for(&target, unpacked.as_deref());
        let outcome = run_stage(observer, Stage::Mutate, &target, || {
            refuse_existing(&clone)?;
            staging.register(&clone);
            staging::clone_file(&target, &clone);
            *editor_open = true;
            editor.open(&clone, kind)?;
            mutation.apply(editor, prompter)
        })?;

        let replacers = match outcome {
            MutationOutcome::NoChange => {
                observer.on_warning(&format!("{mutation}: nothing to change"));
                return Ok(report);
            }
            MutationOutcome::Changed(replacers) => replacers,
        };

        let backup = run_stage(observer, Stage::Backup, input, || {
            let backup = staging::backup_only_once(input)?;
            if !backup.is_file() {
                return Err(Error::BackupFailed {
                    path: input.to_path_buf(),
                });
            }
            Ok(backup)
        })?;
        report.backup = Some(backup);

        run_stage(observer, Stage::WriteBack, &target, || {
            editor.write_changes(&target, replacers)
        })?;

        // Nothing but the patched target may be left in the unpacked tree
        // when it is packed again.
        *editor_open = false;
        release_editor(editor, staging, Some(&clone));

        if let Some(directory) = &unpacked {
            run_stage(observer, Stage::Repack, &container, || {
                write::pack(directory, &container)
            })?;
        }

        if let Some(compression) = compression {
            let level = self.options.level();
            run_stage(observer, Stage::Recompress, input, || {
                compression.compress_file(&container, input, level)
            })?;
        }

        report.changed = true;
        if let Some(backup) = &report.backup {
            log::info!("{mutation}: done, original kept at {}", backup.display());
        }
        Ok(report)
    }
}

/// Returns where the record editor's working copy of `target` goes.
///
/// A target inside an unpacked container gets its copy next to the
/// unpacked directory, so the copy can never be packed back in.
fn clone_path_for(target: &Path, unpacked: Option<&Path>) -> PathBuf {
    let name = target.file_name().unwrap_or_default();
    let beside = match unpacked {
        Some(directory) => directory.with_file_name(name),
        None => target.to_path_buf(),
    };
    staging::with_suffix(&beside, staging::CLONE_SUFFIX)
}

/// Closes the editor and hands its scratch files to `staging`.
///
/// With `discard`, the scratch files and that path are deleted right away.
fn release_editor<E: RecordEditor>(editor: &mut E, staging: &mut Staging, discard: Option<&Path>) {
    editor.close();
    let scratch = editor.take_scratch_paths();
    for path in &scratch {
        staging.register(path);
    }
    if let Some(clone) = discard {
        for path in scratch.iter().rev() {
            staging.discard(path);
        }
        staging.discard(clone);
    }
}

/// Runs one stage, reporting it to `observer` and tagging its error.
fn run_stage<O, T, F>(observer: &mut O, stage: Stage, path: &Path, f: F) -> Result<T>
where
    O: StageObserver + ?Sized,
    F: FnOnce() -> Result<T>,
{
    if observer.should_cancel() {
        return Err(Error::Cancelled.at_stage(stage, path));
    }

    log::debug!("{stage}: {}", path.display());
    observer.on_stage_start(stage, path);
    let result = f();
    observer.on_stage_complete(stage, result.is_ok());
    result.map_err(|e| e.at_stage(stage, path))
}

fn detect_input<P: Prompter + ?Sized>(input: &Path, prompter: &mut P) -> Result<FormatInfo> {
    let info = detect::classify(input)?;
    if !info.is_unknown() {
        return Ok(info);
    }

    if detect::is_unityweb(input) {
        if let Some(compression) = prompter.choose_compression(input)? {
            return Ok(FormatInfo::from_name(Classification::Compressed(compression)));
        }
    }
    Err(Error::UnknownFormat {
        path: input.to_path_buf(),
    })
}

fn resolve_target(directory: &Path, names: &[String]) -> Result<(PathBuf, RecordKind)> {
    for name in names {
        let candidate = directory.join(name);
        if !candidate.is_file() {
            continue;
        }

        let by_content = detect::classify(&candidate)?.classification;
        let kind = RecordKind::from_classification(by_content)
            .or_else(|| RecordKind::from_classification(detect::detect_from_name(name)))
            .unwrap_or_else(|| {
                log::warn!("{name} was not recognized, opening it as an asset file");
                RecordKind::Asset
            });
        log::info!("target: {} ({kind})", candidate.display());
        return Ok((candidate, kind));
    }

    Err(Error::TargetNotFound {
        directory: directory.to_path_buf(),
        candidates: names.to_vec(),
    })
}

fn refuse_existing(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::ArtifactExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
