//! `morph transform`: run the transform pipeline over template files.

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::args::TransformArgs;
use crate::config::MorphConfig;
use crate::pipeline::Pipeline;
use crate::{debug, log};

/// A template found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub path: PathBuf,
    /// Directory the output layout is relative to.
    pub base: PathBuf,
}

impl TemplateFile {
    /// Path relative to `base` (the file name for single-file inputs).
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }
}

/// Result of transforming one template.
#[derive(Debug)]
pub struct Outcome {
    pub file: TemplateFile,
    pub output: String,
    pub changed: bool,
}

/// Expand input paths into template files.
///
/// Files are taken as given; directories are walked and filtered by the
/// configured extensions. Results are sorted for stable output.
pub fn collect_templates(paths: &[PathBuf], config: &MorphConfig) -> Result<Vec<TemplateFile>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let found = WalkDir::new(path)
                .sort(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path())
                .filter(|p| config.is_template(p))
                .map(|p| TemplateFile {
                    path: p,
                    base: path.clone(),
                });
            files.extend(found);
        } else if path.is_file() {
            files.push(TemplateFile {
                path: path.clone(),
                base: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            });
        } else {
            bail!("template path `{}` does not exist", path.display());
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Read and transform every file in parallel.
pub fn transform_files(files: &[TemplateFile], pipeline: &Pipeline) -> Result<Vec<Outcome>> {
    files
        .par_iter()
        .map(|file| -> Result<Outcome> {
            let source = fs::read_to_string(&file.path)
                .with_context(|| format!("failed to read `{}`", file.path.display()))?;
            let output = pipeline.run(source.clone());
            let changed = output != source;
            debug!("morph"; "{}{}", file.relative().display(), if changed { "" } else { " (unchanged)" });
            Ok(Outcome {
                file: file.clone(),
                output,
                changed,
            })
        })
        .collect()
}

/// Write outcomes below `output_dir`, mirroring their relative layout.
pub fn write_outcomes(outcomes: &[Outcome], output_dir: &Path) -> Result<()> {
    outcomes.par_iter().try_for_each(|outcome| -> Result<()> {
        let dest = output_dir.join(outcome.file.relative());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }
        fs::write(&dest, &outcome.output)
            .with_context(|| format!("failed to write `{}`", dest.display()))
    })
}

/// Entry point for `morph transform`.
pub fn run_transform(args: &TransformArgs, config: &MorphConfig) -> Result<()> {
    let files = collect_templates(&args.paths, config)?;
    if files.is_empty() {
        log!("warning"; "no templates found (extensions: {})", config.morph.extensions.join(", "));
        return Ok(());
    }

    let pipeline = config.pipeline();
    let outcomes = transform_files(&files, &pipeline)?;
    let changed = outcomes.iter().filter(|o| o.changed).count();

    if args.check {
        for outcome in outcomes.iter().filter(|o| o.changed) {
            log!("check"; "{}", outcome.file.path.display());
        }
        if changed > 0 {
            bail!("{} of {} template(s) contain morphable attributes", changed, outcomes.len());
        }
        log!("check"; "{} template(s), nothing to morph", outcomes.len());
        return Ok(());
    }

    match &args.output {
        Some(dir) => {
            write_outcomes(&outcomes, dir)?;
            log!("morph"; "wrote {} template(s) to {} ({} morphed)", outcomes.len(), dir.display(), changed);
        }
        None => {
            let [outcome] = outcomes.as_slice() else {
                bail!("{} templates given, use --output to write them", outcomes.len());
            };
            print!("{}", outcome.output);
        }
    }
    Ok(())
}
