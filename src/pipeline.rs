//! Per-manifest build orchestration: concatenate, minify, pack, deploy.
//!
//! Manifests are processed strictly in order, and within a manifest `js`
//! is built before `css`. The first error stops the run; output already
//! deployed for earlier manifests stays in place.
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::manifest::{AssetKind, Manifest, short_name};
use crate::context::BuildContext;
use crate::deploy;
use crate::error::{BuildError, IoContext as _};
use crate::fs::move_file;
use crate::logging::{BuildStatus, Log};
use crate::tools::Toolchain;

/// Stage artifacts produced for one asset kind of one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Asset kind these artifacts belong to.
    pub kind: AssetKind,
    /// Concatenated sources, `<name>-raw.<ext>`.
    pub raw: PathBuf,
    /// Minifier output (or the renamed concatenation when compression is
    /// off), `<name>-min.<ext>`.
    pub minified: PathBuf,
    /// Packer output, `<name>-sp.js` (JavaScript with compression only).
    pub packed: Option<PathBuf>,
}

impl Artifacts {
    /// The file that gets deployed to `dist/<ext>/`.
    #[must_use]
    pub fn deployable(&self) -> &Path {
        self.packed.as_deref().unwrap_or(&self.minified)
    }
}

/// Drives the build of each manifest.
pub struct Pipeline<'a> {
    ctx: &'a BuildContext,
    tools: &'a dyn Toolchain,
    log: &'a dyn Log,
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("build_id", &self.ctx.build_id)
            .field("compress", &self.ctx.compress)
            .finish_non_exhaustive()
    }
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline for `ctx` using `tools` for compression.
    #[must_use]
    pub const fn new(ctx: &'a BuildContext, tools: &'a dyn Toolchain, log: &'a dyn Log) -> Self {
        Self { ctx, tools, log }
    }

    /// Build and deploy every manifest in order.
    ///
    /// # Errors
    ///
    /// Returns the first error; later manifests are not attempted.
    pub fn run(&self, manifests: &[PathBuf]) -> Result<(), BuildError> {
        for path in manifests {
            self.build_manifest(path)?;
        }
        Ok(())
    }

    /// Build and deploy one manifest, recording its outcome for the summary.
    ///
    /// Returns the number of deployment warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is invalid, a tool fails, or an
    /// artifact cannot be written.
    pub fn build_manifest(&self, path: &Path) -> Result<usize, BuildError> {
        let name = short_name(path);
        self.log.stage(&format!("Building {name} ({})", path.display()));

        match self.build_and_deploy(path) {
            Ok((kinds, 0)) => {
                self.log.record(&name, BuildStatus::Ok, kinds.as_deref());
                Ok(0)
            }
            Ok((_, warnings)) => {
                let msg = format!("{warnings} warning(s)");
                self.log.record(&name, BuildStatus::Warned, Some(&msg));
                Ok(warnings)
            }
            Err(e) => {
                self.log.record(&name, BuildStatus::Failed, None);
                Err(e)
            }
        }
    }

    fn build_and_deploy(&self, path: &Path) -> Result<(Option<String>, usize), BuildError> {
        let resolved = self.ctx.resolve(path);
        let manifest = Manifest::load(&resolved, &self.ctx.root)?;
        let artifacts = self.build_assets(&manifest)?;
        let warnings = deploy::deploy(self.ctx, &manifest, &artifacts, self.log)?;
        let kinds = (!artifacts.is_empty()).then(|| {
            artifacts
                .iter()
                .map(|a| a.kind.ext())
                .collect::<Vec<_>>()
                .join(", ")
        });
        Ok((kinds, warnings))
    }

    /// Produce the stage artifacts for every asset kind the manifest lists.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read, a tool fails, or a stage
    /// file cannot be written.
    pub fn build_assets(&self, manifest: &Manifest) -> Result<Vec<Artifacts>, BuildError> {
        let mut built = Vec::new();
        for kind in AssetKind::ALL {
            let sources = manifest.sources(kind);
            if sources.is_empty() {
                continue;
            }
            built.push(self.build_kind(&manifest.name, kind, &sources)?);
        }
        Ok(built)
    }

    fn build_kind(
        &self,
        name: &str,
        kind: AssetKind,
        sources: &[&Path],
    ) -> Result<Artifacts, BuildError> {
        let ext = kind.ext();
        self.log.info(&format!("{name}: {} {ext} file(s)", sources.len()));

        let concat = self.ctx.workspace.join(format!("{name}-concat.{ext}"));
        let resolved: Vec<PathBuf> = sources.iter().map(|s| self.ctx.resolve(s)).collect();
        concatenate(&resolved, &concat)?;

        let raw = self.ctx.stage_artifact(name, &format!("raw.{ext}"));
        fs::copy(&concat, &raw)
            .io_context(|| format!("copying {} to {}", concat.display(), raw.display()))?;
        self.log.debug(&format!("wrote {}", raw.display()));

        let minified = self.ctx.stage_artifact(name, &format!("min.{ext}"));

        if !self.ctx.compress {
            move_file(&concat, &minified)?;
            self.log.debug(&format!("compression off, {} is uncompressed", minified.display()));
            return Ok(Artifacts {
                kind,
                raw,
                minified,
                packed: None,
            });
        }

        let log = self.ctx.stage_artifact(name, &format!("ug_{ext}.log"));
        self.log.info(&format!("{name}: minifying {ext}"));
        self.tools.minify(kind, &raw, &minified, &log)?;

        let packed = if kind == AssetKind::Js {
            let out = self.ctx.stage_artifact(name, "sp.js");
            self.log.info(&format!("{name}: packing js"));
            self.tools.pack(
                &minified,
                &out,
                &self.ctx.stage_artifact(name, "sp.log"),
                &self.ctx.stage_artifact(name, "sp.diag"),
            )?;
            Some(out)
        } else {
            None
        };

        Ok(Artifacts {
            kind,
            raw,
            minified,
            packed,
        })
    }
}

/// Append `sources` byte for byte to `dest`, creating it on the first write.
///
/// # Errors
///
/// Returns an error if a source cannot be read or `dest` cannot be written.
pub fn concatenate(sources: &[PathBuf], dest: &Path) -> Result<(), BuildError> {
    let mut out: Option<File> = None;
    for source in sources {
        let mut input =
            File::open(source).io_context(|| format!("reading {}", source.display()))?;
        if out.is_none() {
            out = Some(File::create(dest).io_context(|| format!("creating {}", dest.display()))?);
        }
        if let Some(file) = out.as_mut() {
            io::copy(&mut input, file).io_context(|| {
                format!("appending {} to {}", source.display(), dest.display())
            })?;
        }
    }
    Ok(())
}
