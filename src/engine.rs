//! Pipeline orchestration and file processing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::binarize;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::filter::{self, ClassifiedRegion};
use crate::morphology::{self, StructuringElement};
use crate::regions::{self, Region};
use crate::removal;

/// Artifact title of the binary mask.
pub const THRESHOLDED: &str = "thresholded";
/// Artifact title of the dilated mask.
pub const MORPHED: &str = "morphed";
/// Artifact title of the all-regions overlay.
pub const CONTOUR: &str = "contour";
/// Artifact title of the border-artifact outlines.
pub const FILTERED: &str = "filtered-top-bottom-contours";
/// Artifact title of the cleaned image.
pub const FIXED: &str = "fixed";

const ARTIFACT_TITLES: [&str; 5] = [THRESHOLDED, MORPHED, CONTOUR, FILTERED, FIXED];

/// Options controlling where and what gets written.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Directory for all written files. `None` means the current directory.
    pub output_dir: Option<PathBuf>,
    /// Write the intermediate images alongside the cleaned one.
    pub diagnostics: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            diagnostics: true,
        }
    }
}

impl ProcessOptions {
    fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(Path::new("."))
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Grayscale source.
    pub gray: GrayImage,
    /// Adaptive threshold mask.
    pub thresholded: GrayImage,
    /// Mask after dilation.
    pub morphed: GrayImage,
    /// Every extracted region with its decision.
    pub regions: Vec<ClassifiedRegion>,
    /// Grayscale source with border artifacts erased.
    pub cleaned: GrayImage,
}

impl PipelineOutput {
    /// Regions classified as border artifacts.
    pub fn artifacts(&self) -> impl Iterator<Item = &Region> {
        self.regions
            .iter()
            .filter(|c| c.is_artifact)
            .map(|c| &c.region)
    }

    /// Number of regions classified as border artifacts.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.artifacts().count()
    }

    /// Grayscale source with every region outlined.
    #[must_use]
    pub fn contour_overlay(&self) -> RgbImage {
        removal::contour_overlay(&self.gray, self.regions.iter().map(|c| &c.region))
    }

    /// Border-artifact outlines on a black canvas.
    #[must_use]
    pub fn artifact_outlines(&self) -> RgbImage {
        removal::artifact_outlines(self.gray.width(), self.gray.height(), self.artifacts())
    }
}

/// Summary of one processed file.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    /// The input file.
    pub input: PathBuf,
    /// Path of the cleaned image.
    pub cleaned: PathBuf,
    /// Every file written, cleaned image last.
    pub written: Vec<PathBuf>,
    /// Number of regions extracted.
    pub regions: usize,
    /// Number of regions erased.
    pub artifacts: usize,
}

/// Outcome of one file in a directory run.
#[derive(Debug)]
pub struct ProcessResult {
    /// The input file.
    pub path: PathBuf,
    /// Report on success, or the error that stopped this file.
    pub outcome: Result<ProcessReport>,
}

/// The border-artifact remover.
///
/// Validated configuration plus the prebuilt structuring element. It holds
/// no per-run state, so one remover can be shared across threads.
#[derive(Debug, Clone)]
pub struct ArtifactRemover {
    config: PipelineConfig,
    element: StructuringElement,
}

impl ArtifactRemover {
    /// Create a remover from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any parameter is out of range.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let element = StructuringElement::ellipse(config.dilate_x, config.dilate_y);
        Ok(Self { config, element })
    }

    /// The configuration this remover was built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Binarize a grayscale image; ink becomes foreground.
    #[must_use]
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        binarize::adaptive_threshold(gray, self.config.block_size, self.config.offset)
    }

    /// Dilate a mask with the configured ellipse.
    #[must_use]
    pub fn merge(&self, mask: &GrayImage) -> GrayImage {
        morphology::dilate(mask, &self.element)
    }

    /// Run the full pipeline on a decoded image.
    #[must_use]
    pub fn run(&self, image: &DynamicImage) -> PipelineOutput {
        self.clean(&binarize::to_grayscale(image))
    }

    /// Run the full pipeline on a grayscale image.
    #[must_use]
    pub fn clean(&self, gray: &GrayImage) -> PipelineOutput {
        let thresholded = self.binarize(gray);
        let morphed = self.merge(&thresholded);

        let extracted = regions::extract_regions(&morphed);
        let regions = filter::classify(extracted, gray.height(), self.config.y_threshold);

        let cleaned = removal::erase_regions(
            gray,
            regions.iter().filter(|c| c.is_artifact).map(|c| &c.region),
        );

        let output = PipelineOutput {
            gray: gray.clone(),
            thresholded,
            morphed,
            regions,
            cleaned,
        };
        debug!(
            width = gray.width(),
            height = gray.height(),
            regions = output.regions.len(),
            artifacts = output.artifact_count(),
            "pipeline finished"
        );
        output
    }

    /// Process a single file: read, decode, clean, write.
    ///
    /// Writes `<stem>-fixed.png` into the output directory, preceded by the
    /// diagnostic images when [`ProcessOptions::diagnostics`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the input cannot be read or an output cannot
    /// be written, [`Error::Decode`] if the input is not an image, and
    /// [`Error::Encode`] if PNG encoding fails. Any failure aborts the file.
    pub fn process_file(&self, input: &Path, opts: &ProcessOptions) -> Result<ProcessReport> {
        let bytes = std::fs::read(input).map_err(|source| Error::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| Error::Decode {
            path: input.to_path_buf(),
            source,
        })?;
        drop(bytes);

        let output = self.run(&image);
        drop(image);

        let out_dir = opts.output_dir();
        if !out_dir.exists() {
            std::fs::create_dir_all(out_dir).map_err(|source| Error::Io {
                path: out_dir.to_path_buf(),
                source,
            })?;
        }

        let mut written = Vec::new();
        if opts.diagnostics {
            let thresholded = artifact_path(input, out_dir, THRESHOLDED);
            save_png(&DynamicImage::ImageLuma8(output.thresholded.clone()), &thresholded)?;
            written.push(thresholded);

            let morphed = artifact_path(input, out_dir, MORPHED);
            save_png(&DynamicImage::ImageLuma8(output.morphed.clone()), &morphed)?;
            written.push(morphed);

            let contour = artifact_path(input, out_dir, CONTOUR);
            save_png(&DynamicImage::ImageRgb8(output.contour_overlay()), &contour)?;
            written.push(contour);

            let filtered = artifact_path(input, out_dir, FILTERED);
            save_png(&DynamicImage::ImageRgb8(output.artifact_outlines()), &filtered)?;
            written.push(filtered);
        }

        let artifacts = output.artifact_count();
        let regions = output.regions.len();
        let cleaned = artifact_path(input, out_dir, FIXED);
        save_png(&DynamicImage::ImageLuma8(output.cleaned), &cleaned)?;
        written.push(cleaned.clone());

        info!(
            input = %input.display(),
            regions,
            artifacts,
            "cleaned image written to {}",
            cleaned.display()
        );

        Ok(ProcessReport {
            input: input.to_path_buf(),
            cleaned,
            written,
            regions,
            artifacts,
        })
    }

    /// Process every supported image in a directory.
    ///
    /// A file such as `page-fixed.png` is skipped as this tool's own output
    /// when `page.<ext>` sits next to it. Inputs whose stems collide would
    /// overwrite each other's artifacts, so each of them gets an
    /// [`Error::OutputConflict`] result instead of being processed. Uses
    /// parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image attempted.
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, opts: &ProcessOptions) -> Vec<ProcessResult> {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(source) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    outcome: Err(Error::Io {
                        path: input_dir.to_path_buf(),
                        source,
                    }),
                }];
            }
        };
        files.sort();

        let stems: HashSet<String> = files.iter().map(|p| file_stem(p)).collect();
        files.retain(|p| match artifact_source_stem(p) {
            Some(source) if stems.contains(&source) => {
                warn!(path = %p.display(), "skipping previous output");
                false
            }
            _ => true,
        });

        let mut stem_counts: HashMap<String, usize> = HashMap::new();
        for p in &files {
            *stem_counts.entry(file_stem(p)).or_default() += 1;
        }
        let (entries, conflicting): (Vec<PathBuf>, Vec<PathBuf>) = files
            .into_iter()
            .partition(|p| stem_counts.get(&file_stem(p)).copied().unwrap_or(0) == 1);

        let mut results: Vec<ProcessResult> = conflicting
            .into_iter()
            .map(|path| {
                let stem = file_stem(&path);
                warn!(path = %path.display(), stem = %stem, "inputs share an output name");
                ProcessResult {
                    outcome: Err(Error::OutputConflict {
                        path: path.clone(),
                        stem,
                    }),
                    path,
                }
            })
            .collect();

        debug!(dir = %input_dir.display(), files = entries.len(), "processing directory");

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            let processed: Vec<ProcessResult> = entries
                .par_iter()
                .map(|path| ProcessResult {
                    path: path.clone(),
                    outcome: self.process_file(path, opts),
                })
                .collect();
            results.extend(processed);
        }

        #[cfg(not(feature = "cli"))]
        {
            results.extend(entries.iter().map(|path| ProcessResult {
                path: path.clone(),
                outcome: self.process_file(path, opts),
            }));
        }

        results
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tif" | "tiff" | "gif"
        ),
        None => false,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// The input stem a file would have been written for, if its name carries
/// one of the artifact suffixes: `page-fixed.png` gives `page`.
fn artifact_source_stem(path: &Path) -> Option<String> {
    let stem = file_stem(path);
    ARTIFACT_TITLES
        .iter()
        .find_map(|title| stem.strip_suffix(&format!("-{title}")).map(str::to_owned))
}

/// Build the path of an output artifact.
///
/// Example: `("scans/page.jpg", "out", "fixed")` becomes `"out/page-fixed.png"`.
#[must_use]
pub fn artifact_path(input: &Path, output_dir: &Path, title: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    output_dir.join(format!("{stem}-{title}.png"))
}

/// Encode an image as PNG.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created and
/// [`Error::Encode`] if encoding fails.
pub fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = std::io::BufWriter::new(file);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })
}
