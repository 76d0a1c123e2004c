//! Remove border-touching artifacts from scanned document images.
//!
//! Scanners leave dark blobs along the page edges: staple shadows, smudges,
//! the edge of the scanner lid. This crate finds connected dark regions that
//! touch (or nearly touch) the top or bottom border and paints their outline
//! white, leaving the page content alone.
//!
//! The pipeline:
//!
//! 1. **Binarize** with an inverted Gaussian adaptive threshold.
//! 2. **Merge** nearby ink with a wide, flat elliptical dilation.
//! 3. **Extract** the external contours of the merged mask.
//! 4. **Filter** regions whose bounding box lies within `y_threshold` of the
//!    top or bottom edge.
//! 5. **Remove** them by filling their contours on a copy of the grayscale
//!    image.
//!
//! # Quick Start
//!
//! ```no_run
//! use scan_artifact_removal::{ArtifactRemover, PipelineConfig};
//!
//! let remover = ArtifactRemover::new(PipelineConfig::default()).expect("valid config");
//! let img = image::open("scan.png").unwrap();
//! let output = remover.run(&img);
//! println!("erased {} of {} regions", output.artifact_count(), output.regions.len());
//! output.cleaned.save("scan-fixed.png").unwrap();
//! ```
//!
//! # Files
//!
//! [`ArtifactRemover::process_file`] also writes the intermediate images
//! (`-thresholded`, `-morphed`, `-contour`, `-filtered-top-bottom-contours`)
//! next to `-fixed.png` for inspection.
//!
//! ```no_run
//! use std::path::Path;
//! use scan_artifact_removal::{ArtifactRemover, PipelineConfig, ProcessOptions};
//!
//! let remover = ArtifactRemover::new(PipelineConfig::default()).expect("valid config");
//! let report = remover
//!     .process_file(Path::new("scan.jpg"), &ProcessOptions::default())
//!     .expect("processing failed");
//! println!("wrote {}", report.cleaned.display());
//! ```

#![deny(missing_docs)]

pub mod binarize;
mod config;
mod engine;
pub mod error;
pub mod filter;
pub mod morphology;
pub mod regions;
pub mod removal;

pub use config::{
    PipelineConfig, DEFAULT_BLOCK_SIZE, DEFAULT_DILATE_X, DEFAULT_DILATE_Y, DEFAULT_OFFSET,
    DEFAULT_Y_THRESHOLD, MAX_DILATE,
};
pub use engine::{
    artifact_path, is_supported_image, save_png, ArtifactRemover, PipelineOutput, ProcessOptions,
    ProcessReport, ProcessResult, CONTOUR, FILTERED, FIXED, MORPHED, THRESHOLDED,
};
pub use error::{Error, Result};
