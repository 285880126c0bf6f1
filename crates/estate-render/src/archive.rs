//! Carousel slide archive.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{RenderError, RenderResult};

/// Name of the n-th slide (1-based) inside the archive.
pub fn archive_entry_name(n: usize) -> String {
    format!("karuzela-slide-{}.png", n)
}

/// Write the stills into a zip archive at `dest`, in order.
pub fn write_archive(stills: &[PathBuf], dest: &Path) -> RenderResult<()> {
    let mut zip = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default();

    for (i, still) in stills.iter().enumerate() {
        zip.start_file(archive_entry_name(i + 1), options)?;
        let mut source = File::open(still)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

/// Archive the stills on the blocking pool.
pub async fn archive_stills(stills: Vec<PathBuf>, dest: PathBuf) -> RenderResult<()> {
    tokio::task::spawn_blocking(move || write_archive(&stills, &dest))
        .await
        .map_err(|e| RenderError::internal(format!("archive task failed: {}", e)))?
}
