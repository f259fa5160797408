//! Cache archives: tar streams compressed with zstd.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{IoContext, Result};

/// Bundle the contents of `src_dir` into `dest_archive`.
pub(crate) fn pack(src_dir: &Path, dest_archive: &Path) -> Result<()> {
    let file = File::create(dest_archive).io_context("creating archive", dest_archive)?;
    let writer = BufWriter::new(file);
    let zstd_encoder = zstd::stream::Encoder::new(writer, 3)?;
    let mut tar_builder = tar::Builder::new(zstd_encoder);

    // Libraries ship versioned symlinks (libz.so -> libz.so.1); keep them as links.
    tar_builder.follow_symlinks(false);

    tar_builder.append_dir_all(".", src_dir)?;
    tar_builder.finish()?;
    tar_builder.into_inner()?.finish()?;

    Ok(())
}

/// Extract `archive` into `dest_dir`, which is created if needed.
pub(crate) fn unpack(archive: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive).io_context("opening archive", archive)?;
    let decoder = zstd::stream::Decoder::new(BufReader::new(file))?;
    let mut tar = tar::Archive::new(decoder);
    tar.set_preserve_permissions(true);

    std::fs::create_dir_all(dest_dir)?;
    tar.unpack(dest_dir).io_context("extracting archive", archive)?;
    Ok(())
}
