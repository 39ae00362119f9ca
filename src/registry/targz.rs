use crate::error::{Error, Result};
use flate2::{write::GzEncoder, Compression};
use std::fs::{self, File};
use std::path::Path;
use tar::{Builder, Header};

/// Write `out` as a gzip'd tarball holding `file` under its base name.
pub fn tar_gz_single_file(out: &Path, file: &Path) -> Result<()> {
    let body = fs::read(file).map_err(|e| Error::io(file, e))?;
    let name = file
        .file_name()
        .ok_or_else(|| Error::NotFound(format!("{} has no file name", file.display())))?;

    let target = File::create(out).map_err(|e| Error::io(out, e))?;
    let mut builder = Builder::new(GzEncoder::new(target, Compression::default()));
    let mut header = Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, name, body.as_slice())
        .map_err(|e| Error::io(out, e))?;
    builder
        .into_inner()
        .and_then(|gz| gz.finish())
        .map_err(|e| Error::io(out, e))?;
    Ok(())
}
