use crate::hash::sha256_file;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Creates the destination's parent directory, then moves `source` there.
pub fn place_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "could not create destination directory: {}",
                parent.display()
            )
        })?;
    }
    move_file(source, destination)
}

/// Renames `source` to `destination`, falling back to copy-verify-delete when
/// the two live on different devices.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device(&err) => move_cross_device(source, destination),
        Err(err) => Err(anyhow::Error::from(err).context(format!(
            "could not rename {} -> {}",
            source.display(),
            destination.display()
        ))),
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

fn move_cross_device(source: &Path, destination: &Path) -> Result<()> {
    move_cross_device_with(source, destination, |path| fs::remove_file(path))
}

/// Copy-verify-delete. On any failure the destination is removed again so
/// only the source remains.
fn move_cross_device_with<F>(source: &Path, destination: &Path, remove_source: F) -> Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    if let Err(err) = copy_and_verify(source, destination) {
        return Err(discard_copy(destination, err));
    }

    if let Err(err) = remove_source(source) {
        let err = anyhow::Error::from(err).context(format!(
            "copied to {} but could not remove source: {}",
            destination.display(),
            source.display()
        ));
        return Err(discard_copy(destination, err));
    }
    Ok(())
}

fn discard_copy(destination: &Path, err: anyhow::Error) -> anyhow::Error {
    if !destination.exists() {
        return err;
    }
    match fs::remove_file(destination) {
        Ok(()) => err,
        Err(cleanup_err) => err.context(format!(
            "copy could not be removed: {}: {cleanup_err}",
            destination.display()
        )),
    }
}

fn copy_and_verify(source: &Path, destination: &Path) -> Result<()> {
    // fs::copy carries the permission bits over
    let copied = fs::copy(source, destination).with_context(|| {
        format!(
            "copy failed: {} -> {}",
            source.display(),
            destination.display()
        )
    })?;

    let source_meta = fs::metadata(source)
        .with_context(|| format!("could not stat source: {}", source.display()))?;
    fs::set_permissions(destination, source_meta.permissions()).with_context(|| {
        format!(
            "could not set permissions on destination: {}",
            destination.display()
        )
    })?;

    if copied != source_meta.len() {
        bail!(
            "copy of {} is {copied} bytes, expected {}",
            source.display(),
            source_meta.len()
        );
    }

    let source_sum = sha256_file(source)
        .with_context(|| format!("could not checksum source: {}", source.display()))?;
    let destination_sum = sha256_file(destination)
        .with_context(|| format!("could not checksum copy: {}", destination.display()))?;
    if source_sum != destination_sum {
        bail!(
            "checksum mismatch after copying {} -> {}",
            source.display(),
            destination.display()
        );
    }

    Ok(())
}
