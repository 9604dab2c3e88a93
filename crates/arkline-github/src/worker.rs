//! Per-unit archival: extract, package, fingerprint, upload

use anyhow::{Context, Result};
use arkline_store::{repo_key, RunStamp, Uploader};
use indicatif::ProgressBar;

use crate::api::RepoUnit;
use crate::config::Config;
use crate::{archive, clone};

/// Archive one repository end-to-end. Returns the object key and bytes
/// written.
///
/// All intermediate state lives in a scoped temporary directory that is
/// removed on every exit path — success, failure, or unwind.
pub fn archive_repo(
    unit: &RepoUnit,
    config: &Config,
    stamp: &RunStamp,
    uploader: &Uploader,
    pb: &ProgressBar,
) -> Result<(String, u64)> {
    let tmp = tempfile::Builder::new()
        .prefix("arkline-")
        .tempdir()
        .context("cannot create scratch directory")?;

    let clone_dir = format!("{}-{}-{}", stamp.compact(), unit.owner, unit.name);

    pb.set_message("cloning...");
    clone::clone_repo(&config.git_bin, tmp.path(), &clone_dir, unit, &config.token)
        .with_context(|| format!("clone {}", unit.full_name))?;

    pb.set_message("packing...");
    let archive_name = format!("{clone_dir}.tar.gz");
    archive::pack_dir(&config.tar_bin, tmp.path(), &archive_name, &clone_dir)
        .with_context(|| format!("pack {}", unit.full_name))?;

    let archive_path = tmp.path().join(&archive_name);
    let digest = arkline_store::hash_file(&archive_path)
        .with_context(|| format!("fingerprint {}", unit.full_name))?;
    let key = repo_key(&unit.owner, &unit.name, stamp, &digest);

    if let Ok(meta) = std::fs::metadata(&archive_path) {
        arkline_core::upgrade_to_bar(pb, meta.len());
    }
    pb.set_message("uploading...");
    let written = uploader
        .put_file(&key, &archive_path)
        .with_context(|| format!("upload {}", unit.full_name))?;

    Ok((key, written))
}
