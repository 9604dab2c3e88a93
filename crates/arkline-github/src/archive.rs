//! Archive packaging via the tar tool

use std::path::Path;
use std::process::Command;

use arkline_core::{run_captured, CommandError};

/// Pack `dir_name` into `archive_name`, both relative to `work_dir`.
///
/// The directory name is the sole archive member, so the resulting file is
/// self-describing on extraction.
pub fn pack_dir(
    tar_bin: &str,
    work_dir: &Path,
    archive_name: &str,
    dir_name: &str,
) -> Result<(), CommandError> {
    run_captured(
        Command::new(tar_bin)
            .arg("czf")
            .arg(archive_name)
            .arg(dir_name)
            .current_dir(work_dir),
    )
}
