//! Repos subcommand - fan-out archival of an organization

use anyhow::{Context, Result};
use arkline_core::{fmt_bytes, SharedProgress};
use arkline_store::Uploader;
use clap::Args;

use crate::config::{self, Config};

#[derive(Args, Debug)]
pub struct ReposArgs {
    /// Organization whose repositories are archived
    #[arg(short, long)]
    pub org: String,

    /// Destination bucket
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum number of repositories to archive
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,
}

pub fn run(args: ReposArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let token = config::require_env("GITHUB_ACCESS_TOKEN")?;
    // The store client reads these itself; fail early with a clear message
    // instead of mid-run on the first upload.
    config::require_env("AWS_ACCESS_KEY_ID")?;
    config::require_env("AWS_SECRET_ACCESS_KEY")?;

    let bucket = args
        .bucket
        .or_else(|| config.s3.bucket.clone())
        .context("no destination bucket (pass --bucket or set [s3] bucket)")?;
    let workers = args
        .workers
        .unwrap_or(config.workers.default)
        .min(config.workers.max)
        .max(1);

    log::info!("Archiving organization {}", args.org);
    log::info!("  Bucket: {bucket}");
    log::info!("  Workers: {workers}");

    let gh_config = arkline_github::Config {
        org: args.org.clone(),
        workers,
        limit: args.limit,
        git_bin: config.bins.git.clone(),
        tar_bin: config.bins.tar.clone(),
        api_url: config.github.api_url.clone(),
        token: token.clone(),
    };

    let source = arkline_github::GithubApi::new(&config.github.api_url, &args.org, &token);
    let uploader = Uploader::s3_from_env(&bucket)?;

    let summary = arkline_github::run(&gh_config, &source, &uploader, progress)?;

    super::print_summary(
        "Repositories",
        &[
            (
                "Archived",
                format!(
                    "{}/{} ({} failed)",
                    summary.archived, summary.enumerated, summary.failed
                ),
            ),
            ("Uploaded", fmt_bytes(summary.bytes)),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );

    if summary.failed > 0 {
        anyhow::bail!("{} repositories failed to archive", summary.failed);
    }

    Ok(())
}
