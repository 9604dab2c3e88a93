//! Dump process invocation
//!
//! The dump tool writes its gzip archive to stdout; its stderr passes
//! through to ours so operator-facing diagnostics stay visible during a
//! long unattended run.

use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};

use crate::config::DumpConfig;

/// Assemble the dump tool's argument list.
///
/// Extra flags come first so they cannot displace the archive/stream
/// arguments; exclusions go last.
pub fn build_args(config: &DumpConfig) -> Vec<String> {
    let target = &config.target;
    let mut args: Vec<String> = config.extra_flags.clone();
    args.push("--archive".to_string());
    args.push("--gzip".to_string());
    args.push(format!("--db={}", target.database));
    if let Some(username) = &target.username {
        args.push(format!("--username={username}"));
    }
    if let Some(password) = &target.password {
        args.push(format!("--password={password}"));
    }
    args.push(format!("--host={}", target.hosts.join(",")));
    for collection in &config.exclude_collections {
        args.push(format!("--excludeCollection={collection}"));
    }
    args
}

/// Command line with the credential blanked, safe for logging.
pub fn redacted_command(bin: &str, args: &[String]) -> String {
    let parts: Vec<&str> = args
        .iter()
        .map(|arg| {
            if arg.starts_with("--password=") {
                "--password=***"
            } else {
                arg.as_str()
            }
        })
        .collect();
    format!("$ {bin} {}", parts.join(" "))
}

/// Spawn the dump process with stdout piped.
pub fn spawn(config: &DumpConfig) -> Result<Child> {
    let args = build_args(config);
    log::info!("{}", redacted_command(&config.mongodump_bin, &args));
    Command::new(&config.mongodump_bin)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("cannot run {} (is it on PATH?)", config.mongodump_bin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MongoTarget;

    fn config() -> DumpConfig {
        DumpConfig {
            target: MongoTarget {
                hosts: vec!["db1:27017".to_string(), "db2:27017".to_string()],
                username: Some("backup".to_string()),
                password: Some("hunter2".to_string()),
                database: "orders".to_string(),
            },
            prefix: String::new(),
            mongodump_bin: "mongodump".to_string(),
            exclude_collections: vec!["sessions".to_string()],
            extra_flags: vec!["--ssl".to_string()],
        }
    }

    #[test]
    fn args_ordering() {
        let args = build_args(&config());
        assert_eq!(
            args,
            vec![
                "--ssl",
                "--archive",
                "--gzip",
                "--db=orders",
                "--username=backup",
                "--password=hunter2",
                "--host=db1:27017,db2:27017",
                "--excludeCollection=sessions",
            ]
        );
    }

    #[test]
    fn args_without_credentials() {
        let mut cfg = config();
        cfg.target.username = None;
        cfg.target.password = None;
        cfg.extra_flags.clear();
        cfg.exclude_collections.clear();
        let args = build_args(&cfg);
        assert_eq!(
            args,
            vec!["--archive", "--gzip", "--db=orders", "--host=db1:27017,db2:27017"]
        );
    }

    #[test]
    fn redacted_command_hides_password() {
        let cfg = config();
        let line = redacted_command(&cfg.mongodump_bin, &build_args(&cfg));
        assert!(!line.contains("hunter2"));
        assert!(line.contains("--password=***"));
        assert!(line.contains("--db=orders"));
    }
}
