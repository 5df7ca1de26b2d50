//! CLI for mirroring a GitHub organization.

use anyhow::{Context, Result};
use clap::Parser;
use org_mirror::github::DEFAULT_API_URL;
use org_mirror::logging::{format_error, init_logger};
use org_mirror::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "org-mirror")]
#[command(author, version, long_about = None)]
#[command(about = "Clone or update every repository of a GitHub organization")]
struct Cli {
    /// Your GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Name of the GitHub organization
    #[arg(long, visible_alias = "orga")]
    org: Option<String>,

    /// Destination folder
    #[arg(long, visible_alias = "dest")]
    destination: Option<PathBuf>,

    /// Replacement for github.com in SSH URLs, e.g. if you use multiple SSH keys for GitHub
    #[arg(long)]
    host: Option<String>,

    /// Fail if git clone/git pull fail. Continues by default
    #[arg(long)]
    fail_on_error: bool,

    /// GitHub API base URL, for GitHub Enterprise
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Private key to use instead of ssh-agent
    #[arg(long, value_name = "PATH")]
    ssh_key: Option<PathBuf>,

    /// Passphrase of --ssh-key, ignored without it
    #[arg(long)]
    ssh_passphrase: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> SyncConfig {
        let auth = match self.ssh_key {
            Some(path) => {
                let auth = GitAuth::ssh_key(path);
                match self.ssh_passphrase {
                    Some(passphrase) => auth.with_passphrase(passphrase),
                    None => auth,
                }
            }
            None => GitAuth::Agent,
        };

        SyncConfig::new(
            self.token.unwrap_or_default(),
            self.org.unwrap_or_default(),
            self.destination.unwrap_or_default(),
        )
        .with_host_override(self.host.unwrap_or_default())
        .fail_fast(self.fail_on_error)
        .with_api_url(self.api_url)
        .with_auth(auth)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = cli.into_config();
    let client = GitHubClient::with_enterprise(config.token(), config.api_url());
    let result = mirror(&config, &client, &mut io::stdout().lock());
    ExitCode::from(exit_status(&result))
}

/// List the organization's repositories from `source` and sync them,
/// writing progress to `out`.
fn mirror<S, W>(config: &SyncConfig, source: &S, out: &mut W) -> Result<SyncReport>
where
    S: RepoSource + ?Sized,
    W: Write,
{
    config.validate()?;
    tracing::debug!(?config, "starting");

    let repos = list_repositories(source, config.organization(), config.host_override())?;

    let report = SyncDriver::new(config)
        .run(&repos, out)
        .with_context(|| format!("Mirroring into {}", config.destination().display()))?;

    if report.failed() > 0 {
        writeln!(
            out,
            "Done: {} synced, {} failed",
            report.succeeded(),
            report.failed()
        )?;
    }

    Ok(report)
}

/// Process exit status for a run, printing the error that ended it.
///
/// Repository failures that did not stop the run still exit 0.
fn exit_status(result: &Result<SyncReport>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("{}", format_error(&format!("{:#}", e)));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use git2::{Repository, Signature};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Serves a fixed list of repositories, or fails like an unreachable API.
    struct FakeOrg {
        repos: Vec<GitHubRepo>,
        fail: bool,
    }

    impl RepoSource for FakeOrg {
        fn org_repos_page(&self, _org: &str, _page: u32) -> org_mirror::Result<RepoPage> {
            if self.fail {
                return Err(MirrorError::GitHub {
                    message: "API request failed (401 Unauthorized)".into(),
                });
            }
            Ok(RepoPage {
                repos: self.repos.clone(),
                next: None,
            })
        }
    }

    /// Create a local upstream with one commit and return its record.
    fn upstream(dir: &Path, name: &str) -> GitHubRepo {
        let path = dir.join("upstream").join(name);
        let repo = Repository::init(&path).unwrap();
        fs::write(path.join("README.md"), "hello\n").unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Ada Lovelace", "ada@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "Initial commit", &tree, &[])
            .unwrap();

        GitHubRepo {
            name: name.into(),
            ssh_url: path.to_str().unwrap().into(),
        }
    }

    fn missing(dir: &Path, name: &str) -> GitHubRepo {
        GitHubRepo {
            name: name.into(),
            ssh_url: dir.join("missing").join(name).to_str().unwrap().into(),
        }
    }

    fn run_with(config: &SyncConfig, org: &FakeOrg) -> (u8, String) {
        let mut out = Vec::new();
        let status = exit_status(&mirror(config, org, &mut out));
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_short_aliases() {
        let cli = Cli::try_parse_from([
            "org-mirror",
            "--token",
            "ghp_x",
            "--orga",
            "acme",
            "--dest",
            "/srv/mirror",
        ])
        .unwrap();

        let config = cli.into_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.organization(), "acme");
        assert_eq!(config.destination(), std::path::Path::new("/srv/mirror"));
        assert!(!config.is_fail_fast());
        assert_eq!(config.host_override(), None);
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "org-mirror",
            "--token=ghp_x",
            "--org=acme",
            "--destination=out",
            "--host=github-work",
            "--fail-on-error",
        ])
        .unwrap();

        let config = cli.into_config();
        assert!(config.is_fail_fast());
        assert_eq!(config.host_override(), Some("github-work"));
    }

    #[test]
    fn test_missing_org_fails_validation() {
        let cli = Cli::try_parse_from(["org-mirror", "--token", "ghp_x", "--dest", "out"]).unwrap();
        let err = cli.into_config().validate().unwrap_err();
        assert!(matches!(err, MirrorError::Config(_)));
    }

    #[test]
    fn test_passphrase_applies_to_key() {
        let cli = Cli::try_parse_from([
            "org-mirror",
            "--ssh-key",
            "/keys/id_work",
            "--ssh-passphrase",
            "p",
        ])
        .unwrap();
        let config = cli.into_config();
        assert!(matches!(
            config.auth(),
            GitAuth::SshKey { passphrase: Some(p), .. } if p == "p"
        ));
    }

    #[test]
    fn test_passphrase_without_key_is_ignored() {
        let cli = Cli::try_parse_from(["org-mirror", "--ssh-passphrase", "p"]).unwrap();
        assert!(matches!(cli.into_config().auth(), GitAuth::Agent));

        // Nothing in the environment may turn a plain run into a usage error.
        let command = Cli::command();
        let passphrase = command
            .get_arguments()
            .find(|arg| arg.get_id() == "ssh_passphrase")
            .unwrap();
        assert!(passphrase.get_env().is_none());
    }

    #[test]
    fn test_partial_failure_exits_zero() {
        let dir = TempDir::new().unwrap();
        let org = FakeOrg {
            repos: vec![missing(dir.path(), "broken"), upstream(dir.path(), "alpha")],
            fail: false,
        };
        let config = SyncConfig::new("t", "acme", dir.path().join("mirror"));

        let (status, output) = run_with(&config, &org);

        assert_eq!(status, 0);
        assert!(output.contains("error: Clone failed for broken"));
        assert!(output.contains("Done: 1 synced, 1 failed"));
        assert!(dir.path().join("mirror/alpha/README.md").exists());
    }

    #[test]
    fn test_fail_fast_exits_one() {
        let dir = TempDir::new().unwrap();
        let org = FakeOrg {
            repos: vec![missing(dir.path(), "broken"), upstream(dir.path(), "alpha")],
            fail: false,
        };
        let config = SyncConfig::new("t", "acme", dir.path().join("mirror")).fail_fast(true);

        let (status, output) = run_with(&config, &org);

        assert_eq!(status, 1);
        assert!(!output.contains("Done:"));
        assert!(!dir.path().join("mirror/alpha").exists());
    }

    #[test]
    fn test_listing_failure_exits_one() {
        let dir = TempDir::new().unwrap();
        let org = FakeOrg {
            repos: Vec::new(),
            fail: true,
        };
        let config = SyncConfig::new("t", "acme", dir.path().join("mirror"));

        let (status, output) = run_with(&config, &org);

        assert_eq!(status, 1);
        assert!(output.is_empty());
        assert!(!dir.path().join("mirror").exists());
    }

    #[test]
    fn test_invalid_config_exits_one_before_listing() {
        let org = FakeOrg {
            repos: Vec::new(),
            fail: true,
        };
        let config = SyncConfig::new("", "acme", "out");

        let mut out = Vec::new();
        let result = mirror(&config, &org, &mut out);
        assert!(matches!(
            result.as_ref().unwrap_err().downcast_ref::<MirrorError>(),
            Some(MirrorError::Config(_))
        ));
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn test_clean_run_exits_zero_without_summary() {
        let dir = TempDir::new().unwrap();
        let org = FakeOrg {
            repos: vec![upstream(dir.path(), "alpha")],
            fail: false,
        };
        let config = SyncConfig::new("t", "acme", dir.path().join("mirror"));

        let (status, output) = run_with(&config, &org);

        assert_eq!(status, 0);
        assert!(output.starts_with("Found 1 repositories."));
        assert!(!output.contains("Done:"));
    }
}
