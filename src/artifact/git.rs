// ABOUTME: Resolves a git URL and ref to a checked-out tree or a commit hash.
// ABOUTME: Drives the git binary with shallow single-ref fetches, heads before tags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::process::Command;

use super::location::redact_location;

/// Ref used when the location carries no `#fragment`.
pub const DEFAULT_REFERENCE: &str = "master";

/// Errors from git resolution.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// The ref exists neither as a branch nor as a tag.
    #[error("reference '{reference}' not found (tried {})", .tried.join(", "))]
    ReferenceNotFound {
        reference: String,
        tried: Vec<String>,
    },

    /// A git command exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The location could not be parsed as a git URL.
    #[error("invalid git url '{0}'")]
    InvalidUrl(String),

    /// Spawning git or touching the work directory failed.
    #[error("git I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Basic-auth credentials taken from the userinfo part of the URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A git location split into its fetchable URL, ref, and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    /// Repository URL with userinfo and fragment removed.
    pub url: String,
    /// Branch, tag, or full commit hash.
    pub reference: String,
    pub credentials: Option<Credentials>,
}

impl GitSource {
    /// Parse `scheme://[user:pass@]host/path.git[#ref]`.
    pub fn parse(location: &str) -> Result<Self, GitError> {
        let mut url =
            url::Url::parse(location).map_err(|_| GitError::InvalidUrl(redact_location(location)))?;

        let reference = match url.fragment() {
            Some(fragment) if !fragment.is_empty() => fragment.to_string(),
            _ => DEFAULT_REFERENCE.to_string(),
        };

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some(Credentials {
                username: url.username().to_string(),
                password: url.password().unwrap_or_default().to_string(),
            })
        };

        url.set_fragment(None);
        // Only fails for URLs that cannot carry userinfo, which never had any.
        let _ = url.set_username("");
        let _ = url.set_password(None);

        Ok(Self {
            url: url.to_string(),
            reference,
            credentials,
        })
    }

    /// True when the ref is a full 40-hex commit hash.
    pub fn is_commit_hash(&self) -> bool {
        is_commit_hash(&self.reference)
    }
}

/// True for a full 40-character hexadecimal commit hash.
pub fn is_commit_hash(reference: &str) -> bool {
    reference.len() == 40 && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Namespace a symbolic ref is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Heads,
    Tags,
}

impl RefKind {
    /// Lookup order for symbolic refs.
    pub const SEARCH_ORDER: [RefKind; 2] = [RefKind::Heads, RefKind::Tags];

    /// Fully qualified ref name for `name`.
    pub fn qualify(&self, name: &str) -> String {
        match self {
            RefKind::Heads => format!("refs/heads/{}", name),
            RefKind::Tags => format!("refs/tags/{}", name),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    /// Fully qualified ref that matched, or the hash itself.
    pub reference: String,
    /// Commit the ref points at.
    pub commit: String,
}

/// Runs git against a remote to materialize or inspect a ref.
#[derive(Debug, Clone)]
pub struct GitResolver {
    git_binary: PathBuf,
    skip_ssl_validation: bool,
}

impl Default for GitResolver {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            skip_ssl_validation: false,
        }
    }
}

impl GitResolver {
    pub fn new(skip_ssl_validation: bool) -> Self {
        Self {
            skip_ssl_validation,
            ..Self::default()
        }
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_git_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_binary = path.into();
        self
    }

    /// Check out `source` into `dir`, which must exist and be empty.
    ///
    /// A commit hash is checked out from a full clone. A symbolic ref is
    /// fetched at depth 1 as a branch first, then as a tag; the directory is
    /// wiped between attempts.
    pub async fn checkout(&self, source: &GitSource, dir: &Path) -> Result<ResolvedRef, GitError> {
        if source.is_commit_hash() {
            tracing::debug!(url = %source.url, commit = %source.reference, "cloning at commit");
            self.run(source, None, &["clone", "--quiet", "--no-checkout", &source.url])
                .arg_path(dir)
                .output()
                .await?;
            self.run(source, Some(dir), &["checkout", "--quiet", "--force", &source.reference])
                .output()
                .await?;
            return Ok(ResolvedRef {
                reference: source.reference.clone(),
                commit: source.reference.clone(),
            });
        }

        let resolved = self.fetch_symbolic(source, dir).await?;
        self.run(source, Some(dir), &["checkout", "--quiet", "--force", "FETCH_HEAD"])
            .output()
            .await?;
        Ok(resolved)
    }

    /// Commit hash at the head of `source`'s ref.
    ///
    /// A commit hash ref is returned as given without contacting the remote.
    pub async fn head_commit(&self, source: &GitSource) -> Result<String, GitError> {
        if source.is_commit_hash() {
            return Ok(source.reference.clone());
        }

        let dir = tempfile::Builder::new().prefix("git-resolve-").tempdir()?;
        let resolved = self.fetch_symbolic(source, dir.path()).await?;
        Ok(resolved.commit)
    }

    async fn fetch_symbolic(
        &self,
        source: &GitSource,
        dir: &Path,
    ) -> Result<ResolvedRef, GitError> {
        let name = source.reference.to_ascii_lowercase();
        let mut tried = Vec::new();

        for kind in RefKind::SEARCH_ORDER {
            let refname = kind.qualify(&name);
            tracing::debug!(url = %source.url, reference = %refname, "fetching ref");

            self.run(source, None, &["init", "--quiet"])
                .arg_path(dir)
                .output()
                .await?;
            let fetched = self
                .run(
                    source,
                    Some(dir),
                    &["fetch", "--quiet", "--depth", "1", &source.url, &refname],
                )
                .output()
                .await;

            match fetched {
                Ok(_) => {
                    let commit = self
                        .run(source, Some(dir), &["rev-parse", "FETCH_HEAD^{commit}"])
                        .output()
                        .await?;
                    return Ok(ResolvedRef {
                        reference: refname,
                        commit: commit.trim().to_string(),
                    });
                }
                Err(e) if is_missing_ref(&e) => {
                    tracing::debug!(reference = %refname, "ref not found, trying next kind");
                    tried.push(refname);
                    reset_dir(dir).await?;
                }
                Err(e) => return Err(e),
            }
        }

        Err(GitError::ReferenceNotFound {
            reference: source.reference.clone(),
            tried,
        })
    }

    fn run(&self, source: &GitSource, dir: Option<&Path>, args: &[&str]) -> GitCommand {
        let mut cmd = Command::new(&self.git_binary);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if self.skip_ssl_validation {
            cmd.env("GIT_SSL_NO_VERIFY", "1");
        }
        if let Some(creds) = &source.credentials {
            let token = STANDARD.encode(format!("{}:{}", creds.username, creds.password));
            cmd.env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                .env("GIT_CONFIG_VALUE_0", format!("Authorization: Basic {}", token));
        }

        GitCommand {
            label: args.first().copied().unwrap_or_default().to_string(),
            inner: cmd,
        }
    }
}

/// A prepared git invocation that maps failure exits to [`GitError`].
struct GitCommand {
    label: String,
    inner: Command,
}

impl GitCommand {
    fn arg_path(mut self, path: &Path) -> Self {
        self.inner.arg(path);
        self
    }

    async fn output(mut self) -> Result<String, GitError> {
        let output = self.inner.output().await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: self.label,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn is_missing_ref(err: &GitError) -> bool {
    match err {
        GitError::CommandFailed { stderr, .. } => {
            let stderr = stderr.to_ascii_lowercase();
            stderr.contains("couldn't find remote ref") || stderr.contains("could not find remote ref")
        }
        _ => false,
    }
}

async fn reset_dir(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::create_dir_all(dir).await
}
