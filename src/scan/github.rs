//! GitHub repositories as skill sources.
//!
//! Read-only use of the REST API: repository metadata for the default branch,
//! branch to tree resolution, recursive tree listing, and the contents API for
//! directory listings and file bytes.

use std::io::Read;
use std::path::Path;

use base64::Engine as _;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::core::{CandidateLocator, DiscoveredCandidate, RemoteLocator, SourceKind, hash, manifest};
use crate::error::{RepoError, Result};
use crate::scan::{ScanReport, SourceOutcome};
use crate::utils::fs::ensure_dir;

const USER_AGENT: &str = concat!("skillrepo/", env!("CARGO_PKG_VERSION"));

/// Maximum size of a single downloaded file (10 MB).
const MAX_DOWNLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// A parsed repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub git_ref: Option<String>,
    pub subpath: Option<String>,
}

impl RepoRef {
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Parse `owner/repo[/sub/path][@ref]` or a github.com URL.
///
/// Accepted URL forms include `https://github.com/owner/repo.git` and
/// `https://github.com/owner/repo/tree/<ref>/<sub/path>`.
pub fn parse_repo_ref(input: &str) -> Result<RepoRef> {
    let invalid = || RepoError::InvalidInput(format!("invalid repository reference: {input}"));

    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let (is_url, rest) = match without_scheme
        .strip_prefix("github.com/")
        .or_else(|| without_scheme.strip_prefix("www.github.com/"))
    {
        Some(rest) => (true, rest),
        None if without_scheme.len() != trimmed.len() => return Err(invalid()),
        None => (false, without_scheme),
    };

    let (path, at_ref) = match rest.rsplit_once('@') {
        Some((path, git_ref)) => {
            let git_ref = git_ref.trim().trim_end_matches('/');
            if git_ref.is_empty() {
                return Err(invalid());
            }
            (path, Some(git_ref.to_string()))
        }
        None => (rest, None),
    };

    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let [owner, repo, tail @ ..] = parts.as_slice() else {
        return Err(invalid());
    };
    let repo = repo.trim_end_matches(".git");
    if !is_valid_name(owner) || !is_valid_name(repo) {
        return Err(invalid());
    }

    let (git_ref, sub) = match tail {
        [marker, url_ref, sub @ ..] if is_url && (*marker == "tree" || *marker == "blob") => {
            if at_ref.is_some() {
                return Err(invalid());
            }
            (Some((*url_ref).to_string()), sub)
        }
        [marker] if is_url && *marker == "tree" => return Err(invalid()),
        _ => (at_ref, tail),
    };

    if sub.iter().any(|segment| *segment == "..") {
        return Err(invalid());
    }
    let subpath = (!sub.is_empty()).then(|| sub.join("/"));

    Ok(RepoRef {
        owner: (*owner).to_string(),
        repo: repo.to_string(),
        git_ref,
        subpath,
    })
}

fn is_valid_name(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct BranchInfo {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    tree: ShaRef,
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One entry of a contents API directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileContent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

/// Thin blocking client over the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(api_base: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| RepoError::Remote(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        Self::new(&config.api_base, config.token.clone())
    }

    pub fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let info: RepoInfo = parse_json_response(self.get(&url)?, "repository metadata")?;
        Ok(info.default_branch)
    }

    /// Tree sha for a branch; tags and commit shas are returned as-is since
    /// the trees endpoint accepts them directly.
    pub fn resolve_tree(&self, owner: &str, repo: &str, git_ref: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{owner}/{repo}/branches/{}",
            self.api_base,
            urlencoding::encode(git_ref)
        );
        let response = self.get(&url)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("{git_ref} is not a branch of {owner}/{repo}; using it as a tree-ish");
            return Ok(git_ref.to_string());
        }
        let branch: BranchInfo = parse_json_response(response, "branch")?;
        Ok(branch.commit.commit.tree.sha)
    }

    /// Recursive tree listing. The flag is GitHub's own truncation marker.
    pub fn tree(&self, owner: &str, repo: &str, tree_sha: &str) -> Result<(Vec<TreeEntry>, bool)> {
        let url = format!(
            "{}/repos/{owner}/{repo}/git/trees/{}?recursive=1",
            self.api_base,
            urlencoding::encode(tree_sha)
        );
        let tree: TreeResponse = parse_json_response(self.get(&url)?, "tree listing")?;
        Ok((tree.tree, tree.truncated))
    }

    /// List a directory; `None` when it does not exist.
    pub fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<ContentEntry>>> {
        let response = self.get(&self.contents_url(owner, repo, path, git_ref))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value: serde_json::Value = parse_json_response(response, "directory listing")?;
        if !value.is_array() {
            return Ok(None);
        }
        let entries = serde_json::from_value(value)
            .map_err(|err| RepoError::Remote(format!("directory listing parse failed: {err}")))?;
        Ok(Some(entries))
    }

    /// File bytes; `None` when the file does not exist.
    pub fn file_bytes(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<u8>>> {
        let response = self.get(&self.contents_url(owner, repo, path, git_ref))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let file: FileContent = parse_json_response(response, "file contents")?;

        if let (Some(content), Some("base64")) = (&file.content, file.encoding.as_deref()) {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            if !compact.is_empty() {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|err| RepoError::Remote(format!("decode {path}: {err}")))?;
                return Ok(Some(bytes));
            }
        }
        match file.download_url {
            Some(url) => self.download(&url).map(Some),
            None => Err(RepoError::Remote(format!("no content for {path}"))),
        }
    }

    /// Size-capped download of a raw URL.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url)?;
        if !response.status().is_success() {
            return Err(RepoError::Remote(format!(
                "download {url} failed: HTTP {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_DOWNLOAD_SIZE {
                return Err(RepoError::Remote(format!(
                    "download too large: {length} bytes (max {} MB)",
                    MAX_DOWNLOAD_SIZE / (1024 * 1024)
                )));
            }
        }

        let mut bytes = Vec::new();
        response
            .take(MAX_DOWNLOAD_SIZE + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| RepoError::Remote(format!("download read failed: {err}")))?;
        if bytes.len() as u64 > MAX_DOWNLOAD_SIZE {
            return Err(RepoError::Remote(format!(
                "download exceeded size limit ({} MB)",
                MAX_DOWNLOAD_SIZE / (1024 * 1024)
            )));
        }
        Ok(bytes)
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        let suffix = if encoded.is_empty() {
            String::new()
        } else {
            format!("/{}", encoded.join("/"))
        };
        format!(
            "{}/repos/{owner}/{repo}/contents{suffix}?ref={}",
            self.api_base,
            urlencoding::encode(git_ref)
        )
    }

    /// The token only goes to the configured API host.
    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            if url.starts_with(&self.api_base) {
                request = request.bearer_auth(token);
            }
        }
        request
            .send()
            .map_err(|err| RepoError::Remote(format!("github request failed: {err}")))
    }
}

fn parse_json_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::blocking::Response,
    label: &str,
) -> Result<T> {
    if !response.status().is_success() {
        return Err(RepoError::Remote(format!(
            "{label} failed: HTTP {}",
            response.status()
        )));
    }
    response
        .json::<T>()
        .map_err(|err| RepoError::Remote(format!("{label} parse failed: {err}")))
}

/// Options for [`scan_remote`].
#[derive(Debug, Clone)]
pub struct RemoteScanOptions {
    pub manifest_file: String,
    pub max_candidates: usize,
    pub conventional_paths: Vec<String>,
}

/// Discover skills in a GitHub repository.
///
/// A malformed reference fails before any request. Failures on individual
/// candidates are recorded in the report and skipped.
pub fn scan_remote(
    client: &GitHubClient,
    reference: &str,
    options: &RemoteScanOptions,
) -> Result<ScanReport> {
    let repo_ref = parse_repo_ref(reference)?;
    let RepoRef { owner, repo, .. } = &repo_ref;
    let git_ref = match &repo_ref.git_ref {
        Some(git_ref) => git_ref.clone(),
        None => client.default_branch(owner, repo)?,
    };
    let label = format!("{}@{git_ref}", repo_ref.slug());
    let mut report = ScanReport::default();

    let dirs = match repo_ref.subpath.as_deref() {
        Some(prefix) => {
            tree_candidate_dirs(client, &repo_ref, &git_ref, Some(prefix), options, &mut report)?
        }
        None => {
            let probed = probe_conventional(client, &repo_ref, &git_ref, options, &mut report);
            if probed.is_empty() {
                debug!("no skills at conventional locations of {label}; listing full tree");
                tree_candidate_dirs(client, &repo_ref, &git_ref, None, options, &mut report)?
            } else {
                probed
            }
        }
    };

    let mut found = 0usize;
    for dir in dirs {
        let locator = RemoteLocator {
            owner: owner.clone(),
            repo: repo.clone(),
            git_ref: git_ref.clone(),
            path: dir,
        };
        match remote_candidate(client, locator, &options.manifest_file, &label) {
            Ok(candidate) => {
                found += 1;
                report.candidates.push(candidate);
            }
            Err(err) => {
                warn!("skipping remote candidate in {label}: {err}");
                report
                    .sources
                    .push(SourceOutcome::failed(label.clone(), SourceKind::Remote, err.to_string()));
            }
        }
    }

    info!("found {found} skill(s) in {label}");
    report.sources.insert(0, SourceOutcome::ok(label, SourceKind::Remote, found));
    report.dedup_by_digest();
    Ok(report)
}

fn remote_candidate(
    client: &GitHubClient,
    locator: RemoteLocator,
    manifest_file: &str,
    label: &str,
) -> Result<DiscoveredCandidate> {
    let manifest_path = join_path(&locator.path, manifest_file);
    let bytes = client
        .file_bytes(&locator.owner, &locator.repo, &manifest_path, &locator.git_ref)?
        .ok_or_else(|| RepoError::Remote(format!("{manifest_path} not found")))?;
    let info = manifest::parse(&String::from_utf8_lossy(&bytes));
    let name = info.name.unwrap_or_else(|| {
        locator
            .path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&locator.repo)
            .to_string()
    });

    Ok(DiscoveredCandidate {
        name,
        digest: hash::digest_bytes(&bytes),
        description: info.description,
        source_location: label.to_string(),
        source: SourceKind::Remote,
        locator: CandidateLocator::Remote(locator),
    })
}

/// One-level probe of every conventional location, up to `max_candidates`.
fn probe_conventional(
    client: &GitHubClient,
    repo_ref: &RepoRef,
    git_ref: &str,
    options: &RemoteScanOptions,
    report: &mut ScanReport,
) -> Vec<String> {
    let RepoRef { owner, repo, .. } = repo_ref;
    let mut dirs = Vec::new();

    for location in &options.conventional_paths {
        let location = location.trim_matches('/');
        let entries = match client.list_dir(owner, repo, location, git_ref) {
            Ok(Some(entries)) => entries,
            Ok(None) => continue,
            Err(err) => {
                debug!("probe of {location:?} failed: {err}");
                continue;
            }
        };

        if entries
            .iter()
            .any(|e| e.kind == "file" && e.name == options.manifest_file)
        {
            if dirs.len() >= options.max_candidates {
                mark_truncated(report, options.max_candidates);
                return dirs;
            }
            if !dirs.iter().any(|d| d == location) {
                dirs.push(location.to_string());
            }
            continue;
        }

        for entry in entries.iter().filter(|e| e.kind == "dir") {
            if dirs.contains(&entry.path) {
                continue;
            }
            if dirs.len() >= options.max_candidates {
                mark_truncated(report, options.max_candidates);
                return dirs;
            }
            let manifest_path = join_path(&entry.path, &options.manifest_file);
            match client.list_dir(owner, repo, &entry.path, git_ref) {
                Ok(Some(children)) if children.iter().any(|c| c.path == manifest_path) => {
                    dirs.push(entry.path.clone());
                }
                Ok(_) => {}
                Err(err) => debug!("probe of {} failed: {err}", entry.path),
            }
        }
    }
    dirs
}

/// Manifest parents from a recursive tree listing, optionally under `prefix`.
fn tree_candidate_dirs(
    client: &GitHubClient,
    repo_ref: &RepoRef,
    git_ref: &str,
    prefix: Option<&str>,
    options: &RemoteScanOptions,
    report: &mut ScanReport,
) -> Result<Vec<String>> {
    let tree_sha = client.resolve_tree(&repo_ref.owner, &repo_ref.repo, git_ref)?;
    let (entries, github_truncated) = client.tree(&repo_ref.owner, &repo_ref.repo, &tree_sha)?;
    if github_truncated {
        warn!("GitHub truncated the tree listing of {}", repo_ref.slug());
        report.truncated = true;
    }

    let prefix = prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty());
    let mut dirs = Vec::new();
    for entry in entries.iter().filter(|e| e.kind == "blob") {
        let Some(dir) = manifest_parent(&entry.path, &options.manifest_file) else {
            continue;
        };
        if let Some(prefix) = prefix {
            let under = dir == prefix || dir.starts_with(&format!("{prefix}/"));
            if !under {
                continue;
            }
        }
        if dirs.len() >= options.max_candidates {
            mark_truncated(report, options.max_candidates);
            break;
        }
        dirs.push(dir.to_string());
    }
    Ok(dirs)
}

fn mark_truncated(report: &mut ScanReport, cap: usize) {
    if !report.truncated {
        warn!("remote scan stopped at {cap} candidates; remaining skills were not listed");
    }
    report.truncated = true;
}

/// Parent directory of a manifest path, `""` for the repository root.
fn manifest_parent<'a>(path: &'a str, manifest_file: &str) -> Option<&'a str> {
    if path == manifest_file {
        return Some("");
    }
    path.strip_suffix(manifest_file)?.strip_suffix('/')
}

fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Recursively download a remote directory into `dest`, pinned to the
/// locator's ref.
pub fn download_dir(client: &GitHubClient, locator: &RemoteLocator, dest: &Path) -> Result<u64> {
    ensure_dir(dest)?;
    let entries = client
        .list_dir(&locator.owner, &locator.repo, &locator.path, &locator.git_ref)?
        .ok_or_else(|| RepoError::Remote(format!("{} not found", locator.html_url())))?;

    let mut written = 0u64;
    for entry in entries {
        if entry.name.contains('/') || entry.name == ".." || entry.name == "." {
            warn!("skipping suspicious entry {}", entry.path);
            continue;
        }
        let target = dest.join(&entry.name);
        match entry.kind.as_str() {
            "file" => {
                let bytes = client
                    .file_bytes(&locator.owner, &locator.repo, &entry.path, &locator.git_ref)?
                    .ok_or_else(|| RepoError::Remote(format!("{} vanished", entry.path)))?;
                std::fs::write(&target, bytes)?;
                written += 1;
            }
            "dir" => {
                let nested = RemoteLocator {
                    path: entry.path.clone(),
                    ..locator.clone()
                };
                written += download_dir(client, &nested, &target)?;
            }
            other => debug!("skipping {other} entry {}", entry.path),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn options(max: usize) -> RemoteScanOptions {
        RemoteScanOptions {
            manifest_file: "SKILL.md".to_string(),
            max_candidates: max,
            conventional_paths: vec!["skills".to_string(), String::new()],
        }
    }

    fn b64(text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    #[test]
    fn parse_repo_ref_accepts_forms() {
        let cases = [
            ("acme/tools", None, None),
            ("acme/tools@v1", Some("v1"), None),
            ("acme/tools/skills/lint", None, Some("skills/lint")),
            ("acme/tools/skills@dev", Some("dev"), Some("skills")),
            ("github.com/acme/tools", None, None),
            ("https://github.com/acme/tools.git", None, None),
            ("https://github.com/acme/tools/tree/main/skills/x", Some("main"), Some("skills/x")),
        ];
        for (input, git_ref, subpath) in cases {
            let parsed = parse_repo_ref(input).unwrap();
            assert_eq!(parsed.owner, "acme", "{input}");
            assert_eq!(parsed.repo, "tools", "{input}");
            assert_eq!(parsed.git_ref.as_deref(), git_ref, "{input}");
            assert_eq!(parsed.subpath.as_deref(), subpath, "{input}");
        }
    }

    #[test]
    fn parse_repo_ref_rejects_garbage() {
        for input in ["", "acme", "acme/", "https://gitlab.com/a/b", "a/b@", "a b/c", "a/b/../x"] {
            let err = parse_repo_ref(input).unwrap_err();
            assert!(matches!(err, RepoError::InvalidInput(_)), "{input}");
        }
    }

    #[test]
    fn manifest_parent_handles_root_and_nested() {
        assert_eq!(manifest_parent("SKILL.md", "SKILL.md"), Some(""));
        assert_eq!(manifest_parent("a/b/SKILL.md", "SKILL.md"), Some("a/b"));
        assert_eq!(manifest_parent("a/NOTSKILL.md", "SKILL.md"), None);
    }

    #[test]
    fn scan_probes_conventional_location() {
        let server = MockServer::start();
        let repo = server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools");
            then.status(200).json_body(json!({ "default_branch": "main" }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills")
                .query_param("ref", "main");
            then.status(200).json_body(json!([
                { "name": "lint", "path": "skills/lint", "type": "dir" },
                { "name": "README.md", "path": "skills/README.md", "type": "file" }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/contents/skills/lint");
            then.status(200).json_body(json!([
                { "name": "SKILL.md", "path": "skills/lint/SKILL.md", "type": "file" }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/contents/skills/lint/SKILL.md");
            then.status(200).json_body(json!({
                "content": b64("---\nname: Lint\n---\nRun lint"),
                "encoding": "base64"
            }));
        });

        let client = GitHubClient::new(&server.base_url(), None).unwrap();
        let report = scan_remote(&client, "acme/tools", &options(100)).unwrap();

        repo.assert();
        assert_eq!(report.candidates.len(), 1);
        let candidate = &report.candidates[0];
        assert_eq!(candidate.name, "Lint");
        assert_eq!(candidate.digest, hash::digest_bytes(b"---\nname: Lint\n---\nRun lint"));
        assert!(candidate.is_remote());
        assert!(!report.truncated);
    }

    #[test]
    fn scan_collects_from_every_conventional_location() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools");
            then.status(200).json_body(json!({ "default_branch": "main" }));
        });
        for (location, name) in [("skills", "a"), (".claude/skills", "b")] {
            let dir = format!("{location}/{name}");
            server.mock(|when, then| {
                when.method(GET).path(format!("/repos/acme/tools/contents/{location}"));
                then.status(200).json_body(json!([
                    { "name": name, "path": dir.clone(), "type": "dir" }
                ]));
            });
            server.mock(|when, then| {
                when.method(GET).path(format!("/repos/acme/tools/contents/{dir}"));
                then.status(200).json_body(json!([
                    { "name": "SKILL.md", "path": format!("{dir}/SKILL.md"), "type": "file" }
                ]));
            });
            server.mock(|when, then| {
                when.method(GET).path(format!("/repos/acme/tools/contents/{dir}/SKILL.md"));
                then.status(200).json_body(json!({
                    "content": b64(&format!("skill {name}")),
                    "encoding": "base64"
                }));
            });
        }
        let tree = server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/branches/main");
            then.status(500);
        });

        let client = GitHubClient::new(&server.base_url(), None).unwrap();
        let mut opts = options(10);
        opts.conventional_paths = vec!["skills".to_string(), ".claude/skills".to_string()];
        let report = scan_remote(&client, "acme/tools", &opts).unwrap();

        let mut names: Vec<_> = report.candidates.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!report.truncated);
        tree.assert_calls(0);

        let capped = scan_remote(&client, "acme/tools", &RemoteScanOptions { max_candidates: 1, ..opts }).unwrap();
        assert_eq!(capped.candidates.len(), 1);
        assert!(capped.truncated);
    }

    #[test]
    fn subpath_scan_uses_tree_and_caps_results() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/branches/dev");
            then.status(200)
                .json_body(json!({ "commit": { "commit": { "tree": { "sha": "t1" } } } }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/git/trees/t1")
                .query_param("recursive", "1");
            then.status(200).json_body(json!({
                "tree": [
                    { "path": "pack/a/SKILL.md", "type": "blob" },
                    { "path": "pack/b/SKILL.md", "type": "blob" },
                    { "path": "pack/c/SKILL.md", "type": "blob" },
                    { "path": "other/d/SKILL.md", "type": "blob" }
                ],
                "truncated": false
            }));
        });
        for name in ["a", "b"] {
            server.mock(move |when, then| {
                when.method(GET)
                    .path(format!("/repos/acme/tools/contents/pack/{name}/SKILL.md"));
                then.status(200).json_body(json!({
                    "content": b64(&format!("skill {name}")),
                    "encoding": "base64"
                }));
            });
        }

        let client = GitHubClient::new(&server.base_url(), None).unwrap();
        let report = scan_remote(&client, "acme/tools/pack@dev", &options(2)).unwrap();

        assert!(report.truncated);
        let names: Vec<_> = report.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn failed_candidate_is_recorded_and_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/branches/main");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/git/trees/main");
            then.status(200).json_body(json!({
                "tree": [
                    { "path": "x/good/SKILL.md", "type": "blob" },
                    { "path": "x/bad/SKILL.md", "type": "blob" }
                ]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/contents/x/good/SKILL.md");
            then.status(200)
                .json_body(json!({ "content": b64("good"), "encoding": "base64" }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/tools/contents/x/bad/SKILL.md");
            then.status(500);
        });

        let client = GitHubClient::new(&server.base_url(), None).unwrap();
        let report = scan_remote(&client, "acme/tools/x@main", &options(10)).unwrap();

        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].name, "good");
        assert_eq!(report.failed_sources().count(), 1);
        assert!(report.sources[0].is_ok());
    }

    #[test]
    fn token_is_sent_to_api_host() {
        let server = MockServer::start();
        let authed = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools")
                .header("authorization", "Bearer sekrit");
            then.status(200).json_body(json!({ "default_branch": "trunk" }));
        });

        let client = GitHubClient::new(&server.base_url(), Some("sekrit".into())).unwrap();
        assert_eq!(client.default_branch("acme", "tools").unwrap(), "trunk");
        authed.assert();
    }

    #[test]
    fn download_dir_recurses_with_same_ref() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills/lint")
                .query_param("ref", "v2");
            then.status(200).json_body(json!([
                { "name": "SKILL.md", "path": "skills/lint/SKILL.md", "type": "file" },
                { "name": "scripts", "path": "skills/lint/scripts", "type": "dir" }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills/lint/SKILL.md")
                .query_param("ref", "v2");
            then.status(200)
                .json_body(json!({ "content": b64("lint body"), "encoding": "base64" }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills/lint/scripts")
                .query_param("ref", "v2");
            then.status(200).json_body(json!([
                { "name": "run.sh", "path": "skills/lint/scripts/run.sh", "type": "file",
                  "download_url": server.url("/raw/run.sh") }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills/lint/scripts/run.sh")
                .query_param("ref", "v2");
            then.status(200)
                .json_body(json!({ "download_url": server.url("/raw/run.sh") }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/raw/run.sh");
            then.status(200).body("echo lint");
        });

        let temp = tempfile::TempDir::new().unwrap();
        let client = GitHubClient::new(&server.base_url(), None).unwrap();
        let locator = RemoteLocator {
            owner: "acme".into(),
            repo: "tools".into(),
            git_ref: "v2".into(),
            path: "skills/lint".into(),
        };
        let written = download_dir(&client, &locator, temp.path()).unwrap();

        assert_eq!(written, 2);
        assert_eq!(std::fs::read_to_string(temp.path().join("SKILL.md")).unwrap(), "lint body");
        assert_eq!(
            std::fs::read_to_string(temp.path().join("scripts/run.sh")).unwrap(),
            "echo lint"
        );
    }
}
