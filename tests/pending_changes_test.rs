use git2::{Repository, Signature};
use pending_changes::host::{
    Build, GitConfig, ModuleLocation, NameOnlyDirectory, Project, ScmConfig, SubversionConfig,
};
use pending_changes::scm::subversion::{
    SubversionProvider, SvnConnector, SvnError, SvnLogRecord, SvnSession,
};
use pending_changes::scm::{
    ChangeEntry, GitProvider, PendingChangesProvider, ProviderRegistry, SkipReason,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

/// In-memory stand-in for the repository-access client.
#[derive(Default)]
struct FakeSvn {
    repos: HashMap<String, Vec<SvnLogRecord>>,
    broken: HashSet<String>,
    unreachable: HashSet<String>,
}

impl FakeSvn {
    fn with_log(mut self, url: &str, records: Vec<SvnLogRecord>) -> Self {
        self.repos.insert(url.to_string(), records);
        self
    }

    /// Session opens, but every log query fails.
    fn with_broken_query(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    /// Session open itself fails.
    fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }
}

impl SvnConnector for FakeSvn {
    fn open(&self, url: &Url) -> Result<Box<dyn SvnSession>, SvnError> {
        if self.unreachable.contains(url.as_str()) {
            return Err(SvnError::Session(format!("cannot reach {url}")));
        }
        Ok(Box::new(FakeSession {
            records: self.repos.get(url.as_str()).cloned().unwrap_or_default(),
            fail: self.broken.contains(url.as_str()),
        }))
    }
}

struct FakeSession {
    records: Vec<SvnLogRecord>,
    fail: bool,
}

impl SvnSession for FakeSession {
    fn log(&mut self, start_revision: u64) -> Result<Vec<SvnLogRecord>, SvnError> {
        if self.fail {
            return Err(SvnError::CommandFailed {
                status: "exit status: 1".to_string(),
                stderr: "connection reset by peer".to_string(),
            });
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.revision >= start_revision)
            .cloned()
            .collect())
    }
}

fn record(revision: u64, author: &str, message: &str) -> SvnLogRecord {
    SvnLogRecord {
        revision,
        author: Some(author.to_string()),
        message: message.to_string(),
    }
}

fn build(number: u32, env: &[(&str, &str)]) -> Build {
    let environment: BTreeMap<String, String> = env
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    Build {
        number,
        environment,
    }
}

fn svn_project(urls: &[&str], last_successful_build: Option<Build>) -> Project {
    Project {
        name: "core".to_string(),
        scm: Some(ScmConfig::Subversion(SubversionConfig {
            locations: urls
                .iter()
                .map(|url| ModuleLocation {
                    url: (*url).to_string(),
                })
                .collect(),
        })),
        last_successful_build,
    }
}

fn provider(fake: FakeSvn) -> SubversionProvider {
    SubversionProvider::new(Arc::new(fake), Arc::new(NameOnlyDirectory))
}

fn commit_ids(entries: &[ChangeEntry]) -> Vec<&str> {
    entries.iter().map(ChangeEntry::commit_id).collect()
}

const TRUNK: &str = "https://svn.example.org/core/trunk";
const VENDOR: &str = "https://svn.example.org/core/vendor";
const SITE: &str = "https://svn.example.org/core/site";

#[test]
fn window_starts_strictly_after_stored_revision() {
    let fake = FakeSvn::default().with_log(
        TRUNK,
        (38..=45)
            .map(|r| record(r, "alice", &format!("change {r}")))
            .collect(),
    );
    let project = svn_project(&[TRUNK], Some(build(41, &[("SVN_REVISION", "40")])));

    let set = provider(fake).pending_changes(&project);

    assert_eq!(commit_ids(set.entries()), ["41", "42", "43", "44", "45"]);
    assert_eq!(set.reference_build().unwrap().number, 41);
    assert!(set.skips().is_empty());
    assert_eq!(set.entries()[0].author().full_name, "alice");
    assert_eq!(set.entries()[0].message(), "change 41");
}

#[test]
fn zero_locations_yields_empty_set_not_unavailable() {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(provider(FakeSvn::default())));
    let project = svn_project(&[], Some(build(3, &[])));

    let set = registry
        .pending_changes(&project)
        .expect("provider must match");
    assert!(set.is_empty());
    assert!(set.skips().is_empty());
}

#[test]
fn no_successful_build_skips_every_location() {
    let fake = FakeSvn::default()
        .with_log(TRUNK, vec![record(5, "alice", "x")])
        .with_log(VENDOR, vec![record(9, "bob", "y")]);
    let project = svn_project(&[TRUNK, VENDOR], None);

    let set = provider(fake).pending_changes(&project);

    assert!(set.is_empty());
    assert!(set.reference_build().is_none());
    assert_eq!(set.skips().len(), 2);
    for skip in set.skips() {
        assert!(matches!(skip.reason(), SkipReason::NoSuccessfulBuild));
    }
}

#[test]
fn missing_key_only_affects_its_own_location() {
    let fake = FakeSvn::default()
        .with_log(TRUNK, vec![record(11, "alice", "trunk change")])
        .with_log(VENDOR, vec![record(21, "bob", "vendor change")]);
    // Key for location 0 is absent; location 1 is intact.
    let project = svn_project(
        &[TRUNK, VENDOR],
        Some(build(12, &[("SVN_REVISION_1", "20")])),
    );

    let set = provider(fake).pending_changes(&project);

    assert_eq!(commit_ids(set.entries()), ["21"]);
    assert_eq!(set.skips().len(), 1);
    assert_eq!(set.skips()[0].location(), TRUNK);
    let SkipReason::MissingRevision { key } = set.skips()[0].reason() else {
        panic!("expected missing-revision skip");
    };
    assert_eq!(key, "SVN_REVISION_0");
}

#[test]
fn query_failure_leaves_other_locations_intact() {
    let fake = FakeSvn::default()
        .with_log(TRUNK, vec![record(2, "alice", "a")])
        .with_broken_query(VENDOR)
        .with_log(SITE, vec![record(31, "carol", "c")]);
    let project = svn_project(
        &[TRUNK, VENDOR, SITE],
        Some(build(
            8,
            &[
                ("SVN_REVISION_0", "1"),
                ("SVN_REVISION_1", "5"),
                ("SVN_REVISION_2", "30"),
            ],
        )),
    );

    let set = provider(fake).pending_changes(&project);

    assert_eq!(commit_ids(set.entries()), ["2", "31"]);
    assert_eq!(set.skips().len(), 1);
    assert_eq!(set.skips()[0].location(), VENDOR);
    assert!(matches!(
        set.skips()[0].reason(),
        SkipReason::QueryFailed { .. }
    ));
}

#[test]
fn each_location_reads_its_indexed_key() {
    let fake = FakeSvn::default()
        .with_log(
            TRUNK,
            (10..=12).map(|r| record(r, "alice", "t")).collect(),
        )
        .with_log(
            VENDOR,
            (20..=23).map(|r| record(r, "bob", "v")).collect(),
        )
        .with_log(SITE, (30..=31).map(|r| record(r, "carol", "s")).collect());
    let project = svn_project(
        &[TRUNK, VENDOR, SITE],
        Some(build(
            30,
            &[
                ("SVN_REVISION_0", "10"),
                ("SVN_REVISION_1", "22"),
                ("SVN_REVISION_2", "29"),
            ],
        )),
    );

    let set = provider(fake).pending_changes(&project);

    // Per-location windows, interleaved in location order, never re-sorted.
    assert_eq!(commit_ids(set.entries()), ["11", "12", "23", "30", "31"]);
}

#[test]
fn unreachable_and_malformed_locations_are_skipped() {
    let fake = FakeSvn::default()
        .with_unreachable(TRUNK)
        .with_log(VENDOR, vec![record(7, "bob", "v")]);
    let project = Project {
        name: "core".to_string(),
        scm: Some(ScmConfig::Subversion(SubversionConfig {
            locations: vec![
                ModuleLocation {
                    url: "not a url".to_string(),
                },
                ModuleLocation {
                    url: TRUNK.to_string(),
                },
                ModuleLocation {
                    url: VENDOR.to_string(),
                },
            ],
        })),
        last_successful_build: Some(build(
            4,
            &[
                ("SVN_REVISION_0", "1"),
                ("SVN_REVISION_1", "1"),
                ("SVN_REVISION_2", "6"),
            ],
        )),
    };

    let set = provider(fake).pending_changes(&project);

    assert_eq!(commit_ids(set.entries()), ["7"]);
    assert_eq!(set.skips().len(), 2);
    assert!(matches!(
        set.skips()[0].reason(),
        SkipReason::InvalidUrl { .. }
    ));
    assert!(matches!(
        set.skips()[1].reason(),
        SkipReason::SessionFailed { .. }
    ));
}

#[test]
fn unparsable_stored_revision_is_skipped() {
    let fake = FakeSvn::default().with_log(TRUNK, vec![record(3, "alice", "a")]);
    let project = svn_project(&[TRUNK], Some(build(2, &[("SVN_REVISION", "HEAD")])));

    let set = provider(fake).pending_changes(&project);

    assert!(set.is_empty());
    let SkipReason::InvalidRevision { key, value } = set.skips()[0].reason() else {
        panic!("expected invalid-revision skip");
    };
    assert_eq!(key, "SVN_REVISION");
    assert_eq!(value, "HEAD");
}

/// Test setup that creates a temporary git repository with test commits
struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
    repo: Repository,
    commits: Vec<git2::Oid>,
}

impl TestRepo {
    fn new() -> TestRepo {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&path).unwrap();

        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        TestRepo {
            _temp_dir: temp_dir,
            path,
            repo,
            commits: Vec::new(),
        }
    }

    fn add_commit(&mut self, message: &str, content: &str) -> git2::Oid {
        let file_path = self.path.join("test.txt");
        std::fs::write(&file_path, content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(std::path::Path::new("test.txt")).unwrap();
        index.write().unwrap();

        let signature = Signature::now("Test User", "test@example.com").unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let parent_commit = self
            .commits
            .last()
            .map(|id| self.repo.find_commit(*id).unwrap());
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let commit_id = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();

        self.commits.push(commit_id);
        commit_id
    }

    fn project(&self, last_successful_build: Option<Build>) -> Project {
        Project {
            name: "site".to_string(),
            scm: Some(ScmConfig::Git(GitConfig {
                path: self.path.clone(),
                branch: None,
            })),
            last_successful_build,
        }
    }
}

#[test]
fn git_pending_commits_since_built_commit() {
    let mut repo = TestRepo::new();
    let built = repo.add_commit("Initial commit", "one");
    let second = repo.add_commit("Add feature", "two");
    let third = repo.add_commit("Fix bug", "three");

    let project = repo.project(Some(build(
        17,
        &[("GIT_COMMIT", &built.to_string())],
    )));
    let set = GitProvider::new().pending_changes(&project);

    assert_eq!(
        commit_ids(set.entries()),
        [second.to_string(), third.to_string()]
    );
    assert_eq!(set.entries()[0].message(), "Add feature");
    assert_eq!(set.entries()[0].author().full_name, "Test User");
    assert!(set.skips().is_empty());
}

#[test]
fn git_nothing_pending_at_head() {
    let mut repo = TestRepo::new();
    repo.add_commit("Initial commit", "one");
    let head = repo.add_commit("Add feature", "two");

    let project = repo.project(Some(build(3, &[("GIT_COMMIT", &head.to_string())])));
    let set = GitProvider::new().pending_changes(&project);

    assert!(set.is_empty());
    assert!(set.skips().is_empty());
}

#[test]
fn git_degrades_on_missing_or_unknown_commit() {
    let mut repo = TestRepo::new();
    repo.add_commit("Initial commit", "one");

    let no_key = repo.project(Some(build(3, &[])));
    let set = GitProvider::new().pending_changes(&no_key);
    assert!(set.is_empty());
    assert!(matches!(
        set.skips()[0].reason(),
        SkipReason::MissingRevision { .. }
    ));

    let bogus = repo.project(Some(build(
        3,
        &[("GIT_COMMIT", "4f0c9c4fa3f6a7659e03a982e2c0e737cfbccbd9")],
    )));
    let set = GitProvider::new().pending_changes(&bogus);
    assert!(set.is_empty());
    assert!(matches!(
        set.skips()[0].reason(),
        SkipReason::InvalidRevision { .. }
    ));
}

#[test]
fn registry_routes_projects_to_matching_providers() {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(provider(
        FakeSvn::default().with_log(TRUNK, vec![record(2, "alice", "a")]),
    )));
    registry.register(Box::new(GitProvider::new()));

    let svn = svn_project(&[TRUNK], Some(build(1, &[("SVN_REVISION", "1")])));
    let set = registry.pending_changes(&svn).expect("svn is supported");
    assert_eq!(commit_ids(set.entries()), ["2"]);

    let mut repo = TestRepo::new();
    let built = repo.add_commit("Initial commit", "one");
    repo.add_commit("Add feature", "two");
    let git = repo.project(Some(build(1, &[("GIT_COMMIT", &built.to_string())])));
    assert!(registry.supported(&git));
    let set = registry.pending_changes(&git).expect("git is supported");
    assert_eq!(set.len(), 1);

    let unconfigured = Project {
        name: "bare".to_string(),
        scm: None,
        last_successful_build: None,
    };
    assert!(!registry.supported(&unconfigured));
    assert!(registry.pending_changes(&unconfigured).is_none());
}
