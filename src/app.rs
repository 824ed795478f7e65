// Pipeline - load local env files, merge, diff against remote, update

use colored::Colorize;

use crate::config::Config;
use crate::envfile::{self, EnvMap};
use crate::error::Error;
use crate::prompt::{MergePolicy, Prompter, ValueChoice};
use crate::store::SecretStore;

/// Print a dimmed status message (for progress steps)
fn status(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a success message with checkmark
fn success(msg: &str) {
    println!("\n{} {}", "✓".green(), msg.green());
}

/// Print an info line (normal text, indented)
fn info(msg: &str) {
    println!("  {}", msg);
}

/// Print a section header for the comparison output
fn section(title: &str) {
    println!("\n=== {} ===", title.bold());
}

/// What separates the merged local mapping from the remote one. All key
/// lists come out sorted because both maps iterate in key order.
#[derive(Debug, Default, PartialEq)]
pub struct DiffReport {
    pub both: Vec<String>,
    pub remote_only: Vec<String>,
    pub local_only: Vec<String>,
    /// (key, local value, remote value) for keys in both with unequal values.
    pub changed: Vec<(String, String, String)>,
}

pub fn diff(local: &EnvMap, remote: &EnvMap) -> DiffReport {
    let both: Vec<String> = local
        .keys()
        .filter(|key| remote.contains_key(*key))
        .cloned()
        .collect();
    let remote_only = remote
        .keys()
        .filter(|key| !local.contains_key(*key))
        .cloned()
        .collect();
    let local_only = local
        .keys()
        .filter(|key| !remote.contains_key(*key))
        .cloned()
        .collect();
    let changed = both
        .iter()
        .filter_map(|key| {
            let local_value = &local[key.as_str()];
            let remote_value = &remote[key.as_str()];
            (local_value != remote_value)
                .then(|| (key.clone(), local_value.clone(), remote_value.clone()))
        })
        .collect();

    DiffReport {
        both,
        remote_only,
        local_only,
        changed,
    }
}

pub struct App<'a> {
    config: Config,
    prompter: &'a dyn Prompter,
    store: &'a dyn SecretStore,
}

impl<'a> App<'a> {
    pub fn new(config: Config, prompter: &'a dyn Prompter, store: &'a dyn SecretStore) -> Self {
        Self {
            config,
            prompter,
            store,
        }
    }

    pub fn run(&self) -> Result<(), Error> {
        let merged = self.load_local()?;
        let remote = self.fetch_remote();
        self.print_diff(&diff(&merged, &remote));
        self.update(&merged)
    }

    /// Read both env files and merge them into the local view of the secret.
    /// The backend file is required; the frontend file only warns when absent.
    fn load_local(&self) -> Result<EnvMap, Error> {
        if !self.config.backend_env.is_file() {
            return Err(Error::BackendEnvNotFound(
                self.config.backend_env.display().to_string(),
            ));
        }
        status("Loading backend environment variables...");
        let backend = envfile::load(&self.config.backend_env)?;

        if !self.config.frontend_env.is_file() {
            eprintln!(
                "{}: Frontend environment file '{}' not found. Proceeding with backend only.",
                "Warning".yellow(),
                self.config.frontend_env.display()
            );
            return Ok(backend);
        }
        status("Loading frontend environment variables...");
        let frontend = envfile::load(&self.config.frontend_env)?;
        Ok(self.merge(backend, frontend))
    }

    /// Frontend keys augment the backend set. Keys present in both files
    /// with differing values are listed, then resolved by the chosen policy.
    /// Under manual resolution only the conflicting keys are decided;
    /// frontend-only keys are not added.
    fn merge(&self, mut backend: EnvMap, frontend: EnvMap) -> EnvMap {
        let conflicts: Vec<String> = frontend
            .iter()
            .filter(|&(key, value)| backend.get(key).is_some_and(|b| b != value))
            .map(|(key, _)| key.clone())
            .collect();

        if conflicts.is_empty() {
            backend.extend(frontend);
            return backend;
        }

        println!(
            "\n{} Conflicts detected between backend and frontend variables:",
            "⚠".yellow()
        );
        for key in &conflicts {
            info(&format!("{}:", key));
            info(&format!("  Backend: {}", backend[key]));
            info(&format!("  Frontend: {}", frontend[key]));
        }
        println!();

        match self.prompter.merge_policy() {
            MergePolicy::PreferBackend => {
                for (key, value) in frontend {
                    backend.entry(key).or_insert(value);
                }
            }
            MergePolicy::PreferFrontend => {
                backend.extend(frontend);
            }
            MergePolicy::Manual => {
                for key in &conflicts {
                    let choice = self
                        .prompter
                        .choose_value(key, &backend[key], &frontend[key]);
                    if choice == ValueChoice::Frontend {
                        backend.insert(key.clone(), frontend[key].clone());
                    }
                }
            }
        }
        backend
    }

    /// A remote fetch that fails for any reason degrades to an empty mapping
    /// so the comparison and update stages still run.
    fn fetch_remote(&self) -> EnvMap {
        println!();
        status("Fetching secrets from AWS Secrets Manager...");
        match self
            .store
            .fetch(&self.config.secret_id, &self.config.region)
        {
            Ok(remote) => remote,
            Err(e) => {
                eprintln!(
                    "{}: {}. Treating the remote secret as empty.",
                    "Warning".yellow(),
                    e
                );
                EnvMap::new()
            }
        }
    }

    fn print_diff(&self, report: &DiffReport) {
        println!("\n{}", "=== COMPARISON RESULTS ===".bold());

        section("KEYS IN BOTH");
        for key in &report.both {
            info(key);
        }

        section("KEYS ONLY IN AWS SECRETS MANAGER");
        for key in &report.remote_only {
            info(key);
        }

        section("KEYS ONLY IN LOCAL ENV");
        for key in &report.local_only {
            info(key);
        }

        section("VALUES THAT DIFFER");
        for (key, local_value, remote_value) in &report.changed {
            info(&format!("{}:", key));
            info(&format!("  AWS: {}", remote_value));
            info(&format!("  Local: {}", local_value));
        }
    }

    /// Overwrite the remote secret with the merged mapping, but only on an
    /// explicit yes. A declined or failed update still exits cleanly.
    fn update(&self, merged: &EnvMap) -> Result<(), Error> {
        println!();
        if !self.prompter.confirm_update() {
            info("Operation cancelled. No changes were made.");
            return Ok(());
        }

        status("Updating AWS Secrets Manager...");
        match self
            .store
            .put(&self.config.secret_id, &self.config.region, merged)
        {
            Ok(()) => success("AWS Secrets Manager has been updated successfully."),
            Err(e) => eprintln!("{}: {}", "Error".red(), e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use super::*;

    struct ScriptedPrompter {
        policy: Option<MergePolicy>,
        choices: Vec<(&'static str, ValueChoice)>,
        confirm: bool,
    }

    impl ScriptedPrompter {
        fn silent(confirm: bool) -> Self {
            Self {
                policy: None,
                choices: vec![],
                confirm,
            }
        }

        fn with_policy(policy: MergePolicy) -> Self {
            Self {
                policy: Some(policy),
                choices: vec![],
                confirm: false,
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn secret_id(&self) -> Result<String, Error> {
            panic!("secret id prompt was not expected")
        }

        fn merge_policy(&self) -> MergePolicy {
            self.policy.expect("merge policy prompt was not expected")
        }

        fn choose_value(&self, key: &str, _backend: &str, _frontend: &str) -> ValueChoice {
            self.choices
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, choice)| *choice)
                .expect("manual choice prompt was not expected")
        }

        fn confirm_update(&self) -> bool {
            self.confirm
        }
    }

    struct MemoryStore {
        remote: EnvMap,
        fail_fetch: bool,
        puts: RefCell<Vec<EnvMap>>,
    }

    impl MemoryStore {
        fn with_remote(remote: EnvMap) -> Self {
            Self {
                remote,
                fail_fetch: false,
                puts: RefCell::new(vec![]),
            }
        }

        fn unreachable() -> Self {
            Self {
                remote: EnvMap::new(),
                fail_fetch: true,
                puts: RefCell::new(vec![]),
            }
        }
    }

    impl SecretStore for MemoryStore {
        fn fetch(&self, _id: &str, _region: &str) -> Result<EnvMap, Error> {
            if self.fail_fetch {
                return Err(Error::RemoteFetch("connection refused".to_string()));
            }
            Ok(self.remote.clone())
        }

        fn put(&self, _id: &str, _region: &str, payload: &EnvMap) -> Result<(), Error> {
            self.puts.borrow_mut().push(payload.clone());
            Ok(())
        }
    }

    fn env_map(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn test_config(backend_env: PathBuf, frontend_env: PathBuf) -> Config {
        Config {
            backend_env,
            frontend_env,
            secret_id: "app/main".to_string(),
            region: "us-east-2".to_string(),
        }
    }

    fn merge_with(
        prompter: &ScriptedPrompter,
        backend: &[(&str, &str)],
        frontend: &[(&str, &str)],
    ) -> EnvMap {
        let store = MemoryStore::with_remote(EnvMap::new());
        let app = App::new(
            test_config(PathBuf::from("unused"), PathBuf::from("unused")),
            prompter,
            &store,
        );
        app.merge(env_map(backend), env_map(frontend))
    }

    #[test]
    fn disjoint_files_merge_without_any_prompt() {
        let prompter = ScriptedPrompter::silent(false);
        let merged = merge_with(&prompter, &[("A", "1"), ("B", "2")], &[("C", "4")]);
        assert_eq!(merged, env_map(&[("A", "1"), ("B", "2"), ("C", "4")]));
    }

    #[test]
    fn equal_values_are_not_conflicts() {
        let prompter = ScriptedPrompter::silent(false);
        let merged = merge_with(&prompter, &[("A", "1"), ("B", "2")], &[("B", "2"), ("C", "3")]);
        assert_eq!(merged, env_map(&[("A", "1"), ("B", "2"), ("C", "3")]));
    }

    #[test]
    fn prefer_backend_keeps_conflicts_and_adds_new_keys() {
        let prompter = ScriptedPrompter::with_policy(MergePolicy::PreferBackend);
        let merged = merge_with(&prompter, &[("A", "1"), ("B", "2")], &[("B", "3"), ("C", "4")]);
        assert_eq!(merged, env_map(&[("A", "1"), ("B", "2"), ("C", "4")]));
    }

    #[test]
    fn prefer_frontend_overwrites_and_adds_new_keys() {
        let prompter = ScriptedPrompter::with_policy(MergePolicy::PreferFrontend);
        let merged = merge_with(&prompter, &[("A", "1"), ("B", "2")], &[("B", "3"), ("C", "4")]);
        assert_eq!(merged, env_map(&[("A", "1"), ("B", "3"), ("C", "4")]));
    }

    #[test]
    fn manual_resolution_does_not_add_frontend_only_keys() {
        // Frontend-only keys are dropped under manual resolution; only the
        // conflicting keys themselves are decided.
        let prompter = ScriptedPrompter {
            policy: Some(MergePolicy::Manual),
            choices: vec![("B", ValueChoice::Frontend)],
            confirm: false,
        };
        let merged = merge_with(&prompter, &[("A", "1"), ("B", "2")], &[("B", "3"), ("C", "4")]);
        assert_eq!(merged, env_map(&[("A", "1"), ("B", "3")]));
    }

    #[test]
    fn manual_resolution_can_keep_the_backend_value() {
        let prompter = ScriptedPrompter {
            policy: Some(MergePolicy::Manual),
            choices: vec![("B", ValueChoice::Backend)],
            confirm: false,
        };
        let merged = merge_with(&prompter, &[("B", "2")], &[("B", "3")]);
        assert_eq!(merged, env_map(&[("B", "2")]));
    }

    #[test]
    fn diff_splits_key_sets_and_skips_equal_values() {
        let local = env_map(&[("A", "1"), ("B", "2")]);
        let remote = env_map(&[("B", "2"), ("C", "3")]);
        let report = diff(&local, &remote);
        assert_eq!(report.both, ["B"]);
        assert_eq!(report.remote_only, ["C"]);
        assert_eq!(report.local_only, ["A"]);
        assert!(report.changed.is_empty());
    }

    #[test]
    fn diff_reports_unequal_values_with_both_sides() {
        let local = env_map(&[("B", "9")]);
        let remote = env_map(&[("B", "2")]);
        let report = diff(&local, &remote);
        assert_eq!(
            report.changed,
            [("B".to_string(), "9".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn diff_against_empty_remote_is_all_local_only() {
        let local = env_map(&[("A", "1"), ("B", "2")]);
        let report = diff(&local, &EnvMap::new());
        assert!(report.both.is_empty());
        assert!(report.remote_only.is_empty());
        assert_eq!(report.local_only, ["A", "B"]);
    }

    fn write_env(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn confirmed_run_puts_the_merged_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let backend = write_env(&dir, "backend.env", "A=1\nB=2\n");
        let frontend = write_env(&dir, "frontend.env", "C=4\n");
        let prompter = ScriptedPrompter::silent(true);
        let store = MemoryStore::with_remote(env_map(&[("B", "2")]));

        App::new(test_config(backend, frontend), &prompter, &store)
            .run()
            .unwrap();

        let puts = store.puts.borrow();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0], env_map(&[("A", "1"), ("B", "2"), ("C", "4")]));
    }

    #[test]
    fn declined_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = write_env(&dir, "backend.env", "A=1\n");
        let frontend = write_env(&dir, "frontend.env", "");
        let prompter = ScriptedPrompter::silent(false);
        let store = MemoryStore::with_remote(env_map(&[("A", "1")]));

        App::new(test_config(backend, frontend), &prompter, &store)
            .run()
            .unwrap();

        assert!(store.puts.borrow().is_empty());
    }

    #[test]
    fn missing_frontend_file_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let backend = write_env(&dir, "backend.env", "A=1\n");
        let frontend = dir.path().join("absent.env");
        let prompter = ScriptedPrompter::silent(true);
        let store = MemoryStore::with_remote(EnvMap::new());

        App::new(test_config(backend, frontend), &prompter, &store)
            .run()
            .unwrap();

        assert_eq!(store.puts.borrow()[0], env_map(&[("A", "1")]));
    }

    #[test]
    fn missing_backend_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let backend = dir.path().join("absent.env");
        let frontend = dir.path().join("also-absent.env");
        let prompter = ScriptedPrompter::silent(false);
        let store = MemoryStore::with_remote(EnvMap::new());

        let result = App::new(test_config(backend, frontend), &prompter, &store).run();
        assert!(matches!(result, Err(Error::BackendEnvNotFound(_))));
    }

    #[test]
    fn unreachable_remote_still_allows_a_confirmed_update() {
        let dir = tempfile::tempdir().unwrap();
        let backend = write_env(&dir, "backend.env", "A=1\n");
        let frontend = dir.path().join("absent.env");
        let prompter = ScriptedPrompter::silent(true);
        let store = MemoryStore::unreachable();

        App::new(test_config(backend, frontend), &prompter, &store)
            .run()
            .unwrap();

        assert_eq!(store.puts.borrow()[0], env_map(&[("A", "1")]));
    }
}
