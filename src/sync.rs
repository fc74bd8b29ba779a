//! Sync orchestrator: authenticate -> list local -> list vault -> diff ->
//! (optional) create.
//!
//! Runs strictly in sequence. Both listings complete before any creation
//! decision is made.

use crate::keychain::CredentialStore;
use crate::matcher::{classify, vault_key_set, ComparisonKey, Presence};
use crate::vault::Vault;
use tracing::{debug, error, info};

/// Whether missing items are only reported or also created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Report only (default)
    #[default]
    DryRun,
    /// Create missing items in the vault
    Write,
}

impl SyncMode {
    pub fn from_write_flag(write: bool) -> Self {
        if write {
            Self::Write
        } else {
            Self::DryRun
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

/// Per-run counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Authentication failed; nothing was read or written
    pub aborted: bool,
    /// Local items without a vault counterpart
    pub missing: usize,
    /// Missing items created in the vault
    pub created: usize,
    /// Missing items whose creation failed
    pub failed: usize,
    /// Local items already in the vault
    pub already_present: usize,
}

impl SyncReport {
    fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
}

pub struct Synchronizer<S, V> {
    store: S,
    vault: V,
}

impl<S: CredentialStore, V: Vault> Synchronizer<S, V> {
    pub fn new(store: S, vault: V) -> Self {
        Self { store, vault }
    }

    pub fn run(&self, mode: SyncMode) -> SyncReport {
        let Some(session) = self.vault.authenticate() else {
            error!("Bitwarden authentication failed, nothing to do");
            return SyncReport::aborted();
        };

        let local_items = self.store.list_local();
        let vault_items = self.vault.list_entries(&session);
        let existing_keys = vault_key_set(&vault_items);
        debug!(
            "Comparing {} keychain items against {} vault keys",
            local_items.len(),
            existing_keys.len()
        );

        let mut report = SyncReport::default();
        for item in &local_items {
            let key = ComparisonKey::for_local(item);

            if classify(item, &existing_keys) == Presence::Present {
                debug!("Item already exists in Bitwarden: {}", key);
                report.already_present += 1;
                continue;
            }

            info!("New item found: {}", key);
            report.missing += 1;

            if mode.is_dry_run() {
                continue;
            }

            if self.vault.create_entry(&session, item) {
                info!("Successfully created Bitwarden item for {}", key);
                report.created += 1;
            } else {
                error!("Failed to create Bitwarden item for {}", key);
                report.failed += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocalCredential, LoginFields, SessionToken, VaultEntry};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeStore {
        items: Vec<LocalCredential>,
        calls: Cell<usize>,
    }

    impl CredentialStore for FakeStore {
        fn list_local(&self) -> Vec<LocalCredential> {
            self.calls.set(self.calls.get() + 1);
            self.items.clone()
        }
    }

    #[derive(Default)]
    struct FakeVault {
        deny_login: bool,
        entries: Vec<VaultEntry>,
        /// Keys whose creation fails
        reject: Vec<&'static str>,
        list_calls: Cell<usize>,
        sessions_seen: RefCell<Vec<String>>,
        created: RefCell<Vec<LocalCredential>>,
    }

    impl Vault for FakeVault {
        fn authenticate(&self) -> Option<SessionToken> {
            (!self.deny_login).then(|| SessionToken::new("mock-session"))
        }

        fn list_entries(&self, session: &SessionToken) -> Vec<VaultEntry> {
            self.list_calls.set(self.list_calls.get() + 1);
            self.sessions_seen.borrow_mut().push(session.expose().to_string());
            self.entries.clone()
        }

        fn create_entry(&self, session: &SessionToken, credential: &LocalCredential) -> bool {
            self.sessions_seen.borrow_mut().push(session.expose().to_string());
            self.created.borrow_mut().push(credential.clone());
            let key = ComparisonKey::for_local(credential);
            !self.reject.iter().any(|r| *r == key.as_str())
        }
    }

    fn sample_local() -> Vec<LocalCredential> {
        vec![
            LocalCredential::new("user1", "example.com", "pw1"),
            LocalCredential::new("user2", "test.com", "pw2"),
        ]
    }

    fn sample_vault() -> Vec<VaultEntry> {
        vec![VaultEntry::new(
            "item1",
            "example.com - user1",
            LoginFields::with_username("user1"),
        )]
    }

    fn synchronizer(local: Vec<LocalCredential>, vault: FakeVault) -> Synchronizer<FakeStore, FakeVault> {
        Synchronizer::new(
            FakeStore {
                items: local,
                ..FakeStore::default()
            },
            vault,
        )
    }

    #[test]
    fn test_mode_from_write_flag() {
        assert_eq!(SyncMode::default(), SyncMode::DryRun);
        assert_eq!(SyncMode::from_write_flag(false), SyncMode::DryRun);
        assert_eq!(SyncMode::from_write_flag(true), SyncMode::Write);
    }

    #[test]
    fn test_dry_run_never_creates() {
        let local: Vec<LocalCredential> = (0..5)
            .map(|i| LocalCredential::new(format!("user{i}"), "missing.com", "pw"))
            .collect();
        let sync = synchronizer(local, FakeVault::default());

        let report = sync.run(SyncMode::DryRun);

        assert!(sync.vault.created.borrow().is_empty());
        assert_eq!(report.missing, 5);
        assert_eq!(report.created, 0);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_check_only_scenario() {
        let vault = FakeVault {
            entries: sample_vault(),
            ..FakeVault::default()
        };
        let sync = synchronizer(sample_local(), vault);

        let report = sync.run(SyncMode::DryRun);

        assert!(sync.vault.created.borrow().is_empty());
        assert_eq!(
            report,
            SyncReport {
                aborted: false,
                missing: 1,
                created: 0,
                failed: 0,
                already_present: 1,
            }
        );
    }

    #[test]
    fn test_write_creates_only_missing_item() {
        let vault = FakeVault {
            entries: sample_vault(),
            ..FakeVault::default()
        };
        let sync = synchronizer(sample_local(), vault);

        let report = sync.run(SyncMode::Write);

        let created = sync.vault.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].account(), "user2");
        assert_eq!(created[0].service(), "test.com");
        assert_eq!(created[0].secret(), "pw2");
        assert_eq!(report.created, 1);
        assert_eq!(report.already_present, 1);
    }

    #[test]
    fn test_write_creates_each_missing_item_once() {
        let local = vec![
            LocalCredential::new("a", "one.com", "1"),
            LocalCredential::new("user1", "example.com", "pw1"),
            LocalCredential::new("b", "two.com", "2"),
            LocalCredential::new("c", "three.com", "3"),
        ];
        let vault = FakeVault {
            entries: sample_vault(),
            ..FakeVault::default()
        };
        let sync = synchronizer(local, vault);

        let report = sync.run(SyncMode::Write);

        let created: Vec<String> = sync
            .vault
            .created
            .borrow()
            .iter()
            .map(|c| ComparisonKey::for_local(c).to_string())
            .collect();
        assert_eq!(created, vec!["a@one.com", "b@two.com", "c@three.com"]);
        assert_eq!(report.missing, 3);
        assert_eq!(report.created, 3);
        assert_eq!(report.already_present, 1);
    }

    #[test]
    fn test_auth_failure_aborts_before_reading() {
        let vault = FakeVault {
            deny_login: true,
            entries: sample_vault(),
            ..FakeVault::default()
        };
        let sync = synchronizer(sample_local(), vault);

        let report = sync.run(SyncMode::Write);

        assert!(report.aborted);
        assert_eq!(sync.store.calls.get(), 0);
        assert_eq!(sync.vault.list_calls.get(), 0);
        assert!(sync.vault.created.borrow().is_empty());
    }

    #[test]
    fn test_empty_local_listing_completes() {
        let vault = FakeVault {
            entries: sample_vault(),
            ..FakeVault::default()
        };
        let sync = synchronizer(Vec::new(), vault);

        let report = sync.run(SyncMode::Write);

        assert!(!report.aborted);
        assert_eq!(report.missing, 0);
        assert!(sync.vault.created.borrow().is_empty());
        assert_eq!(sync.store.calls.get(), 1);
        assert_eq!(sync.vault.list_calls.get(), 1);
    }

    #[test]
    fn test_create_failure_does_not_stop_run() {
        let vault = FakeVault {
            reject: vec!["user1@example.com"],
            ..FakeVault::default()
        };
        let sync = synchronizer(sample_local(), vault);

        let report = sync.run(SyncMode::Write);

        assert_eq!(sync.vault.created.borrow().len(), 2);
        assert_eq!(report.missing, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_empty_vault_listing_reports_everything_missing() {
        // An empty listing is indistinguishable from a vault outage.
        let sync = synchronizer(sample_local(), FakeVault::default());
        let report = sync.run(SyncMode::DryRun);
        assert_eq!(report.missing, 2);
        assert_eq!(report.already_present, 0);
    }

    #[test]
    fn test_session_is_threaded_to_every_call() {
        let sync = synchronizer(sample_local(), FakeVault::default());
        sync.run(SyncMode::Write);
        let seen = sync.vault.sessions_seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|s| s == "mock-session"));
    }
}
