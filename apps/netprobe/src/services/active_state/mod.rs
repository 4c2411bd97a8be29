//! Active-state store.
//!
//! Persists which probes take part in a run across pause/resume. Each probe
//! owns one boolean entry in the settings table, keyed by its identity
//! (`probe.<id>.active`). Entries are written on pause and read on resume.

use std::sync::Arc;

use crate::db::{get_all_settings, get_setting, set_setting, Database};
use crate::error::Result;
use crate::probes::{ProbeId, ProbeRegistry};

pub struct ActiveStateStore {
    db: Arc<Database>,
}

impl ActiveStateStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Write the active flag of every probe in a single transaction.
    ///
    /// Returns the number of entries written.
    pub fn save(&self, registry: &ProbeRegistry) -> Result<usize> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        for probe in registry.all() {
            let key = probe.info().id.active_setting_key();
            set_setting(&tx, &key, &serde_json::Value::Bool(probe.is_active()))?;
        }

        tx.commit()?;
        tracing::debug!("Saved active state of {} probes", registry.len());
        Ok(registry.len())
    }

    /// Overwrite in-memory active flags with the stored ones.
    ///
    /// Probes without an entry keep their current flag. Never adds or
    /// removes entries. Returns the number of flags applied.
    pub fn load(&self, registry: &ProbeRegistry) -> Result<usize> {
        let settings = {
            let conn = self.db.conn()?;
            get_all_settings(&conn)?
        };

        let mut applied = 0;
        for probe in registry.all() {
            let id = probe.info().id;
            match settings.get(&id.active_setting_key()) {
                Some(serde_json::Value::Bool(active)) => {
                    probe.set_active(*active);
                    applied += 1;
                }
                Some(other) => {
                    tracing::warn!("Ignoring non-boolean active state for {}: {}", id, other);
                }
                None => {}
            }
        }

        tracing::debug!("Loaded active state for {} of {} probes", applied, registry.len());
        Ok(applied)
    }

    /// The stored flag for one probe, if any.
    pub fn stored(&self, id: ProbeId) -> Result<Option<bool>> {
        let conn = self.db.conn()?;
        Ok(get_setting(&conn, &id.active_setting_key())?.and_then(|v| v.as_bool()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_database;
    use crate::probes::testing::{Behavior, CallLog, MockProbe};
    use crate::probes::Probe;

    fn registry(defaults: &[(&'static str, bool)]) -> ProbeRegistry {
        let log = CallLog::default();
        ProbeRegistry::new(
            defaults
                .iter()
                .map(|&(id, active)| {
                    Arc::new(MockProbe::new(id, active, Behavior::Pass, &log)) as Arc<dyn Probe>
                })
                .collect(),
        )
    }

    fn flags(registry: &ProbeRegistry) -> Vec<bool> {
        registry.all().iter().map(|p| p.is_active()).collect()
    }

    #[test]
    fn test_save_then_load_round_trips_into_fresh_probes() {
        let store = ActiveStateStore::new(Arc::new(create_test_database()));

        let before = registry(&[("a", true), ("b", true), ("c", true)]);
        before.get("b").unwrap().set_active(false);
        assert_eq!(store.save(&before).unwrap(), 3);

        let after = registry(&[("a", false), ("b", true), ("c", false)]);
        assert_eq!(store.load(&after).unwrap(), 3);
        assert_eq!(flags(&after), vec![true, false, true]);
    }

    #[test]
    fn test_missing_entries_keep_defaults() {
        let store = ActiveStateStore::new(Arc::new(create_test_database()));
        store.save(&registry(&[("a", false)])).unwrap();

        let later = registry(&[("a", true), ("new-probe", true)]);
        assert_eq!(store.load(&later).unwrap(), 1);
        assert_eq!(flags(&later), vec![false, true]);
    }

    #[test]
    fn test_load_on_empty_store_changes_nothing() {
        let store = ActiveStateStore::new(Arc::new(create_test_database()));
        let probes = registry(&[("a", true), ("b", false)]);

        assert_eq!(store.load(&probes).unwrap(), 0);
        assert_eq!(flags(&probes), vec![true, false]);
    }

    #[test]
    fn test_load_ignores_non_boolean_values() {
        let db = Arc::new(create_test_database());
        {
            let conn = db.conn().unwrap();
            set_setting(&conn, "probe.a.active", &serde_json::json!("yes")).unwrap();
        }
        let store = ActiveStateStore::new(db);
        let probes = registry(&[("a", false)]);

        assert_eq!(store.load(&probes).unwrap(), 0);
        assert!(!probes.all()[0].is_active());
    }

    #[test]
    fn test_load_does_not_remove_entries_of_unknown_probes() {
        let store = ActiveStateStore::new(Arc::new(create_test_database()));
        store.save(&registry(&[("retired", false)])).unwrap();

        store.load(&registry(&[("a", true)])).unwrap();
        assert_eq!(store.stored(ProbeId::new("retired")).unwrap(), Some(false));
        assert_eq!(store.stored(ProbeId::new("a")).unwrap(), None);
    }
}
