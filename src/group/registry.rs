//! Name to group lookup with exactly-once creation

use dashmap::DashMap;

use crate::metrics::GroupMetrics;

use super::engine::{Group, GroupHandle};
use super::types::{GroupSettings, RegistryStats};

/// Owns every group in the process, keyed by name.
///
/// Check-or-create runs under the map's exclusive entry lock for that name,
/// so concurrent first access never starts two groups. The lock is never held
/// across a broadcast: it only covers the lookup and the spawn.
pub struct GroupRegistry {
    groups: DashMap<String, GroupHandle>,
    settings: GroupSettings,
}

impl GroupRegistry {
    pub fn new(settings: GroupSettings) -> Self {
        Self {
            groups: DashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &GroupSettings {
        &self.settings
    }

    /// Return the group called `name`, starting it if this is the first reference
    pub fn get_or_create(&self, name: &str) -> GroupHandle {
        // Fast path: shared lock only
        if let Some(group) = self.groups.get(name) {
            return group.clone();
        }

        self.groups
            .entry(name.to_string())
            .or_insert_with(|| {
                GroupMetrics::record_group_created();
                tracing::info!(group = %name, "Group created");
                Group::spawn(name, &self.settings)
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<GroupHandle> {
        self.groups.get(name).map(|group| group.clone())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> RegistryStats {
        let mut groups: Vec<_> = self.groups.iter().map(|e| e.value().stats()).collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        RegistryStats {
            total_groups: groups.len(),
            total_members: groups.iter().map(|g| g.member_count).sum(),
            groups,
        }
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new(GroupSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_name_returns_same_group() {
        let registry = GroupRegistry::default();
        let first = registry.get_or_create("lobby");
        let second = registry.get_or_create("lobby");

        assert_eq!(first.id(), second.id());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_names_are_independent() {
        let registry = GroupRegistry::default();
        let lobby = registry.get_or_create("lobby");
        let games = registry.get_or_create("games");

        assert_ne!(lobby.id(), games.id());
        assert_eq!(registry.names(), vec!["games".to_string(), "lobby".to_string()]);
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        let registry = GroupRegistry::default();
        assert!(registry.get("lobby").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_registries_are_isolated() {
        let a = GroupRegistry::default();
        let b = GroupRegistry::default();
        assert_ne!(a.get_or_create("lobby").id(), b.get_or_create("lobby").id());
    }

    #[tokio::test]
    async fn test_stats_sum_members() {
        let registry = GroupRegistry::default();
        let lobby = registry.get_or_create("lobby");
        let (member, _outbox) = crate::group::Member::new("alice", 4);
        lobby.join(member).await.unwrap();
        lobby.members().await.unwrap();

        let stats = registry.stats();
        assert_eq!(stats.total_groups, 1);
        assert_eq!(stats.total_members, 1);
        assert_eq!(stats.groups[0].name, "lobby");
    }
}
