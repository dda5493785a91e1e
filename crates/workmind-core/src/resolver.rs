//! Effective permission resolution.
//!
//! `resolve` is the authoritative merge of role defaults and per-member
//! overrides. `EffectivePermissionMap` is the indexed view a client builds
//! from whatever the backend returned.

use std::collections::HashMap;

use crate::catalog;
use crate::error::Result;
use crate::role::Role;
use crate::types::{EffectivePermission, GrantType, PermissionSource};

/// One record per catalog permission, in catalog order. An override always
/// wins over the role default.
pub fn resolve(role: Role, overrides: &HashMap<String, GrantType>) -> Vec<EffectivePermission> {
    catalog::names()
        .map(|name| match overrides.get(name) {
            Some(grant) => EffectivePermission::from_override(name, *grant),
            None => EffectivePermission::from_role(name, role.grants_by_default(name)),
        })
        .collect()
}

/// Names the member is allowed to use: the flat list the gate consumes.
pub fn allowed_names(role: Role, overrides: &HashMap<String, GrantType>) -> Vec<String> {
    resolve(role, overrides)
        .into_iter()
        .filter(|p| p.is_allowed)
        .map(|p| p.permission_name)
        .collect()
}

/// Effective permissions keyed by name, preserving the order the backend
/// sent them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectivePermissionMap {
    records: Vec<EffectivePermission>,
    index: HashMap<String, usize>,
}

impl EffectivePermissionMap {
    /// Builds the map, rejecting records that break the override rules.
    /// A repeated name keeps the last record.
    pub fn from_records(records: Vec<EffectivePermission>) -> Result<Self> {
        let mut map = Self::default();
        for record in records {
            record.validate()?;
            match map.index.get(&record.permission_name) {
                Some(&i) => map.records[i] = record,
                None => {
                    map.index
                        .insert(record.permission_name.clone(), map.records.len());
                    map.records.push(record);
                }
            }
        }
        Ok(map)
    }

    pub fn get(&self, name: &str) -> Option<&EffectivePermission> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Unknown names resolve to a denied `NONE` record.
    pub fn effective(&self, name: &str) -> EffectivePermission {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| EffectivePermission::absent(name))
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.is_allowed)
    }

    pub fn source(&self, name: &str) -> PermissionSource {
        self.get(name).map_or(PermissionSource::None, |p| p.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectivePermission> {
        self.records.iter()
    }

    pub fn overrides(&self) -> impl Iterator<Item = &EffectivePermission> {
        self.records
            .iter()
            .filter(|p| p.source == PermissionSource::Custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::*;

    #[test]
    fn role_defaults_without_overrides() {
        let records = resolve(Role::Editor, &HashMap::new());
        assert_eq!(records.len(), PERMISSIONS.len());

        let map = EffectivePermissionMap::from_records(records).unwrap();
        let update = map.get(CHATBOT_UPDATE).unwrap();
        assert!(update.is_allowed);
        assert_eq!(update.source, PermissionSource::Role);

        let delete = map.get(DOCUMENT_DELETE).unwrap();
        assert!(!delete.is_allowed);
        assert_eq!(delete.source, PermissionSource::None);
        assert!(delete.custom_grant_type.is_none());
    }

    #[test]
    fn grant_override_beats_missing_default() {
        let overrides = HashMap::from([(DOCUMENT_DELETE.to_string(), GrantType::Grant)]);
        let map = EffectivePermissionMap::from_records(resolve(Role::Viewer, &overrides)).unwrap();
        let p = map.get(DOCUMENT_DELETE).unwrap();
        assert!(p.is_allowed);
        assert_eq!(p.source, PermissionSource::Custom);
        assert_eq!(p.custom_grant_type, Some(GrantType::Grant));
    }

    #[test]
    fn revoke_override_beats_role_default() {
        let overrides = HashMap::from([(WORKSPACE_UPDATE.to_string(), GrantType::Revoke)]);
        let map = EffectivePermissionMap::from_records(resolve(Role::Owner, &overrides)).unwrap();
        assert!(!map.is_allowed(WORKSPACE_UPDATE));
        assert_eq!(map.source(WORKSPACE_UPDATE), PermissionSource::Custom);
        assert!(map.is_allowed(WORKSPACE_DELETE));
    }

    #[test]
    fn grant_on_already_allowed_changes_only_source() {
        let overrides = HashMap::from([(CHATBOT_UPDATE.to_string(), GrantType::Grant)]);
        let before = resolve(Role::Editor, &HashMap::new());
        let after = resolve(Role::Editor, &overrides);
        let pick = |v: &[EffectivePermission]| {
            v.iter().find(|p| p.permission_name == CHATBOT_UPDATE).cloned().unwrap()
        };
        assert_eq!(pick(&before).is_allowed, pick(&after).is_allowed);
        assert_eq!(pick(&before).source, PermissionSource::Role);
        assert_eq!(pick(&after).source, PermissionSource::Custom);
    }

    #[test]
    fn overrides_on_unknown_names_are_ignored() {
        let overrides = HashMap::from([("calendar.create".to_string(), GrantType::Grant)]);
        let names = allowed_names(Role::Viewer, &overrides);
        assert!(!names.iter().any(|n| n == "calendar.create"));
        assert_eq!(names.len(), Role::Viewer.default_permissions().len());
    }

    #[test]
    fn allowed_names_reflect_overrides() {
        let overrides = HashMap::from([
            (CHATBOT_CHAT.to_string(), GrantType::Revoke),
            (MEMBER_INVITE.to_string(), GrantType::Grant),
        ]);
        let names = allowed_names(Role::Viewer, &overrides);
        assert!(names.contains(&MEMBER_INVITE.to_string()));
        assert!(!names.contains(&CHATBOT_CHAT.to_string()));
    }

    #[test]
    fn unknown_name_is_denied_none() {
        let map = EffectivePermissionMap::from_records(resolve(Role::Owner, &HashMap::new())).unwrap();
        let p = map.effective("billing.manage");
        assert!(!p.is_allowed);
        assert_eq!(p.source, PermissionSource::None);
        assert!(!map.is_allowed("billing.manage"));
    }

    #[test]
    fn invalid_record_fails_the_whole_map() {
        let mut bad = EffectivePermission::from_override(CHATBOT_DELETE, GrantType::Grant);
        bad.is_allowed = false;
        let records = vec![EffectivePermission::from_role(CHATBOT_VIEW, true), bad];
        assert!(EffectivePermissionMap::from_records(records).is_err());
    }

    #[test]
    fn duplicate_name_keeps_last() {
        let records = vec![
            EffectivePermission::from_role(CHATBOT_VIEW, true),
            EffectivePermission::from_override(CHATBOT_VIEW, GrantType::Revoke),
        ];
        let map = EffectivePermissionMap::from_records(records).unwrap();
        assert_eq!(map.len(), 1);
        assert!(!map.is_allowed(CHATBOT_VIEW));
        assert_eq!(map.overrides().count(), 1);
    }
}
