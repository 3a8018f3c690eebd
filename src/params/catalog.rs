use ahash::AHashMap;

use super::types::{ParamDefinition, ParamGroup};
use crate::error::CatalogError;

/// Registry of parameter groups and definitions, populated once at plugin
/// initialization and read per-request afterwards.
#[derive(Debug, Clone, Default)]
pub struct ParamCatalog {
    groups: AHashMap<String, ParamGroup>,
    params: AHashMap<String, ParamDefinition>,
}

impl ParamCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_group(&mut self, group: ParamGroup) -> Result<(), CatalogError> {
        if self.groups.contains_key(&group.id) {
            return Err(CatalogError::DuplicateGroup(group.id));
        }
        self.groups.insert(group.id.clone(), group);
        Ok(())
    }

    pub fn register(&mut self, param: ParamDefinition) -> Result<(), CatalogError> {
        if self.params.contains_key(&param.id) {
            return Err(CatalogError::DuplicateParam(param.id));
        }
        if let Some(group_id) = &param.group {
            if !self.groups.contains_key(group_id) {
                return Err(CatalogError::UnknownGroup {
                    param_id: param.id,
                    group_id: group_id.clone(),
                });
            }
        }
        self.params.insert(param.id.clone(), param);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ParamDefinition> {
        self.params.get(id)
    }

    pub fn group(&self, id: &str) -> Option<&ParamGroup> {
        self.groups.get(id)
    }

    pub fn params(&self) -> impl Iterator<Item = &ParamDefinition> {
        self.params.values()
    }

    /// All parameters belonging to a group, sorted by order priority.
    pub fn group_members(&self, group_id: &str) -> Vec<&ParamDefinition> {
        let mut members: Vec<&ParamDefinition> = self
            .params
            .values()
            .filter(|param| param.group.as_deref() == Some(group_id))
            .collect();
        members.sort_by(|a, b| a.order_priority.total_cmp(&b.order_priority));
        members
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
