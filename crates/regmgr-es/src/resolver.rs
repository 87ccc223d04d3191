//! Field type resolution: registry first, then a caller-supplied fallback.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regmgr_core::config::DEFAULT_DOCS_URL;
use regmgr_core::{Error, FieldRegistryEntry, ResolvedField, Result, TypeSource};

use crate::registry::{FieldRegistry, Lookup};

/// Resolved types for one request, sorted by field identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every requested field with its type and where the type came from.
    pub fields: Vec<ResolvedField>,
}

impl Resolution {
    /// Number of resolved fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields whose type came from the fallback.
    pub fn from_fallback(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields
            .iter()
            .filter(|f| f.source == TypeSource::Fallback)
    }

    /// Registry entries for the fallback-derived fields, for callers that
    /// choose to persist them.
    pub fn fallback_entries(&self) -> Vec<FieldRegistryEntry> {
        self.from_fallback()
            .map(|f| FieldRegistryEntry::new(f.field_id.clone(), f.es_data_type.clone()))
            .collect()
    }
}

/// Resolves field identifiers to engine data types.
#[derive(Clone)]
pub struct TypeResolver {
    registry: FieldRegistry,
    help_url: String,
    known: Option<Arc<BTreeSet<String>>>,
}

impl TypeResolver {
    /// Resolver backed by `registry`.
    pub fn new(registry: FieldRegistry) -> Self {
        Self {
            registry,
            help_url: DEFAULT_DOCS_URL.to_string(),
            known: None,
        }
    }

    /// Override the documentation link quoted in unresolved-field errors.
    pub fn with_help_url(mut self, help_url: impl Into<String>) -> Self {
        self.help_url = help_url.into();
        self
    }

    /// Restrict registry lookups to `known`, the identifiers the registry
    /// holds. Anything outside the set goes straight to the fallback.
    pub fn with_known_fields(mut self, known: Arc<BTreeSet<String>>) -> Self {
        self.known = Some(known);
        self
    }

    /// The registry consulted first.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Resolve every identifier in `ids`.
    ///
    /// The registry is queried once for all identifiers. `fallback` is
    /// called only for identifiers the registry does not know. With a
    /// known-field set, only identifiers in the set are looked up, and no
    /// request is made when none are.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedFields`] naming every identifier neither source
    /// could type, or the registry's transport error.
    pub async fn resolve<I, S, F>(&self, ids: I, fallback: F) -> Result<Resolution>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&str) -> Option<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(Resolution::default());
        }

        let lookups = match &self.known {
            Some(known) => {
                let (listed, unlisted): (BTreeSet<String>, BTreeSet<String>) =
                    ids.into_iter().partition(|id| known.contains(id));
                let mut lookups = if listed.is_empty() {
                    BTreeMap::new()
                } else {
                    self.registry.get_many(listed).await?
                };
                lookups.extend(unlisted.into_iter().map(|id| (id, Lookup::NotFound)));
                lookups
            }
            None => self.registry.get_many(ids).await?,
        };

        let mut fields = Vec::with_capacity(lookups.len());
        let mut unresolved = Vec::new();
        for (id, lookup) in lookups {
            match lookup {
                Lookup::Found(data_type) => {
                    fields.push(ResolvedField::new(id, data_type, TypeSource::Registry));
                }
                Lookup::NotFound => match fallback(&id) {
                    Some(data_type) => {
                        tracing::debug!(field = %id, data_type = %data_type, "Type from fallback");
                        fields.push(ResolvedField::new(id, data_type, TypeSource::Fallback));
                    }
                    None => unresolved.push(id),
                },
            }
        }

        if !unresolved.is_empty() {
            tracing::error!(count = unresolved.len(), "Unresolved field types");
            return Err(Error::UnresolvedFields {
                fields: unresolved,
                help_url: self.help_url.clone(),
            });
        }

        Ok(Resolution { fields })
    }
}

// ============================================================================
// Tests
// ============================================================================
