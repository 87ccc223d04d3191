//! Index topology and naming.

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

/// Default suffix appended to the primary index name to derive the Field
/// Registry index name.
pub const DEFAULT_DICTIONARY_SUFFIX: &str = "-dd";

/// Shard/replica topology plus a mapping template for a new index.
///
/// Created once at provisioning time; afterwards the live mapping only grows
/// through additive updates.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    shards: u32,
    replicas: u32,
    template: Value,
}

impl IndexSchema {
    /// Validate topology and build a schema.
    ///
    /// The shard count must be positive and the replica count non-negative.
    /// The template is either a full index body (with `mappings` and/or
    /// `settings` keys) or a bare mapping (`{"properties": ...}`).
    ///
    /// # Examples
    ///
    /// ```
    /// use regmgr_core::IndexSchema;
    /// use serde_json::json;
    ///
    /// let schema = IndexSchema::new(json!({"properties": {}}), 3, 1).unwrap();
    /// assert_eq!(schema.shards(), 3);
    /// assert!(IndexSchema::new(json!({}), 0, 1).is_err());
    /// assert!(IndexSchema::new(json!({}), 1, -1).is_err());
    /// ```
    pub fn new(template: Value, shards: i64, replicas: i64) -> Result<Self> {
        if shards <= 0 {
            return Err(Error::validation_field(
                "shards",
                format!("Invalid number of shards: {shards}"),
            ));
        }
        if replicas < 0 {
            return Err(Error::validation_field(
                "replicas",
                format!("Invalid number of replicas: {replicas}"),
            ));
        }
        let shards = u32::try_from(shards).map_err(|_| {
            Error::validation_field("shards", format!("Invalid number of shards: {shards}"))
        })?;
        let replicas = u32::try_from(replicas).map_err(|_| {
            Error::validation_field("replicas", format!("Invalid number of replicas: {replicas}"))
        })?;
        if !template.is_object() {
            return Err(Error::validation("Index schema template must be a JSON object"));
        }

        Ok(Self {
            shards,
            replicas,
            template,
        })
    }

    /// Number of primary shards.
    pub fn shards(&self) -> u32 {
        self.shards
    }

    /// Number of replicas.
    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// The mapping template as supplied.
    pub fn template(&self) -> &Value {
        &self.template
    }

    /// Build the body of a create-index request.
    ///
    /// Template settings are kept; the topology always overrides
    /// `number_of_shards` and `number_of_replicas`.
    pub fn create_index_body(&self) -> Value {
        let (mut settings, mappings) = match self.template.as_object() {
            Some(obj) if obj.contains_key("mappings") || obj.contains_key("settings") => (
                obj.get("settings")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
                obj.get("mappings").cloned(),
            ),
            _ => (Map::new(), Some(self.template.clone())),
        };

        settings.insert("number_of_shards".to_string(), json!(self.shards));
        settings.insert("number_of_replicas".to_string(), json!(self.replicas));

        let mut body = Map::new();
        body.insert("settings".to_string(), Value::Object(settings));
        if let Some(mappings) = mappings {
            body.insert("mappings".to_string(), mappings);
        }
        Value::Object(body)
    }
}

/// Names of the two indices that make up a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryNames {
    primary: String,
    suffix: String,
}

impl RegistryNames {
    /// Names for a registry using the default `-dd` suffix.
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            suffix: DEFAULT_DICTIONARY_SUFFIX.to_string(),
        }
    }

    /// Override the suffix used to derive the Field Registry index name.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// The primary document index.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// The companion Field Registry index.
    pub fn dictionary(&self) -> String {
        format!("{}{}", self.primary, self.suffix)
    }
}

// ============================================================================
// Tests
// ============================================================================
