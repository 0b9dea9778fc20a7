//! Paginated client
//!
//! Composes a base [`DelegateRegistry`] with per-model default cursor fields
//! and exposes `paginate` for every registered model. The base registry is
//! left untouched and stays reachable through [`PaginatedClient::base`].

use crate::delegate::{Delegate, DelegateRegistry};
use crate::error::{Error, Result};
use crate::pagination::{PageSequence, PaginateArgs, Paginator};
use crate::schema::SchemaDefinition;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Client exposing a bound [`Paginator`] per model
#[derive(Debug, Clone)]
pub struct PaginatedClient {
    base: DelegateRegistry,
    paginators: BTreeMap<String, Paginator>,
}

impl PaginatedClient {
    /// Start building a client around `base`
    pub fn builder(base: DelegateRegistry) -> PaginatedClientBuilder {
        PaginatedClientBuilder {
            base,
            models: Vec::new(),
        }
    }

    /// Register every schema model with its resolved default cursor field
    ///
    /// Each model's delegate is looked up under its delegate name
    /// (`UserProfile` -> `userProfile`).
    pub fn from_schema(base: DelegateRegistry, schema: &SchemaDefinition) -> Result<Self> {
        schema
            .models
            .iter()
            .fold(Self::builder(base), |builder, model| {
                builder.model(
                    model.delegate_name(),
                    model.default_cursor_field().map(String::from),
                )
            })
            .build()
    }

    /// Paginator bound to `model`
    pub fn paginator(&self, model: &str) -> Result<&Paginator> {
        self.paginators
            .get(model)
            .ok_or_else(|| Error::unknown_model(model))
    }

    /// Start a page sequence over `model`
    pub fn paginate(&self, model: &str, args: PaginateArgs) -> Result<PageSequence> {
        self.paginator(model)?.paginate(args)
    }

    /// Underlying delegate for `model`
    pub fn delegate(&self, model: &str) -> Result<Arc<dyn Delegate>> {
        self.base
            .get(model)
            .ok_or_else(|| Error::unknown_model(model))
    }

    /// Models with pagination installed, sorted
    pub fn models(&self) -> Vec<&str> {
        self.paginators.keys().map(String::as_str).collect()
    }

    /// Always true; lets callers check a client was built through this type
    pub fn has_pagination(&self) -> bool {
        true
    }

    /// The registry this client was built from
    pub fn base(&self) -> &DelegateRegistry {
        &self.base
    }
}

/// Builder for [`PaginatedClient`]
#[derive(Debug)]
pub struct PaginatedClientBuilder {
    base: DelegateRegistry,
    models: Vec<(String, Option<String>)>,
}

impl PaginatedClientBuilder {
    /// Install pagination on `name` with an optional default cursor field
    #[must_use]
    pub fn model(mut self, name: impl Into<String>, default_cursor_field: Option<String>) -> Self {
        self.models.push((name.into(), default_cursor_field));
        self
    }

    /// Resolve every model against the base registry
    pub fn build(self) -> Result<PaginatedClient> {
        let mut paginators = BTreeMap::new();
        for (name, default_cursor_field) in self.models {
            let delegate = self
                .base
                .get(&name)
                .ok_or_else(|| Error::unknown_model(&name))?;

            if default_cursor_field.is_none() {
                tracing::warn!(
                    model = %name,
                    "No default cursor field; paginate calls must pass one"
                );
            }

            paginators.insert(name, Paginator::bind(delegate, default_cursor_field));
        }

        tracing::debug!(models = paginators.len(), "Installed pagination");

        Ok(PaginatedClient {
            base: self.base,
            paginators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::MemoryDelegate;
    use crate::schema::load_schema_from_str;
    use serde_json::json;

    fn registry() -> DelegateRegistry {
        let users = MemoryDelegate::from_values(
            "user",
            vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})],
        )
        .unwrap();
        let logs = MemoryDelegate::from_values("auditLog", vec![json!({"message": "a"})]).unwrap();

        DelegateRegistry::new()
            .with("user", Arc::new(users))
            .with("auditLog", Arc::new(logs))
    }

    #[tokio::test]
    async fn test_builder_and_paginate() {
        let client = PaginatedClient::builder(registry())
            .model("user", Some("id".to_string()))
            .build()
            .unwrap();

        assert!(client.has_pagination());
        assert_eq!(client.models(), vec!["user"]);

        let mut seq = client.paginate("user", PaginateArgs::new(2)).unwrap();
        assert_eq!(seq.next_page().await.unwrap().unwrap().len(), 2);
        assert_eq!(seq.next_page().await.unwrap().unwrap().len(), 1);
        assert!(seq.next_page().await.unwrap().is_none());
    }

    #[test]
    fn test_builder_unknown_delegate() {
        let err = PaginatedClient::builder(registry())
            .model("comment", Some("id".to_string()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownModel { ref model } if model == "comment"));
    }

    #[test]
    fn test_paginate_unregistered_model() {
        let client = PaginatedClient::builder(registry()).build().unwrap();
        assert!(client.paginate("user", PaginateArgs::new(1)).is_err());
        // the base delegate is still reachable
        assert_eq!(client.delegate("user").unwrap().model(), "user");
    }

    #[test]
    fn test_from_schema_uses_default_cursor_fields() {
        let schema = load_schema_from_str(
            r"
models:
  - name: User
    fields:
      - name: id
        is_id: true
  - name: AuditLog
    fields:
      - name: message
",
        )
        .unwrap();

        let client = PaginatedClient::from_schema(registry(), &schema).unwrap();
        assert_eq!(client.models(), vec!["auditLog", "user"]);
        assert_eq!(
            client.paginator("user").unwrap().default_cursor_field(),
            Some("id")
        );

        // no default: must pass one explicitly
        let err = client.paginate("auditLog", PaginateArgs::new(5)).unwrap_err();
        assert!(matches!(err, Error::MissingCursorField { .. }));
        assert!(client
            .paginate("auditLog", PaginateArgs::new(5).cursor_field("message"))
            .is_ok());
    }
}
