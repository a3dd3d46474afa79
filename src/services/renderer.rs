use crate::error::ResourceError;
use crate::models::{Environment, ResourceKind};
use crate::services::TemplateResolver;
use handlebars::Handlebars;
use serde_json::Value;
use std::sync::Arc;

/// A resource document with the environment substituted in.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResource {
    /// Logical name taken from the document, recorded as the owned object name.
    pub name: String,
    pub document: String,
}

#[derive(Clone)]
pub struct ResourceRenderer {
    resolver: TemplateResolver,
    registry: Arc<Handlebars<'static>>,
}

impl ResourceRenderer {
    pub fn new(resolver: TemplateResolver) -> Self {
        // plain substitution: no helpers, and a missing key is an error
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        Self {
            resolver,
            registry: Arc::new(registry),
        }
    }

    pub async fn render(
        &self,
        kind: ResourceKind,
        file: &str,
        repo_path: &str,
        branch: &str,
        env: &Environment,
    ) -> Result<RenderedResource, ResourceError> {
        let fail = |cause: String| ResourceError::RenderFailed {
            kind,
            name: file.to_string(),
            cause,
        };

        let raw = self
            .resolver
            .fetch_resource_file(repo_path, branch, file)
            .await
            .map_err(|e| fail(e.to_string()))?;
        let text = String::from_utf8(raw).map_err(|e| fail(e.to_string()))?;

        let document = self
            .registry
            .render_template(&text, env)
            .map_err(|e| fail(e.to_string()))?;
        let parsed: Value =
            serde_json::from_str(&document).map_err(|e| fail(format!("invalid document: {}", e)))?;
        let name = resource_name(&parsed)
            .ok_or_else(|| fail("document has no metadata.name".to_string()))?;

        tracing::debug!("Rendered {} {} as {}", kind, file, name);
        Ok(RenderedResource { name, document })
    }
}

/// `metadata.name`, falling back to a top-level `name`.
pub fn resource_name(document: &Value) -> Option<String> {
    document
        .pointer("/metadata/name")
        .or_else(|| document.get("name"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::TemplateRepository;
    use crate::testing::{self, FakeSource};
    use serde_json::json;

    async fn renderer(source: FakeSource) -> ResourceRenderer {
        let templates = TemplateRepository::new(testing::memory_pool().await);
        ResourceRenderer::new(TemplateResolver::new(
            templates,
            Arc::new(source),
            "master".to_string(),
        ))
    }

    fn env() -> Environment {
        [("NS", "ns1"), ("PASSWORD", "p@ss<word>")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn name_comes_from_metadata_or_top_level() {
        assert_eq!(
            resource_name(&json!({"metadata": {"name": "web"}, "name": "other"})).as_deref(),
            Some("web")
        );
        assert_eq!(resource_name(&json!({"name": "svc"})).as_deref(), Some("svc"));
        assert_eq!(resource_name(&json!({"metadata": {"name": "  "}})), None);
        assert_eq!(resource_name(&json!({"kind": "Service"})), None);
    }

    #[tokio::test]
    async fn substitutes_environment_without_escaping() {
        let source = FakeSource::default();
        source.put(
            "org/app",
            "master",
            "d.json",
            r#"{"metadata":{"name":"web-{{NS}}"},"env":"{{PASSWORD}}"}"#,
        );
        let renderer = renderer(source).await;

        let rendered = renderer
            .render(ResourceKind::Deployment, "d.json", "org/app", "master", &env())
            .await
            .unwrap();
        assert_eq!(rendered.name, "web-ns1");
        assert!(rendered.document.contains(r#""env":"p@ss<word>""#));
    }

    #[tokio::test]
    async fn failures_are_reported_per_resource() {
        let source = FakeSource::default();
        source.put("org/app", "master", "broken.json", r#"{"name":"{{#if NS}}x"}"#);
        source.put("org/app", "master", "missing-key.json", r#"{"name":"{{NOPE}}"}"#);
        source.put("org/app", "master", "nameless.json", r#"{"kind":"Service"}"#);
        let renderer = renderer(source).await;

        for file in ["broken.json", "missing-key.json", "nameless.json", "absent.json"] {
            let err = renderer
                .render(ResourceKind::Service, file, "org/app", "master", &env())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ResourceError::RenderFailed {
                    kind: ResourceKind::Service,
                    ..
                }
            ));
            assert!(
                err.to_string()
                    .starts_with(&format!("unable to create service {}: ", file)),
                "{err}"
            );
        }
    }
}
