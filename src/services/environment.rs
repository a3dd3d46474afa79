use crate::error::{AppError, Result};
use crate::models::{Environment, Manifest};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderErrorReason,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub const NAMESPACE_KEY: &str = "NS";
pub const VOLUME_KEY: &str = "VOLUME";
pub const OWNER_KEY: &str = "OWNER";

const RAND_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MAX_RAND_LEN: u64 = 4096;

/// Resolves generator placeholders in manifests and builds the final environment.
#[derive(Clone)]
pub struct EnvironmentCompositor {
    registry: Arc<Handlebars<'static>>,
}

impl EnvironmentCompositor {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper(
            "rand_string",
            Box::new(RandString {
                rng: Mutex::new(rng),
            }),
        );
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Renders the raw manifest with no data context, then parses it.
    pub fn render_manifest(&self, raw: &[u8]) -> Result<Manifest> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| AppError::InvalidTemplate(format!("manifest is not UTF-8: {}", e)))?;
        let rendered = self
            .registry
            .render_template(text, &serde_json::Value::Null)
            .map_err(|e| AppError::InvalidTemplate(format!("manifest: {}", e)))?;
        serde_json::from_str(&rendered)
            .map_err(|e| AppError::InvalidTemplate(format!("manifest: {}", e)))
    }

    pub fn compose(
        &self,
        defaults: Environment,
        overrides: &Environment,
        namespace: &str,
        owner: &str,
    ) -> Environment {
        compose_environment(defaults, overrides, namespace, owner)
    }
}

impl Default for EnvironmentCompositor {
    fn default() -> Self {
        Self::new()
    }
}

/// Overrides always win over defaults, whether or not defaults are empty.
/// Derived keys go in last so the owner cannot be spoofed.
pub fn compose_environment(
    defaults: Environment,
    overrides: &Environment,
    namespace: &str,
    owner: &str,
) -> Environment {
    let mut env = defaults;
    env.extend(
        overrides
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    env.insert(NAMESPACE_KEY.to_string(), namespace.to_string());
    env.entry(VOLUME_KEY.to_string())
        .or_insert_with(|| format!("{}-volume", namespace));
    env.insert(OWNER_KEY.to_string(), owner.to_string());
    env
}

/// `{{rand_string N}}`: N random lowercase alphanumerics from a shared generator.
struct RandString {
    rng: Mutex<StdRng>,
}

impl RandString {
    fn generate(&self, len: usize) -> String {
        let mut rng = self.rng.lock();
        (0..len)
            .map(|_| RAND_ALPHABET[rng.gen_range(0..RAND_ALPHABET.len())] as char)
            .collect()
    }
}

impl HelperDef for RandString {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("rand_string", 0))?;
        let len = param
            .value()
            .as_u64()
            .filter(|len| *len <= MAX_RAND_LEN)
            .ok_or(RenderErrorReason::InvalidParamType(
                "rand_string length must be an integer up to 4096",
            ))?;
        out.write(&self.generate(len as usize))?;
        Ok(())
    }
}
