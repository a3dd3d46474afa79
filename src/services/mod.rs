pub mod environment;
pub mod materializer;
pub mod renderer;
pub mod resolver;
pub mod solution_service;
pub mod template_service;

pub use environment::EnvironmentCompositor;
pub use materializer::Materializer;
pub use renderer::{RenderedResource, ResourceRenderer, resource_name};
pub use resolver::TemplateResolver;
pub use solution_service::{RunSolutionRequest, RunSolutionResult, SolutionService};
pub use template_service::{CreateTemplateRequest, TemplateService};
