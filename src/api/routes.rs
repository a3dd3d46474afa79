use super::handlers::{health, solution, template};
use super::middleware::cors::add_cors;
use crate::services::{SolutionService, TemplateService};
use axum::{
    Router,
    routing::{delete, get, post},
};

#[derive(Clone)]
pub struct AppState {
    pub template_service: TemplateService,
    pub solution_service: SolutionService,
}

pub fn create_router(
    template_service: TemplateService,
    solution_service: SolutionService,
    cors: bool,
) -> Router {
    let state = AppState {
        template_service,
        solution_service,
    };

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Template catalog
        .route(
            "/templates",
            get(template::list_templates).post(template::create_template),
        )
        .route("/templates/{template}", delete(template::delete_template))
        .route("/templates/{template}/env", get(template::get_template_env))
        .route(
            "/templates/{template}/resources",
            get(template::get_template_resources),
        )
        .route(
            "/templates/{template}/activate",
            post(template::activate_template),
        )
        .route(
            "/templates/{template}/deactivate",
            post(template::deactivate_template),
        )
        // Solutions
        .route("/solutions", get(solution::list_user_solutions))
        .route(
            "/namespaces/{namespace}/solutions",
            get(solution::list_namespace_solutions)
                .post(solution::run_solution)
                .delete(solution::delete_namespace_solutions),
        )
        .route(
            "/namespaces/{namespace}/solutions/{name}",
            get(solution::get_solution).delete(solution::delete_solution),
        )
        .route(
            "/namespaces/{namespace}/solutions/{name}/deployments",
            get(solution::list_solution_deployments),
        )
        .route(
            "/namespaces/{namespace}/solutions/{name}/services",
            get(solution::list_solution_services),
        )
        .with_state(state);

    if cors { add_cors(api_routes) } else { api_routes }
}
