//! OpenAPI documentation, served at `/openapi.json`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use backlog_core::models;

struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Backlog API",
        version = "0.1.0",
        description = "Backlog items with token-gated mutation and secure image uploads. Errors are RFC 7807 problem documents (application/problem+json) carrying a correlation_id that matches the X-Correlation-ID header."
    ),
    paths(
        handlers::health::health,
        handlers::health::readiness,
        handlers::items::list_items,
        handlers::items::create_item,
        handlers::items::get_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        handlers::uploads::upload_image,
        handlers::uploads::upload_item_image,
    ),
    components(schemas(
        models::Item,
        models::ItemStatus,
        models::CreateItemRequest,
        models::UpdateItemRequest,
        handlers::uploads::UploadForm,
        handlers::uploads::UploadResponse,
    )),
    modifiers(&ApiKeyAddon),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "items", description = "Backlog item management"),
        (name = "uploads", description = "Secure image uploads")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_item_and_upload_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/items"));
        assert!(spec.paths.paths.contains_key("/items/{id}"));
        assert!(spec.paths.paths.contains_key("/items/{id}/images"));
        assert!(spec.paths.paths.contains_key("/uploads"));
    }
}
