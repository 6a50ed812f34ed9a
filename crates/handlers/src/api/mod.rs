// Copyright 2024 The Gantry developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{
    extract::FromRequestParts,
    http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::call_context::{CallContext, Storage};

pub mod public_registration;

pub fn router<S>() -> (OpenApi, Router<S>)
where
    S: Clone + Send + Sync + 'static,
    CallContext: FromRequestParts<S>,
    Storage: FromRequestParts<S>,
{
    let mut api = OpenApi::default();
    let router = ApiRouter::<S>::new()
        .nest("/api/settings", settings_router())
        .finish_api_with(&mut api, |t| {
            t.title("Gantry settings API")
                .description("Platform-wide settings of the Gantry dashboard")
        });

    let router = router
        // Serve the OpenAPI document as JSON
        .route(
            "/api/spec.json",
            axum::routing::get({
                let res = Json(api.clone());
                move || std::future::ready(res.clone())
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]),
        );

    (api, router)
}

fn settings_router<S>() -> ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
    CallContext: FromRequestParts<S>,
    Storage: FromRequestParts<S>,
{
    use aide::axum::routing::get_with;

    ApiRouter::<S>::new().api_route(
        "/public-registration",
        get_with(
            self::public_registration::get,
            self::public_registration::get_doc,
        )
        .put_with(
            self::public_registration::set,
            self::public_registration::set_doc,
        ),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;

    use crate::test_utils::{setup, RequestBuilderExt, ResponseExt, TestState};

    #[sqlx::test(migrator = "gantry_storage_pg::MIGRATOR")]
    async fn test_openapi_document(pool: PgPool) {
        setup();
        let state = TestState::from_pool(pool).await.unwrap();

        let request = Request::get("/api/spec.json").empty();
        let response = state.request(request).await;
        response.assert_status(StatusCode::OK);

        let body: serde_json::Value = response.json();
        assert_eq!(body["info"]["title"], "Gantry settings API");
        let path = &body["paths"]["/api/settings/public-registration"];
        assert_eq!(path["get"]["operationId"], "getPublicRegistration");
        assert_eq!(path["put"]["operationId"], "setPublicRegistration");
    }
}
