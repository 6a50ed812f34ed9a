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

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, ToSocketAddrs};

use anyhow::Context;
use axum::{
    extract::MatchedPath,
    http::{Request, Response},
    Router,
};
use gantry_config::{HttpBindConfig, HttpResource};
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

use crate::app_state::AppState;

fn make_http_span<B>(req: &Request<B>, listener: Option<&str>) -> Span {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());

    let span_name = match route.as_deref() {
        Some(route) => format!("{method} {route}", method = req.method()),
        None => req.method().to_string(),
    };

    info_span!(
        "http.server.request",
        otel.name = %span_name,
        http.method = %req.method(),
        http.target = %req.uri(),
        http.route = route.as_deref(),
        http.status_code = tracing::field::Empty,
        gantry.listener.name = listener,
    )
}

/// Build the router for one listener, mounting the requested resources
///
/// The routes are nested under `prefix` when one is set.
pub fn build_router(
    state: AppState,
    resources: &[HttpResource],
    prefix: Option<&str>,
    name: Option<&str>,
) -> Router<()> {
    let mut router = Router::new();

    for resource in resources {
        router = match resource {
            HttpResource::Health => router.merge(gantry_handlers::healthcheck_router::<AppState>()),
            HttpResource::Api => {
                let (_api, api_router) = gantry_handlers::api_router::<AppState>();
                router.merge(api_router)
            }
            HttpResource::Human => router.merge(gantry_handlers::human_router::<AppState>()),
        }
    }

    let router = match prefix.map(|prefix| prefix.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => Router::new().nest(prefix, router),
        _ => router,
    };

    let name = name.map(ToOwned::to_owned);
    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |req: &Request<_>| make_http_span(req, name.as_deref()))
                .on_response(|response: &Response<_>, _latency, span: &Span| {
                    span.record("http.status_code", response.status().as_u16());
                }),
        )
        .with_state(state)
}

/// Bind the sockets of one listener
///
/// A bind without a host listens on both the IPv6 and the IPv4 unspecified
/// addresses, using the first one which works.
pub fn build_listeners(
    configs: &[HttpBindConfig],
) -> Result<Vec<tokio::net::TcpListener>, anyhow::Error> {
    let mut listeners = Vec::with_capacity(configs.len());

    for bind in configs {
        let listener = match bind {
            HttpBindConfig::Listen { host, port } => {
                let addrs = match host.as_deref() {
                    Some(host) => (host, *port)
                        .to_socket_addrs()
                        .context("could not parse listener host")?
                        .collect(),

                    None => vec![
                        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), *port),
                        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), *port),
                    ],
                };

                TcpListener::bind(&addrs[..]).context("could not bind address")?
            }

            HttpBindConfig::Address { address } => {
                let addr: SocketAddr = address
                    .parse()
                    .context("could not parse listener address")?;
                TcpListener::bind(addr).context("could not bind address")?
            }
        };

        listener.set_nonblocking(true)?;
        listeners.push(tokio::net::TcpListener::from_std(listener)?);
    }

    Ok(listeners)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;

    fn state() -> AppState {
        // Never connects, none of the routes below touch the database
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/gantry")
            .unwrap();
        AppState { pool }
    }

    async fn status(router: Router, uri: &str) -> StatusCode {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn only_mounts_requested_resources() {
        let router = build_router(state(), &[HttpResource::Health], None, Some("internal"));
        assert_eq!(status(router, "/api/spec.json").await, StatusCode::NOT_FOUND);

        let router = build_router(state(), &[HttpResource::Api], None, None);
        assert_eq!(status(router, "/api/spec.json").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn nests_routes_under_the_prefix() {
        let router = build_router(state(), &[HttpResource::Api], Some("/dashboard/"), None);
        assert_eq!(
            status(router.clone(), "/dashboard/api/spec.json").await,
            StatusCode::OK
        );
        assert_eq!(status(router, "/api/spec.json").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn binds_local_addresses() {
        let listeners = build_listeners(&[
            HttpBindConfig::Address {
                address: "127.0.0.1:0".to_owned(),
            },
            HttpBindConfig::Listen {
                host: Some("127.0.0.1".to_owned()),
                port: 0,
            },
        ])
        .unwrap();

        assert_eq!(listeners.len(), 2);
        for listener in listeners {
            assert!(listener.local_addr().unwrap().ip().is_loopback());
        }
    }

    #[test]
    fn rejects_invalid_addresses() {
        let result = build_listeners(&[HttpBindConfig::Address {
            address: "not an address".to_owned(),
        }]);
        assert!(result.is_err());
    }
}
