use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=()";

#[derive(Debug, Clone, Copy)]
pub struct SecurityHeaders {
    include_hsts: bool,
}

impl SecurityHeaders {
    pub fn new(include_hsts: bool) -> Self {
        Self { include_hsts }
    }

    fn headers(&self) -> Vec<(HeaderName, &'static str)> {
        let mut headers = vec![
            (header::X_CONTENT_TYPE_OPTIONS, NOSNIFF),
            (header::X_FRAME_OPTIONS, DENY),
            (header::CONTENT_SECURITY_POLICY, CSP_API_VALUE),
            (header::REFERRER_POLICY, REFERRER_POLICY_VALUE),
            (PERMISSIONS_POLICY, PERMISSIONS_POLICY_VALUE),
        ];
        // Only meaningful behind HTTPS
        if self.include_hsts {
            headers.push((header::STRICT_TRANSPORT_SECURITY, HSTS_VALUE));
        }
        headers
    }

    /// Wraps every route so responses carry the headers unless a handler
    /// already set them.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.headers()
            .into_iter()
            .fold(router, |router, (name, value)| {
                router.layer(SetResponseHeaderLayer::if_not_present(
                    name,
                    HeaderValue::from_static(value),
                ))
            })
    }
}

pub fn create_security_headers_layer(production: bool) -> SecurityHeaders {
    if production {
        tracing::info!("Security: HSTS header enabled (production mode)");
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
    }

    SecurityHeaders::new(production)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn headers_for(production: bool) -> axum::http::HeaderMap {
        let app = create_security_headers_layer(production)
            .apply(Router::new().route("/", get(|| async { "ok" })));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_headers_are_added() {
        let headers = headers_for(false).await;
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert!(headers.contains_key(PERMISSIONS_POLICY));
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_hsts_only_when_requested() {
        let headers = headers_for(true).await;
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }
}
