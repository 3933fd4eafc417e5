use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use error_stack::{Report, ResultExt};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};
use utoipa_axum::router::OpenApiRouter;

use issues_core::identity::{Identity, Role};

/*
 * How does this work?
 * The credential-issuance subsystem (external to this service) signs a JWT
 * with a shared HS256 secret. The token carries the caller id in `sub` and
 * a fixed `role` claim. Every request under /issues passes through the
 * `authenticate` middleware; if a bearer token is presented it must verify,
 * and the resulting Identity is placed in request extensions. Role
 * enforcement happens once, per route, via `protected_route` — handlers
 * never re-check roles themselves.
 */

pub type AuthConfigResult<T> = Result<T, Report<MissingAuthProperty>>;

#[derive(Debug, thiserror::Error)]
#[error("{0} auth property not specified")]
pub struct MissingAuthProperty(&'static str);

const JWT_SECRET: &str = "JWT_SECRET";

#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn from_env() -> AuthConfigResult<Self> {
        let secret = std::env::var(JWT_SECRET).change_context(MissingAuthProperty(JWT_SECRET))?;
        Ok(Self::new(&secret))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// expiration, seconds since the epoch
    pub exp: usize,
}

/// Pure verification: the only way an `Identity` enters the system. Any
/// defect in the credential (bad signature, expiry, unknown role) reads as
/// unauthenticated.
pub fn decode_identity(token: &str, config: &AuthConfig) -> Result<Identity, StatusCode> {
    let token_data =
        decode::<Claims>(token, &config.decoding_key, &config.validation).map_err(|e| {
            error!("token validation error: {e}");
            StatusCode::UNAUTHORIZED
        })?;

    let role = token_data.claims.role.parse::<Role>().map_err(|e| {
        error!("token carried an unusable role: {e}");
        StatusCode::UNAUTHORIZED
    })?;

    Ok(Identity::new(token_data.claims.sub, role))
}

// routes that require an identity look for one in extensions; the public
// feed goes through without
#[instrument(skip_all)]
pub async fn authenticate(
    State(config): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    if let Some(auth_header) = auth_header {
        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            error!("invalid authorization type");
            return Err(StatusCode::UNAUTHORIZED);
        };

        let identity = decode_identity(token, &config)?;

        debug!(
            "token validated for caller '{}' with role {}",
            identity.id, identity.role
        );

        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

pub trait ProtectedRouter<S> {
    fn protected_route(
        self,
        path: &str,
        method_router: MethodRouter<S>,
        required_role: Role,
    ) -> Self;
}

impl<S> ProtectedRouter<S> for OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
{
    #[instrument(skip_all)]
    fn protected_route(
        self,
        path: &str,
        method_router: MethodRouter<S>,
        required_role: Role,
    ) -> Self {
        debug!("creating route '{path}' restricted to the {required_role} role");
        self.route(
            path,
            method_router.layer(middleware::from_fn_with_state(required_role, require_role)),
        )
    }
}

#[instrument(skip_all)]
async fn require_role(
    State(required_role): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let identity = req.extensions().get::<Identity>().ok_or_else(|| {
        error!("endpoint requires an authenticated caller, none was found");
        StatusCode::UNAUTHORIZED
    })?;

    if identity.role == required_role {
        Ok(next.run(req).await)
    } else {
        warn!(
            "caller {} lacks the {required_role} role",
            identity.id
        );
        Err(StatusCode::FORBIDDEN)
    }
}
