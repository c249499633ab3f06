use async_trait::async_trait;

/// Identity attached to a request by the auth middleware. The avatar pipeline
/// trusts it and never re-verifies.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user_id: String,
}

/// External auth collaborator: turns a bearer token into an authenticated
/// identity, or rejects it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, bearer_token: &str) -> Option<AuthenticatedIdentity>;
}
