use crate::application::services::idea_service::IdeaService;
use crate::application::services::trader_service::TraderService;
use crate::auth::IdentityResolver;
use crate::rate_limit::PrincipalRateLimiter;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ideas: Arc<IdeaService>,
    pub traders: Arc<TraderService>,
    pub resolver: Arc<IdentityResolver>,
    pub rate_limiter: PrincipalRateLimiter,
}
