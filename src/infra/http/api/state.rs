use std::sync::Arc;

use crate::application::articles::ArticleService;
use crate::application::comments::CommentService;
use crate::application::metrics::MetricsService;
use crate::application::pagination::PageLimits;
use crate::application::users::UserService;
use crate::cache::CacheStore;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub articles: Arc<ArticleService>,
    pub comments: Arc<CommentService>,
    pub users: Arc<UserService>,
    pub metrics: Arc<MetricsService>,
}

impl ApiState {
    pub fn new(
        repos: Arc<PostgresRepositories>,
        cache: Arc<CacheStore>,
        limits: PageLimits,
    ) -> Self {
        Self {
            articles: Arc::new(ArticleService::new(repos.clone(), cache.clone(), limits)),
            comments: Arc::new(CommentService::new(repos.clone(), cache.clone())),
            users: Arc::new(UserService::new(repos.clone())),
            metrics: Arc::new(MetricsService::new(repos, cache)),
        }
    }
}
