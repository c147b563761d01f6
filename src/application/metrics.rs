use std::sync::Arc;

use quillpost_api_types::MetricsResponse;

use crate::{
    application::repos::RepoError,
    cache::CacheStore,
    infra::db::{PostgresRepositories, QueryCounter},
};

#[derive(Clone)]
pub struct MetricsService {
    repos: Arc<PostgresRepositories>,
    cache: Arc<CacheStore>,
}

impl MetricsService {
    pub fn new(repos: Arc<PostgresRepositories>, cache: Arc<CacheStore>) -> Self {
        Self { repos, cache }
    }

    /// Row totals from the database plus the cache's hit statistics.
    pub async fn snapshot(&self, queries: &QueryCounter) -> Result<MetricsResponse, RepoError> {
        let mut session = self.repos.begin(queries).await?;
        let totals = session.content_totals().await?;
        session.commit().await?;

        Ok(MetricsResponse {
            total_articles: totals.articles,
            total_comments: totals.comments,
            total_users: totals.users,
            avg_comments_per_article: average(totals.comments, totals.articles),
            cache_info: self.cache.stats().to_info(),
        })
    }
}

/// `numerator / denominator` rounded to two decimals (ties to even); zero for an empty denominator.
fn average(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64 * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::average;

    #[test]
    fn average_rounds_to_two_decimals() {
        assert_eq!(average(0, 0), 0.0);
        assert_eq!(average(5, 0), 0.0);
        assert_eq!(average(1, 3), 0.33);
        assert_eq!(average(2, 3), 0.67);
        assert_eq!(average(10, 4), 2.5);
        assert_eq!(average(1, 8), 0.12);
        assert_eq!(average(3, 8), 0.38);
    }
}
