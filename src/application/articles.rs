//! Article reads and writes with cache-aside semantics.
//!
//! Reads go through [`read_through`]. Writes commit first, then purge the
//! entries the write made stale, then return; the purge is never deferred.

use std::sync::Arc;

use quillpost_api_types::{
    ArticleCreateRequest, ArticleDetailResponse, ArticleListQuery, ArticleResponse,
    ArticleUpdateRequest, PaginatedResponse,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    application::{
        pagination::{ListParams, PageLimits, PaginationError},
        repos::{CreateArticleParams, RepoError, UpdateArticleParams},
        views,
    },
    cache::{CacheKey, CacheStore, WriteEvent, invalidate, read_through, read_through_value},
    domain::{
        entities::ArticleAggregate,
        error::DomainError,
        slug::{SlugError, derive_slug, slug_candidates},
        validation::{SUMMARY_MAX, TITLE_MAX, max_chars, normalize_tags, required},
    },
    infra::db::{DbSession, PostgresRepositories, QueryCounter},
};

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Slug(#[from] SlugError),
}

#[derive(Clone)]
pub struct ArticleService {
    repos: Arc<PostgresRepositories>,
    cache: Arc<CacheStore>,
    limits: PageLimits,
}

impl ArticleService {
    pub fn new(repos: Arc<PostgresRepositories>, cache: Arc<CacheStore>, limits: PageLimits) -> Self {
        Self {
            repos,
            cache,
            limits,
        }
    }

    /// Validate a raw list query against the configured page limits.
    pub fn list_params(&self, query: &ArticleListQuery) -> Result<ListParams, ArticleError> {
        Ok(ListParams::parse(
            query.page,
            query.page_size,
            query.sort_by.as_deref(),
            query.sort_order.as_deref(),
            self.limits,
        )?)
    }

    /// One page of published articles. A miss costs three statements
    /// regardless of page size: count, joined page, batched tags.
    pub async fn list(
        &self,
        queries: &QueryCounter,
        params: ListParams,
    ) -> Result<PaginatedResponse<ArticleResponse>, ArticleError> {
        let ttl = self.cache.config().list_ttl;
        let fetched = read_through_value(&self.cache, CacheKey::article_list(params), ttl, || {
            self.load_page(queries, params)
        })
        .await?;

        debug!(source = ?fetched.source, page = params.page, "article list served");
        Ok(fetched.value)
    }

    async fn load_page(
        &self,
        queries: &QueryCounter,
        params: ListParams,
    ) -> Result<PaginatedResponse<ArticleResponse>, ArticleError> {
        let mut session = self.repos.begin(queries).await?;
        let total = session.count_published_articles().await?;
        let rows = session.list_published_articles(&params).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.article.id).collect();
        let tags = session.tags_for_articles(&ids).await?;
        session.commit().await?;

        Ok(PaginatedResponse {
            items: views::article_list_items(rows, tags),
            total,
            page: params.page,
            page_size: params.page_size,
            pages: params.pages_for(total),
        })
    }

    /// Article detail, or `None` when no article has `id`.
    ///
    /// A miss bumps the view count in the same transaction, so the count only
    /// advances while the detail is not cached.
    pub async fn get(
        &self,
        queries: &QueryCounter,
        id: i64,
    ) -> Result<Option<ArticleDetailResponse>, ArticleError> {
        let ttl = self.cache.config().detail_ttl;
        let fetched = read_through(&self.cache, CacheKey::article_detail(id), ttl, || async move {
            self.load_detail(queries, id).await
        })
        .await?;

        Ok(fetched.map(|fetched| {
            debug!(source = ?fetched.source, article_id = id, "article detail served");
            fetched.value
        }))
    }

    async fn load_detail(
        &self,
        queries: &QueryCounter,
        id: i64,
    ) -> Result<Option<ArticleDetailResponse>, ArticleError> {
        let mut session = self.repos.begin(queries).await?;
        if !session.article_exists(id).await? {
            return Ok(None);
        }
        session.increment_view_count(id).await?;
        let Some(aggregate) = load_aggregate(&mut session, id, true).await? else {
            return Ok(None);
        };
        session.commit().await?;

        Ok(Some(views::article_detail(aggregate)))
    }

    pub async fn create(
        &self,
        queries: &QueryCounter,
        request: ArticleCreateRequest,
    ) -> Result<ArticleDetailResponse, ArticleError> {
        required("title", &request.title)?;
        max_chars("title", &request.title, TITLE_MAX)?;
        required("content", &request.content)?;
        if let Some(summary) = &request.summary {
            max_chars("summary", summary, SUMMARY_MAX)?;
        }
        let tag_names = normalize_tags(&request.tags)?;

        let mut session = self.repos.begin(queries).await?;
        let slug = free_slug(&mut session, &request.title, None).await?;
        let id = session
            .insert_article(&CreateArticleParams {
                title: request.title,
                slug,
                content: request.content,
                summary: request.summary,
                is_published: request.is_published,
                user_id: request.user_id,
            })
            .await?;
        replace_tags(&mut session, id, &tag_names, false).await?;
        let aggregate = load_aggregate(&mut session, id, false)
            .await?
            .ok_or(RepoError::NotFound)?;
        session.commit().await?;

        invalidate(&self.cache, WriteEvent::ArticleCreated).await;
        Ok(views::article_detail(aggregate))
    }

    /// Partial update; `None` when no article has `id`.
    pub async fn update(
        &self,
        queries: &QueryCounter,
        id: i64,
        request: ArticleUpdateRequest,
    ) -> Result<Option<ArticleDetailResponse>, ArticleError> {
        if let Some(title) = &request.title {
            required("title", title)?;
            max_chars("title", title, TITLE_MAX)?;
        }
        if let Some(content) = &request.content {
            required("content", content)?;
        }
        if let Some(Some(summary)) = &request.summary {
            max_chars("summary", summary, SUMMARY_MAX)?;
        }
        let tag_names = request.tags.as_deref().map(normalize_tags).transpose()?;

        let mut session = self.repos.begin(queries).await?;
        let Some((current, current_content)) = session.find_article_for_update(id).await? else {
            return Ok(None);
        };

        let (title, slug) = match request.title {
            Some(title) if title != current.title => {
                let slug = free_slug(&mut session, &title, Some(id)).await?;
                (title, slug)
            }
            _ => (current.title, current.slug),
        };
        let is_published = request.is_published.unwrap_or(current.is_published);

        session
            .update_article(&UpdateArticleParams {
                id,
                title,
                slug,
                content: request.content.unwrap_or(current_content),
                summary: request.summary.unwrap_or(current.summary),
                is_published,
                stamp_published_at: is_published && current.published_at.is_none(),
            })
            .await?;
        if let Some(tag_names) = tag_names {
            replace_tags(&mut session, id, &tag_names, true).await?;
        }
        let aggregate = load_aggregate(&mut session, id, true)
            .await?
            .ok_or(RepoError::NotFound)?;
        session.commit().await?;

        invalidate(&self.cache, WriteEvent::ArticleUpdated { id }).await;
        Ok(Some(views::article_detail(aggregate)))
    }

    /// Returns `false` when no article had `id`.
    pub async fn delete(&self, queries: &QueryCounter, id: i64) -> Result<bool, ArticleError> {
        let mut session = self.repos.begin(queries).await?;
        let deleted = session.delete_article(id).await?;
        session.commit().await?;

        if deleted {
            invalidate(&self.cache, WriteEvent::ArticleDeleted { id }).await;
        }
        Ok(deleted)
    }
}

/// First slug derived from `title` that no other article uses.
async fn free_slug(
    session: &mut DbSession,
    title: &str,
    except: Option<i64>,
) -> Result<String, ArticleError> {
    let base = derive_slug(title)?;
    for candidate in slug_candidates(&base) {
        if !session.slug_taken(&candidate, except).await? {
            return Ok(candidate);
        }
    }
    Err(SlugError::Exhausted { base }.into())
}

async fn replace_tags(
    session: &mut DbSession,
    article_id: i64,
    names: &[String],
    clear_existing: bool,
) -> Result<(), RepoError> {
    if clear_existing {
        session.detach_all_tags(article_id).await?;
    }
    let tags = session.ensure_tags(names).await?;
    let ids: Vec<i64> = tags.iter().map(|tag| tag.id).collect();
    session.attach_tags(article_id, &ids).await
}

/// Article with author, tags and (optionally) comments, one statement each.
async fn load_aggregate(
    session: &mut DbSession,
    id: i64,
    with_comments: bool,
) -> Result<Option<ArticleAggregate>, RepoError> {
    let Some((authored, content)) = session.find_article_with_author(id).await? else {
        return Ok(None);
    };
    let tags = session.tags_for_article(id).await?;
    let comments = if with_comments {
        session.comments_for_article(id).await?
    } else {
        Vec::new()
    };

    Ok(Some(ArticleAggregate {
        article: authored.article,
        content,
        author: authored.author,
        tags,
        comments,
    }))
}
