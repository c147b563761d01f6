//! Conversions from domain records to API response bodies.

use std::collections::HashMap;

use quillpost_api_types::{
    ArticleDetailResponse, ArticleResponse, CommentResponse, TagResponse, UserDetailResponse,
    UserResponse,
};

use crate::domain::entities::{
    ArticleAggregate, ArticleRecord, AuthoredArticle, CommentRecord, TagRecord, UserRecord,
};

pub fn user_response(user: UserRecord) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        display_name: user.display_name,
        bio: user.bio,
        created_at: user.created_at,
    }
}

pub fn tag_response(tag: TagRecord) -> TagResponse {
    TagResponse {
        id: tag.id,
        name: tag.name,
    }
}

pub fn comment_response(comment: CommentRecord) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        content: comment.content,
        author_name: comment.author_name,
        article_id: comment.article_id,
        created_at: comment.created_at,
    }
}

pub fn article_response(
    article: ArticleRecord,
    author: Option<UserRecord>,
    tags: Vec<TagRecord>,
) -> ArticleResponse {
    ArticleResponse {
        id: article.id,
        title: article.title,
        slug: article.slug,
        summary: article.summary,
        view_count: article.view_count,
        is_published: article.is_published,
        published_at: article.published_at,
        created_at: article.created_at,
        user_id: article.user_id,
        author: author.map(user_response),
        tags: tags.into_iter().map(tag_response).collect(),
    }
}

/// List items in page order, each with the tags found for it.
pub fn article_list_items(
    rows: Vec<AuthoredArticle>,
    mut tags: HashMap<i64, Vec<TagRecord>>,
) -> Vec<ArticleResponse> {
    rows.into_iter()
        .map(|row| {
            let article_tags = tags.remove(&row.article.id).unwrap_or_default();
            article_response(row.article, Some(row.author), article_tags)
        })
        .collect()
}

pub fn article_detail(aggregate: ArticleAggregate) -> ArticleDetailResponse {
    ArticleDetailResponse {
        article: article_response(aggregate.article, Some(aggregate.author), aggregate.tags),
        content: aggregate.content,
        comments: aggregate.comments.into_iter().map(comment_response).collect(),
    }
}

/// A user page lists bare articles: no author, no tags.
pub fn user_detail(user: UserRecord, articles: Vec<ArticleRecord>) -> UserDetailResponse {
    UserDetailResponse {
        user: user_response(user),
        articles: articles
            .into_iter()
            .map(|article| article_response(article, None, Vec::new()))
            .collect(),
    }
}
