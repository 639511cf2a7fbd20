use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use maud::Render;
use serde::Deserialize;

use crate::{
    components::{
        layout::{Card, ContentSection, Page},
        ui::{badge::TagBadge, heading::Heading},
    },
    content::{Article, ArticleSort, Project, ProjectSort},
    errors::ServerResult,
    github::GithubStats,
    guestbook::{Entry, Reply, ThreadedEntry},
    state::AppState,
};

pub mod api;

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    axum::Router::new()
        // Public pages
        .route("/", get(home_page))
        .route("/projects", get(projects_page))
        .route("/articles", get(articles_page))
        .route("/articles/:slug", get(article_page))
        .route("/guestbook", get(guestbook_page))
        // Guestbook REST API
        .route("/api/me", get(api::me))
        .route("/api/guestbook", get(api::list_entries).post(api::create_entry))
        .route(
            "/api/guestbook/:id",
            patch(api::update_entry).delete(api::delete_entry),
        )
        .route("/api/guestbook/:id/replies", post(api::create_reply))
        .route("/api/guestbook/replies/:id", delete(api::delete_reply))
        // Static files route
        .route(
            "/static/*path",
            get(crate::static_assets::serve_static_file),
        )
        // Add trace layer for debugging
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Query parameters shared by the listing pages
#[derive(Debug, Deserialize)]
struct ListParams {
    tag: Option<String>,
    sort: Option<String>,
}

/// Root page handler - bio, cached GitHub stats, recent articles
async fn home_page(State(state): State<AppState>) -> ServerResult<Page, StatusCode> {
    let stats = GithubStats::get(&state.db, &state.github.username).await?;

    let bio = maud::html! {
        (Heading::h1("Hey, I'm Rowan.").render())
        p class="text-stone-600 leading-relaxed" {
            "I build small, sturdy software — mostly in Rust, mostly for the web. "
            "This site is my workshop window: what I'm making, what I'm writing, "
            "and a guestbook if you'd like to say hello."
        }
    };

    let stats_markup = match &stats {
        Some(stats) => maud::html! {
            div class="grid grid-cols-3 gap-3 text-center" {
                div {
                    p class="text-2xl font-semibold text-amber-700" { (stats.followers) }
                    p class="text-xs text-stone-500" { "followers" }
                }
                div {
                    p class="text-2xl font-semibold text-amber-700" { (stats.total_stars) }
                    p class="text-xs text-stone-500" { "stars earned" }
                }
                div {
                    p class="text-2xl font-semibold text-amber-700" { (stats.public_repos) }
                    p class="text-xs text-stone-500" { "public repos" }
                }
            }
            p class="text-xs text-stone-400 mt-2 text-center" {
                "GitHub, as of " (stats.fetched_at_utc.format("%Y-%m-%d %H:%M UTC"))
            }
        },
        // Cache is cold until the first refresh job has run
        None => maud::html! {},
    };

    let recent = maud::html! {
        (Heading::h2("Recent writing").render())
        ul class="space-y-3" {
            @for article in state.content.recent_articles(3) {
                li {
                    a href=(format!("/articles/{}", article.slug)) class="font-medium text-amber-700 hover:text-amber-900" {
                        (article.title)
                    }
                    p class="text-sm text-stone-500" { (article.summary) }
                }
            }
        }
    };

    let content = maud::html! {
        (Card::new(bio).render())
        @if stats.is_some() {
            (Card::new(stats_markup).render())
        }
        (ContentSection::new(recent).render())
    };

    Ok(Page::new(
        "porchlight — Rowan Hale".to_string(),
        Box::new(content),
    ))
}

/// Projects page handler - filterable, sortable project list
async fn projects_page(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Page {
    let sort = ProjectSort::parse(params.sort.as_deref());
    let tag = params.tag.as_deref();
    let projects = state.content.projects_filtered(tag, sort);

    let content = maud::html! {
        (Heading::h1("Projects").render())

        (tag_filter_row("/projects", &state.content.project_tags(), tag))

        @if projects.is_empty() {
            p class="text-stone-500 mt-4" { "Nothing matches that filter." }
        }

        div class="mt-4" {
            @for project in &projects {
                (Card::new(project_card(project)).render())
            }
        }
    };

    Page::new("Projects — porchlight".to_string(), Box::new(content))
}

fn project_card(project: &Project) -> maud::Markup {
    maud::html! {
        div class="flex items-baseline justify-between" {
            a href=(project.url) class="font-semibold text-amber-700 hover:text-amber-900" {
                (project.name)
            }
            span class="text-xs text-stone-400" { (project.year) }
        }
        p class="text-sm text-stone-600 mt-1" { (project.description) }
        div class="flex gap-1 mt-2" {
            @for tag in &project.tags {
                (TagBadge::new(tag).render())
            }
        }
    }
}

/// Articles index handler - filterable, sortable article list
async fn articles_page(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Page {
    let sort = ArticleSort::parse(params.sort.as_deref());
    let tag = params.tag.as_deref();
    let articles = state.content.articles_filtered(tag, sort);

    let content = maud::html! {
        (Heading::h1("Articles").render())

        (tag_filter_row("/articles", &state.content.article_tags(), tag))

        div class="flex gap-3 text-xs text-stone-500 mt-2" {
            "sort:"
            a href="/articles?sort=newest" class="hover:text-amber-700" { "newest" }
            a href="/articles?sort=oldest" class="hover:text-amber-700" { "oldest" }
            a href="/articles?sort=title" class="hover:text-amber-700" { "title" }
        }

        @if articles.is_empty() {
            p class="text-stone-500 mt-4" { "Nothing matches that filter." }
        }

        ul class="mt-4 space-y-5" {
            @for article in &articles {
                li {
                    a href=(format!("/articles/{}", article.slug)) class="font-medium text-amber-700 hover:text-amber-900" {
                        (article.title)
                    }
                    span class="text-xs text-stone-400 ml-2" {
                        (article.published_at.format("%B %e, %Y"))
                    }
                    p class="text-sm text-stone-500" { (article.summary) }
                }
            }
        }
    };

    Page::new("Articles — porchlight".to_string(), Box::new(content))
}

/// Single article handler
async fn article_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(article) = state.content.article_by_slug(&slug) else {
        return not_found_page();
    };

    let content = article_markup(article);

    Page::new(
        format!("{} — porchlight", article.title),
        Box::new(content),
    )
    .into_response()
}

fn article_markup(article: &Article) -> maud::Markup {
    maud::html! {
        (Heading::h1(&article.title).render())
        p class="text-sm text-stone-400" {
            (article.published_at.format("%B %e, %Y"))
        }
        div class="flex gap-1 mt-2" {
            @for tag in &article.tags {
                (TagBadge::new(tag)
                    .linking_to(format!("/articles?tag={}", urlencoding::encode(tag)))
                    .render())
            }
        }
        // body_html is authored content, not user input
        div class="article-body mt-6" {
            (maud::PreEscaped(article.body_html.clone()))
        }
    }
}

/// Guestbook page handler - entries with their replies, newest first
async fn guestbook_page(State(state): State<AppState>) -> ServerResult<Page, StatusCode> {
    let entries = Entry::list_with_authors(&state.db).await?;
    let replies = Reply::list_with_authors(&state.db).await?;
    let threaded = crate::guestbook::thread(entries, replies);

    let api_url = format!("{}/api/guestbook", state.base_url());
    let intro = maud::html! {
        (Heading::h1("Guestbook").render())
        p class="text-stone-600" {
            "Sign in with your account and leave a note. Entries and replies are "
            "posted with a bearer token through the API at "
            code class="text-sm" { (api_url) }
            "."
        }
    };

    let content = maud::html! {
        (intro)

        @if threaded.is_empty() {
            p class="text-stone-500 mt-6" { "No entries yet. The first page is always the hardest." }
        }

        div class="mt-6" {
            @for threaded_entry in &threaded {
                (Card::new(entry_markup(threaded_entry)).render())
            }
        }
    };

    Ok(Page::new(
        "Guestbook — porchlight".to_string(),
        Box::new(content),
    ))
}

fn entry_markup(threaded: &ThreadedEntry) -> maud::Markup {
    let entry = &threaded.entry;

    maud::html! {
        div class="flex items-baseline justify-between" {
            span class="font-medium" {
                (author_name(entry.author_display_name.as_deref(), entry.author_handle.as_deref()))
            }
            span class="text-xs text-stone-400" {
                (entry.created_at_utc.format("%B %e, %Y"))
            }
        }
        p class="text-stone-700 mt-1" { (entry.message) }

        @if !threaded.replies.is_empty() {
            div class="mt-3 pl-4 border-l-2 border-stone-100 space-y-2" {
                @for reply in &threaded.replies {
                    div {
                        span class="text-sm font-medium" {
                            (author_name(reply.author_display_name.as_deref(), reply.author_handle.as_deref()))
                        }
                        span class="text-xs text-stone-400 ml-2" {
                            (reply.created_at_utc.format("%B %e, %Y"))
                        }
                        p class="text-sm text-stone-600" { (reply.message) }
                    }
                }
            }
        }
    }
}

fn author_name(display_name: Option<&str>, handle: Option<&str>) -> String {
    display_name
        .or(handle)
        .unwrap_or("anonymous")
        .to_string()
}

fn tag_filter_row(base_path: &str, tags: &[&str], active: Option<&str>) -> maud::Markup {
    maud::html! {
        div class="flex gap-1 flex-wrap" {
            (TagBadge::new("all")
                .linking_to(base_path.to_string())
                .active(active.is_none())
                .render())
            @for tag in tags {
                (TagBadge::new(tag)
                    .linking_to(format!("{base_path}?tag={}", urlencoding::encode(tag)))
                    .active(active == Some(*tag))
                    .render())
            }
        }
    }
}

fn not_found_page() -> Response {
    let content = maud::html! {
        (Heading::h1("Not found").render())
        p class="text-stone-600" {
            "That page doesn't exist. The " a href="/articles" class="text-amber-700 underline" { "articles index" }
            " has everything that does."
        }
    };

    (
        StatusCode::NOT_FOUND,
        Page::new("Not found — porchlight".to_string(), Box::new(content)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_name_fallback_chain() {
        assert_eq!(author_name(Some("Rowan Hale"), Some("rowan")), "Rowan Hale");
        assert_eq!(author_name(None, Some("rowan")), "rowan");
        assert_eq!(author_name(None, None), "anonymous");
    }

    #[test]
    fn test_tag_filter_row_encodes_tags() {
        let markup = tag_filter_row("/articles", &["systems programming"], None);
        let rendered = markup.into_string();

        assert!(rendered.contains("/articles?tag=systems%20programming"));
    }

    #[test]
    fn test_tag_filter_row_marks_active_tag() {
        let markup = tag_filter_row("/articles", &["rust"], Some("rust"));
        let rendered = markup.into_string();

        assert!(rendered.contains("bg-amber-600"));
    }
}
