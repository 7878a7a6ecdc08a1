// src/intake.rs
//! Submission intake: `POST /items` stores a fresh, unpublished item.
//!
//! Authentication sits in front of this router and is not handled here.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::{PipelineError, Result};
use crate::item::{Category, Item};
use crate::metrics::INTAKE_ITEMS_TOTAL;
use crate::repository::ItemRepository;

#[derive(Clone)]
pub struct IntakeState {
    repo: Arc<dyn ItemRepository>,
}

impl IntakeState {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self { repo }
    }
}

pub fn router(state: IntakeState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/items", post(create_item).fallback(method_not_allowed))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Submission body as sent by the web form.
#[derive(Debug, Deserialize)]
pub struct NewItemRequest {
    pub title: String,
    pub content: String,
    pub category: String,
}

impl NewItemRequest {
    pub fn into_item(self) -> Result<Item> {
        let category = Category::parse(self.category.trim())?;
        Ok(Item::new(self.title, self.content, category))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

type Reply = (StatusCode, Json<MessageResponse>);

fn reply(status: StatusCode, message: impl Into<String>) -> Reply {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

async fn method_not_allowed() -> Reply {
    reply(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn create_item(State(state): State<IntakeState>, body: Bytes) -> Reply {
    let req: NewItemRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(target: "intake", error = %e, "rejecting unparsable submission");
            counter!(INTAKE_ITEMS_TOTAL, "outcome" => "invalid_json").increment(1);
            return reply(StatusCode::BAD_REQUEST, "Invalid JSON in request body");
        }
    };

    let item = match req.into_item() {
        Ok(it) => it,
        Err(PipelineError::Validation(msg)) => {
            counter!(INTAKE_ITEMS_TOTAL, "outcome" => "invalid_category").increment(1);
            return reply(StatusCode::BAD_REQUEST, msg);
        }
        Err(e) => return reply(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if let Err(e) = state.repo.save(&item).await {
        tracing::error!(target: "intake", item_id = %item.id, error = %e, "unable to save the info item");
        counter!(INTAKE_ITEMS_TOTAL, "outcome" => "persistence_error").increment(1);
        return reply(StatusCode::INTERNAL_SERVER_ERROR, "Unable to save the info item");
    }

    tracing::info!(
        target: "intake",
        item_id = %item.id,
        category = item.category.tag(),
        "info item recorded"
    );
    counter!(INTAKE_ITEMS_TOTAL, "outcome" => "recorded").increment(1);
    reply(StatusCode::OK, "Info item recorded")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_with_known_category_builds_fresh_item() {
        let req = NewItemRequest {
            title: "t".into(),
            content: "c".into(),
            category: "ARTICLE".into(),
        };
        let it = req.into_item().unwrap();
        assert_eq!(it.category, Category::Article);
        assert!(!it.published_in_daily && !it.published_in_summary);
    }

    #[test]
    fn request_with_unknown_category_is_validation_error() {
        let req = NewItemRequest {
            title: "t".into(),
            content: "c".into(),
            category: "article".into(),
        };
        assert!(matches!(req.into_item(), Err(PipelineError::Validation(_))));
    }
}
