//! Drug catalog API.
//!
//! `PUT /api/drugs/{id}` carries either a lifecycle action
//! (`{"action": "toggleLock"}` or `{"action": "restore"}`) or a field patch.
//! Removal goes through `DELETE`, with `?permanent=true` for a purge.

use apotheca_core::{
    BatchDeleteOutcome, CoreError, Drug, DrugAction, DrugPatch, DrugView, NewDrug, StateChange,
};
use apotheca_db::TransitionOutcome;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/drugs", drug_routes())
}

fn drug_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/low-stock", get(low_stock))
        .route("/batch-delete", post(batch_delete))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `true` lists the recycle bin.
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub permanent: bool,
}

/// One drug or a list of drugs. A list is created all-or-nothing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateDrugBody {
    Many(Vec<NewDrug>),
    One(Box<NewDrug>),
}

/// Lifecycle actions accepted by `PUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PutAction {
    ToggleLock,
    Restore,
}

impl From<PutAction> for StateChange {
    fn from(action: PutAction) -> Self {
        match action {
            PutAction::ToggleLock => StateChange::ToggleLock,
            PutAction::Restore => StateChange::Restore,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionBody {
    action: PutAction,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreatedDrugs {
    One(Box<DrugView>),
    Many(Vec<Drug>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DeletedDrug {
    SoftDeleted(Box<DrugView>),
    Purged { id: String, code: String },
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/drugs?deleted=bool
async fn list(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<Vec<DrugView>>> {
    let drugs = state.db.drugs().list(query.deleted).await?;
    Ok(ApiResponse::ok(drugs))
}

/// GET /api/drugs/low-stock
async fn low_stock(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> ApiResult<ApiResponse<Vec<Drug>>> {
    let drugs = state.db.drugs().low_stock().await?;
    Ok(ApiResponse::ok(drugs))
}

/// GET /api/drugs/{id}
async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DrugView>> {
    let view = state
        .db
        .drugs()
        .get(&id)
        .await?
        .ok_or_else(|| CoreError::DrugNotFound(id.clone()))?;
    Ok(ApiResponse::ok(view))
}

/// POST /api/drugs - one object or an array
async fn create(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(body): ApiJson<CreateDrugBody>,
) -> ApiResult<ApiResponse<CreatedDrugs>> {
    match body {
        CreateDrugBody::One(input) => {
            let drug = state.db.drugs().create(&input, &identity).await?;
            let view = state
                .db
                .drugs()
                .get(&drug.id)
                .await?
                .ok_or_else(|| CoreError::DrugNotFound(drug.id.clone()))?;
            Ok(ApiResponse::ok_with_message(
                CreatedDrugs::One(Box::new(view)),
                "Drug added",
            ))
        }
        CreateDrugBody::Many(inputs) => {
            let drugs = state.db.drugs().create_many(&inputs, &identity).await?;
            let message = format!("Added {} drugs", drugs.len());
            Ok(ApiResponse::ok_with_message(CreatedDrugs::Many(drugs), message))
        }
    }
}

/// PUT /api/drugs/{id} - lifecycle action or field patch
async fn update(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<ApiResponse<DrugView>> {
    if body.get("action").is_some() {
        let ActionBody { action } = serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidArgument(format!("Unsupported action: {}", e)))?;

        let view = state
            .db
            .drugs()
            .change_state(&id, action.into(), &identity)
            .await?;

        let message = match action {
            PutAction::ToggleLock if view.drug.is_locked => "Drug locked",
            PutAction::ToggleLock => "Drug unlocked",
            PutAction::Restore => "Drug restored",
        };
        return Ok(ApiResponse::ok_with_message(view, message));
    }

    let patch: DrugPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::InvalidArgument(format!("Invalid drug fields: {}", e)))?;
    let view = state.db.drugs().update(&id, &patch, &identity).await?;
    Ok(ApiResponse::ok_with_message(view, "Drug updated"))
}

/// DELETE /api/drugs/{id}?permanent=bool
async fn delete(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> ApiResult<ApiResponse<DeletedDrug>> {
    let action = if query.permanent {
        DrugAction::Purge
    } else {
        DrugAction::Delete
    };

    let response = match state.db.drugs().transition(&id, action, &identity).await? {
        TransitionOutcome::Updated(view) => ApiResponse::ok_with_message(
            DeletedDrug::SoftDeleted(Box::new(view)),
            "Drug moved to the recycle bin",
        ),
        TransitionOutcome::Purged { id, code } => ApiResponse::ok_with_message(
            DeletedDrug::Purged { id, code },
            "Drug permanently deleted",
        ),
    };
    Ok(response)
}

/// POST /api/drugs/batch-delete
async fn batch_delete(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(req): ApiJson<BatchDeleteRequest>,
) -> ApiResult<ApiResponse<BatchDeleteOutcome>> {
    let outcome = state.db.drugs().batch_delete(&req.ids, &identity).await?;

    let message = if outcome.skipped_locked > 0 {
        format!(
            "Deleted {} drugs, skipped {} locked",
            outcome.deleted, outcome.skipped_locked
        )
    } else {
        format!("Deleted {} drugs", outcome.deleted)
    };
    Ok(ApiResponse::ok_with_message(outcome, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_body_accepts_object_and_array() {
        let one = json!({
            "code": "D100",
            "name": "Amoxicillin",
            "category": "Antibiotic",
            "manufacturer": "Acme",
            "priceCents": 1250,
            "stock": 10,
            "expiryDate": "2030-01-01"
        });
        assert!(matches!(
            serde_json::from_value::<CreateDrugBody>(one.clone()).unwrap(),
            CreateDrugBody::One(_)
        ));

        let many = serde_json::from_value::<CreateDrugBody>(json!([one])).unwrap();
        assert!(matches!(many, CreateDrugBody::Many(ref v) if v.len() == 1));
    }

    #[test]
    fn test_put_action_parsing() {
        let body: ActionBody = serde_json::from_value(json!({ "action": "toggleLock" })).unwrap();
        assert_eq!(body.action, PutAction::ToggleLock);
        assert_eq!(StateChange::from(body.action), StateChange::ToggleLock);

        assert!(serde_json::from_value::<ActionBody>(json!({ "action": "purge" })).is_err());
    }
}
