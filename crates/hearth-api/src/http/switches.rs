//! Entity state and command handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path as AxumPath, State},
};
use hearth_entity::CommandSwitch;

use crate::http::auth::AuthContext;
use crate::http::errors::ApiError;
use crate::models::EntityState;
use crate::state::ApiState;

/// List the states of every entity the caller may read.
///
/// Entities whose read check fails are omitted rather than erroring the
/// whole listing: read permission is what makes an entity visible at all.
pub(crate) async fn list_states(
    State(state): State<Arc<ApiState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<EntityState>>, ApiError> {
    let identity = auth.require_authenticated()?;

    let states = state
        .registry
        .iter()
        .filter_map(|switch| {
            switch
                .current_state(identity)
                .ok()
                .map(|is_on| entity_state(switch, Some(is_on)))
        })
        .collect();

    Ok(Json(states))
}

/// Report the cached state of one entity.
pub(crate) async fn get_state(
    State(state): State<Arc<ApiState>>,
    Extension(auth): Extension<AuthContext>,
    AxumPath(entity_id): AxumPath<String>,
) -> Result<Json<EntityState>, ApiError> {
    let identity = auth.require_authenticated()?;
    let switch = lookup(&state, &entity_id)?;
    let is_on = switch.current_state(identity)?;
    Ok(Json(entity_state(switch, Some(is_on))))
}

/// Turn an entity on.
pub(crate) async fn turn_on(
    State(state): State<Arc<ApiState>>,
    Extension(auth): Extension<AuthContext>,
    AxumPath(entity_id): AxumPath<String>,
) -> Result<Json<EntityState>, ApiError> {
    let identity = auth.require_authenticated()?;
    let switch = lookup(&state, &entity_id)?;
    let is_on = switch.turn_on(identity).await?;
    Ok(Json(entity_state(switch, Some(is_on))))
}

/// Turn an entity off.
pub(crate) async fn turn_off(
    State(state): State<Arc<ApiState>>,
    Extension(auth): Extension<AuthContext>,
    AxumPath(entity_id): AxumPath<String>,
) -> Result<Json<EntityState>, ApiError> {
    let identity = auth.require_authenticated()?;
    let switch = lookup(&state, &entity_id)?;
    let is_on = switch.turn_off(identity).await?;
    Ok(Json(entity_state(switch, Some(is_on))))
}

/// Poll an entity's state command and report the fresh state.
pub(crate) async fn refresh(
    State(state): State<Arc<ApiState>>,
    Extension(auth): Extension<AuthContext>,
    AxumPath(entity_id): AxumPath<String>,
) -> Result<Json<EntityState>, ApiError> {
    let identity = auth.require_authenticated()?;
    let switch = lookup(&state, &entity_id)?;
    let polled = switch.refresh(identity).await?;
    Ok(Json(entity_state(switch, polled)))
}

fn lookup<'a>(state: &'a ApiState, entity_id: &str) -> Result<&'a Arc<CommandSwitch>, ApiError> {
    state
        .registry
        .get(entity_id)
        .ok_or_else(|| ApiError::not_found(format!("no entity '{entity_id}' is configured")))
}

fn entity_state(switch: &CommandSwitch, is_on: Option<bool>) -> EntityState {
    EntityState {
        entity_id: switch.entity_id().to_string(),
        name: switch.name().to_string(),
        state: EntityState::label(is_on),
        assumed_state: switch.assumed_state(),
    }
}
