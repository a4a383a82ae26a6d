// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Menu routes: public reads, superuser-only writes.

use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::Superuser;
use crate::models::{MenuItem, NewMenuItem, Price};
use crate::routes::{int_or_string, JsonBody, PathParam, REQUIRED};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/menus/", get(list_menu_items).post(create_menu_item))
        .route(
            "/menus/{id}/",
            get(get_menu_item)
                .put(replace_menu_item)
                .patch(patch_menu_item)
                .delete(delete_menu_item),
        )
}

/// Request body for creating/updating a menu item.
#[derive(Debug, Deserialize, Validate)]
pub struct MenuItemInput {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters."))]
    pub title: Option<String>,
    /// String or number; parsed as a fixed-point price.
    pub price: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "int_or_string")]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub inventory: Option<i32>,
}

impl MenuItemInput {
    /// Resolve the final field values.
    ///
    /// With `existing`, missing fields keep their current value (partial
    /// update); otherwise every field is required.
    fn resolve(self, existing: Option<&MenuItem>) -> Result<(String, Price, i32)> {
        self.validate()?;

        let mut fields = FieldErrors::new();

        let title = self.title.or_else(|| existing.map(|e| e.title.clone()));
        require(&mut fields, "title", title.is_some());

        let price = match self.price {
            Some(raw) => match Price::from_json(&raw) {
                Ok(price) => Some(price),
                Err(msg) => {
                    fields.insert("price".to_string(), vec![msg]);
                    None
                }
            },
            None => {
                let price = existing.map(|e| e.price);
                require(&mut fields, "price", price.is_some());
                price
            }
        };

        let inventory = self.inventory.or_else(|| existing.map(|e| e.inventory));
        require(&mut fields, "inventory", inventory.is_some());

        match (title, price, inventory) {
            (Some(title), Some(price), Some(inventory)) if fields.is_empty() => {
                Ok((title, price, inventory))
            }
            _ => Err(AppError::Validation(fields)),
        }
    }
}

fn require(fields: &mut FieldErrors, name: &str, present: bool) {
    if !present {
        fields.insert(name.to_string(), vec![REQUIRED.to_string()]);
    }
}

async fn load(state: &AppState, id: u64) -> Result<MenuItem> {
    state
        .store
        .get_menu_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Menu item {} not found", id)))
}

/// List all menu items.
async fn list_menu_items(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MenuItem>>> {
    Ok(Json(state.store.list_menu_items().await?))
}

async fn get_menu_item(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<u64>,
) -> Result<Json<MenuItem>> {
    Ok(Json(load(&state, id).await?))
}

async fn create_menu_item(
    State(state): State<Arc<AppState>>,
    Superuser(user): Superuser,
    JsonBody(input): JsonBody<MenuItemInput>,
) -> Result<(StatusCode, Json<MenuItem>)> {
    let (title, price, inventory) = input.resolve(None)?;

    let item = state
        .store
        .create_menu_item(NewMenuItem {
            title,
            price,
            inventory,
        })
        .await?;

    tracing::info!(user_id = user.id, item_id = item.id, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT: every field must be supplied.
async fn replace_menu_item(
    State(state): State<Arc<AppState>>,
    Superuser(user): Superuser,
    PathParam(id): PathParam<u64>,
    JsonBody(input): JsonBody<MenuItemInput>,
) -> Result<Json<MenuItem>> {
    let current = load(&state, id).await?;
    let (title, price, inventory) = input.resolve(None)?;
    save(&state, user.id, MenuItem { id: current.id, title, price, inventory }).await
}

/// PATCH: only supplied fields change.
async fn patch_menu_item(
    State(state): State<Arc<AppState>>,
    Superuser(user): Superuser,
    PathParam(id): PathParam<u64>,
    JsonBody(input): JsonBody<MenuItemInput>,
) -> Result<Json<MenuItem>> {
    let current = load(&state, id).await?;
    let (title, price, inventory) = input.resolve(Some(&current))?;
    save(&state, user.id, MenuItem { id: current.id, title, price, inventory }).await
}

async fn save(state: &AppState, user_id: u64, item: MenuItem) -> Result<Json<MenuItem>> {
    state.store.update_menu_item(&item).await?;
    tracing::info!(user_id, item_id = item.id, "Menu item updated");
    Ok(Json(item))
}

async fn delete_menu_item(
    State(state): State<Arc<AppState>>,
    Superuser(user): Superuser,
    PathParam(id): PathParam<u64>,
) -> Result<StatusCode> {
    if !state.store.delete_menu_item(id).await? {
        return Err(AppError::NotFound(format!("Menu item {} not found", id)));
    }
    tracing::info!(user_id = user.id, item_id = id, "Menu item deleted");
    Ok(StatusCode::NO_CONTENT)
}
