//! # Hierarchical Traverser
//!
//! Walks accounts → properties → views in API order and fills an
//! [`ExportTables`]. Segments are fetched once after the walk, and filters
//! once per account in a second pass over the accounts, so neither is
//! re-fetched inside the nested loops.
//!
//! Objects without an `id` cannot be descended into; they are logged and
//! contribute no rows. API errors abort the walk.

use crate::api::ManagementApi;
use crate::errors::ExportError;
use crate::flatten::{
    account_property_view_row, custom_dimension_row, custom_metric_row, filter_row, goal_row,
    id_of, profile_filter_link_row, segment_row, view_row, PropertyScope,
};
use crate::tables::{ExportTables, TableKind};
use serde_json::Value;
use tracing::{info, warn};

/// Collects every exported table from the Management API.
pub async fn collect_settings(api: &dyn ManagementApi) -> Result<ExportTables, ExportError> {
    let mut tables = ExportTables::new();

    let accounts = api.list_accounts().await?;
    info!("Found {} accounts.", accounts.len());

    for account in &accounts {
        walk_account(api, account, &mut tables).await?;
    }

    let segments = api.list_segments().await?;
    info!("Found {} segments.", segments.len());
    for segment in &segments {
        tables.push(TableKind::Segment, segment_row(segment));
    }

    for account in &accounts {
        let Some(account_id) = id_of(account) else {
            continue;
        };
        let filters = api.list_filters(&account_id).await?;
        info!("Account {account_id}: {} filters.", filters.len());
        for filter in &filters {
            tables.push(TableKind::Filter, filter_row(&account_id, filter));
        }
    }

    Ok(tables)
}

async fn walk_account(
    api: &dyn ManagementApi,
    account: &Value,
    tables: &mut ExportTables,
) -> Result<(), ExportError> {
    let Some(account_id) = id_of(account) else {
        warn!("Skipping account without an id.");
        return Ok(());
    };

    let properties = api.list_web_properties(&account_id).await?;
    info!("Account {account_id}: {} properties.", properties.len());

    for property in &properties {
        let Some(property_id) = id_of(property) else {
            warn!("Skipping property without an id under account {account_id}.");
            continue;
        };
        let scope = PropertyScope {
            account_id: account_id.clone(),
            property_id,
        };
        walk_property(api, account, property, &scope, tables).await?;
    }

    Ok(())
}

async fn walk_property(
    api: &dyn ManagementApi,
    account: &Value,
    property: &Value,
    scope: &PropertyScope,
    tables: &mut ExportTables,
) -> Result<(), ExportError> {
    let views = api
        .list_views(&scope.account_id, &scope.property_id)
        .await?;
    info!("Property {}: {} views.", scope.property_id, views.len());

    for view in &views {
        let Some(view_id) = id_of(view) else {
            warn!(
                "Skipping view without an id under property {}.",
                scope.property_id
            );
            continue;
        };
        let view_scope = scope.view(view_id);

        tables.push(
            TableKind::AccountPropertyView,
            account_property_view_row(account, property, view),
        );
        tables.push(TableKind::View, view_row(view));

        let links = api
            .list_profile_filter_links(
                &view_scope.account_id,
                &view_scope.property_id,
                &view_scope.view_id,
            )
            .await?;
        for link in &links {
            tables.push(
                TableKind::ProfileFilterLink,
                profile_filter_link_row(&view_scope, link),
            );
        }

        let goals = api
            .list_goals(
                &view_scope.account_id,
                &view_scope.property_id,
                &view_scope.view_id,
            )
            .await?;
        for goal in &goals {
            tables.push(TableKind::Goal, goal_row(&view_scope, goal));
        }
    }

    let dimensions = api
        .list_custom_dimensions(&scope.account_id, &scope.property_id)
        .await?;
    for dimension in &dimensions {
        tables.push(
            TableKind::CustomDimension,
            custom_dimension_row(scope, dimension),
        );
    }

    let metrics = api
        .list_custom_metrics(&scope.account_id, &scope.property_id)
        .await?;
    for metric in &metrics {
        tables.push(TableKind::CustomMetric, custom_metric_row(scope, metric));
    }

    Ok(())
}
