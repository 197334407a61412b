//! # Traversal Tests
//!
//! Exercises the account → property → view walk against an in-memory API.

mod common;

use anyhow::Result;
use chrono::{Local, TimeZone};
use common::{named, read_csv, MockManagementApi};
use ga_export::traverse::collect_settings;
use ga_export::{run_export, Cell, ExportError, TableKind};
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn test_account_without_properties_yields_no_view_rows() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "Empty Account")]);

    let tables = collect_settings(&api).await?;

    assert!(tables.rows(TableKind::AccountPropertyView).is_empty());
    assert!(tables.rows(TableKind::View).is_empty());
    assert_eq!(api.count_calls("views:"), 0);
    // Filters are still looked up for the account.
    assert_eq!(api.count_calls("filters:a1"), 1);
    Ok(())
}

#[tokio::test]
async fn test_segments_are_fetched_once_per_run() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "One"), named("a2", "Two")]);
    for account in ["a1", "a2"] {
        api.respond(
            &format!("properties:{account}"),
            vec![named("p1", "Site"), named("p2", "App")],
        );
        for property in ["p1", "p2"] {
            api.respond(
                &format!("views:{account}/{property}"),
                vec![named("v1", "All"), named("v2", "Raw")],
            );
        }
    }
    api.respond(
        "segments",
        vec![named("s1", "Mobile"), named("s2", "Desktop")],
    );

    let tables = collect_settings(&api).await?;

    assert_eq!(api.count_calls("segments"), 1);
    assert_eq!(tables.rows(TableKind::Segment).len(), 2);
    assert_eq!(tables.rows(TableKind::AccountPropertyView).len(), 8);
    Ok(())
}

#[tokio::test]
async fn test_filters_are_fetched_once_per_account() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "One"), named("a2", "Two")]);
    for account in ["a1", "a2"] {
        api.respond(
            &format!("properties:{account}"),
            vec![named("p1", "Site"), named("p2", "App"), named("p3", "Blog")],
        );
        for property in ["p1", "p2", "p3"] {
            api.respond(
                &format!("views:{account}/{property}"),
                vec![named("v1", "All"), named("v2", "Raw")],
            );
        }
    }
    api.respond(
        "filters:a1",
        vec![json!({ "id": "f1", "name": "Exclude office", "type": "EXCLUDE" })],
    );

    let tables = collect_settings(&api).await?;

    assert_eq!(api.count_calls("filters:"), 2);
    assert_eq!(api.count_calls("filters:a1"), 1);
    assert_eq!(api.count_calls("filters:a2"), 1);
    assert_eq!(api.count_calls("goals:"), 12);

    let filters = tables.rows(TableKind::Filter);
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].get("account_id"), Some(&Cell::from("a1")));
    Ok(())
}

#[tokio::test]
async fn test_calls_follow_hierarchy_order() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "One")]);
    api.respond("properties:a1", vec![named("p1", "Site")]);
    api.respond("views:a1/p1", vec![named("v1", "All"), named("v2", "Raw")]);

    collect_settings(&api).await?;

    assert_eq!(
        api.get_calls(),
        vec![
            "accounts",
            "properties:a1",
            "views:a1/p1",
            "links:a1/p1/v1",
            "goals:a1/p1/v1",
            "links:a1/p1/v2",
            "goals:a1/p1/v2",
            "dimensions:a1/p1",
            "metrics:a1/p1",
            "segments",
            "filters:a1",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_child_rows_carry_ancestor_ids() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "One")]);
    api.respond("properties:a1", vec![named("UA-1-1", "Site")]);
    api.respond("views:a1/UA-1-1", vec![named("v9", "All")]);
    api.respond(
        "links:a1/UA-1-1/v9",
        vec![json!({ "id": "v9:f3", "filterRef": { "id": "f3", "name": "Lowercase" } })],
    );
    api.respond(
        "dimensions:a1/UA-1-1",
        vec![json!({ "id": "ga:dimension1", "name": "Plan", "index": 1, "active": true })],
    );
    api.respond(
        "metrics:a1/UA-1-1",
        vec![json!({ "id": "ga:metric1", "name": "Seats" })],
    );

    let tables = collect_settings(&api).await?;

    let link = &tables.rows(TableKind::ProfileFilterLink)[0];
    assert_eq!(link.get("account_id"), Some(&Cell::from("a1")));
    assert_eq!(link.get("property_id"), Some(&Cell::from("UA-1-1")));
    assert_eq!(link.get("view_id"), Some(&Cell::from("v9")));
    assert_eq!(link.get("filter_id"), Some(&Cell::from("f3")));
    assert_eq!(link.get("link_id"), Some(&Cell::from("v9:f3")));

    let dimension = &tables.rows(TableKind::CustomDimension)[0];
    assert_eq!(dimension.get("property_id"), Some(&Cell::from("UA-1-1")));
    assert_eq!(dimension.get("index").map(Cell::render).as_deref(), Some("1"));
    assert_eq!(dimension.get("active").map(Cell::render).as_deref(), Some("true"));
    assert!(!dimension.contains_key("view_id"));

    let metric = &tables.rows(TableKind::CustomMetric)[0];
    assert_eq!(metric.get("metric_name"), Some(&Cell::from("Seats")));
    Ok(())
}

#[tokio::test]
async fn test_objects_without_id_are_skipped() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond(
        "accounts",
        vec![json!({ "name": "No id" }), named("a1", "One")],
    );
    api.respond(
        "properties:a1",
        vec![json!({ "name": "Broken" }), named("p1", "Site")],
    );
    api.respond("views:a1/p1", vec![json!({ "name": "Orphan" }), named("v1", "All")]);

    let tables = collect_settings(&api).await?;

    assert_eq!(tables.rows(TableKind::AccountPropertyView).len(), 1);
    assert_eq!(tables.rows(TableKind::View).len(), 1);
    assert_eq!(api.count_calls("properties:"), 1);
    assert_eq!(api.count_calls("filters:"), 1);
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_export_row_counts() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "Acme")]);
    api.respond("properties:a1", vec![named("p1", "Acme Web")]);
    api.respond(
        "views:a1/p1",
        vec![
            json!({ "id": "vA", "name": "View A", "timezone": "Europe/Berlin", "currency": "EUR" }),
            json!({ "id": "vB", "name": "View B" }),
        ],
    );
    api.respond("goals:a1/p1/vA", vec![named("1", "Signup")]);

    let output = tempdir()?;
    let started_at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
    let summary = run_export(&api, output.path(), started_at).await?;

    assert_eq!(summary.run_dir, output.path().join("20240305_140709"));
    assert_eq!(summary.tables.len(), 8);

    let (goal_header, goals) = read_csv(&summary.run_dir.join("goal_settings.csv"))?;
    assert_eq!(
        goal_header,
        vec!["account_id", "property_id", "view_id", "goal_id", "goal_name"]
    );
    assert_eq!(goals, vec![vec!["a1", "p1", "vA", "1", "Signup"]]);

    let (_, views) = read_csv(&summary.run_dir.join("view_settings.csv"))?;
    assert_eq!(views.len(), 2);

    let (summary_header, summary_rows) =
        read_csv(&summary.run_dir.join("account_property_view_settings.csv"))?;
    assert_eq!(summary_header.len(), 6);
    assert_eq!(summary_rows.len(), 2);
    assert_eq!(summary_rows[1][5], "View B");

    for kind in TableKind::ALL {
        assert!(summary.run_dir.join(kind.file_name()).exists());
    }
    Ok(())
}

#[tokio::test]
async fn test_api_failure_aborts_without_writing() -> Result<()> {
    let api = MockManagementApi::new();
    api.respond("accounts", vec![named("a1", "Acme")]);
    api.respond("properties:a1", vec![named("p1", "Acme Web")]);
    api.fail_on("dimensions:a1/p1");

    let output = tempdir()?;
    let result = run_export(&api, output.path(), Local::now()).await;

    assert!(matches!(result, Err(ExportError::Api { .. })));
    assert_eq!(api.count_calls("segments"), 0);
    assert_eq!(std::fs::read_dir(output.path())?.count(), 0);
    Ok(())
}
