//! # Record Flattener
//!
//! Projects raw Management API objects onto fixed column whitelists. Fields
//! absent on the source become [`Cell::Missing`]; nested objects contribute a
//! single named sub-field (e.g. `parentLink.href`) and nothing else.

use crate::row::{Cell, Row};
use serde_json::{Map, Value};

/// Where a column's value is read from on the source object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Field(&'static str),
    Nested(&'static str, &'static str),
}

/// One output column of a whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub source: Source,
}

impl Column {
    /// A column named after the source field.
    pub const fn field(name: &'static str) -> Self {
        Self {
            name,
            source: Source::Field(name),
        }
    }

    pub const fn renamed(name: &'static str, field: &'static str) -> Self {
        Self {
            name,
            source: Source::Field(field),
        }
    }

    pub const fn nested(name: &'static str, parent: &'static str, child: &'static str) -> Self {
        Self {
            name,
            source: Source::Nested(parent, child),
        }
    }

    fn read(&self, source: &Value) -> Cell {
        match self.source {
            Source::Field(field) => Cell::from_field(source, field),
            Source::Nested(parent, child) => Cell::from_nested(source, parent, child),
        }
    }
}

pub const VIEW_COLUMNS: &[Column] = &[
    Column::field("id"),
    Column::field("kind"),
    Column::field("selfLink"),
    Column::field("accountId"),
    Column::field("webPropertyId"),
    Column::field("internalWebPropertyId"),
    Column::field("name"),
    Column::field("currency"),
    Column::field("timezone"),
    Column::field("websiteUrl"),
    Column::field("defaultPage"),
    Column::field("excludeQueryParameters"),
    Column::field("siteSearchQueryParameters"),
    Column::field("stripSiteSearchQueryParameters"),
    Column::field("siteSearchCategoryParameters"),
    Column::field("stripSiteSearchCategoryParameters"),
    Column::field("type"),
    Column::nested("permissions", "permissions", "effective"),
    Column::field("created"),
    Column::field("updated"),
    Column::field("eCommerceTracking"),
    Column::field("enhancedECommerceTracking"),
    Column::field("botFilteringEnabled"),
    Column::field("starred"),
    Column::nested("parentLink", "parentLink", "href"),
    Column::nested("childLink", "childLink", "href"),
];

pub const PROFILE_FILTER_LINK_COLUMNS: &[Column] = &[
    Column::nested("filter_id", "filterRef", "id"),
    Column::renamed("link_id", "id"),
];

pub const GOAL_COLUMNS: &[Column] = &[
    Column::renamed("goal_id", "id"),
    Column::renamed("goal_name", "name"),
];

pub const CUSTOM_DIMENSION_COLUMNS: &[Column] = &[
    Column::renamed("dimension_id", "id"),
    Column::renamed("dimension_name", "name"),
    Column::field("kind"),
    Column::field("index"),
    Column::field("scope"),
    Column::field("active"),
    Column::field("created"),
    Column::field("updated"),
    Column::field("selfLink"),
    Column::nested("parentLink", "parentLink", "href"),
];

pub const CUSTOM_METRIC_COLUMNS: &[Column] = &[
    Column::renamed("metric_id", "id"),
    Column::renamed("metric_name", "name"),
];

pub const SEGMENT_COLUMNS: &[Column] = &[
    Column::renamed("segment_id", "id"),
    Column::renamed("segment_name", "name"),
    Column::field("definition"),
    Column::field("kind"),
    Column::field("type"),
    Column::field("created"),
    Column::field("updated"),
];

pub const FILTER_COLUMNS: &[Column] = &[
    Column::renamed("filter_id", "id"),
    Column::field("kind"),
    Column::field("selfLink"),
    Column::field("name"),
    Column::field("type"),
    Column::field("created"),
    Column::field("updated"),
    Column::nested("parentLink", "parentLink", "href"),
];

fn project(row: &mut Row, source: &Value, columns: &[Column]) {
    for column in columns {
        row.insert(column.name, column.read(source));
    }
}

// --- Ancestor identifiers ---

/// Identifiers of a property and its account, carried on every child row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyScope {
    pub account_id: String,
    pub property_id: String,
}

impl PropertyScope {
    pub fn view(&self, view_id: impl Into<String>) -> ViewScope {
        ViewScope {
            account_id: self.account_id.clone(),
            property_id: self.property_id.clone(),
            view_id: view_id.into(),
        }
    }

    fn start_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("account_id", self.account_id.as_str());
        row.insert("property_id", self.property_id.as_str());
        row
    }
}

/// Identifiers of a view and all of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewScope {
    pub account_id: String,
    pub property_id: String,
    pub view_id: String,
}

impl ViewScope {
    fn start_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("account_id", self.account_id.as_str());
        row.insert("property_id", self.property_id.as_str());
        row.insert("view_id", self.view_id.as_str());
        row
    }
}

/// Returns the `id` of an API object as text, or `None` if it has no usable id.
pub fn id_of(source: &Value) -> Option<String> {
    match source.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

// --- Row builders ---

/// The account/property/view summary row.
pub fn account_property_view_row(account: &Value, property: &Value, view: &Value) -> Row {
    let mut row = Row::new();
    row.insert("account_id", Cell::from_field(account, "id"));
    row.insert("account_name", Cell::from_field(account, "name"));
    row.insert("property_id", Cell::from_field(property, "id"));
    row.insert("property_name", Cell::from_field(property, "name"));
    row.insert("view_id", Cell::from_field(view, "id"));
    row.insert("view_name", Cell::from_field(view, "name"));
    row
}

pub fn view_row(view: &Value) -> Row {
    let mut row = Row::new();
    project(&mut row, view, VIEW_COLUMNS);
    row
}

pub fn profile_filter_link_row(scope: &ViewScope, link: &Value) -> Row {
    let mut row = scope.start_row();
    project(&mut row, link, PROFILE_FILTER_LINK_COLUMNS);
    row
}

pub fn goal_row(scope: &ViewScope, goal: &Value) -> Row {
    let mut row = scope.start_row();
    project(&mut row, goal, GOAL_COLUMNS);
    row
}

pub fn custom_dimension_row(scope: &PropertyScope, dimension: &Value) -> Row {
    let mut row = scope.start_row();
    project(&mut row, dimension, CUSTOM_DIMENSION_COLUMNS);
    row
}

pub fn custom_metric_row(scope: &PropertyScope, metric: &Value) -> Row {
    let mut row = scope.start_row();
    project(&mut row, metric, CUSTOM_METRIC_COLUMNS);
    row
}

pub fn segment_row(segment: &Value) -> Row {
    let mut row = Row::new();
    project(&mut row, segment, SEGMENT_COLUMNS);
    row
}

/// The filter row: common columns followed by the prefixed columns of every
/// detail block present on the filter. Absent blocks add no columns.
pub fn filter_row(account_id: &str, filter: &Value) -> Row {
    let mut row = Row::new();
    row.insert("account_id", account_id);
    project(&mut row, filter, FILTER_COLUMNS);
    for detail in filter_details(filter) {
        detail.merge_into(&mut row);
    }
    row
}

// --- Filter detail blocks ---

/// The kinds of optional detail block a filter may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Include,
    Exclude,
    Lowercase,
    Uppercase,
    SearchAndReplace,
    Advanced,
}

const EXPRESSION_FIELDS: &[&str] = &[
    "kind",
    "field",
    "matchType",
    "expressionValue",
    "caseSensitive",
    "fieldIndex",
];

const CASE_FIELDS: &[&str] = &["field", "fieldIndex"];

const SEARCH_AND_REPLACE_FIELDS: &[&str] = &[
    "field",
    "fieldIndex",
    "searchString",
    "replaceString",
    "caseSensitive",
];

const ADVANCED_FIELDS: &[&str] = &[
    "fieldA",
    "fieldAIndex",
    "extractA",
    "fieldB",
    "fieldBIndex",
    "extractB",
    "outputToField",
    "outputToFieldIndex",
    "outputConstructor",
    "fieldARequired",
    "fieldBRequired",
    "overrideOutputField",
    "caseSensitive",
];

impl DetailKind {
    pub const ALL: [DetailKind; 6] = [
        DetailKind::Include,
        DetailKind::Exclude,
        DetailKind::Lowercase,
        DetailKind::Uppercase,
        DetailKind::SearchAndReplace,
        DetailKind::Advanced,
    ];

    /// The key holding this block on a filter object.
    pub fn source_key(self) -> &'static str {
        match self {
            DetailKind::Include => "includeDetails",
            DetailKind::Exclude => "excludeDetails",
            DetailKind::Lowercase => "lowercaseDetails",
            DetailKind::Uppercase => "uppercaseDetails",
            DetailKind::SearchAndReplace => "searchAndReplaceDetails",
            DetailKind::Advanced => "advancedDetails",
        }
    }

    /// The prefix of this block's columns, e.g. `include` for `include_field`.
    pub fn prefix(self) -> &'static str {
        match self {
            DetailKind::Include => "include",
            DetailKind::Exclude => "exclude",
            DetailKind::Lowercase => "lowercase",
            DetailKind::Uppercase => "uppercase",
            DetailKind::SearchAndReplace => "searchReplace",
            DetailKind::Advanced => "advanced",
        }
    }

    pub fn fields(self) -> &'static [&'static str] {
        match self {
            DetailKind::Include | DetailKind::Exclude => EXPRESSION_FIELDS,
            DetailKind::Lowercase | DetailKind::Uppercase => CASE_FIELDS,
            DetailKind::SearchAndReplace => SEARCH_AND_REPLACE_FIELDS,
            DetailKind::Advanced => ADVANCED_FIELDS,
        }
    }

    /// The column names this block contributes.
    pub fn column_names(self) -> Vec<String> {
        self.fields()
            .iter()
            .map(|field| format!("{}_{}", self.prefix(), field))
            .collect()
    }
}

/// A detail block found on a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDetail<'a> {
    pub kind: DetailKind,
    pub block: &'a Map<String, Value>,
}

impl FilterDetail<'_> {
    fn merge_into(&self, row: &mut Row) {
        for field in self.kind.fields() {
            row.insert(
                format!("{}_{}", self.kind.prefix(), field),
                Cell::from_map(self.block, field),
            );
        }
    }
}

/// Finds the detail blocks present on a filter. Each kind is checked on its
/// own; a block counts as present when it is a non-empty object.
pub fn filter_details(filter: &Value) -> Vec<FilterDetail<'_>> {
    DetailKind::ALL
        .iter()
        .filter_map(|&kind| match filter.get(kind.source_key()) {
            Some(Value::Object(block)) if !block.is_empty() => Some(FilterDetail { kind, block }),
            _ => None,
        })
        .collect()
}
