//! The per-run accumulator: one row collection per exported table.

use crate::row::Row;

/// The eight tables produced by every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    AccountPropertyView,
    Segment,
    Filter,
    ProfileFilterLink,
    Goal,
    CustomDimension,
    CustomMetric,
    View,
}

impl TableKind {
    /// All tables, in the order they are written.
    pub const ALL: [TableKind; 8] = [
        TableKind::AccountPropertyView,
        TableKind::Segment,
        TableKind::Filter,
        TableKind::ProfileFilterLink,
        TableKind::Goal,
        TableKind::CustomDimension,
        TableKind::CustomMetric,
        TableKind::View,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::AccountPropertyView => "account_property_view_settings.csv",
            TableKind::Segment => "segment_settings.csv",
            TableKind::Filter => "filter_settings.csv",
            TableKind::ProfileFilterLink => "profile_filter_link_settings.csv",
            TableKind::Goal => "goal_settings.csv",
            TableKind::CustomDimension => "custom_dimension_settings.csv",
            TableKind::CustomMetric => "custom_metric_settings.csv",
            TableKind::View => "view_settings.csv",
        }
    }
}

/// Rows collected during a run, owned by the traverser and handed to the
/// writer once the walk is complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTables {
    account_property_views: Vec<Row>,
    segments: Vec<Row>,
    filters: Vec<Row>,
    profile_filter_links: Vec<Row>,
    goals: Vec<Row>,
    custom_dimensions: Vec<Row>,
    custom_metrics: Vec<Row>,
    views: Vec<Row>,
}

impl ExportTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: TableKind, row: Row) {
        self.rows_mut(kind).push(row);
    }

    pub fn rows(&self, kind: TableKind) -> &[Row] {
        match kind {
            TableKind::AccountPropertyView => &self.account_property_views,
            TableKind::Segment => &self.segments,
            TableKind::Filter => &self.filters,
            TableKind::ProfileFilterLink => &self.profile_filter_links,
            TableKind::Goal => &self.goals,
            TableKind::CustomDimension => &self.custom_dimensions,
            TableKind::CustomMetric => &self.custom_metrics,
            TableKind::View => &self.views,
        }
    }

    fn rows_mut(&mut self, kind: TableKind) -> &mut Vec<Row> {
        match kind {
            TableKind::AccountPropertyView => &mut self.account_property_views,
            TableKind::Segment => &mut self.segments,
            TableKind::Filter => &mut self.filters,
            TableKind::ProfileFilterLink => &mut self.profile_filter_links,
            TableKind::Goal => &mut self.goals,
            TableKind::CustomDimension => &mut self.custom_dimensions,
            TableKind::CustomMetric => &mut self.custom_metrics,
            TableKind::View => &mut self.views,
        }
    }
}
