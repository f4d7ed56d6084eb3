//! Dimensional filtering over budget lines.

use serde::{Deserialize, Serialize};

use fiscus_shared::types::{
    ChartOfAccountId, DepartmentId, FiscalYearId, FundId, ProjectId, SubDepartmentId,
};

use crate::ledger::LineKey;

/// Filter over the six fiscal dimensions of a budget line.
///
/// Any subset of the dimensions may be set; set dimensions are
/// AND-combined. An empty filter matches every line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineFilter {
    /// Restrict to one fiscal year.
    pub fiscal_year_id: Option<FiscalYearId>,
    /// Restrict to one fund.
    pub fund_id: Option<FundId>,
    /// Restrict to one department.
    pub department_id: Option<DepartmentId>,
    /// Restrict to one sub-department.
    pub sub_department_id: Option<SubDepartmentId>,
    /// Restrict to one chart of accounts entry.
    pub chart_of_account_id: Option<ChartOfAccountId>,
    /// Restrict to one project.
    pub project_id: Option<ProjectId>,
}

impl LineFilter {
    /// Creates a new empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to a fiscal year.
    #[must_use]
    pub const fn with_fiscal_year(mut self, id: FiscalYearId) -> Self {
        self.fiscal_year_id = Some(id);
        self
    }

    /// Restricts the filter to a fund.
    #[must_use]
    pub const fn with_fund(mut self, id: FundId) -> Self {
        self.fund_id = Some(id);
        self
    }

    /// Restricts the filter to a department.
    #[must_use]
    pub const fn with_department(mut self, id: DepartmentId) -> Self {
        self.department_id = Some(id);
        self
    }

    /// Restricts the filter to a sub-department.
    #[must_use]
    pub const fn with_sub_department(mut self, id: SubDepartmentId) -> Self {
        self.sub_department_id = Some(id);
        self
    }

    /// Restricts the filter to a chart of accounts entry.
    #[must_use]
    pub const fn with_chart_of_account(mut self, id: ChartOfAccountId) -> Self {
        self.chart_of_account_id = Some(id);
        self
    }

    /// Restricts the filter to a project.
    #[must_use]
    pub const fn with_project(mut self, id: ProjectId) -> Self {
        self.project_id = Some(id);
        self
    }

    /// Returns true if the filter is empty (matches everything).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fiscal_year_id.is_none()
            && self.fund_id.is_none()
            && self.department_id.is_none()
            && self.sub_department_id.is_none()
            && self.chart_of_account_id.is_none()
            && self.project_id.is_none()
    }

    /// Returns true when the key satisfies every set dimension.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.fiscal_year_id.is_none_or(|id| id == key.fiscal_year_id)
            && self.fund_id.is_none_or(|id| id == key.fund_id)
            && self.department_id.is_none_or(|id| id == key.department_id)
            && self
                .sub_department_id
                .is_none_or(|id| id == key.sub_department_id)
            && self
                .chart_of_account_id
                .is_none_or(|id| id == key.chart_of_account_id)
            && self.project_id.is_none_or(|id| id == key.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_key() -> LineKey {
        LineKey {
            fiscal_year_id: FiscalYearId::new(),
            fund_id: FundId::new(),
            department_id: DepartmentId::new(),
            sub_department_id: SubDepartmentId::new(),
            chart_of_account_id: ChartOfAccountId::new(),
            project_id: ProjectId::new(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = LineFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&line_key()));
    }

    #[test]
    fn test_single_dimension_filter() {
        let key = line_key();
        let filter = LineFilter::new().with_fund(key.fund_id);
        assert!(filter.matches(&key));

        let other = LineFilter::new().with_fund(FundId::new());
        assert!(!other.matches(&key));
    }

    #[test]
    fn test_dimensions_are_and_combined() {
        let key = line_key();
        let filter = LineFilter::new()
            .with_fiscal_year(key.fiscal_year_id)
            .with_department(key.department_id);
        assert!(filter.matches(&key));

        // One matching and one mismatching dimension must fail.
        let mixed = LineFilter::new()
            .with_fiscal_year(key.fiscal_year_id)
            .with_department(DepartmentId::new());
        assert!(!mixed.matches(&key));
    }

    #[test]
    fn test_all_dimensions() {
        let key = line_key();
        let filter = LineFilter::new()
            .with_fiscal_year(key.fiscal_year_id)
            .with_fund(key.fund_id)
            .with_department(key.department_id)
            .with_sub_department(key.sub_department_id)
            .with_chart_of_account(key.chart_of_account_id)
            .with_project(key.project_id);
        assert!(!filter.is_empty());
        assert!(filter.matches(&key));
    }
}
