//! Dashboard routing.
//!
//! Every role maps to exactly one dashboard. There is no fallback arm: the
//! role set is closed, so an unknown role cannot reach the router.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Which dashboard an authenticated session sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Staff,
    Volunteer,
    Admin,
}

impl DashboardKind {
    /// Role a dashboard belongs to.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Staff => Role::Staff,
            Self::Volunteer => Role::Volunteer,
            Self::Admin => Role::Admin,
        }
    }
}

/// Route a role to its dashboard.
#[must_use]
pub const fn route(role: Role) -> DashboardKind {
    match role {
        Role::Staff => DashboardKind::Staff,
        Role::Volunteer => DashboardKind::Volunteer,
        Role::Admin => DashboardKind::Admin,
    }
}

/// Tabs of the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminTab {
    #[default]
    Overview,
    Logs,
    Volunteers,
    Reports,
}

impl AdminTab {
    pub const ALL: [Self; 4] = [Self::Overview, Self::Logs, Self::Volunteers, Self::Reports];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Logs => "logs",
            Self::Volunteers => "volunteers",
            Self::Reports => "reports",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Logs => "Food Logs",
            Self::Volunteers => "Volunteers",
            Self::Reports => "Reports",
        }
    }
}

impl std::fmt::Display for AdminTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| format!("unknown admin tab: {s}"))
    }
}

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    #[serde(rename = "PDF")]
    Pdf,
    Excel,
}

/// A report offered on the reports tab. Generation is not wired up; the tab
/// only lists what is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportKind {
    pub title: &'static str,
    pub description: &'static str,
    pub format: ReportFormat,
}

/// Every report on the reports tab, in display order.
pub const REPORTS: [ReportKind; 4] = [
    ReportKind {
        title: "Monthly Report",
        description: "Comprehensive monthly food waste and redistribution summary",
        format: ReportFormat::Pdf,
    },
    ReportKind {
        title: "Analytics Export",
        description: "Raw data export for detailed analysis",
        format: ReportFormat::Excel,
    },
    ReportKind {
        title: "Volunteer Report",
        description: "Volunteer performance and engagement metrics",
        format: ReportFormat::Pdf,
    },
    ReportKind {
        title: "Food Logs",
        description: "Complete food logging history with timestamps",
        format: ReportFormat::Excel,
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_route_is_total_and_role_preserving() {
        for role in Role::ALL {
            assert_eq!(route(role).role(), role);
            assert_eq!(route(role), route(role));
        }
        assert_eq!(route(Role::Staff), DashboardKind::Staff);
        assert_eq!(route(Role::Volunteer), DashboardKind::Volunteer);
        assert_eq!(route(Role::Admin), DashboardKind::Admin);
    }

    #[test]
    fn test_admin_tab_parse() {
        assert_eq!(AdminTab::default(), AdminTab::Overview);
        for tab in AdminTab::ALL {
            assert_eq!(tab.as_str().parse::<AdminTab>().unwrap(), tab);
        }
        assert!("settings".parse::<AdminTab>().is_err());
    }

    #[test]
    fn test_report_formats() {
        let formats: Vec<_> = REPORTS.iter().map(|r| r.format).collect();
        assert_eq!(
            formats,
            [
                ReportFormat::Pdf,
                ReportFormat::Excel,
                ReportFormat::Pdf,
                ReportFormat::Excel
            ]
        );
        assert_eq!(serde_json::to_string(&ReportFormat::Pdf).unwrap(), "\"PDF\"");
    }
}
