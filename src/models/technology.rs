use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechCategory {
    Frontend,
    Backend,
    Server,
    Database,
    Cms,
    Cdn,
    Analytics,
    Security,
    Language,
    Other,
}

impl TechCategory {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "frontend" | "framework" | "javascript" => Self::Frontend,
            "backend" => Self::Backend,
            "server" | "web-server" | "webserver" => Self::Server,
            "database" => Self::Database,
            "cms" => Self::Cms,
            "cdn" => Self::Cdn,
            "analytics" => Self::Analytics,
            "security" => Self::Security,
            "language" => Self::Language,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechStatus {
    Current,
    Outdated,
    Deprecated,
    Unknown,
}

impl TechStatus {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "current" | "up-to-date" | "latest" => Self::Current,
            "outdated" | "stale" => Self::Outdated,
            "deprecated" | "end-of-life" | "eol" => Self::Deprecated,
            _ => Self::Unknown,
        }
    }
}

/// A technology identified on the target, either deterministically
/// fingerprinted (ground truth) or inferred by the reasoning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologyItem {
    pub name: String,
    pub version: String,
    pub category: TechCategory,
    pub status: TechStatus,
    pub action_plan: String,
    pub cves: Vec<String>,
    /// True when detected deterministically rather than inferred.
    pub ground_truth: bool,
}

/// Merge deterministic and AI-inferred technology lists by name.
/// Deterministic items are never dropped; inferred items fill the gaps and
/// enrich deterministic entries that lack version or remediation detail.
pub fn merge_technologies(
    deterministic: Vec<TechnologyItem>,
    inferred: Vec<TechnologyItem>,
) -> Vec<TechnologyItem> {
    let mut merged = deterministic;

    for item in inferred {
        let key = item.name.trim().to_lowercase();
        if let Some(existing) = merged.iter_mut().find(|t| t.name.trim().to_lowercase() == key) {
            if existing.version.is_empty() && !item.version.is_empty() {
                existing.version = item.version.clone();
            }
            if existing.action_plan.is_empty() && !item.action_plan.is_empty() {
                existing.action_plan = item.action_plan.clone();
            }
            if existing.status == TechStatus::Unknown {
                existing.status = item.status;
            }
            for cve in item.cves {
                if !existing.cves.contains(&cve) {
                    existing.cves.push(cve);
                }
            }
        } else {
            merged.push(item);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech(name: &str, version: &str, ground_truth: bool) -> TechnologyItem {
        TechnologyItem {
            name: name.into(),
            version: version.into(),
            category: TechCategory::Frontend,
            status: TechStatus::Unknown,
            action_plan: String::new(),
            cves: vec![],
            ground_truth,
        }
    }

    #[test]
    fn test_merge_keeps_deterministic_presence() {
        let det = vec![tech("React", "18.2", true)];
        let inferred = vec![tech("react", "", false)];
        let merged = merge_technologies(det, inferred);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].ground_truth);
        assert_eq!(merged[0].version, "18.2");
    }

    #[test]
    fn test_merge_enriches_from_inferred() {
        let det = vec![tech("jQuery", "", true)];
        let mut ai = tech("jquery", "1.9.1", false);
        ai.status = TechStatus::Outdated;
        ai.action_plan = "Upgrade to 3.x".into();
        ai.cves = vec!["CVE-2019-11358".into()];
        let merged = merge_technologies(det, vec![ai]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].version, "1.9.1");
        assert_eq!(merged[0].status, TechStatus::Outdated);
        assert!(!merged[0].cves.is_empty());
        assert!(merged[0].ground_truth);
    }

    #[test]
    fn test_merge_appends_new_inferred() {
        let merged = merge_technologies(vec![tech("Nginx", "1.24", true)], vec![tech("PostgreSQL", "", false)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_category_lenient_parse() {
        assert_eq!(TechCategory::parse_lenient("Framework"), TechCategory::Frontend);
        assert_eq!(TechCategory::parse_lenient("mystery"), TechCategory::Other);
    }

    #[test]
    fn test_status_lenient_parse() {
        assert_eq!(TechStatus::parse_lenient("EOL"), TechStatus::Deprecated);
        assert_eq!(TechStatus::parse_lenient("???"), TechStatus::Unknown);
    }
}
