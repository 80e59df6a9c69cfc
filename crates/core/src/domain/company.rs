use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only business state handed to every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySnapshot {
    pub name: String,
    pub industry: String,
    pub cash_on_hand: f64,
    pub burn_rate: f64,
    pub runway_months: f64,
    /// Chronological, oldest first.
    pub history: Vec<MonthlyMetric>,
    pub marketing_segments: Vec<MarketingSegment>,
    pub brand_index: BrandHumanityIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetric {
    pub month: String,
    pub revenue: f64,
    pub expenses: f64,
    pub users: u64,
    /// Percent.
    pub churn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingSegment {
    pub name: String,
    pub size: u64,
    pub growth: f64,
    /// Customer lifetime value.
    pub clv: f64,
    /// 0-100.
    pub sentiment: u32,
    pub top_interest: String,
}

/// Six brand dimensions, conventionally 0-100. Values are not clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandHumanityIndex {
    pub physicality: u32,
    pub intellect: u32,
    pub sociability: u32,
    pub emotionality: u32,
    pub personability: u32,
    pub morality: u32,
}

impl CompanySnapshot {
    pub fn seed() -> Self {
        let month = |month: &str, revenue: f64, expenses: f64, users: u64, churn: f64| MonthlyMetric {
            month: month.to_string(),
            revenue,
            expenses,
            users,
            churn,
        };
        let segment = |name: &str, size: u64, growth: f64, clv: f64, sentiment: u32, top_interest: &str| {
            MarketingSegment {
                name: name.to_string(),
                size,
                growth,
                clv,
                sentiment,
                top_interest: top_interest.to_string(),
            }
        };

        Self {
            name: "NovaTech Solutions".to_string(),
            industry: "SaaS / AI".to_string(),
            cash_on_hand: 1_200_000.0,
            burn_rate: 85_000.0,
            runway_months: 14.0,
            history: vec![
                month("Jan", 45_000.0, 80_000.0, 1200, 2.5),
                month("Feb", 49_000.0, 82_000.0, 1350, 2.4),
                month("Mar", 58_000.0, 85_000.0, 1600, 2.1),
                month("Apr", 62_000.0, 83_000.0, 1800, 2.0),
                month("May", 75_000.0, 88_000.0, 2100, 1.8),
                month("Jun", 81_000.0, 85_000.0, 2400, 1.9),
            ],
            marketing_segments: vec![
                segment("Digital Natives", 850, 15.0, 2400.0, 88, "Mobile UX"),
                segment("Eco-Conscious Pros", 620, 8.0, 3100.0, 75, "Sustainability"),
                segment("Legacy Enterprise", 300, 2.0, 15000.0, 60, "Security"),
            ],
            brand_index: BrandHumanityIndex {
                physicality: 85,
                intellect: 90,
                sociability: 65,
                emotionality: 55,
                personability: 70,
                morality: 80,
            },
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read company snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str::<Self>(&text)
            .with_context(|| format!("company snapshot {} is not valid JSON", path.display()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.name.trim().is_empty(), "company name must be non-empty");
        ensure!(
            !self.history.is_empty(),
            "company history must contain at least one monthly metric"
        );
        Ok(())
    }

    pub fn latest_metric(&self) -> Option<&MonthlyMetric> {
        self.history.last()
    }

    /// Months of cash left at the current burn. `None` when nothing is burning.
    pub fn projected_runway_months(&self) -> Option<f64> {
        if self.burn_rate <= 0.0 {
            return None;
        }
        Some(self.cash_on_hand / self.burn_rate)
    }
}
