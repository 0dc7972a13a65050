use crate::error::{Result, SalesAnalyticsError};
use crate::filter::TimeFrame;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Labels used for records that lack the grouping field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionLabels {
    #[schemars(description = "Bucket for sales without a product name, usually accessories")]
    pub product: String,

    #[schemars(description = "Bucket for sales without a category")]
    pub category: String,

    #[schemars(description = "Bucket for sales that were not financed")]
    pub financer: String,
}

impl Default for DimensionLabels {
    fn default() -> Self {
        Self {
            product: "Accessory".to_string(),
            category: "Unknown".to_string(),
            financer: "None".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsConfig {
    #[schemars(description = "Records requested per page from the sales endpoint")]
    pub page_size: u32,

    #[schemars(description = "How many buckets the top-N views keep")]
    pub top_n: usize,

    pub labels: DimensionLabels,

    #[schemars(description = "Time frame selected when the sales page first opens")]
    pub default_time_frame: TimeFrame,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            top_n: 5,
            labels: DimensionLabels::default(),
            default_time_frame: TimeFrame::Day,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SalesAnalyticsError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }

        let labels = [
            ("product", &self.labels.product),
            ("category", &self.labels.category),
            ("financer", &self.labels.financer),
        ];
        for (dimension, label) in labels {
            if label.trim().is_empty() {
                return Err(SalesAnalyticsError::InvalidConfig(format!(
                    "fallback label for {} must not be empty",
                    dimension
                )));
            }
        }

        Ok(())
    }

    pub fn json_schema() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(AnalyticsConfig);
        serde_json::to_string_pretty(&schema)
    }
}
