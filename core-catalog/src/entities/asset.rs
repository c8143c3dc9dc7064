use serde::{Deserialize, Serialize};

/// An image in one of the sizes the catalog serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Asset {
    /// Pixel area, 0 when the size is unknown.
    pub fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }

    /// Largest image of a set.
    pub fn largest(assets: &[Asset]) -> Option<&Asset> {
        assets.iter().max_by_key(|a| a.area())
    }
}
