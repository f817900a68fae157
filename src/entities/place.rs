use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// Google Places type used to search around a stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Restaurant,
    Cafe,
    Store,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::Store => "store",
        }
    }
}

/// A point of interest found near a stop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub address: Option<String>,
    pub location: Option<Coordinates>,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    #[serde(default)]
    pub types: Vec<String>,
    pub business_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl Place {
    pub fn has_type(&self, category: Category) -> bool {
        self.types.iter().any(|t| t == category.name())
    }

    /// Text submitted to the embedding model for this place.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.address.as_deref().unwrap_or(""),
            self.types.join(", ")
        )
    }
}

#[test]
fn search_text_joins_tags() {
    let place = Place {
        name: "Blue Bottle".into(),
        address: Some("1 Main St, Oakland".into()),
        location: None,
        rating: Some(4.5),
        price_level: None,
        types: vec!["cafe".into(), "food".into()],
        business_status: None,
        place_id: None,
    };

    assert_eq!(place.search_text(), "Blue Bottle 1 Main St, Oakland cafe, food");
    assert!(place.has_type(Category::Cafe));
    assert!(!place.has_type(Category::Restaurant));
}
