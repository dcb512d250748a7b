use serde::{Deserialize, Serialize};
use validator::Validate;

const USD: &str = "USD";
const CENTS_PER_DOLLAR: i64 = 100;

fn default_status() -> String {
    "private".to_string()
}

fn default_license() -> String {
    "royalty_free_all_extended_uses".to_string()
}

/// Price in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub value: i64,
    pub currency: String,
    pub denominator: i64,
}

impl Price {
    /// Convert a major-unit USD amount (e.g. 19.99) into cents, rounding to the nearest cent.
    pub fn from_usd(amount: f64) -> Self {
        Self {
            value: (amount * CENTS_PER_DOLLAR as f64).round() as i64,
            currency: USD.to_string(),
            denominator: CENTS_PER_DOLLAR,
        }
    }
}

/// Draft attributes as declared in the bundle's `product` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct DraftSpec {
    #[validate(length(min = 1, max = 255, message = "Product name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Product type must not be empty"))]
    pub product_type: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price_usd: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_license")]
    pub license: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub geometry: String,
    #[serde(default)]
    pub materials: bool,
    #[serde(default)]
    pub polygons: u64,
    #[serde(default)]
    pub rigged: bool,
    #[serde(default)]
    pub textures: bool,
    #[serde(default)]
    pub unwrapped_u_vs: String,
    #[serde(default)]
    pub uv_mapped: bool,
    #[serde(default)]
    pub vertices: u64,
}

/// Attribute set sent when creating a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftAttributes {
    pub name: String,
    pub product_type: String,
    pub price: Price,
    pub description: String,
    pub status: String,
    pub license: String,
    pub tags: Vec<String>,
    pub animated: bool,
    pub geometry: String,
    pub materials: bool,
    pub polygons: u64,
    pub rigged: bool,
    pub textures: bool,
    pub unwrapped_u_vs: String,
    pub uv_mapped: bool,
    pub vertices: u64,
}

impl From<&DraftSpec> for DraftAttributes {
    fn from(spec: &DraftSpec) -> Self {
        Self {
            name: spec.name.clone(),
            product_type: spec.product_type.clone(),
            price: Price::from_usd(spec.price_usd),
            description: spec.description.clone(),
            status: spec.status.clone(),
            license: spec.license.clone(),
            tags: spec.tags.clone(),
            animated: spec.animated,
            geometry: spec.geometry.clone(),
            materials: spec.materials,
            polygons: spec.polygons,
            rigged: spec.rigged,
            textures: spec.textures,
            unwrapped_u_vs: spec.unwrapped_u_vs.clone(),
            uv_mapped: spec.uv_mapped,
            vertices: spec.vertices,
        }
    }
}

/// Finalized product created by publishing a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub draft_id: String,
}
