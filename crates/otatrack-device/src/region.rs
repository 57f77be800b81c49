//! Region codes carried as the product suffix
//!
//! Products are named `<MODEL>-<REGION>`, e.g. `KM9-OP`. The suffix after the last `-`
//! selects the market the build belongs to.

/// Region code of a product, i.e. the text after its last `-`
///
/// Products without a dash have no region code.
pub fn region_code(product: &str) -> Option<&str> {
    product
        .rsplit_once('-')
        .map(|(_, code)| code)
        .filter(|code| !code.is_empty())
}

/// Display name for a region code
pub fn region_name(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "GL" | "OP" => Some("Global"),
        "RU" => Some("Russia"),
        "IN" => Some("India"),
        "EU" => Some("Europe"),
        "TR" => Some("Turkey"),
        _ => None,
    }
}

/// Display name of the region a product belongs to
pub fn region_for_product(product: &str) -> Option<&'static str> {
    region_code(product).and_then(region_name)
}
