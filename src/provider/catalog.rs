use crate::provider::Category;

const CATEGORIES: &[(u32, &str)] = &[
    (0, "All"),
    (1, "Brightest"),
    (2, "ISS"),
    (3, "Weather"),
    (4, "NOAA"),
    (18, "Amateur radio"),
    (22, "Galileo"),
    (23, "Satellite-Based Augmentation System"),
    (24, "Navy Navigation Satellite System"),
    (25, "Russian LEO Navigation"),
];

/// Category ids understood by the N2YO "above" endpoint.
pub fn default_categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .map(|(id, name)| Category {
            id: *id,
            name: name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_starts_with_all() {
        let categories = default_categories();
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[0].id, 0);
        assert_eq!(categories[0].name, "All");
        assert!(categories.iter().any(|c| c.id == 18 && c.name == "Amateur radio"));
    }
}
