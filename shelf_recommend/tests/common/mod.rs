#![allow(dead_code)]

use shelf_recommend::{
    build_content_index, Catalog, InteractionMatrix, Product, ProductIndex,
    RecommendationArtifacts, RecommendationEngine,
};

/// (user, product) pairs: A and B share all users, C shares two with A,
/// D shares one, E is disjoint and F falls under the cold-start threshold.
pub const INTERACTIONS: &[(&str, &str)] = &[
    ("u1", "A"),
    ("u2", "A"),
    ("u3", "A"),
    ("u1", "B"),
    ("u2", "B"),
    ("u3", "B"),
    ("u1", "C"),
    ("u2", "C"),
    ("u3", "D"),
    ("u4", "D"),
    ("u5", "E"),
    ("u6", "E"),
    ("u6", "F"),
];

pub const MIN_INTERACTIONS: usize = 2;

pub fn products() -> Vec<Product> {
    let entries = [
        ("A", "Steel Chef Knife", "Kitchen"),
        ("B", "Wooden Cutting Board", "Kitchen"),
        ("C", "Steel Paring Knife", "Kitchen"),
        ("D", "Cast Iron Skillet", "Cookware"),
        ("E", "Steel Knife Sharpener", "Kitchen"),
        ("F", "Bamboo Cutting Board", "Kitchen"),
        ("G", "!", ""),
    ];

    entries
        .iter()
        .map(|(id, title, category)| {
            let mut product = Product::new(*id, *title);
            if !category.is_empty() {
                product.categories.push(category.to_string());
            }
            product.image_url = Some(format!("https://img.example/{}.jpg", id));
            product
        })
        .collect()
}

pub fn collaborative_index() -> ProductIndex {
    let built = InteractionMatrix::build(INTERACTIONS.iter().copied(), MIN_INTERACTIONS).unwrap();
    let (mapping, matrix) = built.into_parts();
    ProductIndex::new(mapping, matrix)
}

pub fn content_index() -> ProductIndex {
    let products = products();
    let (mapping, matrix) = build_content_index(&products, 100).unwrap();
    ProductIndex::new(mapping, matrix)
}

pub fn artifacts() -> RecommendationArtifacts {
    RecommendationArtifacts::from_parts(
        Some(collaborative_index()),
        Some(content_index()),
        Some(Catalog::from_products(products())),
    )
}

pub fn engine() -> RecommendationEngine {
    RecommendationEngine::new(artifacts(), 20)
}
