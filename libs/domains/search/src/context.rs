//! Plain-text product summaries handed to the reranking model.

use domain_products::{Product, truncate_chars};
use std::fmt::Write;

/// Most products ever summarized for a rerank prompt
pub const MAX_CONTEXT_PRODUCTS: usize = 5;

/// Description characters kept per product
pub const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Summarize the leading products, one numbered block each.
///
/// Only the first [`MAX_CONTEXT_PRODUCTS`] entries are used.
pub fn summarize(products: &[Product]) -> String {
    let mut context = String::new();

    for (i, product) in products.iter().take(MAX_CONTEXT_PRODUCTS).enumerate() {
        let _ = writeln!(context, "Product {}:", i + 1);
        let _ = writeln!(context, "PID: {}", product.pid);
        let _ = writeln!(context, "Title: {}", product.title);
        let _ = writeln!(context, "Brand: {}", product.brand);
        let _ = writeln!(
            context,
            "Category: {} - {}",
            product.category, product.sub_category
        );
        let _ = writeln!(
            context,
            "Price: {} (Discounted from {})",
            product.selling_price, product.actual_price
        );
        let _ = writeln!(context, "Rating: {}", product.average_rating);

        let description = product.description.trim();
        if !description.is_empty() {
            let _ = writeln!(
                context,
                "Description: {}",
                truncate_chars(description, DESCRIPTION_PREVIEW_CHARS)
            );
        }
        context.push_str("---\n");
    }

    context
}
