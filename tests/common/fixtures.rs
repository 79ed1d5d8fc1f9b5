//! Shared templates for the integration tests.

use super::page;

/// A layout with a title slot and a body slot.
pub fn layout_library() -> String {
    page(
        "<body metal:define-macro=\"layout\">\
         <h1 metal:define-slot=\"title\">Untitled</h1>\
         <main metal:define-slot=\"body\">No content</main>\
         </body>",
    )
}

/// `article` extends `layout`, filling its body and re-exposing a `lead` slot.
pub fn extension_library() -> String {
    page(
        "<body metal:define-macro=\"layout\">\
         <h1 metal:define-slot=\"title\">Untitled</h1>\
         <main metal:define-slot=\"body\">No content</main>\
         </body>\
         <body metal:define-macro=\"article\" metal:extend-macro=\"macros/layout\">\
         <main metal:fill-slot=\"body\"><p class=\"lead\" metal:define-slot=\"lead\">Lead</p><p>Article text</p></main>\
         </body>",
    )
}

pub fn shop_model() -> serde_json::Value {
    serde_json::json!({
        "shop": "Corner Shop",
        "items": [
            {"name": "Apple", "price": 3, "tags": ["fruit"]},
            {"name": "Bread", "price": 12, "tags": []},
            {"name": "Cheese", "price": 25, "tags": ["dairy", "aged"]}
        ],
        "empty": [],
        "html": "<em>fresh</em>"
    })
}
