mod common;

use common::fixtures::shop_model;
use common::{TestResult, render_body};
use serde_json::json;
use zpt::{RenderError, ZptError};

#[test]
fn test_on_error_on_failing_element() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let out = render_body(
        "<p tal:content=\"here/missing\" tal:on-error=\"string:unavailable\">x</p>",
        &shop_model(),
    )?;
    assert_eq!(out, "<p>unavailable</p>");
    Ok(())
}

#[test]
fn test_error_is_bound_for_the_handler() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let out = render_body(
        "<p tal:repeat=\"x here/shop_count\" tal:on-error=\"error/type\">x</p>",
        &json!({"shop_count": 4}),
    )?;
    assert_eq!(out, "<p>NotIterableError</p>");
    Ok(())
}

#[test]
fn test_error_bubbles_to_nearest_ancestor_handler() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let out = render_body(
        "<div tal:on-error=\"string:outer\">\
         <section tal:on-error=\"string:inner\"><p tal:content=\"here/missing\"/></section>\
         <p tal:content=\"here/shop\"/></div>",
        &shop_model(),
    )?;
    assert_eq!(out, "<div><section>inner</section><p>Corner Shop</p></div>");
    Ok(())
}

#[test]
fn test_handler_value_modes() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let out = render_body(
        "<a tal:content=\"here/missing\" tal:on-error=\"structure string:&lt;em&gt;failed&lt;/em&gt;\">x</a>\
         <b tal:content=\"here/missing\" tal:on-error=\"nothing\">x</b>\
         <c tal:content=\"here/missing\" tal:on-error=\"default\">kept</c>",
        &json!({}),
    )?;
    assert_eq!(out, "<a><em>failed</em></a><b/><c>kept</c>");
    Ok(())
}

#[test]
fn test_each_repetition_handles_its_own_failure() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let out = render_body(
        "<li tal:repeat=\"item here/items\" tal:content=\"item/name\" tal:on-error=\"string:bad item\"/>",
        &json!({"items": [{"name": "a"}, 5, {"name": "c"}]}),
    )?;
    assert_eq!(out, "<li>a</li><li>bad item</li><li>c</li>");
    Ok(())
}

#[test]
fn test_failing_handler_propagates() {
    let _ = env_logger::builder().is_test(true).try_init();
    let err = render_body(
        "<p tal:content=\"here/missing\" tal:on-error=\"here/also_missing\">x</p>",
        &json!({}),
    )
    .unwrap_err();
    assert!(err.to_string().contains("here/also_missing"), "{err}");
}

#[test]
fn test_malformed_expression_is_not_caught() {
    let _ = env_logger::builder().is_test(true).try_init();
    let err = render_body(
        "<div tal:on-error=\"string:caught\"><p tal:content=\"here//name\"/></div>",
        &json!({}),
    )
    .unwrap_err();
    match err {
        ZptError::Render(error @ RenderError::Evaluation { .. }) => assert!(!error.is_recoverable()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_content_and_replace_is_not_caught() {
    let _ = env_logger::builder().is_test(true).try_init();
    let err = render_body(
        "<div tal:on-error=\"string:caught\"><p tal:content=\"here/a\" tal:replace=\"here/b\"/></div>",
        &json!({"a": 1, "b": 2}),
    )
    .unwrap_err();
    assert!(matches!(err, ZptError::Render(RenderError::ContentAndReplace { .. })));
}

#[test]
fn test_unhandled_error_names_element_and_position() {
    let _ = env_logger::builder().is_test(true).try_init();
    let err = render_body("<p tal:content=\"here/missing\"/>", &json!({})).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("<p> at line 1"), "{message}");
    assert!(message.contains("here/missing"), "{message}");
}
