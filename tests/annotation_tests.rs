mod common;

use common::{METAL_NS, TAL_NS, TestResult};
use serde_json::json;
use zpt::{RenderingConfig, ZptTemplate};

fn comment(source: &str, line: usize) -> String {
    let divider = "=".repeat(78);
    format!("<!--\n{divider}\n{source} (line {line})\n{divider}\n-->")
}

fn annotating() -> RenderingConfig {
    RenderingConfig::builder()
        .with_source_annotation(true)
        .with_annotation_root("/srv/site")
        .build()
}

#[test]
fn test_root_and_macro_definitions_are_annotated() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let markup = format!(
        "<html xmlns:tal=\"{TAL_NS}\" xmlns:metal=\"{METAL_NS}\">\n\
         <div metal:define-macro=\"box\">x</div>\n</html>"
    );
    let template = ZptTemplate::parse_named(&markup, "/srv/site/page.pt")?.with_config(annotating());
    let out = template.render_to_string(&json!({}))?;
    assert_eq!(
        out,
        format!(
            "{}<html>\n{}<div>x</div>\n</html>",
            comment("page.pt", 1),
            comment("page.pt", 2)
        )
    );
    Ok(())
}

#[test]
fn test_imported_macro_is_bracketed() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let library = ZptTemplate::parse_named(
        &format!("<lib xmlns:metal=\"{METAL_NS}\">\n\n<b metal:define-macro=\"bold\">\nb\n</b></lib>"),
        "/srv/site/shared/lib.pt",
    )?;
    let template = ZptTemplate::parse_named(
        &format!("<html xmlns:metal=\"{METAL_NS}\"><i metal:use-macro=\"macros/bold\"/></html>"),
        "/srv/site/page.pt",
    )?
    .with_library(&library)
    .with_config(annotating());
    let out = template.render_to_string(&json!({}))?;
    assert_eq!(
        out,
        format!(
            "{}<html>{}<b>\nb\n</b>{}</html>",
            comment("page.pt", 1),
            comment("shared/lib.pt", 3),
            comment("shared/lib.pt", 5)
        )
    );
    Ok(())
}

#[test]
fn test_define_slot_gets_trailing_comment() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let markup = format!("<html xmlns:metal=\"{METAL_NS}\"><p metal:define-slot=\"s\">x</p></html>");
    let template = ZptTemplate::parse_named(&markup, "page.pt")?.with_config(annotating());
    let out = template.render_to_string(&json!({}))?;
    assert_eq!(
        out,
        format!("{}<html><p>x</p>{}</html>", comment("page.pt", 1), comment("page.pt", 1))
    );
    Ok(())
}

#[test]
fn test_annotation_is_off_by_default() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let template = ZptTemplate::parse_named("<html><p>x</p></html>", "page.pt")?;
    assert_eq!(template.render_to_string(&json!({}))?, "<html><p>x</p></html>");
    Ok(())
}
