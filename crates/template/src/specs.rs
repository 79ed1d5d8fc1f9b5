//! The directive attributes the pipeline looks for, bound to the configured namespaces.

use zpt_dom::{AttributeSpec, Namespace};

#[derive(Debug, Clone)]
pub struct TalSpecs {
    pub define: AttributeSpec,
    pub condition: AttributeSpec,
    pub repeat: AttributeSpec,
    pub content: AttributeSpec,
    pub replace: AttributeSpec,
    pub attributes: AttributeSpec,
    pub omit_tag: AttributeSpec,
    pub on_error: AttributeSpec,
}

impl TalSpecs {
    pub fn new(namespace: &Namespace) -> Self {
        let spec = |name: &str| AttributeSpec::new(namespace.clone(), name);
        Self {
            define: spec("define"),
            condition: spec("condition"),
            repeat: spec("repeat"),
            content: spec("content"),
            replace: spec("replace"),
            attributes: spec("attributes"),
            omit_tag: spec("omit-tag"),
            on_error: spec("on-error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetalSpecs {
    pub define_macro: AttributeSpec,
    pub use_macro: AttributeSpec,
    pub extend_macro: AttributeSpec,
    pub define_slot: AttributeSpec,
    pub fill_slot: AttributeSpec,
}

impl MetalSpecs {
    pub fn new(namespace: &Namespace) -> Self {
        let spec = |name: &str| AttributeSpec::new(namespace.clone(), name);
        Self {
            define_macro: spec("define-macro"),
            use_macro: spec("use-macro"),
            extend_macro: spec("extend-macro"),
            define_slot: spec("define-slot"),
            fill_slot: spec("fill-slot"),
        }
    }
}
