use thiserror::Error;
use zpt_dom::DomError;
use zpt_tales::TalesError;
use zpt_template::RenderError;

/// Everything that can go wrong between parsing a template and writing its output.
#[derive(Error, Debug)]
pub enum ZptError {
    #[error("Template could not be read: {0}")]
    Markup(#[from] DomError),

    #[error("Output could not be written: {0}")]
    Output(DomError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Model conversion failed: {0}")]
    Model(#[from] TalesError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
