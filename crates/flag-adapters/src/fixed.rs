use flag_core::{AssessmentRequest, ExternalReasoner, ReasonerError};

/// Razonador de respuesta fija: devuelve siempre el mismo texto (o el mismo
/// error). Sirve para demos sin red y para probar el escape al fallback.
#[derive(Debug, Clone)]
pub struct StaticReasoner {
    reply: Result<String, ReasonerError>,
}

impl StaticReasoner {
    pub fn replying(text: impl Into<String>) -> Self {
        Self { reply: Ok(text.into()) }
    }

    pub fn failing(error: ReasonerError) -> Self {
        Self { reply: Err(error) }
    }
}

impl ExternalReasoner for StaticReasoner {
    fn name(&self) -> &str {
        "static"
    }

    fn assess(&self, _request: &AssessmentRequest) -> Result<String, ReasonerError> {
        self.reply.clone()
    }
}
