use thiserror::Error;

/// Everything that can go wrong between asking for records and holding them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport never got an HTTP answer.
    #[error("{0}")]
    Network(String),

    /// The proxy or the billing API answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The JSON did not match any known envelope shape.
    /// `fields` lists the top-level keys seen when the value was an object.
    #[error("{}", malformed_message(.fields))]
    MalformedResponse { fields: Option<Vec<String>> },
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        FetchError::Network(msg.into())
    }

    pub fn upstream(status: u16, msg: impl Into<String>) -> Self {
        FetchError::Upstream {
            status,
            message: msg.into(),
        }
    }

    /// The single string shown next to the retry button.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn malformed_message(fields: &Option<Vec<String>>) -> String {
    match fields {
        Some(fields) => format!(
            "Invalid data format. Response structure: {}",
            serde_json::to_string(fields).unwrap_or_default()
        ),
        None => "Invalid data format received from server".to_string(),
    }
}
