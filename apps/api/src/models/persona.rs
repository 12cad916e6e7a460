use serde::{Deserialize, Serialize};

/// The single user persona. Overwritten wholesale on save; no history.
///
/// Wire field names are camelCase to stay byte-compatible with records the
/// browser client already stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub website: String,
    pub github: String,
    /// Free-text background blob: experience, projects, education.
    pub extra_info: String,
}

impl Persona {
    /// A persona is usable for generation once name and email are set.
    /// Enforced by the upload handler before any network exchange.
    pub fn is_ready_for_generation(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona_is_not_ready() {
        assert!(!Persona::default().is_ready_for_generation());
    }

    #[test]
    fn test_persona_with_name_and_email_is_ready() {
        let persona = Persona {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        };
        assert!(persona.is_ready_for_generation());
    }

    #[test]
    fn test_persona_with_blank_email_is_not_ready() {
        let persona = Persona {
            name: "Ada".to_string(),
            email: "   ".to_string(),
            ..Default::default()
        };
        assert!(!persona.is_ready_for_generation());
    }

    #[test]
    fn test_persona_serde_uses_camel_case() {
        let persona = Persona {
            extra_info: "background".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&persona).unwrap();
        assert_eq!(json["extraInfo"], "background");
        assert!(json.get("extra_info").is_none());
    }
}
