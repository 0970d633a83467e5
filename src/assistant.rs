//! The training assistant: live AI completions with a canned offline path.
//!
//! The live path needs the user-supplied Perplexity key; its presence is
//! checked before any network traffic so a missing key surfaces as a
//! configuration prompt instead of a doomed call. Offline, questions are
//! answered from a small table of canned responses on the core civic topics,
//! mirroring the cached-response behavior of the web app.

use crate::credentials::{ApiKeyStore, Provider};
use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;

const COMPLETIONS_URL: &str = "https://api.perplexity.ai/chat/completions";
const API_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "Tu es l'assistant de formation du MRC. Réponds en français, \
     de façon concise et pédagogique, aux questions sur la formation civique et politique.";

/// Generic message shown when the live call fails.
pub const ASSISTANT_UNAVAILABLE: &str =
    "L'assistant est momentanément indisponible. Veuillez réessayer plus tard.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Answered by the AI completion API.
    Live,
    /// Answered from the canned offline table.
    Canned,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// Result of asking the assistant, including the cases the UI must handle
/// before showing an answer.
pub struct AskResult {
    pub answer: Option<Answer>,
    /// True when the Perplexity key is missing: show the configuration
    /// prompt instead of an error.
    pub needs_key: bool,
    pub error: Option<String>,
}

impl AskResult {
    fn answered(answer: Answer) -> Self {
        Self {
            answer: Some(answer),
            needs_key: false,
            error: None,
        }
    }
}

/// Asks the assistant a question, branching on connectivity and key
/// presence.
pub fn ask(keys: &ApiKeyStore, online: bool, question: &str) -> AskResult {
    if !online {
        return AskResult::answered(canned_answer(question));
    }

    let Some(api_key) = keys.get(Provider::Perplexity) else {
        return AskResult {
            answer: None,
            needs_key: true,
            error: None,
        };
    };

    match ask_live_inner(&api_key, question) {
        Ok(text) => AskResult::answered(Answer {
            text,
            source: AnswerSource::Live,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "assistant call failed");
            AskResult {
                answer: None,
                needs_key: false,
                error: Some(ASSISTANT_UNAVAILABLE.to_string()),
            }
        }
    }
}

fn ask_live_inner(api_key: &str, question: &str) -> Result<String> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(API_TIMEOUT))
        .build()
        .into();

    let body = json!({
        "model": "sonar",
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": question },
        ],
    })
    .to_string();

    let response: String = agent
        .post(COMPLETIONS_URL)
        .header("Authorization", &format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .send(&body)
        .context("Failed to call the completion API")?
        .body_mut()
        .read_to_string()
        .context("Failed to read completion response")?;

    let parsed: serde_json::Value =
        serde_json::from_str(&response).context("Completion API returned invalid JSON")?;
    let content = parsed["choices"][0]["message"]["content"]
        .as_str()
        .context("Missing content in completion response")?;

    Ok(content.to_string())
}

/// Canned topics served while offline: keyword list and answer.
const CANNED_TOPICS: &[(&[&str], &str)] = &[
    (
        &["adhérer", "adhésion", "membre"],
        "Pour adhérer au MRC, rendez-vous dans la rubrique Adhésion de l'application ou sur le \
         site du mouvement. L'adhésion est ouverte à toute personne partageant les valeurs \
         républicaines du mouvement.",
    ),
    (
        &["formation", "module", "cours"],
        "Les modules de formation couvrent l'histoire du mouvement, les institutions de la \
         République et l'action militante. Les modules déjà consultés restent disponibles hors \
         ligne.",
    ),
    (
        &["quiz", "question", "test"],
        "Les quiz permettent de valider vos acquis après chaque module de formation. Vos scores \
         sont enregistrés localement et synchronisés au retour de la connexion.",
    ),
    (
        &["république", "laïcité", "souveraineté"],
        "La souveraineté populaire et la laïcité sont au cœur du projet républicain défendu par \
         le MRC. Consultez le module « Valeurs de la République » pour approfondir.",
    ),
];

const CANNED_FALLBACK: &str = "Vous êtes actuellement hors ligne. Cette réponse provient du \
     contenu local : reposez votre question une fois la connexion rétablie pour une réponse \
     détaillée de l'assistant.";

/// Picks the canned answer whose keywords match the question.
pub fn canned_answer(question: &str) -> Answer {
    let lowered = question.to_lowercase();
    let text = CANNED_TOPICS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, answer)| (*answer).to_string())
        .unwrap_or_else(|| CANNED_FALLBACK.to_string());

    Answer {
        text,
        source: AnswerSource::Canned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_offline_serves_canned_answer() {
        let temp = TempDir::new().unwrap();
        let keys = ApiKeyStore::open_at(&temp.path().join("api_keys.json"));

        let result = ask(&keys, false, "Comment adhérer au mouvement ?");
        let answer = result.answer.unwrap();
        assert_eq!(answer.source, AnswerSource::Canned);
        assert!(answer.text.contains("adhérer"));
        assert!(!result.needs_key);
    }

    #[test]
    fn test_online_without_key_prompts_for_configuration() {
        let temp = TempDir::new().unwrap();
        let keys = ApiKeyStore::open_at(&temp.path().join("api_keys.json"));

        let result = ask(&keys, true, "Qu'est-ce que la laïcité ?");
        assert!(result.answer.is_none());
        assert!(result.needs_key);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_canned_fallback_for_unknown_topic() {
        let answer = canned_answer("Quelle est la météo demain ?");
        assert_eq!(answer.source, AnswerSource::Canned);
        assert!(answer.text.contains("hors ligne"));
    }

    #[test]
    fn test_canned_keyword_matching_is_case_insensitive() {
        let answer = canned_answer("Parle-moi des MODULEs de FORMATION");
        assert!(answer.text.contains("modules de formation"));
    }
}
