//! Deterministic instruction for the upstream model.

use knobel_core::ChoiceSet;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Demands a flat JSON object with one integer score per supplied choice id
/// and a single-sentence justification, nothing else.
pub fn build_messages(question: &str, choices: &ChoiceSet) -> Vec<ChatMessage> {
    let ids = choices.ids().join(", ");
    let system = format!(
        "Eres un asistente que responde SOLO con JSON plano. No uses Markdown ni texto adicional. \
         Devuelve exactamente {{\"scores\":[{{\"id\":\"<id>\",\"score\":<entero 0-100>}}, ...],\
         \"reason\":\"<una sola frase>\"}} con una entrada por cada uno de estos ids: {ids}. \
         Usa los ids tal cual. Los scores deben ser enteros entre 0 y 100. \
         La reason debe ser una única frase de como máximo 300 caracteres. No añadas comentarios."
    );

    let choice_lines: Vec<String> = choices
        .choices()
        .iter()
        .map(|c| format!("- {}: {}", c.id, c.label))
        .collect();
    let user = format!(
        "Pregunta: {question}\nOpciones:\n{}\nDevuelve el JSON con scores y reason.",
        choice_lines.join("\n")
    );

    vec![
        ChatMessage {
            role: "system",
            content: system,
        },
        ChatMessage {
            role: "user",
            content: user,
        },
    ]
}
