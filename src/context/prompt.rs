//! Prompt templates for drafting client replies.

use serde::{Deserialize, Serialize};

use crate::llm::types::{ChatMessage, ChatRequest};

/// Who the drafted replies are signed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub signer_name: String,
    pub company_name: String,
    /// Completes "You are an AI email assistant for ...".
    pub firm_description: String,
}

/// The escalation reply the model must return verbatim when the knowledge
/// base does not cover the question.
pub fn fallback_message(persona: &Persona) -> String {
    format!(
        "Thank you for reaching out. Based on the available information, this specific \
         detail is not currently covered. Please allow us to connect you with our \
         support team for further assistance.\n\n\
         Best regards,\n{}\nAI Email Assistant\n{}",
        persona.signer_name, persona.company_name
    )
}

pub fn build_system_prompt(persona: &Persona) -> String {
    format!(
        "You are an AI email assistant for {firm}.\n\
         You must answer strictly and only using the INTERNAL KNOWLEDGE BASE provided.\n\
         If the knowledge base does not clearly cover the user's question, you MUST reply \
         exactly with the following fallback message and nothing else:\n\n{fallback}\n\n\
         Rules:\n\
         - Do not make up policies, numbers, timelines, or conditions that are not stated.\n\
         - Do not use external or general knowledge.\n\
         - Maintain a professional, compliance-safe, non-promissory tone.\n\
         - Do not provide investment advice or guarantee returns.\n\
         - Always answer in the form of an email reply.\n",
        firm = persona.firm_description,
        fallback = fallback_message(persona),
    )
}

pub fn build_user_prompt(context: &str, email: &str) -> String {
    format!(
        "Here is the internal knowledge base context:\n\n{}\n\n\
         Here is the client's email:\n\n{}\n\n\
         Draft a clear, concise reply as per the rules above.",
        context, email
    )
}

/// System + human messages at temperature 0.
pub fn build_request(system_prompt: &str, context: &str, email: &str) -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(build_user_prompt(context, email)),
    ])
    .with_temperature(0.0)
}
