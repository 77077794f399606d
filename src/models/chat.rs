use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Bot,
    User,
}

// Uma entrada da transcrição, ecoada de volta pelo cliente. Turnos de bot
// vindos do roteiro carregam o id do passo que os renderizou; é assim que
// o servidor stateless recupera a posição do diálogo.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into(), step: None }
    }

    pub fn bot(text: impl Into<String>, step: Option<String>) -> Self {
        Self { role: ChatRole::Bot, text: text.into(), step }
    }
}

// Diretivas de UI tipadas entre a janela de chat e os modais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    OpenConsultation,
    OpenVision,
    OpenRegistration,
    BookingConfirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Options,
    Input,
    ImageUpload,
    Analyzing,
}

// Um balão de bot renderizado. `delay_ms` diz ao cliente quanto segurar o
// balão anterior antes de mostrar este (o servidor nunca dorme).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BotMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub text: String,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChatOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    // Respostas acumuladas da captura de lead, ecoadas pelo cliente entre
    // turnos para os handlers ficarem stateless.
    #[serde(default)]
    pub lead_data: HashMap<String, String>,
    // Presente quando o usuário clicou num quick-reply em vez de digitar.
    #[serde(default)]
    pub option: Option<ChatOption>,
    // Marcado quando o turno é uma foto chegando. A imagem em si nunca
    // chega ao servidor; a "análise" é um placeholder roteirizado.
    #[serde(default)]
    pub image_uploaded: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ChatAction>,
    pub messages: Vec<BotMessage>,
    pub lead_data: HashMap<String, String>,
}

// O que o fallback generativo produziu para um turno.
#[derive(Debug, Clone)]
pub struct AiReply {
    pub text: String,
    pub action: Option<ChatAction>,
}
