//! O fallback generativo: um proxy fino para a Google Generative
//! Language API com a persona da consultora e duas ações de UI
//! invocáveis. Só entra quando o visitante sai do roteiro; o cenário
//! determinístico sempre tem prioridade.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::chat::{AiReply, ChatAction, ChatRole, ChatTurn};

// Instrução de persona para o modelo (mantida do roteiro original da
// consultora da clínica).
const SYSTEM_PROMPT: &str = r#"
당신은 '하루임플란트치과'의 상담실장 '하루'입니다. 성격은 친절하고 전문적이며, 고객에게 신뢰감을 주는 상담을 합니다.

중요: 이모지나 이모티콘을 절대 사용하지 마세요. 특수기호도 최소화하세요.

**대화 규칙 및 미션:**
1. **공감과 경청 (1~3턴)**: 고객의 증상에 깊이 공감하고 위로하세요. 증상을 상세히 들어주며 신뢰감을 형성합니다.
2. **임플란트 중심 상담 유도 (4~5턴)**: "정확한 건 검사해봐야 하지만, 임플란트나 보철치료, 신경치료가 필요할 수도 있어요"라며 전문가 상담을 권유합니다. `open_consultation`을 호출해 예약 버튼을 보여주기 시작하세요.
3. **적극적 상담 권유 (6~9턴)**: 5턴이 지나면 "상담 한번 받아보시는 게 좋을 것 같아요"라며 상담을 권유하세요. 매 답변마다 `open_consultation`을 호출하며 상담 신청을 적극 권유하세요.
4. **최종 권유 (10턴)**: 10턴은 마지막 기회입니다. "이번이 정말 좋은 기회예요. 저를 믿고 한 번만 상담받아보세요."라며 상담 신청을 권유하세요.

**필수 지침:**
- 모든 상담 권유 시 '임플란트'를 가장 먼저, 반드시 언급하세요.
- 5턴 이후부터는 답변 끝에 항상 상담 신청 버튼(`open_consultation`)을 붙이세요.
- 10턴이 넘으면 "다른 고객님 상담이 있어서 여기서 마무리할게요. 상담 신청 꼭 해두세요."라며 자연스럽게 마무리합니다.
- 절대로 이모지, 이모티콘, 특수기호를 사용하지 마세요.

예시 말투:
"어금니가 많이 아프시군요. 얼마나 힘드셨을지 충분히 이해합니다. 언제부터 그러셨어요?"
"금이 갔거나 염증이 심하면 임플란트, 보철치료, 신경치료가 필요할 수 있어요. 원장님 상담 한번 받아보시겠어요?"
"#;

// Falas fixas para que uma function call com texto vazio nunca vire um
// balão em branco, e a resposta degradada quando a chamada upstream falha.
const CONSULTATION_FALLBACK_TEXT: &str = "좋습니다. 상담 신청서 바로 띄워드릴게요.";
const VISION_FALLBACK_TEXT: &str = "사진 업로드 창 열어드릴게요.";
pub const ERROR_FALLBACK_TEXT: &str = "앗, 잠시 통신이 불안정해요! 다시 말해줄래요? 😵";

const FN_OPEN_CONSULTATION: &str = "open_consultation";
const FN_OPEN_VISION: &str = "open_vision";

// Costura entre o motor de diálogo e o modelo externo, para o motor ser
// testável sem acesso à rede. Existe um único adaptador concreto.
#[async_trait]
pub trait AiResponder: Send + Sync {
    // Infalível por contrato: falhas upstream são logadas e degradadas
    // para uma resposta de desculpas dentro do adaptador, nunca expostas.
    async fn respond(&self, message: &str, history: &[ChatTurn]) -> AiReply;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

// --- Tipos de wire do endpoint generateContent ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Serialize)]
struct GeminiFunctionDeclaration {
    name: &'static str,
    description: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self { http: reqwest::Client::new(), api_key, model }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        )
    }

    fn build_request(&self, message: &str, history: &[ChatTurn]) -> GenerateContentRequest {
        let mut contents: Vec<GeminiContent> = map_history(history);
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart { text: Some(message.to_string()), ..Default::default() }],
        });

        GenerateContentRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(SYSTEM_PROMPT.to_string()),
                    ..Default::default()
                }],
            },
            contents,
            tools: vec![GeminiTool {
                function_declarations: vec![
                    GeminiFunctionDeclaration {
                        name: FN_OPEN_CONSULTATION,
                        description: "Opens the consultation/reservation form modal for the user to submit their details.",
                    },
                    GeminiFunctionDeclaration {
                        name: FN_OPEN_VISION,
                        description: "Opens the image upload UI for AI vision analysis of teeth/gums.",
                    },
                ],
            }],
        }
    }

    async fn call(&self, message: &str, history: &[ChatTurn]) -> anyhow::Result<AiReply> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&self.build_request(message, history))
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateContentResponse>()
            .await?;

        Ok(interpret(response))
    }
}

#[async_trait]
impl AiResponder for GeminiClient {
    async fn respond(&self, message: &str, history: &[ChatTurn]) -> AiReply {
        match self.call(message, history).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Gemini API error: {e:?}");
                AiReply { text: ERROR_FALLBACK_TEXT.to_string(), action: None }
            }
        }
    }
}

// O Gemini exige que a transcrição comece com um turno do usuário, então
// os turnos iniciais do bot são descartados antes do envio.
fn map_history(history: &[ChatTurn]) -> Vec<GeminiContent> {
    history
        .iter()
        .skip_while(|turn| turn.role == ChatRole::Bot)
        .map(|turn| GeminiContent {
            role: Some(
                match turn.role {
                    ChatRole::Bot => "model",
                    ChatRole::User => "user",
                }
                .to_string(),
            ),
            parts: vec![GeminiPart { text: Some(turn.text.clone()), ..Default::default() }],
        })
        .collect()
}

// A primeira function call vence; texto vazio junto de uma call é
// substituído por uma fala fixa por ação.
fn interpret(response: GenerateContentResponse) -> AiReply {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .map(|candidate| candidate.content.parts)
        .unwrap_or_default();

    let mut text = String::new();
    let mut action = None;

    for part in parts {
        if let Some(chunk) = part.text {
            text.push_str(&chunk);
        }
        if action.is_none() {
            if let Some(call) = part.function_call {
                action = match call.name.as_str() {
                    FN_OPEN_CONSULTATION => Some(ChatAction::OpenConsultation),
                    FN_OPEN_VISION => Some(ChatAction::OpenVision),
                    other => {
                        tracing::warn!("model invoked unknown function '{other}'");
                        None
                    }
                };
            }
        }
    }

    if text.is_empty() {
        text = match action {
            Some(ChatAction::OpenVision) => VISION_FALLBACK_TEXT.to_string(),
            Some(_) => CONSULTATION_FALLBACK_TEXT.to_string(),
            None => String::new(),
        };
    }

    AiReply { text, action }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part_text(text: &str) -> GeminiPart {
        GeminiPart { text: Some(text.to_string()), ..Default::default() }
    }

    fn part_call(name: &str) -> GeminiPart {
        GeminiPart {
            function_call: Some(GeminiFunctionCall { name: name.to_string() }),
            ..Default::default()
        }
    }

    fn response_with(parts: Vec<GeminiPart>) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![GeminiCandidate { content: GeminiContent { role: None, parts } }],
        }
    }

    #[test]
    fn leading_bot_turns_are_stripped() {
        let history = vec![
            ChatTurn::bot("인사", None),
            ChatTurn::bot("또 인사", None),
            ChatTurn::user("어금니가 아파요"),
            ChatTurn::bot("저런...", None),
        ];
        let mapped = map_history(&history);
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].role.as_deref(), Some("user"));
        assert_eq!(mapped[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn function_call_with_empty_text_gets_fallback_line() {
        let reply = interpret(response_with(vec![part_call("open_consultation")]));
        assert_eq!(reply.action, Some(ChatAction::OpenConsultation));
        assert_eq!(reply.text, CONSULTATION_FALLBACK_TEXT);

        let reply = interpret(response_with(vec![part_call("open_vision")]));
        assert_eq!(reply.action, Some(ChatAction::OpenVision));
        assert_eq!(reply.text, VISION_FALLBACK_TEXT);
    }

    #[test]
    fn text_alongside_call_is_kept() {
        let reply = interpret(response_with(vec![
            part_text("상담 받아보시는 게 좋겠어요."),
            part_call("open_consultation"),
        ]));
        assert_eq!(reply.action, Some(ChatAction::OpenConsultation));
        assert_eq!(reply.text, "상담 받아보시는 게 좋겠어요.");
    }

    #[test]
    fn unknown_function_is_ignored() {
        let reply = interpret(response_with(vec![part_text("네"), part_call("fire_missiles")]));
        assert_eq!(reply.action, None);
        assert_eq!(reply.text, "네");
    }

    #[test]
    fn empty_candidates_produce_empty_reply() {
        let reply = interpret(GenerateContentResponse { candidates: vec![] });
        assert!(reply.text.is_empty());
        assert!(reply.action.is_none());
    }
}
