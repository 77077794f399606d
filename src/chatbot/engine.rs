//! O controlador de diálogo. Dono da transcrição de uma conversa e das
//! respostas acumuladas da captura de lead; despacha cada turno do
//! usuário em duas camadas: primeiro o roteiro determinístico, depois o
//! fallback generativo. Nunca o inverso, para a captura de lead não
//! ficar nas mãos do modelo.
//!
//! Os handlers são stateless: a sessão é reconstruída a cada request a
//! partir da transcrição ecoada pelo cliente e descartada após o turno.

use std::collections::HashMap;

use crate::chatbot::scenario::{
    self, ANALYZING_DELAY_MS, DEFAULT_NAME, ScenarioNode, VALUE_CONSULT_FORM,
    VALUE_START_CONSULTATION, step,
};
use crate::models::chat::{
    BotMessage, ChatAction, ChatOption, ChatTurn, MessageKind,
};
use crate::services::chat_service::AiResponder;

// Limite de nós renderizados por turno; as cadeias de auto-avanço são
// curtas e acíclicas, algo maior é erro de roteiro.
const MAX_ADVANCE_STEPS: usize = 8;

// Rótulo do quick-reply que o caminho de IA anexa quando o modelo pede
// o formulário de consulta.
const QUICK_BOOKING_LABEL: &str = "📝 빠른 상담 신청하기";

// Falas fixas da transcrição: o turno do usuário registrado ao enviar
// uma foto, e o aviso postado depois de abrir o formulário de consulta.
const UPLOAD_USER_TEXT: &str = "📸 사진을 보낼게요! 진단 부탁드려요.";
const CONSULT_FORM_OPENED_TEXT: &str = "상담 신청서를 열어드렸어요! 예쁘게 작성해주세요~ 😘";

#[derive(Debug)]
pub enum UserInput {
    Text(String),
    QuickReply(ChatOption),
    ImageUploaded,
}

#[derive(Debug, Default)]
pub struct TurnReply {
    pub messages: Vec<BotMessage>,
    pub action: Option<ChatAction>,
    // Verdadeiro quando o roteiro chegou ao terminal de captura de lead;
    // a camada HTTP persiste as respostas acumuladas nesse momento.
    pub lead_completed: bool,
}

pub struct ChatSession {
    transcript: Vec<ChatTurn>,
    lead_data: HashMap<String, String>,
    registered: bool,
}

impl ChatSession {
    pub fn new(
        history: Vec<ChatTurn>,
        lead_data: HashMap<String, String>,
        registered: bool,
    ) -> Self {
        Self { transcript: history, lead_data, registered }
    }

    pub fn lead_data(&self) -> &HashMap<String, String> {
        &self.lead_data
    }

    pub fn into_lead_data(self) -> HashMap<String, String> {
        self.lead_data
    }

    fn display_name(&self) -> String {
        self.lead_data.get("name").cloned().unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    // A posição do diálogo: o turno de bot mais recente que foi
    // renderizado a partir de um passo do roteiro.
    fn last_scripted_node(&self) -> Option<&'static ScenarioNode> {
        self.transcript
            .iter()
            .rev()
            .find_map(|turn| turn.step.as_deref())
            .and_then(scenario::node)
    }

    pub async fn handle(&mut self, input: UserInput, responder: &dyn AiResponder) -> TurnReply {
        let mut reply = TurnReply::default();

        match input {
            UserInput::Text(message) => {
                let capture = self
                    .last_scripted_node()
                    .filter(|node| node.kind == MessageKind::Input)
                    .and_then(|node| {
                        let next = node.options.first().and_then(|opt| opt.next_step);
                        node.capture_key.map(|key| (key, next))
                    });

                match capture {
                    Some((key, next)) => {
                        self.transcript.push(ChatTurn::user(message.clone()));
                        self.lead_data.insert(key.to_string(), message);
                        if let Some(next) = next {
                            self.advance(next, &mut reply);
                        }
                    }
                    None => {
                        self.ai_fallback(message, responder, &mut reply).await;
                    }
                }
            }
            UserInput::QuickReply(option) => {
                self.transcript.push(ChatTurn::user(option.label.clone()));

                if option.value == VALUE_START_CONSULTATION {
                    // Intenção de agendar. Um lead já registrado agenda
                    // direto (resolvido pela camada HTTP); os demais
                    // passam pela captura inline.
                    if self.registered {
                        reply.action = Some(ChatAction::OpenConsultation);
                    } else {
                        self.advance(step::LEAD_NAME, &mut reply);
                    }
                } else if option.value == VALUE_CONSULT_FORM {
                    // O formulário abre e o bot ainda avisa; a
                    // transcrição não fica muda.
                    self.push_plain(CONSULT_FORM_OPENED_TEXT.to_string(), &mut reply);
                    reply.action = Some(ChatAction::OpenConsultation);
                } else if let Some(next) = option.next_step.clone() {
                    self.advance(&next, &mut reply);
                } else {
                    // Quick-reply sem transição declarada cai para o
                    // modelo, com o rótulo como fala.
                    self.transcript.pop();
                    self.ai_fallback(option.label, responder, &mut reply).await;
                }
            }
            UserInput::ImageUploaded => {
                // O botão de upload está sempre disponível, não só no
                // prompt de visão; uma foto chegando em qualquer ponto
                // ainda roda a cadeia de análise.
                self.transcript.push(ChatTurn::user(UPLOAD_USER_TEXT));
                let next = self
                    .last_scripted_node()
                    .filter(|node| node.kind == MessageKind::ImageUpload)
                    .and_then(|node| node.next_step)
                    .unwrap_or(step::VISION_ANALYZING);
                self.advance(next, &mut reply);
            }
        }

        reply
    }

    // Renderiza `start` e segue as arestas de auto-avanço até um nó que
    // espera o usuário. O tempo de espera do placeholder de "análise"
    // vira `delay_ms` no sucessor; o servidor nunca dorme.
    fn advance(&mut self, start: &str, reply: &mut TurnReply) {
        let name = self.display_name();
        let mut step_id = start.to_string();
        let mut pending_delay: Option<u64> = None;

        for _ in 0..MAX_ADVANCE_STEPS {
            let Some(node) = scenario::node(&step_id) else {
                tracing::warn!("scenario references unknown step '{step_id}'");
                return;
            };

            let mut message = node.render(&name);
            message.delay_ms = pending_delay.take();
            self.transcript.push(ChatTurn::bot(message.text.clone(), Some(node.id.to_string())));
            reply.messages.push(message);

            if node.id == step::LEAD_FINAL {
                reply.lead_completed = true;
            }
            if node.id == step::CONSULTATION_FORM_TRIGGER {
                reply.action = Some(ChatAction::OpenConsultation);
            }

            match (node.kind, node.next_step) {
                (MessageKind::Analyzing, Some(next)) => {
                    pending_delay = Some(ANALYZING_DELAY_MS);
                    step_id = next.to_string();
                }
                _ => return,
            }
        }

        tracing::warn!("auto-advance exceeded {MAX_ADVANCE_STEPS} steps from '{start}'");
    }

    async fn ai_fallback(
        &mut self,
        message: String,
        responder: &dyn AiResponder,
        reply: &mut TurnReply,
    ) {
        // O snapshot do histórico exclui o turno sendo respondido; o
        // adaptador descarta sozinho os turnos iniciais do bot.
        let history = self.transcript.clone();
        self.transcript.push(ChatTurn::user(message.clone()));

        let ai = responder.respond(&message, &history).await;

        match ai.action {
            Some(ChatAction::OpenVision) => {
                self.push_plain(ai.text, reply);
                self.advance(step::VISION_START, reply);
            }
            Some(ChatAction::OpenConsultation) => {
                let bot = BotMessage {
                    step: None,
                    text: ai.text,
                    kind: MessageKind::Options,
                    options: vec![ChatOption {
                        label: QUICK_BOOKING_LABEL.to_string(),
                        value: VALUE_START_CONSULTATION.to_string(),
                        next_step: None,
                    }],
                    delay_ms: None,
                };
                self.transcript.push(ChatTurn::bot(bot.text.clone(), None));
                reply.messages.push(bot);
                reply.action = Some(ChatAction::OpenConsultation);
            }
            _ => self.push_plain(ai.text, reply),
        }
    }

    fn push_plain(&mut self, text: String, reply: &mut TurnReply) {
        self.transcript.push(ChatTurn::bot(text.clone(), None));
        reply.messages.push(BotMessage {
            step: None,
            text,
            kind: MessageKind::Text,
            options: Vec::new(),
            delay_ms: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::AiReply;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Responder fixo; registra o histórico que recebeu.
    struct MockResponder {
        reply: AiReply,
        seen_history: Mutex<Vec<ChatTurn>>,
    }

    impl MockResponder {
        fn text(text: &str) -> Self {
            Self {
                reply: AiReply { text: text.to_string(), action: None },
                seen_history: Mutex::new(Vec::new()),
            }
        }

        fn with_action(text: &str, action: ChatAction) -> Self {
            Self {
                reply: AiReply { text: text.to_string(), action: Some(action) },
                seen_history: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AiResponder for MockResponder {
        async fn respond(&self, _message: &str, history: &[ChatTurn]) -> AiReply {
            *self.seen_history.lock().unwrap() = history.to_vec();
            self.reply.clone()
        }
    }

    fn bot_step(step: &str) -> ChatTurn {
        ChatTurn::bot(format!("({step})"), Some(step.to_string()))
    }

    fn quick_reply(label: &str, value: &str, next: Option<&str>) -> UserInput {
        UserInput::QuickReply(ChatOption {
            label: label.to_string(),
            value: value.to_string(),
            next_step: next.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn quick_reply_with_next_step_advances_the_script() {
        let mut session = ChatSession::new(vec![bot_step(step::ANGTAL_1)], HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session
            .handle(quick_reply("그래, 뭔데?", "listen", Some(step::QUOTE_START)), &responder)
            .await;

        assert_eq!(reply.messages.len(), 1);
        assert_eq!(reply.messages[0].step.as_deref(), Some(step::QUOTE_START));
        assert_eq!(reply.messages[0].options.len(), 4);
        assert!(reply.action.is_none());
        // O responder não pode ter sido consultado num turno roteirizado.
        assert!(responder.seen_history.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn input_node_captures_answer_under_declared_key() {
        let mut session = ChatSession::new(vec![bot_step(step::LEAD_NAME)], HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session.handle(UserInput::Text("김하루".to_string()), &responder).await;

        assert_eq!(session.lead_data().get("name").map(String::as_str), Some("김하루"));
        assert_eq!(reply.messages[0].step.as_deref(), Some(step::LEAD_PHONE));
        // O prompt seguinte interpola o nome capturado.
        assert!(reply.messages[0].text.starts_with("김하루 님!"));
    }

    #[tokio::test]
    async fn free_text_without_script_context_goes_to_the_model() {
        let history = vec![bot_step(step::ROOT), ChatTurn::user("질문"), bot_step(step::ROOT)];
        let mut session = ChatSession::new(history, HashMap::new(), false);
        let responder = MockResponder::text("어디가 불편하세요?");

        let reply = session.handle(UserInput::Text("이가 아파요".to_string()), &responder).await;

        assert_eq!(reply.messages.len(), 1);
        assert_eq!(reply.messages[0].text, "어디가 불편하세요?");
        assert!(reply.messages[0].step.is_none());
        // O turno sendo respondido não faz parte do histórico enviado.
        assert_eq!(responder.seen_history.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn start_consultation_opens_inline_capture_when_unregistered() {
        let mut session =
            ChatSession::new(vec![bot_step(step::VISION_RESULT_MENT)], HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session
            .handle(quick_reply("상담 받아볼래", VALUE_START_CONSULTATION, None), &responder)
            .await;

        assert!(reply.action.is_none());
        assert_eq!(reply.messages[0].step.as_deref(), Some(step::LEAD_NAME));
        assert_eq!(reply.messages[0].kind, MessageKind::Input);
    }

    #[tokio::test]
    async fn start_consultation_books_directly_when_registered() {
        let mut session =
            ChatSession::new(vec![bot_step(step::VISION_RESULT_MENT)], HashMap::new(), true);
        let responder = MockResponder::text("unused");

        let reply = session
            .handle(quick_reply("상담 받아볼래", VALUE_START_CONSULTATION, None), &responder)
            .await;

        assert_eq!(reply.action, Some(ChatAction::OpenConsultation));
        assert!(reply.messages.is_empty());
    }

    #[tokio::test]
    async fn image_upload_runs_the_analyzing_chain_with_delay() {
        let mut session = ChatSession::new(vec![bot_step(step::VISION_START)], HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session.handle(UserInput::ImageUploaded, &responder).await;

        assert_eq!(reply.messages.len(), 2);
        assert_eq!(reply.messages[0].step.as_deref(), Some(step::VISION_ANALYZING));
        assert_eq!(reply.messages[0].delay_ms, None);
        assert_eq!(reply.messages[1].step.as_deref(), Some(step::VISION_RESULT_MENT));
        assert_eq!(reply.messages[1].delay_ms, Some(ANALYZING_DELAY_MS));
    }

    #[tokio::test]
    async fn out_of_context_upload_still_runs_the_analyzing_chain() {
        // O último nó roteirizado é texto simples, não o prompt de visão.
        let mut session = ChatSession::new(vec![bot_step(step::ROOT)], HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session.handle(UserInput::ImageUploaded, &responder).await;

        assert_eq!(reply.messages.len(), 2);
        assert_eq!(reply.messages[0].step.as_deref(), Some(step::VISION_ANALYZING));
        assert_eq!(reply.messages[1].step.as_deref(), Some(step::VISION_RESULT_MENT));
        assert_eq!(reply.messages[1].delay_ms, Some(ANALYZING_DELAY_MS));
    }

    #[tokio::test]
    async fn upload_with_empty_transcript_never_yields_a_blank_turn() {
        let mut session = ChatSession::new(Vec::new(), HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session.handle(UserInput::ImageUploaded, &responder).await;

        assert!(!reply.messages.is_empty());
        assert!(!reply.messages[0].text.is_empty());
    }

    #[tokio::test]
    async fn consult_form_reply_opens_the_form_and_says_so() {
        let mut session = ChatSession::new(vec![bot_step(step::ROOT)], HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session
            .handle(quick_reply("상담 신청서 열기", VALUE_CONSULT_FORM, None), &responder)
            .await;

        assert_eq!(reply.action, Some(ChatAction::OpenConsultation));
        assert_eq!(reply.messages.len(), 1);
        assert_eq!(reply.messages[0].text, CONSULT_FORM_OPENED_TEXT);
    }

    #[tokio::test]
    async fn reaching_lead_final_reports_completion() {
        let mut session = ChatSession::new(
            vec![bot_step(step::LEAD_TIME)],
            HashMap::from([
                ("name".to_string(), "김하루".to_string()),
                ("phone".to_string(), "010-1111-2222".to_string()),
            ]),
            false,
        );
        let responder = MockResponder::text("unused");

        let reply = session
            .handle(quick_reply("오전 (9~12시)", "morning", Some(step::LEAD_FINAL)), &responder)
            .await;

        assert!(reply.lead_completed);
        assert_eq!(reply.messages[0].step.as_deref(), Some(step::LEAD_FINAL));
    }

    #[tokio::test]
    async fn model_consultation_action_attaches_quick_booking_option() {
        let mut session = ChatSession::new(vec![bot_step(step::ROOT)], HashMap::new(), false);
        let responder =
            MockResponder::with_action("상담 받아보시겠어요?", ChatAction::OpenConsultation);

        let reply = session.handle(UserInput::Text("비용이 궁금해요".to_string()), &responder).await;

        assert_eq!(reply.action, Some(ChatAction::OpenConsultation));
        assert_eq!(reply.messages[0].options[0].value, VALUE_START_CONSULTATION);
    }

    #[tokio::test]
    async fn model_vision_action_enters_the_vision_flow() {
        let mut session = ChatSession::new(vec![bot_step(step::ROOT)], HashMap::new(), false);
        let responder = MockResponder::with_action("사진 보여주세요", ChatAction::OpenVision);

        let reply = session.handle(UserInput::Text("사진 진단 돼요?".to_string()), &responder).await;

        assert_eq!(reply.messages.len(), 2);
        assert_eq!(reply.messages[1].step.as_deref(), Some(step::VISION_START));
        assert_eq!(reply.messages[1].kind, MessageKind::ImageUpload);
    }

    #[tokio::test]
    async fn consultation_form_trigger_is_a_booking_intent() {
        let mut session = ChatSession::new(Vec::new(), HashMap::new(), false);
        let responder = MockResponder::text("unused");

        let reply = session
            .handle(
                quick_reply("상담 신청", "go", Some(step::CONSULTATION_FORM_TRIGGER)),
                &responder,
            )
            .await;

        assert_eq!(reply.action, Some(ChatAction::OpenConsultation));
        assert_eq!(reply.messages.len(), 1);
    }
}
