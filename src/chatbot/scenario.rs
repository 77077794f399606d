//! O lado roteirizado do widget de chat: um grafo estático e finito de
//! nós de mensagem indexados por id de passo. Um roteiro escrito à mão
//! é preferível à geração livre aqui porque conduz todo visitante até o
//! terminal de captura de lead num número limitado de turnos, de forma
//! determinística.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::chat::{BotMessage, ChatOption, MessageKind};

// Saudação enviada pelo widget antes de qualquer turno do usuário.
pub const INITIAL_GREETING: &str =
    "안녕하세요! 하루인플란트의 귀염둥이 상담실장 '하루'예요! 😘 궁금한 점이 있으시면 편하게 말씀해주세요! (예: 임플란트 가격, 아프지 않은 치과 등)";

// Nome de exibição enquanto o visitante ainda não informou o seu.
pub const DEFAULT_NAME: &str = "고객";

// Pausa que o cliente aplica antes de revelar o passo que segue um
// placeholder de "análise".
pub const ANALYZING_DELAY_MS: u64 = 2500;

pub mod step {
    pub const ROOT: &str = "root";
    pub const CONSULTATION_FORM_TRIGGER: &str = "consultation_form_trigger";
    pub const ANGTAL_1: &str = "angtal_1";
    pub const ANGTAL_2: &str = "angtal_2";
    pub const QUOTE_START: &str = "quote_start";
    pub const QUOTE_EDU: &str = "quote_edu";
    pub const QUOTE_AGE: &str = "quote_age";
    pub const QUOTE_RESULT_CHECK: &str = "quote_result_check";
    pub const ANGTAL_LEAD: &str = "angtal_lead";
    pub const LEAD_NAME: &str = "lead_name";
    pub const LEAD_PHONE: &str = "lead_phone";
    pub const LEAD_TIME: &str = "lead_time";
    pub const LEAD_FINAL: &str = "lead_final";
    pub const VISION_START: &str = "vision_start";
    pub const VISION_ANALYZING: &str = "vision_analyzing";
    pub const VISION_RESULT_MENT: &str = "vision_result_ment";
}

// Valores de quick-reply com significado especial para o motor de diálogo.
pub const VALUE_START_CONSULTATION: &str = "start_consultation";
pub const VALUE_CONSULT_FORM: &str = "consult_form";

// O texto de um nó é um literal ou uma função do nome capturado. Esta é
// a única computação dinâmica do grafo.
#[derive(Clone, Copy)]
pub enum NodeText {
    Static(&'static str),
    WithName(fn(&str) -> String),
}

#[derive(Clone, Copy)]
pub struct NodeOption {
    pub label: &'static str,
    pub value: &'static str,
    pub next_step: Option<&'static str>,
}

#[derive(Clone)]
pub struct ScenarioNode {
    pub id: &'static str,
    pub kind: MessageKind,
    pub text: NodeText,
    pub options: Vec<NodeOption>,
    // Para nós `Input`: qual campo do lead a resposta digitada preenche.
    pub capture_key: Option<&'static str>,
    // Para nós `ImageUpload` (avança quando chega uma foto) e `Analyzing`
    // (auto-avanço após ANALYZING_DELAY_MS).
    pub next_step: Option<&'static str>,
}

impl NodeText {
    pub fn render(&self, name: &str) -> String {
        match self {
            NodeText::Static(text) => (*text).to_string(),
            NodeText::WithName(template) => template(name),
        }
    }
}

impl ScenarioNode {
    fn text_node(id: &'static str, text: &'static str) -> Self {
        Self {
            id,
            kind: MessageKind::Text,
            text: NodeText::Static(text),
            options: Vec::new(),
            capture_key: None,
            next_step: None,
        }
    }

    fn options_node(id: &'static str, text: &'static str, options: Vec<NodeOption>) -> Self {
        Self {
            id,
            kind: MessageKind::Options,
            text: NodeText::Static(text),
            options,
            capture_key: None,
            next_step: None,
        }
    }

    fn input_node(
        id: &'static str,
        text: NodeText,
        capture_key: &'static str,
        next_step: &'static str,
    ) -> Self {
        Self {
            id,
            kind: MessageKind::Input,
            text,
            options: vec![NodeOption {
                label: "입력 완료",
                value: "next",
                next_step: Some(next_step),
            }],
            capture_key: Some(capture_key),
            next_step: None,
        }
    }

    pub fn render(&self, name: &str) -> BotMessage {
        BotMessage {
            step: Some(self.id.to_string()),
            text: self.text.render(name),
            kind: self.kind,
            options: self
                .options
                .iter()
                .map(|opt| ChatOption {
                    label: opt.label.to_string(),
                    value: opt.value.to_string(),
                    next_step: opt.next_step.map(str::to_string),
                })
                .collect(),
            delay_ms: None,
        }
    }
}

fn lead_phone_text(name: &str) -> String {
    format!("{name} 님! 반가워요 💕\n연락처를 남겨주시면 카카오톡으로 혜택 안내문을 슝~ 보내드릴게요!")
}

static SCENARIO: Lazy<HashMap<&'static str, ScenarioNode>> = Lazy::new(|| {
    let nodes = [
        ScenarioNode::text_node(
            step::ROOT,
            "안녕하세요! 하루인플란트의 귀염둥이 상담실장 '하루'예요! 😘\n궁금한 거 있으시면 뭐든지 물어봐 주세요! (임플란트, 비용, 진단 등)",
        ),
        // Terminal do lado do roteiro: o motor transforma este passo numa
        // intenção de agendamento que a camada HTTP resolve.
        ScenarioNode::text_node(
            step::CONSULTATION_FORM_TRIGGER,
            "상담 신청 페이지를 띄워드릴게요! 잠시만요... ✨",
        ),
        ScenarioNode::options_node(
            step::ANGTAL_1,
            "잉... 그냥 가시려구요? 🥺\n저랑 딱 1분만 이야기해요! 제가 진짜 좋은 혜택 챙겨드릴 수 있는데...",
            vec![
                NodeOption { label: "그래, 뭔데?", value: "listen", next_step: Some(step::QUOTE_START) },
                NodeOption { label: "바빠요", value: "busy", next_step: Some(step::ANGTAL_2) },
            ],
        ),
        ScenarioNode::options_node(
            step::ANGTAL_2,
            "흥! 😤 바빠도 이빨은 소중하잖아요!\n나중에 아파서 오면 비용만 더 든다구요. 지금 확인만이라도 해보세요!",
            vec![NodeOption { label: "알았어, 확인해볼게", value: "ok", next_step: Some(step::QUOTE_START) }],
        ),
        ScenarioNode::options_node(
            step::QUOTE_START,
            "잘 생각하셨어요! 👍\n혹시 현재 치아가 빠진 부위가 있으신가요?",
            vec![
                NodeOption { label: "어금니가 없어요", value: "molar", next_step: Some(step::QUOTE_AGE) },
                NodeOption { label: "앞니가 빠졌어요", value: "incisor", next_step: Some(step::QUOTE_AGE) },
                NodeOption { label: "전체적으로 안 좋아요", value: "full", next_step: Some(step::QUOTE_AGE) },
                NodeOption { label: "그냥 궁금해서요", value: "curious", next_step: Some(step::QUOTE_EDU) },
            ],
        ),
        ScenarioNode::options_node(
            step::QUOTE_EDU,
            "아하! 미리 알아보시는군요. 똑쟁이! ✨\n임플란트는 시기를 놓치면 뼈이식 비용이 추가될 수 있어요.\n\n대략적인 연령대가 어떻게 되세요?",
            vec![
                NodeOption { label: "40대 이하", value: "40-", next_step: Some(step::QUOTE_RESULT_CHECK) },
                NodeOption { label: "50~60대", value: "50-60", next_step: Some(step::QUOTE_RESULT_CHECK) },
                NodeOption { label: "70대 이상 (보험 적용?)", value: "70+", next_step: Some(step::QUOTE_RESULT_CHECK) },
            ],
        ),
        ScenarioNode::options_node(
            step::QUOTE_AGE,
            "저런... 식사하실 때 불편하셨겠어요 😢.\n환자분 연령대가 대략 어떻게 되시나요?",
            vec![
                NodeOption { label: "40대 이하", value: "40-", next_step: Some(step::QUOTE_RESULT_CHECK) },
                NodeOption { label: "50~60대", value: "50-60", next_step: Some(step::QUOTE_RESULT_CHECK) },
                NodeOption { label: "70대 이상", value: "70+", next_step: Some(step::QUOTE_RESULT_CHECK) },
            ],
        ),
        ScenarioNode::options_node(
            step::QUOTE_RESULT_CHECK,
            "확인해 주셔서 감사합니다! 💖\n\nAI 데이터 분석 결과, 환자분께 딱 맞는 '맞춤형 혜택'이 조회되었어요.\n하지만 정확한 금액은 잇몸 상태에 따라 달라서요...\n\n제가 전문 상담원 언니한테 부탁해서 **정확한 견적표**를 문자로 보내드리라고 할까요?",
            vec![
                NodeOption { label: "응, 보내줘 (무료)", value: "yes_lead", next_step: Some(step::LEAD_NAME) },
                NodeOption { label: "아니, 됐어", value: "no_lead", next_step: Some(step::ANGTAL_LEAD) },
            ],
        ),
        ScenarioNode::options_node(
            step::ANGTAL_LEAD,
            "아이참! 😩\n진짜 진짜 중요한 정보인데... 이번만 선착순 혜택 적용해 드릴 수 있단 말이에요.\n\n나중에 딴소리하기 없기예요?\n그냥 전화번호만 남겨주시면 제가 몰래 챙겨놓을게요!",
            vec![NodeOption { label: "그래, 알았어", value: "ok_lead", next_step: Some(step::LEAD_NAME) }],
        ),
        ScenarioNode::input_node(
            step::LEAD_NAME,
            NodeText::Static("헤헤, 잘하셨어요! 🥰\n성함이 어떻게 되세요?"),
            "name",
            step::LEAD_PHONE,
        ),
        ScenarioNode::input_node(
            step::LEAD_PHONE,
            NodeText::WithName(lead_phone_text),
            "phone",
            step::LEAD_TIME,
        ),
        ScenarioNode::options_node(
            step::LEAD_TIME,
            "마지막이에요! 🏃‍♀️\n혹시 통화가 편하신 시간대가 언제인가요?",
            vec![
                NodeOption { label: "오전 (9~12시)", value: "morning", next_step: Some(step::LEAD_FINAL) },
                NodeOption { label: "오후 (12~18시)", value: "afternoon", next_step: Some(step::LEAD_FINAL) },
                NodeOption { label: "상관없음/문자선호", value: "any", next_step: Some(step::LEAD_FINAL) },
            ],
        ),
        ScenarioNode::text_node(
            step::LEAD_FINAL,
            "접수 완료! 🎉\n\n제가 상담실장님한테 닥달해서 제일 좋은 혜택으로 챙겨놓으라고 했어요!\n잠시만 기다려 주시면 연락 드릴게요. 오늘 하루도 행복하세요! 👋",
        ),
        ScenarioNode {
            id: step::VISION_START,
            kind: MessageKind::ImageUpload,
            text: NodeText::Static(
                "와! 📸 사진으로 진단해 드릴까요?\n치아나 잇몸이 잘 보이게 사진을 찍어서 올려주세요.\n제가 매의 눈으로 분석해 드릴게요! (물론 정확한 건 원장님이 보셔야 해요 ㅎㅎ)",
            ),
            options: Vec::new(),
            capture_key: None,
            next_step: Some(step::VISION_ANALYZING),
        },
        ScenarioNode {
            id: step::VISION_ANALYZING,
            kind: MessageKind::Analyzing,
            text: NodeText::Static(
                "분석 중... 🧠\n(치아 상태 스캔 중...)\n(잇몸 염증 레벨 계산 중...)",
            ),
            options: Vec::new(),
            capture_key: None,
            next_step: Some(step::VISION_RESULT_MENT),
        },
        ScenarioNode::options_node(
            step::VISION_RESULT_MENT,
            "흐음... 🤔 사진으로 보니까 관리가 좀 필요해 보이는데요?\n\n방치하면 더 큰 돈 들어갈 수도 있어요 ㅠㅠ\n지금 바로 전문가 상담 받아보시는 게 어때요? (진단비 무료 혜택 드릴게요!)",
            vec![NodeOption { label: "상담 받아볼래", value: VALUE_START_CONSULTATION, next_step: None }],
        ),
    ];

    nodes.into_iter().map(|node| (node.id, node)).collect()
});

pub fn node(step_id: &str) -> Option<&'static ScenarioNode> {
    SCENARIO.get(step_id)
}

pub fn all_nodes() -> impl Iterator<Item = &'static ScenarioNode> {
    SCENARIO.values()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn referenced_steps(node: &ScenarioNode) -> Vec<&'static str> {
        let mut steps: Vec<&'static str> =
            node.options.iter().filter_map(|opt| opt.next_step).collect();
        if let Some(next) = node.next_step {
            steps.push(next);
        }
        steps
    }

    #[test]
    fn every_next_step_is_defined() {
        for scenario_node in all_nodes() {
            for target in referenced_steps(scenario_node) {
                assert!(
                    node(target).is_some(),
                    "step '{}' references undefined step '{}'",
                    scenario_node.id,
                    target
                );
            }
        }
    }

    #[test]
    fn input_nodes_declare_capture_key_and_single_option() {
        for scenario_node in all_nodes() {
            if scenario_node.kind == MessageKind::Input {
                assert!(scenario_node.capture_key.is_some(), "{}", scenario_node.id);
                assert_eq!(scenario_node.options.len(), 1, "{}", scenario_node.id);
                assert!(scenario_node.options[0].next_step.is_some(), "{}", scenario_node.id);
            }
        }
    }

    // Todo caminho pelas transições declaradas deve chegar a um nó sem
    // arestas de saída num número limitado de passos, de qualquer início.
    #[test]
    fn all_walks_terminate() {
        for start in all_nodes() {
            let mut frontier = vec![(start.id, 0usize)];
            let mut visited = HashSet::new();

            while let Some((step_id, depth)) = frontier.pop() {
                assert!(depth < 32, "walk exceeded bound at step '{step_id}'");
                if !visited.insert(step_id) {
                    continue;
                }
                let current = node(step_id).expect("walk hit undefined step");
                for target in referenced_steps(current) {
                    frontier.push((target, depth + 1));
                }
            }
        }
    }

    // Os dois funis de entrada (orçamento e retenção) devem conseguir
    // chegar ao terminal de captura de lead.
    #[test]
    fn lead_capture_is_reachable_from_the_funnels() {
        for start in [step::QUOTE_START, step::ANGTAL_1] {
            let mut frontier = vec![start];
            let mut visited = HashSet::new();
            while let Some(step_id) = frontier.pop() {
                if !visited.insert(step_id) {
                    continue;
                }
                frontier.extend(referenced_steps(node(step_id).unwrap()));
            }
            assert!(visited.contains(step::LEAD_FINAL), "no path from '{start}'");
        }
    }

    #[test]
    fn analyzing_chain_is_acyclic() {
        for scenario_node in all_nodes() {
            let mut hops = 0;
            let mut current = Some(scenario_node.id);
            while let Some(step_id) = current {
                hops += 1;
                assert!(hops < 8, "auto-advance cycle at '{}'", scenario_node.id);
                current = node(step_id)
                    .filter(|n| n.kind == MessageKind::Analyzing)
                    .and_then(|n| n.next_step);
            }
        }
    }

    #[test]
    fn name_template_interpolates() {
        let lead_phone = node(step::LEAD_PHONE).unwrap();
        let text = lead_phone.text.render("김하루");
        assert!(text.starts_with("김하루 님!"));
    }

    #[test]
    fn render_carries_step_and_options() {
        let message = node(step::QUOTE_START).unwrap().render(DEFAULT_NAME);
        assert_eq!(message.step.as_deref(), Some(step::QUOTE_START));
        assert_eq!(message.kind, MessageKind::Options);
        assert_eq!(message.options.len(), 4);
        assert_eq!(message.options[3].next_step.as_deref(), Some(step::QUOTE_EDU));
    }
}
