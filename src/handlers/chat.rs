// src/handlers/chat.rs
//
// A face HTTP do controlador de diálogo. Reconstrói a sessão de chat a
// partir da transcrição ecoada pelo cliente, roda um turno em duas
// camadas (roteiro primeiro, modelo depois) e resolve intenções de
// agendamento contra os stores.

use axum::{Json, extract::State, response::IntoResponse};
use uuid::Uuid;

use crate::{
    chatbot::engine::{ChatSession, UserInput},
    chatbot::scenario::INITIAL_GREETING,
    common::error::AppError,
    config::AppState,
    handlers::bookings::BOOKING_CONFIRMED_MESSAGE,
    middleware::visitor::MaybeVisitor,
    models::{
        booking::DEFAULT_SERVICE,
        chat::{BotMessage, ChatAction, ChatRequest, ChatResponse, MessageKind},
        lead::UtmParams,
    },
    services::lead_service::DEFAULT_PRIVACY_VERSION,
};

// Placeholders para quando o roteiro terminou sem uma das respostas.
const FALLBACK_LEAD_NAME: &str = "Unknown";
const FALLBACK_LEAD_PHONE: &str = "000-0000-0000";

// POST /api/chat
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses((status = 200, description = "Bot messages for this turn", body = ChatResponse))
)]
pub async fn chat_turn(
    State(app_state): State<AppState>,
    MaybeVisitor(visitor_id): MaybeVisitor,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Primeira chamada do widget: sem turno ainda, só a saudação.
    if !request.image_uploaded
        && request.option.is_none()
        && request.message.trim().is_empty()
        && request.history.is_empty()
    {
        let greeting = BotMessage {
            step: None,
            text: INITIAL_GREETING.to_string(),
            kind: MessageKind::Text,
            options: Vec::new(),
            delay_ms: None,
        };
        return Ok(Json(ChatResponse {
            text: greeting.text.clone(),
            action: None,
            messages: vec![greeting],
            lead_data: request.lead_data,
        }));
    }

    let registered = match visitor_id {
        Some(id) => app_state.lead_service.is_registered(id).await?,
        None => false,
    };

    let input = if request.image_uploaded {
        UserInput::ImageUploaded
    } else if let Some(option) = request.option {
        UserInput::QuickReply(option)
    } else {
        UserInput::Text(request.message)
    };

    let mut session = ChatSession::new(request.history, request.lead_data, registered);
    let mut reply = session.handle(input, app_state.ai.as_ref()).await;

    // O roteiro chegou ao terminal de captura: persiste o que coletou.
    if reply.lead_completed {
        if let Some(visitor_id) = visitor_id {
            submit_scripted_lead(&app_state, visitor_id, session.lead_data()).await;
        } else {
            tracing::warn!("chat lead completed without a visitor cookie; nothing persisted");
        }
    }

    // Uma intenção de agendamento se resolve contra o store de leads:
    // visitante registrado agenda direto, os demais vão primeiro para o
    // formulário de registro.
    if reply.action == Some(ChatAction::OpenConsultation) {
        reply.action = match visitor_id {
            Some(visitor_id) => {
                match app_state.booking_service.create(visitor_id, DEFAULT_SERVICE).await {
                    Ok(_) => {
                        reply.messages.push(confirmation_message());
                        Some(ChatAction::BookingConfirmed)
                    }
                    Err(AppError::RegistrationRequired) => Some(ChatAction::OpenRegistration),
                    Err(e) => return Err(e),
                }
            }
            None => Some(ChatAction::OpenRegistration),
        };
    }

    let text = reply.messages.first().map(|m| m.text.clone()).unwrap_or_default();

    Ok(Json(ChatResponse {
        text,
        action: reply.action,
        messages: reply.messages,
        lead_data: session.into_lead_data(),
    }))
}

fn confirmation_message() -> BotMessage {
    BotMessage {
        step: None,
        text: BOOKING_CONFIRMED_MESSAGE.to_string(),
        kind: MessageKind::Text,
        options: Vec::new(),
        delay_ms: None,
    }
}

// Best effort: uma submissão que falha é logada e a conversa segue.
async fn submit_scripted_lead(
    app_state: &AppState,
    visitor_id: Uuid,
    lead_data: &std::collections::HashMap<String, String>,
) {
    let name = lead_data.get("name").map(String::as_str).unwrap_or(FALLBACK_LEAD_NAME);
    let phone = lead_data.get("phone").map(String::as_str).unwrap_or(FALLBACK_LEAD_PHONE);

    let result = app_state
        .lead_service
        .upsert(visitor_id, name, phone, true, DEFAULT_PRIVACY_VERSION, &UtmParams::default())
        .await;

    match result {
        Ok(lead) => tracing::info!(%visitor_id, lead_id = %lead.id, "chat lead submitted"),
        Err(e) => tracing::error!("failed to submit chat lead: {e:?}"),
    }
}
