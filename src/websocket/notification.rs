use crate::error::AppError;
use crate::utils::jwt::{decode_jwt, TokenType};
use crate::websocket::hub::NotificationHub;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    Extension(hub): Extension<NotificationHub>,
) -> Result<impl IntoResponse, AppError> {
    let claims = decode_jwt(&query.token).map_err(|_| AppError::Unauthorized)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }
    let member_id = claims.member_id().ok_or(AppError::Unauthorized)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, member_id, hub)))
}

async fn handle_socket(socket: WebSocket, member_id: i32, hub: NotificationHub) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (conn_id, mut rx) = hub.subscribe(member_id);

    tracing::info!(member_id, conn_id, "WebSocket connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unsubscribe(member_id, conn_id);
    tracing::info!(member_id, conn_id, "WebSocket disconnected");
}
