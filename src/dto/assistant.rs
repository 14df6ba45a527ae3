use serde::Deserialize;
use utoipa::ToSchema;

use crate::assistant::ChatTurn;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}
