//! Stock assistant: primes the language model with the team's stock

use serde::{Deserialize, Serialize};
use shared::{MovementWithProduct, ProductWithStock};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::gemini::{ChatTurn, GeminiClient};
use crate::services::{ProductService, StockService};

/// Movements included in the context prompt
pub const CONTEXT_MOVEMENTS: i64 = 10;

/// Longest accepted user message, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionRequest {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub model: String,
}

/// Canned analyses offered next to the free-form chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Replenishment,
    DemandPrediction,
}

impl Preset {
    pub fn prompt(&self) -> &'static str {
        match self {
            Preset::Replenishment => {
                "Analise o estoque atual e as movimentações recentes.\n\
                 Sugira quais produtos devem ser repostos e em que quantidade, considerando:\n\
                 1. Produtos com estoque abaixo do mínimo\n\
                 2. Padrões de consumo baseados nas movimentações\n\
                 3. Previsão para os próximos dias\n\n\
                 Formate a resposta como uma lista clara com quantidades sugeridas."
            }
            Preset::DemandPrediction => {
                "Baseado no histórico de movimentações, faça uma análise preditiva:\n\
                 1. Quais produtos têm maior consumo?\n\
                 2. Existe algum padrão de consumo (dias da semana, tendências)?\n\
                 3. Quais produtos podem precisar de reposição nos próximos 7 dias?\n\n\
                 Seja conciso e prático nas sugestões."
            }
        }
    }
}

#[derive(Clone)]
pub struct AssistantService {
    db: PgPool,
    client: GeminiClient,
    stock: StockService,
}

impl AssistantService {
    pub fn new(db: PgPool, client: GeminiClient, stock: StockService) -> Self {
        Self { db, client, stock }
    }

    pub async fn chat(&self, team_id: Uuid, request: &ChatRequest) -> AppResult<ChatResponse> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidInput("Message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::InvalidInput(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        self.ask(team_id, request.model.as_deref(), &request.history, message)
            .await
    }

    pub async fn suggest(
        &self,
        team_id: Uuid,
        preset: Preset,
        model: Option<&str>,
    ) -> AppResult<ChatResponse> {
        self.ask(team_id, model, &[], preset.prompt()).await
    }

    async fn ask(
        &self,
        team_id: Uuid,
        model: Option<&str>,
        history: &[ChatTurn],
        message: &str,
    ) -> AppResult<ChatResponse> {
        let model = self.client.model_or_default(model)?;

        let products = ProductService::new(self.db.clone())
            .list_with_stock(team_id)
            .await?;
        let movements = self
            .stock
            .movement_history(team_id, CONTEXT_MOVEMENTS, None)
            .await?;
        let context = build_context(&products, &movements);

        tracing::debug!(%team_id, %model, products = products.len(), "Asking the assistant");

        let reply = self.client.generate(&model, &context, history, message).await?;
        Ok(ChatResponse { reply, model })
    }
}

/// Context prompt describing the team's stock and latest movements
pub fn build_context(products: &[ProductWithStock], movements: &[MovementWithProduct]) -> String {
    let products_list = products
        .iter()
        .map(|p| {
            format!(
                "- {}: {} {} (categoria: {}, mínimo: {})",
                p.product.name,
                p.quantity(),
                p.product.unit,
                p.product.category,
                p.product.min_stock_level
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let recent = movements
        .iter()
        .take(CONTEXT_MOVEMENTS as usize)
        .map(|m| {
            format!(
                "- {}: {} de {} em {}",
                m.movement.movement_type,
                m.movement.quantity,
                m.product_name,
                m.movement.created_at.format("%d/%m/%Y")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Você é o assistente inteligente do Bar Stock Manager, um sistema de gestão de estoque para bares.\n\n\
         Dados atuais do estoque:\n{}\n\n\
         Últimas movimentações:\n{}\n\n\
         Responda às perguntas do usuário sobre o estoque de forma concisa e útil.\n\
         Se perguntarem sobre quantidades, use os dados acima.\n\
         Se for uma pergunta genérica, responda de forma amigável.\n\
         Responda sempre em português brasileiro.",
        if products_list.is_empty() {
            "Nenhum produto cadastrado."
        } else {
            products_list.as_str()
        },
        if recent.is_empty() {
            "Nenhuma movimentação registrada."
        } else {
            recent.as_str()
        },
    )
}
