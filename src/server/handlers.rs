use crate::core::export::ExportFormat;
use crate::core::{LeadRepository, PlacesProvider};
use crate::domain::model::{
    current_month, tier_display_name, tier_level, AccessRecord, Batch, BatchId, Lead, LeadId,
    SearchCriteria, UserId,
};
use crate::server::auth::CurrentUser;
use crate::server::AppState;
use crate::utils::error::{LeadError, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const MSG_AREA_NEEDS_PLAN: &str = "Você precisa adquirir um plano para acessar esta área.";

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadView {
    pub id: LeadId,
    pub categoria: String,
    pub cidade: String,
    pub bairro: String,
    pub nome: String,
    pub telefone: String,
    pub endereco: String,
    pub site: String,
    pub nota: String,
    pub total_avaliacoes: u32,
}

impl From<&Lead> for LeadView {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            categoria: lead.category.clone(),
            cidade: lead.city.clone(),
            bairro: lead.neighborhood.clone(),
            nome: lead.name.clone(),
            telefone: lead.phone.clone(),
            endereco: lead.address.clone(),
            site: lead.website.clone(),
            nota: lead.rating_display(),
            total_avaliacoes: lead.review_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchView {
    pub id: BatchId,
    pub keyword: String,
    pub cidade: String,
    pub bairro: String,
    pub usar_raio: bool,
    pub raio_km: Option<f64>,
    pub status: String,
    pub mensagem_erro: String,
    pub criado_em: String,
    pub total_leads: usize,
}

impl BatchView {
    fn new(batch: &Batch, total_leads: usize) -> Self {
        Self {
            id: batch.id,
            keyword: batch.criteria.keyword.clone(),
            cidade: batch.criteria.city.clone(),
            bairro: batch.criteria.neighborhood.clone(),
            usar_raio: batch.criteria.use_radius,
            raio_km: batch.criteria.radius_km,
            status: batch.status.as_str().to_string(),
            mensagem_erro: batch.error_message.clone(),
            criado_em: batch.created_at.to_rfc3339(),
            total_leads,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessView {
    pub plano: String,
    pub nivel: u8,
    pub status: String,
    pub limite_mensal: u32,
    pub consumidos_mes: u32,
    pub disponiveis: u32,
    pub mes_referencia: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub coleta_id: BatchId,
    pub status: String,
    pub stream_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamResponse {
    pub leads: Vec<LeadView>,
    pub coleta_status: String,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadsResponse {
    pub leads: Vec<LeadView>,
    pub coleta: Option<BatchView>,
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub since_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeadsParams {
    pub coleta: Option<String>,
}

/// Cursor de polling: valores ausentes ou inválidos viram 0.
pub fn parse_since_id(raw: Option<&str>) -> LeadId {
    raw.and_then(|value| value.trim().parse::<LeadId>().ok())
        .unwrap_or(0)
}

/// Corpo JSON malformado ou incompleto vira erro de dados (400 com `erro`).
fn invalid_body(rejection: JsonRejection) -> LeadError {
    LeadError::InvalidConfigValueError {
        field: "corpo".to_string(),
        value: String::new(),
        reason: format!("JSON inválido: {}", rejection.body_text()),
    }
}

fn invalid_path(rejection: PathRejection) -> LeadError {
    LeadError::InvalidConfigValueError {
        field: "coleta_id".to_string(),
        value: String::new(),
        reason: format!("identificador inválido: {}", rejection.body_text()),
    }
}

/// Exige um acesso `ativo` no plano mínimo do servidor, já com a virada
/// de mês aplicada.
async fn require_active_access<P, R>(state: &AppState<P, R>, user_id: UserId) -> Result<AccessRecord>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    let access = state
        .repository()
        .refresh_monthly_usage(user_id, &current_month())
        .await?
        .ok_or_else(|| LeadError::AccessDenied {
            reason: MSG_AREA_NEEDS_PLAN.to_string(),
        })?;

    if !access.is_active() {
        return Err(LeadError::AccessDenied {
            reason: format!(
                "Seu acesso está {}. Entre em contato com o suporte.",
                access.status
            ),
        });
    }
    if !access.has_minimum_level(&state.minimum_tier) {
        return Err(LeadError::AccessDenied {
            reason: format!(
                "Esta área requer o plano {} ou superior. Você possui o plano {}.",
                tier_display_name(&state.minimum_tier),
                tier_display_name(&access.tier)
            ),
        });
    }
    Ok(access)
}

/// Busca a coleta garantindo que pertence ao usuário; coletas de outros
/// usuários respondem como inexistentes.
async fn owned_batch<P, R>(state: &AppState<P, R>, user_id: UserId, batch_id: BatchId) -> Result<Batch>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    state
        .repository()
        .get_batch(batch_id)
        .await?
        .filter(|batch| batch.user_id == user_id)
        .ok_or(LeadError::NotFound {
            entity: "Coleta",
            id: batch_id,
        })
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn access_summary<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<AccessView>>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    let access = require_active_access(&state, user_id).await?;
    let month = current_month();

    Ok(Json(AccessView {
        nivel: tier_level(&access.tier),
        status: access.status.as_str().to_string(),
        limite_mensal: access.monthly_limit,
        consumidos_mes: access.consumed_this_month,
        disponiveis: access.remaining(&month),
        mes_referencia: access.reference_month.clone(),
        plano: access.tier,
    }))
}

pub async fn submit_collection<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
    body: std::result::Result<Json<SearchCriteria>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    require_active_access(&state, user_id).await?;
    let Json(criteria) = body.map_err(invalid_body)?;
    let batch = state.engine.submit(user_id, criteria).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            coleta_id: batch.id,
            status: batch.status.as_str().to_string(),
            stream_url: format!("/crm/leads/stream/{}", batch.id),
        }),
    ))
}

pub async fn list_batches<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<BatchView>>>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    require_active_access(&state, user_id).await?;
    let repository = state.repository();

    let mut views = Vec::new();
    for batch in repository.list_batches(user_id).await? {
        let total = repository.count_leads(batch.id).await?;
        views.push(BatchView::new(&batch, total));
    }
    Ok(Json(views))
}

/// Leads do usuário, mais recentes primeiro. Com `?coleta=N` válido, a
/// coleta correspondente acompanha a resposta.
pub async fn list_leads<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<LeadsParams>,
) -> Result<Json<LeadsResponse>>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    require_active_access(&state, user_id).await?;
    let repository = state.repository();

    let leads = repository
        .leads_for_user(user_id, Some(state.list_limit))
        .await?;

    let mut coleta = None;
    if let Some(batch_id) = params
        .coleta
        .as_deref()
        .and_then(|raw| raw.trim().parse::<BatchId>().ok())
    {
        if let Ok(batch) = owned_batch(&state, user_id, batch_id).await {
            let total = repository.count_leads(batch.id).await?;
            coleta = Some(BatchView::new(&batch, total));
        }
    }

    Ok(Json(LeadsResponse {
        leads: leads.iter().map(LeadView::from).collect(),
        coleta,
    }))
}

pub async fn stream_leads<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
    path: std::result::Result<Path<BatchId>, PathRejection>,
    Query(params): Query<StreamParams>,
) -> Result<Json<StreamResponse>>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    require_active_access(&state, user_id).await?;
    let Path(batch_id) = path.map_err(invalid_path)?;
    let batch = owned_batch(&state, user_id, batch_id).await?;
    let since_id = parse_since_id(params.since_id.as_deref());

    let repository = state.repository();
    let leads = repository.leads_since(batch.id, since_id).await?;
    let total = repository.count_leads(batch.id).await?;

    Ok(Json(StreamResponse {
        leads: leads.iter().map(LeadView::from).collect(),
        coleta_status: batch.status.as_str().to_string(),
        total,
    }))
}

pub async fn export_csv<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    export_leads(&state, user_id, ExportFormat::Csv).await
}

pub async fn export_xlsx<P, R>(
    State(state): State<AppState<P, R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    export_leads(&state, user_id, ExportFormat::Xlsx).await
}

async fn export_leads<P, R>(
    state: &AppState<P, R>,
    user_id: UserId,
    format: ExportFormat,
) -> Result<Response>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    require_active_access(state, user_id).await?;
    let leads = state.repository().leads_for_user(user_id, None).await?;
    let body = format.render(&leads)?;
    tracing::info!(
        "📤 Exporting {} leads for user {} ({})",
        leads.len(),
        user_id,
        format.filename()
    );

    let disposition = format!("attachment; filename=\"{}\"", format.filename());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
