//! Klotski Web API
//!
//! Serves the solution for one configured layout as HTML pages and JSON.
//! The search runs once, on a blocking thread, the first time any page
//! needs it; every later request reads the cached result.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::OnceCell;
use tower_http::cors::{Any, CorsLayer};

use klotski_core::{render, Direction, LayoutError, SearchStats, SolutionStep, SolverConfig};

const TITLE: &str = "Klotski";

// =============================================================================
// Shared State
// =============================================================================

/// Outcome of the one search this server runs. Failures are cached too:
/// the search is deterministic, so retrying cannot change them.
type Outcome = Result<SolutionModel, String>;

pub struct AppStateInner {
    config: SolverConfig,
    initial: String,
    solution: OnceCell<Outcome>,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    /// Validate `config` and render its starting grid.
    pub fn new(config: SolverConfig) -> Result<Self, LayoutError> {
        let board = config.board()?;
        Ok(AppStateInner {
            initial: render(board.root()),
            config,
            solution: OnceCell::new(),
        })
    }

    async fn solution(&self) -> Result<&Outcome, ApiError> {
        self.solution
            .get_or_try_init(|| {
                let config = self.config.clone();
                async move { tokio::task::spawn_blocking(move || solve(&config)).await }
            })
            .await
            .map_err(|e| ApiError::internal(format!("solver task failed: {e}")))
    }
}

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StepModel {
    number: usize,
    label: char,
    direction: Direction,
    distance: u8,
    grid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolutionModel {
    seed: u64,
    moves: usize,
    initial: String,
    steps: Vec<StepModel>,
    stats: SearchStats,
}

#[derive(Serialize)]
struct HealthModel {
    status: String,
}

#[derive(Serialize)]
struct ErrorModel {
    detail: String,
}

struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: String) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorModel { detail: self.detail })).into_response()
    }
}

fn step_to_model(number: usize, step: &SolutionStep) -> StepModel {
    StepModel {
        number,
        label: step.label,
        direction: step.direction,
        distance: step.distance,
        grid: render(&step.arrangement),
    }
}

/// Build a board from `config`, solve it and convert the result.
fn solve(config: &SolverConfig) -> Outcome {
    let mut board = config.board().map_err(|e| e.to_string())?;
    let steps = board.solve().map_err(|e| e.to_string())?;
    tracing::info!(moves = steps.len(), examined = board.stats().examined, "solution cached");

    Ok(SolutionModel {
        seed: config.seed,
        moves: steps.len(),
        initial: render(board.root()),
        steps: steps
            .iter()
            .enumerate()
            .map(|(i, step)| step_to_model(i + 1, step))
            .collect(),
        stats: board.stats(),
    })
}

// =============================================================================
// HTML
// =============================================================================

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A rendered grid with line breaks as `<br>`.
fn grid_html(grid: &str) -> String {
    escape_html(grid).replace('\n', "<br>")
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{TITLE}</title>\n\
         <style>.grid {{ font-family: monospace; white-space: pre; margin-bottom: 1em; }}</style>\n\
         </head>\n<body>\n<h1>{TITLE}</h1>\n{body}\n</body>\n</html>\n"
    )
}

fn home_html(initial: &str, outcome: &Outcome) -> String {
    let mut body = format!(
        "<h2>Initial State</h2>\n<div class=\"grid\">{}</div>\n",
        grid_html(initial)
    );

    match outcome {
        Ok(solution) => {
            body.push_str(&format!(
                "<p>Number of moves needed to reach final state: <strong>{}</strong></p>\n",
                solution.moves
            ));
            for step in &solution.steps {
                let suffix = if step.distance > 1 {
                    format!(" x{}", step.distance)
                } else {
                    String::new()
                };
                body.push_str(&format!(
                    "<div class=\"state\"><p>{}) <strong>{}</strong> moves <strong>{}</strong>{}</p>\
                     <div class=\"grid\">{}</div></div>\n",
                    step.number,
                    escape_html(&step.label.to_string()),
                    step.direction,
                    suffix,
                    grid_html(&step.grid)
                ));
            }
        }
        Err(detail) => {
            body.push_str(&format!("<p class=\"error\">{}</p>\n", escape_html(detail)));
        }
    }

    page(&body)
}

fn solution_html(outcome: &Outcome) -> String {
    match outcome {
        Ok(solution) => page(&format!("<p>Number of moves: {}</p>", solution.moves)),
        Err(detail) => page(&format!("<p class=\"error\">{}</p>", escape_html(detail))),
    }
}

// =============================================================================
// Endpoints
// =============================================================================

async fn home_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let outcome = state.solution().await?;
    Ok(Html(home_html(&state.initial, outcome)))
}

async fn solution_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let outcome = state.solution().await?;
    Ok(Html(solution_html(outcome)))
}

async fn get_solution(State(state): State<AppState>) -> Result<Json<SolutionModel>, ApiError> {
    match state.solution().await? {
        Ok(solution) => Ok(Json(solution.clone())),
        Err(detail) => Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.clone(),
        }),
    }
}

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

// =============================================================================
// Server
// =============================================================================

/// Routes for one configuration. Fails when the layout is invalid.
pub fn router(config: SolverConfig) -> Result<Router, LayoutError> {
    let state: AppState = Arc::new(AppStateInner::new(config)?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(home_page))
        .route("/solution", get(solution_page))
        .route("/api/solve", get(get_solution))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state))
}

/// Bind `0.0.0.0:port` and serve until the process is stopped.
pub async fn serve(config: SolverConfig, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Klotski API running on http://localhost:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
