//! REST API for fixbot.
//!
//! JSON endpoints around the chatbot, guarded by a cookie session. The
//! chatbot, user store and session table live in one [`AppState`] built at
//! startup and shared by every worker.
//!
//! ## Endpoints
//!
//! - `POST /signup` - Create an account
//! - `POST /login` - Start a session (sets the `session` cookie)
//! - `POST /logout` - End the session
//! - `POST /chat` - Ask a question (session required)
//! - `GET /health` - Liveness and index size
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer};
//! use fixbot::chatbot::Chatbot;
//! use fixbot::model::load_or_train;
//! use fixbot::server::AppState;
//! use fixbot::session::SessionStore;
//! use fixbot::users::CredentialStore;
//! use fixbot::IdfWeighting;
//! use std::path::Path;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let (rows, model) = load_or_train(
//!         Path::new("dataset/computer_problems_solutions.csv"),
//!         Path::new("model/chatbot_model.bin"),
//!         IdfWeighting::Standard,
//!     ).unwrap();
//!     let state = web::Data::new(AppState {
//!         chatbot: Chatbot::new(rows, model, 0.40).unwrap(),
//!         users: CredentialStore::open("users.db").await.unwrap(),
//!         sessions: SessionStore::new(),
//!     });
//!
//!     HttpServer::new(move || App::new().app_data(state.clone()).configure(fixbot::server::config))
//!         .bind("127.0.0.1:5000")?
//!         .run()
//!         .await
//! }
//! ```

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Serialize, Deserialize};

use crate::chatbot::Chatbot;
use crate::session::{SessionStore, SESSION_COOKIE};
use crate::users::CredentialStore;

/// Shared, read-mostly state handed to every handler.
pub struct AppState {
    pub chatbot: Chatbot,
    pub users: CredentialStore,
    pub sessions: SessionStore,
}

// --- Request structs ---

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

// --- Response structs ---

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    rows: usize,
    vocabulary: usize,
}

fn error_json(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({"error": message.into()})
}

/// Store failures are logged in full; clients only see this.
fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(error_json("Internal server error"))
}

/// Username of the caller's session, if any.
fn session_user(req: &HttpRequest, state: &AppState) -> Option<String> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    state.sessions.username(cookie.value())
}

// --- Handlers ---

async fn signup_handler(state: web::Data<AppState>, body: web::Json<Credentials>) -> impl Responder {
    let username = body.username.trim();
    let password = body.password.trim();
    if username.is_empty() || password.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Please provide username and password"));
    }

    match state.users.create(username, password).await {
        Ok(true) => HttpResponse::Created().json(MessageResponse {
            message: "Account created, please login".to_string(),
        }),
        Ok(false) => HttpResponse::Conflict().json(error_json("Username already taken")),
        Err(e) => {
            tracing::error!(error = %e, "signup failed");
            internal_error()
        }
    }
}

async fn login_handler(state: web::Data<AppState>, body: web::Json<Credentials>) -> impl Responder {
    let username = body.username.trim();
    let password = body.password.trim();

    let verified = match state.users.verify(username, password).await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            return internal_error();
        }
    };

    if !verified {
        tracing::info!(username, "invalid credentials");
        return HttpResponse::Unauthorized().json(error_json("Invalid credentials"));
    }

    let token = state.sessions.create(username);
    tracing::info!(username, "logged in");

    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    HttpResponse::Ok().cookie(cookie).json(MessageResponse {
        message: "Logged in successfully".to_string(),
    })
}

async fn logout_handler(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();

    HttpResponse::Ok().cookie(removal).json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

/// The body is taken raw and parsed only after the session check, so an
/// unauthenticated caller is redirected whatever it sent.
async fn chat_handler(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    if session_user(&req, &state).is_none() {
        return HttpResponse::Found()
            .insert_header((header::LOCATION, "/login"))
            .finish();
    }

    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return HttpResponse::BadRequest().json(error_json(format!("Invalid JSON body: {}", e))),
    };

    let response = state.chatbot.respond(request.message.as_deref().unwrap_or(""));
    HttpResponse::Ok().json(ChatResponse { response })
}

async fn health_handler(state: web::Data<AppState>) -> impl Responder {
    let index = state.chatbot.model().index();
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        rows: index.len(),
        vocabulary: index.vocabulary().len(),
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/signup").route(web::post().to(signup_handler)))
       .service(web::resource("/login").route(web::post().to(login_handler)))
       .service(web::resource("/logout").route(web::post().to(logout_handler)))
       .service(web::resource("/chat").route(web::post().to(chat_handler)))
       .service(web::resource("/health").route(web::get().to(health_handler)));
}
