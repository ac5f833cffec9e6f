use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{
    auth::ensure_admin,
    build_router,
    config::Config,
    database::{Database, MemoryStore},
    state::State,
};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "aquilareale.mz@gmail.com";
const ADMIN_PASSWORD: &str = "Init1234";

fn test_config() -> Config {
    config_with(&[])
}

fn config_with(extra: &[(&str, &str)]) -> Config {
    let extra: HashMap<String, String> = extra
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Config::from_lookup(|key| match key {
        "STORE" => Some("memory".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        "ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_string()),
        "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
        _ => extra.get(key).cloned(),
    })
    .unwrap()
}

async fn app() -> Router {
    app_with(test_config()).await
}

async fn app_with(config: Config) -> Router {
    let state = State::with_database(config, Database::new(MemoryStore::new()));
    ensure_admin(&state).await.unwrap();

    build_router(state)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn register(app: &Router, username: &str, email: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "Test1234" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");

    (
        body["access_token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_admin"], json!(true));

    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_root() {
    let app = app().await;

    for uri in ["/api", "/api/"] {
        let (status, body) = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Pokémon Academy API");
    }
}

#[tokio::test]
async fn test_register_then_me() {
    let app = app().await;
    let (token, user_id) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["username"], "Ash");
    assert_eq!(body["email"], "ash@kanto.it");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_conflicts() {
    let app = app().await;
    register(&app, "Ash", "ash@kanto.it").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "Other", "email": "ASH@kanto.it", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email già registrata");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "Ash", "email": "other@kanto.it", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username già in uso");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "Brock", "email": "not-an-email", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login() {
    let app = app().await;
    let (_, user_id) = register(&app, "Misty", "misty@kanto.it").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "misty@kanto.it", "password": "Test1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["id"], user_id);
    assert!(body.get("is_admin").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "misty@kanto.it", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Credenziali non valide");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@kanto.it", "password": "Test1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_required() {
    let app = app().await;

    let (status, _) = call(&app, Method::GET, "/api/news", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::GET, "/api/news", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token non valido");

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/pokemon/my/25",
        None,
        Some(json!({ "nickname": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_default_news_seeded_once() {
    let app = app().await;
    let (token, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, first) = call(&app, Method::GET, "/api/news", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first.as_array().unwrap().len(), 1);
    assert_eq!(first[0]["news_type"], "questionnaire");
    assert_eq!(first[0]["size"], "hero");

    let (_, second) = call(&app, Method::GET, "/api/news", Some(&token), None).await;
    assert_eq!(second.as_array().unwrap().len(), 1);
    assert_eq!(second[0]["id"], first[0]["id"]);

    let uri = format!("/api/news/{}", first[0]["id"].as_str().unwrap());
    let (status, detail) = call(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["id"], first[0]["id"]);

    let (status, body) = call(&app, Method::GET, "/api/news/missing", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Notizia non trovata");
}

#[tokio::test]
async fn test_user_can_post_news() {
    let app = app().await;
    let (token, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/news",
        Some(&token),
        Some(json!({ "title": "Torneo", "description": "Sabato", "news_type": "event" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], "normal");
    assert_eq!(body["is_active"], true);

    let (_, news) = call(&app, Method::GET, "/api/news", Some(&token), None).await;
    assert_eq!(news.as_array().unwrap().len(), 1);
    assert_eq!(news[0]["title"], "Torneo");
}

#[tokio::test]
async fn test_quiz_submit_and_history() {
    let app = app().await;
    let (token, user_id) = register(&app, "Ash", "ash@kanto.it").await;

    let answers = json!([
        { "question_number": 1, "answer": "b" },
        { "question_number": 2, "answer": "a" },
        { "question_number": 3, "answer": "E" },
        { "question_number": 6, "answer": "a" },
        { "question_number": 8, "answer": "a" },
        { "question_number": 9, "answer": "b" }
    ]);

    let (status, result) = call(
        &app,
        Method::POST,
        "/api/quiz/submit",
        Some(&token),
        Some(json!({ "answers": answers })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["profile_name"], "Allenatore Empatico");
    assert_eq!(result["profile_type"], "Tipo Folletto");

    let (status, history) = call(&app, Method::GET, "/api/quiz/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["user_id"], user_id);
    assert_eq!(history[0]["username"], "Ash");
    assert_eq!(history[0]["result"], result);
    assert_eq!(history[0]["answers"], answers);
}

#[tokio::test]
async fn test_quiz_empty_submission() {
    let app = app().await;
    let (token, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, result) = call(
        &app,
        Method::POST,
        "/api/quiz/submit",
        Some(&token),
        Some(json!({ "answers": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["profile_name"], "Allenatore Equilibrato");
}

#[tokio::test]
async fn test_quiz_history_is_per_user() {
    let app = app().await;
    let (ash, _) = register(&app, "Ash", "ash@kanto.it").await;
    let (misty, _) = register(&app, "Misty", "misty@kanto.it").await;

    call(
        &app,
        Method::POST,
        "/api/quiz/submit",
        Some(&ash),
        Some(json!({ "answers": [{ "question_number": 1, "answer": "a" }] })),
    )
    .await;

    let (_, history) = call(&app, Method::GET, "/api/quiz/history", Some(&misty), None).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_login_rules() {
    let app = app().await;
    register(&app, "Ash", "ash@kanto.it").await;

    admin_token(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "email": "ash@kanto.it", "password": "Test1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Credenziali admin non valide");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "email": "wrong@email.com", "password": "wrongpassword" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_trainers() {
    let app = app().await;
    let (token, user_id) = register(&app, "Ash", "ash@kanto.it").await;

    for uri in [
        "/api/admin/news".to_string(),
        "/api/admin/users".to_string(),
        format!("/api/admin/users/{user_id}/pokemon"),
    ] {
        let (status, _) = call(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_admin_news_crud() {
    let app = app().await;
    let admin = admin_token(&app).await;
    let (trainer, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/admin/news",
        Some(&admin),
        Some(json!({
            "title": "Test News Item",
            "description": "Created by admin",
            "news_type": "announcement",
            "size": "normal"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/admin/news/{id}"),
        Some(&admin),
        Some(json!({ "title": "Updated", "size": "large", "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Updated");
    assert_eq!(updated["size"], "large");
    assert_eq!(updated["description"], "Created by admin");
    assert_eq!(updated["is_active"], false);

    let (_, all) = call(&app, Method::GET, "/api/admin/news", Some(&admin), None).await;
    assert!(all.as_array().unwrap().iter().any(|n| n["id"] == id));

    let (_, visible) = call(&app, Method::GET, "/api/news", Some(&trainer), None).await;
    assert!(visible.as_array().unwrap().iter().all(|n| n["id"] != id));

    let uri = format!("/api/admin/news/{id}");
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = call(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::PUT, &uri, Some(&admin), Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lists_users() {
    let app = app().await;
    let admin = admin_token(&app).await;
    let (_, user_id) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, users) = call(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u["id"] == user_id));
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn test_pokemon_assignment_and_updates() {
    let app = app().await;
    let admin = admin_token(&app).await;
    let (trainer, user_id) = register(&app, "Ash", "ash@kanto.it").await;
    let assign_uri = format!("/api/admin/users/{user_id}/pokemon");

    let (status, assigned) = call(
        &app,
        Method::POST,
        &assign_uri,
        Some(&admin),
        Some(json!({ "pokemon_id": 25, "pokemon_name": "pikachu" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["pokemon_id"], 25);
    assert_eq!(assigned["pokemon_name"], "pikachu");
    assert_eq!(assigned["user_id"], user_id);
    assert_eq!(assigned["level"], 1);

    let (status, _) = call(
        &app,
        Method::POST,
        &assign_uri,
        Some(&admin),
        Some(json!({ "pokemon_id": 25, "pokemon_name": "pikachu" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listed) = call(&app, Method::GET, &assign_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, mine) = call(&app, Method::GET, "/api/pokemon/my", Some(&trainer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["pokemon_id"], 25);

    let (status, updated) = call(
        &app,
        Method::PUT,
        "/api/pokemon/my/25",
        Some(&trainer),
        Some(json!({ "nickname": "Thunder", "level": 75 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["nickname"], "Thunder");
    assert_eq!(updated["level"], 75);

    let (_, detail) = call(&app, Method::GET, "/api/pokemon/my/25", Some(&trainer), None).await;
    assert_eq!(detail["nickname"], "Thunder");
    assert_eq!(detail["level"], 75);

    for level in [1, 50, 100] {
        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/pokemon/my/25",
            Some(&trainer),
            Some(json!({ "level": level })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], level);
    }

    for level in [0, 101, -1] {
        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/pokemon/my/25",
            Some(&trainer),
            Some(json!({ "level": level })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "level {level}");
    }

    let (status, _) = call(&app, Method::PUT, "/api/pokemon/my/25", Some(&trainer), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cleared) = call(
        &app,
        Method::PUT,
        "/api/pokemon/my/25",
        Some(&trainer),
        Some(json!({ "nickname": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["nickname"].is_null());
    assert_eq!(cleared["level"], 100);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/pokemon/my/999",
        Some(&trainer),
        Some(json!({ "nickname": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/api/pokemon/my/999", Some(&trainer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let remove_uri = format!("{assign_uri}/25");
    let (status, body) = call(&app, Method::DELETE, &remove_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = call(&app, Method::DELETE, &remove_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = call(&app, Method::GET, "/api/pokemon/my", Some(&trainer), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_assign_to_unknown_user() {
    let app = app().await;
    let admin = admin_token(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/admin/users/nobody/pokemon",
        Some(&admin),
        Some(json!({ "pokemon_id": 1, "pokemon_name": "bulbasaur" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Utente non trovato");
}

#[tokio::test]
async fn test_pokemon_is_private_to_owner() {
    let app = app().await;
    let admin = admin_token(&app).await;
    let (_, ash_id) = register(&app, "Ash", "ash@kanto.it").await;
    let (misty, _) = register(&app, "Misty", "misty@kanto.it").await;

    call(
        &app,
        Method::POST,
        &format!("/api/admin/users/{ash_id}/pokemon"),
        Some(&admin),
        Some(json!({ "pokemon_id": 25, "pokemon_name": "Pikachu" })),
    )
    .await;

    let (status, _) = call(&app, Method::GET, "/api/pokemon/my/25", Some(&misty), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ensure_admin_is_idempotent() {
    let state = State::with_database(test_config(), Database::new(MemoryStore::new()));

    ensure_admin(&state).await.unwrap();
    ensure_admin(&state).await.unwrap();

    let users = state.database.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].is_admin);
}

fn assert_detail(body: &Value) {
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(!detail.is_empty(), "missing detail in {body}");
}

#[tokio::test]
async fn test_bad_path_segment_is_json() {
    let app = app().await;
    let (token, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, body) = call(&app, Method::GET, "/api/pokemon/my/pikachu", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_detail(&body);

    let admin = admin_token(&app).await;
    let (status, body) = call(
        &app,
        Method::DELETE,
        "/api/admin/users/someone/pokemon/pikachu",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_detail(&body);
}

#[tokio::test]
async fn test_wrong_field_type_is_json() {
    let app = app().await;
    let (token, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/quiz/submit",
        Some(&token),
        Some(json!({ "answers": [{ "question_number": "x", "answer": "a" }] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_detail(&body);
}

#[tokio::test]
async fn test_missing_field_is_json() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "Ash", "password": "Test1234" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_detail(&body);
}

#[tokio::test]
async fn test_malformed_body_is_json() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_detail(&body);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .body(Body::from(r#"{"email":"a@b.it","password":"x"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_detail(&body);
}

#[tokio::test]
async fn test_quiz_survives_email_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let resend_url = format!("http://{address}/emails");
    let app = app_with(config_with(&[
        ("RESEND_API_KEY", "re_test"),
        ("RESEND_URL", resend_url.as_str()),
    ]))
    .await;
    let (token, _) = register(&app, "Ash", "ash@kanto.it").await;

    let (status, result) = call(
        &app,
        Method::POST,
        "/api/quiz/submit",
        Some(&token),
        Some(json!({ "answers": [{ "question_number": 1, "answer": "a" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["profile_name"], "Allenatore Cinico");

    let (status, history) = call(&app, Method::GET, "/api/quiz/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["result"], result);
}
