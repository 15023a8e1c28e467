use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::SignedCookieJar;
use tracing::{instrument, warn};

use crate::{
    error::{AppError, RegistrationError},
    state::AppState,
    users::{dto::RegistrationForm, flash, services, views},
};

pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(register_form))
        .route("/register", post(register))
        .route("/success", get(success))
}

pub fn listing_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

#[instrument(skip(jar))]
pub async fn register_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, message) = flash::take(jar);
    (jar, Html(views::register_page(message)))
}

/// Failures go back to the form with a flash; success goes to `/success`.
/// A body that cannot be read as a form counts as missing every field.
#[instrument(skip(state, jar, form))]
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<RegistrationForm>, FormRejection>,
) -> (SignedCookieJar, Redirect) {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable registration form");
            let e = RegistrationError::MissingFields;
            return (flash::push(jar, &e), Redirect::to("/"));
        }
    };

    match services::register(state.store.as_ref(), form).await {
        Ok(_) => (flash::clear(jar), Redirect::to("/success")),
        Err(e) => (flash::push(jar, &e), Redirect::to("/")),
    }
}

pub async fn success() -> Html<String> {
    Html(views::success_page())
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let users = services::list_users(state.store.as_ref()).await?;
    Ok(Html(views::users_page(&users)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    use crate::{
        app::build_app,
        state::AppState,
        users::{
            repo::{SqliteUserStore, UserStore},
            services::test_support::UnavailableStore,
        },
    };

    const ANA: &str = "birthday=1990-05-10&first_name=Ana&last_name=Lee\
        &email=ana%40example.com&password=x&confirm_password=x";

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    fn location(res: &Response) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// The `name=value` part of the flash Set-Cookie header.
    fn flash_cookie(res: &Response) -> Option<String> {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("flash="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    async fn body_text(res: Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn sqlite_app() -> (axum::Router, Arc<dyn UserStore>) {
        let store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::in_memory().await);
        (build_app(AppState::fake(store.clone())), store)
    }

    #[tokio::test]
    async fn form_page_renders() {
        let (app, _) = sqlite_app().await;
        let res = app.oneshot(get("/", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains(r#"name="confirm_password""#));
        assert!(html.contains(r#"action="/register""#));
    }

    #[tokio::test]
    async fn valid_then_duplicate_submission() {
        let (app, store) = sqlite_app().await;

        let res = app.clone().oneshot(post_form(ANA)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/success");
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        let res = app.clone().oneshot(post_form(ANA)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        let cookie = flash_cookie(&res).expect("flash cookie set");
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        let res = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let removal = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(removal.starts_with("flash="), "flash is cleared after display");
        assert!(body_text(res).await.contains("Email already exists"));
    }

    #[tokio::test]
    async fn missing_field_redirects_back_without_insert() {
        let (app, store) = sqlite_app().await;
        let body = "birthday=1990-05-10&first_name=Ana&last_name=Lee&password=x&confirm_password=x";

        let res = app.clone().oneshot(post_form(body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        let cookie = flash_cookie(&res).expect("flash cookie set");
        assert!(store.list_all().await.unwrap().is_empty());

        let html = body_text(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
        assert!(html.contains("All fields are required"));
    }

    #[tokio::test]
    async fn body_without_content_type_redirects_to_form() {
        let (app, store) = sqlite_app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/register")
            .body(Body::empty())
            .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        let cookie = flash_cookie(&res).expect("flash cookie set");
        assert!(store.list_all().await.unwrap().is_empty());

        let html = body_text(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
        assert!(html.contains("All fields are required"));
    }

    #[tokio::test]
    async fn multipart_body_redirects_to_form() {
        let (app, _) = sqlite_app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
            .body(Body::from("--x--\r\n"))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
    }

    #[tokio::test]
    async fn duplicate_form_key_redirects_to_form() {
        let (app, store) = sqlite_app().await;
        let body = format!("{ANA}&first_name=Bob");

        let res = app.oneshot(post_form(&body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        assert!(flash_cookie(&res).is_some());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forged_flash_cookie_is_ignored() {
        let (app, _) = sqlite_app().await;
        let res = app
            .oneshot(get("/", Some("flash=duplicate_email")))
            .await
            .unwrap();
        assert!(!body_text(res).await.contains("Email already exists"));
    }

    #[tokio::test]
    async fn storage_outage_redirects_to_form() {
        let app = build_app(AppState::fake(Arc::new(UnavailableStore)));
        let res = app.oneshot(post_form(ANA)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        assert!(flash_cookie(&res).is_some());
    }

    #[tokio::test]
    async fn success_page_renders() {
        let (app, _) = sqlite_app().await;
        let res = app.oneshot(get("/success", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("Registration complete"));
    }

    #[tokio::test]
    async fn users_page_lists_registrants() {
        let (app, _) = sqlite_app().await;
        app.clone().oneshot(post_form(ANA)).await.unwrap();

        let res = app.oneshot(get("/users", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("ana@example.com"));
        assert!(html.contains("1990-05-10"));
        assert!(!html.contains("argon2"));
    }

    #[tokio::test]
    async fn users_page_storage_failure_is_500() {
        let app = build_app(AppState::fake(Arc::new(UnavailableStore)));
        let res = app.oneshot(get("/users", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
