use axum::response::Html;

const LOGIN_PAGE: &str = include_str!("../../../static/login.html");
const MAIN_PAGE: &str = include_str!("../../../static/main.html");

pub async fn login() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn main_page() -> Html<&'static str> {
    Html(MAIN_PAGE)
}
