/// Shared handler state, cloned into every request via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool (internally reference counted).
    pub pool: fixit_db::DbPool,
}
