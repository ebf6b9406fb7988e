use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn data_file(&self) -> PathBuf;
    fn admin_password_hash(&self) -> String;
    fn telegram_bot_token(&self) -> Option<String>;
    fn telegram_chat_id(&self) -> Option<String>;
    fn session_ttl_hours(&self) -> i64;
}
