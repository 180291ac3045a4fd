use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("there is already an active tray in this position")]
    SlotOccupied,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt tray record: {0}")]
    Decode(String),
}
