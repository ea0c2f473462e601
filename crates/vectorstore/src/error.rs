use thiserror::Error;

pub type VectorStoreResult<T> = Result<T, VectorStoreError>;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("collection setup error: {0}")]
    Collection(String),

    #[error("upsert error: {0}")]
    Upsert(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("delete error: {0}")]
    Delete(String),
}
